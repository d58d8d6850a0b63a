use sensilog_core::{Database, MatchFilter};
use serde_json::Value;
use std::ffi::OsString;
use std::fs;
use std::path::PathBuf;
use std::process::{Command, Output};
use tempfile::TempDir;

struct CliTestEnv {
    _temp_dir: TempDir,
    home: PathBuf,
    xdg_data: PathBuf,
    xdg_config: PathBuf,
    xdg_state: PathBuf,
}

impl CliTestEnv {
    fn new() -> Self {
        let temp_dir = TempDir::new().expect("failed to create temp dir");
        let base = temp_dir.path().to_path_buf();
        let home = base.join("home");
        let xdg_data = base.join("xdg-data");
        let xdg_config = base.join("xdg-config");
        let xdg_state = base.join("xdg-state");

        fs::create_dir_all(&home).expect("failed to create HOME");
        fs::create_dir_all(&xdg_data).expect("failed to create XDG_DATA_HOME");
        fs::create_dir_all(&xdg_config).expect("failed to create XDG_CONFIG_HOME");
        fs::create_dir_all(&xdg_state).expect("failed to create XDG_STATE_HOME");

        Self {
            _temp_dir: temp_dir,
            home,
            xdg_data,
            xdg_config,
            xdg_state,
        }
    }

    fn db_path(&self) -> PathBuf {
        self.xdg_data.join("sensilog/data.db")
    }

    fn write_config(&self, content: &str) {
        let dir = self.xdg_config.join("sensilog");
        fs::create_dir_all(&dir).expect("failed to create config dir");
        fs::write(dir.join("config.toml"), content).expect("failed to write config");
    }
}

fn fixture_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../sensilog-core/tests/fixtures/matches.json")
}

fn run_bin(env: &CliTestEnv, args: &[&str]) -> Output {
    let bin_path = PathBuf::from(assert_cmd::cargo::cargo_bin!("sensilog"));

    let mut command = Command::new(bin_path);

    command
        .args(args)
        .env("HOME", &env.home)
        .env("XDG_DATA_HOME", &env.xdg_data)
        .env("XDG_CONFIG_HOME", &env.xdg_config)
        .env("XDG_STATE_HOME", &env.xdg_state)
        .env_remove("SENSILOG_CLIENT_ID")
        .env_remove("SENSILOG_CLIENT_SECRET")
        .env_remove("RUST_LOG")
        .output()
        .unwrap_or_else(|e| panic!("failed to execute sensilog: {e}"))
}

fn assert_success(args: &[&str], output: &Output) {
    if output.status.success() {
        return;
    }

    let rendered_args = args
        .iter()
        .map(|arg| OsString::from(arg).to_string_lossy().into_owned())
        .collect::<Vec<_>>()
        .join(" ");
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    panic!(
        "sensilog {rendered_args} failed\nstatus: {}\nstdout:\n{}\nstderr:\n{}",
        output.status, stdout, stderr
    );
}

fn run_json(env: &CliTestEnv, args: &[&str]) -> Value {
    let output = run_bin(env, args);
    assert_success(args, &output);
    serde_json::from_slice(&output.stdout).unwrap_or_else(|e| {
        panic!(
            "invalid JSON from sensilog {}: {e}\n{}",
            args.join(" "),
            String::from_utf8_lossy(&output.stdout)
        )
    })
}

/// Three configurations (Mar 1, Mar 4, Mar 8) plus the six fixture matches.
fn seed(env: &CliTestEnv) {
    for (at, sens) in [
        ("2024-03-01", "0.5"),
        ("2024-03-04", "0.4"),
        ("2024-03-08", "0.35"),
    ] {
        let args = [
            "settings",
            "add",
            "--sensitivity",
            sens,
            "--dpi",
            "800",
            "--at",
            at,
            "--mouse",
            "Zowie EC2",
        ];
        assert_success(&args, &run_bin(env, &args));
    }

    let fixture = fixture_path();
    let fixture = fixture.to_str().expect("fixture path is not UTF-8");
    let imported = run_json(env, &["matches", "import", fixture, "--format", "json"]);
    assert_eq!(imported["inserted"], 6);
}

#[test]
fn settings_are_recorded_and_listed() {
    let env = CliTestEnv::new();

    let args = [
        "settings",
        "add",
        "--sensitivity",
        "0.42",
        "--dpi",
        "1600",
        "--tag",
        "arm-aim",
        "--format",
        "json",
    ];
    let created = run_json(&env, &args);
    assert_eq!(created["dpi"], 1600);
    assert_eq!(created["tags"][0], "arm-aim");

    let listed = run_json(&env, &["settings", "list", "--format", "json"]);
    assert_eq!(listed.as_array().map(Vec::len), Some(1));

    let text = run_bin(&env, &["settings", "latest"]);
    assert_success(&["settings", "latest"], &text);
    assert!(String::from_utf8_lossy(&text.stdout).contains("eDPI:          672.0"));

    assert!(env.db_path().exists(), "database should be created");
}

#[test]
fn invalid_settings_are_rejected() {
    let env = CliTestEnv::new();

    let output = run_bin(&env, &["settings", "add", "--sensitivity", "0.4", "--dpi", "50"]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("dpi"));

    let output = run_bin(&env, &["settings", "remove", "does-not-exist"]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("not found"));
}

#[test]
fn import_then_performance_report() {
    let env = CliTestEnv::new();
    seed(&env);

    // Re-import is idempotent
    let fixture = fixture_path();
    let fixture = fixture.to_str().expect("fixture path is not UTF-8");
    let reimported = run_json(&env, &["matches", "import", fixture, "--format", "json"]);
    assert_eq!(reimported["inserted"], 0);
    assert_eq!(reimported["duplicates"], 6);

    let report = run_json(&env, &["analytics", "performance", "--format", "json"]);
    let periods = report["settingsPeriods"].as_array().expect("periods array");
    assert_eq!(periods.len(), 3);
    assert_eq!(periods[0]["matchCount"], 2);
    assert_eq!(periods[0]["performance"]["winRate"], 50.0);
    assert!(report["overallTrends"]["kdRatioTrendPercent"].is_null());
    assert!(report["correlations"]["sensitivity_vs_kd_ratio"].is_number());

    let text = run_bin(&env, &["analytics", "performance"]);
    assert_success(&["analytics", "performance"], &text);
    let stdout = String::from_utf8_lossy(&text.stdout);
    assert!(stdout.contains("Sensitivity 0.5 @ 800 DPI"));
    assert!(stdout.contains("K/D:           n/a"));

    let db = Database::open(&env.db_path()).expect("failed to open db");
    let matches = db
        .list_matches("local", &MatchFilter::default())
        .expect("failed to list matches");
    assert_eq!(matches.len(), 6);
}

#[test]
fn compare_and_filtered_stats() {
    let env = CliTestEnv::new();
    seed(&env);

    let result = run_json(
        &env,
        &[
            "analytics",
            "compare",
            "--from1",
            "2024-03-01",
            "--to1",
            "2024-03-03",
            "--from2",
            "2024-03-08",
            "--to2",
            "2024-03-11",
            "--format",
            "json",
        ],
    );
    assert_eq!(result["period1"]["matchCount"], 2);
    assert_eq!(result["period2"]["settings"]["sensitivity"], 0.35);
    assert_eq!(result["comparison"]["winRateDiff"], 0.0);
    assert!(result["comparison"]["kdRatioDiff"].as_f64().unwrap() > 0.0);

    let stats = run_json(
        &env,
        &["matches", "stats", "--agent", "Reyna", "--format", "json"],
    );
    assert_eq!(stats["totalMatches"], 2);
    assert_eq!(stats["performance"]["winRate"], 100.0);

    let bad = run_bin(&env, &["analytics", "compare", "--from1", "yesterday", "--to1", "2024-03-03", "--from2", "2024-03-08", "--to2", "2024-03-11"]);
    assert!(!bad.status.success());
}

#[test]
fn users_are_kept_apart() {
    let env = CliTestEnv::new();
    seed(&env);

    let other = run_json(&env, &["--user", "someone-else", "matches", "list", "--format", "json"]);
    assert_eq!(other.as_array().map(Vec::len), Some(0));

    env.write_config("[profile]\nuser_id = \"someone-else\"\n");
    let listed = run_json(&env, &["settings", "list", "--format", "json"]);
    assert_eq!(listed.as_array().map(Vec::len), Some(0));
}

#[test]
fn account_commands_need_credentials() {
    let env = CliTestEnv::new();

    let output = run_bin(&env, &["account", "login-url"]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("client_id"));

    env.write_config("[identity]\nclient_id = \"sensilog-test\"\nclient_secret = \"shh\"\n");
    let url = run_json(&env, &["account", "login-url", "--format", "json"]);
    let url = url["url"].as_str().expect("url string");
    assert!(url.starts_with("https://auth.riotgames.com/authorize?client_id=sensilog-test"));

    let output = run_bin(&env, &["account", "show"]);
    assert_success(&["account", "show"], &output);
    assert!(String::from_utf8_lossy(&output.stdout).contains("No account linked"));

    let output = run_bin(&env, &["account", "token"]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("no linked account"));
}
