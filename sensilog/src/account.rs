//! `sensilog account` - OAuth account linking

use anyhow::{Context, Result};
use chrono::Utc;
use clap::Subcommand;
use sensilog_core::format::{format_opt, format_timestamp};
use sensilog_core::identity::{AccountLinker, BlockingIdentityClient};

use crate::output::{print_json, OutputFormat};
use crate::App;

#[derive(Subcommand)]
pub enum AccountCommand {
    /// Print the authorization URL to open in a browser
    LoginUrl,

    /// Finish linking with the code returned to the redirect URI
    Link {
        #[arg(long)]
        code: String,
    },

    /// Show the linked account
    Show,

    /// Print a valid access token, refreshing it if needed
    Token,
}

pub fn run(app: &App, cmd: AccountCommand) -> Result<()> {
    match cmd {
        AccountCommand::LoginUrl => {
            let client = identity_client(app)?;
            let state = uuid::Uuid::new_v4().simple().to_string();
            let url = client.authorization_url(&state);
            match app.format {
                OutputFormat::Json => {
                    print_json(&serde_json::json!({ "url": url, "state": state }))?
                }
                OutputFormat::Text => {
                    println!("Open this URL to authorize sensilog:\n");
                    println!("{}", url);
                    println!("\nThen run: sensilog account link --code <CODE>");
                }
            }
        }
        AccountCommand::Link { code } => {
            let linker = AccountLinker::new(identity_client(app)?);
            let account = linker
                .link(&app.db, &app.user_id, &code, Utc::now())
                .context("failed to link account")?;
            match app.format {
                OutputFormat::Json => print_json(&serde_json::json!({
                    "userId": account.user_id,
                    "riotId": account.riot_id(),
                }))?,
                OutputFormat::Text => {
                    println!("Linked {} to user {}", account.riot_id(), account.user_id)
                }
            }
        }
        AccountCommand::Show => {
            let account = app
                .db
                .get_account(&app.user_id)
                .context("failed to load account")?;
            match (app.format, account) {
                (OutputFormat::Json, None) => print_json(&serde_json::Value::Null)?,
                (OutputFormat::Json, Some(account)) => print_json(&serde_json::json!({
                    "userId": account.user_id,
                    "riotId": account.riot_id(),
                    "externalId": account.external_id,
                    "tokenExpiresAt": account.token_expires_at,
                    "linkedAt": account.created_at,
                }))?,
                (OutputFormat::Text, None) => {
                    println!("No account linked for user {}.", app.user_id);
                    println!("Run 'sensilog account login-url' to start linking.");
                }
                (OutputFormat::Text, Some(account)) => {
                    println!("Riot ID:        {}", account.riot_id());
                    println!("Linked at:      {}", format_timestamp(account.created_at));
                    println!(
                        "Token expires:  {}",
                        format_opt(account.token_expires_at.map(format_timestamp))
                    );
                }
            }
        }
        AccountCommand::Token => {
            let linker = AccountLinker::new(identity_client(app)?);
            let token = linker
                .ensure_valid_token(&app.db, &app.user_id, Utc::now())
                .context("failed to obtain access token")?;
            match app.format {
                OutputFormat::Json => print_json(&serde_json::json!({ "accessToken": token }))?,
                OutputFormat::Text => println!("{}", token),
            }
        }
    }
    Ok(())
}

fn identity_client(app: &App) -> Result<BlockingIdentityClient> {
    BlockingIdentityClient::new(&app.config.identity)
        .context("identity provider is not configured")
}
