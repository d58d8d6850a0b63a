//! Linking provider accounts to local users

use chrono::{DateTime, Duration, Utc};

use crate::db::Database;
use crate::error::{Error, Result};
use crate::types::LinkedAccount;

use super::{IdentityProvider, TokenSet};

/// Links accounts and maintains their tokens through an [`IdentityProvider`].
pub struct AccountLinker<P> {
    provider: P,
}

impl<P: IdentityProvider> AccountLinker<P> {
    pub fn new(provider: P) -> Self {
        Self { provider }
    }

    /// Complete an authorization: exchange `code`, look up the account and
    /// bind it to `user_id`.
    ///
    /// Relinking the same user replaces its stored account and tokens. An
    /// account already bound to a different user is rejected.
    pub fn link(
        &self,
        db: &Database,
        user_id: &str,
        code: &str,
        now: DateTime<Utc>,
    ) -> Result<LinkedAccount> {
        let tokens = self.provider.exchange_code(code)?;
        let token_expires_at = expires_at(&tokens, now)?;
        let info = self.provider.fetch_account_info(&tokens.access_token)?;

        let riot_id = format!("{}#{}", info.display_name, info.discriminator);
        if let Some(existing) = db.get_account_by_riot_id(&riot_id)? {
            if existing.user_id != user_id {
                return Err(Error::AccountConflict {
                    riot_id,
                    user_id: existing.user_id,
                });
            }
        }

        let created_at = db
            .get_account(user_id)?
            .map_or(now, |existing| existing.created_at);

        let account = LinkedAccount {
            user_id: user_id.to_string(),
            external_id: info.external_id,
            game_name: info.display_name,
            tag_line: info.discriminator,
            access_token: Some(tokens.access_token.clone()),
            refresh_token: Some(tokens.refresh_token.clone()),
            token_expires_at: Some(token_expires_at),
            created_at,
            updated_at: now,
        };
        db.upsert_account(&account)?;

        tracing::info!(user_id, riot_id = %account.riot_id(), "Linked account");

        Ok(account)
    }

    /// Return a usable access token, refreshing it when it has expired.
    pub fn ensure_valid_token(
        &self,
        db: &Database,
        user_id: &str,
        now: DateTime<Utc>,
    ) -> Result<String> {
        let account = db
            .get_account(user_id)?
            .ok_or_else(|| Error::AccountNotLinked(user_id.to_string()))?;

        if account.has_fresh_token(now) {
            if let Some(token) = account.access_token {
                return Ok(token);
            }
        }

        let refresh_token = account
            .refresh_token
            .ok_or_else(|| Error::AccountNotLinked(user_id.to_string()))?;

        let tokens = self.provider.refresh_access_token(&refresh_token)?;
        db.update_tokens(
            user_id,
            &tokens.access_token,
            &tokens.refresh_token,
            expires_at(&tokens, now)?,
            now,
        )?;

        tracing::info!(user_id, "Refreshed access token");

        Ok(tokens.access_token)
    }
}

/// Absolute expiry for a token lifetime reported by the provider.
fn expires_at(tokens: &TokenSet, now: DateTime<Utc>) -> Result<DateTime<Utc>> {
    Duration::try_seconds(tokens.expires_in.max(0))
        .and_then(|lifetime| now.checked_add_signed(lifetime))
        .ok_or_else(|| {
            Error::Identity(format!("invalid expires_in: {}", tokens.expires_in))
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::AccountInfo;
    use chrono::TimeZone;
    use std::cell::Cell;

    struct FakeProvider {
        game_name: &'static str,
        expires_in: i64,
        refreshes: Cell<u32>,
    }

    impl FakeProvider {
        fn new(game_name: &'static str) -> Self {
            Self {
                game_name,
                expires_in: 3600,
                refreshes: Cell::new(0),
            }
        }
    }

    impl IdentityProvider for FakeProvider {
        fn exchange_code(&self, code: &str) -> Result<TokenSet> {
            if code == "bad" {
                return Err(Error::Identity("API error (400): invalid_grant".to_string()));
            }
            Ok(TokenSet {
                access_token: format!("access-{}", code),
                refresh_token: format!("refresh-{}", code),
                expires_in: self.expires_in,
            })
        }

        fn fetch_account_info(&self, _access_token: &str) -> Result<AccountInfo> {
            Ok(AccountInfo {
                external_id: format!("puuid-{}", self.game_name),
                display_name: self.game_name.to_string(),
                discriminator: "EUW".to_string(),
            })
        }

        fn refresh_access_token(&self, refresh_token: &str) -> Result<TokenSet> {
            self.refreshes.set(self.refreshes.get() + 1);
            Ok(TokenSet {
                access_token: format!("renewed-{}", self.refreshes.get()),
                refresh_token: refresh_token.to_string(),
                expires_in: self.expires_in,
            })
        }
    }

    fn test_db() -> Database {
        let db = Database::open_in_memory().unwrap();
        db.migrate().unwrap();
        db
    }

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 7, 1, 9, 0, 0).unwrap()
    }

    #[test]
    fn test_link_stores_account() {
        let db = test_db();
        let linker = AccountLinker::new(FakeProvider::new("Flick"));

        let account = linker.link(&db, "u1", "code1", t0()).unwrap();
        assert_eq!(account.riot_id(), "Flick#EUW");
        assert_eq!(account.token_expires_at, Some(t0() + Duration::seconds(3600)));

        let stored = db.get_account("u1").unwrap().unwrap();
        assert_eq!(stored, account);
    }

    #[test]
    fn test_relink_keeps_created_at() {
        let db = test_db();
        let linker = AccountLinker::new(FakeProvider::new("Flick"));

        linker.link(&db, "u1", "code1", t0()).unwrap();
        let later = t0() + Duration::days(2);
        let relinked = linker.link(&db, "u1", "code2", later).unwrap();

        assert_eq!(relinked.created_at, t0());
        assert_eq!(relinked.updated_at, later);
        assert_eq!(relinked.access_token.as_deref(), Some("access-code2"));
    }

    #[test]
    fn test_link_conflict_with_other_user() {
        let db = test_db();
        let linker = AccountLinker::new(FakeProvider::new("Flick"));

        linker.link(&db, "u1", "code1", t0()).unwrap();
        let err = linker.link(&db, "u2", "code2", t0()).unwrap_err();
        assert!(matches!(
            err,
            Error::AccountConflict { ref user_id, .. } if user_id == "u1"
        ));
    }

    #[test]
    fn test_link_propagates_provider_error() {
        let db = test_db();
        let linker = AccountLinker::new(FakeProvider::new("Flick"));
        assert!(matches!(
            linker.link(&db, "u1", "bad", t0()),
            Err(Error::Identity(_))
        ));
        assert!(db.get_account("u1").unwrap().is_none());
    }

    #[test]
    fn test_link_rejects_unrepresentable_expiry() {
        let db = test_db();
        let mut provider = FakeProvider::new("Flick");
        provider.expires_in = i64::MAX;
        let linker = AccountLinker::new(provider);

        assert!(matches!(
            linker.link(&db, "u1", "code1", t0()),
            Err(Error::Identity(_))
        ));
        assert!(db.get_account("u1").unwrap().is_none());
    }

    #[test]
    fn test_refresh_rejects_unrepresentable_expiry() {
        let db = test_db();
        let mut linker = AccountLinker::new(FakeProvider::new("Flick"));
        linker.link(&db, "u1", "code1", t0()).unwrap();

        linker.provider.expires_in = i64::MAX;
        let later = t0() + Duration::hours(2);
        assert!(matches!(
            linker.ensure_valid_token(&db, "u1", later),
            Err(Error::Identity(_))
        ));

        // Stored tokens are left untouched
        let stored = db.get_account("u1").unwrap().unwrap();
        assert_eq!(stored.access_token.as_deref(), Some("access-code1"));
    }

    #[test]
    fn test_negative_expires_in_means_already_expired() {
        let tokens = TokenSet {
            access_token: "a".to_string(),
            refresh_token: "r".to_string(),
            expires_in: -30,
        };
        assert_eq!(expires_at(&tokens, t0()).unwrap(), t0());
    }

    #[test]
    fn test_fresh_token_returned_without_refresh() {
        let db = test_db();
        let linker = AccountLinker::new(FakeProvider::new("Flick"));
        linker.link(&db, "u1", "code1", t0()).unwrap();

        let token = linker
            .ensure_valid_token(&db, "u1", t0() + Duration::minutes(30))
            .unwrap();
        assert_eq!(token, "access-code1");
        assert_eq!(linker.provider.refreshes.get(), 0);
    }

    #[test]
    fn test_expired_token_refreshed_and_persisted() {
        let db = test_db();
        let linker = AccountLinker::new(FakeProvider::new("Flick"));
        linker.link(&db, "u1", "code1", t0()).unwrap();

        let later = t0() + Duration::hours(2);
        let token = linker.ensure_valid_token(&db, "u1", later).unwrap();
        assert_eq!(token, "renewed-1");

        let stored = db.get_account("u1").unwrap().unwrap();
        assert_eq!(stored.access_token.as_deref(), Some("renewed-1"));
        assert_eq!(stored.token_expires_at, Some(later + Duration::seconds(3600)));
    }

    #[test]
    fn test_unlinked_user() {
        let db = test_db();
        let linker = AccountLinker::new(FakeProvider::new("Flick"));
        assert!(matches!(
            linker.ensure_valid_token(&db, "ghost", t0()),
            Err(Error::AccountNotLinked(_))
        ));
    }

    #[test]
    fn test_missing_refresh_token() {
        let db = test_db();
        db.upsert_account(&LinkedAccount {
            user_id: "u1".to_string(),
            external_id: "p".to_string(),
            game_name: "Flick".to_string(),
            tag_line: "EUW".to_string(),
            access_token: None,
            refresh_token: None,
            token_expires_at: None,
            created_at: t0(),
            updated_at: t0(),
        })
        .unwrap();

        let linker = AccountLinker::new(FakeProvider::new("Flick"));
        assert!(matches!(
            linker.ensure_valid_token(&db, "u1", t0()),
            Err(Error::AccountNotLinked(_))
        ));
    }
}
