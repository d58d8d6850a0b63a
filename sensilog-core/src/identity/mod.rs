//! Third-party account linking via OAuth
//!
//! - [`client`]: HTTP client for the identity provider
//! - [`linker`]: binds provider accounts to local users and keeps tokens fresh

pub mod client;
pub mod linker;

pub use client::{AccountInfo, BlockingIdentityClient, IdentityClient, TokenSet};
pub use linker::AccountLinker;

use crate::error::Result;

/// Operations the account linker needs from an identity provider.
pub trait IdentityProvider {
    fn exchange_code(&self, code: &str) -> Result<TokenSet>;

    fn fetch_account_info(&self, access_token: &str) -> Result<AccountInfo>;

    fn refresh_access_token(&self, refresh_token: &str) -> Result<TokenSet>;
}
