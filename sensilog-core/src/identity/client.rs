//! HTTP client for the OAuth identity provider
//!
//! Exchanges authorization codes, refreshes tokens and fetches the account
//! behind an access token.

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT_LANGUAGE};
use serde::Deserialize;

use crate::config::IdentityConfig;
use crate::error::{Error, Result};

use super::IdentityProvider;

/// Token pair returned by the token endpoint
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TokenSet {
    pub access_token: String,
    pub refresh_token: String,
    /// Access token lifetime in seconds
    pub expires_in: i64,
}

/// Account behind an access token
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AccountInfo {
    #[serde(rename = "puuid")]
    pub external_id: String,
    #[serde(rename = "gameName")]
    pub display_name: String,
    #[serde(rename = "tagLine")]
    pub discriminator: String,
}

/// Async identity provider client
pub struct IdentityClient {
    http_client: reqwest::Client,
    client_id: String,
    client_secret: String,
    redirect_uri: String,
    auth_url: String,
    token_url: String,
    account_url: String,
}

impl IdentityClient {
    /// Create a new client from configuration
    ///
    /// Returns an error if the client credentials are missing.
    pub fn new(config: &IdentityConfig) -> Result<Self> {
        config.validate()?;

        let client_id = config
            .resolved_client_id()
            .ok_or_else(|| Error::Config("identity.client_id is required".to_string()))?;
        let client_secret = config
            .resolved_client_secret()
            .ok_or_else(|| Error::Config("identity.client_secret is required".to_string()))?;

        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.9"));

        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .default_headers(headers)
            .build()
            .map_err(|e| Error::Config(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self {
            http_client,
            client_id,
            client_secret,
            redirect_uri: config.redirect_uri.clone(),
            auth_url: config.auth_url.clone(),
            token_url: config.token_url.clone(),
            account_url: config.account_url.clone(),
        })
    }

    /// Authorization link the user opens to grant access
    pub fn authorization_url(&self, state: &str) -> String {
        format!(
            "{}?client_id={}&redirect_uri={}&response_type=code&scope={}&state={}",
            self.auth_url,
            urlencoding::encode(&self.client_id),
            urlencoding::encode(&self.redirect_uri),
            urlencoding::encode("openid offline_access"),
            urlencoding::encode(state),
        )
    }

    /// Exchange an authorization code for a token pair
    pub async fn exchange_code(&self, code: &str) -> Result<TokenSet> {
        tracing::debug!(redirect_uri = %self.redirect_uri, "Exchanging authorization code");
        self.token_request(&[
            ("grant_type", "authorization_code"),
            ("code", code),
            ("redirect_uri", self.redirect_uri.as_str()),
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.as_str()),
        ])
        .await
    }

    /// Obtain a new token pair from a refresh token
    pub async fn refresh_access_token(&self, refresh_token: &str) -> Result<TokenSet> {
        tracing::debug!("Refreshing access token");
        self.token_request(&[
            ("grant_type", "refresh_token"),
            ("refresh_token", refresh_token),
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.as_str()),
        ])
        .await
    }

    /// Fetch the account an access token belongs to
    pub async fn fetch_account_info(&self, access_token: &str) -> Result<AccountInfo> {
        let response = self
            .http_client
            .get(&self.account_url)
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|e| Error::Identity(format!("HTTP request failed: {}", e)))?;

        let status = response.status();
        if status.is_success() {
            let info: AccountInfo = response
                .json()
                .await
                .map_err(|e| Error::Identity(format!("failed to parse account info: {}", e)))?;
            tracing::debug!(
                riot_id = %format!("{}#{}", info.display_name, info.discriminator),
                "Fetched account info"
            );
            Ok(info)
        } else {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "unknown".to_string());
            tracing::error!(%status, "Failed to fetch account info");
            Err(Error::Identity(format!("API error ({}): {}", status, error_text)))
        }
    }

    async fn token_request(&self, form: &[(&str, &str)]) -> Result<TokenSet> {
        let response = self
            .http_client
            .post(&self.token_url)
            .form(form)
            .send()
            .await
            .map_err(|e| Error::Identity(format!("HTTP request failed: {}", e)))?;

        let status = response.status();
        if status.is_success() {
            response
                .json()
                .await
                .map_err(|e| Error::Identity(format!("failed to parse token response: {}", e)))
        } else {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "unknown".to_string());
            tracing::error!(%status, "Token request rejected");
            Err(Error::Identity(format!("API error ({}): {}", status, error_text)))
        }
    }
}

/// Synchronous wrapper for IdentityClient
///
/// Provides blocking methods for use in synchronous code.
pub struct BlockingIdentityClient {
    inner: IdentityClient,
    runtime: tokio::runtime::Runtime,
}

impl BlockingIdentityClient {
    pub fn new(config: &IdentityConfig) -> Result<Self> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| Error::Identity(format!("failed to create runtime: {}", e)))?;

        Ok(Self {
            inner: IdentityClient::new(config)?,
            runtime,
        })
    }

    pub fn authorization_url(&self, state: &str) -> String {
        self.inner.authorization_url(state)
    }
}

impl IdentityProvider for BlockingIdentityClient {
    fn exchange_code(&self, code: &str) -> Result<TokenSet> {
        self.runtime.block_on(self.inner.exchange_code(code))
    }

    fn fetch_account_info(&self, access_token: &str) -> Result<AccountInfo> {
        self.runtime.block_on(self.inner.fetch_account_info(access_token))
    }

    fn refresh_access_token(&self, refresh_token: &str) -> Result<TokenSet> {
        self.runtime
            .block_on(self.inner.refresh_access_token(refresh_token))
    }
}
