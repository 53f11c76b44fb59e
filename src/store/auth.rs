//! Google service-account authentication.
//!
//! A service-account key file is read once at startup. Access tokens are
//! obtained with the JWT-bearer grant and cached until shortly before expiry.

use chrono::Utc;
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tokio::sync::Mutex;

use crate::error::{LeadIntakeError, Result};

/// OAuth scopes needed to open a spreadsheet by title and edit it
pub const SHEETS_SCOPES: [&str; 2] = [
    "https://www.googleapis.com/auth/spreadsheets",
    "https://www.googleapis.com/auth/drive",
];

const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";
const TOKEN_LIFETIME_SECS: i64 = 3600;
// Refresh this long before the token actually expires.
const EXPIRY_MARGIN_SECS: i64 = 60;

fn default_token_uri() -> String {
    DEFAULT_TOKEN_URI.to_string()
}

/// The fields of a service-account JSON key that token exchange needs
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceAccountKey {
    /// Service account identity
    pub client_email: String,
    /// PEM-encoded RSA private key
    pub private_key: String,
    /// Token endpoint
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

impl ServiceAccountKey {
    /// Read a key file downloaded from the Google Cloud console.
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            LeadIntakeError::Auth(format!("Cannot read credentials file {}: {e}", path.display()))
        })?;
        Self::from_json(&contents)
    }

    /// Parse a key from its JSON text
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| LeadIntakeError::Auth(format!("Invalid service account key: {e}")))
    }
}

#[derive(Debug, Serialize)]
struct JwtClaims<'a> {
    iss: &'a str,
    scope: String,
    aud: &'a str,
    iat: i64,
    exp: i64,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<i64>,
}

#[derive(Debug, Clone)]
struct CachedToken {
    access_token: String,
    expires_at: i64,
}

/// Hands out bearer tokens for a service account
#[derive(Debug)]
pub struct TokenProvider {
    key: ServiceAccountKey,
    client: reqwest::Client,
    scopes: String,
    cached: Mutex<Option<CachedToken>>,
}

impl TokenProvider {
    /// Create a provider for `key` with the given scopes
    #[must_use]
    pub fn new(key: ServiceAccountKey, client: reqwest::Client, scopes: &[&str]) -> Self {
        Self {
            key,
            client,
            scopes: scopes.join(" "),
            cached: Mutex::new(None),
        }
    }

    /// A valid access token, exchanging a fresh JWT when the cached one is stale.
    pub async fn access_token(&self) -> Result<String> {
        let mut cached = self.cached.lock().await;
        let now = Utc::now().timestamp();

        if let Some(token) = cached.as_ref() {
            if token.expires_at - EXPIRY_MARGIN_SECS > now {
                return Ok(token.access_token.clone());
            }
        }

        let token = self.exchange(now).await?;
        let access_token = token.access_token.clone();
        *cached = Some(token);
        Ok(access_token)
    }

    async fn exchange(&self, now: i64) -> Result<CachedToken> {
        let assertion = self.signed_assertion(now)?;

        let resp = self
            .client
            .post(&self.key.token_uri)
            .form(&[
                ("grant_type", "urn:ietf:params:oauth:grant-type:jwt-bearer"),
                ("assertion", assertion.as_str()),
            ])
            .timeout(Duration::from_secs(15))
            .send()
            .await?;

        let status = resp.status();
        let body = resp.text().await?;
        if !status.is_success() {
            return Err(LeadIntakeError::Auth(format!("Google token exchange failed ({status}): {body}")));
        }

        let token: TokenResponse = serde_json::from_str(&body)?;
        tracing::info!(account = %self.key.client_email, "Obtained Google access token");

        Ok(CachedToken {
            access_token: token.access_token,
            expires_at: now + token.expires_in.unwrap_or(TOKEN_LIFETIME_SECS),
        })
    }

    fn signed_assertion(&self, now: i64) -> Result<String> {
        let claims = JwtClaims {
            iss: &self.key.client_email,
            scope: self.scopes.clone(),
            aud: &self.key.token_uri,
            iat: now,
            exp: now + TOKEN_LIFETIME_SECS,
        };

        let encoding_key = EncodingKey::from_rsa_pem(self.key.private_key.as_bytes())?;
        Ok(jsonwebtoken::encode(&Header::new(Algorithm::RS256), &claims, &encoding_key)?)
    }
}
