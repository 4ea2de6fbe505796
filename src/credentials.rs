use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};

use serde::Deserialize;
use tonic::metadata::AsciiMetadataValue;
use tonic::Code;
use tracing::debug;

use crate::client::ReportError;

/// Instance metadata server endpoint serving the default service account's
/// access token.
pub const METADATA_TOKEN_URL: &str =
    "http://metadata.google.internal/computeMetadata/v1/instance/service-accounts/default/token";

/// Cached tokens are refreshed this long before they expire.
const REFRESH_MARGIN: Duration = Duration::from_secs(60);

/// Credentials attached to every report call.
pub enum Credentials {
    /// The instance's default service account, via the metadata server.
    ComputeEngine(ComputeEngineCredentials),
    /// A fixed OAuth2 bearer token.
    AccessToken(String),
}

impl Credentials {
    #[must_use]
    pub fn compute_engine() -> Self {
        Credentials::ComputeEngine(ComputeEngineCredentials::new(METADATA_TOKEN_URL))
    }

    #[must_use]
    pub fn access_token(token: impl Into<String>) -> Self {
        Credentials::AccessToken(token.into())
    }

    pub(crate) async fn authorization(&self) -> Result<AsciiMetadataValue, ReportError> {
        match self {
            Credentials::ComputeEngine(credentials) => credentials.authorization().await,
            Credentials::AccessToken(token) => bearer(token),
        }
    }
}

pub struct ComputeEngineCredentials {
    http: reqwest::Client,
    token_url: String,
    cached: Mutex<Option<CachedToken>>,
}

struct CachedToken {
    authorization: AsciiMetadataValue,
    refresh_at: Instant,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: u64,
}

impl ComputeEngineCredentials {
    #[must_use]
    pub fn new(token_url: impl Into<String>) -> Self {
        ComputeEngineCredentials {
            http: reqwest::Client::new(),
            token_url: token_url.into(),
            cached: Mutex::new(None),
        }
    }

    async fn authorization(&self) -> Result<AsciiMetadataValue, ReportError> {
        if let Some(authorization) = self.cached() {
            return Ok(authorization);
        }

        let token = self.fetch().await?;
        let authorization = bearer(&token.access_token)?;
        let lifetime = Duration::from_secs(token.expires_in).saturating_sub(REFRESH_MARGIN);
        debug!(?lifetime, "Fetched access token from metadata server");

        let now = Instant::now();
        *self.cached.lock().unwrap_or_else(PoisonError::into_inner) = Some(CachedToken {
            authorization: authorization.clone(),
            refresh_at: now.checked_add(lifetime).unwrap_or(now),
        });

        Ok(authorization)
    }

    fn cached(&self) -> Option<AsciiMetadataValue> {
        let cached = self.cached.lock().unwrap_or_else(PoisonError::into_inner);

        cached
            .as_ref()
            .filter(|token| Instant::now() < token.refresh_at)
            .map(|token| token.authorization.clone())
    }

    async fn fetch(&self) -> Result<TokenResponse, ReportError> {
        let response = self
            .http
            .get(&self.token_url)
            .header("Metadata-Flavor", "Google")
            .send()
            .await
            .map_err(|err| unauthenticated(format!("Token request failed; err={err}")))?;

        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|err| unauthenticated(format!("Token body unreadable; err={err}")))?;
        if !status.is_success() {
            return Err(unauthenticated(format!(
                "Token request rejected; status={status}; body={}",
                String::from_utf8_lossy(&body)
            )));
        }

        serde_json::from_slice(&body)
            .map_err(|err| unauthenticated(format!("Token response malformed; err={err}")))
    }
}

fn bearer(token: &str) -> Result<AsciiMetadataValue, ReportError> {
    AsciiMetadataValue::try_from(format!("Bearer {token}"))
        .map_err(|err| unauthenticated(format!("Access token not ascii; err={err}")))
}

fn unauthenticated(message: String) -> ReportError {
    ReportError { code: Code::Unauthenticated, message }
}
