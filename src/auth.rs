use crate::config::Config;
use crate::error::{KpiError, Result};
use serde::Deserialize;

/// Bearer token accepted by the spreadsheet service.
#[derive(Clone)]
pub struct AccessToken(String);

impl AccessToken {
    pub fn new(token: impl Into<String>) -> Self {
        AccessToken(token.into())
    }

    pub fn bearer(&self) -> String {
        format!("Bearer {}", self.0)
    }
}

impl std::fmt::Debug for AccessToken {
    // Never echo the secret into logs.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("AccessToken(***)")
    }
}

/// Supplies authorization for the tabular source and sink. A failure here is
/// fatal before any extraction begins.
pub trait CredentialProvider: Send + Sync {
    fn access_token(&self) -> Result<AccessToken>;
}

/// Token handed straight down from the environment (`SHEETS_API_TOKEN`).
pub struct EnvTokenProvider {
    token: String,
}

impl EnvTokenProvider {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }
}

impl CredentialProvider for EnvTokenProvider {
    fn access_token(&self) -> Result<AccessToken> {
        if self.token.trim().is_empty() {
            return Err(KpiError::Credentials("SHEETS_API_TOKEN is empty".into()));
        }
        Ok(AccessToken::new(self.token.trim()))
    }
}

#[derive(Debug, Deserialize)]
struct CredentialsFile {
    access_token: String,
}

/// Token read from a JSON credentials file on disk.
pub struct FileTokenProvider {
    path: String,
}

impl FileTokenProvider {
    pub fn new(path: impl Into<String>) -> Self {
        Self { path: path.into() }
    }
}

impl CredentialProvider for FileTokenProvider {
    fn access_token(&self) -> Result<AccessToken> {
        let raw = std::fs::read_to_string(&self.path).map_err(|e| {
            KpiError::Credentials(format!("failed to read credentials file '{}': {e}", self.path))
        })?;
        let parsed: CredentialsFile = serde_json::from_str(&raw).map_err(|e| {
            KpiError::Credentials(format!("malformed credentials file '{}': {e}", self.path))
        })?;
        if parsed.access_token.trim().is_empty() {
            return Err(KpiError::Credentials(format!(
                "credentials file '{}' holds an empty access token",
                self.path
            )));
        }
        Ok(AccessToken::new(parsed.access_token.trim()))
    }
}

/// Pick a provider from the configuration: an explicit token wins, then a
/// credentials file. The sheets backend cannot run without one of the two.
pub fn provider_from_config(config: &Config) -> Result<Box<dyn CredentialProvider>> {
    if let Some(ref token) = config.api_token {
        return Ok(Box::new(EnvTokenProvider::new(token.clone())));
    }
    if let Some(ref path) = config.credentials_file {
        return Ok(Box::new(FileTokenProvider::new(path.clone())));
    }
    Err(KpiError::Credentials(
        "sheets backend requires SHEETS_API_TOKEN or SERVICE_ACCOUNT_FILE".into(),
    ))
}
