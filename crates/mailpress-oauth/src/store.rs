//! Credential and token files on disk.
//!
//! The Gmail collaborator authenticates from two JSON files: the
//! Google "installed app" client secrets (downloaded from the cloud
//! console) and a cached token written after the first interactive
//! authorization. A missing secrets file aborts the run before any
//! message is touched.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::debug;

use crate::error::{Error, Result};
use crate::token::Token;

/// Client id/secret loaded from a Google client secrets file.
#[derive(Debug, Clone)]
pub struct ClientSecrets {
    /// OAuth client id.
    pub client_id: String,
    /// OAuth client secret (installed apps carry one, it is not
    /// actually secret for them).
    pub client_secret: Option<String>,
}

/// On-disk shape: `{"installed": {...}}` or `{"web": {...}}`.
#[derive(Debug, Deserialize)]
struct SecretsFile {
    installed: Option<SecretsBlock>,
    web: Option<SecretsBlock>,
}

#[derive(Debug, Deserialize)]
struct SecretsBlock {
    client_id: String,
    client_secret: Option<String>,
}

impl ClientSecrets {
    /// Loads client secrets from a Google-format JSON file.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingCredentials`] when the file does not
    /// exist, and a parse error when it is not a client secrets file.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(Error::MissingCredentials(path.to_path_buf()));
        }

        let text = fs::read_to_string(path)?;
        let file: SecretsFile = serde_json::from_str(&text)?;
        let block = file.installed.or(file.web).ok_or_else(|| {
            Error::oauth_error(
                "invalid_client_secrets",
                format!(
                    "{} has neither an `installed` nor a `web` section",
                    path.display()
                ),
            )
        })?;

        Ok(Self {
            client_id: block.client_id,
            client_secret: block.client_secret,
        })
    }
}

/// Cached token file, written after authorization and refresh.
#[derive(Debug, Clone)]
pub struct TokenCache {
    path: PathBuf,
}

impl TokenCache {
    /// Creates a cache at the given path.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Cache file location.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads the cached token, if one exists and parses.
    ///
    /// An unreadable or malformed cache is treated as absent: the
    /// caller falls back to interactive authorization.
    #[must_use]
    pub fn load(&self) -> Option<Token> {
        let text = fs::read_to_string(&self.path).ok()?;
        match serde_json::from_str(&text) {
            Ok(token) => Some(token),
            Err(err) => {
                debug!(path = %self.path.display(), %err, "ignoring unparsable token cache");
                None
            }
        }
    }

    /// Stores a token, creating parent directories as needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn store(&self, token: &Token) -> Result<()> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, serde_json::to_string_pretty(token)?)?;
        Ok(())
    }
}
