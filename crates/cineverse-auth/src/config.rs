//! Auth configuration, read once from the environment at startup.

use std::path::{Path, PathBuf};

use tracing::warn;

/// Fallback signing secret. Fine for local development; any real
/// deployment must set `CINEVERSE_SESSION_SECRET`, since tokens signed
/// with a known key are forgeable.
pub const DEFAULT_SESSION_SECRET: &str = "dev-secret-change-me";

/// Fallback directory for table files.
pub const DEFAULT_DATA_DIR: &str = "data";

#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// Directory holding the table files.
    pub data_dir: PathBuf,
    /// Process-wide secret for the token signer.
    pub session_secret: String,
    /// Whether username uniqueness ignores ASCII case. The historical
    /// behavior is case-sensitive, so that stays the default.
    pub ignore_username_case: bool,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            session_secret: DEFAULT_SESSION_SECRET.to_string(),
            ignore_username_case: false,
        }
    }
}

impl AuthConfig {
    /// Load from `CINEVERSE_DATA_DIR`, `CINEVERSE_SESSION_SECRET`, and
    /// `CINEVERSE_UNIQUE_USERNAMES_IGNORE_CASE`, after applying `.env` if
    /// present.
    pub fn from_env() -> Self {
        let _ = dotenvy::dotenv();

        let data_dir = std::env::var("CINEVERSE_DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_DATA_DIR));

        let session_secret = std::env::var("CINEVERSE_SESSION_SECRET")
            .unwrap_or_else(|_| DEFAULT_SESSION_SECRET.to_string());
        if session_secret == DEFAULT_SESSION_SECRET {
            warn!("CINEVERSE_SESSION_SECRET is unset; session tokens use the insecure default key");
        }

        let ignore_username_case = std::env::var("CINEVERSE_UNIQUE_USERNAMES_IGNORE_CASE")
            .map(|v| matches!(v.trim(), "1" | "true" | "yes"))
            .unwrap_or(false);

        Self {
            data_dir,
            session_secret,
            ignore_username_case,
        }
    }

    pub fn with_data_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.data_dir = dir.as_ref().to_path_buf();
        self
    }

    pub fn with_session_secret(mut self, secret: impl Into<String>) -> Self {
        self.session_secret = secret.into();
        self
    }

    pub fn with_ignore_username_case(mut self, ignore: bool) -> Self {
        self.ignore_username_case = ignore;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_case_sensitive_with_dev_secret() {
        let config = AuthConfig::default();
        assert_eq!(config.data_dir, PathBuf::from(DEFAULT_DATA_DIR));
        assert_eq!(config.session_secret, DEFAULT_SESSION_SECRET);
        assert!(!config.ignore_username_case);
    }

    #[test]
    fn builders_override_fields() {
        let config = AuthConfig::default()
            .with_data_dir("/tmp/cineverse")
            .with_session_secret("s3cret")
            .with_ignore_username_case(true);
        assert_eq!(config.data_dir, PathBuf::from("/tmp/cineverse"));
        assert_eq!(config.session_secret, "s3cret");
        assert!(config.ignore_username_case);
    }
}
