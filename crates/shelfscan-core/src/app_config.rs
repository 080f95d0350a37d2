use std::path::PathBuf;
use std::time::Duration;

use crate::ConfigError;

/// Login credentials, only required when no reusable session exists.
#[derive(Clone)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"[redacted]")
            .finish()
    }
}

#[derive(Clone)]
pub struct AppConfig {
    pub target_url: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    /// Page visited after authentication, when the data lives elsewhere.
    pub data_url: Option<String>,
    pub output_path: PathBuf,
    pub state_path: PathBuf,
    pub headless: bool,
    pub navigation_timeout_secs: u64,
    pub converge_timeout_secs: u64,
    pub settle_pause_ms: u64,
    /// Opening phrase of the page-chrome header stripped from text blobs.
    pub chrome_header_start: String,
}

impl AppConfig {
    /// Returns the target URL.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingEnvVar`] if no target URL variable is set.
    pub fn require_target_url(&self) -> Result<&str, ConfigError> {
        self.target_url
            .as_deref()
            .ok_or_else(|| ConfigError::MissingEnvVar("SHELFSCAN_URL".to_string()))
    }

    /// Returns the login credentials.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingCredentials`] if either the username or
    /// the password is unset.
    pub fn credentials(&self) -> Result<Credentials, ConfigError> {
        match (&self.username, &self.password) {
            (Some(username), Some(password)) => Ok(Credentials {
                username: username.clone(),
                password: password.clone(),
            }),
            _ => Err(ConfigError::MissingCredentials),
        }
    }

    #[must_use]
    pub fn navigation_timeout(&self) -> Duration {
        Duration::from_secs(self.navigation_timeout_secs)
    }

    #[must_use]
    pub fn converge_timeout(&self) -> Duration {
        Duration::from_secs(self.converge_timeout_secs)
    }

    #[must_use]
    pub fn settle_pause(&self) -> Duration {
        Duration::from_millis(self.settle_pause_ms)
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("target_url", &self.target_url)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "[redacted]"))
            .field("data_url", &self.data_url)
            .field("output_path", &self.output_path)
            .field("state_path", &self.state_path)
            .field("headless", &self.headless)
            .field("navigation_timeout_secs", &self.navigation_timeout_secs)
            .field("converge_timeout_secs", &self.converge_timeout_secs)
            .field("settle_pause_ms", &self.settle_pause_ms)
            .field("chrome_header_start", &self.chrome_header_start)
            .finish()
    }
}
