use std::env;
use std::fmt;
use std::time::Duration;

use crate::errors::BotError;

pub const DEFAULT_TMDB_API_BASE_URL: &str = "https://api.themoviedb.org";
pub const DEFAULT_TMDB_IMAGE_BASE_URL: &str = "https://image.tmdb.org/t/p/w500";
pub const DEFAULT_TELEGRAM_API_BASE_URL: &str = "https://api.telegram.org";
pub const DEFAULT_PRESIGN_EXPIRY_SECS: u64 = 900;

/// What the webhook reports back to Telegram when something inside the
/// invocation failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FailurePolicy {
    /// Log the failure and answer 200 OK regardless.
    #[default]
    Swallow,
    /// Answer with an error status so the failure is visible to the caller.
    Surface,
}

impl FailurePolicy {
    fn parse(raw: &str) -> Result<Self, BotError> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "swallow" => Ok(Self::Swallow),
            "surface" => Ok(Self::Surface),
            other => Err(BotError::ConfigError(format!(
                "FAILURE_POLICY: unknown policy '{other}'"
            ))),
        }
    }
}

#[derive(Clone)]
pub struct AppConfig {
    pub movie_db_token: String,
    pub telegram_token: String,
    pub images_bucket: String,
    pub presign_expiry: Duration,
    pub failure_policy: FailurePolicy,
    pub webhook_secret: Option<String>,
    pub tmdb_api_base_url: String,
    pub tmdb_image_base_url: String,
    pub telegram_api_base_url: String,
}

impl AppConfig {
    /// # Errors
    ///
    /// Returns an error if a required variable is missing or an optional one
    /// cannot be parsed.
    pub fn from_env() -> Result<Self, BotError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup.
    ///
    /// # Errors
    ///
    /// Same as [`AppConfig::from_env`].
    pub fn from_lookup<F>(lookup: F) -> Result<Self, BotError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .ok_or_else(|| BotError::ConfigError(format!("{key}: not set")))
        };

        let presign_expiry = match lookup("PRESIGN_EXPIRY_SECS") {
            Some(raw) => raw
                .trim()
                .parse::<u64>()
                .map_err(|e| BotError::ConfigError(format!("PRESIGN_EXPIRY_SECS: {e}")))?,
            None => DEFAULT_PRESIGN_EXPIRY_SECS,
        };

        let failure_policy = match lookup("FAILURE_POLICY") {
            Some(raw) => FailurePolicy::parse(&raw)?,
            None => FailurePolicy::default(),
        };

        Ok(Self {
            movie_db_token: required("MOVIE_DB_TOKEN")?,
            telegram_token: required("TG_TOKEN")?,
            images_bucket: required("IMAGES_BUCKET")?,
            presign_expiry: Duration::from_secs(presign_expiry),
            failure_policy,
            webhook_secret: lookup("TG_WEBHOOK_SECRET").filter(|v| !v.is_empty()),
            tmdb_api_base_url: lookup("TMDB_API_BASE_URL")
                .unwrap_or_else(|| DEFAULT_TMDB_API_BASE_URL.to_string()),
            tmdb_image_base_url: lookup("TMDB_IMAGE_BASE_URL")
                .unwrap_or_else(|| DEFAULT_TMDB_IMAGE_BASE_URL.to_string()),
            telegram_api_base_url: lookup("TELEGRAM_API_BASE_URL")
                .unwrap_or_else(|| DEFAULT_TELEGRAM_API_BASE_URL.to_string()),
        })
    }
}

// Tokens stay out of the logs.
impl fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppConfig")
            .field("movie_db_token", &"<redacted>")
            .field("telegram_token", &"<redacted>")
            .field("images_bucket", &self.images_bucket)
            .field("presign_expiry", &self.presign_expiry)
            .field("failure_policy", &self.failure_policy)
            .field("webhook_secret", &self.webhook_secret.as_ref().map(|_| "<redacted>"))
            .field("tmdb_api_base_url", &self.tmdb_api_base_url)
            .field("tmdb_image_base_url", &self.tmdb_image_base_url)
            .field("telegram_api_base_url", &self.telegram_api_base_url)
            .finish()
    }
}
