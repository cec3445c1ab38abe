use std::env;
use std::time::Duration;

use crate::error::ConfigError;

/// Default chat-completion API base.
pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";

/// Default chat-completion model.
pub const DEFAULT_OPENAI_MODEL: &str = "gpt-4o-mini";

/// Slowest pacing MATCHER_MAX_RPS may ask for: one request a day.
pub const MAX_REQUEST_INTERVAL: Duration = Duration::from_secs(24 * 60 * 60);

/// Which oracle transport to use.
#[derive(Debug, Clone, PartialEq)]
pub enum OracleBackend {
    /// Chat-completion API addressed by model name; requires OPENAI_API_KEY
    Chat,
    /// Direct POST to a deployment endpoint; requires AZURE_OPENAI_ENDPOINT
    /// and AZURE_OPENAI_API_KEY
    Direct,
}

/// Central configuration loaded from environment variables.
///
/// All secrets come from env vars (never hardcoded). The .env file
/// is loaded automatically at startup via dotenvy.
#[derive(Debug, Clone)]
pub struct Config {
    pub oracle_backend: OracleBackend,
    pub openai_api_key: String,
    pub openai_model: String,
    pub openai_base_url: String,
    pub azure_api_key: String,
    pub azure_endpoint: String,
    /// Minimum spacing between oracle requests, from MATCHER_MAX_RPS
    /// (unset = unpaced).
    pub request_interval: Option<Duration>,
    /// Per-request timeout (unset = HTTP client default).
    pub request_timeout: Option<Duration>,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Only the backend choice and numeric knobs are validated here; whether
    /// the credentials are present is checked by `require_oracle`.
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup. `load` passes the
    /// process environment; tests pass a map.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let oracle_backend = match get("MATCHER_BACKEND").as_deref() {
            None | Some("chat") => OracleBackend::Chat,
            Some("direct") => OracleBackend::Direct,
            Some(other) => return Err(ConfigError::UnknownBackend(other.to_string())),
        };

        let request_interval = match get("MATCHER_MAX_RPS") {
            Some(raw) => match interval_for_rate(&raw) {
                Some(interval) => Some(interval),
                None => {
                    return Err(ConfigError::InvalidValue {
                        var: "MATCHER_MAX_RPS",
                        value: raw,
                    })
                }
            },
            None => None,
        };

        let request_timeout = match get("MATCHER_TIMEOUT_SECS") {
            Some(raw) => match raw.trim().parse::<u64>() {
                Ok(secs) if secs > 0 => Some(Duration::from_secs(secs)),
                _ => {
                    return Err(ConfigError::InvalidValue {
                        var: "MATCHER_TIMEOUT_SECS",
                        value: raw,
                    })
                }
            },
            None => None,
        };

        Ok(Self {
            oracle_backend,
            openai_api_key: get("OPENAI_API_KEY").unwrap_or_default(),
            openai_model: get("OPENAI_MODEL").unwrap_or_else(|| DEFAULT_OPENAI_MODEL.to_string()),
            openai_base_url: get("OPENAI_BASE_URL")
                .unwrap_or_else(|| DEFAULT_OPENAI_BASE_URL.to_string()),
            azure_api_key: get("AZURE_OPENAI_API_KEY").unwrap_or_default(),
            azure_endpoint: get("AZURE_OPENAI_ENDPOINT").unwrap_or_default(),
            request_interval,
            request_timeout,
        })
    }

    /// Validate that the chosen oracle backend has what it needs.
    /// Call this before reading any input so a bad setup fails fast.
    pub fn require_oracle(&self) -> Result<(), ConfigError> {
        match self.oracle_backend {
            OracleBackend::Chat => {
                if self.openai_api_key.is_empty() {
                    return Err(ConfigError::MissingVar {
                        var: "OPENAI_API_KEY",
                    });
                }
            }
            OracleBackend::Direct => {
                if self.azure_endpoint.is_empty() {
                    return Err(ConfigError::MissingVar {
                        var: "AZURE_OPENAI_ENDPOINT",
                    });
                }
                if self.azure_api_key.is_empty() {
                    return Err(ConfigError::MissingVar {
                        var: "AZURE_OPENAI_API_KEY",
                    });
                }
            }
        }
        Ok(())
    }

    /// The credential for the active backend, masked for display.
    pub fn masked_credential(&self) -> String {
        let key = match self.oracle_backend {
            OracleBackend::Chat => &self.openai_api_key,
            OracleBackend::Direct => &self.azure_api_key,
        };
        mask_secret(key)
    }
}

/// Spacing between requests for a rate given in requests per second.
///
/// `None` when the rate is not a positive finite number or is slower than
/// `MAX_REQUEST_INTERVAL`.
fn interval_for_rate(raw: &str) -> Option<Duration> {
    let rps = raw
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|rps| *rps > 0.0 && rps.is_finite())?;
    Duration::try_from_secs_f64(1.0 / rps)
        .ok()
        .filter(|interval| *interval <= MAX_REQUEST_INTERVAL)
}

/// Show the first 5 and last 4 characters of a secret. Short secrets are
/// fully hidden so the mask never reveals the whole value.
pub fn mask_secret(secret: &str) -> String {
    let chars: Vec<char> = secret.chars().collect();
    if chars.len() <= 12 {
        return "*".repeat(chars.len());
    }
    let head: String = chars[..5].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{head}...{tail}")
}
