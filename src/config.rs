// src/config.rs

use crate::error::NilaLogoutError;
use serde::Deserialize;
use std::time::Duration;
use url::Url;

/// Upper bound on the logout token lifetime (one day).
pub const MAX_TOKEN_LIFETIME_SECONDS: u64 = 24 * 60 * 60;

fn default_token_lifetime_seconds() -> u64 {
    300
}

fn default_request_timeout_seconds() -> u64 {
    10
}

fn default_dispatch_timeout_seconds() -> u64 {
    30
}

fn default_max_concurrent_deliveries() -> usize {
    32
}

/// Backoff settings for re-attempting a failed back-channel delivery.
///
/// Only transient failures (network errors, timeouts and 5xx responses) are
/// retried. `max_attempts` includes the first attempt, so `1` disables retries.
#[derive(Deserialize, Clone, Debug, PartialEq)]
pub struct RetryConfig {
    pub max_attempts: u32,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay_ms: 200,
            max_delay_ms: 2_000,
        }
    }
}

impl RetryConfig {
    /// Delay to wait after the given (1-based) failed attempt.
    pub fn delay_after(&self, attempt: u32) -> Duration {
        let factor = 2u64.saturating_pow(attempt.saturating_sub(1));
        let delay = self.base_delay_ms.saturating_mul(factor).min(self.max_delay_ms);
        Duration::from_millis(delay)
    }
}

/// The main configuration for logout notification.
///
/// Can be deserialized from a config file or constructed with `LogoutConfigBuilder`.
#[derive(Deserialize, Clone, Debug)]
pub struct LogoutConfig {
    /// The issuer URL placed in the `iss` claim of every logout token.
    pub issuer: Url,
    /// Lifetime of a logout token; `exp` is `iat` plus this value.
    #[serde(default = "default_token_lifetime_seconds")]
    pub token_lifetime_seconds: u64,
    /// Timeout applied to each individual back-channel request.
    #[serde(default = "default_request_timeout_seconds")]
    pub request_timeout_seconds: u64,
    /// Deadline for one whole dispatch. Deliveries still running when it
    /// elapses are aborted.
    #[serde(default = "default_dispatch_timeout_seconds")]
    pub dispatch_timeout_seconds: u64,
    /// Upper bound on in-flight deliveries, shared by every dispatch running
    /// on the same dispatcher.
    #[serde(default = "default_max_concurrent_deliveries")]
    pub max_concurrent_deliveries: usize,
    /// Retry policy for transient delivery failures. `None` means each target
    /// gets exactly one attempt.
    #[serde(default)]
    pub retry: Option<RetryConfig>,
}

impl LogoutConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds)
    }

    pub fn dispatch_timeout(&self) -> Duration {
        Duration::from_secs(self.dispatch_timeout_seconds)
    }

    /// Checks the values that serde cannot check on its own.
    pub fn validate(&self) -> Result<(), NilaLogoutError> {
        if self.max_concurrent_deliveries == 0 {
            return Err(NilaLogoutError::InvalidConfiguration(
                "max_concurrent_deliveries must be greater than zero".to_string(),
            ));
        }
        if self.token_lifetime_seconds == 0 || self.token_lifetime_seconds > MAX_TOKEN_LIFETIME_SECONDS {
            return Err(NilaLogoutError::InvalidConfiguration(format!(
                "token_lifetime_seconds must be between 1 and {}",
                MAX_TOKEN_LIFETIME_SECONDS
            )));
        }
        if self.request_timeout_seconds == 0 || self.dispatch_timeout_seconds == 0 {
            return Err(NilaLogoutError::InvalidConfiguration(
                "timeouts must be greater than zero".to_string(),
            ));
        }
        if let Some(retry) = &self.retry {
            if retry.max_attempts == 0 {
                return Err(NilaLogoutError::InvalidConfiguration(
                    "retry.max_attempts must be at least 1".to_string(),
                ));
            }
        }
        Ok(())
    }
}

/// A builder for creating a `LogoutConfig` instance.
#[derive(Default)]
pub struct LogoutConfigBuilder {
    issuer: Option<Url>,
    token_lifetime_seconds: Option<u64>,
    request_timeout_seconds: Option<u64>,
    dispatch_timeout_seconds: Option<u64>,
    max_concurrent_deliveries: Option<usize>,
    retry: Option<RetryConfig>,
}

impl LogoutConfigBuilder {
    /// Creates a new `LogoutConfigBuilder`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the issuer URL. This is a required field.
    ///
    /// # Arguments
    ///
    /// * `url` - The issuer URL, e.g., "https://id.example.com".
    pub fn issuer(mut self, url: &str) -> Result<Self, NilaLogoutError> {
        let parsed_url = Url::parse(url).map_err(|e| NilaLogoutError::InvalidUrl(e.to_string()))?;
        self.issuer = Some(parsed_url);
        Ok(self)
    }

    /// Sets the logout token lifetime in seconds. Defaults to 300.
    pub fn token_lifetime_seconds(mut self, seconds: u64) -> Self {
        self.token_lifetime_seconds = Some(seconds);
        self
    }

    /// Sets the per-request timeout in seconds. Defaults to 10.
    pub fn request_timeout_seconds(mut self, seconds: u64) -> Self {
        self.request_timeout_seconds = Some(seconds);
        self
    }

    /// Sets the deadline for a whole dispatch in seconds. Defaults to 30.
    pub fn dispatch_timeout_seconds(mut self, seconds: u64) -> Self {
        self.dispatch_timeout_seconds = Some(seconds);
        self
    }

    /// Sets the bound on concurrent in-flight deliveries. Defaults to 32.
    pub fn max_concurrent_deliveries(mut self, max: usize) -> Self {
        self.max_concurrent_deliveries = Some(max);
        self
    }

    /// Enables retrying transient delivery failures.
    pub fn retry(mut self, retry: RetryConfig) -> Self {
        self.retry = Some(retry);
        self
    }

    /// Consumes the builder and returns a `LogoutConfig` object.
    ///
    /// # Errors
    ///
    /// Returns an error if `issuer` is missing or a value is out of range.
    pub fn build(self) -> Result<LogoutConfig, NilaLogoutError> {
        let issuer = self
            .issuer
            .ok_or(NilaLogoutError::MissingConfiguration("issuer".to_string()))?;

        let config = LogoutConfig {
            issuer,
            token_lifetime_seconds: self
                .token_lifetime_seconds
                .unwrap_or_else(default_token_lifetime_seconds),
            request_timeout_seconds: self
                .request_timeout_seconds
                .unwrap_or_else(default_request_timeout_seconds),
            dispatch_timeout_seconds: self
                .dispatch_timeout_seconds
                .unwrap_or_else(default_dispatch_timeout_seconds),
            max_concurrent_deliveries: self
                .max_concurrent_deliveries
                .unwrap_or_else(default_max_concurrent_deliveries),
            retry: self.retry,
        };
        config.validate()?;
        Ok(config)
    }
}
