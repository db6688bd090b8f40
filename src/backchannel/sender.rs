// src/backchannel/sender.rs

use super::DeliveryFailure;
use crate::config::LogoutConfig;
use crate::error::NilaLogoutError;
use crate::token::SignedLogoutToken;
use tracing::{debug, instrument};
use url::Url;

/// Form field that carries the logout token.
pub const LOGOUT_TOKEN_FIELD: &str = "logout_token";

/// Posts a single logout token to a single relying party.
///
/// Redirects are never followed: a redirect cannot be authenticated as the
/// registered endpoint, so it counts as a failed delivery.
#[derive(Clone)]
pub struct BackChannelLogoutSender {
    // reqwest::Client is internally ref-counted and shares its connection pool.
    http_client: reqwest::Client,
}

impl BackChannelLogoutSender {
    /// Creates a sender whose requests time out after `request_timeout_seconds`.
    pub fn new(config: &LogoutConfig) -> Result<Self, NilaLogoutError> {
        let http_client = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .redirect(reqwest::redirect::Policy::none())
            .user_agent(concat!("nila-oidc-logout/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { http_client })
    }

    /// Parses a registered logout URI, accepting only absolute http(s) URLs.
    pub fn parse_logout_uri(uri: &str) -> Result<Url, NilaLogoutError> {
        let url = Url::parse(uri)?;
        match url.scheme() {
            "http" | "https" if url.has_host() => Ok(url),
            scheme => Err(NilaLogoutError::InvalidUrl(format!(
                "'{}' is not an absolute http(s) URL (scheme '{}')",
                uri, scheme
            ))),
        }
    }

    /// Sends `token` to `logout_uri` and classifies the response.
    ///
    /// Any 2xx status is a success. Everything else is reported as a
    /// `DeliveryFailure` and never retried here.
    #[instrument(skip(self, token), fields(client_id = %token.client_id, jti = %token.jti))]
    pub async fn send(&self, logout_uri: &Url, token: &SignedLogoutToken) -> Result<(), DeliveryFailure> {
        let response = self
            .http_client
            .post(logout_uri.clone())
            .form(&[(LOGOUT_TOKEN_FIELD, token.as_str())])
            .send()
            .await
            .map_err(classify_error)?;

        let status = response.status();
        debug!(status = status.as_u16(), "Relying party answered back-channel logout.");
        if status.is_success() {
            Ok(())
        } else {
            Err(DeliveryFailure::UnexpectedStatus(status.as_u16()))
        }
    }
}

fn classify_error(e: reqwest::Error) -> DeliveryFailure {
    if e.is_timeout() {
        DeliveryFailure::Timeout
    } else {
        DeliveryFailure::Network(e.to_string())
    }
}
