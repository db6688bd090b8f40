// src/model.rs

use serde::Deserialize;

/// One relying party that must be notified over the back channel.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct BackChannelLogoutModel {
    /// The relying party's client id. Becomes the `aud` of its logout token.
    pub client_id: String,
    /// The absolute URL of the relying party's back-channel logout endpoint.
    pub logout_uri: String,
    /// The end user, when the relying party needs subject-scoped invalidation.
    #[serde(default)]
    pub subject_id: Option<String>,
    /// The identity provider's session id.
    #[serde(default)]
    pub session_id: Option<String>,
    /// Whether the client registration mandates a `sid` claim.
    #[serde(default)]
    pub session_id_required: bool,
}

/// The outcome of validating an end-session callback request.
///
/// Built once by the validator and then handed over by value; it is never
/// modified afterwards.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EndSessionCallbackValidationResult {
    is_error: bool,
    front_channel_logout_urls: Vec<String>,
    back_channel_logouts: Vec<BackChannelLogoutModel>,
}

impl EndSessionCallbackValidationResult {
    /// A failed validation. Nothing will be notified.
    pub fn error() -> Self {
        Self {
            is_error: true,
            ..Self::default()
        }
    }

    /// A successful validation carrying the notification targets.
    pub fn success(
        front_channel_logout_urls: Vec<String>,
        back_channel_logouts: Vec<BackChannelLogoutModel>,
    ) -> Self {
        Self {
            is_error: false,
            front_channel_logout_urls,
            back_channel_logouts,
        }
    }

    pub fn is_error(&self) -> bool {
        self.is_error
    }

    pub fn front_channel_logout_urls(&self) -> &[String] {
        &self.front_channel_logout_urls
    }

    pub fn back_channel_logouts(&self) -> &[BackChannelLogoutModel] {
        &self.back_channel_logouts
    }
}
