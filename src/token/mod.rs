// src/token/mod.rs

pub mod signer;

use crate::config::LogoutConfig;
use crate::error::NilaLogoutError;
use crate::model::BackChannelLogoutModel;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::fmt;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use uuid::Uuid;

/// Event type marking a token as an OpenID Connect back-channel logout.
pub const BACKCHANNEL_LOGOUT_EVENT: &str = "http://schemas.openid.net/event/backchannel-logout";

/// The `typ` header value for logout tokens.
pub const LOGOUT_TOKEN_TYPE: &str = "logout+jwt";

/// Claims carried by a back-channel logout token.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LogoutTokenClaims {
    pub iss: String,
    pub aud: String,
    pub iat: u64,
    pub exp: u64,
    pub jti: String,
    pub events: serde_json::Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sid: Option<String>,
}

impl LogoutTokenClaims {
    /// Whether the `events` claim carries the back-channel logout member.
    pub fn is_backchannel_logout(&self) -> bool {
        self.events.get(BACKCHANNEL_LOGOUT_EVENT).is_some_and(|v| v.is_object())
    }
}

/// Signs logout token claims. Implementations are shared between concurrent
/// deliveries and must be safe to call from many tasks at once.
pub trait LogoutTokenSigner: Send + Sync {
    /// Signs `claims` for the audience they name and returns the compact token.
    fn sign(&self, claims: &LogoutTokenClaims) -> Result<String, NilaLogoutError>;
}

/// A signed logout token ready to be posted to one relying party.
#[derive(Clone)]
pub struct SignedLogoutToken {
    pub client_id: String,
    pub jti: String,
    value: String,
}

impl SignedLogoutToken {
    pub fn as_str(&self) -> &str {
        &self.value
    }
}

// The token itself stays out of logs.
impl fmt::Debug for SignedLogoutToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SignedLogoutToken")
            .field("client_id", &self.client_id)
            .field("jti", &self.jti)
            .finish_non_exhaustive()
    }
}

/// Builds and signs the logout token for a single relying party.
#[derive(Clone)]
pub struct LogoutTokenBuilder {
    issuer: String,
    lifetime_seconds: u64,
    signer: Arc<dyn LogoutTokenSigner>,
}

fn non_empty(value: Option<&String>) -> Option<String> {
    value.filter(|v| !v.is_empty()).cloned()
}

impl LogoutTokenBuilder {
    pub fn new(config: &LogoutConfig, signer: Arc<dyn LogoutTokenSigner>) -> Self {
        Self {
            issuer: config.issuer.as_str().to_string(),
            lifetime_seconds: config.token_lifetime_seconds,
            signer,
        }
    }

    /// Assembles the claim set for `model` without signing it.
    ///
    /// # Errors
    ///
    /// Fails with `MissingSessionId` when the client requires a `sid` and the
    /// model has none, and with `MissingSubjectAndSession` when there is
    /// neither a subject nor a session to name in the token. An unvalidated
    /// config whose lifetime overflows `exp` yields `InvalidConfiguration`.
    pub fn claims(&self, model: &BackChannelLogoutModel) -> Result<LogoutTokenClaims, NilaLogoutError> {
        let sub = non_empty(model.subject_id.as_ref());
        let sid = non_empty(model.session_id.as_ref());

        if model.session_id_required && sid.is_none() {
            return Err(NilaLogoutError::MissingSessionId {
                client_id: model.client_id.clone(),
            });
        }
        if sub.is_none() && sid.is_none() {
            return Err(NilaLogoutError::MissingSubjectAndSession {
                client_id: model.client_id.clone(),
            });
        }

        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or_default();

        let exp = now.checked_add(self.lifetime_seconds).ok_or_else(|| {
            NilaLogoutError::InvalidConfiguration(format!(
                "token lifetime of {} seconds overflows the exp claim",
                self.lifetime_seconds
            ))
        })?;

        Ok(LogoutTokenClaims {
            iss: self.issuer.clone(),
            aud: model.client_id.clone(),
            iat: now,
            exp,
            jti: Uuid::new_v4().to_string(),
            events: json!({ BACKCHANNEL_LOGOUT_EVENT: {} }),
            sub,
            sid,
        })
    }

    /// Builds the claims for `model` and signs them.
    pub fn build(&self, model: &BackChannelLogoutModel) -> Result<SignedLogoutToken, NilaLogoutError> {
        let claims = self.claims(model)?;
        tracing::debug!(client_id = %model.client_id, jti = %claims.jti, "Signing logout token.");
        let value = self.signer.sign(&claims)?;
        Ok(SignedLogoutToken {
            client_id: claims.aud,
            jti: claims.jti,
            value,
        })
    }
}
