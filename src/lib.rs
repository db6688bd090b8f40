// src/lib.rs


pub mod backchannel;
pub mod config;
pub mod endsession;
pub mod error;
pub mod frontchannel;
pub mod model;
pub mod token;

/// The public prelude for the `nila-oidc-logout` crate.
///
/// This module re-exports the most commonly used types for convenience.
pub mod prelude {
    pub use crate::backchannel::{
        dispatcher::{BackChannelLogoutDispatcher, DispatchReport},
        sender::BackChannelLogoutSender,
        BackChannelLogoutClient, DeliveryFailure, DeliveryOutcome,
    };
    pub use crate::config::{LogoutConfig, LogoutConfigBuilder, RetryConfig};
    pub use crate::endsession::EndSessionCallbackResult;
    pub use crate::error::NilaLogoutError;
    pub use crate::frontchannel::FrontChannelHtmlRenderer;
    pub use crate::model::{BackChannelLogoutModel, EndSessionCallbackValidationResult};
    pub use crate::token::{
        signer::{JwtLogoutTokenSigner, SigningKeyConfig},
        LogoutTokenBuilder, LogoutTokenClaims, LogoutTokenSigner, SignedLogoutToken,
    };

    pub use jsonwebtoken::Algorithm;
}
