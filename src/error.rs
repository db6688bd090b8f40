// src/error.rs

use thiserror::Error;

/// The primary error type for the `nila-oidc-logout` library.
#[derive(Debug, Error)]
pub enum NilaLogoutError {
    /// Errors originating from the `jsonwebtoken` crate while encoding a logout token.
    #[error("JWT error: {0}")]
    JwtError(#[from] jsonwebtoken::errors::Error),

    /// An error occurred during an HTTP request or while building the HTTP client.
    #[error("HTTP request error")]
    HttpError(#[from] reqwest::Error),

    /// A required configuration field is missing.
    #[error("A required configuration field is missing: {0}")]
    MissingConfiguration(String),

    /// A configuration value is invalid.
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// A provided URL could not be parsed or is not usable as a logout endpoint.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// A cryptographic key (e.g., PEM) is malformed or could not be read.
    #[error("Invalid key format: {0}")]
    InvalidKeyFormat(String),

    /// The relying party requires a `sid` claim but the logout carries no session id.
    #[error("Client '{client_id}' requires a session id but none was provided")]
    MissingSessionId { client_id: String },

    /// A logout token must carry a `sub` claim, a `sid` claim, or both.
    #[error("Logout token for client '{client_id}' has neither a subject nor a session id")]
    MissingSubjectAndSession { client_id: String },

    /// A custom signing collaborator failed to produce a token.
    #[error("Token signing failed: {0}")]
    TokenSigning(String),

    /// The front-channel HTTP response could not be assembled.
    #[error("Failed to build HTTP response: {0}")]
    ResponseBuild(#[from] http::Error),
}

impl From<url::ParseError> for NilaLogoutError {
    fn from(e: url::ParseError) -> Self {
        NilaLogoutError::InvalidUrl(e.to_string())
    }
}
