// src/backchannel/mod.rs

pub mod dispatcher;
pub mod sender;

use crate::model::BackChannelLogoutModel;
use async_trait::async_trait;
use std::fmt;

/// Why a single back-channel notification did not succeed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryFailure {
    /// The logout URI is not an absolute http(s) URL.
    InvalidTarget(String),
    /// The logout token could not be built or signed for this client.
    TokenConstruction(String),
    /// Connecting to or talking with the relying party failed.
    Network(String),
    /// The relying party did not answer within the per-request timeout.
    Timeout,
    /// The relying party answered with a non-2xx status (redirects included).
    UnexpectedStatus(u16),
    /// The dispatch deadline elapsed before this delivery finished.
    DispatchDeadlineElapsed,
    /// The delivery task ended without producing an outcome.
    Cancelled(String),
}

impl DeliveryFailure {
    /// Transient failures that a retry could plausibly fix.
    pub fn is_retryable(&self) -> bool {
        match self {
            DeliveryFailure::Network(_) | DeliveryFailure::Timeout => true,
            DeliveryFailure::UnexpectedStatus(status) => *status >= 500,
            _ => false,
        }
    }
}

impl fmt::Display for DeliveryFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeliveryFailure::InvalidTarget(e) => write!(f, "invalid logout uri: {}", e),
            DeliveryFailure::TokenConstruction(e) => write!(f, "token construction failed: {}", e),
            DeliveryFailure::Network(e) => write!(f, "network error: {}", e),
            DeliveryFailure::Timeout => write!(f, "request timed out"),
            DeliveryFailure::UnexpectedStatus(status) => write!(f, "unexpected status {}", status),
            DeliveryFailure::DispatchDeadlineElapsed => write!(f, "dispatch deadline elapsed"),
            DeliveryFailure::Cancelled(e) => write!(f, "delivery cancelled: {}", e),
        }
    }
}

/// The result of notifying one relying party.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryOutcome {
    pub client_id: String,
    pub logout_uri: String,
    /// Number of HTTP requests sent. Zero when the request was never sent.
    /// For a delivery aborted at the dispatch deadline this counts requests
    /// that had started, including one still in flight.
    pub attempts: u32,
    pub result: Result<(), DeliveryFailure>,
}

impl DeliveryOutcome {
    pub(crate) fn failed(target: &BackChannelLogoutModel, attempts: u32, failure: DeliveryFailure) -> Self {
        Self {
            client_id: target.client_id.clone(),
            logout_uri: target.logout_uri.clone(),
            attempts,
            result: Err(failure),
        }
    }

    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }

    pub fn failure(&self) -> Option<&DeliveryFailure> {
        self.result.as_ref().err()
    }
}

/// The capability the end-session flow uses to notify relying parties.
///
/// Called once per logout with every back-channel target. Implementations
/// must not make the caller wait on the relying parties themselves.
#[async_trait]
pub trait BackChannelLogoutClient: Send + Sync {
    async fn send_logouts(&self, logouts: Vec<BackChannelLogoutModel>);
}
