// src/backchannel/dispatcher.rs

use super::sender::BackChannelLogoutSender;
use super::{BackChannelLogoutClient, DeliveryFailure, DeliveryOutcome};
use crate::config::{LogoutConfig, RetryConfig};
use crate::error::NilaLogoutError;
use crate::model::BackChannelLogoutModel;
use crate::token::{LogoutTokenBuilder, LogoutTokenSigner};
use async_trait::async_trait;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, error, info, instrument, warn, Instrument};

/// Per-target outcomes of one dispatch, in the order the targets were given.
#[derive(Debug, Clone, Default)]
pub struct DispatchReport {
    outcomes: Vec<DeliveryOutcome>,
}

impl DispatchReport {
    pub fn outcomes(&self) -> &[DeliveryOutcome] {
        &self.outcomes
    }

    pub fn into_outcomes(self) -> Vec<DeliveryOutcome> {
        self.outcomes
    }

    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_success()).count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes.len() - self.succeeded()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }
}

/// Fans a logout out to every back-channel target concurrently.
///
/// Each target is an independent task: its token is built, its request sent
/// and its outcome recorded without affecting the others. A semaphore shared
/// by all clones of the dispatcher bounds the number of requests in flight
/// across simultaneous logouts.
#[derive(Clone)]
pub struct BackChannelLogoutDispatcher {
    // The dispatcher is internally ref-counted to allow for cheap cloning.
    inner: Arc<Inner>,
}

struct Inner {
    builder: LogoutTokenBuilder,
    sender: BackChannelLogoutSender,
    limiter: Arc<Semaphore>,
    dispatch_timeout: Duration,
    retry: Option<RetryConfig>,
}

impl BackChannelLogoutDispatcher {
    /// Creates a dispatcher from the logout configuration and a signer.
    pub fn new(config: &LogoutConfig, signer: Arc<dyn LogoutTokenSigner>) -> Result<Self, NilaLogoutError> {
        config.validate()?;
        let sender = BackChannelLogoutSender::new(config)?;
        Ok(Self {
            inner: Arc::new(Inner {
                builder: LogoutTokenBuilder::new(config, signer),
                sender,
                limiter: Arc::new(Semaphore::new(config.max_concurrent_deliveries)),
                dispatch_timeout: config.dispatch_timeout(),
                retry: config.retry.clone(),
            }),
        })
    }

    /// Notifies every target and waits until all deliveries finish or the
    /// dispatch deadline elapses, whichever comes first.
    ///
    /// Never fails: every target ends up with a `DeliveryOutcome`, and
    /// deliveries still running at the deadline are aborted. An aborted
    /// delivery reports the number of requests it had already sent.
    #[instrument(skip_all, fields(targets = targets.len()))]
    pub async fn dispatch(&self, targets: Vec<BackChannelLogoutModel>) -> DispatchReport {
        if targets.is_empty() {
            debug!("No back-channel logout targets.");
            return DispatchReport::default();
        }

        let mut slots: Vec<Option<DeliveryOutcome>> = vec![None; targets.len()];
        // Attempt counts live outside the tasks so they survive an abort.
        let sent: Vec<Arc<AtomicU32>> = targets.iter().map(|_| Arc::new(AtomicU32::new(0))).collect();
        let mut join_set = JoinSet::new();
        for (index, target) in targets.iter().cloned().enumerate() {
            let inner = self.inner.clone();
            let counter = sent[index].clone();
            join_set.spawn(
                async move { (index, inner.deliver(target, &counter).await) }.instrument(tracing::Span::current()),
            );
        }

        let deadline = tokio::time::sleep(self.inner.dispatch_timeout);
        tokio::pin!(deadline);
        let mut deadline_elapsed = false;

        loop {
            tokio::select! {
                joined = join_set.join_next() => match joined {
                    Some(Ok((index, outcome))) => slots[index] = Some(outcome),
                    Some(Err(e)) => error!("Back-channel delivery task failed: {}", e),
                    None => break,
                },
                _ = &mut deadline => {
                    deadline_elapsed = true;
                    warn!(
                        pending = join_set.len(),
                        "Dispatch deadline of {:?} elapsed, aborting remaining deliveries.",
                        self.inner.dispatch_timeout
                    );
                    join_set.abort_all();
                    break;
                }
            }
        }

        let outcomes = targets
            .iter()
            .zip(slots)
            .zip(&sent)
            .map(|((target, slot), sent)| {
                slot.unwrap_or_else(|| {
                    let failure = if deadline_elapsed {
                        DeliveryFailure::DispatchDeadlineElapsed
                    } else {
                        DeliveryFailure::Cancelled("delivery task did not complete".to_string())
                    };
                    DeliveryOutcome::failed(target, sent.load(Ordering::Relaxed), failure)
                })
            })
            .collect();

        let report = DispatchReport { outcomes };
        info!(
            succeeded = report.succeeded(),
            failed = report.failed(),
            "Back-channel logout dispatch finished."
        );
        report
    }
}

impl Inner {
    async fn deliver(&self, target: BackChannelLogoutModel, sent: &AtomicU32) -> DeliveryOutcome {
        let logout_uri = match BackChannelLogoutSender::parse_logout_uri(&target.logout_uri) {
            Ok(uri) => uri,
            Err(e) => {
                warn!(client_id = %target.client_id, error = %e, "Skipping back-channel logout target.");
                return DeliveryOutcome::failed(&target, 0, DeliveryFailure::InvalidTarget(e.to_string()));
            }
        };

        let token = match self.builder.build(&target) {
            Ok(token) => token,
            Err(e) => {
                warn!(client_id = %target.client_id, error = %e, "Could not build logout token.");
                return DeliveryOutcome::failed(&target, 0, DeliveryFailure::TokenConstruction(e.to_string()));
            }
        };

        let max_attempts = self.retry.as_ref().map_or(1, |r| r.max_attempts.max(1));
        let mut attempt = 0;
        loop {
            attempt += 1;
            let result = match self.limiter.acquire().await {
                Ok(_permit) => {
                    sent.fetch_add(1, Ordering::Relaxed);
                    self.sender.send(&logout_uri, &token).await
                }
                Err(e) => Err(DeliveryFailure::Cancelled(e.to_string())),
            };

            match result {
                Ok(()) => {
                    info!(client_id = %target.client_id, jti = %token.jti, attempt, "Back-channel logout delivered.");
                    return DeliveryOutcome {
                        client_id: target.client_id,
                        logout_uri: target.logout_uri,
                        attempts: attempt,
                        result: Ok(()),
                    };
                }
                Err(failure) => {
                    if let Some(retry) = self.retry.as_ref().filter(|_| attempt < max_attempts && failure.is_retryable()) {
                        let delay = retry.delay_after(attempt);
                        warn!(
                            client_id = %target.client_id,
                            error = %failure,
                            attempt,
                            "Back-channel logout failed. Retrying in {:?}.",
                            delay
                        );
                        tokio::time::sleep(delay).await;
                        continue;
                    }
                    warn!(
                        client_id = %target.client_id,
                        logout_uri = %target.logout_uri,
                        error = %failure,
                        attempt,
                        "Back-channel logout failed."
                    );
                    return DeliveryOutcome::failed(&target, attempt, failure);
                }
            }
        }
    }
}

#[async_trait]
impl BackChannelLogoutClient for BackChannelLogoutDispatcher {
    /// Starts the dispatch on the runtime and returns without waiting for it.
    async fn send_logouts(&self, logouts: Vec<BackChannelLogoutModel>) {
        if logouts.is_empty() {
            debug!("No back-channel logouts to send.");
            return;
        }
        let dispatcher = self.clone();
        tokio::spawn(async move {
            dispatcher.dispatch(logouts).await;
        });
    }
}
