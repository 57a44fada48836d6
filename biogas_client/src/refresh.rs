//! Single-flight access token refresh.
//!
//! Every request that sees an expired access token calls
//! [`RefreshCoordinator::refresh`]. The first caller becomes the owner of the
//! refresh: it switches the gate to `Refreshing` before awaiting anything, so
//! callers arriving later subscribe to its outcome instead of starting a second
//! refresh. The owner persists the new token (or clears the session and
//! notifies the [`SessionObserver`]) once, publishes the outcome to every
//! subscriber, and puts the gate back to `Idle`.

use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use url::Url;

use crate::{
    RefreshFailure,
    errors::server_message,
    session::{SessionContext, SessionObserver},
};

pub type RefreshOutcome = Result<String, RefreshFailure>;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RefreshedTokens {
    pub access: String,
    /// Present when the backend rotates refresh tokens.
    pub refresh: Option<String>,
}

#[async_trait]
pub trait TokenRefresher: Send + Sync {
    async fn refresh_access_token(
        &self,
        refresh_token: &str,
    ) -> Result<RefreshedTokens, RefreshFailure>;
}

#[derive(Serialize)]
struct RefreshRequest<'a> {
    refresh: &'a str,
}

#[derive(Deserialize)]
struct RefreshResponse {
    access: String,
    #[serde(default)]
    refresh: Option<String>,
}

/// Exchanges the refresh token at the backend's refresh endpoint.
///
/// Talks to the endpoint directly, bypassing the interceptor chain, so a
/// rejected refresh can never recurse into another refresh.
#[derive(Clone, Debug)]
pub struct HttpTokenRefresher {
    http: reqwest::Client,
    url: Url,
}

impl HttpTokenRefresher {
    pub fn new(http: reqwest::Client, url: Url) -> Self {
        Self { http, url }
    }
}

#[async_trait]
impl TokenRefresher for HttpTokenRefresher {
    async fn refresh_access_token(
        &self,
        refresh_token: &str,
    ) -> Result<RefreshedTokens, RefreshFailure> {
        let response = self
            .http
            .post(self.url.clone())
            .json(&RefreshRequest {
                refresh: refresh_token,
            })
            .send()
            .await
            .map_err(|err| RefreshFailure::Failed(format!("refresh request failed: {err}")))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|err| RefreshFailure::Failed(format!("refresh response unreadable: {err}")))?;

        if !status.is_success() {
            return Err(RefreshFailure::Rejected {
                status: status.as_u16(),
                message: server_message(status, &body),
            });
        }

        let parsed: RefreshResponse = serde_json::from_str(&body)
            .map_err(|err| RefreshFailure::Failed(format!("malformed refresh response: {err}")))?;
        if parsed.access.trim().is_empty() {
            return Err(RefreshFailure::Failed(
                "refresh response carried an empty access token".to_owned(),
            ));
        }

        Ok(RefreshedTokens {
            access: parsed.access,
            refresh: parsed.refresh.filter(|token| !token.trim().is_empty()),
        })
    }
}

enum Phase {
    Idle,
    Refreshing {
        outcome: watch::Receiver<Option<RefreshOutcome>>,
        joined: usize,
    },
}

struct Gate {
    generation: u64,
    phase: Phase,
}

enum Turn {
    Own {
        generation: u64,
        publisher: watch::Sender<Option<RefreshOutcome>>,
    },
    Join(watch::Receiver<Option<RefreshOutcome>>),
}

pub struct RefreshCoordinator<R> {
    refresher: R,
    session: SessionContext,
    observer: Arc<dyn SessionObserver>,
    gate: Mutex<Gate>,
}

impl<R> RefreshCoordinator<R>
where
    R: TokenRefresher,
{
    pub fn new(refresher: R, session: SessionContext, observer: Arc<dyn SessionObserver>) -> Self {
        Self {
            refresher,
            session,
            observer,
            gate: Mutex::new(Gate {
                generation: 0,
                phase: Phase::Idle,
            }),
        }
    }

    pub fn refresher(&self) -> &R {
        &self.refresher
    }

    pub fn is_refreshing(&self) -> bool {
        matches!(self.lock_gate().phase, Phase::Refreshing { .. })
    }

    /// Callers currently subscribed to the in-flight refresh, not counting its owner.
    pub fn joined_waiters(&self) -> usize {
        match &self.lock_gate().phase {
            Phase::Refreshing { joined, .. } => *joined,
            Phase::Idle => 0,
        }
    }

    /// Returns a fresh access token, starting a refresh or joining the one in flight.
    pub async fn refresh(&self) -> RefreshOutcome {
        loop {
            match self.enter() {
                Turn::Own {
                    generation,
                    publisher,
                } => return self.own(generation, publisher).await,
                Turn::Join(outcome) => {
                    if let Some(settled) = join(outcome).await {
                        return settled;
                    }
                    log::debug!("refresh owner went away before settling; taking over");
                }
            }
        }
    }

    fn enter(&self) -> Turn {
        let mut gate = self.lock_gate();

        if let Phase::Refreshing { outcome, joined } = &mut gate.phase
            && outcome.has_changed().is_ok()
        {
            *joined += 1;
            log::debug!("joining in-flight token refresh ({joined} waiting)");
            return Turn::Join(outcome.clone());
        }

        let (publisher, outcome) = watch::channel(None);
        gate.generation += 1;
        gate.phase = Phase::Refreshing { outcome, joined: 0 };
        Turn::Own {
            generation: gate.generation,
            publisher,
        }
    }

    async fn own(
        &self,
        generation: u64,
        publisher: watch::Sender<Option<RefreshOutcome>>,
    ) -> RefreshOutcome {
        let _reset = ResetOnDrop {
            gate: &self.gate,
            generation,
        };

        log::info!("access token rejected; refreshing session");
        let outcome = self.perform().await;
        match &outcome {
            Ok(_) => log::info!("session refreshed"),
            Err(failure) => self.expire(failure),
        }

        publisher.send_replace(Some(outcome.clone()));
        outcome
    }

    async fn perform(&self) -> RefreshOutcome {
        let refresh_token = self
            .session
            .refresh_token()
            .map_err(|err| {
                RefreshFailure::Failed(format!("reading refresh token: {}", err.display_chain()))
            })?
            .ok_or(RefreshFailure::NoRefreshToken)?;

        let tokens = self.refresher.refresh_access_token(&refresh_token).await?;

        self.session
            .set_access_token(&tokens.access)
            .and_then(|()| match &tokens.refresh {
                Some(rotated) => self.session.set_refresh_token(rotated),
                None => Ok(()),
            })
            .map_err(|err| {
                RefreshFailure::Failed(format!("storing refreshed token: {}", err.display_chain()))
            })?;

        Ok(tokens.access)
    }

    fn expire(&self, failure: &RefreshFailure) {
        log::warn!("token refresh failed, clearing session: {failure}");
        if let Err(err) = self.session.clear() {
            log::error!(
                "failed to clear session after refresh failure: {:?}",
                err.display_chain()
            );
        }
        self.observer.on_session_expired(failure);
    }

    fn lock_gate(&self) -> MutexGuard<'_, Gate> {
        match self.gate.lock() {
            Ok(gate) => gate,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

/// `None` when the owner vanished without publishing an outcome.
async fn join(mut outcome: watch::Receiver<Option<RefreshOutcome>>) -> Option<RefreshOutcome> {
    let settled = outcome.wait_for(Option::is_some).await.ok()?;
    settled.clone()
}

struct ResetOnDrop<'a> {
    gate: &'a Mutex<Gate>,
    generation: u64,
}

impl Drop for ResetOnDrop<'_> {
    fn drop(&mut self) {
        let mut gate = match self.gate.lock() {
            Ok(gate) => gate,
            Err(poisoned) => poisoned.into_inner(),
        };
        if gate.generation == self.generation {
            gate.phase = Phase::Idle;
        }
    }
}
