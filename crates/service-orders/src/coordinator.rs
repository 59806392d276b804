//! Save requests from the wizard to the mounted step.
//!
//! The wizard asks the currently mounted step to save itself and waits for
//! an explicit yes/no answer. At most one step is registered at a time and
//! at most one request is outstanding.
//!
//! A request whose requester already gave up (timed out) is abandoned: the
//! step skips it instead of committing a save nobody is waiting for.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use thiserror::Error;
use tokio::sync::{mpsc, oneshot};

use crate::steps::{Step, StepKind};
use crate::store::DraftStore;

pub const DEFAULT_SAVE_TIMEOUT: Duration = Duration::from_secs(3);

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SaveError {
    #[error("a save is already in progress")]
    InFlight,
    #[error("no step is mounted")]
    NoActiveStep,
    #[error("{0} step has invalid fields")]
    Rejected(StepKind),
    #[error("step did not answer within {0:?}")]
    TimedOut(Duration),
    #[error("step was unmounted before answering")]
    StepUnmounted,
    #[error("{mounted} step is mounted but {expected} was expected")]
    WrongStep {
        expected: StepKind,
        mounted: StepKind,
    },
}

/// A pending save request, answered exactly once.
#[derive(Debug)]
pub struct SaveRequest {
    reply: oneshot::Sender<bool>,
}

impl SaveRequest {
    /// The requester stopped waiting for this answer.
    pub fn is_abandoned(&self) -> bool {
        self.reply.is_closed()
    }

    pub fn respond(self, saved: bool) {
        if self.reply.send(saved).is_err() {
            tracing::debug!("save requester gave up before the reply");
        }
    }
}

#[derive(Debug)]
struct Registration {
    token: u64,
    kind: StepKind,
    sender: mpsc::Sender<SaveRequest>,
}

#[derive(Debug, Default)]
struct Shared {
    active: Mutex<Option<Registration>>,
    saving: AtomicBool,
    next_token: AtomicU64,
}

impl Shared {
    fn active(&self) -> MutexGuard<'_, Option<Registration>> {
        self.active.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Clears the in-flight flag however `request_save` exits.
struct InFlightGuard<'a>(&'a AtomicBool);

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

#[derive(Debug, Clone)]
pub struct SaveCoordinator {
    shared: Arc<Shared>,
    timeout: Duration,
}

impl Default for SaveCoordinator {
    fn default() -> Self {
        Self::new(DEFAULT_SAVE_TIMEOUT)
    }
}

impl SaveCoordinator {
    pub fn new(timeout: Duration) -> Self {
        Self {
            shared: Arc::new(Shared::default()),
            timeout,
        }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Register `kind` as the active step, replacing any previous one.
    pub fn mount(&self, kind: StepKind) -> MountedStep {
        let token = self.shared.next_token.fetch_add(1, Ordering::Relaxed);
        let (sender, receiver) = mpsc::channel(1);

        let previous = self.shared.active().replace(Registration {
            token,
            kind,
            sender,
        });
        if let Some(previous) = previous {
            tracing::debug!(previous = %previous.kind, "replacing mounted step");
        }
        tracing::debug!(step = %kind, "step mounted");

        MountedStep {
            kind,
            token,
            receiver,
            shared: Arc::clone(&self.shared),
        }
    }

    pub fn active_step(&self) -> Option<StepKind> {
        self.shared.active().as_ref().map(|r| r.kind)
    }

    pub fn is_saving(&self) -> bool {
        self.shared.saving.load(Ordering::Acquire)
    }

    /// Ask the mounted step to save and wait for its answer.
    pub async fn request_save(&self) -> Result<StepKind, SaveError> {
        self.save(None).await
    }

    /// Like [`SaveCoordinator::request_save`], but refuses to ask anything
    /// of a step other than `expected`.
    pub async fn request_save_for(&self, expected: StepKind) -> Result<StepKind, SaveError> {
        self.save(Some(expected)).await
    }

    async fn save(&self, expected: Option<StepKind>) -> Result<StepKind, SaveError> {
        if self
            .shared
            .saving
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(SaveError::InFlight);
        }
        let _guard = InFlightGuard(&self.shared.saving);

        let (kind, sender) = match self.shared.active().as_ref() {
            Some(registration) => (registration.kind, registration.sender.clone()),
            None => return Err(SaveError::NoActiveStep),
        };
        if let Some(expected) = expected.filter(|&expected| expected != kind) {
            tracing::warn!(%expected, mounted = %kind, "save requested from the wrong step");
            return Err(SaveError::WrongStep {
                expected,
                mounted: kind,
            });
        }

        let (reply, answer) = oneshot::channel();
        let exchange = async {
            sender
                .send(SaveRequest { reply })
                .await
                .map_err(|_| SaveError::StepUnmounted)?;
            answer.await.map_err(|_| SaveError::StepUnmounted)
        };

        match tokio::time::timeout(self.timeout, exchange).await {
            Ok(Ok(true)) => {
                tracing::debug!(step = %kind, "step saved");
                Ok(kind)
            }
            Ok(Ok(false)) => Err(SaveError::Rejected(kind)),
            Ok(Err(err)) => Err(err),
            Err(_) => {
                tracing::warn!(step = %kind, timeout = ?self.timeout, "save request timed out");
                Err(SaveError::TimedOut(self.timeout))
            }
        }
    }
}

/// The step side of a registration. Dropping it unmounts the step.
#[derive(Debug)]
pub struct MountedStep {
    kind: StepKind,
    token: u64,
    receiver: mpsc::Receiver<SaveRequest>,
    shared: Arc<Shared>,
}

impl MountedStep {
    pub fn kind(&self) -> StepKind {
        self.kind
    }

    /// Next request someone is still waiting on; abandoned ones are dropped.
    ///
    /// `None` once another step has replaced this one.
    pub async fn next_request(&mut self) -> Option<SaveRequest> {
        loop {
            let request = self.receiver.recv().await?;
            if !request.is_abandoned() {
                return Some(request);
            }
            tracing::debug!(step = %self.kind, "skipping abandoned save request");
        }
    }

    /// Wait for one request and answer it by saving `step` into `store`.
    ///
    /// Returns `false` when no request will ever arrive.
    pub async fn serve_next<S>(&mut self, step: &mut S, store: &DraftStore) -> bool
    where
        S: Step + ?Sized,
    {
        let Some(request) = self.next_request().await else {
            return false;
        };
        let saved = match step.save(store) {
            Ok(()) => true,
            Err(err) => {
                tracing::debug!(step = %step.kind(), %err, "step refused to save");
                false
            }
        };
        request.respond(saved);
        true
    }
}

impl Drop for MountedStep {
    fn drop(&mut self) {
        let mut active = self.shared.active();
        if active.as_ref().is_some_and(|r| r.token == self.token) {
            *active = None;
            tracing::debug!(step = %self.kind, "step unmounted");
        }
    }
}
