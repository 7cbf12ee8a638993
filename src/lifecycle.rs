//! State machine around the single in-flight `wave` transaction.
//!
//! The tracker only decides state and notifications. Network work is done by
//! [`run_submission`], which reports back through [`LifecycleEvent`]s so the
//! controller loop never blocks on mining.

use crate::{
    contract::{
        ContractClient,
        WaveContract,
    },
    error::{
        Error,
        Result,
    },
    notifications::{
        NOTICE_TTL,
        Notifications,
        ToastId,
        ToastKind,
    },
};
use std::time::Instant;
use tokio::sync::mpsc;
use tracing::{
    error,
    info,
    warn,
};

pub const PENDING_TEXT: &str = "Waiting for wave to be mined...";
pub const SUCCESS_TEXT: &str = "Success";
pub const FAILURE_TEXT: &str = "Sorry, something went wrong";

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Outcome {
    Confirmed { hash: String },
    Failed { reason: String },
}

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub enum TxState {
    #[default]
    Idle,
    Pending {
        hash: Option<String>,
    },
    Settled(Outcome),
}

/// Progress reports from a running submission.
#[derive(Debug)]
pub enum LifecycleEvent {
    Submitted {
        hash: String,
    },
    Confirmed {
        hash: String,
        /// `None` when the follow-up count read failed.
        total_waves: Option<u64>,
    },
    Failed(Error),
}

#[derive(Debug, Default)]
pub struct TransactionTracker {
    state: TxState,
    toast: Option<ToastId>,
}

impl TransactionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &TxState {
        &self.state
    }

    pub fn is_mining(&self) -> bool {
        matches!(self.state, TxState::Pending { .. })
    }

    /// idle/settled -> pending. Rejects a second submission while one is
    /// still pending.
    pub fn begin(&mut self, notes: &mut Notifications, now: Instant) -> Result<()> {
        if self.is_mining() {
            return Err(Error::SubmissionInFlight);
        }
        self.state = TxState::Pending { hash: None };
        self.toast = Some(notes.show(ToastKind::Pending, PENDING_TEXT, None, now));
        Ok(())
    }

    pub fn submitted(&mut self, hash: String) {
        if let TxState::Pending { hash: slot } = &mut self.state {
            info!(%hash, "mining");
            *slot = Some(hash);
        }
    }

    /// pending -> settled (success).
    pub fn confirm(&mut self, hash: String, notes: &mut Notifications, now: Instant) {
        if !self.is_mining() {
            warn!(%hash, "confirmation without a pending transaction");
            return;
        }
        info!(%hash, "mined");
        let updated = self.toast.take().is_some_and(|id| {
            notes.update(id, ToastKind::Success, SUCCESS_TEXT, Some(NOTICE_TTL), now)
        });
        if !updated {
            notes.show(ToastKind::Success, SUCCESS_TEXT, Some(NOTICE_TTL), now);
        }
        self.state = TxState::Settled(Outcome::Confirmed { hash });
    }

    /// pending -> settled (failure).
    pub fn fail(&mut self, err: &Error, notes: &mut Notifications, now: Instant) {
        error!(error = %err, "wave failed");
        if let Some(id) = self.toast.take() {
            notes.dismiss(id);
        }
        notes.flash_error(FAILURE_TEXT, now);
        self.state = TxState::Settled(Outcome::Failed {
            reason: err.to_string(),
        });
    }
}

/// Submits `message`, waits for it to be mined and refreshes the total count,
/// reporting each step on `events`.
pub async fn run_submission<C: WaveContract>(
    client: ContractClient<C>,
    message: String,
    events: mpsc::UnboundedSender<LifecycleEvent>,
) {
    let pending = match client.submit_wave(&message).await {
        Ok(pending) => pending,
        Err(err) => {
            let _ = events.send(LifecycleEvent::Failed(err));
            return;
        }
    };
    let _ = events.send(LifecycleEvent::Submitted {
        hash: pending.hash().to_owned(),
    });
    let hash = match pending.confirmed().await {
        Ok(hash) => hash,
        Err(err) => {
            let _ = events.send(LifecycleEvent::Failed(err));
            return;
        }
    };
    let total_waves = match client.total_wave_count().await {
        Ok(count) => Some(count),
        Err(err) => {
            warn!(error = %err, "refreshing total wave count failed");
            None
        }
    };
    let _ = events.send(LifecycleEvent::Confirmed { hash, total_waves });
}
