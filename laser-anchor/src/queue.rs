//! Hand-off of frame outcomes from the frame producer to the thread that owns the scene.
//!
//! Detection runs wherever frames arrive. Raycasting needs the environment, which usually lives
//! on another thread, so outcomes are queued and resolved in bulk once per tick.

use crate::{Environment, FrameOutcome, RaycastSettings, Resolved};
use crossbeam_channel::{bounded, unbounded, Receiver, Sender, TrySendError};
use log::*;
use thiserror::Error;

/// The outcome could not be queued. It is handed back so the caller decides what to drop.
#[derive(Debug, Error)]
pub enum PushError {
    #[error("outcome queue is full")]
    Full(FrameOutcome),
    #[error("outcome queue has no consumer")]
    Disconnected(FrameOutcome),
}

impl PushError {
    pub fn into_outcome(self) -> FrameOutcome {
        match self {
            PushError::Full(outcome) | PushError::Disconnected(outcome) => outcome,
        }
    }
}

/// Creates a FIFO queue of frame outcomes. `None` makes it unbounded.
pub fn outcome_queue(capacity: Option<usize>) -> (OutcomeSender, OutcomeReceiver) {
    let (sender, receiver) = match capacity {
        Some(capacity) => bounded(capacity),
        None => unbounded(),
    };
    (OutcomeSender(sender), OutcomeReceiver(receiver))
}

#[derive(Debug, Clone)]
pub struct OutcomeSender(Sender<FrameOutcome>);

impl OutcomeSender {
    /// Queues an outcome without blocking.
    pub fn push(&self, outcome: FrameOutcome) -> Result<(), PushError> {
        self.0.try_send(outcome).map_err(|e| match e {
            TrySendError::Full(outcome) => PushError::Full(outcome),
            TrySendError::Disconnected(outcome) => PushError::Disconnected(outcome),
        })
    }
}

#[derive(Debug)]
pub struct OutcomeReceiver(Receiver<FrameOutcome>);

impl OutcomeReceiver {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Resolves every queued outcome in the order it was pushed.
    pub fn drain<E>(&self, environment: &E, settings: &RaycastSettings) -> Vec<Resolved>
    where
        E: Environment + ?Sized,
    {
        let resolved: Vec<Resolved> = self
            .0
            .try_iter()
            .map(|outcome| Resolved::new(outcome, environment, settings))
            .collect();
        if !resolved.is_empty() {
            debug!("drained {} frame outcomes", resolved.len());
        }
        resolved
    }
}
