use std::collections::HashMap;
use std::pin::Pin;
use std::sync::{Arc, Mutex, PoisonError};
use std::task::{Context, Poll};

use futures::channel::oneshot;
use serde_json::Value;

use crate::record::GoalStatus;

/// A new goal was written into the record.
#[derive(Clone, Debug, PartialEq)]
pub struct GoalEvent {
    pub goal_id: String,
    pub status: GoalStatus,
    pub goal: Value,
}

/// The client asked for the current goal to be preempted.
#[derive(Clone, Debug, PartialEq)]
pub struct CancelEvent {
    pub goal_id: String,
}

/// The record reached a terminal status. Also doubles as the snapshot shape
/// returned by [`crate::ActionClient::get_result`].
#[derive(Clone, Debug, PartialEq)]
pub struct ResultEvent {
    pub goal_id: String,
    pub status: GoalStatus,
    pub result: Value,
}

#[derive(Clone, Debug, PartialEq)]
pub enum ActionEvent {
    Goal(GoalEvent),
    Cancel(CancelEvent),
    Result(ResultEvent),
}

impl ActionEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            Self::Goal(_) => EventKind::Goal,
            Self::Cancel(_) => EventKind::Cancel,
            Self::Result(_) => EventKind::Result,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EventKind {
    Goal,
    Cancel,
    Result,
}

type Listener = Arc<dyn Fn(ActionEvent) + Send + Sync>;

/// Waiter registry plus one persistent listener slot per event kind.
///
/// A firing resolves every waiter registered at that moment (broadcast) and
/// removes them; registrations made after the firing observe nothing — there
/// is no buffering or replay. Locks are released before any waiter or
/// listener is notified, so a listener may emit further events re-entrantly.
#[derive(Default)]
pub(crate) struct EventHub {
    waiters: Mutex<HashMap<EventKind, Vec<oneshot::Sender<ActionEvent>>>>,
    listeners: Mutex<HashMap<EventKind, Listener>>,
}

impl EventHub {
    pub(crate) fn waiter(&self, kind: EventKind) -> EventWaiter {
        let (sender, receiver) = oneshot::channel();
        self.waiters
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(kind)
            .or_default()
            .push(sender);
        EventWaiter { receiver }
    }

    /// Installs the persistent listener for `kind`, replacing any previous
    /// one. At most one listener per kind.
    pub(crate) fn listen(&self, kind: EventKind, listener: Listener) {
        self.listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(kind, listener);
    }

    pub(crate) fn emit(&self, event: ActionEvent) {
        let kind = event.kind();
        let pending = self
            .waiters
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&kind)
            .unwrap_or_default();
        let listener = self
            .listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&kind)
            .cloned();

        for waiter in pending {
            // a dropped waiter just stopped caring
            let _ = waiter.send(event.clone());
        }
        if let Some(listener) = listener {
            listener(event);
        }
    }
}

/// Single-fulfillment future for the next firing of one event kind.
pub struct EventWaiter {
    receiver: oneshot::Receiver<ActionEvent>,
}

impl Future for EventWaiter {
    type Output = ActionEvent;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        match Pin::new(&mut self.receiver).poll(cx) {
            Poll::Ready(Ok(event)) => Poll::Ready(event),
            // hub dropped without firing: the protocol has no timeouts, a
            // wait that can no longer be satisfied stays suspended
            Poll::Ready(Err(oneshot::Canceled)) => Poll::Pending,
            Poll::Pending => Poll::Pending,
        }
    }
}
