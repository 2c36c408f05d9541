use std::sync::Arc;

use tracing::debug;

use crate::event::{ActionEvent, CancelEvent, EventHub, EventKind, EventWaiter, GoalEvent, ResultEvent};
use crate::record::{ActionRecord, Field, GoalStatus, RecordPatch};
use crate::store::RecordStore;
use crate::{Error, Result};

/// The client/server view of one shared record: snapshot reads, merge
/// writes, and the derived domain events.
///
/// `await_event` is one-shot and never replays past firings; `subscribe`
/// installs the persistent listener for an event kind, replacing any
/// previous one.
pub trait ChangeChannel {
    fn get(&self) -> Result<ActionRecord>;
    fn set(&self, patch: RecordPatch) -> Result<()>;
    fn await_event(&self, kind: EventKind) -> EventWaiter;
    fn subscribe(&self, kind: EventKind, listener: impl Fn(ActionEvent) + Send + Sync + 'static);
}

/// Derives semantic events from one change notification. The rules are
/// independent; ordinary traffic satisfies at most one per update, but a
/// pathological update can fire several.
///
/// A goal submission is the co-occurrence of a fresh id and pending status
/// in the same update, so a store that delivers those two field changes in
/// separate notifications will not produce a `goal` event.
pub fn derive_events(changed: &[Field], record: &ActionRecord) -> Vec<ActionEvent> {
    let mut events = Vec::new();

    if changed.contains(&Field::GoalId)
        && changed.contains(&Field::Status)
        && !record.goal_id.is_empty()
        && record.status == GoalStatus::Pending
    {
        debug!(goal_id = %record.goal_id, "received a new goal");
        events.push(ActionEvent::Goal(GoalEvent {
            goal_id: record.goal_id.clone(),
            status: record.status,
            goal: record.goal.clone(),
        }));
    }

    if changed.contains(&Field::IsPreemptRequested) && record.is_preempt_requested {
        debug!(goal_id = %record.goal_id, "cancel requested");
        events.push(ActionEvent::Cancel(CancelEvent {
            goal_id: record.goal_id.clone(),
        }));
    }

    if changed.contains(&Field::Status) && record.status.is_terminal() {
        debug!(goal_id = %record.goal_id, status = %record.status, "goal finished");
        events.push(ActionEvent::Result(ResultEvent {
            goal_id: record.goal_id.clone(),
            status: record.status,
            result: record.result.clone(),
        }));
    }

    events
}

/// Channel with no backing store: a bare event bus. Reads and writes are
/// programming errors here; only the event surface works.
#[derive(Clone, Default)]
pub struct DetachedChannel {
    hub: Arc<EventHub>,
}

impl DetachedChannel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn emit(&self, event: ActionEvent) {
        self.hub.emit(event);
    }
}

impl ChangeChannel for DetachedChannel {
    fn get(&self) -> Result<ActionRecord> {
        Err(Error::Unsupported("get"))
    }

    fn set(&self, _patch: RecordPatch) -> Result<()> {
        Err(Error::Unsupported("set"))
    }

    fn await_event(&self, kind: EventKind) -> EventWaiter {
        self.hub.waiter(kind)
    }

    fn subscribe(&self, kind: EventKind, listener: impl Fn(ActionEvent) + Send + Sync + 'static) {
        self.hub.listen(kind, Arc::new(listener));
    }
}

/// Store-backed channel for one record key. Construction wires the
/// derivation rules into the store's change feed; derivation runs
/// synchronously within the store's dispatch, so a status written before an
/// event fires is visible to any read made by that event's listener.
///
/// Clones share the same hub and subscription.
pub struct StoreChannel<S> {
    store: Arc<S>,
    key: String,
    hub: Arc<EventHub>,
}

impl<S: RecordStore> StoreChannel<S> {
    pub fn new(store: Arc<S>, key: impl Into<String>) -> Self {
        let key = key.into();
        let hub = Arc::new(EventHub::default());

        let derived = Arc::clone(&hub);
        store.subscribe(
            &key,
            Arc::new(move |changed, record| {
                for event in derive_events(changed, record) {
                    derived.emit(event);
                }
            }),
        );

        Self { store, key, hub }
    }
}

impl<S> Clone for StoreChannel<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            key: self.key.clone(),
            hub: Arc::clone(&self.hub),
        }
    }
}

impl<S: RecordStore> ChangeChannel for StoreChannel<S> {
    fn get(&self) -> Result<ActionRecord> {
        self.store.read(&self.key)
    }

    fn set(&self, patch: RecordPatch) -> Result<()> {
        self.store.update(&self.key, patch)
    }

    fn await_event(&self, kind: EventKind) -> EventWaiter {
        self.hub.waiter(kind)
    }

    fn subscribe(&self, kind: EventKind, listener: impl Fn(ActionEvent) + Send + Sync + 'static) {
        self.hub.listen(kind, Arc::new(listener));
    }
}
