use serde_json::Value;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::channel::ChangeChannel;
use crate::event::{EventKind, ResultEvent};
use crate::record::{GoalStatus, RecordPatch};
use crate::Result;

/// Source of goal ids. Globally unique opaque strings, no further structure.
pub trait IdGenerator {
    fn new_id(&self) -> String;
}

/// Random v4 uuids, the default id source.
#[derive(Clone, Copy, Debug, Default)]
pub struct UuidId;

impl IdGenerator for UuidId {
    fn new_id(&self) -> String {
        Uuid::new_v4().to_string()
    }
}

/// Outcome of a cancel request. Cancelling with nothing outstanding is a
/// no-op, not an error.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CancelOutcome {
    /// The preempt flag was raised; the server honors it cooperatively.
    Requested { goal_id: String },
    NoActiveGoal { current: GoalStatus },
}

/// The task requester's side of the record: submits goals, requests
/// preemption, waits for terminal results.
pub struct ActionClient<C, I = UuidId> {
    channel: C,
    ids: I,
}

impl<C: ChangeChannel> ActionClient<C> {
    pub fn new(channel: C) -> Self {
        Self {
            channel,
            ids: UuidId,
        }
    }
}

impl<C, I> ActionClient<C, I>
where
    C: ChangeChannel,
    I: IdGenerator,
{
    pub fn with_id_generator(channel: C, ids: I) -> Self {
        Self { channel, ids }
    }

    /// Snapshot of the result-bearing fields. Always read fresh from the
    /// record; nothing is cached across calls.
    pub fn get_result(&self) -> Result<ResultEvent> {
        let record = self.channel.get()?;
        Ok(ResultEvent {
            goal_id: record.goal_id,
            status: record.status,
            result: record.result,
        })
    }

    /// Submits a new goal and returns its freshly generated id.
    ///
    /// At most one goal is in flight per record, so any outstanding goal is
    /// first cancelled and awaited to a terminal status. This is a full
    /// replace-and-wait, not a fire-and-forget enqueue; it suspends
    /// indefinitely if no server ever finishes the outstanding goal.
    pub async fn send_goal(&self, goal: Value) -> Result<String> {
        self.cancel_goal()?;
        self.wait_for_result().await?;

        let goal_id = self.ids.new_id();
        debug!(%goal_id, "sending goal");
        self.channel.set(RecordPatch {
            goal_id: Some(goal_id.clone()),
            status: Some(GoalStatus::Pending),
            goal: Some(goal),
            ..Default::default()
        })?;
        Ok(goal_id)
    }

    /// Raises the preempt flag and returns immediately; it does not wait for
    /// the server to honor the request. The flag is cleared again by the
    /// server's `preempt` transition.
    pub fn cancel_goal(&self) -> Result<CancelOutcome> {
        let ResultEvent {
            goal_id, status, ..
        } = self.get_result()?;
        if status.is_terminal() {
            warn!(%status, "no active goal to cancel");
            return Ok(CancelOutcome::NoActiveGoal { current: status });
        }

        debug!(%goal_id, %status, "requesting preempt");
        self.channel.set(RecordPatch {
            is_preempt_requested: Some(true),
            ..Default::default()
        })?;
        Ok(CancelOutcome::Requested { goal_id })
    }

    /// Resolves `true` once the record holds a terminal status, immediately
    /// if it already does. The wait is not correlated to a particular goal
    /// id: if another goal is submitted while this wait is pending, it may
    /// wake for that goal's result instead. Callers that care re-read
    /// [`Self::get_result`] and compare ids.
    pub async fn wait_for_result(&self) -> Result<bool> {
        // register before reading so a firing between the two is not lost
        let waiter = self.channel.await_event(EventKind::Result);
        if self.channel.get()?.status.is_terminal() {
            return Ok(true);
        }
        waiter.await;
        Ok(true)
    }
}
