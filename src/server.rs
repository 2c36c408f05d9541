use std::sync::Mutex;

use serde_json::Value;
use tracing::{debug, warn};

use crate::channel::ChangeChannel;
use crate::event::{ActionEvent, CancelEvent, EventKind, GoalEvent};
use crate::record::{GoalStatus, RecordPatch};
use crate::Result;

/// Outcome of a server transition call. A failed precondition is a skipped
/// transition, not an error: the server decided the call was inapplicable.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Transition {
    Applied { status: GoalStatus },
    Skipped { current: GoalStatus },
}

impl Transition {
    pub fn is_applied(&self) -> bool {
        matches!(self, Self::Applied { .. })
    }
}

/// The task executor's side of the record: receives goals and cancel
/// requests, drives the status to a terminal value.
///
/// Construction resets the record to the default terminal state, so the
/// server starts from a known-good condition regardless of prior content.
pub struct ActionServer<C> {
    channel: C,
}

impl<C> ActionServer<C>
where
    C: ChangeChannel + Clone + Send + Sync + 'static,
{
    pub fn new(channel: C) -> Result<Self> {
        channel.set(RecordPatch::reset())?;
        Ok(Self { channel })
    }

    /// Runs `callback` on every new goal. The record is marked `active`
    /// before the callback is invoked, so any concurrent reader sees the
    /// task as claimed. Registering again replaces the previous callback.
    pub fn register_goal_callback(&self, callback: impl FnMut(GoalEvent) + Send + 'static) {
        let channel = self.channel.clone();
        let callback = Mutex::new(callback);
        self.channel.subscribe(EventKind::Goal, move |event| {
            let ActionEvent::Goal(goal) = event else {
                return;
            };
            if let Err(err) = channel.set(RecordPatch {
                status: Some(GoalStatus::Active),
                ..Default::default()
            }) {
                warn!(%err, goal_id = %goal.goal_id, "failed to claim goal");
                return;
            }
            if let Ok(mut callback) = callback.lock() {
                callback(goal);
            }
        });
    }

    /// Runs `callback` on every cancel request. Honoring the request (or
    /// not) is entirely up to the callback; the flag stays raised until a
    /// `preempt` transition clears it.
    pub fn register_preempt_callback(&self, callback: impl FnMut(CancelEvent) + Send + 'static) {
        let callback = Mutex::new(callback);
        self.channel.subscribe(EventKind::Cancel, move |event| {
            let ActionEvent::Cancel(cancel) = event else {
                return;
            };
            if let Ok(mut callback) = callback.lock() {
                callback(cancel);
            }
        });
    }

    pub fn abort(&self, result: Value) -> Result<Transition> {
        self.transition("abort", &[GoalStatus::Active], GoalStatus::Aborted, result, false)
    }

    pub fn preempt(&self, result: Value) -> Result<Transition> {
        self.transition(
            "preempt",
            &[GoalStatus::Pending, GoalStatus::Active],
            GoalStatus::Preempted,
            result,
            true,
        )
    }

    pub fn succeed(&self, result: Value) -> Result<Transition> {
        self.transition("succeed", &[GoalStatus::Active], GoalStatus::Succeeded, result, false)
    }

    // precondition is re-validated against a fresh read immediately before
    // the write; nothing else guards the record
    fn transition(
        &self,
        name: &str,
        allowed: &[GoalStatus],
        next: GoalStatus,
        result: Value,
        clear_preempt: bool,
    ) -> Result<Transition> {
        let current = self.channel.get()?.status;
        if !allowed.contains(&current) {
            debug!(transition = name, %current, "not applicable to a goal in this status");
            return Ok(Transition::Skipped { current });
        }

        self.channel.set(RecordPatch {
            status: Some(next),
            result: Some(result),
            is_preempt_requested: clear_preempt.then_some(false),
            ..Default::default()
        })?;
        Ok(Transition::Applied { status: next })
    }
}
