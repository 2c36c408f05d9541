use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Lifecycle states of the current goal. `Preempted`, `Succeeded` and
/// `Aborted` are terminal: nothing moves the record out of them except a new
/// goal submission.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GoalStatus {
    Pending,
    Active,
    Preempted,
    #[default]
    Succeeded,
    Aborted,
}

impl GoalStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Preempted | Self::Succeeded | Self::Aborted)
    }
}

impl std::fmt::Display for GoalStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Pending => "pending",
            Self::Active => "active",
            Self::Preempted => "preempted",
            Self::Succeeded => "succeeded",
            Self::Aborted => "aborted",
        };
        f.write_str(name)
    }
}

/// The shared document both sides coordinate through. Pure data; every rule
/// about who may write which field lives in [`crate::client`] and
/// [`crate::server`].
///
/// An empty `goal_id` means no goal was ever sent.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ActionRecord {
    pub goal_id: String,
    pub status: GoalStatus,
    pub goal: Value,
    pub result: Value,
    pub is_preempt_requested: bool,
}

impl Default for ActionRecord {
    /// The reset state a freshly attached server establishes: terminal, empty
    /// payloads, no preempt pending.
    fn default() -> Self {
        Self {
            goal_id: String::new(),
            status: GoalStatus::Succeeded,
            goal: Value::Null,
            result: Value::Null,
            is_preempt_requested: false,
        }
    }
}

/// Names of the record fields, as reported by the store's change feed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Field {
    GoalId,
    Status,
    Goal,
    Result,
    IsPreemptRequested,
}

/// A merge-update: only the `Some` fields are written, the rest are left
/// untouched. Safe to apply empty.
#[derive(Clone, Debug, Default)]
pub struct RecordPatch {
    pub goal_id: Option<String>,
    pub status: Option<GoalStatus>,
    pub goal: Option<Value>,
    pub result: Option<Value>,
    pub is_preempt_requested: Option<bool>,
}

impl RecordPatch {
    /// Full overwrite with the default record.
    pub fn reset() -> Self {
        let ActionRecord {
            goal_id,
            status,
            goal,
            result,
            is_preempt_requested,
        } = ActionRecord::default();
        Self {
            goal_id: Some(goal_id),
            status: Some(status),
            goal: Some(goal),
            result: Some(result),
            is_preempt_requested: Some(is_preempt_requested),
        }
    }

    /// Merges into `record` and reports which fields actually changed value.
    /// Writing a field to the value it already holds is not a change, so it
    /// never reaches the change feed.
    pub fn apply(&self, record: &mut ActionRecord) -> Vec<Field> {
        let mut changed = Vec::new();
        if let Some(goal_id) = &self.goal_id
            && *goal_id != record.goal_id
        {
            record.goal_id = goal_id.clone();
            changed.push(Field::GoalId);
        }
        if let Some(status) = self.status
            && status != record.status
        {
            record.status = status;
            changed.push(Field::Status);
        }
        if let Some(goal) = &self.goal
            && *goal != record.goal
        {
            record.goal = goal.clone();
            changed.push(Field::Goal);
        }
        if let Some(result) = &self.result
            && *result != record.result
        {
            record.result = result.clone();
            changed.push(Field::Result);
        }
        if let Some(flag) = self.is_preempt_requested
            && flag != record.is_preempt_requested
        {
            record.is_preempt_requested = flag;
            changed.push(Field::IsPreemptRequested);
        }
        changed
    }
}
