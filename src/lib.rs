pub mod channel;
pub mod client;
pub mod event;
pub mod record;
pub mod registry;
pub mod server;
pub mod store;

pub use channel::{ChangeChannel, DetachedChannel, StoreChannel, derive_events};
pub use client::{ActionClient, CancelOutcome, IdGenerator, UuidId};
pub use event::{ActionEvent, CancelEvent, EventKind, EventWaiter, GoalEvent, ResultEvent};
pub use record::{ActionRecord, Field, GoalStatus, RecordPatch};
pub use registry::Registry;
pub use server::{ActionServer, Transition};
pub use store::{ChangeListener, MemoryStore, RecordStore};

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// `get`/`set` called on a channel with no backing store. This is a
    /// programming error, not a runtime condition, so it surfaces as a hard
    /// failure instead of a logged no-op.
    #[error("`{0}` is not supported by a detached channel")]
    Unsupported(&'static str),
    #[error("no record stored under key `{0}`")]
    MissingRecord(String),
}

pub type Result<T> = std::result::Result<T, Error>;
