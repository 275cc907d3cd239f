//! Room session engine for Scrawl.
//!
//! Each room runs as an isolated Tokio task (actor model) owning its
//! membership, scores, current drawer, and current word. The registry
//! maps room IDs to actor handles and fans registry-wide notifications
//! out to lobby listeners.
//!
//! # Key types
//!
//! - [`RoomRegistry`] — creates/destroys rooms, routes member removal
//! - [`RoomHandle`] — send commands to a running room actor
//! - [`RoomOptions`] — what a creator asks for (validated on create)
//! - [`StateMirror`] — optional durable-copy hook for the embedding app
//! - [`rotation`] / [`guess`] — the pure turn-rotation and
//!   guess-matching rules

mod config;
mod error;
pub mod guess;
mod registry;
mod room;
pub mod rotation;
mod store;

pub use config::RoomOptions;
pub use error::RoomError;
pub use registry::RoomRegistry;
pub use room::{
    ChatOutcome, EventSender, JoinOutcome, LeaveOutcome, RoomHandle,
    RoomInfo,
};
pub use store::{
    MemberSnapshot, MirrorError, NoopMirror, RoomSnapshot, StateMirror,
};
