//! Live connection tracking for Scrawl.
//!
//! A "session" here is the server's record of one live transport
//! connection: who is on it and which room they joined. The tracker is
//! what lets an abrupt disconnect converge on the same cleanup path as a
//! polite `Leave`.
//!
//! # How it fits in the stack
//!
//! ```text
//! Room layer (above)   ← removal of the member the connection carried
//!     ↕
//! Session layer (this crate)  ← connection → (username, room)
//!     ↕
//! Transport layer (below)     ← provides ConnectionId, reports closes
//! ```

mod error;
mod tracker;

pub use error::SessionError;
pub use tracker::{ConnectionTracker, Presence};
