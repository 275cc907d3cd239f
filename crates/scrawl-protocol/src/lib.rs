//! Wire protocol for Scrawl.
//!
//! This crate defines the "language" that clients and the game server
//! speak:
//!
//! - **Types** ([`ClientCommand`], [`ServerEvent`], [`Username`],
//!   [`RoomId`], …) — the structures that travel on the wire.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]) — how those messages are
//!   converted to/from bytes.
//! - **Errors** ([`ProtocolError`]) — what can go wrong doing so.
//!
//! The protocol layer sits between transport (raw bytes) and the room
//! engine (game state). It knows nothing about connections or rooms —
//! only message shapes.

mod codec;
mod error;
mod types;

pub use codec::Codec;
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use error::ProtocolError;
pub use types::{
    ClientCommand, Recipient, RoomId, RoomListEntry, ScoreEntry,
    ServerEvent, Username, Visibility,
};
