//! # Scrawl
//!
//! A real-time multiplayer drawing-and-guessing game server. Players
//! join a room, one draws while the others chat guesses, a correct guess
//! scores a point and rotates the drawer.
//!
//! This crate is the server: it wires the transport, protocol, session,
//! and room-engine layers together. The game rules themselves live in
//! [`scrawl_room`].
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use scrawl::ServerBuilder;
//! use scrawl_words::WordList;
//!
//! # async fn run() -> Result<(), scrawl::ScrawlError> {
//! let server = ServerBuilder::new()
//!     .bind("0.0.0.0:8080")
//!     .words(Arc::new(WordList::seeded(["apple", "house", "turtle"])))
//!     .build()
//!     .await?;
//! server.run().await
//! # }
//! ```

mod error;
mod handler;
mod server;

pub use error::ScrawlError;
pub use server::{Server, ServerBuilder};

/// Commonly used types, re-exported for one-stop imports.
pub mod prelude {
    pub use scrawl_protocol::{
        ClientCommand, RoomId, RoomListEntry, ScoreEntry, ServerEvent,
        Username, Visibility,
    };
    pub use scrawl_room::{
        NoopMirror, RoomError, RoomOptions, RoomRegistry, StateMirror,
    };
    pub use scrawl_words::{Word, WordList, WordPool};

    pub use crate::{ScrawlError, Server, ServerBuilder};
}
