//! `Server` builder and accept loop.
//!
//! This ties the layers together: transport → protocol → session → room
//! engine. Each accepted connection gets its own handler task.

use std::sync::Arc;

use scrawl_protocol::{Codec, JsonCodec};
use scrawl_room::{NoopMirror, RoomRegistry, StateMirror};
use scrawl_session::ConnectionTracker;
use scrawl_transport::{Transport, WebSocketTransport};
use scrawl_words::{WordList, WordPool};
use tokio::sync::Mutex;

use crate::ScrawlError;
use crate::handler::handle_connection;

/// Shared server state passed to each connection handler task.
///
/// Wrapped in `Arc`; the registry is internally synchronized, the
/// tracker sits behind a mutex that is only ever held for map lookups.
pub(crate) struct ServerState<C: Codec> {
    pub(crate) registry: RoomRegistry,
    pub(crate) tracker: Mutex<ConnectionTracker>,
    pub(crate) codec: C,
}

/// Builder for configuring and starting a Scrawl server.
///
/// # Example
///
/// ```rust,no_run
/// use std::sync::Arc;
/// use scrawl::ServerBuilder;
/// use scrawl_words::WordList;
///
/// # async fn run() -> Result<(), scrawl::ScrawlError> {
/// let server = ServerBuilder::new()
///     .bind("0.0.0.0:8080")
///     .words(Arc::new(WordList::seeded(["apple", "house", "turtle"])))
///     .build()
///     .await?;
/// server.run().await
/// # }
/// ```
pub struct ServerBuilder {
    bind_addr: String,
    words: Arc<dyn WordPool>,
    mirror: Arc<dyn StateMirror>,
}

impl ServerBuilder {
    /// Creates a new builder with default settings: localhost, an empty
    /// word pool, no mirror.
    pub fn new() -> Self {
        Self {
            bind_addr: "127.0.0.1:8080".to_string(),
            words: Arc::new(WordList::new()),
            mirror: Arc::new(NoopMirror),
        }
    }

    /// Sets the address to bind the server to.
    pub fn bind(mut self, addr: &str) -> Self {
        self.bind_addr = addr.to_string();
        self
    }

    /// Sets the word pool rounds draw from.
    pub fn words(mut self, words: Arc<dyn WordPool>) -> Self {
        self.words = words;
        self
    }

    /// Sets the state mirror that receives room snapshots.
    pub fn mirror(mut self, mirror: Arc<dyn StateMirror>) -> Self {
        self.mirror = mirror;
        self
    }

    /// Binds the transport and builds the server. Uses `JsonCodec` and
    /// `WebSocketTransport`.
    pub async fn build(self) -> Result<Server<JsonCodec>, ScrawlError> {
        let transport = WebSocketTransport::bind(&self.bind_addr).await?;

        let state = Arc::new(ServerState {
            registry: RoomRegistry::new(self.words, self.mirror),
            tracker: Mutex::new(ConnectionTracker::new()),
            codec: JsonCodec,
        });

        Ok(Server { transport, state })
    }
}

impl Default for ServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A running Scrawl game server.
///
/// Call [`run()`](Self::run) to start accepting connections.
pub struct Server<C: Codec> {
    transport: WebSocketTransport,
    state: Arc<ServerState<C>>,
}

impl<C> Server<C>
where
    C: Codec + Clone,
{
    /// Creates a new builder.
    pub fn builder() -> ServerBuilder {
        ServerBuilder::new()
    }

    /// Returns the local address the server is bound to.
    pub fn local_addr(&self) -> std::io::Result<std::net::SocketAddr> {
        self.transport.local_addr()
    }

    /// Runs the server accept loop.
    ///
    /// Accepts incoming connections and spawns a handler task for each.
    /// Runs until the process is terminated.
    pub async fn run(mut self) -> Result<(), ScrawlError> {
        tracing::info!("Scrawl server running");

        loop {
            match self.transport.accept().await {
                Ok(conn) => {
                    let state = Arc::clone(&self.state);
                    tokio::spawn(async move {
                        if let Err(e) =
                            handle_connection::<C>(conn, state).await
                        {
                            tracing::debug!(
                                error = %e,
                                "connection ended with error"
                            );
                        }
                    });
                }
                Err(e) => {
                    tracing::error!(error = %e, "accept failed");
                }
            }
        }
    }
}
