//! Per-connection handler: hello handshake, command dispatch, event pump.
//!
//! Each accepted connection gets its own Tokio task running this handler.
//! The flow is:
//!   1. Receive `Hello` → register the connection's identity
//!   2. Spawn the outbound pump (room events + lobby notifications)
//!   3. Loop: receive commands → dispatch to the registry or the
//!      connection's current room
//!   4. On close: run the same member-removal cleanup a polite `Leave`
//!      would have

use std::sync::Arc;
use std::time::Duration;

use scrawl_protocol::{
    ClientCommand, Codec, ProtocolError, RoomId, ServerEvent, Username,
};
use scrawl_room::{EventSender, RoomError};
use scrawl_transport::{Connection, ConnectionId, WebSocketConnection};
use tokio::sync::{broadcast, mpsc};

use crate::ScrawlError;
use crate::server::ServerState;

/// How long a fresh connection has to introduce itself.
const HELLO_TIMEOUT: Duration = Duration::from_secs(10);

/// Handles a single connection from accept to close.
pub(crate) async fn handle_connection<C>(
    conn: WebSocketConnection,
    state: Arc<ServerState<C>>,
) -> Result<(), ScrawlError>
where
    C: Codec + Clone,
{
    let conn_id = conn.id();
    tracing::debug!(%conn_id, "handling new connection");

    // --- Step 1: Hello ---
    let username = await_hello(&conn, &state).await?;
    {
        let mut tracker = state.tracker.lock().await;
        tracker.register(conn_id, username.clone())?;
    }
    tracing::info!(%conn_id, %username, "connection registered");

    // --- Step 2: outbound pump ---
    // Room events arrive on this channel (the sender is handed to every
    // room the connection joins); lobby notifications arrive on the
    // registry broadcast. Both multiplex onto the socket.
    let (event_tx, event_rx) = mpsc::unbounded_channel();
    let lobby_rx = state.registry.subscribe_lobby();
    let pump = tokio::spawn(pump_events(
        conn.clone(),
        state.codec.clone(),
        event_rx,
        lobby_rx,
    ));

    // --- Step 3: command loop ---
    // Errors from the loop are held, not returned, so the cleanup below
    // runs no matter how the connection ends.
    let result = serve(&conn, &state, conn_id, &username, &event_tx).await;

    // --- Step 4: cleanup ---
    // Converges with explicit Leave: remove the member from whatever
    // room the connection was in. Idempotent — if a Leave already ran,
    // there is nothing left to remove.
    let presence = state.tracker.lock().await.remove(conn_id);
    if let Some(presence) = presence {
        if let Some(room_id) = presence.room {
            match state
                .registry
                .remove_member(room_id, &presence.username)
                .await
            {
                Ok(_) => {}
                Err(
                    RoomError::NotFound(_) | RoomError::MemberNotFound(..),
                ) => {}
                Err(e) => {
                    tracing::warn!(
                        %room_id,
                        username = %presence.username,
                        error = %e,
                        "disconnect cleanup failed"
                    );
                }
            }
        }
    }

    pump.abort();
    result
}

/// Sends the welcome and runs the command loop until the connection ends.
async fn serve<C: Codec>(
    conn: &WebSocketConnection,
    state: &Arc<ServerState<C>>,
    conn_id: ConnectionId,
    username: &Username,
    event_tx: &EventSender,
) -> Result<(), ScrawlError> {
    send_event(
        conn,
        &state.codec,
        &ServerEvent::Welcome {
            username: username.clone(),
        },
    )
    .await?;

    loop {
        let data = match conn.recv().await {
            Ok(Some(data)) => data,
            Ok(None) => {
                tracing::info!(%username, "connection closed cleanly");
                return Ok(());
            }
            Err(e) => {
                tracing::debug!(%username, error = %e, "recv error");
                return Ok(());
            }
        };

        let command: ClientCommand = match state.codec.decode(&data) {
            Ok(cmd) => cmd,
            Err(e) => {
                // Malformed frames are dropped as if they never arrived.
                tracing::debug!(
                    %username, error = %e, "dropping malformed frame"
                );
                continue;
            }
        };

        dispatch_command(conn, state, conn_id, username, event_tx, command)
            .await?;
    }
}

/// Waits for the `Hello` frame and validates the declared identity.
async fn await_hello<C: Codec>(
    conn: &WebSocketConnection,
    state: &Arc<ServerState<C>>,
) -> Result<Username, ScrawlError> {
    let data = match tokio::time::timeout(HELLO_TIMEOUT, conn.recv()).await
    {
        Ok(Ok(Some(data))) => data,
        Ok(Ok(None)) => {
            return Err(ScrawlError::Protocol(
                ProtocolError::InvalidMessage(
                    "connection closed before hello".into(),
                ),
            ));
        }
        Ok(Err(e)) => return Err(ScrawlError::Transport(e)),
        Err(_) => {
            return Err(ScrawlError::Protocol(
                ProtocolError::InvalidMessage("hello timed out".into()),
            ));
        }
    };

    let command: ClientCommand = state.codec.decode(&data)?;
    let ClientCommand::Hello { username } = command else {
        send_error(conn, &state.codec, 400, "expected Hello").await?;
        return Err(ScrawlError::Protocol(
            ProtocolError::InvalidMessage(
                "first message must be Hello".into(),
            ),
        ));
    };

    if username.as_str().trim().is_empty() {
        send_error(conn, &state.codec, 400, "username must not be empty")
            .await?;
        return Err(ScrawlError::Protocol(
            ProtocolError::InvalidMessage("empty username".into()),
        ));
    }

    Ok(username)
}

/// Routes one decoded command to the registry or the current room.
async fn dispatch_command<C: Codec>(
    conn: &WebSocketConnection,
    state: &Arc<ServerState<C>>,
    conn_id: ConnectionId,
    username: &Username,
    event_tx: &EventSender,
    command: ClientCommand,
) -> Result<(), ScrawlError> {
    match command {
        ClientCommand::Hello { .. } => {
            send_error(conn, &state.codec, 400, "already said hello")
                .await?;
        }

        ClientCommand::CreateRoom {
            name,
            visibility,
            password,
            capacity,
            round_secs,
        } => {
            let result =
                state.registry.create_room(scrawl_room::RoomOptions {
                    name,
                    visibility,
                    password,
                    capacity,
                    round_secs,
                    creator: username.clone(),
                });
            match result {
                Ok(room_id) => {
                    send_event(
                        conn,
                        &state.codec,
                        &ServerEvent::RoomCreated { room_id },
                    )
                    .await?;
                }
                Err(e) => send_room_error(conn, &state.codec, &e).await?,
            }
        }

        ClientCommand::Join { room_id, password } => {
            if current_room(state, conn_id).await.is_some() {
                send_error(
                    conn,
                    &state.codec,
                    409,
                    "leave your current room first",
                )
                .await?;
                return Ok(());
            }

            let join_result = match state.registry.handle(room_id) {
                Ok(handle) => {
                    handle
                        .join(
                            username.clone(),
                            password,
                            event_tx.clone(),
                        )
                        .await
                }
                Err(e) => Err(e),
            };
            match join_result {
                Ok(_) => {
                    let mut tracker = state.tracker.lock().await;
                    tracker.bind_room(conn_id, room_id)?;
                    drop(tracker);
                    send_event(
                        conn,
                        &state.codec,
                        &ServerEvent::Joined { room_id },
                    )
                    .await?;
                }
                Err(e) => send_room_error(conn, &state.codec, &e).await?,
            }
        }

        ClientCommand::Leave => {
            let Some(room_id) = current_room(state, conn_id).await else {
                send_error(conn, &state.codec, 400, "not in a room")
                    .await?;
                return Ok(());
            };
            match state.registry.remove_member(room_id, username).await {
                // Already gone is fine — leave is idempotent.
                Ok(_)
                | Err(
                    RoomError::NotFound(_) | RoomError::MemberNotFound(..),
                ) => {
                    state.tracker.lock().await.clear_room(conn_id);
                }
                Err(e) => send_room_error(conn, &state.codec, &e).await?,
            }
        }

        ClientCommand::Chat { text } => {
            if let Some(handle) =
                current_room_handle(conn, state, conn_id).await?
            {
                if let Err(e) =
                    handle.chat(username.clone(), text).await
                {
                    send_room_error(conn, &state.codec, &e).await?;
                }
            }
        }

        ClientCommand::StartRound => {
            if let Some(handle) =
                current_room_handle(conn, state, conn_id).await?
            {
                // NotDrawer / NoWordsAvailable reach the requester only.
                if let Err(e) =
                    handle.start_round(username.clone()).await
                {
                    send_room_error(conn, &state.codec, &e).await?;
                }
            }
        }

        ClientCommand::EndRound => {
            if let Some(handle) =
                current_room_handle(conn, state, conn_id).await?
            {
                if let Err(e) = handle.end_round().await {
                    send_room_error(conn, &state.codec, &e).await?;
                }
            }
        }

        ClientCommand::Stroke {
            x1,
            y1,
            x2,
            y2,
            color,
            width,
        } => {
            if let Some(handle) =
                current_room_handle(conn, state, conn_id).await?
            {
                if let Err(e) = handle
                    .stroke(
                        username.clone(),
                        x1,
                        y1,
                        x2,
                        y2,
                        color,
                        width,
                    )
                    .await
                {
                    send_room_error(conn, &state.codec, &e).await?;
                }
            }
        }

        ClientCommand::ClearCanvas => {
            if let Some(handle) =
                current_room_handle(conn, state, conn_id).await?
            {
                if let Err(e) =
                    handle.clear_canvas(username.clone()).await
                {
                    send_room_error(conn, &state.codec, &e).await?;
                }
            }
        }

        ClientCommand::ListRooms => {
            let rooms = state.registry.list_rooms().await;
            send_event(
                conn,
                &state.codec,
                &ServerEvent::RoomList { rooms },
            )
            .await?;
        }

        ClientCommand::DeleteRoom { room_id } => {
            // Success needs no direct reply — the lobby broadcast
            // carries the RoomDeleted to everyone, requester included.
            if let Err(e) =
                state.registry.delete_room(room_id, username).await
            {
                send_room_error(conn, &state.codec, &e).await?;
            }
        }
    }

    Ok(())
}

/// Forwards room events and lobby notifications to the socket until the
/// connection or both sources are gone.
async fn pump_events<C: Codec>(
    conn: WebSocketConnection,
    codec: C,
    mut events: mpsc::UnboundedReceiver<ServerEvent>,
    mut lobby: broadcast::Receiver<ServerEvent>,
) {
    loop {
        let event = tokio::select! {
            maybe = events.recv() => match maybe {
                Some(event) => event,
                None => break,
            },
            result = lobby.recv() => match result {
                Ok(event) => event,
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::debug!(skipped, "lobby listener lagged");
                    continue;
                }
                Err(broadcast::error::RecvError::Closed) => break,
            },
        };

        let Ok(bytes) = codec.encode(&event) else {
            tracing::warn!("failed to encode outbound event");
            continue;
        };
        if conn.send(&bytes).await.is_err() {
            break;
        }
    }
}

/// The room the connection is currently in, if any.
async fn current_room<C: Codec>(
    state: &Arc<ServerState<C>>,
    conn_id: ConnectionId,
) -> Option<RoomId> {
    state
        .tracker
        .lock()
        .await
        .get(&conn_id)
        .and_then(|p| p.room)
}

/// Resolves the connection's current room to a live handle, reporting
/// "not in a room" / "room gone" to the client inline.
async fn current_room_handle<C: Codec>(
    conn: &WebSocketConnection,
    state: &Arc<ServerState<C>>,
    conn_id: ConnectionId,
) -> Result<Option<scrawl_room::RoomHandle>, ScrawlError> {
    let Some(room_id) = current_room(state, conn_id).await else {
        send_error(conn, &state.codec, 400, "not in a room").await?;
        return Ok(None);
    };
    match state.registry.handle(room_id) {
        Ok(handle) => Ok(Some(handle)),
        Err(e) => {
            // The room evaporated under us (last member left elsewhere).
            state.tracker.lock().await.clear_room(conn_id);
            send_room_error(conn, &state.codec, &e).await?;
            Ok(None)
        }
    }
}

/// Sends one event to one connection.
async fn send_event<C: Codec>(
    conn: &WebSocketConnection,
    codec: &C,
    event: &ServerEvent,
) -> Result<(), ScrawlError> {
    let bytes = codec.encode(event)?;
    conn.send(&bytes).await.map_err(ScrawlError::Transport)
}

/// Sends a `ServerEvent::Error` to the client.
async fn send_error<C: Codec>(
    conn: &WebSocketConnection,
    codec: &C,
    code: u16,
    message: &str,
) -> Result<(), ScrawlError> {
    send_event(
        conn,
        codec,
        &ServerEvent::Error {
            code,
            message: message.to_string(),
        },
    )
    .await
}

/// Maps a room error to an HTTP-style wire code and sends it.
async fn send_room_error<C: Codec>(
    conn: &WebSocketConnection,
    codec: &C,
    error: &RoomError,
) -> Result<(), ScrawlError> {
    let code = match error {
        RoomError::InvalidOptions(_) => 400,
        RoomError::WrongPassword(_) => 401,
        RoomError::Unauthorized(_) | RoomError::NotDrawer => 403,
        RoomError::NotFound(_)
        | RoomError::MemberNotFound(..)
        | RoomError::NoWordsAvailable => 404,
        RoomError::RoomFull(_) => 409,
        RoomError::Unavailable(_) | RoomError::StoreFailed(_) => 503,
    };
    send_error(conn, codec, code, &error.to_string()).await
}
