//! Wire types for Scrawl: everything that travels between client and server.
//!
//! Inbound traffic is a [`ClientCommand`]; outbound traffic is a
//! [`ServerEvent`]. Both are internally tagged (`#[serde(tag = "type")]`)
//! so the JSON carries a `"type"` discriminator that browser clients can
//! switch on directly.

use std::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Identity types
// ---------------------------------------------------------------------------

/// A player's name. Unique within a room, not globally.
///
/// `#[serde(transparent)]` makes this serialize as the bare string, so
/// `Username("ala")` is just `"ala"` on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Username(pub String);

impl Username {
    /// Returns the name as a `&str`.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Username {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Username {
    fn from(name: &str) -> Self {
        Self(name.to_string())
    }
}

/// A unique identifier for a room, stable for the process lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoomId(pub u64);

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "room-{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Recipient — who should receive an event?
// ---------------------------------------------------------------------------

/// Specifies who should receive a server event.
///
/// Room mutations return ordered `(Recipient, ServerEvent)` pairs; the
/// dispatcher resolves each recipient against the room's live connection
/// set. Drawing-stroke and canvas-clear events always use `AllExcept` so
/// the drawer never receives an echo of their own strokes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Recipient {
    /// Every member of the room.
    All,

    /// One specific member.
    Member(Username),

    /// Everyone except the named member (typically the sender).
    AllExcept(Username),
}

// ---------------------------------------------------------------------------
// Room metadata
// ---------------------------------------------------------------------------

/// Whether a room is open to everyone or requires a password.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    Public,
    Private,
}

/// One row of the scoreboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreEntry {
    pub username: Username,
    pub score: u32,
    /// Marks the member currently holding the pencil.
    pub is_drawer: bool,
}

/// A summary of a room as shown in the lobby listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoomListEntry {
    pub room_id: RoomId,
    pub name: String,
    pub member_count: usize,
    pub capacity: usize,
    pub visibility: Visibility,
}

// ---------------------------------------------------------------------------
// ClientCommand — inbound
// ---------------------------------------------------------------------------

/// Everything a client can ask the server to do.
///
/// One enum instead of one callback per message type: the connection
/// handler pattern-matches a command and calls the matching registry or
/// room operation, so transport concerns stay out of the state mutation
/// path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ClientCommand {
    /// First frame on every connection: declares who is talking.
    Hello { username: Username },

    /// Create a room and become its creator.
    CreateRoom {
        name: String,
        visibility: Visibility,
        /// Required when `visibility` is `Private`.
        password: Option<String>,
        capacity: usize,
        round_secs: u64,
    },

    /// Join a room (idempotent for a name already in the room).
    Join {
        room_id: RoomId,
        password: Option<String>,
    },

    /// Leave the current room.
    Leave,

    /// Send a chat message — which is also how guesses are made.
    Chat { text: String },

    /// Start a round (drawer only): picks a random word.
    StartRound,

    /// End the current round without a winner and rotate the drawer.
    EndRound,

    /// A drawing stroke, relayed to everyone else in the room.
    Stroke {
        x1: f32,
        y1: f32,
        x2: f32,
        y2: f32,
        color: String,
        width: f32,
    },

    /// Wipe the canvas for everyone else in the room.
    ClearCanvas,

    /// Request the lobby room listing.
    ListRooms,

    /// Delete a room (creator only).
    DeleteRoom { room_id: RoomId },
}

// ---------------------------------------------------------------------------
// ServerEvent — outbound
// ---------------------------------------------------------------------------

/// Everything the server can tell a client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ServerEvent {
    /// Reply to `Hello`: the connection is registered.
    Welcome { username: Username },

    /// Reply to `CreateRoom`.
    RoomCreated { room_id: RoomId },

    /// Reply to `Join`.
    Joined { room_id: RoomId },

    /// A human-readable system notice ("ala joined the room", …).
    Notice { text: String },

    /// A chat message, relayed verbatim to the whole room.
    Chat {
        from: Username,
        text: String,
        /// Local wall-clock `"HH:MM"` at the time the server relayed it.
        time: String,
    },

    /// The full scoreboard, pushed after every membership or score change.
    Scoreboard { entries: Vec<ScoreEntry> },

    /// A new drawer was selected. `word_length` is always 0 here — the
    /// fresh round has no word until the drawer starts it.
    DrawerChanged {
        drawer: Username,
        word_length: usize,
    },

    /// A round began. The word itself goes only to the drawer, everyone
    /// else learns its length.
    RoundStarted {
        drawer: Username,
        word_length: usize,
        round_secs: u64,
    },

    /// Private to the drawer: the word to draw.
    YourWord { word: String, round_secs: u64 },

    /// The round is over. `winner` is `None` when the round was ended
    /// without a correct guess.
    RoundEnded {
        winner: Option<Username>,
        word: String,
    },

    /// A relayed drawing stroke (never echoed back to its sender).
    Stroke {
        x1: f32,
        y1: f32,
        x2: f32,
        y2: f32,
        color: String,
        width: f32,
    },

    /// The canvas was wiped (never echoed back to its sender).
    CanvasCleared,

    /// Reply to `ListRooms`.
    RoomList { rooms: Vec<RoomListEntry> },

    /// A room disappeared. Broadcast registry-wide so lobby views can
    /// refresh even though their connections are in no room.
    RoomDeleted { room_id: RoomId },

    /// Something went wrong. `code` follows HTTP conventions
    /// (400 bad request, 401 unauthorized, 404 not found, …).
    Error { code: u16, message: String },
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    //! Wire-shape tests. Browser clients parse these JSON structures
    //! directly, so the serde attributes must produce exactly the
    //! documented format.

    use super::*;

    // =====================================================================
    // Identity types
    // =====================================================================

    #[test]
    fn test_username_serializes_as_plain_string() {
        // `#[serde(transparent)]` → `"ala"`, not `{"0":"ala"}`.
        let json = serde_json::to_string(&Username::from("ala")).unwrap();
        assert_eq!(json, "\"ala\"");
    }

    #[test]
    fn test_username_deserializes_from_plain_string() {
        let name: Username = serde_json::from_str("\"bob\"").unwrap();
        assert_eq!(name, Username::from("bob"));
    }

    #[test]
    fn test_room_id_serializes_as_plain_number() {
        let json = serde_json::to_string(&RoomId(7)).unwrap();
        assert_eq!(json, "7");
    }

    #[test]
    fn test_room_id_display() {
        assert_eq!(RoomId(3).to_string(), "room-3");
    }

    // =====================================================================
    // ClientCommand
    // =====================================================================

    #[test]
    fn test_client_command_hello_json_format() {
        let cmd = ClientCommand::Hello {
            username: Username::from("ala"),
        };
        let json: serde_json::Value = serde_json::to_value(&cmd).unwrap();

        assert_eq!(json["type"], "Hello");
        assert_eq!(json["username"], "ala");
    }

    #[test]
    fn test_client_command_create_room_round_trip() {
        let cmd = ClientCommand::CreateRoom {
            name: "friday night".into(),
            visibility: Visibility::Private,
            password: Some("hunter2".into()),
            capacity: 8,
            round_secs: 90,
        };
        let bytes = serde_json::to_vec(&cmd).unwrap();
        let decoded: ClientCommand = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(cmd, decoded);
    }

    #[test]
    fn test_client_command_join_without_password() {
        let cmd = ClientCommand::Join {
            room_id: RoomId(1),
            password: None,
        };
        let json: serde_json::Value = serde_json::to_value(&cmd).unwrap();
        assert_eq!(json["type"], "Join");
        assert_eq!(json["room_id"], 1);
        assert!(json["password"].is_null());
    }

    #[test]
    fn test_client_command_chat_round_trip() {
        let cmd = ClientCommand::Chat {
            text: "is it a cat?".into(),
        };
        let bytes = serde_json::to_vec(&cmd).unwrap();
        let decoded: ClientCommand = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(cmd, decoded);
    }

    #[test]
    fn test_client_command_stroke_round_trip() {
        let cmd = ClientCommand::Stroke {
            x1: 10.0,
            y1: 20.0,
            x2: 30.0,
            y2: 40.0,
            color: "#000000".into(),
            width: 5.0,
        };
        let bytes = serde_json::to_vec(&cmd).unwrap();
        let decoded: ClientCommand = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(cmd, decoded);
    }

    #[test]
    fn test_client_command_unit_variants_round_trip() {
        for cmd in [
            ClientCommand::Leave,
            ClientCommand::StartRound,
            ClientCommand::EndRound,
            ClientCommand::ClearCanvas,
            ClientCommand::ListRooms,
        ] {
            let bytes = serde_json::to_vec(&cmd).unwrap();
            let decoded: ClientCommand =
                serde_json::from_slice(&bytes).unwrap();
            assert_eq!(cmd, decoded);
        }
    }

    #[test]
    fn test_client_command_unknown_type_returns_error() {
        let unknown = r#"{"type": "TeleportDrawer", "speed": 9000}"#;
        let result: Result<ClientCommand, _> = serde_json::from_str(unknown);
        assert!(result.is_err());
    }

    // =====================================================================
    // ServerEvent
    // =====================================================================

    #[test]
    fn test_server_event_chat_json_format() {
        let event = ServerEvent::Chat {
            from: Username::from("bob"),
            text: "apple".into(),
            time: "13:37".into(),
        };
        let json: serde_json::Value = serde_json::to_value(&event).unwrap();

        assert_eq!(json["type"], "Chat");
        assert_eq!(json["from"], "bob");
        assert_eq!(json["text"], "apple");
        assert_eq!(json["time"], "13:37");
    }

    #[test]
    fn test_server_event_drawer_changed_json_format() {
        let event = ServerEvent::DrawerChanged {
            drawer: Username::from("ala"),
            word_length: 0,
        };
        let json: serde_json::Value = serde_json::to_value(&event).unwrap();

        assert_eq!(json["type"], "DrawerChanged");
        assert_eq!(json["drawer"], "ala");
        assert_eq!(json["word_length"], 0);
    }

    #[test]
    fn test_server_event_round_started_hides_nothing_but_the_word() {
        // RoundStarted carries length and duration, never the word text.
        let event = ServerEvent::RoundStarted {
            drawer: Username::from("ala"),
            word_length: 5,
            round_secs: 90,
        };
        let json: serde_json::Value = serde_json::to_value(&event).unwrap();

        assert_eq!(json["type"], "RoundStarted");
        assert_eq!(json["word_length"], 5);
        assert_eq!(json["round_secs"], 90);
        assert!(json.get("word").is_none());
    }

    #[test]
    fn test_server_event_round_ended_with_winner() {
        let event = ServerEvent::RoundEnded {
            winner: Some(Username::from("bob")),
            word: "apple".into(),
        };
        let json: serde_json::Value = serde_json::to_value(&event).unwrap();
        assert_eq!(json["winner"], "bob");
        assert_eq!(json["word"], "apple");
    }

    #[test]
    fn test_server_event_round_ended_without_winner() {
        // Timer-expired rounds end with winner = null.
        let event = ServerEvent::RoundEnded {
            winner: None,
            word: "apple".into(),
        };
        let json: serde_json::Value = serde_json::to_value(&event).unwrap();
        assert!(json["winner"].is_null());
    }

    #[test]
    fn test_server_event_scoreboard_round_trip() {
        let event = ServerEvent::Scoreboard {
            entries: vec![
                ScoreEntry {
                    username: Username::from("ala"),
                    score: 3,
                    is_drawer: true,
                },
                ScoreEntry {
                    username: Username::from("bob"),
                    score: 1,
                    is_drawer: false,
                },
            ],
        };
        let bytes = serde_json::to_vec(&event).unwrap();
        let decoded: ServerEvent = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(event, decoded);
    }

    #[test]
    fn test_server_event_room_list_round_trip() {
        let event = ServerEvent::RoomList {
            rooms: vec![RoomListEntry {
                room_id: RoomId(1),
                name: "friday night".into(),
                member_count: 2,
                capacity: 8,
                visibility: Visibility::Public,
            }],
        };
        let bytes = serde_json::to_vec(&event).unwrap();
        let decoded: ServerEvent = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(event, decoded);
    }

    #[test]
    fn test_visibility_serializes_lowercase() {
        let json = serde_json::to_string(&Visibility::Private).unwrap();
        assert_eq!(json, "\"private\"");
    }

    #[test]
    fn test_server_event_error_json_format() {
        let event = ServerEvent::Error {
            code: 401,
            message: "wrong password".into(),
        };
        let json: serde_json::Value = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "Error");
        assert_eq!(json["code"], 401);
    }

    // =====================================================================
    // Malformed input
    // =====================================================================

    #[test]
    fn test_decode_garbage_returns_error() {
        let garbage = b"not json at all";
        let result: Result<ClientCommand, _> =
            serde_json::from_slice(garbage);
        assert!(result.is_err());
    }

    #[test]
    fn test_decode_missing_fields_returns_error() {
        // `Join` without a room_id must not parse.
        let wrong = r#"{"type": "Join"}"#;
        let result: Result<ClientCommand, _> = serde_json::from_str(wrong);
        assert!(result.is_err());
    }
}
