//! Room configuration and validation.

use scrawl_protocol::{Username, Visibility};
use sha2::{Digest, Sha256};

use crate::RoomError;

/// What a creator asks for when opening a room.
///
/// Passed to [`RoomRegistry::create_room`](crate::RoomRegistry::create_room),
/// validated there, and turned into [`RoomSettings`] with the password
/// replaced by its hash.
#[derive(Debug, Clone)]
pub struct RoomOptions {
    /// Display name shown in the lobby.
    pub name: String,

    /// Public rooms are open; private rooms require the password.
    pub visibility: Visibility,

    /// Plaintext password. Required for private rooms, ignored for
    /// public ones.
    pub password: Option<String>,

    /// Maximum member count. Must be at least 1.
    pub capacity: usize,

    /// Round duration in seconds. Must be at least 1. The engine only
    /// reports this value to clients; enforcing the deadline is the
    /// embedding server's policy (an `end_round` call when time is up).
    pub round_secs: u64,

    /// Who opened the room. Only the creator may delete it.
    pub creator: Username,
}

impl RoomOptions {
    /// Validates the options and produces the actor's settled form.
    pub(crate) fn into_settings(self) -> Result<RoomSettings, RoomError> {
        if self.capacity == 0 {
            return Err(RoomError::InvalidOptions(
                "capacity must be at least 1".into(),
            ));
        }
        if self.round_secs == 0 {
            return Err(RoomError::InvalidOptions(
                "round duration must be at least 1 second".into(),
            ));
        }

        let password_hash = match self.visibility {
            Visibility::Private => {
                match self.password.as_deref() {
                    Some(pwd) if !pwd.is_empty() => {
                        Some(hash_password(pwd))
                    }
                    _ => {
                        return Err(RoomError::InvalidOptions(
                            "private room requires a password".into(),
                        ));
                    }
                }
            }
            Visibility::Public => None,
        };

        Ok(RoomSettings {
            name: self.name,
            visibility: self.visibility,
            password_hash,
            capacity: self.capacity,
            round_secs: self.round_secs,
            creator: self.creator,
        })
    }
}

/// A room's immutable configuration as the actor holds it.
///
/// Same shape as [`RoomOptions`] except the password is stored only as a
/// hash.
#[derive(Debug, Clone)]
pub(crate) struct RoomSettings {
    pub name: String,
    pub visibility: Visibility,
    pub password_hash: Option<String>,
    pub capacity: usize,
    pub round_secs: u64,
    pub creator: Username,
}

impl RoomSettings {
    /// Checks a join attempt's password against the stored hash.
    /// Public rooms accept anything.
    pub fn password_matches(&self, password: Option<&str>) -> bool {
        match &self.password_hash {
            None => true,
            Some(hash) => {
                password.is_some_and(|pwd| hash_password(pwd) == *hash)
            }
        }
    }
}

/// Lowercase-hex SHA-256 of the password.
fn hash_password(password: &str) -> String {
    let digest = Sha256::digest(password.as_bytes());
    digest.iter().map(|b| format!("{b:02x}")).collect()
}

// =========================================================================
// Tests
// =========================================================================
