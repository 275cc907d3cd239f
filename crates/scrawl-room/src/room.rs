//! Room actor: an isolated Tokio task that owns one game session.
//!
//! Each room runs in its own task, fed by an mpsc command channel. That
//! gives every room single-writer-at-a-time semantics for free: all
//! mutations on one room are serialized by the actor loop, rooms never
//! block each other, and the "no dangling drawer" invariant holds at
//! every observable point.

use std::sync::Arc;

use rand::seq::IndexedRandom;
use scrawl_protocol::{
    Recipient, RoomId, ScoreEntry, ServerEvent, Username, Visibility,
};
use scrawl_words::WordPool;
use tokio::sync::{mpsc, oneshot};

use crate::config::RoomSettings;
use crate::store::{MemberSnapshot, RoomSnapshot, StateMirror};
use crate::{RoomError, guess, rotation};

/// Channel sender for delivering outbound events to one member's
/// connection.
pub type EventSender = mpsc::UnboundedSender<ServerEvent>;

/// Result of a successful join.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinOutcome {
    /// Member count after the join.
    pub member_count: usize,
    /// `true` when the name was already in the room and the existing
    /// member was reused (idempotent join).
    pub rejoined: bool,
}

/// Result of a successful leave.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LeaveOutcome {
    /// Member count after the removal. Zero means the registry should
    /// clean the room up.
    pub remaining: usize,
}

/// What a chat message turned out to be.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChatOutcome {
    /// `true` if the message was a correct guess that ended the round.
    pub correct_guess: bool,
}

/// A snapshot of room metadata for the lobby.
#[derive(Debug, Clone)]
pub struct RoomInfo {
    pub room_id: RoomId,
    pub name: String,
    pub member_count: usize,
    pub capacity: usize,
    pub visibility: Visibility,
}

/// Commands sent to a room actor through its channel.
pub(crate) enum RoomCommand {
    Join {
        username: Username,
        password: Option<String>,
        sender: EventSender,
        reply: oneshot::Sender<Result<JoinOutcome, RoomError>>,
    },
    Leave {
        username: Username,
        reply: oneshot::Sender<Result<LeaveOutcome, RoomError>>,
    },
    Chat {
        from: Username,
        text: String,
        reply: oneshot::Sender<ChatOutcome>,
    },
    StartRound {
        requester: Username,
        reply: oneshot::Sender<Result<(), RoomError>>,
    },
    EndRound,
    AdvanceDrawer {
        reply: oneshot::Sender<Option<Username>>,
    },
    Stroke {
        from: Username,
        x1: f32,
        y1: f32,
        x2: f32,
        y2: f32,
        color: String,
        width: f32,
    },
    ClearCanvas {
        from: Username,
    },
    Info {
        reply: oneshot::Sender<RoomInfo>,
    },
    /// Creator-authorized deletion: ordered teardown, then the actor
    /// stops.
    Delete {
        requester: Username,
        reply: oneshot::Sender<Result<(), RoomError>>,
    },
    /// Unconditional stop, used by empty-room cleanup.
    Shutdown,
}

/// Handle to a running room actor. Cheap to clone — it's an
/// `mpsc::Sender` wrapper. The registry holds one per room.
#[derive(Clone)]
pub struct RoomHandle {
    room_id: RoomId,
    sender: mpsc::Sender<RoomCommand>,
}

impl RoomHandle {
    /// Returns the room's unique ID.
    pub fn room_id(&self) -> RoomId {
        self.room_id
    }

    /// Adds a member to the room (idempotent for a name already inside).
    pub async fn join(
        &self,
        username: Username,
        password: Option<String>,
        sender: EventSender,
    ) -> Result<JoinOutcome, RoomError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(RoomCommand::Join {
                username,
                password,
                sender,
                reply: reply_tx,
            })
            .await
            .map_err(|_| RoomError::Unavailable(self.room_id))?;
        reply_rx
            .await
            .map_err(|_| RoomError::Unavailable(self.room_id))?
    }

    /// Removes a member from the room.
    pub async fn leave(
        &self,
        username: Username,
    ) -> Result<LeaveOutcome, RoomError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(RoomCommand::Leave {
                username,
                reply: reply_tx,
            })
            .await
            .map_err(|_| RoomError::Unavailable(self.room_id))?;
        reply_rx
            .await
            .map_err(|_| RoomError::Unavailable(self.room_id))?
    }

    /// Delivers a chat message and reports whether it won the round.
    pub async fn chat(
        &self,
        from: Username,
        text: String,
    ) -> Result<ChatOutcome, RoomError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(RoomCommand::Chat {
                from,
                text,
                reply: reply_tx,
            })
            .await
            .map_err(|_| RoomError::Unavailable(self.room_id))?;
        reply_rx
            .await
            .map_err(|_| RoomError::Unavailable(self.room_id))
    }

    /// Starts a round: only the drawer may; picks a random word.
    pub async fn start_round(
        &self,
        requester: Username,
    ) -> Result<(), RoomError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(RoomCommand::StartRound {
                requester,
                reply: reply_tx,
            })
            .await
            .map_err(|_| RoomError::Unavailable(self.room_id))?;
        reply_rx
            .await
            .map_err(|_| RoomError::Unavailable(self.room_id))?
    }

    /// Ends the round without a winner and rotates the drawer. The
    /// embedding server calls this when the round timer expires.
    pub async fn end_round(&self) -> Result<(), RoomError> {
        self.sender
            .send(RoomCommand::EndRound)
            .await
            .map_err(|_| RoomError::Unavailable(self.room_id))
    }

    /// Rotates to the next drawer and clears the word, returning the new
    /// drawer (`None` when the room is empty).
    pub async fn advance_drawer(
        &self,
    ) -> Result<Option<Username>, RoomError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(RoomCommand::AdvanceDrawer { reply: reply_tx })
            .await
            .map_err(|_| RoomError::Unavailable(self.room_id))?;
        reply_rx
            .await
            .map_err(|_| RoomError::Unavailable(self.room_id))
    }

    /// Relays a drawing stroke to everyone except the sender.
    #[allow(clippy::too_many_arguments)]
    pub async fn stroke(
        &self,
        from: Username,
        x1: f32,
        y1: f32,
        x2: f32,
        y2: f32,
        color: String,
        width: f32,
    ) -> Result<(), RoomError> {
        self.sender
            .send(RoomCommand::Stroke {
                from,
                x1,
                y1,
                x2,
                y2,
                color,
                width,
            })
            .await
            .map_err(|_| RoomError::Unavailable(self.room_id))
    }

    /// Relays a canvas wipe to everyone except the sender.
    pub async fn clear_canvas(
        &self,
        from: Username,
    ) -> Result<(), RoomError> {
        self.sender
            .send(RoomCommand::ClearCanvas { from })
            .await
            .map_err(|_| RoomError::Unavailable(self.room_id))
    }

    /// Requests the current room metadata.
    pub async fn info(&self) -> Result<RoomInfo, RoomError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(RoomCommand::Info { reply: reply_tx })
            .await
            .map_err(|_| RoomError::Unavailable(self.room_id))?;
        reply_rx
            .await
            .map_err(|_| RoomError::Unavailable(self.room_id))
    }

    /// Creator-authorized deletion: ordered teardown, then the actor
    /// stops.
    pub async fn delete(
        &self,
        requester: Username,
    ) -> Result<(), RoomError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(RoomCommand::Delete {
                requester,
                reply: reply_tx,
            })
            .await
            .map_err(|_| RoomError::Unavailable(self.room_id))?;
        reply_rx
            .await
            .map_err(|_| RoomError::Unavailable(self.room_id))?
    }

    /// Tells the room actor to stop (empty-room cleanup path).
    pub async fn shutdown(&self) -> Result<(), RoomError> {
        self.sender
            .send(RoomCommand::Shutdown)
            .await
            .map_err(|_| RoomError::Unavailable(self.room_id))
    }
}

/// One member of a room.
///
/// Members keep their insertion order in the actor's `Vec` — that order
/// is the rotation order.
struct Member {
    name: Username,
    score: u32,
    sender: EventSender,
}

/// The internal room actor state. Runs inside a Tokio task.
struct RoomActor {
    room_id: RoomId,
    settings: RoomSettings,
    members: Vec<Member>,
    /// The active secret word; `Some` only while a round is running.
    current_word: Option<String>,
    /// Always names a present member or is `None` — never dangling.
    current_drawer: Option<Username>,
    words: Arc<dyn WordPool>,
    mirror: Arc<dyn StateMirror>,
    receiver: mpsc::Receiver<RoomCommand>,
}

impl RoomActor {
    /// Runs the actor loop, processing commands until deletion or
    /// shutdown.
    async fn run(mut self) {
        tracing::info!(room_id = %self.room_id, "room actor started");

        while let Some(cmd) = self.receiver.recv().await {
            match cmd {
                RoomCommand::Join {
                    username,
                    password,
                    sender,
                    reply,
                } => {
                    let result =
                        self.handle_join(username, password, sender);
                    let _ = reply.send(result);
                }
                RoomCommand::Leave { username, reply } => {
                    let result = self.handle_leave(username);
                    let _ = reply.send(result);
                }
                RoomCommand::Chat { from, text, reply } => {
                    let outcome = self.handle_chat(from, text);
                    let _ = reply.send(outcome);
                }
                RoomCommand::StartRound { requester, reply } => {
                    let result = self.handle_start_round(requester);
                    let _ = reply.send(result);
                }
                RoomCommand::EndRound => {
                    self.handle_end_round();
                }
                RoomCommand::AdvanceDrawer { reply } => {
                    let events = self.rotate();
                    self.dispatch(events);
                    let _ = reply.send(self.current_drawer.clone());
                }
                RoomCommand::Stroke {
                    from,
                    x1,
                    y1,
                    x2,
                    y2,
                    color,
                    width,
                } => {
                    self.handle_stroke(from, x1, y1, x2, y2, color, width);
                }
                RoomCommand::ClearCanvas { from } => {
                    self.handle_clear_canvas(from);
                }
                RoomCommand::Info { reply } => {
                    let _ = reply.send(self.info());
                }
                RoomCommand::Delete { requester, reply } => {
                    if requester != self.settings.creator {
                        let _ = reply.send(Err(RoomError::Unauthorized(
                            self.room_id,
                        )));
                        continue;
                    }
                    self.teardown();
                    let _ = reply.send(Ok(()));
                    break;
                }
                RoomCommand::Shutdown => {
                    tracing::info!(
                        room_id = %self.room_id,
                        "room shutting down"
                    );
                    break;
                }
            }
        }

        tracing::info!(room_id = %self.room_id, "room actor stopped");
    }

    // -- Membership ---------------------------------------------------------

    fn handle_join(
        &mut self,
        username: Username,
        password: Option<String>,
        sender: EventSender,
    ) -> Result<JoinOutcome, RoomError> {
        // Idempotent join: a name already in the room gets its existing
        // member back (score preserved), with the outbound channel
        // re-attached to the new connection.
        if let Some(member) =
            self.members.iter_mut().find(|m| m.name == username)
        {
            member.sender = sender;
            tracing::debug!(
                room_id = %self.room_id,
                %username,
                "member rejoined"
            );

            let mut events = Vec::new();
            if let Some(drawer) = &self.current_drawer {
                // Catch the returning connection up on who draws.
                events.push((
                    Recipient::Member(username.clone()),
                    ServerEvent::DrawerChanged {
                        drawer: drawer.clone(),
                        word_length: 0,
                    },
                ));
            }
            events.push((
                Recipient::All,
                ServerEvent::Scoreboard {
                    entries: self.scoreboard(),
                },
            ));
            self.dispatch(events);

            return Ok(JoinOutcome {
                member_count: self.members.len(),
                rejoined: true,
            });
        }

        if !self.settings.password_matches(password.as_deref()) {
            return Err(RoomError::WrongPassword(self.room_id));
        }
        if self.members.len() >= self.settings.capacity {
            return Err(RoomError::RoomFull(self.room_id));
        }

        self.members.push(Member {
            name: username.clone(),
            score: 0,
            sender,
        });
        tracing::info!(
            room_id = %self.room_id,
            %username,
            members = self.members.len(),
            "member joined"
        );

        let mut events = Vec::new();
        match self.current_drawer.clone() {
            // First member into a drawerless room picks up the pencil.
            None => {
                self.current_drawer = Some(username.clone());
                events.push((
                    Recipient::All,
                    ServerEvent::DrawerChanged {
                        drawer: username.clone(),
                        word_length: 0,
                    },
                ));
            }
            // Otherwise only the newcomer needs to learn who draws.
            Some(drawer) => {
                events.push((
                    Recipient::Member(username.clone()),
                    ServerEvent::DrawerChanged {
                        drawer,
                        word_length: 0,
                    },
                ));
            }
        }
        events.push((
            Recipient::All,
            ServerEvent::Notice {
                text: format!("{username} joined the room"),
            },
        ));
        events.push((
            Recipient::All,
            ServerEvent::Scoreboard {
                entries: self.scoreboard(),
            },
        ));

        self.mirror_after_step("join");
        self.dispatch(events);

        Ok(JoinOutcome {
            member_count: self.members.len(),
            rejoined: false,
        })
    }

    fn handle_leave(
        &mut self,
        username: Username,
    ) -> Result<LeaveOutcome, RoomError> {
        let index = self
            .members
            .iter()
            .position(|m| m.name == username)
            .ok_or_else(|| {
                RoomError::MemberNotFound(username.clone(), self.room_id)
            })?;

        // Drawer-detach plus member-removal is one atomic unit: offer the
        // prospective state to the mirror first, commit only on success.
        let clears_drawer =
            self.current_drawer.as_ref() == Some(&username);
        let prospective = RoomSnapshot {
            room_id: self.room_id,
            members: self
                .members
                .iter()
                .filter(|m| m.name != username)
                .map(|m| MemberSnapshot {
                    username: m.name.clone(),
                    score: m.score,
                })
                .collect(),
            current_drawer: if clears_drawer {
                None
            } else {
                self.current_drawer.clone()
            },
            current_word: self.current_word.clone(),
        };
        if let Err(e) = self.mirror.record(&prospective) {
            tracing::warn!(
                room_id = %self.room_id,
                %username,
                error = %e,
                "mirror rejected removal, keeping state"
            );
            return Err(RoomError::StoreFailed(e.to_string()));
        }

        if clears_drawer {
            self.current_drawer = None;
        }
        self.members.remove(index);
        tracing::info!(
            room_id = %self.room_id,
            %username,
            members = self.members.len(),
            "member left"
        );

        if !self.members.is_empty() {
            self.dispatch(vec![
                (
                    Recipient::All,
                    ServerEvent::Scoreboard {
                        entries: self.scoreboard(),
                    },
                ),
                (
                    Recipient::All,
                    ServerEvent::Notice {
                        text: format!("{username} left the room"),
                    },
                ),
            ]);
        }

        Ok(LeaveOutcome {
            remaining: self.members.len(),
        })
    }

    // -- Chat and scoring ---------------------------------------------------

    fn handle_chat(&mut self, from: Username, text: String) -> ChatOutcome {
        let miss = ChatOutcome {
            correct_guess: false,
        };

        if !self.members.iter().any(|m| m.name == from) {
            tracing::warn!(
                room_id = %self.room_id,
                %from,
                "chat from non-member, ignoring"
            );
            return miss;
        }

        // The chat line itself is always relayed, guess or not.
        let mut events = vec![(
            Recipient::All,
            ServerEvent::Chat {
                from: from.clone(),
                text: text.clone(),
                time: clock_time(),
            },
        )];

        let Some(word) = self.current_word.clone() else {
            // No active round — plain chat.
            self.dispatch(events);
            return miss;
        };

        if !guess::matches(&text, &word) {
            self.dispatch(events);
            return miss;
        }

        if self.current_drawer.as_ref() == Some(&from) {
            // The drawer knows the word; a "guess" from them changes
            // nothing.
            events.push((
                Recipient::Member(from),
                ServerEvent::Notice {
                    text: "you cannot guess your own word".into(),
                },
            ));
            self.dispatch(events);
            return miss;
        }

        // A genuine winner.
        if let Some(member) =
            self.members.iter_mut().find(|m| m.name == from)
        {
            member.score += 1;
        }
        tracing::info!(
            room_id = %self.room_id,
            winner = %from,
            %word,
            "round won"
        );
        self.mirror_after_step("score");

        events.push((
            Recipient::All,
            ServerEvent::Scoreboard {
                entries: self.scoreboard(),
            },
        ));
        events.push((
            Recipient::All,
            ServerEvent::Notice {
                text: format!("{from} guessed the word \"{word}\"!"),
            },
        ));
        events.push((
            Recipient::All,
            ServerEvent::RoundEnded {
                winner: Some(from),
                word,
            },
        ));
        events.extend(self.rotate());
        self.dispatch(events);

        ChatOutcome {
            correct_guess: true,
        }
    }

    // -- Rounds -------------------------------------------------------------

    fn handle_start_round(
        &mut self,
        requester: Username,
    ) -> Result<(), RoomError> {
        if self.current_drawer.as_ref() != Some(&requester) {
            return Err(RoomError::NotDrawer);
        }

        let words = self.words.all_words();
        let Some(word) = words.choose(&mut rand::rng()) else {
            return Err(RoomError::NoWordsAvailable);
        };

        self.current_word = Some(word.text.clone());
        tracing::info!(
            room_id = %self.room_id,
            drawer = %requester,
            word_length = word.char_len(),
            "round started"
        );
        self.mirror_after_step("round start");

        self.dispatch(vec![
            (
                Recipient::All,
                ServerEvent::RoundStarted {
                    drawer: requester.clone(),
                    word_length: word.char_len(),
                    round_secs: self.settings.round_secs,
                },
            ),
            // Only the drawer learns the word itself.
            (
                Recipient::Member(requester),
                ServerEvent::YourWord {
                    word: word.text.clone(),
                    round_secs: self.settings.round_secs,
                },
            ),
        ]);

        Ok(())
    }

    fn handle_end_round(&mut self) {
        let mut events = vec![(
            Recipient::All,
            ServerEvent::Notice {
                text: "round over".into(),
            },
        )];
        if let Some(word) = self.current_word.clone() {
            events.push((
                Recipient::All,
                ServerEvent::RoundEnded { winner: None, word },
            ));
        }
        events.extend(self.rotate());
        self.dispatch(events);
    }

    /// Clears the word, picks the next drawer from the stable member
    /// order, and returns the announcement events. Starting the fresh
    /// round is a separate, explicit `start_round`.
    fn rotate(&mut self) -> Vec<(Recipient, ServerEvent)> {
        self.current_word = None;

        let order: Vec<Username> =
            self.members.iter().map(|m| m.name.clone()).collect();
        let next =
            rotation::next_drawer(&order, self.current_drawer.as_ref());
        self.current_drawer = next.clone();
        self.mirror_after_step("rotation");

        match next {
            None => Vec::new(),
            Some(drawer) => {
                tracing::debug!(
                    room_id = %self.room_id,
                    %drawer,
                    "drawer rotated"
                );
                vec![
                    (
                        Recipient::All,
                        ServerEvent::DrawerChanged {
                            drawer,
                            word_length: 0,
                        },
                    ),
                    (
                        Recipient::All,
                        ServerEvent::Scoreboard {
                            entries: self.scoreboard(),
                        },
                    ),
                ]
            }
        }
    }

    // -- Canvas relay -------------------------------------------------------

    #[allow(clippy::too_many_arguments)]
    fn handle_stroke(
        &self,
        from: Username,
        x1: f32,
        y1: f32,
        x2: f32,
        y2: f32,
        color: String,
        width: f32,
    ) {
        if !self.members.iter().any(|m| m.name == from) {
            return;
        }
        // The sender already drew this locally — never echo it back.
        self.dispatch(vec![(
            Recipient::AllExcept(from),
            ServerEvent::Stroke {
                x1,
                y1,
                x2,
                y2,
                color,
                width,
            },
        )]);
    }

    fn handle_clear_canvas(&self, from: Username) {
        if !self.members.iter().any(|m| m.name == from) {
            return;
        }
        self.dispatch(vec![(
            Recipient::AllExcept(from),
            ServerEvent::CanvasCleared,
        )]);
    }

    // -- Plumbing -----------------------------------------------------------

    /// Delivers events to their recipients, in order. Fire-and-forget: a
    /// closed channel means the connection died, and the member removal
    /// will arrive through the disconnect path shortly.
    fn dispatch(&self, events: Vec<(Recipient, ServerEvent)>) {
        for (recipient, event) in events {
            match recipient {
                Recipient::All => {
                    for member in &self.members {
                        let _ = member.sender.send(event.clone());
                    }
                }
                Recipient::Member(name) => {
                    if let Some(member) =
                        self.members.iter().find(|m| m.name == name)
                    {
                        let _ = member.sender.send(event);
                    }
                }
                Recipient::AllExcept(excluded) => {
                    for member in &self.members {
                        if member.name != excluded {
                            let _ = member.sender.send(event.clone());
                        }
                    }
                }
            }
        }
    }

    fn scoreboard(&self) -> Vec<ScoreEntry> {
        self.members
            .iter()
            .map(|m| ScoreEntry {
                username: m.name.clone(),
                score: m.score,
                is_drawer: self.current_drawer.as_ref() == Some(&m.name),
            })
            .collect()
    }

    fn info(&self) -> RoomInfo {
        RoomInfo {
            room_id: self.room_id,
            name: self.settings.name.clone(),
            member_count: self.members.len(),
            capacity: self.settings.capacity,
            visibility: self.settings.visibility,
        }
    }

    /// Mirrors the current state after a single-step mutation. Failures
    /// here are logged and ignored — the in-memory state is
    /// authoritative for the active session.
    fn mirror_after_step(&self, step: &str) {
        let snapshot = RoomSnapshot {
            room_id: self.room_id,
            members: self
                .members
                .iter()
                .map(|m| MemberSnapshot {
                    username: m.name.clone(),
                    score: m.score,
                })
                .collect(),
            current_drawer: self.current_drawer.clone(),
            current_word: self.current_word.clone(),
        };
        if let Err(e) = self.mirror.record(&snapshot) {
            tracing::warn!(
                room_id = %self.room_id,
                step,
                error = %e,
                "mirror failed, continuing"
            );
        }
    }

    /// Ordered teardown for creator deletion: detach the drawer
    /// reference, drop the round, then remove the members. No step
    /// leaves a dangling reference observable through later commands,
    /// because the actor processes nothing else until it stops.
    fn teardown(&mut self) {
        self.current_drawer = None;
        self.current_word = None;
        self.members.clear();
        if let Err(e) = self.mirror.forget(self.room_id) {
            tracing::warn!(
                room_id = %self.room_id,
                error = %e,
                "mirror failed to forget room"
            );
        }
        tracing::info!(room_id = %self.room_id, "room torn down");
    }
}

/// Current local wall-clock, the way chat clients display it.
fn clock_time() -> String {
    chrono::Local::now().format("%H:%M").to_string()
}

/// Spawns a new room actor task and returns a handle to it.
///
/// `channel_size` bounds the command channel — if a room falls behind,
/// senders wait instead of piling up memory.
pub(crate) fn spawn_room(
    room_id: RoomId,
    settings: RoomSettings,
    words: Arc<dyn WordPool>,
    mirror: Arc<dyn StateMirror>,
    channel_size: usize,
) -> RoomHandle {
    let (tx, rx) = mpsc::channel(channel_size);

    let actor = RoomActor {
        room_id,
        settings,
        members: Vec::new(),
        current_word: None,
        current_drawer: None,
        words,
        mirror,
        receiver: rx,
    };

    tokio::spawn(actor.run());

    RoomHandle {
        room_id,
        sender: tx,
    }
}
