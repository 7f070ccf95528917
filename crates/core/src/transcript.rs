//! The shared conversation log.

use std::fmt::{self, Debug};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use intake_model::{ModelMessage, Role};
use serde::{Deserialize, Serialize};

/// A role-tagged message in a transcript.
///
/// Messages have no setters: once appended they stay as they are.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Message {
    role: Role,
    content: String,
}

impl Message {
    /// Creates a message authored by `role`.
    #[inline]
    pub fn new<S: Into<String>>(role: Role, content: S) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    /// Creates a system message.
    #[inline]
    pub fn system<S: Into<String>>(content: S) -> Self {
        Self::new(Role::System, content)
    }

    /// Creates a user message.
    #[inline]
    pub fn user<S: Into<String>>(content: S) -> Self {
        Self::new(Role::User, content)
    }

    /// Creates an assistant message.
    #[inline]
    pub fn assistant<S: Into<String>>(content: S) -> Self {
        Self::new(Role::Assistant, content)
    }

    /// Returns the author of this message.
    #[inline]
    pub fn role(&self) -> Role {
        self.role
    }

    /// Returns the text of this message.
    #[inline]
    pub fn content(&self) -> &str {
        &self.content
    }
}

impl From<&Message> for ModelMessage {
    fn from(msg: &Message) -> Self {
        let content = msg.content.clone();
        match msg.role {
            Role::System => ModelMessage::System(content),
            Role::User => ModelMessage::User(content),
            Role::Assistant => ModelMessage::Assistant(content),
        }
    }
}

struct Inner {
    items: Mutex<Vec<Message>>,
    turn: tokio::sync::Mutex<()>,
}

/// An ordered, append-only log of messages.
///
/// A `Transcript` is a handle: [`share`](Self::share) hands out another
/// handle to the same log, so every holder observes every append and every
/// [`clear`](Self::clear) made through any of them. Nothing ever copies the
/// log implicitly; use [`snapshot`](Self::snapshot) for an independent copy.
pub struct Transcript {
    inner: Arc<Inner>,
}

/// Held by an analyzer for the duration of one turn.
pub(crate) type TurnGuard<'a> = tokio::sync::MutexGuard<'a, ()>;

impl Transcript {
    /// Creates an empty transcript.
    #[inline]
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Inner {
                items: Mutex::new(Vec::new()),
                turn: tokio::sync::Mutex::new(()),
            }),
        }
    }

    /// Returns another handle to this transcript.
    #[inline]
    pub fn share(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }

    /// Returns `true` if both handles point to the same log.
    #[inline]
    pub fn same_as(&self, other: &Transcript) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Appends a message to the end of the log.
    #[inline]
    pub fn append(&self, message: Message) {
        self.items().push(message);
    }

    /// Appends a user message and the assistant answer to it, with no
    /// other append or clear landing between the two.
    pub fn append_exchange(&self, user: Message, assistant: Message) {
        let mut items = self.items();
        items.push(user);
        items.push(assistant);
    }

    /// Removes every message.
    #[inline]
    pub fn clear(&self) {
        self.items().clear();
    }

    /// Returns an independent copy of the messages, in order.
    #[inline]
    pub fn snapshot(&self) -> Vec<Message> {
        self.items().clone()
    }

    /// Returns the number of messages.
    #[inline]
    pub fn len(&self) -> usize {
        self.items().len()
    }

    /// Returns `true` if there are no messages.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.items().is_empty()
    }

    /// Renders the log as plain text, one `Role: content` block per
    /// message. An empty log renders as an empty string.
    pub fn render(&self) -> String {
        self.items()
            .iter()
            .map(|msg| format!("{}: {}", role_label(msg.role), msg.content))
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Waits until no other turn is running on this transcript.
    pub(crate) async fn begin_turn(&self) -> TurnGuard<'_> {
        self.inner.turn.lock().await
    }

    fn items(&self) -> MutexGuard<'_, Vec<Message>> {
        self.inner
            .items
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for Transcript {
    fn default() -> Self {
        Self::new()
    }
}

impl Debug for Transcript {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Transcript")
            .field("messages", &self.len())
            .finish()
    }
}

#[inline]
fn role_label(role: Role) -> &'static str {
    match role {
        Role::System => "System",
        Role::User => "User",
        Role::Assistant => "Assistant",
    }
}
