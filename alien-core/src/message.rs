//! The session message log.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Who wrote a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    Player,
    Narrator,
}

impl Sender {
    /// Label used in transcripts and the console log.
    pub fn label(self) -> &'static str {
        match self {
            Sender::Player => "PLAYER",
            Sender::Narrator => "GAMEMASTER",
        }
    }

    /// Provider role for this sender.
    pub fn role(self) -> groq::Role {
        match self {
            Sender::Player => groq::Role::User,
            Sender::Narrator => groq::Role::Assistant,
        }
    }
}

impl fmt::Display for Sender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub sender: Sender,
    pub content: String,
}

impl Message {
    pub fn new(sender: Sender, content: impl Into<String>) -> Self {
        Self {
            sender,
            content: content.into(),
        }
    }

    pub fn player(content: impl Into<String>) -> Self {
        Self::new(Sender::Player, content)
    }

    pub fn narrator(content: impl Into<String>) -> Self {
        Self::new(Sender::Narrator, content)
    }

    /// Convert to a provider message.
    pub fn to_provider(&self) -> groq::Message {
        match self.sender {
            Sender::Player => groq::Message::user(self.content.clone()),
            Sender::Narrator => groq::Message::assistant(self.content.clone()),
        }
    }
}

/// Append-only message log in chronological order.
///
/// There is no way to remove or edit an entry once pushed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MessageLog {
    entries: Vec<Message>,
}

impl MessageLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, message: Message) {
        self.entries.push(message);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn last(&self) -> Option<&Message> {
        self.entries.last()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Message> {
        self.entries.iter()
    }

    pub fn as_slice(&self) -> &[Message] {
        &self.entries
    }
}

impl<'a> IntoIterator for &'a MessageLog {
    type Item = &'a Message;
    type IntoIter = std::slice::Iter<'a, Message>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}
