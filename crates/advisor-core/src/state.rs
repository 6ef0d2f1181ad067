//! UI-agnostic chat data types
//!
//! Shared between the terminal client and the HTML transcript renderer;
//! nothing here depends on a UI framework.

use serde::{Deserialize, Serialize};

/// Per-session message identifier, increasing in append order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct MessageId(pub u64);

/// The role of a chat message sender
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChatRole {
    User,
    Assistant,
}

/// A chat message. Immutable once appended to a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    id: MessageId,
    text: String,
    role: ChatRole,
}

impl Message {
    pub(crate) fn new(id: MessageId, text: String, role: ChatRole) -> Self {
        Self { id, text, role }
    }

    pub fn id(&self) -> MessageId {
        self.id
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn role(&self) -> ChatRole {
        self.role
    }

    pub fn is_user(&self) -> bool {
        self.role == ChatRole::User
    }
}

impl ChatRole {
    pub fn label(&self) -> &'static str {
        match self {
            ChatRole::User => "You",
            ChatRole::Assistant => "Advisor",
        }
    }

    pub fn css_class(&self) -> &'static str {
        match self {
            ChatRole::User => "user",
            ChatRole::Assistant => "assistant",
        }
    }
}
