//! Platform-neutral model types.
//!
//! Identifiers are opaque tokens: the bot compares and stores them but never
//! interprets their contents.

use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! opaque_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self(id.to_string())
            }
        }
    };
}

opaque_id!(
    /// Stable handle to a platform user.
    MemberId
);
opaque_id!(RoleId);
opaque_id!(ChannelId);
opaque_id!(ServerId);
opaque_id!(MessageId);

/// A user in the context of the community server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Member {
    pub id: MemberId,
    pub display_name: String,
    /// Ready-to-send mention markup.
    pub mention: String,
    pub roles: Vec<RoleId>,
    /// Server-side voice mute.
    pub muted: bool,
    /// False only when presence reports the member offline.
    pub online: bool,
}

impl Member {
    pub fn has_role(&self, role: &RoleId) -> bool {
        self.roles.iter().any(|r| r == role)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Role {
    pub id: RoleId,
    pub name: String,
    /// The implicit role every member holds.
    pub everyone: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Channel {
    pub id: ChannelId,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Server {
    pub id: ServerId,
    pub name: String,
}

/// Author of an inbound message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Author {
    pub id: MemberId,
    pub name: String,
    pub mention: String,
    /// Roles attached to the message. `None` in direct messages or when the
    /// platform did not deliver member data.
    pub roles: Option<Vec<RoleId>>,
}

/// A text message received from the platform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundMessage {
    pub id: MessageId,
    pub channel_id: ChannelId,
    pub channel_name: Option<String>,
    pub author: Author,
    /// Direct message rather than a server channel.
    pub is_private: bool,
    pub text: String,
}

/// Events delivered by the platform's inbound stream.
#[derive(Debug, Clone)]
pub enum ChatEvent {
    /// Session established; carries every server the bot can see.
    Ready { servers: Vec<Server> },
    Message(InboundMessage),
}
