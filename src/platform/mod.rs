//! Chat platform collaborator.
//!
//! The bot only talks to the platform through [`ChatClient`]. The serenity
//! backed implementation lives in [`discord`]; tests substitute a recording
//! client.

pub mod discord;
mod model;

pub use model::{
    Author, Channel, ChannelId, ChatEvent, InboundMessage, Member, MemberId, MessageId, Role,
    RoleId, Server, ServerId,
};

use crate::error::PlatformError;
use async_trait::async_trait;

/// Outbound operations the bot performs against the chat platform.
///
/// Calls are fire-and-forget from the bot's perspective: failures are
/// reported but the caller logs them and moves on.
#[async_trait]
pub trait ChatClient: Send + Sync {
    /// Post a text message.
    async fn send_message(&self, channel: &ChannelId, text: &str) -> Result<(), PlatformError>;

    /// Delete a message.
    async fn delete_message(
        &self,
        channel: &ChannelId,
        message: &MessageId,
    ) -> Result<(), PlatformError>;

    async fn grant_role(
        &self,
        server: &ServerId,
        member: &MemberId,
        role: &RoleId,
    ) -> Result<(), PlatformError>;

    async fn revoke_role(
        &self,
        server: &ServerId,
        member: &MemberId,
        role: &RoleId,
    ) -> Result<(), PlatformError>;

    /// Set or clear the server-side voice mute.
    async fn set_voice_mute(
        &self,
        server: &ServerId,
        member: &MemberId,
        muted: bool,
    ) -> Result<(), PlatformError>;

    async fn list_members(&self, server: &ServerId) -> Result<Vec<Member>, PlatformError>;

    /// Look up a single member. `Ok(None)` means the user is not (or no
    /// longer) on the server.
    async fn resolve_member(
        &self,
        server: &ServerId,
        member: &MemberId,
    ) -> Result<Option<Member>, PlatformError>;

    /// Server roles in hierarchy order, the implicit everyone role first.
    async fn list_roles(&self, server: &ServerId) -> Result<Vec<Role>, PlatformError>;

    async fn list_channels(&self, server: &ServerId) -> Result<Vec<Channel>, PlatformError>;

    /// Up to `limit` recent messages, newest first.
    async fn fetch_recent_messages(
        &self,
        channel: &ChannelId,
        limit: usize,
    ) -> Result<Vec<MessageId>, PlatformError>;

    /// Create an invite and return its URL.
    async fn create_invite(&self, channel: &ChannelId) -> Result<String, PlatformError>;

    /// End the session.
    async fn shutdown(&self);
}
