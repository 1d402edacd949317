//! Per-connection session context.
//!
//! Configured names are resolved into live identifiers once per `ready`
//! event and then handed to every handler. Nothing here is re-resolved until
//! the next `ready`.

use crate::config::CommunityConfig;
use crate::error::SessionError;
use crate::gate::ModeratorGate;
use crate::platform::{Channel, ChannelId, ChatClient, Role, RoleId, Server, ServerId};
use tracing::{info, warn};

/// Everything resolved at ready time.
#[derive(Debug, Clone)]
pub struct SessionContext {
    pub server: Server,
    pub subscriber_role: RoleId,
    pub current_speaker_role: RoleId,
    pub moderators: ModeratorGate,
    pub speaker_channel: Channel,
    /// Target of `!clearchat`; optional because not every server has one.
    pub announcements_channel: Option<Channel>,
}

impl SessionContext {
    /// Resolve configured names against the servers announced by `ready`.
    pub async fn resolve(
        client: &dyn ChatClient,
        servers: &[Server],
        config: &CommunityConfig,
    ) -> Result<Self, SessionError> {
        let server = servers
            .iter()
            .find(|s| s.name == config.server)
            .cloned()
            .ok_or_else(|| SessionError::ServerNotFound(config.server.clone()))?;

        let roles = client.list_roles(&server.id).await?;
        let channels = client.list_channels(&server.id).await?;

        let subscriber_role = require_role(&roles, &config.subscriber_role)?;
        let current_speaker_role = require_role(&roles, &config.current_speaker_role)?;

        let moderators = ModeratorGate::new(config.moderator_roles.iter().filter_map(|name| {
            let found = find_role(&roles, name);
            if found.is_none() {
                warn!(role = %name, "Moderator role not found on server, skipping");
            }
            found
        }));
        if moderators.is_empty() {
            warn!("No moderator roles resolved, moderator commands disabled");
        }

        let speaker_channel = find_channel(&channels, &config.speaker_channel)
            .ok_or_else(|| SessionError::ChannelNotFound(config.speaker_channel.clone()))?;

        let announcements_channel = find_channel(&channels, &config.announcements_channel);
        if announcements_channel.is_none() {
            warn!(
                channel = %config.announcements_channel,
                "Announcements channel not found, !clearchat disabled"
            );
        }

        info!(
            server = %server.name,
            server_id = %server.id,
            speaker_channel = %speaker_channel.id,
            moderator_roles = moderators.len(),
            "Session resolved"
        );

        Ok(Self {
            server,
            subscriber_role,
            current_speaker_role,
            moderators,
            speaker_channel,
            announcements_channel,
        })
    }

    pub fn server_id(&self) -> &ServerId {
        &self.server.id
    }

    pub fn speaker_channel_id(&self) -> &ChannelId {
        &self.speaker_channel.id
    }
}

fn find_role(roles: &[Role], name: &str) -> Option<RoleId> {
    roles.iter().find(|r| r.name == name).map(|r| r.id.clone())
}

fn require_role(roles: &[Role], name: &str) -> Result<RoleId, SessionError> {
    find_role(roles, name).ok_or_else(|| SessionError::RoleNotFound(name.to_string()))
}

fn find_channel(channels: &[Channel], name: &str) -> Option<Channel> {
    channels.iter().find(|c| c.name == name).cloned()
}
