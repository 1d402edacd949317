//! Moderator-only commands.

use super::{ActiveSession, BotController};
use crate::error::PlatformError;
use crate::gate::ModCommand;
use crate::platform::{Channel, InboundMessage, Role};
use crate::telemetry::spans;
use std::sync::Arc;
use tracing::{Instrument, info, warn};

impl BotController {
    pub(super) async fn dispatch_moderator(
        self: &Arc<Self>,
        session: &Arc<ActiveSession>,
        msg: &InboundMessage,
        command: ModCommand,
    ) -> Result<(), PlatformError> {
        let ctx = &session.context;
        let reply_to = &msg.channel_id;

        match command {
            ModCommand::Ping => self.client.send_message(reply_to, "Pong!").await,
            ModCommand::Next => {
                self.timer.suppress_next();
                info!(author = %msg.author.id, "Next automatic advance suppressed");
                Ok(())
            }
            ModCommand::ChanInfo => {
                let name = msg.channel_name.as_deref().unwrap_or_default();
                let text = format!("Current channel:\n**Name:** {name}\n**ID:** {reply_to}");
                self.client.send_message(reply_to, &text).await
            }
            ModCommand::ClearChat => {
                match &ctx.announcements_channel {
                    Some(channel) => self.spawn_clear_chat(channel.clone()),
                    None => warn!("No announcements channel, ignoring !clearchat"),
                }
                Ok(())
            }
            ModCommand::MyRoles => {
                let held = msg.author.roles.as_deref().unwrap_or_default();
                let roles = self.client.list_roles(ctx.server_id()).await?;
                let lines = role_lines(roles.iter().filter(|r| held.contains(&r.id)));
                let text = format!("You are part of the following roles:\n{lines}");
                self.client.send_message(reply_to, &text).await
            }
            ModCommand::ServerRoles => {
                let roles = self.client.list_roles(ctx.server_id()).await?;
                let text = format!("Roles on the server:\n{}", role_lines(roles.iter()));
                self.client.send_message(reply_to, &text).await
            }
            ModCommand::Quit => {
                self.announce(reply_to, "Quitting.. Good bye!").await;
                self.quit().await;
                Ok(())
            }
            ModCommand::Info => {
                let text = format!("Your user ID is: {}", msg.author.id);
                self.client.send_message(reply_to, &text).await
            }
            ModCommand::Invite => {
                let url = self.client.create_invite(ctx.speaker_channel_id()).await?;
                self.client.send_message(reply_to, &url).await
            }
        }
    }

    /// `!clearchat`: delete every fetched message in `channel` except the
    /// first one returned.
    fn spawn_clear_chat(self: &Arc<Self>, channel: Channel) {
        let this = Arc::clone(self);
        self.tasks.spawn(
            async move { this.clear_chat(&channel).await }.instrument(spans::background("clearchat")),
        );
    }

    async fn clear_chat(&self, channel: &Channel) {
        let messages = match self
            .client
            .fetch_recent_messages(&channel.id, self.settings.clearchat_limit)
            .await
        {
            Ok(messages) => messages,
            Err(e) => {
                warn!(channel = %channel.name, error = %e, code = e.error_code(), "Failed to fetch messages for !clearchat");
                return;
            }
        };

        let mut deleted = 0usize;
        for message in messages.iter().skip(1) {
            if self.shutdown.is_cancelled() {
                info!("Shutting down, abandoning !clearchat");
                break;
            }
            match self.client.delete_message(&channel.id, message).await {
                Ok(()) => deleted += 1,
                Err(e) => warn!(message = %message, error = %e, code = e.error_code(), "Failed to delete message"),
            }
        }
        info!(channel = %channel.name, deleted, "Cleared channel");
    }
}

/// `name - id` lines, skipping the implicit everyone role.
fn role_lines<'a>(roles: impl Iterator<Item = &'a Role>) -> String {
    roles
        .filter(|r| !r.everyone)
        .map(|r| format!("{} - {}", r.name, r.id))
        .collect::<Vec<_>>()
        .join("\n")
}
