//! Routed queue commands: `!join`, `!list`, `!unmuteall`.

use super::{ActiveSession, BotController, UPCOMING_SHOWN};
use crate::error::PlatformError;
use crate::platform::{ChannelId, InboundMessage, RoleId};
use crate::queue::JoinOutcome;
use crate::session::SessionContext;
use crate::telemetry::spans;
use std::sync::Arc;
use tracing::{Instrument, debug, info, warn};

impl BotController {
    /// `!join`: subscribers only. Non-subscribers get no reply.
    pub(super) async fn handle_join(
        &self,
        ctx: &SessionContext,
        msg: &InboundMessage,
    ) -> Result<(), PlatformError> {
        // Direct messages carry no roles; look the author up on the server.
        let roles: Option<Vec<RoleId>> = if msg.is_private {
            match self
                .client
                .resolve_member(ctx.server_id(), &msg.author.id)
                .await?
            {
                Some(member) => Some(member.roles),
                None => {
                    debug!(author = %msg.author.id, "!join from a user not on the server");
                    return Ok(());
                }
            }
        } else {
            msg.author.roles.clone()
        };

        let subscribed = roles.is_some_and(|roles| roles.contains(&ctx.subscriber_role));
        if !subscribed {
            debug!(author = %msg.author.id, "!join from non-subscriber ignored");
            return Ok(());
        }

        let name = &self.settings.name;
        let reply = match self.queue.join(msg.author.id.clone()).await {
            JoinOutcome::AlreadyQueued(position) => format!(
                "{}, you are already in the {name} queue at position {position}.",
                msg.author.mention
            ),
            JoinOutcome::Joined(position) => {
                info!(author = %msg.author.id, position, "Member joined the queue");
                format!("{}, you have been placed in the {name} queue.", msg.author.mention)
            }
        };
        self.client.send_message(&msg.channel_id, &reply).await
    }

    /// `!list`: queue status to the speaker channel.
    pub(super) async fn handle_list(&self, ctx: &SessionContext) -> Result<(), PlatformError> {
        let status = self.queue.status(UPCOMING_SHOWN).await;
        let text = if status.size == 0 {
            format!("No one is queued up for {}.", self.settings.name)
        } else {
            self.status_message(ctx, &status).await
        };
        self.client.send_message(ctx.speaker_channel_id(), &text).await
    }

    /// `!unmuteall`: unmute every muted, online member, one at a time.
    ///
    /// Runs in the background so other messages keep flowing; stops early
    /// when the bot shuts down.
    pub(super) fn spawn_unmute_all(self: &Arc<Self>, session: Arc<ActiveSession>, reply_to: ChannelId) {
        let this = Arc::clone(self);
        self.tasks.spawn(
            async move { this.unmute_all(&session.context, &reply_to).await }
                .instrument(spans::background("unmuteall")),
        );
    }

    async fn unmute_all(&self, ctx: &SessionContext, reply_to: &ChannelId) {
        let members = match self.client.list_members(ctx.server_id()).await {
            Ok(members) => members,
            Err(e) => {
                warn!(error = %e, code = e.error_code(), "Failed to list members for !unmuteall");
                return;
            }
        };

        let pacing = self.settings.unmute_pacing();
        for member in members.into_iter().filter(|m| m.muted && m.online) {
            if self.shutdown.is_cancelled() {
                break;
            }

            self.announce(reply_to, &format!("Unmuting {}", member.display_name))
                .await;
            if let Err(e) = self
                .client
                .set_voice_mute(ctx.server_id(), &member.id, false)
                .await
            {
                warn!(member = %member.id, error = %e, code = e.error_code(), "Failed to unmute member");
            }

            tokio::select! {
                _ = tokio::time::sleep(pacing) => {}
                _ = self.shutdown.cancelled() => {
                    info!("Shutting down, abandoning !unmuteall");
                    break;
                }
            }
        }
    }
}
