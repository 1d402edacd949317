//! Timer-driven queue advancement.

use super::{BotController, UPCOMING_SHOWN};
use crate::error::StoreError;
use crate::platform::MemberId;
use crate::queue::QueueStatus;
use crate::session::SessionContext;
use crate::telemetry::spans;
use crate::timer::AdvanceTarget;
use async_trait::async_trait;
use tracing::{Instrument, debug, info, warn};

impl BotController {
    /// Move the speaker slot to the next queued member.
    ///
    /// Platform failures along the way are logged and skipped. Only the
    /// final queue write is reported to the caller.
    pub async fn advance_queue(&self) -> Result<(), StoreError> {
        let Some(session) = self.session() else {
            debug!("No session, skipping advance");
            return Ok(());
        };
        let ctx = &session.context;

        self.strip_current_speakers(ctx).await;

        let advance = self.queue.advance(UPCOMING_SHOWN).await;
        if let Some(next) = advance.next {
            self.promote(ctx, &next).await;
        }

        if advance.status.size > 0 {
            let text = self.status_message(ctx, &advance.status).await;
            self.announce(ctx.speaker_channel_id(), &text).await;
        }

        self.queue.persist().await
    }

    /// Revoke the speaker role from everyone holding it and voice-mute them.
    async fn strip_current_speakers(&self, ctx: &SessionContext) {
        let members = match self.client.list_members(ctx.server_id()).await {
            Ok(members) => members,
            Err(e) => {
                warn!(error = %e, code = e.error_code(), "Failed to list members for advance");
                return;
            }
        };

        for member in members
            .iter()
            .filter(|m| m.has_role(&ctx.current_speaker_role))
        {
            info!(member = %member.id, name = %member.display_name, "Removing current speaker");
            if let Err(e) = self
                .client
                .revoke_role(ctx.server_id(), &member.id, &ctx.current_speaker_role)
                .await
            {
                warn!(member = %member.id, error = %e, code = e.error_code(), "Failed to revoke speaker role");
            }
            if let Err(e) = self
                .client
                .set_voice_mute(ctx.server_id(), &member.id, true)
                .await
            {
                warn!(member = %member.id, error = %e, code = e.error_code(), "Failed to mute former speaker");
            }
        }
    }

    /// Grant the speaker role to `next`, unmute them and announce it.
    ///
    /// A member who can no longer be resolved is dropped from the queue.
    async fn promote(&self, ctx: &SessionContext, next: &MemberId) {
        let member = match self.client.resolve_member(ctx.server_id(), next).await {
            Ok(Some(member)) => member,
            Ok(None) => {
                info!(member = %next, "Queued member left the server, dropping");
                return;
            }
            Err(e) => {
                warn!(member = %next, error = %e, code = e.error_code(), "Failed to resolve queued member, dropping");
                return;
            }
        };

        info!(member = %member.id, name = %member.display_name, "Promoting next speaker");
        if let Err(e) = self
            .client
            .grant_role(ctx.server_id(), &member.id, &ctx.current_speaker_role)
            .await
        {
            warn!(member = %member.id, error = %e, code = e.error_code(), "Failed to grant speaker role");
        }
        if let Err(e) = self
            .client
            .set_voice_mute(ctx.server_id(), &member.id, false)
            .await
        {
            warn!(member = %member.id, error = %e, code = e.error_code(), "Failed to unmute new speaker");
        }

        let text = format!(
            "{}, you can now talk in the {} channel.",
            member.mention, self.settings.name
        );
        self.announce(ctx.speaker_channel_id(), &text).await;
    }

    /// "There are currently **N** people in the queue. ..." with display
    /// names of the upcoming members, falling back to their ids.
    pub(super) async fn status_message(&self, ctx: &SessionContext, status: &QueueStatus) -> String {
        let mut names = Vec::with_capacity(status.upcoming.len());
        for id in &status.upcoming {
            let name = match self.client.resolve_member(ctx.server_id(), id).await {
                Ok(Some(member)) => member.display_name,
                Ok(None) | Err(_) => id.to_string(),
            };
            names.push(format!("**{name}**"));
        }

        format!(
            "There are currently **{}** people in the queue. Next **{}** in line are: {}",
            status.size,
            status.upcoming.len(),
            names.join(", ")
        )
    }
}

#[async_trait]
impl AdvanceTarget for BotController {
    type Error = StoreError;

    async fn advance(&self) -> Result<(), StoreError> {
        self.advance_queue().instrument(spans::advance()).await
    }
}
