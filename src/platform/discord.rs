//! Discord backend built on serenity.
//!
//! [`DiscordHandler`] converts gateway events into [`ChatEvent`]s and pushes
//! them into the controller's inbound channel. [`DiscordClient`] implements
//! [`ChatClient`] over serenity's HTTP client, cache and shard manager.

use super::{
    Author, Channel, ChannelId, ChatClient, ChatEvent, InboundMessage, Member, MemberId, MessageId,
    Role, RoleId, Server, ServerId,
};
use crate::error::PlatformError;
use async_trait::async_trait;
use serenity::Client;
use serenity::builder::{CreateInvite, EditMember, GetMessages};
use serenity::cache::Cache;
use serenity::client::{Context, EventHandler};
use serenity::gateway::ShardManager;
use serenity::http::{Http, HttpError};
use serenity::model::channel::{Channel as SerenityChannel, ChannelType, Message};
use serenity::model::gateway::{GatewayIntents, Ready};
use serenity::model::id as snowflake;
use serenity::model::user::OnlineStatus;
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Discord caps a member listing page at 1000 entries.
const MEMBERS_PAGE: u64 = 1000;
/// Discord caps a message history page at 100 entries.
const MESSAGES_PAGE: usize = 100;

const AUDIT_REASON: &str = "speaker queue";

/// Build a serenity client wired to `events`, plus the outbound handle.
///
/// The returned `Client` still has to be started by the caller.
pub async fn build(
    token: &str,
    events: mpsc::Sender<ChatEvent>,
) -> Result<(Client, DiscordClient), PlatformError> {
    let intents = GatewayIntents::GUILDS
        | GatewayIntents::GUILD_MEMBERS
        | GatewayIntents::GUILD_MESSAGES
        | GatewayIntents::GUILD_PRESENCES
        | GatewayIntents::GUILD_VOICE_STATES
        | GatewayIntents::DIRECT_MESSAGES
        | GatewayIntents::MESSAGE_CONTENT;

    let client = Client::builder(token, intents)
        .event_handler(DiscordHandler { events })
        .await
        .map_err(|e| PlatformError::Unavailable(e.to_string()))?;

    let handle = DiscordClient {
        http: Arc::clone(&client.http),
        cache: Arc::clone(&client.cache),
        shard_manager: Arc::clone(&client.shard_manager),
    };

    Ok((client, handle))
}

/// Gateway event forwarder.
pub struct DiscordHandler {
    events: mpsc::Sender<ChatEvent>,
}

impl DiscordHandler {
    async fn forward(&self, event: ChatEvent) {
        if self.events.send(event).await.is_err() {
            debug!("Inbound event dropped: controller is gone");
        }
    }
}

#[async_trait]
impl EventHandler for DiscordHandler {
    async fn ready(&self, ctx: Context, ready: Ready) {
        info!(
            user = %ready.user.name,
            guilds = ready.guilds.len(),
            "Connected to Discord gateway"
        );

        let mut servers = Vec::with_capacity(ready.guilds.len());
        for guild in &ready.guilds {
            match guild.id.to_partial_guild(&ctx).await {
                Ok(partial) => servers.push(Server {
                    id: ServerId::new(partial.id.to_string()),
                    name: partial.name,
                }),
                Err(e) => warn!(guild = %guild.id, error = %e, "Failed to fetch guild"),
            }
        }

        self.forward(ChatEvent::Ready { servers }).await;
    }

    async fn message(&self, ctx: Context, msg: Message) {
        if msg.author.bot {
            return;
        }

        let is_private = msg.guild_id.is_none();
        let channel_name = if is_private {
            None
        } else {
            match msg.channel_id.to_channel(&ctx).await {
                Ok(SerenityChannel::Guild(channel)) => Some(channel.name),
                _ => None,
            }
        };

        let roles = msg
            .member
            .as_ref()
            .map(|m| m.roles.iter().map(|r| RoleId::new(r.to_string())).collect());

        let inbound = InboundMessage {
            id: MessageId::new(msg.id.to_string()),
            channel_id: ChannelId::new(msg.channel_id.to_string()),
            channel_name,
            author: Author {
                id: MemberId::new(msg.author.id.to_string()),
                name: msg.author.name.clone(),
                mention: format!("<@{}>", msg.author.id),
                roles,
            },
            is_private,
            text: msg.content,
        };

        self.forward(ChatEvent::Message(inbound)).await;
    }
}

/// Outbound handle to Discord.
#[derive(Clone)]
pub struct DiscordClient {
    http: Arc<Http>,
    cache: Arc<Cache>,
    shard_manager: Arc<ShardManager>,
}

/// Parse an opaque identifier back into a snowflake.
fn parse_snowflake(id: &str) -> Result<u64, PlatformError> {
    match id.parse::<u64>() {
        Ok(value) if value != 0 => Ok(value),
        _ => Err(PlatformError::InvalidId(id.to_string())),
    }
}

fn request_error(err: serenity::Error) -> PlatformError {
    PlatformError::Request(err.to_string())
}

fn is_not_found(err: &serenity::Error) -> bool {
    matches!(
        err,
        serenity::Error::Http(HttpError::UnsuccessfulRequest(resp)) if resp.status_code.as_u16() == 404
    )
}

fn guild(server: &ServerId) -> Result<snowflake::GuildId, PlatformError> {
    parse_snowflake(server.as_str()).map(snowflake::GuildId::new)
}

fn user(member: &MemberId) -> Result<snowflake::UserId, PlatformError> {
    parse_snowflake(member.as_str()).map(snowflake::UserId::new)
}

fn channel(channel: &ChannelId) -> Result<snowflake::ChannelId, PlatformError> {
    parse_snowflake(channel.as_str()).map(snowflake::ChannelId::new)
}

fn role(role: &RoleId) -> Result<snowflake::RoleId, PlatformError> {
    parse_snowflake(role.as_str()).map(snowflake::RoleId::new)
}

impl DiscordClient {
    /// Users with a non-offline presence on the guild, read from the cache.
    fn online_users(&self, guild_id: snowflake::GuildId) -> HashSet<snowflake::UserId> {
        match self.cache.guild(guild_id) {
            Some(guild) => guild
                .presences
                .iter()
                .filter(|(_, presence)| presence.status != OnlineStatus::Offline)
                .map(|(id, _)| *id)
                .collect(),
            None => HashSet::new(),
        }
    }

    fn convert_member(
        member: &serenity::model::guild::Member,
        online: &HashSet<snowflake::UserId>,
    ) -> Member {
        Member {
            id: MemberId::new(member.user.id.to_string()),
            display_name: member.display_name().to_string(),
            mention: format!("<@{}>", member.user.id),
            roles: member
                .roles
                .iter()
                .map(|r| RoleId::new(r.to_string()))
                .collect(),
            muted: member.mute,
            online: online.contains(&member.user.id),
        }
    }
}

#[async_trait]
impl ChatClient for DiscordClient {
    async fn send_message(&self, target: &ChannelId, text: &str) -> Result<(), PlatformError> {
        channel(target)?
            .say(&*self.http, text)
            .await
            .map(|_| ())
            .map_err(request_error)
    }

    async fn delete_message(
        &self,
        target: &ChannelId,
        message: &MessageId,
    ) -> Result<(), PlatformError> {
        let message_id = snowflake::MessageId::new(parse_snowflake(message.as_str())?);
        channel(target)?
            .delete_message(&*self.http, message_id)
            .await
            .map_err(request_error)
    }

    async fn grant_role(
        &self,
        server: &ServerId,
        member: &MemberId,
        target: &RoleId,
    ) -> Result<(), PlatformError> {
        self.http
            .add_member_role(guild(server)?, user(member)?, role(target)?, Some(AUDIT_REASON))
            .await
            .map_err(request_error)
    }

    async fn revoke_role(
        &self,
        server: &ServerId,
        member: &MemberId,
        target: &RoleId,
    ) -> Result<(), PlatformError> {
        self.http
            .remove_member_role(guild(server)?, user(member)?, role(target)?, Some(AUDIT_REASON))
            .await
            .map_err(request_error)
    }

    async fn set_voice_mute(
        &self,
        server: &ServerId,
        member: &MemberId,
        muted: bool,
    ) -> Result<(), PlatformError> {
        guild(server)?
            .edit_member(&*self.http, user(member)?, EditMember::new().mute(muted))
            .await
            .map(|_| ())
            .map_err(request_error)
    }

    async fn list_members(&self, server: &ServerId) -> Result<Vec<Member>, PlatformError> {
        let guild_id = guild(server)?;
        let online = self.online_users(guild_id);

        let mut members = Vec::new();
        let mut after: Option<snowflake::UserId> = None;
        loop {
            let page = guild_id
                .members(&*self.http, Some(MEMBERS_PAGE), after)
                .await
                .map_err(request_error)?;
            members.extend(page.iter().map(|m| Self::convert_member(m, &online)));

            match page.last() {
                Some(last) if page.len() as u64 == MEMBERS_PAGE => after = Some(last.user.id),
                _ => break,
            }
        }

        Ok(members)
    }

    async fn resolve_member(
        &self,
        server: &ServerId,
        member: &MemberId,
    ) -> Result<Option<Member>, PlatformError> {
        let guild_id = guild(server)?;
        let Ok(user_id) = user(member) else {
            return Ok(None);
        };

        match guild_id.member((&self.cache, &*self.http), user_id).await {
            Ok(found) => {
                let online = self.online_users(guild_id);
                Ok(Some(Self::convert_member(&found, &online)))
            }
            Err(e) if is_not_found(&e) => Ok(None),
            Err(e) => Err(request_error(e)),
        }
    }

    async fn list_roles(&self, server: &ServerId) -> Result<Vec<Role>, PlatformError> {
        let guild_id = guild(server)?;
        let roles = guild_id.roles(&*self.http).await.map_err(request_error)?;

        let mut ordered: Vec<_> = roles.into_values().collect();
        ordered.sort_by_key(|r| (r.position, r.id));

        Ok(ordered
            .into_iter()
            .map(|r| Role {
                id: RoleId::new(r.id.to_string()),
                everyone: r.id.get() == guild_id.get(),
                name: r.name,
            })
            .collect())
    }

    async fn list_channels(&self, server: &ServerId) -> Result<Vec<Channel>, PlatformError> {
        let channels = guild(server)?
            .channels(&*self.http)
            .await
            .map_err(request_error)?;

        Ok(channels
            .into_values()
            .filter(|c| matches!(c.kind, ChannelType::Text | ChannelType::News))
            .map(|c| Channel {
                id: ChannelId::new(c.id.to_string()),
                name: c.name,
            })
            .collect())
    }

    async fn fetch_recent_messages(
        &self,
        target: &ChannelId,
        limit: usize,
    ) -> Result<Vec<MessageId>, PlatformError> {
        let channel_id = channel(target)?;
        let mut fetched = Vec::new();
        let mut before: Option<snowflake::MessageId> = None;

        while fetched.len() < limit {
            let page = (limit - fetched.len()).min(MESSAGES_PAGE);
            let mut request = GetMessages::new().limit(page as u8);
            if let Some(id) = before {
                request = request.before(id);
            }

            let batch = channel_id
                .messages(&*self.http, request)
                .await
                .map_err(request_error)?;
            fetched.extend(batch.iter().map(|m| MessageId::new(m.id.to_string())));

            match batch.last() {
                Some(oldest) if batch.len() == page => before = Some(oldest.id),
                _ => break,
            }
        }

        Ok(fetched)
    }

    async fn create_invite(&self, target: &ChannelId) -> Result<String, PlatformError> {
        channel(target)?
            .create_invite(&*self.http, CreateInvite::new())
            .await
            .map(|invite| invite.url())
            .map_err(request_error)
    }

    async fn shutdown(&self) {
        info!("Closing Discord shards");
        self.shard_manager.shutdown_all().await;
    }
}
