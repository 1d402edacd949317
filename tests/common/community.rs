//! Standard community fixture.
//!
//! Server `NymN` with roles `@everyone`, `Twitch Subscriber`,
//! `Current Speaker` and `Moderator`, and channels `chemotherapy` (speaker),
//! `announcements` and `general`.

#![allow(dead_code)]

use super::MockClient;
use queuebot::bot::BotController;
use queuebot::config::{CommunityConfig, QueueConfig};
use queuebot::platform::{
    Author, Channel, ChannelId, ChatEvent, InboundMessage, Member, MemberId, MessageId, Role,
    RoleId, Server, ServerId,
};
use queuebot::queue::{QueueStore, SharedQueue};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

pub const SERVER: &str = "srv";
pub const SUBSCRIBER: &str = "role-sub";
pub const SPEAKER_ROLE: &str = "role-speaker";
pub const MODERATOR: &str = "role-mod";

pub const SPEAKER_CHANNEL: &str = "chan-speaker";
pub const ANNOUNCEMENTS: &str = "chan-announcements";
pub const GENERAL: &str = "chan-general";
pub const DM_CHANNEL: &str = "chan-dm";

static NEXT_MESSAGE: AtomicUsize = AtomicUsize::new(1);

pub fn roles() -> Vec<Role> {
    vec![
        role(SERVER, "@everyone", true),
        role(SUBSCRIBER, "Twitch Subscriber", false),
        role(SPEAKER_ROLE, "Current Speaker", false),
        role(MODERATOR, "Moderator", false),
    ]
}

pub fn channels() -> Vec<Channel> {
    vec![
        channel(SPEAKER_CHANNEL, "chemotherapy"),
        channel(ANNOUNCEMENTS, "announcements"),
        channel(GENERAL, "general"),
    ]
}

pub fn servers() -> Vec<Server> {
    vec![
        Server {
            id: ServerId::from("other"),
            name: "Elsewhere".to_string(),
        },
        Server {
            id: ServerId::from(SERVER),
            name: "NymN".to_string(),
        },
    ]
}

pub fn community_config() -> CommunityConfig {
    CommunityConfig {
        server: "NymN".to_string(),
        subscriber_role: "Twitch Subscriber".to_string(),
        current_speaker_role: "Current Speaker".to_string(),
        moderator_roles: vec!["Moderator".to_string(), "Roleplayer".to_string()],
        speaker_channel: "chemotherapy".to_string(),
        announcements_channel: "announcements".to_string(),
        delete_commands: false,
    }
}

pub fn queue_config(dir: &Path) -> QueueConfig {
    QueueConfig {
        path: queue_path(dir),
        ..QueueConfig::default()
    }
}

pub fn queue_path(dir: &Path) -> PathBuf {
    dir.join("queue.json")
}

fn role(id: &str, name: &str, everyone: bool) -> Role {
    Role {
        id: RoleId::from(id),
        name: name.to_string(),
        everyone,
    }
}

fn channel(id: &str, name: &str) -> Channel {
    Channel {
        id: ChannelId::from(id),
        name: name.to_string(),
    }
}

/// An online, unmuted member holding `roles`.
pub fn member(id: &str, name: &str, roles: &[&str]) -> Member {
    Member {
        id: MemberId::from(id),
        display_name: name.to_string(),
        mention: format!("<@{id}>"),
        roles: roles.iter().map(|r| RoleId::from(*r)).collect(),
        muted: false,
        online: true,
    }
}

pub fn mention(id: &str) -> String {
    format!("<@{id}>")
}

/// A server-channel message carrying the author's roles.
pub fn message(channel_id: &str, author: &Member, text: &str) -> ChatEvent {
    let name = channels()
        .into_iter()
        .find(|c| c.id.as_str() == channel_id)
        .map(|c| c.name);
    ChatEvent::Message(InboundMessage {
        id: next_message_id(),
        channel_id: ChannelId::from(channel_id),
        channel_name: name,
        author: Author {
            id: author.id.clone(),
            name: author.display_name.clone(),
            mention: author.mention.clone(),
            roles: Some(author.roles.clone()),
        },
        is_private: false,
        text: text.to_string(),
    })
}

/// A direct message; no roles are attached.
pub fn direct_message(author_id: &str, text: &str) -> ChatEvent {
    ChatEvent::Message(InboundMessage {
        id: next_message_id(),
        channel_id: ChannelId::from(DM_CHANNEL),
        channel_name: None,
        author: Author {
            id: MemberId::from(author_id),
            name: author_id.to_string(),
            mention: mention(author_id),
            roles: None,
        },
        is_private: true,
        text: text.to_string(),
    })
}

fn next_message_id() -> MessageId {
    MessageId::new(format!("msg-{}", NEXT_MESSAGE.fetch_add(1, Ordering::SeqCst)))
}

pub struct Harness {
    pub client: Arc<MockClient>,
    pub bot: Arc<BotController>,
    pub dir: tempfile::TempDir,
}

impl Harness {
    /// Bot with a resolved session over `members`.
    pub async fn ready(members: Vec<Member>) -> Self {
        Self::ready_with(members, community_config()).await
    }

    pub async fn ready_with(members: Vec<Member>, community: CommunityConfig) -> Self {
        let harness = Self::unready_with(members, community).await;
        harness
            .bot
            .handle_event(ChatEvent::Ready { servers: servers() })
            .await;
        harness
    }

    /// Bot that has not seen a `ready` event yet.
    pub async fn unready_with(members: Vec<Member>, community: CommunityConfig) -> Self {
        let dir = tempfile::tempdir().expect("failed to create temp dir");
        let settings = queue_config(dir.path());
        let queue = SharedQueue::load(QueueStore::new(&settings.path)).await;
        let client = Arc::new(MockClient::new(members, roles(), channels()));
        let bot = BotController::new(client.clone(), queue, community, settings);
        Self { client, bot, dir }
    }

    pub async fn send(&self, event: ChatEvent) {
        self.bot.handle_event(event).await;
    }

    /// Queue file contents.
    pub async fn saved_queue(&self) -> Vec<String> {
        QueueStore::new(queue_path(self.dir.path()))
            .load()
            .await
            .iter()
            .map(|id| id.to_string())
            .collect()
    }

    pub fn queue_file_exists(&self) -> bool {
        queue_path(self.dir.path()).exists()
    }

    pub async fn queued(&self) -> Vec<String> {
        self.bot
            .queue()
            .snapshot()
            .await
            .iter()
            .map(|id| id.to_string())
            .collect()
    }
}
