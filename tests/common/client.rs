//! Recording in-memory `ChatClient`.

use async_trait::async_trait;
use parking_lot::Mutex;
use queuebot::error::PlatformError;
use queuebot::platform::{
    Channel, ChannelId, ChatClient, Member, MemberId, MessageId, Role, RoleId, ServerId,
};
use std::sync::atomic::{AtomicBool, Ordering};

/// One outbound call, flattened to strings for easy assertions.
#[allow(dead_code)]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Send { channel: String, text: String },
    Delete { channel: String, message: String },
    Grant { member: String, role: String },
    Revoke { member: String, role: String },
    Mute { member: String, muted: bool },
    Invite { channel: String },
    Shutdown,
}

#[allow(dead_code)]
#[derive(Default)]
pub struct MockClient {
    members: Mutex<Vec<Member>>,
    roles: Vec<Role>,
    channels: Vec<Channel>,
    messages: Mutex<Vec<MessageId>>,
    calls: Mutex<Vec<Call>>,
    fail_grants: AtomicBool,
    fail_member_listing: AtomicBool,
    fail_sends: AtomicBool,
    fail_deletes: AtomicBool,
}

#[allow(dead_code)]
impl MockClient {
    pub fn new(members: Vec<Member>, roles: Vec<Role>, channels: Vec<Channel>) -> Self {
        Self {
            members: Mutex::new(members),
            roles,
            channels,
            ..Self::default()
        }
    }

    /// Recent messages returned by `fetch_recent_messages`, newest first.
    pub fn set_messages(&self, ids: &[&str]) {
        *self.messages.lock() = ids.iter().map(|id| MessageId::from(*id)).collect();
    }

    pub fn fail_grants(&self) {
        self.fail_grants.store(true, Ordering::SeqCst);
    }

    /// Sends are still recorded, then rejected.
    pub fn fail_sends(&self, fail: bool) {
        self.fail_sends.store(fail, Ordering::SeqCst);
    }

    /// Deletes are recorded as attempts, then rejected.
    pub fn fail_deletes(&self, fail: bool) {
        self.fail_deletes.store(fail, Ordering::SeqCst);
    }

    pub fn fail_member_listing(&self) {
        self.fail_member_listing.store(true, Ordering::SeqCst);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().clone()
    }

    pub fn clear_calls(&self) {
        self.calls.lock().clear();
    }

    /// Texts sent to `channel`, in order.
    pub fn sent_to(&self, channel: &str) -> Vec<String> {
        self.calls
            .lock()
            .iter()
            .filter_map(|call| match call {
                Call::Send { channel: c, text } if c == channel => Some(text.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn sent_count(&self) -> usize {
        self.calls
            .lock()
            .iter()
            .filter(|call| matches!(call, Call::Send { .. }))
            .count()
    }

    pub fn member(&self, id: &str) -> Option<Member> {
        self.members
            .lock()
            .iter()
            .find(|m| m.id.as_str() == id)
            .cloned()
    }

    fn record(&self, call: Call) {
        self.calls.lock().push(call);
    }

    fn update_member(&self, id: &MemberId, f: impl FnOnce(&mut Member)) -> Result<(), PlatformError> {
        let mut members = self.members.lock();
        let member = members
            .iter_mut()
            .find(|m| &m.id == id)
            .ok_or_else(|| PlatformError::Request(format!("unknown member {id}")))?;
        f(member);
        Ok(())
    }
}

#[async_trait]
impl ChatClient for MockClient {
    async fn send_message(&self, channel: &ChannelId, text: &str) -> Result<(), PlatformError> {
        self.record(Call::Send {
            channel: channel.to_string(),
            text: text.to_string(),
        });
        if self.fail_sends.load(Ordering::SeqCst) {
            return Err(PlatformError::Request("rate limited".into()));
        }
        Ok(())
    }

    async fn delete_message(
        &self,
        channel: &ChannelId,
        message: &MessageId,
    ) -> Result<(), PlatformError> {
        self.record(Call::Delete {
            channel: channel.to_string(),
            message: message.to_string(),
        });
        if self.fail_deletes.load(Ordering::SeqCst) {
            return Err(PlatformError::Request("missing permissions".into()));
        }
        Ok(())
    }

    async fn grant_role(
        &self,
        _server: &ServerId,
        member: &MemberId,
        role: &RoleId,
    ) -> Result<(), PlatformError> {
        self.record(Call::Grant {
            member: member.to_string(),
            role: role.to_string(),
        });
        if self.fail_grants.load(Ordering::SeqCst) {
            return Err(PlatformError::Request("missing permissions".into()));
        }
        self.update_member(member, |m| {
            if !m.has_role(role) {
                m.roles.push(role.clone());
            }
        })
    }

    async fn revoke_role(
        &self,
        _server: &ServerId,
        member: &MemberId,
        role: &RoleId,
    ) -> Result<(), PlatformError> {
        self.record(Call::Revoke {
            member: member.to_string(),
            role: role.to_string(),
        });
        self.update_member(member, |m| m.roles.retain(|r| r != role))
    }

    async fn set_voice_mute(
        &self,
        _server: &ServerId,
        member: &MemberId,
        muted: bool,
    ) -> Result<(), PlatformError> {
        self.record(Call::Mute {
            member: member.to_string(),
            muted,
        });
        self.update_member(member, |m| m.muted = muted)
    }

    async fn list_members(&self, _server: &ServerId) -> Result<Vec<Member>, PlatformError> {
        if self.fail_member_listing.load(Ordering::SeqCst) {
            return Err(PlatformError::Unavailable("gateway down".into()));
        }
        Ok(self.members.lock().clone())
    }

    async fn resolve_member(
        &self,
        _server: &ServerId,
        member: &MemberId,
    ) -> Result<Option<Member>, PlatformError> {
        Ok(self.member(member.as_str()))
    }

    async fn list_roles(&self, _server: &ServerId) -> Result<Vec<Role>, PlatformError> {
        Ok(self.roles.clone())
    }

    async fn list_channels(&self, _server: &ServerId) -> Result<Vec<Channel>, PlatformError> {
        Ok(self.channels.clone())
    }

    async fn fetch_recent_messages(
        &self,
        _channel: &ChannelId,
        limit: usize,
    ) -> Result<Vec<MessageId>, PlatformError> {
        Ok(self.messages.lock().iter().take(limit).cloned().collect())
    }

    async fn create_invite(&self, channel: &ChannelId) -> Result<String, PlatformError> {
        self.record(Call::Invite {
            channel: channel.to_string(),
        });
        Ok("https://discord.gg/queuebot".to_string())
    }

    async fn shutdown(&self) {
        self.record(Call::Shutdown);
    }
}
