//! Moderator gate and the moderator-only command set.
//!
//! Unlike routed commands, moderator commands match on a case-sensitive
//! prefix, so `!ping please` still reaches `!ping`.

use crate::platform::RoleId;
use std::collections::HashSet;

/// Authorization check for the moderator command set.
#[derive(Debug, Clone, Default)]
pub struct ModeratorGate {
    roles: HashSet<RoleId>,
}

impl ModeratorGate {
    pub fn new(roles: impl IntoIterator<Item = RoleId>) -> Self {
        Self {
            roles: roles.into_iter().collect(),
        }
    }

    /// An author is a moderator iff they hold at least one moderator role.
    ///
    /// A missing role list (direct messages, degraded member data) is never
    /// authorized.
    pub fn is_authorized(&self, author_roles: Option<&[RoleId]>) -> bool {
        author_roles.is_some_and(|roles| roles.iter().any(|r| self.roles.contains(r)))
    }

    pub fn len(&self) -> usize {
        self.roles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.roles.is_empty()
    }
}

/// Moderator-only ad-hoc commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModCommand {
    Ping,
    /// Skip the next automatic advance.
    Next,
    ChanInfo,
    ClearChat,
    MyRoles,
    ServerRoles,
    Quit,
    Info,
    Invite,
}

impl ModCommand {
    /// Checked in order; the first matching prefix wins.
    const PREFIXES: [(&'static str, ModCommand); 9] = [
        ("!ping", ModCommand::Ping),
        ("!next", ModCommand::Next),
        ("!chaninfo", ModCommand::ChanInfo),
        ("!clearchat", ModCommand::ClearChat),
        ("!myroles", ModCommand::MyRoles),
        ("!serverroles", ModCommand::ServerRoles),
        ("!quit", ModCommand::Quit),
        ("!info", ModCommand::Info),
        ("!invite", ModCommand::Invite),
    ];

    pub fn parse(text: &str) -> Option<Self> {
        Self::PREFIXES
            .iter()
            .find(|(prefix, _)| text.starts_with(prefix))
            .map(|(_, cmd)| *cmd)
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Ping => "ping",
            Self::Next => "next",
            Self::ChanInfo => "chaninfo",
            Self::ClearChat => "clearchat",
            Self::MyRoles => "myroles",
            Self::ServerRoles => "serverroles",
            Self::Quit => "quit",
            Self::Info => "info",
            Self::Invite => "invite",
        }
    }
}
