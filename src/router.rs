//! Channel-scoped command routing.
//!
//! A route table maps a scope (a channel, direct messages or the
//! `Any` fallback) to a set of exact-match commands. Resolution picks the
//! first scope that has a route: the message's own channel (or `Private` for
//! direct messages), then `Any`. Only that route's commands are consulted; a
//! miss there is a miss for the router as a whole.

use crate::platform::{ChannelId, InboundMessage};
use crate::session::SessionContext;
use std::collections::HashMap;

/// Where a route applies.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RouteScope {
    Channel(ChannelId),
    Private,
    Any,
}

/// Commands reachable through routing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoutedCommand {
    Join,
    List,
    UnmuteAll,
}

impl RoutedCommand {
    pub fn name(self) -> &'static str {
        match self {
            Self::Join => "join",
            Self::List => "list",
            Self::UnmuteAll => "unmuteall",
        }
    }
}

/// Commands for one scope.
#[derive(Debug, Clone, Default)]
pub struct Route {
    commands: HashMap<String, RoutedCommand>,
    delete_commands: bool,
}

impl Route {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn command(mut self, text: impl Into<String>, command: RoutedCommand) -> Self {
        self.commands.insert(text.into(), command);
        self
    }

    /// Delete matched messages after a successful dispatch.
    pub fn delete_commands(mut self, delete: bool) -> Self {
        self.delete_commands = delete;
        self
    }
}

/// A resolved route.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RouteMatch {
    pub command: RoutedCommand,
    pub delete_after: bool,
}

/// Route table for one session.
#[derive(Debug, Clone, Default)]
pub struct CommandRouter {
    routes: HashMap<RouteScope, Route>,
}

impl CommandRouter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, scope: RouteScope, route: Route) {
        self.routes.insert(scope, route);
    }

    /// Standard table: queue commands in the speaker channel, `!join`
    /// everywhere else.
    pub fn for_session(session: &SessionContext, delete_commands: bool) -> Self {
        let mut router = Self::new();
        router.insert(
            RouteScope::Channel(session.speaker_channel.id.clone()),
            Route::new()
                .command("!join", RoutedCommand::Join)
                .command("!list", RoutedCommand::List)
                .command("!unmuteall", RoutedCommand::UnmuteAll)
                .delete_commands(delete_commands),
        );
        router.insert(
            RouteScope::Private,
            Route::new().command("!join", RoutedCommand::Join),
        );
        router.insert(
            RouteScope::Any,
            Route::new().command("!join", RoutedCommand::Join),
        );
        router
    }

    /// Resolve the command for `channel`/`is_private`/`text`.
    ///
    /// Matching is exact and case-sensitive.
    pub fn resolve(&self, channel: &ChannelId, is_private: bool, text: &str) -> Option<RouteMatch> {
        let scope = if is_private {
            RouteScope::Private
        } else {
            RouteScope::Channel(channel.clone())
        };

        let route = self
            .routes
            .get(&scope)
            .or_else(|| self.routes.get(&RouteScope::Any))?;

        route.commands.get(text).map(|command| RouteMatch {
            command: *command,
            delete_after: route.delete_commands,
        })
    }

    pub fn resolve_message(&self, msg: &InboundMessage) -> Option<RouteMatch> {
        self.resolve(&msg.channel_id, msg.is_private, &msg.text)
    }
}
