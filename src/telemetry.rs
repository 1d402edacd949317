//! Telemetry utilities for command timing and event correlation.

use std::time::Instant;
use tracing::debug;

/// Guard for timing command execution.
///
/// Logs the command latency when dropped.
pub struct CommandTimer {
    command: &'static str,
    start: Instant,
}

impl CommandTimer {
    /// Start timing a command.
    pub fn new(command: &'static str) -> Self {
        Self {
            command,
            start: Instant::now(),
        }
    }
}

impl Drop for CommandTimer {
    fn drop(&mut self) {
        let elapsed_ms = self.start.elapsed().as_millis() as u64;
        debug!(command = self.command, elapsed_ms, "Command finished");
    }
}

/// Standardized span constructors.
pub mod spans {
    use crate::platform::{ChannelId, MemberId};
    use tracing::{Span, info_span};

    /// Span for handling one inbound message.
    pub fn message(channel: &ChannelId, author: &MemberId) -> Span {
        info_span!("message", channel = %channel, author = %author)
    }

    /// Span for a dispatched command.
    pub fn command(name: &str) -> Span {
        info_span!("command", name = %name)
    }

    /// Span for one queue advancement.
    pub fn advance() -> Span {
        info_span!("advance")
    }

    /// Span for a background command task.
    pub fn background(name: &str) -> Span {
        info_span!("background", name = %name)
    }
}
