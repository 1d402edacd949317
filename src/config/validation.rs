//! Configuration validation.
//!
//! Validates configuration at startup to catch common errors early.

use super::Config;
use thiserror::Error;

/// Validation errors for configuration.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("discord.token is required (or set QUEUEBOT_TOKEN)")]
    MissingToken,
    #[error("community.{0} must not be empty")]
    EmptyName(&'static str),
    #[error("community.moderator_roles must list at least one role")]
    NoModeratorRoles,
    #[error("queue.advance_interval_secs must be greater than zero")]
    ZeroAdvanceInterval,
    #[error("queue.clearchat_limit must be greater than zero")]
    ZeroClearchatLimit,
    #[error("queue.path parent directory does not exist: {0}")]
    QueuePathInvalid(String),
}

/// Validate a configuration, returning all errors found.
pub fn validate(config: &Config) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.discord.token.trim().is_empty() {
        errors.push(ValidationError::MissingToken);
    }

    let community = &config.community;
    let names = [
        ("server", &community.server),
        ("subscriber_role", &community.subscriber_role),
        ("current_speaker_role", &community.current_speaker_role),
        ("speaker_channel", &community.speaker_channel),
        ("announcements_channel", &community.announcements_channel),
    ];
    for (field, value) in names {
        if value.is_empty() {
            errors.push(ValidationError::EmptyName(field));
        }
    }

    if community.moderator_roles.is_empty() {
        errors.push(ValidationError::NoModeratorRoles);
    } else if community.moderator_roles.iter().any(String::is_empty) {
        errors.push(ValidationError::EmptyName("moderator_roles"));
    }

    if config.queue.advance_interval_secs == 0 {
        errors.push(ValidationError::ZeroAdvanceInterval);
    }
    if config.queue.clearchat_limit == 0 {
        errors.push(ValidationError::ZeroClearchatLimit);
    }

    if let Some(parent) = config.queue.path.parent()
        && !parent.as_os_str().is_empty()
        && !parent.exists()
    {
        errors.push(ValidationError::QueuePathInvalid(
            config.queue.path.display().to_string(),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
