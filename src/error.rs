//! Unified error handling for queuebot.
//!
//! Each concern gets its own error enum. Every enum exposes a static
//! `error_code()` that is attached to log lines as a structured field.

use thiserror::Error;

// ============================================================================
// Platform Errors (chat client calls)
// ============================================================================

/// Errors returned by the chat platform collaborator.
///
/// These are transient from the bot's point of view: they are logged and
/// never retried.
#[derive(Debug, Clone, Error)]
pub enum PlatformError {
    #[error("platform request failed: {0}")]
    Request(String),

    #[error("invalid identifier: {0}")]
    InvalidId(String),

    #[error("platform unavailable: {0}")]
    Unavailable(String),
}

impl PlatformError {
    /// Get a static error code string for log labeling.
    #[inline]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Request(_) => "platform_request",
            Self::InvalidId(_) => "invalid_id",
            Self::Unavailable(_) => "platform_unavailable",
        }
    }
}

// ============================================================================
// Store Errors (queue persistence)
// ============================================================================

/// Queue persistence errors.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("queue file I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("queue file encoding failed: {0}")]
    Json(#[from] serde_json::Error),
}

impl StoreError {
    /// Get a static error code string for log labeling.
    #[inline]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Io(_) => "store_io",
            Self::Json(_) => "store_json",
        }
    }
}

// ============================================================================
// Session Errors (ready-time resolution)
// ============================================================================

/// Failures while resolving configured names into live platform entities.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("server not found: {0}")]
    ServerNotFound(String),

    #[error("role not found: {0}")]
    RoleNotFound(String),

    #[error("channel not found: {0}")]
    ChannelNotFound(String),

    #[error(transparent)]
    Platform(#[from] PlatformError),
}

impl SessionError {
    /// Get a static error code string for log labeling.
    #[inline]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::ServerNotFound(_) => "server_not_found",
            Self::RoleNotFound(_) => "role_not_found",
            Self::ChannelNotFound(_) => "channel_not_found",
            Self::Platform(e) => e.error_code(),
        }
    }
}
