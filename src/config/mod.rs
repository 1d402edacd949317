//! Configuration loading and management.
//!
//! This module is split into logical submodules:
//! - [`types`]: Config struct definitions (Config, DiscordConfig, CommunityConfig, QueueConfig)
//! - [`validation`]: Startup checks that collect every problem before refusing to run

mod types;
mod validation;

pub use types::{CommunityConfig, Config, ConfigError, DiscordConfig, QueueConfig};
pub use validation::{ValidationError, validate};
