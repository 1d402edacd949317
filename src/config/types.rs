//! Core configuration types and loading.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Bot configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Platform credentials.
    pub discord: DiscordConfig,
    /// Names of the server, roles and channels the bot operates on.
    pub community: CommunityConfig,
    /// Speaker queue behaviour.
    #[serde(default)]
    pub queue: QueueConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }
}

/// Platform credentials.
#[derive(Debug, Clone, Deserialize)]
pub struct DiscordConfig {
    /// Bot token. `QUEUEBOT_TOKEN` in the environment takes precedence.
    #[serde(default)]
    pub token: String,
}

/// Names resolved once per session at ready time.
#[derive(Debug, Clone, Deserialize)]
pub struct CommunityConfig {
    /// Server name (e.g., "NymN").
    pub server: String,
    /// Role required to join the queue (e.g., "Twitch Subscriber").
    pub subscriber_role: String,
    /// Role granted to whoever currently holds the floor.
    pub current_speaker_role: String,
    /// Holding any of these roles unlocks the moderator command set.
    pub moderator_roles: Vec<String>,
    /// Text channel where queue commands live and announcements go.
    pub speaker_channel: String,
    /// Channel wiped by `!clearchat`.
    #[serde(default = "default_announcements_channel")]
    pub announcements_channel: String,
    /// Delete routed commands in the speaker channel after handling them.
    #[serde(default)]
    pub delete_commands: bool,
}

fn default_announcements_channel() -> String {
    "announcements".to_string()
}

/// Speaker queue configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct QueueConfig {
    /// Event label used in replies (default: "aidsfest").
    #[serde(default = "default_queue_name")]
    pub name: String,
    /// Queue snapshot file (JSON array of member identifiers).
    #[serde(default = "default_queue_path")]
    pub path: PathBuf,
    /// Seconds between automatic advances (default: 45).
    #[serde(default = "default_advance_interval")]
    pub advance_interval_secs: u64,
    /// Seconds to wait between members during `!unmuteall` (default: 5).
    #[serde(default = "default_unmute_pacing")]
    pub unmute_pacing_secs: u64,
    /// Messages fetched by `!clearchat` (default: 1000).
    #[serde(default = "default_clearchat_limit")]
    pub clearchat_limit: usize,
}

impl QueueConfig {
    /// Advance period as a `Duration`.
    pub fn advance_interval(&self) -> Duration {
        Duration::from_secs(self.advance_interval_secs)
    }

    /// Unmute pacing as a `Duration`.
    pub fn unmute_pacing(&self) -> Duration {
        Duration::from_secs(self.unmute_pacing_secs)
    }
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            name: default_queue_name(),
            path: default_queue_path(),
            advance_interval_secs: default_advance_interval(),
            unmute_pacing_secs: default_unmute_pacing(),
            clearchat_limit: default_clearchat_limit(),
        }
    }
}

fn default_queue_name() -> String {
    "aidsfest".to_string()
}

fn default_queue_path() -> PathBuf {
    PathBuf::from("/tmp/aidsfest_queue_nymn")
}

fn default_advance_interval() -> u64 {
    45
}

fn default_unmute_pacing() -> u64 {
    5
}

fn default_clearchat_limit() -> usize {
    1000
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_queue_defaults_apply() {
        let toml = r#"
[discord]
token = "abc"

[community]
server = "NymN"
subscriber_role = "Twitch Subscriber"
current_speaker_role = "Current Speaker"
moderator_roles = ["Moderator", "Roleplayer"]
speaker_channel = "chemotherapy"
"#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.queue.name, "aidsfest");
        assert_eq!(config.queue.advance_interval(), Duration::from_secs(45));
        assert_eq!(config.queue.unmute_pacing(), Duration::from_secs(5));
        assert_eq!(config.queue.clearchat_limit, 1000);
        assert_eq!(config.community.announcements_channel, "announcements");
        assert!(!config.community.delete_commands);
    }

    #[test]
    fn test_missing_community_section_fails() {
        let toml = r#"
[discord]
token = "abc"
"#;
        assert!(toml::from_str::<Config>(toml).is_err());
    }
}
