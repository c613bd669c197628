//! Configuration of the bot.
//!
//! Values come from, in increasing priority: the defaults, an optional JSON
//! file (`JESTER_CONFIG`, `./config.json` by default) and the environment.
//! A `.env` file is loaded into the environment first.

use std::{collections::HashSet, path::{Path, PathBuf}, time::Duration};
use log::LevelFilter;
use serde::Deserialize;
use serenity::model::id::{ChannelId, GuildId, RoleId, UserId};
use crate::{
    error::{Error, Result},
    tracker::{RoleRestore, TrackerConfig},
};

pub const DEFAULT_NICKNAME: &str = "Jester";
pub const DEFAULT_PREFIX: &str = "!";
const DEFAULT_CONFIG_PATH: &str = "./config.json";

/// Content of the JSON configuration file. Every key is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConfigFile {
    pub token: Option<String>,
    pub server_id: Option<u64>,
    pub target_channel: Option<u64>,
    pub target_voice_channel: Option<u64>,
    pub override_nickname: Option<String>,
    pub color_role_id: Option<u64>,
    pub role_restore: Option<RoleRestore>,
    pub allowed_users: Option<Vec<u64>>,
    pub restore_delay_ms: Option<u64>,
    pub command_prefix: Option<String>,
    pub experimental: Option<bool>,
    pub log_level: Option<String>,
}

impl ConfigFile {
    pub fn read_file<P: AsRef<Path>>(filepath: P) -> Result<Self> {
        let filepath = filepath.as_ref();
        let content = std::fs::read_to_string(filepath)
            .map_err(|e| Error::ConfigInvalid { key: "JESTER_CONFIG", value: format!("{}: {}", filepath.to_string_lossy(), e) })?;
        serde_json::from_str(&content)
            .map_err(|e| Error::ConfigInvalid { key: "JESTER_CONFIG", value: format!("{}: {}", filepath.to_string_lossy(), e) })
    }
}

/// Configuration of the application
#[derive(Debug, Clone)]
pub struct Config {
    pub token: String,
    /// Server the bot works on. When absent, the first server seen is used.
    pub server_id: Option<GuildId>,
    pub prefix: String,
    /// Allow commands flagged as experimental.
    pub experimental: bool,
    pub log_level: LevelFilter,
    pub tracker: TrackerConfig,
}

impl Config {
    /// Load the configuration from the `.env` file, the JSON file and the environment.
    pub fn load() -> Result<Self> {
        dotenvy::dotenv().ok();
        let (path, explicit) = match std::env::var("JESTER_CONFIG") {
            Ok(path) => (PathBuf::from(path), true),
            Err(_) => (PathBuf::from(DEFAULT_CONFIG_PATH), false),
        };
        let file = if explicit || path.exists() {
            ConfigFile::read_file(&path)?
        } else {
            ConfigFile::default()
        };
        Self::from_sources(file, |key| std::env::var(key).ok())
    }

    /// Merge the file content with the variables given by `env`.
    pub fn from_sources<F>(file: ConfigFile, env: F) -> Result<Self>
        where F: Fn(&str) -> Option<String>
    {
        let raw = &env;
        let env = |key: &str| raw(key).filter(|v| !v.trim().is_empty());

        let token = env("DISCORD_TOKEN")
            .or(file.token)
            .filter(|t| !t.trim().is_empty())
            .ok_or(Error::ConfigMissing("DISCORD_TOKEN"))?;
        let server_id = env_id(&env, "SERVER_ID")?.or(file.server_id).map(GuildId);
        let target_channel = env_id(&env, "TARGET_CHANNEL")?.or(file.target_channel).map(ChannelId);
        let target_voice_channel = env_id(&env, "TARGET_VOICE_CHANNEL")?
            .or(file.target_voice_channel)
            .map(ChannelId)
            .or(target_channel);
        // A blank nickname disables the nickname override, so the unfiltered variable is read here.
        let override_nickname = match raw("OVERRIDE_NICKNAME").or_else(|| raw("NICKNAME")) {
            Some(nick) => nick.trim().to_string(),
            None => file.override_nickname.unwrap_or_else(|| DEFAULT_NICKNAME.to_string()),
        };
        let color_role = env_id(&env, "COLOR_ROLE_ID")?.or(file.color_role_id).map(RoleId);
        let role_restore = match env("ROLE_RESTORE") {
            Some(v) => v.parse().map_err(|_| Error::ConfigInvalid { key: "ROLE_RESTORE", value: v })?,
            None => file.role_restore.unwrap_or_default(),
        };
        let allowed_users: HashSet<UserId> = match env("ALLOWED_USERS") {
            Some(list) => parse_id_list("ALLOWED_USERS", &list)?,
            None => file.allowed_users.unwrap_or_default(),
        }.into_iter().map(UserId).collect();
        let restore_delay = match env("RESTORE_DELAY_MS") {
            Some(v) => Some(parse_u64("RESTORE_DELAY_MS", &v)?),
            None => file.restore_delay_ms,
        }
        .filter(|ms| *ms > 0)
        .map(Duration::from_millis);
        let prefix = env("COMMAND_PREFIX")
            .or_else(|| env("PREFIX"))
            .or(file.command_prefix)
            .unwrap_or_else(|| DEFAULT_PREFIX.to_string());
        let experimental = match env("EXPERIMENTAL_COMMANDS") {
            Some(v) => parse_bool(&v),
            None => file.experimental.unwrap_or(false),
        };
        let log_level = match env("LOG_LEVEL").or(file.log_level) {
            Some(v) => crate::logger::parse_level(&v).ok_or(Error::ConfigInvalid { key: "LOG_LEVEL", value: v })?,
            None => LevelFilter::Info,
        };

        Ok(Config {
            token,
            server_id,
            prefix,
            experimental,
            log_level,
            tracker: TrackerConfig {
                target_channel,
                target_voice_channel,
                override_nickname,
                color_role,
                role_restore,
                allowed_users,
                restore_delay,
            },
        })
    }
}

fn env_id<F>(env: &F, key: &'static str) -> Result<Option<u64>>
    where F: Fn(&str) -> Option<String>
{
    env(key).map(|v| parse_u64(key, &v)).transpose()
}

fn parse_u64(key: &'static str, value: &str) -> Result<u64> {
    value.trim().parse().map_err(|_| Error::ConfigInvalid { key, value: value.to_string() })
}

fn parse_id_list(key: &'static str, list: &str) -> Result<Vec<u64>> {
    list.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| parse_u64(key, s))
        .collect()
}

fn parse_bool(value: &str) -> bool {
    matches!(value.trim().to_lowercase().as_str(), "true" | "1" | "yes" | "on")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)], file: ConfigFile) -> Result<Config> {
        let vars: HashMap<String, String> = vars.iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_sources(file, |key| vars.get(key).cloned())
    }

    #[test]
    fn token_is_required() {
        assert!(matches!(load(&[], ConfigFile::default()), Err(Error::ConfigMissing("DISCORD_TOKEN"))));
        assert!(matches!(load(&[("DISCORD_TOKEN", "  ")], ConfigFile::default()), Err(Error::ConfigMissing("DISCORD_TOKEN"))));
    }
    #[test]
    fn defaults() {
        let config = load(&[("DISCORD_TOKEN", "secret")], ConfigFile::default()).unwrap();
        assert_eq!(config.token, "secret");
        assert_eq!(config.prefix, "!");
        assert!(!config.experimental);
        assert_eq!(config.log_level, LevelFilter::Info);
        assert_eq!(config.server_id, None);
        let tracker = &config.tracker;
        assert_eq!(tracker.override_nickname, "Jester");
        assert_eq!(tracker.target_channel, None);
        assert_eq!(tracker.color_role, None);
        assert_eq!(tracker.role_restore, RoleRestore::Remove);
        assert!(tracker.allowed_users.is_empty());
        assert_eq!(tracker.restore_delay, None);
    }
    #[test]
    fn environment() {
        let config = load(&[
            ("DISCORD_TOKEN", "secret"),
            ("SERVER_ID", "10"),
            ("TARGET_CHANNEL", "20"),
            ("NICKNAME", "Fool"),
            ("COLOR_ROLE_ID", "30"),
            ("ROLE_RESTORE", "snapshot"),
            ("ALLOWED_USERS", "1, 2,,3"),
            ("RESTORE_DELAY_MS", "1500"),
            ("PREFIX", "?"),
            ("EXPERIMENTAL_COMMANDS", "true"),
            ("LOG_LEVEL", "debug"),
        ], ConfigFile::default()).unwrap();
        assert_eq!(config.server_id, Some(GuildId(10)));
        assert_eq!(config.prefix, "?");
        assert!(config.experimental);
        assert_eq!(config.log_level, LevelFilter::Debug);
        let tracker = &config.tracker;
        assert_eq!(tracker.target_channel, Some(ChannelId(20)));
        assert_eq!(tracker.target_voice_channel, Some(ChannelId(20)));
        assert_eq!(tracker.override_nickname, "Fool");
        assert_eq!(tracker.color_role, Some(RoleId(30)));
        assert_eq!(tracker.role_restore, RoleRestore::Snapshot);
        assert_eq!(tracker.allowed_users, [1, 2, 3].into_iter().map(UserId).collect::<HashSet<_>>());
        assert_eq!(tracker.restore_delay, Some(Duration::from_millis(1500)));
    }
    #[test]
    fn environment_overrides_file() {
        let file: ConfigFile = serde_json::from_str(r#"{
            "token": "from-file",
            "target_channel": 5,
            "target_voice_channel": 6,
            "override_nickname": "Clown",
            "allowed_users": [7],
            "restore_delay_ms": 0,
            "command_prefix": "$"
        }"#).unwrap();
        let config = load(&[("TARGET_CHANNEL", "8"), ("OVERRIDE_NICKNAME", "Harlequin")], file).unwrap();
        assert_eq!(config.token, "from-file");
        assert_eq!(config.prefix, "$");
        assert_eq!(config.tracker.target_channel, Some(ChannelId(8)));
        assert_eq!(config.tracker.target_voice_channel, Some(ChannelId(6)));
        assert_eq!(config.tracker.override_nickname, "Harlequin");
        assert!(config.tracker.allowed_users.contains(&UserId(7)));
        assert_eq!(config.tracker.restore_delay, None);
    }
    #[test]
    fn blank_nickname_disables_override() {
        let config = load(&[("DISCORD_TOKEN", "secret"), ("OVERRIDE_NICKNAME", " ")], ConfigFile::default()).unwrap();
        assert_eq!(config.tracker.override_nickname, "");
        assert!(!config.tracker.capabilities().override_nickname);
    }
    #[test]
    fn invalid_values() {
        let err = load(&[("DISCORD_TOKEN", "secret"), ("ALLOWED_USERS", "1,bob")], ConfigFile::default()).unwrap_err();
        assert!(matches!(err, Error::ConfigInvalid { key: "ALLOWED_USERS", .. }));
        let err = load(&[("DISCORD_TOKEN", "secret"), ("ROLE_RESTORE", "everything")], ConfigFile::default()).unwrap_err();
        assert!(matches!(err, Error::ConfigInvalid { key: "ROLE_RESTORE", .. }));
        let err = load(&[("DISCORD_TOKEN", "secret"), ("LOG_LEVEL", "loud")], ConfigFile::default()).unwrap_err();
        assert!(matches!(err, Error::ConfigInvalid { key: "LOG_LEVEL", .. }));
        assert!(serde_json::from_str::<ConfigFile>(r#"{"prefix": "!"}"#).is_err());
    }
}
