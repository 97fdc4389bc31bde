use anyhow::Result;
use serde::{Deserialize, Serialize};
use serenity::model::id::{ChannelId, RoleId};
use std::env;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub discord_token: String,
    pub application_id: u64,
    pub verified_role_id: RoleId,
    pub log_channel_id: ChannelId,
    pub welcome_channel_id: ChannelId,
    pub log_level: String,
    pub log_file: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Ok(Config {
            discord_token: required("TOKEN")?,
            application_id: required_id("CLIENT_ID")?,
            verified_role_id: RoleId(required_id("VERIFIED_ROLE_ID")?),
            log_channel_id: ChannelId(required_id("LOG_CHANNEL_ID")?),
            welcome_channel_id: ChannelId(required_id("WELCOME_CHANNEL_ID")?),
            log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            log_file: env::var("LOG_FILE").unwrap_or_else(|_| "bot.log".to_string()),
        })
    }
}

fn required(name: &str) -> Result<String> {
    env::var(name).map_err(|_| anyhow::anyhow!("{} environment variable not set", name))
}

/// Snowflake ids arrive as decimal strings; anything unparseable is a
/// configuration error, not a runtime one.
fn required_id(name: &str) -> Result<u64> {
    required(name)?
        .parse()
        .map_err(|_| anyhow::anyhow!("{} must be a numeric Discord id", name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    // The tests below mutate process-wide environment variables.
    static ENV_LOCK: Mutex<()> = Mutex::new(());

    fn set_all_required() {
        env::set_var("TOKEN", "test_token");
        env::set_var("CLIENT_ID", "123456789012345678");
        env::set_var("VERIFIED_ROLE_ID", "222222222222222222");
        env::set_var("LOG_CHANNEL_ID", "333333333333333333");
        env::set_var("WELCOME_CHANNEL_ID", "444444444444444444");
    }

    #[test]
    fn test_config_from_env_missing_required() {
        let _guard = ENV_LOCK.lock().unwrap();
        set_all_required();
        env::remove_var("TOKEN");

        let result = Config::from_env();
        assert!(result.is_err());
    }

    #[test]
    fn test_config_rejects_malformed_id() {
        let _guard = ENV_LOCK.lock().unwrap();
        set_all_required();
        env::set_var("VERIFIED_ROLE_ID", "not-a-snowflake");

        let result = Config::from_env();
        assert!(result.is_err());
    }

    #[test]
    fn test_config_with_defaults() {
        let _guard = ENV_LOCK.lock().unwrap();
        set_all_required();
        env::remove_var("LOG_LEVEL");
        env::remove_var("LOG_FILE");

        let config = Config::from_env().unwrap();
        assert_eq!(config.discord_token, "test_token");
        assert_eq!(config.application_id, 123456789012345678);
        assert_eq!(config.verified_role_id, RoleId(222222222222222222));
        assert_eq!(config.log_channel_id, ChannelId(333333333333333333));
        assert_eq!(config.welcome_channel_id, ChannelId(444444444444444444));
        assert_eq!(config.log_level, "info");
        assert_eq!(config.log_file, "bot.log");
    }
}
