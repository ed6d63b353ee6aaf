use std::{env, time::Duration};

use config::{Config as ConfigBuilder, ConfigError, Environment, File};
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub api: ApiConfig,
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default)]
    pub views: ViewsConfig,
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ApiConfig {
    pub base_url: String,
    #[serde(default = "default_placeholder_image")]
    pub placeholder_image: String,
    /// 0 disables the client timeout
    #[serde(default)]
    pub timeout_seconds: u64,
}

impl ApiConfig {
    pub fn timeout(&self) -> Option<Duration> {
        (self.timeout_seconds > 0).then(|| Duration::from_secs(self.timeout_seconds))
    }
}

fn default_placeholder_image() -> String {
    "/static/images/placeholder.svg".to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct SessionConfig {
    #[serde(default = "default_login_url")]
    pub login_url: String,
    #[serde(default = "default_user_id_cookie")]
    pub user_id_cookie: String,
    #[serde(default = "default_token_cookie")]
    pub token_cookie: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            login_url: default_login_url(),
            user_id_cookie: default_user_id_cookie(),
            token_cookie: default_token_cookie(),
        }
    }
}

fn default_login_url() -> String {
    "/login".to_string()
}

fn default_user_id_cookie() -> String {
    "userId".to_string()
}

fn default_token_cookie() -> String {
    "token".to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct ViewsConfig {
    #[serde(default = "default_idle_timeout_seconds")]
    pub idle_timeout_seconds: u64,
    #[serde(default = "default_sweep_interval_seconds")]
    pub sweep_interval_seconds: u64,
}

impl Default for ViewsConfig {
    fn default() -> Self {
        Self {
            idle_timeout_seconds: default_idle_timeout_seconds(),
            sweep_interval_seconds: default_sweep_interval_seconds(),
        }
    }
}

impl ViewsConfig {
    pub fn idle_timeout(&self) -> Duration {
        Duration::from_secs(self.idle_timeout_seconds)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_seconds)
    }
}

fn default_idle_timeout_seconds() -> u64 {
    30 * 60
}

fn default_sweep_interval_seconds() -> u64 {
    60
}

#[derive(Debug, Deserialize, Clone)]
pub struct ObservabilityConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Config {
    /// Load configuration from file and environment variables
    ///
    /// Priority (highest to lowest):
    /// 1. Environment variables (MEALVIEW__API__BASE_URL, etc.)
    /// 2. Config file specified by path
    /// 3. Hardcoded defaults
    pub fn load(config_path: Option<String>) -> Result<Self, ConfigError> {
        let mut builder = ConfigBuilder::builder();

        builder = builder
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 3000)?
            .set_default("api.base_url", "http://localhost:8080")?;

        let config_file_path = config_path
            .or_else(|| env::var("CONFIG_PATH").ok())
            .unwrap_or_else(|| "config/default.toml".to_string());

        // Optional, ignored when missing
        if std::path::Path::new(&config_file_path).exists() {
            builder = builder.add_source(File::with_name(&config_file_path));
        }

        builder = builder.add_source(
            Environment::with_prefix("MEALVIEW")
                .separator("__")
                .try_parsing(true),
        );

        builder.build()?.try_deserialize()
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.server.port == 0 {
            return Err("Server port must be greater than 0".to_string());
        }
        match url::Url::parse(&self.api.base_url) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => {}
            _ => {
                return Err(format!(
                    "API base_url must be an http(s) URL, got {:?}",
                    self.api.base_url
                ));
            }
        }
        if self.session.login_url.is_empty() {
            return Err("Session login_url must not be empty".to_string());
        }
        if self.views.sweep_interval_seconds == 0 {
            return Err("Views sweep_interval_seconds must be at least 1".to_string());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_config() -> Config {
        Config {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 3000,
            },
            api: ApiConfig {
                base_url: "http://localhost:8080".to_string(),
                placeholder_image: default_placeholder_image(),
                timeout_seconds: 0,
            },
            session: SessionConfig::default(),
            views: ViewsConfig::default(),
            observability: ObservabilityConfig::default(),
        }
    }

    #[test]
    fn test_validation_valid_config() {
        assert!(valid_config().validate().is_ok());
    }

    #[test]
    fn test_validation_zero_port() {
        let mut config = valid_config();
        config.server.port = 0;

        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_invalid_base_url() {
        let mut config = valid_config();
        config.api.base_url = "not a url".to_string();
        assert!(config.validate().is_err());

        config.api.base_url = "ftp://example.com".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_empty_login_url() {
        let mut config = valid_config();
        config.session.login_url = String::new();

        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_zero_sweep_interval() {
        let mut config = valid_config();
        config.views.sweep_interval_seconds = 0;

        assert!(config.validate().is_err());
    }

    #[test]
    fn test_timeout_zero_means_none() {
        let mut config = valid_config();
        assert_eq!(config.api.timeout(), None);

        config.api.timeout_seconds = 5;
        assert_eq!(config.api.timeout(), Some(Duration::from_secs(5)));
    }
}
