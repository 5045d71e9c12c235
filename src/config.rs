use std::fs;
use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::error::AlertDeskError;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct LoggingConfig {
    pub alertdesk: String,
    pub default: String,
}

impl LoggingConfig {
    const LOG_LEVELS: [&str; 5] = ["error", "warn", "info", "debug", "trace"];
    const ALERTDESK_LEVEL: &str = "info";
    const DEFAULT_LEVEL: &str = "warn";

    fn ensure_valid(&mut self) {
        self.alertdesk = Self::valid_level(&self.alertdesk, "alertdesk", Self::ALERTDESK_LEVEL);
        self.default = Self::valid_level(&self.default, "default", Self::DEFAULT_LEVEL);
    }

    fn valid_level(level: &str, name: &str, fallback: &str) -> String {
        let normalized = level.trim().to_ascii_lowercase();
        if Self::LOG_LEVELS.contains(&normalized.as_str()) {
            normalized
        } else {
            // Logging isn't running yet, so this has to go to stderr
            eprintln!(
                "Config error: {} log level of '{}' is invalid - using default of '{}'",
                name, level, fallback
            );
            fallback.to_owned()
        }
    }

    /// flexi_logger spec string, e.g. `warn, alertdesk=info`
    pub fn log_spec(&self) -> String {
        format!("{}, alertdesk={}", self.default, self.alertdesk)
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig {
            alertdesk: Self::ALERTDESK_LEVEL.to_string(),
            default: Self::DEFAULT_LEVEL.to_string(),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            host: "0.0.0.0".to_string(),
            port: 5000,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct DatabaseConfig {
    pub path: PathBuf,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        DatabaseConfig {
            path: PathBuf::from("emergency.db"),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct AuthConfig {
    /// HMAC key for signing tokens. Deployment-specific, there is no default.
    pub secret_key: String,
    pub token_ttl_hours: i64,
}

impl AuthConfig {
    pub fn token_ttl(&self) -> chrono::Duration {
        chrono::Duration::hours(self.token_ttl_hours)
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        AuthConfig {
            secret_key: String::new(),
            token_ttl_hours: 24,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    pub logging: LoggingConfig,
}

impl Config {
    const ENV_PREFIX: &str = "ALERTDESK_";

    /// Default location of the config file when none is given on the command line.
    pub fn default_config_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", "alertdesk")
            .map(|dirs| dirs.data_local_dir().join("config.toml"))
    }

    /// Loads configuration: defaults, then the TOML file, then `ALERTDESK_*`
    /// environment variables (`__` separates sections, e.g.
    /// `ALERTDESK_AUTH__SECRET_KEY`).
    ///
    /// When no explicit path is given and the default file doesn't exist yet,
    /// the defaults are written there so there's something to edit.
    pub fn load(explicit_path: Option<&Path>) -> Result<Self, AlertDeskError> {
        let config_path = match explicit_path {
            Some(path) => Some(path.to_path_buf()),
            None => {
                let path = Self::default_config_path();
                if let Some(path) = &path {
                    Self::write_default_if_missing(path);
                }
                path
            }
        };

        let mut figment = Figment::from(Serialized::defaults(Config::default()));
        if let Some(path) = &config_path {
            figment = figment.merge(Toml::file(path));
        }
        figment = figment.merge(Env::prefixed(Self::ENV_PREFIX).split("__"));

        Self::from_figment(figment)
    }

    fn from_figment(figment: Figment) -> Result<Self, AlertDeskError> {
        let mut config: Config = figment
            .extract()
            .map_err(|e| AlertDeskError::ConfigError(e.to_string()))?;

        config.ensure_valid()?;

        Ok(config)
    }

    fn write_default_if_missing(config_path: &Path) {
        if config_path.exists() {
            return;
        }

        if let Some(parent) = config_path.parent() {
            if let Err(e) = fs::create_dir_all(parent) {
                eprintln!(
                    "Failed to create configuration directory {}: {}",
                    parent.display(),
                    e
                );
                return;
            }
        }

        match toml::to_string_pretty(&Config::default()) {
            Ok(toml_string) => {
                if let Err(e) = fs::write(config_path, toml_string) {
                    eprintln!(
                        "Failed to write default config to {}: {}",
                        config_path.display(),
                        e
                    );
                }
            }
            Err(e) => eprintln!("Failed to serialize default config: {}", e),
        }
    }

    fn ensure_valid(&mut self) -> Result<(), AlertDeskError> {
        self.logging.ensure_valid();

        if self.auth.secret_key.trim().is_empty() {
            return Err(AlertDeskError::ConfigError(format!(
                "auth.secret_key must be set (config file or {}AUTH__SECRET_KEY)",
                Self::ENV_PREFIX
            )));
        }

        if self.auth.token_ttl_hours <= 0 {
            return Err(AlertDeskError::ConfigError(format!(
                "auth.token_ttl_hours must be positive, got {}",
                self.auth.token_ttl_hours
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::Jail;
    use pretty_assertions::assert_eq;

    fn jail_figment(jail: &Jail) -> Figment {
        Figment::from(Serialized::defaults(Config::default()))
            .merge(Toml::file(jail.directory().join("config.toml")))
            .merge(Env::prefixed(Config::ENV_PREFIX).split("__"))
    }

    #[test]
    fn test_defaults_require_secret_key() {
        Jail::expect_with(|jail| {
            let result = Config::from_figment(jail_figment(jail));
            assert!(matches!(result, Err(AlertDeskError::ConfigError(_))));
            Ok(())
        });
    }

    #[test]
    fn test_file_and_env_layering() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "config.toml",
                r#"
                [server]
                port = 8080

                [database]
                path = "/var/lib/alertdesk/alerts.db"

                [auth]
                secret_key = "from-file"
                "#,
            )?;
            jail.set_env("ALERTDESK_AUTH__SECRET_KEY", "from-env");
            jail.set_env("ALERTDESK_SERVER__HOST", "127.0.0.1");

            let config = Config::from_figment(jail_figment(jail)).unwrap();
            assert_eq!(config.server.host, "127.0.0.1");
            assert_eq!(config.server.port, 8080);
            assert_eq!(config.database.path, PathBuf::from("/var/lib/alertdesk/alerts.db"));
            assert_eq!(config.auth.secret_key, "from-env");
            assert_eq!(config.auth.token_ttl_hours, 24);
            assert_eq!(config.logging, LoggingConfig::default());
            Ok(())
        });
    }

    #[test]
    fn test_invalid_log_level_falls_back() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "config.toml",
                r#"
                [auth]
                secret_key = "s3cret"

                [logging]
                alertdesk = " DEBUG "
                default = "loud"
                "#,
            )?;

            let config = Config::from_figment(jail_figment(jail)).unwrap();
            assert_eq!(config.logging.alertdesk, "debug");
            assert_eq!(config.logging.default, "warn");
            assert_eq!(config.logging.log_spec(), "warn, alertdesk=debug");
            Ok(())
        });
    }

    #[test]
    fn test_rejects_non_positive_ttl() {
        Jail::expect_with(|jail| {
            jail.set_env("ALERTDESK_AUTH__SECRET_KEY", "s3cret");
            jail.set_env("ALERTDESK_AUTH__TOKEN_TTL_HOURS", "0");

            let result = Config::from_figment(jail_figment(jail));
            assert!(matches!(result, Err(AlertDeskError::ConfigError(_))));
            Ok(())
        });
    }

    #[test]
    fn test_load_with_explicit_path() {
        Jail::expect_with(|jail| {
            jail.create_file("custom.toml", "[auth]\nsecret_key = \"abc\"\n")?;
            let path = jail.directory().join("custom.toml");

            let config = Config::load(Some(&path)).unwrap();
            assert_eq!(config.auth.secret_key, "abc");
            assert_eq!(config.auth.token_ttl(), chrono::Duration::hours(24));
            Ok(())
        });
    }
}
