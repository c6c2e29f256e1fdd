//! Configuration types for Screen Manager.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::{Error, Result};

/// Environment variable holding the shared registration secret.
pub const ENV_SECRET: &str = "SECRET";
/// Environment variable that drops and recreates the tables when set to `true`.
pub const ENV_DROP: &str = "DROP";
/// Environment variable overriding the database file location.
pub const ENV_DATABASE: &str = "SCREEN_MANAGER_DB";

/// Server configuration loaded from YAML file.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ServerConfig {
    /// Server settings
    pub server: ServerSettings,
    /// Database settings
    pub database: DatabaseSettings,
    /// Security settings
    pub security: SecuritySettings,
    /// Session multiplexer settings
    pub session: SessionSettings,
}

impl ServerConfig {
    /// Load configuration from a YAML file.
    ///
    /// Values are not validated here; call [`ServerConfig::validate`] once
    /// environment overrides have been applied.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Parse configuration from YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        serde_yaml::from_str(yaml).map_err(|e| Error::Config(e.to_string()))
    }

    /// Apply overrides from the process environment.
    pub fn apply_process_env(&mut self) {
        self.apply_env_overrides(|key| std::env::var(key).ok());
    }

    /// Apply overrides using the given variable lookup.
    ///
    /// `SECRET` replaces the registration secret, `DROP=true` enables the
    /// destructive reset and `SCREEN_MANAGER_DB` relocates the database file.
    pub fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(secret) = lookup(ENV_SECRET) {
            self.security.secret = Some(secret);
        }
        if let Some(drop) = lookup(ENV_DROP) {
            self.database.drop_on_startup = drop == "true";
        }
        if let Some(path) = lookup(ENV_DATABASE) {
            self.database.path = path;
        }
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<()> {
        if self.database.path.trim().is_empty() {
            return Err(Error::Config("database.path cannot be empty".to_string()));
        }

        if self.session.multiplexer.trim().is_empty() {
            return Err(Error::Config(
                "session.multiplexer cannot be empty".to_string(),
            ));
        }

        let script = &self.session.script_name;
        if script.is_empty() || script.contains('/') || script == "." || script == ".." {
            return Err(Error::Config(format!(
                "session.script_name must be a plain file name, got '{script}'"
            )));
        }

        Ok(())
    }
}

/// Server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

/// Database settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseSettings {
    /// SQLite database file
    pub path: String,
    /// Drop and recreate both tables at startup
    pub drop_on_startup: bool,
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            path: "/tmp/screen_manager.db".to_string(),
            drop_on_startup: false,
        }
    }
}

/// Security settings.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct SecuritySettings {
    /// Shared secret required to register users (unset = registration closed)
    pub secret: Option<String>,
}

impl SecuritySettings {
    /// Check a caller-supplied registration secret.
    ///
    /// Always false when no secret is configured.
    pub fn is_secret_valid(&self, candidate: &str) -> bool {
        self.secret
            .as_deref()
            .is_some_and(|secret| secret == candidate)
    }
}

/// How screen names are matched against multiplexer sessions on teardown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum MatchMode {
    /// Session name must equal the screen name
    #[default]
    Exact,
    /// Session identifier only has to contain the screen name
    Substring,
}

/// Session multiplexer settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionSettings {
    /// Multiplexer binary
    pub multiplexer: String,
    /// File name of the generated run script inside the screen directory
    pub script_name: String,
    /// Teardown matching policy
    pub match_mode: MatchMode,
    /// Start a detached session right after provisioning
    pub autostart: bool,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            multiplexer: "screen".to_string(),
            script_name: "run.sh".to_string(),
            match_mode: MatchMode::Exact,
            autostart: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_default_config() {
        let config = ServerConfig::default();
        assert_eq!(config.server.log_level, "info");
        assert_eq!(config.database.path, "/tmp/screen_manager.db");
        assert!(!config.database.drop_on_startup);
        assert_eq!(config.security.secret, None);
        assert_eq!(config.session.multiplexer, "screen");
        assert_eq!(config.session.script_name, "run.sh");
        assert_eq!(config.session.match_mode, MatchMode::Exact);
        assert!(!config.session.autostart);
    }

    #[test]
    fn test_config_validation() {
        let config = ServerConfig::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_empty_database_path() {
        let mut config = ServerConfig::default();
        config.database.path = "  ".to_string();
        assert!(matches!(config.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn test_script_name_with_separator() {
        let mut config = ServerConfig::default();
        config.session.script_name = "../run.sh".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_empty_multiplexer() {
        let mut config = ServerConfig::default();
        config.session.multiplexer = String::new();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_parse_yaml() {
        let yaml = r#"
server:
  log_level: debug

database:
  path: /var/lib/screens.db
  drop_on_startup: true

security:
  secret: hunter2

session:
  multiplexer: /usr/bin/screen
  script_name: start.sh
  match_mode: substring
  autostart: true
"#;

        let config = ServerConfig::from_yaml(yaml).unwrap();
        assert_eq!(config.server.log_level, "debug");
        assert_eq!(config.database.path, "/var/lib/screens.db");
        assert!(config.database.drop_on_startup);
        assert_eq!(config.security.secret.as_deref(), Some("hunter2"));
        assert_eq!(config.session.multiplexer, "/usr/bin/screen");
        assert_eq!(config.session.script_name, "start.sh");
        assert_eq!(config.session.match_mode, MatchMode::Substring);
        assert!(config.session.autostart);
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let config = ServerConfig::from_yaml("security:\n  secret: s\n").unwrap();
        assert_eq!(config.database.path, "/tmp/screen_manager.db");
        assert_eq!(config.session.script_name, "run.sh");
    }

    #[test]
    fn test_invalid_yaml() {
        let result = ServerConfig::from_yaml("session:\n  match_mode: fuzzy\n");
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [
            (ENV_SECRET, "top"),
            (ENV_DROP, "true"),
            (ENV_DATABASE, "/srv/db.sqlite"),
        ]
        .into_iter()
        .collect();

        let mut config = ServerConfig::default();
        config.apply_env_overrides(|key| env.get(key).map(|v| v.to_string()));

        assert_eq!(config.security.secret.as_deref(), Some("top"));
        assert!(config.database.drop_on_startup);
        assert_eq!(config.database.path, "/srv/db.sqlite");
    }

    #[test]
    fn test_env_override_rescues_empty_database_path() {
        let mut config = ServerConfig::from_yaml("database:\n  path: \"\"\n").unwrap();
        assert!(config.validate().is_err());

        config.apply_env_overrides(|key| {
            (key == ENV_DATABASE).then(|| "/srv/db.sqlite".to_string())
        });
        assert!(config.validate().is_ok());
        assert_eq!(config.database.path, "/srv/db.sqlite");
    }

    #[test]
    fn test_from_file_defers_validation() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("config.yaml");
        std::fs::write(&file, "database:\n  path: \"\"\n").unwrap();

        let config = ServerConfig::from_file(&file).unwrap();
        assert!(matches!(config.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn test_drop_requires_literal_true() {
        let mut config = ServerConfig::default();
        config.database.drop_on_startup = true;
        config.apply_env_overrides(|key| (key == ENV_DROP).then(|| "1".to_string()));
        assert!(!config.database.drop_on_startup);
    }

    #[test]
    fn test_secret_check() {
        let mut settings = SecuritySettings::default();

        // No configured secret = registration closed
        assert!(!settings.is_secret_valid(""));
        assert!(!settings.is_secret_valid("anything"));

        settings.secret = Some("s3cret".to_string());
        assert!(settings.is_secret_valid("s3cret"));
        assert!(!settings.is_secret_valid("s3cret "));
    }
}
