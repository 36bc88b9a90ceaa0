use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;

use swoptrader_core::{ApiClient, DataSources, FirestoreClient, FirestoreSettings, WriteAckPolicy};

/// Source of a configuration value
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfigSource {
    Default,
    File,
    Environment,
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigSource::Default => write!(f, "default"),
            ConfigSource::File => write!(f, "file"),
            ConfigSource::Environment => write!(f, "environment"),
        }
    }
}

/// A configuration value with its source
#[derive(Debug, Clone, Serialize)]
pub struct ConfigValue<T> {
    pub value: T,
    pub source: ConfigSource,
}

impl<T> ConfigValue<T> {
    pub fn new(value: T, source: ConfigSource) -> Self {
        Self { value, source }
    }
}

/// REST backend connection
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ApiConfig {
    /// Base URL, e.g. "https://api.swoptrader.example"
    pub base_url: Option<String>,
    /// Bearer token sent with every request
    pub token: Option<String>,
}

impl ApiConfig {
    pub fn is_configured(&self) -> bool {
        self.base_url.is_some()
    }
}

/// Cloud document store connection
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct FirestoreConfig {
    pub project_id: Option<String>,
    /// Emulator `host:port`; production Firestore when unset
    pub host: Option<String>,
    /// OAuth access token
    pub token: Option<String>,
}

impl FirestoreConfig {
    pub fn is_configured(&self) -> bool {
        self.project_id.is_some()
    }

    pub fn settings(&self) -> Option<FirestoreSettings> {
        let project_id = self.project_id.as_ref()?;
        let mut settings = FirestoreSettings::new(project_id);
        if let Some(host) = &self.host {
            settings = settings.with_emulator(host);
        }
        if let Some(token) = &self.token {
            settings = settings.with_token(token);
        }
        Some(settings)
    }
}

/// Application configuration with source tracking
#[derive(Debug, Clone, Serialize)]
pub struct Config {
    /// Path to the SQLite cache
    pub database_path: ConfigValue<PathBuf>,
    /// The signed-in user; commands acting "as me" need it
    pub user_id: ConfigValue<Option<String>>,
    /// How saves are acknowledged
    pub write_policy: ConfigValue<WriteAckPolicy>,
    /// Config file path used (if any)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config_file: Option<PathBuf>,
    pub api: ApiConfig,
    pub firestore: FirestoreConfig,
}

/// Internal struct for deserializing config file
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct ConfigFile {
    database_path: Option<PathBuf>,
    user_id: Option<String>,
    write_policy: Option<WriteAckPolicy>,
    api: Option<ApiConfig>,
    firestore: Option<FirestoreConfig>,
}

impl Config {
    /// Load configuration with priority: env vars > config file > defaults
    pub fn load(config_path: Option<PathBuf>) -> Result<Self, ConfigError> {
        Self::load_with(config_path, |key| std::env::var(key).ok())
    }

    /// Like [`Config::load`], reading environment variables through `env`.
    pub fn load_with<F>(config_path: Option<PathBuf>, env: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut database_path = ConfigValue::new(
            Self::default_data_dir().join("cache.db"),
            ConfigSource::Default,
        );
        let mut user_id = ConfigValue::new(None, ConfigSource::Default);
        let mut write_policy = ConfigValue::new(WriteAckPolicy::default(), ConfigSource::Default);
        let mut config_file = None;
        let mut api = ApiConfig::default();
        let mut firestore = FirestoreConfig::default();

        let path = config_path.unwrap_or_else(Self::default_config_path);
        if path.exists() {
            let contents = std::fs::read_to_string(&path)
                .map_err(|e| ConfigError::ReadError(path.clone(), e))?;
            let file_config: ConfigFile = serde_yaml::from_str(&contents)
                .map_err(|e| ConfigError::ParseError(path.clone(), e))?;

            config_file = Some(path.clone());

            if let Some(db_path) = file_config.database_path {
                // Relative paths are relative to the config file
                let resolved_path = if db_path.is_relative() {
                    path.parent().map(|p| p.join(&db_path)).unwrap_or(db_path)
                } else {
                    db_path
                };
                database_path = ConfigValue::new(resolved_path, ConfigSource::File);
            }
            if let Some(user) = file_config.user_id {
                user_id = ConfigValue::new(Some(user), ConfigSource::File);
            }
            if let Some(policy) = file_config.write_policy {
                write_policy = ConfigValue::new(policy, ConfigSource::File);
            }
            if let Some(api_config) = file_config.api {
                api = api_config;
            }
            if let Some(firestore_config) = file_config.firestore {
                firestore = firestore_config;
            }
        }

        if let Some(db_path) = env("SWOP_DATABASE_PATH") {
            database_path = ConfigValue::new(PathBuf::from(db_path), ConfigSource::Environment);
        }
        if let Some(user) = env("SWOP_USER_ID") {
            user_id = ConfigValue::new(Some(user), ConfigSource::Environment);
        }
        if let Some(raw) = env("SWOP_WRITE_POLICY") {
            let policy = raw
                .parse()
                .map_err(|e| ConfigError::InvalidValue("SWOP_WRITE_POLICY".to_string(), e))?;
            write_policy = ConfigValue::new(policy, ConfigSource::Environment);
        }
        if let Some(url) = env("SWOP_API_URL") {
            api.base_url = Some(url);
        }
        if let Some(token) = env("SWOP_API_TOKEN") {
            api.token = Some(token);
        }
        if let Some(project) = env("SWOP_FIRESTORE_PROJECT") {
            firestore.project_id = Some(project);
        }
        if let Some(host) = env("SWOP_FIRESTORE_HOST") {
            firestore.host = Some(host);
        }
        if let Some(token) = env("SWOP_FIRESTORE_TOKEN") {
            firestore.token = Some(token);
        }

        Ok(Self {
            database_path,
            user_id,
            write_policy,
            config_file,
            api,
            firestore,
        })
    }

    /// Remotes to read through, per the `api` and `firestore` sections.
    pub fn data_sources(&self) -> DataSources {
        let mut sources = DataSources::offline().with_write_ack(self.write_policy.value);

        if let Some(base_url) = &self.api.base_url {
            let mut client = ApiClient::new(base_url);
            if let Some(token) = &self.api.token {
                client = client.with_token(token);
            }
            sources = sources.with_api(client);
        }
        if let Some(settings) = self.firestore.settings() {
            sources = sources.with_store(Arc::new(FirestoreClient::new(settings)));
        }

        sources
    }

    /// The configured user, or an error naming how to set one.
    pub fn require_user(&self) -> Result<&str, ConfigError> {
        self.user_id.value.as_deref().ok_or(ConfigError::MissingUser)
    }

    /// Default config directory (platform-specific):
    /// - Linux: ~/.config/swoptrader/
    /// - macOS: ~/Library/Application Support/swoptrader/
    /// - Windows: %APPDATA%/swoptrader/
    pub fn default_config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("swoptrader")
    }

    /// Default data directory (platform-specific):
    /// - Linux: ~/.local/share/swoptrader/
    /// - macOS: ~/Library/Application Support/swoptrader/
    /// - Windows: %APPDATA%/swoptrader/
    pub fn default_data_dir() -> PathBuf {
        dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("swoptrader")
    }

    /// Default config file path (platform-specific config dir + config.yaml)
    pub fn default_config_path() -> PathBuf {
        Self::default_config_dir().join("config.yaml")
    }
}

#[derive(Debug)]
pub enum ConfigError {
    ReadError(PathBuf, std::io::Error),
    ParseError(PathBuf, serde_yaml::Error),
    InvalidValue(String, String),
    MissingUser,
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::ReadError(path, e) => {
                write!(f, "Failed to read config file '{}': {}", path.display(), e)
            }
            ConfigError::ParseError(path, e) => {
                write!(f, "Failed to parse config file '{}': {}", path.display(), e)
            }
            ConfigError::InvalidValue(key, e) => {
                write!(f, "Invalid value for {}: {}", key, e)
            }
            ConfigError::MissingUser => write!(
                f,
                "No user configured. Set user_id in the config file or SWOP_USER_ID"
            ),
        }
    }
}

impl std::error::Error for ConfigError {}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;
    use tempfile::tempdir;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    fn write_config(dir: &std::path::Path, lines: &[&str]) -> PathBuf {
        let config_path = dir.join("config.yaml");
        let mut file = std::fs::File::create(&config_path).unwrap();
        for line in lines {
            writeln!(file, "{}", line).unwrap();
        }
        config_path
    }

    #[test]
    fn test_default_config() {
        let temp_dir = tempdir().unwrap();
        let config_path = temp_dir.path().join("nonexistent.yaml");

        let config = Config::load_with(Some(config_path), no_env).unwrap();
        assert!(config
            .database_path
            .value
            .to_string_lossy()
            .contains("cache.db"));
        assert_eq!(config.database_path.source, ConfigSource::Default);
        assert_eq!(config.user_id.value, None);
        assert_eq!(config.write_policy.value, WriteAckPolicy::LocalFirst);
        assert!(config.config_file.is_none());
        assert!(!config.api.is_configured());
        assert!(!config.firestore.is_configured());
        assert!(config.require_user().is_err());
    }

    #[test]
    fn test_load_from_file() {
        let temp_dir = tempdir().unwrap();
        let config_path = write_config(
            temp_dir.path(),
            &[
                "database_path: /custom/path/cache.db",
                "user_id: alice",
                "write_policy: remote_confirmed",
                "api:",
                "  base_url: http://localhost:8080",
                "  token: secret",
                "firestore:",
                "  project_id: swop-demo",
                "  host: localhost:8081",
            ],
        );

        let config = Config::load_with(Some(config_path.clone()), no_env).unwrap();
        assert_eq!(
            config.database_path.value,
            PathBuf::from("/custom/path/cache.db")
        );
        assert_eq!(config.database_path.source, ConfigSource::File);
        assert_eq!(config.user_id.value.as_deref(), Some("alice"));
        assert_eq!(config.user_id.source, ConfigSource::File);
        assert_eq!(config.write_policy.value, WriteAckPolicy::RemoteConfirmed);
        assert_eq!(config.api.token.as_deref(), Some("secret"));
        assert_eq!(config.config_file, Some(config_path));

        let settings = config.firestore.settings().unwrap();
        assert_eq!(
            settings.documents_url(),
            "http://localhost:8081/v1/projects/swop-demo/databases/(default)/documents"
        );
    }

    #[test]
    fn test_relative_database_path_resolves_against_config_dir() {
        let temp_dir = tempdir().unwrap();
        let config_path = write_config(temp_dir.path(), &["database_path: data/cache.db"]);

        let config = Config::load_with(Some(config_path), no_env).unwrap();
        assert_eq!(
            config.database_path.value,
            temp_dir.path().join("data/cache.db")
        );
    }

    #[test]
    fn test_env_var_overrides_file() {
        let temp_dir = tempdir().unwrap();
        let config_path = write_config(
            temp_dir.path(),
            &["user_id: fromfile", "api:", "  base_url: http://file"],
        );

        let env: HashMap<&str, &str> = [
            ("SWOP_USER_ID", "fromenv"),
            ("SWOP_API_URL", "http://env"),
            ("SWOP_WRITE_POLICY", "remote"),
        ]
        .into_iter()
        .collect();

        let config = Config::load_with(Some(config_path), |key| {
            env.get(key).map(|v| v.to_string())
        })
        .unwrap();
        assert_eq!(config.user_id.value.as_deref(), Some("fromenv"));
        assert_eq!(config.user_id.source, ConfigSource::Environment);
        assert_eq!(config.api.base_url.as_deref(), Some("http://env"));
        assert_eq!(config.write_policy.value, WriteAckPolicy::RemoteConfirmed);
        assert_eq!(config.write_policy.source, ConfigSource::Environment);
        assert_eq!(config.require_user().unwrap(), "fromenv");
    }

    #[test]
    fn test_invalid_write_policy_env() {
        let temp_dir = tempdir().unwrap();
        let config_path = temp_dir.path().join("nonexistent.yaml");

        let result = Config::load_with(Some(config_path), |key| {
            (key == "SWOP_WRITE_POLICY").then(|| "eventually".to_string())
        });
        let err = result.unwrap_err();
        assert!(err.to_string().contains("SWOP_WRITE_POLICY"));
    }

    #[test]
    fn test_invalid_yaml_error() {
        let temp_dir = tempdir().unwrap();
        let config_path = write_config(temp_dir.path(), &["invalid: yaml: content: ["]);

        let result = Config::load_with(Some(config_path), no_env);
        assert!(result.is_err());
        let err = result.unwrap_err();
        assert!(err.to_string().contains("Failed to parse config file"));
    }

    #[test]
    fn test_data_sources_follow_config() {
        let temp_dir = tempdir().unwrap();
        let config_path = temp_dir.path().join("nonexistent.yaml");

        let offline = Config::load_with(Some(config_path.clone()), no_env)
            .unwrap()
            .data_sources();
        assert!(offline.api.is_none());
        assert!(offline.store.is_none());

        let config = Config::load_with(Some(config_path), |key| match key {
            "SWOP_API_URL" => Some("http://localhost:8080/".to_string()),
            "SWOP_FIRESTORE_PROJECT" => Some("swop-demo".to_string()),
            _ => None,
        })
        .unwrap();
        let sources = config.data_sources();
        assert_eq!(
            sources.api.as_ref().map(|api| api.base_url()),
            Some("http://localhost:8080")
        );
        assert!(sources.store.is_some());
    }
}
