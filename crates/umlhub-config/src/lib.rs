//! Configuration management for umlhub.
//!
//! Parses `umlhub.toml` with serde and discovers it in the current directory
//! or any parent. Without a file, built-in defaults are used. CLI settings are
//! applied during load via [`CliSettings`] and take precedence over the file.
//!
//! ```toml
//! [server]
//! host = "0.0.0.0"
//! port = 8000
//!
//! [renderer]
//! base_url = "${RENDERER_BASE_URL}"
//! timeout_secs = 30
//!
//! [syntax_checker]
//! base_url = "${SYNTAX_CHECKER_BASE_URL}"
//!
//! [github]
//! token = "${GITHUB_API_TOKEN:-}"
//!
//! [store]
//! database_url = "sqlite://umlhub.db"
//!
//! [indexer]
//! min_block_length = 50
//! on_block_error = "abort"
//! task_delay_secs = 5
//!
//! [query]
//! page_size = 10
//!
//! [notifications]
//! objects_dir = "objects"
//! ```
//!
//! ## Environment Variable Expansion
//!
//! - `${VAR}` - expands to the value of VAR, errors if unset
//! - `${VAR:-default}` - expands to VAR if set, otherwise uses default
//!
//! Expanded fields:
//! - `server.host`
//! - `renderer.base_url`
//! - `syntax_checker.base_url`
//! - `github.api_url`
//! - `github.token`
//! - `store.database_url`
//!
//! The built-in defaults for the two service URLs and the GitHub token read
//! `RENDERER_BASE_URL`, `SYNTAX_CHECKER_BASE_URL` and `GITHUB_API_TOKEN`.

mod expand;

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

/// CLI settings that override configuration file values.
///
/// All fields are optional. Only non-None values override the loaded config.
#[derive(Debug, Default)]
pub struct CliSettings {
    /// Override server host.
    pub host: Option<String>,
    /// Override server port.
    pub port: Option<u16>,
    /// Override render service base URL.
    pub renderer_url: Option<String>,
    /// Override syntax-check service base URL.
    pub syntax_checker_url: Option<String>,
    /// Override database URL.
    pub database_url: Option<String>,
    /// Override batch notification object directory.
    pub objects_dir: Option<PathBuf>,
}

/// Configuration filename to search for.
const CONFIG_FILENAME: &str = "umlhub.toml";

/// Application configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Server configuration.
    pub server: ServerConfig,
    /// Render service.
    pub renderer: ServiceConfig,
    /// Syntax-check service.
    pub syntax_checker: ServiceConfig,
    /// GitHub content API.
    pub github: GitHubConfig,
    /// Record store and search index.
    pub store: StoreConfig,
    /// Ingestion pipeline.
    pub indexer: IndexerConfig,
    /// Read path.
    pub query: QueryConfig,
    /// Batch notifications.
    pub notifications: NotificationsConfig,

    /// Path to the config file (set after loading).
    #[serde(skip)]
    pub config_path: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            renderer: ServiceConfig::with_base_url("${RENDERER_BASE_URL:-http://localhost:8080}"),
            syntax_checker: ServiceConfig::with_base_url(
                "${SYNTAX_CHECKER_BASE_URL:-http://localhost:8081}",
            ),
            github: GitHubConfig::default(),
            store: StoreConfig::default(),
            indexer: IndexerConfig::default(),
            query: QueryConfig::default(),
            notifications: NotificationsConfig::default(),
            config_path: None,
        }
    }
}

/// Server configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Server host address.
    pub host: String,
    /// Server port.
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_owned(),
            port: 8000,
        }
    }
}

/// External HTTP service configuration.
#[derive(Debug, Deserialize)]
pub struct ServiceConfig {
    /// Base URL (no trailing path).
    pub base_url: String,
    /// Global request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl ServiceConfig {
    fn with_base_url(base_url: &str) -> Self {
        Self {
            base_url: base_url.to_owned(),
            timeout_secs: default_timeout_secs(),
        }
    }

    /// Request timeout as a [`Duration`].
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

fn default_timeout_secs() -> u64 {
    30
}

/// GitHub content API configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct GitHubConfig {
    /// API root.
    pub api_url: String,
    /// Personal access token; empty means unauthenticated requests.
    pub token: String,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for GitHubConfig {
    fn default() -> Self {
        Self {
            api_url: "https://api.github.com".to_owned(),
            token: "${GITHUB_API_TOKEN:-}".to_owned(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl GitHubConfig {
    /// Token, if one is configured.
    #[must_use]
    pub fn token(&self) -> Option<&str> {
        Some(self.token.as_str()).filter(|t| !t.is_empty())
    }

    /// Request timeout as a [`Duration`].
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Storage configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// `SQLite` database URL. In-memory storage is used when unset.
    pub database_url: Option<String>,
}

/// What the indexer does when a block hits a service or store error.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BlockErrorPolicy {
    /// Abort the whole ingestion request.
    #[default]
    Abort,
    /// Record the failure and move on to the next block.
    Continue,
}

/// Ingestion pipeline configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct IndexerConfig {
    /// Blocks shorter than this many characters are skipped.
    pub min_block_length: usize,
    /// Failure handling for per-block errors.
    pub on_block_error: BlockErrorPolicy,
    /// Spacing between tasks enqueued from one batch notification.
    pub task_delay_secs: u64,
}

impl Default for IndexerConfig {
    fn default() -> Self {
        Self {
            min_block_length: 50,
            on_block_error: BlockErrorPolicy::Abort,
            task_delay_secs: 5,
        }
    }
}

impl IndexerConfig {
    #[must_use]
    pub fn task_delay(&self) -> Duration {
        Duration::from_secs(self.task_delay_secs)
    }
}

/// Read path configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct QueryConfig {
    /// Records per page for listing and search.
    pub page_size: usize,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self { page_size: 10 }
    }
}

/// Batch notification configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct NotificationsConfig {
    /// Directory holding notified objects (relative paths resolve against
    /// the config file's directory).
    pub objects_dir: PathBuf,
}

impl Default for NotificationsConfig {
    fn default() -> Self {
        Self {
            objects_dir: PathBuf::from("objects"),
        }
    }
}

/// Configuration error.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// File not found.
    #[error("Configuration file not found: {}", .0.display())]
    NotFound(PathBuf),
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// TOML parsing error.
    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),
    /// Validation error.
    #[error("Configuration error: {0}")]
    Validation(String),
    /// Environment variable error during expansion.
    #[error("Environment variable error in {field}: {message}")]
    EnvVar {
        /// Config field path (e.g., "`github.token`").
        field: String,
        /// Error message (e.g., "${`GITHUB_API_TOKEN`} not set").
        message: String,
    },
}

/// Require a string field to be non-empty.
fn require_non_empty(value: &str, field: &str) -> Result<(), ConfigError> {
    if value.is_empty() {
        return Err(ConfigError::Validation(format!("{field} cannot be empty")));
    }
    Ok(())
}

/// Require a URL field to use http:// or https:// scheme.
fn require_http_url(url: &str, field: &str) -> Result<(), ConfigError> {
    require_non_empty(url, field)?;
    if !url.starts_with("http://") && !url.starts_with("https://") {
        return Err(ConfigError::Validation(format!(
            "{field} must start with http:// or https://"
        )));
    }
    Ok(())
}

impl Config {
    /// Load configuration from file with optional CLI settings.
    ///
    /// If `config_path` is provided, loads from that file. Otherwise, searches
    /// for `umlhub.toml` in the current directory and parents, falling back
    /// to defaults.
    ///
    /// CLI settings are applied after environment expansion and path
    /// resolution; the result is validated last.
    ///
    /// # Errors
    ///
    /// Returns error if explicit `config_path` doesn't exist, parsing or
    /// expansion fails, or the final configuration is invalid.
    pub fn load(
        config_path: Option<&Path>,
        cli_settings: Option<&CliSettings>,
    ) -> Result<Self, ConfigError> {
        let mut config = if let Some(path) = config_path {
            if !path.exists() {
                return Err(ConfigError::NotFound(path.to_path_buf()));
            }
            Self::load_from_file(path)?
        } else if let Some(discovered) = Self::discover_config() {
            Self::load_from_file(&discovered)?
        } else {
            let mut config = Self::default();
            config.expand_env_vars()?;
            config.resolve_paths(&std::env::current_dir().unwrap_or_default());
            config
        };

        if let Some(settings) = cli_settings {
            config.apply_cli_settings(settings);
        }

        config.validate()?;
        Ok(config)
    }

    /// Apply CLI settings to the configuration.
    fn apply_cli_settings(&mut self, settings: &CliSettings) {
        if let Some(host) = &settings.host {
            self.server.host.clone_from(host);
        }
        if let Some(port) = settings.port {
            self.server.port = port;
        }
        if let Some(url) = &settings.renderer_url {
            self.renderer.base_url.clone_from(url);
        }
        if let Some(url) = &settings.syntax_checker_url {
            self.syntax_checker.base_url.clone_from(url);
        }
        if let Some(url) = &settings.database_url {
            self.store.database_url = Some(url.clone());
        }
        if let Some(dir) = &settings.objects_dir {
            self.notifications.objects_dir.clone_from(dir);
        }
    }

    /// Search for config file in current directory and parents.
    fn discover_config() -> Option<PathBuf> {
        let mut current = std::env::current_dir().ok()?;
        loop {
            let candidate = current.join(CONFIG_FILENAME);
            if candidate.exists() {
                return Some(candidate);
            }
            if !current.pop() {
                return None;
            }
        }
    }

    /// Load configuration from a specific file.
    fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content, path.parent().unwrap_or(Path::new(".")))
            .map(|config| Self {
                config_path: Some(path.to_path_buf()),
                ..config
            })
    }

    /// Parse TOML content, expanding variables and resolving relative paths
    /// against `config_dir`.
    fn from_toml(content: &str, config_dir: &Path) -> Result<Self, ConfigError> {
        let mut config: Self = toml::from_str(content)?;
        config.expand_env_vars()?;
        config.resolve_paths(config_dir);
        Ok(config)
    }

    /// Validate configuration values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Validation` if any validation fails.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.validate_server()?;
        self.validate_services()?;
        self.validate_store()?;
        self.validate_indexer()?;
        self.validate_query()?;
        Ok(())
    }

    fn validate_server(&self) -> Result<(), ConfigError> {
        require_non_empty(&self.server.host, "server.host")?;

        if self.server.port == 0 {
            return Err(ConfigError::Validation(
                "server.port cannot be 0".to_owned(),
            ));
        }

        Ok(())
    }

    fn validate_services(&self) -> Result<(), ConfigError> {
        require_http_url(&self.renderer.base_url, "renderer.base_url")?;
        require_http_url(&self.syntax_checker.base_url, "syntax_checker.base_url")?;
        require_http_url(&self.github.api_url, "github.api_url")?;

        for (secs, field) in [
            (self.renderer.timeout_secs, "renderer.timeout_secs"),
            (self.syntax_checker.timeout_secs, "syntax_checker.timeout_secs"),
            (self.github.timeout_secs, "github.timeout_secs"),
        ] {
            if secs == 0 {
                return Err(ConfigError::Validation(format!(
                    "{field} must be greater than 0"
                )));
            }
        }

        Ok(())
    }

    fn validate_store(&self) -> Result<(), ConfigError> {
        if let Some(url) = &self.store.database_url
            && !url.starts_with("sqlite:")
        {
            return Err(ConfigError::Validation(
                "store.database_url must be a sqlite: URL".to_owned(),
            ));
        }
        Ok(())
    }

    fn validate_indexer(&self) -> Result<(), ConfigError> {
        if self.indexer.min_block_length == 0 {
            return Err(ConfigError::Validation(
                "indexer.min_block_length must be greater than 0".to_owned(),
            ));
        }
        Ok(())
    }

    fn validate_query(&self) -> Result<(), ConfigError> {
        const MAX_PAGE_SIZE: usize = 100;

        let size = self.query.page_size;
        if size == 0 || size > MAX_PAGE_SIZE {
            return Err(ConfigError::Validation(format!(
                "query.page_size must be between 1 and {MAX_PAGE_SIZE}"
            )));
        }
        Ok(())
    }

    /// Expand environment variable references in configuration strings.
    fn expand_env_vars(&mut self) -> Result<(), ConfigError> {
        self.server.host = expand::expand_env(&self.server.host, "server.host")?;
        self.renderer.base_url = expand::expand_env(&self.renderer.base_url, "renderer.base_url")?;
        self.syntax_checker.base_url =
            expand::expand_env(&self.syntax_checker.base_url, "syntax_checker.base_url")?;
        self.github.api_url = expand::expand_env(&self.github.api_url, "github.api_url")?;
        self.github.token = expand::expand_env(&self.github.token, "github.token")?;

        if let Some(url) = &self.store.database_url {
            self.store.database_url = Some(expand::expand_env(url, "store.database_url")?);
        }

        Ok(())
    }

    /// Resolve relative paths against the config directory.
    fn resolve_paths(&mut self, config_dir: &Path) {
        if self.notifications.objects_dir.is_relative() {
            self.notifications.objects_dir = config_dir.join(&self.notifications.objects_dir);
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn parse(content: &str) -> Config {
        Config::from_toml(content, Path::new("/etc/umlhub")).unwrap()
    }

    /// Assert that validation fails with expected substrings in the error message.
    fn assert_validation_error(config: &Config, expected_substrings: &[&str]) {
        let result = config.validate();
        assert!(result.is_err(), "Expected validation to fail");
        let err = result.unwrap_err();
        assert!(
            matches!(err, ConfigError::Validation(_)),
            "Expected ConfigError::Validation, got {err:?}"
        );
        let msg = err.to_string();
        for s in expected_substrings {
            assert!(
                msg.contains(s),
                "Expected error to contain '{s}', got: {msg}"
            );
        }
    }

    fn valid_config() -> Config {
        parse(
            r#"
            [renderer]
            base_url = "http://render:8080"

            [syntax_checker]
            base_url = "http://checker:8081"
            "#,
        )
    }

    #[test]
    fn test_defaults() {
        let config = valid_config();

        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 8000);
        assert_eq!(config.renderer.timeout(), Duration::from_secs(30));
        assert_eq!(config.github.api_url, "https://api.github.com");
        assert_eq!(config.indexer.min_block_length, 50);
        assert_eq!(config.indexer.on_block_error, BlockErrorPolicy::Abort);
        assert_eq!(config.indexer.task_delay(), Duration::from_secs(5));
        assert_eq!(config.query.page_size, 10);
        assert!(config.store.database_url.is_none());
        assert_eq!(
            config.notifications.objects_dir,
            PathBuf::from("/etc/umlhub/objects")
        );
    }

    #[test]
    fn test_parse_full_config() {
        let config = parse(
            r#"
            [server]
            host = "0.0.0.0"
            port = 9000

            [renderer]
            base_url = "http://render:8080"
            timeout_secs = 10

            [syntax_checker]
            base_url = "http://checker:8081"

            [github]
            api_url = "https://github.example.com/api/v3"
            token = "ghp_literal"

            [store]
            database_url = "sqlite:///var/lib/umlhub.db"

            [indexer]
            min_block_length = 20
            on_block_error = "continue"
            task_delay_secs = 1

            [query]
            page_size = 25

            [notifications]
            objects_dir = "/srv/objects"
            "#,
        );

        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.renderer.timeout(), Duration::from_secs(10));
        assert_eq!(config.github.token(), Some("ghp_literal"));
        assert_eq!(
            config.store.database_url.as_deref(),
            Some("sqlite:///var/lib/umlhub.db")
        );
        assert_eq!(config.indexer.min_block_length, 20);
        assert_eq!(config.indexer.on_block_error, BlockErrorPolicy::Continue);
        assert_eq!(config.query.page_size, 25);
        assert_eq!(config.notifications.objects_dir, PathBuf::from("/srv/objects"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_service_section_requires_base_url() {
        let result = Config::from_toml("[renderer]\ntimeout_secs = 5\n", Path::new("."));
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_unknown_policy_is_parse_error() {
        let result = Config::from_toml("[indexer]\non_block_error = \"retry\"\n", Path::new("."));
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_expand_env_vars_service_urls() {
        // SAFETY: test runs single-threaded per test function
        unsafe {
            std::env::set_var("UMLHUB_TEST_RENDER_HOST", "render.internal");
        }
        let config = parse(
            r#"
            [renderer]
            base_url = "http://${UMLHUB_TEST_RENDER_HOST}:8080"

            [syntax_checker]
            base_url = "${UMLHUB_TEST_UNSET_CHECKER:-http://checker:8081}"
            "#,
        );
        unsafe {
            std::env::remove_var("UMLHUB_TEST_RENDER_HOST");
        }

        assert_eq!(config.renderer.base_url, "http://render.internal:8080");
        assert_eq!(config.syntax_checker.base_url, "http://checker:8081");
    }

    #[test]
    fn test_expand_env_vars_missing_required_var() {
        // SAFETY: test runs single-threaded per test function
        unsafe {
            std::env::remove_var("UMLHUB_TEST_MISSING_DB");
        }
        let result = Config::from_toml(
            "[store]\ndatabase_url = \"${UMLHUB_TEST_MISSING_DB}\"\n",
            Path::new("."),
        );

        let err = result.unwrap_err();
        assert!(matches!(err, ConfigError::EnvVar { .. }));
        assert!(err.to_string().contains("store.database_url"));
    }

    #[test]
    fn test_empty_token_means_none() {
        let mut config = valid_config();
        config.github.token = String::new();
        assert_eq!(config.github.token(), None);
    }

    #[test]
    fn test_apply_cli_settings() {
        let mut config = valid_config();
        config.apply_cli_settings(&CliSettings {
            host: Some("0.0.0.0".to_owned()),
            port: Some(9999),
            renderer_url: Some("http://other-render".to_owned()),
            syntax_checker_url: None,
            database_url: Some("sqlite::memory:".to_owned()),
            objects_dir: Some(PathBuf::from("/tmp/objects")),
        });

        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 9999);
        assert_eq!(config.renderer.base_url, "http://other-render");
        assert_eq!(config.syntax_checker.base_url, "http://checker:8081");
        assert_eq!(config.store.database_url.as_deref(), Some("sqlite::memory:"));
        assert_eq!(config.notifications.objects_dir, PathBuf::from("/tmp/objects"));
    }

    #[test]
    fn test_apply_cli_settings_empty() {
        let mut config = valid_config();
        config.apply_cli_settings(&CliSettings::default());

        assert_eq!(config.server.port, 8000);
        assert_eq!(config.renderer.base_url, "http://render:8080");
    }

    #[test]
    fn test_load_explicit_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("umlhub.toml");
        std::fs::write(
            &path,
            "[renderer]\nbase_url = \"http://r\"\n[syntax_checker]\nbase_url = \"http://c\"\n[notifications]\nobjects_dir = \"drop\"\n",
        )
        .unwrap();

        let config = Config::load(Some(&path), None).unwrap();

        assert_eq!(config.config_path.as_deref(), Some(path.as_path()));
        assert_eq!(config.renderer.base_url, "http://r");
        assert_eq!(config.notifications.objects_dir, dir.path().join("drop"));
    }

    #[test]
    fn test_load_missing_file() {
        let result = Config::load(Some(Path::new("/nonexistent/umlhub.toml")), None);
        assert!(matches!(result, Err(ConfigError::NotFound(_))));
    }

    #[test]
    fn test_load_validates_cli_overrides() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("umlhub.toml");
        std::fs::write(&path, "[renderer]\nbase_url = \"http://r\"\n[syntax_checker]\nbase_url = \"http://c\"\n").unwrap();

        let settings = CliSettings {
            renderer_url: Some("ftp://render".to_owned()),
            ..CliSettings::default()
        };
        let err = Config::load(Some(&path), Some(&settings)).unwrap_err();

        assert!(err.to_string().contains("renderer.base_url"));
    }

    #[test]
    fn test_validate_default_config_passes() {
        assert!(valid_config().validate().is_ok());
    }

    #[test]
    fn test_validate_server_port_zero() {
        let mut config = valid_config();
        config.server.port = 0;
        assert_validation_error(&config, &["server.port"]);
    }

    #[test]
    fn test_validate_server_host_empty() {
        let mut config = valid_config();
        config.server.host = String::new();
        assert_validation_error(&config, &["server.host", "empty"]);
    }

    #[test]
    fn test_validate_renderer_url_scheme() {
        let mut config = valid_config();
        config.renderer.base_url = "render:8080".to_owned();
        assert_validation_error(&config, &["renderer.base_url", "http://"]);
    }

    #[test]
    fn test_validate_syntax_checker_url_empty() {
        let mut config = valid_config();
        config.syntax_checker.base_url = String::new();
        assert_validation_error(&config, &["syntax_checker.base_url", "empty"]);
    }

    #[test]
    fn test_validate_timeout_zero() {
        let mut config = valid_config();
        config.renderer.timeout_secs = 0;
        assert_validation_error(&config, &["renderer.timeout_secs"]);
    }

    #[test]
    fn test_validate_database_url_scheme() {
        let mut config = valid_config();
        config.store.database_url = Some("postgres://db".to_owned());
        assert_validation_error(&config, &["store.database_url"]);
    }

    #[test]
    fn test_validate_min_block_length_zero() {
        let mut config = valid_config();
        config.indexer.min_block_length = 0;
        assert_validation_error(&config, &["indexer.min_block_length"]);
    }

    #[test]
    fn test_validate_page_size_bounds() {
        let mut config = valid_config();
        config.query.page_size = 0;
        assert_validation_error(&config, &["query.page_size"]);

        config.query.page_size = 101;
        assert_validation_error(&config, &["query.page_size", "100"]);
    }
}
