use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::catalog::{DEFAULT_CATEGORY_LIMIT, DEFAULT_PAGE_SIZE, DEFAULT_SEARCH_LIMIT, MAX_PAGE_SIZE};
use crate::interactions::DetectionMode;
use crate::substitutes::{ScorePolicy, DEFAULT_CANDIDATE_LIMIT};

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub server: ServerConfig,
    pub catalog: CatalogConfig,
    pub interactions: InteractionsConfig,
    pub scoring: ScoringConfig,
    pub admin: AdminConfig,
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub timeout_secs: u64,
}

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub bind_address: String,
    pub port: u16,
    pub graceful_shutdown_secs: u64,
    pub cors_origin: String,
}

#[derive(Clone, Debug)]
pub struct CatalogConfig {
    pub substitute_limit: usize,
    pub default_page_size: u32,
    pub max_page_size: u32,
    pub search_limit: usize,
    pub category_limit: usize,
}

#[derive(Clone, Debug)]
pub struct InteractionsConfig {
    pub bidirectional: bool,
}

impl InteractionsConfig {
    pub fn mode(&self) -> DetectionMode {
        DetectionMode::from_bidirectional(self.bidirectional)
    }
}

#[derive(Clone, Debug)]
pub struct ScoringConfig {
    pub clamp_similarity: bool,
}

impl ScoringConfig {
    pub fn policy(&self) -> ScorePolicy {
        ScorePolicy::from_clamp(self.clamp_similarity)
    }
}

/// Catalog write access. Writes are refused while no token is configured.
#[derive(Clone, Debug, Default)]
pub struct AdminConfig {
    pub api_token: Option<SecretString>,
}

impl AdminConfig {
    pub fn authorizes(&self, presented: &str) -> bool {
        self.api_token.as_ref().is_some_and(|token| token.expose_secret() == presented)
    }
}

#[derive(Clone, Debug)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub database_url: Option<String>,
    pub log_level: Option<String>,
    pub log_format: Option<LogFormat>,
    pub bind_address: Option<String>,
    pub port: Option<u16>,
    pub admin_api_token: Option<String>,
    pub bidirectional_interactions: Option<bool>,
    pub clamp_similarity: Option<bool>,
}

#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub config_path: Option<PathBuf>,
    pub require_file: bool,
    pub overrides: ConfigOverrides,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse config file `{path}`: {source}")]
    ParseFile { path: PathBuf, source: toml::de::Error },
    #[error("required config file was not found: `{0}`")]
    MissingConfigFile(PathBuf),
    #[error("environment variable interpolation failed for `{var}`")]
    MissingEnvInterpolation { var: String },
    #[error("unterminated environment interpolation expression")]
    UnterminatedInterpolation,
    #[error("invalid environment override for `{key}`: `{value}`")]
    InvalidEnvOverride { key: String, value: String },
    #[error("configuration validation failed: {0}")]
    Validation(String),
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database: DatabaseConfig {
                url: "sqlite://medicord.db".to_string(),
                max_connections: 5,
                timeout_secs: 30,
            },
            server: ServerConfig {
                bind_address: "127.0.0.1".to_string(),
                port: 5000,
                graceful_shutdown_secs: 15,
                cors_origin: "http://localhost:3000".to_string(),
            },
            catalog: CatalogConfig {
                substitute_limit: DEFAULT_CANDIDATE_LIMIT,
                default_page_size: DEFAULT_PAGE_SIZE,
                max_page_size: MAX_PAGE_SIZE,
                search_limit: DEFAULT_SEARCH_LIMIT,
                category_limit: DEFAULT_CATEGORY_LIMIT,
            },
            interactions: InteractionsConfig { bidirectional: true },
            scoring: ScoringConfig { clamp_similarity: true },
            admin: AdminConfig::default(),
            logging: LoggingConfig { level: "info".to_string(), format: LogFormat::Compact },
        }
    }
}

fn secret_value(value: String) -> SecretString {
    value.into()
}

impl std::str::FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::Validation(format!(
                "unsupported log format `{other}` (expected compact|pretty|json)"
            ))),
        }
    }
}

impl AppConfig {
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let maybe_path = resolve_config_path(options.config_path.as_deref());

        if let Some(path) = maybe_path {
            let patch = read_patch(&path)?;
            config.apply_patch(patch);
        } else if options.require_file {
            let expected = options.config_path.unwrap_or_else(|| PathBuf::from("medicord.toml"));
            return Err(ConfigError::MissingConfigFile(expected));
        }

        config.apply_env_overrides()?;
        config.apply_overrides(options.overrides);
        config.validate()?;

        Ok(config)
    }

    /// `bind_address:port` for the HTTP listener.
    pub fn listen_address(&self) -> String {
        format!("{}:{}", self.server.bind_address, self.server.port)
    }

    fn apply_patch(&mut self, patch: ConfigPatch) {
        if let Some(database) = patch.database {
            if let Some(url) = database.url {
                self.database.url = url;
            }
            if let Some(max_connections) = database.max_connections {
                self.database.max_connections = max_connections;
            }
            if let Some(timeout_secs) = database.timeout_secs {
                self.database.timeout_secs = timeout_secs;
            }
        }

        if let Some(server) = patch.server {
            if let Some(bind_address) = server.bind_address {
                self.server.bind_address = bind_address;
            }
            if let Some(port) = server.port {
                self.server.port = port;
            }
            if let Some(graceful_shutdown_secs) = server.graceful_shutdown_secs {
                self.server.graceful_shutdown_secs = graceful_shutdown_secs;
            }
            if let Some(cors_origin) = server.cors_origin {
                self.server.cors_origin = cors_origin;
            }
        }

        if let Some(catalog) = patch.catalog {
            if let Some(substitute_limit) = catalog.substitute_limit {
                self.catalog.substitute_limit = substitute_limit;
            }
            if let Some(default_page_size) = catalog.default_page_size {
                self.catalog.default_page_size = default_page_size;
            }
            if let Some(max_page_size) = catalog.max_page_size {
                self.catalog.max_page_size = max_page_size;
            }
            if let Some(search_limit) = catalog.search_limit {
                self.catalog.search_limit = search_limit;
            }
            if let Some(category_limit) = catalog.category_limit {
                self.catalog.category_limit = category_limit;
            }
        }

        if let Some(bidirectional) = patch.interactions.and_then(|section| section.bidirectional) {
            self.interactions.bidirectional = bidirectional;
        }

        if let Some(clamp) = patch.scoring.and_then(|section| section.clamp_similarity) {
            self.scoring.clamp_similarity = clamp;
        }

        if let Some(token) = patch.admin.and_then(|section| section.api_token) {
            self.admin.api_token = Some(secret_value(token));
        }

        if let Some(logging) = patch.logging {
            if let Some(level) = logging.level {
                self.logging.level = level;
            }
            if let Some(format) = logging.format {
                self.logging.format = format;
            }
        }
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Some(value) = read_env("MEDICORD_DATABASE_URL") {
            self.database.url = value;
        }
        if let Some(value) = read_env("MEDICORD_DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections =
                parse_env("MEDICORD_DATABASE_MAX_CONNECTIONS", &value)?;
        }
        if let Some(value) = read_env("MEDICORD_DATABASE_TIMEOUT_SECS") {
            self.database.timeout_secs = parse_env("MEDICORD_DATABASE_TIMEOUT_SECS", &value)?;
        }

        if let Some(value) = read_env("MEDICORD_SERVER_BIND_ADDRESS") {
            self.server.bind_address = value;
        }
        if let Some(value) = read_env("MEDICORD_SERVER_PORT") {
            self.server.port = parse_env("MEDICORD_SERVER_PORT", &value)?;
        }
        if let Some(value) = read_env("MEDICORD_SERVER_GRACEFUL_SHUTDOWN_SECS") {
            self.server.graceful_shutdown_secs =
                parse_env("MEDICORD_SERVER_GRACEFUL_SHUTDOWN_SECS", &value)?;
        }
        if let Some(value) = read_env("MEDICORD_SERVER_CORS_ORIGIN") {
            self.server.cors_origin = value;
        }

        if let Some(value) = read_env("MEDICORD_CATALOG_SUBSTITUTE_LIMIT") {
            self.catalog.substitute_limit = parse_env("MEDICORD_CATALOG_SUBSTITUTE_LIMIT", &value)?;
        }
        if let Some(value) = read_env("MEDICORD_CATALOG_DEFAULT_PAGE_SIZE") {
            self.catalog.default_page_size =
                parse_env("MEDICORD_CATALOG_DEFAULT_PAGE_SIZE", &value)?;
        }
        if let Some(value) = read_env("MEDICORD_CATALOG_MAX_PAGE_SIZE") {
            self.catalog.max_page_size = parse_env("MEDICORD_CATALOG_MAX_PAGE_SIZE", &value)?;
        }
        if let Some(value) = read_env("MEDICORD_CATALOG_SEARCH_LIMIT") {
            self.catalog.search_limit = parse_env("MEDICORD_CATALOG_SEARCH_LIMIT", &value)?;
        }
        if let Some(value) = read_env("MEDICORD_CATALOG_CATEGORY_LIMIT") {
            self.catalog.category_limit = parse_env("MEDICORD_CATALOG_CATEGORY_LIMIT", &value)?;
        }

        if let Some(value) = read_env("MEDICORD_INTERACTIONS_BIDIRECTIONAL") {
            self.interactions.bidirectional =
                parse_env("MEDICORD_INTERACTIONS_BIDIRECTIONAL", &value)?;
        }
        if let Some(value) = read_env("MEDICORD_SCORING_CLAMP_SIMILARITY") {
            self.scoring.clamp_similarity = parse_env("MEDICORD_SCORING_CLAMP_SIMILARITY", &value)?;
        }

        if let Some(value) = read_env("MEDICORD_ADMIN_API_TOKEN") {
            self.admin.api_token = Some(secret_value(value));
        }

        let log_level =
            read_env("MEDICORD_LOGGING_LEVEL").or_else(|| read_env("MEDICORD_LOG_LEVEL"));
        if let Some(value) = log_level {
            self.logging.level = value;
        }
        let log_format =
            read_env("MEDICORD_LOGGING_FORMAT").or_else(|| read_env("MEDICORD_LOG_FORMAT"));
        if let Some(value) = log_format {
            self.logging.format = value.parse()?;
        }

        Ok(())
    }

    fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(database_url) = overrides.database_url {
            self.database.url = database_url;
        }
        if let Some(log_level) = overrides.log_level {
            self.logging.level = log_level;
        }
        if let Some(log_format) = overrides.log_format {
            self.logging.format = log_format;
        }
        if let Some(bind_address) = overrides.bind_address {
            self.server.bind_address = bind_address;
        }
        if let Some(port) = overrides.port {
            self.server.port = port;
        }
        if let Some(admin_api_token) = overrides.admin_api_token {
            self.admin.api_token = Some(secret_value(admin_api_token));
        }
        if let Some(bidirectional) = overrides.bidirectional_interactions {
            self.interactions.bidirectional = bidirectional;
        }
        if let Some(clamp) = overrides.clamp_similarity {
            self.scoring.clamp_similarity = clamp;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_database(&self.database)?;
        validate_server(&self.server)?;
        validate_catalog(&self.catalog)?;
        validate_admin(&self.admin)?;
        validate_logging(&self.logging)?;
        Ok(())
    }
}

fn resolve_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return path.exists().then_some(path.to_path_buf());
    }

    [PathBuf::from("medicord.toml"), PathBuf::from("config/medicord.toml")]
        .into_iter()
        .find(|path| path.exists())
}

fn read_patch(path: &Path) -> Result<ConfigPatch, ConfigError> {
    let raw = fs::read_to_string(path)
        .map_err(|source| ConfigError::ReadFile { path: path.to_path_buf(), source })?;

    let interpolated = interpolate_env_vars(&raw)?;
    toml::from_str::<ConfigPatch>(&interpolated)
        .map_err(|source| ConfigError::ParseFile { path: path.to_path_buf(), source })
}

fn interpolate_env_vars(input: &str) -> Result<String, ConfigError> {
    let mut output = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '$' && matches!(chars.peek(), Some('{')) {
            chars.next();
            let mut key = String::new();

            loop {
                match chars.next() {
                    Some('}') => break,
                    Some(next) => key.push(next),
                    None => return Err(ConfigError::UnterminatedInterpolation),
                }
            }

            let value = env::var(&key)
                .map_err(|_| ConfigError::MissingEnvInterpolation { var: key.clone() })?;
            output.push_str(&value);
            continue;
        }

        output.push(ch);
    }

    Ok(output)
}

fn validate_database(database: &DatabaseConfig) -> Result<(), ConfigError> {
    let url = database.url.trim();
    let sqlite_url =
        url.starts_with("sqlite://") || url.starts_with("sqlite::") || url == ":memory:";
    if !sqlite_url {
        return Err(ConfigError::Validation(
            "database.url must be a sqlite URL (`sqlite://...`, `sqlite::...`, or `:memory:`)"
                .to_string(),
        ));
    }

    if database.max_connections == 0 {
        return Err(ConfigError::Validation(
            "database.max_connections must be greater than zero".to_string(),
        ));
    }

    if database.timeout_secs == 0 || database.timeout_secs > 300 {
        return Err(ConfigError::Validation(
            "database.timeout_secs must be in range 1..=300".to_string(),
        ));
    }

    Ok(())
}

fn validate_server(server: &ServerConfig) -> Result<(), ConfigError> {
    if server.bind_address.trim().is_empty() {
        return Err(ConfigError::Validation("server.bind_address must not be empty".to_string()));
    }

    if server.port == 0 {
        return Err(ConfigError::Validation("server.port must be greater than zero".to_string()));
    }

    if server.graceful_shutdown_secs == 0 {
        return Err(ConfigError::Validation(
            "server.graceful_shutdown_secs must be greater than zero".to_string(),
        ));
    }

    let origin = server.cors_origin.trim();
    if origin != "*" && !origin.starts_with("http://") && !origin.starts_with("https://") {
        return Err(ConfigError::Validation(
            "server.cors_origin must be `*` or start with http:// or https://".to_string(),
        ));
    }

    Ok(())
}

fn validate_catalog(catalog: &CatalogConfig) -> Result<(), ConfigError> {
    let limits = [
        ("catalog.substitute_limit", catalog.substitute_limit),
        ("catalog.search_limit", catalog.search_limit),
        ("catalog.category_limit", catalog.category_limit),
        ("catalog.default_page_size", catalog.default_page_size as usize),
        ("catalog.max_page_size", catalog.max_page_size as usize),
    ];
    if let Some((key, _)) = limits.iter().find(|(_, value)| *value == 0) {
        return Err(ConfigError::Validation(format!("{key} must be greater than zero")));
    }

    if catalog.default_page_size > catalog.max_page_size {
        return Err(ConfigError::Validation(
            "catalog.default_page_size must not exceed catalog.max_page_size".to_string(),
        ));
    }

    Ok(())
}

fn validate_admin(admin: &AdminConfig) -> Result<(), ConfigError> {
    let blank = admin.api_token.as_ref().is_some_and(|token| token.expose_secret().trim().is_empty());
    if blank {
        return Err(ConfigError::Validation(
            "admin.api_token must not be blank; omit it to disable catalog writes".to_string(),
        ));
    }

    Ok(())
}

fn validate_logging(logging: &LoggingConfig) -> Result<(), ConfigError> {
    let level = logging.level.trim().to_ascii_lowercase();
    match level.as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
        _ => Err(ConfigError::Validation(
            "logging.level must be one of trace|debug|info|warn|error".to_string(),
        )),
    }
}

fn read_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parse_env<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse::<T>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    database: Option<DatabasePatch>,
    server: Option<ServerPatch>,
    catalog: Option<CatalogPatch>,
    interactions: Option<InteractionsPatch>,
    scoring: Option<ScoringPatch>,
    admin: Option<AdminPatch>,
    logging: Option<LoggingPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct DatabasePatch {
    url: Option<String>,
    max_connections: Option<u32>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct ServerPatch {
    bind_address: Option<String>,
    port: Option<u16>,
    graceful_shutdown_secs: Option<u64>,
    cors_origin: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct CatalogPatch {
    substitute_limit: Option<usize>,
    default_page_size: Option<u32>,
    max_page_size: Option<u32>,
    search_limit: Option<usize>,
    category_limit: Option<usize>,
}

#[derive(Debug, Default, Deserialize)]
struct InteractionsPatch {
    bidirectional: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
struct ScoringPatch {
    clamp_similarity: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
struct AdminPatch {
    api_token: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<LogFormat>,
}
