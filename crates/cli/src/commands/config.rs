use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use medicord_core::config::{AppConfig, LoadOptions};
use secrecy::ExposeSecret;
use toml::Value;

/// One reported setting: dotted key, rendered value and the env vars that
/// can set it.
struct Field {
    key: &'static str,
    value: String,
    env_keys: &'static [&'static str],
}

fn field(key: &'static str, value: impl ToString, env_keys: &'static [&'static str]) -> Field {
    Field { key, value: value.to_string(), env_keys }
}

pub fn run() -> String {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => return format!("config validation failed: {error}"),
    };

    let config_file_path = detect_config_path();
    let config_file_doc = load_config_file_doc(config_file_path.as_deref());

    let mut lines = vec!["effective config (source precedence: env > file > default):".to_string()];
    for field in fields(&config) {
        let source = field_source(
            field.key,
            field.env_keys,
            config_file_doc.as_ref(),
            config_file_path.as_deref(),
        );
        lines.push(render_line(field.key, &field.value, source));
    }

    lines.join("\n")
}

fn fields(config: &AppConfig) -> Vec<Field> {
    let admin_token = config
        .admin
        .api_token
        .as_ref()
        .map(|token| redact_token(token.expose_secret()))
        .unwrap_or_else(|| "<unset>".to_string());

    vec![
        field("database.url", &config.database.url, &["MEDICORD_DATABASE_URL"]),
        field(
            "database.max_connections",
            config.database.max_connections,
            &["MEDICORD_DATABASE_MAX_CONNECTIONS"],
        ),
        field(
            "database.timeout_secs",
            config.database.timeout_secs,
            &["MEDICORD_DATABASE_TIMEOUT_SECS"],
        ),
        field("server.bind_address", &config.server.bind_address, &["MEDICORD_SERVER_BIND_ADDRESS"]),
        field("server.port", config.server.port, &["MEDICORD_SERVER_PORT"]),
        field(
            "server.graceful_shutdown_secs",
            config.server.graceful_shutdown_secs,
            &["MEDICORD_SERVER_GRACEFUL_SHUTDOWN_SECS"],
        ),
        field("server.cors_origin", &config.server.cors_origin, &["MEDICORD_SERVER_CORS_ORIGIN"]),
        field(
            "catalog.substitute_limit",
            config.catalog.substitute_limit,
            &["MEDICORD_CATALOG_SUBSTITUTE_LIMIT"],
        ),
        field(
            "catalog.default_page_size",
            config.catalog.default_page_size,
            &["MEDICORD_CATALOG_DEFAULT_PAGE_SIZE"],
        ),
        field(
            "catalog.max_page_size",
            config.catalog.max_page_size,
            &["MEDICORD_CATALOG_MAX_PAGE_SIZE"],
        ),
        field(
            "catalog.search_limit",
            config.catalog.search_limit,
            &["MEDICORD_CATALOG_SEARCH_LIMIT"],
        ),
        field(
            "catalog.category_limit",
            config.catalog.category_limit,
            &["MEDICORD_CATALOG_CATEGORY_LIMIT"],
        ),
        field(
            "interactions.bidirectional",
            config.interactions.bidirectional,
            &["MEDICORD_INTERACTIONS_BIDIRECTIONAL"],
        ),
        field(
            "scoring.clamp_similarity",
            config.scoring.clamp_similarity,
            &["MEDICORD_SCORING_CLAMP_SIMILARITY"],
        ),
        field("admin.api_token", admin_token, &["MEDICORD_ADMIN_API_TOKEN"]),
        field(
            "logging.level",
            &config.logging.level,
            &["MEDICORD_LOGGING_LEVEL", "MEDICORD_LOG_LEVEL"],
        ),
        field(
            "logging.format",
            format!("{:?}", config.logging.format),
            &["MEDICORD_LOGGING_FORMAT", "MEDICORD_LOG_FORMAT"],
        ),
    ]
}

fn detect_config_path() -> Option<PathBuf> {
    [PathBuf::from("medicord.toml"), PathBuf::from("config/medicord.toml")]
        .into_iter()
        .find(|path| path.exists())
}

fn load_config_file_doc(path: Option<&Path>) -> Option<Value> {
    let path = path?;
    let raw = fs::read_to_string(path).ok()?;
    raw.parse::<Value>().ok()
}

fn field_source(
    key_path: &str,
    env_keys: &[&str],
    config_file_doc: Option<&Value>,
    config_file_path: Option<&Path>,
) -> String {
    if let Some(env_key) = env_keys.iter().find(|key| env::var_os(key).is_some()) {
        return format!("env ({env_key})");
    }

    if let Some(doc) = config_file_doc {
        if contains_path(doc, key_path) {
            let file_path = config_file_path
                .map(|path| path.display().to_string())
                .unwrap_or_else(|| "config file".to_string());
            return format!("file ({file_path})");
        }
    }

    "default".to_string()
}

fn contains_path(root: &Value, key_path: &str) -> bool {
    let mut current = root;
    for key in key_path.split('.') {
        let Some(next) = current.get(key) else {
            return false;
        };
        current = next;
    }
    true
}

fn render_line(key: &str, value: &str, source: String) -> String {
    format!("- {key} = {value} (source: {source})")
}

/// Keeps at most the first four characters of a token.
fn redact_token(token: &str) -> String {
    let trimmed = token.trim();
    if trimmed.is_empty() {
        return "<empty>".to_string();
    }
    if trimmed.chars().count() <= 8 {
        return "<redacted>".to_string();
    }

    let prefix: String = trimmed.chars().take(4).collect();
    format!("{prefix}***")
}

#[cfg(test)]
mod tests {
    use medicord_core::config::AppConfig;
    use secrecy::SecretString;

    use super::{contains_path, fields, redact_token};

    #[test]
    fn tokens_are_never_rendered_in_full() {
        assert_eq!(redact_token("  "), "<empty>");
        assert_eq!(redact_token("short"), "<redacted>");
        assert_eq!(redact_token("mdc-admin-0123456789"), "mdc-***");
    }

    #[test]
    fn admin_token_field_is_redacted() {
        let mut config = AppConfig::default();
        config.admin.api_token = Some(SecretString::from("super-secret-admin-token".to_string()));

        let rendered = fields(&config)
            .into_iter()
            .find(|field| field.key == "admin.api_token")
            .map(|field| field.value)
            .unwrap_or_default();

        assert_eq!(rendered, "supe***");
    }

    #[test]
    fn every_config_section_is_reported() {
        let keys: Vec<&str> = fields(&AppConfig::default()).iter().map(|field| field.key).collect();

        for section in ["database.", "server.", "catalog.", "interactions.", "scoring.", "admin.", "logging."] {
            assert!(keys.iter().any(|key| key.starts_with(section)), "missing section {section}");
        }
    }

    #[test]
    fn dotted_paths_resolve_in_toml_documents() {
        let doc: toml::Value = "[scoring]\nclamp_similarity = false\n".parse().expect("toml");

        assert!(contains_path(&doc, "scoring.clamp_similarity"));
        assert!(!contains_path(&doc, "scoring.weights"));
    }
}
