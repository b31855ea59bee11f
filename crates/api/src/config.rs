use std::net::IpAddr;
use std::path::PathBuf;

use crate::auth::jwt::JwtConfig;

/// Server configuration loaded from environment variables.
///
/// All fields have defaults suitable for local development.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// JWT token configuration.
    pub jwt: JwtConfig,
    /// Wiki behaviour settings.
    pub wiki: WikiConfig,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                | Default                    |
    /// |------------------------|----------------------------|
    /// | `HOST`                 | `0.0.0.0`                  |
    /// | `PORT`                 | `3000`                     |
    /// | `CORS_ORIGINS`         | `http://localhost:5173`    |
    /// | `REQUEST_TIMEOUT_SECS` | `30`                       |
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());

        let port: u16 = std::env::var("PORT")
            .unwrap_or_else(|_| "3000".into())
            .parse()
            .expect("PORT must be a valid u16");

        let cors_origins: Vec<String> = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:5173".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let request_timeout_secs: u64 = std::env::var("REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("REQUEST_TIMEOUT_SECS must be a valid u64");

        Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            jwt: JwtConfig::from_env(),
            wiki: WikiConfig::from_env(),
        }
    }
}

/// Wiki-specific settings.
#[derive(Debug, Clone)]
pub struct WikiConfig {
    /// Whether visitors without an account may edit pages and upload images.
    pub allow_anonymous_edits: bool,
    /// Whether URL titles use `_` in place of whitespace.
    pub spaces_as_underscores: bool,
    /// Directory image revisions are stored in.
    pub images_path: PathBuf,
    /// Requests from this address may read without logging in.
    pub trusted_ip: IpAddr,
    /// Title of the page the site root redirects to.
    pub main_page: String,
}

impl Default for WikiConfig {
    fn default() -> Self {
        Self {
            allow_anonymous_edits: true,
            spaces_as_underscores: true,
            images_path: PathBuf::from("./data/images"),
            trusted_ip: IpAddr::from([127, 0, 0, 1]),
            main_page: "Main Page".to_string(),
        }
    }
}

impl WikiConfig {
    /// Load wiki settings from environment variables.
    ///
    /// | Env Var                      | Default          |
    /// |------------------------------|------------------|
    /// | `WIKI_ALLOW_ANONYMOUS_EDITS` | `true`           |
    /// | `WIKI_SPACES_AS_UNDERSCORES` | `true`           |
    /// | `WIKI_IMAGES_PATH`           | `./data/images`  |
    /// | `WIKI_TRUSTED_IP`            | `127.0.0.1`      |
    /// | `WIKI_MAIN_PAGE`             | `Main Page`      |
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let allow_anonymous_edits = env_bool(
            "WIKI_ALLOW_ANONYMOUS_EDITS",
            defaults.allow_anonymous_edits,
        );
        let spaces_as_underscores = env_bool(
            "WIKI_SPACES_AS_UNDERSCORES",
            defaults.spaces_as_underscores,
        );

        let images_path = std::env::var("WIKI_IMAGES_PATH")
            .map(PathBuf::from)
            .unwrap_or(defaults.images_path);

        let trusted_ip = match std::env::var("WIKI_TRUSTED_IP") {
            Ok(raw) => raw
                .parse()
                .expect("WIKI_TRUSTED_IP must be a valid IP address"),
            Err(_) => defaults.trusted_ip,
        };

        let main_page = std::env::var("WIKI_MAIN_PAGE").unwrap_or(defaults.main_page);

        Self {
            allow_anonymous_edits,
            spaces_as_underscores,
            images_path,
            trusted_ip,
            main_page,
        }
    }
}

fn env_bool(key: &str, default: bool) -> bool {
    match std::env::var(key) {
        Ok(raw) => match raw.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => true,
            "0" | "false" | "no" | "off" => false,
            _ => panic!("{key} must be a boolean"),
        },
        Err(_) => default,
    }
}
