use std::env;
use std::str::FromStr;

use marquee_core::store::github::GitHubConfig;
use marquee_core::DocumentPaths;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),
    #[error("{name}={value:?} is invalid: {reason}")]
    Invalid {
        name: &'static str,
        value: String,
        reason: String,
    },
}

/// Signing secret used only while no editor passphrase is configured.
const DEV_JWT_SECRET: &str = "dev-secret-change-me-in-production";

/// Where the two JSON documents are kept.
#[derive(Debug, Clone)]
pub enum SyncBackend {
    GitHub(GitHubConfig),
    /// Process-local store; contents vanish on restart.
    Memory,
}

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Server host to bind to.
    pub host: String,
    /// Server port to bind to.
    pub port: u16,
    /// Log level (e.g., "info", "debug", "trace").
    pub log_level: String,
    pub sync_backend: SyncBackend,
    /// Store paths of the movies and site documents.
    pub paths: DocumentPaths,
    /// PostgreSQL connection URL for the relational catalog. Optional.
    pub database_url: Option<String>,
    pub db_max_connections: u32,
    pub db_min_connections: u32,
    /// Secret used to sign edit tokens.
    pub jwt_secret: String,
    /// Argon2 PHC hash of the editor passphrase. Unset leaves writes open.
    pub editor_password_hash: Option<String>,
    pub edit_token_ttl_secs: u64,
    /// Upper bound on request bodies, in bytes.
    pub max_body_bytes: usize,
}

impl AppConfig {
    /// Load configuration from environment variables with sensible defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok().filter(|v| !v.is_empty()))
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let var = |name: &str, default: &str| lookup(name).unwrap_or_else(|| default.to_string());
        let required = |name: &'static str| lookup(name).ok_or(ConfigError::Missing(name));

        let backend = var("SYNC_BACKEND", "github");
        let sync_backend = match backend.as_str() {
            "github" => SyncBackend::GitHub(GitHubConfig {
                api_url: var("GH_API_URL", "https://api.github.com"),
                token: required("GH_TOKEN")?,
                owner: required("GH_OWNER")?,
                repo: required("GH_REPO")?,
                branch: var("GH_BRANCH", "main"),
            }),
            "memory" => SyncBackend::Memory,
            _ => {
                return Err(ConfigError::Invalid {
                    name: "SYNC_BACKEND",
                    value: backend,
                    reason: "expected \"github\" or \"memory\"".into(),
                })
            }
        };

        // The dev fallback applies only while the gate is open.
        let editor_password_hash = lookup("EDITOR_PASSWORD_HASH");
        let jwt_secret = match (lookup("JWT_SECRET"), &editor_password_hash) {
            (Some(secret), _) => secret,
            (None, Some(_)) => return Err(ConfigError::Missing("JWT_SECRET")),
            (None, None) => DEV_JWT_SECRET.to_string(),
        };

        Ok(Self {
            host: var("HOST", "0.0.0.0"),
            port: parse(&lookup, "PORT", 3030)?,
            log_level: var("LOG_LEVEL", "info"),
            sync_backend,
            paths: DocumentPaths {
                movies: var("GH_MOVIES_PATH", "data/movies.json"),
                site: var("GH_SITE_PATH", "data/site.json"),
            },
            database_url: lookup("DATABASE_URL"),
            db_max_connections: parse(&lookup, "DB_MAX_CONNECTIONS", 20)?,
            db_min_connections: parse(&lookup, "DB_MIN_CONNECTIONS", 1)?,
            jwt_secret,
            editor_password_hash,
            edit_token_ttl_secs: parse(&lookup, "EDIT_TOKEN_TTL_SECS", 3600)?,
            max_body_bytes: parse(&lookup, "MAX_BODY_BYTES", 2 * 1024 * 1024)?,
        })
    }

    /// Build the socket address string.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse<T>(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &'static str,
    default: T,
) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(name) {
        None => Ok(default),
        Some(value) => value.parse().map_err(|e: T::Err| ConfigError::Invalid {
            name,
            reason: e.to_string(),
            value,
        }),
    }
}
