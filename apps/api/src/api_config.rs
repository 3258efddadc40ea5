use std::env;
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;

use corbel_application::ResolverConfig;
use corbel_core::AppError;
use tracing_subscriber::EnvFilter;

/// Where HTTP sessions are persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStoreConfig {
    Postgres,
    Redis,
}

/// Backend of the effective permission cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionCacheBackend {
    Postgres,
    Redis,
    InMemory,
}

impl PermissionCacheBackend {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Postgres => "postgres",
            Self::Redis => "redis",
            Self::InMemory => "in_memory",
        }
    }
}

#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub migrate_only: bool,
    pub database_url: String,
    pub frontend_url: String,
    pub bootstrap_token: String,
    pub api_host: String,
    pub api_port: u16,
    pub cookie_secure: bool,
    pub session_store: SessionStoreConfig,
    pub redis_url: Option<String>,
    pub permission_cache_backend: PermissionCacheBackend,
    pub resolver: ResolverConfig,
}

impl ApiConfig {
    pub fn load() -> Result<Self, AppError> {
        let migrate_only = env::args().nth(1).as_deref() == Some("migrate");

        let database_url = required_env("DATABASE_URL")?;
        let frontend_url =
            env::var("FRONTEND_URL").unwrap_or_else(|_| "http://localhost:3000".to_owned());
        let bootstrap_token = required_non_empty_env("AUTH_BOOTSTRAP_TOKEN")?;
        let session_secret = required_env("SESSION_SECRET")?;
        if session_secret.len() < 32 {
            return Err(AppError::Validation(
                "SESSION_SECRET must be at least 32 characters".to_owned(),
            ));
        }

        let api_host = env::var("API_HOST").unwrap_or_else(|_| "127.0.0.1".to_owned());
        let api_port = env::var("API_PORT")
            .ok()
            .and_then(|value| value.parse::<u16>().ok())
            .unwrap_or(3001);
        let cookie_secure = env::var("SESSION_COOKIE_SECURE")
            .unwrap_or_else(|_| "false".to_owned())
            .eq_ignore_ascii_case("true");

        let session_store = parse_session_store(
            env::var("SESSION_STORE").unwrap_or_else(|_| "postgres".to_owned()),
        )?;
        let redis_url = env::var("REDIS_URL")
            .ok()
            .filter(|value| !value.trim().is_empty());

        let permission_cache_backend = parse_cache_backend(
            env::var("PERMISSION_CACHE_BACKEND").unwrap_or_else(|_| "postgres".to_owned()),
        )?;
        let defaults = ResolverConfig::default();
        let ttl_seconds = match env::var("PERMISSION_CACHE_TTL_SECONDS") {
            Ok(value) => parse_ttl_seconds(value.as_str())?,
            Err(_) => defaults.ttl_seconds,
        };
        let eager_invalidation = env::var("PERMISSION_CACHE_EAGER_INVALIDATION")
            .map(|value| !value.eq_ignore_ascii_case("false"))
            .unwrap_or(defaults.eager_invalidation);

        let config = Self {
            migrate_only,
            database_url,
            frontend_url,
            bootstrap_token,
            api_host,
            api_port,
            cookie_secure,
            session_store,
            redis_url,
            permission_cache_backend,
            resolver: ResolverConfig {
                ttl_seconds,
                eager_invalidation,
            },
        };

        if config.requires_redis() && config.redis_url.is_none() {
            return Err(AppError::Validation(
                "REDIS_URL is required when SESSION_STORE or PERMISSION_CACHE_BACKEND is redis"
                    .to_owned(),
            ));
        }

        Ok(config)
    }

    pub fn requires_redis(&self) -> bool {
        self.session_store == SessionStoreConfig::Redis
            || self.permission_cache_backend == PermissionCacheBackend::Redis
    }

    pub fn socket_address(&self) -> Result<SocketAddr, AppError> {
        let host = IpAddr::from_str(&self.api_host).map_err(|error| {
            AppError::Internal(format!("invalid API_HOST '{}': {error}", self.api_host))
        })?;
        Ok(SocketAddr::from((host, self.api_port)))
    }
}

pub fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .compact()
        .init();
}

fn parse_session_store(value: String) -> Result<SessionStoreConfig, AppError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "postgres" => Ok(SessionStoreConfig::Postgres),
        "redis" => Ok(SessionStoreConfig::Redis),
        other => Err(AppError::Validation(format!(
            "SESSION_STORE must be either 'postgres' or 'redis', got '{other}'"
        ))),
    }
}

fn parse_cache_backend(value: String) -> Result<PermissionCacheBackend, AppError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "postgres" => Ok(PermissionCacheBackend::Postgres),
        "redis" => Ok(PermissionCacheBackend::Redis),
        "in_memory" => Ok(PermissionCacheBackend::InMemory),
        other => Err(AppError::Validation(format!(
            "PERMISSION_CACHE_BACKEND must be one of 'postgres', 'redis' or 'in_memory', got '{other}'"
        ))),
    }
}

fn parse_ttl_seconds(value: &str) -> Result<u32, AppError> {
    value
        .trim()
        .parse::<u32>()
        .ok()
        .filter(|seconds| *seconds > 0)
        .ok_or_else(|| {
            AppError::Validation(format!(
                "PERMISSION_CACHE_TTL_SECONDS must be a positive integer, got '{value}'"
            ))
        })
}

fn required_env(name: &str) -> Result<String, AppError> {
    env::var(name).map_err(|_| AppError::Validation(format!("{name} is required")))
}

fn required_non_empty_env(name: &str) -> Result<String, AppError> {
    let value = required_env(name)?;
    if value.trim().is_empty() {
        return Err(AppError::Validation(format!("{name} must not be empty")));
    }

    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::{
        PermissionCacheBackend, SessionStoreConfig, parse_cache_backend, parse_session_store,
        parse_ttl_seconds,
    };

    #[test]
    fn cache_backends_parse_case_insensitively() {
        assert!(matches!(
            parse_cache_backend("In_Memory".to_owned()),
            Ok(PermissionCacheBackend::InMemory)
        ));
        assert!(matches!(
            parse_cache_backend("redis".to_owned()),
            Ok(PermissionCacheBackend::Redis)
        ));
        assert!(parse_cache_backend("memcached".to_owned()).is_err());
    }

    #[test]
    fn session_store_rejects_unknown_values() {
        assert!(matches!(
            parse_session_store(" postgres ".to_owned()),
            Ok(SessionStoreConfig::Postgres)
        ));
        assert!(parse_session_store("cookie".to_owned()).is_err());
    }

    #[test]
    fn ttl_must_be_positive() {
        assert_eq!(parse_ttl_seconds("900").unwrap_or_default(), 900);
        assert!(parse_ttl_seconds("0").is_err());
        assert!(parse_ttl_seconds("-5").is_err());
    }
}
