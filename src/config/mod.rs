use anyhow::{anyhow, Result};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use std::net::SocketAddr;
use std::str::FromStr;

use crate::app::auth::MAX_TOKEN_TTL_HOURS;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub http_addr: String,
    pub database_url: String,
    pub db_max_connections: u32,
    pub db_connect_timeout_seconds: u64,
    pub db_idle_timeout_seconds: u64,
    pub db_max_lifetime_seconds: u64,
    pub run_migrations: bool,
    pub redis_url: Option<String>,
    pub photo_cache_ttl_seconds: u64,
    pub unsplash_api_url: String,
    pub unsplash_access_key: String,
    pub upstream_timeout_seconds: u64,
    pub mirror_upstream_likes: bool,
    pub paseto_access_key: [u8; 32],
    pub auth_token_ttl_hours: u64,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        let http_addr = env_or("HTTP_ADDR", "0.0.0.0:8080");
        let _parsed_http_addr = SocketAddr::from_str(&http_addr)
            .map_err(|err| anyhow!("invalid HTTP_ADDR: {}", err))?;

        Ok(Self {
            http_addr,
            database_url: env_or_err("DATABASE_URL")?,
            db_max_connections: env_or_parse("DB_MAX_CONNECTIONS", "25")?,
            db_connect_timeout_seconds: env_or_parse("DB_CONNECT_TIMEOUT_SECONDS", "5")?,
            db_idle_timeout_seconds: env_or_parse("DB_IDLE_TIMEOUT_SECONDS", "300")?,
            db_max_lifetime_seconds: env_or_parse("DB_MAX_LIFETIME_SECONDS", "1800")?,
            run_migrations: env_or_parse("RUN_MIGRATIONS", "true")?,
            redis_url: std::env::var("REDIS_URL").ok().filter(|url| !url.is_empty()),
            photo_cache_ttl_seconds: env_or_parse("PHOTO_CACHE_TTL_SECONDS", "300")?,
            unsplash_api_url: env_or("UNSPLASH_API_URL", "https://api.unsplash.com"),
            unsplash_access_key: env_or_err("UNSPLASH_ACCESS_KEY")?,
            upstream_timeout_seconds: env_or_parse("UPSTREAM_TIMEOUT_SECONDS", "10")?,
            mirror_upstream_likes: env_or_parse("MIRROR_UPSTREAM_LIKES", "true")?,
            paseto_access_key: env_key_32("PASETO_ACCESS_KEY")?,
            auth_token_ttl_hours: env_in_range("AUTH_TOKEN_TTL_HOURS", "168", 1, MAX_TOKEN_TTL_HOURS)?,
        })
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_or_err(key: &str) -> Result<String> {
    std::env::var(key).map_err(|_| anyhow!("missing required env var: {}", key))
}

fn env_or_parse<T>(key: &str, default: &str) -> Result<T>
where
    T: FromStr,
    <T as FromStr>::Err: std::fmt::Display,
{
    let value = std::env::var(key).unwrap_or_else(|_| default.to_string());
    value
        .parse::<T>()
        .map_err(|err| anyhow!("invalid {}: {}", key, err))
}

fn env_in_range(key: &str, default: &str, min: u64, max: u64) -> Result<u64> {
    let value: u64 = env_or_parse(key, default)?;
    check_range(key, value, min, max)
}

fn check_range(key: &str, value: u64, min: u64, max: u64) -> Result<u64> {
    if (min..=max).contains(&value) {
        Ok(value)
    } else {
        Err(anyhow!("invalid {}: must be between {} and {}", key, min, max))
    }
}

fn env_key_32(key: &str) -> Result<[u8; 32]> {
    let value = env_or_err(key)?;
    let decoded = STANDARD
        .decode(value.as_bytes())
        .map_err(|err| anyhow!("invalid {}: {}", key, err))?;
    if decoded.len() != 32 {
        return Err(anyhow!("invalid {}: expected 32 bytes", key));
    }
    let mut key_bytes = [0u8; 32];
    key_bytes.copy_from_slice(&decoded);
    Ok(key_bytes)
}
