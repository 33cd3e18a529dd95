use std::{env, fmt::Display, fs::read_to_string, str::FromStr};

use anyhow::{Context, Result};
use tracing::{info, warn};

pub const DEFAULT_SHORT_LINK_LENGTH: usize = 6;

#[derive(Clone, Debug)]
pub struct Config {
    pub port: u16,
    pub database_url: String,
    /// Origin used to build absolute links, without a trailing slash.
    pub public_url: String,
    pub short_link_length: usize,
}

impl Config {
    pub fn load() -> Result<Self> {
        let public_url: String = try_load("PUBLIC_URL", "http://localhost")?;
        let short_link_length: usize =
            try_load("SHORT_LINK_LENGTH", &DEFAULT_SHORT_LINK_LENGTH.to_string())?;

        if short_link_length == 0 {
            anyhow::bail!("SHORT_LINK_LENGTH must be positive");
        }

        Ok(Self {
            port: try_load("RUST_PORT", "8000")?,
            database_url: secret_or("DATABASE_URL", "sqlite://foodgram.sqlite?mode=rwc"),
            public_url: public_url.trim_end_matches('/').to_string(),
            short_link_length,
        })
    }
}

fn var(key: &str) -> Option<String> {
    env::var(key)
        .map_err(|_| {
            warn!("Environment variable {key} not found, using default");
        })
        .ok()
}

fn try_load<T: FromStr>(key: &str, default: &str) -> Result<T>
where
    T::Err: Display,
{
    let raw = var(key).unwrap_or_else(|| {
        info!("{key} not set, using default: {default}");
        default.to_string()
    });

    raw.parse()
        .map_err(|e| anyhow::anyhow!("Invalid {key} value: {e}"))
        .context("Environment misconfigured!")
}

/// Secrets mounted under `/run/secrets` win over the environment.
fn secret_or(secret_name: &str, default: &str) -> String {
    let path = format!("/run/secrets/{secret_name}");

    match read_to_string(&path) {
        Ok(secret) => secret.trim().to_string(),
        Err(_) => var(secret_name).unwrap_or_else(|| {
            info!("{secret_name} not set, using default");
            default.to_string()
        }),
    }
}
