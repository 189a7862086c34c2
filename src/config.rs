use std::env;

use anyhow::{Context, Result};

/// Central configuration loaded from environment variables.
///
/// The .env file is loaded automatically at startup via dotenvy. CLI flags
/// take precedence over everything here; these are the fallback defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// Neighbors retained per user (KINDRED_NEIGHBORS, default 10)
    pub neighbor_limit: usize,
    /// Recommendations retained per user (KINDRED_TOP, default 5)
    pub recommendation_limit: usize,
    /// Default RNG seed for sampling and evaluation splits (KINDRED_SEED)
    pub seed: Option<u64>,
}

impl Config {
    /// Load configuration from environment variables, falling back to the
    /// built-in defaults when a variable is unset.
    pub fn load() -> Result<Self> {
        Ok(Self {
            neighbor_limit: parse_env("KINDRED_NEIGHBORS")?.unwrap_or(10),
            recommendation_limit: parse_env("KINDRED_TOP")?.unwrap_or(5),
            seed: parse_env("KINDRED_SEED")?,
        })
    }
}

fn parse_env<T: std::str::FromStr>(name: &str) -> Result<Option<T>>
where
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(name) {
        Ok(raw) => {
            let value = raw
                .parse()
                .with_context(|| format!("{name} is set but not a valid number: {raw:?}"))?;
            Ok(Some(value))
        }
        Err(_) => Ok(None),
    }
}
