use std::path::PathBuf;

use anyhow::{Context, Result};

const DEFAULT_MAX_BODY_BYTES: usize = 10 * 1024 * 1024;

/// Server settings, read once from the environment at startup.
#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub workers: usize,
    pub artifacts_dir: PathBuf,
    pub max_body_bytes: usize,
}

impl AppConfig {
    /// `HOST`, `PORT`, `WORKERS`, `ARTIFACTS_DIR`, `MAX_BODY_BYTES`.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let parsed = |key: &str| -> Result<Option<usize>> {
            lookup(key)
                .map(|raw| {
                    raw.trim()
                        .parse::<usize>()
                        .with_context(|| format!("{key}={raw:?} is not a valid number"))
                })
                .transpose()
        };

        let port = match parsed("PORT")? {
            Some(p) => u16::try_from(p).context("PORT must fit in 16 bits")?,
            None => 8000,
        };
        let workers = parsed("WORKERS")?.unwrap_or_else(num_cpus::get).max(1);

        Ok(Self {
            host: lookup("HOST").unwrap_or_else(|| "127.0.0.1".to_string()),
            port,
            workers,
            artifacts_dir: lookup("ARTIFACTS_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("artifacts")),
            max_body_bytes: parsed("MAX_BODY_BYTES")?.unwrap_or(DEFAULT_MAX_BODY_BYTES),
        })
    }
}
