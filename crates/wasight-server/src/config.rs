use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::{Context, bail};

use wasight_view::calls::{DEFAULT_TOP_N, MAX_TOP_N};
use wasight_view::paging::DEFAULT_BATCH_SIZE;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub db_path: PathBuf,
    pub media_root: PathBuf,
    pub batch_size: usize,
    /// Own JID: centre of the call diagram, never listed as a counterparty.
    pub own_number: String,
    pub top_n: usize,
    pub host: String,
    pub port: u16,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(get: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let var = |key: &str, default: &str| get(key).unwrap_or_else(|| default.into());

        let batch_size: usize = var("WASIGHT_BATCH_SIZE", &DEFAULT_BATCH_SIZE.to_string())
            .parse()
            .context("WASIGHT_BATCH_SIZE must be a number")?;
        if batch_size == 0 {
            bail!("WASIGHT_BATCH_SIZE must be greater than zero");
        }

        let top_n: usize = var("WASIGHT_TOP_N", &DEFAULT_TOP_N.to_string())
            .parse()
            .context("WASIGHT_TOP_N must be a number")?;
        if !(1..=MAX_TOP_N).contains(&top_n) {
            bail!("WASIGHT_TOP_N must be between 1 and {}", MAX_TOP_N);
        }

        let port: u16 = var("WASIGHT_PORT", "3000")
            .parse()
            .context("WASIGHT_PORT must be a port number")?;

        Ok(Self {
            db_path: PathBuf::from(var("WASIGHT_DB_PATH", "msgstore.db")),
            media_root: PathBuf::from(var("WASIGHT_MEDIA_ROOT", "media")),
            batch_size,
            own_number: var("WASIGHT_OWN_NUMBER", ""),
            top_n,
            host: var("WASIGHT_HOST", "127.0.0.1"),
            port,
        })
    }

    pub fn bind_addr(&self) -> anyhow::Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .with_context(|| format!("invalid bind address {}:{}", self.host, self.port))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> anyhow::Result<Config> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults() {
        let cfg = config(&[]).unwrap();
        assert_eq!(cfg.db_path, PathBuf::from("msgstore.db"));
        assert_eq!(cfg.media_root, PathBuf::from("media"));
        assert_eq!(cfg.batch_size, 500);
        assert_eq!(cfg.top_n, 10);
        assert_eq!(cfg.own_number, "");
        assert_eq!(cfg.bind_addr().unwrap().to_string(), "127.0.0.1:3000");
    }

    #[test]
    fn overrides_and_validation() {
        let cfg = config(&[("WASIGHT_BATCH_SIZE", "50"), ("WASIGHT_PORT", "8080")]).unwrap();
        assert_eq!(cfg.batch_size, 50);
        assert_eq!(cfg.port, 8080);

        assert!(config(&[("WASIGHT_BATCH_SIZE", "0")]).is_err());
        assert!(config(&[("WASIGHT_TOP_N", "1001")]).is_err());
        assert!(config(&[("WASIGHT_PORT", "http")]).is_err());
    }
}
