use std::net::Ipv4Addr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::ConfigError;

/// b.root-servers.net
pub const DEFAULT_ROOT_SERVER: Ipv4Addr = Ipv4Addr::new(199, 9, 14, 201);
pub const DEFAULT_UPSTREAM: Ipv4Addr = Ipv4Addr::new(8, 8, 8, 8);
pub const MIN_BUFFER_SIZE: usize = 512;

const MAX_RETRY_BACKOFF: Duration = Duration::from_secs(2);

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ResolverConfig {
    pub root_server: Ipv4Addr,
    pub upstream: Ipv4Addr,
    pub port: u16,
    pub read_timeout_ms: u64,
    pub total_timeout_ms: u64,
    pub max_hops: usize,
    pub retries: u32,
    pub retry_backoff_ms: u64,
    pub buffer_size: usize,
    pub cache_path: PathBuf,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            root_server: DEFAULT_ROOT_SERVER,
            upstream: DEFAULT_UPSTREAM,
            port: 53,
            read_timeout_ms: 3_000,
            total_timeout_ms: 30_000,
            max_hops: 32,
            retries: 2,
            retry_backoff_ms: 200,
            buffer_size: 65_535,
            cache_path: PathBuf::from("dnwalk.db"),
        }
    }
}

impl ResolverConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&raw)?)
    }

    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms)
    }

    pub fn total_timeout(&self) -> Duration {
        Duration::from_millis(self.total_timeout_ms)
    }

    /// Backoff before retry number `attempt` (starting at 0).
    pub fn retry_backoff(&self, attempt: u32) -> Duration {
        let factor = 1u32.checked_shl(attempt).unwrap_or(u32::MAX);
        Duration::from_millis(self.retry_backoff_ms)
            .saturating_mul(factor)
            .min(MAX_RETRY_BACKOFF)
    }

    pub fn buffer_size(&self) -> usize {
        self.buffer_size.max(MIN_BUFFER_SIZE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn partial_file_keeps_defaults() {
        let config: ResolverConfig = toml::from_str(
            r#"
            root_server = "198.41.0.4"
            max_hops = 8
            "#,
        )
        .unwrap();

        assert_eq!(config.root_server, Ipv4Addr::new(198, 41, 0, 4));
        assert_eq!(config.max_hops, 8);
        assert_eq!(config.upstream, DEFAULT_UPSTREAM);
        assert_eq!(config.port, 53);
    }

    #[test]
    fn rejects_unknown_keys() {
        assert!(toml::from_str::<ResolverConfig>("root = \"1.2.3.4\"").is_err());
    }

    #[test]
    fn loads_from_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("dnwalk.toml");
        std::fs::write(&path, "upstream = \"1.1.1.1\"\nread_timeout_ms = 500\n").unwrap();

        let config = ResolverConfig::load(&path).unwrap();
        assert_eq!(config.upstream, Ipv4Addr::new(1, 1, 1, 1));
        assert_eq!(config.read_timeout(), Duration::from_millis(500));

        assert!(matches!(
            ResolverConfig::load(dir.path().join("missing.toml")),
            Err(ConfigError::Read(_))
        ));
    }

    #[test]
    fn backoff_doubles_up_to_a_cap() {
        let config = ResolverConfig::default();
        assert_eq!(config.retry_backoff(0), Duration::from_millis(200));
        assert_eq!(config.retry_backoff(1), Duration::from_millis(400));
        assert_eq!(config.retry_backoff(5), MAX_RETRY_BACKOFF);
        assert_eq!(config.retry_backoff(40), MAX_RETRY_BACKOFF);
    }

    #[test]
    fn buffer_is_at_least_one_classic_datagram() {
        let config = ResolverConfig {
            buffer_size: 100,
            ..Default::default()
        };
        assert_eq!(config.buffer_size(), MIN_BUFFER_SIZE);
    }
}
