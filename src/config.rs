use serde::Deserialize;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::Path;
use std::time::Duration;

/// Port upstream servers are contacted on when none is given
pub const DNS_PORT: u16 = 53;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {0}: {1}")]
    FileRead(String, String),

    #[error("Failed to parse config: {0}")]
    Parse(String),

    #[error("Configuration validation error: {0}")]
    Validation(String),
}

/// Resolver and listener settings
///
/// Every field has a default, so an empty file is a valid configuration
/// that answers from cache and zone data only.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Port the listener binds to, 0 picks a free one
    pub port: u16,
    pub bind_address: IpAddr,
    /// How long to wait for an upstream reply
    pub upstream_timeout_ms: u64,
    pub recursion: RecursionConfig,
    pub forwarding: ForwardingConfig,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct RecursionConfig {
    pub recursion_available: bool,
    pub max_recursion_attempts: usize,
    /// Where iterative resolution starts
    pub root_servers: Vec<Ipv4Addr>,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct ForwardingConfig {
    pub enabled: bool,
    /// `ip` or `ip:port`, tried in order
    pub forwarders: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            port: DNS_PORT,
            bind_address: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            upstream_timeout_ms: 2000,
            recursion: RecursionConfig::default(),
            forwarding: ForwardingConfig::default(),
        }
    }
}

impl Default for RecursionConfig {
    fn default() -> Self {
        RecursionConfig {
            recursion_available: false,
            max_recursion_attempts: 16,
            root_servers: vec![
                Ipv4Addr::new(198, 41, 0, 4),
                Ipv4Addr::new(199, 9, 14, 201),
                Ipv4Addr::new(192, 33, 4, 12),
            ],
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::FileRead(path.display().to_string(), e.to_string()))?;
        Config::from_toml(&contents)
    }

    pub fn from_toml(contents: &str) -> Result<Self, ConfigError> {
        let config: Config =
            toml::from_str(contents).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.upstream_timeout_ms == 0 {
            return Err(ConfigError::Validation(
                "Upstream timeout cannot be 0".to_string(),
            ));
        }
        if self.recursion.recursion_available && self.recursion.root_servers.is_empty() {
            return Err(ConfigError::Validation(
                "Recursion is available but no root servers are configured".to_string(),
            ));
        }
        if self.forwarding.enabled && self.forwarding.forwarders.is_empty() {
            return Err(ConfigError::Validation(
                "Forwarding is enabled but no forwarders are configured".to_string(),
            ));
        }
        self.forwarding.addrs()?;
        Ok(())
    }

    pub fn listen_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind_address, self.port)
    }

    pub fn upstream_timeout(&self) -> Duration {
        Duration::from_millis(self.upstream_timeout_ms)
    }
}

impl ForwardingConfig {
    /// The forwarders as socket addresses, port 53 when none is given
    pub fn addrs(&self) -> Result<Vec<SocketAddr>, ConfigError> {
        self.forwarders
            .iter()
            .map(|forwarder| {
                forwarder
                    .parse::<SocketAddr>()
                    .or_else(|_| {
                        forwarder
                            .parse::<IpAddr>()
                            .map(|ip| SocketAddr::new(ip, DNS_PORT))
                    })
                    .map_err(|_| {
                        ConfigError::Validation(format!(
                            "Invalid forwarder address '{}'",
                            forwarder
                        ))
                    })
            })
            .collect()
    }
}
