use std::fmt;
use std::net::SocketAddr;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use pledge_protocol::{MAX_DATAGRAM_SIZE, MAX_FRAME_SIZE};
use serde::{Deserialize, Serialize};

use crate::error::{ServerError, ServerResult};

pub const DEFAULT_PORT: u16 = 12345;

/// Which transport the server listens on.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Transport {
    /// Connection-oriented: one session per accepted connection.
    Tcp,
    /// Connectionless: one reply per datagram, idle clients evicted.
    #[default]
    Udp,
}

impl fmt::Display for Transport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Tcp => f.write_str("tcp"),
            Self::Udp => f.write_str("udp"),
        }
    }
}

impl FromStr for Transport {
    type Err = ServerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "tcp" => Ok(Self::Tcp),
            "udp" => Ok(Self::Udp),
            other => Err(ServerError::Config(format!("unknown transport: {other}"))),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind_addr: SocketAddr,
    pub transport: Transport,
    /// Silence after which a UDP client is evicted; also the sweep period.
    pub idle_timeout_ms: u64,
    pub max_datagram_size: usize,
    pub max_frame_size: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], DEFAULT_PORT)),
            transport: Transport::default(),
            idle_timeout_ms: 30_000,
            max_datagram_size: MAX_DATAGRAM_SIZE,
            max_frame_size: MAX_FRAME_SIZE,
        }
    }
}

impl ServerConfig {
    pub fn from_toml_str(s: &str) -> ServerResult<Self> {
        let config: Self = toml::from_str(s).map_err(|e| ServerError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> ServerResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| ServerError::Config(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&text)
    }

    pub fn to_toml_string(&self) -> ServerResult<String> {
        toml::to_string_pretty(self).map_err(|e| ServerError::Config(e.to_string()))
    }

    pub fn idle_timeout(&self) -> Duration {
        Duration::from_millis(self.idle_timeout_ms)
    }

    pub fn validate(&self) -> ServerResult<()> {
        if self.idle_timeout_ms == 0 {
            return Err(ServerError::Config("idle_timeout_ms must be positive".into()));
        }
        if self.max_datagram_size == 0 || self.max_datagram_size > MAX_DATAGRAM_SIZE {
            return Err(ServerError::Config(format!(
                "max_datagram_size must be in 1..={MAX_DATAGRAM_SIZE}"
            )));
        }
        if self.max_frame_size == 0 {
            return Err(ServerError::Config("max_frame_size must be positive".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn default_config() {
        let c = ServerConfig::default();
        assert_eq!(c.bind_addr, "127.0.0.1:12345".parse::<SocketAddr>().unwrap());
        assert_eq!(c.transport, Transport::Udp);
        assert_eq!(c.idle_timeout(), Duration::from_secs(30));
        assert_eq!(c.max_datagram_size, MAX_DATAGRAM_SIZE);
        assert!(c.validate().is_ok());
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let c = ServerConfig::from_toml_str(
            r#"
            bind_addr = "0.0.0.0:4000"
            transport = "tcp"
            "#,
        )
        .unwrap();
        assert_eq!(c.bind_addr.port(), 4000);
        assert_eq!(c.transport, Transport::Tcp);
        assert_eq!(c.idle_timeout_ms, 30_000);
    }

    #[test]
    fn toml_roundtrip() {
        let c = ServerConfig {
            idle_timeout_ms: 500,
            ..Default::default()
        };
        let text = c.to_toml_string().unwrap();
        assert_eq!(ServerConfig::from_toml_str(&text).unwrap(), c);
    }

    #[test]
    fn rejects_bad_values() {
        assert!(matches!(
            ServerConfig::from_toml_str("idle_timeout_ms = 0"),
            Err(ServerError::Config(_))
        ));
        assert!(ServerConfig::from_toml_str("max_datagram_size = 70000").is_err());
        assert!(ServerConfig::from_toml_str("transport = \"carrier-pigeon\"").is_err());
    }

    #[test]
    fn load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "idle_timeout_ms = 1500").unwrap();
        let c = ServerConfig::load(file.path()).unwrap();
        assert_eq!(c.idle_timeout(), Duration::from_millis(1500));
    }

    #[test]
    fn load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = ServerConfig::load(dir.path().join("absent.toml")).unwrap_err();
        assert!(matches!(err, ServerError::Config(_)));
    }

    #[test]
    fn transport_parsing() {
        assert_eq!("TCP".parse::<Transport>().unwrap(), Transport::Tcp);
        assert_eq!("udp".parse::<Transport>().unwrap(), Transport::Udp);
        assert!("quic".parse::<Transport>().is_err());
        assert_eq!(Transport::Tcp.to_string(), "tcp");
    }
}
