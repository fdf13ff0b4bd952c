//! Client configuration: connection endpoint and per-operation deadlines.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Where and how to reach the broker gateway
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    pub host: String,
    pub port: u16,
    /// Distinguishes this API session from others on the same gateway
    pub client_id: i32,
    #[serde(default)]
    pub timeouts: Timeouts,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 7497,
            client_id: 0,
            timeouts: Timeouts::default(),
        }
    }
}

impl ClientConfig {
    pub fn load_from_file(path: &str) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config = toml::from_str(&content)?;
        Ok(config)
    }
}

/// Default deadlines per operation class.
///
/// Serialized as whole milliseconds so config files stay flat.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Timeouts {
    /// Waiting for the connection acknowledgement
    #[serde(with = "millis")]
    pub connect: Duration,
    /// Grace period after the ack while the broker floods startup notices;
    /// commands issued inside it race the handshake tail
    #[serde(with = "millis")]
    pub settle: Duration,
    /// Waiting for the connection-closed confirmation
    #[serde(with = "millis")]
    pub disconnect: Duration,
    /// Waiting for the one-time order-id seed
    #[serde(with = "millis")]
    pub id_seed: Duration,
    /// Default deadline for order placement and snapshot queries
    #[serde(with = "millis")]
    pub query: Duration,
    /// Default deadline for market data delivery
    #[serde(with = "millis")]
    pub market_data: Duration,
    /// Default deadline for security-definition lookups
    #[serde(with = "millis")]
    pub security_definition: Duration,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            connect: Duration::from_secs(5),
            settle: Duration::from_secs(1),
            disconnect: Duration::from_secs(5),
            id_seed: Duration::from_secs(5),
            query: Duration::from_secs(5),
            market_data: Duration::from_secs(60),
            security_definition: Duration::from_secs(10),
        }
    }
}

mod millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let ms = u64::deserialize(deserializer)?;
        Ok(Duration::from_millis(ms))
    }
}
