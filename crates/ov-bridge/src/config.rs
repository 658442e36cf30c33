use std::time::Duration;

use serde::{Deserialize, Serialize};

fn default_response_usec() -> u64 {
    10_000_000
}

/// Pending-request timeout configuration (spec.md §7). `response_usec`
/// bounds how long the bridge waits for a gateway or mixer to answer
/// before synthesizing a timeout response of its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BridgeTimeoutConfig {
    #[serde(default = "default_response_usec")]
    pub response_usec: u64,
}

impl BridgeTimeoutConfig {
    pub fn response_timeout(&self) -> Duration {
        Duration::from_micros(self.response_usec)
    }
}

impl Default for BridgeTimeoutConfig {
    fn default() -> Self {
        Self {
            response_usec: default_response_usec(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SocketType {
    Tcp,
    Udp,
    Local,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SocketConfig {
    pub host: String,
    pub port: u16,
    #[serde(rename = "type")]
    pub kind: SocketType,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timeout_defaults_to_ten_seconds() {
        let config = BridgeTimeoutConfig::default();
        assert_eq!(config.response_timeout(), Duration::from_secs(10));
    }

    #[test]
    fn missing_response_usec_falls_back_to_default() {
        let config: BridgeTimeoutConfig = serde_json::from_value(serde_json::json!({})).unwrap();
        assert_eq!(config.response_usec, 10_000_000);
    }
}
