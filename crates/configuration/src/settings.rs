use serde::Deserialize;

/// The root configuration structure for the entire application.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub stream: StreamSettings,
    pub routing: RoutingSettings,
}

/// Connection parameters for the fleet push stream.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StreamSettings {
    /// WebSocket endpoint of the fleet service.
    pub url: String,
    /// Reconnect ceiling. Once this many consecutive attempts have failed,
    /// the channel gives up and surfaces a terminal error.
    pub max_reconnect_attempts: u32,
    /// Base delay for the exponential backoff, in milliseconds.
    pub backoff_base_ms: u64,
    /// The maximum delay the reconnect policy will ever wait between attempts.
    pub backoff_ceiling_ms: u64,
}

impl Default for StreamSettings {
    fn default() -> Self {
        Self {
            url: "ws://localhost:8080".to_string(),
            max_reconnect_attempts: 5,
            backoff_base_ms: 1000,
            backoff_ceiling_ms: 10_000,
        }
    }
}

/// Parameters for the external routing service.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RoutingSettings {
    /// Base URL of the OSRM-compatible routing service.
    pub base_url: String,
    /// Hard ceiling on a single routing call, in milliseconds.
    pub timeout_ms: u64,
}

impl Default for RoutingSettings {
    fn default() -> Self {
        Self {
            base_url: "https://router.project-osrm.org".to_string(),
            timeout_ms: 5000,
        }
    }
}
