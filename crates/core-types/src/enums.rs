use serde::{Deserialize, Serialize};

/// Delivery status of a truck as reported by the fleet service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TruckStatus {
    OnTime,
    Delayed,
    Critical,
}

impl TruckStatus {
    /// Returns true when the truck needs operator attention.
    pub fn is_degraded(&self) -> bool {
        matches!(self, TruckStatus::Delayed | TruckStatus::Critical)
    }
}

/// Category of an agent event, mirroring the `type` field on the wire.
/// Categories this client does not know about map to `Other` instead of
/// failing the decode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EventCategory {
    System,
    Delay,
    Resolution,
    Arbitrage,
    Other,
}

impl<'de> Deserialize<'de> for EventCategory {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        Ok(match raw.as_str() {
            "system" => EventCategory::System,
            "delay" => EventCategory::Delay,
            "resolution" => EventCategory::Resolution,
            "arbitrage" => EventCategory::Arbitrage,
            _ => EventCategory::Other,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventSeverity {
    Info,
    Warning,
    Critical,
}

/// The lifecycle phase of the push-stream channel.
///
/// Transitions are driven only by transport events, never by application
/// logic. `ClosedExhausted` is terminal: no further automatic attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionPhase {
    Connecting,
    Open,
    ClosedRetrying,
    ClosedExhausted,
}
