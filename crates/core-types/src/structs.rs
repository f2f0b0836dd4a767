use crate::enums::{ConnectionPhase, EventCategory, EventSeverity, TruckStatus};
use crate::error::CoreError;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A geographic point, serialized on the wire as a `[longitude, latitude]`
/// pair to match the fleet service's GeoJSON-style payloads.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 2]", into = "[f64; 2]")]
pub struct Coordinate {
    pub lon: f64,
    pub lat: f64,
}

impl Coordinate {
    pub fn new(lon: f64, lat: f64) -> Self {
        Self { lon, lat }
    }

    /// Parses a "lon,lat" pair, tolerating whitespace around either number.
    pub fn parse(input: &str) -> Result<Self, CoreError> {
        let (lon, lat) = input
            .split_once(',')
            .ok_or_else(|| CoreError::InvalidCoordinate(input.to_string()))?;
        let lon = lon
            .trim()
            .parse()
            .map_err(|_| CoreError::InvalidCoordinate(input.to_string()))?;
        let lat = lat
            .trim()
            .parse()
            .map_err(|_| CoreError::InvalidCoordinate(input.to_string()))?;
        Ok(Self { lon, lat })
    }
}

impl From<[f64; 2]> for Coordinate {
    fn from(pair: [f64; 2]) -> Self {
        Self { lon: pair[0], lat: pair[1] }
    }
}

impl From<Coordinate> for [f64; 2] {
    fn from(coord: Coordinate) -> [f64; 2] {
        [coord.lon, coord.lat]
    }
}

/// A single truck in the fleet, as delivered in `initial_state` and
/// `state_update` snapshots. The roster is replaced wholesale on each
/// snapshot; nothing mutates individual trucks client-side.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Truck {
    pub id: String,
    pub driver: String,
    pub cargo_value: Decimal,
    pub status: TruckStatus,
    /// Current speed in km/h.
    pub velocity: f64,
    pub position: Coordinate,
    #[serde(default)]
    pub destination: Option<Coordinate>,
    /// Planned route waypoints, possibly empty.
    #[serde(default)]
    pub route: Vec<Coordinate>,
    #[serde(default)]
    pub current_route_index: usize,
    #[serde(default)]
    pub contract_id: Option<String>,
    #[serde(default)]
    pub eta: Option<DateTime<Utc>>,
}

/// One entry in the agent event log.
///
/// The log is append-only and strictly reverse-chronological by insertion:
/// new events are always prepended, regardless of their timestamp field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentEvent {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    #[serde(rename = "type")]
    pub category: EventCategory,
    pub message: String,
    pub severity: EventSeverity,
    #[serde(default)]
    pub truck_id: Option<String>,
}

/// A proposed cost-saving action on a truck, awaiting an operator's
/// execute/dismiss decision. At most one is outstanding at a time; a newer
/// one from the stream replaces the current one.
///
/// The analyzer sends more fields than we model; `extra` retains the raw
/// remainder of the payload so nothing is lost for display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArbitrageOpportunity {
    pub truck_id: String,
    #[serde(default)]
    pub action: String,
    #[serde(default)]
    pub net_savings: Decimal,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Observable connection state: phase plus the reconnect attempt counter and
/// the last transport error, if any.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConnectionStatus {
    pub phase: ConnectionPhase,
    /// Consecutive failed attempts. Resets to zero only on a successful open.
    pub attempts: u32,
    pub last_error: Option<String>,
}

impl ConnectionStatus {
    pub fn is_open(&self) -> bool {
        self.phase == ConnectionPhase::Open
    }
}

impl Default for ConnectionStatus {
    fn default() -> Self {
        Self {
            phase: ConnectionPhase::Connecting,
            attempts: 0,
            last_error: None,
        }
    }
}
