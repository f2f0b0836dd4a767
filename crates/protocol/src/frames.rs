use crate::error::ProtocolError;
use core_types::{AgentEvent, ArbitrageOpportunity, Truck};
use serde::{Deserialize, Serialize};

/// The `data` envelope of state snapshot frames.
///
/// Both fields are optional on the wire: a frame that carries only `trucks`
/// must leave the event log untouched, and vice versa (partial-update
/// semantics).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatePayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trucks: Option<Vec<Truck>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub events: Option<Vec<AgentEvent>>,
}

/// A frame pushed by the fleet service over the persistent channel.
///
/// The wire format is a single JSON object tagged by a `type` field, with
/// the per-kind payload under `data`. Tags the client does not know map to
/// `Unrecognized` instead of failing the decode, so a newer server never
/// crashes an older client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InboundFrame {
    /// Full snapshot sent right after the handshake.
    InitialState {
        #[serde(default)]
        data: StatePayload,
    },
    /// Periodic incremental snapshot.
    StateUpdate {
        #[serde(default)]
        data: StatePayload,
    },
    /// A new cost-saving proposal; replaces any outstanding one.
    ArbitrageOpportunity { data: ArbitrageOpportunity },
    /// Server confirmation that the pending proposal was executed.
    ArbitrageExecuted,
    /// Liveness reply to our `ping`. No state change.
    Pong,
    #[serde(other)]
    Unrecognized,
}

/// A frame sent by the client back to the fleet service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OutboundFrame {
    ExecuteArbitrage {
        #[serde(rename = "truckId")]
        truck_id: String,
    },
    Ping,
}

/// Decodes one inbound text frame. Callers drop and log failures; a decode
/// error must never tear the channel down.
pub fn decode_inbound(text: &str) -> Result<InboundFrame, ProtocolError> {
    serde_json::from_str(text).map_err(ProtocolError::Decode)
}

/// Encodes one outbound frame to its wire representation.
pub fn encode_outbound(frame: &OutboundFrame) -> Result<String, ProtocolError> {
    serde_json::to_string(frame).map_err(ProtocolError::Encode)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn decodes_state_update_with_trucks_only() {
        let frame = decode_inbound(
            r#"{
                "type": "state_update",
                "data": {
                    "trucks": [{
                        "id": "TRK-305",
                        "driver": "Rajesh Kumar",
                        "cargoValue": 85000,
                        "status": "delayed",
                        "velocity": 32,
                        "position": [77.5946, 12.9716]
                    }]
                }
            }"#,
        )
        .unwrap();

        match frame {
            InboundFrame::StateUpdate { data } => {
                let trucks = data.trucks.unwrap();
                assert_eq!(trucks.len(), 1);
                assert_eq!(trucks[0].id, "TRK-305");
                assert!(data.events.is_none());
            }
            other => panic!("unexpected frame: {other:?}"),
        }
    }

    #[test]
    fn decodes_initial_state_without_data_field() {
        let frame = decode_inbound(r#"{"type": "initial_state"}"#).unwrap();
        assert_eq!(
            frame,
            InboundFrame::InitialState { data: StatePayload::default() }
        );
    }

    #[test]
    fn decodes_arbitrage_opportunity() {
        let frame = decode_inbound(
            r#"{
                "type": "arbitrage_opportunity",
                "data": {"truckId": "TRK-402", "action": "reroute", "netSavings": 4250}
            }"#,
        )
        .unwrap();
        match frame {
            InboundFrame::ArbitrageOpportunity { data } => {
                assert_eq!(data.truck_id, "TRK-402");
                assert_eq!(data.net_savings, dec!(4250));
            }
            other => panic!("unexpected frame: {other:?}"),
        }
    }

    #[test]
    fn unknown_tag_maps_to_unrecognized() {
        let frame =
            decode_inbound(r#"{"type": "weather_alert", "data": {"region": "NH-48"}}"#).unwrap();
        assert_eq!(frame, InboundFrame::Unrecognized);
    }

    #[test]
    fn malformed_json_is_a_decode_error() {
        assert!(decode_inbound("{not json").is_err());
    }

    #[test]
    fn encodes_execute_arbitrage_with_camel_case_truck_id() {
        let wire = encode_outbound(&OutboundFrame::ExecuteArbitrage {
            truck_id: "TRK-402".to_string(),
        })
        .unwrap();
        assert_eq!(wire, r#"{"type":"execute_arbitrage","truckId":"TRK-402"}"#);
    }

    #[test]
    fn pong_and_executed_are_bare_tags() {
        assert_eq!(decode_inbound(r#"{"type":"pong"}"#).unwrap(), InboundFrame::Pong);
        assert_eq!(
            decode_inbound(r#"{"type":"arbitrage_executed","timestamp":"x"}"#).unwrap(),
            InboundFrame::ArbitrageExecuted
        );
    }
}
