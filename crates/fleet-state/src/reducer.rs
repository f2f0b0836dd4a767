use chrono::Utc;
use core_types::{
    AgentEvent, ArbitrageOpportunity, ConnectionPhase, ConnectionStatus, EventCategory,
    EventSeverity, Truck,
};
use protocol::{InboundFrame, OutboundFrame, StatePayload};

/// The externally observable application state: the truck roster, the agent
/// event log, the single pending opportunity, and the connectivity flags.
///
/// Only the reducer mutates this; the presentation layer reads it and calls
/// the two local actions.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FleetState {
    pub trucks: Vec<Truck>,
    /// Reverse-chronological by insertion: new events are prepended.
    pub events: Vec<AgentEvent>,
    /// At most one opportunity is outstanding; a newer one replaces it.
    pub arbitrage: Option<ArbitrageOpportunity>,
    pub connected: bool,
    pub error: Option<String>,
}

impl FleetState {
    /// Interprets one inbound frame into the next observable state.
    pub fn apply_frame(&mut self, frame: InboundFrame) {
        match frame {
            InboundFrame::InitialState { data } | InboundFrame::StateUpdate { data } => {
                self.apply_snapshot(data);
            }
            InboundFrame::ArbitrageOpportunity { data } => {
                tracing::info!(truck_id = %data.truck_id, "Arbitrage opportunity received");
                self.arbitrage = Some(data);
            }
            InboundFrame::ArbitrageExecuted => {
                self.arbitrage = None;
            }
            // Liveness only.
            InboundFrame::Pong => {}
            InboundFrame::Unrecognized => {
                tracing::debug!("Ignoring unrecognized frame kind");
            }
        }
    }

    /// Partial-update semantics: a snapshot replaces only the parts it
    /// actually carries, leaving the rest of the state untouched.
    fn apply_snapshot(&mut self, data: StatePayload) {
        if let Some(trucks) = data.trucks {
            self.trucks = trucks;
        }
        if let Some(events) = data.events {
            self.events = events;
        }
    }

    /// Folds a connection transition into the connectivity flags.
    pub fn apply_status(&mut self, status: &ConnectionStatus) {
        self.connected = status.is_open();
        self.error = match status.phase {
            ConnectionPhase::Open => None,
            ConnectionPhase::ClosedExhausted => Some(status.last_error.clone().unwrap_or_else(
                || "Failed to connect to the fleet service. Check that the backend is running."
                    .to_string(),
            )),
            _ => status.last_error.clone(),
        };
    }

    /// The `execute` local action. No-op when nothing is pending. Otherwise
    /// returns the outbound frame for transmission and prepends a synthetic
    /// informational event before the server confirms — an optimistic step
    /// that is never rolled back. The pending opportunity itself is cleared
    /// only by the inbound `arbitrage_executed` confirmation.
    pub fn execute_arbitrage(&mut self) -> Option<OutboundFrame> {
        let opportunity = self.arbitrage.as_ref()?;
        let truck_id = opportunity.truck_id.clone();

        let now = Utc::now();
        self.events.insert(
            0,
            AgentEvent {
                id: format!("evt-{}", now.timestamp_millis()),
                timestamp: now,
                category: EventCategory::System,
                message: "Executing arbitrage solution...".to_string(),
                severity: EventSeverity::Info,
                truck_id: Some(truck_id.clone()),
            },
        );

        Some(OutboundFrame::ExecuteArbitrage { truck_id })
    }

    /// The `dismiss` local action: clears the pending opportunity immediately
    /// and unconditionally. No frame is sent.
    pub fn dismiss_arbitrage(&mut self) {
        self.arbitrage = None;
    }
}
