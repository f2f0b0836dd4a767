use crate::reducer::FleetState;
use core_types::{ConnectionPhase, ConnectionStatus};
use stream_client::StreamHandle;
use tokio::sync::watch;

/// Couples a [`FleetState`] reducer to a live stream handle: inbound frames
/// and connection transitions flow into the state, and the two local actions
/// are wired back through the connection manager.
pub struct FleetClient {
    state: FleetState,
    handle: StreamHandle,
    status: watch::Receiver<ConnectionStatus>,
}

impl FleetClient {
    pub fn new(handle: StreamHandle) -> Self {
        let status = handle.status_stream();
        Self {
            state: FleetState::default(),
            handle,
            status,
        }
    }

    /// The current observable state.
    pub fn state(&self) -> &FleetState {
        &self.state
    }

    /// Waits for the next frame or connection transition and folds it into
    /// the state. Returns `false` once the channel is finished for good
    /// (attempts exhausted or the stream task is gone).
    pub async fn tick(&mut self) -> bool {
        tokio::select! {
            frame = self.handle.next_frame() => match frame {
                Some(frame) => {
                    self.state.apply_frame(frame);
                    true
                }
                None => {
                    // The task is gone; fold its final transition before
                    // reporting the channel as finished.
                    let current = self.status.borrow_and_update().clone();
                    self.state.apply_status(&current);
                    false
                }
            },
            changed = self.status.changed() => {
                let current = self.status.borrow_and_update().clone();
                self.state.apply_status(&current);
                changed.is_ok() && current.phase != ConnectionPhase::ClosedExhausted
            },
        }
    }

    /// Executes the pending opportunity: optimistic local event plus an
    /// outbound frame through the connection manager. No-op when nothing is
    /// pending.
    pub fn execute_arbitrage(&mut self) {
        if let Some(frame) = self.state.execute_arbitrage() {
            self.handle.send(frame);
        }
    }

    /// Dismisses the pending opportunity locally. Nothing is sent.
    pub fn dismiss_arbitrage(&mut self) {
        self.state.dismiss_arbitrage();
    }
}
