use crate::backoff::reconnect_delay;
use crate::error::StreamError;
use configuration::StreamSettings;
use core_types::{ConnectionPhase, ConnectionStatus};
use futures_util::{SinkExt, StreamExt};
use protocol::{InboundFrame, OutboundFrame};
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use url::Url;

/// Why one logical channel ended.
enum ChannelEnd {
    /// The consumer dropped its receiver; the whole task should exit.
    ConsumerGone,
    /// The transport closed or errored; the reconnect loop takes over.
    Closed(Option<String>),
}

/// Owns the lifecycle of the persistent fleet channel: connect, dispatch
/// inbound frames, detect closure, schedule reconnection with bounded
/// exponential backoff, give up after the configured attempt ceiling.
pub struct StreamConnector {
    settings: StreamSettings,
}

impl StreamConnector {
    pub fn new(settings: StreamSettings) -> Self {
        Self { settings }
    }

    /// Establishes one logical channel, superseding any previous one, and
    /// spawns the background task that owns it. Dropping the returned
    /// handle tears the task down, which also cancels any pending
    /// reconnect timer.
    pub fn connect(&self) -> Result<StreamHandle, StreamError> {
        let url = Url::parse(&self.settings.url)?;
        let (frames_tx, frames_rx) = mpsc::channel(1024);
        let (status_tx, status_rx) = watch::channel(ConnectionStatus::default());
        let (outbound_tx, outbound_rx) = mpsc::channel(64);

        let settings = self.settings.clone();
        let task = tokio::spawn(run_channel(url, settings, frames_tx, status_tx, outbound_rx));

        Ok(StreamHandle {
            frames: frames_rx,
            status: status_rx,
            outbound: outbound_tx,
            task,
        })
    }
}

/// The consumer side of one logical channel: decoded inbound frames, a
/// watchable connection status, and a best-effort outbound path.
pub struct StreamHandle {
    frames: mpsc::Receiver<InboundFrame>,
    status: watch::Receiver<ConnectionStatus>,
    outbound: mpsc::Sender<OutboundFrame>,
    task: JoinHandle<()>,
}

impl StreamHandle {
    /// Receives the next decoded inbound frame. Returns `None` once the
    /// channel has been torn down for good (exhausted or task gone).
    pub async fn next_frame(&mut self) -> Option<InboundFrame> {
        self.frames.recv().await
    }

    /// Snapshot of the current connection status.
    pub fn status(&self) -> ConnectionStatus {
        self.status.borrow().clone()
    }

    /// A watch receiver for observing every status transition.
    pub fn status_stream(&self) -> watch::Receiver<ConnectionStatus> {
        self.status.clone()
    }

    /// Enqueues a frame for transmission if the channel is open. When it is
    /// not, the call is a logged no-op: it never blocks and never fails.
    pub fn send(&self, frame: OutboundFrame) {
        if !self.status.borrow().is_open() {
            tracing::warn!(?frame, "Stream not connected, dropping outbound frame");
            return;
        }
        if let Err(e) = self.outbound.try_send(frame) {
            tracing::warn!(error = %e, "Outbound queue unavailable, dropping frame");
        }
    }
}

impl Drop for StreamHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// The reconnect state machine. Runs until the consumer goes away or the
/// attempt ceiling is reached.
async fn run_channel(
    url: Url,
    settings: StreamSettings,
    frames_tx: mpsc::Sender<InboundFrame>,
    status_tx: watch::Sender<ConnectionStatus>,
    mut outbound_rx: mpsc::Receiver<OutboundFrame>,
) {
    let base = Duration::from_millis(settings.backoff_base_ms);
    let ceiling = Duration::from_millis(settings.backoff_ceiling_ms);
    let mut attempts: u32 = 0;
    let mut last_error: Option<String> = None;

    loop {
        publish(&status_tx, ConnectionPhase::Connecting, attempts, last_error.clone());
        tracing::info!(url = %url, "Connecting to fleet stream...");

        match connect_async(url.as_str()).await {
            Ok((stream, _)) => {
                tracing::info!("Fleet stream connection established.");
                // A successful open is the only thing that resets the counter.
                attempts = 0;
                last_error = None;
                publish(&status_tx, ConnectionPhase::Open, 0, None);

                match drive_channel(stream, &frames_tx, &mut outbound_rx).await {
                    ChannelEnd::ConsumerGone => {
                        tracing::debug!("Frame consumer dropped, closing stream task.");
                        return;
                    }
                    ChannelEnd::Closed(reason) => last_error = reason,
                }
            }
            Err(e) => {
                tracing::error!(error = %e, "Fleet stream connection error.");
                last_error = Some(e.to_string());
            }
        }

        attempts += 1;
        if attempts >= settings.max_reconnect_attempts {
            tracing::error!(
                attempts,
                "Reconnect attempts exhausted, giving up on the fleet stream."
            );
            let error = last_error.clone().unwrap_or_else(|| {
                "Failed to connect to the fleet service after repeated attempts".to_string()
            });
            publish(
                &status_tx,
                ConnectionPhase::ClosedExhausted,
                attempts,
                Some(error),
            );
            return;
        }

        let delay = reconnect_delay(attempts, base, ceiling);
        tracing::warn!(
            attempt = attempts,
            max = settings.max_reconnect_attempts,
            delay_ms = delay.as_millis() as u64,
            "Fleet stream disconnected. Scheduling reconnect."
        );
        publish(&status_tx, ConnectionPhase::ClosedRetrying, attempts, last_error.clone());
        tokio::time::sleep(delay).await;
    }
}

/// Pumps one open WebSocket until it closes: inbound text frames are decoded
/// and dispatched, outbound frames serialized and sent. Malformed inbound
/// frames are dropped with a warning; they never tear the channel down.
async fn drive_channel(
    stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
    frames_tx: &mpsc::Sender<InboundFrame>,
    outbound_rx: &mut mpsc::Receiver<OutboundFrame>,
) -> ChannelEnd {
    let (mut sink, mut source) = stream.split();

    loop {
        tokio::select! {
            inbound = source.next() => match inbound {
                Some(Ok(Message::Text(text))) => match protocol::decode_inbound(&text) {
                    Ok(InboundFrame::Unrecognized) => {
                        tracing::debug!(raw = %text, "Ignoring unrecognized frame kind");
                    }
                    Ok(frame) => {
                        if frames_tx.send(frame).await.is_err() {
                            return ChannelEnd::ConsumerGone;
                        }
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "Dropping malformed inbound frame");
                    }
                },
                Some(Ok(Message::Close(frame))) => {
                    tracing::info!(?frame, "Fleet stream closed by server.");
                    return ChannelEnd::Closed(None);
                }
                // Transport-level control and binary messages carry no frames.
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    tracing::error!(error = %e, "Fleet stream transport error.");
                    return ChannelEnd::Closed(Some(e.to_string()));
                }
                None => return ChannelEnd::Closed(None),
            },
            outbound = outbound_rx.recv() => match outbound {
                Some(frame) => match protocol::encode_outbound(&frame) {
                    Ok(text) => {
                        if let Err(e) = sink.send(Message::Text(text)).await {
                            tracing::error!(error = %e, "Failed to send outbound frame.");
                            return ChannelEnd::Closed(Some(e.to_string()));
                        }
                    }
                    Err(e) => tracing::warn!(error = %e, "Failed to encode outbound frame"),
                },
                None => return ChannelEnd::ConsumerGone,
            },
        }
    }
}

fn publish(
    status_tx: &watch::Sender<ConnectionStatus>,
    phase: ConnectionPhase,
    attempts: u32,
    last_error: Option<String>,
) {
    let _ = status_tx.send(ConnectionStatus { phase, attempts, last_error });
}
