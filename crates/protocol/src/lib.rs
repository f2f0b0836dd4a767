pub mod error;
pub mod frames;

// Re-export the frame types to provide a clean public API.
pub use error::ProtocolError;
pub use frames::{decode_inbound, encode_outbound, InboundFrame, OutboundFrame, StatePayload};
