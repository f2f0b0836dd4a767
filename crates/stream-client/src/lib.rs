pub mod backoff;
pub mod connector;
pub mod error;

// Re-export the connection types to provide a clean public API.
pub use connector::{StreamConnector, StreamHandle};
pub use error::StreamError;
