pub mod client;
pub mod reducer;

// Re-export the state types to provide a clean public API.
pub use client::FleetClient;
pub use reducer::FleetState;
