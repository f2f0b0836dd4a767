use crate::error::ConfigError;

// Declare the modules that make up this crate.
pub mod error;
pub mod settings;

// Re-export the core types to provide a clean public API.
pub use settings::{RoutingSettings, Settings, StreamSettings};

/// Loads the application configuration from the `config.toml` file.
///
/// The file is optional: every field has a default mirroring the reference
/// deployment, so a missing file yields a fully usable configuration for
/// local development.
pub fn load_settings() -> Result<Settings, ConfigError> {
    let builder = config::Config::builder()
        // Tells the builder to look for a file named `config.toml`
        .add_source(config::File::with_name("config.toml").required(false))
        .add_source(config::Environment::with_prefix("FLEETLINK").separator("__"))
        .build()?;

    // Attempt to deserialize the entire configuration into our `Settings` struct
    let settings = builder.try_deserialize::<Settings>()?;

    Ok(settings)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_reference_deployment() {
        let settings = Settings::default();
        assert_eq!(settings.stream.url, "ws://localhost:8080");
        assert_eq!(settings.stream.max_reconnect_attempts, 5);
        assert_eq!(settings.stream.backoff_base_ms, 1000);
        assert_eq!(settings.stream.backoff_ceiling_ms, 10_000);
        assert_eq!(settings.routing.timeout_ms, 5000);
    }
}
