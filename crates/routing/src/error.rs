use thiserror::Error;

#[derive(Error, Debug)]
pub enum RoutingError {
    #[error("Failed to reach the routing service: {0}")]
    Request(#[from] reqwest::Error),

    #[error("The routing service returned HTTP status {0}")]
    BadStatus(u16),

    #[error("The routing service rejected the request: code {0}")]
    ServiceCode(String),

    #[error("The routing service returned no candidate routes")]
    NoRoute,
}
