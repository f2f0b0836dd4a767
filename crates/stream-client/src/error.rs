use thiserror::Error;

#[derive(Error, Debug)]
pub enum StreamError {
    #[error("Invalid stream endpoint: {0}")]
    InvalidEndpoint(#[from] url::ParseError),
}
