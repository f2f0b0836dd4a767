use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Invalid coordinate '{0}': expected 'lon,lat'")]
    InvalidCoordinate(String),
}
