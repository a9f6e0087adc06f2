use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ModelError {
    #[error("empty marker name")]
    EmptyMarker,
    #[error("invalid marker name: {marker:?}")]
    InvalidMarker { marker: String },
}
