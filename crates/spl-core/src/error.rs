use thiserror::Error;

#[derive(Debug, Error)]
pub enum SplError {
    #[error("Knot vector error: {0}")]
    KnotVector(String),

    #[error("Geometry error: {0}")]
    Geometry(String),
}

pub type Result<T> = std::result::Result<T, SplError>;
