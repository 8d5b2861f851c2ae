pub mod error;
pub mod tolerance;

pub use error::{Result, SplError};
pub use tolerance::Tolerance;
