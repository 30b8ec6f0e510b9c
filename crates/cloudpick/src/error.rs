//! Error types for point picking.

use thiserror::Error;

/// Errors that can occur while configuring or running a pick.
///
/// An empty pick is not an error; queries report it as `None`.
#[derive(Error, Debug)]
pub enum PickError {
    /// An accelerated pick arrived before the hierarchy was built.
    #[error("hierarchy has not been built yet")]
    NotReady,

    /// The cloud's world transform has no inverse.
    #[error("world transform is not invertible")]
    DegenerateTransform,

    /// The camera cannot produce a view basis.
    #[error("degenerate camera: {0}")]
    DegenerateCamera(&'static str),

    /// A setting is outside its numeric range.
    #[error("invalid settings: {0}")]
    InvalidSettings(String),

    /// Settings text could not be parsed.
    #[error("failed to parse settings: {0}")]
    Config(#[from] toml::de::Error),

    /// Settings could not be written out.
    #[error("failed to serialize settings: {0}")]
    Serialize(#[from] toml::ser::Error),
}

/// Result type for picking operations.
pub type Result<T> = std::result::Result<T, PickError>;
