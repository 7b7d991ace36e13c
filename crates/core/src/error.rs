/// Result alias that carries the custom [`GameError`] type.
pub type Result<T> = std::result::Result<T, GameError>;

/// Common error type for the core crate.
#[derive(Debug, thiserror::Error)]
pub enum GameError {
    /// The caller handed the engine something it can never accept, such as an
    /// instrument index outside the catalog. Indicates a bug in the caller.
    #[error("invalid input: {0}")]
    InvalidInput(String),
    /// Configuration or session setup that fails validation.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    /// Wrapper around standard IO errors.
    #[error("{0}")]
    Io(#[from] std::io::Error),
    #[error("{0}")]
    Json(#[from] serde_json::Error),
}

impl GameError {
    pub fn invalid_input<T: Into<String>>(msg: T) -> Self {
        Self::InvalidInput(msg.into())
    }

    pub fn invalid_config<T: Into<String>>(msg: T) -> Self {
        Self::InvalidConfig(msg.into())
    }
}
