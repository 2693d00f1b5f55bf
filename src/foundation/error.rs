/// Convenience result type used across mixplay.
pub type MixplayResult<T> = Result<T, MixplayError>;

/// Top-level error taxonomy used by engine APIs.
#[derive(thiserror::Error, Debug)]
pub enum MixplayError {
    /// A required media track or asset is missing or unreadable.
    #[error("asset error: {0}")]
    Asset(String),

    /// The working timeline could not incorporate a track.
    #[error("composition error: {0}")]
    Composition(String),

    /// A single render request could not produce a frame.
    #[error("render error: {0}")]
    Render(String),

    /// Malformed arguments at the operation surface.
    #[error("argument error: {0}")]
    Args(String),

    /// Invalid engine configuration.
    #[error("config error: {0}")]
    Config(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl MixplayError {
    /// Build a [`MixplayError::Asset`] value.
    pub fn asset(msg: impl Into<String>) -> Self {
        Self::Asset(msg.into())
    }

    /// Build a [`MixplayError::Composition`] value.
    pub fn composition(msg: impl Into<String>) -> Self {
        Self::Composition(msg.into())
    }

    /// Build a [`MixplayError::Render`] value.
    pub fn render(msg: impl Into<String>) -> Self {
        Self::Render(msg.into())
    }

    /// Build a [`MixplayError::Args`] value.
    pub fn args(msg: impl Into<String>) -> Self {
        Self::Args(msg.into())
    }

    /// Build a [`MixplayError::Config`] value.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Stable error code reported at the operation surface.
    ///
    /// Asset and composition failures both surface as `load`, matching the `load` operation that
    /// produces them.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Asset(_) | Self::Composition(_) => "load",
            Self::Render(_) => "render",
            Self::Args(_) => "args",
            Self::Config(_) => "config",
            Self::Other(_) => "internal",
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
