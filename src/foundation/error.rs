/// Convenience result type used across Herostage.
pub type StageResult<T> = Result<T, StageError>;

/// Top-level error taxonomy used by engine APIs.
///
/// Component-internal failures that must not interrupt sibling components
/// (missing targets, duplicate notices) are logged and swallowed at the
/// component boundary; this taxonomy covers the failures that *are* surfaced
/// to callers.
#[derive(thiserror::Error, Debug)]
pub enum StageError {
    /// Invalid user-provided configuration or input data.
    #[error("validation error: {0}")]
    Validation(String),

    /// A referenced visual target is absent (already unmounted).
    #[error("missing target: {0}")]
    MissingTarget(String),

    /// Transient playback failure; the current source should be reloaded.
    #[error("playback network error: {0}")]
    PlaybackNetwork(String),

    /// Decode/media failure; in-place recovery should be attempted once.
    #[error("playback media error: {0}")]
    PlaybackMedia(String),

    /// Playback failure with no recovery path left for this layer.
    #[error("playback unrecoverable: {0}")]
    PlaybackUnrecoverable(String),

    /// Wrapped lower-level error from dependencies.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl StageError {
    /// Build a [`StageError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`StageError::MissingTarget`] value.
    pub fn missing_target(msg: impl Into<String>) -> Self {
        Self::MissingTarget(msg.into())
    }

    /// Build a [`StageError::PlaybackNetwork`] value.
    pub fn network(msg: impl Into<String>) -> Self {
        Self::PlaybackNetwork(msg.into())
    }

    /// Build a [`StageError::PlaybackMedia`] value.
    pub fn media(msg: impl Into<String>) -> Self {
        Self::PlaybackMedia(msg.into())
    }

    /// Build a [`StageError::PlaybackUnrecoverable`] value.
    pub fn unrecoverable(msg: impl Into<String>) -> Self {
        Self::PlaybackUnrecoverable(msg.into())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
