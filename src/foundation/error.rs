/// Convenience result type used across vidfx.
pub type VidfxResult<T> = Result<T, VidfxError>;

/// Top-level error taxonomy used by pipeline APIs.
///
/// `Configuration` and `Geometry` errors come from optional cosmetic stages and are usually
/// recovered by skipping the effect. `MediaRead` and `Export` are fatal to a job.
#[derive(thiserror::Error, Debug)]
pub enum VidfxError {
    /// Invalid caller-provided input (empty buffers, unknown formats, bad options).
    #[error("validation error: {0}")]
    Validation(String),

    /// Invalid color matrix or LUT configuration.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Crop/rotation/scale could not be resolved against the source frame.
    #[error("geometry error: {0}")]
    Geometry(String),

    /// The input media could not be probed or decoded.
    #[error("media read error: {0}")]
    MediaRead(String),

    /// The media backend failed while encoding or writing the output.
    #[error("export error: {0}")]
    Export(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl VidfxError {
    /// Build a [`VidfxError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`VidfxError::Configuration`] value.
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    /// Build a [`VidfxError::Geometry`] value.
    pub fn geometry(msg: impl Into<String>) -> Self {
        Self::Geometry(msg.into())
    }

    /// Build a [`VidfxError::MediaRead`] value.
    pub fn media_read(msg: impl Into<String>) -> Self {
        Self::MediaRead(msg.into())
    }

    /// Build a [`VidfxError::Export`] value.
    pub fn export(msg: impl Into<String>) -> Self {
        Self::Export(msg.into())
    }

    /// Whether this error only affects an optional cosmetic stage.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::Configuration(_) | Self::Geometry(_))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
