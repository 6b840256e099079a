/// Convenience result type used across Wavyte Overlay.
pub type OverlayResult<T> = Result<T, OverlayError>;

/// Top-level error taxonomy used by engine APIs.
///
/// Render cancellation is deliberately absent: a superseded render resolves to
/// [`crate::RenderOutcome::Cancelled`], not to an error.
#[derive(thiserror::Error, Debug)]
pub enum OverlayError {
    /// Invalid caller input (page number, scale, surface, annotation data). No state was mutated.
    #[error("validation error: {0}")]
    Validation(String),

    /// The document could not be opened or parsed.
    #[error("load error: {0}")]
    Load(String),

    /// A page render failed for a reason other than cancellation.
    #[error("render error: {0}")]
    Render(String),

    /// The component was already destroyed when the named operation was called.
    #[error("{0} called after destroy")]
    Destroyed(&'static str),

    /// Errors when serializing or deserializing data structures.
    #[error("serialization error: {0}")]
    Serde(String),

    /// Wrapped lower-level error from collaborators or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl OverlayError {
    /// Build an [`OverlayError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build an [`OverlayError::Load`] value.
    pub fn load(msg: impl Into<String>) -> Self {
        Self::Load(msg.into())
    }

    /// Build an [`OverlayError::Render`] value.
    pub fn render(msg: impl Into<String>) -> Self {
        Self::Render(msg.into())
    }

    /// Build an [`OverlayError::Serde`] value.
    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }

    /// Whether this error came from rejected caller input.
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
