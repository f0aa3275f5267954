use crate::geometry::target::TargetId;

/// Convenience result type used across the layout engine.
pub type LayoutResult<T> = Result<T, LayoutError>;

/// Top-level error taxonomy used by engine APIs.
///
/// Invariant violations on the per-tick path are self-healed (clamped or normalized) and never
/// surface here; these variants cover lookups of stale handles, layout faults and
/// configuration-time misuse.
#[derive(thiserror::Error, Debug)]
pub enum LayoutError {
    /// Invalid user-provided tree or layout data.
    #[error("validation error: {0}")]
    Validation(String),

    /// A [`TargetId`] that is not (or no longer) present in the target tree.
    #[error("unknown target {0}")]
    UnknownTarget(TargetId),

    /// Malformed or inconsistent scene configuration.
    #[error("config error: {0}")]
    Config(String),

    /// Errors when serializing or deserializing data structures.
    #[error("serialization error: {0}")]
    Serde(String),

    /// Wrapped lower-level error from dependencies or user layout code.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl LayoutError {
    /// Build a [`LayoutError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`LayoutError::Config`] value.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Build a [`LayoutError::Serde`] value.
    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }
}

impl From<serde_json::Error> for LayoutError {
    fn from(value: serde_json::Error) -> Self {
        Self::Serde(value.to_string())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
