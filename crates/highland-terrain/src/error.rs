//! Terrain parameter errors.

/// Errors raised while validating [`TerrainParameters`](crate::TerrainParameters).
#[derive(Debug, thiserror::Error)]
pub enum TerrainError {
    /// A parameter is outside the range the height field can work with.
    #[error("invalid terrain parameter `{name}`: {reason}")]
    InvalidParameter {
        /// Field name.
        name: &'static str,
        /// What the value must satisfy.
        reason: &'static str,
    },
}

impl TerrainError {
    pub(crate) fn invalid(name: &'static str, reason: &'static str) -> Self {
        Self::InvalidParameter { name, reason }
    }
}
