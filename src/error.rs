//! Error types for a3s-shield

use thiserror::Error;

/// Errors that can occur while sanitizing text
#[derive(Debug, Error)]
pub enum ShieldError {
    /// An external collaborator (detector, embedder, generator) failed
    #[error("Dependency unavailable ({collaborator}): {reason}")]
    Dependency {
        collaborator: String,
        reason: String,
    },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Detection rule failed to compile
    #[error("Invalid regex pattern: {0}")]
    InvalidPattern(String),

    /// A money or date token could not be bucketed
    #[error("Cannot bucket value '{surface}': {reason}")]
    Value {
        surface: String,
        reason: String,
    },

    /// Serialization/deserialization failure
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl ShieldError {
    /// Build a dependency error for the named collaborator
    pub fn dependency(collaborator: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Dependency {
            collaborator: collaborator.into(),
            reason: reason.into(),
        }
    }

    /// Attribute a collaborator's failure to it, keeping existing attribution
    pub(crate) fn attribute(self, collaborator: &str) -> Self {
        match self {
            Self::Dependency { .. } => self,
            other => Self::dependency(collaborator, other.to_string()),
        }
    }

    /// Whether this error came from an external collaborator
    pub fn is_dependency(&self) -> bool {
        matches!(self, Self::Dependency { .. })
    }
}

/// Result type alias for shield operations
pub type Result<T> = std::result::Result<T, ShieldError>;
