//! Error handling for imgforge
//!
//! Provides centralized error handling with proper error types using thiserror.
//! All errors in the crate should use these types for consistency.
//!
//! The variants mirror the failure classes the engine distinguishes:
//! spec problems abort a build before anything runs, template and handler
//! problems are reported per step and folded into the meltdown flag.

use thiserror::Error;

/// Main error type for imgforge
#[derive(Error, Debug)]
pub enum ImgForgeError {
    /// IO errors (image files, mount points, etc.)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Build specification errors (loading, structure)
    #[error("Spec error: {0}")]
    Spec(String),

    /// No registered step runner matches the step record
    #[error("Unknown step type: {0}")]
    UnknownStep(String),

    /// Template expansion failed for a single step
    #[error("Template error in step {step}: {message}")]
    Template { step: String, message: String },

    /// A step runner's run or teardown failed
    #[error("Step failed: {0}")]
    Handler(String),

    /// YAML deserialization errors
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for imgforge operations
pub type Result<T> = std::result::Result<T, ImgForgeError>;

// Convenient error constructors
impl ImgForgeError {
    /// Create a spec error
    pub fn spec(msg: impl Into<String>) -> Self {
        Self::Spec(msg.into())
    }

    /// Create an unknown-step error
    pub fn unknown_step(step: impl Into<String>) -> Self {
        Self::UnknownStep(step.into())
    }

    /// Create a template error scoped to one step
    pub fn template(step: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Template {
            step: step.into(),
            message: message.into(),
        }
    }

    /// Create a handler error
    pub fn handler(msg: impl Into<String>) -> Self {
        Self::Handler(msg.into())
    }

    /// True for errors that abort a build before any step runs.
    ///
    /// During the pre-flight validation pass both spec and unknown-step
    /// errors are fatal; nothing has entered the ledger yet, so there is
    /// nothing to tear down.
    pub fn is_spec_error(&self) -> bool {
        matches!(self, Self::Spec(_) | Self::UnknownStep(_))
    }
}
