// Error type shared by the filter bank, correlation and pooling code.

use thiserror::Error;

/// Failures reported by the feature extractor.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GaborError {
    #[error("invalid configuration: {reason}")]
    InvalidConfiguration { reason: String },

    #[error("degenerate kernel of size {size} at theta {theta:.4}: element sum is {sum}")]
    DegenerateKernel { size: usize, theta: f64, sum: f64 },

    #[error("shape mismatch: {reason}")]
    ShapeMismatch { reason: String },
}

impl GaborError {
    pub(crate) fn config(reason: impl Into<String>) -> Self {
        Self::InvalidConfiguration {
            reason: reason.into(),
        }
    }

    pub(crate) fn shape(reason: impl Into<String>) -> Self {
        Self::ShapeMismatch {
            reason: reason.into(),
        }
    }
}

pub type GaborResult<T> = Result<T, GaborError>;
