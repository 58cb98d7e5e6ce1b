//! Error types.
//!
//! Every failure is reported synchronously where it happens. Nothing is
//! retried: the algorithm does no I/O, so there is nothing transient to
//! retry.

use thiserror::Error;

/// Errors raised by a [`crate::engine::GeometryEngine`].
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineError {
    /// An operation produced NaN or infinite coordinates.
    #[error("{operation} produced non-finite coordinates")]
    NonFinite { operation: &'static str },
}

/// Errors returned by [`crate::deoverlap`].
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DeoverlapError {
    /// The requested combination of options is not allowed.
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// An input geometry failed structural validation.
    #[error("invalid geometry at index {index}: {reason}")]
    InvalidGeometry { index: usize, reason: String },

    /// Tolerance below zero (or NaN).
    #[error("tolerance must be non-negative, got {0}")]
    NegativeTolerance(f64),

    /// The geometry engine failed while processing.
    ///
    /// `index` is `None` when the failure happened while seeding the mask.
    #[error("geometry engine failed{}: {source}", at_index(.index))]
    EngineFailure {
        index: Option<usize>,
        #[source]
        source: EngineError,
    },
}

fn at_index(index: &Option<usize>) -> String {
    match index {
        Some(i) => format!(" at index {}", i),
        None => " while seeding the mask".to_string(),
    }
}

/// Errors from loading [`crate::options::DeoverlapOptions`].
#[derive(Debug, Error)]
pub enum OptionsError {
    #[error("YAML options error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON options error: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Invalid(#[from] DeoverlapError),
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn engine_failure_messages() {
        let err = DeoverlapError::EngineFailure {
            index: Some(3),
            source: EngineError::NonFinite { operation: "buffer" },
        };
        assert_eq!(
            err.to_string(),
            "geometry engine failed at index 3: buffer produced non-finite coordinates"
        );

        let err = DeoverlapError::EngineFailure {
            index: None,
            source: EngineError::NonFinite { operation: "union" },
        };
        assert_eq!(
            err.to_string(),
            "geometry engine failed while seeding the mask: union produced non-finite coordinates"
        );
    }

    #[test]
    fn invalid_geometry_message() {
        let err = DeoverlapError::InvalidGeometry { index: 2, reason: "empty Point".into() };
        assert_eq!(err.to_string(), "invalid geometry at index 2: empty Point");
    }
}
