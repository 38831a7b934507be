//! Error types for dataflow_animation

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// A configuration field was assigned a value outside its valid range, or an
/// override source could not be read.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("{field} must be {expected}, got {value}")]
    OutOfRange {
        field: &'static str,
        value: i64,
        expected: &'static str,
    },

    #[error("invalid value for {field}: {value:?}")]
    Malformed { field: &'static str, value: String },

    #[error("failed to read config file {}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to parse config file {}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Failure reported by the rendering subsystem (terminal, headless, ...).
#[derive(Error, Debug)]
pub enum BackendError {
    #[error("terminal I/O failed: {0}")]
    Io(#[from] io::Error),

    #[error("{0}")]
    Subsystem(String),
}

/// Failure while resolving the registered items of an engine.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum EngineError {
    #[error("entity {0:?} is registered more than once")]
    DuplicateEntity(String),

    #[error("animation step #{step} references unknown entity {name:?}")]
    UnknownEntity { step: usize, name: String },
}

/// The definition's setup ran but registered nothing renderable.
#[derive(Error, Debug)]
#[error(
    "Animation is not ready. Please register at least one entity, information \
     or animation step (via `Engine::animate`)."
)]
pub struct BuildValidationError;

/// Outcome of a failed (re)build of the animation sequence. The renderer has
/// already applied its recovery policy by the time one of these is returned.
#[derive(Error, Debug)]
pub enum BuildError {
    #[error(transparent)]
    Validation(#[from] BuildValidationError),

    #[error("rendering subsystem error: {0}")]
    Rendering(#[from] BackendError),

    #[error("error building the animations: {0:#}")]
    Unexpected(anyhow::Error),
}

impl BuildError {
    /// Classify an error coming out of user code: rendering-subsystem
    /// failures keep their kind, everything else is unexpected.
    pub fn from_setup(err: anyhow::Error) -> Self {
        match err.downcast::<BackendError>() {
            Ok(backend) => BuildError::Rendering(backend),
            Err(err) => BuildError::Unexpected(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn setup_errors_keep_rendering_kind() {
        let err = anyhow::Error::new(BackendError::Subsystem("no display".into()));
        assert!(matches!(BuildError::from_setup(err), BuildError::Rendering(_)));

        let err = anyhow::anyhow!("bad script");
        assert!(matches!(BuildError::from_setup(err), BuildError::Unexpected(_)));
    }

    #[test]
    fn config_error_names_field_and_value() {
        let err = ConfigError::OutOfRange {
            field: "fps",
            value: 0,
            expected: "greater than 0",
        };
        assert_eq!(err.to_string(), "fps must be greater than 0, got 0");
    }
}
