//! Generator error types

use std::io;
use thiserror::Error;

use crate::device::DeviceError;

/// Result type for generator operations
pub type GenResult<T> = Result<T, GenError>;

/// Errors returned by the generator handler
///
/// Validation errors are always raised before any state is touched, so a
/// failed call leaves both the cached parameters and the device untouched.
#[derive(Error, Debug)]
pub enum GenError {
    /// Numeric parameter outside its documented bounds
    #[error("{name} = {value} out of range [{min}, {max}]")]
    Range {
        name: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },

    /// Channel selector outside the two generator outputs
    #[error("invalid channel: {0}")]
    InvalidChannel(u32),

    /// Raw enum code outside its defined set
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// Structurally valid request the generator does not implement
    #[error("unsupported feature: {0}")]
    UnsupportedFeature(String),

    /// Failure reported by the device adapter
    #[error(transparent)]
    Device(#[from] DeviceError),

    /// Configuration file could not be read
    #[error("failed to read configuration: {0}")]
    ConfigIo(#[from] io::Error),

    /// Configuration file is not valid JSON for `GeneratorConfig`
    #[error("invalid configuration: {0}")]
    Config(#[from] serde_json::Error),
}

impl GenError {
    pub(crate) fn range(
        name: &'static str,
        value: impl Into<f64>,
        min: impl Into<f64>,
        max: impl Into<f64>,
    ) -> Self {
        GenError::Range {
            name,
            value: value.into(),
            min: min.into(),
            max: max.into(),
        }
    }

    /// Check if this error came from parameter validation
    ///
    /// Validation errors never reach the device, device errors always do.
    pub fn is_validation_error(&self) -> bool {
        matches!(
            self,
            GenError::Range { .. }
                | GenError::InvalidChannel(_)
                | GenError::InvalidParameter(_)
                | GenError::UnsupportedFeature(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::Channel;

    #[test]
    fn test_range_message() {
        let err = GenError::range("duty_cycle", 1.5f32, 0.0f32, 1.0f32);
        assert_eq!(err.to_string(), "duty_cycle = 1.5 out of range [0, 1]");
        assert!(err.is_validation_error());
    }

    #[test]
    fn test_device_error_is_transparent() {
        let inner = DeviceError::WriteFailed {
            channel: Channel::Ch2,
            reason: "bus fault".to_string(),
        };
        let msg = inner.to_string();
        let err: GenError = inner.into();
        assert_eq!(err.to_string(), msg);
        assert!(!err.is_validation_error());
    }
}
