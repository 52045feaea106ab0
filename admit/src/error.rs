//! Error types for the admission gate and its configuration.

/// Failure to admit work through a [`Gate`](crate::Gate).
#[derive(Debug, thiserror::Error)]
pub enum GateError {
    /// The gate was canceled before (or while) waiting for a slot.
    ///
    /// This is the expected outcome of a normal shutdown, not a fault.
    #[error("gate canceled")]
    Canceled,
    /// The OS refused to start a thread for `call_blocking`. The slot was released.
    #[error("failed to spawn worker thread: {0}")]
    Spawn(#[source] std::io::Error),
}

impl GateError {
    /// True for rejections caused by cancellation.
    pub fn is_canceled(&self) -> bool {
        matches!(self, GateError::Canceled)
    }
}

/// Invalid [`GateConfig`](crate::GateConfig) values.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("gate limit must be at least 1")]
    InvalidLimit,
    #[error("gate limit must be at most {max}")]
    LimitTooLarge { max: usize },
    #[error("invalid value for {var}: {value:?}")]
    Parse { var: &'static str, value: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canceled_display() {
        assert_eq!(GateError::Canceled.to_string(), "gate canceled");
        assert!(GateError::Canceled.is_canceled());
    }

    #[test]
    fn spawn_error_keeps_source() {
        use std::error::Error;

        let err = GateError::Spawn(std::io::Error::other("no threads left"));
        assert!(!err.is_canceled());
        assert!(err.to_string().contains("no threads left"));
        assert!(err.source().is_some());
    }

    #[test]
    fn parse_error_names_variable() {
        let err = ConfigError::Parse {
            var: "ADMIT_LIMIT",
            value: "lots".to_string(),
        };
        assert_eq!(err.to_string(), "invalid value for ADMIT_LIMIT: \"lots\"");
    }
}
