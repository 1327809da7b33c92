//! Backend error taxonomy.
//!
//! Every failure a compute backend can report maps to one variant here. None
//! of them are retried: all backend operations are deterministic, so the
//! caller surfaces the error and aborts the configuration that hit it.

/// Errors raised by a [`ComputeBackend`](crate::ComputeBackend).
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    /// No device matched the selection criteria.
    #[error("no compute device matches {criteria}")]
    NoDeviceFound { criteria: String },

    /// The platform or driver could not be brought up.
    #[error("backend initialisation failed: {0}")]
    BackendInit(String),

    /// Kernel source failed to compile or lacks the requested entry point.
    #[error("kernel compilation failed for '{entry_point}': {diagnostic}")]
    Compilation {
        entry_point: String,
        diagnostic: String,
    },

    /// Device memory could not be reserved.
    #[error("buffer allocation of {requested} elements failed: {reason}")]
    Allocation { requested: usize, reason: String },

    /// A transfer touched elements past the end of the buffer.
    #[error("transfer of {count} elements at offset {offset} exceeds buffer of {len} elements")]
    OutOfBounds {
        offset: usize,
        count: usize,
        len: usize,
    },

    /// Invalid launch configuration or a runtime fault on the device.
    #[error("kernel dispatch failed: {0}")]
    Dispatch(String),
}

impl BackendError {
    /// Stable numeric code for diagnostics and process exit status.
    pub fn code(&self) -> i32 {
        match self {
            BackendError::NoDeviceFound { .. } | BackendError::BackendInit(_) => 1,
            BackendError::Compilation { .. } => 2,
            BackendError::Allocation { .. } => 3,
            BackendError::OutOfBounds { .. } => 4,
            BackendError::Dispatch(_) => 5,
        }
    }
}

/// Result alias for backend operations.
pub type Result<T> = std::result::Result<T, BackendError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_are_distinct_per_class() {
        let errors = [
            BackendError::NoDeviceFound {
                criteria: "any".into(),
            },
            BackendError::Compilation {
                entry_point: "k".into(),
                diagnostic: "bad".into(),
            },
            BackendError::Allocation {
                requested: 1,
                reason: "oom".into(),
            },
            BackendError::OutOfBounds {
                offset: 0,
                count: 2,
                len: 1,
            },
            BackendError::Dispatch("fault".into()),
        ];
        let mut codes: Vec<i32> = errors.iter().map(|e| e.code()).collect();
        codes.dedup();
        assert_eq!(codes, vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_init_and_no_device_share_code() {
        assert_eq!(BackendError::BackendInit("x".into()).code(), 1);
    }

    #[test]
    fn test_display_carries_diagnostic() {
        let e = BackendError::Compilation {
            entry_point: "sum_smart".into(),
            diagnostic: "use of undeclared identifier".into(),
        };
        let msg = e.to_string();
        assert!(msg.contains("sum_smart"));
        assert!(msg.contains("undeclared identifier"));
    }
}
