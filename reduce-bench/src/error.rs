//! Harness error taxonomy.
//!
//! Backend failures keep the step that hit them and the source location
//! that observed them, so the top-level diagnostic can name both.

use std::panic::Location;
use std::path::PathBuf;

use reduce_primitives::BackendError;

#[derive(Debug, thiserror::Error)]
pub enum BenchError {
    /// A backend operation failed. Aborts the configuration only.
    #[error("{source}")]
    Backend {
        step: &'static str,
        #[source]
        source: BackendError,
        location: &'static Location<'static>,
    },

    /// A computed result disagrees with the reference. Aborts the session.
    #[error("{context}: expected {expected}, got {actual}")]
    Consistency {
        context: String,
        expected: u32,
        actual: u32,
        location: &'static Location<'static>,
    },

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("cannot write {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot serialise report: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl BenchError {
    /// Stable numeric code, also used as the process exit status.
    pub fn code(&self) -> i32 {
        match self {
            BenchError::Backend { source, .. } => source.code(),
            BenchError::Consistency { .. } => 6,
            BenchError::Config(_) => 7,
            BenchError::Io { .. } | BenchError::Serialize(_) => 8,
        }
    }

    /// Whether the error must stop the whole session rather than just the
    /// configuration that raised it.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, BenchError::Backend { .. })
    }

    pub fn step(&self) -> &'static str {
        match self {
            BenchError::Backend { step, .. } => step,
            BenchError::Consistency { .. } => "consistency check",
            BenchError::Config(_) => "configuration",
            BenchError::Io { .. } | BenchError::Serialize(_) => "report",
        }
    }

    pub fn location(&self) -> Option<&'static Location<'static>> {
        match self {
            BenchError::Backend { location, .. } | BenchError::Consistency { location, .. } => {
                Some(location)
            }
            _ => None,
        }
    }

    /// One-line diagnostic: `error[E0006] consistency check: ... (at file:line:col)`.
    pub fn diagnostic(&self) -> String {
        let mut line = format!("error[E{:04}] {}: {}", self.code(), self.step(), self);
        if let Some(loc) = self.location() {
            line.push_str(&format!(" (at {}:{}:{})", loc.file(), loc.line(), loc.column()));
        }
        line
    }
}

/// Attaches the failing step and the caller's location to a backend result.
pub trait StepExt<T> {
    fn step(self, step: &'static str) -> Result<T>;
}

impl<T> StepExt<T> for std::result::Result<T, BackendError> {
    #[track_caller]
    fn step(self, step: &'static str) -> Result<T> {
        match self {
            Ok(value) => Ok(value),
            Err(source) => Err(BenchError::Backend {
                step,
                source,
                location: Location::caller(),
            }),
        }
    }
}

pub type Result<T> = std::result::Result<T, BenchError>;
