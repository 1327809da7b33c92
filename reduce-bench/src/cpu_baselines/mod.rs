//! CPU baseline implementations for benchmark comparison.
//!
//! The serial path is the reference engine itself; this module holds the
//! parallel (rayon) reduction that runs as the "CPU parallel" configuration.

pub mod rayon_reduce;
