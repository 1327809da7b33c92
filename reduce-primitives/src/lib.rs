//! Compute backend adapter for the reduction benchmarks.
//!
//! [`ComputeBackend`] is the whole contract the harness consumes: device
//! selection, buffer allocation and transfer, kernel compilation and
//! blocking dispatch. [`HostBackend`] emulates an accelerator on the CPU and
//! is always available; `MetalBackend` drives Apple GPUs on macOS.

pub mod backend;
pub mod error;
pub mod host;
pub mod kernel;
pub mod partition;
pub mod timing;

#[cfg(target_os = "macos")]
pub mod dispatch;
#[cfg(target_os = "macos")]
pub mod metal_ctx;
#[cfg(target_os = "macos")]
pub mod pso_cache;

pub use backend::{ComputeBackend, DeviceBuffer, DeviceCriteria, DeviceInfo, DeviceKind};
pub use error::BackendError;
pub use host::{HostBackend, HostBuffer, HostKernel};
pub use kernel::{declared_entry_points, HostProgram, KernelSource, WorkGroup};
pub use partition::{div_up, round_up, WorkPartition};
pub use timing::time_secs;

#[cfg(target_os = "macos")]
pub use metal_ctx::{MetalBackend, MetalBuffer, MetalKernel};
