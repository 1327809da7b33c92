//! The compute backend contract consumed by the benchmark harness.
//!
//! A backend resolves one device, owns its memory, compiles kernel source and
//! launches kernels. Every call is synchronous from the caller's side: when
//! `dispatch` returns, the device has finished and the buffer is readable.

use std::fmt;

use crate::error::{BackendError, Result};
use crate::kernel::KernelSource;
use crate::partition::WorkPartition;

/// Broad class of a compute device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeviceKind {
    Gpu,
    Cpu,
    Other,
}

impl fmt::Display for DeviceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeviceKind::Gpu => write!(f, "gpu"),
            DeviceKind::Cpu => write!(f, "cpu"),
            DeviceKind::Other => write!(f, "other"),
        }
    }
}

/// Static description of a device a backend can open.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceInfo {
    /// Position in the backend's enumeration order.
    pub index: usize,
    pub name: String,
    pub kind: DeviceKind,
    /// Largest work-group the device accepts.
    pub max_group_size: usize,
    /// Largest buffer, in u32 elements.
    pub max_buffer_elements: usize,
}

/// Which device to open. Both fields unset means "default policy": the first
/// GPU if there is one, otherwise the first device of any kind.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeviceCriteria {
    pub index: Option<usize>,
    pub kind: Option<DeviceKind>,
}

impl DeviceCriteria {
    pub fn any() -> Self {
        Self::default()
    }

    pub fn with_index(mut self, index: usize) -> Self {
        self.index = Some(index);
        self
    }

    pub fn with_kind(mut self, kind: DeviceKind) -> Self {
        self.kind = Some(kind);
        self
    }

    /// Whether `device` satisfies every constraint that is set.
    pub fn matches(&self, device: &DeviceInfo) -> bool {
        self.index.is_none_or(|i| device.index == i) && self.kind.is_none_or(|k| device.kind == k)
    }

    /// Pick exactly one device out of `devices`.
    pub fn resolve<'a>(&self, devices: &'a [DeviceInfo]) -> Result<&'a DeviceInfo> {
        let found = if self.index.is_none() && self.kind.is_none() {
            devices
                .iter()
                .find(|d| d.kind == DeviceKind::Gpu)
                .or_else(|| devices.first())
        } else {
            devices.iter().find(|d| self.matches(d))
        };
        found.ok_or_else(|| BackendError::NoDeviceFound {
            criteria: self.to_string(),
        })
    }
}

impl fmt::Display for DeviceCriteria {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.index, self.kind) {
            (None, None) => write!(f, "default policy (first gpu, else first device)"),
            (Some(i), None) => write!(f, "device #{i}"),
            (None, Some(k)) => write!(f, "first {k} device"),
            (Some(i), Some(k)) => write!(f, "{k} device #{i}"),
        }
    }
}

/// Device-resident memory holding `len()` u32 elements.
pub trait DeviceBuffer {
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Device selection, memory, compilation and dispatch behind one interface.
pub trait ComputeBackend: Sized {
    type Buffer: DeviceBuffer;
    type Kernel;

    /// Short backend name for reports (e.g. "host", "metal").
    fn backend_name(&self) -> &'static str;

    /// Enumerate the devices this backend can open.
    fn devices() -> Result<Vec<DeviceInfo>>;

    /// Open the device chosen by `criteria`.
    fn select(criteria: &DeviceCriteria) -> Result<Self>;

    /// The device this backend instance is bound to.
    fn device(&self) -> &DeviceInfo;

    /// Reserve a zero-initialised buffer of `len` elements.
    fn allocate_buffer(&self, len: usize) -> Result<Self::Buffer>;

    /// Copy `data` into the buffer starting at element `offset`.
    fn upload(&self, buffer: &Self::Buffer, data: &[u32], offset: usize) -> Result<()>;

    /// Copy `out.len()` elements starting at element `offset` into `out`.
    fn download(&self, buffer: &Self::Buffer, out: &mut [u32], offset: usize) -> Result<()>;

    /// Compile `source` and look up `entry_point` in it.
    fn compile_kernel(&self, source: &KernelSource, entry_point: &str) -> Result<Self::Kernel>;

    /// Launch `kernel` over `partition` with the buffer bound as argument 0
    /// and `scalars` as arguments 1.. Blocks until the device is done.
    fn dispatch(
        &self,
        kernel: &Self::Kernel,
        buffer: &Self::Buffer,
        partition: WorkPartition,
        scalars: &[u32],
    ) -> Result<()>;
}

/// Bounds check shared by every backend's transfer path.
pub fn check_transfer(offset: usize, count: usize, len: usize) -> Result<()> {
    match offset.checked_add(count) {
        Some(end) if end <= len => Ok(()),
        _ => Err(BackendError::OutOfBounds { offset, count, len }),
    }
}
