//! Host-emulated accelerator.
//!
//! Executes kernels as independent work-groups on the rayon thread pool.
//! Global memory is a slice of `AtomicU32`, each group gets its own local
//! scratch memory, and lanes inside a group run in lock-step phases. The
//! backend needs no driver, so it is always available and is what the test
//! suite runs against.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use rayon::prelude::*;

use crate::backend::{check_transfer, ComputeBackend, DeviceBuffer, DeviceCriteria, DeviceInfo, DeviceKind};
use crate::error::{BackendError, Result};
use crate::kernel::{HostProgram, KernelSource, LaneFault, WorkGroup};
use crate::partition::WorkPartition;

/// Largest work-group the host device accepts.
pub const HOST_MAX_GROUP_SIZE: usize = 1024;

/// Buffers are indexed with u32 lane arithmetic on every backend.
pub const HOST_MAX_BUFFER_ELEMENTS: usize = u32::MAX as usize;

/// Global memory of the host device.
pub struct HostBuffer {
    cells: Box<[AtomicU32]>,
}

impl DeviceBuffer for HostBuffer {
    fn len(&self) -> usize {
        self.cells.len()
    }
}

/// A kernel entry point resolved against a [`KernelSource`].
#[derive(Clone)]
pub struct HostKernel {
    entry_point: String,
    scalar_args: usize,
    program: Arc<dyn HostProgram>,
}

/// Compute backend running on the host CPU.
pub struct HostBackend {
    device: DeviceInfo,
}

impl HostBackend {
    /// The single device the host backend exposes.
    pub fn host_device() -> DeviceInfo {
        DeviceInfo {
            index: 0,
            name: format!("host-emulated ({} threads)", rayon::current_num_threads()),
            kind: DeviceKind::Cpu,
            max_group_size: HOST_MAX_GROUP_SIZE,
            max_buffer_elements: HOST_MAX_BUFFER_ELEMENTS,
        }
    }

    /// Open a host device with custom limits.
    pub fn with_device(device: DeviceInfo) -> Self {
        Self { device }
    }
}

impl ComputeBackend for HostBackend {
    type Buffer = HostBuffer;
    type Kernel = HostKernel;

    fn backend_name(&self) -> &'static str {
        "host"
    }

    fn devices() -> Result<Vec<DeviceInfo>> {
        Ok(vec![Self::host_device()])
    }

    fn select(criteria: &DeviceCriteria) -> Result<Self> {
        let devices = Self::devices()?;
        let device = criteria.resolve(&devices)?.clone();
        tracing::debug!(device = %device.name, "selected host device");
        Ok(Self { device })
    }

    fn device(&self) -> &DeviceInfo {
        &self.device
    }

    fn allocate_buffer(&self, len: usize) -> Result<HostBuffer> {
        if len == 0 {
            return Err(BackendError::Allocation {
                requested: len,
                reason: "zero-sized buffer".into(),
            });
        }
        if len > self.device.max_buffer_elements {
            return Err(BackendError::Allocation {
                requested: len,
                reason: format!(
                    "exceeds device limit of {} elements",
                    self.device.max_buffer_elements
                ),
            });
        }

        let mut cells: Vec<AtomicU32> = Vec::new();
        cells
            .try_reserve_exact(len)
            .map_err(|e| BackendError::Allocation {
                requested: len,
                reason: e.to_string(),
            })?;
        cells.extend((0..len).map(|_| AtomicU32::new(0)));

        Ok(HostBuffer {
            cells: cells.into_boxed_slice(),
        })
    }

    fn upload(&self, buffer: &HostBuffer, data: &[u32], offset: usize) -> Result<()> {
        check_transfer(offset, data.len(), buffer.len())?;
        buffer.cells[offset..offset + data.len()]
            .par_iter()
            .zip(data.par_iter())
            .for_each(|(cell, &value)| cell.store(value, Ordering::Relaxed));
        Ok(())
    }

    fn download(&self, buffer: &HostBuffer, out: &mut [u32], offset: usize) -> Result<()> {
        check_transfer(offset, out.len(), buffer.len())?;
        let count = out.len();
        out.par_iter_mut()
            .zip(buffer.cells[offset..offset + count].par_iter())
            .for_each(|(slot, cell)| *slot = cell.load(Ordering::Relaxed));
        Ok(())
    }

    fn compile_kernel(&self, source: &KernelSource, entry_point: &str) -> Result<HostKernel> {
        if !source.declares(entry_point) {
            return Err(BackendError::Compilation {
                entry_point: entry_point.to_string(),
                diagnostic: format!("no kernel named '{}' in source '{}'", entry_point, source.name()),
            });
        }
        let entry = source.entry(entry_point);
        let program = entry
            .and_then(|e| e.host_program.clone())
            .ok_or_else(|| BackendError::Compilation {
                entry_point: entry_point.to_string(),
                diagnostic: format!(
                    "source '{}' registers no host lane program for this entry point",
                    source.name()
                ),
            })?;

        Ok(HostKernel {
            entry_point: entry_point.to_string(),
            scalar_args: entry.map_or(0, |e| e.scalar_args),
            program,
        })
    }

    fn dispatch(
        &self,
        kernel: &HostKernel,
        buffer: &HostBuffer,
        partition: WorkPartition,
        scalars: &[u32],
    ) -> Result<()> {
        partition.validate()?;
        let group_size = partition.group_size();
        if group_size > self.device.max_group_size {
            return Err(BackendError::Dispatch(format!(
                "group size {} exceeds device limit {}",
                group_size, self.device.max_group_size
            )));
        }
        if scalars.len() != kernel.scalar_args {
            return Err(BackendError::Dispatch(format!(
                "'{}' takes {} scalar arguments, got {}",
                kernel.entry_point,
                kernel.scalar_args,
                scalars.len()
            )));
        }

        tracing::debug!(
            entry_point = %kernel.entry_point,
            groups = partition.group_count(),
            group_size,
            "host dispatch"
        );

        let memory = &buffer.cells[..];
        let fault = (0..partition.group_count())
            .into_par_iter()
            .map_init(
                || vec![0u32; group_size],
                |local, group_id| {
                    local.fill(0);
                    let mut group = WorkGroup::new(group_id, group_size, memory, scalars, local);
                    kernel.program.run_group(&mut group);
                    group.fault()
                },
            )
            .flatten()
            .min();

        match fault {
            None => Ok(()),
            Some(LaneFault::Global(index)) => Err(BackendError::Dispatch(format!(
                "'{}' accessed global element {} outside buffer of {} elements",
                kernel.entry_point,
                index,
                buffer.len()
            ))),
            Some(LaneFault::Scalar(index)) => Err(BackendError::Dispatch(format!(
                "'{}' read scalar argument {} but only {} were supplied",
                kernel.entry_point,
                index,
                scalars.len()
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Each lane adds its global id into slot 0.
    struct AddIds;

    impl HostProgram for AddIds {
        fn run_group(&self, group: &mut WorkGroup<'_>) {
            for lid in 0..group.group_size() {
                let gid = group.global_id(lid) as u32;
                group.atomic_add(0, gid);
            }
        }
    }

    /// Reads one past the end of the buffer.
    struct ReadPastEnd;

    impl HostProgram for ReadPastEnd {
        fn run_group(&self, group: &mut WorkGroup<'_>) {
            let n = group.scalar(0) as usize;
            group.load(n + 1);
        }
    }

    /// Declared without scalars but reads one anyway.
    struct ReadMissingScalar;

    impl HostProgram for ReadMissingScalar {
        fn run_group(&self, group: &mut WorkGroup<'_>) {
            let n = group.scalar(0);
            group.atomic_add(0, n);
        }
    }

    fn source() -> KernelSource {
        KernelSource::new(
            "test",
            "kernel void add_ids(device uint* d) {}\nkernel void read_past_end(device uint* d, constant uint& n) {}\nkernel void unregistered(device uint* d) {}\nkernel void read_missing_scalar(device uint* d) {}",
        )
        .with_host_program("add_ids", 0, AddIds)
        .with_host_program("read_past_end", 1, ReadPastEnd)
        .with_host_program("read_missing_scalar", 0, ReadMissingScalar)
    }

    fn backend() -> HostBackend {
        HostBackend::select(&DeviceCriteria::any()).unwrap()
    }

    #[test]
    fn test_select_default_and_by_kind() {
        assert_eq!(backend().device().kind, DeviceKind::Cpu);
        assert!(HostBackend::select(&DeviceCriteria::any().with_kind(DeviceKind::Cpu)).is_ok());
        assert!(matches!(
            HostBackend::select(&DeviceCriteria::any().with_kind(DeviceKind::Gpu)),
            Err(BackendError::NoDeviceFound { .. })
        ));
        assert!(HostBackend::select(&DeviceCriteria::any().with_index(3)).is_err());
    }

    #[test]
    fn test_buffers_start_zeroed_and_round_trip() {
        let b = backend();
        let buf = b.allocate_buffer(8).unwrap();
        let mut out = vec![7u32; 8];
        b.download(&buf, &mut out, 0).unwrap();
        assert_eq!(out, vec![0; 8]);

        b.upload(&buf, &[1, 2, 3], 4).unwrap();
        let mut tail = vec![0u32; 4];
        b.download(&buf, &mut tail, 4).unwrap();
        assert_eq!(tail, vec![1, 2, 3, 0]);
    }

    #[test]
    fn test_transfer_bounds() {
        let b = backend();
        let buf = b.allocate_buffer(4).unwrap();
        assert!(matches!(
            b.upload(&buf, &[0; 5], 0),
            Err(BackendError::OutOfBounds { .. })
        ));
        let mut out = [0u32; 2];
        assert!(matches!(
            b.download(&buf, &mut out, 3),
            Err(BackendError::OutOfBounds { .. })
        ));
    }

    #[test]
    fn test_allocation_limits() {
        let mut device = HostBackend::host_device();
        device.max_buffer_elements = 16;
        let b = HostBackend::with_device(device);
        assert!(b.allocate_buffer(16).is_ok());
        assert!(matches!(
            b.allocate_buffer(17),
            Err(BackendError::Allocation { requested: 17, .. })
        ));
        assert!(b.allocate_buffer(0).is_err());
    }

    #[test]
    fn test_compile_rejects_unknown_and_unregistered() {
        let b = backend();
        let src = source();
        assert!(b.compile_kernel(&src, "add_ids").is_ok());
        assert!(matches!(
            b.compile_kernel(&src, "nope"),
            Err(BackendError::Compilation { .. })
        ));
        let err = b.compile_kernel(&src, "unregistered").err().unwrap();
        assert!(err.to_string().contains("no host lane program"));
    }

    #[test]
    fn test_dispatch_atomic_accumulates_every_lane() {
        let b = backend();
        let buf = b.allocate_buffer(1).unwrap();
        let kernel = b.compile_kernel(&source(), "add_ids").unwrap();
        let partition = WorkPartition::covering(10_000, 128).unwrap();
        b.dispatch(&kernel, &buf, partition, &[]).unwrap();

        let total = partition.total_work_items() as u64;
        let expected = (total * (total - 1) / 2) as u32;
        let mut out = [0u32; 1];
        b.download(&buf, &mut out, 0).unwrap();
        assert_eq!(out[0], expected);
    }

    #[test]
    fn test_dispatch_validation() {
        let b = backend();
        let buf = b.allocate_buffer(4).unwrap();
        let kernel = b.compile_kernel(&source(), "add_ids").unwrap();

        let too_big = WorkPartition::new(2048, 2048).unwrap();
        assert!(matches!(
            b.dispatch(&kernel, &buf, too_big, &[]),
            Err(BackendError::Dispatch(_))
        ));

        let ok = WorkPartition::new(4, 4).unwrap();
        let err = b.dispatch(&kernel, &buf, ok, &[1]).unwrap_err();
        assert!(err.to_string().contains("scalar arguments"));
    }

    #[test]
    fn test_dispatch_reports_fault() {
        let b = backend();
        let buf = b.allocate_buffer(4).unwrap();
        let kernel = b.compile_kernel(&source(), "read_past_end").unwrap();
        let err = b
            .dispatch(&kernel, &buf, WorkPartition::new(1, 1).unwrap(), &[4])
            .unwrap_err();
        assert!(err.to_string().contains("global element 5"));
    }

    #[test]
    fn test_dispatch_reports_missing_scalar_without_panicking() {
        let b = backend();
        let buf = b.allocate_buffer(1).unwrap();
        let kernel = b.compile_kernel(&source(), "read_missing_scalar").unwrap();
        let err = b
            .dispatch(&kernel, &buf, WorkPartition::new(4, 2).unwrap(), &[])
            .unwrap_err();
        assert_eq!(err.code(), 5);
        assert!(err.to_string().contains("scalar argument 0"));
    }
}
