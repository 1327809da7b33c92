//! Metal backend: device, command queue, runtime-compiled kernels.
//!
//! Kernel text is compiled with `newLibraryWithSource` at
//! `compile_kernel` time, so a broken kernel surfaces as a
//! [`BackendError::Compilation`] carrying the Metal compiler diagnostic.

use std::cell::RefCell;

use objc2::rc::Retained;
use objc2::runtime::ProtocolObject;
use objc2_metal::{
    MTLBuffer, MTLCommandBuffer, MTLCommandBufferStatus, MTLCommandEncoder, MTLCommandQueue,
    MTLComputePipelineState, MTLCopyAllDevices, MTLDevice,
};

use crate::backend::{check_transfer, ComputeBackend, DeviceBuffer, DeviceCriteria, DeviceInfo, DeviceKind};
use crate::dispatch::{alloc_zeroed_buffer, encode_groups_1d, read_elements, write_elements};
use crate::error::{BackendError, Result};
use crate::kernel::KernelSource;
use crate::partition::WorkPartition;
use crate::pso_cache::PsoCache;

/// Shared-mode Metal buffer of u32 elements.
pub struct MetalBuffer {
    buffer: Retained<ProtocolObject<dyn MTLBuffer>>,
    len: usize,
}

impl DeviceBuffer for MetalBuffer {
    fn len(&self) -> usize {
        self.len
    }
}

/// Compiled compute pipeline for one entry point.
pub struct MetalKernel {
    entry_point: String,
    scalar_args: Option<usize>,
    pso: Retained<ProtocolObject<dyn MTLComputePipelineState>>,
}

/// Compute backend bound to one Metal device.
pub struct MetalBackend {
    device: Retained<ProtocolObject<dyn MTLDevice>>,
    queue: Retained<ProtocolObject<dyn MTLCommandQueue>>,
    info: DeviceInfo,
    pso_cache: RefCell<PsoCache>,
}

impl MetalBackend {
    fn all_devices() -> Vec<Retained<ProtocolObject<dyn MTLDevice>>> {
        MTLCopyAllDevices().iter().collect()
    }

    fn describe(index: usize, device: &ProtocolObject<dyn MTLDevice>) -> DeviceInfo {
        DeviceInfo {
            index,
            name: device.name().to_string(),
            kind: DeviceKind::Gpu,
            max_group_size: device.maxThreadsPerThreadgroup().width,
            max_buffer_elements: device.maxBufferLength() / std::mem::size_of::<u32>(),
        }
    }
}

impl ComputeBackend for MetalBackend {
    type Buffer = MetalBuffer;
    type Kernel = MetalKernel;

    fn backend_name(&self) -> &'static str {
        "metal"
    }

    fn devices() -> Result<Vec<DeviceInfo>> {
        Ok(Self::all_devices()
            .iter()
            .enumerate()
            .map(|(i, d)| Self::describe(i, d))
            .collect())
    }

    fn select(criteria: &DeviceCriteria) -> Result<Self> {
        let devices = Self::all_devices();
        let infos: Vec<DeviceInfo> = devices
            .iter()
            .enumerate()
            .map(|(i, d)| Self::describe(i, d))
            .collect();
        let info = criteria.resolve(&infos)?.clone();
        let device = devices[info.index].clone();

        let queue = device
            .newCommandQueue()
            .ok_or_else(|| BackendError::BackendInit("failed to create command queue".into()))?;

        tracing::debug!(device = %info.name, "selected Metal device");
        Ok(Self {
            device,
            queue,
            info,
            pso_cache: RefCell::new(PsoCache::new()),
        })
    }

    fn device(&self) -> &DeviceInfo {
        &self.info
    }

    fn allocate_buffer(&self, len: usize) -> Result<MetalBuffer> {
        if len == 0 || len > self.info.max_buffer_elements {
            return Err(BackendError::Allocation {
                requested: len,
                reason: format!(
                    "size must be in 1..={} elements",
                    self.info.max_buffer_elements
                ),
            });
        }
        let buffer = alloc_zeroed_buffer(&self.device, len)?;
        Ok(MetalBuffer { buffer, len })
    }

    fn upload(&self, buffer: &MetalBuffer, data: &[u32], offset: usize) -> Result<()> {
        check_transfer(offset, data.len(), buffer.len)?;
        // SAFETY: bounds checked above; dispatch is synchronous so no GPU
        // work is in flight on this buffer.
        unsafe { write_elements(&buffer.buffer, data, offset) };
        Ok(())
    }

    fn download(&self, buffer: &MetalBuffer, out: &mut [u32], offset: usize) -> Result<()> {
        check_transfer(offset, out.len(), buffer.len)?;
        // SAFETY: as for upload.
        unsafe { read_elements(&buffer.buffer, out, offset) };
        Ok(())
    }

    fn compile_kernel(&self, source: &KernelSource, entry_point: &str) -> Result<MetalKernel> {
        let pso = self
            .pso_cache
            .borrow_mut()
            .get_or_create(&self.device, source, entry_point)?;
        Ok(MetalKernel {
            entry_point: entry_point.to_string(),
            scalar_args: source.entry(entry_point).map(|e| e.scalar_args()),
            pso,
        })
    }

    fn dispatch(
        &self,
        kernel: &MetalKernel,
        buffer: &MetalBuffer,
        partition: WorkPartition,
        scalars: &[u32],
    ) -> Result<()> {
        partition.validate()?;
        let max_threads = kernel.pso.maxTotalThreadsPerThreadgroup();
        if partition.group_size() > max_threads {
            return Err(BackendError::Dispatch(format!(
                "group size {} exceeds pipeline limit {}",
                partition.group_size(),
                max_threads
            )));
        }
        if let Some(expected) = kernel.scalar_args {
            if expected != scalars.len() {
                return Err(BackendError::Dispatch(format!(
                    "'{}' takes {} scalar arguments, got {}",
                    kernel.entry_point,
                    expected,
                    scalars.len()
                )));
            }
        }
        if partition.total_work_items() == 0 {
            return Ok(());
        }

        let cmd_buf = self
            .queue
            .commandBuffer()
            .ok_or_else(|| BackendError::Dispatch("failed to create command buffer".into()))?;
        let encoder = cmd_buf
            .computeCommandEncoder()
            .ok_or_else(|| BackendError::Dispatch("failed to create compute encoder".into()))?;

        encode_groups_1d(&encoder, &kernel.pso, &buffer.buffer, scalars, partition);

        encoder.endEncoding();
        cmd_buf.commit();
        cmd_buf.waitUntilCompleted();

        if cmd_buf.status() == MTLCommandBufferStatus::Error {
            let reason = cmd_buf
                .error()
                .map(|e| e.localizedDescription().to_string())
                .unwrap_or_else(|| "command buffer failed".to_string());
            return Err(BackendError::Dispatch(reason));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_source_is_compilation_error() {
        let Ok(backend) = MetalBackend::select(&DeviceCriteria::any()) else {
            return;
        };
        let source = KernelSource::new("broken", "kernel void bad_kernel() { this_is_invalid_code; }");
        let err = backend.compile_kernel(&source, "bad_kernel").err().unwrap();
        assert!(matches!(err, BackendError::Compilation { .. }));
    }
}
