//! Metal buffer and compute-encoder helpers.

use std::ffi::c_void;
use std::ptr::NonNull;

use objc2::rc::Retained;
use objc2::runtime::ProtocolObject;
use objc2_metal::{
    MTLBuffer, MTLComputeCommandEncoder, MTLComputePipelineState, MTLDevice, MTLResourceOptions,
    MTLSize,
};

use crate::error::{BackendError, Result};
use crate::partition::WorkPartition;

/// Allocate a zeroed StorageModeShared buffer of `len` u32 elements.
pub fn alloc_zeroed_buffer(
    device: &ProtocolObject<dyn MTLDevice>,
    len: usize,
) -> Result<Retained<ProtocolObject<dyn MTLBuffer>>> {
    let bytes = len
        .checked_mul(std::mem::size_of::<u32>())
        .ok_or_else(|| BackendError::Allocation {
            requested: len,
            reason: "byte size overflows usize".into(),
        })?;
    let buffer = device
        .newBufferWithLength_options(bytes, MTLResourceOptions::StorageModeShared)
        .ok_or_else(|| BackendError::Allocation {
            requested: len,
            reason: "newBufferWithLength returned nil".into(),
        })?;
    // SAFETY: the buffer is shared-mode and exactly `bytes` long.
    unsafe {
        std::ptr::write_bytes(buffer.contents().as_ptr() as *mut u8, 0, bytes);
    }
    Ok(buffer)
}

/// Copy `data` into the buffer at element `offset`.
///
/// # Safety
/// `offset + data.len()` must not exceed the buffer's element count and no
/// GPU work may be writing the buffer concurrently.
pub unsafe fn write_elements(buffer: &ProtocolObject<dyn MTLBuffer>, data: &[u32], offset: usize) {
    let dst = (buffer.contents().as_ptr() as *mut u32).add(offset);
    std::ptr::copy_nonoverlapping(data.as_ptr(), dst, data.len());
}

/// Copy `out.len()` elements starting at element `offset` into `out`.
///
/// # Safety
/// Same bounds and synchronisation requirements as [`write_elements`].
pub unsafe fn read_elements(buffer: &ProtocolObject<dyn MTLBuffer>, out: &mut [u32], offset: usize) {
    let src = (buffer.contents().as_ptr() as *const u32).add(offset);
    std::ptr::copy_nonoverlapping(src, out.as_mut_ptr(), out.len());
}

/// Encode one 1D launch: pipeline, buffer at index 0, each scalar via
/// setBytes at index 1.., then `group_count` threadgroups of `group_size`.
pub fn encode_groups_1d(
    encoder: &ProtocolObject<dyn MTLComputeCommandEncoder>,
    pipeline: &ProtocolObject<dyn MTLComputePipelineState>,
    buffer: &ProtocolObject<dyn MTLBuffer>,
    scalars: &[u32],
    partition: WorkPartition,
) {
    encoder.setComputePipelineState(pipeline);

    unsafe {
        encoder.setBuffer_offset_atIndex(Some(buffer), 0, 0);
        for (i, scalar) in scalars.iter().enumerate() {
            let ptr = NonNull::from(scalar).cast::<c_void>();
            encoder.setBytes_length_atIndex(ptr, std::mem::size_of::<u32>(), i + 1);
        }
    }

    let grid_size = MTLSize {
        width: partition.group_count(),
        height: 1,
        depth: 1,
    };
    let tg_size = MTLSize {
        width: partition.group_size(),
        height: 1,
        depth: 1,
    };

    encoder.dispatchThreadgroups_threadsPerThreadgroup(grid_size, tg_size);
}
