//! Pipeline State Object (PSO) cache for runtime-compiled kernels.
//!
//! Libraries are compiled once per kernel source, keyed by name and a
//! fingerprint of the text; pipelines add the entry point to that key. Compilation failures are returned, never
//! panicked on, so a bad kernel aborts only the configuration that asked for it.

use std::collections::HashMap;

use objc2::rc::Retained;
use objc2::runtime::ProtocolObject;
use objc2_foundation::NSString;
use objc2_metal::{MTLComputePipelineState, MTLDevice, MTLLibrary};

use crate::error::{BackendError, Result};
use crate::kernel::KernelSource;

type LibraryKey = (String, u64);

fn library_key(source: &KernelSource) -> LibraryKey {
    (source.name().to_string(), source.fingerprint())
}

/// Cache of compiled Metal libraries and compute pipeline states.
#[derive(Default)]
pub struct PsoCache {
    libraries: HashMap<LibraryKey, Retained<ProtocolObject<dyn MTLLibrary>>>,
    pipelines: HashMap<(LibraryKey, String), Retained<ProtocolObject<dyn MTLComputePipelineState>>>,
}

impl PsoCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get or compile the PSO for `entry_point` in `source`.
    pub fn get_or_create(
        &mut self,
        device: &ProtocolObject<dyn MTLDevice>,
        source: &KernelSource,
        entry_point: &str,
    ) -> Result<Retained<ProtocolObject<dyn MTLComputePipelineState>>> {
        let key = (library_key(source), entry_point.to_string());
        if let Some(pso) = self.pipelines.get(&key) {
            return Ok(pso.clone());
        }

        let library = self.library(device, source, entry_point)?;
        let fn_name = NSString::from_str(entry_point);
        let function = library
            .newFunctionWithName(&fn_name)
            .ok_or_else(|| BackendError::Compilation {
                entry_point: entry_point.to_string(),
                diagnostic: format!("function not found in library '{}'", source.name()),
            })?;

        let pso = device
            .newComputePipelineStateWithFunction_error(&function)
            .map_err(|e| BackendError::Compilation {
                entry_point: entry_point.to_string(),
                diagnostic: format!("PSO creation failed: {}", e.localizedDescription()),
            })?;

        self.pipelines.insert(key, pso.clone());
        Ok(pso)
    }

    fn library(
        &mut self,
        device: &ProtocolObject<dyn MTLDevice>,
        source: &KernelSource,
        entry_point: &str,
    ) -> Result<Retained<ProtocolObject<dyn MTLLibrary>>> {
        let key = library_key(source);
        if let Some(lib) = self.libraries.get(&key) {
            return Ok(lib.clone());
        }
        let ns_source = NSString::from_str(source.text());
        let library = device
            .newLibraryWithSource_options_error(&ns_source, None)
            .map_err(|e| BackendError::Compilation {
                entry_point: entry_point.to_string(),
                diagnostic: e.localizedDescription().to_string(),
            })?;
        tracing::debug!(source = source.name(), "compiled Metal library");
        self.libraries.insert(key, library.clone());
        Ok(library)
    }
}
