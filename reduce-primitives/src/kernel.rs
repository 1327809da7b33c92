//! Kernel sources and the host-side lane program model.
//!
//! A [`KernelSource`] carries the kernel text a native backend compiles plus,
//! per entry point, the scalar argument count and an optional
//! [`HostProgram`] the host-emulated backend runs in its place.

use std::cell::Cell;
use std::collections::hash_map::DefaultHasher;
use std::collections::HashMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

/// A kernel executed one work-group at a time by the host backend.
///
/// Lanes of a group run in lock-step phases: a program expresses a barrier
/// by finishing one loop over all lanes before starting the next.
pub trait HostProgram: Send + Sync {
    fn run_group(&self, group: &mut WorkGroup<'_>);
}

/// Execution context for one work-group on the host backend.
pub struct WorkGroup<'a> {
    group_id: usize,
    group_size: usize,
    memory: &'a [AtomicU32],
    scalars: &'a [u32],
    local: &'a mut [u32],
    fault: Cell<Option<LaneFault>>,
}

/// First out-of-range access made by a work-group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub(crate) enum LaneFault {
    /// Global memory element past the end of the buffer.
    Global(usize),
    /// Scalar argument the dispatch did not supply.
    Scalar(usize),
}

impl<'a> WorkGroup<'a> {
    pub(crate) fn new(
        group_id: usize,
        group_size: usize,
        memory: &'a [AtomicU32],
        scalars: &'a [u32],
        local: &'a mut [u32],
    ) -> Self {
        Self {
            group_id,
            group_size,
            memory,
            scalars,
            local,
            fault: Cell::new(None),
        }
    }

    pub fn group_id(&self) -> usize {
        self.group_id
    }

    pub fn group_size(&self) -> usize {
        self.group_size
    }

    /// Global lane index of local lane `lid`.
    pub fn global_id(&self, lid: usize) -> usize {
        self.group_id * self.group_size + lid
    }

    /// Scalar kernel argument `index`, counted after the buffer binding.
    /// Reading past the supplied scalars returns 0 and faults the dispatch.
    pub fn scalar(&self, index: usize) -> u32 {
        match self.scalars.get(index) {
            Some(&value) => value,
            None => {
                self.record_fault(LaneFault::Scalar(index));
                0
            }
        }
    }

    /// Read one element of global memory. Out-of-range reads return 0 and
    /// mark the dispatch as faulted.
    pub fn load(&self, index: usize) -> u32 {
        match self.memory.get(index) {
            Some(cell) => cell.load(Ordering::Relaxed),
            None => {
                self.record_fault(LaneFault::Global(index));
                0
            }
        }
    }

    /// Wrapping atomic add on one global element; returns the previous value.
    pub fn atomic_add(&self, index: usize, value: u32) -> u32 {
        match self.memory.get(index) {
            Some(cell) => cell.fetch_add(value, Ordering::Relaxed),
            None => {
                self.record_fault(LaneFault::Global(index));
                0
            }
        }
    }

    /// Group-local scratch memory, one u32 per lane.
    pub fn local_mut(&mut self) -> &mut [u32] {
        &mut *self.local
    }

    pub(crate) fn fault(&self) -> Option<LaneFault> {
        self.fault.get()
    }

    fn record_fault(&self, fault: LaneFault) {
        if self.fault.get().is_none() {
            self.fault.set(Some(fault));
        }
    }
}

/// Per-entry-point metadata registered on a [`KernelSource`].
#[derive(Clone)]
pub struct EntryPoint {
    pub(crate) scalar_args: usize,
    pub(crate) host_program: Option<Arc<dyn HostProgram>>,
}

impl EntryPoint {
    pub fn scalar_args(&self) -> usize {
        self.scalar_args
    }

    pub fn has_host_program(&self) -> bool {
        self.host_program.is_some()
    }
}

/// Kernel text plus the entry points callers may compile from it.
#[derive(Clone)]
pub struct KernelSource {
    name: String,
    text: String,
    entries: HashMap<String, EntryPoint>,
}

impl KernelSource {
    pub fn new(name: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            text: text.into(),
            entries: HashMap::new(),
        }
    }

    /// Register `entry_point` with its scalar argument count and the lane
    /// program the host backend executes for it.
    pub fn with_host_program(
        mut self,
        entry_point: impl Into<String>,
        scalar_args: usize,
        program: impl HostProgram + 'static,
    ) -> Self {
        self.entries.insert(
            entry_point.into(),
            EntryPoint {
                scalar_args,
                host_program: Some(Arc::new(program)),
            },
        );
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Hash of the name and kernel text. Two sources sharing a name but not
    /// their text get different fingerprints.
    pub fn fingerprint(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        self.name.hash(&mut hasher);
        self.text.hash(&mut hasher);
        hasher.finish()
    }

    /// Registered metadata for `entry_point`, if any.
    pub fn entry(&self, entry_point: &str) -> Option<&EntryPoint> {
        self.entries.get(entry_point)
    }

    /// Whether the kernel text declares `entry_point`.
    pub fn declares(&self, entry_point: &str) -> bool {
        declared_entry_points(&self.text).contains(&entry_point)
    }
}

impl fmt::Debug for KernelSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut entries: Vec<&str> = self.entries.keys().map(String::as_str).collect();
        entries.sort_unstable();
        f.debug_struct("KernelSource")
            .field("name", &self.name)
            .field("text_len", &self.text.len())
            .field("entries", &entries)
            .finish()
    }
}

/// Names of every `kernel void <name>(` declaration in `text`, in order.
/// Line comments are ignored.
pub fn declared_entry_points(text: &str) -> Vec<&str> {
    let tokens: Vec<&str> = text
        .lines()
        .map(|line| line.split("//").next().unwrap_or(""))
        .flat_map(|line| line.split(|c: char| !(c.is_ascii_alphanumeric() || c == '_')))
        .filter(|t| !t.is_empty())
        .collect();

    let mut names = Vec::new();
    for window in tokens.windows(3) {
        if window[0] == "kernel" && window[1] == "void" && !names.contains(&window[2]) {
            names.push(window[2]);
        }
    }
    names
}
