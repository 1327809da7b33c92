//! Work partitioning: how many lanes to launch and how to group them.

use crate::error::{BackendError, Result};

/// Integer ceiling division. `div_up(0, d) == 0`.
///
/// # Panics
/// Panics if `divisor` is zero.
pub fn div_up(value: usize, divisor: usize) -> usize {
    value.div_ceil(divisor)
}

/// Round `value` up to the next multiple of `multiple`.
///
/// # Panics
/// Panics if `multiple` is zero.
pub fn round_up(value: usize, multiple: usize) -> usize {
    div_up(value, multiple) * multiple
}

/// Launch shape for one dispatch: `total_work_items` lanes grouped into
/// work-groups of `group_size` lanes.
///
/// A valid partition always has `group_size > 0` and
/// `total_work_items % group_size == 0`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkPartition {
    group_size: usize,
    total_work_items: usize,
}

impl WorkPartition {
    /// Build a partition from explicit sizes, rejecting shapes that are not
    /// a whole number of groups.
    pub fn new(group_size: usize, total_work_items: usize) -> Result<Self> {
        let partition = Self {
            group_size,
            total_work_items,
        };
        partition.validate()?;
        Ok(partition)
    }

    /// Smallest partition with at least `work_items` lanes.
    pub fn covering(work_items: usize, group_size: usize) -> Result<Self> {
        if group_size == 0 {
            return Err(BackendError::Dispatch("group size must be positive".into()));
        }
        Self::new(group_size, round_up(work_items, group_size))
    }

    pub fn group_size(&self) -> usize {
        self.group_size
    }

    pub fn total_work_items(&self) -> usize {
        self.total_work_items
    }

    /// Number of work-groups in the launch.
    pub fn group_count(&self) -> usize {
        self.total_work_items / self.group_size
    }

    /// Re-check the shape invariants. Backends call this before launching
    /// since a `WorkPartition` may have been built by a foreign caller.
    pub fn validate(&self) -> Result<()> {
        if self.group_size == 0 {
            return Err(BackendError::Dispatch("group size must be positive".into()));
        }
        if self.total_work_items % self.group_size != 0 {
            return Err(BackendError::Dispatch(format!(
                "{} work items is not a multiple of group size {}",
                self.total_work_items, self.group_size
            )));
        }
        Ok(())
    }
}
