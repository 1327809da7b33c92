//! Kernel sources for each workload.
//!
//! The Metal text is embedded at build time. Each entry point is registered
//! together with the host lane program that emulates it.

use reduce_primitives::KernelSource;

use crate::functions::ElementFunction;
use crate::strategy::{SmartReduction, StupidReduction};

pub const SUM_METAL: &str = include_str!("../shaders/sum.metal");
pub const COMPLEX_FUNCTION_METAL: &str = include_str!("../shaders/complex_function.metal");

/// Kernel source holding `<prefix>_stupid` and `<prefix>_smart`.
pub fn reduction_source(prefix: &str, text: &str, function: ElementFunction) -> KernelSource {
    KernelSource::new(prefix, text)
        .with_host_program(format!("{prefix}_stupid"), 2, StupidReduction { function })
        .with_host_program(format!("{prefix}_smart"), 1, SmartReduction { function })
}

pub fn sum_source() -> KernelSource {
    reduction_source("sum", SUM_METAL, ElementFunction::Identity)
}

pub fn complex_function_source() -> KernelSource {
    reduction_source(
        "complex_function",
        COMPLEX_FUNCTION_METAL,
        ElementFunction::ExpTrig,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use reduce_primitives::declared_entry_points;

    #[test]
    fn test_sum_source_declares_both_strategies() {
        let src = sum_source();
        assert_eq!(declared_entry_points(src.text()), vec!["sum_stupid", "sum_smart"]);
        assert_eq!(src.entry("sum_stupid").unwrap().scalar_args(), 2);
        assert_eq!(src.entry("sum_smart").unwrap().scalar_args(), 1);
    }

    #[test]
    fn test_complex_source_declares_both_strategies() {
        let src = complex_function_source();
        assert!(src.declares("complex_function_stupid"));
        assert!(src.declares("complex_function_smart"));
        assert!(src.entry("complex_function_smart").unwrap().has_host_program());
        assert!(!src.declares("f"));
    }
}
