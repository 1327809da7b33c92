//! The two benchmarked reductions.

use std::fmt;

use serde::{Deserialize, Serialize};

use reduce_primitives::KernelSource;

use crate::data_gen::DataGenerator;
use crate::functions::ElementFunction;
use crate::kernels;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Workload {
    /// Plain sum of random inputs.
    Sum,
    /// Sum of `e^(cos(x) * sin(2x))` over zeroed inputs.
    ComplexFunction,
}

impl Workload {
    pub const ALL: [Workload; 2] = [Workload::Sum, Workload::ComplexFunction];

    pub fn name(self) -> &'static str {
        match self {
            Workload::Sum => "sum",
            Workload::ComplexFunction => "complex",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "sum" => Some(Workload::Sum),
            "complex" | "complex_function" => Some(Workload::ComplexFunction),
            _ => None,
        }
    }

    pub fn function(self) -> ElementFunction {
        match self {
            Workload::Sum => ElementFunction::Identity,
            Workload::ComplexFunction => ElementFunction::ExpTrig,
        }
    }

    pub fn ops_per_element(self) -> u32 {
        self.function().ops_per_element()
    }

    pub fn default_iterations(self) -> u32 {
        match self {
            Workload::Sum => 10,
            Workload::ComplexFunction => 5,
        }
    }

    /// Input data of `n` elements. The complex workload does not draw from
    /// the generator, so sum inputs stay the same whichever workloads run.
    pub fn generate_input(self, n: usize, gen: &mut DataGenerator) -> Vec<u32> {
        match self {
            Workload::Sum => gen.summable_u32(n),
            Workload::ComplexFunction => vec![0; n],
        }
    }

    pub fn kernel_source(self) -> KernelSource {
        match self {
            Workload::Sum => kernels::sum_source(),
            Workload::ComplexFunction => kernels::complex_function_source(),
        }
    }
}

impl fmt::Display for Workload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_name_round_trip() {
        for w in Workload::ALL {
            assert_eq!(Workload::from_name(w.name()), Some(w));
        }
        assert_eq!(Workload::from_name("SUM"), Some(Workload::Sum));
        assert_eq!(Workload::from_name("scan"), None);
    }

    #[test]
    fn test_defaults() {
        assert_eq!(Workload::Sum.default_iterations(), 10);
        assert_eq!(Workload::ComplexFunction.default_iterations(), 5);
        assert_eq!(Workload::Sum.ops_per_element(), 1);
        assert_eq!(Workload::ComplexFunction.ops_per_element(), 5);
    }

    #[test]
    fn test_inputs() {
        let mut gen = DataGenerator::new(42);
        let sum = Workload::Sum.generate_input(1000, &mut gen);
        assert_eq!(sum.len(), 1000);
        assert!(sum.iter().all(|&v| v <= u32::MAX / 1000));

        let complex = Workload::ComplexFunction.generate_input(1000, &mut gen);
        assert!(complex.iter().all(|&v| v == 0));
    }
}
