//! Pointwise element functions applied before reduction.

use serde::{Deserialize, Serialize};

/// Base of the exponential in [`ElementFunction::ExpTrig`], as the kernels
/// spell it.
pub const EXP_BASE: f32 = 2.71828;

/// A pure map from one input element to the value that gets summed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ElementFunction {
    /// f(x) = x
    Identity,
    /// f(x) = e^(cos(x) * sin(2x)), evaluated in f32 and truncated to u32.
    ExpTrig,
}

impl ElementFunction {
    #[inline]
    pub fn apply(self, x: u32) -> u32 {
        match self {
            ElementFunction::Identity => x,
            ElementFunction::ExpTrig => {
                let fx = x as f32;
                EXP_BASE.powf(fx.cos() * (2.0 * fx).sin()) as u32
            }
        }
    }

    /// Arithmetic operations per element, used for the GFlops figure.
    pub fn ops_per_element(self) -> u32 {
        match self {
            ElementFunction::Identity => 1,
            ElementFunction::ExpTrig => 5,
        }
    }
}
