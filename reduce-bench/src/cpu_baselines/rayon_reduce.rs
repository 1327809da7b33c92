//! Rayon-based parallel CPU reduction.

use rayon::prelude::*;

use crate::functions::ElementFunction;

/// Parallel sum of `function` over `data`, modulo 2^32.
///
/// Wrapping addition is associative and commutative, so the result equals
/// the serial fold however rayon splits the work.
pub fn par_sum_u32(data: &[u32], function: ElementFunction) -> u32 {
    data.par_iter()
        .map(|&x| function.apply(x))
        .reduce(|| 0u32, u32::wrapping_add)
}
