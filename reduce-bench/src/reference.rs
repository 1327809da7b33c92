//! Reference engine: the serial ground truth every other path is checked
//! against.

use crate::functions::ElementFunction;

/// Serial sum of `function` over `input`, modulo 2^32.
pub fn compute_reference(input: &[u32], function: ElementFunction) -> u32 {
    input
        .iter()
        .fold(0u32, |acc, &x| acc.wrapping_add(function.apply(x)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_is_zero() {
        assert_eq!(compute_reference(&[], ElementFunction::Identity), 0);
        assert_eq!(compute_reference(&[], ElementFunction::ExpTrig), 0);
    }

    #[test]
    fn test_identity_sum() {
        let data: Vec<u32> = (1..=100).collect();
        assert_eq!(compute_reference(&data, ElementFunction::Identity), 5050);
    }

    #[test]
    fn test_wraps_modulo_2_32() {
        let data = [u32::MAX, 2, u32::MAX];
        assert_eq!(
            compute_reference(&data, ElementFunction::Identity),
            u32::MAX.wrapping_add(2).wrapping_add(u32::MAX)
        );
    }

    #[test]
    fn test_zero_inputs_through_exp_trig() {
        let data = vec![0u32; 1000];
        assert_eq!(compute_reference(&data, ElementFunction::ExpTrig), 1000);
    }
}
