use ndarray::ArrayView1;

use crate::core::Float;

pub fn argmin(ratios: &ArrayView1<Float>) -> usize {
    ratios
        .iter()
        .enumerate()
        .fold((0, Float::MAX), |(min_idx, min_val), (idx, &val)| {
            if val < min_val {
                (idx, val)
            } else {
                (min_idx, min_val)
            }
        })
        .0
}

/// Sum an iterator of values using Kahan-Babuska compensated summation.
///
/// Used for accumulating cumulative optical path lengths over long ray
/// paths, where naive summation would otherwise let rounding error grow
/// with the number of surfaces traversed.
pub fn kahan_sum<I: IntoIterator<Item = Float>>(values: I) -> Float {
    let mut sum = 0.0;
    let mut c = 0.0;
    for value in values {
        let t = sum + value;
        c += if sum.abs() >= value.abs() {
            (sum - t) + value
        } else {
            (value - t) + sum
        };
        sum = t;
    }
    sum + c
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_kahan_sum_matches_naive_for_small_inputs() {
        let values = [1.0, 2.0, 3.0, 4.0];
        assert_eq!(kahan_sum(values), 10.0);
    }

    #[test]
    fn test_kahan_sum_reduces_error_on_ill_conditioned_input() {
        let mut values = vec![1e16, 1.0, -1e16];
        let naive: Float = values.iter().sum();
        assert_eq!(naive, 0.0);

        values.push(0.0);
        let compensated = kahan_sum(values);
        assert_eq!(compensated, 1.0);
    }
}
