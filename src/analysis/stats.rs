/// Descriptive statistics and the two-sample tests used by the
/// homogeneity check.
///
/// Every function returns `None` instead of NaN when its result is
/// undefined for the input (empty slice, zero variance, ...). Standard
/// deviations use the sample definition (denominator N - 1).

use statrs::distribution::{ContinuousCDF, StudentsT};

// ---------------------------------------------------------------------------
// Descriptive statistics
// ---------------------------------------------------------------------------

pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Sample variance. Needs at least two values.
pub fn sample_variance(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let m = mean(values)?;
    let ss: f64 = values.iter().map(|v| (v - m).powi(2)).sum();
    Some(ss / (values.len() - 1) as f64)
}

/// Sample standard deviation. Needs at least two values.
pub fn sample_std(values: &[f64]) -> Option<f64> {
    sample_variance(values).map(f64::sqrt)
}

/// Median; the mean of the two middle values for even lengths.
pub fn median(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        Some((sorted[mid - 1] + sorted[mid]) / 2.0)
    } else {
        Some(sorted[mid])
    }
}

pub fn min(values: &[f64]) -> Option<f64> {
    values.iter().copied().reduce(f64::min)
}

pub fn max(values: &[f64]) -> Option<f64> {
    values.iter().copied().reduce(f64::max)
}

/// `(eval - train) / train * 100`, or `None` when `train` is exactly zero.
pub fn percent_change(train: f64, eval: f64) -> Option<f64> {
    if train == 0.0 {
        return None;
    }
    Some((eval - train) / train * 100.0)
}

/// `std / mean * 100`, or `None` when the mean is zero or the std is
/// undefined.
pub fn coefficient_of_variation(std: Option<f64>, mean: f64) -> Option<f64> {
    match std {
        Some(std) if mean != 0.0 => Some(std / mean * 100.0),
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// Correlation
// ---------------------------------------------------------------------------

/// Spread, relative to magnitude, below which a sample counts as flat.
/// Means of a constant series differ from each other only by rounding.
const FLAT_TOLERANCE: f64 = 1e-12;

/// True when every value equals every other up to rounding error.
fn is_flat(values: &[f64]) -> bool {
    match (min(values), max(values)) {
        (Some(lo), Some(hi)) => hi - lo <= FLAT_TOLERANCE * lo.abs().max(hi.abs()),
        _ => true,
    }
}

/// Pearson correlation coefficient of two equally long samples.
///
/// `None` if the lengths differ, fewer than two pairs are given, or either
/// side is flat (zero variance up to rounding).
pub fn pearson(x: &[f64], y: &[f64]) -> Option<f64> {
    if x.len() != y.len() || x.len() < 2 || is_flat(x) || is_flat(y) {
        return None;
    }
    let mx = mean(x)?;
    let my = mean(y)?;

    let mut sxy = 0.0;
    let mut sxx = 0.0;
    let mut syy = 0.0;
    for (xv, yv) in x.iter().zip(y.iter()) {
        let dx = xv - mx;
        let dy = yv - my;
        sxy += dx * dy;
        sxx += dx * dx;
        syy += dy * dy;
    }
    if sxx <= 0.0 || syy <= 0.0 {
        return None;
    }

    let r = sxy / (sxx * syy).sqrt();
    if !r.is_finite() {
        return None;
    }
    Some(r.clamp(-1.0, 1.0))
}

// ---------------------------------------------------------------------------
// Two-sample t-test
// ---------------------------------------------------------------------------

/// Outcome of a two-sided two-sample t-test.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TTest {
    pub t_statistic: f64,
    pub degrees_of_freedom: f64,
    pub p_value: f64,
}

/// Student's two-sample t-test for independent samples (pooled variance,
/// two-sided), testing `mean(a) == mean(b)`.
///
/// `None` when either sample has fewer than two values. When both samples
/// are constant the pooled variance is zero: differing constants give
/// `t = ±inf` and `p = 0`, equal constants give `None`.
pub fn student_t_test(a: &[f64], b: &[f64]) -> Option<TTest> {
    let (n1, n2) = (a.len() as f64, b.len() as f64);
    let var1 = sample_variance(a)?;
    let var2 = sample_variance(b)?;

    let df = n1 + n2 - 2.0;
    if is_constant(a) && is_constant(b) {
        let (ca, cb) = (a[0], b[0]);
        if ca == cb {
            return None;
        }
        return Some(TTest {
            t_statistic: if ca > cb { f64::INFINITY } else { f64::NEG_INFINITY },
            degrees_of_freedom: df,
            p_value: 0.0,
        });
    }

    let pooled = ((n1 - 1.0) * var1 + (n2 - 1.0) * var2) / df;
    let std_error = (pooled * (1.0 / n1 + 1.0 / n2)).sqrt();
    if std_error.is_nan() || std_error <= 0.0 {
        return None;
    }

    let t_stat = (mean(a)? - mean(b)?) / std_error;
    let t_dist = StudentsT::new(0.0, 1.0, df).ok()?;
    // Lower tail of -|t| keeps precision for tiny p-values.
    let p_value = (2.0 * t_dist.cdf(-t_stat.abs())).min(1.0);

    Some(TTest {
        t_statistic: t_stat,
        degrees_of_freedom: df,
        p_value,
    })
}

/// Exactly constant, as opposed to `is_flat`. Computed variances of such a
/// sample can come out as a tiny positive number.
fn is_constant(values: &[f64]) -> bool {
    values.windows(2).all(|w| w[0] == w[1])
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64, tol: f64) -> bool {
        (a - b).abs() <= tol
    }

    // --- Descriptive --------------------------------------------------------

    #[test]
    fn test_empty_input_is_undefined_everywhere() {
        assert_eq!(mean(&[]), None);
        assert_eq!(sample_std(&[]), None);
        assert_eq!(median(&[]), None);
        assert_eq!(min(&[]), None);
        assert_eq!(max(&[]), None);
    }

    #[test]
    fn test_sample_std_uses_n_minus_one() {
        // Deviations from mean 5: squares sum to 32 over 8 values.
        let values = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        let std = sample_std(&values).unwrap();
        assert!(close(std, (32.0_f64 / 7.0).sqrt(), 1e-12), "got {}", std);
        assert_eq!(sample_std(&[3.0]), None, "one value has no sample std");
    }

    #[test]
    fn test_median_odd_and_even() {
        assert_eq!(median(&[3.0, 1.0, 2.0]), Some(2.0));
        assert_eq!(median(&[4.0, 1.0, 3.0, 2.0]), Some(2.5));
    }

    #[test]
    fn test_percent_change_is_undefined_for_zero_baseline() {
        assert_eq!(percent_change(0.0, 5.0), None);
        assert_eq!(percent_change(0.0, 0.0), None);
        assert_eq!(percent_change(50.0, 75.0), Some(50.0));
        assert_eq!(percent_change(80.0, 60.0), Some(-25.0));
    }

    #[test]
    fn test_coefficient_of_variation() {
        assert_eq!(coefficient_of_variation(Some(5.0), 50.0), Some(10.0));
        assert_eq!(coefficient_of_variation(Some(0.0), 0.0), None);
        assert_eq!(coefficient_of_variation(None, 10.0), None);
    }

    // --- Correlation --------------------------------------------------------

    #[test]
    fn test_pearson_perfect_and_inverse() {
        let x = [1.0, 2.0, 3.0, 4.0];
        let y = [10.0, 20.0, 30.0, 40.0];
        let z = [4.0, 3.0, 2.0, 1.0];
        assert!(close(pearson(&x, &y).unwrap(), 1.0, 1e-12));
        assert!(close(pearson(&x, &z).unwrap(), -1.0, 1e-12));
    }

    #[test]
    fn test_pearson_undefined_cases() {
        assert_eq!(pearson(&[1.0], &[2.0]), None, "single pair");
        assert_eq!(pearson(&[1.0, 2.0], &[1.0]), None, "length mismatch");
        assert_eq!(pearson(&[1.0, 2.0, 3.0], &[5.0, 5.0, 5.0]), None, "flat profile");
    }

    #[test]
    fn test_pearson_treats_rounding_noise_as_flat() {
        // Weekday means of a constant 0.1 series: equal up to the last bits.
        let noisy = [0.1, 0.1 + 1e-17, 0.30000000000000004 / 3.0, 0.4 / 4.0, 0.5 / 5.0];
        let x = [1.0, 2.0, 3.0, 4.0, 5.0];
        assert_eq!(pearson(&x, &noisy), None);
        assert_eq!(pearson(&noisy, &x), None);
        // Small but genuine variation is still correlated.
        let tiny = [1e-9, 2e-9, 3e-9, 4e-9, 5e-9];
        assert!(close(pearson(&x, &tiny).unwrap(), 1.0, 1e-9));
    }

    // --- t-test -------------------------------------------------------------
    //
    // Reference values were computed independently from the regularized
    // incomplete beta function at 30 significant digits.

    #[test]
    fn test_student_t_test_matches_reference_for_similar_samples() {
        let a: Vec<f64> = (0..30).map(|i| 10.0 + (i % 7) as f64).collect();
        let b: Vec<f64> = (0..30).map(|i| 11.0 + (i % 5) as f64).collect();
        let test = student_t_test(&a, &b).unwrap();
        assert!(close(test.t_statistic, -0.3622453856945767, 1e-9), "t = {}", test.t_statistic);
        assert_eq!(test.degrees_of_freedom, 58.0);
        assert!(close(test.p_value, 0.7184852522035056, 1e-7), "p = {}", test.p_value);
    }

    #[test]
    fn test_student_t_test_matches_reference_for_shifted_samples() {
        let a: Vec<f64> = (0..40).map(|i| 20.0 + 3.0 * (i % 4) as f64).collect();
        let b: Vec<f64> = (0..30).map(|i| 26.0 + 2.0 * (i % 3) as f64).collect();
        let test = student_t_test(&a, &b).unwrap();
        assert!(close(test.t_statistic, -5.190702864392749, 1e-9), "t = {}", test.t_statistic);
        assert_eq!(test.degrees_of_freedom, 68.0);
        let expected = 2.063555524924645e-06;
        assert!(
            (test.p_value - expected).abs() / expected < 1e-4,
            "p = {}",
            test.p_value
        );
    }

    #[test]
    fn test_identical_samples_have_p_value_one() {
        let a: Vec<f64> = (0..30).map(|i| (i % 3) as f64).collect();
        let test = student_t_test(&a, &a).unwrap();
        assert_eq!(test.t_statistic, 0.0);
        assert!(close(test.p_value, 1.0, 1e-9));
    }

    #[test]
    fn test_differing_constant_samples_are_infinitely_apart() {
        let test = student_t_test(&[100.0; 30], &[90.0; 30]).unwrap();
        assert_eq!(test.t_statistic, f64::INFINITY);
        assert_eq!(test.degrees_of_freedom, 58.0);
        assert_eq!(test.p_value, 0.0);

        let test = student_t_test(&[0.1; 31], &[0.3; 60]).unwrap();
        assert_eq!(test.t_statistic, f64::NEG_INFINITY);
        assert_eq!(test.p_value, 0.0);
    }

    #[test]
    fn test_equal_constant_samples_have_no_t_test() {
        assert_eq!(student_t_test(&[0.1; 60], &[0.1; 31]), None);
        assert_eq!(student_t_test(&[1.0], &[90.0; 30]), None, "one value has no variance");
    }

    #[test]
    fn test_one_constant_sample_still_gets_a_finite_test() {
        let a: Vec<f64> = (0..30).map(|i| 10.0 + (i % 3) as f64).collect();
        let test = student_t_test(&a, &[10.0; 30]).unwrap();
        assert!(test.t_statistic.is_finite() && test.t_statistic > 0.0);
        assert!(test.p_value > 0.0 && test.p_value < 1.0);
    }
}
