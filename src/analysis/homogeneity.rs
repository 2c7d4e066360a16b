//! Train/evaluation homogeneity analysis.
//!
//! Compares the evaluation window of one category with its training window.
//! Each step runs only when its precondition holds; a failed precondition
//! leaves the corresponding report field absent instead of raising or
//! reporting a placeholder zero.
//!
//! Steps, in order:
//!   1. basic evaluation-window statistics (always)
//!   2. mean / std / median shift (both windows non-empty)
//!   3. Student t-test on the means (both windows >= 30 rows)
//!   4. coefficient of variation (both windows non-empty)
//!   5. weekday-profile correlation (both windows > 7 rows)

use crate::analysis::seasonality::{profile_correlation, weekday_profile};
use crate::analysis::stats;
use crate::model::{
    DistributionShift, EvalSummary, HomogeneityReport, MetricShift, SignificanceTest,
    VariationCoefficients, Window,
};

/// Minimum rows in each window before the t-test is run.
pub const MIN_SIGNIFICANCE_ROWS: usize = 30;

/// Each window needs strictly more rows than this for the weekday
/// correlation.
pub const MIN_SEASONALITY_ROWS: usize = 7;

/// p-values below this flag a significant difference in means.
pub const SIGNIFICANCE_LEVEL: f64 = 0.05;

/// Evaluation rows echoed into the report preview.
pub const PREVIEW_ROWS: usize = 5;

// ---------------------------------------------------------------------------
// Analysis
// ---------------------------------------------------------------------------

/// Runs the full homogeneity check for one category.
pub fn analyze(train: &Window, eval: &Window) -> HomogeneityReport {
    let train_values = train.values();
    let eval_values = eval.values();
    let both_present = !train_values.is_empty() && !eval_values.is_empty();

    HomogeneityReport {
        train_count: train_values.len(),
        eval_count: eval_values.len(),
        eval_summary: summarize_eval(eval),
        shift: if both_present {
            distribution_shift(&train_values, &eval_values)
        } else {
            None
        },
        significance: significance(&train_values, &eval_values),
        variation: if both_present {
            variation(&train_values, &eval_values)
        } else {
            None
        },
        weekday_correlation: weekday_correlation(train, eval),
    }
}

/// Step 1: count, sum, extremes, central tendency and zero days of the
/// evaluation window.
pub fn summarize_eval(eval: &Window) -> EvalSummary {
    let values = eval.values();
    let zero_days = values.iter().filter(|v| **v == 0.0).count();

    EvalSummary {
        count: values.len(),
        sum: values.iter().sum(),
        min: stats::min(&values),
        max: stats::max(&values),
        mean: stats::mean(&values),
        std: stats::sample_std(&values),
        median: stats::median(&values),
        zero_days,
        zero_fraction: if values.is_empty() {
            None
        } else {
            Some(zero_days as f64 / values.len() as f64)
        },
        preview: eval.observations.iter().take(PREVIEW_ROWS).copied().collect(),
    }
}

/// Step 2. `None` if either side is empty.
pub fn distribution_shift(train: &[f64], eval: &[f64]) -> Option<DistributionShift> {
    let mean = metric_shift(stats::mean(train)?, stats::mean(eval)?);
    let median = metric_shift(stats::median(train)?, stats::median(eval)?);
    let std = match (stats::sample_std(train), stats::sample_std(eval)) {
        (Some(t), Some(e)) => Some(metric_shift(t, e)),
        _ => None,
    };
    let variance_ratio = match (stats::sample_variance(train), stats::sample_variance(eval)) {
        (Some(t), Some(e)) if t > 0.0 => Some(e / t),
        _ => None,
    };
    Some(DistributionShift {
        mean,
        std,
        median,
        variance_ratio,
    })
}

fn metric_shift(train: f64, eval: f64) -> MetricShift {
    MetricShift {
        train,
        eval,
        delta: eval - train,
        delta_pct: stats::percent_change(train, eval),
    }
}

/// Step 3. Absent below the size threshold and when both windows hold the
/// same constant. Two different constants are always significant.
pub fn significance(train: &[f64], eval: &[f64]) -> Option<SignificanceTest> {
    if train.len() < MIN_SIGNIFICANCE_ROWS || eval.len() < MIN_SIGNIFICANCE_ROWS {
        return None;
    }
    let test = stats::student_t_test(train, eval)?;
    Some(SignificanceTest {
        t_statistic: test.t_statistic,
        degrees_of_freedom: test.degrees_of_freedom,
        p_value: test.p_value,
        significant: test.p_value < SIGNIFICANCE_LEVEL,
    })
}

/// Step 4. `None` if either side is empty.
pub fn variation(train: &[f64], eval: &[f64]) -> Option<VariationCoefficients> {
    Some(VariationCoefficients {
        train_cv: stats::coefficient_of_variation(stats::sample_std(train), stats::mean(train)?),
        eval_cv: stats::coefficient_of_variation(stats::sample_std(eval), stats::mean(eval)?),
    })
}

/// Step 5.
pub fn weekday_correlation(train: &Window, eval: &Window) -> Option<f64> {
    if train.len() <= MIN_SEASONALITY_ROWS || eval.len() <= MIN_SEASONALITY_ROWS {
        return None;
    }
    profile_correlation(
        &weekday_profile(&train.observations),
        &weekday_profile(&eval.observations),
    )
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
