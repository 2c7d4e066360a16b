/// Core data types for the modality homogeneity check.
///
/// This module defines the shared domain model imported by all other modules.
/// It contains no logic beyond small accessors, no I/O, and no external
/// dependencies beyond `chrono`, `serde` and the JSON cell type.

use chrono::NaiveDate;
use serde::Serialize;
use serde_json::Value;

// ---------------------------------------------------------------------------
// Raw input
// ---------------------------------------------------------------------------

/// One stored time series for a single category, as handed over by the
/// input store. Cells are kept as untyped JSON values; nothing has been
/// parsed or validated yet.
#[derive(Debug, Clone, PartialEq)]
pub enum RawSeries {
    /// A single value column indexed by date: `(index, value)` pairs.
    SingleColumn(Vec<(Value, Value)>),
    /// A table. The first two columns are read as date and value by
    /// position, whatever they are called.
    MultiColumn {
        columns: Vec<String>,
        rows: Vec<Vec<Value>>,
    },
    /// Stored value of a kind the normalizer cannot read (array, scalar, ...).
    /// Carries a short description of what was found.
    Unrecognized(String),
}

impl RawSeries {
    /// Number of stored rows, regardless of their validity.
    pub fn row_count(&self) -> usize {
        match self {
            RawSeries::SingleColumn(pairs) => pairs.len(),
            RawSeries::MultiColumn { rows, .. } => rows.len(),
            RawSeries::Unrecognized(_) => 0,
        }
    }
}

// ---------------------------------------------------------------------------
// Normalized series
// ---------------------------------------------------------------------------

/// A single daily value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Observation {
    pub date: NaiveDate,
    pub value: f64, // finite, >= 0
}

/// Canonical `(date, value)` sequence for one category.
///
/// Only `ingest::normalize` builds these, so every observation has a valid
/// date, a finite non-negative value, and the sequence is sorted by date.
/// Duplicate dates are allowed.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct NormalizedSeries {
    observations: Vec<Observation>,
}

impl NormalizedSeries {
    /// Caller guarantees the invariants above.
    pub(crate) fn from_sorted(observations: Vec<Observation>) -> Self {
        Self { observations }
    }

    pub fn observations(&self) -> &[Observation] {
        &self.observations
    }

    pub fn len(&self) -> usize {
        self.observations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }

    /// Converts back into the single-column stored form, with ISO dates.
    /// Normalizing the result yields an identical series.
    pub fn to_raw(&self) -> RawSeries {
        RawSeries::SingleColumn(
            self.observations
                .iter()
                .map(|o| {
                    (
                        Value::String(o.date.format("%Y-%m-%d").to_string()),
                        serde_json::Number::from_f64(o.value)
                            .map(Value::Number)
                            .unwrap_or(Value::Null),
                    )
                })
                .collect(),
        )
    }
}

// ---------------------------------------------------------------------------
// Windows
// ---------------------------------------------------------------------------

/// Calendar boundaries of one analysis run.
///
///   train_start <= split_point < eval_start <= eval_end
///   split_point == eval_start - 1 day
///
/// Built with `analysis::window::WindowBounds` constructors, which check
/// the ordering above.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct WindowBounds {
    pub train_start: NaiveDate,
    pub split_point: NaiveDate,
    pub eval_start: NaiveDate,
    pub eval_end: NaiveDate,
}

/// A normalized series restricted to the closed interval `[start, end]`.
/// Empty windows are valid.
#[derive(Debug, Clone, PartialEq)]
pub struct Window {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub observations: Vec<Observation>,
}

impl Window {
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    pub fn values(&self) -> Vec<f64> {
        self.observations.iter().map(|o| o.value).collect()
    }

    pub fn len(&self) -> usize {
        self.observations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Report types
// ---------------------------------------------------------------------------

/// Basic statistics of the evaluation window. With an empty window the
/// counts and the sum are zero and everything else is absent.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EvalSummary {
    pub count: usize,
    pub sum: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mean: Option<f64>,
    /// Sample standard deviation; absent below two rows.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub std: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub median: Option<f64>,
    pub zero_days: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub zero_fraction: Option<f64>,
    /// First rows of the evaluation window, for eyeballing.
    pub preview: Vec<Observation>,
}

/// One statistic compared across the two windows.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MetricShift {
    pub train: f64,
    pub eval: f64,
    /// `eval - train`
    pub delta: f64,
    /// `(eval - train) / train * 100`; absent when `train` is exactly zero.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delta_pct: Option<f64>,
}

/// Central-tendency and spread shift between training and evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DistributionShift {
    pub mean: MetricShift,
    /// Absent unless both windows have at least two rows.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub std: Option<MetricShift>,
    pub median: MetricShift,
    /// Evaluation over training sample variance. Absent when either
    /// variance is undefined or the training variance is zero.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub variance_ratio: Option<f64>,
}

/// Student two-sample t-test on the window values.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SignificanceTest {
    pub t_statistic: f64,
    pub degrees_of_freedom: f64,
    pub p_value: f64,
    /// `p_value < 0.05`
    pub significant: bool,
}

/// Coefficient of variation (`std / mean * 100`) per window. Each side is
/// absent when its mean is zero or its std is undefined.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct VariationCoefficients {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub train_cv: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub eval_cv: Option<f64>,
}

/// Result of comparing one category's evaluation window with its training
/// window. Built fresh per category per run and never persisted here.
///
/// Every `Option` field is absent, not zero, when its precondition fails.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HomogeneityReport {
    pub train_count: usize,
    pub eval_count: usize,
    pub eval_summary: EvalSummary,
    /// Present when both windows are non-empty.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shift: Option<DistributionShift>,
    /// Present when both windows have at least 30 rows, unless both are
    /// the same constant.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub significance: Option<SignificanceTest>,
    /// Present when both windows are non-empty.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub variation: Option<VariationCoefficients>,
    /// Pearson correlation of the day-of-week mean profiles. Present when
    /// both windows have more than 7 rows and the correlation is defined.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weekday_correlation: Option<f64>,
}

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors that abandon a single category. The rest of the run continues.
#[derive(Debug, Clone, PartialEq)]
pub enum SeriesError {
    /// The stored series is neither a date-indexed single column nor a
    /// table with at least two columns.
    UnsupportedShape(String),
}

impl std::fmt::Display for SeriesError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SeriesError::UnsupportedShape(what) => write!(f, "Unsupported series shape: {}", what),
        }
    }
}

impl std::error::Error for SeriesError {}

/// Window boundaries that violate the ordering documented on `WindowBounds`.
#[derive(Debug, Clone, PartialEq)]
pub enum BoundsError {
    /// A window would end before it starts.
    EmptyRange { start: NaiveDate, end: NaiveDate },
    /// The split point is not the day before the evaluation start.
    NotContiguous { split_point: NaiveDate, eval_start: NaiveDate },
    /// Date arithmetic left the representable calendar.
    OutOfRange(NaiveDate),
}

impl std::fmt::Display for BoundsError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BoundsError::EmptyRange { start, end } => {
                write!(f, "Window ends before it starts: {} > {}", start, end)
            }
            BoundsError::NotContiguous { split_point, eval_start } => write!(
                f,
                "Split point {} must be the day before evaluation start {}",
                split_point, eval_start
            ),
            BoundsError::OutOfRange(date) => write!(f, "Date out of range near {}", date),
        }
    }
}

impl std::error::Error for BoundsError {}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
