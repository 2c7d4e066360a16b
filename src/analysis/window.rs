/// Training / evaluation window partitioning.
///
/// # Boundary injection
/// The calendar boundaries are always passed in as a `WindowBounds` value
/// rather than read from configuration here, so partitioning is fully
/// deterministic in tests with synthetic dates.

use chrono::{Datelike, NaiveDate};

use crate::model::{BoundsError, NormalizedSeries, Observation, Window, WindowBounds};

// ---------------------------------------------------------------------------
// Bounds
// ---------------------------------------------------------------------------

impl WindowBounds {
    /// Builds bounds from all four dates, checking that both windows are
    /// non-inverted and that they touch without overlapping.
    pub fn new(
        train_start: NaiveDate,
        split_point: NaiveDate,
        eval_start: NaiveDate,
        eval_end: NaiveDate,
    ) -> Result<Self, BoundsError> {
        if train_start > split_point {
            return Err(BoundsError::EmptyRange {
                start: train_start,
                end: split_point,
            });
        }
        if eval_start > eval_end {
            return Err(BoundsError::EmptyRange {
                start: eval_start,
                end: eval_end,
            });
        }
        if split_point.succ_opt() != Some(eval_start) {
            return Err(BoundsError::NotContiguous {
                split_point,
                eval_start,
            });
        }
        Ok(Self {
            train_start,
            split_point,
            eval_start,
            eval_end,
        })
    }

    /// Training runs from `train_start` to the day before `eval_start`;
    /// evaluation is the calendar month beginning at `eval_start`, up to
    /// and including its last day.
    pub fn for_evaluation_month(
        train_start: NaiveDate,
        eval_start: NaiveDate,
    ) -> Result<Self, BoundsError> {
        let split_point = eval_start
            .pred_opt()
            .ok_or(BoundsError::OutOfRange(eval_start))?;
        let eval_end = last_day_of_month(eval_start).ok_or(BoundsError::OutOfRange(eval_start))?;
        Self::new(train_start, split_point, eval_start, eval_end)
    }

    /// Which window a date falls into. Never both.
    pub fn placement(&self, date: NaiveDate) -> Placement {
        if self.train_start <= date && date <= self.split_point {
            Placement::Train
        } else if self.eval_start <= date && date <= self.eval_end {
            Placement::Eval
        } else {
            Placement::Neither
        }
    }
}

/// Where a single date lands for one analysis run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    Train,
    Eval,
    Neither,
}

/// Last calendar day of the month containing `date`.
pub fn last_day_of_month(date: NaiveDate) -> Option<NaiveDate> {
    let (year, month) = if date.month() == 12 {
        (date.year() + 1, 1)
    } else {
        (date.year(), date.month() + 1)
    };
    NaiveDate::from_ymd_opt(year, month, 1)?.pred_opt()
}

// ---------------------------------------------------------------------------
// Partitioning
// ---------------------------------------------------------------------------

/// Splits a series into `(training, evaluation)` windows.
///
/// Rows outside both ranges are left out of the windows; they remain in
/// `series` for plotting. Either window may come back empty.
pub fn partition(series: &NormalizedSeries, bounds: &WindowBounds) -> (Window, Window) {
    let mut train: Vec<Observation> = Vec::new();
    let mut eval: Vec<Observation> = Vec::new();

    for obs in series.observations() {
        match bounds.placement(obs.date) {
            Placement::Train => train.push(*obs),
            Placement::Eval => eval.push(*obs),
            Placement::Neither => {}
        }
    }

    (
        Window {
            start: bounds.train_start,
            end: bounds.split_point,
            observations: train,
        },
        Window {
            start: bounds.eval_start,
            end: bounds.eval_end,
            observations: eval,
        },
    )
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
