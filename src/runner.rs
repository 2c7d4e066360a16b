//! Batch driver: for each category, Normalizer → Partitioner → Analyzer →
//! Emitter, then the optional visualization hook.
//!
//! Categories are processed one after another and share no state. A
//! category whose stored series cannot be read is recorded as skipped and
//! the run moves on; nothing short of a store load failure (handled by the
//! caller) ends the batch early.

use std::path::PathBuf;

use crate::analysis::homogeneity::analyze;
use crate::analysis::window::partition;
use crate::ingest::normalize::normalize;
use crate::ingest::store::SeriesStore;
use crate::logging::{self, FailureType, Stage};
use crate::model::{HomogeneityReport, NormalizedSeries, RawSeries, SeriesError, WindowBounds};
use crate::render::SeriesRenderer;

// ---------------------------------------------------------------------------
// Outcomes
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub enum CategoryOutcome {
    Analyzed {
        category: String,
        report: HomogeneityReport,
        /// Artifact written by the renderer, if one ran and succeeded.
        artifact: Option<PathBuf>,
    },
    Skipped {
        category: String,
        reason: String,
    },
}

impl CategoryOutcome {
    pub fn category(&self) -> &str {
        match self {
            CategoryOutcome::Analyzed { category, .. } => category,
            CategoryOutcome::Skipped { category, .. } => category,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunSummary {
    pub outcomes: Vec<CategoryOutcome>,
}

impl RunSummary {
    pub fn analyzed(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o, CategoryOutcome::Analyzed { .. }))
            .count()
    }

    pub fn skipped(&self) -> usize {
        self.outcomes.len() - self.analyzed()
    }

    /// Report for `category`, if it was analyzed.
    pub fn report(&self, category: &str) -> Option<&HomogeneityReport> {
        self.outcomes.iter().find_map(|o| match o {
            CategoryOutcome::Analyzed { category: c, report, .. } if c == category => Some(report),
            _ => None,
        })
    }
}

// ---------------------------------------------------------------------------
// Pipeline
// ---------------------------------------------------------------------------

/// Normalizes, partitions and analyzes one stored series.
///
/// Returns the normalized series alongside the report so the caller can
/// hand it to a renderer.
pub fn analyze_category(
    raw: &RawSeries,
    bounds: &WindowBounds,
) -> Result<(NormalizedSeries, HomogeneityReport), SeriesError> {
    let series = normalize(raw)?;
    let (train, eval) = partition(&series, bounds);
    let report = analyze(&train, &eval);
    Ok((series, report))
}

/// Runs every category in `store`. `emit` is called once per category, in
/// store order, as soon as its outcome is known.
pub fn run_analysis(
    store: SeriesStore,
    bounds: &WindowBounds,
    renderer: Option<&dyn SeriesRenderer>,
    mut emit: impl FnMut(&CategoryOutcome),
) -> RunSummary {
    let mut summary = RunSummary::default();

    for (category, raw) in store {
        let outcome = run_category(&category, &raw, bounds, renderer);
        emit(&outcome);
        summary.outcomes.push(outcome);
    }

    logging::log_run_summary(summary.outcomes.len(), summary.analyzed(), summary.skipped());
    summary
}

fn run_category(
    category: &str,
    raw: &RawSeries,
    bounds: &WindowBounds,
    renderer: Option<&dyn SeriesRenderer>,
) -> CategoryOutcome {
    let (series, report) = match analyze_category(raw, bounds) {
        Ok(result) => result,
        Err(err) => {
            logging::log_skipped_category(category, &err);
            return CategoryOutcome::Skipped {
                category: category.to_string(),
                reason: err.to_string(),
            };
        }
    };

    logging::debug(
        Stage::Normalize,
        Some(category),
        &format!("{} of {} stored rows kept", series.len(), raw.row_count()),
    );
    logging::debug(
        Stage::Partition,
        Some(category),
        &format!("{} training / {} evaluation rows", report.train_count, report.eval_count),
    );
    if report.eval_count == 0 {
        logging::warn(Stage::Analyze, Some(category), "No data in the evaluation period");
    }

    let artifact = renderer.and_then(|r| match r.render(category, &series, bounds) {
        Ok(path) => {
            logging::debug(Stage::Render, Some(category), &format!("Plot data saved to {}", path.display()));
            Some(path)
        }
        Err(err) => {
            logging::log_category_failure(
                category,
                Stage::Render,
                "Plot export",
                FailureType::Unknown,
                &err,
            );
            None
        }
    });

    CategoryOutcome::Analyzed {
        category: category.to_string(),
        report,
        artifact,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::RenderError;
    use chrono::NaiveDate;
    use serde_json::json;
    use std::cell::Cell;

    fn bounds() -> WindowBounds {
        WindowBounds::for_evaluation_month(
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2025, 8, 1).unwrap(),
        )
        .unwrap()
    }

    fn store() -> SeriesStore {
        vec![
            (
                "CT".to_string(),
                RawSeries::SingleColumn(vec![
                    (json!("2025-07-31"), json!(4)),
                    (json!("2025-08-01"), json!(5)),
                ]),
            ),
            ("US".to_string(), RawSeries::Unrecognized("array".to_string())),
            (
                "MRI".to_string(),
                RawSeries::MultiColumn {
                    columns: vec!["ds".into(), "y".into()],
                    rows: vec![vec![json!("2025-08-02"), json!(-2)]],
                },
            ),
        ]
        .into_iter()
        .collect()
    }

    struct FailingRenderer {
        calls: Cell<usize>,
    }

    impl SeriesRenderer for FailingRenderer {
        fn render(
            &self,
            _category: &str,
            _series: &NormalizedSeries,
            _bounds: &WindowBounds,
        ) -> Result<PathBuf, RenderError> {
            self.calls.set(self.calls.get() + 1);
            Err(RenderError::Serialize("renderer offline".to_string()))
        }
    }

    #[test]
    fn test_unsupported_category_is_skipped_and_run_continues() {
        let mut emitted = Vec::new();
        let summary = run_analysis(store(), &bounds(), None, |o| emitted.push(o.category().to_string()));

        assert_eq!(emitted, vec!["CT", "US", "MRI"]);
        assert_eq!(summary.analyzed(), 2);
        assert_eq!(summary.skipped(), 1);
        match &summary.outcomes[1] {
            CategoryOutcome::Skipped { reason, .. } => assert!(reason.contains("array")),
            other => panic!("expected US to be skipped, got {:?}", other),
        }
    }

    #[test]
    fn test_reports_are_attributed_per_category() {
        let summary = run_analysis(store(), &bounds(), None, |_| {});
        let ct = summary.report("CT").expect("CT analyzed");
        assert_eq!(ct.train_count, 1);
        assert_eq!(ct.eval_count, 1);
        let mri = summary.report("MRI").expect("MRI analyzed");
        assert_eq!(mri.eval_summary.sum, 0.0, "negative value clamped to zero");
        assert_eq!(mri.eval_summary.zero_days, 1);
        assert!(summary.report("US").is_none());
    }

    #[test]
    fn test_render_failure_does_not_change_report() {
        let renderer = FailingRenderer { calls: Cell::new(0) };
        let with_renderer = run_analysis(store(), &bounds(), Some(&renderer), |_| {});
        let without = run_analysis(store(), &bounds(), None, |_| {});

        assert_eq!(renderer.calls.get(), 2, "renderer runs for analyzed categories only");
        assert_eq!(with_renderer, without);
    }
}
