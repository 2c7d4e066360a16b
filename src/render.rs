//! Visualization hook.
//!
//! After a category has been analyzed, its full normalized series and the
//! window bounds are handed to a `SeriesRenderer`. Rendering is a side
//! channel: a failure here is logged as a warning by the runner and never
//! changes the report.
//!
//! The bundled `PlotDataExporter` writes the data behind the two standard
//! charts (full series with the split marker, and per-window value
//! densities) to `<plot_dir>/<category>_analysis.json`, ready for any
//! plotting front end.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use serde::Serialize;

use crate::analysis::window::partition;
use crate::model::{NormalizedSeries, Observation, WindowBounds};

/// Bins per density histogram.
pub const HISTOGRAM_BINS: usize = 30;

// ---------------------------------------------------------------------------
// Renderer seam
// ---------------------------------------------------------------------------

pub trait SeriesRenderer {
    /// Produces one artifact for `category` and returns where it was written.
    fn render(
        &self,
        category: &str,
        series: &NormalizedSeries,
        bounds: &WindowBounds,
    ) -> Result<PathBuf, RenderError>;
}

#[derive(Debug, Clone, PartialEq)]
pub enum RenderError {
    Io { path: String, message: String },
    Serialize(String),
}

impl std::fmt::Display for RenderError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RenderError::Io { path, message } => write!(f, "Cannot write {}: {}", path, message),
            RenderError::Serialize(msg) => write!(f, "Cannot encode plot data: {}", msg),
        }
    }
}

impl std::error::Error for RenderError {}

// ---------------------------------------------------------------------------
// Plot data
// ---------------------------------------------------------------------------

/// Histogram normalized so that its area is 1.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DensityHistogram {
    /// `bins + 1` ascending edges.
    pub bin_edges: Vec<f64>,
    pub density: Vec<f64>,
}

#[derive(Debug, Serialize)]
struct PlotData<'a> {
    category: &'a str,
    /// Vertical marker drawn at the last training day.
    split_marker: NaiveDate,
    bounds: &'a WindowBounds,
    series: &'a [Observation],
    #[serde(skip_serializing_if = "Option::is_none")]
    train_density: Option<DensityHistogram>,
    #[serde(skip_serializing_if = "Option::is_none")]
    eval_density: Option<DensityHistogram>,
}

/// Equal-width density histogram over `[min, max]` of `values`.
///
/// A constant sample gets the unit range centred on its value. `None` for
/// an empty sample or zero bins.
pub fn density_histogram(values: &[f64], bins: usize) -> Option<DensityHistogram> {
    if values.is_empty() || bins == 0 {
        return None;
    }
    let lo = values.iter().copied().fold(f64::INFINITY, f64::min);
    let hi = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let (lo, hi) = if lo == hi { (lo - 0.5, hi + 0.5) } else { (lo, hi) };
    let width = (hi - lo) / bins as f64;

    let mut counts = vec![0_usize; bins];
    for v in values {
        // The last bin is closed on the right.
        let idx = (((v - lo) / width) as usize).min(bins - 1);
        counts[idx] += 1;
    }

    let scale = values.len() as f64 * width;
    Some(DensityHistogram {
        bin_edges: (0..=bins).map(|i| lo + width * i as f64).collect(),
        density: counts.iter().map(|c| *c as f64 / scale).collect(),
    })
}

/// File-system safe version of a category name.
pub fn artifact_stem(category: &str) -> String {
    category
        .chars()
        .map(|c| if c.is_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect()
}

// ---------------------------------------------------------------------------
// Exporter
// ---------------------------------------------------------------------------

pub struct PlotDataExporter {
    output_dir: PathBuf,
}

impl PlotDataExporter {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }
}

impl SeriesRenderer for PlotDataExporter {
    fn render(
        &self,
        category: &str,
        series: &NormalizedSeries,
        bounds: &WindowBounds,
    ) -> Result<PathBuf, RenderError> {
        let (train, eval) = partition(series, bounds);
        let data = PlotData {
            category,
            split_marker: bounds.split_point,
            bounds,
            series: series.observations(),
            train_density: density_histogram(&train.values(), HISTOGRAM_BINS),
            eval_density: density_histogram(&eval.values(), HISTOGRAM_BINS),
        };

        let json =
            serde_json::to_string_pretty(&data).map_err(|e| RenderError::Serialize(e.to_string()))?;

        let io_error = |path: &Path, e: std::io::Error| RenderError::Io {
            path: path.display().to_string(),
            message: e.to_string(),
        };
        fs::create_dir_all(&self.output_dir).map_err(|e| io_error(&self.output_dir, e))?;
        let path = self
            .output_dir
            .join(format!("{}_analysis.json", artifact_stem(category)));
        fs::write(&path, json).map_err(|e| io_error(&path, e))?;
        Ok(path)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_density_integrates_to_one() {
        let values: Vec<f64> = (0..100).map(|i| (i % 17) as f64).collect();
        let hist = density_histogram(&values, HISTOGRAM_BINS).unwrap();
        assert_eq!(hist.bin_edges.len(), HISTOGRAM_BINS + 1);
        assert_eq!(hist.density.len(), HISTOGRAM_BINS);
        let width = hist.bin_edges[1] - hist.bin_edges[0];
        let area: f64 = hist.density.iter().map(|d| d * width).sum();
        assert!((area - 1.0).abs() < 1e-9, "area = {}", area);
    }

    #[test]
    fn test_maximum_lands_in_last_bin() {
        let hist = density_histogram(&[0.0, 10.0], 10).unwrap();
        assert!(hist.density[9] > 0.0);
        assert!(hist.density[0] > 0.0);
    }

    #[test]
    fn test_constant_sample_uses_unit_range() {
        let hist = density_histogram(&[5.0, 5.0, 5.0], 2).unwrap();
        assert_eq!(hist.bin_edges, vec![4.5, 5.0, 5.5]);
        assert_eq!(hist.density, vec![0.0, 2.0]);
    }

    #[test]
    fn test_empty_sample_has_no_histogram() {
        assert_eq!(density_histogram(&[], HISTOGRAM_BINS), None);
    }

    #[test]
    fn test_artifact_stem_replaces_path_characters() {
        assert_eq!(artifact_stem("CT"), "CT");
        assert_eq!(artifact_stem("X-ray / fluoro"), "X-ray___fluoro");
    }

    #[test]
    fn test_exporter_writes_one_file_per_category() {
        let dir = std::env::temp_dir().join(format!("modality_plots_{}", std::process::id()));
        let exporter = PlotDataExporter::new(&dir);
        let series = NormalizedSeries::from_sorted(
            date(2025, 7, 25)
                .iter_days()
                .take(14)
                .map(|d| Observation { date: d, value: 3.0 })
                .collect(),
        );
        let bounds = WindowBounds::for_evaluation_month(date(2024, 1, 1), date(2025, 8, 1)).unwrap();

        let path = exporter.render("MRI", &series, &bounds).expect("temp dir is writable");
        assert_eq!(path, dir.join("MRI_analysis.json"));

        let written: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        let _ = fs::remove_dir_all(&dir);
        assert_eq!(written["category"], "MRI");
        assert_eq!(written["split_marker"], "2025-07-31");
        assert_eq!(written["series"].as_array().unwrap().len(), 14);
        assert!(written["eval_density"].is_object());
    }
}
