//! Train/evaluation homogeneity check for per-modality daily service counts.
//!
//! Each category's stored series is normalized, split into a training
//! window and a one-month evaluation window, and the two windows are
//! compared (mean/std/median shift, t-test, coefficient of variation,
//! weekday-pattern correlation) to decide whether forecast evaluation on
//! that month can be trusted.

pub mod analysis;
pub mod config;
pub mod ingest;
pub mod logging;
pub mod model;
pub mod render;
pub mod report;
pub mod runner;
