/// Statistics that decide whether a category's evaluation month is usable.
///
/// Submodules:
/// - `window`     : splits a normalized series into training and evaluation windows.
/// - `stats`      : descriptive statistics, Pearson correlation, Student t-test.
/// - `seasonality`: day-of-week profiles and their correlation.
/// - `homogeneity`: the per-category train/evaluation comparison.

pub mod homogeneity;
pub mod seasonality;
pub mod stats;
pub mod window;
