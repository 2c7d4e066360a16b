/// Getting stored series into canonical form.
///
/// Submodules:
/// - `store`    : loads the category -> series mapping from disk.
/// - `normalize`: reshapes one stored series into sorted `(date, value)` rows.

pub mod normalize;
pub mod store;
