//! Weekly seasonality profiles.
//!
//! Day-of-week convention: index 0 is Monday, index 6 is Sunday
//! (`chrono::Weekday::num_days_from_monday`). Both windows are always
//! bucketed with the same convention, so their profiles line up index for
//! index.

use chrono::Datelike;

use crate::analysis::stats::pearson;
use crate::model::Observation;

/// Mean value per weekday. `None` for weekdays with no observations.
pub type WeekdayProfile = [Option<f64>; 7];

/// Groups observations by weekday and averages each bucket.
pub fn weekday_profile(observations: &[Observation]) -> WeekdayProfile {
    let mut sums = [0.0_f64; 7];
    let mut counts = [0_usize; 7];
    for obs in observations {
        let day = obs.date.weekday().num_days_from_monday() as usize;
        sums[day] += obs.value;
        counts[day] += 1;
    }

    let mut profile: WeekdayProfile = [None; 7];
    for day in 0..7 {
        if counts[day] > 0 {
            profile[day] = Some(sums[day] / counts[day] as f64);
        }
    }
    profile
}

/// Pearson correlation between two profiles over the weekdays present in
/// both. `None` with fewer than two shared weekdays or a flat profile.
pub fn profile_correlation(a: &WeekdayProfile, b: &WeekdayProfile) -> Option<f64> {
    let (xs, ys): (Vec<f64>, Vec<f64>) = a
        .iter()
        .zip(b.iter())
        .filter_map(|(x, y)| Some(((*x)?, (*y)?)))
        .unzip();
    pearson(&xs, &ys)
}
