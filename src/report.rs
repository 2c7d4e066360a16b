//! Human-readable and JSON rendering of homogeneity reports.
//!
//! Only the computed values and their presence or absence matter to the
//! rest of the crate; the layout here is for people reading the console.

use serde::Serialize;

use crate::analysis::homogeneity::SIGNIFICANCE_LEVEL;
use crate::model::{HomogeneityReport, MetricShift, WindowBounds};
use crate::runner::{CategoryOutcome, RunSummary};

const RULE: &str = "════════════════════════════════════════════════════════════════════════════════";

// ============================================================================
// Text
// ============================================================================

pub fn format_run_header(bounds: &WindowBounds) -> String {
    format!(
        "Training period:   {} .. {}\nEvaluation period: {} .. {}\n{}",
        bounds.train_start, bounds.split_point, bounds.eval_start, bounds.eval_end, RULE
    )
}

/// Renders one category's report as indented text.
pub fn format_report(category: &str, report: &HomogeneityReport) -> String {
    let mut out = Vec::new();
    let s = &report.eval_summary;

    out.push(format!("📊 Category: {}", category));
    out.push(format!("   Training days:            {}", report.train_count));
    out.push(format!("   Evaluation days:          {}", s.count));
    out.push(format!("   Evaluation total:         {}", fmt_num(s.sum)));
    out.push(format!("   Minimum:                  {}", fmt_opt(s.min)));
    out.push(format!("   Maximum:                  {}", fmt_opt(s.max)));
    out.push(format!("   Mean:                     {}", fmt_opt(s.mean)));
    out.push(format!("   Median:                   {}", fmt_opt(s.median)));
    out.push(format!("   Std (sample):             {}", fmt_opt(s.std)));
    out.push(format!(
        "   Zero-valued days:         {}{}",
        s.zero_days,
        s.zero_fraction
            .map(|f| format!(" ({:.1}%)", f * 100.0))
            .unwrap_or_default()
    ));

    if !s.preview.is_empty() {
        out.push(format!("   First {} evaluation days:", s.preview.len()));
        for obs in &s.preview {
            out.push(format!("     {}  {}", obs.date, fmt_num(obs.value)));
        }
    }

    match &report.shift {
        None => out.push("   Homogeneity: not assessed (a window has no data)".to_string()),
        Some(shift) => {
            out.push("   📈 Homogeneity".to_string());
            out.push("   ──────────────────────────────────────────────────".to_string());
            out.push(format_shift("Mean", &shift.mean));
            match &shift.std {
                Some(spread) => out.push(format_shift("Std", spread)),
                None => out.push("   Std:     n/a (fewer than two days in a window)".to_string()),
            }

            match &report.significance {
                Some(test) => {
                    out.push(format!(
                        "   t-test:  t = {:.3}, df = {}, p = {:.4}",
                        test.t_statistic, test.degrees_of_freedom, test.p_value
                    ));
                    if test.significant {
                        out.push(format!(
                            "   ⚠️  Means differ significantly (p < {})",
                            SIGNIFICANCE_LEVEL
                        ));
                    } else {
                        out.push("   ✅ No significant difference in means".to_string());
                    }
                }
                None => out.push("   t-test:  not run".to_string()),
            }

            out.push(format_shift("Median", &shift.median));
            if let Some(ratio) = shift.variance_ratio {
                out.push(format!("   Variance ratio (eval/train): {:.3}", ratio));
            }

            if let Some(cv) = &report.variation {
                out.push(format!(
                    "   CV:      train {}, eval {}",
                    fmt_pct(cv.train_cv),
                    fmt_pct(cv.eval_cv)
                ));
            }

            match report.weekday_correlation {
                Some(r) => out.push(format!("   Weekday pattern correlation: {:.3}", r)),
                None => out.push("   Weekday pattern correlation: n/a".to_string()),
            }
        }
    }

    out.join("\n")
}

fn format_shift(label: &str, shift: &MetricShift) -> String {
    let delta = match shift.delta_pct {
        Some(pct) => format!("{:+.2}%", pct),
        None => "undefined (zero baseline)".to_string(),
    };
    format!(
        "   {:<8} train {:.2}, eval {:.2}, change {}",
        format!("{}:", label),
        shift.train,
        shift.eval,
        delta
    )
}

fn fmt_num(v: f64) -> String {
    if v.fract() == 0.0 && v.abs() < 1e15 {
        format!("{}", v as i64)
    } else {
        format!("{:.2}", v)
    }
}

fn fmt_opt(v: Option<f64>) -> String {
    v.map(fmt_num).unwrap_or_else(|| "n/a".to_string())
}

fn fmt_pct(v: Option<f64>) -> String {
    v.map(|p| format!("{:.2}%", p))
        .unwrap_or_else(|| "undefined".to_string())
}

/// Renders the end-of-run tally.
pub fn format_summary(summary: &RunSummary) -> String {
    let mut out = vec![RULE.to_string()];
    out.push(format!(
        "Categories: {} analyzed, {} skipped, {} total",
        summary.analyzed(),
        summary.skipped(),
        summary.outcomes.len()
    ));
    for outcome in &summary.outcomes {
        if let CategoryOutcome::Skipped { category, reason } = outcome {
            out.push(format!("   ✗ {}: {}", category, reason));
        }
    }
    let flagged: Vec<&str> = summary
        .outcomes
        .iter()
        .filter_map(|o| match o {
            CategoryOutcome::Analyzed { category, report, .. }
                if report.significance.is_some_and(|t| t.significant) =>
            {
                Some(category.as_str())
            }
            _ => None,
        })
        .collect();
    if !flagged.is_empty() {
        out.push(format!("Significant mean shift: {}", flagged.join(", ")));
    }
    out.push(RULE.to_string());
    out.join("\n")
}

// ============================================================================
// JSON
// ============================================================================

#[derive(Serialize)]
struct JsonRun<'a> {
    bounds: &'a WindowBounds,
    categories: Vec<JsonCategory<'a>>,
}

#[derive(Serialize)]
struct JsonCategory<'a> {
    category: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    report: Option<&'a HomogeneityReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    skipped: Option<&'a str>,
}

/// Renders the whole run as one JSON document. Absent report fields are
/// left out rather than written as null.
pub fn format_json(bounds: &WindowBounds, summary: &RunSummary) -> Result<String, serde_json::Error> {
    let run = JsonRun {
        bounds,
        categories: summary
            .outcomes
            .iter()
            .map(|o| match o {
                CategoryOutcome::Analyzed { category, report, .. } => JsonCategory {
                    category: category.as_str(),
                    report: Some(report),
                    skipped: None,
                },
                CategoryOutcome::Skipped { category, reason } => JsonCategory {
                    category: category.as_str(),
                    report: None,
                    skipped: Some(reason.as_str()),
                },
            })
            .collect(),
    };
    serde_json::to_string_pretty(&run)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::homogeneity::analyze;
    use crate::model::{Observation, Window};
    use chrono::NaiveDate;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn window(start: NaiveDate, n: usize, value: impl Fn(usize) -> f64) -> Window {
        let observations: Vec<Observation> = start
            .iter_days()
            .take(n)
            .enumerate()
            .map(|(i, d)| Observation { date: d, value: value(i) })
            .collect();
        let end = observations.last().map(|o| o.date).unwrap_or(start);
        Window { start, end, observations }
    }

    fn bounds() -> WindowBounds {
        WindowBounds::for_evaluation_month(date(2024, 1, 1), date(2025, 8, 1)).unwrap()
    }

    #[test]
    fn test_text_report_for_empty_evaluation() {
        let report = analyze(&window(date(2024, 1, 1), 40, |_| 3.0), &window(date(2025, 8, 1), 0, |_| 0.0));
        let text = format_report("CT", &report);
        assert!(text.contains("Category: CT"));
        assert!(text.contains("Evaluation days:          0"));
        assert!(text.contains("Minimum:                  n/a"));
        assert!(text.contains("not assessed"));
    }

    #[test]
    fn test_text_report_shows_shift_and_test() {
        let train = window(date(2024, 1, 1), 60, |i| 10.0 + (i % 7) as f64);
        let eval = window(date(2025, 8, 1), 31, |i| 11.0 + (i % 5) as f64);
        let text = format_report("MRI", &analyze(&train, &eval));
        assert!(text.contains("Mean:"));
        assert!(text.contains("t-test:  t ="));
        assert!(text.contains("Weekday pattern correlation"));
        assert!(text.contains("Variance ratio (eval/train):"));
        assert!(text.contains("First 5 evaluation days:"));
        assert!(text.contains("2025-08-01  11"));
    }

    #[test]
    fn test_zero_baseline_is_spelled_out() {
        let train = window(date(2024, 1, 1), 10, |_| 0.0);
        let eval = window(date(2025, 8, 1), 10, |i| i as f64);
        let text = format_report("PET", &analyze(&train, &eval));
        assert!(text.contains("undefined (zero baseline)"));
    }

    #[test]
    fn test_json_omits_absent_fields() {
        let report = analyze(&window(date(2024, 1, 1), 5, |_| 1.0), &window(date(2025, 8, 1), 0, |_| 0.0));
        let summary = RunSummary {
            outcomes: vec![
                CategoryOutcome::Analyzed {
                    category: "CT".to_string(),
                    report,
                    artifact: None,
                },
                CategoryOutcome::Skipped {
                    category: "US".to_string(),
                    reason: "Unsupported series shape: array".to_string(),
                },
            ],
        };
        let json: serde_json::Value =
            serde_json::from_str(&format_json(&bounds(), &summary).unwrap()).unwrap();

        let ct = &json["categories"][0];
        assert_eq!(ct["category"], "CT");
        assert_eq!(ct["report"]["eval_count"], 0);
        assert!(ct["report"].get("significance").is_none());
        assert!(ct["report"].get("shift").is_none());
        assert!(ct["report"]["eval_summary"].get("mean").is_none());
        assert_eq!(json["categories"][1]["skipped"], "Unsupported series shape: array");
        assert_eq!(json["bounds"]["eval_end"], "2025-08-31");
    }

    #[test]
    fn test_summary_lists_skipped_categories() {
        let summary = RunSummary {
            outcomes: vec![CategoryOutcome::Skipped {
                category: "US".to_string(),
                reason: "Unsupported series shape: array".to_string(),
            }],
        };
        let text = format_summary(&summary);
        assert!(text.contains("0 analyzed, 1 skipped, 1 total"));
        assert!(text.contains("✗ US: Unsupported series shape: array"));
    }

    #[test]
    fn test_summary_flags_constant_windows_at_different_levels() {
        let report = analyze(&window(date(2024, 1, 1), 60, |_| 100.0), &window(date(2025, 8, 1), 31, |_| 0.0));
        let text = format_report("CT", &report);
        assert!(text.contains("t = inf"));
        assert!(text.contains("Means differ significantly"));

        let summary = RunSummary {
            outcomes: vec![CategoryOutcome::Analyzed {
                category: "CT".to_string(),
                report,
                artifact: None,
            }],
        };
        assert!(format_summary(&summary).contains("Significant mean shift: CT"));
    }

    #[test]
    fn test_run_header_names_both_periods() {
        let header = format_run_header(&bounds());
        assert!(header.contains("2024-01-01 .. 2025-07-31"));
        assert!(header.contains("2025-08-01 .. 2025-08-31"));
    }
}
