//! Bar-chart rendering for accumulated results.
//!
//! Rows are grouped by benchmark; each group gets two charts, overall
//! score and evaluation time in minutes, with every bar annotated with
//! its value. Charts render as ASCII for the terminal and as
//! standalone SVG files.

use std::fmt::Write as FmtWrite;
use std::path::{Path, PathBuf};

use crate::error::HarnessError;
use crate::report::RunRecord;
use crate::BenchmarkKind;

/// Pastel fill palette, cycled per bar.
const PALETTE: [&str; 6] = [
    "#a1c9f4", "#ffb482", "#8de5a1", "#ff9f9b", "#d0bbff", "#fffea3",
];

/// One bar: model label plus value.
#[derive(Clone, Debug)]
pub struct Bar {
    pub label: String,
    pub value: f64,
}

/// Collapse reasoning-effort variant paths into a readable label;
/// anything else passes through unchanged.
///
/// `.../Reasoning_Effort_30/...` becomes `Reasoning Effort 30`.
pub fn refined_model_name(name: &str) -> String {
    if let Some(rest) = name.split("Reasoning_Effort_").nth(1) {
        let effort = rest.split('/').next().unwrap_or(rest);
        return format!("Reasoning Effort {}", effort.trim());
    }
    name.to_string()
}

/// Group rows by benchmark, preserving first-seen order.
pub fn group_by_benchmark(records: &[RunRecord]) -> Vec<(String, Vec<&RunRecord>)> {
    let mut groups: Vec<(String, Vec<&RunRecord>)> = Vec::new();
    for record in records {
        match groups.iter_mut().find(|(name, _)| *name == record.benchmark) {
            Some((_, rows)) => rows.push(record),
            None => groups.push((record.benchmark.clone(), vec![record])),
        }
    }
    groups
}

/// Score bars for one benchmark's rows.
pub fn score_bars(rows: &[&RunRecord]) -> Vec<Bar> {
    rows.iter()
        .map(|r| Bar {
            label: refined_model_name(&r.model_name),
            value: r.overall_score,
        })
        .collect()
}

/// Evaluation-time bars (minutes) for one benchmark's rows.
pub fn time_bars(rows: &[&RunRecord]) -> Vec<Bar> {
    rows.iter()
        .map(|r| Bar {
            label: refined_model_name(&r.model_name),
            value: r.total_eval_secs / 60.0,
        })
        .collect()
}

/// Render a titled horizontal bar chart for the terminal.
pub fn render_ascii(title: &str, bars: &[Bar]) -> String {
    let mut out = String::new();
    writeln!(out, "{title}").expect("write to String is infallible");
    writeln!(out, "{}", "-".repeat(title.len().max(20)))
        .expect("write to String is infallible");

    let max = bars.iter().map(|b| b.value).fold(0.0_f64, f64::max);
    let label_w = bars
        .iter()
        .map(|b| b.label.len().min(32))
        .max()
        .unwrap_or(0);

    for bar in bars {
        writeln!(
            out,
            "{:<label_w$}  {}  {:.2}",
            truncate(&bar.label, 32),
            render_bar(bar.value, max, 30),
            bar.value
        )
        .expect("write to String is infallible");
    }
    out
}

/// Render a titled vertical bar chart as a standalone SVG document.
pub fn render_svg(title: &str, y_label: &str, bars: &[Bar]) -> String {
    let bar_w = 60.0;
    let gap = 40.0;
    let left = 80.0;
    let base = 340.0;
    let plot_h = 250.0;
    let width = (left + bars.len() as f64 * (bar_w + gap) + 40.0).max(420.0);
    let height = 420.0;
    let max = bars.iter().map(|b| b.value).fold(f64::EPSILON, f64::max);

    let mut svg = String::new();
    svg.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
    writeln!(
        svg,
        "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{width:.0}\" height=\"{height:.0}\">"
    )
    .expect("write to String is infallible");
    svg.push_str("  <style>\n");
    svg.push_str("    .bar { stroke: #333; }\n");
    svg.push_str("    .label { font-family: monospace; font-size: 12px; }\n");
    svg.push_str("    .value { font-family: monospace; font-size: 12px; }\n");
    svg.push_str("  </style>\n");
    svg.push_str("  <rect width=\"100%\" height=\"100%\" fill=\"#f8f8f8\"/>\n");
    writeln!(
        svg,
        "  <text x=\"{:.0}\" y=\"30\" text-anchor=\"middle\" font-size=\"16\" \
         font-weight=\"bold\">{}</text>",
        width / 2.0,
        title
    )
    .expect("write to String is infallible");
    writeln!(
        svg,
        "  <text x=\"20\" y=\"{:.0}\" class=\"label\" \
         transform=\"rotate(-90 20 {:.0})\" text-anchor=\"middle\">{}</text>",
        base - plot_h / 2.0,
        base - plot_h / 2.0,
        y_label
    )
    .expect("write to String is infallible");

    for (i, bar) in bars.iter().enumerate() {
        let x = left + i as f64 * (bar_w + gap);
        let h = (bar.value / max).max(0.0) * plot_h;
        let y = base - h;
        let cx = x + bar_w / 2.0;
        let color = PALETTE[i % PALETTE.len()];

        writeln!(
            svg,
            "  <rect x=\"{x:.1}\" y=\"{y:.1}\" width=\"{bar_w:.1}\" height=\"{h:.1}\" \
             fill=\"{color}\" class=\"bar\"/>"
        )
        .expect("write to String is infallible");
        writeln!(
            svg,
            "  <text x=\"{cx:.1}\" y=\"{:.1}\" class=\"value\" \
             text-anchor=\"middle\">{:.2}</text>",
            y - 6.0,
            bar.value
        )
        .expect("write to String is infallible");
        writeln!(
            svg,
            "  <text x=\"{cx:.1}\" y=\"{:.1}\" class=\"label\" text-anchor=\"end\" \
             transform=\"rotate(-35 {cx:.1} {:.1})\">{}</text>",
            base + 18.0,
            base + 18.0,
            truncate(&bar.label, 32)
        )
        .expect("write to String is infallible");
    }

    writeln!(
        svg,
        "  <line x1=\"{:.1}\" y1=\"{base:.1}\" x2=\"{:.1}\" y2=\"{base:.1}\" stroke=\"#333\"/>",
        left - 10.0,
        width - 20.0
    )
    .expect("write to String is infallible");
    svg.push_str("</svg>\n");
    svg
}

/// Write score and time SVGs per benchmark, returning the file paths.
pub fn write_charts(
    records: &[RunRecord],
    out_dir: &Path,
    filter: Option<BenchmarkKind>,
) -> Result<Vec<PathBuf>, HarnessError> {
    std::fs::create_dir_all(out_dir)?;

    let mut written = Vec::new();
    for (benchmark, rows) in group_by_benchmark(records) {
        if let Some(kind) = filter {
            if kind.display_name() != benchmark {
                continue;
            }
        }

        let slug = file_slug(&benchmark);

        let score_svg = render_svg(
            &format!("Overall Score by Model - {benchmark} Benchmark"),
            "Overall Score",
            &score_bars(&rows),
        );
        let score_path = out_dir.join(format!("{slug}_score.svg"));
        std::fs::write(&score_path, score_svg)?;
        written.push(score_path);

        let time_svg = render_svg(
            &format!("Total Evaluation Time (minutes) by Model - {benchmark} Benchmark"),
            "Evaluation Time (min)",
            &time_bars(&rows),
        );
        let time_path = out_dir.join(format!("{slug}_time.svg"));
        std::fs::write(&time_path, time_svg)?;
        written.push(time_path);
    }

    Ok(written)
}

fn file_slug(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_lowercase()
            } else {
                '_'
            }
        })
        .collect()
}

fn render_bar(value: f64, max: f64, width: usize) -> String {
    let ratio = if max > 0.0 { value / max } else { 0.0 };
    let filled = ((ratio * width as f64) as usize).min(width);
    let empty = width - filled;

    format!("{}{}", "█".repeat(filled), "░".repeat(empty))
}

// Cut on a char boundary; labels come from user-supplied model names.
fn truncate(s: &str, max_chars: usize) -> &str {
    match s.char_indices().nth(max_chars) {
        Some((i, _)) => &s[..i],
        None => s,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(benchmark: &str, model: &str, score: f64, secs: f64) -> RunRecord {
        RunRecord {
            benchmark: benchmark.to_string(),
            timestamp: "2026-08-24 12:00:00".to_string(),
            model_name: model.to_string(),
            cot_enabled: false,
            overall_score: score,
            samples: 10,
            total_eval_secs: secs,
        }
    }

    #[test]
    fn refined_name_collapses_reasoning_effort() {
        assert_eq!(
            refined_model_name("qwen/Reasoning_Effort_30/32b"),
            "Reasoning Effort 30"
        );
        assert_eq!(
            refined_model_name("Reasoning_Effort_75"),
            "Reasoning Effort 75"
        );
        assert_eq!(refined_model_name("llama3.2:latest"), "llama3.2:latest");
    }

    #[test]
    fn grouping_preserves_first_seen_order() {
        let records = vec![
            record("MMLU", "a", 0.5, 60.0),
            record("GSM8K", "a", 0.4, 60.0),
            record("MMLU", "b", 0.6, 60.0),
        ];
        let groups = group_by_benchmark(&records);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].0, "MMLU");
        assert_eq!(groups[0].1.len(), 2);
        assert_eq!(groups[1].0, "GSM8K");
    }

    #[test]
    fn time_bars_convert_to_minutes() {
        let r = record("MMLU", "a", 0.5, 90.0);
        let bars = time_bars(&[&r]);
        assert!((bars[0].value - 1.5).abs() < 1e-9);
    }

    #[test]
    fn ascii_bar_fill() {
        let bar = render_bar(50.0, 100.0, 10);
        assert_eq!(bar.chars().filter(|c| *c == '█').count(), 5);
        assert_eq!(bar.chars().filter(|c| *c == '░').count(), 5);

        let full = render_bar(2.0, 1.0, 10);
        assert_eq!(full.chars().filter(|c| *c == '█').count(), 10);
    }

    #[test]
    fn ascii_chart_annotates_values() {
        let bars = vec![
            Bar {
                label: "llama3.2:latest".to_string(),
                value: 0.75,
            },
            Bar {
                label: "qwen2.5:32b".to_string(),
                value: 0.5,
            },
        ];
        let out = render_ascii("Overall Score - MMLU", &bars);
        assert!(out.contains("Overall Score - MMLU"));
        assert!(out.contains("0.75"));
        assert!(out.contains("0.50"));
        assert!(out.contains('█'));
    }

    #[test]
    fn long_non_ascii_labels_truncate_cleanly() {
        // Multi-byte char straddling the cut must not split mid-char.
        let label = format!("{}é suffix", "a".repeat(31));

        let cut = truncate(&label, 32);
        assert_eq!(cut.chars().count(), 32);
        assert!(cut.ends_with('é'));
        assert_eq!(truncate("short", 32), "short");

        let bars = vec![Bar {
            label: label.clone(),
            value: 1.0,
        }];
        let ascii = render_ascii("Overall Score - MMLU", &bars);
        assert!(ascii.contains('█'));
        let svg = render_svg("Overall Score - MMLU", "Overall Score", &bars);
        assert!(svg.contains("1.00"));
    }

    #[test]
    fn svg_contains_bars_and_annotations() {
        let bars = vec![
            Bar {
                label: "a".to_string(),
                value: 0.8,
            },
            Bar {
                label: "b".to_string(),
                value: 0.4,
            },
        ];
        let svg = render_svg("Overall Score by Model - MMLU Benchmark", "Overall Score", &bars);
        assert!(svg.starts_with("<?xml"));
        assert!(svg.contains("Overall Score by Model - MMLU Benchmark"));
        assert_eq!(svg.matches("<rect").count(), 3); // background + 2 bars
        assert!(svg.contains("0.80"));
        assert!(svg.contains("0.40"));
        assert!(svg.trim_end().ends_with("</svg>"));
    }

    #[test]
    fn write_charts_per_benchmark_with_filter() {
        let dir = tempfile::tempdir().unwrap();
        let records = vec![
            record("MMLU", "a", 0.5, 60.0),
            record("GSM8K", "a", 0.4, 120.0),
        ];

        let all = write_charts(&records, dir.path(), None).unwrap();
        assert_eq!(all.len(), 4);
        assert!(dir.path().join("mmlu_score.svg").exists());
        assert!(dir.path().join("gsm8k_time.svg").exists());

        let only = write_charts(&records, dir.path(), Some(BenchmarkKind::Mmlu)).unwrap();
        assert_eq!(only.len(), 2);
        assert!(only.iter().all(|p| p
            .file_name()
            .unwrap()
            .to_str()
            .unwrap()
            .starts_with("mmlu_")));
    }
}
