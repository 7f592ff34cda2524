//! Text summary builder for CLI output.
//!
//! Formats a finished job report and the static catalogue pages as
//! human-readable lines for text mode.

use crate::fixtures::{
    CustomSequence, HistoryRecord, QualityMetric, QualityReport, ReferenceGenome, StatCard,
};
use crate::metrics;
use crate::model::{AnalysisOption, JobKind, JobReport, TaskStatus};

/// Pre-formatted lines for text output.
pub(crate) struct TextSummary {
    pub lines: Vec<String>,
}

/// Build a text summary from a finished job report.
pub(crate) fn build_text_summary(report: &JobReport) -> TextSummary {
    let mut lines = Vec::new();

    lines.push(format!("Job: {} ({})", report.id, report.kind.label()));
    for file in &report.files {
        lines.push(format!("File: {} ({})", file.name, file.size_label()));
    }
    if let Some(reference) = report.reference.as_ref() {
        lines.push(format!(
            "Reference: {} ({})",
            reference.name,
            reference.size_label()
        ));
    }
    if report.kind == JobKind::Analysis && !report.options.is_empty() {
        let labels: Vec<&str> = report.options.iter().map(|o| o.label()).collect();
        lines.push(format!("Options: {}", labels.join(", ")));
    }
    if let Some(warning) = report.warning() {
        lines.push(format!("Warning: {warning}"));
    }

    let elapsed = metrics::format_duration_ms(report.duration_ms);
    match report.status {
        TaskStatus::Completed => {
            let mut status = format!(
                "Status: completed in {elapsed} ({} ticks",
                report.ticks
            );
            if let Some(step) = metrics::mean_step(report.progress, report.ticks) {
                status.push_str(&format!(", avg step {step:.1}%"));
            }
            status.push(')');
            lines.push(status);
        }
        TaskStatus::Failed => lines.push(format!(
            "Status: failed at {} after {elapsed} ({})",
            metrics::format_percent(report.progress),
            report.failure.as_deref().unwrap_or("no reason given")
        )),
        other => lines.push(format!(
            "Status: {other} at {}",
            metrics::format_percent(report.progress)
        )),
    }

    if !report.sample_results.is_empty() {
        lines.push("Results (sample data):".into());
        let width = report
            .sample_results
            .iter()
            .map(|m| m.label.len())
            .max()
            .unwrap_or(0);
        for m in &report.sample_results {
            lines.push(format!("  {:<width$}  {}", m.label, m.value));
        }
    }

    TextSummary { lines }
}

pub(crate) fn history_lines(records: &[&HistoryRecord]) -> Vec<String> {
    if records.is_empty() {
        return vec!["No analyses match the current filters.".into()];
    }
    records
        .iter()
        .map(|r| {
            let mutations = r
                .mutations
                .map(|m| m.to_string())
                .unwrap_or_else(|| "-".into());
            let similarity = r
                .similarity
                .map(|s| format!("{s:.1}%"))
                .unwrap_or_else(|| "-".into());
            format!(
                "{}  {:<28} {:<18} {:<10} {}  {:>7}  mut {:>3}  sim {:>6}  {}",
                r.id,
                r.filename,
                r.kind,
                r.status.label(),
                r.date,
                r.duration,
                mutations,
                similarity,
                r.size
            )
        })
        .collect()
}

/// Checklist of every analysis option, marking the selected ones.
pub(crate) fn option_lines(selected: &[AnalysisOption]) -> Vec<String> {
    AnalysisOption::ALL
        .iter()
        .enumerate()
        .map(|(i, opt)| {
            let mark = if selected.contains(opt) { "[x]" } else { "[ ]" };
            format!("{} {mark} {:<22} {}", i + 1, opt.label(), opt.description())
        })
        .collect()
}

fn card_lines(cards: &[StatCard]) -> Vec<String> {
    cards
        .iter()
        .map(|c| match c.gauge {
            Some(g) => format!("  {:<22} {:>6}  [{:>3}%]  {}", c.label, c.value, g, c.note),
            None => format!("  {:<22} {:>6}  {}", c.label, c.value, c.note),
        })
        .collect()
}

pub(crate) fn quality_lines(
    overview: &[StatCard],
    metrics: &[QualityMetric],
    reports: &[QualityReport],
) -> Vec<String> {
    let mut lines = vec!["Quality overview:".to_string()];
    lines.extend(card_lines(overview));

    lines.push("Quality metrics:".into());
    for m in metrics {
        let flag = if m.meets_target() { "" } else { "  (missed)" };
        lines.push(format!(
            "  {:<18} {:>5.1}%  target {:>4.1}%  {:<9} {}{flag}",
            m.name,
            m.value,
            m.target,
            m.rating.label(),
            m.target_delta()
        ));
    }

    lines.push("Generated reports:".into());
    for r in reports {
        lines.push(format!(
            "  {}  {:<28} {:<15} generated {}  score {:.1}%  {} analyses  {} issues  {}",
            r.id,
            r.title,
            r.period,
            r.generated,
            r.score,
            r.analyses,
            r.issues,
            r.status.label()
        ));
    }
    lines
}

pub(crate) fn performance_lines(cards: &[StatCard]) -> Vec<String> {
    let mut lines = vec!["Performance:".to_string()];
    lines.extend(card_lines(cards));
    lines
}

pub(crate) fn reference_lines(
    genomes: &[&ReferenceGenome],
    custom: &[CustomSequence],
) -> Vec<String> {
    let mut lines = vec!["Reference genomes:".to_string()];
    if genomes.is_empty() {
        lines.push("  (no matches)".into());
    }
    for g in genomes {
        lines.push(format!(
            "  {:<6} {:<32} {:<26} {:>7}  {}  {} downloads  [{}]",
            g.id, g.name, g.organism, g.size, g.released, g.downloads, g.source
        ));
    }
    lines.push("Custom sequences:".into());
    for c in custom {
        let visibility = if c.is_public { "public" } else { "private" };
        lines.push(format!(
            "  {:<6} {:<30} {:<14} {:>8}  uploaded {}  {} uses  {}",
            c.id, c.name, c.organism, c.size, c.uploaded, c.uses, visibility
        ));
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{Catalog, HistoryFilter, StaticCatalog};
    use crate::model::{AnalysisOption, FileInfo, RunnerConfig};

    fn report(status: TaskStatus) -> JobReport {
        JobReport {
            id: "ANL-2026-001".into(),
            timestamp_utc: String::new(),
            kind: JobKind::Analysis,
            files: vec![FileInfo {
                name: "sample.fa".into(),
                size: 12_697,
            }],
            reference: None,
            options: vec![AnalysisOption::Nucleotide, AnalysisOption::Gc],
            status,
            progress: if status == TaskStatus::Completed {
                100.0
            } else {
                40.0
            },
            ticks: 8,
            duration_ms: 4000,
            failure: (status == TaskStatus::Failed).then(|| "timed out".to_string()),
            config: RunnerConfig::default(),
            sample_results: if status == TaskStatus::Completed {
                StaticCatalog.sample_results(JobKind::Analysis)
            } else {
                Vec::new()
            },
        }
    }

    #[test]
    fn completed_summary_lists_results() {
        let s = build_text_summary(&report(TaskStatus::Completed));
        assert_eq!(s.lines[0], "Job: ANL-2026-001 (Analysis)");
        assert_eq!(s.lines[1], "File: sample.fa (12.4 KB)");
        assert_eq!(
            s.lines[2],
            "Options: Nucleotide Statistics, GC Content Analysis"
        );
        assert_eq!(
            s.lines[3],
            "Status: completed in 4.0s (8 ticks, avg step 12.5%)"
        );
        assert!(s.lines.iter().any(|l| l.contains("GC Content") && l.contains("58.3%")));
    }

    #[test]
    fn failed_summary_shows_reason() {
        let s = build_text_summary(&report(TaskStatus::Failed));
        assert!(s
            .lines
            .contains(&"Status: failed at 40% after 4.0s (timed out)".to_string()));
        assert!(!s.lines.iter().any(|l| l.starts_with("Results")));
    }

    #[test]
    fn mutation_without_reference_is_flagged() {
        let mut r = report(TaskStatus::Completed);
        r.options.push(AnalysisOption::Mutation);
        let s = build_text_summary(&r);
        assert!(s.lines.iter().any(|l| l.starts_with("Warning: mutation detection")));
    }

    #[test]
    fn option_checklist_marks_selection() {
        let lines = option_lines(&[AnalysisOption::Gc]);
        assert_eq!(lines.len(), 4);
        assert!(lines[0].starts_with("1 [ ] Nucleotide Statistics"));
        assert!(lines[1].starts_with("2 [x] GC Content Analysis"));
        assert!(lines[1].ends_with("Analyze GC vs AT content ratios"));
    }

    #[test]
    fn quality_page_lists_metrics_and_reports() {
        let c = StaticCatalog;
        let lines = quality_lines(c.quality_overview(), c.quality_metrics(), c.quality_reports());
        let error_rate = lines
            .iter()
            .find(|l| l.contains("Error Rate"))
            .unwrap();
        assert!(error_rate.contains("1.2% below target"));
        assert!(!error_rate.contains("missed"));
        assert!(lines.iter().any(|l| l.contains("QR-2024-003") && l.contains("0 issues")));

        let perf = performance_lines(c.performance_metrics());
        assert_eq!(perf.len(), 5);
        assert!(perf[2].contains("System Load") && perf[2].contains("[ 34%]"));
    }

    #[test]
    fn history_lines_cover_missing_values() {
        let filter = HistoryFilter {
            search: "delta".into(),
            ..Default::default()
        };
        let hits = filter.apply(StaticCatalog.history());
        let lines = history_lines(&hits);
        assert_eq!(lines.len(), 1);
        assert!(lines[0].starts_with("ANL-2024-003"));
        assert!(lines[0].contains("failed"));

        let none = history_lines(&[]);
        assert_eq!(none, vec!["No analyses match the current filters.".to_string()]);
    }
}
