//! Post-job processing utilities.
//!
//! Builds job reports and handles exports after a job finishes.

use super::controller::ActiveJob;
use crate::fixtures::{Catalog, StaticCatalog};
use crate::model::{JobReport, TaskSnapshot, TaskStatus};
use anyhow::{Context, Result};
use std::path::Path;

/// Build the report for a job that reached a terminal state.
pub(crate) fn build_report(job: &ActiveJob, snap: &TaskSnapshot) -> JobReport {
    let now = time::OffsetDateTime::now_utc();
    let sample_results = if snap.status == TaskStatus::Completed {
        StaticCatalog.sample_results(job.request.kind)
    } else {
        Vec::new()
    };
    JobReport {
        id: format!(
            "{}-{}-{:03}",
            job.request.kind.id_prefix(),
            now.year(),
            job.number
        ),
        timestamp_utc: now
            .format(&time::format_description::well_known::Rfc3339)
            .unwrap_or_else(|_| "now".into()),
        kind: job.request.kind,
        files: job.request.files.clone(),
        reference: job.request.reference.clone(),
        options: job.request.options.clone(),
        status: snap.status,
        progress: snap.progress,
        ticks: snap.ticks,
        duration_ms: job.started.elapsed().as_millis() as u64,
        failure: snap.failure.clone(),
        config: job.request.config.clone(),
        sample_results,
    }
}

/// Result of post-job processing, ready for presentation layers.
pub(crate) struct ProcessedJob {
    pub report: JobReport,
    pub export_messages: Vec<String>,
}

/// Process a finished job: run the requested export and collect messages.
pub(crate) fn process_job_completion(
    export_json: Option<&Path>,
    report: JobReport,
) -> ProcessedJob {
    let mut export_messages = Vec::new();
    if let Some(path) = export_json {
        match export_report_json(path, &report) {
            Ok(()) => export_messages.push(format!("Exported JSON: {}", path.display())),
            Err(e) => export_messages.push(format!("Export JSON failed: {e:#}")),
        }
    }
    ProcessedJob {
        report,
        export_messages,
    }
}

pub(crate) fn export_report_json(path: &Path, report: &JobReport) -> Result<()> {
    let json = serde_json::to_string_pretty(report).context("serialize job report")?;
    std::fs::write(path, json).with_context(|| format!("write {}", path.display()))?;
    Ok(())
}
