use crate::fixtures::{HistoryFilter, RecordStatus};
use crate::forms::{AnalysisForm, CompareForm};
use crate::metrics;
use crate::model::{FileInfo, JobKind, JobReport, RunnerConfig, TaskEvent, TaskSnapshot};

pub const TAB_ANALYSIS: usize = 0;
pub const TAB_COMPARE: usize = 1;
pub const TAB_HISTORY: usize = 2;
pub const TAB_QUALITY: usize = 3;
pub const TAB_REFERENCES: usize = 4;
pub const TAB_HELP: usize = 5;
pub const TAB_COUNT: usize = 6;

pub struct UiState {
    pub tab: usize,
    pub info: String,

    pub analysis_form: AnalysisForm,
    pub compare_form: CompareForm,
    pub compare_selected: usize,
    pub analysis_config: RunnerConfig,
    pub compare_config: RunnerConfig,

    // The job shown on its tab; `None` until something starts.
    pub job_kind: Option<JobKind>,
    pub job_files: Vec<FileInfo>,
    pub snapshot: TaskSnapshot,
    pub last_report: Option<JobReport>,

    // Reports finished in this session, most recent first.
    pub session: Vec<JobReport>,
    pub history_filter: HistoryFilter,
    pub history_filter_editing: bool,
}

impl Default for UiState {
    fn default() -> Self {
        Self {
            tab: TAB_ANALYSIS,
            info: String::new(),
            analysis_form: AnalysisForm::default(),
            compare_form: CompareForm::default(),
            compare_selected: 0,
            analysis_config: JobKind::Analysis.default_config(),
            compare_config: JobKind::Comparison.default_config(),
            job_kind: None,
            job_files: Vec::new(),
            snapshot: TaskSnapshot::default(),
            last_report: None,
            session: Vec::new(),
            history_filter: HistoryFilter::default(),
            history_filter_editing: false,
        }
    }
}

impl UiState {
    /// Snapshot to display on the tab for `kind`.
    pub fn snapshot_for(&self, kind: JobKind) -> Option<&TaskSnapshot> {
        (self.job_kind == Some(kind)).then_some(&self.snapshot)
    }

    /// Report to display on the tab for `kind`.
    pub fn report_for(&self, kind: JobKind) -> Option<&JobReport> {
        self.last_report.as_ref().filter(|r| r.kind == kind)
    }

    pub fn apply_event(&mut self, ev: TaskEvent) {
        match ev {
            TaskEvent::Started { request } => {
                self.job_kind = Some(request.kind);
                self.job_files = request.files.clone();
                self.snapshot = TaskSnapshot::default();
                self.last_report = None;
                self.info = match request.warning() {
                    Some(warning) => format!("{} started; {warning}", request.kind.label()),
                    None => format!("{} started", request.kind.label()),
                };
                self.tab = match request.kind {
                    JobKind::Analysis => TAB_ANALYSIS,
                    JobKind::Comparison => TAB_COMPARE,
                };
            }
            TaskEvent::Progress(snap) => self.snapshot = snap,
            TaskEvent::Cancelled { kind, snapshot } => {
                self.info = format!(
                    "{} cancelled at {}",
                    kind.label(),
                    metrics::format_percent(snapshot.progress)
                );
                self.snapshot = snapshot;
            }
            TaskEvent::Finished { report } => self.record_report(*report),
            TaskEvent::Info(info) => self.info = info.to_message(),
        }
    }

    pub fn record_report(&mut self, report: JobReport) {
        self.snapshot.status = report.status;
        self.snapshot.progress = report.progress;
        self.info = match report.failure.as_deref() {
            Some(reason) => format!("{} failed: {reason}", report.id),
            None => format!("{} {}", report.id, report.status),
        };
        self.session.insert(0, report.clone());
        self.last_report = Some(report);
    }

    pub fn next_tab(&mut self) {
        self.tab = (self.tab + 1) % TAB_COUNT;
    }

    pub fn prev_tab(&mut self) {
        self.tab = (self.tab + TAB_COUNT - 1) % TAB_COUNT;
    }

    /// Cycle the history status filter: all, completed, failed, processing.
    pub fn cycle_status_filter(&mut self) {
        self.history_filter.status = match self.history_filter.status {
            None => Some(RecordStatus::Completed),
            Some(RecordStatus::Completed) => Some(RecordStatus::Failed),
            Some(RecordStatus::Failed) => Some(RecordStatus::Processing),
            Some(RecordStatus::Processing) => None,
        };
    }

    pub fn remove_selected_compare_file(&mut self) {
        self.compare_form.remove_file(self.compare_selected);
        if self.compare_selected >= self.compare_form.files.len() {
            self.compare_selected = self.compare_form.files.len().saturating_sub(1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{AnalysisOption, InfoEvent, JobRequest, TaskStatus};
    use std::path::PathBuf;

    fn started(kind: JobKind) -> TaskEvent {
        TaskEvent::Started {
            request: Box::new(JobRequest {
                kind,
                files: vec![FileInfo {
                    name: "a.fa".into(),
                    size: 1,
                }],
                reference: None,
                options: Vec::new(),
                config: kind.default_config(),
            }),
        }
    }

    #[test]
    fn started_job_switches_to_its_tab() {
        let mut state = UiState {
            tab: TAB_HISTORY,
            ..Default::default()
        };
        state.apply_event(started(JobKind::Comparison));
        assert_eq!(state.tab, TAB_COMPARE);
        assert!(state.snapshot_for(JobKind::Comparison).is_some());
        assert!(state.snapshot_for(JobKind::Analysis).is_none());
    }

    #[test]
    fn start_notice_carries_the_reference_warning() {
        let mut state = UiState::default();
        state.apply_event(started(JobKind::Analysis));
        assert_eq!(state.info, "Analysis started");

        let TaskEvent::Started { mut request } = started(JobKind::Analysis) else {
            unreachable!()
        };
        request.options = vec![AnalysisOption::Mutation];
        state.apply_event(TaskEvent::Started { request });
        assert_eq!(
            state.info,
            "Analysis started; mutation detection selected without a reference sequence"
        );
    }

    #[test]
    fn finished_reports_land_in_session_history() {
        let mut state = UiState::default();
        state.apply_event(started(JobKind::Analysis));
        let report = JobReport {
            id: "ANL-2026-001".into(),
            timestamp_utc: String::new(),
            kind: JobKind::Analysis,
            files: Vec::new(),
            reference: None,
            options: Vec::new(),
            status: TaskStatus::Completed,
            progress: 100.0,
            ticks: 7,
            duration_ms: 3500,
            failure: None,
            config: RunnerConfig::default(),
            sample_results: Vec::new(),
        };
        state.apply_event(TaskEvent::Finished {
            report: Box::new(report),
        });
        assert_eq!(state.session.len(), 1);
        assert_eq!(state.snapshot.status, TaskStatus::Completed);
        assert!(state.report_for(JobKind::Analysis).is_some());
        assert!(state.report_for(JobKind::Comparison).is_none());
        assert_eq!(state.info, "ANL-2026-001 completed");
    }

    #[test]
    fn info_and_cancel_update_the_status_line() {
        let mut state = UiState::default();
        state.apply_event(TaskEvent::Info(InfoEvent::Message("hello".into())));
        assert_eq!(state.info, "hello");
        state.apply_event(TaskEvent::Cancelled {
            kind: JobKind::Analysis,
            snapshot: TaskSnapshot {
                status: TaskStatus::Running,
                progress: 45.0,
                ..Default::default()
            },
        });
        assert_eq!(state.info, "Analysis cancelled at 45%");
        assert_eq!(state.snapshot.progress, 45.0);
    }

    #[test]
    fn tabs_and_filters_cycle() {
        let mut state = UiState::default();
        state.prev_tab();
        assert_eq!(state.tab, TAB_HELP);
        state.next_tab();
        assert_eq!(state.tab, TAB_ANALYSIS);

        for expected in [
            Some(RecordStatus::Completed),
            Some(RecordStatus::Failed),
            Some(RecordStatus::Processing),
            None,
        ] {
            state.cycle_status_filter();
            assert_eq!(state.history_filter.status, expected);
        }
    }

    #[test]
    fn removing_files_keeps_selection_in_range() {
        let mut state = UiState::default();
        state.compare_form.files = vec![PathBuf::from("a.fa"), PathBuf::from("b.fa")];
        state.compare_selected = 1;
        state.remove_selected_compare_file();
        assert_eq!(state.compare_form.files, vec![PathBuf::from("a.fa")]);
        assert_eq!(state.compare_selected, 0);
    }
}
