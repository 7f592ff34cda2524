use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Timer parameters for one simulated run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunnerConfig {
    #[serde(with = "humantime_serde")]
    pub tick_interval: Duration,
    pub max_step_percent: f64,
    /// Optional safety cutoff; the run fails with "timed out" when it elapses.
    #[serde(default, with = "humantime_serde")]
    pub max_duration: Option<Duration>,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        JobKind::Analysis.default_config()
    }
}

/// The two dashboard flows that drive a simulated task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobKind {
    Analysis,
    Comparison,
}

impl JobKind {
    /// Timer parameters each flow used before they were unified.
    pub fn default_config(self) -> RunnerConfig {
        match self {
            JobKind::Analysis => RunnerConfig {
                tick_interval: Duration::from_millis(500),
                max_step_percent: 15.0,
                max_duration: None,
            },
            JobKind::Comparison => RunnerConfig {
                tick_interval: Duration::from_millis(400),
                max_step_percent: 12.0,
                max_duration: None,
            },
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            JobKind::Analysis => "Analysis",
            JobKind::Comparison => "Comparison",
        }
    }

    /// Prefix used when numbering job reports, e.g. `ANL-2024-001`.
    pub fn id_prefix(self) -> &'static str {
        match self {
            JobKind::Analysis => "ANL",
            JobKind::Comparison => "CMP",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    #[default]
    Idle,
    Running,
    Completed,
    Failed,
}

impl TaskStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, TaskStatus::Completed | TaskStatus::Failed)
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TaskStatus::Idle => "idle",
            TaskStatus::Running => "running",
            TaskStatus::Completed => "completed",
            TaskStatus::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// Observable state of a simulated task.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TaskSnapshot {
    pub status: TaskStatus,
    pub progress: f64,
    pub ticks: u32,
    #[serde(default)]
    pub failure: Option<String>,
    /// Whether a timer is currently driving this run.
    #[serde(default)]
    pub ticking: bool,
    #[serde(skip)]
    pub(crate) generation: u64,
}

impl TaskSnapshot {
    /// Identifier of the run this snapshot belongs to (0 before the first start).
    pub fn run_id(&self) -> u64 {
        self.generation
    }
}

/// Analysis options offered by the single-file flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum AnalysisOption {
    Nucleotide,
    Gc,
    Mutation,
    Translation,
}

impl AnalysisOption {
    pub const ALL: [AnalysisOption; 4] = [
        AnalysisOption::Nucleotide,
        AnalysisOption::Gc,
        AnalysisOption::Mutation,
        AnalysisOption::Translation,
    ];

    pub fn label(self) -> &'static str {
        match self {
            AnalysisOption::Nucleotide => "Nucleotide Statistics",
            AnalysisOption::Gc => "GC Content Analysis",
            AnalysisOption::Mutation => "Mutation Detection",
            AnalysisOption::Translation => "Protein Translation",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            AnalysisOption::Nucleotide => "Calculate A, T, G, C distribution",
            AnalysisOption::Gc => "Analyze GC vs AT content ratios",
            AnalysisOption::Mutation => "Compare against reference sequence",
            AnalysisOption::Translation => "Translate DNA to amino acid sequences",
        }
    }
}

/// Display information for a selected input file. Contents are never read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileInfo {
    pub name: String,
    pub size: u64,
}

impl FileInfo {
    pub fn size_label(&self) -> String {
        crate::metrics::format_size_kb(self.size)
    }
}

/// Warning for mutation detection requested without a reference to compare against.
fn reference_warning(
    reference: Option<&FileInfo>,
    options: &[AnalysisOption],
) -> Option<&'static str> {
    (reference.is_none() && options.contains(&AnalysisOption::Mutation))
        .then_some("mutation detection selected without a reference sequence")
}

/// A validated request to start a job, produced by the form layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobRequest {
    pub kind: JobKind,
    pub files: Vec<FileInfo>,
    #[serde(default)]
    pub reference: Option<FileInfo>,
    #[serde(default)]
    pub options: Vec<AnalysisOption>,
    pub config: RunnerConfig,
}

impl JobRequest {
    pub fn warning(&self) -> Option<&'static str> {
        reference_warning(self.reference.as_ref(), &self.options)
    }
}

/// One labelled value on a result panel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryMetric {
    pub label: String,
    pub value: String,
}

/// Record of a finished job (completed or failed).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobReport {
    pub id: String,
    #[serde(default)]
    pub timestamp_utc: String,
    pub kind: JobKind,
    pub files: Vec<FileInfo>,
    #[serde(default)]
    pub reference: Option<FileInfo>,
    #[serde(default)]
    pub options: Vec<AnalysisOption>,
    pub status: TaskStatus,
    pub progress: f64,
    pub ticks: u32,
    pub duration_ms: u64,
    #[serde(default)]
    pub failure: Option<String>,
    pub config: RunnerConfig,
    /// Placeholder result panel; empty unless the job completed.
    #[serde(default)]
    pub sample_results: Vec<SummaryMetric>,
}

impl JobReport {
    pub fn warning(&self) -> Option<&'static str> {
        reference_warning(self.reference.as_ref(), &self.options)
    }
}

#[derive(Debug, Clone)]
pub enum TaskEvent {
    Started {
        request: Box<JobRequest>,
    },
    Progress(TaskSnapshot),
    Cancelled {
        kind: JobKind,
        snapshot: TaskSnapshot,
    },
    Finished {
        // Boxed to keep the enum small.
        report: Box<JobReport>,
    },
    Info(InfoEvent),
}

/// Structured info events emitted by the controller and consumed by UI/CLI layers.
#[derive(Debug, Clone)]
pub enum InfoEvent {
    Message(String),
    Replaced { kind: JobKind, progress: f64 },
    FailRejected(String),
}

impl InfoEvent {
    /// Render a human-readable message for UI/CLI layers.
    pub fn to_message(&self) -> String {
        match self {
            InfoEvent::Message(msg) => msg.clone(),
            InfoEvent::Replaced { kind, progress } => format!(
                "Replaced running {} at {}",
                kind.label().to_lowercase(),
                crate::metrics::format_percent(*progress)
            ),
            InfoEvent::FailRejected(reason) => format!("Cannot fail job: {reason}"),
        }
    }
}
