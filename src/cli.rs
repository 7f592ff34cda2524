use crate::engine::{FixedStep, RandomStep, SimulatedTaskRunner, StepSource};
use crate::fixtures::{search_references, Catalog, HistoryFilter, RecordStatus, StaticCatalog};
use crate::forms::{AnalysisForm, CompareForm};
use crate::metrics;
use crate::model::{AnalysisOption, JobKind, JobReport, JobRequest, RunnerConfig, TaskEvent, TaskStatus};
use crate::orchestrator::{self, UiCommand};
use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;
use tokio::sync::mpsc;

/// Output line routing for stdout/stderr writer.
enum OutputLine {
    Stdout(String),
    Stderr(String),
}

/// Spawn a blocking writer for stdout/stderr to avoid blocking async tasks.
fn spawn_output_writer() -> (
    mpsc::UnboundedSender<OutputLine>,
    tokio::task::JoinHandle<()>,
) {
    let (tx, mut rx) = mpsc::unbounded_channel::<OutputLine>();
    let handle = tokio::task::spawn_blocking(move || {
        let stdout = std::io::stdout();
        let stderr = std::io::stderr();
        let mut out = std::io::LineWriter::new(stdout.lock());
        let mut err = std::io::LineWriter::new(stderr.lock());

        while let Some(line) = rx.blocking_recv() {
            match line {
                OutputLine::Stdout(msg) => {
                    let _ = writeln!(out, "{}", msg);
                }
                OutputLine::Stderr(msg) => {
                    let _ = writeln!(err, "{}", msg);
                }
            }
        }

        let _ = out.flush();
        let _ = err.flush();
    });
    (tx, handle)
}

#[derive(Debug, Parser, Clone)]
#[command(
    name = "genodash",
    version,
    about = "Genomic analysis dashboard with simulated jobs and optional TUI"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Print JSON result and exit (no TUI)
    #[arg(long, global = true)]
    pub json: bool,

    /// Print text summary and exit (no TUI)
    #[arg(long, global = true)]
    pub text: bool,

    /// Run silently: suppress all output except errors (for scripting)
    #[arg(long, global = true)]
    pub silent: bool,

    /// Time between progress ticks (defaults to 500ms for analysis, 400ms for comparison)
    #[arg(long, global = true)]
    pub tick_interval: Option<humantime::Duration>,

    /// Largest progress step per tick, in percent (defaults to 15 for analysis, 12 for comparison)
    #[arg(long, global = true)]
    pub max_step: Option<f64>,

    /// Fail a job that has not finished after this long
    #[arg(long, global = true)]
    pub max_duration: Option<humantime::Duration>,

    /// Seed for the progress step generator (reproducible runs)
    #[arg(long, global = true)]
    pub seed: Option<u64>,

    /// Advance by this fixed step on every tick instead of a random one
    #[arg(long, global = true, conflicts_with = "seed")]
    pub fixed_step: Option<f64>,

    /// Export the finished job report as JSON
    #[arg(long, global = true)]
    pub export_json: Option<PathBuf>,

    /// Automatically start the job when the dashboard opens
    #[arg(long, default_value_t = true, action = clap::ArgAction::Set, global = true)]
    pub start_on_launch: bool,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Analyze a single sequence file
    Analyze(AnalyzeArgs),
    /// Compare two or more sequence files
    Compare(CompareArgs),
    /// List past analyses
    History(HistoryArgs),
    /// List reference genomes and custom sequences
    References(ReferencesArgs),
    /// Show quality metrics, generated quality reports and system performance
    Quality,
}

#[derive(Debug, Args, Clone)]
pub struct AnalyzeArgs {
    /// Sequence file (.fasta, .fa, .fas)
    pub file: Option<PathBuf>,

    /// Reference sequence for mutation detection
    #[arg(long)]
    pub reference: Option<PathBuf>,

    /// Analysis options to run
    #[arg(long = "option", value_enum, value_delimiter = ',', default_values_t = [AnalysisOption::Nucleotide, AnalysisOption::Gc])]
    pub options: Vec<AnalysisOption>,
}

#[derive(Debug, Args, Clone)]
pub struct CompareArgs {
    /// Sequence files to compare (at least two)
    pub files: Vec<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StatusFilter {
    All,
    Completed,
    Failed,
    Processing,
}

impl StatusFilter {
    fn to_record_status(self) -> Option<RecordStatus> {
        match self {
            StatusFilter::All => None,
            StatusFilter::Completed => Some(RecordStatus::Completed),
            StatusFilter::Failed => Some(RecordStatus::Failed),
            StatusFilter::Processing => Some(RecordStatus::Processing),
        }
    }
}

#[derive(Debug, Args, Clone)]
pub struct HistoryArgs {
    /// Search by filename or analysis id
    #[arg(long, default_value = "")]
    pub search: String,

    /// Filter by status
    #[arg(long, value_enum, default_value_t = StatusFilter::All)]
    pub status: StatusFilter,

    /// Filter by analysis type, e.g. "Full Analysis" ("all" disables)
    #[arg(long = "type", default_value = "all")]
    pub kind: String,
}

#[derive(Debug, Args, Clone)]
pub struct ReferencesArgs {
    /// Search by id, name or organism
    #[arg(long, default_value = "")]
    pub search: String,
}

pub async fn run(args: Cli) -> Result<()> {
    // Validate that --silent can only be used with --json
    if args.silent && !args.json {
        return Err(anyhow::anyhow!(
            "--silent can only be used with --json. Use --silent --json together."
        ));
    }

    match args.command.clone() {
        Some(Command::History(h)) => return run_history(&args, &h),
        Some(Command::References(r)) => return run_references(&args, &r),
        Some(Command::Quality) => return run_quality(&args),
        _ => {}
    }

    if args.uses_tui() {
        #[cfg(feature = "tui")]
        {
            return crate::tui::run(args).await;
        }
        #[cfg(not(feature = "tui"))]
        {
            // Fallback when built without TUI support.
            return run_job_headless(args).await;
        }
    }

    run_job_headless(args).await
}

impl Cli {
    /// Whether this invocation hands the terminal to the dashboard.
    pub fn uses_tui(&self) -> bool {
        let job = matches!(
            self.command,
            None | Some(Command::Analyze(_)) | Some(Command::Compare(_))
        );
        job && !self.json && !self.text
    }

    /// Log level used when `RUST_LOG` is not set.
    pub fn default_log_level(&self) -> &'static str {
        if cfg!(feature = "tui") && self.uses_tui() {
            // stderr would draw over the alternate screen
            "error"
        } else if self.verbose {
            "debug"
        } else {
            "warn"
        }
    }
}

/// Build the runner config for `kind`, applying CLI overrides.
pub fn build_config(args: &Cli, kind: JobKind) -> RunnerConfig {
    let mut cfg = kind.default_config();
    if let Some(d) = args.tick_interval {
        cfg.tick_interval = Duration::from(d);
    }
    if let Some(step) = args.max_step {
        cfg.max_step_percent = step;
    }
    cfg.max_duration = args.max_duration.map(Duration::from);
    cfg
}

/// Build a runner with the step generator selected on the command line.
pub fn build_runner(args: &Cli) -> SimulatedTaskRunner {
    let steps: Box<dyn StepSource> = match (args.fixed_step, args.seed) {
        (Some(step), _) => Box::new(FixedStep(step)),
        (None, Some(seed)) => Box::new(RandomStep::seeded(seed)),
        (None, None) => Box::new(RandomStep::from_entropy()),
    };
    SimulatedTaskRunner::new(steps)
}

pub fn analysis_form(a: &AnalyzeArgs) -> AnalysisForm {
    AnalysisForm {
        file: a.file.clone(),
        reference: a.reference.clone(),
        options: a.options.clone(),
    }
}

pub fn compare_form(c: &CompareArgs) -> CompareForm {
    CompareForm {
        files: c.files.clone(),
    }
}

/// Validate the job named on the command line.
fn build_request(args: &Cli) -> Result<JobRequest> {
    let request = match args.command.as_ref() {
        Some(Command::Analyze(a)) => {
            analysis_form(a).submit(build_config(args, JobKind::Analysis))?
        }
        Some(Command::Compare(c)) => {
            compare_form(c).submit(build_config(args, JobKind::Comparison))?
        }
        _ => {
            return Err(anyhow::anyhow!(
                "no job to run: use `genodash analyze <FILE>` or `genodash compare <FILE> <FILE>...`"
            ))
        }
    };
    Ok(request)
}

/// Run one job to completion without the TUI, printing text or JSON.
async fn run_job_headless(args: Cli) -> Result<()> {
    let request = build_request(&args)?;
    let silent = args.silent;
    let (out_tx, out_handle) = spawn_output_writer();
    let (evt_tx, mut evt_rx) = mpsc::unbounded_channel::<TaskEvent>();
    let (cmd_tx, cmd_rx) = mpsc::unbounded_channel::<UiCommand>();

    let runner = build_runner(&args);
    let controller = tokio::spawn(orchestrator::run_controller(
        runner,
        Some(request),
        true,
        evt_tx,
        cmd_rx,
    ));

    // Ctrl-C cancels the job; the controller then exits on its own.
    let cancel_tx = cmd_tx.clone();
    let signal_handle = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            let _ = cancel_tx.send(UiCommand::Cancel);
        }
    });

    let mut report: Option<JobReport> = None;
    let mut cancelled_at: Option<f64> = None;
    let mut last_ticks = 0u32;
    let mut label = "Job";

    while let Some(ev) = evt_rx.recv().await {
        match ev {
            TaskEvent::Started { request } => {
                label = request.kind.label();
                if !silent && !args.json {
                    let names: Vec<String> = request
                        .files
                        .iter()
                        .map(|f| format!("{} ({})", f.name, f.size_label()))
                        .collect();
                    let _ = out_tx.send(OutputLine::Stderr(format!(
                        "== {label}: {} ==",
                        names.join(", ")
                    )));
                    if request.kind == JobKind::Analysis {
                        for line in crate::text_summary::option_lines(&request.options) {
                            let _ = out_tx.send(OutputLine::Stderr(line));
                        }
                    }
                }
            }
            TaskEvent::Progress(snap) => {
                if !silent && snap.status == TaskStatus::Running && snap.ticks != last_ticks {
                    last_ticks = snap.ticks;
                    let _ = out_tx.send(OutputLine::Stderr(format!(
                        "{label}: {} (~{}s left)",
                        metrics::format_percent(snap.progress),
                        metrics::eta_seconds(snap.progress)
                    )));
                }
            }
            TaskEvent::Cancelled { snapshot, .. } => {
                cancelled_at = Some(snapshot.progress);
            }
            TaskEvent::Finished { report: r } => {
                report = Some(*r);
            }
            TaskEvent::Info(info) => {
                if !silent {
                    let _ = out_tx.send(OutputLine::Stderr(info.to_message()));
                }
            }
        }
    }

    signal_handle.abort();
    drop(cmd_tx);
    controller
        .await
        .context("controller task failed")?
        .context("job controller failed")?;

    let outcome = match report {
        Some(r) => {
            let processed = orchestrator::process_job_completion(args.export_json.as_deref(), r);
            if !silent {
                for msg in &processed.export_messages {
                    let _ = out_tx.send(OutputLine::Stderr(msg.clone()));
                }
            }
            if args.json {
                let out = serde_json::to_string_pretty(&processed.report)?;
                if !silent {
                    let _ = out_tx.send(OutputLine::Stdout(out));
                }
            } else {
                let summary = crate::text_summary::build_text_summary(&processed.report);
                for line in summary.lines {
                    let _ = out_tx.send(OutputLine::Stdout(line));
                }
            }
            match processed.report.status {
                TaskStatus::Failed => Err(anyhow::anyhow!(
                    "{} failed: {}",
                    processed.report.kind.label(),
                    processed.report.failure.as_deref().unwrap_or("unknown reason")
                )),
                _ => Ok(()),
            }
        }
        None => match cancelled_at {
            Some(p) => {
                if !silent {
                    let _ = out_tx.send(OutputLine::Stderr(format!(
                        "Cancelled at {}",
                        metrics::format_percent(p)
                    )));
                }
                Ok(())
            }
            None => Err(anyhow::anyhow!("job ended without a result")),
        },
    };

    drop(out_tx);
    let _ = out_handle.await;
    outcome
}

fn history_filter(h: &HistoryArgs) -> HistoryFilter {
    let kind = if h.kind.eq_ignore_ascii_case("all") {
        None
    } else {
        Some(h.kind.clone())
    };
    HistoryFilter {
        search: h.search.clone(),
        status: h.status.to_record_status(),
        kind,
    }
}

fn run_history(args: &Cli, h: &HistoryArgs) -> Result<()> {
    let catalog = StaticCatalog;
    let records = history_filter(h).apply(catalog.history());
    if args.json {
        let out = serde_json::to_string_pretty(&records).context("serialize history")?;
        if !args.silent {
            println!("{out}");
        }
        return Ok(());
    }
    for line in crate::text_summary::history_lines(&records) {
        println!("{line}");
    }
    Ok(())
}

fn run_references(args: &Cli, r: &ReferencesArgs) -> Result<()> {
    let catalog = StaticCatalog;
    let genomes = search_references(catalog.reference_genomes(), &r.search);
    if args.json {
        let out = serde_json::to_string_pretty(&serde_json::json!({
            "reference_genomes": genomes,
            "custom_sequences": catalog.custom_sequences(),
        }))
        .context("serialize references")?;
        if !args.silent {
            println!("{out}");
        }
        return Ok(());
    }
    for line in crate::text_summary::reference_lines(&genomes, catalog.custom_sequences()) {
        println!("{line}");
    }
    Ok(())
}

fn run_quality(args: &Cli) -> Result<()> {
    let catalog = StaticCatalog;
    if args.json {
        let out = serde_json::to_string_pretty(&serde_json::json!({
            "overview": catalog.quality_overview(),
            "metrics": catalog.quality_metrics(),
            "reports": catalog.quality_reports(),
            "performance": catalog.performance_metrics(),
        }))
        .context("serialize quality data")?;
        if !args.silent {
            println!("{out}");
        }
        return Ok(());
    }
    let lines = crate::text_summary::quality_lines(
        catalog.quality_overview(),
        catalog.quality_metrics(),
        catalog.quality_reports(),
    );
    for line in lines
        .into_iter()
        .chain(crate::text_summary::performance_lines(catalog.performance_metrics()))
    {
        println!("{line}");
    }
    Ok(())
}
