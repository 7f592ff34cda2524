mod help;
mod state;

use crate::cli::{self, Cli, Command};
use crate::fixtures::{search_references, Catalog, StatCard, StaticCatalog};
use crate::metrics;
use crate::model::{AnalysisOption, JobKind, JobReport, TaskEvent, TaskSnapshot, TaskStatus};
use crate::orchestrator::{self, UiCommand};
use anyhow::{Context, Result};
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Gauge, Paragraph, Tabs, Wrap},
    Terminal,
};
use state::{
    UiState, TAB_ANALYSIS, TAB_COMPARE, TAB_HELP, TAB_HISTORY, TAB_QUALITY, TAB_REFERENCES,
};
use std::{io, time::Duration, time::Instant};
use tokio::sync::mpsc;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};

pub async fn run(args: Cli) -> Result<()> {
    // Unbounded channels avoid backpressure and task switching in the hot path.
    let (event_tx, event_rx) = mpsc::unbounded_channel::<TaskEvent>();
    let (cmd_tx, cmd_rx) = mpsc::unbounded_channel::<UiCommand>();

    let mut state = UiState {
        analysis_config: cli::build_config(&args, JobKind::Analysis),
        compare_config: cli::build_config(&args, JobKind::Comparison),
        ..Default::default()
    };
    let mut initial = None;
    match args.command.as_ref() {
        Some(Command::Analyze(a)) => {
            state.analysis_form = cli::analysis_form(a);
            state.tab = TAB_ANALYSIS;
            if args.start_on_launch {
                match state.analysis_form.submit(state.analysis_config.clone()) {
                    Ok(req) => initial = Some(req),
                    Err(e) => state.info = format!("Cannot start: {e}"),
                }
            }
        }
        Some(Command::Compare(c)) => {
            state.compare_form = cli::compare_form(c);
            state.tab = TAB_COMPARE;
            if args.start_on_launch {
                match state.compare_form.submit(state.compare_config.clone()) {
                    Ok(req) => initial = Some(req),
                    Err(e) => state.info = format!("Cannot start: {e}"),
                }
            }
        }
        _ => {}
    }

    // TUI runs in a dedicated thread to keep all blocking I/O out of the Tokio runtime.
    let ui_args = args.clone();
    let ui_handle = std::thread::spawn(move || run_threaded(ui_args, state, event_rx, cmd_tx));

    let runner = cli::build_runner(&args);
    let res = orchestrator::run_controller(runner, initial, false, event_tx, cmd_rx).await;

    let join_res = tokio::task::spawn_blocking(move || ui_handle.join()).await;
    if let Ok(joined) = join_res {
        match joined {
            Ok(Ok(())) => {}
            Ok(Err(e)) => return Err(e),
            Err(_) => return Err(anyhow::anyhow!("TUI thread panicked")),
        }
    }

    res
}

/// Run the TUI loop on a dedicated thread.
fn run_threaded(
    args: Cli,
    mut state: UiState,
    mut event_rx: UnboundedReceiver<TaskEvent>,
    cmd_tx: UnboundedSender<UiCommand>,
) -> Result<()> {
    enable_raw_mode().context("enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen).ok();

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("create terminal")?;
    terminal.clear().ok();

    let tick_rate = Duration::from_millis(100);
    let mut last_tick = Instant::now();

    let res = loop {
        // Drain events without blocking to keep UI responsive.
        while let Ok(ev) = event_rx.try_recv() {
            match ev {
                TaskEvent::Finished { report } => handle_job_finished(&args, &mut state, *report),
                other => state.apply_event(other),
            }
        }

        if last_tick.elapsed() >= tick_rate {
            terminal.draw(|f| draw(f.area(), f, &state)).ok();
            last_tick = Instant::now();
        }

        // Poll input with a short timeout to avoid blocking the render loop.
        if event::poll(Duration::from_millis(10)).unwrap_or(false) {
            if let Ok(Event::Key(k)) = event::read() {
                if k.kind != KeyEventKind::Press {
                    continue;
                }
                if state.history_filter_editing {
                    match k.code {
                        KeyCode::Enter | KeyCode::Esc => state.history_filter_editing = false,
                        KeyCode::Backspace => {
                            state.history_filter.search.pop();
                        }
                        KeyCode::Char(c) => state.history_filter.search.push(c),
                        _ => {}
                    }
                    continue;
                }
                match (k.modifiers, k.code) {
                    (_, KeyCode::Char('q')) | (KeyModifiers::CONTROL, KeyCode::Char('c')) => {
                        let _ = cmd_tx.send(UiCommand::Quit);
                        break Ok(());
                    }
                    (_, KeyCode::Char('s')) => start_from_tab(&mut state, &cmd_tx),
                    (_, KeyCode::Char('x')) => {
                        let _ = cmd_tx.send(UiCommand::Cancel);
                    }
                    (_, KeyCode::Char('f')) => {
                        let _ = cmd_tx.send(UiCommand::Fail("stopped from dashboard".into()));
                    }
                    (_, KeyCode::Tab) => state.next_tab(),
                    (_, KeyCode::BackTab) => state.prev_tab(),
                    (_, KeyCode::Char('?')) => state.tab = TAB_HELP,
                    (_, KeyCode::Char(c @ '1'..='4')) if state.tab == TAB_ANALYSIS => {
                        let idx = (c as usize) - ('1' as usize);
                        let option = AnalysisOption::ALL[idx];
                        state.analysis_form.toggle_option(option);
                    }
                    (_, KeyCode::Up) | (_, KeyCode::Char('k')) if state.tab == TAB_COMPARE => {
                        state.compare_selected = state.compare_selected.saturating_sub(1);
                    }
                    (_, KeyCode::Down) | (_, KeyCode::Char('j')) if state.tab == TAB_COMPARE => {
                        if state.compare_selected + 1 < state.compare_form.files.len() {
                            state.compare_selected += 1;
                        }
                    }
                    (_, KeyCode::Char('d')) if state.tab == TAB_COMPARE => {
                        state.remove_selected_compare_file();
                    }
                    (_, KeyCode::Char('/')) if state.tab == TAB_HISTORY => {
                        state.history_filter_editing = true;
                    }
                    (_, KeyCode::Char('m')) if state.tab == TAB_HISTORY => {
                        state.cycle_status_filter();
                    }
                    _ => {}
                }
            }
        }
    };

    disable_raw_mode().ok();
    let mut stdout = io::stdout();
    execute!(stdout, LeaveAlternateScreen).ok();
    res
}

/// Validate the form on the current tab and ask the controller to run it.
fn start_from_tab(state: &mut UiState, cmd_tx: &UnboundedSender<UiCommand>) {
    let submitted = match state.tab {
        TAB_ANALYSIS => state.analysis_form.submit(state.analysis_config.clone()),
        TAB_COMPARE => state.compare_form.submit(state.compare_config.clone()),
        _ => {
            state.info = "Switch to the Analysis or Compare tab to start a job".into();
            return;
        }
    };
    match submitted {
        Ok(req) => {
            let _ = cmd_tx.send(UiCommand::Start(Box::new(req)));
        }
        Err(e) => state.info = format!("Cannot start: {e}"),
    }
}

fn handle_job_finished(args: &Cli, state: &mut UiState, report: JobReport) {
    let processed = orchestrator::process_job_completion(args.export_json.as_deref(), report);
    state.record_report(processed.report);
    if !processed.export_messages.is_empty() {
        state.info = processed.export_messages.join("; ");
    }
}

fn draw(area: Rect, f: &mut ratatui::Frame, state: &UiState) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(0), Constraint::Length(3)].as_ref())
        .split(area);

    let tabs = Tabs::new(vec![
        Line::from("Analysis"),
        Line::from("Compare"),
        Line::from("History"),
        Line::from("Quality"),
        Line::from("References"),
        Line::from("Help"),
    ])
    .select(state.tab)
    .block(Block::default().borders(Borders::ALL).title("genodash"))
    .highlight_style(Style::default().fg(Color::Yellow));
    f.render_widget(tabs, chunks[0]);

    match state.tab {
        TAB_ANALYSIS => draw_job(chunks[1], f, state, JobKind::Analysis),
        TAB_COMPARE => draw_job(chunks[1], f, state, JobKind::Comparison),
        TAB_HISTORY => draw_history(chunks[1], f, state),
        TAB_QUALITY => draw_quality(chunks[1], f),
        TAB_REFERENCES => draw_references(chunks[1], f),
        _ => help::draw_help(chunks[1], f),
    }

    let status = Paragraph::new(state.info.clone())
        .block(Block::default().borders(Borders::ALL).title("Status"));
    f.render_widget(status, chunks[2]);
}

fn status_style(status: TaskStatus) -> Style {
    let color = match status {
        TaskStatus::Idle => Color::Gray,
        TaskStatus::Running => Color::Cyan,
        TaskStatus::Completed => Color::Green,
        TaskStatus::Failed => Color::Red,
    };
    Style::default().fg(color).add_modifier(Modifier::BOLD)
}

fn form_lines(state: &UiState, kind: JobKind) -> Vec<Line<'static>> {
    let mut out = Vec::new();
    let label = Style::default().fg(Color::Gray);
    match kind {
        JobKind::Analysis => {
            let form = &state.analysis_form;
            let file = form
                .file
                .as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| "(none selected)".into());
            out.push(Line::from(vec![
                Span::styled("Sequence: ", label),
                Span::raw(file),
            ]));
            let reference = form
                .reference
                .as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| "(optional)".into());
            out.push(Line::from(vec![
                Span::styled("Reference: ", label),
                Span::raw(reference),
            ]));
            for line in crate::text_summary::option_lines(&form.options) {
                out.push(Line::from(format!("  {line}")));
            }
        }
        JobKind::Comparison => {
            let files = &state.compare_form.files;
            out.push(Line::from(vec![Span::styled(
                format!("Uploaded Sequences ({})", files.len()),
                label,
            )]));
            for (i, p) in files.iter().enumerate() {
                let marker = if i == state.compare_selected { "> " } else { "  " };
                out.push(Line::from(format!("{marker}{}", p.display())));
            }
            if !state.compare_form.ready() {
                out.push(Line::from(Span::styled(
                    "Select at least 2 files to compare",
                    Style::default().fg(Color::Yellow),
                )));
            }
        }
    }
    out
}

fn draw_job(area: Rect, f: &mut ratatui::Frame, state: &UiState, kind: JobKind) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(9), Constraint::Length(5), Constraint::Min(0)].as_ref())
        .split(area);

    let form = Paragraph::new(form_lines(state, kind))
        .wrap(Wrap { trim: true })
        .block(Block::default().borders(Borders::ALL).title(kind.label()));
    f.render_widget(form, rows[0]);

    let idle = TaskSnapshot::default();
    let snap = state.snapshot_for(kind).unwrap_or(&idle);
    draw_progress(rows[1], f, snap);

    let mut lines: Vec<Line> = Vec::new();
    if let Some(report) = state.report_for(kind) {
        for line in crate::text_summary::build_text_summary(report).lines {
            lines.push(Line::from(line));
        }
    } else if state.snapshot_for(kind).is_some() {
        for file in &state.job_files {
            lines.push(Line::from(format!("{} ({})", file.name, file.size_label())));
        }
    } else {
        lines.push(Line::from("Press 's' to start."));
    }
    let results = Paragraph::new(lines)
        .wrap(Wrap { trim: false })
        .block(Block::default().borders(Borders::ALL).title("Results"));
    f.render_widget(results, rows[2]);
}

fn draw_progress(area: Rect, f: &mut ratatui::Frame, snap: &TaskSnapshot) {
    let mut title = vec![Span::styled(snap.status.to_string(), status_style(snap.status))];
    if snap.status == TaskStatus::Running {
        if snap.ticking {
            title.push(Span::raw(format!(
                "  ~{}s remaining",
                metrics::eta_seconds(snap.progress)
            )));
        } else {
            title.push(Span::raw("  (cancelled)"));
        }
    }
    if let Some(reason) = snap.failure.as_deref() {
        title.push(Span::raw(format!("  {reason}")));
    }

    let gauge = Gauge::default()
        .block(Block::default().borders(Borders::ALL).title(Line::from(title)))
        .gauge_style(status_style(snap.status))
        .ratio((snap.progress / 100.0).clamp(0.0, 1.0))
        .label(metrics::format_percent(snap.progress));
    f.render_widget(gauge, area);
}

fn draw_history(area: Rect, f: &mut ratatui::Frame, state: &UiState) {
    let mut lines: Vec<Line> = Vec::new();
    let status = state
        .history_filter
        .status
        .map(|s| s.label())
        .unwrap_or("all");
    let cursor = if state.history_filter_editing { "_" } else { "" };
    lines.push(Line::from(vec![
        Span::styled("Search: ", Style::default().fg(Color::Gray)),
        Span::raw(format!("{}{cursor}", state.history_filter.search)),
        Span::styled("   Status: ", Style::default().fg(Color::Gray)),
        Span::raw(status),
    ]));
    lines.push(Line::from(""));

    if !state.session.is_empty() {
        lines.push(Line::from(Span::styled(
            "This session",
            Style::default().add_modifier(Modifier::BOLD),
        )));
        for r in &state.session {
            let files: Vec<&str> = r.files.iter().map(|f| f.name.as_str()).collect();
            lines.push(Line::from(vec![
                Span::raw(format!("{}  ", r.id)),
                Span::styled(format!("{:<10}", r.status.to_string()), status_style(r.status)),
                Span::raw(format!(
                    " {}  {}",
                    metrics::format_duration_ms(r.duration_ms),
                    files.join(", ")
                )),
            ]));
        }
        lines.push(Line::from(""));
    }

    lines.push(Line::from(Span::styled(
        "Recent analyses",
        Style::default().add_modifier(Modifier::BOLD),
    )));
    let records = state.history_filter.apply(StaticCatalog.history());
    for line in crate::text_summary::history_lines(&records) {
        lines.push(Line::from(line));
    }

    let p = Paragraph::new(lines).block(Block::default().borders(Borders::ALL).title("History"));
    f.render_widget(p, area);
}

fn draw_quality(area: Rect, f: &mut ratatui::Frame) {
    let catalog = StaticCatalog;
    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(65), Constraint::Percentage(35)].as_ref())
        .split(area);

    let mut lines: Vec<Line> = Vec::new();
    for card in catalog.quality_overview() {
        lines.push(card_line(card));
    }
    lines.push(Line::from(""));
    for m in catalog.quality_metrics() {
        let color = if m.meets_target() {
            Color::Green
        } else {
            Color::Red
        };
        lines.push(Line::from(vec![
            Span::raw(format!("{:<18} {:>5.1}%  ", m.name, m.value)),
            Span::styled(
                format!("{:<9}", m.rating.label()),
                Style::default().fg(color),
            ),
            Span::styled(
                format!(" target {:.1}%, {}", m.target, m.target_delta()),
                Style::default().fg(Color::Gray),
            ),
        ]));
    }
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        "Generated reports",
        Style::default().add_modifier(Modifier::BOLD),
    )));
    for r in catalog.quality_reports() {
        lines.push(Line::from(format!(
            "{}  {:<28} {:<15} {:.1}%  {} issues",
            r.id, r.title, r.period, r.score, r.issues
        )));
    }
    let quality = Paragraph::new(lines)
        .wrap(Wrap { trim: false })
        .block(Block::default().borders(Borders::ALL).title("Quality Reports"));
    f.render_widget(quality, cols[0]);

    let perf = catalog.performance_metrics();
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints(vec![Constraint::Length(3); perf.len()])
        .split(cols[1]);
    for (card, row) in perf.iter().zip(rows.iter()) {
        let gauge = Gauge::default()
            .block(Block::default().borders(Borders::ALL).title(card_line(card)))
            .gauge_style(Style::default().fg(Color::Cyan))
            .percent(u16::from(card.gauge.unwrap_or(0)))
            .label(card.value);
        f.render_widget(gauge, *row);
    }
}

fn card_line(card: &StatCard) -> Line<'static> {
    Line::from(vec![
        Span::raw(format!("{}: ", card.label)),
        Span::styled(card.value, Style::default().add_modifier(Modifier::BOLD)),
        Span::styled(format!("  {}", card.note), Style::default().fg(Color::Gray)),
    ])
}

fn draw_references(area: Rect, f: &mut ratatui::Frame) {
    let catalog = StaticCatalog;
    let genomes = search_references(catalog.reference_genomes(), "");
    let lines: Vec<Line> = crate::text_summary::reference_lines(&genomes, catalog.custom_sequences())
        .into_iter()
        .map(Line::from)
        .collect();
    let p = Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::ALL)
            .title("Sequence Database"),
    );
    f.render_widget(p, area);
}
