//! Job lifecycle controller.
//!
//! Owns the task runner, applies UI commands to it and republishes its state
//! as events for presentation layers.

use super::post_process::build_report;
use crate::engine::{SimulatedTaskRunner, TaskHandle};
use crate::model::{InfoEvent, JobRequest, TaskEvent, TaskSnapshot};
use anyhow::Result;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};
use tokio::time::Instant;

/// Commands emitted by UI layers to control the running job.
#[derive(Debug, Clone)]
pub(crate) enum UiCommand {
    Start(Box<JobRequest>),
    Cancel,
    Fail(String),
    Quit,
}

/// The job currently driven by the runner.
///
/// A cancelled job stays here so it can still be failed, but it no longer
/// counts as running.
pub(crate) struct ActiveJob {
    pub handle: TaskHandle,
    pub request: JobRequest,
    pub started: Instant,
    pub number: u64,
    pub cancelled: bool,
}

/// Run jobs as UI commands arrive and emit events back to presentation layers.
///
/// With `once` set the controller returns after the first job finishes or is
/// cancelled.
pub(crate) async fn run_controller(
    mut runner: SimulatedTaskRunner,
    initial: Option<JobRequest>,
    once: bool,
    event_tx: UnboundedSender<TaskEvent>,
    mut cmd_rx: UnboundedReceiver<UiCommand>,
) -> Result<()> {
    let mut state_rx = runner.subscribe();
    let mut jobs_started = 0u64;
    let mut active: Option<ActiveJob> = None;

    if let Some(request) = initial {
        jobs_started += 1;
        active = Some(start_job(&mut runner, request, jobs_started, &event_tx));
    }

    loop {
        tokio::select! {
            cmd = cmd_rx.recv() => {
                match cmd {
                    Some(UiCommand::Start(request)) => {
                        jobs_started += 1;
                        if !start_requested(&mut runner, &mut active, *request, jobs_started, once, &event_tx) {
                            break;
                        }
                    }
                    Some(UiCommand::Cancel) => match active.as_mut().filter(|job| !job.cancelled) {
                        Some(job) => {
                            if runner.cancel(job.handle) {
                                job.cancelled = true;
                                let _ = event_tx.send(TaskEvent::Cancelled {
                                    kind: job.request.kind,
                                    snapshot: runner.snapshot(),
                                });
                                if once {
                                    break;
                                }
                            }
                        }
                        None => {
                            let _ = event_tx.send(TaskEvent::Info(InfoEvent::Message(
                                "No job is running".into(),
                            )));
                        }
                    },
                    Some(UiCommand::Fail(reason)) => {
                        match active.as_ref() {
                            Some(job) => {
                                if let Err(e) = runner.fail(job.handle, &reason) {
                                    let _ = event_tx.send(TaskEvent::Info(InfoEvent::FailRejected(
                                        e.to_string(),
                                    )));
                                }
                            }
                            None => {
                                let _ = event_tx.send(TaskEvent::Info(InfoEvent::FailRejected(
                                    "no job is running".into(),
                                )));
                            }
                        }
                    }
                    Some(UiCommand::Quit) | None => {
                        if let Some(job) = active.take() {
                            runner.cancel(job.handle);
                        }
                        break;
                    }
                }
            }
            changed = state_rx.changed() => {
                if changed.is_err() {
                    break;
                }
                let snap = state_rx.borrow_and_update().clone();
                let _ = event_tx.send(TaskEvent::Progress(snap.clone()));
                if finish_if_done(&mut active, &snap, &event_tx) && once {
                    break;
                }
            }
        }
    }

    Ok(())
}

/// Replace the active job with `request`.
///
/// A job that finished but whose last update has not been seen yet still gets
/// its report first. Returns `false` when that report ends a `once` controller.
fn start_requested(
    runner: &mut SimulatedTaskRunner,
    active: &mut Option<ActiveJob>,
    request: JobRequest,
    number: u64,
    once: bool,
    event_tx: &UnboundedSender<TaskEvent>,
) -> bool {
    let snap = runner.snapshot();
    if finish_if_done(active, &snap, event_tx) && once {
        return false;
    }
    if let Some(prev) = active.take() {
        if !prev.cancelled {
            let _ = event_tx.send(replaced_event(&prev, &snap));
        }
    }
    *active = Some(start_job(runner, request, number, event_tx));
    true
}

fn start_job(
    runner: &mut SimulatedTaskRunner,
    request: JobRequest,
    number: u64,
    event_tx: &UnboundedSender<TaskEvent>,
) -> ActiveJob {
    let handle = runner.start(&request.config);
    log::debug!(
        "{} job {number} started with {} file(s)",
        request.kind.label(),
        request.files.len()
    );
    let _ = event_tx.send(TaskEvent::Started {
        request: Box::new(request.clone()),
    });
    ActiveJob {
        handle,
        request,
        started: Instant::now(),
        number,
        cancelled: false,
    }
}

/// Emit the report if `snap` shows the active job in a terminal state.
fn finish_if_done(
    active: &mut Option<ActiveJob>,
    snap: &TaskSnapshot,
    event_tx: &UnboundedSender<TaskEvent>,
) -> bool {
    let done = active
        .as_ref()
        .is_some_and(|job| snap.run_id() == job.handle.id() && snap.status.is_terminal());
    if !done {
        return false;
    }
    if let Some(job) = active.take() {
        let report = build_report(&job, snap);
        let _ = event_tx.send(TaskEvent::Finished {
            report: Box::new(report),
        });
    }
    true
}

fn replaced_event(prev: &ActiveJob, snap: &TaskSnapshot) -> TaskEvent {
    let progress = if snap.run_id() == prev.handle.id() {
        snap.progress
    } else {
        0.0
    };
    TaskEvent::Info(InfoEvent::Replaced {
        kind: prev.request.kind,
        progress,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::FixedStep;
    use crate::model::{FileInfo, JobKind, RunnerConfig, TaskStatus};
    use std::time::Duration;
    use tokio::sync::mpsc;

    fn request(kind: JobKind) -> JobRequest {
        JobRequest {
            kind,
            files: vec![FileInfo {
                name: "sample.fa".into(),
                size: 4096,
            }],
            reference: None,
            options: Vec::new(),
            config: RunnerConfig {
                tick_interval: Duration::from_millis(100),
                max_step_percent: 20.0,
                max_duration: None,
            },
        }
    }

    fn spawn(
        initial: Option<JobRequest>,
        once: bool,
    ) -> (
        mpsc::UnboundedReceiver<TaskEvent>,
        mpsc::UnboundedSender<UiCommand>,
        tokio::task::JoinHandle<Result<()>>,
    ) {
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
        let runner = SimulatedTaskRunner::new(Box::new(FixedStep(15.0)));
        let handle = tokio::spawn(run_controller(runner, initial, once, event_tx, cmd_rx));
        (event_rx, cmd_tx, handle)
    }

    fn drain(rx: &mut mpsc::UnboundedReceiver<TaskEvent>) -> Vec<TaskEvent> {
        let mut out = Vec::new();
        while let Ok(ev) = rx.try_recv() {
            out.push(ev);
        }
        out
    }

    #[tokio::test(start_paused = true)]
    async fn single_job_reports_completion() {
        let (mut rx, _cmd_tx, handle) = spawn(Some(request(JobKind::Analysis)), true);
        handle.await.unwrap().unwrap();

        let events = drain(&mut rx);
        assert!(matches!(events.first(), Some(TaskEvent::Started { .. })));
        let report = events
            .iter()
            .find_map(|ev| match ev {
                TaskEvent::Finished { report } => Some(report.clone()),
                _ => None,
            })
            .expect("finished event");
        assert_eq!(report.status, TaskStatus::Completed);
        assert_eq!(report.progress, 100.0);
        assert_eq!(report.ticks, 7);
        assert_eq!(report.duration_ms, 700);
        assert!(!report.sample_results.is_empty());

        let mut last = 0.0;
        for ev in &events {
            if let TaskEvent::Progress(s) = ev {
                assert!(s.progress >= last);
                last = s.progress;
            }
        }
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_freezes_and_ends_a_single_job() {
        let (mut rx, cmd_tx, handle) = spawn(Some(request(JobKind::Comparison)), true);
        tokio::time::sleep(Duration::from_millis(350)).await;
        cmd_tx.send(UiCommand::Cancel).unwrap();
        handle.await.unwrap().unwrap();

        let events = drain(&mut rx);
        let cancelled = events.iter().find_map(|ev| match ev {
            TaskEvent::Cancelled { kind, snapshot } => Some((*kind, snapshot.clone())),
            _ => None,
        });
        let (kind, snap) = cancelled.expect("cancelled event");
        assert_eq!(kind, JobKind::Comparison);
        assert_eq!(snap.progress, 45.0);
        assert_eq!(snap.status, TaskStatus::Running);
        assert!(!events
            .iter()
            .any(|ev| matches!(ev, TaskEvent::Finished { .. })));
    }

    #[tokio::test(start_paused = true)]
    async fn fail_produces_a_failed_report() {
        let (mut rx, cmd_tx, handle) = spawn(Some(request(JobKind::Analysis)), true);
        tokio::time::sleep(Duration::from_millis(250)).await;
        cmd_tx.send(UiCommand::Fail("operator abort".into())).unwrap();
        handle.await.unwrap().unwrap();

        let report = drain(&mut rx)
            .into_iter()
            .find_map(|ev| match ev {
                TaskEvent::Finished { report } => Some(report),
                _ => None,
            })
            .expect("finished event");
        assert_eq!(report.status, TaskStatus::Failed);
        assert_eq!(report.progress, 30.0);
        assert_eq!(report.failure.as_deref(), Some("operator abort"));
        assert!(report.sample_results.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn a_cancelled_job_can_still_be_failed() {
        let (mut rx, cmd_tx, handle) = spawn(Some(request(JobKind::Analysis)), false);
        tokio::time::sleep(Duration::from_millis(250)).await;
        cmd_tx.send(UiCommand::Cancel).unwrap();
        tokio::time::sleep(Duration::from_millis(10)).await;
        cmd_tx.send(UiCommand::Cancel).unwrap();
        cmd_tx.send(UiCommand::Fail("x".into())).unwrap();
        tokio::time::sleep(Duration::from_millis(10)).await;
        cmd_tx.send(UiCommand::Quit).unwrap();
        handle.await.unwrap().unwrap();

        let events = drain(&mut rx);
        assert!(!events
            .iter()
            .any(|ev| matches!(ev, TaskEvent::Info(InfoEvent::FailRejected(_)))));
        assert!(events.iter().any(|ev| matches!(
            ev,
            TaskEvent::Info(InfoEvent::Message(msg)) if msg == "No job is running"
        )));
        let report = events
            .into_iter()
            .find_map(|ev| match ev {
                TaskEvent::Finished { report } => Some(report),
                _ => None,
            })
            .expect("finished event");
        assert_eq!(report.status, TaskStatus::Failed);
        assert_eq!(report.progress, 30.0);
        assert_eq!(report.failure.as_deref(), Some("x"));
    }

    #[tokio::test(start_paused = true)]
    async fn starting_after_a_cancel_does_not_report_a_replacement() {
        let (mut rx, cmd_tx, handle) = spawn(Some(request(JobKind::Analysis)), false);
        tokio::time::sleep(Duration::from_millis(250)).await;
        cmd_tx.send(UiCommand::Cancel).unwrap();
        cmd_tx
            .send(UiCommand::Start(Box::new(request(JobKind::Comparison))))
            .unwrap();
        tokio::time::sleep(Duration::from_millis(10)).await;
        cmd_tx.send(UiCommand::Quit).unwrap();
        handle.await.unwrap().unwrap();

        let events = drain(&mut rx);
        assert!(!events
            .iter()
            .any(|ev| matches!(ev, TaskEvent::Info(InfoEvent::Replaced { .. }))));
        let starts = events
            .iter()
            .filter(|ev| matches!(ev, TaskEvent::Started { .. }))
            .count();
        assert_eq!(starts, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn finished_job_is_reported_before_its_replacement_starts() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut runner = SimulatedTaskRunner::new(Box::new(FixedStep(15.0)));
        let mut active = Some(start_job(&mut runner, request(JobKind::Analysis), 1, &tx));

        // Completes at 700ms; nothing has looked at the final update yet.
        tokio::time::sleep(Duration::from_millis(750)).await;
        assert_eq!(runner.snapshot().status, TaskStatus::Completed);

        assert!(start_requested(
            &mut runner,
            &mut active,
            request(JobKind::Comparison),
            2,
            false,
            &tx,
        ));
        let events = drain(&mut rx);
        assert_eq!(events.len(), 3);
        assert!(matches!(&events[0], TaskEvent::Started { request } if request.kind == JobKind::Analysis));
        match &events[1] {
            TaskEvent::Finished { report } => {
                assert_eq!(report.status, TaskStatus::Completed);
                assert_eq!(report.id.split('-').last(), Some("001"));
            }
            other => panic!("expected the finished report, got {other:?}"),
        }
        assert!(matches!(&events[2], TaskEvent::Started { request } if request.kind == JobKind::Comparison));
        assert_eq!(runner.snapshot().status, TaskStatus::Running);
        assert_eq!(active.as_ref().map(|job| job.number), Some(2));

        // In single-job mode that report is the end of the run.
        tokio::time::sleep(Duration::from_millis(2000)).await;
        assert!(!start_requested(
            &mut runner,
            &mut active,
            request(JobKind::Analysis),
            3,
            true,
            &tx,
        ));
        assert!(matches!(drain(&mut rx).as_slice(), [TaskEvent::Finished { .. }]));
        assert!(active.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn commands_without_a_job_are_harmless() {
        let (mut rx, cmd_tx, handle) = spawn(None, false);
        cmd_tx.send(UiCommand::Cancel).unwrap();
        cmd_tx.send(UiCommand::Fail("nothing".into())).unwrap();
        cmd_tx.send(UiCommand::Start(Box::new(request(JobKind::Analysis)))).unwrap();
        tokio::time::sleep(Duration::from_millis(250)).await;
        cmd_tx
            .send(UiCommand::Start(Box::new(request(JobKind::Comparison))))
            .unwrap();
        tokio::time::sleep(Duration::from_millis(50)).await;
        cmd_tx.send(UiCommand::Quit).unwrap();
        handle.await.unwrap().unwrap();

        let events = drain(&mut rx);
        assert!(events.iter().any(|ev| matches!(
            ev,
            TaskEvent::Info(InfoEvent::FailRejected(msg)) if msg == "no job is running"
        )));
        assert!(events.iter().any(|ev| matches!(
            ev,
            TaskEvent::Info(InfoEvent::Replaced { kind: JobKind::Analysis, progress }) if *progress == 30.0
        )));
        let starts = events
            .iter()
            .filter(|ev| matches!(ev, TaskEvent::Started { .. }))
            .count();
        assert_eq!(starts, 2);
    }
}
