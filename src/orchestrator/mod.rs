//! Application-level orchestration utilities.
//!
//! This module owns job lifecycle control (start/cancel/fail/replace) and post-job
//! processing such as report building and exports. UI/CLI layers call into this
//! module to keep responsibilities separated.

mod controller;
mod post_process;

pub(crate) use controller::{run_controller, UiCommand};
pub(crate) use post_process::process_job_completion;
