/// Estimated seconds remaining for a running job, never less than one.
pub fn eta_seconds(progress: f64) -> u64 {
    let remaining = (100.0 - progress.clamp(0.0, 100.0)) * 0.1;
    (remaining.round() as u64).max(1)
}

/// Round progress to a whole percent for display.
pub fn format_percent(progress: f64) -> String {
    format!("{}%", progress.clamp(0.0, 100.0).round() as u64)
}

/// File size in KB with one decimal, e.g. `12.4 KB`.
pub fn format_size_kb(bytes: u64) -> String {
    format!("{:.1} KB", bytes as f64 / 1024.0)
}

/// Average progress gained per tick, if any tick has been applied.
pub fn mean_step(progress: f64, ticks: u32) -> Option<f64> {
    if ticks == 0 {
        return None;
    }
    Some(progress / ticks as f64)
}

/// Human duration with one decimal of seconds, e.g. `3.2s`.
pub fn format_duration_ms(ms: u64) -> String {
    format!("{:.1}s", ms as f64 / 1000.0)
}
