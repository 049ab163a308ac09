//! Lightweight performance instrumentation.
//!
//! Scopes report their elapsed time through `tracing` when enabled with
//! `--perf`; otherwise dropping a scope costs one atomic load.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

static ENABLED: AtomicBool = AtomicBool::new(false);

/// Timing guard created by [`scope`]; reports when dropped.
#[derive(Debug)]
pub struct Scope {
    name: &'static str,
    start: Instant,
}

impl Scope {
    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }
}

impl Drop for Scope {
    fn drop(&mut self) {
        if !is_enabled() {
            return;
        }
        let elapsed_ms = self.start.elapsed().as_secs_f64() * 1000.0;
        tracing::info!(target: "markview::perf", scope = self.name, elapsed_ms, "timing");
    }
}

pub fn set_enabled(enabled: bool) {
    ENABLED.store(enabled, Ordering::Relaxed);
}

pub fn scope(name: &'static str) -> Scope {
    Scope {
        name,
        start: Instant::now(),
    }
}

pub fn is_enabled() -> bool {
    ENABLED.load(Ordering::Relaxed)
}
