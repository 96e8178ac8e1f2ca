//! The simulation's single logical clock: one `AtomicU64` tick counter
//! shared across every subsystem, advanced only by the dispatch kernel's
//! main loop. Everything else reads it.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use common::Tick;

#[derive(Default)]
pub struct SharedClock {
    tick: AtomicU64,
}

impl SharedClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Tick {
        self.tick.load(Ordering::Acquire)
    }

    /// Promotes `delta` whole ticks, returning the new tick value. Called
    /// only by the kernel after accumulating enough elapsed wall-clock ms.
    pub fn advance(&self, delta: Tick) -> Tick {
        self.tick.fetch_add(delta, Ordering::AcqRel) + delta
    }
}

/// Blocks the calling thread for `n` simulated ticks at the configured
/// `time_unit_ms` rate. This is the tick-aligned sleep every worker uses for
/// simulated durations (triage treatment, surgery execution, lab turnaround,
/// pharmacy preparation) — it is wall-clock sleep, not a clock-driven wait,
/// since workers don't need to wake on every tick boundary.
pub fn wait_ticks(n: Tick, time_unit_ms: u64) {
    if n == 0 {
        return;
    }
    std::thread::sleep(Duration::from_millis(n * time_unit_ms));
}
