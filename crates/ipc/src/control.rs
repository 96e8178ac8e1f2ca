//! Control Store — global flags shared across every subsystem thread pool.
//!
//! In the original multi-process design this lived in 256 bytes of shared
//! memory; collapsed to a single process it is just an `Arc<ControlStore>`
//! over a handful of atomics. All fields are atomic so any thread can read
//! or flip them without taking a lock.
//! - shutdown: cooperative graceful shutdown, set once and never cleared
//! - kill_switch: immediate stop, bypasses in-flight waits
//! - config_version: bumped whenever configuration is reloaded

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

#[derive(Default)]
pub struct ControlStore {
    kill_switch: AtomicBool,
    shutdown: AtomicBool,
    config_version: AtomicU64,
}

impl ControlStore {
    pub fn new() -> Self {
        Self::default()
    }

    // --- Kill Switch ---

    pub fn is_killed(&self) -> bool {
        self.kill_switch.load(Ordering::Acquire)
    }

    pub fn set_kill_switch(&self, killed: bool) {
        self.kill_switch.store(killed, Ordering::Release);
    }

    // --- Shutdown ---

    pub fn is_shutdown(&self) -> bool {
        self.shutdown.load(Ordering::Acquire)
    }

    pub fn set_shutdown(&self, shutdown: bool) {
        self.shutdown.store(shutdown, Ordering::Release);
    }

    // --- Config Version ---

    pub fn config_version(&self) -> u64 {
        self.config_version.load(Ordering::Acquire)
    }

    pub fn increment_config_version(&self) -> u64 {
        self.config_version.fetch_add(1, Ordering::AcqRel) + 1
    }

    /// Check if any stop condition is active. Every blocking wait in the
    /// system polls this (directly or via a bounded timeout) so shutdown
    /// latency stays bounded.
    pub fn should_stop(&self) -> bool {
        self.is_killed() || self.is_shutdown()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_all_clear() {
        let ctrl = ControlStore::new();
        assert!(!ctrl.is_killed());
        assert!(!ctrl.is_shutdown());
        assert_eq!(ctrl.config_version(), 0);
        assert!(!ctrl.should_stop());
    }

    #[test]
    fn shutdown_and_kill_both_trip_should_stop() {
        let ctrl = ControlStore::new();
        ctrl.set_shutdown(true);
        assert!(ctrl.should_stop());

        let ctrl = ControlStore::new();
        ctrl.set_kill_switch(true);
        assert!(ctrl.should_stop());
    }

    #[test]
    fn config_version_increments_monotonically() {
        let ctrl = ControlStore::new();
        assert_eq!(ctrl.increment_config_version(), 1);
        assert_eq!(ctrl.increment_config_version(), 2);
        assert_eq!(ctrl.config_version(), 2);
    }
}
