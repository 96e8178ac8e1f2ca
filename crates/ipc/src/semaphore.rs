//! Counting semaphore over `Mutex<usize> + Condvar`, used everywhere the
//! original design used a System-V counting semaphore: rooms (1 permit
//! each), the medical-team pool (2), LAB1/LAB2 slots, pharmacy concurrency
//! (4). `acquire_timeout` is what turns "resource unavailable" into a
//! cancellation instead of an indefinite block.

use std::sync::{Condvar, Mutex};
use std::time::{Duration, Instant};

struct State {
    permits: usize,
    shutdown: bool,
}

pub struct CountingSemaphore {
    state: Mutex<State>,
    available: Condvar,
    capacity: usize,
}

/// RAII guard returned by `acquire`/`acquire_timeout`; dropping it releases
/// the permit. Holding a guard past its natural scope extends the hold, same
/// as holding a lock too long would.
pub struct Permit<'a> {
    sem: &'a CountingSemaphore,
}

impl Drop for Permit<'_> {
    fn drop(&mut self) {
        self.sem.release();
    }
}

impl CountingSemaphore {
    pub fn new(capacity: usize) -> Self {
        CountingSemaphore {
            state: Mutex::new(State {
                permits: capacity,
                shutdown: false,
            }),
            available: Condvar::new(),
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn available_permits(&self) -> usize {
        self.state.lock().unwrap_or_else(|e| e.into_inner()).permits
    }

    /// Blocks until a permit is free or the semaphore is shut down, in which
    /// case `None` is returned.
    pub fn acquire(&self) -> Option<Permit<'_>> {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        loop {
            if state.shutdown {
                return None;
            }
            if state.permits > 0 {
                state.permits -= 1;
                return Some(Permit { sem: self });
            }
            state = self
                .available
                .wait(state)
                .unwrap_or_else(|e| e.into_inner());
        }
    }

    /// Like `acquire` but gives up after `timeout`, returning `None` on
    /// either timeout or shutdown. Used by surgery resource acquisition,
    /// which treats exhaustion as a cancellation rather than an indefinite
    /// wait.
    pub fn acquire_timeout(&self, timeout: Duration) -> Option<Permit<'_>> {
        let deadline = Instant::now() + timeout;
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        loop {
            if state.shutdown {
                return None;
            }
            if state.permits > 0 {
                state.permits -= 1;
                return Some(Permit { sem: self });
            }
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return None;
            }
            let (next, result) = self
                .available
                .wait_timeout(state, remaining)
                .unwrap_or_else(|e| e.into_inner());
            state = next;
            if result.timed_out() && state.permits == 0 {
                return None;
            }
        }
    }

    fn release(&self) {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        if state.permits < self.capacity {
            state.permits += 1;
        }
        drop(state);
        self.available.notify_one();
    }

    pub fn shutdown(&self) {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        state.shutdown = true;
        drop(state);
        self.available.notify_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn acquire_and_release_round_trip() {
        let sem = CountingSemaphore::new(2);
        let a = sem.acquire().unwrap();
        let b = sem.acquire().unwrap();
        assert_eq!(sem.available_permits(), 0);
        drop(a);
        assert_eq!(sem.available_permits(), 1);
        drop(b);
        assert_eq!(sem.available_permits(), 2);
    }

    #[test]
    fn acquire_timeout_fails_when_exhausted() {
        let sem = CountingSemaphore::new(1);
        let _permit = sem.acquire().unwrap();
        let second = sem.acquire_timeout(Duration::from_millis(20));
        assert!(second.is_none());
    }

    #[test]
    fn never_exceeds_capacity_under_contention() {
        let sem = Arc::new(CountingSemaphore::new(2));
        let mut handles = Vec::new();
        for _ in 0..8 {
            let sem = sem.clone();
            handles.push(thread::spawn(move || {
                let _permit = sem.acquire().unwrap();
                assert!(sem.available_permits() <= 2);
                thread::sleep(Duration::from_millis(5));
            }));
        }
        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(sem.available_permits(), 2);
    }

    #[test]
    fn shutdown_wakes_blocked_waiter() {
        let sem = Arc::new(CountingSemaphore::new(1));
        let _held = sem.acquire().unwrap();
        let sem2 = sem.clone();
        let handle = thread::spawn(move || sem2.acquire().is_none());
        thread::sleep(Duration::from_millis(20));
        sem.shutdown();
        assert!(handle.join().unwrap());
    }
}
