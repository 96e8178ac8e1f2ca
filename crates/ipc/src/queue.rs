//! Blocking message queues used for every cross-subsystem handoff.
//!
//! The original System-V design filtered a single queue by `mtype`; here
//! each subsystem gets its own typed `PriorityQueue<T>` so the compiler
//! enforces what used to be a numeric convention. Priority ordering is
//! `Urgent` strictly before `High` strictly before `Normal`, ties broken by
//! arrival order (FIFO within a class) — see `Slot::seq`.
//!
//! `shutdown()` wakes every blocked receiver immediately; a woken receiver
//! observing the shutdown flag with an empty heap returns `None` rather than
//! blocking again, which is how poison-pill-free shutdown propagates.

use std::cmp::Ordering as CmpOrdering;
use std::collections::BinaryHeap;
use std::sync::{Condvar, Mutex};
use std::time::Duration;

use common::Priority;

struct Slot<T> {
    priority: Priority,
    seq: u64,
    item: T,
}

impl<T> PartialEq for Slot<T> {
    fn eq(&self, other: &Self) -> bool {
        self.priority == other.priority && self.seq == other.seq
    }
}
impl<T> Eq for Slot<T> {}

impl<T> PartialOrd for Slot<T> {
    fn partial_cmp(&self, other: &Self) -> Option<CmpOrdering> {
        Some(self.cmp(other))
    }
}

impl<T> Ord for Slot<T> {
    fn cmp(&self, other: &Self) -> CmpOrdering {
        // BinaryHeap is a max-heap; we want Urgent first and, within a
        // priority class, the earliest sequence number first.
        other
            .priority
            .cmp(&self.priority)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

struct State<T> {
    heap: BinaryHeap<Slot<T>>,
    next_seq: u64,
    shutdown: bool,
}

/// A priority-ordered mailbox. Cloning the `Arc` this lives behind gives
/// every producer and the single consuming dispatcher shared access.
pub struct PriorityQueue<T> {
    state: Mutex<State<T>>,
    not_empty: Condvar,
}

impl<T> PriorityQueue<T> {
    pub fn new() -> Self {
        PriorityQueue {
            state: Mutex::new(State {
                heap: BinaryHeap::new(),
                next_seq: 0,
                shutdown: false,
            }),
            not_empty: Condvar::new(),
        }
    }

    pub fn send(&self, priority: Priority, item: T) {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        let seq = state.next_seq;
        state.next_seq += 1;
        state.heap.push(Slot { priority, seq, item });
        drop(state);
        self.not_empty.notify_one();
    }

    /// Blocks until an item is available or the queue is shut down, in
    /// which case it returns `None` once drained.
    pub fn recv(&self) -> Option<T> {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        loop {
            if let Some(slot) = state.heap.pop() {
                return Some(slot.item);
            }
            if state.shutdown {
                return None;
            }
            state = self
                .not_empty
                .wait(state)
                .unwrap_or_else(|e| e.into_inner());
        }
    }

    /// Like `recv` but gives up after `timeout`, returning `None` either way
    /// — callers distinguish "empty" from "shut down" via `is_shutdown` if
    /// they need to.
    pub fn recv_timeout(&self, timeout: Duration) -> Option<T> {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        loop {
            if let Some(slot) = state.heap.pop() {
                return Some(slot.item);
            }
            if state.shutdown {
                return None;
            }
            let (next, result) = self
                .not_empty
                .wait_timeout(state, timeout)
                .unwrap_or_else(|e| e.into_inner());
            state = next;
            if result.timed_out() {
                return state.heap.pop().map(|s| s.item);
            }
        }
    }

    pub fn shutdown(&self) {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        state.shutdown = true;
        drop(state);
        self.not_empty.notify_all();
    }

    pub fn is_shutdown(&self) -> bool {
        self.state.lock().unwrap_or_else(|e| e.into_inner()).shutdown
    }

    pub fn len(&self) -> usize {
        self.state.lock().unwrap_or_else(|e| e.into_inner()).heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<T> Default for PriorityQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn urgent_strictly_before_high_before_normal() {
        let q = PriorityQueue::new();
        q.send(Priority::Normal, "n1");
        q.send(Priority::High, "h1");
        q.send(Priority::Urgent, "u1");
        q.send(Priority::Normal, "n2");

        assert_eq!(q.recv(), Some("u1"));
        assert_eq!(q.recv(), Some("h1"));
        assert_eq!(q.recv(), Some("n1"));
        assert_eq!(q.recv(), Some("n2"));
    }

    #[test]
    fn ties_within_a_class_are_fifo() {
        let q = PriorityQueue::new();
        q.send(Priority::Normal, 1);
        q.send(Priority::Normal, 2);
        q.send(Priority::Normal, 3);

        assert_eq!(q.recv(), Some(1));
        assert_eq!(q.recv(), Some(2));
        assert_eq!(q.recv(), Some(3));
    }

    #[test]
    fn shutdown_wakes_blocked_receiver() {
        let q = Arc::new(PriorityQueue::<i32>::new());
        let q2 = q.clone();
        let handle = thread::spawn(move || q2.recv());
        thread::sleep(Duration::from_millis(20));
        q.shutdown();
        assert_eq!(handle.join().unwrap(), None);
    }

    #[test]
    fn recv_timeout_returns_none_when_empty() {
        let q = PriorityQueue::<i32>::new();
        assert_eq!(q.recv_timeout(Duration::from_millis(10)), None);
    }
}
