//! The time-ordered scheduler list: validated actions wait here until their
//! `deliver_tick` is due. Kept sorted by `deliver_tick`, with ties broken by
//! insertion order, so equal-tick events fire in arrival order (Testable
//! Property: scheduler monotonicity).

use common::Tick;

use crate::validate::Action;

pub struct ScheduledEvent {
    pub deliver_tick: Tick,
    pub action: Action,
}

#[derive(Default)]
pub struct Scheduler {
    events: Vec<ScheduledEvent>,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts keeping the list sorted by `deliver_tick` ascending; within
    /// equal ticks, insertion order is preserved by always placing the new
    /// event after any existing ones sharing that tick.
    pub fn insert(&mut self, deliver_tick: Tick, action: Action) {
        let pos = self
            .events
            .partition_point(|e| e.deliver_tick <= deliver_tick);
        self.events.insert(pos, ScheduledEvent { deliver_tick, action });
    }

    pub fn next_deliver_tick(&self) -> Option<Tick> {
        self.events.first().map(|e| e.deliver_tick)
    }

    /// Drains every event with `deliver_tick <= current_tick`, in order.
    pub fn drain_due(&mut self, current_tick: Tick) -> Vec<ScheduledEvent> {
        let split = self
            .events
            .partition_point(|e| e.deliver_tick <= current_tick);
        self.events.drain(..split).collect()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drains_due_prefix_only() {
        let mut s = Scheduler::new();
        s.insert(5, Action::Help);
        s.insert(10, Action::Shutdown);
        s.insert(5, Action::Help);

        let due = s.drain_due(5);
        assert_eq!(due.len(), 2);
        assert_eq!(s.len(), 1);
        assert_eq!(s.next_deliver_tick(), Some(10));
    }

    #[test]
    fn equal_tick_events_preserve_insertion_order() {
        let mut s = Scheduler::new();
        for seq in 0..5u64 {
            s.insert(100, Action::Restock { medname: seq.to_string(), quantity: 0 });
        }
        let due = s.drain_due(100);
        let order: Vec<String> = due
            .into_iter()
            .map(|e| match e.action {
                Action::Restock { medname, .. } => medname,
                _ => unreachable!(),
            })
            .collect();
        assert_eq!(order, vec!["0", "1", "2", "3", "4"]);
    }

    #[test]
    fn out_of_order_insertion_still_sorts_by_deliver_tick() {
        let mut s = Scheduler::new();
        s.insert(20, Action::Shutdown);
        s.insert(5, Action::Help);
        s.insert(15, Action::Shutdown);
        assert_eq!(s.next_deliver_tick(), Some(5));
    }
}
