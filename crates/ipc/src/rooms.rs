//! The three operating rooms (BO1/BO2/BO3). Each has its own counting
//! semaphore (capacity 1, matching the original shared-memory room lock)
//! plus a small mutex-guarded state record so `STATUS SURGERY` can report
//! who occupies what.

use std::sync::Mutex;

use common::{PatientId, Tick};

use crate::semaphore::{CountingSemaphore, Permit};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RoomId {
    Bo1,
    Bo2,
    Bo3,
}

impl RoomId {
    pub fn all() -> [RoomId; 3] {
        [RoomId::Bo1, RoomId::Bo2, RoomId::Bo3]
    }

    pub fn index(self) -> usize {
        match self {
            RoomId::Bo1 => 0,
            RoomId::Bo2 => 1,
            RoomId::Bo3 => 2,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoomState {
    Free,
    Occupied {
        patient_id: PatientId,
        start_tick: Tick,
        end_tick: Tick,
    },
    Cleaning,
}

struct Room {
    semaphore: CountingSemaphore,
    state: Mutex<RoomState>,
}

/// The full set of operating rooms. Acquiring a room permit is step one of
/// the surgery worker's resource-acquisition phase; the permit must outlive
/// both the operation and the cleanup sleep, since the room stays reserved
/// (FREE only happens at the very end) for the whole occupied+cleaning span.
pub struct RoomTable {
    rooms: [Room; 3],
}

impl RoomTable {
    pub fn new() -> Self {
        RoomTable {
            rooms: [
                Room {
                    semaphore: CountingSemaphore::new(1),
                    state: Mutex::new(RoomState::Free),
                },
                Room {
                    semaphore: CountingSemaphore::new(1),
                    state: Mutex::new(RoomState::Free),
                },
                Room {
                    semaphore: CountingSemaphore::new(1),
                    state: Mutex::new(RoomState::Free),
                },
            ],
        }
    }

    pub fn acquire(
        &self,
        room: RoomId,
        timeout: std::time::Duration,
    ) -> Option<Permit<'_>> {
        self.rooms[room.index()].semaphore.acquire_timeout(timeout)
    }

    pub fn mark_occupied(&self, room: RoomId, patient_id: PatientId, start_tick: Tick, end_tick: Tick) {
        let mut state = self.rooms[room.index()]
            .state
            .lock()
            .unwrap_or_else(|e| e.into_inner());
        *state = RoomState::Occupied {
            patient_id,
            start_tick,
            end_tick,
        };
    }

    pub fn mark_cleaning(&self, room: RoomId) {
        let mut state = self.rooms[room.index()]
            .state
            .lock()
            .unwrap_or_else(|e| e.into_inner());
        *state = RoomState::Cleaning;
    }

    pub fn mark_free(&self, room: RoomId) {
        let mut state = self.rooms[room.index()]
            .state
            .lock()
            .unwrap_or_else(|e| e.into_inner());
        *state = RoomState::Free;
    }

    pub fn state(&self, room: RoomId) -> RoomState {
        self.rooms[room.index()]
            .state
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    pub fn shutdown(&self) {
        for room in &self.rooms {
            room.semaphore.shutdown();
        }
    }
}

impl Default for RoomTable {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn starts_free() {
        let rooms = RoomTable::new();
        assert_eq!(rooms.state(RoomId::Bo1), RoomState::Free);
    }

    #[test]
    fn occupied_then_cleaning_then_free_transitions() {
        let rooms = RoomTable::new();
        let permit = rooms
            .acquire(RoomId::Bo2, Duration::from_millis(50))
            .unwrap();
        rooms.mark_occupied(RoomId::Bo2, "PAC00001".into(), 10, 40);
        assert!(matches!(rooms.state(RoomId::Bo2), RoomState::Occupied { .. }));

        rooms.mark_cleaning(RoomId::Bo2);
        assert_eq!(rooms.state(RoomId::Bo2), RoomState::Cleaning);

        drop(permit);
        rooms.mark_free(RoomId::Bo2);
        assert_eq!(rooms.state(RoomId::Bo2), RoomState::Free);
    }

    #[test]
    fn second_acquire_blocks_until_timeout() {
        let rooms = RoomTable::new();
        let _held = rooms.acquire(RoomId::Bo3, Duration::from_millis(50)).unwrap();
        let second = rooms.acquire(RoomId::Bo3, Duration::from_millis(20));
        assert!(second.is_none());
    }
}
