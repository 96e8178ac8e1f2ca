//! Shared concurrency primitives and the aggregated state region
//! (`Bus`) every subsystem coordinator is spawned against.
//!
//! The original crate (`shm`) built these on top of named POSIX shared
//! memory segments for a multi-process layout. Collapsed to a single
//! process, `memmap2` and the segment lifecycle go away; every type here is
//! a plain `std::sync` primitive meant to live behind an `Arc`.

pub mod bus;
pub mod clock;
pub mod control;
pub mod lab_pool;
pub mod pending;
pub mod queue;
pub mod rooms;
pub mod semaphore;
pub mod stats;
pub mod stock;

pub use bus::Bus;
pub use clock::SharedClock;
pub use control::ControlStore;
pub use pending::PendingList;
pub use queue::PriorityQueue;
pub use semaphore::CountingSemaphore;
pub use stats::Stats;
pub use stock::StockTable;
