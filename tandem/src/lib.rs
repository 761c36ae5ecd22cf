#![deny(clippy::all)]

pub mod coordinator;
pub mod domain;
pub mod ports;
pub mod timer;

pub use coordinator::AccessCoordinator;
pub use domain::{AccessResult, NOT_FOUND, Record, Source, TimedValue, WriteResult, WriteStatus};
pub use ports::{CacheBackend, DurableBackend};
pub use timer::Timer;
