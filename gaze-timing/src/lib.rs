//! Clock and timer substrate for the trial engine.
//!
//! [`Scheduler`] queues one-shot and repeating events against any [`Clock`];
//! [`VirtualClock`] makes the whole thing deterministic for tests.

pub mod scheduler;
pub mod timer;

pub use scheduler::{MonotonicScheduler, Scheduler, TimerId, VirtualScheduler};
pub use timer::{Clock, Millis, MonotonicClock, VirtualClock};
