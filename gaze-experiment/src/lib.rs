pub mod config;
pub mod log;
pub mod observer;
pub mod state;
pub mod trial;
pub use config::{ConfigError, Options, OptionsPatch, Timings};
pub use log::{LogEntry, SessionLog};
pub use observer::{ExperimentObserver, NoopObserver};
pub use state::{TrialEngine, VirtualEngine};
pub use trial::{TimerEvent, Transition, Trial, TrialDurations, TrialTimestamps};
