pub mod cue;
pub mod epoch;
pub mod error;
pub mod random;
pub mod snapshot;

pub use cue::{CueDirection, SaccadeAway};
pub use epoch::{Epoch, ResponseHandler};
pub use error::CoreError;
pub use random::{DEFAULT_RUN_WIDTH, DirectionCycle, PermutationCycle, random_binomials};
pub use snapshot::{CalibrationEnd, TrialSnapshot};
