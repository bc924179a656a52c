use serde::{Deserialize, Serialize};

use crate::cue::{CueDirection, SaccadeAway};
use crate::epoch::Epoch;

/// Copy of the engine's trial state handed to observers and accessors.
///
/// Always produced by value; mutating one never reaches the engine.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrialSnapshot {
    /// Clock reading when the snapshot was taken.
    pub at_ms: u64,
    pub is_started: bool,
    /// 0 until the first press; odd trials are boring, even ones interesting.
    pub trial_number: u32,
    pub cue_duration: u64,
    pub is_calibrating: bool,
    /// Consecutive failed trials while calibrating.
    pub look_number: u32,
    pub is_animating: bool,
    pub is_distracting: bool,
    pub cue_direction: Option<CueDirection>,
    /// False once a premature response has been registered this trial.
    pub reward: bool,
    pub is_saccade_away: SaccadeAway,
    pub has_focus: bool,
    pub trial_number_at_calibration_end: Option<u32>,
    /// How long the cue actually stayed up; set when it is hidden.
    pub cue_time_elapsed: Option<u64>,
    pub epoch: Epoch,
}

impl TrialSnapshot {
    pub fn is_interesting_trial(&self) -> bool {
        self.trial_number % 2 == 0
    }

    pub fn is_boring_trial(&self) -> bool {
        self.trial_number % 2 == 1
    }

    /// Whether the run has reached its post-calibration trial budget.
    pub fn has_reached_trial_budget(&self) -> bool {
        self.trial_number_at_calibration_end
            .is_some_and(|end| self.trial_number >= end)
    }
}

/// Why calibration stopped adjusting the cue duration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CalibrationEnd {
    /// Duration fixed by the operator.
    Manual,
    /// Enough consecutive failed trials at the current duration.
    LookCriterion,
    /// Duration would have grown past the configured maximum.
    CueDurationMaximum,
}
