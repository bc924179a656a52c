use gaze_core::{CalibrationEnd, CoreError, PermutationCycle, TrialSnapshot};
use gaze_experiment::{ExperimentObserver, LogEntry, SessionLog};
use rand::Rng;
use serde::Serialize;

/// Animation chosen for one interesting trial.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnimationPick {
    pub trial: u32,
    pub animation: usize,
}

/// Headless stand-in for the display: keeps the session log and picks an
/// animation for every interesting trial without repeats inside a pass.
pub struct Host<R: Rng> {
    log: SessionLog,
    animations: PermutationCycle,
    rng: R,
    picks: Vec<AnimationPick>,
}

impl<R: Rng> Host<R> {
    pub fn new(animation_count: usize, mut rng: R) -> Result<Self, CoreError> {
        let animations = PermutationCycle::new(animation_count, &mut rng)?;
        Ok(Self {
            log: SessionLog::new(),
            animations,
            rng,
            picks: Vec::new(),
        })
    }

    pub fn entries(&self) -> &[LogEntry] {
        self.log.entries()
    }

    pub fn picks(&self) -> &[AnimationPick] {
        &self.picks
    }

    fn pick_for(&mut self, state: &TrialSnapshot) {
        if !state.is_interesting_trial() || state.trial_number == 0 {
            return;
        }
        if self.picks.last().is_some_and(|p| p.trial == state.trial_number) {
            return;
        }
        let animation = self.animations.next(&mut self.rng);
        self.picks.push(AnimationPick {
            trial: state.trial_number,
            animation,
        });
    }
}

impl<R: Rng> ExperimentObserver for Host<R> {
    fn did_experiment_start(&mut self, state: TrialSnapshot) {
        self.log.did_experiment_start(state)
    }
    fn did_experiment_end(&mut self, state: TrialSnapshot) {
        self.log.did_experiment_end(state)
    }
    fn did_state_change(&mut self, state: TrialSnapshot) {
        self.log.did_state_change(state)
    }
    fn did_animation_start(&mut self, state: TrialSnapshot) {
        self.pick_for(&state);
        self.log.did_animation_start(state)
    }
    fn did_animation_stop(&mut self, state: TrialSnapshot) {
        self.log.did_animation_stop(state)
    }
    fn did_animation_change(&mut self, state: TrialSnapshot) {
        self.log.did_animation_change(state)
    }
    fn did_cue_change(&mut self, state: TrialSnapshot) {
        self.log.did_cue_change(state)
    }
    fn did_saccade(&mut self, state: TrialSnapshot) {
        self.log.did_saccade(state)
    }
    fn did_not_saccade(&mut self, state: TrialSnapshot) {
        self.log.did_not_saccade(state)
    }
    fn did_calibration_end(&mut self, state: TrialSnapshot, reason: CalibrationEnd) {
        self.log.did_calibration_end(state, reason)
    }
}
