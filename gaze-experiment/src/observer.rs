use std::cell::RefCell;
use std::rc::Rc;

use gaze_core::{CalibrationEnd, TrialSnapshot};

/// Notifications emitted by [`crate::TrialEngine`].
///
/// Every method defaults to doing nothing, so hosts implement only what they
/// render. Each call receives its own snapshot. Observers must not call back
/// into the engine.
#[allow(unused_variables)]
pub trait ExperimentObserver {
    fn did_experiment_start(&mut self, state: TrialSnapshot) {}
    fn did_experiment_end(&mut self, state: TrialSnapshot) {}
    fn did_state_change(&mut self, state: TrialSnapshot) {}
    fn did_animation_start(&mut self, state: TrialSnapshot) {}
    fn did_animation_stop(&mut self, state: TrialSnapshot) {}
    /// Periodic tick while an interesting trial's animation is idling.
    fn did_animation_change(&mut self, state: TrialSnapshot) {}
    /// Cue shown or hidden; `cue_time_elapsed` is set on hide.
    fn did_cue_change(&mut self, state: TrialSnapshot) {}
    /// Operator reported a saccade; see `is_saccade_away`.
    fn did_saccade(&mut self, state: TrialSnapshot) {}
    fn did_not_saccade(&mut self, state: TrialSnapshot) {}
    fn did_calibration_end(&mut self, state: TrialSnapshot, reason: CalibrationEnd) {}
}

impl<O: ExperimentObserver + ?Sized> ExperimentObserver for Rc<RefCell<O>> {
    fn did_experiment_start(&mut self, state: TrialSnapshot) {
        self.borrow_mut().did_experiment_start(state)
    }
    fn did_experiment_end(&mut self, state: TrialSnapshot) {
        self.borrow_mut().did_experiment_end(state)
    }
    fn did_state_change(&mut self, state: TrialSnapshot) {
        self.borrow_mut().did_state_change(state)
    }
    fn did_animation_start(&mut self, state: TrialSnapshot) {
        self.borrow_mut().did_animation_start(state)
    }
    fn did_animation_stop(&mut self, state: TrialSnapshot) {
        self.borrow_mut().did_animation_stop(state)
    }
    fn did_animation_change(&mut self, state: TrialSnapshot) {
        self.borrow_mut().did_animation_change(state)
    }
    fn did_cue_change(&mut self, state: TrialSnapshot) {
        self.borrow_mut().did_cue_change(state)
    }
    fn did_saccade(&mut self, state: TrialSnapshot) {
        self.borrow_mut().did_saccade(state)
    }
    fn did_not_saccade(&mut self, state: TrialSnapshot) {
        self.borrow_mut().did_not_saccade(state)
    }
    fn did_calibration_end(&mut self, state: TrialSnapshot, reason: CalibrationEnd) {
        self.borrow_mut().did_calibration_end(state, reason)
    }
}

/// Observer that ignores everything; installed until the host sets one.
#[derive(Debug, Default)]
pub struct NoopObserver;

impl ExperimentObserver for NoopObserver {}
