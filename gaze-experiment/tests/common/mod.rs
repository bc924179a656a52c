#![allow(dead_code)]

use std::cell::RefCell;
use std::rc::Rc;

use gaze_core::{CalibrationEnd, SaccadeAway, TrialSnapshot};
use gaze_experiment::{ExperimentObserver, Options, Timings, TrialEngine, VirtualEngine};
use gaze_timing::VirtualScheduler;
use rand::SeedableRng;
use rand::rngs::StdRng;

pub const DELAY: u64 = 1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    ExperimentStart,
    ExperimentEnd,
    StateChange,
    AnimationStart,
    AnimationStop,
    AnimationChange,
    CueChange,
    Saccade,
    NotSaccade,
    CalibrationEnd(CalibrationEnd),
}

#[derive(Debug, Default)]
pub struct Recorder {
    pub calls: Vec<(Event, TrialSnapshot)>,
}

impl Recorder {
    pub fn events(&self) -> Vec<Event> {
        self.calls.iter().map(|(e, _)| *e).collect()
    }

    pub fn count(&self, event: Event) -> usize {
        self.calls.iter().filter(|(e, _)| *e == event).count()
    }

    /// Saccade, not-saccade and calibration-end calls only.
    pub fn outcomes(&self) -> Vec<(Event, u32, SaccadeAway, u32)> {
        self.calls
            .iter()
            .filter(|(e, _)| {
                matches!(
                    e,
                    Event::Saccade | Event::NotSaccade | Event::CalibrationEnd(_)
                )
            })
            .map(|(e, s)| (*e, s.trial_number, s.is_saccade_away, s.look_number))
            .collect()
    }

    pub fn calibration_ends(&self) -> Vec<(CalibrationEnd, TrialSnapshot)> {
        self.calls
            .iter()
            .filter_map(|(e, s)| match e {
                Event::CalibrationEnd(reason) => Some((*reason, s.clone())),
                _ => None,
            })
            .collect()
    }

    pub fn clear(&mut self) {
        self.calls.clear();
    }

    fn record(&mut self, event: Event, state: TrialSnapshot) {
        self.calls.push((event, state));
    }
}

impl ExperimentObserver for Recorder {
    fn did_experiment_start(&mut self, state: TrialSnapshot) {
        self.record(Event::ExperimentStart, state);
    }
    fn did_experiment_end(&mut self, state: TrialSnapshot) {
        self.record(Event::ExperimentEnd, state);
    }
    fn did_state_change(&mut self, state: TrialSnapshot) {
        self.record(Event::StateChange, state);
    }
    fn did_animation_start(&mut self, state: TrialSnapshot) {
        self.record(Event::AnimationStart, state);
    }
    fn did_animation_stop(&mut self, state: TrialSnapshot) {
        self.record(Event::AnimationStop, state);
    }
    fn did_animation_change(&mut self, state: TrialSnapshot) {
        self.record(Event::AnimationChange, state);
    }
    fn did_cue_change(&mut self, state: TrialSnapshot) {
        self.record(Event::CueChange, state);
    }
    fn did_saccade(&mut self, state: TrialSnapshot) {
        self.record(Event::Saccade, state);
    }
    fn did_not_saccade(&mut self, state: TrialSnapshot) {
        self.record(Event::NotSaccade, state);
    }
    fn did_calibration_end(&mut self, state: TrialSnapshot, reason: CalibrationEnd) {
        self.record(Event::CalibrationEnd(reason), state);
    }
}

pub fn engine_with(
    options: Options,
    delay: u64,
) -> (VirtualEngine<StdRng>, Rc<RefCell<Recorder>>) {
    let recorder = Rc::new(RefCell::new(Recorder::default()));
    let mut engine = TrialEngine::new(
        options,
        VirtualScheduler::default(),
        StdRng::seed_from_u64(0x5eed),
    )
    .with_timings(Timings::default().with_fixed_cue_delay(delay));
    engine.set_observer(recorder.clone());
    (engine, recorder)
}

pub fn engine() -> (VirtualEngine<StdRng>, Rc<RefCell<Recorder>>) {
    engine_with(Options::default(), DELAY)
}

/// Trial length with the default timings once the cue delay is fixed.
pub fn trial_length(cue_duration: u64) -> u64 {
    DELAY + cue_duration + 600 + 3000
}

/// Presses now, releases `after` ms later, then runs the trial to its end.
/// `after` must fall inside the trial.
pub fn press_release_settle(engine: &mut VirtualEngine<StdRng>, after: u64) {
    let start = engine.now();
    let length = trial_length(engine.state().cue_duration);
    engine.control_pressed();
    engine.advance_to(start + after);
    engine.control_released();
    engine.advance_to(start + length);
}
