use gaze_core::{
    CalibrationEnd, DirectionCycle, Epoch, ResponseHandler, SaccadeAway, TrialSnapshot,
};
use gaze_timing::{Clock, Millis, Scheduler, TimerId, VirtualClock};
use rand::Rng;
use tracing::{debug, info, trace};

use super::config::{Options, OptionsPatch, Timings};
use super::observer::{ExperimentObserver, NoopObserver};
use super::trial::{TimerEvent, Transition, Trial};

pub type VirtualEngine<R> = TrialEngine<VirtualClock, R>;

/// Timer-driven trial and calibration state machine.
///
/// All mutation happens inside the public control methods or inside
/// [`TrialEngine::advance_to`], which fires due timers one at a time. Every
/// trial trigger, `start`, `stop` and `reset` opens a new generation; timers
/// left over from an older generation are dropped when they fire.
pub struct TrialEngine<C, R>
where
    C: Clock,
    R: Rng,
{
    scheduler: Scheduler<C, TimerEvent>,
    rng: R,
    options: Options,
    timings: Timings,
    directions: DirectionCycle,
    observer: Box<dyn ExperimentObserver>,
    state: TrialSnapshot,
    trial: Option<Trial>,
    handler: Option<ResponseHandler>,
    trigger_armed: bool,
    generation: u64,
    animation_timer: Option<TimerId>,
}

impl<C, R> TrialEngine<C, R>
where
    C: Clock,
    R: Rng,
{
    pub fn new(options: Options, scheduler: Scheduler<C, TimerEvent>, rng: R) -> Self {
        let mut engine = Self {
            scheduler,
            rng,
            options,
            timings: Timings::default(),
            directions: DirectionCycle::default(),
            observer: Box::new(NoopObserver),
            state: TrialSnapshot::default(),
            trial: None,
            handler: None,
            trigger_armed: true,
            generation: 0,
            animation_timer: None,
        };
        engine.reset();
        engine
    }

    pub fn with_timings(mut self, timings: Timings) -> Self {
        self.timings = timings;
        self
    }

    pub fn set_observer(&mut self, observer: impl ExperimentObserver + 'static) {
        self.observer = Box::new(observer);
    }

    pub fn start(&mut self) {
        if self.state.is_started {
            return;
        }
        self.generation += 1;
        self.trial = None;
        self.handler = None;
        self.trigger_armed = true;
        self.state = TrialSnapshot {
            is_started: true,
            trial_number: 0,
            cue_duration: self.options.cue_duration_initial,
            is_calibrating: true,
            is_animating: true,
            is_distracting: false,
            look_number: 0,
            reward: true,
            has_focus: false,
            ..Default::default()
        };
        info!(
            cue_duration = self.state.cue_duration,
            look_criterion = self.options.look_criterion,
            trial_criterion = self.options.trial_criterion,
            "experiment started"
        );
        self.notify(|o, s| o.did_experiment_start(s));
        self.start_animation_timer();
        self.notify(|o, s| o.did_animation_start(s));
        self.notify(|o, s| o.did_state_change(s));
    }

    pub fn stop(&mut self) {
        if !self.state.is_started {
            return;
        }
        self.state.is_started = false;
        self.enter(Epoch::Idle);
        self.generation += 1;
        self.trial = None;
        self.cancel_animation_timer();
        info!(
            trial = self.state.trial_number,
            cue_duration = self.state.cue_duration,
            "experiment ended"
        );
        self.notify(|o, s| o.did_experiment_end(s));
    }

    /// Wipes the run back to the empty state without notifying an end.
    pub fn reset(&mut self) {
        self.cancel_animation_timer();
        self.generation += 1;
        self.trial = None;
        self.handler = None;
        self.trigger_armed = true;
        self.state = TrialSnapshot::default();
        self.notify(|o, s| o.did_state_change(s));
    }

    /// Merges `patch` into the options and resets the run.
    pub fn set_options(&mut self, patch: &OptionsPatch) {
        self.options.apply(patch);
        debug!(options = ?self.options, "options updated");
        self.reset();
    }

    /// Operator pressed (or is holding) the control.
    pub fn control_pressed(&mut self) {
        if !self.state.is_started {
            return;
        }
        if self.state.trial_number == 0 {
            self.state.trial_number = 1;
            self.state.cue_direction = Some(self.directions.next(&mut self.rng));
            self.notify(|o, s| o.did_state_change(s));
        }
        if !self.state.has_focus {
            if self.trigger_armed {
                self.trigger_armed = false;
                self.begin_trial();
            }
            self.state.has_focus = true;
        }
    }

    /// Operator released the control; routed through the installed handler.
    pub fn control_released(&mut self) {
        self.state.has_focus = false;
        if !self.state.is_started {
            return;
        }
        match self.handler {
            Some(ResponseHandler::PreCheckpoint) => {
                self.state.reward = false;
                if self.state.is_saccade_away.is_known() {
                    self.report_saccade();
                }
            }
            Some(ResponseHandler::PostCheckpoint) => self.report_saccade(),
            None => {}
        }
    }

    /// Host window lost focus; the hold ends without counting as a response.
    pub fn blur(&mut self) {
        self.state.has_focus = false;
    }

    /// Ends calibration at `duration` if it is still running.
    pub fn set_cue_duration(&mut self, duration: Millis) {
        self.calibrate_with_duration(duration, CalibrationEnd::Manual);
    }

    /// Fires every timer due up to `until`, then moves the clock there.
    pub fn advance_to(&mut self, until: Millis) {
        while let Some(due) = self.scheduler.next_deadline() {
            if due > until {
                break;
            }
            self.scheduler.sleep_until(due);
            if let Some(event) = self.scheduler.pop_due(due) {
                self.on_timer(event);
            }
        }
        self.scheduler.sleep_until(until);
    }

    pub fn advance_by(&mut self, ms: Millis) {
        let until = self.now().saturating_add(ms);
        self.advance_to(until);
    }

    /// Fires whatever is due at the clock's current reading.
    pub fn poll(&mut self) {
        let now = self.now();
        self.advance_to(now);
    }

    pub fn state(&self) -> TrialSnapshot {
        TrialSnapshot {
            at_ms: self.now(),
            ..self.state.clone()
        }
    }

    pub fn now(&self) -> Millis {
        self.scheduler.now()
    }

    pub fn scheduler(&self) -> &Scheduler<C, TimerEvent> {
        &self.scheduler
    }

    pub fn next_deadline(&mut self) -> Option<Millis> {
        self.scheduler.next_deadline()
    }

    pub fn options(&self) -> &Options {
        &self.options
    }

    pub fn timings(&self) -> &Timings {
        &self.timings
    }

    pub fn epoch(&self) -> Epoch {
        self.state.epoch
    }

    pub fn response_handler(&self) -> Option<ResponseHandler> {
        self.handler
    }

    pub fn is_started(&self) -> bool {
        self.state.is_started
    }

    pub fn is_animating(&self) -> bool {
        self.state.is_animating
    }

    pub fn is_distracting(&self) -> bool {
        self.state.is_distracting
    }

    pub fn is_boring_trial(&self) -> bool {
        self.state.is_boring_trial()
    }

    pub fn is_interesting_trial(&self) -> bool {
        self.state.is_interesting_trial()
    }

    fn on_timer(&mut self, event: TimerEvent) {
        match event {
            TimerEvent::AnimationCycle => {
                if self.state.is_started && self.state.is_interesting_trial() {
                    self.notify(|o, s| o.did_animation_change(s));
                }
            }
            TimerEvent::Trial {
                generation,
                transition,
            } => {
                if generation != self.generation || !self.state.is_started {
                    trace!(
                        generation,
                        current = self.generation,
                        ?transition,
                        "discarding stale trial timer"
                    );
                    return;
                }
                if let Some(epoch) = transition.enters() {
                    self.enter(epoch);
                }
                match transition {
                    Transition::CueOnset => self.show_cue(),
                    Transition::SaccadeAwayThreshold => {
                        self.state.is_saccade_away = SaccadeAway::Away;
                    }
                    Transition::CueOffset => self.hide_cue(),
                    Transition::Checkpoint => self.classify(),
                    Transition::TrialEnd => self.end_trial(),
                }
            }
        }
    }

    fn begin_trial(&mut self) {
        if !self.state.is_started {
            return;
        }
        self.cancel_animation_timer();
        self.generation += 1;

        let delay = self.draw_cue_delay();
        let trial = Trial::new(self.generation, self.now(), delay);
        self.state.reward = true;
        self.state.is_saccade_away = SaccadeAway::Unknown;
        self.state.cue_time_elapsed = None;
        self.enter(Epoch::PreCue);
        debug!(
            trial = self.state.trial_number,
            generation = self.generation,
            planned = ?trial.planned_offsets(self.state.cue_duration, &self.timings),
            "trial started"
        );
        self.trial = Some(trial);
        self.schedule_transition(delay, Transition::CueOnset);
    }

    fn show_cue(&mut self) {
        let now = self.now();
        let cue_ms = self.state.cue_duration;
        self.state.is_animating = false;
        self.state.is_distracting = true;
        self.state.is_saccade_away = SaccadeAway::TowardCue;
        if let Some(trial) = &mut self.trial {
            trial.timestamps.cue_onset = Some(now);
            trial.durations.cue_ms = Some(cue_ms);
        }
        debug!(
            trial = self.state.trial_number,
            direction = ?self.state.cue_direction,
            cue_ms,
            "cue shown"
        );

        self.schedule_transition(
            cue_ms.saturating_add(self.timings.saccade_away_ms),
            Transition::SaccadeAwayThreshold,
        );
        self.schedule_transition(cue_ms, Transition::CueOffset);

        self.notify(|o, s| o.did_cue_change(s));
        self.notify(|o, s| o.did_animation_stop(s));
        self.notify(|o, s| o.did_state_change(s));
    }

    fn hide_cue(&mut self) {
        let now = self.now();
        self.state.is_distracting = false;
        if let Some(trial) = &mut self.trial {
            trial.timestamps.cue_offset = Some(now);
            self.state.cue_time_elapsed = trial.cue_time_elapsed(now);
            debug!(
                planned = ?trial.durations.cue_ms,
                elapsed = ?self.state.cue_time_elapsed,
                "cue hidden"
            );
        }
        self.schedule_transition(self.timings.checkpoint_ms, Transition::Checkpoint);
        self.notify(|o, s| o.did_cue_change(s));
    }

    fn classify(&mut self) {
        let now = self.now();
        if let Some(trial) = &mut self.trial {
            trial.timestamps.checkpoint = Some(now);
        }
        self.state.is_animating = self.state.reward;
        self.schedule_transition(self.timings.inter_trial_ms, Transition::TrialEnd);
        debug!(
            trial = self.state.trial_number,
            reward = self.state.reward,
            "checkpoint reached"
        );

        if self.state.reward {
            self.notify(|o, s| o.did_not_saccade(s));
            self.reward_calibration();
        } else {
            self.failure_calibration();
        }
        self.notify(|o, s| o.did_state_change(s));
    }

    fn end_trial(&mut self) {
        if self.state.has_reached_trial_budget() {
            self.stop();
            return;
        }

        if let Some(trial) = self.trial.take() {
            debug!(
                trial = self.state.trial_number,
                generation = trial.generation,
                started = trial.timestamps.start,
                cue_onset = ?trial.timestamps.cue_onset,
                cue_offset = ?trial.timestamps.cue_offset,
                checkpoint = ?trial.timestamps.checkpoint,
                "trial ended"
            );
        }
        if self.state.has_focus {
            self.begin_trial();
        } else {
            self.trigger_armed = true;
        }
        self.cancel_animation_timer();
        self.state.is_animating = true;
        self.state.trial_number += 1;
        self.state.cue_direction = Some(self.directions.next(&mut self.rng));

        self.notify(|o, s| o.did_animation_start(s));
        self.notify(|o, s| o.did_state_change(s));
        if !self.state.has_focus && self.state.is_interesting_trial() {
            self.start_animation_timer();
        }
    }

    fn reward_calibration(&mut self) {
        if !self.state.is_calibrating {
            return;
        }
        self.state.cue_duration = self
            .state
            .cue_duration
            .saturating_add(self.options.cue_duration_increment);
        self.state.look_number = 0;
        if self.state.cue_duration > self.options.cue_duration_maximum {
            self.calibrate_with_duration(
                self.options.cue_duration_maximum,
                CalibrationEnd::CueDurationMaximum,
            );
        }
    }

    fn failure_calibration(&mut self) {
        if !self.state.is_calibrating {
            return;
        }
        self.state.look_number = self.state.look_number.saturating_add(1);
        if self.state.look_number >= self.options.look_criterion {
            self.calibrate_with_duration(self.state.cue_duration, CalibrationEnd::LookCriterion);
        }
    }

    fn calibrate_with_duration(&mut self, duration: Millis, reason: CalibrationEnd) {
        if !self.state.is_calibrating {
            return;
        }
        self.state.cue_duration = duration;
        self.state.is_calibrating = false;
        self.state.trial_number_at_calibration_end = Some(
            self.state
                .trial_number
                .saturating_add(self.options.trial_criterion),
        );
        info!(
            cue_duration = duration,
            ?reason,
            trial = self.state.trial_number,
            "calibration ended"
        );
        self.notify(|o, s| o.did_calibration_end(s, reason));
    }

    fn report_saccade(&mut self) {
        debug!(
            trial = self.state.trial_number,
            away = ?self.state.is_saccade_away,
            "saccade reported"
        );
        self.notify(|o, s| o.did_saccade(s));
    }

    fn draw_cue_delay(&mut self) -> Millis {
        let (min, max) = self.timings.cue_delay_range_ms;
        if max <= min {
            min
        } else {
            self.rng.random_range(min..max)
        }
    }

    /// Moves to `epoch`, installing its response handler. `Idle` keeps the
    /// handler the previous trial left behind.
    fn enter(&mut self, epoch: Epoch) {
        self.state.epoch = epoch;
        if let Some(handler) = epoch.response_handler() {
            self.handler = Some(handler);
        }
    }

    fn schedule_transition(&mut self, delay: Millis, transition: Transition) {
        let event = TimerEvent::Trial {
            generation: self.generation,
            transition,
        };
        self.scheduler.schedule_once(delay, event);
    }

    fn start_animation_timer(&mut self) {
        self.cancel_animation_timer();
        let id = self
            .scheduler
            .schedule_repeating(self.timings.animation_cycle_ms, TimerEvent::AnimationCycle);
        self.animation_timer = Some(id);
    }

    fn cancel_animation_timer(&mut self) {
        if let Some(id) = self.animation_timer.take() {
            self.scheduler.cancel(id);
        }
    }

    fn notify(&mut self, emit: impl FnOnce(&mut dyn ExperimentObserver, TrialSnapshot)) {
        let snapshot = self.state();
        emit(self.observer.as_mut(), snapshot);
    }
}
