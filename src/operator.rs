use gaze_core::Epoch;
use gaze_experiment::TrialEngine;
use gaze_timing::{Clock, Millis};
use rand::Rng;
use tracing::debug;

/// Reaction times drawn for an early release once the cue is up.
const REACTION_MS: (Millis, Millis) = (200, 600);

/// Stand-in for the person holding the control during a session.
///
/// Presses whenever the engine is idle between trials and keeps holding.
/// When a cue appears it decides once per trial, with probability
/// `look_rate`, to release after a random reaction time.
pub struct SimulatedOperator<R: Rng> {
    rng: R,
    look_rate: f64,
    holding: bool,
    decided_trial: Option<u32>,
    release_at: Option<Millis>,
}

impl<R: Rng> SimulatedOperator<R> {
    /// `look_rate` is clamped to `0.0..=1.0`.
    pub fn new(look_rate: f64, rng: R) -> Self {
        Self {
            rng,
            look_rate: look_rate.clamp(0.0, 1.0),
            holding: false,
            decided_trial: None,
            release_at: None,
        }
    }

    pub fn is_holding(&self) -> bool {
        self.holding
    }

    /// Reacts to the engine's current state. Call once per tick.
    pub fn step<C: Clock, E: Rng>(&mut self, engine: &mut TrialEngine<C, E>) {
        if !engine.is_started() {
            self.holding = false;
            return;
        }
        let now = engine.now();

        if let Some(at) = self.release_at {
            if now >= at {
                self.release_at = None;
                self.holding = false;
                debug!(at = now, trial = engine.state().trial_number, "operator released");
                engine.control_released();
            }
            return;
        }

        if !self.holding && engine.epoch() == Epoch::Idle {
            self.holding = true;
            engine.control_pressed();
            return;
        }

        let trial = engine.state().trial_number;
        if self.holding && engine.is_distracting() && self.decided_trial != Some(trial) {
            self.decided_trial = Some(trial);
            if self.rng.random_bool(self.look_rate) {
                let reaction = self.rng.random_range(REACTION_MS.0..REACTION_MS.1);
                self.release_at = Some(now.saturating_add(reaction));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gaze_experiment::{Options, Timings, VirtualEngine};
    use gaze_timing::VirtualScheduler;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn engine() -> VirtualEngine<StdRng> {
        TrialEngine::new(
            Options::default(),
            VirtualScheduler::default(),
            StdRng::seed_from_u64(1),
        )
        .with_timings(Timings::default().with_fixed_cue_delay(1000))
    }

    fn run(
        engine: &mut VirtualEngine<StdRng>,
        operator: &mut SimulatedOperator<StdRng>,
        until: Millis,
    ) {
        while engine.now() < until {
            operator.step(engine);
            engine.advance_by(10);
        }
    }

    #[test]
    fn never_looking_holds_through_the_whole_run() {
        let mut engine = engine();
        let mut operator = SimulatedOperator::new(0.0, StdRng::seed_from_u64(2));
        engine.start();
        run(&mut engine, &mut operator, 20 * 60 * 1000);

        let state = engine.state();
        assert!(!state.is_started);
        assert_eq!(state.cue_duration, 1200);
        assert_eq!(state.trial_number_at_calibration_end, Some(106));
        assert!(!operator.is_holding());
    }

    #[test]
    fn always_looking_ends_calibration_on_the_look_criterion() {
        let mut engine = engine();
        let mut operator = SimulatedOperator::new(1.0, StdRng::seed_from_u64(3));
        engine.start();
        run(&mut engine, &mut operator, 30_000);

        let state = engine.state();
        assert!(!state.is_calibrating);
        assert_eq!(state.cue_duration, 200);
    }

    #[test]
    fn idles_before_start() {
        let mut engine = engine();
        let mut operator = SimulatedOperator::new(0.5, StdRng::seed_from_u64(4));
        run(&mut engine, &mut operator, 5000);
        assert!(!operator.is_holding());
        assert_eq!(engine.state().trial_number, 0);
    }
}
