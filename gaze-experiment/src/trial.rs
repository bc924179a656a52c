use gaze_core::Epoch;
use gaze_timing::Millis;

use crate::config::Timings;

/// Payload carried by every timer the engine schedules.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerEvent {
    AnimationCycle,
    Trial {
        generation: u64,
        transition: Transition,
    },
}

/// Deadlines inside a trial chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    CueOnset,
    SaccadeAwayThreshold,
    CueOffset,
    Checkpoint,
    TrialEnd,
}

impl Transition {
    /// Epoch entered when this transition fires, if it changes the epoch.
    pub fn enters(&self) -> Option<Epoch> {
        match self {
            Transition::CueOnset => Some(Epoch::Cue),
            Transition::SaccadeAwayThreshold => None,
            Transition::CueOffset => Some(Epoch::Grace),
            Transition::Checkpoint => Some(Epoch::Outcome),
            Transition::TrialEnd => Some(Epoch::Idle),
        }
    }
}

/// Timeline of the trial chain currently running.
#[derive(Debug, Clone)]
pub struct Trial {
    pub generation: u64,
    pub durations: TrialDurations,
    pub timestamps: TrialTimestamps,
}

/// Offsets fixed when the trial (or its cue) starts.
#[derive(Debug, Clone)]
pub struct TrialDurations {
    pub cue_delay_ms: Millis,
    /// Captured at cue onset; calibration may change the engine's value later
    /// in the same trial.
    pub cue_ms: Option<Millis>,
}

#[derive(Debug, Clone)]
pub struct TrialTimestamps {
    pub start: Millis,
    pub cue_onset: Option<Millis>,
    pub cue_offset: Option<Millis>,
    pub checkpoint: Option<Millis>,
}

impl Trial {
    pub fn new(generation: u64, start: Millis, cue_delay_ms: Millis) -> Self {
        Self {
            generation,
            durations: TrialDurations {
                cue_delay_ms,
                cue_ms: None,
            },
            timestamps: TrialTimestamps {
                start,
                cue_onset: None,
                cue_offset: None,
                checkpoint: None,
            },
        }
    }

    /// Milliseconds the cue was actually up, measured from its onset.
    pub fn cue_time_elapsed(&self, now: Millis) -> Option<Millis> {
        self.timestamps
            .cue_onset
            .map(|onset| now.saturating_sub(onset))
    }

    /// Planned offsets of every transition relative to trial start.
    pub fn planned_offsets(
        &self,
        cue_ms: Millis,
        timings: &Timings,
    ) -> [(Transition, Millis); 5] {
        let onset = self.durations.cue_delay_ms;
        let offset = onset.saturating_add(cue_ms);
        let checkpoint = offset.saturating_add(timings.checkpoint_ms);
        [
            (Transition::CueOnset, onset),
            (Transition::CueOffset, offset),
            (Transition::Checkpoint, checkpoint),
            (
                Transition::SaccadeAwayThreshold,
                offset.saturating_add(timings.saccade_away_ms),
            ),
            (
                Transition::TrialEnd,
                checkpoint.saturating_add(timings.inter_trial_ms),
            ),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offsets_follow_epoch_layout() {
        let trial = Trial::new(1, 0, 1000);
        let offsets = trial.planned_offsets(200, &Timings::default());
        assert_eq!(
            offsets,
            [
                (Transition::CueOnset, 1000),
                (Transition::CueOffset, 1200),
                (Transition::Checkpoint, 1800),
                (Transition::SaccadeAwayThreshold, 2200),
                (Transition::TrialEnd, 4800),
            ]
        );
    }

    #[test]
    fn huge_cue_saturates_instead_of_wrapping() {
        let trial = Trial::new(1, 0, 1000);
        let offsets = trial.planned_offsets(u64::MAX, &Timings::default());
        assert!(offsets[1..].iter().all(|(_, at)| *at == u64::MAX));
    }

    #[test]
    fn elapsed_is_measured_from_onset() {
        let mut trial = Trial::new(1, 500, 1500);
        assert_eq!(trial.cue_time_elapsed(2000), None);
        trial.timestamps.cue_onset = Some(2000);
        assert_eq!(trial.cue_time_elapsed(2240), Some(240));
    }

    #[test]
    fn threshold_leaves_epoch_alone() {
        assert_eq!(Transition::SaccadeAwayThreshold.enters(), None);
        assert_eq!(Transition::Checkpoint.enters(), Some(Epoch::Outcome));
    }
}
