use gaze_core::{CalibrationEnd, CueDirection, SaccadeAway, TrialSnapshot};
use serde::Serialize;

use crate::observer::ExperimentObserver;

/// One row of the session log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LogEntry {
    /// Milliseconds since the experiment started.
    pub time: u64,
    pub trial: u32,
    pub trial_type: &'static str,
    pub object: String,
    pub text: String,
}

/// Observer that keeps a human-readable, timestamped record of a session.
#[derive(Debug, Default)]
pub struct SessionLog {
    origin: Option<u64>,
    entries: Vec<LogEntry>,
}

impl SessionLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> &[LogEntry] {
        &self.entries
    }

    pub fn into_entries(self) -> Vec<LogEntry> {
        self.entries
    }

    pub fn texts(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.text.as_str())
    }

    fn push(
        &mut self,
        state: &TrialSnapshot,
        object: impl Into<String>,
        text: impl Into<String>,
    ) {
        let origin = *self.origin.get_or_insert(state.at_ms);
        self.entries.push(LogEntry {
            time: state.at_ms.saturating_sub(origin),
            trial: state.trial_number,
            trial_type: trial_type(state),
            object: object.into(),
            text: text.into(),
        });
    }
}

fn trial_type(state: &TrialSnapshot) -> &'static str {
    match state.trial_number {
        0 => "",
        n if n % 2 == 0 => "Interesting",
        _ => "Boring",
    }
}

fn animation_object(state: &TrialSnapshot) -> &'static str {
    if state.is_interesting_trial() {
        "Animation"
    } else {
        "Boring"
    }
}

impl ExperimentObserver for SessionLog {
    fn did_experiment_start(&mut self, state: TrialSnapshot) {
        self.origin = Some(state.at_ms);
        self.push(&state, "Experiment", "EXPERIMENT STARTED");
    }

    fn did_experiment_end(&mut self, state: TrialSnapshot) {
        self.push(&state, "Experiment", "EXPERIMENT ENDED");
    }

    fn did_animation_start(&mut self, state: TrialSnapshot) {
        self.push(&state, animation_object(&state), "Animation starts");
    }

    fn did_animation_stop(&mut self, state: TrialSnapshot) {
        self.push(&state, animation_object(&state), "Animation stops");
    }

    fn did_cue_change(&mut self, state: TrialSnapshot) {
        if state.is_distracting {
            return;
        }
        let side = state.cue_direction.unwrap_or(CueDirection::Right);
        let elapsed = state.cue_time_elapsed.unwrap_or_default();
        self.push(
            &state,
            "Cue",
            format!("Cue presented on the {side} side for {elapsed} ms."),
        );
    }

    fn did_saccade(&mut self, state: TrialSnapshot) {
        let text = match state.is_saccade_away {
            SaccadeAway::Away => "Subject looks away",
            SaccadeAway::TowardCue | SaccadeAway::Unknown => "Subject looks to cue",
        };
        self.push(&state, "Subject", text);
    }

    fn did_not_saccade(&mut self, state: TrialSnapshot) {
        self.push(&state, animation_object(&state), "Animation continues");
    }

    fn did_calibration_end(&mut self, state: TrialSnapshot, reason: CalibrationEnd) {
        let text = match reason {
            CalibrationEnd::Manual => {
                format!("Cue duration is manually set to {} ms.", state.cue_duration)
            }
            CalibrationEnd::LookCriterion => {
                format!("Cue duration is set to {} ms.", state.cue_duration)
            }
            CalibrationEnd::CueDurationMaximum => format!(
                "Cue duration has reached its maximum at {} ms.",
                state.cue_duration
            ),
        };
        self.push(&state, "Cue", text);
    }
}
