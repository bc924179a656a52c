use serde::{Deserialize, Serialize};

/// Named stretches of a single trial, in the order they are visited.
#[derive(Copy, Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Epoch {
    /// No trial chain is running; the next press starts one.
    #[default]
    Idle,
    /// Animation plays, waiting out the random delay before the cue.
    PreCue,
    /// Cue is on screen.
    Cue,
    /// Cue hidden, checkpoint not yet reached.
    Grace,
    /// Outcome classified; inter-trial gap until the trial ends.
    Outcome,
}

impl Epoch {
    /// Handler a response is routed through while this epoch is current.
    ///
    /// `Idle` has no handler of its own: the engine keeps whatever the
    /// previous trial left installed.
    pub fn response_handler(&self) -> Option<ResponseHandler> {
        match self {
            Epoch::Idle => None,
            Epoch::PreCue | Epoch::Cue | Epoch::Grace => Some(ResponseHandler::PreCheckpoint),
            Epoch::Outcome => Some(ResponseHandler::PostCheckpoint),
        }
    }
}

/// Classification applied to an operator release.
#[derive(Copy, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ResponseHandler {
    /// Release before the checkpoint: forfeits the trial's reward.
    PreCheckpoint,
    /// Release after the checkpoint: reported, outcome already fixed.
    PostCheckpoint,
}
