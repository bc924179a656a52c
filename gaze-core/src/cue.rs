use std::fmt;

use serde::{Deserialize, Serialize};

/// Side the cue is shown on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CueDirection {
    Left,
    Right,
}

impl From<bool> for CueDirection {
    fn from(left: bool) -> Self {
        if left {
            CueDirection::Left
        } else {
            CueDirection::Right
        }
    }
}

impl fmt::Display for CueDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            CueDirection::Left => "left",
            CueDirection::Right => "right",
        })
    }
}

/// Lateness of a response relative to the current trial's cue.
///
/// `Unknown` until the cue appears, `TowardCue` from cue onset, `Away` once
/// the lateness threshold has passed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SaccadeAway {
    #[default]
    Unknown,
    TowardCue,
    Away,
}

impl SaccadeAway {
    pub fn is_known(&self) -> bool {
        !matches!(self, SaccadeAway::Unknown)
    }
}
