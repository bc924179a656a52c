use gaze_timing::Millis;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::warn;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("invalid configuration JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("configuration must be a JSON object")]
    NotAnObject,
}

/// Calibration parameters for one run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Options {
    /// Consecutive failed trials that end calibration.
    pub look_criterion: u32,
    /// Trials run after calibration ends.
    pub trial_criterion: u32,
    pub cue_duration_initial: Millis,
    pub cue_duration_increment: Millis,
    pub cue_duration_maximum: Millis,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            look_criterion: 2,
            trial_criterion: 80,
            cue_duration_initial: 200,
            cue_duration_increment: 40,
            cue_duration_maximum: 1200,
        }
    }
}

impl Options {
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn apply(&mut self, patch: &OptionsPatch) {
        if let Some(v) = patch.look_criterion {
            self.look_criterion = saturate_u32(v);
        }
        if let Some(v) = patch.trial_criterion {
            self.trial_criterion = saturate_u32(v);
        }
        if let Some(v) = patch.cue_duration_initial {
            self.cue_duration_initial = v;
        }
        if let Some(v) = patch.cue_duration_increment {
            self.cue_duration_increment = v;
        }
        if let Some(v) = patch.cue_duration_maximum {
            self.cue_duration_maximum = v;
        }
    }
}

fn saturate_u32(v: u64) -> u32 {
    u32::try_from(v).unwrap_or(u32::MAX)
}

/// Partial update to [`Options`], as produced by a settings form.
///
/// Values are coerced, never rejected: numbers are rounded and clamped at
/// zero, strings are parsed as numbers (blank means 0). Values that still
/// are not numeric, and unknown keys, are skipped with a warning.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OptionsPatch {
    pub look_criterion: Option<u64>,
    pub trial_criterion: Option<u64>,
    pub cue_duration_initial: Option<u64>,
    pub cue_duration_increment: Option<u64>,
    pub cue_duration_maximum: Option<u64>,
}

impl OptionsPatch {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        match serde_json::from_str::<Value>(json)? {
            Value::Object(map) => Ok(Self::from_values(map)),
            _ => Err(ConfigError::NotAnObject),
        }
    }

    pub fn from_values<I, K>(values: I) -> Self
    where
        I: IntoIterator<Item = (K, Value)>,
        K: AsRef<str>,
    {
        let mut patch = Self::default();
        for (key, value) in values {
            patch.set(key.as_ref(), coerce_value(&value));
        }
        patch
    }

    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut patch = Self::default();
        for (key, value) in pairs {
            patch.set(key.as_ref(), coerce_str(value.as_ref()));
        }
        patch
    }

    fn set(&mut self, key: &str, value: Option<u64>) {
        let slot = match key {
            "lookCriterion" | "look_criterion" => &mut self.look_criterion,
            "trialCriterion" | "trial_criterion" => &mut self.trial_criterion,
            "cueDurationInitial" | "cue_duration_initial" => &mut self.cue_duration_initial,
            "cueDurationIncrement" | "cue_duration_increment" => &mut self.cue_duration_increment,
            "cueDurationMaximum" | "cue_duration_maximum" => &mut self.cue_duration_maximum,
            _ => {
                warn!(key, "ignoring unknown option");
                return;
            }
        };
        match value {
            Some(v) => *slot = Some(v),
            None => warn!(key, "ignoring non-numeric option value"),
        }
    }
}

fn coerce_value(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_i64().map(|i| i.max(0) as u64))
            .or_else(|| n.as_f64().and_then(coerce_float)),
        Value::String(s) => coerce_str(s),
        Value::Bool(b) => Some(u64::from(*b)),
        Value::Null => Some(0),
        Value::Array(_) | Value::Object(_) => None,
    }
}

fn coerce_str(s: &str) -> Option<u64> {
    let s = s.trim();
    if s.is_empty() {
        return Some(0);
    }
    s.parse::<f64>().ok().and_then(coerce_float)
}

fn coerce_float(f: f64) -> Option<u64> {
    if !f.is_finite() {
        return None;
    }
    Some(f.round().max(0.0) as u64)
}

/// Fixed epoch offsets of a trial, in milliseconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Timings {
    /// Cue onset is drawn from `min..max`; a degenerate range always yields `min`.
    pub cue_delay_range_ms: (Millis, Millis),
    /// Past `cue duration + this`, a response counts as looking away.
    pub saccade_away_ms: Millis,
    /// From cue offset to the decision checkpoint.
    pub checkpoint_ms: Millis,
    /// From the checkpoint to the end of the trial.
    pub inter_trial_ms: Millis,
    pub animation_cycle_ms: Millis,
}

impl Default for Timings {
    fn default() -> Self {
        Self {
            cue_delay_range_ms: (1000, 2000),
            saccade_away_ms: 1000,
            checkpoint_ms: 600,
            inter_trial_ms: 3000,
            animation_cycle_ms: 2000,
        }
    }
}

impl Timings {
    pub fn with_fixed_cue_delay(mut self, delay: Millis) -> Self {
        self.cue_delay_range_ms = (delay, delay);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_protocol() {
        let options = Options::default();
        assert_eq!(options.look_criterion, 2);
        assert_eq!(options.trial_criterion, 80);
        assert_eq!(options.cue_duration_initial, 200);
        assert_eq!(options.cue_duration_increment, 40);
        assert_eq!(options.cue_duration_maximum, 1200);
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let options = Options::from_json_str(r#"{"trialCriterion": 10}"#).unwrap();
        assert_eq!(options.trial_criterion, 10);
        assert_eq!(options.cue_duration_initial, 200);
    }

    #[test]
    fn string_values_are_coerced() {
        let patch = OptionsPatch::from_pairs([
            ("lookCriterion", "3"),
            ("cueDurationInitial", " 250.4 "),
            ("cueDurationIncrement", ""),
            ("cueDurationMaximum", "lots"),
            ("colour", "red"),
        ]);
        assert_eq!(patch.look_criterion, Some(3));
        assert_eq!(patch.cue_duration_initial, Some(250));
        assert_eq!(patch.cue_duration_increment, Some(0));
        assert_eq!(patch.cue_duration_maximum, None);
        assert_eq!(patch.trial_criterion, None);
    }

    #[test]
    fn json_patch_mixes_numbers_and_strings() {
        let patch =
            OptionsPatch::from_json_str(r#"{"trialCriterion": "12", "lookCriterion": -4}"#)
                .unwrap();
        assert_eq!(patch.trial_criterion, Some(12));
        assert_eq!(patch.look_criterion, Some(0));

        let mut options = Options::default();
        options.apply(&patch);
        assert_eq!(options.trial_criterion, 12);
        assert_eq!(options.look_criterion, 0);
        assert_eq!(options.cue_duration_maximum, 1200);
    }

    #[test]
    fn json_patch_must_be_an_object() {
        assert!(matches!(
            OptionsPatch::from_json_str("[1, 2]"),
            Err(ConfigError::NotAnObject)
        ));
        assert!(matches!(
            OptionsPatch::from_json_str("{"),
            Err(ConfigError::Json(_))
        ));
    }

    #[test]
    fn settings_map_converts_to_patch() {
        use std::collections::HashMap;

        let mut map = HashMap::new();
        map.insert("cueDurationMaximum".to_string(), "800".to_string());
        let patch = OptionsPatch::from_pairs(&map);
        assert_eq!(patch.cue_duration_maximum, Some(800));
        assert!(!patch.is_empty());
        assert!(OptionsPatch::default().is_empty());
    }
}
