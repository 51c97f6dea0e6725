//! Wheel configuration: pacing hints and display limits.
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::constants::{
    CANDIDATE_BUCKET_SIZE, CANDIDATE_DISPLAY_CAP, DEFAULT_RANGE_MAX, INLINE_FINALIZE_DELAY_MS,
    INSTANT_FINALIZE_DELAY_MS, MAX_ENTRY_NUMBER, MIN_ENTRY_NUMBER, SPIN_INTERVAL_MS, SPIN_TICKS,
    WINNER_CUE_DELAY_MS,
};

/// Errors raised when configuration invariants are violated.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{field} must be at least {min} (got {value})")]
    MinViolation {
        field: &'static str,
        min: u32,
        value: u32,
    },
    #[error("candidate bucket size {bucket} exceeds display cap {cap}")]
    BucketExceedsCap { bucket: u32, cap: u32 },
    #[error("default range max {value} must be between 1 and 999")]
    RangeDefault { value: u16 },
    #[error("configuration could not be parsed: {0}")]
    Parse(String),
}

/// Tunables consumed by the presentation layer and the reveal machine.
///
/// Timings are pacing hints only; none of them affect selection or the ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WheelConfig {
    /// Number of flicker frames before the wheel stops.
    #[serde(default = "WheelConfig::default_spin_ticks")]
    pub spin_ticks: u32,
    /// Time each flicker frame stays on screen.
    #[serde(default = "WheelConfig::default_spin_interval_ms")]
    pub spin_interval_ms: u32,
    /// Delay before an instant-reveal winner is written to the ledger.
    #[serde(default = "WheelConfig::default_instant_finalize_delay_ms")]
    pub instant_finalize_delay_ms: u32,
    /// Delay before an inline staged reveal settles after the last digit.
    #[serde(default = "WheelConfig::default_inline_finalize_delay_ms")]
    pub inline_finalize_delay_ms: u32,
    /// Pause between the wheel stopping on a shown winner and the winner cue.
    #[serde(default = "WheelConfig::default_winner_cue_delay_ms")]
    pub winner_cue_delay_ms: u32,
    #[serde(default = "WheelConfig::default_candidate_display_cap")]
    pub candidate_display_cap: u32,
    #[serde(default = "WheelConfig::default_candidate_bucket_size")]
    pub candidate_bucket_size: u32,
    #[serde(default = "WheelConfig::default_range_max")]
    pub default_range_max: u16,
}

impl WheelConfig {
    const fn default_spin_ticks() -> u32 {
        SPIN_TICKS
    }

    const fn default_spin_interval_ms() -> u32 {
        SPIN_INTERVAL_MS
    }

    const fn default_instant_finalize_delay_ms() -> u32 {
        INSTANT_FINALIZE_DELAY_MS
    }

    const fn default_inline_finalize_delay_ms() -> u32 {
        INLINE_FINALIZE_DELAY_MS
    }

    const fn default_winner_cue_delay_ms() -> u32 {
        WINNER_CUE_DELAY_MS
    }

    #[allow(clippy::cast_possible_truncation)]
    const fn default_candidate_display_cap() -> u32 {
        CANDIDATE_DISPLAY_CAP as u32
    }

    #[allow(clippy::cast_possible_truncation)]
    const fn default_candidate_bucket_size() -> u32 {
        CANDIDATE_BUCKET_SIZE as u32
    }

    const fn default_range_max() -> u16 {
        DEFAULT_RANGE_MAX
    }

    /// Parse and validate a JSON configuration document.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is malformed or violates an invariant.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let cfg: Self =
            serde_json::from_str(json).map_err(|err| ConfigError::Parse(err.to_string()))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Check invariants between fields.
    ///
    /// # Errors
    ///
    /// Returns the first violated invariant.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.spin_ticks < 1 {
            return Err(ConfigError::MinViolation {
                field: "spin_ticks",
                min: 1,
                value: self.spin_ticks,
            });
        }
        if self.spin_interval_ms < 1 {
            return Err(ConfigError::MinViolation {
                field: "spin_interval_ms",
                min: 1,
                value: self.spin_interval_ms,
            });
        }
        if self.candidate_display_cap < 1 {
            return Err(ConfigError::MinViolation {
                field: "candidate_display_cap",
                min: 1,
                value: self.candidate_display_cap,
            });
        }
        if self.candidate_bucket_size < 1 {
            return Err(ConfigError::MinViolation {
                field: "candidate_bucket_size",
                min: 1,
                value: self.candidate_bucket_size,
            });
        }
        if self.candidate_bucket_size > self.candidate_display_cap {
            return Err(ConfigError::BucketExceedsCap {
                bucket: self.candidate_bucket_size,
                cap: self.candidate_display_cap,
            });
        }
        if !(MIN_ENTRY_NUMBER..=MAX_ENTRY_NUMBER).contains(&self.default_range_max) {
            return Err(ConfigError::RangeDefault {
                value: self.default_range_max,
            });
        }
        Ok(())
    }

    /// Timeline of one spin, measured from its first frame.
    #[must_use]
    pub fn spin_timing(&self) -> SpinTiming {
        let stop_at_ms = u64::from(self.spin_ticks) * u64::from(self.spin_interval_ms);
        SpinTiming {
            frame_interval_ms: self.spin_interval_ms,
            stop_at_ms,
            winner_cue_at_ms: stop_at_ms + u64::from(self.winner_cue_delay_ms),
        }
    }

    /// Candidate display limits as `usize` for the reveal machine.
    #[must_use]
    pub fn candidate_limits(&self) -> CandidateLimits {
        CandidateLimits {
            cap: usize::try_from(self.candidate_display_cap).unwrap_or(CANDIDATE_DISPLAY_CAP),
            bucket: usize::try_from(self.candidate_bucket_size).unwrap_or(CANDIDATE_BUCKET_SIZE),
        }
    }
}

impl Default for WheelConfig {
    fn default() -> Self {
        Self {
            spin_ticks: Self::default_spin_ticks(),
            spin_interval_ms: Self::default_spin_interval_ms(),
            instant_finalize_delay_ms: Self::default_instant_finalize_delay_ms(),
            inline_finalize_delay_ms: Self::default_inline_finalize_delay_ms(),
            winner_cue_delay_ms: Self::default_winner_cue_delay_ms(),
            candidate_display_cap: Self::default_candidate_display_cap(),
            candidate_bucket_size: Self::default_candidate_bucket_size(),
            default_range_max: Self::default_range_max(),
        }
    }
}

/// When the presentation layer flips frames, stops the wheel and plays the
/// winner cue for an instant reveal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpinTiming {
    pub frame_interval_ms: u32,
    pub stop_at_ms: u64,
    pub winner_cue_at_ms: u64,
}

/// How many narrowed candidates to show and how to split them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateLimits {
    pub cap: usize,
    pub bucket: usize,
}

impl Default for CandidateLimits {
    fn default() -> Self {
        Self {
            cap: CANDIDATE_DISPLAY_CAP,
            bucket: CANDIDATE_BUCKET_SIZE,
        }
    }
}
