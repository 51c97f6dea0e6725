//! Centralized limits and pacing defaults for the draw engine.
//!
//! Id geometry and range bounds are fixed here so that every pool, ledger and
//! reveal agrees on the same 3-digit code space. Pacing values only seed
//! `WheelConfig` defaults and never influence selection.

// Id geometry ----------------------------------------------------------------
/// Number of digits in every entry code; also the number of reveal stages.
pub const ID_WIDTH: usize = 3;
/// Smallest representable entry number.
pub const MIN_ENTRY_NUMBER: u16 = 1;
/// Largest representable entry number at `ID_WIDTH` digits.
pub const MAX_ENTRY_NUMBER: u16 = 999;
/// Upper bound used when the operator leaves the range input blank.
pub const DEFAULT_RANGE_MAX: u16 = 100;

// Context ids ----------------------------------------------------------------
/// Identifier of the generic numeric-range context.
pub const RANGE_CONTEXT_ID: &str = "custom";
/// Title shown for the generic numeric-range context.
pub const RANGE_CONTEXT_TITLE: &str = "Custom draw";

// Candidate display ----------------------------------------------------------
pub(crate) const CANDIDATE_DISPLAY_CAP: usize = 10;
pub(crate) const CANDIDATE_BUCKET_SIZE: usize = 5;
/// Stage at which the candidate display is first populated.
pub(crate) const CANDIDATE_STAGE: u8 = 2;

// Pacing hints (milliseconds) ------------------------------------------------
pub(crate) const SPIN_TICKS: u32 = 50;
pub(crate) const SPIN_INTERVAL_MS: u32 = 50;
pub(crate) const INSTANT_FINALIZE_DELAY_MS: u32 = 500;
pub(crate) const INLINE_FINALIZE_DELAY_MS: u32 = 2_000;
pub(crate) const WINNER_CUE_DELAY_MS: u32 = 300;

// Button labels --------------------------------------------------------------
pub const LABEL_START_DRAW: &str = "Start draw";
pub const LABEL_ALL_DRAWN: &str = "All drawn";
pub const LABEL_DRAWING: &str = "Drawing...";

// RNG stream tags ------------------------------------------------------------
pub(crate) const STREAM_SELECTION: &[u8] = b"selection";
pub(crate) const STREAM_SPIN: &[u8] = b"spin";
