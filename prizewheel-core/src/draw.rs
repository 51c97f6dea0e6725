//! Winner selection and reveal policy resolution.
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::WheelConfig;
use crate::ledger::WinnerLedger;
use crate::pool::{Entry, EntryId, Pool};
use crate::registry::ContextId;
use crate::reveal::RevealStage;
use crate::rng::SelectionSource;

/// Errors raised when a draw cannot start.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DrawError {
    #[error("context '{context}' has no eligible entries to draw")]
    EmptyPool { context: ContextId },
}

/// How a draw is revealed to the audience.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum RevealPolicy {
    /// Full code shown as soon as the wheel stops.
    Instant,
    /// Digits revealed one at a time inside the wheel panel.
    StagedInteractive,
    /// Digits revealed one at a time on a full-screen overlay.
    #[default]
    StagedOverlay,
}

impl RevealPolicy {
    /// Resolve the policy from per-context flags. Skipping the staged reveal
    /// takes precedence over the overlay choice.
    #[must_use]
    pub const fn resolve(skip_staged_reveal: bool, no_overlay: bool) -> Self {
        if skip_staged_reveal {
            Self::Instant
        } else if no_overlay {
            Self::StagedInteractive
        } else {
            Self::StagedOverlay
        }
    }

    #[must_use]
    pub const fn is_staged(self) -> bool {
        !matches!(self, Self::Instant)
    }

    /// Pause the presentation layer should hold before closing a completed
    /// draw. `None` means the operator closes it.
    #[must_use]
    pub const fn finalize_delay_ms(self, cfg: &WheelConfig) -> Option<u32> {
        match self {
            Self::Instant => Some(cfg.instant_finalize_delay_ms),
            Self::StagedInteractive => Some(cfg.inline_finalize_delay_ms),
            Self::StagedOverlay => None,
        }
    }
}

/// Outcome of a single random selection, before any digit is revealed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DrawResult {
    pub context: ContextId,
    pub winner: Entry,
    /// Digits disclosed so far, `0..=3` characters.
    pub revealed_digits: String,
    pub stage: RevealStage,
    /// Eligible subset the winner was chosen from, in pool order.
    pub eligible: Vec<Entry>,
}

impl DrawResult {
    #[must_use]
    pub const fn winner_id(&self) -> &EntryId {
        &self.winner.id
    }
}

/// Entries a draw may select: the whole pool, or only undrawn entries when
/// continuous mode is on.
#[must_use]
pub fn eligible_entries(
    context: &ContextId,
    pool: &Pool,
    ledger: &WinnerLedger,
    continuous_mode: bool,
) -> Vec<Entry> {
    if continuous_mode {
        ledger.remaining(context, pool)
    } else {
        pool.entries().to_vec()
    }
}

/// Pick one eligible entry uniformly at random. Never touches the ledger.
///
/// # Errors
///
/// Returns [`DrawError::EmptyPool`] when nothing is eligible.
pub fn draw<S: SelectionSource + ?Sized>(
    context: &ContextId,
    pool: &Pool,
    ledger: &WinnerLedger,
    continuous_mode: bool,
    source: &mut S,
) -> Result<DrawResult, DrawError> {
    let eligible = eligible_entries(context, pool, ledger, continuous_mode);
    if eligible.is_empty() {
        return Err(DrawError::EmptyPool {
            context: context.clone(),
        });
    }
    let index = source.pick_index(eligible.len()).min(eligible.len() - 1);
    let winner = eligible[index].clone();
    log::info!(
        "draw in '{context}': selected {} from {} eligible (continuous: {continuous_mode})",
        winner.id,
        eligible.len()
    );
    Ok(DrawResult {
        context: context.clone(),
        winner,
        revealed_digits: String::new(),
        stage: RevealStage::Hidden,
        eligible,
    })
}

/// Codes flashed on the wheel while it spins. Cosmetic only.
#[must_use]
pub fn spin_sequence<S: SelectionSource + ?Sized>(
    eligible: &[Entry],
    ticks: u32,
    source: &mut S,
) -> Vec<EntryId> {
    if eligible.is_empty() {
        return Vec::new();
    }
    (0..ticks)
        .map(|_| {
            let index = source.pick_index(eligible.len()).min(eligible.len() - 1);
            eligible[index].id.clone()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::build_from_range;
    use crate::rng::{RngBundle, ScriptedPicks};

    fn code(number: u16) -> EntryId {
        EntryId::from_number(number).unwrap()
    }

    #[test]
    fn policy_resolution_prefers_skip() {
        assert_eq!(RevealPolicy::resolve(true, true), RevealPolicy::Instant);
        assert_eq!(RevealPolicy::resolve(true, false), RevealPolicy::Instant);
        assert_eq!(
            RevealPolicy::resolve(false, true),
            RevealPolicy::StagedInteractive
        );
        assert_eq!(
            RevealPolicy::resolve(false, false),
            RevealPolicy::StagedOverlay
        );
        let cfg = WheelConfig::default();
        assert_eq!(RevealPolicy::Instant.finalize_delay_ms(&cfg), Some(500));
        assert_eq!(RevealPolicy::StagedOverlay.finalize_delay_ms(&cfg), None);
    }

    #[test]
    fn draw_excludes_ledgered_winners_in_continuous_mode() {
        let ctx = ContextId::from("custom");
        let pool = build_from_range(1, 3).unwrap();
        let mut ledger = WinnerLedger::new();
        ledger.record(&ctx, &code(1));
        ledger.record(&ctx, &code(2));

        let mut picks = ScriptedPicks::new(vec![0]);
        let result = draw(&ctx, &pool, &ledger, true, &mut picks).unwrap();
        assert_eq!(result.winner_id(), &code(3));
        assert_eq!(result.stage, RevealStage::Hidden);
        assert!(result.revealed_digits.is_empty());
        assert_eq!(result.eligible.len(), 1);

        let repeat = draw(&ctx, &pool, &ledger, false, &mut picks).unwrap();
        assert_eq!(repeat.winner_id(), &code(1));
        assert_eq!(repeat.eligible.len(), 3);
    }

    #[test]
    fn draw_on_exhausted_pool_fails_without_mutation() {
        let ctx = ContextId::from("custom");
        let pool = build_from_range(1, 2).unwrap();
        let mut ledger = WinnerLedger::new();
        ledger.record(&ctx, &code(1));
        ledger.record(&ctx, &code(2));
        let snapshot = ledger.clone();

        let mut bundle = RngBundle::from_user_seed(5);
        let err = draw(&ctx, &pool, &ledger, true, bundle.selection()).unwrap_err();
        assert_eq!(
            err,
            DrawError::EmptyPool {
                context: ctx.clone()
            }
        );
        assert_eq!(ledger, snapshot);
        assert_eq!(pool.len(), 2);
    }

    #[test]
    fn every_eligible_entry_can_win() {
        let ctx = ContextId::from("custom");
        let pool = build_from_range(1, 8).unwrap();
        let ledger = WinnerLedger::new();
        let mut bundle = RngBundle::from_user_seed(2024);
        let mut seen = std::collections::HashSet::new();
        for _ in 0..400 {
            let result = draw(&ctx, &pool, &ledger, false, bundle.selection()).unwrap();
            seen.insert(result.winner.id);
        }
        assert_eq!(seen.len(), 8);
    }

    #[test]
    fn spin_sequence_only_shows_eligible_codes() {
        let pool = build_from_range(10, 14).unwrap();
        let mut bundle = RngBundle::from_user_seed(3);
        let frames = spin_sequence(pool.entries(), 50, bundle.spin());
        assert_eq!(frames.len(), 50);
        assert!(frames.iter().all(|id| pool.contains(id)));
        assert!(spin_sequence(&[], 50, bundle.spin()).is_empty());
    }
}
