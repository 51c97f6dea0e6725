use std::collections::HashSet;
use std::convert::Infallible;

use prizewheel_core::{
    CloseOutcome, ContextId, ContextKind, ContextRegistry, Entrant, EntrantSource, EntryId,
    ModeChange, PoolError, RegistryError, RevealStage, RngBundle, ScriptedPicks, WheelConfig,
    WinnerLedger, build_from_range, draw,
};

struct NoFetch;

impl EntrantSource for NoFetch {
    type Error = Infallible;

    fn fetch_entrants(
        &self,
        _context: &ContextId,
        _kind: &ContextKind,
    ) -> Result<Vec<Entrant>, Self::Error> {
        Ok(Vec::new())
    }
}

fn code(text: &str) -> EntryId {
    EntryId::parse(text).unwrap()
}

fn codes(entries: &[prizewheel_core::Entry]) -> Vec<&str> {
    entries.iter().map(|entry| entry.id.as_str()).collect()
}

fn five_entry_registry() -> (ContextRegistry, ContextId) {
    let mut registry = ContextRegistry::new(WheelConfig::default()).unwrap();
    let ctx = ContextId::range();
    registry.get_or_create(&ctx).unwrap();
    registry.regenerate_range(&ctx, 5).unwrap();
    (registry, ctx)
}

#[test]
fn staged_draw_in_continuous_mode_records_winner() {
    let (mut registry, ctx) = five_entry_registry();
    registry.set_continuous_mode(&ctx, true, &NoFetch).unwrap();

    let result = registry
        .start_draw(&ctx, &mut ScriptedPicks::new(vec![2]))
        .unwrap();
    assert_eq!(result.winner_id(), &code("003"));
    assert_eq!(result.stage, RevealStage::Hidden);

    let mut last = None;
    for _ in 0..3 {
        last = Some(registry.advance_reveal(&ctx).unwrap());
    }
    let state = last.unwrap();
    assert_eq!(state.stage, RevealStage::Units);
    assert_eq!(state.revealed_digits, "003");

    let outcome = registry.close_draw(&ctx).unwrap();
    assert!(matches!(outcome, CloseOutcome::Finalized(ref entry) if entry.id == code("003")));
    assert!(registry.ledger().is_drawn(&ctx, &code("003")));
    assert_eq!(
        codes(&registry.remaining(&ctx).unwrap()),
        vec!["001", "002", "004", "005"]
    );
}

#[test]
fn repeat_winners_without_continuous_mode_leave_ledger_empty() {
    let (mut registry, ctx) = five_entry_registry();
    let mut forced = ScriptedPicks::new(vec![1]);
    for _ in 0..2 {
        let result = registry.start_draw(&ctx, &mut forced).unwrap();
        assert_eq!(result.winner_id(), &code("002"));
        while registry.advance_reveal(&ctx).unwrap().stage != RevealStage::Units {}
        assert!(matches!(
            registry.close_draw(&ctx).unwrap(),
            CloseOutcome::Released(_)
        ));
    }
    assert_eq!(registry.ledger().drawn_count(&ctx), 0);
    assert_eq!(registry.context(&ctx).unwrap().pool().len(), 5);
}

#[test]
fn out_of_range_bounds_are_rejected() {
    assert!(matches!(
        build_from_range(1, 1000),
        Err(PoolError::InvalidRange { .. })
    ));
    assert!(matches!(
        build_from_range(1, 0),
        Err(PoolError::InvalidRange { .. })
    ));
}

#[test]
fn disabling_continuous_mode_restores_full_pool() {
    let (mut registry, ctx) = five_entry_registry();
    registry.set_continuous_mode(&ctx, true, &NoFetch).unwrap();
    let mut picks = ScriptedPicks::new(vec![0, 3]);
    for _ in 0..2 {
        registry.start_draw(&ctx, &mut picks).unwrap();
        while registry.advance_reveal(&ctx).unwrap().stage != RevealStage::Units {}
        registry.close_draw(&ctx).unwrap();
    }
    assert_eq!(registry.ledger().drawn_count(&ctx), 2);
    assert_eq!(registry.remaining(&ctx).unwrap().len(), 3);

    let change = registry.set_continuous_mode(&ctx, false, &NoFetch).unwrap();
    assert_eq!(change, ModeChange::DisabledAndRebuilt { pool_len: 5 });
    assert_eq!(registry.ledger().drawn_count(&ctx), 0);
    assert_eq!(
        codes(registry.context(&ctx).unwrap().pool().entries()),
        vec!["001", "002", "003", "004", "005"]
    );
}

#[test]
fn remaining_shrinks_by_one_per_finalized_draw() {
    let mut registry = ContextRegistry::new(WheelConfig::default()).unwrap();
    let ctx = ContextId::range();
    registry.get_or_create(&ctx).unwrap();
    registry.regenerate_range(&ctx, 37).unwrap();
    registry.set_continuous_mode(&ctx, true, &NoFetch).unwrap();
    registry.set_skip_staged_reveal(&ctx, true).unwrap();

    let mut rng = RngBundle::from_user_seed(0xBEEF);
    let mut seen = HashSet::new();
    for n in 1..=37 {
        let result = registry.start_draw(&ctx, rng.selection()).unwrap();
        assert!(seen.insert(result.winner.id.clone()), "duplicate winner");
        registry.close_draw(&ctx).unwrap();
        assert_eq!(registry.remaining(&ctx).unwrap().len(), 37 - n);
    }
    assert_eq!(registry.ledger().drawn(&ctx).len(), 37);

    let before = registry.ledger().clone();
    let err = registry.start_draw(&ctx, rng.selection()).unwrap_err();
    assert!(matches!(err, RegistryError::Draw(_)));
    assert_eq!(registry.ledger(), &before);
    assert_eq!(registry.context(&ctx).unwrap().pool().len(), 37);
}

#[test]
fn record_is_idempotent() {
    let ctx = ContextId::range();
    let mut once = WinnerLedger::new();
    once.record(&ctx, &code("004"));
    let mut twice = WinnerLedger::new();
    twice.record(&ctx, &code("004"));
    twice.record(&ctx, &code("004"));
    assert_eq!(once, twice);
}

#[test]
fn tens_stage_narrowing_is_exact_for_any_pool_size() {
    let ctx = ContextId::reward(0);
    for max in [12_i64, 57, 140, 999] {
        let pool = build_from_range(1, max).unwrap();
        let mut rng = RngBundle::from_user_seed(max.unsigned_abs());
        for _ in 0..20 {
            let result = draw(&ctx, &pool, &WinnerLedger::new(), false, rng.selection()).unwrap();
            let winner = result.winner.id.clone();
            let mut machine = prizewheel_core::RevealStateMachine::start(
                result,
                prizewheel_core::RevealPolicy::StagedOverlay,
                WheelConfig::default().candidate_limits(),
            );
            machine.advance();
            machine.advance();

            let expected: Vec<&str> = pool
                .iter()
                .filter(|entry| entry.id.prefix(2) == winner.prefix(2))
                .take(10)
                .map(|entry| entry.id.as_str())
                .collect();
            let shown: Vec<&str> = machine
                .candidate_display()
                .unwrap()
                .iter()
                .map(|entry| entry.id.as_str())
                .collect();
            assert_eq!(shown, expected);
        }
    }
}
