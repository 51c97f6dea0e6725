use anyhow::{Result, bail, ensure};
use prizewheel_core::{
    ButtonLabel, CloseOutcome, ContextId, DrawError, ModeChange, RegistryError, RevealPolicy,
    RevealStage,
};

use super::{ScenarioCtx, TestScenario};

/// Upper bound on draws in a drain loop so a broken ledger cannot spin forever.
const DRAIN_GUARD: usize = 2_000;

pub fn catalog_scenarios() -> Vec<TestScenario> {
    vec![
        TestScenario::new("smoke", "Smoke Test", smoke),
        TestScenario::new("exhaustion", "Continuous Mode Exhaustion", exhaustion),
        TestScenario::new(
            "repeat-draws",
            "Repeat Winners Without Continuous Mode",
            repeat_draws,
        ),
        TestScenario::new("narrowing", "Candidate Narrowing", narrowing).with_entrants(999),
        TestScenario::new("mode-reset", "Continuous Mode Reset", mode_reset),
        TestScenario::new("abandoned-reveal", "Abandoned Reveal", abandoned_reveal),
        TestScenario::new("instant-reveal", "Instant Reveal Policy", instant_reveal),
        TestScenario::new("winners-roster", "Winners Roster", winners_roster).with_entrants(6),
    ]
}

fn open_reward(ctx: &mut ScenarioCtx, index: usize, title: &str) -> Result<ContextId> {
    let id = ContextId::reward(index);
    let loaded = ctx
        .engine
        .open_reward_context(&id, title, &format!("reward-{index}"))?;
    ensure!(loaded > 0, "reward '{title}' loaded no entrants");
    if ctx.verbose {
        println!("     ↳ '{title}' loaded {loaded} entrants (seed {})", ctx.seed);
    }
    Ok(id)
}

fn smoke(ctx: &mut ScenarioCtx) -> Result<usize> {
    let range = ContextId::range();
    let expected_len = usize::from(ctx.engine.registry().config().default_range_max);
    let pool_len = ctx.engine.open_range_context()?.pool().len();
    ensure!(
        pool_len == expected_len,
        "range context should start with {expected_len} entries, got {pool_len}"
    );

    let frames = ctx.engine.spin_sequence(&range)?;
    let cfg = ctx.engine.registry().config();
    let ticks = usize::try_from(cfg.spin_ticks)?;
    ensure!(frames.len() == ticks, "expected {ticks} spin frames");
    let timing = cfg.spin_timing();
    ensure!(
        u64::try_from(frames.len())? * u64::from(timing.frame_interval_ms) == timing.stop_at_ms,
        "spin frames do not fill the {}ms spin",
        timing.stop_at_ms
    );

    match ctx.engine.draw_to_completion(&range)? {
        CloseOutcome::Released(entry) => {
            let in_pool = ctx
                .engine
                .registry()
                .context(&range)
                .is_some_and(|c| c.pool().contains(&entry.id));
            ensure!(in_pool, "winner {} is not in the pool", entry.id);
        }
        other => bail!("expected a released winner, got {other:?}"),
    }

    let reward = open_reward(ctx, 0, "Hydrate")?;
    ctx.engine.start_draw(&reward)?;
    for stage in 1..=3_usize {
        let state = ctx.engine.advance_reveal(&reward)?;
        let hidden = state.masked_code.chars().filter(|c| *c == '?').count();
        ensure!(
            hidden == 3 - stage,
            "stage {stage} should mask {} digits, wheel shows '{}'",
            3 - stage,
            state.masked_code
        );
    }
    ensure!(
        matches!(ctx.engine.close_draw(&reward)?, CloseOutcome::Released(_)),
        "reward draw should release its winner outside continuous mode"
    );
    Ok(2)
}

fn exhaustion(ctx: &mut ScenarioCtx) -> Result<usize> {
    let range = ContextId::range();
    ctx.engine.open_range_context()?;
    ctx.engine.apply_range_input(&range, "25")?;
    ctx.engine.set_continuous_mode(&range, true)?;

    let mut draws = 0;
    while draws < DRAIN_GUARD {
        match ctx.engine.draw_to_completion(&range) {
            Ok(CloseOutcome::Finalized(_)) => draws += 1,
            Ok(other) => bail!("continuous draw did not finalize: {other:?}"),
            Err(RegistryError::Draw(DrawError::EmptyPool { .. })) => break,
            Err(err) => return Err(err.into()),
        }
    }
    ensure!(draws == 25, "expected 25 finalized draws, got {draws}");

    let registry = ctx.engine.registry();
    let mut drawn: Vec<_> = registry.ledger().drawn(&range).to_vec();
    drawn.sort();
    drawn.dedup();
    ensure!(drawn.len() == 25, "ledger holds duplicate winners");

    let button = registry.button_state(&range)?;
    ensure!(
        !button.enabled && button.label == ButtonLabel::AllDrawn,
        "exhausted context should disable its button, got {button:?}"
    );
    Ok(draws)
}

fn repeat_draws(ctx: &mut ScenarioCtx) -> Result<usize> {
    let range = ContextId::range();
    ctx.engine.open_range_context()?;
    ctx.engine.apply_range_input(&range, "10")?;

    let mut winners = Vec::new();
    for _ in 0..40 {
        match ctx.engine.draw_to_completion(&range)? {
            CloseOutcome::Released(entry) => winners.push(entry.id),
            other => bail!("non-continuous draw should release its winner, got {other:?}"),
        }
    }
    let registry = ctx.engine.registry();
    ensure!(
        registry.ledger().drawn_count(&range) == 0,
        "ledger must stay empty outside continuous mode"
    );
    ensure!(
        registry.remaining(&range)?.len() == 10,
        "pool should keep all 10 entries"
    );
    winners.sort();
    winners.dedup();
    ensure!(
        winners.len() < 40,
        "40 draws over 10 entries must repeat a winner"
    );
    Ok(40)
}

fn narrowing(ctx: &mut ScenarioCtx) -> Result<usize> {
    let reward = open_reward(ctx, 0, "Song request")?;
    let limits = ctx.engine.registry().config().candidate_limits();

    for _ in 0..5 {
        let result = ctx.engine.start_draw(&reward)?;
        let winner = result.winner.id.clone();

        let hundreds = ctx.engine.advance_reveal(&reward)?;
        ensure!(
            hundreds
                .candidate_pool
                .iter()
                .all(|entry| entry.id.shares_prefix(&winner, 1)),
            "hundreds stage kept a candidate with the wrong first digit"
        );
        ensure!(hundreds.candidates.is_none(), "candidates shown too early");

        let tens = ctx.engine.advance_reveal(&reward)?;
        let display = tens
            .candidates
            .ok_or_else(|| anyhow::anyhow!("tens stage did not fill the candidate display"))?;
        let expected: Vec<_> = result
            .eligible
            .iter()
            .filter(|entry| entry.id.shares_prefix(&winner, 2))
            .take(limits.cap)
            .map(|entry| entry.id.clone())
            .collect();
        let shown: Vec<_> = display.iter().map(|entry| entry.id.clone()).collect();
        ensure!(shown == expected, "candidate display {shown:?} != {expected:?}");
        ensure!(
            display.left.len() <= limits.bucket,
            "left bucket exceeds {}",
            limits.bucket
        );

        let units = ctx.engine.advance_reveal(&reward)?;
        let highlighted = units.candidates.and_then(|display| display.highlighted);
        ensure!(
            highlighted.as_ref() == Some(&winner) || !shown.contains(&winner),
            "winner {winner} was not highlighted"
        );
        ctx.engine.close_draw(&reward)?;
    }
    Ok(5)
}

fn mode_reset(ctx: &mut ScenarioCtx) -> Result<usize> {
    let reward = open_reward(ctx, 0, "Hydrate")?;
    let initial = ctx.engine.registry().remaining(&reward)?.len();
    ctx.engine.set_continuous_mode(&reward, true)?;
    for _ in 0..3 {
        ctx.engine.draw_to_completion(&reward)?;
    }
    let remaining = ctx.engine.registry().remaining(&reward)?.len();
    ensure!(
        remaining == initial - 3,
        "expected {} remaining, got {remaining}",
        initial - 3
    );

    ctx.engine.source().grow(2);
    let change = ctx.engine.set_continuous_mode(&reward, false)?;
    ensure!(
        change == ModeChange::DisabledAndRebuilt {
            pool_len: initial + 2
        },
        "unexpected mode change {change:?}"
    );
    ensure!(
        ctx.engine.registry().ledger().drawn_count(&reward) == 0,
        "ledger should be cleared when continuous mode is turned off"
    );
    ensure!(
        ctx.engine.source().fetches() == 2,
        "turning continuous mode off should re-fetch entrants once"
    );
    Ok(3)
}

fn abandoned_reveal(ctx: &mut ScenarioCtx) -> Result<usize> {
    let range = ContextId::range();
    ctx.engine.open_range_context()?;
    ctx.engine.set_continuous_mode(&range, true)?;

    ctx.engine.start_draw(&range)?;
    ensure!(
        ctx.engine.start_draw(&range).is_err(),
        "second draw must be refused while a reveal is open"
    );
    ctx.engine.advance_reveal(&range)?;
    match ctx.engine.close_draw(&range)? {
        CloseOutcome::Abandoned(result) => {
            ensure!(
                result.stage == RevealStage::Hundreds,
                "abandoned at unexpected stage {:?}",
                result.stage
            );
        }
        other => bail!("early close should abandon the draw, got {other:?}"),
    }
    let registry = ctx.engine.registry();
    ensure!(
        registry.ledger().drawn_count(&range) == 0,
        "abandoned draw must not be recorded"
    );
    ensure!(
        registry.button_state(&range)?.label == ButtonLabel::StartDraw,
        "button should be ready after an abandoned draw"
    );
    Ok(0)
}

fn instant_reveal(ctx: &mut ScenarioCtx) -> Result<usize> {
    let range = ContextId::range();
    ctx.engine.open_range_context()?;
    ctx.engine.set_continuous_mode(&range, true)?;
    let registry = ctx.engine.registry_mut();
    registry.set_skip_staged_reveal(&range, true)?;
    registry.set_no_overlay(&range, true)?;

    ctx.engine.start_draw(&range)?;
    let state = ctx
        .engine
        .registry()
        .reveal_state(&range)
        .ok_or_else(|| anyhow::anyhow!("no reveal in flight"))?;
    ensure!(state.policy == RevealPolicy::Instant, "skip flag should win");
    ensure!(state.stage.is_complete(), "instant reveal shows every digit");

    let cfg = ctx.engine.registry().config();
    ensure!(
        state.policy.finalize_delay_ms(cfg) == Some(cfg.instant_finalize_delay_ms),
        "instant reveal should hint the short finalize delay"
    );
    ensure!(
        matches!(ctx.engine.close_draw(&range)?, CloseOutcome::Finalized(_)),
        "instant reveal should finalize on close"
    );
    Ok(1)
}

fn winners_roster(ctx: &mut ScenarioCtx) -> Result<usize> {
    let hydrate = open_reward(ctx, 0, "Hydrate")?;
    let song = open_reward(ctx, 1, "Song request")?;
    for id in [&hydrate, &song] {
        ctx.engine.set_continuous_mode(id, true)?;
        for _ in 0..2 {
            ctx.engine.draw_to_completion(id)?;
        }
    }

    let roster = ctx.engine.registry().roster();
    ensure!(roster.len() == 4, "expected 4 roster rows, got {}", roster.len());
    let first = roster.records()[0].id;

    let registry = ctx.engine.registry_mut();
    ensure!(registry.roster_mut().remove(first), "roster row not removed");
    ensure!(registry.roster_mut().clear() == 3, "clear should drop 3 rows");
    ensure!(
        registry.ledger().drawn_count(&hydrate) == 2 && registry.ledger().drawn_count(&song) == 2,
        "roster edits must not touch the ledger"
    );
    Ok(4)
}
