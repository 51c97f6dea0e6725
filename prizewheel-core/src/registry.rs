//! Per-context draw state: pool, mode flags, in-flight reveal and ledger.
//!
//! Each context ("tab") is isolated. The registry owns the shared ledger and
//! roster but every mutation is scoped to one context id, and a context can
//! only have one reveal in flight at a time.
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::EntrantSource;
use crate::config::{ConfigError, WheelConfig};
use crate::constants::{
    LABEL_ALL_DRAWN, LABEL_DRAWING, LABEL_START_DRAW, MIN_ENTRY_NUMBER, RANGE_CONTEXT_ID,
    RANGE_CONTEXT_TITLE,
};
use crate::draw::{self, DrawError, DrawResult, RevealPolicy};
use crate::ledger::WinnerLedger;
use crate::pool::{self, Entrant, Entry, EntryId, Pool, PoolError, PoolSource};
use crate::reveal::{RevealState, RevealStateMachine};
use crate::rng::SelectionSource;
use crate::roster::WinnersRoster;

/// Identifier of an isolated draw context.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContextId(String);

impl ContextId {
    /// The generic numeric-range context.
    #[must_use]
    pub fn range() -> Self {
        Self(RANGE_CONTEXT_ID.to_string())
    }

    /// Context id for the reward tab at `index`.
    #[must_use]
    pub fn reward(index: usize) -> Self {
        Self(format!("reward-{index}"))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn is_range(&self) -> bool {
        self.0 == RANGE_CONTEXT_ID
    }
}

impl fmt::Display for ContextId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ContextId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for ContextId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// What feeds a context's pool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ContextKind {
    /// Locally generated numeric range.
    Range,
    /// Redemptions of a channel reward, fetched by the rewards collaborator.
    Reward { reward_id: String },
}

/// Errors surfaced by registry operations. None of them leave partial state.
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("unknown context '{0}'")]
    UnknownContext(ContextId),
    #[error(transparent)]
    Pool(#[from] PoolError),
    #[error(transparent)]
    Draw(#[from] DrawError),
    #[error("context '{context}' already has a draw in progress")]
    DrawInProgress { context: ContextId },
    #[error("context '{context}' has no draw in progress")]
    NoActiveDraw { context: ContextId },
    #[error("draw in context '{context}' is not fully revealed")]
    NotFullyRevealed { context: ContextId },
    #[error("entry {id} is not part of context '{context}'")]
    NotInPool { context: ContextId, id: EntryId },
    #[error("range generation is not available for reward context '{context}'")]
    NotARangeContext { context: ContextId },
    #[error("failed to fetch entrants for '{context}'")]
    Source {
        context: ContextId,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

/// Label shown on a context's start button.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ButtonLabel {
    StartDraw,
    AllDrawn,
    Drawing,
}

impl ButtonLabel {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::StartDraw => LABEL_START_DRAW,
            Self::AllDrawn => LABEL_ALL_DRAWN,
            Self::Drawing => LABEL_DRAWING,
        }
    }
}

impl fmt::Display for ButtonLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ButtonState {
    pub enabled: bool,
    pub label: ButtonLabel,
}

/// Result of closing a reveal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CloseOutcome {
    /// Fully revealed under continuous mode; the winner is now ledgered.
    Finalized(Entry),
    /// Fully revealed without continuous mode; the winner stays eligible.
    Released(Entry),
    /// Closed before the last digit; nothing recorded.
    Abandoned(DrawResult),
}

/// Result of toggling continuous mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModeChange {
    Enabled,
    /// Turned off; the pool was rebuilt and the ledger cleared.
    DisabledAndRebuilt { pool_len: usize },
    Unchanged,
}

/// One isolated draw session.
#[derive(Debug, Clone)]
pub struct DrawContext {
    id: ContextId,
    title: String,
    kind: ContextKind,
    pool: Pool,
    loaded: bool,
    continuous_mode: bool,
    skip_staged_reveal: bool,
    no_overlay: bool,
    active: Option<RevealStateMachine>,
}

impl DrawContext {
    fn new(id: ContextId, title: String, kind: ContextKind, pool: Pool, loaded: bool) -> Self {
        Self {
            id,
            title,
            kind,
            pool,
            loaded,
            continuous_mode: false,
            skip_staged_reveal: false,
            no_overlay: false,
            active: None,
        }
    }

    #[must_use]
    pub const fn id(&self) -> &ContextId {
        &self.id
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    #[must_use]
    pub const fn kind(&self) -> &ContextKind {
        &self.kind
    }

    #[must_use]
    pub const fn pool(&self) -> &Pool {
        &self.pool
    }

    /// Whether entrants have been fetched at least once.
    #[must_use]
    pub const fn is_loaded(&self) -> bool {
        self.loaded
    }

    #[must_use]
    pub const fn continuous_mode(&self) -> bool {
        self.continuous_mode
    }

    #[must_use]
    pub const fn skip_staged_reveal(&self) -> bool {
        self.skip_staged_reveal
    }

    #[must_use]
    pub const fn no_overlay(&self) -> bool {
        self.no_overlay
    }

    #[must_use]
    pub const fn policy(&self) -> RevealPolicy {
        RevealPolicy::resolve(self.skip_staged_reveal, self.no_overlay)
    }

    /// Whether the pool comes from a channel reward's redemptions.
    #[must_use]
    pub const fn is_reward(&self) -> bool {
        matches!(self.kind, ContextKind::Reward { .. })
    }

    /// Reward contexts show the named candidate buckets; range contexts only
    /// have bare numbers.
    #[must_use]
    pub const fn shows_candidates(&self) -> bool {
        self.is_reward()
    }

    #[must_use]
    pub const fn active_draw(&self) -> Option<&RevealStateMachine> {
        self.active.as_ref()
    }

    #[must_use]
    pub const fn is_drawing(&self) -> bool {
        self.active.is_some()
    }
}

/// Owner of every context, the ledger and the winners roster.
#[derive(Debug, Clone, Default)]
pub struct ContextRegistry {
    config: WheelConfig,
    contexts: Vec<DrawContext>,
    ledger: WinnerLedger,
    roster: WinnersRoster,
}

impl ContextRegistry {
    /// # Errors
    ///
    /// Returns the first invariant `config` violates.
    pub fn new(config: WheelConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            config,
            ..Self::default()
        })
    }

    #[must_use]
    pub const fn config(&self) -> &WheelConfig {
        &self.config
    }

    #[must_use]
    pub const fn ledger(&self) -> &WinnerLedger {
        &self.ledger
    }

    #[must_use]
    pub const fn roster(&self) -> &WinnersRoster {
        &self.roster
    }

    pub fn roster_mut(&mut self) -> &mut WinnersRoster {
        &mut self.roster
    }

    /// Contexts in creation order.
    pub fn contexts(&self) -> impl Iterator<Item = &DrawContext> {
        self.contexts.iter()
    }

    #[must_use]
    pub fn context(&self, id: &ContextId) -> Option<&DrawContext> {
        self.contexts.iter().find(|ctx| &ctx.id == id)
    }

    fn context_mut(&mut self, id: &ContextId) -> Result<&mut DrawContext, RegistryError> {
        self.contexts
            .iter_mut()
            .find(|ctx| &ctx.id == id)
            .ok_or_else(|| RegistryError::UnknownContext(id.clone()))
    }

    fn require(&self, id: &ContextId) -> Result<&DrawContext, RegistryError> {
        self.context(id)
            .ok_or_else(|| RegistryError::UnknownContext(id.clone()))
    }

    /// Fetch a context, creating it on first use. The range id gets a numeric
    /// pool of the default size; any other id becomes an unloaded reward
    /// context titled after its id.
    ///
    /// # Errors
    ///
    /// Fails if the default range cannot be built.
    pub fn get_or_create(&mut self, id: &ContextId) -> Result<&DrawContext, RegistryError> {
        let position = match self.contexts.iter().position(|ctx| &ctx.id == id) {
            Some(position) => position,
            None => {
                let ctx = if id.is_range() {
                    self.new_range_context(id.clone())?
                } else {
                    DrawContext::new(
                        id.clone(),
                        id.to_string(),
                        ContextKind::Reward {
                            reward_id: id.to_string(),
                        },
                        Pool::unloaded(),
                        false,
                    )
                };
                log::debug!("created context '{id}'");
                self.contexts.push(ctx);
                self.contexts.len() - 1
            }
        };
        Ok(&self.contexts[position])
    }

    fn new_range_context(&self, id: ContextId) -> Result<DrawContext, RegistryError> {
        let max = i64::from(self.config.default_range_max);
        let pool = pool::build_from_range(i64::from(MIN_ENTRY_NUMBER), max)?;
        Ok(DrawContext::new(
            id,
            RANGE_CONTEXT_TITLE.to_string(),
            ContextKind::Range,
            pool,
            true,
        ))
    }

    /// Register a reward tab. Its pool stays empty until entrants are loaded.
    /// Re-registering an existing id only refreshes the title.
    pub fn open_reward_context(
        &mut self,
        id: &ContextId,
        title: impl Into<String>,
        reward_id: impl Into<String>,
    ) -> &DrawContext {
        let title = title.into();
        if let Some(position) = self.contexts.iter().position(|ctx| &ctx.id == id) {
            self.contexts[position].title = title;
            return &self.contexts[position];
        }
        self.contexts.push(DrawContext::new(
            id.clone(),
            title,
            ContextKind::Reward {
                reward_id: reward_id.into(),
            },
            Pool::unloaded(),
            false,
        ));
        &self.contexts[self.contexts.len() - 1]
    }

    /// Replace a context's pool and clear its ledger.
    ///
    /// # Errors
    ///
    /// Fails if the context is unknown or mid-draw.
    pub fn load_pool(&mut self, id: &ContextId, pool: Pool) -> Result<(), RegistryError> {
        let ctx = self.context_mut(id)?;
        if ctx.is_drawing() {
            return Err(RegistryError::DrawInProgress {
                context: id.clone(),
            });
        }
        let len = pool.len();
        ctx.pool = pool;
        ctx.loaded = true;
        self.ledger.reset(id);
        log::info!("context '{id}' loaded {len} entries; ledger cleared");
        Ok(())
    }

    /// Number a fetched entrant list and install it as the context's pool.
    ///
    /// # Errors
    ///
    /// Fails on an unknown or busy context, or more than 999 entrants.
    pub fn load_entrants(
        &mut self,
        id: &ContextId,
        entrants: &[Entrant],
    ) -> Result<(), RegistryError> {
        self.require(id)?;
        let pool = pool::build_from_entries(entrants)?;
        self.load_pool(id, pool)
    }

    /// Regenerate a range context as `001..=max`.
    ///
    /// # Errors
    ///
    /// Fails on an invalid bound, a reward context, or a busy context.
    pub fn regenerate_range(&mut self, id: &ContextId, max: i64) -> Result<(), RegistryError> {
        if !matches!(self.require(id)?.kind, ContextKind::Range) {
            return Err(RegistryError::NotARangeContext {
                context: id.clone(),
            });
        }
        let pool = pool::build_from_range(i64::from(MIN_ENTRY_NUMBER), max)?;
        self.load_pool(id, pool)
    }

    /// Toggle continuous mode. Turning it off rebuilds the pool from its source
    /// and clears the ledger; turning it on keeps everything as is.
    ///
    /// # Errors
    ///
    /// Fails on an unknown or busy context, or when re-fetching fails. On
    /// failure the flag, pool and ledger are unchanged.
    pub fn set_continuous_mode<S: EntrantSource + ?Sized>(
        &mut self,
        id: &ContextId,
        on: bool,
        source: &S,
    ) -> Result<ModeChange, RegistryError> {
        let ctx = self.require(id)?;
        if ctx.is_drawing() {
            return Err(RegistryError::DrawInProgress {
                context: id.clone(),
            });
        }
        if on {
            if ctx.continuous_mode {
                return Ok(ModeChange::Unchanged);
            }
            self.context_mut(id)?.continuous_mode = true;
            log::info!("context '{id}' continuous mode on");
            return Ok(ModeChange::Enabled);
        }

        let rebuilt = Self::rebuild_pool(ctx, source)?;
        let ctx = self.context_mut(id)?;
        ctx.continuous_mode = false;
        if let Some(pool) = rebuilt {
            ctx.pool = pool;
        }
        let pool_len = ctx.pool.len();
        self.ledger.reset(id);
        log::info!("context '{id}' continuous mode off; pool rebuilt with {pool_len} entries");
        Ok(ModeChange::DisabledAndRebuilt { pool_len })
    }

    /// Fresh pool from the context's source. Unloaded reward contexts have
    /// nothing to re-fetch and yield `None`.
    fn rebuild_pool<S: EntrantSource + ?Sized>(
        ctx: &DrawContext,
        source: &S,
    ) -> Result<Option<Pool>, RegistryError> {
        match (&ctx.kind, ctx.pool.source()) {
            (_, PoolSource::Range { min, max }) => Ok(Some(pool::build_from_range(
                i64::from(min),
                i64::from(max),
            )?)),
            (ContextKind::Range, PoolSource::Entrants) => Ok(None),
            (ContextKind::Reward { .. }, PoolSource::Entrants) if !ctx.loaded => Ok(None),
            (ContextKind::Reward { .. }, PoolSource::Entrants) => {
                let entrants =
                    source
                        .fetch_entrants(&ctx.id, &ctx.kind)
                        .map_err(|err| RegistryError::Source {
                            context: ctx.id.clone(),
                            source: Box::new(err),
                        })?;
                Ok(Some(pool::build_from_entries(&entrants)?))
            }
        }
    }

    /// # Errors
    ///
    /// Fails if the context is unknown.
    pub fn set_skip_staged_reveal(&mut self, id: &ContextId, on: bool) -> Result<(), RegistryError> {
        self.context_mut(id)?.skip_staged_reveal = on;
        Ok(())
    }

    /// # Errors
    ///
    /// Fails if the context is unknown.
    pub fn set_no_overlay(&mut self, id: &ContextId, on: bool) -> Result<(), RegistryError> {
        self.context_mut(id)?.no_overlay = on;
        Ok(())
    }

    /// Undrawn entries of a context in pool order.
    ///
    /// # Errors
    ///
    /// Fails if the context is unknown.
    pub fn remaining(&self, id: &ContextId) -> Result<Vec<Entry>, RegistryError> {
        let ctx = self.require(id)?;
        Ok(self.ledger.remaining(id, &ctx.pool))
    }

    /// Entries currently eligible for a draw in this context.
    ///
    /// # Errors
    ///
    /// Fails if the context is unknown.
    pub fn eligible(&self, id: &ContextId) -> Result<Vec<Entry>, RegistryError> {
        let ctx = self.require(id)?;
        Ok(draw::eligible_entries(
            id,
            &ctx.pool,
            &self.ledger,
            ctx.continuous_mode,
        ))
    }

    /// Ledgered entries of a context in draw order.
    ///
    /// # Errors
    ///
    /// Fails if the context is unknown.
    pub fn drawn(&self, id: &ContextId) -> Result<Vec<Entry>, RegistryError> {
        let ctx = self.require(id)?;
        Ok(self
            .ledger
            .drawn(id)
            .iter()
            .filter_map(|code| ctx.pool.get(code).cloned())
            .collect())
    }

    /// Start-button state for a context.
    ///
    /// # Errors
    ///
    /// Fails if the context is unknown.
    pub fn button_state(&self, id: &ContextId) -> Result<ButtonState, RegistryError> {
        let ctx = self.require(id)?;
        if ctx.is_drawing() {
            return Ok(ButtonState {
                enabled: false,
                label: ButtonLabel::Drawing,
            });
        }
        let exhausted = ctx.continuous_mode && self.ledger.remaining_count(id, &ctx.pool) == 0;
        Ok(ButtonState {
            enabled: !exhausted,
            label: if exhausted {
                ButtonLabel::AllDrawn
            } else {
                ButtonLabel::StartDraw
            },
        })
    }

    /// Select a winner and open its reveal.
    ///
    /// # Errors
    ///
    /// Fails on an unknown or busy context, or when nothing is eligible.
    pub fn start_draw<S: SelectionSource + ?Sized>(
        &mut self,
        id: &ContextId,
        source: &mut S,
    ) -> Result<DrawResult, RegistryError> {
        let ctx = self.require(id)?;
        if ctx.is_drawing() {
            log::warn!("rejected draw in '{id}': reveal already in progress");
            return Err(RegistryError::DrawInProgress {
                context: id.clone(),
            });
        }
        let result = draw::draw(id, &ctx.pool, &self.ledger, ctx.continuous_mode, source)
            .inspect_err(|err| log::warn!("rejected draw: {err}"))?;
        let policy = ctx.policy();
        let limits = self.config.candidate_limits();
        let machine = RevealStateMachine::start(result.clone(), policy, limits);
        self.context_mut(id)?.active = Some(machine);
        Ok(result)
    }

    /// Reveal the next digit of the context's in-flight draw.
    ///
    /// # Errors
    ///
    /// Fails if the context is unknown or idle.
    pub fn advance_reveal(&mut self, id: &ContextId) -> Result<RevealState, RegistryError> {
        let machine = self
            .context_mut(id)?
            .active
            .as_mut()
            .ok_or_else(|| RegistryError::NoActiveDraw {
                context: id.clone(),
            })?;
        machine.advance();
        Ok(machine.snapshot())
    }

    /// Current reveal snapshot, if a draw is in flight.
    #[must_use]
    pub fn reveal_state(&self, id: &ContextId) -> Option<RevealState> {
        self.context(id)
            .and_then(DrawContext::active_draw)
            .map(RevealStateMachine::snapshot)
    }

    /// Close the in-flight reveal. A fully revealed winner is ledgered when
    /// continuous mode is on; an incomplete reveal is abandoned.
    ///
    /// # Errors
    ///
    /// Fails if the context is unknown or idle.
    pub fn close_draw(&mut self, id: &ContextId) -> Result<CloseOutcome, RegistryError> {
        let ctx = self.context_mut(id)?;
        let machine = ctx.active.take().ok_or_else(|| RegistryError::NoActiveDraw {
            context: id.clone(),
        })?;
        if !machine.is_complete() {
            log::info!(
                "draw in '{id}' closed at stage {}; nothing recorded",
                machine.stage().index()
            );
            return Ok(CloseOutcome::Abandoned(machine.into_result()));
        }
        let continuous = ctx.continuous_mode;
        let winner = machine.winner().clone();
        if continuous {
            self.record_winner(id, &winner)?;
            Ok(CloseOutcome::Finalized(winner))
        } else {
            log::info!("draw in '{id}' closed; {} stays eligible", winner.id);
            Ok(CloseOutcome::Released(winner))
        }
    }

    /// Record a winner for a context directly.
    ///
    /// # Errors
    ///
    /// Fails if the context is unknown, the id is not in its pool, or the
    /// context's in-flight draw for this id is not fully revealed.
    pub fn finalize(&mut self, id: &ContextId, winner: &EntryId) -> Result<bool, RegistryError> {
        let ctx = self.require(id)?;
        if let Some(machine) = ctx.active_draw()
            && &machine.winner().id == winner
            && !machine.is_complete()
        {
            return Err(RegistryError::NotFullyRevealed {
                context: id.clone(),
            });
        }
        let entry = ctx
            .pool
            .get(winner)
            .cloned()
            .ok_or_else(|| RegistryError::NotInPool {
                context: id.clone(),
                id: winner.clone(),
            })?;
        self.record_winner(id, &entry)
    }

    fn record_winner(&mut self, id: &ContextId, winner: &Entry) -> Result<bool, RegistryError> {
        let ctx = self.require(id)?;
        let reward_title = ctx.is_reward().then(|| ctx.title.clone());
        let added = self.ledger.record(id, &winner.id);
        if added {
            log::info!(
                "context '{id}' finalized {} ({} drawn)",
                winner.id,
                self.ledger.drawn_count(id)
            );
            if let Some(title) = reward_title {
                self.roster.add(&title, &winner.id, winner.label.as_deref());
            }
        }
        Ok(added)
    }

    /// Un-draw a single ledgered id.
    ///
    /// # Errors
    ///
    /// Fails if the context is unknown.
    pub fn remove_record(&mut self, id: &ContextId, winner: &EntryId) -> Result<bool, RegistryError> {
        self.require(id)?;
        Ok(self.ledger.remove_one(id, winner))
    }

    /// Clear the context's ledger, making every entry eligible again.
    ///
    /// # Errors
    ///
    /// Fails if the context is unknown.
    pub fn clear_records(&mut self, id: &ContextId) -> Result<(), RegistryError> {
        self.require(id)?;
        self.ledger.reset(id);
        log::info!("context '{id}' records cleared");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reveal::RevealStage;
    use crate::rng::ScriptedPicks;
    use std::cell::Cell;
    use std::convert::Infallible;

    #[derive(Default)]
    struct FixtureSource {
        fetches: Cell<usize>,
    }

    impl EntrantSource for FixtureSource {
        type Error = Infallible;

        fn fetch_entrants(
            &self,
            _context: &ContextId,
            _kind: &ContextKind,
        ) -> Result<Vec<Entrant>, Self::Error> {
            self.fetches.set(self.fetches.get() + 1);
            Ok(vec![
                Entrant::new("1", "amy"),
                Entrant::new("2", "bo"),
                Entrant::new("3", "cy"),
            ])
        }
    }

    #[derive(Debug)]
    struct Offline;

    impl fmt::Display for Offline {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("offline")
        }
    }

    impl std::error::Error for Offline {}

    struct FailingSource;

    impl EntrantSource for FailingSource {
        type Error = Offline;

        fn fetch_entrants(
            &self,
            _context: &ContextId,
            _kind: &ContextKind,
        ) -> Result<Vec<Entrant>, Self::Error> {
            Err(Offline)
        }
    }

    fn code(number: u16) -> EntryId {
        EntryId::from_number(number).unwrap()
    }

    fn range_registry(max: i64) -> (ContextRegistry, ContextId) {
        let mut registry = ContextRegistry::default();
        let ctx = ContextId::range();
        registry.get_or_create(&ctx).unwrap();
        registry.regenerate_range(&ctx, max).unwrap();
        (registry, ctx)
    }

    #[test]
    fn range_context_starts_with_default_pool() {
        let mut registry = ContextRegistry::default();
        let ctx = registry.get_or_create(&ContextId::range()).unwrap();
        assert_eq!(ctx.pool().len(), 100);
        assert!(!ctx.continuous_mode());
        assert!(!ctx.is_reward());
        assert!(!ctx.shows_candidates());
        assert_eq!(ctx.policy(), RevealPolicy::StagedOverlay);
    }

    #[test]
    fn unknown_ids_become_unloaded_reward_contexts() {
        let mut registry = ContextRegistry::default();
        let ctx = registry.get_or_create(&ContextId::reward(2)).unwrap();
        assert!(ctx.pool().is_empty());
        assert!(!ctx.is_loaded());
        assert!(ctx.is_reward());
        assert!(ctx.shows_candidates());
        assert_eq!(registry.contexts().count(), 1);
        registry.get_or_create(&ContextId::reward(2)).unwrap();
        assert_eq!(registry.contexts().count(), 1);
    }

    #[test]
    fn only_one_draw_in_flight_per_context() {
        let (mut registry, ctx) = range_registry(5);
        let other = ContextId::reward(0);
        registry.open_reward_context(&other, "Hydrate", "r-1");
        registry
            .load_entrants(&other, &[Entrant::new("a", "amy")])
            .unwrap();

        let mut picks = ScriptedPicks::new(vec![0]);
        registry.start_draw(&ctx, &mut picks).unwrap();
        assert!(matches!(
            registry.start_draw(&ctx, &mut picks),
            Err(RegistryError::DrawInProgress { .. })
        ));
        assert_eq!(
            registry.button_state(&ctx).unwrap(),
            ButtonState {
                enabled: false,
                label: ButtonLabel::Drawing
            }
        );
        // Another context can draw concurrently.
        registry.start_draw(&other, &mut picks).unwrap();
        assert!(registry.reveal_state(&other).is_some());
    }

    #[test]
    fn abandoned_reveal_leaves_ledger_untouched() {
        let (mut registry, ctx) = range_registry(5);
        registry
            .set_continuous_mode(&ctx, true, &FixtureSource::default())
            .unwrap();
        let mut picks = ScriptedPicks::new(vec![2]);
        registry.start_draw(&ctx, &mut picks).unwrap();
        registry.advance_reveal(&ctx).unwrap();
        registry.advance_reveal(&ctx).unwrap();

        let outcome = registry.close_draw(&ctx).unwrap();
        assert!(matches!(outcome, CloseOutcome::Abandoned(ref result) if result.stage == RevealStage::Tens));
        assert_eq!(registry.ledger().drawn_count(&ctx), 0);
        assert!(matches!(
            registry.close_draw(&ctx),
            Err(RegistryError::NoActiveDraw { .. })
        ));
    }

    #[test]
    fn instant_policy_finalizes_on_close() {
        let (mut registry, ctx) = range_registry(3);
        registry
            .set_continuous_mode(&ctx, true, &FixtureSource::default())
            .unwrap();
        registry.set_skip_staged_reveal(&ctx, true).unwrap();

        let mut picks = ScriptedPicks::new(vec![1]);
        registry.start_draw(&ctx, &mut picks).unwrap();
        let state = registry.reveal_state(&ctx).unwrap();
        assert_eq!(state.stage, RevealStage::Units);
        assert_eq!(state.policy, RevealPolicy::Instant);

        assert_eq!(
            registry.close_draw(&ctx).unwrap(),
            CloseOutcome::Finalized(Entry::new(code(2), None))
        );
        assert!(registry.ledger().is_drawn(&ctx, &code(2)));
    }

    #[test]
    fn exhausted_context_disables_button() {
        let (mut registry, ctx) = range_registry(2);
        let source = FixtureSource::default();
        registry.set_continuous_mode(&ctx, true, &source).unwrap();
        registry.finalize(&ctx, &code(1)).unwrap();
        assert_eq!(
            registry.button_state(&ctx).unwrap().label,
            ButtonLabel::StartDraw
        );
        registry.finalize(&ctx, &code(2)).unwrap();
        assert_eq!(
            registry.button_state(&ctx).unwrap(),
            ButtonState {
                enabled: false,
                label: ButtonLabel::AllDrawn
            }
        );
        let mut picks = ScriptedPicks::new(vec![0]);
        assert!(matches!(
            registry.start_draw(&ctx, &mut picks),
            Err(RegistryError::Draw(DrawError::EmptyPool { .. }))
        ));

        registry.remove_record(&ctx, &code(2)).unwrap();
        assert!(registry.button_state(&ctx).unwrap().enabled);
        registry.clear_records(&ctx).unwrap();
        assert_eq!(registry.remaining(&ctx).unwrap().len(), 2);
    }

    #[test]
    fn finalize_rejects_foreign_and_unrevealed_ids() {
        let (mut registry, ctx) = range_registry(5);
        assert!(matches!(
            registry.finalize(&ctx, &code(9)),
            Err(RegistryError::NotInPool { .. })
        ));
        let mut picks = ScriptedPicks::new(vec![0]);
        registry.start_draw(&ctx, &mut picks).unwrap();
        assert!(matches!(
            registry.finalize(&ctx, &code(1)),
            Err(RegistryError::NotFullyRevealed { .. })
        ));
        assert!(registry.finalize(&ctx, &code(4)).unwrap());
        assert!(!registry.finalize(&ctx, &code(4)).unwrap());
    }

    #[test]
    fn disabling_continuous_mode_refetches_reward_entrants() {
        let mut registry = ContextRegistry::default();
        let ctx = ContextId::reward(0);
        registry.open_reward_context(&ctx, "Hydrate", "r-1");
        registry
            .load_entrants(&ctx, &[Entrant::new("x", "old")])
            .unwrap();
        let source = FixtureSource::default();
        registry.set_continuous_mode(&ctx, true, &source).unwrap();
        registry.finalize(&ctx, &code(1)).unwrap();
        assert_eq!(registry.roster().len(), 1);
        assert_eq!(registry.roster().records()[0].reward_name, "Hydrate");

        let change = registry.set_continuous_mode(&ctx, false, &source).unwrap();
        assert_eq!(change, ModeChange::DisabledAndRebuilt { pool_len: 3 });
        assert_eq!(source.fetches.get(), 1);
        assert_eq!(registry.ledger().drawn_count(&ctx), 0);
        assert_eq!(
            registry.context(&ctx).unwrap().pool().entries()[2].label.as_deref(),
            Some("cy")
        );
        // The roster is display state and survives the reset.
        assert_eq!(registry.roster().len(), 1);
    }

    #[test]
    fn failed_refetch_changes_nothing() {
        let mut registry = ContextRegistry::default();
        let ctx = ContextId::reward(0);
        registry.open_reward_context(&ctx, "Hydrate", "r-1");
        registry
            .load_entrants(&ctx, &[Entrant::new("x", "amy"), Entrant::new("y", "bo")])
            .unwrap();
        registry
            .set_continuous_mode(&ctx, true, &FailingSource)
            .unwrap();
        registry.finalize(&ctx, &code(1)).unwrap();

        let err = registry
            .set_continuous_mode(&ctx, false, &FailingSource)
            .unwrap_err();
        assert!(matches!(err, RegistryError::Source { .. }));
        let context = registry.context(&ctx).unwrap();
        assert!(context.continuous_mode());
        assert_eq!(context.pool().len(), 2);
        assert!(registry.ledger().is_drawn(&ctx, &code(1)));
    }

    #[test]
    fn mode_flags_are_per_context() {
        let (mut registry, range) = range_registry(10);
        let reward = ContextId::reward(0);
        registry.open_reward_context(&reward, "Hydrate", "r-1");
        registry.set_no_overlay(&range, true).unwrap();
        registry.set_skip_staged_reveal(&reward, true).unwrap();

        assert_eq!(
            registry.context(&range).unwrap().policy(),
            RevealPolicy::StagedInteractive
        );
        assert_eq!(
            registry.context(&reward).unwrap().policy(),
            RevealPolicy::Instant
        );
        assert!(matches!(
            registry.set_no_overlay(&ContextId::from("missing"), true),
            Err(RegistryError::UnknownContext(_))
        ));
        assert!(matches!(
            registry.regenerate_range(&reward, 10),
            Err(RegistryError::NotARangeContext { .. })
        ));
    }

    #[test]
    fn mode_toggle_is_refused_mid_draw() {
        let (mut registry, ctx) = range_registry(4);
        let mut picks = ScriptedPicks::new(vec![0]);
        registry.start_draw(&ctx, &mut picks).unwrap();
        assert!(matches!(
            registry.set_continuous_mode(&ctx, true, &FixtureSource::default()),
            Err(RegistryError::DrawInProgress { .. })
        ));
        assert!(matches!(
            registry.regenerate_range(&ctx, 8),
            Err(RegistryError::DrawInProgress { .. })
        ));
    }

    #[test]
    fn invalid_config_is_rejected_up_front() {
        let cfg = WheelConfig {
            default_range_max: 0,
            ..WheelConfig::default()
        };
        assert!(matches!(
            ContextRegistry::new(cfg),
            Err(ConfigError::RangeDefault { value: 0 })
        ));

        let mut registry = ContextRegistry::new(WheelConfig {
            default_range_max: 12,
            ..WheelConfig::default()
        })
        .unwrap();
        let ctx = ContextId::range();
        assert_eq!(registry.get_or_create(&ctx).unwrap().pool().len(), 12);
        let change = registry
            .set_continuous_mode(&ctx, false, &FixtureSource::default())
            .unwrap();
        assert_eq!(change, ModeChange::DisabledAndRebuilt { pool_len: 12 });
    }

    #[test]
    fn range_winners_stay_out_of_the_roster() {
        let (mut registry, ctx) = range_registry(3);
        registry
            .set_continuous_mode(&ctx, true, &FixtureSource::default())
            .unwrap();
        assert!(registry.finalize(&ctx, &code(2)).unwrap());
        assert!(registry.roster().is_empty());
    }
}
