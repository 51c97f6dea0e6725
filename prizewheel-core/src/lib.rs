//! Prize Wheel Engine
//!
//! Platform-agnostic draw logic for a livestream prize wheel: candidate pools,
//! random winner selection, staged digit reveal and the per-context winner
//! ledger. Rendering, timers and the rewards API are left to the host.

pub mod config;
pub mod constants;
pub mod draw;
pub mod ledger;
pub mod pool;
pub mod registry;
pub mod reveal;
pub mod rng;
pub mod roster;

pub use config::{CandidateLimits, ConfigError, SpinTiming, WheelConfig};
pub use draw::{DrawError, DrawResult, RevealPolicy, draw, eligible_entries, spin_sequence};
pub use ledger::WinnerLedger;
pub use pool::{
    Entrant, Entry, EntryId, Pool, PoolError, PoolSource, build_from_entries, build_from_range,
    parse_range_input,
};
pub use registry::{
    ButtonLabel, ButtonState, CloseOutcome, ContextId, ContextKind, ContextRegistry, DrawContext,
    ModeChange, RegistryError,
};
pub use reveal::{CandidateDisplay, RevealStage, RevealState, RevealStateMachine};
pub use rng::{CountingRng, RngBundle, ScriptedPicks, SelectionSource};
pub use roster::{RecordId, WinnerRecord, WinnersRoster};

/// Trait for abstracting the rewards collaborator.
/// Hosts fetch redemptions for a reward however their platform allows.
pub trait EntrantSource {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Fetch the current entrants of a reward context, in redemption order.
    ///
    /// # Errors
    ///
    /// Returns an error if the entrants cannot be retrieved.
    fn fetch_entrants(
        &self,
        context: &ContextId,
        kind: &ContextKind,
    ) -> Result<Vec<Entrant>, Self::Error>;
}

/// Main engine tying the registry to an entrant source and seeded randomness.
pub struct WheelEngine<S>
where
    S: EntrantSource,
{
    source: S,
    registry: ContextRegistry,
    rng: RngBundle,
}

impl<S> WheelEngine<S>
where
    S: EntrantSource,
{
    /// Create an engine. A `seed` makes every draw reproducible; `None` seeds
    /// from entropy.
    ///
    /// # Errors
    ///
    /// Returns an error if `config` violates an invariant.
    pub fn new(source: S, config: WheelConfig, seed: Option<u64>) -> Result<Self, ConfigError> {
        let registry = ContextRegistry::new(config)?;
        let rng = seed.map_or_else(RngBundle::from_entropy, RngBundle::from_user_seed);
        Ok(Self {
            source,
            registry,
            rng,
        })
    }

    #[must_use]
    pub const fn seed(&self) -> u64 {
        self.rng.seed()
    }

    #[must_use]
    pub const fn source(&self) -> &S {
        &self.source
    }

    #[must_use]
    pub const fn registry(&self) -> &ContextRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut ContextRegistry {
        &mut self.registry
    }

    /// Open the numeric-range context.
    ///
    /// # Errors
    ///
    /// See [`ContextRegistry::get_or_create`].
    pub fn open_range_context(&mut self) -> Result<&DrawContext, RegistryError> {
        self.registry.get_or_create(&ContextId::range())
    }

    /// Register (or re-title) a reward tab and load its entrants.
    ///
    /// # Errors
    ///
    /// Returns an error if the context is mid-draw, fetching fails or the list
    /// cannot be numbered. On failure nothing is registered or renamed.
    pub fn open_reward_context(
        &mut self,
        id: &ContextId,
        title: &str,
        reward_id: &str,
    ) -> Result<usize, RegistryError> {
        let kind = match self.registry.context(id) {
            Some(ctx) if ctx.is_drawing() => {
                return Err(RegistryError::DrawInProgress {
                    context: id.clone(),
                });
            }
            Some(ctx) => ctx.kind().clone(),
            None => ContextKind::Reward {
                reward_id: reward_id.to_string(),
            },
        };
        let entrants = self.fetch(id, &kind)?;
        let pool = build_from_entries(&entrants)?;
        self.registry.open_reward_context(id, title, reward_id);
        self.registry.load_pool(id, pool)?;
        Ok(entrants.len())
    }

    /// Re-fetch entrants for a reward context. Clears its ledger.
    ///
    /// # Errors
    ///
    /// Returns an error if the context is unknown or busy, or fetching fails.
    pub fn refresh_entrants(&mut self, id: &ContextId) -> Result<usize, RegistryError> {
        let kind = self
            .registry
            .context(id)
            .map(|ctx| ctx.kind().clone())
            .ok_or_else(|| RegistryError::UnknownContext(id.clone()))?;
        let entrants = self.fetch(id, &kind)?;
        self.registry.load_entrants(id, &entrants)?;
        Ok(entrants.len())
    }

    fn fetch(&self, id: &ContextId, kind: &ContextKind) -> Result<Vec<Entrant>, RegistryError> {
        self.source
            .fetch_entrants(id, kind)
            .map_err(|err| RegistryError::Source {
                context: id.clone(),
                source: Box::new(err),
            })
    }

    /// Apply the operator's range input to a range context.
    ///
    /// # Errors
    ///
    /// Returns an error for out-of-range input or a busy context.
    pub fn apply_range_input(&mut self, id: &ContextId, text: &str) -> Result<u16, RegistryError> {
        let max = parse_range_input(text)?;
        self.registry.regenerate_range(id, i64::from(max))?;
        Ok(max)
    }

    /// # Errors
    ///
    /// See [`ContextRegistry::set_continuous_mode`].
    pub fn set_continuous_mode(
        &mut self,
        id: &ContextId,
        on: bool,
    ) -> Result<ModeChange, RegistryError> {
        self.registry.set_continuous_mode(id, on, &self.source)
    }

    /// Select a winner using the engine's selection stream.
    ///
    /// # Errors
    ///
    /// See [`ContextRegistry::start_draw`].
    pub fn start_draw(&mut self, id: &ContextId) -> Result<DrawResult, RegistryError> {
        self.registry.start_draw(id, self.rng.selection())
    }

    /// Flicker frames for the wheel, drawn from the eligible set on the spin
    /// stream so they never disturb winner selection.
    ///
    /// # Errors
    ///
    /// Returns an error if the context is unknown.
    pub fn spin_sequence(&mut self, id: &ContextId) -> Result<Vec<EntryId>, RegistryError> {
        let eligible = self.registry.eligible(id)?;
        let ticks = self.registry.config().spin_ticks;
        Ok(spin_sequence(&eligible, ticks, self.rng.spin()))
    }

    /// # Errors
    ///
    /// See [`ContextRegistry::advance_reveal`].
    pub fn advance_reveal(&mut self, id: &ContextId) -> Result<RevealState, RegistryError> {
        self.registry.advance_reveal(id)
    }

    /// # Errors
    ///
    /// See [`ContextRegistry::close_draw`].
    pub fn close_draw(&mut self, id: &ContextId) -> Result<CloseOutcome, RegistryError> {
        self.registry.close_draw(id)
    }

    /// Run a whole draw: select, reveal every digit and close.
    ///
    /// # Errors
    ///
    /// Returns an error if the draw cannot start.
    pub fn draw_to_completion(&mut self, id: &ContextId) -> Result<CloseOutcome, RegistryError> {
        self.start_draw(id)?;
        while self
            .registry
            .reveal_state(id)
            .is_some_and(|state| !state.stage.is_complete())
        {
            self.registry.advance_reveal(id)?;
        }
        self.registry.close_draw(id)
    }
}
