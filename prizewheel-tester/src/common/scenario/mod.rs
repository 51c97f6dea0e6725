pub mod catalog;

use anyhow::Result;
use prizewheel_core::{WheelConfig, WheelEngine};

use crate::common::FixtureEntrants;

/// Entrants served to reward contexts unless a scenario asks for more.
pub const DEFAULT_FIXTURE_ENTRANTS: usize = 24;

/// Everything a scenario check can drive for one seeded iteration.
pub struct ScenarioCtx {
    pub engine: WheelEngine<FixtureEntrants>,
    pub seed: u64,
    pub verbose: bool,
}

impl ScenarioCtx {
    /// # Errors
    ///
    /// Returns an error if `config` is rejected by the engine.
    pub fn new(config: &WheelConfig, seed: u64, entrants: usize, verbose: bool) -> Result<Self> {
        let engine =
            WheelEngine::new(FixtureEntrants::new(entrants), config.clone(), Some(seed))?;
        Ok(Self {
            engine,
            seed,
            verbose,
        })
    }
}

/// Scenario body; returns the number of draws it completed.
pub type ScenarioCheck = fn(&mut ScenarioCtx) -> Result<usize>;

#[derive(Clone)]
pub struct TestScenario {
    pub key: &'static str,
    pub name: &'static str,
    pub entrants: usize,
    pub check: ScenarioCheck,
}

impl TestScenario {
    #[must_use]
    pub const fn new(key: &'static str, name: &'static str, check: ScenarioCheck) -> Self {
        Self {
            key,
            name,
            entrants: DEFAULT_FIXTURE_ENTRANTS,
            check,
        }
    }

    #[must_use]
    pub const fn with_entrants(mut self, entrants: usize) -> Self {
        self.entrants = entrants;
        self
    }

    /// Run the check against a fresh engine seeded with `seed`.
    ///
    /// # Errors
    ///
    /// Returns the first expectation the scenario found violated.
    pub fn run(&self, config: &WheelConfig, seed: u64, verbose: bool) -> Result<usize> {
        let mut ctx = ScenarioCtx::new(config, seed, self.entrants, verbose)?;
        (self.check)(&mut ctx)
    }
}

impl std::fmt::Debug for TestScenario {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TestScenario")
            .field("key", &self.key)
            .field("name", &self.name)
            .field("entrants", &self.entrants)
            .finish_non_exhaustive()
    }
}

pub fn get_scenario(name: &str) -> Option<TestScenario> {
    let key = match name.to_lowercase().as_str() {
        "smoke" => "smoke",
        "exhaustion" | "continuous" => "exhaustion",
        "repeat-draws" | "repeat" => "repeat-draws",
        "narrowing" | "candidates" => "narrowing",
        "mode-reset" | "reset" => "mode-reset",
        "abandoned-reveal" | "abandon" => "abandoned-reveal",
        "instant-reveal" | "instant" => "instant-reveal",
        "winners-roster" | "roster" => "winners-roster",
        _ => return None,
    };
    catalog::catalog_scenarios()
        .into_iter()
        .find(|scenario| scenario.key == key)
}

pub fn list_scenarios() -> Vec<(&'static str, &'static str)> {
    catalog::catalog_scenarios()
        .iter()
        .map(|scenario| (scenario.key, scenario.name))
        .collect()
}
