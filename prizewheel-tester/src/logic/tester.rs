use colored::Colorize;
use prizewheel_core::WheelConfig;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

use crate::common::scenario::TestScenario;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioResult {
    pub scenario_name: String,
    pub seed: u64,
    pub passed: bool,
    pub iterations_run: usize,
    pub successful_iterations: usize,
    pub total_draws: usize,
    pub failures: Vec<String>,
    /// Mean time of the passing iterations, serialized as whole milliseconds.
    #[serde(with = "millis")]
    pub average_duration: Duration,
}

pub struct LogicTester {
    config: WheelConfig,
    verbose: bool,
}

impl LogicTester {
    pub const fn new(config: WheelConfig, verbose: bool) -> Self {
        Self { config, verbose }
    }

    pub fn run_scenario(
        &self,
        scenario: &TestScenario,
        seeds: &[u64],
        iterations: usize,
    ) -> Vec<ScenarioResult> {
        let mut results = Vec::new();

        for &seed in seeds {
            if self.verbose {
                println!(
                    "🎡 Testing scenario: {} (seed: {seed})",
                    scenario.name.bright_white()
                );
            }
            results.push(self.run_single_scenario(scenario, seed, iterations));
        }

        results
    }

    fn run_single_scenario(
        &self,
        scenario: &TestScenario,
        seed: u64,
        iterations: usize,
    ) -> ScenarioResult {
        let mut successes = 0;
        let mut total_draws = 0;
        let mut failures = Vec::new();
        let mut elapsed = Duration::ZERO;

        for i in 0..iterations {
            let start_time = Instant::now();
            let iteration_seed = seed.wrapping_add(u64::try_from(i).unwrap_or(u64::MAX));

            match scenario.run(&self.config, iteration_seed, self.verbose) {
                Ok(draws) => {
                    successes += 1;
                    total_draws += draws;
                    let duration = start_time.elapsed();
                    elapsed += duration;
                    log::debug!(
                        "{} iteration {} seed {iteration_seed}: {draws} draws in {duration:?}",
                        scenario.key,
                        i + 1
                    );
                    if self.verbose {
                        println!(
                            "  ✅ Iteration {}/{} passed ({duration:?}) draws:{draws}",
                            i + 1,
                            iterations
                        );
                    }
                }
                Err(err) => {
                    let message = format!("Iteration {} (seed {iteration_seed}): {err:#}", i + 1);
                    if self.verbose {
                        println!(
                            "  ❌ Iteration {}/{} failed: {}",
                            i + 1,
                            iterations,
                            format!("{err:#}").red()
                        );
                    }
                    failures.push(message);
                }
            }
        }

        let average_duration = u32::try_from(successes)
            .ok()
            .filter(|&n| n > 0)
            .map_or(Duration::ZERO, |n| elapsed / n);

        ScenarioResult {
            scenario_name: scenario.name.to_string(),
            seed,
            passed: failures.is_empty(),
            iterations_run: iterations,
            successful_iterations: successes,
            total_draws,
            failures,
            average_duration,
        }
    }
}

mod millis {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(u64::try_from(duration.as_millis()).unwrap_or(u64::MAX))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}
