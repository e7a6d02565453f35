//! Generation cycle over an agent population.
//!
//! Each cycle walks a fixed sequence of phases: every living agent is
//! re-scored against current price history, ranked with a diversity-aware
//! selection fitness, the weakest slice is culled, and the breeding pool
//! produces exactly enough offspring to keep the population size constant.
//! Offspring are backtested immediately so the assembled generation never
//! carries placeholder metrics.
//!
//! Scoring is embarrassingly parallel: each simulation reads only immutable
//! price data and its own genome, so the per-agent step fans out across a
//! thread pool and joins before selection begins. Breeding randomness comes
//! exclusively from the caller-supplied generator, which keeps a full cycle
//! reproducible under a seeded source.

use std::collections::HashMap;

use rand::{Rng, RngCore};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::agent::{Agent, AgentStatus};
use crate::backtest::{run_backtest, BacktestConfig, BacktestOutcome, BacktestResult};
use crate::data::PriceHistoryProvider;
use crate::errors::Result;
use crate::genome::crossover_mutate;
use crate::portfolio::{self, PortfolioSnapshot};
use crate::symbols::SymbolTable;

/// Selection and culling parameters for one engine instance.
#[derive(Debug, Clone, Copy)]
pub struct EvolutionConfig {
    /// Fraction of the living population culled each cycle (at least one).
    pub cull_fraction: f64,
    /// Fraction of the living population admitted to the breeding pool
    /// (at least two when available).
    pub breeding_fraction: f64,
    /// Population share of a single asset above which crowding kicks in.
    pub crowding_threshold: f64,
    /// Upper bound on the crowding discount.
    pub crowding_penalty_cap: f64,
}

impl Default for EvolutionConfig {
    fn default() -> Self {
        Self {
            cull_fraction: 0.20,
            breeding_fraction: 0.30,
            crowding_threshold: 0.40,
            crowding_penalty_cap: 0.25,
        }
    }
}

/// Append-only summary of one assembled generation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GenerationRecord {
    /// Generation index of the assembled population.
    pub gen: u32,
    /// Mean fitness across living agents.
    pub avg_fitness: f64,
    /// Best fitness across living agents.
    pub top_fitness: f64,
    /// Number of living agents.
    pub population: usize,
    /// Distinct traded assets divided by living agents, in `(0, 1]`.
    pub diversity: f64,
}

/// Everything a cycle hands back to the caller.
#[derive(Debug, Clone)]
pub struct CycleOutcome {
    /// The full population including retained extinct agents.
    pub population: Vec<Agent>,
    /// Ids of agents culled this cycle.
    pub culled: Vec<Uuid>,
    /// Ids of agents bred this cycle.
    pub offspring: Vec<Uuid>,
    /// Summary record for the assembled generation.
    pub record: GenerationRecord,
    /// Fitness-weighted notional capital snapshot.
    pub portfolio: PortfolioSnapshot,
}

/// Phase marker for the per-generation state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CyclePhase {
    Scoring,
    Selecting,
    Breeding,
    Assembled,
}

/// Selection-only crowding discount for an asset holding `share` of the
/// scored population. Zero at or below the threshold, then linear up to the
/// cap. The discount never touches the stored fitness value.
pub fn niche_crowding_penalty(share: f64, config: &EvolutionConfig) -> f64 {
    if share <= config.crowding_threshold {
        return 0.0;
    }
    let excess = (share - config.crowding_threshold) / (1.0 - config.crowding_threshold);
    (excess * config.crowding_penalty_cap).min(config.crowding_penalty_cap)
}

/// Drives scoring, selection, breeding and assembly for one population.
#[derive(Debug, Clone)]
pub struct EvolutionEngine {
    evolution: EvolutionConfig,
    backtest: BacktestConfig,
    symbols: SymbolTable,
}

impl EvolutionEngine {
    /// Create an engine with explicit configuration.
    pub fn new(evolution: EvolutionConfig, backtest: BacktestConfig, symbols: SymbolTable) -> Self {
        Self {
            evolution,
            backtest,
            symbols,
        }
    }

    /// Engine over the default universe with default parameters.
    pub fn with_defaults() -> Self {
        Self::new(
            EvolutionConfig::default(),
            BacktestConfig::default(),
            SymbolTable::default(),
        )
    }

    /// The asset universe this engine decodes genomes against.
    pub fn symbols(&self) -> &SymbolTable {
        &self.symbols
    }

    /// Run one full generation cycle.
    ///
    /// A population without living agents is a no-op: the cycle reports zero
    /// culled and zero born instead of failing. The only hard error is a
    /// malformed genome encountered during scoring.
    pub fn run_generation_cycle<P>(
        &self,
        mut population: Vec<Agent>,
        provider: &P,
        rng: &mut dyn RngCore,
    ) -> Result<CycleOutcome>
    where
        P: PriceHistoryProvider + Sync,
    {
        let living_count = population.iter().filter(|agent| agent.is_living()).count();
        if living_count == 0 {
            warn!("generation cycle invoked on an empty population");
            let gen = population.iter().map(|a| a.generation).max().unwrap_or(0);
            return Ok(CycleOutcome {
                record: GenerationRecord {
                    gen,
                    avg_fitness: 0.0,
                    top_fitness: 0.0,
                    population: 0,
                    diversity: 0.0,
                },
                portfolio: portfolio::aggregate(&population),
                population,
                culled: Vec::new(),
                offspring: Vec::new(),
            });
        }

        let mut phase = CyclePhase::Scoring;
        debug!(?phase, living_count, "starting generation cycle");
        self.score_population(&mut population, provider)?;

        phase = CyclePhase::Selecting;
        debug!(?phase, "ranking with crowding-adjusted fitness");
        let ranked = self.rank_for_selection(&population);
        let cull_count = usize::max(
            1,
            (self.evolution.cull_fraction * ranked.len() as f64).floor() as usize,
        )
        .min(ranked.len());
        let pool_size = usize::max(
            2,
            (self.evolution.breeding_fraction * ranked.len() as f64).floor() as usize,
        )
        .min(ranked.len());

        let mut culled = Vec::with_capacity(cull_count);
        for &index in &ranked[ranked.len() - cull_count..] {
            population[index].mark_extinct();
            culled.push(population[index].id);
        }

        let pool: Vec<usize> = ranked[..pool_size].to_vec();
        for &index in &pool {
            if population[index].is_living() {
                population[index].status = AgentStatus::Breeding;
            }
        }

        phase = CyclePhase::Breeding;
        debug!(?phase, cull_count, pool_size, "breeding replacements");
        let next_gen = population.iter().map(|a| a.generation).max().unwrap_or(0) + 1;
        let mut offspring: Vec<Agent> = Vec::with_capacity(cull_count);
        for seq in 0..cull_count {
            let father = pool[rng.gen_range(0..pool.len())];
            let mother = pool[rng.gen_range(0..pool.len())];
            let genome = crossover_mutate(
                &population[father].genome,
                &population[mother].genome,
                rng,
            );
            offspring.push(Agent::offspring(
                format!("agent-g{}-{}", next_gen, seq + 1),
                genome,
                next_gen,
                (population[father].id, population[mother].id),
            ));
        }

        phase = CyclePhase::Assembled;
        debug!(?phase, born = offspring.len(), "scoring offspring and assembling");
        let fresh: Vec<Option<BacktestResult>> = offspring
            .par_iter()
            .map(|agent| self.score_one(agent, provider))
            .collect::<Result<Vec<_>>>()?;
        for (child, outcome) in offspring.iter_mut().zip(fresh) {
            if let Some(result) = outcome {
                child.apply_result(&result);
            }
        }

        // Survivors from the previous generation go active; this cycle's
        // offspring keep their newborn badge until the next assembly.
        for agent in &mut population {
            agent.activate();
        }
        let offspring_ids: Vec<Uuid> = offspring.iter().map(|child| child.id).collect();
        population.extend(offspring);

        let record = self.summarize(next_gen, &population);
        let snapshot = portfolio::aggregate(&population);
        info!(
            gen = record.gen,
            avg_fitness = record.avg_fitness,
            top_fitness = record.top_fitness,
            culled = culled.len(),
            born = offspring_ids.len(),
            capital = snapshot.capital,
            "generation cycle complete"
        );

        Ok(CycleOutcome {
            population,
            culled,
            offspring: offspring_ids,
            record,
            portfolio: snapshot,
        })
    }

    /// Backtest every living agent in parallel and fold fresh results into
    /// the stored metrics. Agents without fresh results keep prior metrics.
    fn score_population<P>(&self, population: &mut [Agent], provider: &P) -> Result<()>
    where
        P: PriceHistoryProvider + Sync,
    {
        let outcomes: Vec<Option<BacktestResult>> = population
            .par_iter()
            .map(|agent| {
                if agent.is_living() {
                    self.score_one(agent, provider)
                } else {
                    Ok(None)
                }
            })
            .collect::<Result<Vec<_>>>()?;

        for (agent, outcome) in population.iter_mut().zip(outcomes) {
            if let Some(result) = outcome {
                agent.apply_result(&result);
            }
        }
        Ok(())
    }

    /// Backtest a single agent against its decoded asset.
    fn score_one<P>(&self, agent: &Agent, provider: &P) -> Result<Option<BacktestResult>>
    where
        P: PriceHistoryProvider + Sync,
    {
        let asset = agent.genome.asset(self.symbols.len());
        let Some(symbol) = self.symbols.symbol(asset) else {
            return Ok(None);
        };
        let Some(series) = provider.bars(symbol) else {
            debug!(agent = %agent.name, symbol, "no price history, keeping prior metrics");
            return Ok(None);
        };

        match run_backtest(&agent.genome, series, &self.backtest)? {
            BacktestOutcome::Completed(result) => Ok(Some(result)),
            BacktestOutcome::Unchanged { available_bars } => {
                debug!(
                    agent = %agent.name,
                    symbol,
                    available_bars,
                    "insufficient history, keeping prior metrics"
                );
                Ok(None)
            }
        }
    }

    /// Indices of living agents ordered by crowding-adjusted fitness,
    /// best first. The sort is stable, so equal selection fitness keeps the
    /// original rank order.
    fn rank_for_selection(&self, population: &[Agent]) -> Vec<usize> {
        let living: Vec<usize> = population
            .iter()
            .enumerate()
            .filter(|(_, agent)| agent.is_living())
            .map(|(index, _)| index)
            .collect();

        let mut asset_counts: HashMap<usize, usize> = HashMap::new();
        for &index in &living {
            *asset_counts
                .entry(population[index].genome.asset(self.symbols.len()))
                .or_insert(0) += 1;
        }

        let total = living.len() as f64;
        let mut ranked: Vec<(usize, f64)> = living
            .into_iter()
            .map(|index| {
                let asset = population[index].genome.asset(self.symbols.len());
                let share = asset_counts[&asset] as f64 / total;
                let penalty = niche_crowding_penalty(share, &self.evolution);
                (index, population[index].fitness * (1.0 - penalty))
            })
            .collect();

        ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
        ranked.into_iter().map(|(index, _)| index).collect()
    }

    fn summarize(&self, gen: u32, population: &[Agent]) -> GenerationRecord {
        let living: Vec<&Agent> = population.iter().filter(|a| a.is_living()).collect();
        if living.is_empty() {
            return GenerationRecord {
                gen,
                avg_fitness: 0.0,
                top_fitness: 0.0,
                population: 0,
                diversity: 0.0,
            };
        }

        let avg_fitness = living.iter().map(|a| a.fitness).sum::<f64>() / living.len() as f64;
        let top_fitness = living
            .iter()
            .map(|a| a.fitness)
            .fold(f64::NEG_INFINITY, f64::max);
        let distinct_assets = living
            .iter()
            .map(|a| a.genome.asset(self.symbols.len()))
            .collect::<std::collections::HashSet<_>>()
            .len();

        GenerationRecord {
            gen,
            avg_fitness,
            top_fitness,
            population: living.len(),
            diversity: distinct_assets as f64 / living.len() as f64,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crowding_penalty_is_zero_at_or_below_threshold() {
        let config = EvolutionConfig::default();
        assert_eq!(niche_crowding_penalty(0.0, &config), 0.0);
        assert_eq!(niche_crowding_penalty(0.25, &config), 0.0);
        assert_eq!(niche_crowding_penalty(0.40, &config), 0.0);
    }

    #[test]
    fn crowding_penalty_grows_monotonically_and_caps() {
        let config = EvolutionConfig::default();
        let mut previous = 0.0;
        for step in 0..=60 {
            let share = 0.40 + step as f64 / 100.0;
            let penalty = niche_crowding_penalty(share, &config);
            assert!(penalty >= previous, "penalty dipped at share {share}");
            assert!(penalty <= config.crowding_penalty_cap);
            previous = penalty;
        }
        assert_eq!(niche_crowding_penalty(1.0, &config), 0.25);
    }
}
