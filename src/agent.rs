//! Agent records tracked across generations.

use rand::RngCore;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::backtest::BacktestResult;
use crate::genome::{Archetype, Genome};

/// Lifecycle state of an agent. `Extinct` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AgentStatus {
    /// Scored member of the current generation.
    Active,
    /// Created this generation; promoted to `Active` when it survives a cycle.
    Newborn,
    /// Temporarily in the breeding pool while offspring are produced.
    Breeding,
    /// Culled. Retained in the population for the historical record.
    Extinct,
}

/// One candidate trading strategy and its tracked performance.
///
/// Agents are owned by the evolutionary loop and mutated only at generation
/// boundaries; the genome itself never changes after assignment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Agent {
    /// Stable identifier.
    pub id: Uuid,
    /// Human-readable name.
    pub name: String,
    /// Generation the agent was created in.
    pub generation: u32,
    /// Composite fitness in `[0, 100]`.
    pub fitness: f64,
    /// Lifecycle state.
    pub status: AgentStatus,
    /// Strategy archetype derived from the genome.
    pub archetype: Archetype,
    /// Annualized Sharpe ratio from the latest backtest.
    pub sharpe: f64,
    /// Maximum drawdown percentage from the latest backtest.
    pub max_drawdown: f64,
    /// Win rate percentage over completed round-trips.
    pub win_rate: f64,
    /// Total return percentage over the backtest window.
    pub total_return: f64,
    /// Number of recorded trade signals.
    pub trade_count: usize,
    /// Parents for bred agents, `None` for founders.
    pub parent_ids: Option<(Uuid, Uuid)>,
    /// Normalized strategy parameters.
    pub genome: Genome,
}

impl Agent {
    /// Create a generation-zero founder with placeholder metrics.
    pub fn founder(name: impl Into<String>, genome: Genome) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            generation: 0,
            fitness: 0.0,
            status: AgentStatus::Newborn,
            archetype: genome.archetype(),
            sharpe: 0.0,
            max_drawdown: 0.0,
            win_rate: 0.0,
            total_return: 0.0,
            trade_count: 0,
            parent_ids: None,
            genome,
        }
    }

    /// Create a bred agent with placeholder metrics.
    pub fn offspring(
        name: impl Into<String>,
        genome: Genome,
        generation: u32,
        parents: (Uuid, Uuid),
    ) -> Self {
        Self {
            parent_ids: Some(parents),
            generation,
            ..Self::founder(name, genome)
        }
    }

    /// Whether the agent still participates in scoring and selection.
    pub fn is_living(&self) -> bool {
        self.status != AgentStatus::Extinct
    }

    /// Fold a completed backtest into the stored metrics.
    pub fn apply_result(&mut self, result: &BacktestResult) {
        self.sharpe = result.sharpe;
        self.max_drawdown = result.max_drawdown;
        self.win_rate = result.win_rate;
        self.total_return = result.total_return;
        self.trade_count = result.trade_count;
        self.fitness = result.fitness;
    }

    /// Promote a surviving newborn (or a parent back from the breeding pool)
    /// to active. Extinct agents never change state.
    pub fn activate(&mut self) {
        if self.status != AgentStatus::Extinct {
            self.status = AgentStatus::Active;
        }
    }

    /// Mark the agent culled.
    pub fn mark_extinct(&mut self) {
        self.status = AgentStatus::Extinct;
    }
}

/// Seed a founder population of `count` agents with random genomes.
pub fn founder_population(count: usize, rng: &mut dyn RngCore) -> Vec<Agent> {
    (0..count)
        .map(|seq| Agent::founder(format!("agent-g0-{}", seq + 1), Genome::random(rng)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn founder_starts_newborn_with_placeholder_metrics() {
        let agent = Agent::founder("first", Genome::new(0.1, 0.9, 0.5, 0.0));
        assert_eq!(agent.status, AgentStatus::Newborn);
        assert_eq!(agent.generation, 0);
        assert_eq!(agent.fitness, 0.0);
        assert!(agent.parent_ids.is_none());
    }

    #[test]
    fn extinct_is_terminal() {
        let mut agent = Agent::founder("doomed", Genome::new(0.1, 0.9, 0.5, 0.0));
        agent.mark_extinct();
        agent.activate();
        assert_eq!(agent.status, AgentStatus::Extinct);
    }

    #[test]
    fn founder_population_has_distinct_ids() {
        let mut rng = StdRng::seed_from_u64(1);
        let founders = founder_population(8, &mut rng);
        assert_eq!(founders.len(), 8);
        for pair in founders.windows(2) {
            assert_ne!(pair[0].id, pair[1].id);
        }
    }
}
