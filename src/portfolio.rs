//! Fitness-weighted notional portfolio snapshot for reporting.

use serde::{Deserialize, Serialize};

use crate::agent::{Agent, AgentStatus};

/// Notional starting capital for every snapshot.
pub const BASELINE_CAPITAL: f64 = 100_000.0;

/// Floor applied to fitness weights so zero-fitness agents still carry a
/// sliver of weight instead of dividing by zero.
const MIN_WEIGHT: f64 = 0.01;

/// Single-cycle, non-compounding capital figure.
///
/// Each snapshot restarts from the same baseline so the number stays
/// interpretable in isolation; it deliberately does not compound across
/// generations.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PortfolioSnapshot {
    /// `round(100,000 * (1 + weighted_return))`.
    pub capital: f64,
    /// Fitness-weighted blend of agent window returns, clamped to
    /// `[-0.50, 2.00]`.
    pub weighted_return: f64,
}

impl Default for PortfolioSnapshot {
    fn default() -> Self {
        Self {
            capital: BASELINE_CAPITAL,
            weighted_return: 0.0,
        }
    }
}

/// Blend all active agents' window returns, weighted by fitness.
///
/// The clamp bounds reflect that agent returns are full-window backtest
/// returns, not daily moves. With no active agents the snapshot reports the
/// untouched baseline.
pub fn aggregate(agents: &[Agent]) -> PortfolioSnapshot {
    let active: Vec<&Agent> = agents
        .iter()
        .filter(|agent| agent.status == AgentStatus::Active)
        .collect();
    if active.is_empty() {
        return PortfolioSnapshot::default();
    }

    let total_weight: f64 = active.iter().map(|agent| agent.fitness.max(MIN_WEIGHT)).sum();
    let weighted_return = active
        .iter()
        .map(|agent| agent.fitness.max(MIN_WEIGHT) / total_weight * (agent.total_return / 100.0))
        .sum::<f64>()
        .clamp(-0.50, 2.00);

    PortfolioSnapshot {
        capital: (BASELINE_CAPITAL * (1.0 + weighted_return)).round(),
        weighted_return,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::genome::Genome;

    fn active_agent(fitness: f64, total_return: f64) -> Agent {
        let mut agent = Agent::founder("test", Genome::new(0.2, 0.6, 0.5, 0.1));
        agent.fitness = fitness;
        agent.total_return = total_return;
        agent.activate();
        agent
    }

    #[test]
    fn empty_population_reports_baseline() {
        let snapshot = aggregate(&[]);
        assert_eq!(snapshot.capital, BASELINE_CAPITAL);
        assert_eq!(snapshot.weighted_return, 0.0);
    }

    #[test]
    fn higher_fitness_dominates_the_blend() {
        let agents = vec![active_agent(90.0, 40.0), active_agent(10.0, -20.0)];
        let snapshot = aggregate(&agents);

        // 0.9 * 0.40 + 0.1 * (-0.20) = 0.34
        assert!((snapshot.weighted_return - 0.34).abs() < 1e-9);
        assert_eq!(snapshot.capital, 134_000.0);
    }

    #[test]
    fn weighted_return_is_clamped() {
        let moonshot = vec![active_agent(50.0, 1_000.0)];
        assert_eq!(aggregate(&moonshot).weighted_return, 2.00);

        let crater = vec![active_agent(50.0, -95.0)];
        assert_eq!(aggregate(&crater).weighted_return, -0.50);
    }

    #[test]
    fn extinct_and_newborn_agents_are_excluded() {
        let mut extinct = active_agent(80.0, 60.0);
        extinct.mark_extinct();
        let newborn = Agent::founder("baby", Genome::new(0.2, 0.6, 0.5, 0.1));

        let snapshot = aggregate(&[extinct, newborn]);
        assert_eq!(snapshot.capital, BASELINE_CAPITAL);
    }

    #[test]
    fn zero_fitness_agents_still_get_floor_weight() {
        let agents = vec![active_agent(0.0, 100.0), active_agent(0.0, -100.0)];
        let snapshot = aggregate(&agents);
        assert!((snapshot.weighted_return - 0.0).abs() < 1e-9);
    }
}
