//! Evolutionary backtesting engine for synthetic trading agents.
//!
//! A population of agents, each carrying a normalized genome that decodes
//! into a moving-average crossover strategy with risk-scaled position
//! sizing, is run through repeated cycles of historical simulation and
//! selection. Every generation the engine backtests each agent over daily
//! price bars, reduces the raw metrics to a bounded fitness score, ranks the
//! population with a diversity-aware discount, culls the weakest slice and
//! breeds replacements through crossover and mutation.
//!
//! The crate owns only the numerical core: simulation, scoring, selection
//! and breeding. Price retrieval, persistence and presentation are external
//! collaborators that talk to the engine through plain data records and the
//! [`data::PriceHistoryProvider`] trait.
//!
//! ```rust
//! use evotrade::prelude::*;
//! use rand::rngs::StdRng;
//! use rand::SeedableRng;
//!
//! # fn provider_with_history() -> InMemoryPriceHistory { InMemoryPriceHistory::new() }
//! let mut rng = StdRng::seed_from_u64(42);
//! let engine = EvolutionEngine::with_defaults();
//! let founders = evotrade::agent::founder_population(10, &mut rng);
//! let provider = provider_with_history();
//!
//! let outcome = engine.run_generation_cycle(founders, &provider, &mut rng)?;
//! println!("gen {} capital {}", outcome.record.gen, outcome.portfolio.capital);
//! # Ok::<(), evotrade::errors::EvotradeError>(())
//! ```

pub mod agent;
pub mod backtest;
pub mod data;
pub mod errors;
pub mod evolution;
pub mod fitness;
pub mod genome;
pub mod portfolio;
pub mod report;
pub mod symbols;

#[cfg(test)]
mod tests {
    mod backtest_tests;
    mod evolution_tests;
    mod mock_data;
}

/// Convenient re-export of the most common items used when embedding the
/// engine or writing tests.
pub mod prelude {
    pub use crate::agent::{founder_population, Agent, AgentStatus};
    pub use crate::backtest::{
        run_backtest, BacktestConfig, BacktestOutcome, BacktestResult, EquityPoint, SignalAction,
        TradeSignal,
    };
    pub use crate::data::{InMemoryPriceHistory, PriceBar, PriceHistoryProvider, PriceSeries};
    pub use crate::errors::{EvotradeError, Result};
    pub use crate::evolution::{
        niche_crowding_penalty, CycleOutcome, EvolutionConfig, EvolutionEngine, GenerationRecord,
    };
    pub use crate::fitness::{compute_fitness, overfit_penalty};
    pub use crate::genome::{crossover_mutate, Archetype, Genome};
    pub use crate::portfolio::{aggregate, PortfolioSnapshot};
    pub use crate::report::EvolutionReport;
    pub use crate::symbols::SymbolTable;
}
