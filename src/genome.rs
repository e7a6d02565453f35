//! Normalized genome encoding and decoding for trading agents.
//!
//! A genome is four genes in `[0, 1]` that decode into a moving-average
//! crossover strategy: fast and slow lookback periods, a risk-aversion
//! coefficient for position sizing, and an index into the configured asset
//! universe. Decoding is pure and deterministic; the same codec is used at
//! agent creation, for display, and when classifying bred offspring.

use rand::{Rng, RngCore};
use serde::{Deserialize, Serialize};

use crate::errors::{EvotradeError, Result};

/// Width of the uniform mutation noise applied to each blended gene.
const MUTATION_NOISE: f64 = 0.12;

/// Probability that an offspring re-randomizes its asset gene instead of
/// inheriting it. Deliberately higher than the blend noise on the other
/// genes so a single asset cannot take over the population.
const ASSET_REROLL_CHANCE: f64 = 0.25;

/// Normalized strategy parameters carried by every agent.
///
/// Genomes are immutable once assigned; breeding creates a fresh genome via
/// [`crossover_mutate`] rather than editing a parent in place.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Genome {
    /// Fast moving-average gene, decoded to 5-50 days.
    pub fast_ma: f64,
    /// Slow moving-average gene, decoded to 20-200 days.
    pub slow_ma: f64,
    /// Risk aversion in `[0, 1]`; higher values cap exposure lower.
    pub risk_aversion: f64,
    /// Asset-universe gene, decoded to an index into the symbol table.
    pub asset_index: f64,
}

impl Genome {
    /// Create a genome from raw gene values.
    pub fn new(fast_ma: f64, slow_ma: f64, risk_aversion: f64, asset_index: f64) -> Self {
        Self {
            fast_ma,
            slow_ma,
            risk_aversion,
            asset_index,
        }
    }

    /// Generate a uniformly random genome, used to seed founder agents.
    pub fn random(rng: &mut dyn RngCore) -> Self {
        Self {
            fast_ma: rng.gen(),
            slow_ma: rng.gen(),
            risk_aversion: rng.gen(),
            asset_index: rng.gen(),
        }
    }

    /// Check that every gene lies in `[0, 1]`.
    ///
    /// A violation means the genome was produced outside the breeding
    /// operators and is surfaced as a hard error.
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("fast_ma", self.fast_ma),
            ("slow_ma", self.slow_ma),
            ("risk_aversion", self.risk_aversion),
            ("asset_index", self.asset_index),
        ] {
            if !value.is_finite() || !(0.0..=1.0).contains(&value) {
                return Err(EvotradeError::malformed_genome(name, value));
            }
        }
        Ok(())
    }

    /// Decoded fast moving-average period in days.
    pub fn fast_period(&self) -> usize {
        decode_fast_period(self.fast_ma)
    }

    /// Decoded slow moving-average period in days.
    pub fn slow_period(&self) -> usize {
        decode_slow_period(self.slow_ma)
    }

    /// Decoded index into an asset universe of `symbol_count` entries.
    pub fn asset(&self, symbol_count: usize) -> usize {
        decode_asset_index(self.asset_index, symbol_count)
    }

    /// Qualitative strategy archetype implied by the MA genes.
    pub fn archetype(&self) -> Archetype {
        Archetype::classify(self.fast_ma, self.slow_ma)
    }
}

/// Decode the fast-MA gene to a period of 5-50 days.
pub fn decode_fast_period(gene: f64) -> usize {
    let period = (5.0 + gene * 45.0).round();
    (period.max(5.0)) as usize
}

/// Decode the slow-MA gene to a period of 20-200 days.
pub fn decode_slow_period(gene: f64) -> usize {
    let period = (20.0 + gene * 180.0).round();
    (period.max(20.0)) as usize
}

/// Decode the asset gene to an index in `[0, symbol_count - 1]`.
pub fn decode_asset_index(gene: f64, symbol_count: usize) -> usize {
    if symbol_count == 0 {
        return 0;
    }
    let max = symbol_count - 1;
    let index = (gene * max as f64).round();
    (index.max(0.0) as usize).min(max)
}

/// Qualitative label for the trading style implied by a genome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Archetype {
    /// Short fast period with a tight spread; chases fresh trends.
    Momentum,
    /// Very long slow period; trades rarely and rides regimes.
    Defensive,
    /// Narrow spread between the averages; fires on small wobbles.
    Volatility,
    /// Long lookbacks on both sides; fades extended moves.
    MeanReversion,
    /// Everything else.
    Hybrid,
}

impl Archetype {
    /// Classify the archetype from raw MA gene values.
    ///
    /// Rules apply in order, first match wins.
    pub fn classify(fast_gene: f64, slow_gene: f64) -> Self {
        let fast = decode_fast_period(fast_gene) as i64;
        let slow = decode_slow_period(slow_gene) as i64;
        let spread = slow - fast;

        if fast <= 10 && spread <= 25 {
            Archetype::Momentum
        } else if slow >= 130 {
            Archetype::Defensive
        } else if spread <= 15 {
            Archetype::Volatility
        } else if fast >= 25 && slow >= 80 {
            Archetype::MeanReversion
        } else {
            Archetype::Hybrid
        }
    }
}

impl std::fmt::Display for Archetype {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Archetype::Momentum => "momentum",
            Archetype::Defensive => "defensive",
            Archetype::Volatility => "volatility",
            Archetype::MeanReversion => "mean-reversion",
            Archetype::Hybrid => "hybrid",
        };
        write!(f, "{label}")
    }
}

/// Breed a child genome from two parents.
///
/// The MA and risk genes take a uniform blend of the parents plus bounded
/// mutation noise, clamped back into `[0, 1]`. The asset gene either copies
/// one parent or re-randomizes entirely.
pub fn crossover_mutate(a: &Genome, b: &Genome, rng: &mut dyn RngCore) -> Genome {
    let fast_ma = blend_gene(a.fast_ma, b.fast_ma, rng);
    let slow_ma = blend_gene(a.slow_ma, b.slow_ma, rng);
    let risk_aversion = blend_gene(a.risk_aversion, b.risk_aversion, rng);

    let asset_index = if rng.gen_bool(ASSET_REROLL_CHANCE) {
        rng.gen()
    } else if rng.gen_bool(0.5) {
        a.asset_index
    } else {
        b.asset_index
    };

    Genome {
        fast_ma,
        slow_ma,
        risk_aversion,
        asset_index,
    }
}

fn blend_gene(a: f64, b: f64, rng: &mut dyn RngCore) -> f64 {
    let mix: f64 = rng.gen();
    let noise = (rng.gen::<f64>() - 0.5) * 2.0 * MUTATION_NOISE;
    (a + (b - a) * mix + noise).clamp(0.0, 1.0)
}
