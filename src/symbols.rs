//! Static asset universe mapping genome indices to tradeable symbols.

use serde::{Deserialize, Serialize};

/// Number of symbols in the default universe. Asset-index decoding is always
/// performed against the table actually in use, so swapping in a larger or
/// smaller universe requires no other change.
pub const DEFAULT_UNIVERSE_SIZE: usize = 25;

const DEFAULT_UNIVERSE: [(&str, &str); DEFAULT_UNIVERSE_SIZE] = [
    ("BTC", "Bitcoin"),
    ("ETH", "Ethereum"),
    ("SOL", "Solana"),
    ("BNB", "BNB"),
    ("XRP", "XRP"),
    ("ADA", "Cardano"),
    ("DOGE", "Dogecoin"),
    ("AVAX", "Avalanche"),
    ("DOT", "Polkadot"),
    ("LINK", "Chainlink"),
    ("MATIC", "Polygon"),
    ("LTC", "Litecoin"),
    ("ATOM", "Cosmos"),
    ("UNI", "Uniswap"),
    ("XLM", "Stellar"),
    ("NEAR", "NEAR Protocol"),
    ("APT", "Aptos"),
    ("ARB", "Arbitrum"),
    ("OP", "Optimism"),
    ("FIL", "Filecoin"),
    ("INJ", "Injective"),
    ("SUI", "Sui"),
    ("TIA", "Celestia"),
    ("SEI", "Sei"),
    ("RNDR", "Render"),
];

/// Ordered table of `(symbol, display label)` pairs.
///
/// The position of a pair is the asset index that genomes decode into.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SymbolTable {
    entries: Vec<(String, String)>,
}

impl SymbolTable {
    /// Build a table from `(symbol, label)` pairs in index order.
    pub fn from_pairs<S: Into<String>, L: Into<String>>(pairs: Vec<(S, L)>) -> Self {
        Self {
            entries: pairs
                .into_iter()
                .map(|(symbol, label)| (symbol.into(), label.into()))
                .collect(),
        }
    }

    /// Number of configured symbols.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the table is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Symbol at `index`, or `None` when out of range.
    pub fn symbol(&self, index: usize) -> Option<&str> {
        self.entries.get(index).map(|(symbol, _)| symbol.as_str())
    }

    /// Display label at `index`, or `None` when out of range.
    pub fn label(&self, index: usize) -> Option<&str> {
        self.entries.get(index).map(|(_, label)| label.as_str())
    }

    /// Iterate over `(symbol, label)` pairs in index order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .map(|(symbol, label)| (symbol.as_str(), label.as_str()))
    }
}

impl Default for SymbolTable {
    fn default() -> Self {
        Self::from_pairs(DEFAULT_UNIVERSE.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_universe_has_canonical_size() {
        let table = SymbolTable::default();
        assert_eq!(table.len(), DEFAULT_UNIVERSE_SIZE);
        assert_eq!(table.symbol(0), Some("BTC"));
        assert_eq!(table.label(1), Some("Ethereum"));
        assert_eq!(table.symbol(DEFAULT_UNIVERSE_SIZE), None);
    }
}
