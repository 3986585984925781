//! Index constituents and the directory that looks them up by symbol.

use crate::error::{RankError, Result};
use crate::universe::gics::GicsSector;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Index constituent with descriptive metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Constituent {
    /// Ticker symbol in provider format (e.g. `BRK-B`).
    pub symbol: String,
    /// Company name.
    pub name: String,
    /// GICS sector name.
    pub sector: String,
    /// GICS sub-industry name.
    pub industry: String,
}

impl Constituent {
    /// Create a new constituent.
    pub fn new(
        symbol: impl Into<String>,
        name: impl Into<String>,
        sector: impl Into<String>,
        industry: impl Into<String>,
    ) -> Self {
        Self {
            symbol: symbol.into(),
            name: name.into(),
            sector: sector.into(),
            industry: industry.into(),
        }
    }

    /// The sector as a GICS enum, if the name is recognised.
    pub fn gics_sector(&self) -> Option<GicsSector> {
        GicsSector::from_name(&self.sector)
    }
}

/// Normalize a listing symbol to the price provider's ticker format.
///
/// Listings write share classes with a dot (`BRK.B`) while quote providers use a
/// dash (`BRK-B`). Surrounding whitespace is trimmed and letters are uppercased.
pub fn normalize_symbol(raw: &str) -> Result<String> {
    let symbol = raw.trim();
    if symbol.is_empty() {
        return Err(RankError::InvalidSymbol("Empty symbol".to_string()));
    }
    if symbol.chars().any(char::is_whitespace) {
        return Err(RankError::InvalidSymbol(symbol.to_string()));
    }

    Ok(symbol.to_uppercase().replace('.', "-"))
}

/// Snapshot of index constituents keyed by symbol.
///
/// Immutable once built. When a symbol appears more than once the first
/// occurrence wins.
#[derive(Debug, Clone, Default)]
pub struct ConstituentDirectory {
    constituents: Vec<Constituent>,
    index: HashMap<String, usize>,
}

impl ConstituentDirectory {
    /// Build a directory from a list of constituents.
    pub fn new(constituents: Vec<Constituent>) -> Self {
        let mut kept = Vec::with_capacity(constituents.len());
        let mut index = HashMap::with_capacity(constituents.len());

        for constituent in constituents {
            if index.contains_key(&constituent.symbol) {
                tracing::debug!(symbol = %constituent.symbol, "duplicate constituent ignored");
                continue;
            }
            index.insert(constituent.symbol.clone(), kept.len());
            kept.push(constituent);
        }

        Self {
            constituents: kept,
            index,
        }
    }

    /// Get all constituents in listing order.
    pub fn constituents(&self) -> &[Constituent] {
        &self.constituents
    }

    /// Look up a constituent by exact symbol.
    pub fn get(&self, symbol: &str) -> Option<&Constituent> {
        self.index.get(symbol).map(|&i| &self.constituents[i])
    }

    /// Get all symbols in listing order.
    pub fn symbols(&self) -> Vec<String> {
        self.constituents.iter().map(|c| c.symbol.clone()).collect()
    }

    /// Number of constituents.
    pub fn len(&self) -> usize {
        self.constituents.len()
    }

    /// Whether the directory is empty.
    pub fn is_empty(&self) -> bool {
        self.constituents.is_empty()
    }

    /// Get all constituents in a specific GICS sector.
    pub fn in_sector(&self, sector: GicsSector) -> Vec<&Constituent> {
        self.constituents
            .iter()
            .filter(|c| c.gics_sector() == Some(sector))
            .collect()
    }

    /// Count constituents per GICS sector. Unrecognised sector names are skipped.
    pub fn sector_counts(&self) -> HashMap<GicsSector, usize> {
        let mut counts = HashMap::new();
        for sector in self.constituents.iter().filter_map(Constituent::gics_sector) {
            *counts.entry(sector).or_insert(0) += 1;
        }
        counts
    }
}

impl FromIterator<Constituent> for ConstituentDirectory {
    fn from_iter<I: IntoIterator<Item = Constituent>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn sample() -> ConstituentDirectory {
        ConstituentDirectory::new(vec![
            Constituent::new(
                "AAPL",
                "Apple Inc.",
                "Information Technology",
                "Technology Hardware, Storage & Peripherals",
            ),
            Constituent::new("XOM", "ExxonMobil", "Energy", "Integrated Oil & Gas"),
            Constituent::new("CVX", "Chevron Corporation", "Energy", "Integrated Oil & Gas"),
            Constituent::new("ZZZ", "Mystery Co", "Unlisted", "Unknown"),
        ])
    }

    #[rstest]
    #[case("BRK.B", "BRK-B")]
    #[case("BF.B", "BF-B")]
    #[case(" aapl ", "AAPL")]
    #[case("MSFT", "MSFT")]
    fn test_normalize_symbol(#[case] raw: &str, #[case] expected: &str) {
        assert_eq!(normalize_symbol(raw).unwrap(), expected);
    }

    #[test]
    fn test_normalize_symbol_rejects_blank_and_spaced() {
        assert!(matches!(
            normalize_symbol("   "),
            Err(RankError::InvalidSymbol(_))
        ));
        assert!(matches!(
            normalize_symbol("BRK B"),
            Err(RankError::InvalidSymbol(_))
        ));
    }

    #[test]
    fn test_lookup_by_symbol() {
        let directory = sample();
        assert_eq!(directory.len(), 4);
        assert_eq!(directory.get("XOM").unwrap().name, "ExxonMobil");
        assert!(directory.get("xom").is_none());
        assert!(directory.get("NOTREAL").is_none());
    }

    #[test]
    fn test_duplicate_symbols_keep_first() {
        let directory = ConstituentDirectory::new(vec![
            Constituent::new("A", "First", "Energy", "Oil"),
            Constituent::new("A", "Second", "Energy", "Oil"),
        ]);
        assert_eq!(directory.len(), 1);
        assert_eq!(directory.get("A").unwrap().name, "First");
    }

    #[test]
    fn test_sector_queries() {
        let directory = sample();

        let energy: Vec<_> = directory
            .in_sector(GicsSector::Energy)
            .into_iter()
            .map(|c| c.symbol.as_str())
            .collect();
        assert_eq!(energy, vec!["XOM", "CVX"]);

        let counts = directory.sector_counts();
        assert_eq!(counts.get(&GicsSector::Energy), Some(&2));
        assert_eq!(counts.get(&GicsSector::InformationTechnology), Some(&1));
        assert_eq!(counts.values().sum::<usize>(), 3);
    }
}
