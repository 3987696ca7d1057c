//! Edge region catalog.
//!
//! Static configuration: the set of regional entry points a run can probe.
//! Loaded once, never mutated; run subsets are selected by id and always
//! keep declaration order.

use serde::{Deserialize, Serialize};

/// One edge location a probe can be routed through.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Region {
    /// Unique region id, e.g. `"iad1"`.
    pub id: String,
    /// City / human-readable location.
    pub city: String,
    /// Continent the region sits on.
    pub continent: String,
    /// Display flag for the UI.
    pub flag: String,
}

impl Region {
    fn new(id: &str, city: &str, continent: &str, flag: &str) -> Self {
        Self {
            id: id.to_string(),
            city: city.to_string(),
            continent: continent.to_string(),
            flag: flag.to_string(),
        }
    }

    /// The built-in catalog of edge regions, in declaration order.
    pub fn catalog() -> Vec<Region> {
        CATALOG
            .iter()
            .map(|(id, city, continent, flag)| Region::new(id, city, continent, flag))
            .collect()
    }

    /// Look up a catalog region by id.
    pub fn find(id: &str) -> Option<Region> {
        CATALOG
            .iter()
            .find(|(code, _, _, _)| *code == id)
            .map(|(code, city, continent, flag)| Region::new(code, city, continent, flag))
    }

    /// Distinct continents covered by the catalog, in first-seen order.
    pub fn continents() -> Vec<&'static str> {
        let mut seen = Vec::new();
        for (_, _, continent, _) in CATALOG {
            if !seen.contains(continent) {
                seen.push(continent);
            }
        }
        seen
    }
}

const CATALOG: &[(&str, &str, &str, &str)] = &[
    ("iad1", "Washington, D.C., USA", "North America", "\u{1F1FA}\u{1F1F8}"),
    ("sfo1", "San Francisco, USA", "North America", "\u{1F1FA}\u{1F1F8}"),
    ("pdx1", "Portland, USA", "North America", "\u{1F1FA}\u{1F1F8}"),
    ("yul1", "Montreal, Canada", "North America", "\u{1F1E8}\u{1F1E6}"),
    ("lhr1", "London, UK", "Europe", "\u{1F1EC}\u{1F1E7}"),
    ("fra1", "Frankfurt, Germany", "Europe", "\u{1F1E9}\u{1F1EA}"),
    ("ams1", "Amsterdam, Netherlands", "Europe", "\u{1F1F3}\u{1F1F1}"),
    ("cdg1", "Paris, France", "Europe", "\u{1F1EB}\u{1F1F7}"),
    ("dub1", "Dublin, Ireland", "Europe", "\u{1F1EE}\u{1F1EA}"),
    ("arn1", "Stockholm, Sweden", "Europe", "\u{1F1F8}\u{1F1EA}"),
    ("nrt1", "Tokyo, Japan", "Asia", "\u{1F1EF}\u{1F1F5}"),
    ("icn1", "Seoul, South Korea", "Asia", "\u{1F1F0}\u{1F1F7}"),
    ("sin1", "Singapore", "Asia", "\u{1F1F8}\u{1F1EC}"),
    ("hkg1", "Hong Kong", "Asia", "\u{1F1ED}\u{1F1F0}"),
    ("bom1", "Mumbai, India", "Asia", "\u{1F1EE}\u{1F1F3}"),
    ("syd1", "Sydney, Australia", "Oceania", "\u{1F1E6}\u{1F1FA}"),
    ("gru1", "São Paulo, Brazil", "South America", "\u{1F1E7}\u{1F1F7}"),
    ("cpt1", "Cape Town, South Africa", "Africa", "\u{1F1FF}\u{1F1E6}"),
];

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_catalog_shape() {
        let catalog = Region::catalog();
        assert_eq!(catalog.len(), 18);

        let ids: HashSet<&str> = catalog.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids.len(), catalog.len(), "region ids must be unique");
    }

    #[test]
    fn test_find_by_id() {
        let region = Region::find("iad1").unwrap();
        assert_eq!(region.city, "Washington, D.C., USA");
        assert!(Region::find("zzz9").is_none());
    }

    #[test]
    fn test_continents() {
        let continents = Region::continents();
        assert_eq!(continents.len(), 6);
        assert_eq!(continents[0], "North America");
        assert!(continents.contains(&"Africa"));
    }
}
