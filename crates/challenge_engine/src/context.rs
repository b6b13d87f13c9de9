//! Roster + hero tabulka — načte se jednou při startu a dál se jen půjčuje.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use tracing::{info, warn};

/// Sledovaní hráči: account_id → zobrazované jméno
#[derive(Debug, Clone, Default)]
pub struct Roster {
    players: BTreeMap<u32, String>,
}

impl Roster {
    pub fn new(players: impl IntoIterator<Item = (u32, String)>) -> Self {
        Self { players: players.into_iter().collect() }
    }

    /// `{"78252078": "Was", ...}` klíče jsou stringy (JSON).
    pub fn parse(raw: &str) -> Result<Self> {
        let map: BTreeMap<String, String> = serde_json::from_str(raw).context("roster is not a JSON object")?;
        let mut players = BTreeMap::new();
        for (key, name) in map {
            match key.trim().parse::<u32>() {
                Ok(id) => {
                    players.insert(id, name);
                }
                Err(_) => warn!("roster: skipping non-numeric account id {:?}", key),
            }
        }
        Ok(Self { players })
    }

    /// Missing file → empty roster (nic se nebude bodovat, ale run neshodí).
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            warn!("{} not found, using empty roster", path.display());
            return Ok(Self::default());
        }
        let raw = std::fs::read_to_string(path).with_context(|| format!("read roster {}", path.display()))?;
        let roster = Self::parse(&raw).with_context(|| format!("parse roster {}", path.display()))?;
        info!("Loaded roster: {} tracked players", roster.len());
        Ok(roster)
    }

    pub fn contains(&self, account_id: u32) -> bool {
        self.players.contains_key(&account_id)
    }

    pub fn name(&self, account_id: u32) -> Option<&str> {
        self.players.get(&account_id).map(String::as_str)
    }

    pub fn display_name(&self, account_id: u32) -> String {
        self.name(account_id)
            .map(str::to_string)
            .unwrap_or_else(|| account_id.to_string())
    }

    pub fn iter(&self) -> impl Iterator<Item = (u32, &str)> {
        self.players.iter().map(|(id, name)| (*id, name.as_str()))
    }

    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }
}

#[derive(Debug, Deserialize)]
struct HeroRow {
    id: u32,
    localized_name: String,
}

/// hero_id → localized name (OpenDota `heroes.json`)
#[derive(Debug, Clone, Default)]
pub struct HeroNames {
    names: HashMap<u32, String>,
}

impl HeroNames {
    pub fn new(names: impl IntoIterator<Item = (u32, String)>) -> Self {
        Self { names: names.into_iter().collect() }
    }

    pub fn parse(raw: &str) -> Result<Self> {
        let rows: Vec<HeroRow> = serde_json::from_str(raw).context("heroes file is not a JSON array")?;
        Ok(Self::new(rows.into_iter().map(|r| (r.id, r.localized_name))))
    }

    /// Nikdy nefailuje; bez tabulky se jen ukazuje `Hero <id>`.
    pub fn load(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        let parsed = std::fs::read_to_string(path)
            .map_err(anyhow::Error::from)
            .and_then(|raw| Self::parse(&raw));
        match parsed {
            Ok(heroes) => {
                info!("Loaded {} hero names from {}", heroes.names.len(), path.display());
                heroes
            }
            Err(e) => {
                warn!("hero table {} unavailable ({}), falling back to ids", path.display(), e);
                Self::default()
            }
        }
    }

    pub fn name(&self, hero_id: u32) -> String {
        self.names
            .get(&hero_id)
            .cloned()
            .unwrap_or_else(|| format!("Hero {hero_id}"))
    }
}

/// Immutable context předávaný gate i rule enginu.
#[derive(Debug, Clone, Default)]
pub struct ChallengeContext {
    pub roster: Roster,
    pub heroes: HeroNames,
}

impl ChallengeContext {
    pub fn new(roster: Roster, heroes: HeroNames) -> Self {
        Self { roster, heroes }
    }

    pub fn load(roster_file: impl AsRef<Path>, heroes_file: impl AsRef<Path>) -> Result<Self> {
        Ok(Self {
            roster: Roster::load(roster_file)?,
            heroes: HeroNames::load(heroes_file),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roster_parses_string_keys() {
        let roster = Roster::parse(r#"{"78252078": "Was", "105122368": "Nobrain", "oops": "X"}"#).unwrap();
        assert_eq!(roster.len(), 2);
        assert_eq!(roster.name(78252078), Some("Was"));
        assert!(!roster.contains(1));
        assert_eq!(roster.display_name(1), "1");
    }

    #[test]
    fn roster_missing_file_is_empty() {
        let dir = tempfile::TempDir::new().unwrap();
        let roster = Roster::load(dir.path().join("nope.json")).unwrap();
        assert!(roster.is_empty());
    }

    #[test]
    fn hero_names_fallback() {
        let heroes = HeroNames::parse(r#"[{"id": 1, "localized_name": "Anti-Mage"}, {"id": 14, "localized_name": "Pudge"}]"#).unwrap();
        assert_eq!(heroes.name(14), "Pudge");
        assert_eq!(heroes.name(999), "Hero 999");
    }

    #[test]
    fn hero_names_corrupt_file_is_empty() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("heroes.json");
        std::fs::write(&path, "{not json").unwrap();
        let heroes = HeroNames::load(&path);
        assert_eq!(heroes.name(1), "Hero 1");
    }
}
