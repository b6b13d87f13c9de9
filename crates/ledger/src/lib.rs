//! Ledger — persistovaný stav challenge trackeru (`store.json`)
//!
//! Jeden JSON dokument, načte se celý při startu a celý se zapisuje:
//!   - `checked_matches`   — hotové zápasy (idempotence)
//!   - `unparsed_matches`  — čekají na OpenDota parse, zkusí se příště
//!   - `leaderboard`       — body + rozpis po zápasech
//!   - `daily`             — datum → hráč → body
//!   - `streaks`           — win/lose streak per hráč
//!   - `privacy_issues`    — výsledek posledního privacy sweepu
//!
//! Chybějící nebo rozbitý soubor = prázdný ledger, nikdy fatal.

use anyhow::{Context, Result};
use challenge_engine::format::MATCH_TIME_FORMAT;
use challenge_engine::{Evaluation, PlayerLine, StreakBook};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckedMatch {
    pub checked_at: DateTime<Utc>,
    pub duration:   u32,
    /// account_id sledovaných hráčů v zápase
    pub friends:    Vec<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnparsedMatch {
    pub reason:          String,
    pub first_seen:      DateTime<Utc>,
    pub expected_player: Option<u32>,
    pub retries:         u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChallengeEntry {
    pub name:   String,
    pub points: i32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchSummary {
    pub date:                  String,
    pub hero:                  String,
    pub kda:                   String,
    pub win:                   bool,
    pub total_points_in_match: i64,
    pub friends_in_match:      Vec<String>,
    pub challenges:            Vec<ChallengeEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    pub name:         String,
    pub total_points: i64,
    #[serde(default)]
    pub matches:      BTreeMap<u64, MatchSummary>,
}

impl LeaderboardEntry {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), total_points: 0, matches: BTreeMap::new() }
    }

    /// total_points == součet per-match subtotalů
    pub fn is_consistent(&self) -> bool {
        self.total_points == self.matches.values().map(|m| m.total_points_in_match).sum::<i64>()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrivacyIssue {
    pub name:      String,
    pub last_seen: DateTime<Utc>,
    pub reason:    String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Ledger {
    pub checked_matches:  BTreeMap<u64, CheckedMatch>,
    pub unparsed_matches: BTreeMap<u64, UnparsedMatch>,
    pub leaderboard:      BTreeMap<u32, LeaderboardEntry>,
    pub daily:            BTreeMap<String, BTreeMap<u32, i64>>,
    pub streaks:          StreakBook,
    pub privacy_issues:   BTreeMap<u32, PrivacyIssue>,
}

impl Ledger {
    pub fn load(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        let raw = match std::fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(e) => {
                info!("No store at {} ({}), starting with an empty ledger", path.display(), e);
                return Self::default();
            }
        };
        match serde_json::from_str::<Ledger>(&raw) {
            Ok(ledger) => {
                info!(
                    "Loaded ledger: {} checked, {} unparsed, {} players",
                    ledger.checked_matches.len(),
                    ledger.unparsed_matches.len(),
                    ledger.leaderboard.len()
                );
                ledger
            }
            Err(e) => {
                warn!("Store {} is corrupt ({}), starting with an empty ledger", path.display(), e);
                Self::default()
            }
        }
    }

    /// Zapíše přes dočasný soubor + rename, aby pád uprostřed zápisu nerozbil store.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).with_context(|| format!("create {}", parent.display()))?;
        }
        let json = serde_json::to_string_pretty(self).context("serialize ledger")?;
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, json).with_context(|| format!("write {}", tmp.display()))?;
        std::fs::rename(&tmp, path).with_context(|| format!("rename {} → {}", tmp.display(), path.display()))?;
        debug!("Ledger saved to {}", path.display());
        Ok(())
    }

    pub fn is_checked(&self, match_id: u64) -> bool {
        self.checked_matches.contains_key(&match_id)
    }

    /// Zápas zatím nejde bodovat. `first_seen` zůstává z prvního odložení.
    pub fn defer(&mut self, match_id: u64, reason: &str, expected_player: Option<u32>, now: DateTime<Utc>) -> u32 {
        let entry = self.unparsed_matches.entry(match_id).or_insert_with(|| UnparsedMatch {
            reason: String::new(),
            first_seen: now,
            expected_player,
            retries: 0,
        });
        entry.reason = reason.to_string();
        entry.expected_player = expected_player;
        entry.retries += 1;
        entry.retries
    }

    /// Zapíše body ze zápasu a označí ho jako checked.
    /// Vrací `false` (a nic nemění), pokud už zápas checked byl.
    pub fn record_scored(&mut self, eval: &Evaluation) -> bool {
        if self.is_checked(eval.match_id) {
            return false;
        }
        self.apply_triggers(eval);
        self.checked_matches.insert(
            eval.match_id,
            CheckedMatch {
                checked_at: eval.match_time,
                duration: eval.duration,
                friends: eval.players.iter().map(|p| p.account_id).collect(),
            },
        );
        self.unparsed_matches.remove(&eval.match_id);
        true
    }

    fn apply_triggers(&mut self, eval: &Evaluation) {
        let friends = eval.friends_in_match();
        let date_key = eval.match_time.format("%Y-%m-%d").to_string();

        for t in &eval.triggers {
            let line = eval.players.iter().find(|p| p.account_id == t.account_id);
            let name = line.map(|l| l.name.clone()).unwrap_or_else(|| t.account_id.to_string());

            let entry = self
                .leaderboard
                .entry(t.account_id)
                .or_insert_with(|| LeaderboardEntry::new(name));
            entry.total_points += i64::from(t.points);

            // summary vzniká líně, až s prvním triggerem hráče v zápase
            let summary = entry
                .matches
                .entry(eval.match_id)
                .or_insert_with(|| match_summary(eval, line, t, &friends));
            summary.challenges.push(ChallengeEntry { name: t.name.clone(), points: t.points });
            summary.total_points_in_match += i64::from(t.points);

            *self
                .daily
                .entry(date_key.clone())
                .or_default()
                .entry(t.account_id)
                .or_insert(0) += i64::from(t.points);
        }
    }

    pub fn record_privacy_issue(&mut self, account_id: u32, name: &str, reason: &str, now: DateTime<Utc>) {
        self.privacy_issues.insert(
            account_id,
            PrivacyIssue { name: name.to_string(), last_seen: now, reason: reason.to_string() },
        );
    }

    pub fn clear_privacy_issue(&mut self, account_id: u32) -> bool {
        self.privacy_issues.remove(&account_id).is_some()
    }

    /// Sestupně podle bodů; při shodě nižší account_id první.
    pub fn standings(&self) -> Vec<(u32, &LeaderboardEntry)> {
        let mut rows: Vec<(u32, &LeaderboardEntry)> = self.leaderboard.iter().map(|(id, e)| (*id, e)).collect();
        rows.sort_by(|a, b| b.1.total_points.cmp(&a.1.total_points).then(a.0.cmp(&b.0)));
        rows
    }
}

fn match_summary(eval: &Evaluation, line: Option<&PlayerLine>, first: &challenge_engine::Trigger, friends: &[String]) -> MatchSummary {
    MatchSummary {
        date: eval.match_time.format(MATCH_TIME_FORMAT).to_string(),
        hero: line.map(|l| l.hero.clone()).unwrap_or_else(|| first.hero.clone()),
        kda: line.map(|l| l.kda.clone()).unwrap_or_else(|| first.kda.clone()),
        win: line.map(|l| l.won).unwrap_or(false),
        total_points_in_match: 0,
        friends_in_match: friends.to_vec(),
        challenges: Vec::new(),
    }
}
