//! Test builders — OpenDota-shaped zápasy přes `serde_json`.
//!
//! Default zápas: Radiant vyhrál, 10 nesledovaných hráčů s "nudnými" staty,
//! tedy žádné pravidlo nevystřelí, dokud ho test explicitně nenastaví.

use crate::context::{ChallengeContext, HeroNames, Roster};
use crate::model::MatchRecord;
use serde_json::{json, Map, Value};

pub const FRIEND_A: u32 = 1001;
pub const FRIEND_B: u32 = 1002;
pub const FRIEND_C: u32 = 1003;
pub const FRIEND_D: u32 = 1004;

pub const DEFAULT_START: i64 = 1_768_600_000; // 2026-01-16 21:46:40 UTC

pub fn roster() -> Roster {
    Roster::new([
        (FRIEND_A, "Alice".to_string()),
        (FRIEND_B, "Bob".to_string()),
        (FRIEND_C, "Cyril".to_string()),
        (FRIEND_D, "Dana".to_string()),
    ])
}

pub fn ctx() -> ChallengeContext {
    ChallengeContext::new(
        roster(),
        HeroNames::new([(1, "Anti-Mage".to_string()), (14, "Pudge".to_string())]),
    )
}

/// Slot index 0..=4 → Radiant, 5..=9 → Dire (128..=132)
pub fn slot_for(index: usize) -> u32 {
    if index < 5 { index as u32 } else { 128 + (index as u32 - 5) }
}

#[derive(Debug, Clone)]
pub struct PlayerPatch(Map<String, Value>);

impl PlayerPatch {
    fn set(mut self, key: &str, value: Value) -> Self {
        self.0.insert(key.to_string(), value);
        self
    }

    pub fn kills(self, n: u32) -> Self { self.set("kills", json!(n)) }
    pub fn deaths(self, n: u32) -> Self { self.set("deaths", json!(n)) }
    pub fn assists(self, n: u32) -> Self { self.set("assists", json!(n)) }
    pub fn hero(self, id: u32) -> Self { self.set("hero_id", json!(id)) }
    pub fn hero_damage(self, n: u32) -> Self { self.set("hero_damage", json!(n)) }
    pub fn tower_damage(self, n: u32) -> Self { self.set("tower_damage", json!(n)) }
    pub fn party_size(self, n: u32) -> Self { self.set("party_size", json!(n)) }
    pub fn rampages(self, n: u32) -> Self { self.set("multi_kills", json!({ "2": 3, "5": n })) }
}

#[derive(Debug, Clone)]
pub struct MatchBuilder {
    top: Map<String, Value>,
    players: Vec<Map<String, Value>>,
    radiant_win: bool,
    stripped: Vec<(usize, &'static str)>,
    player_count: usize,
}

impl MatchBuilder {
    pub fn new(match_id: u64) -> Self {
        let mut top = Map::new();
        top.insert("match_id".into(), json!(match_id));
        top.insert("start_time".into(), json!(DEFAULT_START));
        top.insert("duration".into(), json!(2400));
        top.insert("barracks_status_radiant".into(), json!(48));
        top.insert("barracks_status_dire".into(), json!(3));

        let players = (0..10)
            .map(|i| {
                let mut p = Map::new();
                p.insert("account_id".into(), json!(500 + i as u32));
                p.insert("player_slot".into(), json!(slot_for(i)));
                p.insert("hero_id".into(), json!(20 + i as u32));
                p.insert("kills".into(), json!(5));
                p.insert("deaths".into(), json!(5));
                p.insert("assists".into(), json!(10));
                p.insert("hero_damage".into(), json!(10_000 + 100 * i as u32));
                p.insert("tower_damage".into(), json!(1500));
                p.insert("party_size".into(), json!(1));
                p.insert("multi_kills".into(), json!({ "2": 1 }));
                p
            })
            .collect();

        Self { top, players, radiant_win: true, stripped: Vec::new(), player_count: 10 }
    }

    pub fn radiant_win(mut self, win: bool) -> Self {
        self.radiant_win = win;
        self
    }

    pub fn duration(mut self, secs: u32) -> Self {
        self.top.insert("duration".into(), json!(secs));
        self
    }

    pub fn start_time(mut self, ts: i64) -> Self {
        self.top.insert("start_time".into(), json!(ts));
        self
    }

    pub fn barracks(mut self, radiant: u32, dire: u32) -> Self {
        self.top.insert("barracks_status_radiant".into(), json!(radiant));
        self.top.insert("barracks_status_dire".into(), json!(dire));
        self
    }

    /// Dá sledovaného hráče na pozici `index` (0..=4 Radiant, 5..=9 Dire).
    pub fn friend(self, index: usize, account_id: u32, patch: impl FnOnce(PlayerPatch) -> PlayerPatch) -> Self {
        self.player(index, move |p| patch(p.set("account_id", json!(account_id))))
    }

    pub fn player(mut self, index: usize, patch: impl FnOnce(PlayerPatch) -> PlayerPatch) -> Self {
        let current = PlayerPatch(self.players[index].clone());
        self.players[index] = patch(current).0;
        self
    }

    pub fn without_match_field(mut self, field: &str) -> Self {
        self.top.remove(field);
        self
    }

    pub fn without_player_field(mut self, index: usize, field: &'static str) -> Self {
        self.stripped.push((index, field));
        self
    }

    pub fn truncate_players(mut self, count: usize) -> Self {
        self.player_count = count;
        self
    }

    pub fn to_json(&self) -> Value {
        let mut top = self.top.clone();
        top.insert("radiant_win".into(), json!(self.radiant_win));
        let players: Vec<Value> = self
            .players
            .iter()
            .enumerate()
            .take(self.player_count)
            .map(|(i, p)| {
                let mut p = p.clone();
                let radiant = i < 5;
                p.insert("win".into(), json!(if radiant == self.radiant_win { 1 } else { 0 }));
                for (idx, field) in &self.stripped {
                    if *idx == i {
                        p.remove(*field);
                    }
                }
                Value::Object(p)
            })
            .collect();
        top.insert("players".into(), Value::Array(players));
        Value::Object(top)
    }

    pub fn build(&self) -> MatchRecord {
        serde_json::from_value(self.to_json()).unwrap_or_default()
    }
}
