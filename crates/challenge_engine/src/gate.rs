//! Readiness gate — je zápas naparsovaný natolik, aby bodování bylo deterministické?
//!
//! OpenDota vrací zápas hned po hře a statistiky (tower damage, multi kills,
//! party size...) dopočítává asynchronně. Radši počkáme na další run, než
//! abychom bodovali z polovičních dat.

use crate::context::ChallengeContext;
use crate::model::{MatchRecord, PlayerRecord, Side};
use chrono::{DateTime, TimeZone, Utc};
use std::fmt;

/// Zápas musí mít přesně tolik hráčů
pub const PLAYERS_PER_MATCH: usize = 10;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeferReason {
    MissingMatchField(&'static str),
    PlayerCount(usize),
    /// Hráč, přes jehož historii jsme zápas našli, v něm není vidět.
    PrivateProfile { account_id: u32, name: String },
    MissingPlayerField { name: String, field: &'static str },
}

impl DeferReason {
    pub fn is_privacy(&self) -> bool {
        matches!(self, DeferReason::PrivateProfile { .. })
    }
}

impl fmt::Display for DeferReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeferReason::MissingMatchField(field) => write!(f, "Waiting for OpenDota to parse {field}"),
            DeferReason::PlayerCount(n) => write!(f, "Player data incomplete ({n}/{PLAYERS_PER_MATCH} players)"),
            DeferReason::PrivateProfile { name, .. } => write!(f, "{name} has privacy enabled (Data missing)"),
            DeferReason::MissingPlayerField { name, field } => write!(f, "Waiting for parse: {name} {field} is null"),
        }
    }
}

/// Sledovaný hráč s kompletními statistikami.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackedPlayer {
    pub account_id:   u32,
    pub name:         String,
    pub hero_id:      u32,
    pub kills:        u32,
    pub deaths:       u32,
    pub assists:      u32,
    pub hero_damage:  u32,
    pub tower_damage: u32,
    pub won:          bool,
    pub side:         Side,
    pub party_size:   u32,
    /// multi_kills["5"]
    pub rampages:     u32,
}

impl TrackedPlayer {
    pub fn kda(&self) -> String {
        format!("{}/{}/{}", self.kills, self.deaths, self.assists)
    }
}

/// Zápas, který prošel gate, už žádné `Option`.
#[derive(Debug, Clone)]
pub struct ReadyMatch {
    pub match_id:         u64,
    pub start_time:       DateTime<Utc>,
    pub duration:         u32,
    pub barracks_radiant: u32,
    pub barracks_dire:    u32,
    /// V pořadí, v jakém jsou v zápase (slot order)
    pub tracked:          Vec<TrackedPlayer>,
    /// Hero damage všech hráčů poražené strany (i nesledovaných, pokud je známý)
    pub losing_side_damage: Vec<u32>,
}

impl ReadyMatch {
    pub fn own_barracks(&self, side: Side) -> u32 {
        match side {
            Side::Radiant => self.barracks_radiant,
            Side::Dire => self.barracks_dire,
        }
    }

    pub fn enemy_barracks(&self, side: Side) -> u32 {
        self.own_barracks(side.opponent())
    }

    pub fn friends_in_match(&self) -> Vec<String> {
        self.tracked.iter().map(|p| p.name.clone()).collect()
    }
}

#[derive(Debug, Clone)]
pub enum Readiness {
    Ready(ReadyMatch),
    Deferred(DeferReason),
}

/// `expected` = hráč, přes jehož historii jsme na zápas narazili (privacy check).
pub fn assess(record: &MatchRecord, expected: Option<u32>, ctx: &ChallengeContext) -> Readiness {
    match try_assess(record, expected, ctx) {
        Ok(ready) => Readiness::Ready(ready),
        Err(reason) => Readiness::Deferred(reason),
    }
}

fn try_assess(record: &MatchRecord, expected: Option<u32>, ctx: &ChallengeContext) -> Result<ReadyMatch, DeferReason> {
    let match_id = record.match_id.ok_or(DeferReason::MissingMatchField("match_id"))?;
    let start_time = record.start_time.ok_or(DeferReason::MissingMatchField("start_time"))?;
    let duration = record.duration.ok_or(DeferReason::MissingMatchField("duration"))?;
    let barracks_radiant = record
        .barracks_status_radiant
        .ok_or(DeferReason::MissingMatchField("barracks_status_radiant"))?;
    let barracks_dire = record
        .barracks_status_dire
        .ok_or(DeferReason::MissingMatchField("barracks_status_dire"))?;
    let start_time = Utc
        .timestamp_opt(start_time, 0)
        .single()
        .ok_or(DeferReason::MissingMatchField("start_time"))?;

    let players = record.players();
    if players.len() != PLAYERS_PER_MATCH {
        return Err(DeferReason::PlayerCount(players.len()));
    }

    let friends: Vec<&PlayerRecord> = players
        .iter()
        .filter(|p| p.account_id.is_some_and(|id| ctx.roster.contains(id)))
        .collect();

    if let Some(expected) = expected {
        if !friends.iter().any(|p| p.account_id == Some(expected)) {
            return Err(DeferReason::PrivateProfile {
                account_id: expected,
                name: ctx.roster.display_name(expected),
            });
        }
    }

    let mut ready = ReadyMatch {
        match_id,
        start_time,
        duration,
        barracks_radiant,
        barracks_dire,
        tracked: Vec::with_capacity(friends.len()),
        losing_side_damage: Vec::new(),
    };

    // nikdo z rosteru → není co bodovat, dál nekontrolujeme
    if friends.is_empty() {
        return Ok(ready);
    }

    for p in friends {
        ready.tracked.push(tracked_player(p, ctx)?);
    }

    ready.losing_side_damage = players
        .iter()
        .filter(|p| record.player_won(p) == Some(false))
        .filter_map(|p| p.hero_damage)
        .collect();

    Ok(ready)
}

fn tracked_player(p: &PlayerRecord, ctx: &ChallengeContext) -> Result<TrackedPlayer, DeferReason> {
    // account_id je jistě Some, jinak by hráč nebyl ve friends
    let account_id = p.account_id.unwrap_or_default();
    let name = ctx.roster.display_name(account_id);
    let missing = |field: &'static str| DeferReason::MissingPlayerField { name: name.clone(), field };

    let kills = p.kills.ok_or_else(|| missing("kills"))?;
    let deaths = p.deaths.ok_or_else(|| missing("deaths"))?;
    let assists = p.assists.ok_or_else(|| missing("assists"))?;
    let won = p.win.ok_or_else(|| missing("win"))?;
    let hero_id = p.hero_id.ok_or_else(|| missing("hero_id"))?;
    let hero_damage = p.hero_damage.ok_or_else(|| missing("hero_damage"))?;
    let tower_damage = p.tower_damage.ok_or_else(|| missing("tower_damage"))?;
    let party_size = p.party_size.ok_or_else(|| missing("party_size"))?;
    let multi_kills = p.multi_kills.as_ref().ok_or_else(|| missing("multi_kills"))?;
    let slot = p.player_slot.ok_or_else(|| missing("player_slot"))?;

    Ok(TrackedPlayer {
        account_id,
        hero_id,
        kills,
        deaths,
        assists,
        hero_damage,
        tower_damage,
        won,
        side: Side::from_slot(slot),
        party_size,
        rampages: multi_kills.get("5").copied().unwrap_or(0),
        name,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{ctx, MatchBuilder, FRIEND_A, FRIEND_B};

    fn deferred(r: Readiness) -> DeferReason {
        match r {
            Readiness::Deferred(reason) => reason,
            Readiness::Ready(m) => panic!("expected deferred, got ready match {}", m.match_id),
        }
    }

    fn ready(r: Readiness) -> ReadyMatch {
        match r {
            Readiness::Ready(m) => m,
            Readiness::Deferred(reason) => panic!("expected ready, got {reason}"),
        }
    }

    #[test]
    fn missing_match_field_defers_naming_field() {
        let ctx = ctx();
        for field in [
            "match_id", "start_time", "duration", "barracks_status_radiant", "barracks_status_dire",
        ] {
            // i bez sledovaných hráčů: gate nesmí zápas pustit dál
            for friend in [None, Some(FRIEND_A)] {
                let mut builder = MatchBuilder::new(1);
                if let Some(id) = friend {
                    builder = builder.friend(0, id, |p| p);
                }
                let record = builder.without_match_field(field).build();
                assert_eq!(
                    deferred(assess(&record, friend, &ctx)),
                    DeferReason::MissingMatchField(field),
                    "field {field}, friend {friend:?}"
                );
            }
        }
    }

    #[test]
    fn wrong_player_count_defers() {
        let ctx = ctx();
        let record = MatchBuilder::new(1).truncate_players(9).build();
        assert_eq!(deferred(assess(&record, None, &ctx)), DeferReason::PlayerCount(9));
    }

    #[test]
    fn expected_friend_missing_is_privacy() {
        let ctx = ctx();
        let record = MatchBuilder::new(1).build();
        let reason = deferred(assess(&record, Some(FRIEND_A), &ctx));
        assert!(reason.is_privacy());
        assert_eq!(reason.to_string(), "Alice has privacy enabled (Data missing)");
    }

    #[test]
    fn no_friends_is_ready_and_empty() {
        let ctx = ctx();
        let record = MatchBuilder::new(7).build();
        let m = ready(assess(&record, None, &ctx));
        assert_eq!(m.match_id, 7);
        assert!(m.tracked.is_empty());
    }

    #[test]
    fn missing_player_field_defers_naming_field() {
        let ctx = ctx();
        for field in [
            "kills", "deaths", "assists", "win", "hero_id", "hero_damage",
            "tower_damage", "party_size", "multi_kills", "player_slot",
        ] {
            let record = MatchBuilder::new(1)
                .friend(0, FRIEND_A, |p| p)
                .without_player_field(0, field)
                .build();
            assert_eq!(
                deferred(assess(&record, Some(FRIEND_A), &ctx)),
                DeferReason::MissingPlayerField { name: "Alice".into(), field },
                "field {field}"
            );
        }
    }

    #[test]
    fn untracked_missing_fields_do_not_block() {
        let ctx = ctx();
        let record = MatchBuilder::new(1)
            .friend(0, FRIEND_A, |p| p)
            .without_player_field(7, "tower_damage")
            .without_player_field(7, "multi_kills")
            .build();
        let m = ready(assess(&record, Some(FRIEND_A), &ctx));
        assert_eq!(m.tracked.len(), 1);
        assert_eq!(m.tracked[0].name, "Alice");
    }

    #[test]
    fn ready_collects_losing_side_damage() {
        let ctx = ctx();
        // radiant vyhrál → dire sloty 5..9 prohrály
        let record = MatchBuilder::new(1)
            .friend(0, FRIEND_A, |p| p)
            .friend(6, FRIEND_B, |p| p.hero_damage(4000))
            .build();
        let m = ready(assess(&record, None, &ctx));
        assert_eq!(m.tracked.len(), 2);
        assert_eq!(m.losing_side_damage.len(), 5);
        assert!(m.losing_side_damage.contains(&4000));
        assert!(m.tracked[1].side == Side::Dire && !m.tracked[1].won);
    }
}
