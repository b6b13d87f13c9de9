//! OpenDota match shape.
//!
//! Všechno je `Option`, OpenDota vrací zápas hned po konci hry a statistiky
//! doplňuje až po "deep parse". O tom, co chybí, rozhoduje `gate`, ne serde.

use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;

/// Hranice slotů: `< 128` Radiant, `>= 128` Dire
pub const DIRE_SLOT_OFFSET: u32 = 128;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MatchRecord {
    pub match_id:                Option<u64>,
    pub start_time:              Option<i64>,
    pub duration:                Option<u32>,
    pub radiant_win:             Option<bool>,
    pub barracks_status_radiant: Option<u32>,
    pub barracks_status_dire:    Option<u32>,
    #[serde(default)]
    pub players:                 Option<Vec<PlayerRecord>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PlayerRecord {
    /// `None` = anonymní hráč, nikdy se nesleduje
    pub account_id:   Option<u32>,
    pub hero_id:      Option<u32>,
    pub kills:        Option<u32>,
    pub deaths:       Option<u32>,
    pub assists:      Option<u32>,
    pub hero_damage:  Option<u32>,
    pub tower_damage: Option<u32>,
    /// OpenDota posílá 0/1, starší dumpy true/false
    #[serde(default, deserialize_with = "de_flag")]
    pub win:          Option<bool>,
    pub player_slot:  Option<u32>,
    pub party_size:   Option<u32>,
    /// streak length ("2".."5") → count
    pub multi_kills:  Option<BTreeMap<String, u32>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Radiant,
    Dire,
}

impl Side {
    pub fn from_slot(slot: u32) -> Self {
        if slot < DIRE_SLOT_OFFSET { Side::Radiant } else { Side::Dire }
    }

    pub fn opponent(self) -> Self {
        match self {
            Side::Radiant => Side::Dire,
            Side::Dire => Side::Radiant,
        }
    }
}

impl MatchRecord {
    pub fn players(&self) -> &[PlayerRecord] {
        self.players.as_deref().unwrap_or(&[])
    }

    pub fn barracks(&self, side: Side) -> Option<u32> {
        match side {
            Side::Radiant => self.barracks_status_radiant,
            Side::Dire => self.barracks_status_dire,
        }
    }

    /// Výsledek hráče; když chybí `win`, dopočítá se ze slotu a `radiant_win`.
    pub fn player_won(&self, player: &PlayerRecord) -> Option<bool> {
        player.win.or_else(|| {
            let side = Side::from_slot(player.player_slot?);
            let radiant_win = self.radiant_win?;
            Some(if side == Side::Radiant { radiant_win } else { !radiant_win })
        })
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Flag {
    Bool(bool),
    Int(i64),
}

fn de_flag<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Flag>::deserialize(deserializer)?.map(|f| match f {
        Flag::Bool(b) => b,
        Flag::Int(i) => i != 0,
    }))
}
