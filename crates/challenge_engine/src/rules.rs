//! Challenge pravidla — neoficiální bot-only challenge.
//!
//! Vstup: zápas, který prošel gate + streak stav sledovaných hráčů.
//! Výstup: seřazené triggery (jméno + body) a čas zápasu.
//!
//! Jediný cross-match stav jsou streaky; mutují se přesně jednou na hráče a
//! zápas. Že se stejný zápas nevyhodnotí dvakrát, hlídá pipeline (checked set).

use crate::context::ChallengeContext;
use crate::gate::{ReadyMatch, TrackedPlayer};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// ── Thresholds ────────────────────────────────────────────────────────────────

pub const FULL_PARTY: u32 = 5;
/// 25 minut
pub const FAST_GAME_SECS: u32 = 1500;
pub const HIGH_KILLS: u32 = 15;
pub const HIGH_DEATHS: u32 = 20;
pub const LOW_TOWER_DAMAGE: u32 = 100;
pub const STREAK_MILESTONE: u32 = 5;
/// Všech 6 baráků stojí
pub const BARRACKS_INTACT: u32 = 63;
/// Všechny baráky padly → soupeř má megas
pub const BARRACKS_RAZED: u32 = 0;

// ── Points ────────────────────────────────────────────────────────────────────

pub const STACK_WIN_POINTS: i32 = 5;
pub const RAMPAGE_BASE_POINTS: i32 = 15;
pub const RAMPAGE_EXTRA_POINTS: i32 = 3;
pub const WIN_STREAK_POINTS: i32 = 5;
pub const WIN_STREAK_EXTENDED_POINTS: i32 = 1;
pub const FAST_WIN_POINTS: i32 = 3;
pub const HIGH_KILL_BASE_POINTS: i32 = 5;
pub const WIN_VS_MEGAS_POINTS: i32 = 10;
pub const PLAIN_WIN_POINTS: i32 = 1;

pub const STACK_LOSS_POINTS: i32 = -5;
pub const LOW_TOWER_POINTS: i32 = -1;
pub const ZERO_TOWER_POINTS: i32 = -3;
pub const ZERO_KILL_POINTS: i32 = -20;
pub const ZERO_KILL_ZERO_ASSIST_POINTS: i32 = -40;
pub const LOSS_STREAK_POINTS: i32 = -5;
pub const LOSS_STREAK_EXTENDED_POINTS: i32 = -1;
pub const LOST_VS_MEGAS_POINTS: i32 = -5;
pub const HIGH_DEATH_POINTS: i32 = -10;
pub const HIGH_DEATH_ZERO_KILL_POINTS: i32 = -20;
pub const FAST_LOSS_POINTS: i32 = -5;

pub const WET_NOODLE_POINTS: i32 = 3;
pub const DISASTER_DUO_POINTS: i32 = 30;

// ── Challenge titles ──────────────────────────────────────────────────────────

pub const STACK_WIN: &str = "5-Stack Doom Win";
pub const WIN_STREAK: &str = "5 Win Streak";
pub const WIN_STREAK_EXTENDED: &str = "Win Streak Extended";
pub const FAST_WIN: &str = "Win <25m";
pub const HIGH_KILL: &str = "15+ Kill Game";
pub const WIN_VS_MEGAS: &str = "Win vs Full Enemy Megas";
pub const PLAIN_WIN: &str = "Win without Taking All Barracks";
pub const STACK_LOSS: &str = "5-Stack Doom Loss";
pub const LOW_TOWER: &str = "Low Tower Damage";
pub const ZERO_KILL: &str = "0 Kill Game";
pub const LOSS_STREAK: &str = "5 Loss Streak";
pub const LOSS_STREAK_EXTENDED: &str = "Loss Streak Extended";
pub const LOST_VS_MEGAS: &str = "Lost vs Megas";
pub const HIGH_DEATH: &str = "20+ Deaths";
pub const FAST_LOSS: &str = "Loss <25m";
pub const WET_NOODLE: &str = "Wet Noodle";
pub const DISASTER_DUO: &str = "Double Disaster Duo";

pub fn rampage_title(count: u32) -> String {
    format!("Rampage x{count}")
}

// ── Streaks ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchResult {
    Win,
    Loss,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreakState {
    pub last_match_result: Option<MatchResult>,
    pub win_streak:        u32,
    pub lose_streak:       u32,
}

impl StreakState {
    /// Posune streak o jeden zápas. Nanejvýš jeden z counterů je nenulový.
    pub fn record(&mut self, won: bool) {
        if won {
            self.win_streak = match self.last_match_result {
                Some(MatchResult::Win) => self.win_streak + 1,
                _ => 1,
            };
            self.lose_streak = 0;
            self.last_match_result = Some(MatchResult::Win);
        } else {
            self.lose_streak = match self.last_match_result {
                Some(MatchResult::Loss) => self.lose_streak + 1,
                _ => 1,
            };
            self.win_streak = 0;
            self.last_match_result = Some(MatchResult::Loss);
        }
    }
}

/// account_id → streak
pub type StreakBook = BTreeMap<u32, StreakState>;

// ── Triggers ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trigger {
    pub account_id: u32,
    pub match_id:   u64,
    pub name:       String,
    pub points:     i32,
    pub hero:       String,
    pub kda:        String,
    pub damage:     u32,
}

/// Společná část všech triggerů jednoho hráče v jednom zápase.
#[derive(Debug, Clone)]
struct TriggerBase {
    account_id: u32,
    match_id:   u64,
    hero:       String,
    kda:        String,
    damage:     u32,
}

impl TriggerBase {
    fn new(match_id: u64, player: &TrackedPlayer, ctx: &ChallengeContext) -> Self {
        Self {
            account_id: player.account_id,
            match_id,
            hero: ctx.heroes.name(player.hero_id),
            kda: player.kda(),
            damage: player.hero_damage,
        }
    }

    fn fire(&self, name: impl Into<String>, points: i32) -> Trigger {
        Trigger {
            account_id: self.account_id,
            match_id: self.match_id,
            name: name.into(),
            points,
            hero: self.hero.clone(),
            kda: self.kda.clone(),
            damage: self.damage,
        }
    }
}

/// Souhrn jednoho sledovaného hráče v zápase (pro leaderboard).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerLine {
    pub account_id: u32,
    pub name:       String,
    pub hero:       String,
    pub kda:        String,
    pub won:        bool,
}

#[derive(Debug, Clone)]
pub struct Evaluation {
    pub match_id:   u64,
    pub match_time: DateTime<Utc>,
    pub duration:   u32,
    pub triggers:   Vec<Trigger>,
    pub players:    Vec<PlayerLine>,
}

impl Evaluation {
    pub fn friends_in_match(&self) -> Vec<String> {
        self.players.iter().map(|p| p.name.clone()).collect()
    }

    pub fn triggers_for(&self, account_id: u32) -> impl Iterator<Item = &Trigger> {
        self.triggers.iter().filter(move |t| t.account_id == account_id)
    }

    pub fn total_points(&self) -> i64 {
        self.triggers.iter().map(|t| i64::from(t.points)).sum()
    }
}

// ── Engine ────────────────────────────────────────────────────────────────────

/// Vyhodnotí všechna pravidla. Volat max. jednou na zápas, mutuje streaky.
pub fn evaluate(ready: &ReadyMatch, streaks: &mut StreakBook, ctx: &ChallengeContext) -> Evaluation {
    let mut triggers = Vec::new();
    let mut players = Vec::with_capacity(ready.tracked.len());

    for p in &ready.tracked {
        let base = TriggerBase::new(ready.match_id, p, ctx);
        let streak = streaks.entry(p.account_id).or_default();
        streak.record(p.won);

        reward_rules(ready, p, streak, &base, &mut triggers);
        penalty_rules(ready, p, streak, &base, &mut triggers);

        players.push(PlayerLine {
            account_id: p.account_id,
            name: p.name.clone(),
            hero: base.hero.clone(),
            kda: base.kda.clone(),
            won: p.won,
        });
    }

    team_rules(ready, ctx, &mut triggers);

    Evaluation {
        match_id: ready.match_id,
        match_time: ready.start_time,
        duration: ready.duration,
        triggers,
        players,
    }
}

fn reward_rules(ready: &ReadyMatch, p: &TrackedPlayer, streak: &StreakState, base: &TriggerBase, out: &mut Vec<Trigger>) {
    if p.party_size == FULL_PARTY && p.won {
        out.push(base.fire(STACK_WIN, STACK_WIN_POINTS));
    }

    if p.rampages > 0 {
        out.push(base.fire(rampage_title(p.rampages), rampage_points(p.rampages)));
    }

    if p.won {
        if streak.win_streak == STREAK_MILESTONE {
            out.push(base.fire(WIN_STREAK, WIN_STREAK_POINTS));
        } else if streak.win_streak > STREAK_MILESTONE {
            out.push(base.fire(WIN_STREAK_EXTENDED, WIN_STREAK_EXTENDED_POINTS));
        }
    }

    if p.won && ready.duration < FAST_GAME_SECS {
        out.push(base.fire(FAST_WIN, FAST_WIN_POINTS));
    }

    if p.kills >= HIGH_KILLS {
        out.push(base.fire(HIGH_KILL, high_kill_points(p.deaths, p.assists)));
    }

    if p.won {
        // vlastní barracks pole vítěze == 63 → "won despite enemy megas"
        if ready.own_barracks(p.side) == BARRACKS_INTACT {
            out.push(base.fire(WIN_VS_MEGAS, WIN_VS_MEGAS_POINTS));
        } else {
            out.push(base.fire(PLAIN_WIN, PLAIN_WIN_POINTS));
        }
    }
}

fn penalty_rules(ready: &ReadyMatch, p: &TrackedPlayer, streak: &StreakState, base: &TriggerBase, out: &mut Vec<Trigger>) {
    if p.party_size == FULL_PARTY && !p.won {
        out.push(base.fire(STACK_LOSS, STACK_LOSS_POINTS));
    }

    if p.tower_damage < LOW_TOWER_DAMAGE {
        let points = if p.tower_damage == 0 { ZERO_TOWER_POINTS } else { LOW_TOWER_POINTS };
        out.push(base.fire(LOW_TOWER, points));
    }

    if p.kills == 0 {
        let points = if p.assists == 0 { ZERO_KILL_ZERO_ASSIST_POINTS } else { ZERO_KILL_POINTS };
        out.push(base.fire(ZERO_KILL, points));
    }

    if !p.won {
        if streak.lose_streak == STREAK_MILESTONE {
            out.push(base.fire(LOSS_STREAK, LOSS_STREAK_POINTS));
        } else if streak.lose_streak > STREAK_MILESTONE {
            out.push(base.fire(LOSS_STREAK_EXTENDED, LOSS_STREAK_EXTENDED_POINTS));
        }
    }

    // soupeř už neměl ani jeden barák, a stejně prohra
    if !p.won && ready.enemy_barracks(p.side) == BARRACKS_RAZED {
        out.push(base.fire(LOST_VS_MEGAS, LOST_VS_MEGAS_POINTS));
    }

    if p.deaths >= HIGH_DEATHS {
        let points = if p.kills == 0 { HIGH_DEATH_ZERO_KILL_POINTS } else { HIGH_DEATH_POINTS };
        out.push(base.fire(HIGH_DEATH, points));
    }

    if !p.won && ready.duration < FAST_GAME_SECS {
        out.push(base.fire(FAST_LOSS, FAST_LOSS_POINTS));
    }
}

/// 15 za první rampage, +3 za každou další. Nesmyslné počty z API se saturují.
pub fn rampage_points(count: u32) -> i32 {
    let extra = i32::try_from(count.saturating_sub(1)).unwrap_or(i32::MAX);
    RAMPAGE_BASE_POINTS.saturating_add(extra.saturating_mul(RAMPAGE_EXTRA_POINTS))
}

/// 5 bodů, ×2 bez smrti, pak ještě ×3 bez asistence (násobí se, nesčítá).
pub fn high_kill_points(deaths: u32, assists: u32) -> i32 {
    let mut points = HIGH_KILL_BASE_POINTS;
    if deaths == 0 {
        points *= 2;
    }
    if assists == 0 {
        points *= 3;
    }
    points
}

fn team_rules(ready: &ReadyMatch, ctx: &ChallengeContext, out: &mut Vec<Trigger>) {
    let losers: Vec<&TrackedPlayer> = ready.tracked.iter().filter(|p| !p.won).collect();
    if losers.is_empty() {
        return;
    }

    // Wet Noodle: nejmíň hero damage na poražené straně, remízy dostanou všichni
    if let Some(lowest) = ready.losing_side_damage.iter().copied().min() {
        for p in losers.iter().filter(|p| p.hero_damage == lowest) {
            out.push(TriggerBase::new(ready.match_id, p, ctx).fire(WET_NOODLE, WET_NOODLE_POINTS));
        }
    }

    let zero_killers: Vec<&&TrackedPlayer> = losers.iter().filter(|p| p.kills == 0).collect();
    if zero_killers.len() >= 2 {
        for p in zero_killers {
            out.push(TriggerBase::new(ready.match_id, p, ctx).fire(DISASTER_DUO, DISASTER_DUO_POINTS));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{ctx, MatchBuilder, FRIEND_A, FRIEND_B, FRIEND_C, FRIEND_D};
    use crate::gate::{assess, Readiness};
    use crate::model::MatchRecord;

    fn run(record: &MatchRecord, streaks: &mut StreakBook) -> Evaluation {
        let ctx = ctx();
        match assess(record, None, &ctx) {
            Readiness::Ready(ready) => evaluate(&ready, streaks, &ctx),
            Readiness::Deferred(reason) => panic!("fixture not ready: {reason}"),
        }
    }

    fn names(eval: &Evaluation, account_id: u32) -> Vec<String> {
        eval.triggers_for(account_id).map(|t| t.name.clone()).collect()
    }

    fn points_of(eval: &Evaluation, account_id: u32, name: &str) -> Option<i32> {
        eval.triggers_for(account_id).find(|t| t.name == name).map(|t| t.points)
    }

    #[test]
    fn plain_win_only_fires_plain_win() {
        let record = MatchBuilder::new(1).friend(0, FRIEND_A, |p| p).build();
        let eval = run(&record, &mut StreakBook::new());
        assert_eq!(names(&eval, FRIEND_A), vec![PLAIN_WIN.to_string()]);
        assert_eq!(eval.total_points(), 1);
        assert_eq!(eval.players.len(), 1);
    }

    #[test]
    fn no_friends_no_triggers() {
        let record = MatchBuilder::new(1).build();
        let mut streaks = StreakBook::new();
        let eval = run(&record, &mut streaks);
        assert!(eval.triggers.is_empty());
        assert!(streaks.is_empty());
    }

    #[test]
    fn high_kill_multipliers_are_multiplicative() {
        assert_eq!(high_kill_points(3, 4), 5);
        assert_eq!(high_kill_points(0, 4), 10);
        assert_eq!(high_kill_points(3, 0), 15);
        assert_eq!(high_kill_points(0, 0), 30);

        let record = MatchBuilder::new(1)
            .friend(0, FRIEND_A, |p| p.kills(15).deaths(0).assists(0))
            .build();
        let eval = run(&record, &mut StreakBook::new());
        assert_eq!(points_of(&eval, FRIEND_A, HIGH_KILL), Some(6 * HIGH_KILL_BASE_POINTS));
    }

    #[test]
    fn fourteen_kills_is_not_enough() {
        let record = MatchBuilder::new(1).friend(0, FRIEND_A, |p| p.kills(14)).build();
        let eval = run(&record, &mut StreakBook::new());
        assert_eq!(points_of(&eval, FRIEND_A, HIGH_KILL), None);
    }

    #[test]
    fn rampage_points_saturate_on_garbage_counts() {
        assert_eq!(rampage_points(1), 15);
        assert_eq!(rampage_points(2), 18);
        assert_eq!(rampage_points(u32::MAX), i32::MAX);

        let record = MatchBuilder::new(1).friend(0, FRIEND_A, |p| p.rampages(u32::MAX)).build();
        let eval = run(&record, &mut StreakBook::new());
        assert_eq!(points_of(&eval, FRIEND_A, &rampage_title(u32::MAX)), Some(i32::MAX));
    }

    #[test]
    fn rampage_scaling() {
        let record = MatchBuilder::new(1)
            .friend(0, FRIEND_A, |p| p.rampages(1))
            .friend(1, FRIEND_B, |p| p.rampages(3))
            .build();
        let eval = run(&record, &mut StreakBook::new());
        assert_eq!(points_of(&eval, FRIEND_A, "Rampage x1"), Some(15));
        assert_eq!(points_of(&eval, FRIEND_B, "Rampage x3"), Some(21));
    }

    #[test]
    fn radiant_win_with_own_barracks_63_is_win_vs_megas() {
        let record = MatchBuilder::new(1)
            .barracks(63, 0)
            .friend(0, FRIEND_A, |p| p)
            .build();
        let eval = run(&record, &mut StreakBook::new());
        assert_eq!(points_of(&eval, FRIEND_A, WIN_VS_MEGAS), Some(10));
        assert_eq!(points_of(&eval, FRIEND_A, PLAIN_WIN), None);
    }

    #[test]
    fn dire_win_uses_dire_barracks() {
        let record = MatchBuilder::new(1)
            .radiant_win(false)
            .barracks(63, 12)
            .friend(5, FRIEND_A, |p| p)
            .build();
        let eval = run(&record, &mut StreakBook::new());
        assert_eq!(names(&eval, FRIEND_A), vec![PLAIN_WIN.to_string()]);
    }

    #[test]
    fn loss_against_razed_enemy_is_lost_vs_megas() {
        // Radiant vyhrál s nulou baráků → Dire hráč prohrál proti soupeři bez baráků
        let record = MatchBuilder::new(1)
            .barracks(0, 12)
            .friend(5, FRIEND_A, |p| p)
            .build();
        let eval = run(&record, &mut StreakBook::new());
        assert_eq!(points_of(&eval, FRIEND_A, LOST_VS_MEGAS), Some(-5));
    }

    #[test]
    fn full_party_both_ways() {
        let record = MatchBuilder::new(1)
            .friend(0, FRIEND_A, |p| p.party_size(5))
            .friend(5, FRIEND_B, |p| p.party_size(5))
            .build();
        let eval = run(&record, &mut StreakBook::new());
        assert_eq!(points_of(&eval, FRIEND_A, STACK_WIN), Some(5));
        assert_eq!(points_of(&eval, FRIEND_B, STACK_LOSS), Some(-5));
        assert_eq!(points_of(&eval, FRIEND_A, STACK_LOSS), None);
    }

    #[test]
    fn fast_games() {
        let record = MatchBuilder::new(1)
            .duration(1499)
            .friend(0, FRIEND_A, |p| p)
            .friend(5, FRIEND_B, |p| p)
            .build();
        let eval = run(&record, &mut StreakBook::new());
        assert_eq!(points_of(&eval, FRIEND_A, "Win <25m"), Some(3));
        assert_eq!(points_of(&eval, FRIEND_B, "Loss <25m"), Some(-5));

        let record = MatchBuilder::new(2).duration(1500).friend(0, FRIEND_A, |p| p).build();
        let eval = run(&record, &mut StreakBook::new());
        assert_eq!(points_of(&eval, FRIEND_A, FAST_WIN), None);
    }

    #[test]
    fn tower_damage_penalties() {
        let record = MatchBuilder::new(1)
            .friend(0, FRIEND_A, |p| p.tower_damage(0))
            .friend(1, FRIEND_B, |p| p.tower_damage(99))
            .friend(2, FRIEND_C, |p| p.tower_damage(100))
            .build();
        let eval = run(&record, &mut StreakBook::new());
        assert_eq!(points_of(&eval, FRIEND_A, LOW_TOWER), Some(-3));
        assert_eq!(points_of(&eval, FRIEND_B, LOW_TOWER), Some(-1));
        assert_eq!(points_of(&eval, FRIEND_C, LOW_TOWER), None);
    }

    #[test]
    fn zero_kill_and_high_death_penalties() {
        let record = MatchBuilder::new(1)
            .friend(0, FRIEND_A, |p| p.kills(0).assists(0).deaths(20))
            .friend(1, FRIEND_B, |p| p.kills(0).assists(3))
            .friend(2, FRIEND_C, |p| p.kills(1).deaths(22))
            .build();
        let eval = run(&record, &mut StreakBook::new());
        assert_eq!(points_of(&eval, FRIEND_A, ZERO_KILL), Some(-40));
        assert_eq!(points_of(&eval, FRIEND_A, HIGH_DEATH), Some(-20));
        assert_eq!(points_of(&eval, FRIEND_B, ZERO_KILL), Some(-20));
        assert_eq!(points_of(&eval, FRIEND_B, HIGH_DEATH), None);
        assert_eq!(points_of(&eval, FRIEND_C, HIGH_DEATH), Some(-10));
    }

    #[test]
    fn win_streak_builds_and_breaks() {
        let mut streaks = StreakBook::new();
        for id in 1..=6u64 {
            let record = MatchBuilder::new(id).friend(0, FRIEND_A, |p| p).build();
            let eval = run(&record, &mut streaks);
            let fired = names(&eval, FRIEND_A);
            match id {
                5 => assert!(fired.contains(&WIN_STREAK.to_string())),
                6 => assert!(fired.contains(&WIN_STREAK_EXTENDED.to_string())),
                _ => assert!(!fired.iter().any(|n| n.contains("Streak"))),
            }
        }
        let state = &streaks[&FRIEND_A];
        assert_eq!(state.win_streak, 6);
        assert_eq!(state.lose_streak, 0);

        let record = MatchBuilder::new(7).friend(5, FRIEND_A, |p| p).build();
        run(&record, &mut streaks);
        let state = &streaks[&FRIEND_A];
        assert_eq!(state.win_streak, 0);
        assert_eq!(state.lose_streak, 1);
        assert_eq!(state.last_match_result, Some(MatchResult::Loss));
    }

    #[test]
    fn loss_streak_penalties() {
        let mut streaks = StreakBook::new();
        let mut last = None;
        for id in 1..=6u64 {
            let record = MatchBuilder::new(id).friend(5, FRIEND_A, |p| p).build();
            last = Some(run(&record, &mut streaks));
            if id == 5 {
                assert_eq!(points_of(last.as_ref().unwrap(), FRIEND_A, LOSS_STREAK), Some(-5));
            }
        }
        assert_eq!(points_of(last.as_ref().unwrap(), FRIEND_A, LOSS_STREAK_EXTENDED), Some(-1));
        assert_eq!(streaks[&FRIEND_A].lose_streak, 6);
    }

    #[test]
    fn streak_state_record_resets_other_counter() {
        let mut s = StreakState::default();
        s.record(false);
        s.record(false);
        assert_eq!((s.win_streak, s.lose_streak), (0, 2));
        s.record(true);
        assert_eq!((s.win_streak, s.lose_streak), (1, 0));
    }

    #[test]
    fn wet_noodle_ties_all_awarded() {
        // Dire prohrál; dva sledovaní mají stejný nejnižší damage
        let record = MatchBuilder::new(1)
            .friend(5, FRIEND_A, |p| p.hero_damage(900))
            .friend(6, FRIEND_B, |p| p.hero_damage(900))
            .friend(7, FRIEND_C, |p| p.hero_damage(901))
            .build();
        let eval = run(&record, &mut StreakBook::new());
        assert_eq!(points_of(&eval, FRIEND_A, WET_NOODLE), Some(3));
        assert_eq!(points_of(&eval, FRIEND_B, WET_NOODLE), Some(3));
        assert_eq!(points_of(&eval, FRIEND_C, WET_NOODLE), None);
    }

    #[test]
    fn wet_noodle_counts_untracked_losers() {
        let record = MatchBuilder::new(1)
            .friend(5, FRIEND_A, |p| p.hero_damage(900))
            .player(9, |p| p.hero_damage(100))
            .build();
        let eval = run(&record, &mut StreakBook::new());
        assert_eq!(points_of(&eval, FRIEND_A, WET_NOODLE), None);
    }

    #[test]
    fn disaster_duo_needs_two_zero_kill_losers() {
        let record = MatchBuilder::new(1)
            .friend(5, FRIEND_A, |p| p.kills(0))
            .friend(6, FRIEND_B, |p| p.kills(0))
            .friend(7, FRIEND_C, |p| p.kills(1))
            .friend(0, FRIEND_D, |p| p.kills(0))
            .build();
        let eval = run(&record, &mut StreakBook::new());
        assert_eq!(points_of(&eval, FRIEND_A, DISASTER_DUO), Some(30));
        assert_eq!(points_of(&eval, FRIEND_B, DISASTER_DUO), Some(30));
        assert_eq!(points_of(&eval, FRIEND_C, DISASTER_DUO), None);
        // vítěz s nulou killů se nepočítá
        assert_eq!(points_of(&eval, FRIEND_D, DISASTER_DUO), None);
        assert_eq!(eval.triggers.iter().filter(|t| t.name == DISASTER_DUO).count(), 2);

        let record = MatchBuilder::new(2).friend(5, FRIEND_A, |p| p.kills(0)).build();
        let eval = run(&record, &mut StreakBook::new());
        assert_eq!(points_of(&eval, FRIEND_A, DISASTER_DUO), None);
    }

    #[test]
    fn trigger_carries_display_fields() {
        let record = MatchBuilder::new(42)
            .friend(0, FRIEND_A, |p| p.hero(14).kills(3).deaths(4).assists(5).hero_damage(12345))
            .build();
        let eval = run(&record, &mut StreakBook::new());
        let t = &eval.triggers[0];
        assert_eq!(t.match_id, 42);
        assert_eq!(t.hero, "Pudge");
        assert_eq!(t.kda, "3/4/5");
        assert_eq!(t.damage, 12345);
    }

    #[test]
    fn per_player_order_rewards_then_penalties_then_team() {
        let record = MatchBuilder::new(1)
            .duration(1200)
            .friend(5, FRIEND_A, |p| p.kills(0).assists(0).tower_damage(0).hero_damage(1).party_size(5))
            .friend(6, FRIEND_B, |p| p.kills(0))
            .build();
        let eval = run(&record, &mut StreakBook::new());
        assert_eq!(
            names(&eval, FRIEND_A),
            vec![STACK_LOSS, LOW_TOWER, ZERO_KILL, FAST_LOSS, WET_NOODLE, DISASTER_DUO]
                .into_iter()
                .map(String::from)
                .collect::<Vec<_>>()
        );
    }
}
