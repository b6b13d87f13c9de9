//! Challenge Engine — pravidla bodování zápasů
//!
//! Čistá logika bez sítě a bez disku (kromě načtení rosteru a hero tabulky):
//!   1. `model`   — tvar zápasu tak, jak ho vrací OpenDota `/matches/{id}`
//!   2. `context` — roster sledovaných hráčů + hero-id → jméno
//!   3. `gate`    — je zápas dost naparsovaný, abychom ho mohli bodovat?
//!   4. `rules`   — challenge pravidla, streaky, team pravidla
//!   5. `format`  — text notifikací

pub mod context;
pub mod format;
pub mod gate;
pub mod model;
pub mod rules;

pub use context::{ChallengeContext, HeroNames, Roster};
pub use format::{format_player_message, format_privacy_summary};
pub use gate::{assess, DeferReason, ReadyMatch, Readiness, TrackedPlayer};
pub use model::{MatchRecord, PlayerRecord, Side};
pub use rules::{evaluate, Evaluation, MatchResult, PlayerLine, StreakBook, StreakState, Trigger};

#[cfg(any(test, feature = "fixtures"))]
pub mod fixtures;
