//! Orchestrator — stavový automat jednoho zápasu + smyčka přes roster.
//!
//! ```text
//! Unseen ──fetch──► Unavailable              (run končí, store beze změny)
//!    │
//!    └──► Fetched ──gate──► Deferred         (unparsed, retries += 1)
//!                    └────► Ready ──rules──► Scored ──► ledger, checked, notify
//! ```
//! Zápas v `checked_matches` nebo už viděný v tomhle runu = AlreadyHandled.
//! Jen tohle brání dvojímu bodování a dvojímu posunu streaku.

use crate::source::{MatchSource, Notifier};
use anyhow::Result;
use challenge_engine::{
    assess, evaluate, format_player_message, format_privacy_summary, ChallengeContext, DeferReason, Readiness,
};
use chrono::Utc;
use ledger::Ledger;
use logger::{
    now_iso, EventLogger, MatchDeferredEvent, MatchScoredEvent, MatchUnavailableEvent, RunSummaryEvent,
};
use std::collections::{BTreeMap, HashSet};
use std::path::PathBuf;
use tracing::{debug, info, warn};

const TOP_PLAYERS: usize = 3;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchOutcome {
    AlreadyHandled,
    Unavailable,
    Deferred(DeferReason),
    Scored { triggers: usize, points: i64 },
}

#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub store_path:             PathBuf,
    pub log_dir:                PathBuf,
    pub batch_size:             u32,
    pub checkpoint_every_match: bool,
}

impl From<&crate::Settings> for PipelineConfig {
    fn from(s: &crate::Settings) -> Self {
        Self {
            store_path: s.store_file.clone(),
            log_dir: s.log_dir.clone(),
            batch_size: s.batch_size,
            checkpoint_every_match: s.checkpoint_every_match,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunReport {
    pub processed:         usize,
    pub scored:            usize,
    pub deferred:          usize,
    pub unavailable:       usize,
    pub total_checked:     usize,
    pub waiting_for_parse: usize,
    /// "Name: +12 pts"
    pub top:               Vec<String>,
}

pub struct MatchPipeline<'a, S, N> {
    source:   &'a S,
    notifier: &'a N,
    ctx:      &'a ChallengeContext,
    ledger:   Ledger,
    config:   PipelineConfig,
    events:   EventLogger,
    processed_this_run: HashSet<u64>,
    /// account_id → (jméno, důvod) hráčů odložených kvůli privacy
    privacy_deferred:   BTreeMap<u32, (String, String)>,
    report:   RunReport,
}

impl<'a, S: MatchSource, N: Notifier> MatchPipeline<'a, S, N> {
    pub fn new(source: &'a S, notifier: &'a N, ctx: &'a ChallengeContext, ledger: Ledger, config: PipelineConfig) -> Self {
        let events = EventLogger::new(&config.log_dir);
        Self {
            source,
            notifier,
            ctx,
            ledger,
            config,
            events,
            processed_this_run: HashSet::new(),
            privacy_deferred: BTreeMap::new(),
            report: RunReport::default(),
        }
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    pub fn into_ledger(self) -> Ledger {
        self.ledger
    }

    pub fn save(&self) -> Result<()> {
        self.ledger.save(&self.config.store_path)
    }

    fn checkpoint(&self) {
        if !self.config.checkpoint_every_match {
            return;
        }
        if let Err(e) = self.save() {
            warn!("Checkpoint save failed: {:#}", e);
        }
    }

    /// Jeden zápas celým automatem. Nikdy nepanikaří ani nevrací chybu.
    pub async fn process_match(&mut self, match_id: u64, expected: Option<u32>) -> MatchOutcome {
        if self.ledger.is_checked(match_id) || !self.processed_this_run.insert(match_id) {
            debug!(match_id, "already handled");
            return MatchOutcome::AlreadyHandled;
        }
        self.report.processed += 1;

        let Some(record) = self.source.fetch_full_match(match_id).await else {
            warn!(match_id, "could not fetch match, will retry next run");
            self.report.unavailable += 1;
            let _ = self.events.log(&MatchUnavailableEvent { ts: now_iso(), event: "MATCH_UNAVAILABLE", match_id });
            return MatchOutcome::Unavailable;
        };

        let ready = match assess(&record, expected, self.ctx) {
            Readiness::Ready(ready) => ready,
            Readiness::Deferred(reason) => {
                self.defer(match_id, expected, &reason);
                return MatchOutcome::Deferred(reason);
            }
        };

        let eval = evaluate(&ready, &mut self.ledger.streaks, self.ctx);
        self.ledger.record_scored(&eval);
        self.checkpoint();
        self.report.scored += 1;

        let points = eval.total_points();
        info!(
            match_id,
            friends = ?eval.friends_in_match(),
            triggers = eval.triggers.len(),
            points,
            "match scored"
        );
        let _ = self.events.log(&MatchScoredEvent {
            ts: now_iso(),
            event: "MATCH_SCORED",
            match_id,
            match_start: eval.match_time.to_rfc3339(),
            friends: eval.friends_in_match(),
            triggers: eval.triggers.len(),
            total_points: points,
        });

        for player in &eval.players {
            if let Some(message) = format_player_message(&player.name, &eval, player.account_id) {
                self.notifier.send(&message).await;
            }
        }

        MatchOutcome::Scored { triggers: eval.triggers.len(), points }
    }

    fn defer(&mut self, match_id: u64, expected: Option<u32>, reason: &DeferReason) {
        let text = reason.to_string();
        let retries = self.ledger.defer(match_id, &text, expected, Utc::now());
        self.report.deferred += 1;
        info!(match_id, retries, "deferred: {}", text);

        if let DeferReason::PrivateProfile { account_id, name } = reason {
            self.privacy_deferred.insert(*account_id, (name.clone(), text.clone()));
        }

        let _ = self.events.log(&MatchDeferredEvent {
            ts: now_iso(),
            event: "MATCH_DEFERRED",
            match_id,
            reason: text,
            expected_player: expected,
            retries,
            privacy: reason.is_privacy(),
        });
        self.checkpoint();
    }

    /// Historie jednoho hráče po stránkách, dokud stránka nepřinese nic nového.
    async fn scan_player(&mut self, account_id: u32, name: &str) {
        let limit = self.config.batch_size;
        let mut offset = 0;
        loop {
            let ids = self.source.fetch_recent_match_ids(account_id, limit, offset).await;
            let page_len = ids.len();
            let fresh: Vec<u64> = ids
                .into_iter()
                .filter(|id| !self.ledger.is_checked(*id) && !self.processed_this_run.contains(id))
                .collect();
            debug!(player = name, offset, page_len, fresh = fresh.len(), "history page");

            if fresh.is_empty() {
                break;
            }
            info!("Processing {} new matches for {} (offset {})", fresh.len(), name, offset);
            for match_id in fresh {
                self.process_match(match_id, Some(account_id)).await;
            }
            // kratší stránka = konec historie nebo cutoff
            if page_len < limit as usize {
                break;
            }
            offset += limit;
        }
    }

    /// Plný run: nejdřív unparsed fronta, pak historie všech hráčů z rosteru.
    pub async fn run_roster(&mut self) -> Result<RunReport> {
        let queue: Vec<(u64, Option<u32>)> = self
            .ledger
            .unparsed_matches
            .iter()
            .map(|(id, entry)| (*id, entry.expected_player))
            .collect();
        if !queue.is_empty() {
            info!("Retrying {} unparsed matches", queue.len());
        }
        for (match_id, expected) in queue {
            self.process_match(match_id, expected).await;
        }

        let ctx = self.ctx;
        for (account_id, name) in ctx.roster.iter() {
            self.scan_player(account_id, name).await;
        }

        self.save()?;
        self.send_privacy_summary().await;
        Ok(self.finish("roster"))
    }

    /// Jeden zápas mimo historii hráčů (ruční test).
    pub async fn run_single(&mut self, match_id: u64) -> Result<MatchOutcome> {
        let outcome = self.process_match(match_id, None).await;
        self.save()?;
        self.finish("single");
        Ok(outcome)
    }

    async fn send_privacy_summary(&self) {
        let issues: Vec<(String, String)> = self.privacy_deferred.values().cloned().collect();
        if let Some(message) = format_privacy_summary(&issues) {
            self.notifier.send(&message).await;
        }
    }

    fn finish(&mut self, mode: &str) -> RunReport {
        self.report.total_checked = self.ledger.checked_matches.len();
        self.report.waiting_for_parse = self.ledger.unparsed_matches.len();
        self.report.top = self
            .ledger
            .standings()
            .into_iter()
            .take(TOP_PLAYERS)
            .map(|(_, entry)| format!("{}: {:+} pts", entry.name, entry.total_points))
            .collect();

        let r = &self.report;
        info!("=== Run summary ({}) ===", mode);
        info!("Matches processed this run: {} (scored {}, deferred {}, unavailable {})",
            r.processed, r.scored, r.deferred, r.unavailable);
        info!("Total matches checked: {}", r.total_checked);
        info!("Matches waiting for parse: {}", r.waiting_for_parse);
        for (rank, line) in r.top.iter().enumerate() {
            info!("  {}. {}", rank + 1, line);
        }

        let _ = self.events.log(&RunSummaryEvent {
            ts: now_iso(),
            event: "RUN_SUMMARY",
            mode: mode.to_string(),
            processed_this_run: r.processed,
            scored_this_run: r.scored,
            deferred_this_run: r.deferred,
            total_checked: r.total_checked,
            waiting_for_parse: r.waiting_for_parse,
            top: r.top.clone(),
        });

        self.report.clone()
    }
}
