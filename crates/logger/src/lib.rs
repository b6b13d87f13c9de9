//! Challenge Tracker — Logger
//! JSONL event stream, Discord webhook alerts

use anyhow::Result;
use chrono::Utc;
use serde::Serialize;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;

pub struct EventLogger {
    log_dir: PathBuf,
}

impl EventLogger {
    pub fn new(log_dir: impl Into<PathBuf>) -> Self {
        let dir = log_dir.into();
        fs::create_dir_all(&dir).ok();
        Self { log_dir: dir }
    }

    pub fn log<T: Serialize>(&self, event: &T) -> Result<()> {
        let date  = Utc::now().format("%Y-%m-%d").to_string();
        let path  = self.log_dir.join(format!("{date}.jsonl"));
        let line  = serde_json::to_string(event)?;
        let mut f = OpenOptions::new().create(true).append(true).open(&path)?;
        writeln!(f, "{line}")?;
        Ok(())
    }
}

pub fn now_iso() -> String {
    Utc::now().to_rfc3339()
}

// ── Event typy ────────────────────────────────────────────────────────────────

#[derive(Serialize, Debug)]
pub struct MatchScoredEvent {
    pub ts:           String,
    pub event:        &'static str,   // "MATCH_SCORED"
    pub match_id:     u64,
    pub match_start:  String,
    pub friends:      Vec<String>,
    pub triggers:     usize,
    pub total_points: i64,
}

#[derive(Serialize, Debug)]
pub struct MatchDeferredEvent {
    pub ts:              String,
    pub event:           &'static str,   // "MATCH_DEFERRED"
    pub match_id:        u64,
    pub reason:          String,
    pub expected_player: Option<u32>,
    pub retries:         u32,
    pub privacy:         bool,
}

#[derive(Serialize, Debug)]
pub struct MatchUnavailableEvent {
    pub ts:       String,
    pub event:    &'static str,   // "MATCH_UNAVAILABLE"
    pub match_id: u64,
}

#[derive(Serialize, Debug)]
pub struct RunSummaryEvent {
    pub ts:                String,
    pub event:             &'static str,   // "RUN_SUMMARY"
    pub mode:              String,         // "roster" | "single"
    pub processed_this_run: usize,
    pub scored_this_run:   usize,
    pub deferred_this_run: usize,
    pub total_checked:     usize,
    pub waiting_for_parse: usize,
    pub top:               Vec<String>,    // "Name: +12 pts"
}

#[derive(Serialize, Debug)]
pub struct PrivacyIssueEvent {
    pub ts:         String,
    pub event:      &'static str,   // "PRIVACY_ISSUE"
    pub account_id: u32,
    pub name:       String,
    pub reason:     String,
}

// ── Discord ───────────────────────────────────────────────────────────────────

const DISCORD_ATTEMPTS: usize = 3;
const DISCORD_RETRY_DELAY: Duration = Duration::from_secs(2);

/// Best-effort Discord webhook. Chyby se jen logují.
///
/// Bez webhooku nebo v debug módu se zpráva jen vypíše do logu.
pub struct DiscordWebhook {
    client:      reqwest::Client,
    webhook_url: Option<String>,
    debug_mode:  bool,
}

impl DiscordWebhook {
    pub fn new(webhook_url: Option<String>, debug_mode: bool) -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(Duration::from_secs(10))
                .build()
                .unwrap_or_else(|_| reqwest::Client::new()),
            webhook_url: webhook_url.filter(|u| !u.trim().is_empty()),
            debug_mode,
        }
    }

    pub fn is_live(&self) -> bool {
        self.webhook_url.is_some() && !self.debug_mode
    }

    pub async fn send(&self, message: &str) {
        tracing::info!("DISCORD MESSAGE:\n{}", message);

        let url = match &self.webhook_url {
            Some(url) if !self.debug_mode => url,
            _ => {
                tracing::info!("Skipping actual Discord send (no webhook or debug mode)");
                return;
            }
        };

        let body = serde_json::json!({ "content": message });
        for attempt in 1..=DISCORD_ATTEMPTS {
            let result = self
                .client
                .post(url)
                .json(&body)
                .send()
                .await
                .and_then(|r| r.error_for_status());
            match result {
                Ok(_) => {
                    tracing::debug!("Discord sent (attempt {})", attempt);
                    return;
                }
                Err(e) if attempt == DISCORD_ATTEMPTS => {
                    tracing::warn!("Discord send failed after {} attempts: {}", attempt, e);
                }
                Err(e) => {
                    tracing::debug!("Discord send attempt {} failed: {}", attempt, e);
                    tokio::time::sleep(DISCORD_RETRY_DELAY).await;
                }
            }
        }
    }
}
