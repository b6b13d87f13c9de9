//! OpenDota client — zdroj zápasů pro challenge tracker
//!
//! - `/players/{id}/matches?limit&offset` → match id po cutoff datu
//! - `/matches/{id}`                     → celý zápas
//!
//! Každý request: pacing přes governor, pak retry s backoffem:
//!   timeout / connect / 5xx → min(10, 2^attempt) s
//!   429                     → min(30, 5·(attempt+1)) s
//!   404                     → hned konec, žádný retry
//!   rozbitý JSON / jiné 4xx → konec pro tento call
//! Po vyčerpání pokusů se vrací prázdno; volající to bere jako "ještě ne".

use anyhow::{Context, Result};
use challenge_engine::MatchRecord;
use chrono::{DateTime, Utc};
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use reqwest::StatusCode;
use serde::Deserialize;
use std::future::Future;
use std::time::Duration;
use tracing::{debug, info, warn};

pub const DEFAULT_BASE_URL: &str = "https://api.opendota.com/api";
const USER_AGENT: &str = "ChallengeChecker/1.0";

#[derive(Debug, Clone)]
pub struct ClientSettings {
    pub base_url:        String,
    /// Zápasy starší než tohle se ignorují
    pub check_from:      DateTime<Utc>,
    pub api_delay:       Duration,
    pub request_timeout: Duration,
    pub connect_timeout: Duration,
    pub retry:           RetryPolicy,
}

// ── Retry policy ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries:          u32,
    pub transient_cap_secs:   u64,
    pub rate_limit_step_secs: u64,
    pub rate_limit_cap_secs:  u64,
    /// Jednotka, kterou se násobí sekundy (v testech nula)
    pub unit:                 Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            transient_cap_secs: 10,
            rate_limit_step_secs: 5,
            rate_limit_cap_secs: 30,
            unit: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    pub fn with_max_retries(max_retries: u32) -> Self {
        Self { max_retries, ..Self::default() }
    }

    /// 1s, 2s, 4s, 8s, 10s, 10s...
    pub fn transient_delay(&self, attempt: u32) -> Duration {
        let secs = 2u64.checked_pow(attempt).unwrap_or(u64::MAX).min(self.transient_cap_secs);
        self.unit * secs as u32
    }

    /// 5s, 10s, 15s... max 30s
    pub fn rate_limit_delay(&self, attempt: u32) -> Duration {
        let secs = (self.rate_limit_step_secs * (u64::from(attempt) + 1)).min(self.rate_limit_cap_secs);
        self.unit * secs as u32
    }
}

/// Výsledek jednoho HTTP pokusu.
#[derive(Debug)]
pub enum Attempt<T> {
    Done(T),
    NotFound,
    RateLimited,
    /// timeout, connection reset, 5xx
    Transient(String),
    /// špatný tvar odpovědi nebo jiné 4xx, opakovat nemá smysl
    Failed(String),
}

/// Pustí `op` až `max_retries`-krát. `None` = nic (404, fail, vyčerpané pokusy).
pub async fn with_retries<T, F, Fut>(
    policy: &RetryPolicy,
    limiter: Option<&DefaultDirectRateLimiter>,
    what: &str,
    mut op: F,
) -> Option<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Attempt<T>>,
{
    for attempt in 0..policy.max_retries {
        if let Some(limiter) = limiter {
            limiter.until_ready().await;
        }
        let wait = match op().await {
            Attempt::Done(value) => return Some(value),
            Attempt::NotFound => {
                warn!("{} not found (deleted/private)", what);
                return None;
            }
            Attempt::Failed(msg) => {
                warn!("{} failed: {}", what, msg);
                return None;
            }
            Attempt::RateLimited => {
                let wait = policy.rate_limit_delay(attempt);
                warn!("Rate limited on {}, waiting {:?}...", what, wait);
                wait
            }
            Attempt::Transient(msg) => {
                let wait = policy.transient_delay(attempt);
                warn!(
                    "{} for {} (attempt {}/{}), waiting {:?}...",
                    msg, what, attempt + 1, policy.max_retries, wait
                );
                wait
            }
        };
        if attempt + 1 < policy.max_retries {
            tokio::time::sleep(wait).await;
        }
    }
    warn!("Giving up on {} after {} attempts", what, policy.max_retries);
    None
}

// ── Response parsing ──────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct RecentMatch {
    match_id:   Option<u64>,
    start_time: Option<i64>,
}

/// Seznam match id z `/players/{id}/matches`, jen ty od `check_from` dál.
pub fn parse_recent_matches(body: &str, check_from: DateTime<Utc>) -> Result<Vec<u64>> {
    let rows: Vec<RecentMatch> = serde_json::from_str(body).context("unexpected response format (expected a list)")?;
    let cutoff = check_from.timestamp();
    Ok(rows
        .into_iter()
        .filter(|m| m.start_time.unwrap_or(0) >= cutoff)
        .filter_map(|m| m.match_id)
        .collect())
}

pub fn parse_match(body: &str) -> Result<MatchRecord> {
    serde_json::from_str(body).context("unexpected match format")
}

pub fn classify_status(status: StatusCode) -> Option<Attempt<()>> {
    if status == StatusCode::TOO_MANY_REQUESTS {
        Some(Attempt::RateLimited)
    } else if status == StatusCode::NOT_FOUND {
        Some(Attempt::NotFound)
    } else if status.is_server_error() {
        Some(Attempt::Transient(format!("HTTP {status}")))
    } else if !status.is_success() {
        Some(Attempt::Failed(format!("HTTP {status}")))
    } else {
        None
    }
}

fn classify_error(e: &reqwest::Error) -> Attempt<String> {
    if e.is_timeout() {
        Attempt::Transient("Timeout".to_string())
    } else if e.is_connect() {
        Attempt::Transient("Connection error".to_string())
    } else {
        Attempt::Transient(format!("Request error: {e}"))
    }
}

// ── Client ────────────────────────────────────────────────────────────────────

pub struct OpenDotaClient {
    client:   reqwest::Client,
    settings: ClientSettings,
    limiter:  Option<DefaultDirectRateLimiter>,
}

impl OpenDotaClient {
    pub fn new(settings: ClientSettings) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(settings.request_timeout)
            .connect_timeout(settings.connect_timeout)
            .build()
            .context("failed to create reqwest client")?;

        // OpenDota free tier: < 1 req/s
        let limiter = Quota::with_period(settings.api_delay).map(RateLimiter::direct);

        info!(
            "OpenDota client ready: base={} cutoff={} pacing={:?}",
            settings.base_url,
            settings.check_from.format("%Y-%m-%d"),
            settings.api_delay
        );

        Ok(Self { client, settings, limiter })
    }

    pub fn check_from(&self) -> DateTime<Utc> {
        self.settings.check_from
    }

    /// GET → status klasifikace → body text
    async fn get_body(&self, url: &str) -> Attempt<String> {
        let resp = match self.client.get(url).send().await {
            Ok(r) => r,
            Err(e) => return classify_error(&e),
        };
        match classify_status(resp.status()) {
            Some(Attempt::RateLimited) => return Attempt::RateLimited,
            Some(Attempt::NotFound) => return Attempt::NotFound,
            Some(Attempt::Transient(msg)) => return Attempt::Transient(msg),
            Some(Attempt::Failed(msg)) => return Attempt::Failed(msg),
            Some(Attempt::Done(())) | None => {}
        }
        match resp.text().await {
            Ok(body) => Attempt::Done(body),
            Err(e) => classify_error(&e),
        }
    }

    /// Recent match ids hráče po cutoff datu. Při chybě prázdný seznam.
    pub async fn fetch_recent_match_ids(&self, account_id: u32, limit: u32, offset: u32) -> Vec<u64> {
        let url = format!(
            "{}/players/{}/matches?limit={}&offset={}",
            self.settings.base_url, account_id, limit, offset
        );
        let what = format!("matches of {account_id} (offset {offset})");
        let check_from = self.settings.check_from;
        let (this, url) = (self, url.as_str());

        let ids = with_retries(&self.settings.retry, self.limiter.as_ref(), &what, || async move {
            match this.get_body(url).await {
                Attempt::Done(body) => match parse_recent_matches(&body, check_from) {
                    Ok(ids) => Attempt::Done(ids),
                    Err(e) => Attempt::Failed(format!("{e:#}")),
                },
                Attempt::NotFound => Attempt::NotFound,
                Attempt::RateLimited => Attempt::RateLimited,
                Attempt::Transient(msg) => Attempt::Transient(msg),
                Attempt::Failed(msg) => Attempt::Failed(msg),
            }
        })
        .await
        .unwrap_or_default();

        debug!("{}: {} match ids after cutoff", what, ids.len());
        ids
    }

    /// Celý zápas, nebo `None` (404, rozbitá odpověď, vyčerpané pokusy).
    pub async fn fetch_full_match(&self, match_id: u64) -> Option<MatchRecord> {
        let url = format!("{}/matches/{}", self.settings.base_url, match_id);
        let what = format!("match {match_id}");
        let (this, url) = (self, url.as_str());

        with_retries(&self.settings.retry, self.limiter.as_ref(), &what, || async move {
            match this.get_body(url).await {
                Attempt::Done(body) => match parse_match(&body) {
                    Ok(record) => Attempt::Done(record),
                    Err(e) => Attempt::Failed(format!("{e:#}")),
                },
                Attempt::NotFound => Attempt::NotFound,
                Attempt::RateLimited => Attempt::RateLimited,
                Attempt::Transient(msg) => Attempt::Transient(msg),
                Attempt::Failed(msg) => Attempt::Failed(msg),
            }
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::cell::Cell;

    fn instant_policy(max_retries: u32) -> RetryPolicy {
        RetryPolicy { max_retries, unit: Duration::ZERO, ..RetryPolicy::default() }
    }

    #[test]
    fn transient_backoff_is_capped_exponential() {
        let p = RetryPolicy::default();
        let secs: Vec<u64> = (0..6).map(|a| p.transient_delay(a).as_secs()).collect();
        assert_eq!(secs, vec![1, 2, 4, 8, 10, 10]);
        assert_eq!(p.transient_delay(70).as_secs(), 10);
    }

    #[test]
    fn rate_limit_backoff_is_linear_and_capped() {
        let p = RetryPolicy::default();
        let secs: Vec<u64> = (0..7).map(|a| p.rate_limit_delay(a).as_secs()).collect();
        assert_eq!(secs, vec![5, 10, 15, 20, 25, 30, 30]);
    }

    #[test]
    fn status_classification() {
        assert!(matches!(classify_status(StatusCode::TOO_MANY_REQUESTS), Some(Attempt::RateLimited)));
        assert!(matches!(classify_status(StatusCode::NOT_FOUND), Some(Attempt::NotFound)));
        assert!(matches!(classify_status(StatusCode::BAD_GATEWAY), Some(Attempt::Transient(_))));
        assert!(matches!(classify_status(StatusCode::FORBIDDEN), Some(Attempt::Failed(_))));
        assert!(classify_status(StatusCode::OK).is_none());
    }

    #[test]
    fn recent_matches_filtered_by_cutoff() {
        let cutoff = Utc.with_ymd_and_hms(2026, 1, 16, 0, 0, 0).unwrap();
        let body = format!(
            r#"[{{"match_id": 3, "start_time": {}}}, {{"match_id": 2, "start_time": {}}}, {{"match_id": 1, "start_time": {}}}]"#,
            cutoff.timestamp() + 60,
            cutoff.timestamp(),
            cutoff.timestamp() - 1
        );
        assert_eq!(parse_recent_matches(&body, cutoff).unwrap(), vec![3, 2]);
    }

    #[test]
    fn recent_matches_rejects_non_list() {
        let cutoff = Utc::now();
        assert!(parse_recent_matches(r#"{"error": "rate limit"}"#, cutoff).is_err());
    }

    #[test]
    fn malformed_match_is_error() {
        assert!(parse_match(r#"{"match_id": "abc"}"#).is_err());
        assert_eq!(parse_match(r#"{"match_id": 77}"#).unwrap().match_id, Some(77));
    }

    #[tokio::test]
    async fn retries_transient_then_succeeds() {
        let calls = Cell::new(0);
        let out = with_retries(&instant_policy(3), None, "test", || {
            calls.set(calls.get() + 1);
            let n = calls.get();
            async move {
                if n < 3 { Attempt::Transient("Timeout".into()) } else { Attempt::Done(n) }
            }
        })
        .await;
        assert_eq!(out, Some(3));
        assert_eq!(calls.get(), 3);
    }

    #[tokio::test]
    async fn not_found_aborts_immediately() {
        let calls = Cell::new(0);
        let out: Option<()> = with_retries(&instant_policy(5), None, "test", || {
            calls.set(calls.get() + 1);
            async { Attempt::NotFound }
        })
        .await;
        assert_eq!(out, None);
        assert_eq!(calls.get(), 1);
    }

    #[tokio::test]
    async fn rate_limit_exhausts_retries() {
        let calls = Cell::new(0);
        let out: Option<()> = with_retries(&instant_policy(4), None, "test", || {
            calls.set(calls.get() + 1);
            async { Attempt::RateLimited }
        })
        .await;
        assert_eq!(out, None);
        assert_eq!(calls.get(), 4);
    }
}
