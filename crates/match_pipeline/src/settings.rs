//! Konfigurace runu z env (.env načítá binárka přes dotenv).

use anyhow::{bail, Context, Result};
use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use opendota_client::{ClientSettings, RetryPolicy, DEFAULT_BASE_URL};
use std::env;
use std::fs::{self, File};
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_CHECK_FROM: &str = "2026-01-16";

#[derive(Debug, Clone)]
pub struct Settings {
    pub store_file:             PathBuf,
    pub roster_file:            PathBuf,
    pub heroes_file:            PathBuf,
    pub log_dir:                PathBuf,
    pub check_from:             DateTime<Utc>,
    pub end_date:               Option<DateTime<Utc>>,
    pub discord_webhook:        Option<String>,
    pub debug_mode:             bool,
    pub batch_size:             u32,
    pub base_url:               String,
    pub api_delay:              Duration,
    pub max_retries:            u32,
    pub request_timeout:        Duration,
    pub connect_timeout:        Duration,
    pub checkpoint_every_match: bool,
}

impl Settings {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// `lookup` vrací hodnotu klíče, pokud je nastavený.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let num = |key: &str, default: u64| get(key).and_then(|v| v.parse::<u64>().ok()).unwrap_or(default);
        let flag = |key: &str, default: bool| get(key).map(|v| parse_flag(&v)).unwrap_or(default);
        let path = |key: &str, default: &str| PathBuf::from(get(key).unwrap_or_else(|| default.to_string()));

        let check_from = parse_date(&get("CHECK_FROM_DATE").unwrap_or_else(|| DEFAULT_CHECK_FROM.to_string()))
            .context("CHECK_FROM_DATE")?;
        let end_date = get("CHALLENGE_END_DATE")
            .map(|v| parse_date(&v))
            .transpose()
            .context("CHALLENGE_END_DATE")?;

        Ok(Self {
            store_file: path("STORE_FILE", "store.json"),
            roster_file: path("ROSTER_FILE", "steam_names.json"),
            heroes_file: path("HEROES_FILE", "heroes.json"),
            log_dir: path("LOG_DIR", "logs"),
            check_from,
            end_date,
            discord_webhook: get("DISCORD_WEBHOOK"),
            debug_mode: flag("DEBUG_MODE", false),
            batch_size: num("BATCH_SIZE", 20).clamp(1, 100) as u32,
            base_url: get("OPENDOTA_BASE_URL")
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
                .trim_end_matches('/')
                .to_string(),
            api_delay: Duration::from_millis(num("API_DELAY_MS", 500)),
            max_retries: num("MAX_RETRIES", 3).max(1) as u32,
            request_timeout: Duration::from_secs(num("REQUEST_TIMEOUT_SECS", 20)),
            connect_timeout: Duration::from_secs(num("CONNECT_TIMEOUT_SECS", 10)),
            checkpoint_every_match: flag("CHECKPOINT_EVERY_MATCH", true),
        })
    }

    pub fn client_settings(&self) -> ClientSettings {
        ClientSettings {
            base_url: self.base_url.clone(),
            check_from: self.check_from,
            api_delay: self.api_delay,
            request_timeout: self.request_timeout,
            connect_timeout: self.connect_timeout,
            retry: RetryPolicy::with_max_retries(self.max_retries),
        }
    }

    /// `store.json` → `store.json.lock`
    pub fn lock_path(&self) -> PathBuf {
        let mut raw = self.store_file.clone().into_os_string();
        raw.push(".lock");
        PathBuf::from(raw)
    }

    /// Otevře lock soubor vedle store, adresář založí, pokud chybí.
    pub fn create_lock_file(&self) -> Result<File> {
        let path = self.lock_path();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).with_context(|| format!("create {}", parent.display()))?;
        }
        File::create(&path).with_context(|| format!("create lock file {}", path.display()))
    }

    pub fn season_over(&self, now: DateTime<Utc>) -> bool {
        self.end_date.is_some_and(|end| now >= end)
    }
}

fn parse_flag(raw: &str) -> bool {
    matches!(raw.to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on")
}

/// RFC3339 nebo holé `YYYY-MM-DD` (= půlnoc UTC).
pub fn parse_date(raw: &str) -> Result<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(dt.with_timezone(&Utc));
    }
    if let Ok(day) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        if let Some(midnight) = day.and_hms_opt(0, 0, 0) {
            return Ok(Utc.from_utc_datetime(&midnight));
        }
    }
    bail!("invalid date {:?} (expected YYYY-MM-DD or RFC3339)", raw)
}
