/// Dota Challenge Tracker — challenge check
///
/// Co dělá:
///   1. Zkusí znovu zápasy, které minule čekaly na OpenDota parse
///   2. Projde historii všech hráčů z rosteru (po stránkách, od CHECK_FROM_DATE)
///   3. Každý nový zápas: readiness gate → challenge pravidla → ledger
///   4. Discord zpráva za každého hráče, který v zápase něco získal
///
/// Spuštění:
///   cargo run --bin challenge-check              # celý roster
///   cargo run --bin challenge-check -- 8123456789  # jeden zápas (test)

use anyhow::Result;
use challenge_engine::ChallengeContext;
use chrono::Utc;
use dotenv::dotenv;
use ledger::Ledger;
use logger::DiscordWebhook;
use match_pipeline::{MatchPipeline, PipelineConfig, Settings};
use opendota_client::OpenDotaClient;
use std::env;
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, fmt};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    dotenv().ok();

    fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info"))
        )
        .init();

    let settings = match Settings::from_env() {
        Ok(s) => s,
        Err(e) => {
            error!("Invalid configuration: {:#}", e);
            return Ok(());
        }
    };

    if settings.season_over(Utc::now()) {
        info!("Challenge period is over, nothing to check.");
        return Ok(());
    }

    let single_match = match env::args().nth(1) {
        None => None,
        Some(raw) => match raw.trim().parse::<u64>() {
            Ok(id) => Some(id),
            Err(_) => {
                error!("Invalid match id {:?} (expected a number)", raw);
                return Ok(());
            }
        },
    };

    info!("=== Dota Challenge Check ===");
    info!("Store: {}", settings.store_file.display());
    info!("Checking matches from {}", settings.check_from.format("%Y-%m-%d"));
    if settings.debug_mode {
        info!("DEBUG MODE: Discord messages are only logged");
    }

    // Single instance lock vedle store souboru
    let lock_file = match settings.create_lock_file() {
        Ok(f) => f,
        Err(e) => {
            warn!("Failed to create lock file: {:#}", e);
            return Ok(());
        }
    };

    let mut lock = fd_lock::RwLock::new(lock_file);
    let _write_guard = match lock.try_write() {
        Ok(guard) => guard,
        Err(_) => {
            warn!("Another challenge run is already using {}! Exiting.", settings.store_file.display());
            return Ok(());
        }
    };

    if let Err(e) = run(&settings, single_match).await {
        error!("Challenge check failed: {:#}", e);
    }
    Ok(())
}

async fn run(settings: &Settings, single_match: Option<u64>) -> Result<()> {
    let ctx = ChallengeContext::load(&settings.roster_file, &settings.heroes_file)?;
    let client = OpenDotaClient::new(settings.client_settings())?;
    let notifier = DiscordWebhook::new(settings.discord_webhook.clone(), settings.debug_mode);
    let ledger = Ledger::load(&settings.store_file);

    let mut pipeline = MatchPipeline::new(&client, &notifier, &ctx, ledger, PipelineConfig::from(settings));

    match single_match {
        Some(match_id) => {
            info!("Single match mode: {}", match_id);
            let outcome = pipeline.run_single(match_id).await?;
            info!("Match {} → {:?}", match_id, outcome);
        }
        None => {
            if ctx.roster.is_empty() {
                warn!("Roster is empty, only the unparsed queue will be retried");
            }
            pipeline.run_roster().await?;
        }
    }
    Ok(())
}
