/// Privacy sweep — kdo z rosteru má vypnuté "Expose Public Match Data"?
///
/// Výsledek jde do `privacy_issues` ve store a jedna souhrnná zpráva na Discord.
///
/// Spuštění:
///   cargo run --bin privacy-check

use anyhow::Result;
use challenge_engine::ChallengeContext;
use dotenv::dotenv;
use ledger::Ledger;
use logger::{DiscordWebhook, EventLogger};
use match_pipeline::{check_roster_privacy, Settings};
use opendota_client::OpenDotaClient;
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
            warn!("A challenge run is in progress, try the privacy check later.");
            return Ok(());
        }
    };

    if let Err(e) = run(&settings).await {
        error!("Privacy check failed: {:#}", e);
    }
    Ok(())
}

async fn run(settings: &Settings) -> Result<()> {
    let ctx = ChallengeContext::load(&settings.roster_file, &settings.heroes_file)?;
    let client = OpenDotaClient::new(settings.client_settings())?;
    let notifier = DiscordWebhook::new(settings.discord_webhook.clone(), settings.debug_mode);
    let events = EventLogger::new(&settings.log_dir);
    let mut ledger = Ledger::load(&settings.store_file);

    info!("=== Privacy check: {} players ===", ctx.roster.len());
    let issues = check_roster_privacy(&client, &notifier, &ctx, &mut ledger, &events).await;
    ledger.save(&settings.store_file)?;

    info!("{} of {} players have privacy issues", issues.len(), ctx.roster.len());
    Ok(())
}
