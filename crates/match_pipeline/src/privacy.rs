//! Privacy sweep — je každý hráč z rosteru vidět ve svém posledním zápase?
//!
//! Steam "Expose Public Match Data" vypnuté = OpenDota zápas má, ale
//! account_id hráče v něm chybí. Takové zápasy by gate věčně odkládala.

use crate::source::{MatchSource, Notifier};
use challenge_engine::{format_privacy_summary, ChallengeContext};
use chrono::Utc;
use ledger::Ledger;
use logger::{now_iso, EventLogger, PrivacyIssueEvent};
use tracing::{info, warn};

/// Projde roster, přepíše `ledger.privacy_issues` a pošle souhrn.
/// Vrací `(account_id, jméno, důvod)` nalezených problémů.
pub async fn check_roster_privacy<S: MatchSource, N: Notifier>(
    source: &S,
    notifier: &N,
    ctx: &ChallengeContext,
    ledger: &mut Ledger,
    events: &EventLogger,
) -> Vec<(u32, String, String)> {
    let mut issues = Vec::new();

    for (account_id, name) in ctx.roster.iter() {
        match visibility_problem(source, account_id).await {
            None => {
                info!("✅ {} ({}) is visible", name, account_id);
                ledger.clear_privacy_issue(account_id);
            }
            Some(reason) => {
                warn!("🔒 {} ({}): {}", name, account_id, reason);
                ledger.record_privacy_issue(account_id, name, &reason, Utc::now());
                let _ = events.log(&PrivacyIssueEvent {
                    ts: now_iso(),
                    event: "PRIVACY_ISSUE",
                    account_id,
                    name: name.to_string(),
                    reason: reason.clone(),
                });
                issues.push((account_id, name.to_string(), reason));
            }
        }
    }

    let summary: Vec<(String, String)> = issues.iter().map(|(_, n, r)| (n.clone(), r.clone())).collect();
    match format_privacy_summary(&summary) {
        Some(message) => notifier.send(&message).await,
        None => info!("No privacy issues detected"),
    }
    issues
}

async fn visibility_problem<S: MatchSource>(source: &S, account_id: u32) -> Option<String> {
    let Some(&latest) = source.fetch_recent_match_ids(account_id, 1, 0).await.first() else {
        return Some("No matches visible / private profile".to_string());
    };
    let Some(record) = source.fetch_full_match(latest).await else {
        return Some(format!("Latest match {latest} could not be fetched"));
    };
    if record.players().iter().any(|p| p.account_id == Some(account_id)) {
        None
    } else {
        Some(format!("Hidden in match {latest} (Expose Public Match Data disabled)"))
    }
}
