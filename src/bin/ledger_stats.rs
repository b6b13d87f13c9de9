use anyhow::{bail, Result};
use dotenv::dotenv;
use ledger::Ledger;
use std::path::Path;

const RECENT_DAYS: usize = 3;

fn main() -> Result<()> {
    dotenv().ok();
    let store_path = std::env::var("STORE_FILE").unwrap_or_else(|_| "store.json".to_string());
    if !Path::new(&store_path).exists() {
        bail!("no store at {store_path}");
    }
    let ledger = Ledger::load(&store_path);

    println!("store_path={store_path}");
    println!("checked_matches: {}", ledger.checked_matches.len());
    println!("unparsed_matches: {}", ledger.unparsed_matches.len());
    for (id, entry) in &ledger.unparsed_matches {
        println!(
            "  {id}: retries={} first_seen={} reason={}",
            entry.retries,
            entry.first_seen.format("%Y-%m-%d %H:%M"),
            entry.reason
        );
    }

    println!("leaderboard:");
    for (rank, (account_id, entry)) in ledger.standings().into_iter().enumerate() {
        println!(
            "  {:>2}. {:<20} {:>+6} pts  matches={} id={account_id}",
            rank + 1,
            entry.name,
            entry.total_points,
            entry.matches.len()
        );
    }

    for (date, totals) in ledger.daily.iter().rev().take(RECENT_DAYS) {
        let line: Vec<String> = totals
            .iter()
            .map(|(id, pts)| {
                let name = ledger.leaderboard.get(id).map(|e| e.name.as_str()).unwrap_or("?");
                format!("{name}={pts:+}")
            })
            .collect();
        println!("daily {date}: {}", line.join(" "));
    }

    if ledger.privacy_issues.is_empty() {
        println!("privacy_issues: <none>");
    } else {
        for (id, issue) in &ledger.privacy_issues {
            println!("privacy {id} {}: {}", issue.name, issue.reason);
        }
    }

    Ok(())
}
