//! Švy pipeline: odkud bereme zápasy a kam posíláme zprávy.
//! V produkci OpenDota + Discord, v testech in-memory fake.
#![allow(async_fn_in_trait)]

use challenge_engine::MatchRecord;
use logger::DiscordWebhook;
use opendota_client::OpenDotaClient;

pub trait MatchSource {
    /// Match id po cutoff datu, nejnovější první. Chyba = prázdný seznam.
    async fn fetch_recent_match_ids(&self, account_id: u32, limit: u32, offset: u32) -> Vec<u64>;

    /// `None` = not found nebo fetch selhal.
    async fn fetch_full_match(&self, match_id: u64) -> Option<MatchRecord>;
}

/// Best-effort, chyby jen logovat.
pub trait Notifier {
    async fn send(&self, message: &str);
}

impl MatchSource for OpenDotaClient {
    async fn fetch_recent_match_ids(&self, account_id: u32, limit: u32, offset: u32) -> Vec<u64> {
        OpenDotaClient::fetch_recent_match_ids(self, account_id, limit, offset).await
    }

    async fn fetch_full_match(&self, match_id: u64) -> Option<MatchRecord> {
        OpenDotaClient::fetch_full_match(self, match_id).await
    }
}

impl Notifier for DiscordWebhook {
    async fn send(&self, message: &str) {
        DiscordWebhook::send(self, message).await
    }
}
