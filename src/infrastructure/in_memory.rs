use crate::domain::ports::{CampaignUpdater, CorrelationStore};
use crate::error::Result;
use async_trait::async_trait;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// A thread-safe in-memory correlation store.
///
/// Nothing survives a restart, so an interrupted flow can only be resumed within
/// the same process. Used for tests and when no database path is configured.
#[derive(Default, Clone)]
pub struct InMemoryCorrelationStore {
    entries: Arc<RwLock<HashMap<String, String>>>,
}

impl InMemoryCorrelationStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CorrelationStore for InMemoryCorrelationStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let entries = self.entries.read().await;
        Ok(entries.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut entries = self.entries.write().await;
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        let mut entries = self.entries.write().await;
        entries.remove(key);
        Ok(())
    }
}

/// Running totals per campaign, kept up to date as donations settle.
///
/// Clones share the same totals.
#[derive(Default, Clone)]
pub struct InMemoryCampaignTotals {
    totals: Arc<RwLock<HashMap<String, Decimal>>>,
}

impl InMemoryCampaignTotals {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds the known raised amount of a campaign.
    pub async fn seed(&self, campaign_id: &str, raised: Decimal) {
        self.totals
            .write()
            .await
            .insert(campaign_id.to_string(), raised);
    }

    pub async fn total(&self, campaign_id: &str) -> Option<Decimal> {
        self.totals.read().await.get(campaign_id).copied()
    }
}

#[async_trait]
impl CampaignUpdater for InMemoryCampaignTotals {
    async fn update_campaign_amount(&self, campaign_id: &str, amount: Decimal) -> Result<()> {
        let mut totals = self.totals.write().await;
        *totals.entry(campaign_id.to_string()).or_default() += amount;
        Ok(())
    }
}
