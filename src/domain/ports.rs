use super::payment::{
    CorrelationRecord, DonationRecord, InitiateRequest, InitiationPayload, VerificationResponse,
};
use crate::error::Result;
use async_trait::async_trait;
use rust_decimal::Decimal;

/// Durable-store key holding the outstanding payment identifier.
pub const PIDX_KEY: &str = "donation_pidx";
/// Durable-store key holding the server-assigned donation id.
pub const DONATION_ID_KEY: &str = "pending_donation_id";

/// The donation backend, reached over HTTP in production.
#[async_trait]
pub trait DonationGateway: Send + Sync {
    async fn initiate(&self, request: &InitiateRequest) -> Result<InitiationPayload>;
    async fn verify(&self, pidx: &str) -> Result<VerificationResponse>;
    async fn my_donations(&self) -> Result<Vec<DonationRecord>>;
}

/// String key-value storage that survives a restart of the client.
#[async_trait]
pub trait CorrelationStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>>;
    async fn set(&self, key: &str, value: &str) -> Result<()>;
    async fn remove(&self, key: &str) -> Result<()>;

    /// Reads the outstanding correlation record, if a payment is in progress.
    async fn load_correlation(&self) -> Result<Option<CorrelationRecord>> {
        let Some(pidx) = self.get(PIDX_KEY).await? else {
            return Ok(None);
        };
        let donation_id = self.get(DONATION_ID_KEY).await?;
        Ok(Some(CorrelationRecord { pidx, donation_id }))
    }

    async fn save_correlation(&self, record: &CorrelationRecord) -> Result<()> {
        self.set(PIDX_KEY, &record.pidx).await?;
        match &record.donation_id {
            Some(id) => self.set(DONATION_ID_KEY, id).await,
            None => self.remove(DONATION_ID_KEY).await,
        }
    }

    async fn clear_correlation(&self) -> Result<()> {
        self.remove(PIDX_KEY).await?;
        self.remove(DONATION_ID_KEY).await
    }
}

/// Running campaign totals owned outside the coordinator.
#[async_trait]
pub trait CampaignUpdater: Send + Sync {
    async fn update_campaign_amount(&self, campaign_id: &str, amount: Decimal) -> Result<()>;
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
#[serde(tag = "redirect", rename_all = "snake_case")]
pub enum RedirectOutcome {
    Opened,
    /// The payment page could not be opened. The caller should offer the URL manually.
    Blocked { payment_url: String },
}

/// Opens the external payment page.
#[async_trait]
pub trait RedirectOpener: Send + Sync {
    async fn open(&self, url: &str) -> RedirectOutcome;
}

pub type DonationGatewayBox = Box<dyn DonationGateway>;
pub type CorrelationStoreBox = Box<dyn CorrelationStore>;
pub type CampaignUpdaterBox = Box<dyn CampaignUpdater>;
pub type RedirectOpenerBox = Box<dyn RedirectOpener>;
