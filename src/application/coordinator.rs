use crate::application::registry::{Admission, VerificationRegistry};
use crate::domain::donation::{AttemptStatus, DonationAmount, DonationAttempt};
use crate::domain::payment::{
    CorrelationRecord, DonationRecord, InitiateRequest, InitiationPayload, VerificationStatus,
};
use crate::domain::ports::{
    CampaignUpdaterBox, CorrelationStoreBox, DonationGatewayBox, RedirectOpenerBox,
    RedirectOutcome,
};
use crate::error::{DonationError, Result};
use rust_decimal::Decimal;
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, error, info, instrument, warn};

/// What a successful `initiate` hands back to the caller.
#[derive(Debug, Clone, Serialize)]
pub struct InitiationOutcome {
    pub attempt: DonationAttempt,
    pub payload: InitiationPayload,
    pub redirect: RedirectOutcome,
}

impl InitiationOutcome {
    pub fn redirect_blocked(&self) -> bool {
        matches!(self.redirect, RedirectOutcome::Blocked { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum VerificationOutcome {
    Completed {
        campaign_id: Option<String>,
        amount: Option<Decimal>,
        message: Option<String>,
    },
    Pending {
        message: Option<String>,
    },
    /// Backend answered with something other than success or pending.
    Failed {
        message: String,
        attempts: u32,
    },
    /// A verification for the same identifier is already running.
    #[serde(rename = "verifying")]
    InProgress,
}

/// Result of resuming a flow that was interrupted by the payment redirect.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PendingDonationSummary {
    pub message: String,
    pub campaign_id: Option<String>,
    pub amount: Option<Decimal>,
}

/// Drives donation attempts through initiation, redirect and verification.
///
/// The coordinator owns the collaborators it talks to and the transient
/// verification state. Several coordinators may share one
/// [`VerificationRegistry`] through [`DonationCoordinator::with_registry`].
pub struct DonationCoordinator {
    gateway: DonationGatewayBox,
    store: CorrelationStoreBox,
    campaigns: CampaignUpdaterBox,
    opener: RedirectOpenerBox,
    registry: Arc<VerificationRegistry>,
    history: RwLock<Vec<DonationRecord>>,
}

impl DonationCoordinator {
    /// Creates a coordinator with a fresh registry using the default retry cap.
    pub fn new(
        gateway: DonationGatewayBox,
        store: CorrelationStoreBox,
        campaigns: CampaignUpdaterBox,
        opener: RedirectOpenerBox,
    ) -> Self {
        Self {
            gateway,
            store,
            campaigns,
            opener,
            registry: Arc::new(VerificationRegistry::default()),
            history: RwLock::new(Vec::new()),
        }
    }

    pub fn with_registry(mut self, registry: Arc<VerificationRegistry>) -> Self {
        self.registry = registry;
        self
    }

    /// Creates a donation on the backend and sends the user to the payment page.
    ///
    /// The correlation record is persisted before the redirect is attempted, so a
    /// flow that leaves the process can be resumed with
    /// [`check_pending_donation`](Self::check_pending_donation).
    #[instrument(skip(self, amount, message), fields(amount = %amount))]
    pub async fn initiate(
        &self,
        campaign_id: &str,
        amount: Decimal,
        message: &str,
    ) -> Result<InitiationOutcome> {
        if campaign_id.trim().is_empty() {
            return Err(DonationError::Validation(
                "Campaign id must not be empty".to_string(),
            ));
        }
        let amount = DonationAmount::new(amount).inspect_err(|e| {
            debug!(error = %e, "Rejected donation amount");
        })?;
        let mut attempt = DonationAttempt::draft(campaign_id, amount, message);

        let request = InitiateRequest {
            campaign_id: attempt.campaign_id.clone(),
            amount: amount.value(),
            message: attempt.message.clone().unwrap_or_default(),
        };
        let payload = self.gateway.initiate(&request).await.map_err(|e| {
            warn!(error = %e, "Donation initiation failed");
            DonationError::Initiation {
                message: e.backend_message(),
            }
        })?;
        if payload.pidx.is_empty() {
            return Err(DonationError::Initiation {
                message: "Backend did not return a payment identifier".to_string(),
            });
        }

        attempt.mark_initiated(&payload)?;
        self.store
            .save_correlation(&CorrelationRecord {
                pidx: payload.pidx.clone(),
                donation_id: Some(payload.donation_id.clone()),
            })
            .await?;
        info!(pidx = %payload.pidx, donation_id = %payload.donation_id, "Donation initiated");

        let redirect = self.opener.open(&payload.payment_url).await;
        if let RedirectOutcome::Blocked { payment_url } = &redirect {
            warn!(%payment_url, "Payment page could not be opened, manual redirect required");
        }

        Ok(InitiationOutcome {
            attempt,
            payload,
            redirect,
        })
    }

    /// Asks the backend whether the payment behind `pidx` has settled.
    ///
    /// Concurrent calls for the same identifier collapse into one request; the
    /// losers get [`VerificationOutcome::InProgress`]. Every attempt except a
    /// `pending` answer counts against the retry cap, including calls that fail
    /// outright. A settled payment reports `Completed` even when the campaign
    /// update or the history refresh afterwards fails.
    #[instrument(skip(self))]
    pub async fn verify(&self, pidx: &str) -> Result<VerificationOutcome> {
        if pidx.trim().is_empty() {
            return Err(DonationError::Validation(
                "Payment identifier must not be empty".to_string(),
            ));
        }

        let guard = match self.registry.begin(pidx) {
            Admission::InProgress => {
                debug!("Verification already in progress");
                return Ok(VerificationOutcome::InProgress);
            }
            Admission::Exhausted { attempts } => {
                warn!(attempts, "Verification retries exhausted");
                return Err(DonationError::RetryExhausted {
                    pidx: pidx.to_string(),
                    attempts,
                });
            }
            Admission::Admitted(guard) => guard,
        };
        let attempts = guard.attempts();

        let response = match self.gateway.verify(pidx).await {
            Ok(response) => response,
            Err(e) => {
                guard.failed();
                error!(error = %e, attempts, "Verification request failed");
                return Err(DonationError::Verification {
                    pidx: pidx.to_string(),
                    message: e.backend_message(),
                });
            }
        };

        match response.status {
            VerificationStatus::Success => {
                // The guard stays held until every side effect below has run.
                if let Err(e) = self.clear_correlation_for(pidx).await {
                    guard.failed();
                    error!(error = %e, attempts, "Could not clear the settled payment");
                    return Err(e);
                }

                match (&response.campaign, response.amount) {
                    (Some(campaign_id), Some(amount)) => {
                        if let Err(e) = self
                            .campaigns
                            .update_campaign_amount(campaign_id, amount)
                            .await
                        {
                            warn!(error = %e, %campaign_id, "Could not update campaign total");
                        }
                    }
                    _ => warn!("Verified payment did not name a campaign and amount"),
                }
                if let Err(e) = self.refresh_history().await {
                    warn!(error = %e, "Could not refresh donation history");
                }
                guard.complete();

                info!(campaign = ?response.campaign, amount = ?response.amount, "Donation completed");
                Ok(VerificationOutcome::Completed {
                    campaign_id: response.campaign,
                    amount: response.amount,
                    message: response.message,
                })
            }
            VerificationStatus::Pending => {
                guard.pending();
                info!("Payment still pending");
                Ok(VerificationOutcome::Pending {
                    message: response.message,
                })
            }
            VerificationStatus::Error => {
                guard.rejected();
                let message = response
                    .message
                    .unwrap_or_else(|| "Payment verification failed".to_string());
                warn!(%message, attempts, "Payment not verified");
                Ok(VerificationOutcome::Failed { message, attempts })
            }
        }
    }

    /// Resumes a flow left behind by a redirect to the payment provider.
    ///
    /// Returns a summary only when the persisted payment verifies as successful.
    /// A payment whose retries are used up yields `None`.
    #[instrument(skip(self))]
    pub async fn check_pending_donation(&self) -> Result<Option<PendingDonationSummary>> {
        let Some(record) = self.store.load_correlation().await? else {
            debug!("No pending donation");
            return Ok(None);
        };

        let outcome = match self.verify(&record.pidx).await {
            Ok(outcome) => outcome,
            Err(DonationError::RetryExhausted { attempts, .. }) => {
                warn!(pidx = %record.pidx, attempts, "Pending donation can no longer be verified");
                return Ok(None);
            }
            Err(e) => return Err(e),
        };

        match outcome {
            VerificationOutcome::Completed {
                campaign_id,
                amount,
                message,
            } => Ok(Some(PendingDonationSummary {
                message: message.unwrap_or_else(|| "Donation completed successfully".to_string()),
                campaign_id,
                amount,
            })),
            _ => Ok(None),
        }
    }

    /// Reloads the user's donation history from the backend.
    pub async fn refresh_history(&self) -> Result<Vec<DonationRecord>> {
        let donations = self.gateway.my_donations().await?;
        *self.history.write().await = donations.clone();
        Ok(donations)
    }

    /// The donation history as of the last refresh.
    pub async fn donation_history(&self) -> Vec<DonationRecord> {
        self.history.read().await.clone()
    }

    pub async fn pending_payment(&self) -> Result<Option<CorrelationRecord>> {
        self.store.load_correlation().await
    }

    pub fn attempt_status(&self, pidx: &str) -> Option<AttemptStatus> {
        self.registry.status(pidx)
    }

    pub fn retry_count(&self, pidx: &str) -> u32 {
        self.registry.attempts(pidx)
    }

    // Only the record for this identifier is cleared; a newer initiation may
    // have replaced it in the meantime.
    async fn clear_correlation_for(&self, pidx: &str) -> Result<()> {
        match self.store.load_correlation().await? {
            Some(record) if record.pidx == pidx => self.store.clear_correlation().await,
            _ => Ok(()),
        }
    }
}
