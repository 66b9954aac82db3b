use crate::domain::payment::InitiationPayload;
use crate::error::DonationError;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Smallest donation the platform accepts, in whole currency units.
pub const MIN_DONATION: Decimal = dec!(10);

/// A validated donation amount.
///
/// Wraps `rust_decimal::Decimal` so that an amount below [`MIN_DONATION`] can never
/// reach the backend.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct DonationAmount(Decimal);

impl DonationAmount {
    pub fn new(value: Decimal) -> Result<Self, DonationError> {
        if value >= MIN_DONATION {
            Ok(Self(value))
        } else {
            Err(DonationError::Validation(format!(
                "Donation amount must be at least {MIN_DONATION}, got {value}"
            )))
        }
    }

    pub fn value(&self) -> Decimal {
        self.0
    }
}

impl TryFrom<Decimal> for DonationAmount {
    type Error = DonationError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<DonationAmount> for Decimal {
    fn from(amount: DonationAmount) -> Self {
        amount.0
    }
}

impl FromStr for DonationAmount {
    type Err = DonationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value = Decimal::from_str(s.trim()).map_err(|_| {
            DonationError::Validation(format!("Donation amount '{s}' is not a number"))
        })?;
        Self::new(value)
    }
}

impl fmt::Display for DonationAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

/// Where a donation attempt is in its lifecycle.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Copy)]
#[serde(rename_all = "snake_case")]
pub enum AttemptStatus {
    Draft,
    Initiated,
    Verifying,
    Pending,
    Completed,
    /// The last verification call failed at the transport or backend level.
    VerificationFailed,
    /// Retry cap reached. No further automatic verification.
    Failed,
}

impl AttemptStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, AttemptStatus::Completed | AttemptStatus::Failed)
    }
}

/// One user-initiated donation.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct DonationAttempt {
    pub campaign_id: String,
    pub amount: DonationAmount,
    pub message: Option<String>,
    /// Gateway correlation token, only set once initiation succeeded.
    pub payment_identifier: Option<String>,
    pub donation_id: Option<String>,
    pub payment_url: Option<String>,
    pub status: AttemptStatus,
    pub retry_count: u32,
}

impl DonationAttempt {
    /// Creates a draft attempt. Empty messages are stored as `None`.
    pub fn draft(campaign_id: impl Into<String>, amount: DonationAmount, message: &str) -> Self {
        let message = message.trim();
        Self {
            campaign_id: campaign_id.into(),
            amount,
            message: (!message.is_empty()).then(|| message.to_string()),
            payment_identifier: None,
            donation_id: None,
            payment_url: None,
            status: AttemptStatus::Draft,
            retry_count: 0,
        }
    }

    /// Moves a draft to `initiated` with the backend's correlation data.
    pub fn mark_initiated(&mut self, payload: &InitiationPayload) -> Result<(), DonationError> {
        if self.status != AttemptStatus::Draft {
            return Err(DonationError::Validation(format!(
                "Cannot initiate a donation in status {:?}",
                self.status
            )));
        }
        self.payment_identifier = Some(payload.pidx.clone());
        self.donation_id = Some(payload.donation_id.clone());
        self.payment_url = Some(payload.payment_url.clone());
        self.status = AttemptStatus::Initiated;
        Ok(())
    }
}
