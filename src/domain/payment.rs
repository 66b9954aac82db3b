use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};

/// Body of `POST donations/initiate/`.
#[derive(Debug, Serialize, PartialEq, Clone)]
pub struct InitiateRequest {
    pub campaign_id: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,
    pub message: String,
}

/// Response of a successful initiation.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct InitiationPayload {
    pub pidx: String,
    #[serde(deserialize_with = "deserialize_id")]
    pub donation_id: String,
    pub payment_url: String,
}

/// Body of `POST donations/verify/`.
#[derive(Debug, Serialize, PartialEq, Clone)]
pub struct VerifyRequest {
    pub pidx: String,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Copy, Default)]
#[serde(rename_all = "lowercase")]
pub enum VerificationStatus {
    Success,
    Pending,
    /// Anything the backend sends that is neither `success` nor `pending`.
    #[default]
    #[serde(other)]
    Error,
}

/// Response of `POST donations/verify/`.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone, Default)]
pub struct VerificationResponse {
    #[serde(default)]
    pub status: VerificationStatus,
    #[serde(default, deserialize_with = "deserialize_optional_id")]
    pub campaign: Option<String>,
    #[serde(default)]
    pub amount: Option<Decimal>,
    #[serde(default)]
    pub message: Option<String>,
}

/// One row of the user's donation history.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct DonationRecord {
    #[serde(deserialize_with = "deserialize_id")]
    pub id: String,
    #[serde(deserialize_with = "deserialize_id")]
    pub campaign: String,
    pub amount: Decimal,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
}

/// The correlation data that survives a restart while a payment is outstanding.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct CorrelationRecord {
    pub pidx: String,
    pub donation_id: Option<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawId {
    Text(String),
    Number(i64),
}

impl From<RawId> for String {
    fn from(raw: RawId) -> Self {
        match raw {
            RawId::Text(s) => s,
            RawId::Number(n) => n.to_string(),
        }
    }
}

/// Backend identifiers arrive either as JSON strings or integers.
fn deserialize_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    RawId::deserialize(deserializer).map(String::from)
}

fn deserialize_optional_id<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<RawId>::deserialize(deserializer).map(|id| id.map(String::from))
}
