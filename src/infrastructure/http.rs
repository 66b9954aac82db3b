//! reqwest client for the donation backend.
//!
//! A `403` is reported as [`DonationError::Unauthorized`]; any other non-2xx answer
//! becomes [`DonationError::Backend`] carrying the backend's own message when the
//! body has one. The verify endpoint is the exception: error statuses that still
//! carry a `status` field are handed back as a regular verification response.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, StatusCode, Url};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;

use crate::config::Config;
use crate::domain::payment::{
    DonationRecord, InitiateRequest, InitiationPayload, VerificationResponse, VerifyRequest,
};
use crate::domain::ports::DonationGateway;
use crate::error::{DonationError, Result};

const INITIATE_PATH: &str = "donations/initiate/";
const VERIFY_PATH: &str = "donations/verify/";
const HISTORY_PATH: &str = "donations/my-donations/";

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: Option<String>,
    error: Option<String>,
    detail: Option<String>,
}

pub struct HttpDonationGateway {
    client: Client,
    base_url: Url,
    token: Option<String>,
}

impl HttpDonationGateway {
    pub fn new(base_url: &str, token: Option<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: parse_base_url(base_url)?,
            token,
        })
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        Self::new(
            &config.api_url,
            config.api_token.clone(),
            Duration::from_secs(config.http_timeout_secs),
        )
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        self.base_url
            .join(path)
            .map_err(|e| DonationError::Config(format!("Invalid endpoint '{path}': {e}")))
    }

    async fn execute(&self, request: RequestBuilder) -> Result<(StatusCode, String)> {
        let request = match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        };
        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;
        debug!(%status, bytes = body.len(), "Backend responded");

        if status == StatusCode::FORBIDDEN {
            return Err(DonationError::Unauthorized(error_message(status, &body)));
        }
        Ok((status, body))
    }

    async fn fetch<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T> {
        let (status, body) = self.execute(request).await?;
        if !status.is_success() {
            return Err(DonationError::Backend {
                status: status.as_u16(),
                message: error_message(status, &body),
            });
        }
        Ok(serde_json::from_str(&body)?)
    }
}

#[async_trait]
impl DonationGateway for HttpDonationGateway {
    async fn initiate(&self, request: &InitiateRequest) -> Result<InitiationPayload> {
        let url = self.endpoint(INITIATE_PATH)?;
        self.fetch(self.client.post(url).json(request)).await
    }

    async fn verify(&self, pidx: &str) -> Result<VerificationResponse> {
        let url = self.endpoint(VERIFY_PATH)?;
        let request = self.client.post(url).json(&VerifyRequest {
            pidx: pidx.to_string(),
        });
        let (status, body) = self.execute(request).await?;
        if status.is_success() {
            return Ok(serde_json::from_str(&body)?);
        }

        match serde_json::from_str::<Value>(&body) {
            Ok(value) if value.get("status").is_some() => Ok(serde_json::from_value(value)?),
            _ => Err(DonationError::Backend {
                status: status.as_u16(),
                message: error_message(status, &body),
            }),
        }
    }

    async fn my_donations(&self) -> Result<Vec<DonationRecord>> {
        let url = self.endpoint(HISTORY_PATH)?;
        self.fetch(self.client.get(url)).await
    }
}

fn parse_base_url(raw: &str) -> Result<Url> {
    let mut base = raw.trim().to_string();
    // Url::join drops the last path segment unless it ends with a slash.
    if !base.ends_with('/') {
        base.push('/');
    }
    Url::parse(&base).map_err(|e| DonationError::Config(format!("Invalid API URL '{raw}': {e}")))
}

fn error_message(status: StatusCode, body: &str) -> String {
    serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(|b| b.message.or(b.error).or(b.detail))
        .unwrap_or_else(|| {
            let body = body.trim();
            if body.is_empty() {
                status
                    .canonical_reason()
                    .unwrap_or("Request failed")
                    .to_string()
            } else {
                body.to_string()
            }
        })
}
