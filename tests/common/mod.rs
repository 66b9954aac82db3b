#![allow(dead_code)]

use async_trait::async_trait;
use donation_flow::application::coordinator::DonationCoordinator;
use donation_flow::domain::payment::{
    DonationRecord, InitiateRequest, InitiationPayload, VerificationResponse, VerificationStatus,
};
use donation_flow::domain::ports::{
    CampaignUpdater, CorrelationStore, DonationGateway, RedirectOpener, RedirectOutcome,
};
use donation_flow::error::{DonationError, Result};
use donation_flow::infrastructure::in_memory::InMemoryCorrelationStore;
use rust_decimal::Decimal;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;

pub const PIDX: &str = "pidx-abc";
pub const PAYMENT_URL: &str = "https://pay.example.com/pidx-abc";

pub enum VerifyReply {
    Respond(VerificationResponse),
    NetworkError,
    Forbidden,
}

impl VerifyReply {
    pub fn success(campaign: &str, amount: Decimal) -> Self {
        VerifyReply::Respond(VerificationResponse {
            status: VerificationStatus::Success,
            campaign: Some(campaign.to_string()),
            amount: Some(amount),
            message: Some("Donation successful".to_string()),
        })
    }

    pub fn pending() -> Self {
        VerifyReply::Respond(VerificationResponse {
            status: VerificationStatus::Pending,
            ..Default::default()
        })
    }

    pub fn rejected(message: &str) -> Self {
        VerifyReply::Respond(VerificationResponse {
            status: VerificationStatus::Error,
            message: Some(message.to_string()),
            ..Default::default()
        })
    }
}

#[derive(Default)]
struct GatewayState {
    initiate_calls: AtomicUsize,
    verify_calls: AtomicUsize,
    history_calls: AtomicUsize,
    initiate_error: Mutex<Option<String>>,
    requests: Mutex<Vec<InitiateRequest>>,
    verify_replies: Mutex<VecDeque<VerifyReply>>,
    gate: Mutex<Option<Arc<Notify>>>,
    history: Mutex<Vec<DonationRecord>>,
    history_fails: Mutex<bool>,
}

/// Scripted backend. Clones share state, so tests keep one to inspect calls.
#[derive(Clone, Default)]
pub struct MockGateway {
    state: Arc<GatewayState>,
}

impl MockGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reject_initiation(&self, message: &str) {
        *self.state.initiate_error.lock().unwrap() = Some(message.to_string());
    }

    pub fn push_verify(&self, reply: VerifyReply) {
        self.state.verify_replies.lock().unwrap().push_back(reply);
    }

    /// Makes every verification wait until the returned handle is notified.
    pub fn hold_verifications(&self) -> Arc<Notify> {
        let notify = Arc::new(Notify::new());
        *self.state.gate.lock().unwrap() = Some(notify.clone());
        notify
    }

    pub fn set_history(&self, records: Vec<DonationRecord>) {
        *self.state.history.lock().unwrap() = records;
    }

    pub fn fail_history(&self) {
        *self.state.history_fails.lock().unwrap() = true;
    }

    pub fn initiate_calls(&self) -> usize {
        self.state.initiate_calls.load(Ordering::SeqCst)
    }

    pub fn verify_calls(&self) -> usize {
        self.state.verify_calls.load(Ordering::SeqCst)
    }

    pub fn history_calls(&self) -> usize {
        self.state.history_calls.load(Ordering::SeqCst)
    }

    pub fn requests(&self) -> Vec<InitiateRequest> {
        self.state.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl DonationGateway for MockGateway {
    async fn initiate(&self, request: &InitiateRequest) -> Result<InitiationPayload> {
        self.state.initiate_calls.fetch_add(1, Ordering::SeqCst);
        self.state.requests.lock().unwrap().push(request.clone());
        if let Some(message) = self.state.initiate_error.lock().unwrap().clone() {
            return Err(DonationError::Backend {
                status: 400,
                message,
            });
        }
        Ok(InitiationPayload {
            pidx: PIDX.to_string(),
            donation_id: "42".to_string(),
            payment_url: PAYMENT_URL.to_string(),
        })
    }

    async fn verify(&self, _pidx: &str) -> Result<VerificationResponse> {
        self.state.verify_calls.fetch_add(1, Ordering::SeqCst);
        let gate = self.state.gate.lock().unwrap().clone();
        if let Some(gate) = gate {
            gate.notified().await;
        }

        let reply = self.state.verify_replies.lock().unwrap().pop_front();
        match reply {
            Some(VerifyReply::Respond(response)) => Ok(response),
            Some(VerifyReply::NetworkError) => Err(DonationError::InternalError(Box::new(
                std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "connection refused"),
            ))),
            Some(VerifyReply::Forbidden) => {
                Err(DonationError::Unauthorized("Token expired".to_string()))
            }
            None => Ok(VerificationResponse::default()),
        }
    }

    async fn my_donations(&self) -> Result<Vec<DonationRecord>> {
        self.state.history_calls.fetch_add(1, Ordering::SeqCst);
        if *self.state.history_fails.lock().unwrap() {
            return Err(DonationError::Backend {
                status: 500,
                message: "history unavailable".to_string(),
            });
        }
        Ok(self.state.history.lock().unwrap().clone())
    }
}

/// Records every campaign update it receives. Can be told to stall or fail.
#[derive(Clone, Default)]
pub struct RecordingUpdater {
    calls: Arc<Mutex<Vec<(String, Decimal)>>>,
    gate: Arc<Mutex<Option<Arc<Notify>>>>,
    fails: Arc<AtomicBool>,
}

impl RecordingUpdater {
    pub fn calls(&self) -> Vec<(String, Decimal)> {
        self.calls.lock().unwrap().clone()
    }

    /// Makes every update wait, after being recorded, until the handle is notified.
    pub fn hold_updates(&self) -> Arc<Notify> {
        let notify = Arc::new(Notify::new());
        *self.gate.lock().unwrap() = Some(notify.clone());
        notify
    }

    pub fn fail_updates(&self) {
        self.fails.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl CampaignUpdater for RecordingUpdater {
    async fn update_campaign_amount(&self, campaign_id: &str, amount: Decimal) -> Result<()> {
        self.calls
            .lock()
            .unwrap()
            .push((campaign_id.to_string(), amount));
        let gate = self.gate.lock().unwrap().clone();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        if self.fails.load(Ordering::SeqCst) {
            return Err(DonationError::Backend {
                status: 503,
                message: "campaign service unavailable".to_string(),
            });
        }
        Ok(())
    }
}

/// In-memory correlation store whose removals can be switched to fail.
#[derive(Clone, Default)]
pub struct FlakyStore {
    inner: InMemoryCorrelationStore,
    fail_removes: Arc<AtomicBool>,
}

impl FlakyStore {
    pub fn fail_removes(&self, fail: bool) {
        self.fail_removes.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl CorrelationStore for FlakyStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        self.inner.get(key).await
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        self.inner.set(key, value).await
    }

    async fn remove(&self, key: &str) -> Result<()> {
        if self.fail_removes.load(Ordering::SeqCst) {
            return Err(DonationError::InternalError(Box::new(std::io::Error::other(
                "disk full",
            ))));
        }
        self.inner.remove(key).await
    }
}

/// Records opened URLs; optionally behaves like a popup blocker.
#[derive(Clone, Default)]
pub struct RecordingOpener {
    blocked: bool,
    opened: Arc<Mutex<Vec<String>>>,
}

impl RecordingOpener {
    pub fn blocked() -> Self {
        Self {
            blocked: true,
            ..Default::default()
        }
    }

    pub fn opened(&self) -> Vec<String> {
        self.opened.lock().unwrap().clone()
    }
}

#[async_trait]
impl RedirectOpener for RecordingOpener {
    async fn open(&self, url: &str) -> RedirectOutcome {
        self.opened.lock().unwrap().push(url.to_string());
        if self.blocked {
            RedirectOutcome::Blocked {
                payment_url: url.to_string(),
            }
        } else {
            RedirectOutcome::Opened
        }
    }
}

pub struct Harness {
    pub coordinator: DonationCoordinator,
    pub gateway: MockGateway,
    pub store: InMemoryCorrelationStore,
    pub updater: RecordingUpdater,
    pub opener: RecordingOpener,
}

pub fn harness() -> Harness {
    harness_with_opener(RecordingOpener::default())
}

pub fn harness_with_opener(opener: RecordingOpener) -> Harness {
    let gateway = MockGateway::new();
    let store = InMemoryCorrelationStore::new();
    let updater = RecordingUpdater::default();
    let coordinator = DonationCoordinator::new(
        Box::new(gateway.clone()),
        Box::new(store.clone()),
        Box::new(updater.clone()),
        Box::new(opener.clone()),
    );
    Harness {
        coordinator,
        gateway,
        store,
        updater,
        opener,
    }
}
