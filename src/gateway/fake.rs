//! In-memory gateway for tests.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Mutex;

use super::{GatewayError, IntentRequest, PaymentGateway, PaymentInfo, PaymentIntent, PaymentStatus};

#[derive(Default)]
pub struct FakeGateway {
    next_id: AtomicU64,
    intents: Mutex<Vec<IntentRequest>>,
    payments: Mutex<HashMap<String, PaymentInfo>>,
    intents_down: AtomicBool,
    lookups_down: AtomicBool,
}

impl FakeGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a payment the gateway will report for `payment_id`.
    pub fn set_payment(&self, payment_id: &str, status: PaymentStatus, external_reference: Option<&str>) {
        let info = PaymentInfo {
            payment_id: payment_id.to_string(),
            status,
            external_reference: external_reference.map(str::to_string),
            merchant_order_id: Some(format!("mo_{payment_id}")),
        };
        self.payments.lock().unwrap().insert(payment_id.to_string(), info);
    }

    pub fn approve(&self, payment_id: &str, order_id: &str) {
        self.set_payment(payment_id, PaymentStatus::Approved, Some(order_id));
    }

    pub fn set_intents_down(&self, down: bool) {
        self.intents_down.store(down, Ordering::SeqCst);
    }

    pub fn set_lookups_down(&self, down: bool) {
        self.lookups_down.store(down, Ordering::SeqCst);
    }

    pub fn intents(&self) -> Vec<IntentRequest> {
        self.intents.lock().unwrap().clone()
    }
}

#[async_trait]
impl PaymentGateway for FakeGateway {
    async fn create_intent(&self, request: IntentRequest) -> Result<PaymentIntent, GatewayError> {
        if self.intents_down.load(Ordering::SeqCst) {
            return Err(GatewayError::Unavailable("connection refused".into()));
        }
        let n = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        let intent = PaymentIntent {
            intent_id: format!("pref_{n}"),
            redirect_url: format!("https://pay.example/checkout?pref_id=pref_{n}"),
        };
        self.intents.lock().unwrap().push(request);
        Ok(intent)
    }

    async fn get_payment(&self, payment_id: &str) -> Result<PaymentInfo, GatewayError> {
        if self.lookups_down.load(Ordering::SeqCst) {
            return Err(GatewayError::Unavailable("503 Service Unavailable".into()));
        }
        self.payments
            .lock()
            .unwrap()
            .get(payment_id)
            .cloned()
            .ok_or_else(|| GatewayError::UnknownPayment(payment_id.to_string()))
    }
}
