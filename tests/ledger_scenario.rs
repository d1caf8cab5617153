//! End-to-end ledger scenarios over the in-memory adapters.
//!
//! Walks the full credit lifecycle: purchase via signed webhook, staging
//! attempts that commit or refund, webhook redelivery, and the conservation
//! check that the entries always sum to the balance.

use std::sync::Arc;
use std::time::Duration;

use hmac::{Hmac, Mac};
use sha2::Sha256;

use roomstage::adapters::ai::MockStagingProvider;
use roomstage::adapters::memory::{
    InMemoryCreditLedger, InMemoryObjectStore, InMemoryPaymentEventRepository,
    InMemoryStagingJobRepository,
};
use roomstage::application::handlers::billing::{
    ProcessPaymentWebhookCommand, ProcessPaymentWebhookHandler, ProcessPaymentWebhookResult,
};
use roomstage::application::handlers::staging::{SubmitStagingJobCommand, SubmitStagingJobHandler};
use roomstage::domain::billing::PaymentWebhookVerifier;
use roomstage::domain::foundation::OrganizationId;
use roomstage::domain::ledger::{sum_amounts, LedgerEntryKind};
use roomstage::domain::staging::{StagingError, StagingJobStatus, StagingStyle};
use roomstage::ports::CreditLedger;

const SECRET: &str = "whsec_scenario_secret";

// ═════════════════════════════════════════════════════════════════════════
// Fixtures
// ═════════════════════════════════════════════════════════════════════════

struct Fixture {
    ledger: Arc<InMemoryCreditLedger>,
    jobs: Arc<InMemoryStagingJobRepository>,
    store: Arc<InMemoryObjectStore>,
    webhook: ProcessPaymentWebhookHandler,
}

fn fixture() -> Fixture {
    let payment_events = Arc::new(InMemoryPaymentEventRepository::new());
    let ledger = Arc::new(InMemoryCreditLedger::new(payment_events.clone()));
    let jobs = Arc::new(InMemoryStagingJobRepository::new());
    let store = Arc::new(InMemoryObjectStore::new());
    let webhook = ProcessPaymentWebhookHandler::new(
        PaymentWebhookVerifier::new(SECRET),
        ledger.clone(),
        payment_events,
        0,
    );
    Fixture {
        ledger,
        jobs,
        store,
        webhook,
    }
}

impl Fixture {
    fn submit_handler(&self, provider: MockStagingProvider) -> SubmitStagingJobHandler {
        SubmitStagingJobHandler::new(
            self.ledger.clone(),
            self.jobs.clone(),
            Arc::new(provider),
            self.store.clone(),
            Duration::from_millis(50),
        )
    }
}

fn sign(payload: &str) -> String {
    let timestamp = chrono::Utc::now().timestamp();
    let mut mac = Hmac::<Sha256>::new_from_slice(SECRET.as_bytes()).unwrap();
    mac.update(format!("{}.{}", timestamp, payload).as_bytes());
    format!(
        "t={},v1={}",
        timestamp,
        hex::encode(mac.finalize().into_bytes())
    )
}

fn purchase_payload(event_id: &str, org: &OrganizationId, credits: i64) -> String {
    serde_json::json!({
        "eventId": event_id,
        "type": "payment.succeeded",
        "amountCents": 2000,
        "metadata": {
            "organizationId": org.to_string(),
            "credits": credits,
        }
    })
    .to_string()
}

fn signed_command(payload: &str) -> ProcessPaymentWebhookCommand {
    ProcessPaymentWebhookCommand {
        payload: payload.as_bytes().to_vec(),
        signature: sign(payload),
    }
}

fn submit_command(org: OrganizationId) -> SubmitStagingJobCommand {
    SubmitStagingJobCommand {
        organization_id: org,
        room_image_ref: "uploads/living-room.jpg".to_string(),
        prompt: "light woods, plenty of plants".to_string(),
        style: StagingStyle::Scandinavian,
    }
}

// ═════════════════════════════════════════════════════════════════════════
// Scenarios
// ═════════════════════════════════════════════════════════════════════════

/// Purchase, a timed-out attempt with refund, webhook redelivery, then a
/// successful attempt. Balances and entries follow every step.
#[tokio::test]
async fn purchase_timeout_redelivery_and_success() {
    let fx = fixture();
    let org = OrganizationId::new();

    // Purchase 10 credits.
    let payload = purchase_payload("evt_1", &org, 10);
    let result = fx.webhook.handle(signed_command(&payload)).await.unwrap();
    assert_eq!(
        result,
        ProcessPaymentWebhookResult::Applied { balance_after: 10 }
    );
    assert_eq!(fx.ledger.balance(&org).await.unwrap(), 10);

    // A staging attempt that times out: the job fails and the credit comes
    // back.
    let handler = fx.submit_handler(MockStagingProvider::new().with_hang());
    let job = handler.handle(submit_command(org)).await.unwrap();
    assert_eq!(job.status(), StagingJobStatus::Failed);
    assert!(job.error_message().is_some());
    assert_eq!(fx.ledger.balance(&org).await.unwrap(), 10);

    // The provider redelivers the same purchase event: deduplicated, no
    // double credit.
    let result = fx.webhook.handle(signed_command(&payload)).await.unwrap();
    assert_eq!(result, ProcessPaymentWebhookResult::Duplicate);
    assert_eq!(fx.ledger.balance(&org).await.unwrap(), 10);

    // A successful attempt commits the reservation for good.
    let handler = fx.submit_handler(MockStagingProvider::new().with_success(b"img".to_vec(), 42));
    let job = handler.handle(submit_command(org)).await.unwrap();
    assert_eq!(job.status(), StagingJobStatus::Completed);
    assert!(job.staged_image_ref().is_some());
    assert_eq!(job.ai_cost_cents(), Some(42));
    assert_eq!(fx.ledger.balance(&org).await.unwrap(), 9);

    // Entries: grant, reserve, refund, reserve, commit. No refund follows
    // the committed reservation, and the amounts sum to the balance.
    let entries = fx.ledger.entries(&org).await.unwrap();
    let kinds: Vec<LedgerEntryKind> = entries.iter().map(|e| e.kind).collect();
    assert_eq!(
        kinds,
        vec![
            LedgerEntryKind::Grant,
            LedgerEntryKind::Reserve,
            LedgerEntryKind::Refund,
            LedgerEntryKind::Reserve,
            LedgerEntryKind::Commit,
        ]
    );
    assert_eq!(sum_amounts(&entries), 9);
    assert_eq!(entries.last().unwrap().balance_after, 9);
}

/// Two concurrent submissions race for the last credit; exactly one wins.
#[tokio::test]
async fn concurrent_submissions_admit_exactly_one_on_last_credit() {
    let fx = fixture();
    let org = OrganizationId::new();

    let payload = purchase_payload("evt_one_credit", &org, 1);
    fx.webhook.handle(signed_command(&payload)).await.unwrap();

    let handler_a = fx.submit_handler(MockStagingProvider::new());
    let handler_b = fx.submit_handler(MockStagingProvider::new());

    let (a, b) = tokio::join!(
        handler_a.handle(submit_command(org)),
        handler_b.handle(submit_command(org)),
    );

    let rejected = |r: &Result<_, StagingError>| {
        matches!(r, Err(StagingError::InsufficientCredits { remaining: 0 }))
    };
    assert!(
        (a.is_ok() && rejected(&b)) || (b.is_ok() && rejected(&a)),
        "exactly one submission should win the last credit"
    );

    assert_eq!(fx.ledger.balance(&org).await.unwrap(), 0);
    let entries = fx.ledger.entries(&org).await.unwrap();
    assert_eq!(sum_amounts(&entries), 0);
}

/// A provider error (not a timeout) also refunds, and the artifact store
/// stays empty.
#[tokio::test]
async fn provider_error_refunds_and_stores_nothing() {
    let fx = fixture();
    let org = OrganizationId::new();

    let payload = purchase_payload("evt_err", &org, 3);
    fx.webhook.handle(signed_command(&payload)).await.unwrap();

    let handler = fx.submit_handler(MockStagingProvider::new().with_error("model overloaded"));
    let job = handler.handle(submit_command(org)).await.unwrap();

    assert_eq!(job.status(), StagingJobStatus::Failed);
    assert!(job.staged_image_ref().is_none());
    assert_eq!(fx.ledger.balance(&org).await.unwrap(), 3);
    assert_eq!(fx.store.len().await, 0);
}

/// A failed payment is recorded for audit but never touches the balance.
#[tokio::test]
async fn failed_payment_is_recorded_without_balance_change() {
    let fx = fixture();
    let org = OrganizationId::new();

    let purchase = purchase_payload("evt_ok", &org, 5);
    fx.webhook.handle(signed_command(&purchase)).await.unwrap();

    let failed = serde_json::json!({
        "eventId": "evt_declined",
        "type": "payment.failed",
        "amountCents": 2000,
        "metadata": {
            "organizationId": org.to_string(),
            "credits": 10,
        }
    })
    .to_string();

    let result = fx.webhook.handle(signed_command(&failed)).await.unwrap();
    assert_eq!(result, ProcessPaymentWebhookResult::Rejected);
    assert_eq!(fx.ledger.balance(&org).await.unwrap(), 5);
}

/// A tampered payload fails verification and changes nothing.
#[tokio::test]
async fn tampered_payload_is_rejected() {
    let fx = fixture();
    let org = OrganizationId::new();

    let payload = purchase_payload("evt_tampered", &org, 10);
    let signature = sign(&payload);
    let tampered = payload.replace("\"credits\":10", "\"credits\":1000");

    let result = fx
        .webhook
        .handle(ProcessPaymentWebhookCommand {
            payload: tampered.into_bytes(),
            signature,
        })
        .await;

    assert!(result.is_err());
    assert!(fx.ledger.balance(&org).await.is_err(), "no account opened");
}
