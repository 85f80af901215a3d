//! Offer email dispatch through the public dispatcher.
//!
//! Early failures are checked against a recording transport so any attempted send is visible.
//! The SendGrid client is driven against an in-process stand-in for the mail-send endpoint.

mod common {
    use std::path::PathBuf;
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;
    use axum::extract::State;
    use axum::http::{HeaderMap, StatusCode};
    use axum::response::IntoResponse;
    use axum::routing::post;
    use axum::{Json, Router};
    use serde_json::Value;

    use loan_offers::workflows::notification::{
        DeliveryReceipt, MailTransport, NotificationDispatcher, OutboundEmail, TemplateCatalog,
        TransportError,
    };

    pub(super) const SENDER: &str = "offers@bank.example";

    pub(super) fn template_dir() -> PathBuf {
        PathBuf::from(concat!(env!("CARGO_MANIFEST_DIR"), "/../../email_templates"))
    }

    #[derive(Default)]
    pub(super) struct RecordingTransport {
        sent: Mutex<Vec<OutboundEmail>>,
    }

    impl RecordingTransport {
        pub(super) fn sent(&self) -> Vec<OutboundEmail> {
            self.sent.lock().expect("transport mutex").clone()
        }
    }

    #[async_trait]
    impl MailTransport for RecordingTransport {
        async fn send(&self, email: &OutboundEmail) -> Result<DeliveryReceipt, TransportError> {
            self.sent.lock().expect("transport mutex").push(email.clone());
            Ok(DeliveryReceipt {
                status_code: 202,
                message_id: None,
            })
        }
    }

    pub(super) fn recording_dispatcher(
        sender: Option<&str>,
    ) -> (NotificationDispatcher<RecordingTransport>, Arc<RecordingTransport>) {
        let transport = Arc::new(RecordingTransport::default());
        let dispatcher = NotificationDispatcher::new(
            TemplateCatalog::new(template_dir()),
            transport.clone(),
            sender.map(str::to_string),
            "Loan Offer!!",
        );
        (dispatcher, transport)
    }

    /// Requests received by the stand-in provider: bearer header and JSON payload.
    pub(super) type Captured = Arc<Mutex<Vec<(Option<String>, Value)>>>;

    async fn mail_send(
        State((status, captured)): State<(StatusCode, Captured)>,
        headers: HeaderMap,
        Json(body): Json<Value>,
    ) -> impl IntoResponse {
        let authorization = headers
            .get("authorization")
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);
        captured
            .lock()
            .expect("capture mutex")
            .push((authorization, body));

        if status.is_success() {
            (status, [("x-message-id", "msg-abc123")], String::new()).into_response()
        } else {
            (status, r#"{"errors":[{"message":"bad key"}]}"#.to_string()).into_response()
        }
    }

    /// Starts a mail-send stand-in that answers every request with `status`.
    pub(super) async fn spawn_provider(status: StatusCode) -> (String, Captured) {
        let captured = Captured::default();
        let app = Router::new()
            .route("/v3/mail/send", post(mail_send))
            .with_state((status, captured.clone()));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("ephemeral port");
        let addr = listener.local_addr().expect("local addr");
        tokio::spawn(async move {
            axum::serve(listener, app).await.expect("provider runs");
        });

        (format!("http://{addr}/v3/mail/send"), captured)
    }
}

use axum::http::StatusCode;
use loan_offers::config::NotificationConfig;
use loan_offers::workflows::notification::dispatcher::PLAIN_TEXT_FALLBACK;
use loan_offers::workflows::notification::{
    DispatchOutcome, NotificationDispatcher, NotificationError,
};

use common::{recording_dispatcher, spawn_provider, template_dir, SENDER};

fn sendgrid_config(api_key: Option<&str>, api_url: String) -> NotificationConfig {
    NotificationConfig {
        api_key: api_key.map(str::to_string),
        from_email: Some(SENDER.to_string()),
        api_url,
        template_dir: template_dir(),
        subject: "Loan Offer!!".to_string(),
    }
}

#[tokio::test]
async fn declined_consent_is_skipped_without_validation() {
    let (dispatcher, transport) = recording_dispatcher(Some(SENDER));
    let outcome = dispatcher
        .dispatch("unknown_tier", false, "not-an-email", "")
        .await
        .expect("skipping never fails");

    assert_eq!(outcome, DispatchOutcome::Skipped);
    assert!(transport.sent().is_empty());
}

#[tokio::test]
async fn invalid_email_fails_before_send() {
    let (dispatcher, transport) = recording_dispatcher(Some(SENDER));
    let err = dispatcher
        .dispatch("standard", true, "jane.example.com", "Jane")
        .await
        .expect_err("email rejected");

    assert!(matches!(err, NotificationError::InvalidEmail(_)));
    assert!(transport.sent().is_empty());
}

#[tokio::test]
async fn unknown_tier_fails_before_send() {
    let (dispatcher, transport) = recording_dispatcher(Some(SENDER));
    let err = dispatcher
        .dispatch("unknown_tier", true, "jane@example.com", "Jane")
        .await
        .expect_err("tier rejected");

    match err {
        NotificationError::UnknownTier { tier, expected } => {
            assert_eq!(tier, "unknown_tier");
            assert_eq!(expected, vec!["vip_promo", "standard", "high_recall"]);
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(transport.sent().is_empty());
}

#[tokio::test]
async fn missing_sender_is_a_configuration_error() {
    let (dispatcher, transport) = recording_dispatcher(None);
    let err = dispatcher
        .dispatch("high_recall", true, "jane@example.com", "Jane")
        .await
        .expect_err("sender missing");

    assert!(matches!(err, NotificationError::Configuration(_)));
    assert!(transport.sent().is_empty());
}

#[tokio::test]
async fn consented_offer_renders_tier_template() {
    let (dispatcher, transport) = recording_dispatcher(Some(SENDER));
    let outcome = dispatcher
        .dispatch("vip_promo", true, " jane@example.com ", "Jane <Doe>")
        .await
        .expect("offer sent");

    assert!(matches!(
        outcome,
        DispatchOutcome::Sent {
            status_code: 202,
            ..
        }
    ));

    let sent = transport.sent();
    assert_eq!(sent.len(), 1);
    let email = &sent[0];
    assert_eq!(email.from, SENDER);
    assert_eq!(email.to, "jane@example.com");
    assert_eq!(email.subject, "Loan Offer!!");
    assert_eq!(email.plain_text, PLAIN_TEXT_FALLBACK);
    assert!(email.html.contains("Congratulations, Jane &lt;Doe&gt;!"));
    assert!(!email.html.contains("{{recipient_name}}"));
}

#[tokio::test]
async fn sendgrid_delivery_reports_status_and_message_id() {
    let (endpoint, captured) = spawn_provider(StatusCode::ACCEPTED).await;
    let config = sendgrid_config(Some("SG.test-key"), endpoint);
    let dispatcher = NotificationDispatcher::from_config(&config).expect("dispatcher builds");

    let outcome = dispatcher
        .dispatch("standard", true, "jane@example.com", "Jane Doe")
        .await
        .expect("offer sent");

    match outcome {
        DispatchOutcome::Sent {
            status_code,
            message_id,
            ..
        } => {
            assert_eq!(status_code, 202);
            assert_eq!(message_id.as_deref(), Some("msg-abc123"));
        }
        other => panic!("unexpected outcome: {other:?}"),
    }

    let requests = captured.lock().expect("capture mutex");
    assert_eq!(requests.len(), 1);
    let (authorization, body) = &requests[0];
    assert_eq!(authorization.as_deref(), Some("Bearer SG.test-key"));
    assert_eq!(body["personalizations"][0]["to"][0]["name"], "Jane Doe");
    assert_eq!(body["from"]["email"], SENDER);
    assert_eq!(body["subject"], "Loan Offer!!");
}

#[tokio::test]
async fn rejected_credential_maps_to_auth_error() {
    let (endpoint, captured) = spawn_provider(StatusCode::UNAUTHORIZED).await;
    let config = sendgrid_config(Some("SG.revoked"), endpoint);
    let dispatcher = NotificationDispatcher::from_config(&config).expect("dispatcher builds");

    let err = dispatcher
        .dispatch("standard", true, "jane@example.com", "Jane Doe")
        .await
        .expect_err("provider refuses");

    match err {
        NotificationError::Auth { status, detail } => {
            assert_eq!(status, 401);
            assert!(detail.contains("bad key"));
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(captured.lock().expect("capture mutex").len(), 1);
}

#[tokio::test]
async fn provider_server_error_maps_to_provider_error() {
    let (endpoint, captured) = spawn_provider(StatusCode::INTERNAL_SERVER_ERROR).await;
    let config = sendgrid_config(Some("SG.test-key"), endpoint);
    let dispatcher = NotificationDispatcher::from_config(&config).expect("dispatcher builds");

    let err = dispatcher
        .dispatch("high_recall", true, "jane@example.com", "Jane Doe")
        .await
        .expect_err("provider fails");

    match err {
        NotificationError::Provider(detail) => {
            assert!(detail.contains("status 500"));
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(captured.lock().expect("capture mutex").len(), 1);
}

#[tokio::test]
async fn unreachable_provider_maps_to_provider_error() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("ephemeral port");
    let addr = listener.local_addr().expect("local addr");
    drop(listener);

    let config = sendgrid_config(Some("SG.test-key"), format!("http://{addr}/v3/mail/send"));
    let dispatcher = NotificationDispatcher::from_config(&config).expect("dispatcher builds");

    let err = dispatcher
        .dispatch("standard", true, "jane@example.com", "Jane Doe")
        .await
        .expect_err("connection refused");

    match err {
        NotificationError::Provider(detail) => {
            assert!(detail.starts_with("provider unreachable"));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn malformed_key_never_reaches_provider() {
    let (endpoint, captured) = spawn_provider(StatusCode::ACCEPTED).await;
    let config = sendgrid_config(Some("sk-live-123"), endpoint);
    let dispatcher = NotificationDispatcher::from_config(&config).expect("dispatcher builds");

    let err = dispatcher
        .dispatch("standard", true, "jane@example.com", "Jane Doe")
        .await
        .expect_err("key rejected locally");

    assert!(matches!(err, NotificationError::Configuration(_)));
    assert!(captured.lock().expect("capture mutex").is_empty());
}
