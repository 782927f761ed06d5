//! HTTP routes for quoting, invoicing and customer email.
//!
//! JSON API Endpoints:
//! - `POST /get-quote`            : rule-table or model quote, per `pricing.mode`
//! - `POST /create-invoice`       : create an invoice with the payments provider
//! - `POST /send-quote-email`     : email the quote (priced or manual follow-up)
//! - `POST /send-scheduling-email`: render, and optionally send, the scheduling link

use std::sync::Arc;

use axum::{extract::State, http::StatusCode, routing::post, Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tintquote_agent::QuoteEstimator;
use tintquote_core::config::{AppConfig, PricingMode, SchedulingDelivery};
use tintquote_core::domain::invoice::{checked_invoice_url, InvoiceDraft};
use tintquote_core::domain::quote::{CustomerQuoteRequest, QuoteOutcome, VehicleQuoteRequest};
use tintquote_core::errors::{ApplicationError, DomainError, InterfaceError};
use tintquote_core::pricing::PricingEngine;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::mailer::{Mailer, OutgoingEmail};
use crate::payments::InvoiceGateway;
use crate::templates::{EmailTemplates, TemplateError};

pub const MANUAL_INVOICE_MESSAGE: &str =
    "Manual follow-up required: no invoice was created. A team member will contact the customer.";

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub pricing: Arc<dyn PricingEngine>,
    pub estimator: Option<QuoteEstimator>,
    pub invoices: Arc<dyn InvoiceGateway>,
    pub mailer: Arc<dyn Mailer>,
    pub templates: Arc<EmailTemplates>,
}

// ---------------------------------------------------------------------------
// Request / Response types
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
pub struct QuoteResponse {
    pub quote_price: QuoteOutcome,
}

#[derive(Debug, Deserialize)]
pub struct InvoiceRequest {
    pub email: String,
    pub amount_due: Value,
}

#[derive(Debug, Deserialize)]
pub struct QuoteEmailRequest {
    pub email: String,
    pub first_name: String,
    pub quote_price: Value,
    #[serde(default)]
    pub invoice_url: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SchedulingEmailRequest {
    pub email: String,
    pub first_name: String,
}

#[derive(Debug, PartialEq, Eq, Serialize)]
pub struct EmailResponse {
    pub status: &'static str,
    pub delivered: bool,
}

#[derive(Debug, Serialize)]
pub struct ApiError {
    pub error: String,
    pub detail: String,
    pub correlation_id: String,
}

type ApiResult<T> = Result<Json<T>, (StatusCode, Json<ApiError>)>;

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

pub fn router(state: AppState) -> Router {
    let quote_route = match state.config.pricing.mode {
        PricingMode::Rules => post(get_rule_quote),
        PricingMode::Model => post(get_model_quote),
    };

    Router::new()
        .route("/get-quote", quote_route)
        .route("/create-invoice", post(create_invoice))
        .route("/send-quote-email", post(send_quote_email))
        .route("/send-scheduling-email", post(send_scheduling_email))
        .with_state(state)
}

fn correlation_id() -> String {
    Uuid::new_v4().to_string()
}

fn reject(error: ApplicationError, correlation_id: &str) -> (StatusCode, Json<ApiError>) {
    let interface = error.into_interface(correlation_id);
    let status = match interface {
        InterfaceError::BadRequest { .. } => StatusCode::BAD_REQUEST,
        InterfaceError::BadGateway { .. } => StatusCode::BAD_GATEWAY,
        InterfaceError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
    };

    (
        status,
        Json(ApiError {
            error: interface.user_message().to_string(),
            detail: interface.message().to_string(),
            correlation_id: interface.correlation_id().to_string(),
        }),
    )
}

fn template_failure(error: TemplateError, correlation_id: &str) -> (StatusCode, Json<ApiError>) {
    error!(
        event_name = "email.template.failed",
        correlation_id = %correlation_id,
        error = %error,
        "email template failed to render"
    );
    reject(ApplicationError::Configuration(error.to_string()), correlation_id)
}

// ---------------------------------------------------------------------------
// Quote handlers
// ---------------------------------------------------------------------------

pub async fn get_rule_quote(
    State(state): State<AppState>,
    Json(request): Json<VehicleQuoteRequest>,
) -> ApiResult<QuoteResponse> {
    let correlation_id = correlation_id();
    let result = state.pricing.price(&request);

    for step in &result.steps {
        debug!(
            event_name = "quote.rules.step",
            correlation_id = %correlation_id,
            stage = %step.stage,
            detail = %step.detail,
            amount = %step.amount,
            "pricing rule applied"
        );
    }
    info!(
        event_name = "quote.rules.priced",
        correlation_id = %correlation_id,
        vehicle_make = %request.vehicle_make,
        vehicle_model = %request.vehicle_model,
        total = %result.total,
        "rule-table quote calculated"
    );

    Ok(Json(QuoteResponse { quote_price: QuoteOutcome::Price(result.total) }))
}

pub async fn get_model_quote(
    State(state): State<AppState>,
    Json(request): Json<CustomerQuoteRequest>,
) -> ApiResult<QuoteResponse> {
    let correlation_id = correlation_id();
    let estimator = state.estimator.as_ref().ok_or_else(|| {
        reject(
            ApplicationError::Configuration("model pricing is not configured".to_string()),
            &correlation_id,
        )
    })?;

    match estimator.estimate(&request).await {
        Ok(outcome) => {
            info!(
                event_name = "quote.model.priced",
                correlation_id = %correlation_id,
                booking_type = %request.booking_type,
                quote_price = %outcome,
                "model quote calculated"
            );
            Ok(Json(QuoteResponse { quote_price: outcome }))
        }
        Err(estimate_error) => {
            error!(
                event_name = "quote.model.failed",
                correlation_id = %correlation_id,
                error = %estimate_error,
                "model quote failed"
            );
            Err(reject(ApplicationError::Integration(estimate_error.to_string()), &correlation_id))
        }
    }
}

// ---------------------------------------------------------------------------
// Invoice handler
// ---------------------------------------------------------------------------

pub async fn create_invoice(
    State(state): State<AppState>,
    Json(request): Json<InvoiceRequest>,
) -> ApiResult<Value> {
    let correlation_id = correlation_id();
    let outcome = QuoteOutcome::from_json(&request.amount_due)
        .map_err(|domain_error| reject(domain_error.into(), &correlation_id))?;

    let Some(amount) = outcome.price() else {
        info!(
            event_name = "invoice.manual_follow_up",
            correlation_id = %correlation_id,
            "invoice skipped for manual follow-up quote"
        );
        return Ok(Json(json!({
            "status": "manual_follow_up",
            "message": MANUAL_INVOICE_MESSAGE,
        })));
    };

    let payments = &state.config.payments;
    let draft =
        InvoiceDraft::for_tinting(&request.email, amount, &payments.currency, &payments.location_id)
            .map_err(|domain_error| reject(domain_error.into(), &correlation_id))?;

    match state.invoices.create_invoice(&draft).await {
        Ok(invoice) => {
            info!(
                event_name = "invoice.created",
                correlation_id = %correlation_id,
                amount_cents = draft.total_cents(),
                "invoice created with payments provider"
            );
            Ok(Json(invoice))
        }
        Err(payments_error) => {
            error!(
                event_name = "invoice.failed",
                correlation_id = %correlation_id,
                error = %payments_error,
                "payments provider did not create the invoice"
            );
            Err(reject(ApplicationError::Integration(payments_error.to_string()), &correlation_id))
        }
    }
}

// ---------------------------------------------------------------------------
// Email handlers
// ---------------------------------------------------------------------------

/// Price text as the customer should read it: the caller's value with
/// surrounding whitespace and a leading `$` removed. Anything else, such as
/// digit grouping or a currency suffix, is kept as written.
fn price_text(raw: &Value) -> String {
    match raw {
        Value::String(text) => text.trim().trim_start_matches('$').trim().to_string(),
        other => other.to_string(),
    }
}

pub async fn send_quote_email(
    State(state): State<AppState>,
    Json(request): Json<QuoteEmailRequest>,
) -> ApiResult<EmailResponse> {
    let correlation_id = correlation_id();

    let rendered = if QuoteOutcome::is_marker(&request.quote_price) {
        state.templates.render_manual_quote(&request.first_name)
    } else {
        let quote_price = price_text(&request.quote_price);
        if quote_price.is_empty() || request.quote_price.is_null() {
            return Err(reject(
                DomainError::InvalidAmount(request.quote_price.to_string()).into(),
                &correlation_id,
            ));
        }
        let invoice_url = checked_invoice_url(request.invoice_url.as_deref().unwrap_or_default())
            .map_err(|domain_error| reject(domain_error.into(), &correlation_id))?;
        state.templates.render_priced_quote(&request.first_name, &quote_price, invoice_url)
    }
    .map_err(|template_error| template_failure(template_error, &correlation_id))?;
    debug!(
        event_name = "email.quote.rendered",
        correlation_id = %correlation_id,
        template = ?rendered.template,
        "quote email rendered"
    );

    let email = OutgoingEmail {
        to: request.email,
        subject: state.config.email.quote_subject.clone(),
        html_body: rendered.html,
    };
    deliver(state.mailer.as_ref(), &email, &correlation_id, "quote").await?;

    Ok(Json(EmailResponse { status: "sent", delivered: true }))
}

pub async fn send_scheduling_email(
    State(state): State<AppState>,
    Json(request): Json<SchedulingEmailRequest>,
) -> ApiResult<EmailResponse> {
    let correlation_id = correlation_id();
    let html = state
        .templates
        .render_scheduling(&request.first_name, &state.config.email.scheduling_url)
        .map_err(|template_error| template_failure(template_error, &correlation_id))?;

    match state.config.email.scheduling_delivery {
        SchedulingDelivery::RenderOnly => {
            warn!(
                event_name = "email.scheduling.not_transmitted",
                correlation_id = %correlation_id,
                body_len = html.len(),
                "scheduling email rendered but not transmitted (email.scheduling_delivery = render_only)"
            );
            Ok(Json(EmailResponse { status: "rendered", delivered: false }))
        }
        SchedulingDelivery::Smtp => {
            let email = OutgoingEmail {
                to: request.email,
                subject: state.config.email.scheduling_subject.clone(),
                html_body: html,
            };
            deliver(state.mailer.as_ref(), &email, &correlation_id, "scheduling").await?;
            Ok(Json(EmailResponse { status: "sent", delivered: true }))
        }
    }
}

async fn deliver(
    mailer: &dyn Mailer,
    email: &OutgoingEmail,
    correlation_id: &str,
    kind: &'static str,
) -> Result<(), (StatusCode, Json<ApiError>)> {
    match mailer.send(email).await {
        Ok(()) => {
            info!(
                event_name = "email.sent",
                correlation_id = %correlation_id,
                email_kind = kind,
                "email handed to relay"
            );
            Ok(())
        }
        Err(mail_error) => {
            error!(
                event_name = "email.failed",
                correlation_id = %correlation_id,
                email_kind = kind,
                error = %mail_error,
                "email delivery failed"
            );
            Err(reject(ApplicationError::Delivery(mail_error.to_string()), correlation_id))
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use axum::Router;
    use serde_json::{json, Value};
    use tintquote_agent::{LlmClient, LlmError, QuoteEstimator};
    use tintquote_core::config::{AppConfig, PricingMode, SchedulingDelivery};
    use tintquote_core::domain::invoice::InvoiceDraft;
    use tintquote_core::pricing::RuleTablePricingEngine;
    use tower::ServiceExt;

    use super::{router, AppState, MANUAL_INVOICE_MESSAGE};
    use crate::mailer::{MailError, Mailer, OutgoingEmail};
    use crate::payments::{InvoiceGateway, PaymentsError};
    use crate::templates::EmailTemplates;

    #[derive(Default)]
    struct RecordingInvoices {
        drafts: Mutex<Vec<InvoiceDraft>>,
        failure: Option<PaymentsError>,
    }

    #[async_trait]
    impl InvoiceGateway for RecordingInvoices {
        async fn create_invoice(&self, draft: &InvoiceDraft) -> Result<Value, PaymentsError> {
            self.drafts.lock().expect("drafts lock").push(draft.clone());
            match &self.failure {
                Some(error) => Err(error.clone()),
                None => Ok(json!({ "invoice": { "id": "inv_1", "status": "DRAFT" } })),
            }
        }
    }

    #[derive(Default)]
    struct RecordingMailer {
        sent: Mutex<Vec<OutgoingEmail>>,
        failure: Option<MailError>,
    }

    #[async_trait]
    impl Mailer for RecordingMailer {
        async fn send(&self, email: &OutgoingEmail) -> Result<(), MailError> {
            if let Some(error) = &self.failure {
                return Err(error.clone());
            }
            self.sent.lock().expect("sent lock").push(email.clone());
            Ok(())
        }
    }

    struct CountingLlm {
        reply: Result<String, LlmError>,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl LlmClient for CountingLlm {
        async fn complete(&self, _prompt: &str) -> Result<String, LlmError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.reply.clone()
        }
    }

    struct Harness {
        invoices: Arc<RecordingInvoices>,
        mailer: Arc<RecordingMailer>,
        llm: Arc<CountingLlm>,
        config: AppConfig,
    }

    impl Harness {
        fn new() -> Self {
            let mut config = AppConfig::default();
            config.payments.location_id = "LOC-MAIN".to_string();
            Self {
                invoices: Arc::new(RecordingInvoices::default()),
                mailer: Arc::new(RecordingMailer::default()),
                llm: Arc::new(CountingLlm { reply: Ok("$450".to_string()), calls: AtomicUsize::new(0) }),
                config,
            }
        }

        fn app(&self) -> Router {
            let estimator = match self.config.pricing.mode {
                PricingMode::Model => Some(QuoteEstimator::new(self.llm.clone())),
                PricingMode::Rules => None,
            };
            router(AppState {
                config: Arc::new(self.config.clone()),
                pricing: Arc::new(RuleTablePricingEngine::default()),
                estimator,
                invoices: self.invoices.clone(),
                mailer: self.mailer.clone(),
                templates: Arc::new(EmailTemplates::embedded().expect("templates")),
            })
        }
    }

    async fn post_json(app: Router, uri: &str, body: Value) -> (StatusCode, Value) {
        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri(uri)
                    .header("content-type", "application/json")
                    .body(Body::from(body.to_string()))
                    .expect("request"),
            )
            .await
            .expect("response");
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.expect("body");
        let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, value)
    }

    fn customer_form(booking_type: &str) -> Value {
        json!({
            "Whats Your Name First Name": "Dana",
            "Whats Your Name Last Name": "Reyes",
            "Email": "dana@example.com",
            "Phone": "555-0100",
            "Booking Type": booking_type,
            "Tint Selection": "Full Vehicle Ceramic",
            "Vehicle Year Make Model": "2021 Chevrolet Tahoe",
            "Old Tint Removal": "No"
        })
    }

    #[tokio::test]
    async fn rule_quote_for_tahoe_suv_with_ceramic_tint_is_400() {
        let harness = Harness::new();

        let (status, body) = post_json(
            harness.app(),
            "/get-quote",
            json!({
                "vehicle_year": "2021",
                "vehicle_make": "Chevrolet",
                "vehicle_model": "Tahoe SUV",
                "tint_package": "Full",
                "extras": ["Ceramic Tint"]
            }),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "quote_price": 400 }));
    }

    #[tokio::test]
    async fn rule_quote_with_missing_field_is_a_client_error() {
        let harness = Harness::new();

        let (status, _) =
            post_json(harness.app(), "/get-quote", json!({ "vehicle_model": "Tahoe SUV" })).await;

        assert!(status.is_client_error());
    }

    #[tokio::test]
    async fn model_quote_for_building_skips_the_model() {
        let mut harness = Harness::new();
        harness.config.pricing.mode = PricingMode::Model;

        let (status, body) =
            post_json(harness.app(), "/get-quote", customer_form("Building")).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "quote_price": "MANUAL_FOLLOW_UP" }));
        assert_eq!(harness.llm.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn model_quote_for_vehicle_returns_parsed_price() {
        let mut harness = Harness::new();
        harness.config.pricing.mode = PricingMode::Model;

        let (status, body) = post_json(harness.app(), "/get-quote", customer_form("Vehicle")).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "quote_price": 450 }));
        assert_eq!(harness.llm.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn model_failure_is_a_bad_gateway_not_a_price() {
        let mut harness = Harness::new();
        harness.config.pricing.mode = PricingMode::Model;
        harness.llm = Arc::new(CountingLlm {
            reply: Err(LlmError::Status { status: 500, body: "boom".to_string() }),
            calls: AtomicUsize::new(0),
        });

        let (status, body) = post_json(harness.app(), "/get-quote", customer_form("Vehicle")).await;

        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert!(body.get("quote_price").is_none());
        assert!(body["correlation_id"].as_str().is_some_and(|id| !id.is_empty()));
    }

    #[tokio::test]
    async fn manual_follow_up_invoice_never_reaches_the_provider() {
        let harness = Harness::new();

        let (status, body) = post_json(
            harness.app(),
            "/create-invoice",
            json!({ "email": "dana@example.com", "amount_due": "MANUAL_FOLLOW_UP" }),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "manual_follow_up");
        assert_eq!(body["message"], MANUAL_INVOICE_MESSAGE);
        assert!(harness.invoices.drafts.lock().expect("drafts lock").is_empty());
    }

    #[tokio::test]
    async fn invoice_amount_is_sent_in_cents() {
        let harness = Harness::new();

        let (status, body) = post_json(
            harness.app(),
            "/create-invoice",
            json!({ "email": "dana@example.com", "amount_due": "425.5" }),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["invoice"]["id"], "inv_1");
        let drafts = harness.invoices.drafts.lock().expect("drafts lock");
        assert_eq!(drafts.len(), 1);
        assert_eq!(drafts[0].total_cents(), 42_550);
        assert_eq!(drafts[0].location_id, "LOC-MAIN");
    }

    #[tokio::test]
    async fn non_numeric_invoice_amount_is_rejected() {
        let harness = Harness::new();

        let (status, body) = post_json(
            harness.app(),
            "/create-invoice",
            json!({ "email": "dana@example.com", "amount_due": "call me" }),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["detail"].as_str().is_some_and(|detail| detail.contains("call me")));
        assert!(harness.invoices.drafts.lock().expect("drafts lock").is_empty());
    }

    #[tokio::test]
    async fn negative_invoice_amount_is_rejected() {
        let harness = Harness::new();

        let (status, body) = post_json(
            harness.app(),
            "/create-invoice",
            json!({ "email": "dana@example.com", "amount_due": -25 }),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["detail"].as_str().is_some_and(|detail| detail.contains("negative")));
        assert!(harness.invoices.drafts.lock().expect("drafts lock").is_empty());
    }

    #[tokio::test]
    async fn oversized_invoice_amounts_are_bad_requests() {
        let harness = Harness::new();

        for amount_due in [json!("79228162514264337593543950335"), json!("1e27"), json!(1e20)] {
            let (status, body) = post_json(
                harness.app(),
                "/create-invoice",
                json!({ "email": "dana@example.com", "amount_due": amount_due }),
            )
            .await;

            assert_eq!(status, StatusCode::BAD_REQUEST, "amount {amount_due}");
            assert!(body["correlation_id"].as_str().is_some_and(|id| !id.is_empty()));
        }
        assert!(harness.invoices.drafts.lock().expect("drafts lock").is_empty());
    }

    #[tokio::test]
    async fn provider_failure_is_reported_as_bad_gateway() {
        let mut harness = Harness::new();
        harness.invoices = Arc::new(RecordingInvoices {
            failure: Some(PaymentsError::Transport("connection refused".to_string())),
            ..RecordingInvoices::default()
        });

        let (status, body) = post_json(
            harness.app(),
            "/create-invoice",
            json!({ "email": "dana@example.com", "amount_due": 400 }),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert!(body["detail"].as_str().is_some_and(|detail| detail.contains("connection refused")));
    }

    #[tokio::test]
    async fn priced_quote_email_uses_priced_template() {
        let harness = Harness::new();

        let (status, body) = post_json(
            harness.app(),
            "/send-quote-email",
            json!({
                "email": "dana@example.com",
                "first_name": "Dana",
                "quote_price": "525",
                "invoice_url": "https://pay.example.com/inv_1"
            }),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "status": "sent", "delivered": true }));
        let sent = harness.mailer.sent.lock().expect("sent lock");
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].to, "dana@example.com");
        assert!(sent[0].html_body.contains("$525"));
        assert!(sent[0].html_body.contains("https://pay.example.com/inv_1"));
    }

    #[tokio::test]
    async fn formatted_price_text_is_emailed_as_written() {
        let harness = Harness::new();

        let (status, _) = post_json(
            harness.app(),
            "/send-quote-email",
            json!({
                "email": "dana@example.com",
                "first_name": "Dana",
                "quote_price": "$1,200",
                "invoice_url": "https://pay.example.com/inv_2"
            }),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        let sent = harness.mailer.sent.lock().expect("sent lock");
        assert_eq!(sent.len(), 1);
        assert!(sent[0].html_body.contains("$1,200"));
        assert!(!sent[0].html_body.contains("$$"));
        assert!(!sent[0].html_body.contains("will contact you"));
    }

    #[tokio::test]
    async fn priced_quote_email_rejects_non_http_invoice_url() {
        let harness = Harness::new();

        let (status, body) = post_json(
            harness.app(),
            "/send-quote-email",
            json!({
                "email": "dana@example.com",
                "first_name": "Dana",
                "quote_price": 400,
                "invoice_url": "\"><script>alert(1)</script>"
            }),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["detail"].as_str().is_some_and(|detail| detail.contains("invoice url")));
        assert!(harness.mailer.sent.lock().expect("sent lock").is_empty());
    }

    #[tokio::test]
    async fn marker_quote_email_uses_manual_template() {
        let harness = Harness::new();

        let (status, _) = post_json(
            harness.app(),
            "/send-quote-email",
            json!({
                "email": "dana@example.com",
                "first_name": "Dana",
                "quote_price": "MANUAL_FOLLOW_UP"
            }),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        let sent = harness.mailer.sent.lock().expect("sent lock");
        assert!(sent[0].html_body.contains("will contact you"));
        assert!(!sent[0].html_body.contains("invoice"));
    }

    #[tokio::test]
    async fn priced_quote_email_without_invoice_url_is_rejected() {
        let harness = Harness::new();

        let (status, _) = post_json(
            harness.app(),
            "/send-quote-email",
            json!({ "email": "dana@example.com", "first_name": "Dana", "quote_price": 400 }),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(harness.mailer.sent.lock().expect("sent lock").is_empty());
    }

    #[tokio::test]
    async fn quote_email_delivery_failure_is_visible_to_caller() {
        let mut harness = Harness::new();
        harness.mailer = Arc::new(RecordingMailer {
            failure: Some(MailError::Smtp("535 authentication failed".to_string())),
            ..RecordingMailer::default()
        });

        let (status, body) = post_json(
            harness.app(),
            "/send-quote-email",
            json!({
                "email": "dana@example.com",
                "first_name": "Dana",
                "quote_price": "MANUAL_FOLLOW_UP"
            }),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert!(body["detail"].as_str().is_some_and(|detail| detail.contains("535")));
    }

    #[tokio::test]
    async fn scheduling_email_is_rendered_but_not_sent_by_default() {
        let harness = Harness::new();

        let (status, body) = post_json(
            harness.app(),
            "/send-scheduling-email",
            json!({ "email": "dana@example.com", "first_name": "Dana" }),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "status": "rendered", "delivered": false }));
        assert!(harness.mailer.sent.lock().expect("sent lock").is_empty());
    }

    #[tokio::test]
    async fn scheduling_email_is_sent_when_smtp_delivery_is_enabled() {
        let mut harness = Harness::new();
        harness.config.email.scheduling_delivery = SchedulingDelivery::Smtp;

        let (status, body) = post_json(
            harness.app(),
            "/send-scheduling-email",
            json!({ "email": "dana@example.com", "first_name": "Dana" }),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "status": "sent", "delivered": true }));
        let sent = harness.mailer.sent.lock().expect("sent lock");
        assert!(sent[0].html_body.contains(&harness.config.email.scheduling_url));
    }
}
