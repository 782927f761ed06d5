use axum::{extract::State, routing::get, Json, Router};
use chrono::Utc;
use serde::Serialize;
use tintquote_core::config::{PricingMode, SchedulingDelivery};

#[derive(Clone)]
pub struct HealthState {
    pricing_mode: PricingMode,
    scheduling_delivery: SchedulingDelivery,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub pricing_mode: PricingMode,
    pub scheduling_delivery: SchedulingDelivery,
    pub checked_at: String,
}

pub fn router(pricing_mode: PricingMode, scheduling_delivery: SchedulingDelivery) -> Router {
    Router::new()
        .route("/health", get(health))
        .with_state(HealthState { pricing_mode, scheduling_delivery })
}

pub async fn health(State(state): State<HealthState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ready",
        pricing_mode: state.pricing_mode,
        scheduling_delivery: state.scheduling_delivery,
        checked_at: Utc::now().to_rfc3339(),
    })
}
