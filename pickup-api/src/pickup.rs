use axum::{
    extract::{rejection::JsonRejection, State},
    routing::post,
    Json, Router,
};
use chrono::SecondsFormat;
use serde::{Deserialize, Serialize};
use pickup_core::{FlightStatus, PickupPlan, PlanRequest};
use crate::{error::AppError, state::AppState};

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanPickupRequest {
    pub flight_number: Option<String>,
    pub current_location: Option<String>,
    pub airport_code: Option<String>,
    pub buffer_minutes: Option<f64>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanPickupResponse {
    pub flight_number: String,
    pub flight_info: FlightInfo,
    pub driving_time: DrivingTime,
    pub departure_time: String,
    pub advice: String,
}

#[derive(Debug, Serialize)]
pub struct FlightInfo {
    pub airline: Option<String>,
    pub arrival: String,
    pub gate: Option<String>,
    pub terminal: Option<String>,
    pub status: FlightStatus,
}

#[derive(Debug, Serialize)]
pub struct DrivingTime {
    /// Whole minutes
    pub duration: i64,
    pub distance: String,
}

impl From<PickupPlan> for PlanPickupResponse {
    fn from(plan: PickupPlan) -> Self {
        Self {
            flight_number: plan.flight_number,
            flight_info: FlightInfo {
                airline: plan.flight.airline,
                arrival: plan.flight.scheduled_arrival.to_rfc3339(),
                gate: plan.flight.gate,
                terminal: plan.flight.terminal,
                status: plan.flight.status,
            },
            driving_time: DrivingTime {
                duration: plan.driving.rounded_minutes(),
                distance: plan.driving.distance_text,
            },
            departure_time: plan.departure_time.to_rfc3339_opts(SecondsFormat::Millis, true),
            advice: plan.advice,
        }
    }
}

// ============================================================================
// Handlers
// ============================================================================

pub fn routes() -> Router<AppState> {
    Router::new().route("/plan-pickup", post(plan_pickup))
}

/// POST /plan-pickup
/// Work out when to leave for the airport
async fn plan_pickup(
    State(state): State<AppState>,
    payload: Result<Json<PlanPickupRequest>, JsonRejection>,
) -> Result<Json<PlanPickupResponse>, AppError> {
    let Json(req) = payload?;

    let request = PlanRequest::new(
        req.flight_number.as_deref().unwrap_or_default(),
        req.current_location.as_deref().unwrap_or_default(),
        req.airport_code.as_deref().unwrap_or_default(),
    )
    .with_buffer(req.buffer_minutes.unwrap_or(state.default_buffer_minutes));

    let plan = state.planner.plan_pickup(&request).await?;
    Ok(Json(plan.into()))
}
