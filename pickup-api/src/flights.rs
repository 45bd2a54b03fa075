use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};
use pickup_core::{planner::FLIGHT_UNAVAILABLE, FlightSnapshot};
use crate::{error::AppError, state::AppState};

pub fn routes() -> Router<AppState> {
    Router::new().route("/flight/{flight_number}", get(get_flight))
}

/// GET /flight/{flight_number}
/// Raw flight snapshot, no normalization
async fn get_flight(
    State(state): State<AppState>,
    Path(flight_number): Path<String>,
) -> Result<Json<FlightSnapshot>, AppError> {
    let snapshot = state.planner.flights().lookup(&flight_number).await.map_err(|e| {
        tracing::error!("Flight passthrough for {} failed: {}", flight_number, e);
        AppError::UpstreamError(FLIGHT_UNAVAILABLE.to_string())
    })?;

    Ok(Json(snapshot))
}
