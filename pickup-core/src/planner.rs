use std::sync::Arc;
use chrono::Utc;
use tracing::{error, info, warn};
use crate::departure::{compute_departure, DEFAULT_BUFFER_MINUTES, MAX_OFFSET_MINUTES};
use crate::flight_number;
use crate::models::PickupPlan;
use crate::providers::{AdvisoryService, FlightDataProvider, TrafficProvider};
use crate::{CoreError, CoreResult};

pub const FALLBACK_ADVICE: &str =
    "Safe travels! Remember to account for parking and walking time at the airport.";

pub const FLIGHT_UNAVAILABLE: &str = "Unable to fetch flight information";
pub const TRAFFIC_UNAVAILABLE: &str = "Unable to fetch traffic information";
pub const DEPARTURE_OUT_OF_RANGE: &str = "Unable to compute departure time";

#[derive(Debug, Clone)]
pub struct PlanRequest {
    pub flight_number: String,
    pub current_location: String,
    pub airport_code: String,
    pub buffer_minutes: f64,
}

impl PlanRequest {
    pub fn new(flight_number: &str, current_location: &str, airport_code: &str) -> Self {
        Self {
            flight_number: flight_number.to_string(),
            current_location: current_location.to_string(),
            airport_code: airport_code.to_string(),
            buffer_minutes: DEFAULT_BUFFER_MINUTES,
        }
    }

    pub fn with_buffer(mut self, buffer_minutes: f64) -> Self {
        self.buffer_minutes = buffer_minutes;
        self
    }

    fn validate(&self) -> CoreResult<()> {
        if self.flight_number.trim().is_empty() {
            return Err(CoreError::InvalidInput("flightNumber is required".to_string()));
        }
        if self.current_location.trim().is_empty() {
            return Err(CoreError::InvalidInput("currentLocation is required".to_string()));
        }
        if self.airport_code.trim().is_empty() {
            return Err(CoreError::InvalidInput("airportCode is required".to_string()));
        }
        if !self.buffer_minutes.is_finite() || self.buffer_minutes < 0.0 {
            return Err(CoreError::InvalidInput("bufferMinutes must be a non-negative number".to_string()));
        }
        if self.buffer_minutes > MAX_OFFSET_MINUTES {
            return Err(CoreError::InvalidInput(format!(
                "bufferMinutes must not exceed {}",
                MAX_OFFSET_MINUTES
            )));
        }
        Ok(())
    }

    fn destination(&self) -> String {
        format!("{} Airport", self.airport_code.trim())
    }
}

/// Turns a flight number and a starting point into a departure time.
///
/// Stateless between calls; every `plan_pickup` is independent.
pub struct PickupPlanner {
    flights: Arc<dyn FlightDataProvider>,
    traffic: Arc<dyn TrafficProvider>,
    advisory: Arc<dyn AdvisoryService>,
}

impl PickupPlanner {
    pub fn new(
        flights: Arc<dyn FlightDataProvider>,
        traffic: Arc<dyn TrafficProvider>,
        advisory: Arc<dyn AdvisoryService>,
    ) -> Self {
        Self { flights, traffic, advisory }
    }

    pub fn flights(&self) -> &Arc<dyn FlightDataProvider> {
        &self.flights
    }

    pub async fn plan_pickup(&self, req: &PlanRequest) -> CoreResult<PickupPlan> {
        req.validate()?;

        // 1. Normalize
        let flight_number = flight_number::normalize(&req.flight_number, self.advisory.as_ref())
            .await
            .ok_or_else(|| CoreError::InvalidInput("Unable to parse flight number".to_string()))?;

        // 2 + 3. Flight and traffic lookups are independent; both must land before arithmetic
        let destination = req.destination();
        let (flight, driving) = tokio::join!(
            self.flights.lookup(&flight_number),
            self.traffic.estimate(&req.current_location, &destination),
        );

        let flight = flight.map_err(|e| {
            error!("Flight lookup for {} failed: {}", flight_number, e);
            CoreError::UpstreamUnavailable(FLIGHT_UNAVAILABLE.to_string())
        })?;
        let driving = driving.map_err(|e| {
            error!("Traffic estimate to {} failed: {}", destination, e);
            CoreError::UpstreamUnavailable(TRAFFIC_UNAVAILABLE.to_string())
        })?;

        // 4. Arithmetic
        let departure_time = compute_departure(
            &flight.scheduled_arrival,
            driving.duration_minutes(),
            req.buffer_minutes,
        )
        .ok_or_else(|| {
            error!(
                "Departure for {} out of range: arrival {}, driving {} min",
                flight_number,
                flight.scheduled_arrival,
                driving.duration_minutes()
            );
            CoreError::UpstreamUnavailable(DEPARTURE_OUT_OF_RANGE.to_string())
        })?
        .with_timezone(&Utc);

        // 5. Advice is best-effort
        let advice = match self.advisory.advise(&flight, &driving, departure_time).await {
            Ok(text) => text,
            Err(e) => {
                warn!("Advisory degraded for {}: {}", flight_number, e);
                FALLBACK_ADVICE.to_string()
            }
        };

        info!(
            "Planned pickup for {}: arrival {}, driving {} min, leave at {}",
            flight_number,
            flight.scheduled_arrival,
            driving.rounded_minutes(),
            departure_time
        );

        Ok(PickupPlan {
            flight_number,
            flight,
            driving,
            departure_time,
            advice,
        })
    }
}

/// One-line summary handed to the advisory service.
pub fn advice_summary(
    flight: &crate::models::FlightSnapshot,
    driving: &crate::models::DrivingEstimate,
    departure_time: chrono::DateTime<Utc>,
) -> String {
    format!(
        "Flight: {}, Arrival: {}, Driving time: {} minutes, Departure time: {}",
        flight.flight_iata,
        flight.scheduled_arrival.to_rfc3339(),
        driving.rounded_minutes(),
        departure_time.format("%Y-%m-%d %H:%M UTC"),
    )
}
