use async_trait::async_trait;
use chrono::{DateTime, FixedOffset};
use serde::Deserialize;
use pickup_core::{FlightDataProvider, FlightSnapshot, FlightStatus, ProviderError};
use crate::transport_error;

/// Flight schedules from the AviationStack `/flights` endpoint.
pub struct AviationStackClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

#[derive(Debug, Deserialize)]
struct FlightsResponse {
    #[serde(default)]
    data: Option<Vec<FlightRecord>>,
    #[serde(default)]
    error: Option<ApiError>,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FlightRecord {
    #[serde(default)]
    flight_status: Option<FlightStatus>,
    #[serde(default)]
    airline: Option<Named>,
    #[serde(default)]
    flight: Option<FlightCode>,
    arrival: ArrivalRecord,
}

#[derive(Debug, Deserialize)]
struct Named {
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FlightCode {
    iata: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ArrivalRecord {
    iata: Option<String>,
    scheduled: Option<String>,
    estimated: Option<String>,
    gate: Option<String>,
    terminal: Option<String>,
}

impl AviationStackClient {
    pub fn new(http: reqwest::Client, base_url: &str, api_key: &str) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        }
    }
}

#[async_trait]
impl FlightDataProvider for AviationStackClient {
    async fn lookup(&self, flight_iata: &str) -> Result<FlightSnapshot, ProviderError> {
        let body = self.http
            .get(format!("{}/flights", self.base_url))
            .query(&[("access_key", self.api_key.as_str()), ("flight_iata", flight_iata)])
            .send()
            .await
            .map_err(transport_error)?
            .error_for_status()
            .map_err(transport_error)?
            .json::<serde_json::Value>()
            .await
            .map_err(transport_error)?;

        snapshot_from_response(flight_iata, body)
    }
}

fn parse_timestamp(raw: &str) -> Result<DateTime<FixedOffset>, ProviderError> {
    DateTime::parse_from_rfc3339(raw)
        .map_err(|e| ProviderError::Malformed(format!("bad arrival timestamp {:?}: {}", raw, e)))
}

/// First matching flight in an AviationStack payload.
fn snapshot_from_response(flight_iata: &str, body: serde_json::Value) -> Result<FlightSnapshot, ProviderError> {
    let response: FlightsResponse = serde_json::from_value(body)
        .map_err(|e| ProviderError::Malformed(e.to_string()))?;

    if let Some(err) = response.error {
        return Err(ProviderError::Transport(format!(
            "{}: {}",
            err.code.unwrap_or_else(|| "error".to_string()),
            err.message.unwrap_or_default()
        )));
    }

    let record = response.data
        .and_then(|flights| flights.into_iter().next())
        .ok_or_else(|| ProviderError::NotFound(flight_iata.to_string()))?;

    let scheduled = record.arrival.scheduled
        .as_deref()
        .ok_or_else(|| ProviderError::Malformed("flight has no scheduled arrival".to_string()))?;

    Ok(FlightSnapshot {
        flight_iata: record.flight
            .and_then(|f| f.iata)
            .unwrap_or_else(|| flight_iata.to_string()),
        airline: record.airline.and_then(|a| a.name),
        scheduled_arrival: parse_timestamp(scheduled)?,
        estimated_arrival: record.arrival.estimated.as_deref().and_then(|raw| parse_timestamp(raw).ok()),
        arrival_airport: record.arrival.iata,
        gate: record.arrival.gate,
        terminal: record.arrival.terminal,
        status: record.flight_status.unwrap_or(FlightStatus::Unknown),
    })
}
