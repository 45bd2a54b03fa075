use async_trait::async_trait;
use serde::Deserialize;
use pickup_core::{DrivingEstimate, ProviderError, TrafficProvider};
use crate::transport_error;

/// Live driving time from the Google Distance Matrix API.
pub struct DistanceMatrixClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

#[derive(Debug, Deserialize)]
struct MatrixResponse {
    status: String,
    #[serde(default)]
    error_message: Option<String>,
    #[serde(default)]
    rows: Vec<MatrixRow>,
}

#[derive(Debug, Deserialize)]
struct MatrixRow {
    #[serde(default)]
    elements: Vec<MatrixElement>,
}

#[derive(Debug, Deserialize)]
struct MatrixElement {
    status: String,
    duration: Option<TextValue>,
    duration_in_traffic: Option<TextValue>,
    distance: Option<TextValue>,
}

#[derive(Debug, Deserialize)]
struct TextValue {
    text: String,
    value: f64,
}

impl DistanceMatrixClient {
    pub fn new(http: reqwest::Client, base_url: &str, api_key: &str) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        }
    }
}

#[async_trait]
impl TrafficProvider for DistanceMatrixClient {
    async fn estimate(&self, origin: &str, destination: &str) -> Result<DrivingEstimate, ProviderError> {
        let body = self.http
            .get(format!("{}/distancematrix/json", self.base_url))
            .query(&[
                ("origins", origin),
                ("destinations", destination),
                ("departure_time", "now"),
                ("traffic_model", "best_guess"),
                ("key", self.api_key.as_str()),
            ])
            .send()
            .await
            .map_err(transport_error)?
            .error_for_status()
            .map_err(transport_error)?
            .json::<serde_json::Value>()
            .await
            .map_err(transport_error)?;

        estimate_from_response(body)
    }
}

/// Single origin/destination pair; prefers the traffic-adjusted duration.
fn estimate_from_response(body: serde_json::Value) -> Result<DrivingEstimate, ProviderError> {
    let response: MatrixResponse = serde_json::from_value(body)
        .map_err(|e| ProviderError::Malformed(e.to_string()))?;

    if response.status != "OK" {
        return Err(ProviderError::RouteStatus(match response.error_message {
            Some(msg) => format!("{} ({})", response.status, msg),
            None => response.status,
        }));
    }

    let element = response.rows
        .into_iter()
        .next()
        .and_then(|row| row.elements.into_iter().next())
        .ok_or_else(|| ProviderError::Malformed("empty distance matrix".to_string()))?;

    if element.status != "OK" {
        return Err(ProviderError::RouteStatus(element.status));
    }

    let duration = element.duration_in_traffic
        .or(element.duration)
        .ok_or_else(|| ProviderError::Malformed("route has no duration".to_string()))?;
    let distance = element.distance
        .ok_or_else(|| ProviderError::Malformed("route has no distance".to_string()))?;

    Ok(DrivingEstimate {
        duration_seconds: duration.value,
        distance_text: distance.text,
        distance_meters: distance.value,
    })
}
