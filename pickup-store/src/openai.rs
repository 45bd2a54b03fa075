use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use pickup_core::planner::advice_summary;
use pickup_core::{AdvisoryService, DrivingEstimate, FlightSnapshot, ProviderError};
use crate::transport_error;

pub const NOT_FOUND_SENTINEL: &str = "NOT_FOUND";

const EXTRACTION_PROMPT: &str = "Extract flight numbers from user input. Return only the flight number in format like 'AA1234' or 'UA456'. If no flight number found, return 'NOT_FOUND'.";
const ADVICE_PROMPT: &str = "Provide helpful advice for airport pickup timing. Be concise and practical.";

/// Flight-number extraction and pickup advice via OpenAI chat completions.
pub struct OpenAiAdvisor {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    max_tokens: u32,
}

#[derive(Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

impl OpenAiAdvisor {
    pub fn new(http: reqwest::Client, base_url: &str, api_key: &str, model: &str) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            model: model.to_string(),
        }
    }

    async fn complete(&self, system: &str, user: String, max_tokens: u32) -> Result<String, ProviderError> {
        if self.api_key.is_empty() {
            return Err(ProviderError::Transport("OpenAI API key not configured".to_string()));
        }

        let request = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage { role: "system".to_string(), content: system.to_string() },
                ChatMessage { role: "user".to_string(), content: user },
            ],
            max_tokens,
        };

        let response = self.http
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(transport_error)?
            .error_for_status()
            .map_err(transport_error)?
            .json::<ChatResponse>()
            .await
            .map_err(transport_error)?;

        first_choice(response)
    }
}

fn first_choice(response: ChatResponse) -> Result<String, ProviderError> {
    response.choices
        .into_iter()
        .next()
        .map(|choice| choice.message.content)
        .ok_or_else(|| ProviderError::Malformed("completion had no choices".to_string()))
}

fn parse_extraction(reply: &str) -> Option<String> {
    let reply = reply.trim();
    if reply.is_empty() || reply == NOT_FOUND_SENTINEL {
        None
    } else {
        Some(reply.to_string())
    }
}

#[async_trait]
impl AdvisoryService for OpenAiAdvisor {
    async fn extract_flight_number(&self, text: &str) -> Result<Option<String>, ProviderError> {
        let reply = self.complete(EXTRACTION_PROMPT, text.to_string(), 50).await?;
        Ok(parse_extraction(&reply))
    }

    async fn advise(
        &self,
        flight: &FlightSnapshot,
        driving: &DrivingEstimate,
        departure_time: DateTime<Utc>,
    ) -> Result<String, ProviderError> {
        let summary = advice_summary(flight, driving, departure_time);
        let reply = self.complete(ADVICE_PROMPT, summary, 200).await?;
        Ok(reply.trim().to_string())
    }
}
