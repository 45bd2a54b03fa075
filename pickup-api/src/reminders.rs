use std::convert::Infallible;
use axum::{
    extract::{rejection::JsonRejection, Path, State},
    response::sse::{Event, KeepAlive, Sse},
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, SecondsFormat, Utc};
use futures_util::{Stream, StreamExt};
use serde::{Deserialize, Serialize};
use tokio_stream::wrappers::BroadcastStream;
use pickup_reminder::{parse_departure_time, Reminder, ReminderError, ReminderStatus};
use pickup_shared::models::events::ReminderEvent;
use crate::{error::AppError, state::AppState};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetReminderRequest {
    pub departure_time: Option<String>,
    pub reminder_minutes: Option<f64>,
    pub phone_number: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SetReminderResponse {
    pub success: bool,
    pub reminder_id: String,
    pub reminder_time: String,
    pub message: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReminderView {
    pub reminder_id: String,
    pub departure_time: String,
    pub reminder_time: String,
    pub lead_minutes: f64,
    pub status: ReminderStatus,
    pub fired: bool,
}

fn iso(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}

impl From<Reminder> for ReminderView {
    fn from(reminder: Reminder) -> Self {
        Self {
            fired: reminder.is_fired(),
            reminder_id: reminder.id,
            departure_time: iso(reminder.departure_time),
            reminder_time: iso(reminder.alert_at),
            lead_minutes: reminder.lead_minutes,
            status: reminder.status,
        }
    }
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/set-reminder", post(set_reminder))
        .route("/reminders/events", get(reminder_events))
        .route("/reminders/{id}", get(get_reminder).delete(cancel_reminder))
}

/// POST /set-reminder
async fn set_reminder(
    State(state): State<AppState>,
    payload: Result<Json<SetReminderRequest>, JsonRejection>,
) -> Result<Json<SetReminderResponse>, AppError> {
    let Json(req) = payload?;

    let raw_departure = req.departure_time
        .ok_or_else(|| ReminderError::SchedulingFault("departureTime is required".to_string()))?;
    let departure_time = parse_departure_time(&raw_departure)?;

    let reminder = state.reminders.create(
        departure_time,
        req.reminder_minutes,
        req.phone_number.as_deref().unwrap_or_default(),
    )?;

    Ok(Json(SetReminderResponse {
        success: true,
        message: format!("Reminder set for {}", reminder.alert_at.format("%b %-d, %Y %H:%M UTC")),
        reminder_time: iso(reminder.alert_at),
        reminder_id: reminder.id,
    }))
}

/// GET /reminders/{id}
async fn get_reminder(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ReminderView>, AppError> {
    let reminder = state.reminders
        .get(&id)
        .ok_or_else(|| ReminderError::NotFound(id.clone()))?;
    Ok(Json(reminder.into()))
}

/// DELETE /reminders/{id}
async fn cancel_reminder(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ReminderView>, AppError> {
    let reminder = state.reminders.cancel(&id)?;
    Ok(Json(reminder.into()))
}

/// GET /reminders/events
/// Server-sent stream of reminder lifecycle events
async fn reminder_events(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let stream = BroadcastStream::new(state.reminders.subscribe()).filter_map(|result| async move {
        let event = result.ok()?;
        let name = match &event {
            ReminderEvent::Scheduled { .. } => "reminder_scheduled",
            ReminderEvent::Fired { .. } => "reminder_fired",
            ReminderEvent::Cancelled { .. } => "reminder_cancelled",
        };
        Event::default()
            .event(name)
            .id(event.reminder_id())
            .json_data(&event)
            .ok()
            .map(Ok)
    });

    Sse::new(stream).keep_alive(KeepAlive::default())
}
