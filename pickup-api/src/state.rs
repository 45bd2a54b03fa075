use std::sync::Arc;
use pickup_core::PickupPlanner;
use pickup_reminder::ReminderScheduler;

#[derive(Clone)]
pub struct AppState {
    pub planner: Arc<PickupPlanner>,
    pub reminders: ReminderScheduler,
    pub default_buffer_minutes: f64,
}
