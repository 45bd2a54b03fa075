use std::sync::Arc;
use std::time::Duration;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use tokio::sync::broadcast;
use tokio::task::{AbortHandle, JoinHandle};
use tracing::{debug, error, info};
use pickup_core::departure::MAX_OFFSET_MINUTES;
use pickup_core::Notifier;
use pickup_shared::models::events::ReminderEvent;
use crate::models::{Reminder, ReminderSettings, ReminderStatus};
use crate::ReminderError;

/// Upper bound on a single timer sleep. The wall clock is re-read after each
/// slice, so a clock adjustment delays the alert by at most one slice.
const MAX_TIMER_SLICE: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FireOutcome {
    Dispatched,
    NotDue,
    AlreadySettled,
    Missing,
}

struct Inner {
    reminders: DashMap<String, Reminder>,
    timers: DashMap<String, AbortHandle>,
    notifier: Arc<dyn Notifier>,
    events: broadcast::Sender<ReminderEvent>,
    settings: ReminderSettings,
}

/// In-memory, bounded registry of one-shot reminders.
///
/// Each entry is guarded independently; creating, firing or cancelling one
/// reminder never blocks another.
#[derive(Clone)]
pub struct ReminderScheduler {
    inner: Arc<Inner>,
}

impl ReminderScheduler {
    pub fn new(notifier: Arc<dyn Notifier>, settings: ReminderSettings) -> Self {
        let (events, _) = broadcast::channel(100);
        Self {
            inner: Arc::new(Inner {
                reminders: DashMap::new(),
                timers: DashMap::new(),
                notifier,
                events,
                settings,
            }),
        }
    }

    pub fn settings(&self) -> &ReminderSettings {
        &self.inner.settings
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ReminderEvent> {
        self.inner.events.subscribe()
    }

    /// Register a reminder and arm its timer. Returns immediately; firing
    /// happens on a background task.
    pub fn create(
        &self,
        departure_time: DateTime<Utc>,
        lead_minutes: Option<f64>,
        channel_address: &str,
    ) -> Result<Reminder, ReminderError> {
        let lead_minutes = lead_minutes.unwrap_or(self.inner.settings.default_lead_minutes);
        if !lead_minutes.is_finite() || lead_minutes < 0.0 {
            return Err(ReminderError::InvalidInput("reminderMinutes must be a non-negative number".to_string()));
        }
        if lead_minutes > MAX_OFFSET_MINUTES {
            return Err(ReminderError::InvalidInput(format!(
                "reminderMinutes must not exceed {}",
                MAX_OFFSET_MINUTES
            )));
        }
        if channel_address.trim().is_empty() {
            return Err(ReminderError::InvalidInput("phoneNumber is required".to_string()));
        }

        if self.inner.reminders.len() >= self.inner.settings.max_entries {
            self.sweep(Utc::now());
            if self.inner.reminders.len() >= self.inner.settings.max_entries {
                return Err(ReminderError::RegistryFull);
            }
        }

        let reminder = Reminder::new(departure_time, lead_minutes, channel_address.trim().to_string())?;
        let id = reminder.id.clone();
        let alert_at = reminder.alert_at;
        self.inner.reminders.insert(id.clone(), reminder.clone());

        info!(
            "Reminder {} scheduled for {} (departure {}, channel {})",
            id, alert_at, departure_time, reminder.channel_address
        );
        let _ = self.inner.events.send(ReminderEvent::Scheduled {
            reminder_id: id.clone(),
            departure_time,
            alert_at,
        });

        let timer = self.clone();
        let timer_id = id.clone();
        let handle = tokio::spawn(async move {
            let outcome = timer.run_timer(&timer_id, alert_at).await;
            debug!("Timer for reminder {} finished: {:?}", timer_id, outcome);
        });
        self.inner.timers.insert(id.clone(), handle.abort_handle());
        // A timer that settled first found no handle to remove
        if self.get(&id).map_or(true, |r| r.status.is_terminal()) {
            self.inner.timers.remove(&id);
        }

        Ok(reminder)
    }

    /// Sleep until `wake_at`, then fire. A `NotDue` answer (the wall clock
    /// stepped backwards while sleeping) re-arms against the stored alert time.
    async fn run_timer(&self, id: &str, mut wake_at: DateTime<Utc>) -> FireOutcome {
        loop {
            self.wait_until(wake_at).await;
            match self.fire(id).await {
                FireOutcome::NotDue => match self.get(id) {
                    Some(reminder) => wake_at = reminder.alert_at,
                    None => return FireOutcome::Missing,
                },
                outcome => return outcome,
            }
        }
    }

    async fn wait_until(&self, alert_at: DateTime<Utc>) {
        loop {
            let remaining = match (alert_at - Utc::now()).to_std() {
                Ok(d) if !d.is_zero() => d,
                // Negative or zero: already due
                _ => return,
            };
            tokio::time::sleep(remaining.min(MAX_TIMER_SLICE)).await;
        }
    }

    /// Timer callback. Dispatches at most once per reminder no matter how many
    /// times it is invoked.
    pub async fn fire(&self, id: &str) -> FireOutcome {
        let now = Utc::now();
        let claimed = {
            let mut entry = match self.inner.reminders.get_mut(id) {
                Some(entry) => entry,
                None => return FireOutcome::Missing,
            };
            if entry.status.is_terminal() {
                return FireOutcome::AlreadySettled;
            }
            if !entry.is_due(now) {
                return FireOutcome::NotDue;
            }
            entry.status = ReminderStatus::Fired;
            entry.settled_at = Some(now);
            entry.clone()
        };
        self.inner.timers.remove(id);

        let message = claimed.notification_message();
        info!("REMINDER {} -> {}: {}", claimed.id, claimed.channel_address, message);
        if let Err(e) = self.inner.notifier.notify(claimed.channel_address.inner(), &message).await {
            error!("Failed to deliver reminder {}: {}", claimed.id, e);
        }

        let _ = self.inner.events.send(ReminderEvent::Fired {
            reminder_id: claimed.id,
            departure_time: claimed.departure_time,
            fired_at: now,
        });
        FireOutcome::Dispatched
    }

    /// Disarm a scheduled reminder.
    pub fn cancel(&self, id: &str) -> Result<Reminder, ReminderError> {
        let now = Utc::now();
        let cancelled = {
            let mut entry = self.inner.reminders
                .get_mut(id)
                .ok_or_else(|| ReminderError::NotFound(id.to_string()))?;
            if entry.status.is_terminal() {
                return Err(ReminderError::AlreadySettled(id.to_string()));
            }
            entry.status = ReminderStatus::Cancelled;
            entry.settled_at = Some(now);
            entry.clone()
        };

        if let Some((_, handle)) = self.inner.timers.remove(id) {
            handle.abort();
        }

        info!("Reminder {} cancelled", id);
        let _ = self.inner.events.send(ReminderEvent::Cancelled {
            reminder_id: id.to_string(),
            cancelled_at: now,
        });
        Ok(cancelled)
    }

    pub fn get(&self, id: &str) -> Option<Reminder> {
        self.inner.reminders.get(id).map(|entry| entry.clone())
    }

    pub fn len(&self) -> usize {
        self.inner.reminders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.reminders.is_empty()
    }

    /// Reminders still waiting to fire.
    pub fn active_count(&self) -> usize {
        self.inner.reminders
            .iter()
            .filter(|entry| entry.status == ReminderStatus::Scheduled)
            .count()
    }

    /// Evict fired and cancelled reminders older than the retention window.
    pub fn sweep(&self, now: DateTime<Utc>) -> usize {
        let retention = chrono::Duration::from_std(self.inner.settings.retention)
            .unwrap_or_else(|_| chrono::Duration::days(365));
        let before = self.inner.reminders.len();

        self.inner.reminders.retain(|_, reminder| match reminder.settled_at {
            Some(settled_at) if reminder.status.is_terminal() => {
                settled_at.checked_add_signed(retention).map_or(true, |expiry| expiry > now)
            }
            _ => true,
        });
        self.inner.timers.retain(|id, _| self.inner.reminders.contains_key(id));

        let evicted = before.saturating_sub(self.inner.reminders.len());
        if evicted > 0 {
            debug!("Evicted {} settled reminders", evicted);
        }
        evicted
    }

    /// Periodic eviction loop; runs for the life of the process.
    pub fn spawn_sweeper(&self) -> JoinHandle<()> {
        let scheduler = self.clone();
        let period = self.inner.settings.sweep_interval;
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            info!("Reminder sweeper started, interval {:?}", period);
            loop {
                interval.tick().await;
                let evicted = scheduler.sweep(Utc::now());
                if evicted > 0 {
                    info!("Reminder sweep evicted {}, {} remain", evicted, scheduler.len());
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use pickup_core::ProviderError;
    use std::sync::Mutex;
    use tokio::time::timeout;

    #[derive(Default)]
    struct RecordingNotifier {
        sent: Mutex<Vec<(String, String)>>,
    }

    #[async_trait]
    impl Notifier for RecordingNotifier {
        async fn notify(&self, channel_address: &str, message: &str) -> Result<(), ProviderError> {
            self.sent.lock().unwrap().push((channel_address.to_string(), message.to_string()));
            Ok(())
        }
    }

    fn scheduler_with(settings: ReminderSettings) -> (ReminderScheduler, Arc<RecordingNotifier>) {
        let notifier = Arc::new(RecordingNotifier::default());
        (ReminderScheduler::new(notifier.clone(), settings), notifier)
    }

    async fn wait_for_fire(rx: &mut broadcast::Receiver<ReminderEvent>, id: &str) {
        timeout(Duration::from_secs(5), async {
            loop {
                match rx.recv().await {
                    Ok(ReminderEvent::Fired { reminder_id, .. }) if reminder_id == id => return,
                    Ok(_) => continue,
                    Err(e) => panic!("event channel closed: {:?}", e),
                }
            }
        })
        .await
        .expect("reminder did not fire");
    }

    #[tokio::test]
    async fn test_past_alert_fires_immediately() {
        let (scheduler, notifier) = scheduler_with(ReminderSettings::default());
        let mut rx = scheduler.subscribe();

        let departure = Utc::now() - chrono::Duration::minutes(5);
        let reminder = scheduler.create(departure, None, "+15551234567").unwrap();
        wait_for_fire(&mut rx, &reminder.id).await;

        let stored = scheduler.get(&reminder.id).unwrap();
        assert!(stored.is_fired());
        assert!(stored.settled_at.is_some());

        let sent = notifier.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].0, "+15551234567");
        assert!(sent[0].1.starts_with("Time to leave for airport pickup!"));
    }

    #[tokio::test]
    async fn test_fire_is_idempotent() {
        let (scheduler, notifier) = scheduler_with(ReminderSettings::default());
        let mut rx = scheduler.subscribe();

        let reminder = scheduler
            .create(Utc::now() - chrono::Duration::minutes(1), Some(15.0), "+15551234567")
            .unwrap();
        wait_for_fire(&mut rx, &reminder.id).await;

        assert_eq!(scheduler.fire(&reminder.id).await, FireOutcome::AlreadySettled);
        assert_eq!(scheduler.fire(&reminder.id).await, FireOutcome::AlreadySettled);
        assert_eq!(notifier.sent.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_future_reminder_is_not_due() {
        let (scheduler, notifier) = scheduler_with(ReminderSettings::default());
        let departure = Utc::now() + chrono::Duration::hours(2);
        let reminder = scheduler.create(departure, Some(15.0), "+15551234567").unwrap();

        assert_eq!(reminder.alert_at, departure - chrono::Duration::minutes(15));
        assert_eq!(scheduler.fire(&reminder.id).await, FireOutcome::NotDue);
        assert_eq!(scheduler.get(&reminder.id).unwrap().status, ReminderStatus::Scheduled);
        assert_eq!(scheduler.active_count(), 1);
        assert!(notifier.sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_missing_reminder() {
        let (scheduler, _) = scheduler_with(ReminderSettings::default());
        assert_eq!(scheduler.fire("nope").await, FireOutcome::Missing);
        assert!(matches!(scheduler.cancel("nope"), Err(ReminderError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_cancel_disarms_timer() {
        let (scheduler, notifier) = scheduler_with(ReminderSettings::default());
        let reminder = scheduler
            .create(Utc::now() + chrono::Duration::milliseconds(200), Some(0.0), "+15551234567")
            .unwrap();
        assert!(scheduler.inner.timers.contains_key(&reminder.id));

        let cancelled = scheduler.cancel(&reminder.id).unwrap();
        assert_eq!(cancelled.status, ReminderStatus::Cancelled);
        assert!(!scheduler.inner.timers.contains_key(&reminder.id));

        // Well past the original alert time
        tokio::time::sleep(Duration::from_millis(400)).await;
        assert!(notifier.sent.lock().unwrap().is_empty());
        assert_eq!(scheduler.get(&reminder.id).unwrap().status, ReminderStatus::Cancelled);

        assert_eq!(scheduler.fire(&reminder.id).await, FireOutcome::AlreadySettled);
        assert!(matches!(scheduler.cancel(&reminder.id), Err(ReminderError::AlreadySettled(_))));
        assert_eq!(scheduler.active_count(), 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_fired_reminders_leave_no_timer_handles() {
        let (scheduler, notifier) = scheduler_with(ReminderSettings::default());
        let mut rx = scheduler.subscribe();

        let mut pending: std::collections::HashSet<String> = (0..20)
            .map(|_| scheduler.create(Utc::now(), Some(0.0), "+15551234567").unwrap().id)
            .collect();
        let total = pending.len();
        timeout(Duration::from_secs(5), async {
            while !pending.is_empty() {
                if let ReminderEvent::Fired { reminder_id, .. } = rx.recv().await.unwrap() {
                    pending.remove(&reminder_id);
                }
            }
        })
        .await
        .expect("reminders did not all fire");

        assert_eq!(notifier.sent.lock().unwrap().len(), total);
        assert!(scheduler.inner.timers.is_empty());
    }

    #[tokio::test]
    async fn test_timer_rearms_when_woken_early() {
        let (scheduler, notifier) = scheduler_with(ReminderSettings::default());
        // Registered without a background timer so only this call can fire it
        let reminder = Reminder::new(
            Utc::now() + chrono::Duration::milliseconds(200),
            0.0,
            "+15551234567".to_string(),
        )
        .unwrap();
        let id = reminder.id.clone();
        scheduler.inner.reminders.insert(id.clone(), reminder);

        // Waking before the alert, as after a backwards clock step
        let outcome = timeout(Duration::from_secs(5), scheduler.run_timer(&id, Utc::now()))
            .await
            .expect("timer never re-armed");

        assert_eq!(outcome, FireOutcome::Dispatched);
        assert!(scheduler.get(&id).unwrap().is_fired());
        assert_eq!(notifier.sent.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_cannot_cancel_fired_reminder() {
        let (scheduler, _) = scheduler_with(ReminderSettings::default());
        let mut rx = scheduler.subscribe();
        let reminder = scheduler.create(Utc::now(), Some(0.0), "+15551234567").unwrap();
        wait_for_fire(&mut rx, &reminder.id).await;

        assert!(matches!(scheduler.cancel(&reminder.id), Err(ReminderError::AlreadySettled(_))));
        assert!(scheduler.get(&reminder.id).unwrap().is_fired());
    }

    #[tokio::test]
    async fn test_sweep_evicts_only_settled_past_retention() {
        let settings = ReminderSettings {
            retention: Duration::from_secs(60),
            ..ReminderSettings::default()
        };
        let (scheduler, _) = scheduler_with(settings);

        let pending = scheduler
            .create(Utc::now() + chrono::Duration::hours(1), None, "+15551234567")
            .unwrap();
        let cancelled = scheduler
            .create(Utc::now() + chrono::Duration::hours(1), None, "+15557654321")
            .unwrap();
        scheduler.cancel(&cancelled.id).unwrap();

        // Inside the retention window nothing goes
        assert_eq!(scheduler.sweep(Utc::now()), 0);
        assert_eq!(scheduler.len(), 2);

        let later = Utc::now() + chrono::Duration::minutes(2);
        assert_eq!(scheduler.sweep(later), 1);
        assert!(scheduler.get(&cancelled.id).is_none());
        assert!(scheduler.get(&pending.id).is_some());
    }

    #[tokio::test]
    async fn test_registry_is_bounded() {
        let settings = ReminderSettings {
            max_entries: 2,
            retention: Duration::ZERO,
            ..ReminderSettings::default()
        };
        let (scheduler, _) = scheduler_with(settings);
        let departure = Utc::now() + chrono::Duration::hours(1);

        let first = scheduler.create(departure, None, "+15551234567").unwrap();
        scheduler.create(departure, None, "+15551234567").unwrap();
        assert!(matches!(
            scheduler.create(departure, None, "+15551234567"),
            Err(ReminderError::RegistryFull)
        ));

        // Cancelled entries with zero retention are swept to make room
        scheduler.cancel(&first.id).unwrap();
        assert!(scheduler.create(departure, None, "+15551234567").is_ok());
        assert_eq!(scheduler.len(), 2);
    }

    #[tokio::test]
    async fn test_invalid_input() {
        let (scheduler, _) = scheduler_with(ReminderSettings::default());
        let departure = Utc::now() + chrono::Duration::hours(1);

        assert!(matches!(
            scheduler.create(departure, Some(-1.0), "+15551234567"),
            Err(ReminderError::InvalidInput(_))
        ));
        assert!(matches!(
            scheduler.create(departure, None, "   "),
            Err(ReminderError::InvalidInput(_))
        ));
        assert!(matches!(
            scheduler.create(departure, Some(2e11), "+15551234567"),
            Err(ReminderError::InvalidInput(_))
        ));
        assert!(scheduler.is_empty());

        assert!(scheduler.create(departure, Some(MAX_OFFSET_MINUTES), "+15551234567").is_ok());
    }

    #[tokio::test]
    async fn test_end_to_end_alert_time() {
        let (scheduler, _) = scheduler_with(ReminderSettings::default());
        let departure = crate::parse_departure_time("2024-06-01T17:50:00Z").unwrap();
        let reminder = scheduler.create(departure, Some(15.0), "+15551234567").unwrap();

        assert_eq!(reminder.alert_at.to_rfc3339(), "2024-06-01T17:35:00+00:00");
    }
}
