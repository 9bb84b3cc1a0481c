// --- File: crates/calbridge_gcal/src/queue.rs ---
//! In-memory queue of event creations waiting for redelivery.
//!
//! Create handlers append, the retry sweeper is the only consumer. Entries live
//! in process memory only and are lost on restart.

use calbridge_common::services::EventDraft;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::{Mutex, MutexGuard};
use tracing::info;
use uuid::Uuid;

use crate::logic::{parse_event_time, parse_time_zone};

/// A queued creation. Attendees are never carried: redelivery goes out
/// without them.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingEvent {
    pub id: String,
    pub calendar_id: String,
    pub summary: String,
    pub description: Option<String>,
    pub location: Option<String>,
    /// Timestamps as received from the client.
    pub start_date_time: String,
    pub end_date_time: String,
    pub time_zone: String,
    pub reminders: Option<serde_json::Value>,
    /// When the entry was enqueued.
    pub timestamp: DateTime<Utc>,
    /// Redelivery attempts made so far.
    pub attempts: u32,
}

/// Fields a producer hands to [`PendingEventQueue::enqueue`].
#[derive(Debug, Clone, PartialEq)]
pub struct NewPendingEvent {
    pub calendar_id: String,
    pub summary: String,
    pub description: Option<String>,
    pub location: Option<String>,
    pub start_date_time: String,
    pub end_date_time: String,
    pub time_zone: String,
    pub reminders: Option<serde_json::Value>,
}

impl PendingEvent {
    /// Re-parses the stored timestamps into a draft without attendees.
    ///
    /// Fails when a timestamp does not parse or the range is empty; such an
    /// entry can never be delivered.
    pub fn to_draft(&self) -> Result<EventDraft, String> {
        let tz = parse_time_zone(&self.time_zone).map_err(|e| e.to_string())?;
        let start = parse_event_time(&self.start_date_time, tz)
            .map_err(|e| format!("start: {}", e))?;
        let end =
            parse_event_time(&self.end_date_time, tz).map_err(|e| format!("end: {}", e))?;
        if end <= start {
            return Err(format!(
                "end {} is not after start {}",
                self.end_date_time, self.start_date_time
            ));
        }

        Ok(EventDraft {
            summary: self.summary.clone(),
            description: self.description.clone(),
            location: self.location.clone(),
            start,
            end,
            time_zone: self.time_zone.clone(),
            attendees: Vec::new(),
            reminders: self.reminders.clone(),
        })
    }
}

/// Result of [`PendingEventQueue::begin_attempt`].
#[derive(Debug, Clone, PartialEq)]
pub enum Attempt {
    /// Counter incremented; deliver this copy.
    Ready(PendingEvent),
    /// Entry was already at the ceiling and has been removed.
    Exhausted(PendingEvent),
}

/// Ordered pending-event queue shared between handlers and the sweeper.
///
/// The lock is never held across an `.await`.
#[derive(Debug, Default)]
pub struct PendingEventQueue {
    entries: Mutex<Vec<PendingEvent>>,
}

impl PendingEventQueue {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<PendingEvent>> {
        // A panic while holding the lock cannot leave a half-written entry.
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Appends an entry with a fresh id and zero attempts.
    ///
    /// Returns the id and the queue length after insertion.
    pub fn enqueue(&self, event: NewPendingEvent) -> (String, usize) {
        let id = Uuid::new_v4().to_string();
        let entry = PendingEvent {
            id: id.clone(),
            calendar_id: event.calendar_id,
            summary: event.summary,
            description: event.description,
            location: event.location,
            start_date_time: event.start_date_time,
            end_date_time: event.end_date_time,
            time_zone: event.time_zone,
            reminders: event.reminders,
            timestamp: Utc::now(),
            attempts: 0,
        };

        let mut entries = self.lock();
        entries.push(entry);
        let len = entries.len();
        drop(entries);

        info!("Queued event {} for redelivery ({} pending)", id, len);
        (id, len)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Entry ids in queue order.
    pub fn ids(&self) -> Vec<String> {
        self.lock().iter().map(|e| e.id.clone()).collect()
    }

    pub fn snapshot(&self) -> Vec<PendingEvent> {
        self.lock().clone()
    }

    pub fn get(&self, id: &str) -> Option<PendingEvent> {
        self.lock().iter().find(|e| e.id == id).cloned()
    }

    /// Starts a delivery attempt for `id`.
    ///
    /// Entries already at `max_attempts` are removed and returned as
    /// [`Attempt::Exhausted`]; otherwise the counter is incremented in place.
    /// `None` when the entry is gone.
    pub fn begin_attempt(&self, id: &str, max_attempts: u32) -> Option<Attempt> {
        let mut entries = self.lock();
        let index = entries.iter().position(|e| e.id == id)?;

        if entries[index].attempts >= max_attempts {
            return Some(Attempt::Exhausted(entries.remove(index)));
        }
        let entry = &mut entries[index];
        entry.attempts += 1;
        Some(Attempt::Ready(entry.clone()))
    }

    /// Removes `id`, returning the entry if it was still queued.
    pub fn remove(&self, id: &str) -> Option<PendingEvent> {
        let mut entries = self.lock();
        let index = entries.iter().position(|e| e.id == id)?;
        Some(entries.remove(index))
    }
}
