#[cfg(test)]
mod tests {
    use crate::queue::{Attempt, NewPendingEvent, PendingEventQueue};
    use serde_json::json;
    use std::sync::Arc;

    fn new_event(summary: &str) -> NewPendingEvent {
        NewPendingEvent {
            calendar_id: "primary".to_string(),
            summary: summary.to_string(),
            description: None,
            location: None,
            start_date_time: "2025-01-01T10:00:00Z".to_string(),
            end_date_time: "2025-01-01T11:00:00Z".to_string(),
            time_zone: "UTC".to_string(),
            reminders: None,
        }
    }

    #[test]
    fn test_enqueue_reports_id_and_length() {
        let queue = PendingEventQueue::new();
        let (first, len) = queue.enqueue(new_event("a"));
        assert_eq!(len, 1);
        let (second, len) = queue.enqueue(new_event("b"));
        assert_eq!(len, 2);

        assert_ne!(first, second);
        assert_eq!(queue.ids(), vec![first.clone(), second]);

        let entry = queue.get(&first).unwrap();
        assert_eq!(entry.attempts, 0);
        assert_eq!(entry.summary, "a");
    }

    #[test]
    fn test_begin_attempt_increments_until_ceiling() {
        let queue = PendingEventQueue::new();
        let (id, _) = queue.enqueue(new_event("a"));

        for expected in 1..=3 {
            match queue.begin_attempt(&id, 3) {
                Some(Attempt::Ready(entry)) => assert_eq!(entry.attempts, expected),
                other => panic!("expected Ready, got {other:?}"),
            }
        }
        assert_eq!(queue.get(&id).unwrap().attempts, 3);

        match queue.begin_attempt(&id, 3) {
            Some(Attempt::Exhausted(entry)) => assert_eq!(entry.attempts, 3),
            other => panic!("expected Exhausted, got {other:?}"),
        }
        assert!(queue.is_empty());
        assert_eq!(queue.begin_attempt(&id, 3), None);
    }

    #[test]
    fn test_remove_is_exactly_once() {
        let queue = PendingEventQueue::new();
        let (a, _) = queue.enqueue(new_event("a"));
        let (b, _) = queue.enqueue(new_event("b"));

        assert!(queue.remove(&a).is_some());
        assert!(queue.remove(&a).is_none());
        assert_eq!(queue.ids(), vec![b]);
    }

    #[test]
    fn test_to_draft_drops_attendees_and_keeps_reminders() {
        let queue = PendingEventQueue::new();
        let mut event = new_event("a");
        event.reminders = Some(json!({ "useDefault": true }));
        let (id, _) = queue.enqueue(event);

        let draft = queue.get(&id).unwrap().to_draft().unwrap();
        assert!(draft.attendees.is_empty());
        assert_eq!(draft.reminders, Some(json!({ "useDefault": true })));
        assert!(draft.end > draft.start);
    }

    #[test]
    fn test_to_draft_rejects_invalid_range() {
        let queue = PendingEventQueue::new();
        let mut event = new_event("a");
        event.end_date_time = event.start_date_time.clone();
        let (id, _) = queue.enqueue(event);
        assert!(queue.get(&id).unwrap().to_draft().is_err());

        let mut event = new_event("b");
        event.start_date_time = "not a time".to_string();
        let (id, _) = queue.enqueue(event);
        assert!(queue.get(&id).unwrap().to_draft().is_err());
    }

    #[test]
    fn test_concurrent_enqueue_keeps_every_entry() {
        let queue = Arc::new(PendingEventQueue::new());
        let handles: Vec<_> = (0..8)
            .map(|t| {
                let queue = queue.clone();
                std::thread::spawn(move || {
                    for i in 0..25 {
                        queue.enqueue(new_event(&format!("{t}-{i}")));
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(queue.len(), 200);
        let mut ids = queue.ids();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), 200);
    }

    #[test]
    fn test_snapshot_serializes_camel_case() {
        let queue = PendingEventQueue::new();
        queue.enqueue(new_event("a"));
        let value = serde_json::to_value(queue.snapshot()).unwrap();
        assert_eq!(value[0]["startDateTime"], "2025-01-01T10:00:00Z");
        assert_eq!(value[0]["attempts"], 0);
    }
}
