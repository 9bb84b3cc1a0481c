#[cfg(test)]
mod tests {
    use crate::logic::{validate_create_request, CreateEventRequest, EventDefaults};
    use chrono::{DateTime, Duration, SecondsFormat, TimeZone, Utc};
    use proptest::prelude::*;

    fn defaults() -> EventDefaults {
        EventDefaults {
            calendar_id: "primary".to_string(),
            time_zone: "UTC".to_string(),
        }
    }

    fn base_time(offset_minutes: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap() + Duration::minutes(offset_minutes)
    }

    fn create_request(start: DateTime<Utc>, end: DateTime<Utc>) -> CreateEventRequest {
        CreateEventRequest {
            summary: Some("Sync".to_string()),
            start_date_time: Some(start.to_rfc3339_opts(SecondsFormat::Millis, true)),
            end_date_time: Some(end.to_rfc3339_opts(SecondsFormat::Millis, true)),
            ..Default::default()
        }
    }

    proptest! {
        // Any strictly positive length is accepted and keeps its instants
        #[test]
        fn test_positive_ranges_are_accepted(
            offset in 0i64..525_600,
            length_ms in 1i64..86_400_000,
        ) {
            let start = base_time(offset);
            let end = start + Duration::milliseconds(length_ms);

            let event = validate_create_request(create_request(start, end), &defaults())
                .expect("positive range must validate");
            prop_assert_eq!(event.draft.start, start);
            prop_assert_eq!(event.draft.end, end);
        }

        // Zero or negative length is always rejected
        #[test]
        fn test_non_positive_ranges_are_rejected(
            offset in 0i64..525_600,
            back_ms in 0i64..86_400_000,
        ) {
            let start = base_time(offset);
            let end = start - Duration::milliseconds(back_ms);

            prop_assert!(validate_create_request(create_request(start, end), &defaults()).is_err());
        }

        // The same instant written with different offsets validates identically
        #[test]
        fn test_offset_representation_does_not_matter(
            offset in 0i64..525_600,
            length_min in 1i64..1_440,
            zone_hours in -11i32..=12,
        ) {
            let start = base_time(offset);
            let end = start + Duration::minutes(length_min);
            let fixed = chrono::FixedOffset::east_opt(zone_hours * 3600).unwrap();

            let request = CreateEventRequest {
                summary: Some("Sync".to_string()),
                start_date_time: Some(start.with_timezone(&fixed).to_rfc3339()),
                end_date_time: Some(end.with_timezone(&fixed).to_rfc3339()),
                ..Default::default()
            };
            let event = validate_create_request(request, &defaults()).unwrap();
            prop_assert_eq!(event.draft.start, start);
            prop_assert_eq!(event.draft.end - event.draft.start, Duration::minutes(length_min));
        }
    }
}
