//! Tests for date and time functions

#[cfg(test)]
mod tests {
    use super::super::datetime::DateTimeUtils;
    use super::super::tests::call_with;
    use crate::core::TP0054;
    use chrono::{DateTime, TimeZone, Utc};
    use serde_json::json;

    #[test]
    fn test_unit_millis() {
        assert_eq!(DateTimeUtils::unit_millis("ms"), Some(1));
        assert_eq!(DateTimeUtils::unit_millis("second"), Some(1_000));
        assert_eq!(DateTimeUtils::unit_millis("minutes"), Some(60_000));
        assert_eq!(DateTimeUtils::unit_millis("Hours"), Some(3_600_000));
        assert_eq!(DateTimeUtils::unit_millis("week"), Some(604_800_000));
        assert_eq!(DateTimeUtils::unit_millis("month"), Some(30 * 86_400_000));
        assert_eq!(DateTimeUtils::unit_millis("years"), Some(365 * 86_400_000));
        assert_eq!(DateTimeUtils::unit_millis("fortnight"), None);
    }

    #[test]
    fn test_parse_formats() {
        let expected = Utc.with_ymd_and_hms(2024, 3, 5, 0, 0, 0).unwrap();
        assert_eq!(DateTimeUtils::parse_str("2024-03-05"), Some(expected));
        assert_eq!(DateTimeUtils::parse_str("2024-03-05T00:00:00Z"), Some(expected));
        assert_eq!(DateTimeUtils::parse_str("2024-03-05T02:00:00+02:00"), Some(expected));
        assert_eq!(
            DateTimeUtils::parse(&json!(expected.timestamp_millis())),
            Some(expected)
        );
        assert_eq!(DateTimeUtils::parse_str("not a date"), None);
    }

    #[test]
    fn test_format_tokens() {
        let date = Utc.with_ymd_and_hms(2024, 1, 9, 7, 5, 3).unwrap()
            + chrono::Duration::milliseconds(42);
        assert_eq!(
            DateTimeUtils::format(&date, "YYYY-MM-DD HH:mm:ss.SSS"),
            "2024-01-09 07:05:03.042"
        );
        assert_eq!(DateTimeUtils::format(&date, "DD/MM/YY"), "09/01/24");
    }

    #[test]
    fn test_date_add() {
        assert_eq!(
            call_with("dateAdd", vec![json!("2024-01-01"), json!(7), json!("days")]).unwrap(),
            Some(json!("2024-01-08T00:00:00.000Z"))
        );
        assert_eq!(
            call_with("dateAdd", vec![json!("2024-01-01T00:00:00Z"), json!(-1), json!("hour")])
                .unwrap(),
            Some(json!("2023-12-31T23:00:00.000Z"))
        );
        assert!(call_with("dateAdd", vec![json!("2024-01-01"), json!(1), json!("eon")]).is_err());
        assert!(call_with("dateAdd", vec![json!("garbage"), json!(1)]).is_err());
    }

    #[test]
    fn test_date_add_out_of_range_is_error() {
        let err = call_with("dateAdd", vec![json!("2024-01-01"), json!("-1e30"), json!("ms")])
            .unwrap_err();
        assert_eq!(err.error_code(), TP0054);
        assert!(call_with("dateAdd", vec![json!("2024-01-01"), json!("NaN")]).is_err());
        assert!(call_with("dateAdd", vec![json!("2024-01-01"), json!(1e15), json!("years")]).is_err());
    }

    #[test]
    fn test_date_diff() {
        assert_eq!(
            call_with("dateDiff", vec![json!("2024-01-01"), json!("2024-01-31"), json!("days")])
                .unwrap(),
            Some(json!(30))
        );
        assert_eq!(
            call_with("dateDiff", vec![json!("2024-01-02"), json!("2024-01-01"), json!("hours")])
                .unwrap(),
            Some(json!(-24))
        );
        assert_eq!(
            call_with(
                "dateDiff",
                vec![json!("2024-01-01T00:00:00Z"), json!("2024-01-01T00:01:30Z"), json!("minute")]
            )
            .unwrap(),
            Some(json!(1))
        );
    }

    #[test]
    fn test_format_and_parse_date() {
        assert_eq!(
            call_with("formatDate", vec![json!("2024-03-05T10:20:30Z"), json!("DD.MM.YYYY HH:mm")])
                .unwrap(),
            Some(json!("05.03.2024 10:20"))
        );
        assert_eq!(
            call_with("parseDate", vec![json!("2024-03-05")]).unwrap(),
            Some(json!("2024-03-05T00:00:00.000Z"))
        );
        assert!(call_with("parseDate", vec![json!("nope")]).is_err());
    }

    #[test]
    fn test_clock_functions() {
        let now = call_with("now", vec![]).unwrap().unwrap();
        assert!(DateTime::parse_from_rfc3339(now.as_str().unwrap()).is_ok());

        let before = Utc::now().timestamp_millis();
        let stamp = call_with("timestamp", vec![]).unwrap().unwrap().as_i64().unwrap();
        assert!(stamp >= before);

        let today = call_with("date", vec![]).unwrap().unwrap();
        assert_eq!(today.as_str().unwrap().len(), 10);
        let year = call_with("date", vec![json!("YYYY")]).unwrap().unwrap();
        assert_eq!(year.as_str().unwrap().len(), 4);
    }
}
