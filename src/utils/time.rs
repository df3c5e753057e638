use crate::error::JournalError;
use chrono::{Days, NaiveDate, NaiveDateTime, NaiveTime};

const DATE_TIME_FORMATS: [&str; 4] = [
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
];

/// `HH:MM`, 24-hour clock.
pub fn parse_clock(input: &str) -> Result<NaiveTime, JournalError> {
    NaiveTime::parse_from_str(input.trim(), "%H:%M")
        .map_err(|_| JournalError::InvalidTime(input.to_string()))
}

/// `today`, `yesterday`, `tomorrow` or `YYYY-MM-DD`.
pub fn parse_date(input: &str, today: NaiveDate) -> Result<NaiveDate, JournalError> {
    let invalid = || JournalError::InvalidDate(input.to_string());
    match input.trim().to_ascii_lowercase().as_str() {
        "today" => Ok(today),
        "yesterday" => today.checked_sub_days(Days::new(1)).ok_or_else(invalid),
        "tomorrow" => today.checked_add_days(Days::new(1)).ok_or_else(invalid),
        other => NaiveDate::parse_from_str(other, "%Y-%m-%d").map_err(|_| invalid()),
    }
}

/// `now`, a bare `HH:MM` (today), or a full date and time.
pub fn parse_timestamp(input: &str, now: NaiveDateTime) -> Result<NaiveDateTime, JournalError> {
    let trimmed = input.trim();
    if trimmed.eq_ignore_ascii_case("now") {
        return Ok(now);
    }
    if let Ok(time) = parse_clock(trimmed) {
        return Ok(now.date().and_time(time));
    }
    DATE_TIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(trimmed, fmt).ok())
        .ok_or_else(|| JournalError::InvalidTimestamp(input.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 6, 10)
            .unwrap()
            .and_hms_opt(14, 30, 0)
            .unwrap()
    }

    #[test]
    fn test_parse_timestamp_forms() {
        assert_eq!(parse_timestamp("now", now()).unwrap(), now());
        assert_eq!(
            parse_timestamp("08:15", now()).unwrap().to_string(),
            "2024-06-10 08:15:00"
        );
        assert_eq!(
            parse_timestamp("2024-01-31 22:05", now()).unwrap().to_string(),
            "2024-01-31 22:05:00"
        );
        assert_eq!(
            parse_timestamp("2024-01-31T22:05:09", now()).unwrap().to_string(),
            "2024-01-31 22:05:09"
        );
    }

    #[test]
    fn test_parse_timestamp_rejects_garbage() {
        assert_eq!(
            parse_timestamp("last tuesday", now()).unwrap_err(),
            JournalError::InvalidTimestamp("last tuesday".into())
        );
        assert!(parse_timestamp("2024-02-30 10:00", now()).is_err());
    }

    #[test]
    fn test_parse_date_keywords() {
        let today = now().date();
        assert_eq!(parse_date("Yesterday", today).unwrap().to_string(), "2024-06-09");
        assert_eq!(parse_date("2024-02-29", today).unwrap().to_string(), "2024-02-29");
        assert!(parse_date("2023-02-29", today).is_err());
    }

    #[test]
    fn test_parse_clock() {
        assert!(parse_clock("23:59").is_ok());
        assert_eq!(parse_clock("25:00").unwrap_err(), JournalError::InvalidTime("25:00".into()));
    }
}
