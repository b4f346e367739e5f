//! Date and time operators
//!
//! Dates parse as RFC 3339 first, then `%Y-%m-%dT%H:%M:%S`, `%Y-%m-%d %H:%M:%S`
//! and `%Y-%m-%d` (all read as UTC). Integers are Unix seconds.

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Timelike, Utc, Weekday};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{expected_items, to_bool};

const DATETIME_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S"];
const DATE_FORMAT: &str = "%Y-%m-%d";
const TIME_FORMATS: [&str; 2] = ["%H:%M", "%H:%M:%S"];

/// Working-hours window used by `IsBusinessHours`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BusinessHours {
    /// First business hour (inclusive, 0-23)
    pub start_hour: u32,
    /// End hour (exclusive, 1-24)
    pub end_hour: u32,
    /// Business days
    pub days: Vec<Weekday>,
}

impl Default for BusinessHours {
    fn default() -> Self {
        Self {
            start_hour: 9,
            end_hour: 17,
            days: vec![Weekday::Mon, Weekday::Tue, Weekday::Wed, Weekday::Thu, Weekday::Fri],
        }
    }
}

impl BusinessHours {
    /// Whether an instant falls inside the window
    pub fn contains(&self, at: &DateTime<Utc>) -> bool {
        self.days.contains(&at.weekday()) && (self.start_hour..self.end_hour).contains(&at.hour())
    }
}

/// Parse a date/time value
pub fn parse_datetime(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::String(s) => parse_datetime_str(s.trim()),
        Value::Number(n) => n.as_i64().and_then(|secs| Utc.timestamp_opt(secs, 0).single()),
        _ => None,
    }
}

fn parse_datetime_str(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    for format in DATETIME_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, format) {
            return Some(Utc.from_utc_datetime(&naive));
        }
    }
    NaiveDate::parse_from_str(s, DATE_FORMAT)
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| Utc.from_utc_datetime(&naive))
}

fn parse_time(value: &Value) -> Option<NaiveTime> {
    if let Value::String(s) = value {
        let s = s.trim();
        for format in TIME_FORMATS {
            if let Ok(time) = NaiveTime::parse_from_str(s, format) {
                return Some(time);
            }
        }
    }
    parse_datetime(value).map(|dt| dt.time())
}

fn parse_weekday(value: &Value) -> Option<Weekday> {
    match value {
        Value::String(s) => s
            .trim()
            .parse::<Weekday>()
            .ok()
            .or_else(|| parse_datetime_str(s.trim()).map(|dt| dt.weekday())),
        // 0 = Sunday
        Value::Number(n) => match n.as_u64()? {
            0 => Some(Weekday::Sun),
            1 => Some(Weekday::Mon),
            2 => Some(Weekday::Tue),
            3 => Some(Weekday::Wed),
            4 => Some(Weekday::Thu),
            5 => Some(Weekday::Fri),
            6 => Some(Weekday::Sat),
            _ => None,
        },
        _ => None,
    }
}

/// `DateGreaterThan`
pub fn after(actual: &Value, expected: &Value) -> bool {
    match (parse_datetime(actual), parse_datetime(expected)) {
        (Some(a), Some(e)) => a > e,
        _ => false,
    }
}

/// `DateLessThan`
pub fn before(actual: &Value, expected: &Value) -> bool {
    match (parse_datetime(actual), parse_datetime(expected)) {
        (Some(a), Some(e)) => a < e,
        _ => false,
    }
}

/// `DateBetween`: `[start, end]` or `{"start": .., "end": ..}`, inclusive
pub fn between(actual: &Value, expected: &Value) -> bool {
    let Some(at) = parse_datetime(actual) else {
        return false;
    };
    let Some((start, end)) = range_bounds(expected) else {
        return false;
    };
    match (parse_datetime(start), parse_datetime(end)) {
        (Some(start), Some(end)) => start <= at && at <= end,
        _ => false,
    }
}

/// `DayOfWeek`: actual weekday (name, number or date) is one of the expected days
pub fn day_of_week(actual: &Value, expected: &Value) -> bool {
    let Some(day) = parse_weekday(actual) else {
        return false;
    };
    expected_items(expected)
        .into_iter()
        .filter_map(parse_weekday)
        .any(|e| e == day)
}

/// `TimeOfDay`: `"HH:MM-HH:MM"`, `[start, end]` or `{"start", "end"}`
///
/// Both ends are inclusive; a window whose start is after its end wraps midnight.
pub fn time_of_day(actual: &Value, expected: &Value) -> bool {
    let Some(at) = parse_time(actual) else {
        return false;
    };

    let window = match expected {
        Value::String(s) => s.split_once('-').and_then(|(start, end)| {
            Some((
                parse_time(&Value::String(start.to_string()))?,
                parse_time(&Value::String(end.to_string()))?,
            ))
        }),
        other => range_bounds(other).and_then(|(start, end)| Some((parse_time(start)?, parse_time(end)?))),
    };

    match window {
        Some((start, end)) if start <= end => start <= at && at <= end,
        Some((start, end)) => at >= start || at <= end,
        None => false,
    }
}

/// `IsBusinessHours`: compares whether the actual instant is in business hours
pub fn is_business_hours(actual: &Value, expected: &Value, hours: &BusinessHours) -> bool {
    match (parse_datetime(actual), to_bool(expected)) {
        (Some(at), Some(want)) => hours.contains(&at) == want,
        _ => false,
    }
}

fn range_bounds(expected: &Value) -> Option<(&Value, &Value)> {
    match expected {
        Value::Array(items) if items.len() == 2 => Some((&items[0], &items[1])),
        Value::Object(map) => Some((map.get("start")?, map.get("end")?)),
        _ => None,
    }
}
