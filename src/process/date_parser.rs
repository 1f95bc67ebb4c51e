use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};

use crate::process::utils::clean_str;

/// Year assumed when a value names a month but no year, e.g. `"Mar"`.
const FALLBACK_YEAR: i32 = 2001;

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y/%m/%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
    "%Y/%m/%d %H:%M",
];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y"];

const MONTHS: [&str; 12] = [
    "january",
    "february",
    "march",
    "april",
    "may",
    "june",
    "july",
    "august",
    "september",
    "october",
    "november",
    "december",
];

/// Lenient parse of a date cell → UTC timestamp.
///
/// Accepts RFC 3339, ISO-like and slash-separated date/times, `MM/DD/YYYY`,
/// year-month values, bare years and month-name forms such as `"Jan"`,
/// `"Jan 2024"`, `"Jan 5, 2024"` or `"5 January 2024"`. Naive values are
/// taken as UTC. Returns `None` if nothing matches.
pub fn parse_date(raw: &str) -> Option<DateTime<Utc>> {
    let s = clean_str(raw);
    if s.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(&s) {
        return Some(dt.with_timezone(&Utc));
    }
    for fmt in DATETIME_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(&s, fmt) {
            return Some(Utc.from_utc_datetime(&naive));
        }
    }
    for fmt in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(&s, fmt) {
            return Some(midnight(date));
        }
    }

    parse_year_month(&s)
        .or_else(|| parse_month_name(&s))
        .map(midnight)
}

fn midnight(date: NaiveDate) -> DateTime<Utc> {
    Utc.from_utc_datetime(&date.and_time(NaiveTime::MIN))
}

/// `"YYYY"`, `"YYYY-MM"` or `"YYYY/MM"`.
fn parse_year_month(s: &str) -> Option<NaiveDate> {
    let mut parts = s.split(['-', '/']);
    let year = parse_year(parts.next()?)?;
    let month = match parts.next() {
        Some(m) if (1..=2).contains(&m.len()) => m.parse().ok()?,
        Some(_) => return None,
        None => 1,
    };
    if parts.next().is_some() {
        return None;
    }
    NaiveDate::from_ymd_opt(year, month, 1)
}

/// Month-name forms, in either `month day year` or `day month year` order.
fn parse_month_name(s: &str) -> Option<NaiveDate> {
    let tokens: Vec<&str> = s
        .split(|c: char| c.is_whitespace() || c == ',')
        .filter(|t| !t.is_empty())
        .collect();

    let (month, rest) = match tokens.as_slice() {
        [first, rest @ ..] if month_from_name(first).is_some() => {
            (month_from_name(first)?, rest.to_vec())
        }
        [day, second, rest @ ..] if month_from_name(second).is_some() => {
            let mut rest = rest.to_vec();
            rest.insert(0, *day);
            (month_from_name(second)?, rest)
        }
        _ => return None,
    };

    let (year, day) = match rest.as_slice() {
        [] => (FALLBACK_YEAR, 1),
        [only] if only.len() == 4 => (parse_year(only)?, 1),
        [only] => (FALLBACK_YEAR, parse_day(only)?),
        [day, year] => (parse_year(year)?, parse_day(day)?),
        _ => return None,
    };
    NaiveDate::from_ymd_opt(year, month, day)
}

fn month_from_name(token: &str) -> Option<u32> {
    let token = token.trim_end_matches('.').to_lowercase();
    if token.len() < 3 {
        return None;
    }
    MONTHS
        .iter()
        .position(|name| name.starts_with(token.as_str()))
        .map(|idx| idx as u32 + 1)
}

fn parse_year(s: &str) -> Option<i32> {
    if s.len() != 4 || !s.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    s.parse().ok()
}

fn parse_day(s: &str) -> Option<u32> {
    let digits = s.trim_end_matches(|c: char| c.is_ascii_alphabetic());
    let day: u32 = digits.parse().ok()?;
    (1..=31).contains(&day).then_some(day)
}
