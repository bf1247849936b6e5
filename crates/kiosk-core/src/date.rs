//! Spanish long-form date formatting for the kiosk screen.
//!
//! Entry dates arrive as free-form strings from the reader service. They are
//! rendered as `DOMINGO, 7 DE ENERO DE 2024`; anything unparseable becomes
//! [`INVALID_DATE`].
//!
//! Accepted inputs:
//! - RFC 3339 with offset (`2024-01-07T06:00:00Z`), converted to local time
//! - Naive date-time (`2024-01-07T00:00:00`, optional fraction), taken as local
//! - Date only (`2024-01-07`), taken as UTC midnight and converted to local
//!
//! # Examples
//!
//! ```
//! use kiosk_core::format_date;
//!
//! assert_eq!(format_date("2024-01-07T00:00:00"), "DOMINGO, 7 DE ENERO DE 2024");
//! assert_eq!(format_date("not-a-date"), "FECHA INVÁLIDA");
//! ```

use chrono::{DateTime, Datelike, Local, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};

use crate::constants::INVALID_DATE;

const DAYS: [&str; 7] = [
    "DOMINGO",
    "LUNES",
    "MARTES",
    "MIÉRCOLES",
    "JUEVES",
    "VIERNES",
    "SÁBADO",
];

const MONTHS: [&str; 12] = [
    "ENERO",
    "FEBRERO",
    "MARZO",
    "ABRIL",
    "MAYO",
    "JUNIO",
    "JULIO",
    "AGOSTO",
    "SEPTIEMBRE",
    "OCTUBRE",
    "NOVIEMBRE",
    "DICIEMBRE",
];

const NAIVE_FORMATS: [&str; 3] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S%.f"];

/// Format a timestamp string as an uppercase Spanish long date.
///
/// Never fails: unparseable input yields `"FECHA INVÁLIDA"`.
pub fn format_date(input: &str) -> String {
    match parse_local_date(input) {
        Some(date) => format_naive_date(date),
        None => INVALID_DATE.to_string(),
    }
}

/// Format an already-parsed calendar date.
pub fn format_naive_date(date: NaiveDate) -> String {
    let day_name = DAYS[date.weekday().num_days_from_sunday() as usize];
    let month = MONTHS[date.month0() as usize];
    format!("{day_name}, {} DE {month} DE {}", date.day(), date.year())
}

/// Resolve the local calendar date an entry-date string refers to.
pub fn parse_local_date(input: &str) -> Option<NaiveDate> {
    let input = input.trim();
    if input.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(input) {
        return Some(dt.with_timezone(&Local).date_naive());
    }

    if let Some(naive) = NAIVE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(input, fmt).ok())
    {
        return Some(naive.date());
    }

    NaiveDate::parse_from_str(input, "%Y-%m-%d").ok().map(|date| {
        Utc.from_utc_datetime(&date.and_time(NaiveTime::MIN))
            .with_timezone(&Local)
            .date_naive()
    })
}
