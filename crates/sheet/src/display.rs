//! Rendering of cell values as a spreadsheet application shows them.

use crate::number_format::{format_number, format_text, is_general, FormatOptions};
use calamine::{Data, ExcelDateTime};
use chrono::{Duration, NaiveDateTime, Timelike};

/// Render a cell as displayed text, applying its number format code.
///
/// Without a code (or with General) numbers use the General format and dates
/// an ISO rendering. Returns `None` for empty cells so that callers can keep
/// rows sparse.
pub fn display_text(data: &Data, format: Option<&str>, options: FormatOptions) -> Option<String> {
    let format = format.filter(|code| !is_general(code));
    let text = match (data, format) {
        (Data::Empty, _) => return None,
        (Data::Bool(b), _) => (if *b { "TRUE" } else { "FALSE" }).to_string(),
        (Data::Error(e), _) => e.to_string(),
        (Data::String(s), Some(code)) => format_text(code, s),
        (Data::Float(f), Some(code)) => format_number(code, *f, options),
        (Data::Int(i), Some(code)) => format_number(code, *i as f64, options),
        (Data::DateTime(dt), Some(code)) => format_number(code, dt.as_f64(), options),
        (Data::String(s) | Data::DateTimeIso(s) | Data::DurationIso(s), _) => s.clone(),
        (Data::Int(i), None) => i.to_string(),
        (Data::Float(f), None) => format_general(*f),
        (Data::DateTime(dt), None) => format_excel_datetime(dt),
    };
    Some(text)
}

/// Format a number the way the Excel "General" format does.
pub fn format_general(value: f64) -> String {
    if !value.is_finite() {
        return "#NUM!".to_string();
    }
    if value == 0.0 {
        return "0".to_string();
    }

    let abs = value.abs();
    if !(1e-9..1e11).contains(&abs) {
        return format_scientific(value);
    }
    if value.fract() == 0.0 {
        return format!("{}", value as i64);
    }

    // General shows at most 10 significant digits
    let rounded: f64 = format!("{value:.9e}").parse().unwrap_or(value);
    format!("{rounded}")
}

/// Scientific rendering with five decimals, e.g. `1.23457E+11`.
fn format_scientific(value: f64) -> String {
    let formatted = format!("{value:.5e}");
    let (mantissa, exponent) = formatted.split_once('e').unwrap_or((&formatted, "0"));
    let mantissa = if mantissa.contains('.') {
        mantissa.trim_end_matches('0').trim_end_matches('.')
    } else {
        mantissa
    };
    let exponent: i32 = exponent.parse().unwrap_or(0);
    let sign = if exponent < 0 { '-' } else { '+' };
    format!("{mantissa}E{sign}{:02}", exponent.abs())
}

fn format_excel_datetime(dt: &ExcelDateTime) -> String {
    if dt.is_duration() {
        return format_duration(dt.as_f64());
    }
    match dt.as_datetime() {
        Some(value) if dt.as_f64() < 1.0 => round_to_second(value).format("%H:%M:%S").to_string(),
        Some(value) => format_datetime(round_to_second(value)),
        None => format_general(dt.as_f64()),
    }
}

fn format_datetime(value: NaiveDateTime) -> String {
    if value.num_seconds_from_midnight() == 0 {
        value.format("%Y-%m-%d").to_string()
    } else {
        value.format("%Y-%m-%d %H:%M:%S").to_string()
    }
}

fn round_to_second(value: NaiveDateTime) -> NaiveDateTime {
    let shifted = value + Duration::milliseconds(500);
    shifted.with_nanosecond(0).unwrap_or(shifted)
}

/// Elapsed time as `[h]:mm:ss`.
fn format_duration(days: f64) -> String {
    let total = (days * 86_400.0).round() as i64;
    let sign = if total < 0 { "-" } else { "" };
    let total = total.abs();
    format!(
        "{sign}{}:{:02}:{:02}",
        total / 3600,
        (total % 3600) / 60,
        total % 60
    )
}
