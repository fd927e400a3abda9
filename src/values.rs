use chrono::{DateTime, NaiveDate, NaiveDateTime};
use rusqlite::types::Value;

pub const DATE_STORAGE_FORMAT: &str = "%Y-%m-%d";
pub const NUMBER_DISPLAY_DECIMALS: usize = 2;
pub const NUMBER_STEP: f64 = 0.01;

// Tried in order; month-first wins over day-first for slash dates.
const LENIENT_DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%Y.%m.%d",
    "%B %d, %Y",
    "%b %d, %Y",
    "%B %d %Y",
    "%b %d %Y",
    "%d %B %Y",
    "%d %b %Y",
    "%d %B, %Y",
    "%m/%d/%Y",
    "%d/%m/%Y",
    "%d-%m-%Y",
    "%d.%m.%Y",
    "%Y%m%d",
];

const LENIENT_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

/// Lenient first, strict `YYYY-MM-DD` second. `None` means unparseable.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }
    parse_date_lenient(s).or_else(|| NaiveDate::parse_from_str(s, DATE_STORAGE_FORMAT).ok())
}

fn parse_date_lenient(s: &str) -> Option<NaiveDate> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.date_naive());
    }
    for fmt in LENIENT_DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt.date());
        }
    }
    for fmt in LENIENT_DATE_FORMATS {
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            return Some(d);
        }
    }
    None
}

pub fn today() -> NaiveDate {
    chrono::Local::now().date_naive()
}

/// Edit default for a date field: the stored date, or today when it does not parse.
pub fn date_default(existing: &Value) -> (NaiveDate, bool) {
    match parse_date(&display_value(existing)) {
        Some(d) => (d, true),
        None => (today(), false),
    }
}

pub fn format_date(d: NaiveDate) -> String {
    d.format(DATE_STORAGE_FORMAT).to_string()
}

/// Keeps only digits and decimal points; anything that still fails to parse is zero.
pub fn clean_amount(value: &Value) -> f64 {
    match value {
        Value::Integer(i) => *i as f64,
        Value::Real(f) => *f,
        Value::Text(s) => {
            let cleaned: String = s
                .chars()
                .filter(|c| c.is_ascii_digit() || *c == '.')
                .collect();
            if cleaned.is_empty() {
                0.0
            } else {
                cleaned.parse::<f64>().unwrap_or(0.0)
            }
        }
        Value::Null | Value::Blob(_) => 0.0,
    }
}

/// Default for a number field. Unparseable or negative values collapse to zero.
pub fn number_default(existing: &Value) -> f64 {
    let v = match existing {
        Value::Integer(i) => *i as f64,
        Value::Real(f) => *f,
        Value::Text(s) if s.trim().is_empty() => 0.0,
        Value::Text(s) => s.trim().parse::<f64>().unwrap_or(0.0),
        Value::Null | Value::Blob(_) => 0.0,
    };
    if v.is_finite() && v >= 0.0 {
        v
    } else {
        0.0
    }
}

pub fn format_number(v: f64) -> String {
    format!("{:.*}", NUMBER_DISPLAY_DECIMALS, v)
}

pub fn display_value(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::Integer(i) => i.to_string(),
        Value::Real(f) => f.to_string(),
        Value::Text(s) => s.clone(),
        Value::Blob(b) => format!("<{} bytes>", b.len()),
    }
}

pub fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Text(s) => s.trim().is_empty(),
        _ => false,
    }
}

/// Accepts integers, integral reals and numeric text.
pub fn coerce_euid(value: &Value) -> Option<i64> {
    match value {
        Value::Integer(i) => Some(*i),
        Value::Real(f) if f.fract() == 0.0 && f.is_finite() => Some(*f as i64),
        Value::Text(s) => {
            let t = s.trim();
            t.parse::<i64>().ok().or_else(|| {
                t.parse::<f64>()
                    .ok()
                    .filter(|f| f.fract() == 0.0 && f.is_finite())
                    .map(|f| f as i64)
            })
        }
        _ => None,
    }
}
