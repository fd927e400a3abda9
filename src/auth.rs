use rusqlite::types::Value;

use crate::cache::find_record;
use crate::db::EmployeeRecord;
use crate::values::display_value;

const BCRYPT_PREFIXES: &[&str] = &["$2a$", "$2b$", "$2y$"];

pub fn is_hashed_credential(stored: &str) -> bool {
    BCRYPT_PREFIXES.iter().any(|p| stored.starts_with(p))
}

/// Checks an EUID/PIN pair against the loaded records. Fails closed.
pub fn authenticate(records: &[EmployeeRecord], pin_column: &str, euid: i64, pin: &str) -> bool {
    let Some(record) = find_record(records, euid) else {
        tracing::warn!(euid, "login rejected: unknown EUID");
        return false;
    };
    let stored = match record.get(pin_column) {
        Value::Null => String::new(),
        v => display_value(v),
    };
    if stored.is_empty() {
        tracing::warn!(euid, "login rejected: no PIN on record");
        return false;
    }
    verify_pin(euid, pin, &stored)
}

fn verify_pin(euid: i64, pin: &str, stored: &str) -> bool {
    if is_hashed_credential(stored) {
        return match bcrypt::verify(pin, stored) {
            Ok(true) => true,
            Ok(false) => {
                tracing::warn!(euid, "login rejected: PIN mismatch");
                false
            }
            Err(e) => {
                tracing::error!(euid, error = %e, "stored PIN hash could not be verified");
                false
            }
        };
    }
    let matched = constant_time_eq(pin, stored);
    if !matched {
        tracing::warn!(euid, "login rejected: PIN mismatch");
    }
    matched
}

/// Exact equality that always walks every byte of equal-length inputs.
fn constant_time_eq(a: &str, b: &str) -> bool {
    let a = a.as_bytes();
    let b = b.as_bytes();
    if a.len() != b.len() {
        return false;
    }
    let mut diff = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        diff |= x ^ y;
    }
    diff == 0
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn record(euid: i64, pin: Value) -> EmployeeRecord {
        let mut cells = HashMap::new();
        cells.insert("PIN".to_string(), pin);
        EmployeeRecord::new(Some(euid), cells)
    }

    fn text(s: &str) -> Value {
        Value::Text(s.to_string())
    }

    #[test]
    fn hashed_pin_verifies() {
        let hash = bcrypt::hash("4321", 4).expect("hash");
        assert!(is_hashed_credential(&hash));
        let records = vec![record(7, text(&hash))];
        assert!(authenticate(&records, "PIN", 7, "4321"));
        assert!(!authenticate(&records, "PIN", 7, "4322"));
    }

    #[test]
    fn malformed_hash_fails_closed() {
        let records = vec![record(7, text("$2b$12$not-a-real-hash"))];
        assert!(!authenticate(&records, "PIN", 7, "$2b$12$not-a-real-hash"));
    }

    #[test]
    fn plaintext_requires_exact_match() {
        let records = vec![record(8, text("0042")), record(9, Value::Integer(1234))];
        assert!(authenticate(&records, "PIN", 8, "0042"));
        assert!(!authenticate(&records, "PIN", 8, "42"));
        assert!(!authenticate(&records, "PIN", 8, "0042 "));
        assert!(authenticate(&records, "PIN", 9, "1234"));
    }

    #[test]
    fn unknown_or_pinless_rows_fail() {
        let records = vec![record(1, Value::Null), record(2, text(""))];
        assert!(!authenticate(&records, "PIN", 1, ""));
        assert!(!authenticate(&records, "PIN", 2, ""));
        assert!(!authenticate(&records, "PIN", 3, "anything"));
        assert!(!authenticate(&[], "PIN", 1, "x"));
    }
}
