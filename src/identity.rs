//! Content-derived record identity.
//!
//! The canonical input is `object_id ++ timestamp ++ device_id ++ value_part`,
//! where `value_part` is the record's value when one is set (even if empty)
//! and the JSON rendering of its key/value pairs otherwise. The MD5 digest of
//! that string, read as a UUID, is the identity. The digest must not change:
//! keys already written by other producers depend on it, so floats are
//! rendered the way those producers' JSON serializer writes them (`2.5`,
//! `3.0`, `1E-05`, `1E+15`) rather than the way `serde_json` does.

use std::fmt::{self, Write};
use std::str::FromStr;

use md5::{Digest, Md5};
use uuid::Uuid;

use crate::signal::{KeyValue, SignalRecord};

/// 128-bit record identity. Renders as a lowercase hyphenated UUID, which is
/// the form used as a store key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Identity(Uuid);

impl Identity {
    /// Digest an already-assembled canonical input.
    pub fn digest(canonical: &str) -> Self {
        let mut hash = [0u8; 16];
        hash.copy_from_slice(&Md5::digest(canonical.as_bytes()));
        Identity(Uuid::from_bytes(hash))
    }

    pub fn as_bytes(&self) -> &[u8; 16] {
        self.0.as_bytes()
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0.hyphenated(), f)
    }
}

impl FromStr for Identity {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Identity)
    }
}

/// Compute the identity of a record from its fields.
///
/// [`SignalRecord::identity`] returns the same value, computed once when the
/// record was built.
pub fn identity_of(record: &SignalRecord) -> Identity {
    derive(
        record.object_id(),
        record.timestamp(),
        record.device_id(),
        record.value(),
        record.key_values(),
    )
}

pub(crate) fn derive(
    object_id: &str,
    timestamp: i64,
    device_id: &str,
    value: Option<&str>,
    key_values: &[KeyValue],
) -> Identity {
    let mut canonical = format!("{object_id}{timestamp}{device_id}");
    match value {
        Some(v) => canonical.push_str(v),
        None => canonical.push_str(&key_values_json(key_values)),
    }
    Identity::digest(&canonical)
}

/// `[{"Key":..,"Value":..},...]` with numbers in round-trip form.
fn key_values_json(key_values: &[KeyValue]) -> String {
    let mut out = String::from("[");
    for (i, kv) in key_values.iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        let _ = write!(out, r#"{{"Key":{},"Value":{}}}"#, kv.key, round_trip_number(kv.value));
    }
    out.push(']');
    out
}

/// Shortest round-trip digits. Positional (always with a fractional part)
/// unless the decimal exponent is below -4 or at least `max(digits, 15)`,
/// in which case `d.dddE±XX`.
fn round_trip_number(value: f64) -> String {
    if value.is_nan() {
        return "NaN".to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 { "Infinity" } else { "-Infinity" }.to_string();
    }

    // `{:e}` yields the shortest digits that read back to the same value
    let scientific = format!("{value:e}");
    let (mantissa, exp) = scientific.split_once('e').unwrap_or((&scientific, "0"));
    let exp: i32 = exp.parse().unwrap_or(0);
    let (sign, mantissa) = match mantissa.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", mantissa),
    };
    let digits: String = mantissa.chars().filter(|c| *c != '.').collect();

    let mut out = String::from(sign);
    if exp < -4 || exp >= digits.len().max(15) as i32 {
        out.push_str(&digits[..1]);
        if digits.len() > 1 {
            out.push('.');
            out.push_str(&digits[1..]);
        }
        let _ = write!(out, "E{}{:02}", if exp < 0 { '-' } else { '+' }, exp.unsigned_abs());
    } else if exp < 0 {
        out.push_str("0.");
        out.extend(std::iter::repeat('0').take((-exp - 1) as usize));
        out.push_str(&digits);
    } else {
        let whole = exp as usize + 1;
        if digits.len() > whole {
            out.push_str(&digits[..whole]);
            out.push('.');
            out.push_str(&digits[whole..]);
        } else {
            out.push_str(&digits);
            out.extend(std::iter::repeat('0').take(whole - digits.len()));
            out.push_str(".0");
        }
    }
    out
}
