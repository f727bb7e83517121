//! Exact numeric conversions for captured fields.
//!
//! Durations are converted from their decimal text rather than through `f64`,
//! so whole seconds never pick up float drift.

/// Convert a decimal number of seconds (`"1.5"`, `"0.250"`, `"2"`) to whole
/// milliseconds.
///
/// Whole seconds contribute `seconds * 1000`; the fractional part is
/// truncated to millisecond resolution. `"0.9995"` is 999, not 1000.
pub fn seconds_to_millis(text: &str) -> Result<u64, &'static str> {
    let (whole, fraction) = match text.split_once('.') {
        Some((whole, fraction)) => {
            if fraction.is_empty() {
                return Err("expected digits after decimal point");
            }
            (whole, fraction)
        }
        None => (text, ""),
    };

    if whole.is_empty() {
        return Err("expected digits before decimal point");
    }
    if !whole.bytes().all(|b| b.is_ascii_digit()) || !fraction.bytes().all(|b| b.is_ascii_digit())
    {
        return Err("not a non-negative decimal number");
    }

    let seconds: u64 = whole.parse().map_err(|_| "seconds out of range")?;

    // First three fractional digits, right-padded with zeros.
    let mut millis_part = 0u64;
    let mut digits = fraction.bytes();
    for _ in 0..3 {
        let digit = digits.next().map_or(0, |b| u64::from(b - b'0'));
        millis_part = millis_part * 10 + digit;
    }

    seconds
        .checked_mul(1000)
        .and_then(|ms| ms.checked_add(millis_part))
        .ok_or("seconds out of range")
}

/// Parse an unsigned integer field such as an HTTP status code.
pub fn parse_unsigned(text: &str) -> Result<u64, &'static str> {
    if text.is_empty() || !text.bytes().all(|b| b.is_ascii_digit()) {
        return Err("not an unsigned integer");
    }
    text.parse().map_err(|_| "integer out of range")
}

/// Parse a signed decimal value such as `12`, `-3`, or `0.25`.
pub fn parse_decimal(text: &str) -> Result<f64, &'static str> {
    let value: f64 = text.parse().map_err(|_| "not a decimal number")?;
    if value.is_finite() {
        Ok(value)
    } else {
        Err("not a finite number")
    }
}
