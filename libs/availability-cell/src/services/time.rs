//! Minute-of-day helpers for `HH:MM` strings.
//!
//! Malformed input produces an empty string or `None` rather than an error.

pub const MINUTES_PER_HOUR: u32 = 60;

/// Pad the hour and minute components of a colon-separated time to two digits.
///
/// Seconds are dropped. Empty input, or input without at least two components,
/// is returned unchanged.
pub fn normalize_time(raw: &str) -> String {
    if raw.is_empty() {
        return String::new();
    }

    let mut parts = raw.split(':');
    match (parts.next(), parts.next()) {
        (Some(hours), Some(minutes)) => format!("{:0>2}:{:0>2}", hours, minutes),
        _ => raw.to_string(),
    }
}

/// Minutes since midnight for an `HH:MM` (or `HH:MM:SS`) string. Seconds must
/// be valid but are discarded.
pub fn to_minutes(value: &str) -> Option<u32> {
    let mut parts = value.split(':');
    let hours = parse_component(parts.next()?)?;
    let minutes = parse_component(parts.next()?)?;
    let seconds = match parts.next() {
        Some(raw) => parse_component(raw)?,
        None => 0,
    };

    if parts.next().is_some() || hours >= 24 || minutes >= MINUTES_PER_HOUR || seconds >= 60 {
        return None;
    }

    Some(hours * MINUTES_PER_HOUR + minutes)
}

/// Zero-padded `HH:MM` for a minute offset. Offsets past midnight are not
/// wrapped (1500 formats as `25:00`); callers stay within one day.
pub fn from_minutes(minutes: u32) -> String {
    format!("{:02}:{:02}", minutes / MINUTES_PER_HOUR, minutes % MINUTES_PER_HOUR)
}

fn parse_component(raw: &str) -> Option<u32> {
    if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    raw.parse().ok()
}
