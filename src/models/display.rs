//! Display formatting
//!
//! Timestamps coming back from the service are rendered as short, locale-style
//! strings (`2024/1/5`, `2024/1/5 09:03:07`) in a fixed display offset. A missing
//! or unreadable timestamp renders as the current time, so display dates are
//! never empty.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, Offset, Utc};

/// Default display offset in minutes east of UTC (UTC+8).
pub const DEFAULT_UTC_OFFSET_MINUTES: i32 = 8 * 60;

/// How much of a timestamp to render.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateStyle {
    /// `YYYY/M/D`
    Date,
    /// `YYYY/M/D HH:MM:SS`
    DateTime,
}

/// Source of "now" plus the offset dates are displayed in.
#[derive(Debug, Clone, Copy)]
pub struct DisplayClock {
    offset: FixedOffset,
    fixed_now: Option<DateTime<Utc>>,
}

impl Default for DisplayClock {
    fn default() -> Self {
        Self::with_offset_minutes(DEFAULT_UTC_OFFSET_MINUTES)
    }
}

impl DisplayClock {
    /// Clock reading the system time, displaying in the given offset.
    ///
    /// Offsets outside ±24h fall back to UTC.
    pub fn with_offset_minutes(minutes: i32) -> Self {
        let offset = minutes
            .checked_mul(60)
            .and_then(FixedOffset::east_opt)
            .unwrap_or_else(|| Utc.fix());
        Self {
            offset,
            fixed_now: None,
        }
    }

    /// Clock frozen at `now`. Used in tests.
    pub fn frozen(now: DateTime<Utc>, minutes: i32) -> Self {
        Self {
            fixed_now: Some(now),
            ..Self::with_offset_minutes(minutes)
        }
    }

    pub fn offset(&self) -> FixedOffset {
        self.offset
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.fixed_now.unwrap_or_else(Utc::now)
    }

    /// Render `raw` in the given style, or the current time if it is absent or unreadable.
    pub fn format(&self, raw: Option<&str>, style: DateStyle) -> String {
        let instant = raw.and_then(parse_timestamp).unwrap_or_else(|| self.now());
        let local = instant.with_timezone(&self.offset);
        match style {
            DateStyle::Date => local.format("%Y/%-m/%-d").to_string(),
            DateStyle::DateTime => local.format("%Y/%-m/%-d %H:%M:%S").to_string(),
        }
    }
}

/// Parse the timestamp shapes Postgres emits through PostgREST.
///
/// `timestamptz` arrives as RFC 3339; `timestamp` has no offset and is read as UTC;
/// `date` columns are read as midnight UTC.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    // Postgres text output uses a space separator and a short "+00" offset
    for pattern in ["%Y-%m-%d %H:%M:%S%.f%#z", "%Y-%m-%dT%H:%M:%S%.f%#z"] {
        if let Ok(dt) = DateTime::parse_from_str(raw, pattern) {
            return Some(dt.with_timezone(&Utc));
        }
    }
    for pattern in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, pattern) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}
