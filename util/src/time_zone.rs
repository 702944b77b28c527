//! Time zone attached to naive timestamps reported by a metrics agent.
//!
//! Agents report wall-clock time without an offset (`YYYY-MM-DD HH:MM:SS`),
//! so the collector has to decide which zone that wall clock belongs to.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, FixedOffset, Local, LocalResult, NaiveDateTime, TimeZone, Utc};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SampleTimeZone {
    #[default]
    Utc,
    Local,
    Fixed(FixedOffset),
}

impl SampleTimeZone {
    /// Interprets `naive` as wall-clock time in this zone.
    ///
    /// A wall clock repeated by a daylight-saving fold resolves to its first
    /// occurrence. Returns `None` only for times skipped by a transition.
    pub fn localize(&self, naive: NaiveDateTime) -> Option<DateTime<Utc>> {
        match self {
            SampleTimeZone::Utc => Some(Utc.from_utc_datetime(&naive)),
            SampleTimeZone::Local => earliest_utc(Local.from_local_datetime(&naive)),
            SampleTimeZone::Fixed(offset) => earliest_utc(offset.from_local_datetime(&naive)),
        }
    }
}

fn earliest_utc<Tz: TimeZone>(result: LocalResult<DateTime<Tz>>) -> Option<DateTime<Utc>> {
    result.earliest().map(|dt| dt.with_timezone(&Utc))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseTimeZoneError(String);

impl fmt::Display for ParseTimeZoneError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unrecognised time zone '{}'", self.0)
    }
}

impl std::error::Error for ParseTimeZoneError {}

impl FromStr for SampleTimeZone {
    type Err = ParseTimeZoneError;

    /// Accepts `UTC`, `local`, or a fixed offset such as `+02:00` / `-0530`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        match trimmed.to_ascii_lowercase().as_str() {
            "utc" | "z" | "gmt" => return Ok(SampleTimeZone::Utc),
            "local" => return Ok(SampleTimeZone::Local),
            _ => {}
        }

        let (sign, rest) = match trimmed.as_bytes().first() {
            Some(b'+') => (1, &trimmed[1..]),
            Some(b'-') => (-1, &trimmed[1..]),
            _ => return Err(ParseTimeZoneError(s.to_string())),
        };
        let digits: String = rest.chars().filter(|c| *c != ':').collect();
        if digits.len() != 4 || !digits.chars().all(|c| c.is_ascii_digit()) {
            return Err(ParseTimeZoneError(s.to_string()));
        }
        let hours: i32 = digits[..2].parse().map_err(|_| ParseTimeZoneError(s.to_string()))?;
        let minutes: i32 = digits[2..].parse().map_err(|_| ParseTimeZoneError(s.to_string()))?;

        FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60))
            .map(SampleTimeZone::Fixed)
            .ok_or_else(|| ParseTimeZoneError(s.to_string()))
    }
}
