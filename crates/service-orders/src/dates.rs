//! Date inputs accepted by the forms and the timestamp layout the backend
//! expects (`YYYY-MM-DDTHH:mm:ss`, no offset).

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use autoshop_core::{DomainError, DomainResult};

pub const PAYLOAD_DATE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// A date as entered: either an ISO-8601 string or a date-picker struct.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DateInput {
    Parts { year: i32, month: u32, day: u32 },
    Iso(String),
}

impl DateInput {
    pub fn to_naive(&self) -> DomainResult<NaiveDateTime> {
        match self {
            DateInput::Parts { year, month, day } => NaiveDate::from_ymd_opt(*year, *month, *day)
                .and_then(|d| d.and_hms_opt(0, 0, 0))
                .ok_or_else(|| {
                    DomainError::validation(format!("invalid date {year:04}-{month:02}-{day:02}"))
                }),
            DateInput::Iso(raw) => parse_iso(raw),
        }
    }

    /// Render in the payload layout.
    pub fn to_payload_string(&self) -> DomainResult<String> {
        Ok(self.to_naive()?.format(PAYLOAD_DATE_FORMAT).to_string())
    }
}

/// Offsets are dropped: the wall-clock time as written is kept.
fn parse_iso(raw: &str) -> DomainResult<NaiveDateTime> {
    let raw = raw.trim();

    if let Ok(with_offset) = DateTime::parse_from_rfc3339(raw) {
        return Ok(with_offset.naive_local());
    }

    for layout in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"] {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(raw, layout) {
            return Ok(parsed);
        }
    }

    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .ok_or_else(|| DomainError::validation(format!("unrecognized date: {raw:?}")))
}

pub fn format_timestamp(at: &DateTime<Utc>) -> String {
    at.format(PAYLOAD_DATE_FORMAT).to_string()
}
