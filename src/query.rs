use std::net::IpAddr;

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::Deserialize;
use serde_json::Value;

use crate::error::ApiError;

pub const INVALID_IP: &str = "Invalid IP address format";
pub const INVALID_PERIOD: &str = "Invalid period";
pub const NON_POSITIVE_PERIOD: &str = "Period must be a positive number of seconds";
pub const INVALID_START: &str = "Invalid startTime";
pub const INVALID_END: &str = "Invalid endTime";
pub const EMPTY_RANGE: &str = "startTime must be before endTime";
pub const TOO_MANY_POINTS: &str = "Too many data points requested";

/// GetMetricStatistics refuses to return more buckets than this per call.
pub const MAX_DATAPOINTS: i64 = 1440;

const NAIVE_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M"];

/// Body of `POST /api/cpu` as sent by the frontend. Every field is kept as
/// raw JSON so that validation, not deserialization, decides which error the
/// caller sees.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CpuQueryBody {
    pub ip: Option<Value>,
    pub start_time: Option<Value>,
    pub end_time: Option<Value>,
    pub period: Option<Value>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct CpuQuery {
    pub ip: IpAddr,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub period: i32,
}

impl CpuQueryBody {
    /// Checks run in a fixed order and the first failure is returned.
    pub fn validate(&self) -> Result<CpuQuery, ApiError> {
        let ip = as_str(&self.ip)
            .and_then(|ip| ip.parse::<IpAddr>().ok())
            .ok_or(ApiError::InvalidInput(INVALID_IP))?;

        let period = parse_period(self.period.as_ref())?;

        let start = as_str(&self.start_time)
            .and_then(parse_timestamp)
            .ok_or(ApiError::InvalidInput(INVALID_START))?;
        let end = as_str(&self.end_time)
            .and_then(parse_timestamp)
            .ok_or(ApiError::InvalidInput(INVALID_END))?;

        if start >= end {
            return Err(ApiError::InvalidInput(EMPTY_RANGE));
        }
        if (end - start).num_seconds() > i64::from(period) * MAX_DATAPOINTS {
            return Err(ApiError::InvalidInput(TOO_MANY_POINTS));
        }

        Ok(CpuQuery { ip, start, end, period })
    }
}

fn as_str(raw: &Option<Value>) -> Option<&str> {
    raw.as_ref().and_then(Value::as_str)
}

fn parse_period(raw: Option<&Value>) -> Result<i32, ApiError> {
    let period = match raw {
        Some(Value::Number(n)) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64)),
        Some(Value::String(s)) => s.trim().parse::<i64>().ok(),
        _ => None,
    }
    .ok_or(ApiError::InvalidInput(INVALID_PERIOD))?;

    i32::try_from(period)
        .ok()
        .filter(|p| *p > 0)
        .ok_or(ApiError::InvalidInput(NON_POSITIVE_PERIOD))
}

/// Accepts RFC 3339 with a `Z` or numeric offset. A timestamp without an
/// offset is read as UTC.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let normalized = match raw.strip_suffix('Z') {
        Some(rest) => format!("{rest}+00:00"),
        None => raw.to_string(),
    };

    if let Ok(ts) = DateTime::parse_from_rfc3339(&normalized) {
        return Some(ts.with_timezone(&Utc));
    }

    NAIVE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(&normalized, fmt).ok())
        .map(|naive| naive.and_utc())
}
