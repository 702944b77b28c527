//! Turns the agent's loosely-typed metrics document into a storable sample.
//!
//! Only a missing object or a missing hostname is fatal. Every other absent or
//! malformed field degrades to an empty string or zero, and an unreadable
//! timestamp falls back to the ingestion time.

use chrono::{DateTime, NaiveDateTime, Utc};
use db::models::system_metric::NewSystemMetric;
use serde_json::{Map, Value};
use tracing::debug;
use util::time_zone::SampleTimeZone;

use crate::error::NormalizationError;

pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Host identity carried alongside every sample.
#[derive(Clone, Debug, PartialEq)]
pub struct HostIdentity {
    pub hostname: String,
    pub ip_address: String,
    pub os_info: String,
    pub cpu_cores: i32,
}

#[derive(Clone, Debug, PartialEq)]
pub struct NormalizedSample {
    pub host: HostIdentity,
    pub metric: NewSystemMetric,
}

#[derive(Clone, Copy, Debug, Default)]
pub struct MetricsNormalizer {
    time_zone: SampleTimeZone,
}

impl MetricsNormalizer {
    pub fn new(time_zone: SampleTimeZone) -> Self {
        Self { time_zone }
    }

    pub fn normalize(&self, raw: &Value) -> Result<NormalizedSample, NormalizationError> {
        self.normalize_at(raw, Utc::now())
    }

    /// Same as [`normalize`](Self::normalize) with an explicit fallback instant.
    pub fn normalize_at(
        &self,
        raw: &Value,
        now: DateTime<Utc>,
    ) -> Result<NormalizedSample, NormalizationError> {
        let doc = raw.as_object().ok_or(NormalizationError::NotAnObject)?;

        let hostname = doc
            .get("hostname")
            .and_then(Value::as_str)
            .filter(|h| !h.trim().is_empty())
            .ok_or(NormalizationError::MissingHostname)?
            .to_owned();

        let cpu = section(doc, "cpu");
        let memory = section(doc, "memory");

        let cpu_cores = integer(cpu.and_then(|c| c.get("cores"))).clamp(0, i32::MAX as i64) as i32;

        let (disk_total, disk_used) = partitions(doc)
            .iter()
            .filter_map(Value::as_object)
            .fold((0i64, 0i64), |(total, used), part| {
                (
                    total.saturating_add(integer(part.get("total"))),
                    used.saturating_add(integer(part.get("used"))),
                )
            });

        let disk_percent = if disk_total > 0 {
            disk_used as f64 / disk_total as f64 * 100.0
        } else {
            0.0
        };

        let timestamp = self.timestamp(doc.get("timestamp"), now);

        Ok(NormalizedSample {
            host: HostIdentity {
                hostname,
                ip_address: text(doc.get("ip_address")),
                os_info: text(doc.get("os_info")),
                cpu_cores,
            },
            metric: NewSystemMetric {
                timestamp,
                cpu_usage: number(cpu.and_then(|c| c.get("overall_usage"))),
                memory_total: integer(memory.and_then(|m| m.get("total"))),
                memory_used: integer(memory.and_then(|m| m.get("used"))),
                memory_percent: number(memory.and_then(|m| m.get("percent_used"))),
                disk_total,
                disk_used,
                disk_percent,
            },
        })
    }

    fn timestamp(&self, value: Option<&Value>, now: DateTime<Utc>) -> DateTime<Utc> {
        let Some(raw) = value.and_then(Value::as_str) else {
            return now;
        };

        match NaiveDateTime::parse_from_str(raw, TIMESTAMP_FORMAT) {
            Ok(naive) => self.time_zone.localize(naive).unwrap_or_else(|| {
                debug!(timestamp = raw, "ambiguous local timestamp, using ingestion time");
                now
            }),
            Err(e) => {
                debug!(timestamp = raw, error = %e, "unparseable timestamp, using ingestion time");
                now
            }
        }
    }
}

fn section<'a>(doc: &'a Map<String, Value>, key: &str) -> Option<&'a Map<String, Value>> {
    doc.get(key).and_then(Value::as_object)
}

fn partitions(doc: &Map<String, Value>) -> &[Value] {
    section(doc, "disk")
        .and_then(|d| d.get("partitions"))
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or(&[])
}

fn text(value: Option<&Value>) -> String {
    value.and_then(Value::as_str).unwrap_or_default().to_owned()
}

fn number(value: Option<&Value>) -> f64 {
    value.and_then(Value::as_f64).unwrap_or(0.0)
}

fn integer(value: Option<&Value>) -> i64 {
    value
        .and_then(|v| {
            v.as_i64()
                .or_else(|| v.as_u64().map(|u| u.min(i64::MAX as u64) as i64))
                .or_else(|| v.as_f64().map(|f| f as i64))
        })
        .unwrap_or(0)
}
