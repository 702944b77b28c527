//! Read side: filtered listings, hourly rollups and whole-window statistics.

use std::collections::BTreeMap;

use chrono::{DateTime, Duration, Timelike, Utc};
use db::models::{host, system_metric};
use sea_orm::{ConnectionTrait, DbErr, TransactionTrait};
use serde::Serialize;

pub const DEFAULT_WINDOW_DAYS: i64 = 1;
/// Widest window a query may ask for (roughly a century).
pub const MAX_WINDOW_DAYS: i64 = 36_500;

/// Parses the `days` filter. Anything that is not a positive integer falls back
/// to one day; larger windows are capped at `MAX_WINDOW_DAYS`.
pub fn parse_days(raw: Option<&str>) -> i64 {
    raw.and_then(|s| s.trim().parse::<i64>().ok())
        .filter(|d| *d > 0)
        .map_or(DEFAULT_WINDOW_DAYS, |d| d.min(MAX_WINDOW_DAYS))
}

/// Empty hostname filters mean "all hosts".
pub fn parse_hostname(raw: Option<&str>) -> Option<&str> {
    raw.map(str::trim).filter(|h| !h.is_empty())
}

/// Start of a `days`-long window ending at `now`. Spans chrono cannot
/// represent fall back to the default window.
pub fn window_start(now: DateTime<Utc>, days: i64) -> DateTime<Utc> {
    Duration::try_days(days)
        .and_then(|span| now.checked_sub_signed(span))
        .unwrap_or_else(|| now - Duration::days(DEFAULT_WINDOW_DAYS))
}

/// A stored sample as exposed by the listing endpoints.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricView {
    pub id: i64,
    pub host_id: i64,
    pub hostname: String,
    pub timestamp: DateTime<Utc>,
    pub cpu_usage: f64,
    pub memory_total: i64,
    pub memory_used: i64,
    pub memory_percent: f64,
    pub disk_total: i64,
    pub disk_used: i64,
    pub disk_percent: f64,
}

impl MetricView {
    fn new(m: system_metric::Model, hostname: String) -> Self {
        Self {
            id: m.id,
            host_id: m.host_id,
            hostname,
            timestamp: m.timestamp,
            cpu_usage: m.cpu_usage,
            memory_total: m.memory_total,
            memory_used: m.memory_used,
            memory_percent: m.memory_percent,
            disk_total: m.disk_total,
            disk_used: m.disk_used,
            disk_percent: m.disk_percent,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HourlyPoint {
    pub timestamp: DateTime<Utc>,
    pub cpu_usage: f64,
    pub memory_percent: f64,
    pub disk_percent: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Spread {
    pub avg: f64,
    pub max: f64,
    pub min: f64,
}

impl Spread {
    fn from_parts(min: Option<f64>, avg: Option<f64>, max: Option<f64>) -> Option<Self> {
        Some(Self {
            avg: avg?,
            max: max?,
            min: min?,
        })
    }
}

/// Serializes as `{}` when the window held no samples.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct OverallStats {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cpu_usage: Option<Spread>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub memory_percent: Option<Spread>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub disk_percent: Option<Spread>,
}

impl OverallStats {
    pub fn is_empty(&self) -> bool {
        self.cpu_usage.is_none() && self.memory_percent.is_none() && self.disk_percent.is_none()
    }
}

impl From<system_metric::WindowAggregates> for OverallStats {
    fn from(agg: system_metric::WindowAggregates) -> Self {
        if agg.samples == 0 {
            return Self::default();
        }
        Self {
            cpu_usage: Spread::from_parts(agg.cpu_min, agg.cpu_avg, agg.cpu_max),
            memory_percent: Spread::from_parts(agg.memory_min, agg.memory_avg, agg.memory_max),
            disk_percent: Spread::from_parts(agg.disk_min, agg.disk_avg, agg.disk_max),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricsSummary {
    pub time_series: Vec<HourlyPoint>,
    pub overall_stats: OverallStats,
}

fn floor_to_hour(ts: DateTime<Utc>) -> DateTime<Utc> {
    ts.date_naive()
        .and_hms_opt(ts.hour(), 0, 0)
        .map(|naive| naive.and_utc())
        .unwrap_or(ts)
}

/// Buckets samples by UTC hour and averages each bucket. Output is ascending.
pub fn hourly_rollup<'a, I>(rows: I) -> Vec<HourlyPoint>
where
    I: IntoIterator<Item = &'a system_metric::Model>,
{
    #[derive(Default)]
    struct Agg {
        n: u64,
        cpu: f64,
        mem: f64,
        disk: f64,
    }

    let mut map: BTreeMap<DateTime<Utc>, Agg> = BTreeMap::new();
    for r in rows {
        let entry = map.entry(floor_to_hour(r.timestamp)).or_default();
        entry.n += 1;
        entry.cpu += r.cpu_usage;
        entry.mem += r.memory_percent;
        entry.disk += r.disk_percent;
    }

    map.into_iter()
        .map(|(timestamp, a)| {
            let n = a.n.max(1) as f64;
            HourlyPoint {
                timestamp,
                cpu_usage: a.cpu / n,
                memory_percent: a.mem / n,
                disk_percent: a.disk / n,
            }
        })
        .collect()
}

/// A stored sample by id, with its hostname.
pub async fn find_metric<C>(db: &C, id: i64) -> Result<Option<MetricView>, DbErr>
where
    C: ConnectionTrait,
{
    Ok(system_metric::Model::find_with_host(db, id)
        .await?
        .map(|(m, h)| MetricView::new(m, h.map(|h| h.hostname).unwrap_or_default())))
}

/// Samples in the window, newest first, each tagged with its hostname.
pub async fn list_metrics<C>(
    db: &C,
    hostname: Option<&str>,
    days: i64,
    now: DateTime<Utc>,
) -> Result<Vec<MetricView>, DbErr>
where
    C: ConnectionTrait,
{
    let rows = system_metric::Model::find_window(db, hostname, window_start(now, days)).await?;

    Ok(rows
        .into_iter()
        .map(|(m, h)| MetricView::new(m, h.map(|h| h.hostname).unwrap_or_default()))
        .collect())
}

/// One host's samples in the window. `None` when the host does not exist.
pub async fn host_metrics<C>(
    db: &C,
    host_id: i64,
    days: i64,
    now: DateTime<Utc>,
) -> Result<Option<Vec<MetricView>>, DbErr>
where
    C: ConnectionTrait,
{
    let Some(host) = host::Model::find_by_id(db, host_id).await? else {
        return Ok(None);
    };

    let rows = system_metric::Model::find_for_host(db, host.id, window_start(now, days)).await?;
    Ok(Some(
        rows.into_iter()
            .map(|m| MetricView::new(m, host.hostname.clone()))
            .collect(),
    ))
}

/// Hourly series and overall stats read from one transaction, so a sample
/// committed mid-request shows up in both or neither.
pub async fn summarize<C>(
    db: &C,
    hostname: Option<&str>,
    days: i64,
    now: DateTime<Utc>,
) -> Result<MetricsSummary, DbErr>
where
    C: ConnectionTrait + TransactionTrait,
{
    let since = window_start(now, days);

    let txn = db.begin().await?;
    let rows = system_metric::Model::find_window_ascending(&txn, hostname, since).await?;
    let aggregates = system_metric::Model::window_aggregates(&txn, hostname, since).await?;
    txn.commit().await?;

    Ok(MetricsSummary {
        time_series: hourly_rollup(&rows),
        overall_stats: aggregates.into(),
    })
}

pub fn time_series_csv(points: &[HourlyPoint]) -> String {
    let mut csv = String::from("timestamp,cpu_usage,memory_percent,disk_percent\n");
    for p in points {
        csv.push_str(&format!(
            "{},{:.4},{:.4},{:.4}\n",
            p.timestamp.to_rfc3339(),
            p.cpu_usage,
            p.memory_percent,
            p.disk_percent
        ));
    }
    csv
}
