// db/models/system_metric.rs
use chrono::{DateTime, Utc};
use sea_orm::ActiveValue::Set;
use sea_orm::entity::prelude::*;
use sea_orm::sea_query::{Expr, Func, Query, SimpleExpr};
use sea_orm::{ConnectionTrait, FromQueryResult, QueryFilter, QueryOrder, QuerySelect, Select};
use serde::{Deserialize, Serialize};

use super::host;

/// One immutable point-in-time sample for a host.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Deserialize, Serialize)]
#[sea_orm(table_name = "system_metrics")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub host_id: i64,
    pub timestamp: DateTime<Utc>,
    pub cpu_usage: f64, // agent scale, 0..100
    pub memory_total: i64, // bytes
    pub memory_used: i64, // bytes
    pub memory_percent: f64, // 0..100
    pub disk_total: i64, // bytes, all partitions
    pub disk_used: i64, // bytes, all partitions
    pub disk_percent: f64, // 0..100
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::host::Entity",
        from = "Column::HostId",
        to = "super::host::Column::Id",
        on_delete = "Cascade"
    )]
    Host,
}

impl Related<super::host::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Host.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

/// Field values for a sample that has not been stored yet.
#[derive(Clone, Debug, PartialEq)]
pub struct NewSystemMetric {
    pub timestamp: DateTime<Utc>,
    pub cpu_usage: f64,
    pub memory_total: i64,
    pub memory_used: i64,
    pub memory_percent: f64,
    pub disk_total: i64,
    pub disk_used: i64,
    pub disk_percent: f64,
}

/// SQL-side min/avg/max over a window. Aggregates are `None` when no rows matched.
#[derive(Clone, Debug, PartialEq, FromQueryResult)]
pub struct WindowAggregates {
    pub samples: i64,
    pub cpu_min: Option<f64>,
    pub cpu_avg: Option<f64>,
    pub cpu_max: Option<f64>,
    pub memory_min: Option<f64>,
    pub memory_avg: Option<f64>,
    pub memory_max: Option<f64>,
    pub disk_min: Option<f64>,
    pub disk_avg: Option<f64>,
    pub disk_max: Option<f64>,
}

impl Model {
    /// Appends a sample for `host_id`. Samples are never updated afterwards.
    pub async fn append<C>(db: &C, host_id: i64, sample: &NewSystemMetric) -> Result<Model, DbErr>
    where
        C: ConnectionTrait,
    {
        let metric = ActiveModel {
            host_id: Set(host_id),
            timestamp: Set(sample.timestamp),
            cpu_usage: Set(sample.cpu_usage),
            memory_total: Set(sample.memory_total),
            memory_used: Set(sample.memory_used),
            memory_percent: Set(sample.memory_percent),
            disk_total: Set(sample.disk_total),
            disk_used: Set(sample.disk_used),
            disk_percent: Set(sample.disk_percent),
            ..Default::default()
        };

        metric.insert(db).await
    }

    /// Base query for samples at or after `since`, optionally restricted to one hostname.
    pub fn window(hostname: Option<&str>, since: DateTime<Utc>) -> Select<Entity> {
        let mut query = Entity::find().filter(Column::Timestamp.gte(since));

        if let Some(hostname) = hostname {
            query = query.filter(
                Column::HostId.in_subquery(
                    Query::select()
                        .column(host::Column::Id)
                        .from(host::Entity)
                        .and_where(host::Column::Hostname.eq(hostname))
                        .to_owned(),
                ),
            );
        }

        query
    }

    /// One sample by id together with its host.
    pub async fn find_with_host<C>(
        db: &C,
        id: i64,
    ) -> Result<Option<(Model, Option<host::Model>)>, DbErr>
    where
        C: ConnectionTrait,
    {
        Entity::find_by_id(id)
            .find_also_related(host::Entity)
            .one(db)
            .await
    }

    /// Samples in the window with their owning host, newest first.
    pub async fn find_window<C>(
        db: &C,
        hostname: Option<&str>,
        since: DateTime<Utc>,
    ) -> Result<Vec<(Model, Option<host::Model>)>, DbErr>
    where
        C: ConnectionTrait,
    {
        Self::window(hostname, since)
            .order_by_desc(Column::Timestamp)
            .order_by_desc(Column::Id)
            .find_also_related(host::Entity)
            .all(db)
            .await
    }

    /// Samples in the window in chronological order, for rollups.
    pub async fn find_window_ascending<C>(
        db: &C,
        hostname: Option<&str>,
        since: DateTime<Utc>,
    ) -> Result<Vec<Model>, DbErr>
    where
        C: ConnectionTrait,
    {
        Self::window(hostname, since)
            .order_by_asc(Column::Timestamp)
            .order_by_asc(Column::Id)
            .all(db)
            .await
    }

    /// One host's samples at or after `since`, newest first.
    pub async fn find_for_host<C>(
        db: &C,
        host_id: i64,
        since: DateTime<Utc>,
    ) -> Result<Vec<Model>, DbErr>
    where
        C: ConnectionTrait,
    {
        Entity::find()
            .filter(Column::HostId.eq(host_id))
            .filter(Column::Timestamp.gte(since))
            .order_by_desc(Column::Timestamp)
            .order_by_desc(Column::Id)
            .all(db)
            .await
    }

    /// Min/avg/max of cpu, memory and disk percentages computed by the store.
    pub async fn window_aggregates<C>(
        db: &C,
        hostname: Option<&str>,
        since: DateTime<Utc>,
    ) -> Result<WindowAggregates, DbErr>
    where
        C: ConnectionTrait,
    {
        let col = |c: Column| Expr::col((Entity, c));
        let avg = |c: Column| SimpleExpr::from(Func::avg(Expr::col((Entity, c))));

        let row = Self::window(hostname, since)
            .select_only()
            .column_as(col(Column::Id).count(), "samples")
            .column_as(col(Column::CpuUsage).min(), "cpu_min")
            .column_as(avg(Column::CpuUsage), "cpu_avg")
            .column_as(col(Column::CpuUsage).max(), "cpu_max")
            .column_as(col(Column::MemoryPercent).min(), "memory_min")
            .column_as(avg(Column::MemoryPercent), "memory_avg")
            .column_as(col(Column::MemoryPercent).max(), "memory_max")
            .column_as(col(Column::DiskPercent).min(), "disk_min")
            .column_as(avg(Column::DiskPercent), "disk_avg")
            .column_as(col(Column::DiskPercent).max(), "disk_max")
            .into_model::<WindowAggregates>()
            .one(db)
            .await?;

        Ok(row.unwrap_or(WindowAggregates {
            samples: 0,
            cpu_min: None,
            cpu_avg: None,
            cpu_max: None,
            memory_min: None,
            memory_avg: None,
            memory_max: None,
            disk_min: None,
            disk_avg: None,
            disk_max: None,
        }))
    }
}
