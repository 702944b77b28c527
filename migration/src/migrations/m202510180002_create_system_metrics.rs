// migrations/m202510180002_create_system_metrics.rs
use sea_orm_migration::prelude::*;

use super::m202510180001_create_hosts::Hosts;

#[derive(DeriveIden)]
enum SystemMetrics {
    Table,
    Id,
    HostId,
    Timestamp,
    CpuUsage,
    MemoryTotal,
    MemoryUsed,
    MemoryPercent,
    DiskTotal,
    DiskUsed,
    DiskPercent,
}

pub struct Migration;

impl MigrationName for Migration {
    fn name(&self) -> &str {
        "m202510180002_create_system_metrics"
    }
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(SystemMetrics::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(SystemMetrics::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(SystemMetrics::HostId).big_integer().not_null())
                    .col(
                        ColumnDef::new(SystemMetrics::Timestamp)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(ColumnDef::new(SystemMetrics::CpuUsage).double().not_null())
                    .col(ColumnDef::new(SystemMetrics::MemoryTotal).big_integer().not_null())
                    .col(ColumnDef::new(SystemMetrics::MemoryUsed).big_integer().not_null())
                    .col(
                        ColumnDef::new(SystemMetrics::MemoryPercent)
                            .double()
                            .not_null()
                            .default(0.0),
                    )
                    .col(ColumnDef::new(SystemMetrics::DiskTotal).big_integer().not_null())
                    .col(ColumnDef::new(SystemMetrics::DiskUsed).big_integer().not_null())
                    .col(
                        ColumnDef::new(SystemMetrics::DiskPercent)
                            .double()
                            .not_null()
                            .default(0.0),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_system_metrics_host")
                            .from(SystemMetrics::Table, SystemMetrics::HostId)
                            .to(Hosts::Table, Hosts::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Per-host range scans.
        manager
            .create_index(
                Index::create()
                    .name("idx_system_metrics_host_timestamp")
                    .table(SystemMetrics::Table)
                    .col(SystemMetrics::HostId)
                    .col(SystemMetrics::Timestamp)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        // Global time-window scans.
        manager
            .create_index(
                Index::create()
                    .name("idx_system_metrics_timestamp")
                    .table(SystemMetrics::Table)
                    .col(SystemMetrics::Timestamp)
                    .if_not_exists()
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(SystemMetrics::Table).to_owned())
            .await
    }
}
