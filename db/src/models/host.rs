// db/models/host.rs
use std::fmt;

use sea_orm::ActiveValue::Set;
use sea_orm::entity::prelude::*;
use sea_orm::{ConnectionTrait, QueryFilter, QueryOrder};
use serde::{Deserialize, Serialize};

/// A monitored machine, keyed by its unique hostname.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Deserialize, Serialize)]
#[sea_orm(table_name = "hosts")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    #[sea_orm(unique)]
    pub hostname: String,
    pub ip_address: String,
    pub os_info: String,
    pub cpu_cores: i32,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::system_metric::Entity")]
    SystemMetric,
}

impl Related<super::system_metric::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::SystemMetric.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl fmt::Display for Model {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.hostname)
    }
}

impl Model {
    /// Update-or-create keyed by `hostname`.
    ///
    /// Every non-key field is overwritten with the supplied values, so the row
    /// always reflects the latest report from the host.
    pub async fn upsert<C>(
        db: &C,
        hostname: &str,
        ip_address: &str,
        os_info: &str,
        cpu_cores: i32,
    ) -> Result<Model, DbErr>
    where
        C: ConnectionTrait,
    {
        match Self::find_by_hostname(db, hostname).await? {
            Some(existing) => {
                let mut host: ActiveModel = existing.into();
                host.ip_address = Set(ip_address.to_owned());
                host.os_info = Set(os_info.to_owned());
                host.cpu_cores = Set(cpu_cores);
                host.update(db).await
            }
            None => {
                let host = ActiveModel {
                    hostname: Set(hostname.to_owned()),
                    ip_address: Set(ip_address.to_owned()),
                    os_info: Set(os_info.to_owned()),
                    cpu_cores: Set(cpu_cores),
                    ..Default::default()
                };
                host.insert(db).await
            }
        }
    }

    pub async fn find_by_hostname<C>(db: &C, hostname: &str) -> Result<Option<Model>, DbErr>
    where
        C: ConnectionTrait,
    {
        Entity::find()
            .filter(Column::Hostname.eq(hostname))
            .one(db)
            .await
    }

    pub async fn find_by_id<C>(db: &C, id: i64) -> Result<Option<Model>, DbErr>
    where
        C: ConnectionTrait,
    {
        Entity::find_by_id(id).one(db).await
    }

    /// All hosts in registration order.
    pub async fn list<C>(db: &C) -> Result<Vec<Model>, DbErr>
    where
        C: ConnectionTrait,
    {
        Entity::find().order_by_asc(Column::Id).all(db).await
    }

    /// Removes a host; its samples go with it through the cascading foreign key.
    pub async fn delete<C>(db: &C, id: i64) -> Result<(), DbErr>
    where
        C: ConnectionTrait,
    {
        Entity::delete_by_id(id).exec(db).await?;
        Ok(())
    }
}
