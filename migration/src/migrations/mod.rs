pub mod m202510180001_create_hosts;
pub mod m202510180002_create_system_metrics;
