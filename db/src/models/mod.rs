pub mod host;
pub mod system_metric;

pub use host::Entity as Host;
pub use system_metric::Entity as SystemMetric;
