use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Default)]
pub struct HostResponse {
    pub id: i64,
    pub hostname: String,
    pub ip_address: String,
    pub os_info: String,
    pub cpu_cores: i32,
}

impl From<db::models::host::Model> for HostResponse {
    fn from(host: db::models::host::Model) -> Self {
        Self {
            id: host.id,
            hostname: host.hostname,
            ip_address: host.ip_address,
            os_info: host.os_info,
            cpu_cores: host.cpu_cores,
        }
    }
}

/// `days` stays a string so that junk input falls back instead of being rejected.
#[derive(Debug, Deserialize, Default)]
pub struct DaysQuery {
    pub days: Option<String>,
}
