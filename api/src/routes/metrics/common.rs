use serde::Deserialize;
use services::summary;

#[derive(Debug, Deserialize, Default)]
pub struct MetricsQuery {
    pub hostname: Option<String>,
    pub days: Option<String>,
}

impl MetricsQuery {
    pub fn hostname(&self) -> Option<&str> {
        summary::parse_hostname(self.hostname.as_deref())
    }

    pub fn days(&self) -> i64 {
        summary::parse_days(self.days.as_deref())
    }
}
