mod health_test;
mod hosts_test;
mod live_test;
mod metrics_test;
