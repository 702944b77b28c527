//! Live OS sampling for the metrics document.
//!
//! CPU figures (machine-wide and per process) need two refreshes separated by
//! `MINIMUM_CPU_UPDATE_INTERVAL`, so every sampler here blocks for at least
//! that long. Call them from `spawn_blocking`.

use std::collections::HashMap;
use std::net::{IpAddr, Ipv4Addr, UdpSocket};

use chrono::{DateTime, Local};
use serde::Serialize;
use sysinfo::{
    Disks, MINIMUM_CPU_UPDATE_INTERVAL, ProcessRefreshKind, ProcessesToUpdate, System, Users,
};

pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Debug, Serialize, Clone)]
pub struct CpuMetrics {
    pub percent_usage_per_core: Vec<f32>,
    /// Mean of the per-core figures, 0..100.
    pub overall_usage: f32,
    pub cores: usize,
}

#[derive(Debug, Serialize, Clone)]
pub struct MemoryMetrics {
    pub total: u64,
    pub available: u64,
    pub used: u64,
    pub free: u64,
    pub percent_used: f64,
    pub swap_total: u64,
    pub swap_used: u64,
    pub swap_percent: f64,
}

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct PartitionMetrics {
    pub device: String,
    pub mountpoint: String,
    pub fstype: String,
    pub total: u64,
    pub used: u64,
    pub free: u64,
    pub percent_used: f64,
}

#[derive(Debug, Serialize, Clone)]
pub struct DiskMetrics {
    pub partitions: Vec<PartitionMetrics>,
}

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct ProcessInfo {
    pub pid: u32,
    pub name: String,
    pub username: Option<String>,
    pub cpu_percent: f32,
    pub memory_percent: f64,
    pub create_time: String,
    pub status: String,
    pub cmdline: String,
}

/// The full document served at `/metrics`.
#[derive(Debug, Serialize, Clone)]
pub struct MetricsDocument {
    pub timestamp: String,
    pub hostname: String,
    pub ip_address: String,
    pub os_info: String,
    pub cpu: CpuMetrics,
    pub memory: MemoryMetrics,
    pub disk: DiskMetrics,
    pub processes: Vec<ProcessInfo>,
}

pub fn percent(used: u64, total: u64) -> f64 {
    if total == 0 {
        0.0
    } else {
        used as f64 / total as f64 * 100.0
    }
}

/// sysinfo reports NaN for processes it has seen only once.
fn finite(v: f32) -> f32 {
    if v.is_finite() { v } else { 0.0 }
}

pub fn mean(values: &[f32]) -> f32 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f32>() / values.len() as f32
    }
}

/// Highest CPU first; ties keep pid order.
pub fn sort_by_cpu(processes: &mut [ProcessInfo]) {
    processes.sort_by(|a, b| {
        b.cpu_percent
            .total_cmp(&a.cpu_percent)
            .then_with(|| a.pid.cmp(&b.pid))
    });
}

/// Collapses entries that describe the same device (bind mounts, overlays).
/// Prefers the `/` mount, otherwise the shortest mount path.
pub fn dedupe_partitions(partitions: Vec<PartitionMetrics>) -> Vec<PartitionMetrics> {
    fn mount_score(mp: &str) -> (u8, usize) {
        let root_rank = if mp == "/" { 0 } else { 1 };
        (root_rank, mp.len())
    }

    let mut pick: HashMap<(String, u64, String), PartitionMetrics> = HashMap::new();
    for p in partitions {
        let key = (p.device.clone(), p.total, p.fstype.clone());
        match pick.get(&key) {
            Some(prev) if mount_score(&prev.mountpoint) <= mount_score(&p.mountpoint) => {}
            _ => {
                pick.insert(key, p);
            }
        }
    }

    let mut out: Vec<PartitionMetrics> = pick.into_values().collect();
    out.sort_by(|a, b| a.mountpoint.cmp(&b.mountpoint));
    out
}

pub fn host_info() -> (String, String, String) {
    let hostname = System::host_name().unwrap_or_else(|| "localhost".to_string());
    let os_info = format!(
        "{} {}",
        System::name().unwrap_or_else(|| std::env::consts::OS.to_string()),
        System::kernel_version().unwrap_or_default()
    )
    .trim()
    .to_string();

    (hostname, local_ip().to_string(), os_info)
}

/// Address of the interface used for outbound traffic. Connecting a UDP
/// socket sends nothing; it only selects a route.
fn local_ip() -> IpAddr {
    UdpSocket::bind("0.0.0.0:0")
        .and_then(|socket| {
            socket.connect("8.8.8.8:80")?;
            socket.local_addr()
        })
        .map(|addr| addr.ip())
        .unwrap_or(IpAddr::V4(Ipv4Addr::LOCALHOST))
}

fn cpu_from(sys: &System) -> CpuMetrics {
    let per_core: Vec<f32> = sys.cpus().iter().map(|c| finite(c.cpu_usage())).collect();
    CpuMetrics {
        overall_usage: mean(&per_core),
        cores: per_core.len(),
        percent_usage_per_core: per_core,
    }
}

fn memory_from(sys: &System) -> MemoryMetrics {
    MemoryMetrics {
        total: sys.total_memory(),
        available: sys.available_memory(),
        used: sys.used_memory(),
        free: sys.free_memory(),
        percent_used: percent(sys.used_memory(), sys.total_memory()),
        swap_total: sys.total_swap(),
        swap_used: sys.used_swap(),
        swap_percent: percent(sys.used_swap(), sys.total_swap()),
    }
}

fn processes_from(sys: &System) -> Vec<ProcessInfo> {
    let users = Users::new_with_refreshed_list();
    let total_memory = sys.total_memory();

    let mut processes: Vec<ProcessInfo> = sys
        .processes()
        .values()
        .map(|p| {
            let cmdline = p
                .cmd()
                .iter()
                .map(|part| part.to_string_lossy())
                .collect::<Vec<_>>()
                .join(" ");

            ProcessInfo {
                pid: p.pid().as_u32(),
                name: p.name().to_string_lossy().to_string(),
                username: p
                    .user_id()
                    .and_then(|uid| users.get_user_by_id(uid))
                    .map(|u| u.name().to_string()),
                cpu_percent: finite(p.cpu_usage()),
                memory_percent: percent(p.memory(), total_memory),
                create_time: DateTime::from_timestamp(p.start_time() as i64, 0)
                    .map(|t| t.with_timezone(&Local).format(TIMESTAMP_FORMAT).to_string())
                    .unwrap_or_default(),
                status: p.status().to_string(),
                cmdline,
            }
        })
        .collect();

    sort_by_cpu(&mut processes);
    processes
}

pub fn sample_cpu() -> CpuMetrics {
    let mut sys = System::new();
    sys.refresh_cpu_usage();
    std::thread::sleep(MINIMUM_CPU_UPDATE_INTERVAL);
    sys.refresh_cpu_usage();
    cpu_from(&sys)
}

pub fn sample_memory() -> MemoryMetrics {
    let mut sys = System::new();
    sys.refresh_memory();
    memory_from(&sys)
}

pub fn sample_disk() -> DiskMetrics {
    let disks = Disks::new_with_refreshed_list();
    let partitions = disks
        .list()
        .iter()
        .filter(|d| !d.file_system().is_empty())
        .map(|d| {
            let total = d.total_space();
            let free = d.available_space();
            let used = total.saturating_sub(free);
            PartitionMetrics {
                device: d.name().to_string_lossy().to_string(),
                mountpoint: d.mount_point().to_string_lossy().to_string(),
                fstype: d.file_system().to_string_lossy().to_string(),
                total,
                used,
                free,
                percent_used: percent(used, total),
            }
        })
        .collect();

    DiskMetrics {
        partitions: dedupe_partitions(partitions),
    }
}

pub fn sample_processes() -> Vec<ProcessInfo> {
    let mut sys = System::new();
    sys.refresh_memory();
    sys.refresh_processes_specifics(ProcessesToUpdate::All, true, ProcessRefreshKind::everything());
    std::thread::sleep(MINIMUM_CPU_UPDATE_INTERVAL);
    sys.refresh_processes_specifics(ProcessesToUpdate::All, true, ProcessRefreshKind::everything());
    processes_from(&sys)
}

/// Samples everything with a single CPU settling window.
pub fn sample_document() -> MetricsDocument {
    let mut sys = System::new();
    sys.refresh_memory();
    sys.refresh_cpu_usage();
    sys.refresh_processes_specifics(ProcessesToUpdate::All, true, ProcessRefreshKind::everything());
    std::thread::sleep(MINIMUM_CPU_UPDATE_INTERVAL);
    sys.refresh_cpu_usage();
    sys.refresh_processes_specifics(ProcessesToUpdate::All, true, ProcessRefreshKind::everything());

    let (hostname, ip_address, os_info) = host_info();

    MetricsDocument {
        timestamp: Local::now().format(TIMESTAMP_FORMAT).to_string(),
        hostname,
        ip_address,
        os_info,
        cpu: cpu_from(&sys),
        memory: memory_from(&sys),
        disk: sample_disk(),
        processes: processes_from(&sys),
    }
}
