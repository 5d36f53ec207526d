// src/services/metrics.rs
// Request counters and process / system resource sampling

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

const BYTES_PER_MB: u64 = 1024 * 1024;

/// Point-in-time view returned by /metrics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    pub uptime: String,
    pub uptime_secs: u64,
    pub started_at: DateTime<Utc>,
    pub request_count: u64,
    pub command_count: u64,
    pub upload_count: u64,
    pub download_count: u64,
    /// Alive tokio tasks
    pub tasks: usize,
    /// Process resident set size
    pub memory_mb: u64,
    pub cpu_percent: f64,
    pub system_memory_mb: u64,
    pub system_total_mem_mb: u64,
}

#[derive(Debug, Clone, Copy)]
struct CpuSample {
    cpu_secs: f64,
    taken: Instant,
}

#[derive(Debug)]
pub struct MetricsService {
    request_count: AtomicU64,
    command_count: AtomicU64,
    upload_count: AtomicU64,
    download_count: AtomicU64,
    started: Instant,
    started_at: DateTime<Utc>,
    last_cpu: Mutex<Option<CpuSample>>,
}

impl Default for MetricsService {
    fn default() -> Self {
        Self::new()
    }
}

impl MetricsService {
    pub fn new() -> Self {
        Self {
            request_count: AtomicU64::new(0),
            command_count: AtomicU64::new(0),
            upload_count: AtomicU64::new(0),
            download_count: AtomicU64::new(0),
            started: Instant::now(),
            started_at: Utc::now(),
            last_cpu: Mutex::new(None),
        }
    }

    pub fn increment_request(&self) {
        self.request_count.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_command(&self) {
        self.command_count.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_upload(&self) {
        self.upload_count.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_download(&self) {
        self.download_count.fetch_add(1, Ordering::Relaxed);
    }

    pub async fn snapshot(&self) -> MetricsSnapshot {
        let uptime = self.started.elapsed();
        let (system_memory_mb, system_total_mem_mb) = system_memory_mb();

        MetricsSnapshot {
            uptime: format_uptime(uptime),
            uptime_secs: uptime.as_secs(),
            started_at: self.started_at,
            request_count: self.request_count.load(Ordering::Relaxed),
            command_count: self.command_count.load(Ordering::Relaxed),
            upload_count: self.upload_count.load(Ordering::Relaxed),
            download_count: self.download_count.load(Ordering::Relaxed),
            tasks: alive_tasks(),
            memory_mb: process_rss_bytes() / BYTES_PER_MB,
            cpu_percent: self.cpu_percent().await,
            system_memory_mb,
            system_total_mem_mb,
        }
    }

    /// CPU usage since the previous call. The first call reports 0.
    async fn cpu_percent(&self) -> f64 {
        let Some(cpu_secs) = process_cpu_secs() else {
            return 0.0;
        };
        let now = CpuSample {
            cpu_secs,
            taken: Instant::now(),
        };

        let mut last = self.last_cpu.lock().await;
        let previous = last.replace(now);
        match previous {
            Some(prev) => cpu_percent_between(prev, now, num_cpus()),
            None => 0.0,
        }
    }
}

fn cpu_percent_between(prev: CpuSample, now: CpuSample, cpus: usize) -> f64 {
    let wall = now.taken.duration_since(prev.taken).as_secs_f64();
    if wall <= 0.0 {
        return 0.0;
    }

    let max = 100.0 * cpus as f64;
    let percent = (now.cpu_secs - prev.cpu_secs) / wall * max;
    percent.clamp(0.0, max)
}

fn num_cpus() -> usize {
    std::thread::available_parallelism().map_or(1, |n| n.get())
}

fn alive_tasks() -> usize {
    tokio::runtime::Handle::try_current()
        .map(|handle| handle.metrics().num_alive_tasks())
        .unwrap_or(0)
}

/// User + system CPU time of this process, in seconds
#[cfg(unix)]
fn process_cpu_secs() -> Option<f64> {
    // SAFETY: getrusage only writes into the zeroed struct we pass it
    let usage = unsafe {
        let mut usage: libc::rusage = std::mem::zeroed();
        if libc::getrusage(libc::RUSAGE_SELF, &mut usage) != 0 {
            return None;
        }
        usage
    };

    let secs = |tv: libc::timeval| tv.tv_sec as f64 + tv.tv_usec as f64 / 1_000_000.0;
    Some(secs(usage.ru_utime) + secs(usage.ru_stime))
}

#[cfg(not(unix))]
fn process_cpu_secs() -> Option<f64> {
    None
}

#[cfg(target_os = "linux")]
fn process_rss_bytes() -> u64 {
    let Ok(statm) = std::fs::read_to_string("/proc/self/statm") else {
        return 0;
    };
    let resident_pages: u64 = statm
        .split_whitespace()
        .nth(1)
        .and_then(|v| v.parse().ok())
        .unwrap_or(0);

    // SAFETY: sysconf has no preconditions
    let page_size = unsafe { libc::sysconf(libc::_SC_PAGESIZE) };
    resident_pages * u64::try_from(page_size).unwrap_or(4096)
}

#[cfg(not(target_os = "linux"))]
fn process_rss_bytes() -> u64 {
    0
}

/// (used, total) system memory in MB; zeros where unavailable
fn system_memory_mb() -> (u64, u64) {
    std::fs::read_to_string("/proc/meminfo")
        .map(|content| parse_meminfo(&content))
        .unwrap_or((0, 0))
}

fn parse_meminfo(content: &str) -> (u64, u64) {
    let mut total = 0;
    let mut free = 0;
    let mut available = 0;

    for line in content.lines() {
        let mut fields = line.split_whitespace();
        let (Some(key), Some(value)) = (fields.next(), fields.next()) else {
            continue;
        };
        let Ok(kb) = value.parse::<u64>() else {
            continue;
        };

        match key {
            "MemTotal:" => total = kb / 1024,
            "MemFree:" => free = kb / 1024,
            "MemAvailable:" => available = kb / 1024,
            _ => {}
        }
    }

    let used = if available > 0 {
        total.saturating_sub(available)
    } else {
        total.saturating_sub(free)
    };
    (used, total)
}

/// Render a duration as e.g. `1h2m3s`, `4m0s`, `12s`
pub fn format_uptime(d: Duration) -> String {
    let secs = d.as_secs();
    let (hours, minutes, seconds) = (secs / 3600, (secs % 3600) / 60, secs % 60);

    if hours > 0 {
        format!("{}h{}m{}s", hours, minutes, seconds)
    } else if minutes > 0 {
        format!("{}m{}s", minutes, seconds)
    } else {
        format!("{}s", seconds)
    }
}
