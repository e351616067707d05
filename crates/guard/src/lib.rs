//! `rosterkit-guard` — background memory observer.
//!
//! Samples the process's resident memory on a fixed interval for the
//! session's lifetime, tracks last/peak usage, and writes a timestamped
//! diagnostic dump when growth looks dangerous. Strictly read-only: the
//! guard has no authority to pause, throttle, or cancel pipeline work; it
//! communicates only through log lines and dump files.

use std::backtrace::Backtrace;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use log::{error, info, warn};
use sysinfo::{Pid, System};

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct GuardConfig {
    /// Sampling interval.
    pub interval: Duration,
    /// Single-interval RSS growth that triggers a dump, in MB.
    pub spike_mb: u64,
    /// Absolute RSS ceiling that triggers a dump, in MB.
    pub ceiling_mb: u64,
    /// Directory for dump artifacts.
    pub dump_dir: PathBuf,
}

impl Default for GuardConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(1),
            spike_mb: 500,
            ceiling_mb: 3 * 1024,
            dump_dir: std::env::temp_dir().join("rosterkit-dumps"),
        }
    }
}

// ---------------------------------------------------------------------------
// Guard
// ---------------------------------------------------------------------------

/// Handle to the sampling thread. The atomics are written only by the
/// sampler; callers read them.
pub struct MemoryGuard {
    running: Arc<AtomicBool>,
    last_mb: Arc<AtomicU64>,
    peak_mb: Arc<AtomicU64>,
    handle: Option<JoinHandle<()>>,
}

impl MemoryGuard {
    pub fn start(config: GuardConfig) -> Self {
        let running = Arc::new(AtomicBool::new(true));
        let last_mb = Arc::new(AtomicU64::new(0));
        let peak_mb = Arc::new(AtomicU64::new(0));

        let flag = Arc::clone(&running);
        let last = Arc::clone(&last_mb);
        let peak = Arc::clone(&peak_mb);

        let handle = thread::Builder::new()
            .name("memory-guard".into())
            .spawn(move || sampler_loop(config, flag, last, peak))
            .expect("failed to spawn memory guard thread");

        info!("memory guard started");
        Self {
            running,
            last_mb,
            peak_mb,
            handle: Some(handle),
        }
    }

    /// Most recent RSS sample in MB.
    pub fn last_mb(&self) -> u64 {
        self.last_mb.load(Ordering::Relaxed)
    }

    /// Highest RSS sample seen in MB.
    pub fn peak_mb(&self) -> u64 {
        self.peak_mb.load(Ordering::Relaxed)
    }

    /// Stop sampling and join the thread.
    pub fn stop(mut self) {
        self.running.store(false, Ordering::Relaxed);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
        info!("memory guard stopped, peak usage {} MB", self.peak_mb());
    }
}

impl Drop for MemoryGuard {
    fn drop(&mut self) {
        // Signal the sampler so a forgotten handle doesn't pin the thread
        // for the process lifetime; no join here.
        self.running.store(false, Ordering::Relaxed);
    }
}

// ---------------------------------------------------------------------------
// Sampler
// ---------------------------------------------------------------------------

fn sampler_loop(
    config: GuardConfig,
    running: Arc<AtomicBool>,
    last: Arc<AtomicU64>,
    peak: Arc<AtomicU64>,
) {
    let pid = match sysinfo::get_current_pid() {
        Ok(pid) => pid,
        Err(e) => {
            error!("memory guard cannot resolve its own pid: {e}");
            return;
        }
    };
    let mut sys = System::new();

    while running.load(Ordering::Relaxed) {
        if let Some(current) = sample_rss_mb(&mut sys, pid) {
            let previous = last.load(Ordering::Relaxed);
            if current > peak.load(Ordering::Relaxed) {
                peak.store(current, Ordering::Relaxed);
            }

            let delta = current.saturating_sub(previous);
            if delta > config.spike_mb {
                error!("dangerous memory spike: +{delta} MB in one interval");
                write_dump(
                    &config.dump_dir,
                    &format!("memory spike of {delta} MB"),
                    current,
                    peak.load(Ordering::Relaxed),
                );
            }
            if current > config.ceiling_mb {
                error!("critical memory usage: {current} MB");
                write_dump(
                    &config.dump_dir,
                    &format!("critical memory usage: {current} MB"),
                    current,
                    peak.load(Ordering::Relaxed),
                );
            }

            last.store(current, Ordering::Relaxed);
        }

        thread::sleep(config.interval);
    }
}

fn sample_rss_mb(sys: &mut System, pid: Pid) -> Option<u64> {
    if !sys.refresh_process(pid) {
        return None;
    }
    sys.process(pid).map(|p| p.memory() / (1024 * 1024))
}

/// Write a timestamped diagnostic dump: reason, current/peak usage, and a
/// backtrace snapshot of the sampling thread. Post-mortem material only.
fn write_dump(dir: &Path, reason: &str, current_mb: u64, peak_mb: u64) {
    if let Err(e) = std::fs::create_dir_all(dir) {
        warn!("cannot create dump directory {}: {e}", dir.display());
        return;
    }

    let stamp = chrono::Local::now().format("%Y%m%d_%H%M%S");
    let path = dir.join(format!("memdump_{stamp}.log"));
    let contents = format!(
        "=== MEMORY DIAGNOSTIC DUMP ===\n\
         Time: {}\n\
         Reason: {reason}\n\
         Current memory: {current_mb} MB\n\
         Peak memory: {peak_mb} MB\n\n\
         === BACKTRACE (sampler thread) ===\n{}\n",
        chrono::Local::now().to_rfc3339(),
        Backtrace::force_capture(),
    );

    match std::fs::write(&path, contents) {
        Ok(()) => info!("memory dump written to {}", path.display()),
        Err(e) => warn!("failed to write memory dump {}: {e}", path.display()),
    }
}
