#[cfg(feature = "cli")]
use std::sync::Mutex;
#[cfg(feature = "cli")]
use std::time::{Duration, Instant};
#[cfg(feature = "cli")]
use sysinfo::{Pid, System};

/// Resource usage sampled when a funnel stage ends.
#[cfg(feature = "cli")]
#[derive(Debug, Clone)]
pub struct StageSample {
    pub cpu_usage: f32,
    pub memory_mb: u64,
    pub peak_memory_mb: u64,
    /// Time spent since the previous stage ended (or since start).
    pub stage_time: Duration,
    pub total_time: Duration,
}

#[cfg(feature = "cli")]
struct MonitorState {
    system: System,
    last_checkpoint: Instant,
    peak_memory_mb: u64,
}

/// Logs process CPU/memory and stage duration after each funnel stage when `--monitor` is set.
#[cfg(feature = "cli")]
pub struct StageMonitor {
    state: Option<Mutex<MonitorState>>,
    pid: Option<Pid>,
    started: Instant,
}

#[cfg(feature = "cli")]
impl StageMonitor {
    pub fn new(enabled: bool) -> Self {
        let now = Instant::now();
        let state = enabled.then(|| {
            Mutex::new(MonitorState {
                system: System::new(),
                last_checkpoint: now,
                peak_memory_mb: 0,
            })
        });

        Self {
            state,
            pid: sysinfo::get_current_pid().ok(),
            started: now,
        }
    }

    /// Samples the process and moves the stage checkpoint forward.
    pub fn checkpoint(&self) -> Option<StageSample> {
        let pid = self.pid?;
        let mut state = self.state.as_ref()?.lock().ok()?;

        state.system.refresh_all();
        let process = state.system.process(pid)?;
        let cpu_usage = process.cpu_usage();
        let memory_mb = process.memory() / 1024 / 1024;

        state.peak_memory_mb = state.peak_memory_mb.max(memory_mb);
        let now = Instant::now();
        let stage_time = now.duration_since(state.last_checkpoint);
        state.last_checkpoint = now;

        Some(StageSample {
            cpu_usage,
            memory_mb,
            peak_memory_mb: state.peak_memory_mb,
            stage_time,
            total_time: now.duration_since(self.started),
        })
    }

    pub fn log_stage(&self, stage: &str) {
        if let Some(sample) = self.checkpoint() {
            tracing::info!(
                "📊 {} took {:?} - CPU: {:.1}%, Memory: {}MB, Peak: {}MB",
                stage,
                sample.stage_time,
                sample.cpu_usage,
                sample.memory_mb,
                sample.peak_memory_mb
            );
        }
    }

    pub fn log_final_stats(&self) {
        if let Some(sample) = self.checkpoint() {
            tracing::info!(
                "📊 Run finished in {:?}, peak memory {}MB",
                sample.total_time,
                sample.peak_memory_mb
            );
        }
    }
}

// 非 CLI 環境的空實現
#[cfg(not(feature = "cli"))]
pub struct StageMonitor;

#[cfg(not(feature = "cli"))]
impl StageMonitor {
    pub fn new(_enabled: bool) -> Self {
        Self
    }

    pub fn log_stage(&self, _stage: &str) {}

    pub fn log_final_stats(&self) {}
}
