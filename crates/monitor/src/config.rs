use common::config::{env_opt, env_or};
use simshm::paths::DEFAULT_SHM_DIR;
use simshm::{ReaderOptions, SessionTarget};
use std::env;
use std::path::PathBuf;
use std::time::Duration;

pub use common::Environment;

#[derive(Debug, Clone)]
pub struct MonitorConfig {
    pub environment: Environment,
    /// Attach to this simulator pid instead of scanning for one.
    pub pid: Option<u32>,
    pub shm_dir: PathBuf,
    pub read_timeout_ms: u64,
    /// How often to retry attaching while no simulator is running.
    pub poll_interval_ms: u64,
    pub stats_interval_secs: u64,
    pub snapshot_dir: Option<PathBuf>,
    pub snapshot_every: u64,
    pub output_json: bool,
}

impl MonitorConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let environment = Environment::from_env();

        let pid = env_opt("AIRSIM_PID");

        let shm_dir = env::var("SHM_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_SHM_DIR));

        let read_timeout_ms = env_or("READ_TIMEOUT_MS", 10);
        let poll_interval_ms = env_or("POLL_INTERVAL_MS", 500);
        let stats_interval_secs = env_or::<u64>("STATS_INTERVAL_SECS", 5).max(1);

        let snapshot_dir = env::var("SNAPSHOT_DIR").ok().map(PathBuf::from);
        let snapshot_every = env_or::<u64>("SNAPSHOT_EVERY", 100).max(1);

        let output_json = env::var("OUTPUT_JSON")
            .map(|v| matches!(v.to_lowercase().as_str(), "1" | "true" | "yes"))
            .unwrap_or(false);

        Ok(Self {
            environment,
            pid,
            shm_dir,
            read_timeout_ms,
            poll_interval_ms,
            stats_interval_secs,
            snapshot_dir,
            snapshot_every,
            output_json,
        })
    }

    pub fn reader_options(&self) -> ReaderOptions {
        ReaderOptions {
            shm_dir: self.shm_dir.clone(),
            target: self.pid.map_or(SessionTarget::Discover, SessionTarget::Pid),
        }
    }

    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms)
    }

    pub fn stats_interval(&self) -> Duration {
        Duration::from_secs(self.stats_interval_secs)
    }
}
