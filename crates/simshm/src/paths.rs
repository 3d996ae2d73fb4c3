//! Centralized IPC naming
//!
//! The simulator derives every shared object name from its own process id:
//! the image region `airsim_images_<pid>`, the "slot free" semaphore
//! `airsim_write_<pid>` and the "frame available" semaphore `airsim_read_<pid>`.

use std::path::{Path, PathBuf};

/// Directory where POSIX shared memory objects are visible on Linux.
pub const DEFAULT_SHM_DIR: &str = "/dev/shm";

pub const REGION_PREFIX: &str = "airsim_images_";

/// Posted by the reader, waited on by the producer.
pub const SLOT_FREE_PREFIX: &str = "airsim_write_";

/// Posted by the producer, waited on by the reader.
pub const FRAME_AVAILABLE_PREFIX: &str = "airsim_read_";

/// Names of every shared object belonging to one producer process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionNames {
    pub pid: u32,
    pub region: String,
    pub slot_free: String,
    pub frame_available: String,
}

impl SessionNames {
    pub fn for_pid(pid: u32) -> Self {
        Self {
            pid,
            region: format!("{REGION_PREFIX}{pid}"),
            slot_free: format!("{SLOT_FREE_PREFIX}{pid}"),
            frame_available: format!("{FRAME_AVAILABLE_PREFIX}{pid}"),
        }
    }

    /// Filesystem path of the region inside `shm_dir`.
    pub fn region_path(&self, shm_dir: &Path) -> PathBuf {
        shm_dir.join(&self.region)
    }

    /// `sem_open` name of the "slot free" semaphore.
    pub fn slot_free_semaphore(&self) -> String {
        format!("/{}", self.slot_free)
    }

    /// `sem_open` name of the "frame available" semaphore.
    pub fn frame_available_semaphore(&self) -> String {
        format!("/{}", self.frame_available)
    }
}

/// Extract the producer pid from a region object name.
///
/// Only exact `airsim_images_<digits>` names match.
pub fn parse_region_name(name: &str) -> Option<u32> {
    let digits = name.strip_prefix(REGION_PREFIX)?;
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}
