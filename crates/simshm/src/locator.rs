use crate::errors::ShmError;
use crate::paths::{self, DEFAULT_SHM_DIR};
use crate::session::Session;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Finds a producer without knowing its pid by scanning the shared memory
/// directory for `airsim_images_<pid>` objects.
#[derive(Debug, Clone)]
pub struct SessionLocator {
    shm_dir: PathBuf,
}

impl Default for SessionLocator {
    fn default() -> Self {
        Self::new(DEFAULT_SHM_DIR)
    }
}

impl SessionLocator {
    pub fn new(shm_dir: impl Into<PathBuf>) -> Self {
        Self {
            shm_dir: shm_dir.into(),
        }
    }

    pub fn shm_dir(&self) -> &Path {
        &self.shm_dir
    }

    /// Producer pids with a region in the directory, in ascending order.
    ///
    /// A missing directory yields no candidates rather than an error.
    pub fn candidates(&self) -> Result<Vec<u32>, ShmError> {
        let entries = match fs::read_dir(&self.shm_dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut pids: Vec<u32> = entries
            .filter_map(|entry| entry.ok())
            .filter_map(|entry| paths::parse_region_name(entry.file_name().to_str()?))
            .collect();
        pids.sort_unstable();
        Ok(pids)
    }

    /// Attach to the first candidate that validates.
    ///
    /// Candidates that fail are dropped before the next one is tried, so
    /// nothing they opened outlives this call.
    pub fn locate(&self) -> Result<Session, ShmError> {
        let _s = common::span_debug!("locate_session");

        let candidates = self.candidates()?;
        for &pid in &candidates {
            match Session::attach(pid, &self.shm_dir) {
                Ok(session) => return Ok(session),
                Err(e) => tracing::debug!(pid, error = %e, "Rejected shared memory candidate"),
            }
        }

        Err(ShmError::NoSessionFound {
            dir: self.shm_dir.clone(),
            candidates: candidates.len(),
        })
    }
}
