use crate::errors::ShmError;
use crate::header::RegionHeader;
use crate::mmap_reader::MmapReader;
use crate::paths::SessionNames;
use crate::semaphore::Semaphore;
use std::io;
use std::path::Path;
use std::time::Duration;

/// One live attachment to a producer's region.
///
/// Owns the read-only mapping and both semaphore handles. Every handle is a
/// field with its own `Drop`, so whichever of them were acquired are released
/// exactly once however the session ends: a failed attach drops the partial
/// set, [`Session::detach`] or a plain drop releases the full set.
#[derive(Debug)]
pub struct Session {
    names: SessionNames,
    header: RegionHeader,
    region: MmapReader,
    frame_available: Semaphore,
    slot_free: Semaphore,
}

impl Session {
    /// Attach to the region published by producer `pid` inside `shm_dir`.
    ///
    /// The header is validated before any semaphore is touched, so a foreign
    /// or uninitialized region never leaves semaphore handles behind.
    pub fn attach(pid: u32, shm_dir: &Path) -> Result<Self, ShmError> {
        let names = SessionNames::for_pid(pid);
        let path = names.region_path(shm_dir);

        let region = MmapReader::new(&path).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => ShmError::RegionNotFound(path.clone()),
            _ => ShmError::IoError(e),
        })?;

        let header = RegionHeader::decode(region.buffer())?;

        // The producer may not have created these yet; create them empty.
        let frame_available = open_semaphore(&names.frame_available_semaphore())?;
        let slot_free = open_semaphore(&names.slot_free_semaphore())?;

        tracing::info!(
            pid,
            path = %path.display(),
            slot_count = header.slot_count,
            slot_size = header.slot_size,
            region_len = region.len(),
            "Attached to shared memory session"
        );

        Ok(Self {
            names,
            header,
            region,
            frame_available,
            slot_free,
        })
    }

    /// Release the mapping and both semaphore handles.
    pub fn detach(self) {
        tracing::info!(pid = self.names.pid, "Detached from shared memory session");
    }

    pub fn pid(&self) -> u32 {
        self.names.pid
    }

    pub fn names(&self) -> &SessionNames {
        &self.names
    }

    /// Header as decoded at attach time.
    pub fn header(&self) -> &RegionHeader {
        &self.header
    }

    pub fn region(&self) -> &[u8] {
        self.region.buffer()
    }

    /// Wait up to `timeout` for the producer to announce a frame.
    pub(crate) fn wait_frame_available(&self, timeout: Duration) -> Result<bool, ShmError> {
        Ok(self.frame_available.timed_wait(timeout)?)
    }

    /// Tell the producer the slot we just read may be overwritten.
    pub(crate) fn release_slot(&self) -> Result<(), ShmError> {
        Ok(self.slot_free.post()?)
    }
}

fn open_semaphore(name: &str) -> Result<Semaphore, ShmError> {
    Semaphore::open_or_create(name, 0).map_err(|source| ShmError::SemaphoreUnavailable {
        name: name.to_string(),
        source,
    })
}
