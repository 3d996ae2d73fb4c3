use crate::errors::ShmError;
use crate::header::RegionHeader;
use crate::locator::SessionLocator;
use crate::paths::{DEFAULT_SHM_DIR, SessionNames};
use crate::session::Session;
use crate::slot::decode_slot;
use crate::types::Frame;
use common::span_debug;
use std::path::PathBuf;
use std::time::Duration;

/// Short enough to keep up with a 100+ Hz producer without spinning.
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_millis(10);

/// The producer single-buffers through slot 0, so that is the only slot read.
/// A multi-slot consumer would need its own read cursor and an overwrite/drop
/// policy that the producer does not define.
const READ_SLOT: u32 = 0;

/// Which producer to attach to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionTarget {
    /// Scan the shared memory directory and take the first valid region.
    Discover,
    /// Attach to the producer with this process id.
    Pid(u32),
}

#[derive(Debug, Clone)]
pub struct ReaderOptions {
    pub shm_dir: PathBuf,
    pub target: SessionTarget,
}

impl Default for ReaderOptions {
    fn default() -> Self {
        Self {
            shm_dir: PathBuf::from(DEFAULT_SHM_DIR),
            target: SessionTarget::Discover,
        }
    }
}

/// Consumer handle: waits for the producer, copies slot 0 out and hands the
/// slot back.
///
/// After [`FrameReader::close`] every read fails with [`ShmError::Disconnected`].
#[derive(Debug)]
pub struct FrameReader {
    session: Option<Session>,
}

impl FrameReader {
    pub fn connect(options: &ReaderOptions) -> Result<Self, ShmError> {
        let session = match options.target {
            SessionTarget::Discover => SessionLocator::new(&options.shm_dir).locate()?,
            SessionTarget::Pid(pid) => Session::attach(pid, &options.shm_dir)?,
        };
        Ok(Self::from_session(session))
    }

    /// Attach to whichever producer is found in `/dev/shm`.
    pub fn discover() -> Result<Self, ShmError> {
        Self::connect(&ReaderOptions::default())
    }

    /// Attach to producer `pid` in `/dev/shm`.
    pub fn with_pid(pid: u32) -> Result<Self, ShmError> {
        Self::connect(&ReaderOptions {
            target: SessionTarget::Pid(pid),
            ..ReaderOptions::default()
        })
    }

    pub fn from_session(session: Session) -> Self {
        Self {
            session: Some(session),
        }
    }

    /// Read the next frame, waiting up to `timeout` for the producer's signal.
    ///
    /// `Ok(None)` means no frame this time: the wait timed out, the signalled
    /// slot was not populated yet, or the region has no slots at all. Once a
    /// signal has been consumed the slot is handed back to the producer
    /// whatever the decode outcome.
    pub fn read_frame(&mut self, timeout: Duration) -> Result<Option<Frame>, ShmError> {
        let _s = span_debug!("read_frame");

        let session = self.session.as_ref().ok_or(ShmError::Disconnected)?;

        if !session.wait_frame_available(timeout)? {
            tracing::trace!(?timeout, "No frame signalled");
            return Ok(None);
        }

        // Copy out before the slot is released; the producer may overwrite it
        // as soon as slot_free is posted.
        let decoded = decode_slot(session.region(), session.header(), READ_SLOT)
            .map(|view| view.map(|slot| slot.to_frame()));
        let released = session.release_slot();

        let frame = match decoded {
            Ok(frame) => frame,
            // A region without slots never carries a frame
            Err(ShmError::SlotOutOfBounds { slot_count: 0, .. }) => None,
            Err(e) => {
                if let Err(release_err) = &released {
                    tracing::warn!(
                        pid = session.pid(),
                        error = %release_err,
                        "Failed to hand slot back to producer"
                    );
                }
                tracing::warn!(pid = session.pid(), error = %e, "Dropping unreadable slot");
                return Err(e);
            }
        };
        released?;

        if frame.is_none() {
            tracing::trace!("Signalled slot not populated yet");
        }
        Ok(frame)
    }

    pub fn is_connected(&self) -> bool {
        self.session.is_some()
    }

    /// Detach from the producer. Calling it again is a no-op.
    pub fn close(&mut self) {
        if let Some(session) = self.session.take() {
            session.detach();
        }
    }

    pub fn header(&self) -> Option<&RegionHeader> {
        self.session.as_ref().map(Session::header)
    }

    pub fn pid(&self) -> Option<u32> {
        self.session.as_ref().map(Session::pid)
    }

    pub fn names(&self) -> Option<&SessionNames> {
        self.session.as_ref().map(Session::names)
    }
}

impl Drop for FrameReader {
    fn drop(&mut self) {
        self.close();
    }
}
