use crate::semaphore::SemaphoreError;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ShmError {
    #[error("No shared memory session found in {} ({candidates} candidates tried)", .dir.display())]
    NoSessionFound { dir: PathBuf, candidates: usize },

    #[error("Shared memory region not found: {}", .0.display())]
    RegionNotFound(PathBuf),

    #[error("Region too small: {len} bytes, need at least {required}")]
    RegionTooSmall { len: usize, required: usize },

    #[error("Invalid magic number: {found:#010x}")]
    InvalidMagic { found: u32 },

    #[error("Semaphore {name} unavailable: {source}")]
    SemaphoreUnavailable {
        name: String,
        #[source]
        source: SemaphoreError,
    },

    #[error("Semaphore error: {0}")]
    Semaphore(#[from] SemaphoreError),

    #[error("Malformed slot {index}: {defect}")]
    MalformedSlot { index: u32, defect: SlotDefect },

    #[error("Slot {index} out of bounds (region has {slot_count} slots)")]
    SlotOutOfBounds { index: u32, slot_count: u32 },

    #[error("Slot {index} spans bytes {start}..{end} past the end of a {region_len} byte region")]
    SlotBeyondRegion {
        index: u32,
        start: usize,
        end: usize,
        region_len: usize,
    },

    #[error("Reader is not connected")]
    Disconnected,

    #[error("IO error: {0}")]
    IoError(#[from] io::Error),
}

/// Why a populated slot was rejected.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotDefect {
    #[error("payload_size {declared} does not match {width}x{height}x3 = {expected}")]
    PayloadMismatch {
        width: u32,
        height: u32,
        declared: u32,
        expected: usize,
    },

    #[error("payload of {payload} bytes exceeds slot capacity of {capacity} bytes")]
    PayloadExceedsSlot { payload: usize, capacity: usize },

    #[error("slot_size {slot_size} cannot hold a slot header")]
    SlotTooSmall { slot_size: u32 },

    #[error("dimensions {width}x{height} overflow")]
    DimensionsOverflow { width: u32, height: u32 },
}
