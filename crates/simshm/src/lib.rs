//! Reader side of the simulator's shared-memory image transport.
//!
//! The simulator process owns a POSIX shared memory region named
//! `airsim_images_<pid>` holding a fixed header followed by fixed-size image
//! slots, plus two named semaphores used as a producer/consumer handshake.
//! This crate attaches to that region read-only and turns slots into owned
//! [`Frame`]s.

pub mod errors;
pub mod frame_reader;
pub mod header;
pub mod locator;
pub mod mmap_reader;
pub mod paths;
pub mod semaphore;
pub mod session;
pub mod slot;
pub mod types;

mod utils;

pub use errors::{ShmError, SlotDefect};
pub use frame_reader::{DEFAULT_READ_TIMEOUT, FrameReader, ReaderOptions, SessionTarget};
pub use header::RegionHeader;
pub use locator::SessionLocator;
pub use mmap_reader::MmapReader;
pub use paths::SessionNames;
pub use semaphore::{Semaphore, SemaphoreError};
pub use session::Session;
pub use slot::{SlotHeader, SlotView};
pub use types::{Frame, FrameInfo, ImageKind};
