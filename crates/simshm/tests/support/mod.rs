#![allow(dead_code)]

use memmap2::MmapMut;
use simshm::header::{HEADER_AREA_SIZE, MAGIC};
use simshm::{ReaderOptions, RegionHeader, Semaphore, SessionNames, SessionTarget, SlotHeader};
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU32, Ordering};
use tempfile::TempDir;

static NEXT_ID: AtomicU32 = AtomicU32::new(0);

/// A pid nobody else uses, so semaphore names never collide with a real
/// simulator or with another test.
pub fn unique_pid() -> u32 {
    let base = 3_000_000_000u32 + (std::process::id() % 100_000) * 1_000;
    base + NEXT_ID.fetch_add(1, Ordering::Relaxed)
}

/// Whether any mapping of this process refers to a path containing `fragment`.
pub fn is_mapped(fragment: &str) -> bool {
    std::fs::read_to_string("/proc/self/maps")
        .unwrap()
        .lines()
        .any(|line| line.contains(fragment))
}

pub fn unlink_semaphores(names: &SessionNames) {
    let _ = Semaphore::unlink(&names.frame_available_semaphore());
    let _ = Semaphore::unlink(&names.slot_free_semaphore());
}

/// Write a raw region object for `pid` into `dir`.
pub fn write_region_file(dir: &Path, pid: u32, bytes: &[u8]) -> PathBuf {
    let path = SessionNames::for_pid(pid).region_path(dir);
    std::fs::write(&path, bytes).unwrap();
    path
}

pub fn region_bytes(header: &RegionHeader) -> Vec<u8> {
    let mut bytes = vec![0u8; header.region_len().unwrap()];
    bytes[..RegionHeader::SIZE].copy_from_slice(&header.encode());
    bytes
}

pub fn valid_header(slot_count: u32, slot_size: u32) -> RegionHeader {
    RegionHeader {
        magic: MAGIC,
        slot_count,
        slot_size,
        write_index: 0,
        last_update_timestamp: 0,
    }
}

pub fn rgb_slot(width: u32, height: u32, timestamp: u64, kind: u32) -> SlotHeader {
    SlotHeader {
        width,
        height,
        capture_timestamp: timestamp,
        image_kind: kind,
        payload_size: width * height * 3,
    }
}

/// Plays the simulator's side of the handshake against a region in a
/// temporary directory.
pub struct TestProducer {
    pub dir: TempDir,
    pub pid: u32,
    pub names: SessionNames,
    pub header: RegionHeader,
    mmap: MmapMut,
    frame_available: Semaphore,
    slot_free: Semaphore,
}

impl TestProducer {
    pub fn new(slot_count: u32, slot_size: u32) -> Self {
        Self::with_free_slots(slot_count, slot_size, slot_count)
    }

    /// Like [`TestProducer::new`] but with an explicit starting value for the
    /// "slot free" semaphore.
    pub fn with_free_slots(slot_count: u32, slot_size: u32, free_slots: u32) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let pid = unique_pid();
        let names = SessionNames::for_pid(pid);
        let header = valid_header(slot_count, slot_size);

        let path = write_region_file(dir.path(), pid, &region_bytes(&header));
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .open(&path)
            .unwrap();
        let mmap = unsafe { MmapMut::map_mut(&file).unwrap() };

        unlink_semaphores(&names);
        let frame_available = Semaphore::open_or_create(&names.frame_available_semaphore(), 0).unwrap();
        let slot_free =
            Semaphore::open_or_create(&names.slot_free_semaphore(), free_slots).unwrap();

        Self {
            dir,
            pid,
            names,
            header,
            mmap,
            frame_available,
            slot_free,
        }
    }

    pub fn options(&self) -> ReaderOptions {
        ReaderOptions {
            shm_dir: self.dir.path().to_path_buf(),
            target: SessionTarget::Pid(self.pid),
        }
    }

    pub fn discovery_options(&self) -> ReaderOptions {
        ReaderOptions {
            shm_dir: self.dir.path().to_path_buf(),
            target: SessionTarget::Discover,
        }
    }

    /// Write a slot without announcing it.
    pub fn write_slot(&mut self, index: u32, slot: SlotHeader, pixels: &[u8]) {
        let start = HEADER_AREA_SIZE + index as usize * self.header.slot_size as usize;
        let pixel_start = start + SlotHeader::SIZE;
        self.mmap[start..pixel_start].copy_from_slice(&slot.encode());
        self.mmap[pixel_start..pixel_start + pixels.len()].copy_from_slice(pixels);
    }

    pub fn publish(&self) {
        self.frame_available.post().unwrap();
    }

    /// Write slot 0 and announce it, as the simulator does for every frame.
    pub fn send(&mut self, slot: SlotHeader, pixels: &[u8]) {
        self.write_slot(0, slot, pixels);
        self.publish();
    }

    pub fn slot_free_value(&self) -> i32 {
        self.slot_free.value().unwrap()
    }

    pub fn frame_available_value(&self) -> i32 {
        self.frame_available.value().unwrap()
    }
}

impl Drop for TestProducer {
    fn drop(&mut self) {
        unlink_semaphores(&self.names);
    }
}
