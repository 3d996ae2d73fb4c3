use memmap2::{Mmap, MmapOptions};
use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};

/// Read-only mapping of a shared memory object.
///
/// The file is opened without write access and mapped `PROT_READ`, so this
/// process cannot scribble on the producer's region even by accident.
///
/// The producer keeps writing into the mapping while we hold it. Bytes read
/// through [`MmapReader::buffer`] are only meaningful after the producer has
/// signalled that the range is complete, and must be copied out before the
/// range is handed back.
pub struct MmapReader {
    _file: File,
    mmap: Mmap,
    path: PathBuf,
}

impl MmapReader {
    pub fn new(path: impl AsRef<Path>) -> io::Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)?;
        let mmap = unsafe { MmapOptions::new().map(&file)? };

        Ok(Self {
            _file: file,
            mmap,
            path: path.to_path_buf(),
        })
    }

    pub fn buffer(&self) -> &[u8] {
        &self.mmap
    }

    pub fn len(&self) -> usize {
        self.mmap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mmap.is_empty()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl std::fmt::Debug for MmapReader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MmapReader")
            .field("path", &self.path)
            .field("len", &self.mmap.len())
            .finish()
    }
}
