/// File-backed memory mapping to host a slot cache region.
///
/// The cache itself only borrows bytes. `MappedRegion` is one way to own
/// them: a memory-mapped file that outlives the process, so a later run
/// (or another process) can map the same file and reattach.
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use memmap2::MmapMut;
use tracing::debug;

/// Where named regions live.
fn shm_dir() -> PathBuf {
    if cfg!(target_os = "linux") {
        PathBuf::from("/dev/shm")
    } else {
        // macOS and other Unix: use TMPDIR
        std::env::temp_dir().join("slot_cache")
    }
}

/// A writable mapping of a whole file.
pub struct MappedRegion {
    mmap: MmapMut,
    path: PathBuf,
}

impl MappedRegion {
    /// Map `path`, creating it if needed, with room for at least `len` bytes.
    ///
    /// An existing file is never truncated; a shorter one is extended with
    /// zeros. New files start zeroed, which is what `SlotCache::init` reads
    /// as a blank region.
    pub fn create_or_open(path: impl AsRef<Path>, len: usize) -> io::Result<Self> {
        let path = path.as_ref();
        if let Some(dir) = path.parent() {
            if !dir.as_os_str().is_empty() && !dir.exists() {
                fs::create_dir_all(dir)?;
            }
        }

        let file = fs::OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path)?;

        let current = file.metadata()?.len();
        if current < len as u64 {
            file.set_len(len as u64)?;
        }

        // Safety: the mapping is only as sound as the file's other users.
        // Concurrent writers must coordinate outside this type.
        let mmap = unsafe { MmapMut::map_mut(&file)? };
        debug!(path = %path.display(), len = mmap.len(), existing = current > 0, "mapped region");

        Ok(MappedRegion {
            mmap,
            path: path.to_path_buf(),
        })
    }

    /// Like `create_or_open`, resolving `name` under the shared-memory directory.
    pub fn create_or_open_named(name: &str, len: usize) -> io::Result<Self> {
        Self::create_or_open(shm_dir().join(format!("{name}.slots")), len)
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.mmap
    }

    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        &mut self.mmap
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

    /// Write dirty pages back to the file.
    pub fn flush(&self) -> io::Result<()> {
        self.mmap.flush()
    }

    /// Remove the backing file. The mapping stays valid until dropped.
    pub fn unlink(&self) -> io::Result<()> {
        fs::remove_file(&self.path)
    }
}
