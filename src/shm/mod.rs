/// Slot cache over a caller-owned byte region.
///
/// Provides `SlotCache`, a fixed-capacity pool of uniformly sized records
/// addressed by dense ids in `[1, capacity]`. The header, index table and
/// record table all live inside the borrowed buffer, so a region handed
/// back to `SlotCache::init` after a restart picks up where it left off.
///
/// There is no locking. Callers that share a region across threads or
/// processes serialize access themselves.
pub mod cursor;
pub mod layout;
#[cfg(not(target_os = "windows"))]
pub mod region;

use std::fmt;
use std::marker::PhantomData;
use std::mem::size_of;
use std::ops::Range;

use tracing::{debug, trace, warn};

use crate::error::{CacheError, Result};
use crate::record::Record;
use layout::{Header, HEADER_SIZE, UF_UNUSED, UF_USED};

/// Snapshot of the header counters.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SlotCacheInfo {
    /// Total bytes of the region.
    pub size: u64,
    pub total_num: u64,
    pub free_num: u64,
    pub last_idx: u64,
    /// Live records, `total_num - free_num`.
    pub used: u64,
}

/// Handle onto an initialized region.
///
/// Holds the region exclusively for `'a`. Dropping the handle leaves the
/// region as-is; the buffer owner decides its lifetime.
pub struct SlotCache<'a, T: Record> {
    /// Exactly the region bytes, trailing buffer space excluded.
    buf: &'a mut [u8],
    total_num: u64,
    data_offset: usize,
    _marker: PhantomData<T>,
}

impl<'a, T: Record> SlotCache<'a, T> {
    /// Bytes needed for a region of `capacity` records of `T`.
    pub fn required_size(capacity: u64) -> Option<usize> {
        layout::region_size(capacity, size_of::<T>())
    }

    /// Attach to `buf`, initializing it if the header is blank.
    ///
    /// A header whose `total_num` is non-zero marks an existing region: its
    /// contents are kept and its stored capacity wins over `capacity`.
    pub fn init(capacity: u64, buf: &'a mut [u8]) -> Result<Self> {
        if buf.len() < HEADER_SIZE {
            return Err(CacheError::InvalidBuffer {
                required: HEADER_SIZE,
                actual: buf.len(),
            });
        }

        if capacity == 0 {
            return Err(CacheError::InvalidCapacity(capacity));
        }

        let header = Header::load(buf);

        if header.total_num == 0 {
            let requested_size =
                Self::required_size(capacity).ok_or(CacheError::InvalidCapacity(capacity))?;
            if buf.len() < requested_size {
                return Err(CacheError::InvalidBuffer {
                    required: requested_size,
                    actual: buf.len(),
                });
            }

            let region = &mut buf[..requested_size];
            region.fill(0);

            let header = Header {
                size: requested_size as u64,
                total_num: capacity,
                free_num: capacity,
                last_idx: 0,
            };
            header.store(region);
            debug!(?header, "initialized slot cache region");

            return Ok(Self::from_region(region, capacity));
        }

        // Reattach: sizes come from what the region says about itself.
        let total_num = header.total_num;
        let existing_size = Self::required_size(total_num)
            .ok_or(CacheError::InvalidCapacity(total_num))?;
        if buf.len() < existing_size {
            return Err(CacheError::InvalidBuffer {
                required: existing_size,
                actual: buf.len(),
            });
        }

        if total_num != capacity {
            warn!(
                requested = capacity,
                stored = total_num,
                "reattaching with a different capacity, keeping the stored one"
            );
        }
        debug!(?header, "reattached slot cache region");

        Ok(Self::from_region(&mut buf[..existing_size], total_num))
    }

    fn from_region(buf: &'a mut [u8], total_num: u64) -> Self {
        SlotCache {
            buf,
            total_num,
            data_offset: layout::data_offset(total_num),
            _marker: PhantomData,
        }
    }

    fn header(&self) -> Header {
        Header::load(&self.buf[..])
    }

    fn flags(&self) -> &[u8] {
        &self.buf[layout::index_offset()..self.data_offset]
    }

    /// Byte range of slot `id` within the record table.
    #[inline]
    fn slot_range(id: u64) -> Range<usize> {
        let start = id as usize * size_of::<T>();
        start..start + size_of::<T>()
    }

    fn slot(&self, id: u64) -> &[u8] {
        &self.buf[self.data_offset..][Self::slot_range(id)]
    }

    fn read_slot(&self, id: u64) -> T {
        let slot = self.slot(id);
        // Safety: `slot` is exactly `size_of::<T>()` bytes, the read has no
        // alignment requirement, and `Record` makes any byte pattern valid.
        unsafe { std::ptr::read_unaligned(slot.as_ptr().cast::<T>()) }
    }

    /// Store `record` in the next free slot and return its id.
    pub fn insert(&mut self, record: T) -> Result<u64> {
        let total_num = self.total_num;
        let (head, rest) = self.buf.split_at_mut(layout::index_offset());
        let (flags, data) = rest.split_at_mut(self.data_offset - layout::index_offset());

        let mut header = Header::load(head);
        let Some(id) = cursor::next_free(&mut header, flags) else {
            header.store(head);
            return Err(CacheError::PoolExhausted { total: total_num });
        };

        flags[id as usize] = UF_USED;
        let slot = &mut data[Self::slot_range(id)];
        // Safety: `slot` is exactly `size_of::<T>()` bytes and the write has
        // no alignment requirement.
        unsafe { std::ptr::write_unaligned(slot.as_mut_ptr().cast::<T>(), record) };

        header.free_num -= 1;
        header.store(head);
        trace!(id, free_num = header.free_num, "inserted record");

        Ok(id)
    }

    /// Whether `id` names a live record.
    pub fn contains(&self, id: u64) -> bool {
        id <= self.total_num && self.flags()[id as usize] == UF_USED
    }

    /// Copy of the record at `id`, or `None` if the slot is unused or `id`
    /// exceeds the capacity. Use `lookup_bytes` for zero-copy access.
    pub fn lookup(&self, id: u64) -> Option<T> {
        self.contains(id).then(|| self.read_slot(id))
    }

    /// Raw bytes of the record at `id`, borrowed straight from the region.
    pub fn lookup_bytes(&self, id: u64) -> Option<&[u8]> {
        self.contains(id).then(|| self.slot(id))
    }

    /// Like `lookup`, reporting absence as `CacheError::NotFound`.
    pub fn fetch(&self, id: u64) -> Result<T> {
        self.lookup(id).ok_or(CacheError::NotFound(id))
    }

    /// Release `id`. Releasing an unused id is a no-op.
    ///
    /// The slot bytes stay behind until the id is handed out again.
    pub fn delete(&mut self, id: u64) -> Result<()> {
        if id > self.total_num {
            return Err(CacheError::OutOfRange {
                id,
                total: self.total_num,
            });
        }

        let flag = layout::index_offset() + id as usize;
        if self.buf[flag] != UF_USED {
            return Ok(());
        }

        self.buf[flag] = UF_UNUSED;
        let mut header = self.header();
        header.free_num += 1;
        header.store(&mut self.buf[..]);
        trace!(id, free_num = header.free_num, "deleted record");

        Ok(())
    }

    /// Live ids in increasing order.
    pub fn ids(&self) -> Vec<u64> {
        let flags = self.flags();
        (1..=self.total_num)
            .filter(|&i| flags[i as usize] == UF_USED)
            .collect()
    }

    /// Copies of the live records in increasing id order.
    pub fn records(&self) -> Vec<T> {
        self.ids().into_iter().map(|id| self.read_slot(id)).collect()
    }

    /// Live `(id, record)` pairs in increasing id order.
    pub fn entries(&self) -> Vec<(u64, T)> {
        self.ids()
            .into_iter()
            .map(|id| (id, self.read_slot(id)))
            .collect()
    }

    pub fn capacity(&self) -> u64 {
        self.total_num
    }

    /// Number of live records.
    pub fn len(&self) -> u64 {
        let header = self.header();
        header.total_num.saturating_sub(header.free_num)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_full(&self) -> bool {
        self.header().free_num == 0
    }

    pub fn info(&self) -> SlotCacheInfo {
        let h = self.header();
        SlotCacheInfo {
            size: h.size,
            total_num: h.total_num,
            free_num: h.free_num,
            last_idx: h.last_idx,
            used: h.total_num.saturating_sub(h.free_num),
        }
    }
}

/// Header line followed by the usage flags, eight per row.
impl<T: Record> fmt::Display for SlotCache<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let h = self.header();
        writeln!(
            f,
            "size:{}, total_num:{}, free_num:{}, last_idx:{}",
            h.size, h.total_num, h.free_num, h.last_idx
        )?;

        let flags = self.flags();
        for i in 1..=self.total_num {
            write!(f, "{}|", flags[i as usize])?;
            if i % 8 == 0 {
                writeln!(f)?;
            }
        }
        Ok(())
    }
}

impl<T: Record> fmt::Debug for SlotCache<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SlotCache")
            .field("info", &self.info())
            .field("record_size", &size_of::<T>())
            .finish()
    }
}
