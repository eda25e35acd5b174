/// Byte layout of a slot cache region.
///
/// ```text
/// [Header][IndexEntry × (N+1)][Record × (N+1)]
/// ```
///
/// Every field is native-endian and the region carries no padding, so the
/// record table generally starts at an offset that is not aligned for the
/// record type. All accessors here go through byte slices.

/// Size of the fixed header at the start of the region.
pub const HEADER_SIZE: usize = 32;

/// Size of one index-table entry (a single usage flag).
pub const INDEX_ENTRY_SIZE: usize = 1;

/// Header field offsets.
pub const SIZE_OFFSET: usize = 0;
pub const TOTAL_NUM_OFFSET: usize = 8;
pub const FREE_NUM_OFFSET: usize = 16;
pub const LAST_IDX_OFFSET: usize = 24;

/// Index entry states.
pub const UF_UNUSED: u8 = 0;
pub const UF_USED: u8 = 1;

/// Identifier meaning "no slot".
pub const ID_NONE: u64 = 0;

/// Header lives at offset 0 of the region.
///
/// This is a detached copy: load it, mutate it, store it back.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Header {
    pub size: u64,      // 0..8
    pub total_num: u64, // 8..16
    pub free_num: u64,  // 16..24
    pub last_idx: u64,  // 24..32
}

// Compile-time assertion that Header is exactly HEADER_SIZE bytes.
const _: () = assert!(std::mem::size_of::<Header>() == HEADER_SIZE);

impl Header {
    /// Read the header from the first `HEADER_SIZE` bytes of `buf`.
    ///
    /// Panics if `buf` is shorter than `HEADER_SIZE`; callers check first.
    pub fn load(buf: &[u8]) -> Self {
        Header {
            size: read_u64(buf, SIZE_OFFSET),
            total_num: read_u64(buf, TOTAL_NUM_OFFSET),
            free_num: read_u64(buf, FREE_NUM_OFFSET),
            last_idx: read_u64(buf, LAST_IDX_OFFSET),
        }
    }

    /// Write the header into the first `HEADER_SIZE` bytes of `buf`.
    pub fn store(&self, buf: &mut [u8]) {
        write_u64(buf, SIZE_OFFSET, self.size);
        write_u64(buf, TOTAL_NUM_OFFSET, self.total_num);
        write_u64(buf, FREE_NUM_OFFSET, self.free_num);
        write_u64(buf, LAST_IDX_OFFSET, self.last_idx);
    }
}

#[inline]
fn read_u64(buf: &[u8], offset: usize) -> u64 {
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&buf[offset..offset + 8]);
    u64::from_ne_bytes(bytes)
}

#[inline]
fn write_u64(buf: &mut [u8], offset: usize, value: u64) {
    buf[offset..offset + 8].copy_from_slice(&value.to_ne_bytes());
}

/// Number of entries in each table for a capacity, sentinel included.
fn table_len(capacity: u64) -> Option<usize> {
    usize::try_from(capacity).ok()?.checked_add(1)
}

/// Compute the total size of the region, or `None` on overflow.
pub fn region_size(capacity: u64, record_size: usize) -> Option<usize> {
    let entries = table_len(capacity)?;
    let index = entries.checked_mul(INDEX_ENTRY_SIZE)?;
    let data = entries.checked_mul(record_size)?;
    HEADER_SIZE.checked_add(index)?.checked_add(data)
}

/// Offset of the index table from the start of the region.
pub fn index_offset() -> usize {
    HEADER_SIZE
}

/// Offset of the data table from the start of the region.
///
/// Only valid for capacities that passed `region_size`.
pub fn data_offset(capacity: u64) -> usize {
    HEADER_SIZE + (capacity as usize + 1) * INDEX_ENTRY_SIZE
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offsets_follow_capacity() {
        assert_eq!(index_offset(), 32);
        assert_eq!(data_offset(4), 32 + 5);
        assert_eq!(data_offset(1), 34);
    }

    #[test]
    fn region_size_counts_sentinels() {
        // 32 header + 5 flags + 5 * 8 records
        assert_eq!(region_size(4, 8), Some(77));
        // Zero-sized records still need the flags
        assert_eq!(region_size(3, 0), Some(36));
    }

    #[test]
    fn region_size_overflow() {
        assert_eq!(region_size(u64::MAX, 1), None);
        assert_eq!(region_size(u64::MAX / 2, 64), None);
    }

    #[test]
    fn header_field_offsets() {
        let mut buf = vec![0u8; HEADER_SIZE];
        let header = Header {
            size: 77,
            total_num: 4,
            free_num: 3,
            last_idx: 1,
        };
        header.store(&mut buf);

        assert_eq!(&buf[0..8], &77u64.to_ne_bytes());
        assert_eq!(&buf[8..16], &4u64.to_ne_bytes());
        assert_eq!(&buf[16..24], &3u64.to_ne_bytes());
        assert_eq!(&buf[24..32], &1u64.to_ne_bytes());
        assert_eq!(Header::load(&buf), header);
    }

    #[test]
    fn header_at_unaligned_offset() {
        let mut buf = vec![0u8; HEADER_SIZE + 1];
        let header = Header {
            size: 1,
            total_num: 2,
            free_num: 3,
            last_idx: 4,
        };
        header.store(&mut buf[1..]);
        assert_eq!(Header::load(&buf[1..]), header);
    }
}
