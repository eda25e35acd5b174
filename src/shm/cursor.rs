/// Identifier recycling over the index table.
///
/// `last_idx` in the header is a cursor: allocation first tries the entry
/// right after it, then scans forward to the end of the table, then wraps
/// around to the front. Monotonic appends hit the fast path every time.
use tracing::{debug, error};

use super::layout::{Header, UF_USED};

/// Pick the next unused identifier, moving the header cursor.
///
/// `flags` is the whole index table, sentinel at index 0 included, so it
/// must hold `header.total_num + 1` entries. Returns `None` when the pool is
/// exhausted. The header is not touched beyond `last_idx`; the caller marks
/// the entry and adjusts `free_num`.
pub fn next_free(header: &mut Header, flags: &[u8]) -> Option<u64> {
    debug_assert_eq!(flags.len() as u64, header.total_num + 1);

    if header.free_num == 0 {
        debug!(?header, "free id use over");
        return None;
    }

    if header.last_idx < header.total_num {
        header.last_idx += 1;
    }

    let id = header.last_idx;

    // Fast path: the slot right after the previous allocation
    if !is_used(flags, id) {
        return Some(id);
    }

    // Forward half
    if let Some(found) = (id..=header.total_num).find(|&i| !is_used(flags, i)) {
        header.last_idx = found;
        return Some(found);
    }

    // Wrap-around half
    if let Some(found) = (1..header.last_idx).find(|&i| !is_used(flags, i)) {
        header.last_idx = found;
        return Some(found);
    }

    error!(?header, "free_num reports free slots but the index table is full");
    None
}

/// Ids past the end of the table count as used so they are never handed out.
#[inline]
fn is_used(flags: &[u8], id: u64) -> bool {
    flags.get(id as usize).map_or(true, |&f| f == UF_USED)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shm::layout::{ID_NONE, UF_UNUSED, UF_USED};

    /// Build a header and index table where the listed ids are in use.
    fn make_table(total: u64, used: &[u64], last_idx: u64) -> (Header, Vec<u8>) {
        let mut flags = vec![UF_UNUSED; total as usize + 1];
        for &id in used {
            flags[id as usize] = UF_USED;
        }
        let header = Header {
            size: 0,
            total_num: total,
            free_num: total - used.len() as u64,
            last_idx,
        };
        (header, flags)
    }

    #[test]
    fn fresh_table_allocates_in_order() {
        let (mut header, mut flags) = make_table(3, &[], 0);
        for expected in 1..=3 {
            let id = next_free(&mut header, &flags).unwrap();
            assert_eq!(id, expected);
            assert_eq!(header.last_idx, expected);
            flags[id as usize] = UF_USED;
            header.free_num -= 1;
        }
        assert_eq!(next_free(&mut header, &flags), None);
    }

    #[test]
    fn exhausted_leaves_cursor_alone() {
        let (mut header, flags) = make_table(2, &[1, 2], 1);
        assert_eq!(next_free(&mut header, &flags), None);
        assert_eq!(header.last_idx, 1);
    }

    #[test]
    fn forward_scan_skips_used() {
        // Cursor at 1, ids 2 and 3 busy: first free ahead is 4
        let (mut header, flags) = make_table(5, &[1, 2, 3], 1);
        assert_eq!(next_free(&mut header, &flags), Some(4));
        assert_eq!(header.last_idx, 4);
    }

    #[test]
    fn wraps_to_front() {
        // Full except id 2, cursor parked at the end
        let (mut header, flags) = make_table(4, &[1, 3, 4], 4);
        assert_eq!(next_free(&mut header, &flags), Some(2));
        assert_eq!(header.last_idx, 2);
    }

    #[test]
    fn cursor_stops_at_end() {
        // Cursor at the end and the end slot is free again
        let (mut header, flags) = make_table(4, &[1, 2, 3], 4);
        assert_eq!(next_free(&mut header, &flags), Some(4));
        assert_eq!(header.last_idx, 4);
    }

    #[test]
    fn inconsistent_free_count_is_exhaustion() {
        let (mut header, flags) = make_table(3, &[1, 2, 3], 1);
        header.free_num = 1;
        assert_eq!(next_free(&mut header, &flags), None);
        // The step-2 advance sticks even on failure
        assert_eq!(header.last_idx, 2);
    }

    #[test]
    fn sentinel_never_chosen() {
        let (mut header, mut flags) = make_table(3, &[], 0);
        while let Some(id) = next_free(&mut header, &flags) {
            assert_ne!(id, ID_NONE);
            flags[id as usize] = UF_USED;
            header.free_num -= 1;
        }
        assert_eq!(header.free_num, 0);
    }
}
