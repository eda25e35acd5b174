use thiserror::Error;

/// Errors reported by [`SlotCache`](crate::SlotCache).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CacheError {
    /// The buffer is empty or too short for the region it must hold.
    #[error("buffer of {actual} bytes cannot hold a region of {required} bytes")]
    InvalidBuffer { required: usize, actual: usize },

    /// Zero capacity, or a capacity whose region size does not fit in memory.
    #[error("invalid capacity {0}")]
    InvalidCapacity(u64),

    /// Every identifier is in use.
    #[error("no free slot left (capacity {total})")]
    PoolExhausted { total: u64 },

    /// The identifier is larger than the capacity.
    #[error("id {id} out of range (capacity {total})")]
    OutOfRange { id: u64, total: u64 },

    /// The identifier does not name a live record.
    #[error("no record at id {0}")]
    NotFound(u64),
}

pub type Result<T, E = CacheError> = std::result::Result<T, E>;
