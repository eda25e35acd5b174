//! Fixed-capacity slot allocator over a caller-owned byte region.
//!
//! A [`SlotCache`] keeps its header, usage flags and records inside the
//! buffer it is given, so the same bytes can be handed back after a restart
//! and the cache resumes where it stopped.
//!
//! ```
//! use slot_cache::SlotCache;
//!
//! let mut buf = vec![0u8; SlotCache::<u64>::required_size(4).unwrap()];
//! let mut cache = SlotCache::<u64>::init(4, &mut buf).unwrap();
//!
//! let id = cache.insert(42).unwrap();
//! assert_eq!(cache.lookup(id), Some(42));
//!
//! cache.delete(id).unwrap();
//! assert_eq!(cache.lookup(id), None);
//! ```
//!
//! The crate emits `tracing` events and never installs a subscriber.
mod error;
mod record;
pub mod shm;

pub use error::{CacheError, Result};
pub use record::Record;
pub use shm::{SlotCache, SlotCacheInfo};

#[cfg(not(target_os = "windows"))]
pub use shm::region::MappedRegion;
