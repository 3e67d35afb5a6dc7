//! Content store abstractions.
//!
//! - `ContentStore`: byte-level object per inode
//! - `HostStore`: files in a host directory
//! - `MemoryStore`: in-memory implementation

mod content_store;
mod host_store;
mod memory_store;

pub use content_store::{ContentStore, WriteMode};
pub use host_store::HostStore;
pub use memory_store::MemoryStore;
