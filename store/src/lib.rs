//! Block storage abstraction.
//!
//! Every storage backend (in-memory for testing, LMDB for production)
//! implements [`BlockStorage`]. The rest of the workspace depends only on
//! the trait and on [`BlockStorageCache`], which serializes access into
//! many concurrent read views and one write modifier.

pub mod cache;
pub mod error;
pub mod memory;
pub mod storage;

pub use cache::{BlockStorageCache, BlockStorageModifier, BlockStorageView};
pub use error::StoreError;
pub use memory::{nemesis_element, MemoryBlockStorage};
pub use storage::BlockStorage;
