pub mod memory;
pub mod trait_def;


pub use memory::MemoryStorage;
pub use trait_def::{Storage, StorageError, StorageResult};
