//! Pluggable storage engines (MEMORY, FILESYSTEM, S3) behind one contract,
//! and the registry that holds them (SPEC_FULL §4.2, §4.3).

pub mod contract;
pub mod filesystem;
pub mod memory;
pub mod registry;
pub mod s3;

pub use contract::StorageEngine;
pub use filesystem::FilesystemEngine;
pub use memory::MemoryEngine;
pub use registry::{EngineRegistry, EngineStatus, FILESYSTEM, MEMORY, S3};
pub use s3::{S3Engine, S3EngineConfig};
