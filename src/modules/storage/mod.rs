pub mod keys;
pub mod memory;
pub mod minio;
pub mod store;

pub use keys::{object_key, rekey, StorageNamespace};
pub use memory::MemoryStore;
pub use minio::MinioStore;
pub use store::{create_store, ObjectStore};
