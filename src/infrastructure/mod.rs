pub mod memory_storage;
pub mod sqlite_storage;
