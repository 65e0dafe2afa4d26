//! File record repositories
//
// Storage-agnostic trait
pub mod store;
//
// Postgres repository (application_files table)
pub mod file_record;
//
// Process-local store for development and tests
pub mod memory;

pub use file_record::FileRecordRepository;
pub use memory::InMemoryFileRecordStore;
pub use store::FileRecordStore;
