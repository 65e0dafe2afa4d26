//! Intake Database Library
//!
//! Persistence for validated uploads. Callers depend on the
//! [`FileRecordStore`] trait; `FileRecordRepository` backs it with Postgres and
//! `InMemoryFileRecordStore` keeps records in process memory.

pub mod db;

pub use db::{FileRecordRepository, FileRecordStore, InMemoryFileRecordStore};
