pub mod file_record;

pub use file_record::{FileRecordResponse, FileRecordSummary, RecordUpdate, UploadedFileRecord};
