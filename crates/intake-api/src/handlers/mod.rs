pub mod file_delete;
pub mod file_download;
pub mod file_get;
pub mod file_update;
pub mod file_upload;
