//! Application state shared by all handlers.

use intake_core::UploadPolicy;
use intake_processing::ReadLimits;
use intake_db::FileRecordStore;
use std::sync::Arc;

use crate::services::upload::UploadService;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn FileRecordStore>,
    pub uploads: UploadService,
}

impl AppState {
    pub fn new(
        policy: UploadPolicy,
        limits: ReadLimits,
        store: Arc<dyn FileRecordStore>,
    ) -> Self {
        Self {
            uploads: UploadService::new(policy, store.clone()).with_read_limits(limits),
            store,
        }
    }
}
