//! Types for the upload state machine

use intake_core::{UploadError, UploadedFileRecord};
use intake_processing::{Part, PartReader, ValidatedFile};
use uuid::Uuid;

/// Final result of one upload attempt.
#[derive(Debug)]
pub enum UploadOutcome {
    Stored(UploadedFileRecord),
    Rejected(UploadError),
}

impl UploadOutcome {
    pub fn into_result(self) -> Result<UploadedFileRecord, UploadError> {
        match self {
            UploadOutcome::Stored(record) => Ok(record),
            UploadOutcome::Rejected(reason) => Err(reason),
        }
    }

    pub fn is_stored(&self) -> bool {
        matches!(self, UploadOutcome::Stored(_))
    }
}

/// Where an accepted file goes once validated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PersistTarget {
    /// New record with a fresh id
    Create,
    /// Overwrite the content and name of an existing record
    Replace { id: Uuid, expected_version: i32 },
}

/// One state of the upload state machine. `S` is the not-yet-read body.
pub(super) enum UploadStep<S> {
    AwaitingBoundary(S),
    ReadingParts(PartReader),
    Validating { reader: PartReader, part: Part },
    Persisting(ValidatedFile),
    Done(UploadedFileRecord),
    Rejected(UploadError),
}

impl<S> UploadStep<S> {
    pub(super) fn name(&self) -> &'static str {
        match self {
            UploadStep::AwaitingBoundary(_) => "awaiting_boundary",
            UploadStep::ReadingParts(_) => "reading_parts",
            UploadStep::Validating { .. } => "validating",
            UploadStep::Persisting(_) => "persisting",
            UploadStep::Done(_) => "done",
            UploadStep::Rejected(_) => "rejected",
        }
    }
}
