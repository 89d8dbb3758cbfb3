pub mod error;
pub mod submission;

pub use error::{DomainError, DomainResult, StorageError, StorageErrorKind};
pub use submission::{StoredSubmission, Submission, SubmissionRepository};
