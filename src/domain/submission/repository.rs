//! Submission repository interface

use async_trait::async_trait;

use super::model::{StoredSubmission, Submission};
use crate::domain::DomainResult;

/// Append-only store of timesheet submissions
#[async_trait]
pub trait SubmissionRepository: Send + Sync {
    /// Persist a submission, stamping id and creation time.
    async fn insert(&self, submission: Submission, ip: Option<String>) -> DomainResult<StoredSubmission>;

    /// All submissions, most recent first.
    async fn list_newest_first(&self) -> DomainResult<Vec<StoredSubmission>>;
}
