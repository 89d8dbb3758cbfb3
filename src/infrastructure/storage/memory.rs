//! In-memory storage implementation

use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;

use crate::domain::submission::{StoredSubmission, Submission, SubmissionRepository};
use crate::domain::DomainResult;

/// In-memory submission store for development and testing
pub struct InMemorySubmissionRepository {
    submissions: DashMap<u64, StoredSubmission>,
    sequence: AtomicU64,
}

impl InMemorySubmissionRepository {
    pub fn new() -> Self {
        Self {
            submissions: DashMap::new(),
            sequence: AtomicU64::new(1),
        }
    }

    pub fn len(&self) -> usize {
        self.submissions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.submissions.is_empty()
    }
}

impl Default for InMemorySubmissionRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SubmissionRepository for InMemorySubmissionRepository {
    async fn insert(&self, submission: Submission, ip: Option<String>) -> DomainResult<StoredSubmission> {
        let stored = StoredSubmission {
            id: uuid::Uuid::new_v4().to_string(),
            submission,
            created_at: Utc::now(),
            ip,
        };
        let seq = self.sequence.fetch_add(1, Ordering::SeqCst);
        self.submissions.insert(seq, stored.clone());
        Ok(stored)
    }

    async fn list_newest_first(&self) -> DomainResult<Vec<StoredSubmission>> {
        let mut entries: Vec<(u64, StoredSubmission)> = self
            .submissions
            .iter()
            .map(|entry| (*entry.key(), entry.value().clone()))
            .collect();
        entries.sort_by(|a, b| b.0.cmp(&a.0));
        Ok(entries.into_iter().map(|(_, s)| s).collect())
    }
}
