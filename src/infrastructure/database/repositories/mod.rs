//! Database repository implementations

pub mod submission_repository;

pub use submission_repository::SeaOrmSubmissionRepository;
