//! Timesheet submission aggregate
//!
//! Contains the submission entities, validation rules, the reporting
//! projection and the repository interface.

pub mod cpf;
pub mod model;
pub mod report;
pub mod repository;

pub use model::{Collaborator, Period, StoredSubmission, Submission, Task, Weekdays};
pub use report::{denormalize, ReportRow};
pub use repository::SubmissionRepository;
