//! Timesheet write endpoints and the BI export

pub mod dto;
pub mod handlers;

pub use dto::*;
pub use handlers::*;
