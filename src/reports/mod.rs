pub mod body;
pub mod service;

pub use service::{ReportRequest, ReportService};
