//! Classification and aggregation of analysis results.
pub mod aggregate;
pub mod classify;

pub use aggregate::{Aggregator, FileReport, IssueStats, Suggestions, Summary, aggregate};
pub use classify::{ClassifiedFinding, IssueType, SEVERE_KEYWORDS, Severity, classify};
