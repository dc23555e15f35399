//! Per-file review of diffs by a remote model.
pub mod analyzer;
pub mod prompt;
pub mod result;

pub use analyzer::ChangeAnalyzer;
pub use result::{
    AnalysisResult, Category, FileFeedback, NO_CHANGES_FILE, NO_CHANGES_MESSAGE,
};
