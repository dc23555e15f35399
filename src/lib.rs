//! aigit - AI-assisted Git commit messages.
//!
//! # Overview
//!
//! aigit collects the changed files of a working tree, sends each diff to an
//! OpenAI-compatible chat model for review, aggregates the findings into a
//! summary and proposes a conventional commit message for the user to edit
//! and commit.

pub mod analysis;
pub mod commit;
pub mod config;
pub mod error;
pub mod git;
pub mod llm;
pub mod logging;
pub mod pipeline;
pub mod report;

// Re-export commonly used types
pub use analysis::{AnalysisResult, ChangeAnalyzer, FileFeedback};
pub use commit::{CommitSuggestion, CommitType};
pub use config::Config;
pub use error::{AnalyzerError, CommitError, ConfigError, GitError, IgnoreError, LlmError};
pub use git::{DiffRecord, IgnoreFilter, ModifiedFile, RepoInspector};
pub use llm::{ChatBackend, OpenAiClient};
pub use pipeline::{AnalysisEvent, AnalysisReport, spawn_analysis};
pub use report::{Summary, aggregate};
