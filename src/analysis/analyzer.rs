//! Remote review of file diffs and commit message generation.

use serde_json::Value;
use tracing::{debug, error, info};

use crate::analysis::prompt::{
    ANALYSIS_SYSTEM_PROMPT, COMMIT_SYSTEM_PROMPT, build_analysis_prompt, build_commit_prompt,
};
use crate::analysis::result::{AnalysisResult, FileFeedback};
use crate::commit::CommitSuggestion;
use crate::error::AnalyzerError;
use crate::git::DiffRecord;
use crate::llm::{ChatBackend, OpenAiClient, parse_json_object};

/// Sends diffs to a chat backend and validates its replies.
///
/// Calls are made one at a time; there is no retry.
pub struct ChangeAnalyzer<B = OpenAiClient> {
    backend: B,
}

impl<B: ChatBackend> ChangeAnalyzer<B> {
    pub fn new(backend: B) -> Self {
        Self { backend }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Review one file. Never fails: every error becomes
    /// [`AnalysisResult::Failed`] and is logged.
    pub async fn analyze_changes(&self, file_path: &str, diff: &str) -> AnalysisResult {
        info!("Analyzing {}", file_path);

        match self.review(file_path, diff).await {
            Ok(feedback) => {
                debug!(
                    "Analysis of {} returned {} findings",
                    file_path,
                    feedback.findings().len()
                );
                AnalysisResult::Completed(feedback)
            }
            Err(e) => {
                error!("Analysis of {} failed: {}", file_path, e);
                AnalysisResult::failed(e.to_string())
            }
        }
    }

    async fn review(&self, file_path: &str, diff: &str) -> Result<FileFeedback, AnalyzerError> {
        let user_prompt = build_analysis_prompt(file_path, diff);
        let reply = self
            .backend
            .complete_json(ANALYSIS_SYSTEM_PROMPT, &user_prompt)
            .await?;
        let object = parse_json_object(&reply)?;

        serde_json::from_value(Value::Object(object))
            .map_err(|e| AnalyzerError::Schema(e.to_string()))
    }

    /// Ask for a conventional commit describing all `diffs`.
    pub async fn suggest_commit(
        &self,
        diffs: &[DiffRecord],
    ) -> Result<CommitSuggestion, AnalyzerError> {
        info!("Generating commit message for {} file(s)", diffs.len());

        let user_prompt = build_commit_prompt(diffs);
        let reply = self
            .backend
            .complete_json(COMMIT_SYSTEM_PROMPT, &user_prompt)
            .await?;
        let object = parse_json_object(&reply)?;

        serde_json::from_value(Value::Object(object))
            .map_err(|e| AnalyzerError::Schema(e.to_string()))
    }

    /// Formatted commit message, or `error: <message>` when generation fails.
    pub async fn generate_commit_message(&self, diffs: &[DiffRecord]) -> String {
        match self.suggest_commit(diffs).await {
            Ok(suggestion) => suggestion.format(),
            Err(e) => {
                error!("Commit message generation failed: {}", e);
                format!("error: {e}")
            }
        }
    }
}
