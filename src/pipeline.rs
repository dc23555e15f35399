//! Background analysis run.
//!
//! One tokio task enumerates changed files, reviews them one after another,
//! aggregates the results and asks for a commit message. Progress is reported
//! over an unbounded channel; the consumer owns all presentation state.

use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender, unbounded_channel};
use tokio::task::JoinHandle;
use tracing::{error, info};

use crate::analysis::{AnalysisResult, ChangeAnalyzer, NO_CHANGES_FILE};
use crate::error::GitError;
use crate::git::{DiffRecord, RepoInspector};
use crate::llm::ChatBackend;
use crate::report::{Summary, aggregate};

/// Progress and completion notifications from the worker.
#[derive(Debug, Clone)]
pub enum AnalysisEvent {
    Scanning,
    FilesFound {
        total: usize,
    },
    FileStarted {
        index: usize,
        total: usize,
        path: String,
    },
    FileAnalyzed {
        index: usize,
        total: usize,
        path: String,
        result: AnalysisResult,
    },
    GeneratingCommitMessage,
    Finished(AnalysisReport),
    Failed(String),
}

/// Result for one file, in enumeration order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileAnalysis {
    pub path: String,
    pub result: AnalysisResult,
}

/// Everything a finished run produced.
#[derive(Debug, Clone)]
pub struct AnalysisReport {
    pub files: Vec<FileAnalysis>,
    pub summary: Summary,
    /// Model-generated message; `None` when there was nothing to commit.
    pub ai_commit_message: Option<String>,
}

impl AnalysisReport {
    /// False for the synthetic "no changes" run.
    pub fn has_changes(&self) -> bool {
        self.files
            .iter()
            .any(|f| !matches!(f.result, AnalysisResult::NoChanges { .. }))
    }

    /// Message to pre-fill for the user: the model's message, or the
    /// aggregated commit body when generation failed or was skipped.
    pub fn draft_commit_message(&self) -> String {
        match self.ai_commit_message.as_deref() {
            Some(message) if !message.starts_with("error:") && !message.trim().is_empty() => {
                message.to_string()
            }
            _ => self.summary.commit_body(),
        }
    }
}

/// Start a run on its own task.
///
/// Events are sent fire-and-forget; dropping the receiver does not stop the
/// worker. The task always ends with [`AnalysisEvent::Finished`] or
/// [`AnalysisEvent::Failed`].
pub fn spawn_analysis<B>(
    inspector: RepoInspector,
    analyzer: ChangeAnalyzer<B>,
) -> (JoinHandle<()>, UnboundedReceiver<AnalysisEvent>)
where
    B: ChatBackend + 'static,
{
    let (tx, rx) = unbounded_channel();

    let handle = tokio::spawn(async move {
        match run_analysis(inspector, &analyzer, &tx).await {
            Ok(report) => {
                let _ = tx.send(AnalysisEvent::Finished(report));
            }
            Err(e) => {
                error!("Analysis run failed: {}", e);
                let _ = tx.send(AnalysisEvent::Failed(e.to_string()));
            }
        }
    });

    (handle, rx)
}

/// Run the whole analysis, reporting progress on `events`.
///
/// Takes the inspector by value: the repository handle is not `Sync`, so it
/// must not be borrowed across the remote calls of a spawned task.
pub async fn run_analysis<B>(
    inspector: RepoInspector,
    analyzer: &ChangeAnalyzer<B>,
    events: &UnboundedSender<AnalysisEvent>,
) -> Result<AnalysisReport, GitError>
where
    B: ChatBackend,
{
    let _ = events.send(AnalysisEvent::Scanning);
    let modified = inspector.list_modified_files()?;
    let total = modified.len();
    info!("Found {} changed file(s)", total);
    let _ = events.send(AnalysisEvent::FilesFound { total });

    if modified.is_empty() {
        let result = AnalysisResult::no_changes();
        let summary = aggregate([(NO_CHANGES_FILE, &result)]);
        return Ok(AnalysisReport {
            files: vec![FileAnalysis {
                path: NO_CHANGES_FILE.to_string(),
                result,
            }],
            summary,
            ai_commit_message: None,
        });
    }

    let mut files = Vec::with_capacity(total);
    let mut diffs = Vec::with_capacity(total);

    for (offset, file) in modified.into_iter().enumerate() {
        let index = offset + 1;
        let _ = events.send(AnalysisEvent::FileStarted {
            index,
            total,
            path: file.path.clone(),
        });

        let record: DiffRecord = inspector.diff_record(&file.path);
        let result = analyzer.analyze_changes(&record.path, &record.diff).await;

        let _ = events.send(AnalysisEvent::FileAnalyzed {
            index,
            total,
            path: file.path.clone(),
            result: result.clone(),
        });

        files.push(FileAnalysis {
            path: file.path,
            result,
        });
        diffs.push(record);
    }

    let summary = aggregate(files.iter().map(|f| (f.path.as_str(), &f.result)));

    let _ = events.send(AnalysisEvent::GeneratingCommitMessage);
    let ai_commit_message = analyzer.generate_commit_message(&diffs).await;

    Ok(AnalysisReport {
        files,
        summary,
        ai_commit_message: Some(ai_commit_message),
    })
}
