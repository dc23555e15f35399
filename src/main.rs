//! aigit - CLI entry point.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand};
use dialoguer::{Editor, Select};
use tokio::sync::mpsc::UnboundedReceiver;
use tracing::warn;

use aigit::analysis::AnalysisResult;
use aigit::config::Config;
use aigit::git::RepoInspector;
use aigit::llm::OpenAiClient;
use aigit::logging;
use aigit::pipeline::{AnalysisEvent, AnalysisReport, spawn_analysis};
use aigit::ChangeAnalyzer;

/// Review working-tree changes with an AI model and draft a commit message.
#[derive(Parser, Debug)]
#[command(name = "aigit")]
#[command(about = "Review working-tree changes with an AI model and draft a commit message")]
#[command(version)]
#[command(args_conflicts_with_subcommands = true)]
struct Cli {
    /// Path inside the repository to work on
    #[arg(long, global = true, default_value = ".")]
    repo: PathBuf,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Also write a debug log file into this directory
    #[arg(long, global = true)]
    log_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,

    #[command(flatten)]
    analyze: AnalyzeArgs,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Analyze changes and offer to commit them (default)
    Analyze(AnalyzeArgs),

    /// List changed files that are not ignored
    Status,

    /// Print the diff text of one file
    Diff {
        /// Repository-relative path
        path: String,
    },

    /// Commit all changed files that are not ignored
    Commit {
        /// Commit message
        #[arg(short, long)]
        message: String,
    },
}

#[derive(Args, Debug)]
struct AnalyzeArgs {
    /// Show the analysis and draft message without committing
    #[arg(long)]
    dry_run: bool,

    /// Commit the draft message without asking
    #[arg(short, long, conflicts_with = "dry_run")]
    yes: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    logging::init(cli.verbose, cli.log_dir.as_deref()).context("Failed to set up logging")?;

    match cli.command.unwrap_or(Command::Analyze(cli.analyze)) {
        Command::Analyze(args) => analyze(&cli.repo, args).await,
        Command::Status => status(&cli.repo),
        Command::Diff { path } => diff(&cli.repo, &path),
        Command::Commit { message } => commit(&cli.repo, &message),
    }
}

fn open_repository(path: &Path) -> Result<RepoInspector> {
    RepoInspector::open(path)
        .with_context(|| format!("Failed to open a git repository at {}", path.display()))
}

async fn analyze(repo_path: &Path, args: AnalyzeArgs) -> Result<()> {
    let inspector = open_repository(repo_path)?;
    let workdir = inspector.workdir().to_path_buf();

    let config = Config::load(&workdir).context("Failed to load API configuration")?;
    let client = OpenAiClient::new(&config).context("Failed to create API client")?;
    println!("Using model {}", client.model());

    let (_handle, mut events) = spawn_analysis(inspector, ChangeAnalyzer::new(client));
    let report = follow_progress(&mut events).await?;

    print_report(&report);

    if !report.has_changes() {
        println!("Nothing to commit.");
        return Ok(());
    }

    let draft = report.draft_commit_message();
    if let Some(ai_message) = report.ai_commit_message.as_deref()
        && ai_message.starts_with("error:")
    {
        println!("\nCommit message generation failed ({ai_message}); using the summary instead.");
    }

    if args.dry_run {
        println!("\n--- Draft commit message ---\n");
        println!("{draft}");
        return Ok(());
    }

    let inspector = open_repository(&workdir)?;
    if args.yes {
        let oid = inspector
            .commit_changes(&draft)
            .context("Failed to commit changes")?;
        println!("✓ Committed {}", short_id(&oid));
        return Ok(());
    }

    commit_menu(&inspector, draft)
}

/// Print worker progress until the run finishes.
async fn follow_progress(events: &mut UnboundedReceiver<AnalysisEvent>) -> Result<AnalysisReport> {
    while let Some(event) = events.recv().await {
        match event {
            AnalysisEvent::Scanning => println!("Scanning for changes..."),
            AnalysisEvent::FilesFound { total } => println!("Found {total} changed file(s)"),
            AnalysisEvent::FileStarted { index, total, path } => {
                println!("[{index}/{total}] Analyzing {path}...");
            }
            AnalysisEvent::FileAnalyzed { result, .. } => {
                if let AnalysisResult::Failed { error } = result {
                    println!("  ✗ {error}");
                }
            }
            AnalysisEvent::GeneratingCommitMessage => println!("Generating commit message..."),
            AnalysisEvent::Finished(report) => return Ok(report),
            AnalysisEvent::Failed(message) => bail!("Analysis failed: {message}"),
        }
    }

    bail!("Analysis stopped before producing a result")
}

fn print_report(report: &AnalysisReport) {
    println!();
    println!("{}", report.summary.render());

    println!("变更文件：");
    for file in &report.summary.files {
        println!("  {}", file.label());
    }

    let detailed: Vec<_> = report
        .summary
        .files
        .iter()
        .filter(|f| f.error.is_some() || !f.findings.is_empty())
        .collect();
    for file in detailed {
        println!();
        println!("{}", file.render_detail());
    }
}

/// Offer commit / edit / cancel until the user commits or gives up.
fn commit_menu(inspector: &RepoInspector, mut message: String) -> Result<()> {
    let choices = ["Commit", "Edit message", "Cancel"];

    loop {
        println!("\n--- Commit message ---\n{message}\n");

        let choice = Select::new()
            .with_prompt("What would you like to do?")
            .items(&choices)
            .default(0)
            .interact()
            .context("Failed to read selection")?;

        match choice {
            0 => match inspector.commit_changes(&message) {
                Ok(oid) => {
                    println!("✓ Committed {}", short_id(&oid));
                    return Ok(());
                }
                Err(e) => {
                    warn!("Commit failed: {}", e);
                    eprintln!("Commit failed: {e}");
                }
            },
            1 => {
                if let Some(edited) = Editor::new()
                    .edit(&message)
                    .context("Failed to open editor")?
                {
                    message = edited.trim().to_string();
                }
            }
            _ => {
                println!("Cancelled.");
                return Ok(());
            }
        }
    }
}

fn status(repo_path: &Path) -> Result<()> {
    let inspector = open_repository(repo_path)?;
    let files = inspector
        .list_modified_files()
        .context("Failed to read repository status")?;

    if files.is_empty() {
        println!("No changes.");
        return Ok(());
    }

    for file in files {
        println!("{file}");
    }
    Ok(())
}

fn diff(repo_path: &Path, path: &str) -> Result<()> {
    let inspector = open_repository(repo_path)?;
    println!("{}", inspector.file_diff(path));
    Ok(())
}

fn commit(repo_path: &Path, message: &str) -> Result<()> {
    let inspector = open_repository(repo_path)?;
    let oid = inspector
        .commit_changes(message)
        .context("Failed to commit changes")?;
    println!("✓ Committed {}", short_id(&oid));
    Ok(())
}

fn short_id(oid: &git2::Oid) -> String {
    oid.to_string().chars().take(7).collect()
}
