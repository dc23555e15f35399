//! Error types for aigit modules using thiserror.

use std::path::PathBuf;

use thiserror::Error;

/// Errors from loading `.env` configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error(
        "No .env file found at {path}. Copy .env.example to .env and set OPENAI_API_KEY"
    )]
    MissingEnvFileWithExample { path: PathBuf },

    #[error("No .env file found at {path}. Create it with OPENAI_API_KEY=your-api-key")]
    MissingEnvFile { path: PathBuf },

    #[error("Failed to read {path}: {source}")]
    ReadFailed {
        path: PathBuf,
        #[source]
        source: dotenvy::Error,
    },

    #[error("OPENAI_API_KEY is not set. Add OPENAI_API_KEY=your-api-key to your .env file")]
    MissingApiKey,

    #[error("Invalid value for {key}: '{value}'")]
    InvalidValue { key: &'static str, value: String },
}

/// Errors from repository queries.
#[derive(Error, Debug)]
pub enum GitError {
    #[error("Failed to open repository: {0}")]
    OpenRepository(#[source] git2::Error),

    #[error("Repository has no working directory (bare repositories are not supported)")]
    BareRepository,

    #[error("Failed to read repository status: {0}")]
    Status(#[source] git2::Error),

    #[error("Failed to collect diff: {0}")]
    Diff(#[source] git2::Error),

    #[error("Failed to read {path}: {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Ignore(#[from] IgnoreError),
}

/// Errors from loading the ignore-pattern file.
#[derive(Error, Debug)]
pub enum IgnoreError {
    #[error("Failed to read ignore file {path}: {source}")]
    ReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write default ignore file {path}: {source}")]
    WriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Errors from the commit action.
#[derive(Error, Debug)]
pub enum CommitError {
    #[error("No changes to commit")]
    NoChanges,

    #[error("Commit message must not be empty")]
    EmptyMessage,

    #[error("Failed to list changed files: {0}")]
    Status(#[source] GitError),

    #[error("Failed to stage changes: {0}")]
    StagingFailed(#[source] git2::Error),

    #[error("Failed to create commit: {0}")]
    CommitFailed(#[source] git2::Error),

    #[error("Git config error (missing user.name or user.email): {0}")]
    ConfigError(#[source] git2::Error),
}

/// Errors from the chat completions API.
#[derive(Error, Debug)]
pub enum LlmError {
    #[error("Request to the model API failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("The model API rejected the API key (HTTP 401)")]
    Unauthorized,

    #[error("Rate limited or out of quota (HTTP 429): {0}")]
    RateLimited(String),

    #[error("Model API returned HTTP {status}: {body}")]
    Api { status: u16, body: String },

    #[error("Model API returned no message content")]
    EmptyResponse,

    #[error("Model returned invalid JSON: {0}")]
    InvalidJson(String),
}

/// Errors from interpreting a model reply.
#[derive(Error, Debug)]
pub enum AnalyzerError {
    #[error(transparent)]
    Llm(#[from] LlmError),

    #[error("Model reply does not match the expected schema: {0}")]
    Schema(String),
}
