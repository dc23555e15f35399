//! Conventional commit messages.

pub mod message;

pub use message::{CommitSuggestion, CommitType};
