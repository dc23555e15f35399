//! Conventional commit messages.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Commit types the model is allowed to pick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CommitType {
    Feat,
    Fix,
    Docs,
    Style,
    Refactor,
    Test,
    Chore,
}

impl CommitType {
    pub const ALL: [CommitType; 7] = [
        CommitType::Feat,
        CommitType::Fix,
        CommitType::Docs,
        CommitType::Style,
        CommitType::Refactor,
        CommitType::Test,
        CommitType::Chore,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CommitType::Feat => "feat",
            CommitType::Fix => "fix",
            CommitType::Docs => "docs",
            CommitType::Style => "style",
            CommitType::Refactor => "refactor",
            CommitType::Test => "test",
            CommitType::Chore => "chore",
        }
    }
}

impl fmt::Display for CommitType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A commit message suggestion as returned by the model.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CommitSuggestion {
    #[serde(rename = "type")]
    pub commit_type: CommitType,
    #[serde(default)]
    pub scope: Option<String>,
    pub description: String,
    #[serde(default)]
    pub body: Option<String>,
}

impl CommitSuggestion {
    /// Format as `type(scope): description`, followed by a blank line and the
    /// body when there is one. An empty scope drops the parentheses.
    pub fn format(&self) -> String {
        let mut message = self.commit_type.to_string();

        if let Some(scope) = self.scope.as_deref().map(str::trim)
            && !scope.is_empty()
        {
            message.push_str(&format!("({scope})"));
        }

        message.push_str(": ");
        message.push_str(self.description.trim());

        if let Some(body) = self.body.as_deref().map(str::trim)
            && !body.is_empty()
        {
            message.push_str("\n\n");
            message.push_str(body);
        }

        message
    }
}
