//! Severity and type classification of individual findings.

use std::fmt;

use crate::analysis::Category;

/// Keywords that make a finding severe regardless of its category.
/// Matched case-insensitively.
pub const SEVERE_KEYWORDS: [&str; 12] = [
    "密码泄露",
    "凭证泄露",
    "系统崩溃",
    "严重漏洞",
    "注入攻击",
    "SQL注入",
    "XSS攻击",
    "远程执行",
    "权限提升",
    "拒绝服务",
    "未授权访问",
    "敏感信息泄露",
];

/// Markers of a "nothing found" statement, which is not a finding.
const NO_ISSUE_MARKERS: [&str; 2] = ["未发现", "没有发现"];

/// Markers that turn a non-severe finding into a suggestion.
const SUGGESTION_MARKERS: [&str; 3] = ["建议", "优化", "改进"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Severity {
    Severe,
    Warning,
    Suggestion,
}

impl Severity {
    pub const ALL: [Severity; 3] = [Severity::Severe, Severity::Warning, Severity::Suggestion];

    /// Heading used in summaries and detail views.
    pub fn label(&self) -> &'static str {
        match self {
            Severity::Severe => "严重问题",
            Severity::Warning => "警告",
            Severity::Suggestion => "建议",
        }
    }

    /// Short form used in per-file labels.
    pub fn short_label(&self) -> &'static str {
        match self {
            Severity::Severe => "严重",
            Severity::Warning => "警告",
            Severity::Suggestion => "建议",
        }
    }

    pub(crate) fn index(&self) -> usize {
        match self {
            Severity::Severe => 0,
            Severity::Warning => 1,
            Severity::Suggestion => 2,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IssueType {
    Security,
    Standard,
}

impl IssueType {
    pub const ALL: [IssueType; 2] = [IssueType::Security, IssueType::Standard];

    pub fn label(&self) -> &'static str {
        match self {
            IssueType::Security => "安全",
            IssueType::Standard => "规范",
        }
    }

    pub(crate) fn index(&self) -> usize {
        match self {
            IssueType::Security => 0,
            IssueType::Standard => 1,
        }
    }
}

/// A finding after classification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassifiedFinding {
    pub text: String,
    pub severity: Severity,
    pub issue_type: IssueType,
    pub category: Category,
}

impl fmt::Display for ClassifiedFinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.issue_type.label(), self.text)
    }
}

/// True for statements like "未发现安全问题".
pub fn is_no_issue(text: &str) -> bool {
    NO_ISSUE_MARKERS.iter().any(|marker| text.contains(marker))
}

/// Classify one finding from `category`. Returns `None` for "nothing found"
/// statements.
pub fn classify(category: Category, text: &str) -> Option<ClassifiedFinding> {
    if is_no_issue(text) {
        return None;
    }

    let issue_type = if category == Category::SecurityIssues {
        IssueType::Security
    } else {
        IssueType::Standard
    };

    let lowered = text.to_lowercase();
    let severity = if SEVERE_KEYWORDS
        .iter()
        .any(|keyword| lowered.contains(&keyword.to_lowercase()))
    {
        Severity::Severe
    } else if SUGGESTION_MARKERS.iter().any(|marker| text.contains(marker))
        || category == Category::BestPractices
    {
        Severity::Suggestion
    } else {
        Severity::Warning
    };

    Some(ClassifiedFinding {
        text: text.to_string(),
        severity,
        issue_type,
        category,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn severity_of(category: Category, text: &str) -> Option<Severity> {
        classify(category, text).map(|f| f.severity)
    }

    #[test]
    fn test_no_issue_statements_are_skipped() {
        assert!(classify(Category::SecurityIssues, "未发现安全问题").is_none());
        assert!(classify(Category::Performance, "没有发现性能瓶颈").is_none());
    }

    #[test]
    fn test_severe_keyword_wins_over_category() {
        assert_eq!(
            severity_of(Category::BestPractices, "存在SQL注入风险"),
            Some(Severity::Severe)
        );
        assert_eq!(
            severity_of(Category::Performance, "可能导致拒绝服务"),
            Some(Severity::Severe)
        );
    }

    #[test]
    fn test_severe_keyword_is_case_insensitive() {
        assert_eq!(
            severity_of(Category::SecurityIssues, "可能存在 sql注入"),
            Some(Severity::Severe)
        );
        assert_eq!(
            severity_of(Category::SecurityIssues, "xss攻击面扩大"),
            Some(Severity::Severe)
        );
    }

    #[test]
    fn test_suggestion_markers() {
        assert_eq!(
            severity_of(Category::CodeQuality, "建议拆分函数"),
            Some(Severity::Suggestion)
        );
        assert_eq!(
            severity_of(Category::Performance, "可以优化循环"),
            Some(Severity::Suggestion)
        );
        assert_eq!(
            severity_of(Category::CodeQuality, "命名有待改进"),
            Some(Severity::Suggestion)
        );
    }

    #[test]
    fn test_best_practices_default_to_suggestion() {
        assert_eq!(
            severity_of(Category::BestPractices, "变量命名不一致"),
            Some(Severity::Suggestion)
        );
    }

    #[test]
    fn test_everything_else_is_warning() {
        assert_eq!(
            severity_of(Category::CodeQuality, "函数过长"),
            Some(Severity::Warning)
        );
    }

    #[test]
    fn test_issue_type_follows_category() {
        let finding = classify(Category::SecurityIssues, "硬编码的密钥").unwrap();
        assert_eq!(finding.issue_type, IssueType::Security);
        assert_eq!(finding.to_string(), "[安全] 硬编码的密钥");

        let finding = classify(Category::Performance, "重复查询").unwrap();
        assert_eq!(finding.issue_type, IssueType::Standard);
    }
}
