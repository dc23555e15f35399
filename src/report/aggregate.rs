//! Aggregation of per-file results into a run summary and commit body.

use std::collections::HashSet;
use std::fmt::Write as _;

use serde_json::Value;
use tracing::warn;

use crate::analysis::AnalysisResult;
use crate::report::classify::{ClassifiedFinding, IssueType, Severity, classify};

/// Change excerpts shown per file before collapsing the rest.
const MAX_CHANGES_PER_FILE: usize = 3;

/// Issue counts by severity and type.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IssueStats {
    counts: [[usize; 2]; 3],
}

impl IssueStats {
    pub fn record(&mut self, severity: Severity, issue_type: IssueType) {
        self.counts[severity.index()][issue_type.index()] += 1;
    }

    pub fn get(&self, severity: Severity, issue_type: IssueType) -> usize {
        self.counts[severity.index()][issue_type.index()]
    }

    pub fn severity_total(&self, severity: Severity) -> usize {
        self.counts[severity.index()].iter().sum()
    }

    pub fn type_total(&self, issue_type: IssueType) -> usize {
        self.counts.iter().map(|row| row[issue_type.index()]).sum()
    }

    pub fn total(&self) -> usize {
        self.counts.iter().flatten().sum()
    }

    pub fn merge(&mut self, other: &IssueStats) {
        for (row, other_row) in self.counts.iter_mut().zip(other.counts.iter()) {
            for (cell, other_cell) in row.iter_mut().zip(other_row.iter()) {
                *cell += other_cell;
            }
        }
    }
}

/// Classified findings and change excerpts for one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileReport {
    pub path: String,
    pub findings: Vec<ClassifiedFinding>,
    pub changes: Vec<String>,
    /// Set when the analysis of this file failed.
    pub error: Option<String>,
}

impl FileReport {
    pub fn from_result(path: &str, result: &AnalysisResult) -> Self {
        let mut report = FileReport {
            path: path.to_string(),
            findings: Vec::new(),
            changes: Vec::new(),
            error: None,
        };

        match result {
            AnalysisResult::Completed(feedback) => {
                report.findings = feedback
                    .findings()
                    .into_iter()
                    .filter_map(|(category, text)| classify(category, text))
                    .collect();
                report.changes = feedback.change_descriptions().map(str::to_string).collect();
            }
            // placeholders are not findings; the file is flagged instead
            AnalysisResult::Failed { error } => report.error = Some(error.clone()),
            AnalysisResult::NoChanges { .. } => {}
        }

        report
    }

    pub fn stats(&self) -> IssueStats {
        let mut stats = IssueStats::default();
        for finding in &self.findings {
            stats.record(finding.severity, finding.issue_type);
        }
        stats
    }

    /// `path  (严重:n, 警告:n, 建议:n)` with zero counts left out.
    pub fn label(&self) -> String {
        if self.error.is_some() {
            return format!("{}  (分析失败)", self.path);
        }

        let stats = self.stats();
        let parts: Vec<String> = Severity::ALL
            .iter()
            .filter(|s| stats.severity_total(**s) > 0)
            .map(|s| format!("{}:{}", s.short_label(), stats.severity_total(*s)))
            .collect();

        if parts.is_empty() {
            self.path.clone()
        } else {
            format!("{}  ({})", self.path, parts.join(", "))
        }
    }

    /// Findings grouped by severity, for a detail view.
    pub fn render_detail(&self) -> String {
        let mut out = format!("【文件路径】\n{}\n\n", self.path);

        if let Some(error) = &self.error {
            let _ = write!(out, "【分析失败】\n{error}\n\n");
        }

        for severity in Severity::ALL {
            let items: Vec<&ClassifiedFinding> = self
                .findings
                .iter()
                .filter(|f| f.severity == severity)
                .collect();
            if items.is_empty() {
                continue;
            }
            let _ = writeln!(out, "【{}】", severity.label());
            for item in items {
                let _ = writeln!(out, "• {item}");
            }
            out.push('\n');
        }

        out.trim_end().to_string()
    }
}

/// Raw analysis payload: a JSON value or a JSON-encoded string.
#[derive(Debug, Clone)]
pub enum Suggestions {
    Json(Value),
    Encoded(String),
}

impl Suggestions {
    pub fn decode(&self) -> AnalysisResult {
        match self {
            Suggestions::Json(value) => AnalysisResult::from_json(value),
            Suggestions::Encoded(text) => AnalysisResult::from_json(&Value::String(text.clone())),
        }
    }
}

impl From<Value> for Suggestions {
    fn from(value: Value) -> Self {
        Suggestions::Json(value)
    }
}

impl From<String> for Suggestions {
    fn from(text: String) -> Self {
        Suggestions::Encoded(text)
    }
}

/// Collects file reports in input order.
#[derive(Debug, Default)]
pub struct Aggregator {
    files: Vec<FileReport>,
}

impl Aggregator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_result(&mut self, path: &str, result: &AnalysisResult) {
        self.files.push(FileReport::from_result(path, result));
    }

    pub fn add_suggestions(&mut self, path: &str, suggestions: impl Into<Suggestions>) {
        let result = suggestions.into().decode();
        if let AnalysisResult::Failed { error } = &result {
            warn!("Analysis payload for {} is unusable: {}", path, error);
        }
        self.add_result(path, &result);
    }

    pub fn finish(self) -> Summary {
        Summary { files: self.files }
    }
}

/// Summarize `(path, result)` pairs.
pub fn aggregate<'a, I>(results: I) -> Summary
where
    I: IntoIterator<Item = (&'a str, &'a AnalysisResult)>,
{
    let mut aggregator = Aggregator::new();
    for (path, result) in results {
        aggregator.add_result(path, result);
    }
    aggregator.finish()
}

/// Aggregated view of a run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Summary {
    pub files: Vec<FileReport>,
}

impl Summary {
    /// Totals across all files; always the sum of the per-file counts.
    pub fn stats(&self) -> IssueStats {
        let mut stats = IssueStats::default();
        for file in &self.files {
            stats.merge(&file.stats());
        }
        stats
    }

    /// Number of distinct `(file, change)` pairs.
    pub fn change_count(&self) -> usize {
        self.files
            .iter()
            .flat_map(|f| f.changes.iter().map(move |c| (f.path.as_str(), c.as_str())))
            .collect::<HashSet<_>>()
            .len()
    }

    /// Change excerpts grouped by file, files in first-seen order.
    fn changes_by_file(&self) -> Vec<(&str, Vec<&str>)> {
        let mut grouped: Vec<(&str, Vec<&str>)> = Vec::new();
        for file in self.files.iter().filter(|f| !f.changes.is_empty()) {
            let changes = file.changes.iter().map(String::as_str);
            match grouped.iter_mut().find(|(path, _)| *path == file.path) {
                Some((_, existing)) => existing.extend(changes),
                None => grouped.push((file.path.as_str(), changes.collect())),
            }
        }
        grouped
    }

    fn write_changes(out: &mut String, grouped: &[(&str, Vec<&str>)], separator: &str) {
        for (path, changes) in grouped {
            let _ = writeln!(out, "• {path}{separator}");
            for change in changes.iter().take(MAX_CHANGES_PER_FILE) {
                let _ = writeln!(out, "    - {change}");
            }
            if changes.len() > MAX_CHANGES_PER_FILE {
                let _ = writeln!(out, "    - ... 等{}处变更", changes.len());
            }
        }
    }

    /// The narrative shown after a run.
    pub fn render(&self) -> String {
        let stats = self.stats();
        let grouped = self.changes_by_file();
        let mut out = String::from("【变更总结】\n\n");

        out.push_str("变更范围：\n");
        let _ = writeln!(out, "• 涉及文件数：{}个", self.files.len());
        if !grouped.is_empty() {
            let _ = writeln!(out, "• 变更操作数：{}处", self.change_count());
        }
        out.push('\n');

        if !grouped.is_empty() {
            out.push_str("主要变更：\n");
            Self::write_changes(&mut out, &grouped, "：");
            out.push('\n');
        }

        out.push_str("问题统计：\n");
        let security = stats.type_total(IssueType::Security);
        let standard = stats.type_total(IssueType::Standard);
        if stats.total() > 0 {
            if security > 0 {
                let _ = writeln!(out, "• 安全相关：发现{security}个问题");
            }
            if standard > 0 {
                let _ = writeln!(out, "• 规范相关：发现{standard}个问题");
            }
            for severity in Severity::ALL {
                let total = stats.severity_total(severity);
                if total == 0 {
                    continue;
                }
                let _ = writeln!(out, "• {}：{}个", severity.label(), total);
                for issue_type in IssueType::ALL {
                    let count = stats.get(severity, issue_type);
                    if count > 0 {
                        let _ = writeln!(out, "    - {}：{}个", issue_type.label(), count);
                    }
                }
            }
        } else {
            out.push_str("• 未发现潜在问题\n");
        }

        out.push_str("\n影响分析：\n");
        if stats.total() > 0 {
            if security > 0 {
                out.push_str("• 存在安全相关问题，建议及时处理\n");
            }
            if standard > 0 {
                out.push_str("• 存在代码规范问题，建议遵循最佳实践\n");
            }
            if stats.get(Severity::Severe, IssueType::Security) > 0 {
                out.push_str("• ⚠️ 发现严重安全问题，强烈建议修复后再提交\n");
            } else if stats.get(Severity::Severe, IssueType::Standard) > 0 {
                out.push_str("• ⚠️ 发现严重规范问题，建议仔细审查\n");
            }
        } else {
            out.push_str("• 代码变更符合规范，未发现潜在风险\n");
        }

        out
    }

    /// Commit body built from the aggregate: change excerpts then severity
    /// totals. Empty when there is nothing to say.
    pub fn commit_body(&self) -> String {
        let stats = self.stats();
        let grouped = self.changes_by_file();
        let mut out = String::new();

        if !grouped.is_empty() {
            Self::write_changes(&mut out, &grouped, ":");
            out.push('\n');
        }

        if stats.total() > 0 {
            out.push_str("问题统计：\n");
            for severity in Severity::ALL {
                let total = stats.severity_total(severity);
                if total > 0 {
                    let _ = writeln!(out, "• {}: {}个", severity.label(), total);
                }
            }
        }

        out.trim().to_string()
    }
}
