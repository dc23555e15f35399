//! Prompt construction for per-file review and commit message generation.

use crate::git::DiffRecord;

/// Maximum length (bytes) of diff text sent in a single prompt.
pub const MAX_DIFF_LENGTH: usize = 30_000;

const TRUNCATION_NOTE: &str = "\n\n[差异内容过长，已截断，请基于可见部分分析]";

/// System prompt for reviewing one file's diff.
pub const ANALYSIS_SYSTEM_PROMPT: &str = r#"你是一名专业的代码审查助手。请分析给出的代码变更，并以 JSON 对象返回结构化的审查意见。

## 输出格式
只返回一个 JSON 对象，结构如下：
{
  "code_quality": {
    "changes": ["代码变更的具体内容描述"],
    "issues": ["发现的代码质量问题"],
    "improvements": ["代码改进建议"]
  },
  "security_issues": {
    "vulnerabilities": ["安全漏洞描述"],
    "warnings": ["安全警告信息"],
    "recommendations": ["安全改进建议"]
  },
  "performance": {
    "bottlenecks": ["性能瓶颈描述"],
    "optimizations": ["优化建议"],
    "suggestions": ["其他性能改进建议"]
  },
  "best_practices": {
    "violations": ["违反最佳实践的地方"],
    "recommendations": ["最佳实践建议"],
    "examples": ["改进示例"]
  }
}

## 规则
1. 必须是合法的 JSON
2. 所有内容使用中文
3. 每个数组至少包含一项
4. 某个方面没有问题时给出正面评价，例如"代码结构清晰"、"未发现安全问题"
5. 建议要具体、可操作
6. 描述清晰易懂"#;

/// System prompt for turning the combined diff into a conventional commit.
pub const COMMIT_SYSTEM_PROMPT: &str = r#"你是一名 Git 提交信息生成助手。请分析代码变更，用中文生成简洁明了的约定式提交信息。

## 输出格式
只返回一个 JSON 对象：
{
  "type": "feat|fix|docs|style|refactor|test|chore",
  "scope": "变更影响的范围",
  "description": "简短的中文变更描述",
  "body": "详细的中文变更说明"
}

## type 取值
- feat: 新功能
- fix: 修复 bug
- docs: 文档变更
- style: 代码格式调整
- refactor: 代码重构
- test: 测试相关
- chore: 其他修改

## 注意
1. description 必须用中文简洁描述变更内容
2. body 可以详细描述变更原因和影响
3. scope 可选，只有影响范围明确时才填写"#;

/// User message for reviewing `diff` of `file_path`.
pub fn build_analysis_prompt(file_path: &str, diff: &str) -> String {
    format!("文件: {file_path}\n差异内容:\n{}", truncate_diff(diff, MAX_DIFF_LENGTH))
}

/// User message for commit generation: every record rendered as
/// `File: <path>\n<diff>`, separated by blank lines.
pub fn build_commit_prompt(diffs: &[DiffRecord]) -> String {
    let combined = diffs
        .iter()
        .map(DiffRecord::render)
        .collect::<Vec<_>>()
        .join("\n\n");
    format!("代码变更内容:\n{}", truncate_diff(&combined, MAX_DIFF_LENGTH))
}

/// Cut `text` to at most `max_len` bytes on a char boundary, appending a
/// note when anything was dropped.
pub fn truncate_diff(text: &str, max_len: usize) -> String {
    if text.len() <= max_len {
        return text.to_string();
    }

    let mut end = max_len;
    while end > 0 && !text.is_char_boundary(end) {
        end -= 1;
    }

    let mut result = text[..end].to_string();
    result.push_str(TRUNCATION_NOTE);
    result
}
