//! Per-file analysis results and their JSON representation.
//!
//! The model is asked for four fixed categories. Replies are validated into
//! typed structs; anything that does not fit becomes a failed result instead
//! of an error, so one bad reply never aborts a run.

use serde::de::{DeserializeOwned, Error as _};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Value, json};

/// Placeholder stored in every category of a failed analysis.
pub const ANALYSIS_FAILED: &str = "分析失败";

/// File name used for the synthetic result of a run with nothing to analyze.
pub const NO_CHANGES_FILE: &str = "No changes";
pub const NO_CHANGES_MESSAGE: &str = "没有检测到任何文件更改。";

/// Top-level feedback category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    CodeQuality,
    SecurityIssues,
    Performance,
    BestPractices,
}

impl Category {
    pub const ALL: [Category; 4] = [
        Category::CodeQuality,
        Category::SecurityIssues,
        Category::Performance,
        Category::BestPractices,
    ];

    /// JSON key used in model replies.
    pub fn key(&self) -> &'static str {
        match self {
            Category::CodeQuality => "code_quality",
            Category::SecurityIssues => "security_issues",
            Category::Performance => "performance",
            Category::BestPractices => "best_practices",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeQuality {
    #[serde(default, deserialize_with = "string_or_list")]
    pub changes: Vec<String>,
    #[serde(default, deserialize_with = "string_or_list")]
    pub issues: Vec<String>,
    #[serde(default, deserialize_with = "string_or_list")]
    pub improvements: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecurityIssues {
    #[serde(default, deserialize_with = "string_or_list")]
    pub vulnerabilities: Vec<String>,
    #[serde(default, deserialize_with = "string_or_list")]
    pub warnings: Vec<String>,
    #[serde(default, deserialize_with = "string_or_list")]
    pub recommendations: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Performance {
    #[serde(default, deserialize_with = "string_or_list")]
    pub bottlenecks: Vec<String>,
    #[serde(default, deserialize_with = "string_or_list")]
    pub optimizations: Vec<String>,
    #[serde(default, deserialize_with = "string_or_list")]
    pub suggestions: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BestPractices {
    #[serde(default, deserialize_with = "string_or_list")]
    pub violations: Vec<String>,
    #[serde(default, deserialize_with = "string_or_list")]
    pub recommendations: Vec<String>,
    #[serde(default, deserialize_with = "string_or_list")]
    pub examples: Vec<String>,
}

/// Structured feedback for one file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileFeedback {
    #[serde(deserialize_with = "object_only")]
    pub code_quality: CodeQuality,
    #[serde(deserialize_with = "object_only")]
    pub security_issues: SecurityIssues,
    #[serde(deserialize_with = "object_only")]
    pub performance: Performance,
    #[serde(deserialize_with = "object_only")]
    pub best_practices: BestPractices,
    /// Some models hoist the change list to the top level.
    #[serde(
        default,
        skip_serializing_if = "Vec::is_empty",
        deserialize_with = "string_or_list"
    )]
    pub changes: Vec<String>,
}

impl FileFeedback {
    /// Every finding as `(category, text)`, in category then field order.
    pub fn findings(&self) -> Vec<(Category, &str)> {
        let groups: [(Category, [&Vec<String>; 3]); 4] = [
            (
                Category::CodeQuality,
                [
                    &self.code_quality.changes,
                    &self.code_quality.issues,
                    &self.code_quality.improvements,
                ],
            ),
            (
                Category::SecurityIssues,
                [
                    &self.security_issues.vulnerabilities,
                    &self.security_issues.warnings,
                    &self.security_issues.recommendations,
                ],
            ),
            (
                Category::Performance,
                [
                    &self.performance.bottlenecks,
                    &self.performance.optimizations,
                    &self.performance.suggestions,
                ],
            ),
            (
                Category::BestPractices,
                [
                    &self.best_practices.violations,
                    &self.best_practices.recommendations,
                    &self.best_practices.examples,
                ],
            ),
        ];

        groups
            .into_iter()
            .flat_map(|(category, lists)| {
                lists
                    .into_iter()
                    .flat_map(move |list| list.iter().map(move |text| (category, text.as_str())))
            })
            .collect()
    }

    /// Descriptions of what changed: top-level `changes` first, then
    /// `code_quality.changes`.
    pub fn change_descriptions(&self) -> impl Iterator<Item = &str> {
        self.changes
            .iter()
            .chain(self.code_quality.changes.iter())
            .map(String::as_str)
    }
}

/// Outcome of analyzing one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnalysisResult {
    Completed(FileFeedback),
    Failed { error: String },
    NoChanges { message: String },
}

impl AnalysisResult {
    pub fn failed(error: impl Into<String>) -> Self {
        AnalysisResult::Failed {
            error: error.into(),
        }
    }

    pub fn no_changes() -> Self {
        AnalysisResult::NoChanges {
            message: NO_CHANGES_MESSAGE.to_string(),
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, AnalysisResult::Failed { .. })
    }

    /// JSON form. A failed result carries the error at the top level and the
    /// [`ANALYSIS_FAILED`] placeholder in every category.
    pub fn to_json(&self) -> Value {
        match self {
            AnalysisResult::Completed(feedback) => {
                serde_json::to_value(feedback).unwrap_or_else(|e| json!({ "error": e.to_string() }))
            }
            AnalysisResult::Failed { error } => {
                let mut map = serde_json::Map::new();
                map.insert("error".to_string(), Value::String(error.clone()));
                for category in Category::ALL {
                    map.insert(category.key().to_string(), json!({ "error": ANALYSIS_FAILED }));
                }
                Value::Object(map)
            }
            AnalysisResult::NoChanges { message } => json!({ "message": message }),
        }
    }

    /// Interpret a JSON value (or a JSON-encoded string) as a result.
    ///
    /// Never fails: payloads that are neither a known result shape nor valid
    /// feedback become [`AnalysisResult::Failed`].
    pub fn from_json(value: &Value) -> Self {
        match value {
            Value::String(encoded) => match serde_json::from_str::<Value>(encoded) {
                Ok(decoded @ Value::Object(_)) => Self::from_json(&decoded),
                Ok(_) => Self::failed("invalid analysis payload: expected a JSON object"),
                Err(e) => Self::failed(format!("invalid analysis payload: {e}")),
            },
            Value::Object(map) => {
                if let Some(error) = map.get("error") {
                    let error = error
                        .as_str()
                        .map(str::to_string)
                        .unwrap_or_else(|| error.to_string());
                    return Self::failed(error);
                }

                let has_category = Category::ALL.iter().any(|c| map.contains_key(c.key()));
                if !has_category && let Some(message) = map.get("message").and_then(Value::as_str) {
                    return AnalysisResult::NoChanges {
                        message: message.to_string(),
                    };
                }

                match serde_json::from_value::<FileFeedback>(value.clone()) {
                    Ok(feedback) => AnalysisResult::Completed(feedback),
                    Err(e) => Self::failed(format!("invalid analysis payload: {e}")),
                }
            }
            _ => Self::failed("invalid analysis payload: expected a JSON object"),
        }
    }
}

/// Categories must be JSON objects. A derived struct visitor would also
/// take a sequence and fill fields by position.
fn object_only<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let map = serde_json::Map::<String, Value>::deserialize(deserializer)?;
    T::deserialize(Value::Object(map)).map_err(D::Error::custom)
}

/// Accept a list of strings, a single string, or null. Non-string list items
/// are dropped.
fn string_or_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(String),
        Many(Vec<Value>),
        Nothing(()),
    }

    Ok(match OneOrMany::deserialize(deserializer)? {
        OneOrMany::One(s) => vec![s],
        OneOrMany::Many(items) => items
            .into_iter()
            .filter_map(|v| match v {
                Value::String(s) => Some(s),
                _ => None,
            })
            .collect(),
        OneOrMany::Nothing(()) => Vec::new(),
    })
}
