//! JSON object extraction from model replies.
//!
//! JSON mode usually yields a bare object, but OpenAI-compatible servers
//! differ: some wrap the object in a markdown fence or add a sentence around
//! it. Anything that is not ultimately a JSON object is an error.

use serde_json::{Map, Value};

use crate::error::LlmError;

/// Parse a model reply into a JSON object.
///
/// Tries, in order: the whole reply, a ` ```json ` fenced block, a bare
/// ` ``` ` fenced block, then the first balanced `{...}` in the text.
pub fn parse_json_object(reply: &str) -> Result<Map<String, Value>, LlmError> {
    let trimmed = reply.trim();

    if let Ok(value) = serde_json::from_str::<Value>(trimmed) {
        return into_object(value);
    }

    if let Some(inner) = fenced_block(trimmed, "```json").or_else(|| fenced_block(trimmed, "```"))
        && let Ok(value) = serde_json::from_str::<Value>(inner)
    {
        return into_object(value);
    }

    for (start, _) in trimmed.match_indices('{') {
        if let Some(candidate) = balanced_braces(&trimmed[start..])
            && let Ok(value) = serde_json::from_str::<Value>(candidate)
        {
            return into_object(value);
        }
    }

    let preview: String = trimmed.chars().take(200).collect();
    Err(LlmError::InvalidJson(format!("no JSON object found in reply: {preview}")))
}

fn into_object(value: Value) -> Result<Map<String, Value>, LlmError> {
    match value {
        Value::Object(map) => Ok(map),
        other => Err(LlmError::InvalidJson(format!(
            "expected a JSON object, got {}",
            kind_of(&other)
        ))),
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

fn fenced_block<'a>(text: &'a str, opener: &str) -> Option<&'a str> {
    let start = text.find(opener)? + opener.len();
    let end = text[start..].find("```")?;
    Some(text[start..start + end].trim())
}

/// Prefix of `text` (which starts at a `{`) up to its matching `}`.
///
/// Braces inside JSON string literals, including escaped quotes, are not
/// counted.
fn balanced_braces(text: &str) -> Option<&str> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escape_next = false;

    for (idx, ch) in text.char_indices() {
        if escape_next {
            escape_next = false;
            continue;
        }

        match ch {
            '\\' if in_string => escape_next = true,
            '"' => in_string = !in_string,
            '{' if !in_string => depth += 1,
            '}' if !in_string => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(&text[..=idx]);
                }
            }
            _ => {}
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_bare_object() {
        let map = parse_json_object(r#"{"type": "fix", "description": "修复"}"#).unwrap();
        assert_eq!(map["type"], "fix");
    }

    #[test]
    fn test_parse_fenced_json_block() {
        let reply = "结果如下:\n```json\n{\"type\": \"feat\"}\n```";
        let map = parse_json_object(reply).unwrap();
        assert_eq!(map["type"], "feat");
    }

    #[test]
    fn test_parse_bare_fence() {
        let reply = "```\n{\"type\": \"docs\"}\n```";
        let map = parse_json_object(reply).unwrap();
        assert_eq!(map["type"], "docs");
    }

    #[test]
    fn test_parse_object_embedded_in_prose() {
        let reply = r#"Here you go: {"a": {"b": "use { and } carefully"}} hope it helps"#;
        let map = parse_json_object(reply).unwrap();
        assert_eq!(map["a"]["b"], "use { and } carefully");
    }

    #[test]
    fn test_parse_handles_escaped_quotes() {
        let reply = r#"note {"msg": "say \"hi\" {"} end"#;
        let map = parse_json_object(reply).unwrap();
        assert_eq!(map["msg"], "say \"hi\" {");
    }

    #[test]
    fn test_array_is_rejected() {
        let err = parse_json_object("[1, 2, 3]").unwrap_err();
        assert!(matches!(err, LlmError::InvalidJson(ref m) if m.contains("an array")));
    }

    #[test]
    fn test_plain_text_is_rejected() {
        assert!(matches!(
            parse_json_object("sorry, I cannot help with that"),
            Err(LlmError::InvalidJson(_))
        ));
    }

    #[test]
    fn test_unbalanced_braces_are_rejected() {
        assert!(parse_json_object("}} {{").is_err());
    }

    #[test]
    fn test_balanced_braces_stops_at_match() {
        assert_eq!(balanced_braces(r#"{"a": {"b": 1}} extra"#), Some(r#"{"a": {"b": 1}}"#));
    }
}
