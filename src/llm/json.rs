use serde_json::Value;

use crate::errors::GeoError;

/// Recover a JSON value from model output that may be fenced, prefixed with
/// prose or truncated mid-array.
pub fn extract_json(text: &str) -> Result<Value, GeoError> {
    if let Ok(v) = serde_json::from_str::<Value>(text) {
        return Ok(v);
    }

    let trimmed = text.trim();
    let stripped = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .map(|s| s.strip_suffix("```").unwrap_or(s))
        .unwrap_or(trimmed)
        .trim();
    if let Ok(v) = serde_json::from_str::<Value>(stripped) {
        return Ok(v);
    }

    let (Some(start), Some(end)) = (stripped.find('{'), stripped.rfind('}')) else {
        return Err(GeoError::OutputValidation("no JSON object in model response".into()));
    };
    if start >= end {
        return Err(GeoError::OutputValidation("no JSON object in model response".into()));
    }

    let candidate = &stripped[start..=end];
    match serde_json::from_str::<Value>(candidate) {
        Ok(v) => Ok(v),
        Err(parse_err) => repair_truncated_json(&stripped[start..])
            .and_then(|repaired| serde_json::from_str::<Value>(&repaired).ok())
            .ok_or_else(|| GeoError::OutputValidation(format!("JSON parse error: {parse_err}"))),
    }
}

/// Close brackets left open when a response is cut off.
///
/// Everything after the last complete `}` is dropped, then the remaining
/// open arrays and objects are closed innermost first.
fn repair_truncated_json(text: &str) -> Option<String> {
    let last_brace = text.rfind('}')?;
    let mut s = text[..=last_brace].to_string();

    let mut stack = Vec::new();
    let mut in_string = false;
    let mut escaped = false;
    for ch in s.chars() {
        if in_string {
            match ch {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match ch {
            '"' => in_string = true,
            '{' => stack.push('}'),
            '[' => stack.push(']'),
            '}' | ']' => {
                stack.pop();
            }
            _ => {}
        }
    }

    if stack.is_empty() || in_string {
        return None;
    }
    while let Some(close) = stack.pop() {
        s.push(close);
    }
    Some(s)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_plain_json() {
        assert_eq!(extract_json(r#"{"a": 1}"#).unwrap(), json!({"a": 1}));
    }

    #[test]
    fn test_fenced_json() {
        let text = "```json\n{\"claims\": [\"x\"]}\n```";
        assert_eq!(extract_json(text).unwrap(), json!({"claims": ["x"]}));
    }

    #[test]
    fn test_prose_prefix() {
        let text = "Here is the analysis: {\"positive\": 60} hope it helps";
        assert_eq!(extract_json(text).unwrap(), json!({"positive": 60}));
    }

    #[test]
    fn test_truncated_array_repaired() {
        let text = r#"{"examples": [{"claim": "a"}, {"claim": "b"}, {"cla"#;
        assert_eq!(
            extract_json(text).unwrap(),
            json!({"examples": [{"claim": "a"}, {"claim": "b"}]})
        );
    }

    #[test]
    fn test_no_json() {
        assert!(matches!(
            extract_json("sorry, I cannot help"),
            Err(GeoError::OutputValidation(_))
        ));
    }
}
