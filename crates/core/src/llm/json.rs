use anyhow::Context;
use serde_json::Value;

pub fn extract_json(text: &str) -> Option<String> {
    let trimmed = text.trim();
    if trimmed.starts_with("```") {
        // Remove Markdown fences (```json ... ``` or ``` ... ```).
        let mut inner = trimmed;
        if let Some(after_first) = inner.splitn(2, '\n').nth(1) {
            inner = after_first;
        }
        if let Some(end) = inner.rfind("```") {
            inner = &inner[..end];
        }
        return Some(inner.trim().to_string());
    }

    // Best-effort extraction: first '{' to last '}'.
    let start = trimmed.find('{')?;
    let end = trimmed.rfind('}')?;
    if end <= start {
        return None;
    }
    Some(trimmed[start..=end].trim().to_string())
}

/// Parses model text into a JSON object, tolerating fences and surrounding prose.
pub fn parse_object(text: &str) -> anyhow::Result<Value> {
    let json_str = extract_json(text).unwrap_or_else(|| text.trim().to_string());
    let value = serde_json::from_str::<Value>(&json_str)
        .with_context(|| format!("LLM output is not valid JSON: {json_str}"))?;
    anyhow::ensure!(value.is_object(), "LLM output is JSON but not an object");
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extract_json_handles_fenced_blocks() {
        let body = "{\"a\":1}";
        let fenced = format!("```json\n{body}\n```\n");
        assert_eq!(extract_json(&fenced), Some(body.to_string()));
    }

    #[test]
    fn extract_json_falls_back_to_braces() {
        let s = "prefix {\"a\":1} suffix";
        assert_eq!(extract_json(s), Some("{\"a\":1}".to_string()));
    }

    #[test]
    fn parse_object_accepts_prose_wrapped_json() {
        let v = parse_object("Here you go: {\"overall_sentiment\": 0.2}").unwrap();
        assert_eq!(v["overall_sentiment"], 0.2);
    }

    #[test]
    fn parse_object_rejects_garbage_and_arrays() {
        assert!(parse_object("I cannot help with that.").is_err());
        assert!(parse_object("[1, 2, 3]").is_err());
        assert!(parse_object("{not json}").is_err());
    }
}
