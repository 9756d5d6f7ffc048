use super::ReviewFeedback;
use crate::error::ContractError;
use regex::Regex;
use serde::Deserialize;

/// Parse provider output into feedback. Does not validate bounds.
pub fn parse_feedback(raw: &str) -> Result<ReviewFeedback, ContractError> {
    // Claude wraps its answer in {"result": "...", ...}
    #[derive(Deserialize)]
    struct ClaudeOutput {
        result: String,
    }

    let text = match serde_json::from_str::<ClaudeOutput>(raw) {
        Ok(wrapped) => wrapped.result,
        Err(_) => raw.to_string(),
    };

    let json_str = extract_json(&text).ok_or(ContractError::NoJson)?;
    let feedback = serde_json::from_str::<ReviewFeedback>(&json_str)?;
    Ok(feedback)
}

/// Extract a JSON object from a string that might contain prose or markdown
/// code blocks
fn extract_json(s: &str) -> Option<String> {
    let trimmed = s.trim();

    // First try: the whole string is valid JSON
    if trimmed.starts_with('{') && serde_json::from_str::<serde_json::Value>(trimmed).is_ok() {
        return Some(trimmed.to_string());
    }

    // Second try: fenced code block
    let re = Regex::new(r"```(?:json)?\s*\n?([\s\S]*?)\n?```").ok()?;
    for cap in re.captures_iter(s) {
        let candidate = cap.get(1)?.as_str().trim();
        if serde_json::from_str::<serde_json::Value>(candidate).is_ok() {
            return Some(candidate.to_string());
        }
    }

    // Third try: the first balanced object that parses. Prose may use braces
    // of its own before the answer starts.
    let mut from = 0;
    while let Some(offset) = s[from..].find('{') {
        let start = from + offset;
        if let Some(end) = balanced_end(&s[start..]) {
            let candidate = &s[start..start + end];
            if serde_json::from_str::<serde_json::Value>(candidate).is_ok() {
                return Some(candidate.to_string());
            }
        }
        from = start + 1;
    }
    None
}

/// Byte length of the brace-balanced object at the start of `s`, skipping
/// braces inside JSON strings
fn balanced_end(s: &str) -> Option<usize> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (i, c) in s.char_indices() {
        if in_string {
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match c {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(i + 1);
                }
            }
            _ => {}
        }
    }
    None
}
