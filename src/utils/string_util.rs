pub trait StripCodeBlock {
    fn strip_code_block(&self) -> &str;
}

impl StripCodeBlock for str {
    fn strip_code_block(&self) -> &str {
        let trimmed = self.trim();
        if trimmed.starts_with("```")
            && let Some(pos) = trimmed.find('\n')
        {
            let inner = &trimmed[pos + 1..];
            if let Some(inner) = inner.trim_end().strip_suffix("```") {
                return inner.trim();
            }
        }
        trimmed
    }
}

/// Pulls the JSON object out of a model reply: fenced block first, then the
/// outermost `{...}` span. Returns `None` when there is no object at all.
pub fn extract_json_object(text: &str) -> Option<&str> {
    let body = text.strip_code_block();
    if body.starts_with('{') && body.ends_with('}') {
        return Some(body);
    }
    let start = body.find('{')?;
    let end = body.rfind('}')?;
    if end <= start {
        return None;
    }
    Some(&body[start..=end])
}

/// Char-boundary-safe preview for log lines.
pub fn truncate_for_log(input: &str, max_chars: usize) -> String {
    let char_count = input.chars().count();
    if char_count <= max_chars {
        return input.to_string();
    }
    let mut preview: String = input.chars().take(max_chars).collect();
    preview.push_str(&format!("... [truncated, total_chars={}]", char_count));
    preview
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_fenced_json() {
        let raw = "```json\n{\"a\": 1}\n```";
        assert_eq!(raw.strip_code_block(), "{\"a\": 1}");
    }

    #[test]
    fn leaves_plain_text_alone() {
        assert_eq!("  {\"a\": 1}  ".strip_code_block(), "{\"a\": 1}");
    }

    #[test]
    fn extracts_object_from_chatter() {
        let raw = "Sure! Here is the plan:\n{\"steps\": []}\nLet me know.";
        assert_eq!(extract_json_object(raw), Some("{\"steps\": []}"));
    }

    #[test]
    fn no_object_yields_none() {
        assert_eq!(extract_json_object("no json here"), None);
        assert_eq!(extract_json_object("} backwards {"), None);
    }

    #[test]
    fn truncation_marks_length() {
        let preview = truncate_for_log("abcdef", 3);
        assert_eq!(preview, "abc... [truncated, total_chars=6]");
        assert_eq!(truncate_for_log("abc", 3), "abc");
    }
}
