use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref FENCE_RE: Regex = Regex::new(r"(?s)```(?:json|JSON)?\s*(.*?)\s*```").unwrap();
}

/// Finds the JSON payload in a model reply: the body of the first fenced
/// code block, or else the outermost `{ ... }` span.
pub fn extract_json(text: &str) -> Option<&str> {
    if let Some(body) = FENCE_RE.captures(text).and_then(|captures| captures.get(1)) {
        return Some(body.as_str());
    }

    let start = text.find('{')?;
    let end = text.rfind('}')?;

    (start < end).then(|| &text[start..=end])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_read_fenced_json() {
        // When
        let value = extract_json("Sure!\n```json\n{\"location\": \"Austin, Texas\"}\n```\nAnything else?");

        // Then
        assert_eq!(value, Some("{\"location\": \"Austin, Texas\"}"));
    }

    #[test]
    fn should_read_untagged_fences() {
        // When
        let value = extract_json("```\n{\"num_people\": 5}\n```");

        // Then
        assert_eq!(value, Some("{\"num_people\": 5}"));
    }

    #[test]
    fn should_read_bare_json() {
        // When
        let value = extract_json("Here you go: {\"sender\": \"alice@example.com\", \"key_topics\": [\"Paris\"]} Thanks");

        // Then
        assert_eq!(
            value,
            Some("{\"sender\": \"alice@example.com\", \"key_topics\": [\"Paris\"]}")
        );
    }

    #[test]
    fn should_ignore_plain_text() {
        // When
        let value = extract_json("I could not find a policy number } in this email {");

        // Then
        assert!(value.is_none());
    }
}
