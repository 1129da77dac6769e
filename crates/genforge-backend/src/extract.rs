//! Content extraction from raw backend payloads.
//!
//! Language models usually wrap their answer in fenced blocks surrounded by
//! prose. For code, the first JavaScript-family block wins, then the first
//! untagged block; for prose, the first block of any language. Without a
//! usable block the raw text is used verbatim.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::types::{BackendOutcome, Expected, RawPayload};

static FENCED_BLOCK: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"```([A-Za-z0-9_+.-]*)[ \t]*\r?\n([\s\S]*?)```").expect("valid fenced block regex")
});

const CODE_TAGS: &[&str] = &["javascript", "js", "jsx", "typescript", "ts", "tsx"];

/// Body of the fenced block in `raw` that best matches `expected`, or `raw`.
pub fn extract_fenced_block(raw: &str, expected: Expected) -> &str {
    let blocks: Vec<(&str, &str)> = FENCED_BLOCK
        .captures_iter(raw)
        .filter_map(|c| Some((c.get(1)?.as_str(), c.get(2)?.as_str())))
        .collect();

    let chosen = match expected {
        Expected::Code => blocks
            .iter()
            .find(|(tag, _)| CODE_TAGS.iter().any(|t| tag.eq_ignore_ascii_case(t)))
            .or_else(|| blocks.iter().find(|(tag, _)| tag.is_empty())),
        Expected::Prose => blocks.first(),
    };
    chosen.map(|(_, body)| *body).unwrap_or(raw)
}

/// Apply extraction and the well-formedness check to an adapter payload.
pub fn finish(raw: RawPayload, expected: Expected) -> BackendOutcome {
    match raw {
        RawPayload::Text(text) => {
            let content = extract_fenced_block(&text, expected).trim();
            if content.is_empty() {
                BackendOutcome::UnusableOutput("empty content after extraction".into())
            } else {
                BackendOutcome::Success(content.as_bytes().to_vec())
            }
        }
        RawPayload::Binary(bytes) => {
            if bytes.is_empty() {
                BackendOutcome::UnusableOutput("empty binary payload".into())
            } else {
                BackendOutcome::Success(bytes)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extracts_javascript_block() {
        let raw = "Here is your app:\n```javascript\nexport default function App() {}\n```\nEnjoy!";
        assert_eq!(
            extract_fenced_block(raw, Expected::Code).trim(),
            "export default function App() {}"
        );
    }

    #[test]
    fn test_extracts_untagged_block() {
        let raw = "```\nconst x = 1;\n```";
        assert_eq!(extract_fenced_block(raw, Expected::Code).trim(), "const x = 1;");
    }

    #[test]
    fn test_code_skips_shell_block() {
        let raw = "First install deps:\n```bash\nnpm install axios\n```\n\
                   Then the app:\n```javascript\nexport default function App() {}\n```";
        assert_eq!(
            finish(RawPayload::Text(raw.into()), Expected::Code),
            BackendOutcome::Success(b"export default function App() {}".to_vec())
        );
    }

    #[test]
    fn test_code_prefers_tagged_over_untagged() {
        let raw = "```\nnpm start\n```\n```JSX\n<App />\n```";
        assert_eq!(extract_fenced_block(raw, Expected::Code).trim(), "<App />");
    }

    #[test]
    fn test_code_without_matching_block_uses_raw() {
        let raw = "```bash\nnpm install\n```";
        assert_eq!(extract_fenced_block(raw, Expected::Code), raw);
    }

    #[test]
    fn test_prose_takes_first_block() {
        let raw = "```text\nfirst\n```\n```js\nsecond\n```";
        assert_eq!(extract_fenced_block(raw, Expected::Prose).trim(), "first");
    }

    #[test]
    fn test_raw_when_no_block() {
        let raw = "A misty mountain lake at dawn, volumetric light";
        assert_eq!(extract_fenced_block(raw, Expected::Prose), raw);
    }

    #[test]
    fn test_empty_block_is_unusable() {
        let outcome = finish(RawPayload::Text("```javascript\n   \n```".into()), Expected::Code);
        assert!(matches!(outcome, BackendOutcome::UnusableOutput(_)));

        let outcome = finish(RawPayload::Text("  \n ".into()), Expected::Prose);
        assert!(matches!(outcome, BackendOutcome::UnusableOutput(_)));
    }

    #[test]
    fn test_binary_payload() {
        assert_eq!(
            finish(RawPayload::Binary(vec![0x89, b'P', b'N', b'G']), Expected::Prose),
            BackendOutcome::Success(vec![0x89, b'P', b'N', b'G'])
        );
        assert!(matches!(
            finish(RawPayload::Binary(Vec::new()), Expected::Code),
            BackendOutcome::UnusableOutput(_)
        ));
    }
}
