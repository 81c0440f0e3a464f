//! Embedded prompts
//!
//! These are compiled into the binary from .pmt files at build time.

use tracing::debug;

/// Page-list extraction prompt
pub const EXTRACT: &str = include_str!("../../prompts/extract.pmt");

/// First synthesis step over retrieved context
pub const QA: &str = include_str!("../../prompts/qa.pmt");

/// Follow-up synthesis step refining an existing answer
pub const REFINE: &str = include_str!("../../prompts/refine.pmt");

/// Chat agent system prompt
pub const AGENT: &str = include_str!("../../prompts/agent.pmt");

/// Names of every embedded template
pub const NAMES: [&str; 4] = ["extract", "qa", "refine", "agent"];

/// Get the embedded prompt by name
pub fn get_embedded(name: &str) -> Option<&'static str> {
    debug!(%name, "get_embedded: called");
    match name {
        "extract" => Some(EXTRACT),
        "qa" => Some(QA),
        "refine" => Some(REFINE),
        "agent" => Some(AGENT),
        _ => {
            debug!("get_embedded: no match found");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_name_resolves() {
        for name in NAMES {
            assert!(get_embedded(name).is_some(), "{} missing", name);
        }
    }

    #[test]
    fn test_extract_prompt_mentions_trigger() {
        let prompt = get_embedded("extract").unwrap();
        assert!(prompt.contains("'please index:'"));
        assert!(prompt.contains("single-element list"));
        assert!(prompt.contains("{{query}}"));
    }

    #[test]
    fn test_get_embedded_unknown() {
        assert!(get_embedded("unknown-template").is_none());
    }
}
