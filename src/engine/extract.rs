//! Code extraction from model responses.
//!
//! Models wrap generated code in markdown fences, with prose around
//! them, sometimes with nested fences in explanatory text. Extraction
//! is deterministic: a fence tagged with the target language wins, then
//! the first untagged fence, then the first fence of any tag, and only
//! then the raw trimmed response.

use crate::types::Language;
use crate::{Result, TestforgeError};

/// Pull the test code out of a model response.
///
/// Fails with [`ExtractionFailed`](TestforgeError::ExtractionFailed)
/// when nothing non-empty can be recovered.
pub(crate) fn extract_code(content: &str, language: Language) -> Result<String> {
    let blocks = fenced_blocks(content);

    let chosen = blocks
        .iter()
        .find(|b| tag_matches(&b.tag, language))
        .or_else(|| blocks.iter().find(|b| b.tag.is_empty()))
        .or_else(|| blocks.first());

    let code = match chosen {
        Some(block) => block.body.trim(),
        None => content.trim(),
    };

    if code.is_empty() {
        return Err(TestforgeError::ExtractionFailed);
    }
    Ok(code.to_string())
}

struct Block {
    tag: String,
    body: String,
}

/// Scan for triple-backtick fences, line by line. An unclosed trailing
/// fence yields a block running to the end of the response.
fn fenced_blocks(content: &str) -> Vec<Block> {
    let mut blocks = Vec::new();
    let mut current: Option<Block> = None;

    for line in content.lines() {
        let trimmed = line.trim_start();
        if let Some(rest) = trimmed.strip_prefix("```") {
            match current.take() {
                Some(block) => blocks.push(block),
                None => {
                    current = Some(Block {
                        tag: rest.trim().to_ascii_lowercase(),
                        body: String::new(),
                    });
                }
            }
        } else if let Some(block) = current.as_mut() {
            block.body.push_str(line);
            block.body.push('\n');
        }
    }
    if let Some(block) = current {
        blocks.push(block);
    }
    blocks
}

fn tag_matches(tag: &str, language: Language) -> bool {
    !tag.is_empty() && tag.parse::<Language>().is_ok_and(|t| t == language)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tagged_fence_preferred() {
        let response = "Here are your tests:\n\n```go\nfunc TestAdd(t *testing.T) {}\n```\n\nEnjoy!";
        let code = extract_code(response, Language::Go).unwrap();
        assert_eq!(code, "func TestAdd(t *testing.T) {}");
    }

    #[test]
    fn language_aliases_match() {
        let response = "```golang\nfunc TestAdd(t *testing.T) {}\n```";
        let code = extract_code(response, Language::Go).unwrap();
        assert!(code.starts_with("func TestAdd"));
    }

    #[test]
    fn untagged_fence_is_second_choice() {
        let response = "```python\nprint(1)\n```\n\n```\nfunc TestAdd(t *testing.T) {}\n```";
        let code = extract_code(response, Language::Go).unwrap();
        assert_eq!(code, "func TestAdd(t *testing.T) {}");
    }

    #[test]
    fn mismatched_tag_still_used_when_nothing_better() {
        let response = "```python\nprint(1)\n```";
        let code = extract_code(response, Language::Go).unwrap();
        assert_eq!(code, "print(1)");
    }

    #[test]
    fn raw_response_used_without_fences() {
        let response = "  func TestAdd(t *testing.T) {}  ";
        let code = extract_code(response, Language::Go).unwrap();
        assert_eq!(code, "func TestAdd(t *testing.T) {}");
    }

    #[test]
    fn unclosed_fence_runs_to_end() {
        let response = "```go\nfunc TestAdd(t *testing.T) {}";
        let code = extract_code(response, Language::Go).unwrap();
        assert_eq!(code, "func TestAdd(t *testing.T) {}");
    }

    #[test]
    fn empty_response_is_extraction_failure() {
        assert!(matches!(
            extract_code("   \n  ", Language::Go),
            Err(TestforgeError::ExtractionFailed)
        ));
        assert!(matches!(
            extract_code("```go\n\n```", Language::Go),
            Err(TestforgeError::ExtractionFailed)
        ));
    }

    #[test]
    fn first_matching_fence_wins_among_several() {
        let response = "```go\nfirst\n```\ntext\n```go\nsecond\n```";
        assert_eq!(extract_code(response, Language::Go).unwrap(), "first");
    }
}
