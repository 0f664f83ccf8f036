//! Response normalization for raw model replies
//!
//! The model's output format is a best-effort convention, not a
//! contract: reasoning-capable models prepend private deliberation,
//! and JSON answers often arrive wrapped in markdown fences. This
//! module is total — it degrades to plain text instead of failing.

use crate::models::{InsightResult, StructuredInsight};

/// Marker some models emit between private deliberation and the
/// answer intended for the caller.
const REASONING_DELIMITER: &str = "</thinking>";

/// Keep the segment directly after the first reasoning delimiter, up
/// to any further delimiter. The result can never contain the
/// delimiter itself, so repeated application is a no-op. Text without
/// a delimiter passes through unchanged.
pub fn strip_reasoning(text: &str) -> &str {
    text.split(REASONING_DELIMITER).nth(1).unwrap_or(text)
}

/// Remove every fenced-code marker (with or without the `json` tag)
/// and trim surrounding whitespace.
pub fn strip_fences(text: &str) -> String {
    text.replace("```json", "")
        .replace("```", "")
        .trim()
        .to_string()
}

/// Apply both stripping passes in order. Idempotent: neither pass can
/// leave its own marker behind.
pub fn clean(text: &str) -> String {
    strip_fences(strip_reasoning(text))
}

/// Normalize a raw reply into an [`InsightResult`].
///
/// Any parse failure falls back to `Plain` with the cleaned text —
/// this function never returns an error and never panics.
pub fn extract(raw: &str) -> InsightResult {
    let cleaned = clean(raw);

    match serde_json::from_str::<StructuredInsight>(&cleaned) {
        Ok(insight) => InsightResult::Structured(insight),
        Err(_) => InsightResult::Plain(cleaned),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reasoning_block_is_discarded() {
        let input = "I should fetch data first.</thinking>The answer.";
        assert_eq!(strip_reasoning(input), "The answer.");
    }

    #[test]
    fn text_without_delimiter_passes_through() {
        let input = "No deliberation here.";
        assert_eq!(strip_reasoning(input), input);
    }

    #[test]
    fn only_the_segment_after_the_first_delimiter_is_kept() {
        // A second delimiter bounds the answer; nothing after it
        // survives, so re-stripping cannot remove more.
        let input = "early</thinking>middle</thinking>late";
        assert_eq!(strip_reasoning(input), "middle");
        assert_eq!(strip_reasoning(strip_reasoning(input)), "middle");
    }

    #[test]
    fn all_fence_pairs_are_stripped() {
        let input = "```json\n{\"a\":1}\n```\nand\n```json\n{\"b\":2}\n```";
        let cleaned = strip_fences(input);
        assert!(!cleaned.contains("```"));
        assert!(cleaned.contains("{\"a\":1}"));
        assert!(cleaned.contains("{\"b\":2}"));
    }

    #[test]
    fn cleaning_is_idempotent() {
        let inputs = [
            "thinking...</thinking>```json\n{\"response\":\"ok\"}\n```",
            "early</thinking>middle</thinking>late",
            "one</thinking>two</thinking>three</thinking>four",
            "Just a plain sentence.",
            "```\nfenced\n```",
            "",
        ];

        for input in inputs {
            let once = clean(input);
            assert_eq!(clean(&once), once, "not idempotent for {input:?}");
        }
    }

    #[test]
    fn reasoning_then_fenced_json_yields_structured_insight() {
        let input =
            "Answer here</thinking>```json\n{\"response\":\"ok\",\"transactions\":[]}\n```";

        let result = extract(input);
        assert_eq!(
            result,
            InsightResult::Structured(StructuredInsight {
                response: "ok".to_string(),
                transactions: vec![],
            })
        );
    }

    #[test]
    fn plain_sentence_yields_plain_result() {
        let result = extract("Just a plain sentence.");
        assert_eq!(result, InsightResult::Plain("Just a plain sentence.".to_string()));
    }

    #[test]
    fn empty_input_after_stripping_yields_empty_plain() {
        assert_eq!(extract(""), InsightResult::Plain(String::new()));
        assert_eq!(
            extract("private</thinking>```json\n```"),
            InsightResult::Plain(String::new())
        );
    }

    #[test]
    fn whitespace_is_trimmed_before_parsing() {
        let result = extract("  some text  \n");
        assert_eq!(result, InsightResult::Plain("some text".to_string()));
    }

    #[test]
    fn valid_json_of_the_wrong_shape_stays_plain() {
        // Parses as JSON but not as a structured insight.
        assert_eq!(extract("42"), InsightResult::Plain("42".to_string()));
        assert_eq!(
            extract(r#"{"unrelated":"object"}"#),
            InsightResult::Plain(r#"{"unrelated":"object"}"#.to_string())
        );
    }

    #[test]
    fn fence_wrapped_insight_round_trips() {
        let insight = StructuredInsight {
            response: "You spent 120 EUR on groceries.".to_string(),
            transactions: vec![serde_json::json!({"id": "txn_1", "amount": "-12.50"})],
        };

        let wrapped = format!(
            "```json\n{}\n```",
            serde_json::to_string(&insight).unwrap()
        );

        assert_eq!(extract(&wrapped), InsightResult::Structured(insight));
    }

    #[test]
    fn unfenced_structured_json_is_parsed() {
        let result = extract(r#"{"response":"ok","top_transactions":[{"id":"t9"}]}"#);
        match result {
            InsightResult::Structured(insight) => {
                assert_eq!(insight.response, "ok");
                assert_eq!(insight.transactions.len(), 1);
            }
            other => panic!("expected structured insight, got {other:?}"),
        }
    }
}
