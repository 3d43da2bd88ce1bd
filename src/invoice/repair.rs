//! Single-shot repair of malformed model JSON.
//!
//! The repair path asks the model to fix its own output once, strips any
//! markdown fencing from the reply, and parses the first balanced `{...}`
//! span. There is no second attempt.

use serde::Serialize;
use serde_json::{Map, Value};

use crate::llm::{repair_prompt, ChatModel};

/// Terminal error record returned when repair fails.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RepairFailure {
    pub error: String,
    pub raw_output: String,
}

/// Remove markdown code fences and surrounding backticks/whitespace.
pub fn strip_code_fences(text: &str) -> String {
    text.replace("```json", "")
        .replace("```", "")
        .trim_matches(|c| c == '`' || c == '\n' || c == ' ')
        .to_string()
}

/// Find the first balanced `{...}` span.
///
/// Each `}` closes the most recent unclosed `{`; stray `}` with nothing open
/// are skipped. Among all closed pairs, the one that opens earliest wins,
/// which makes nested objects resolve to their outermost span.
pub fn find_json_object(text: &str) -> Option<&str> {
    let mut open: Vec<usize> = Vec::new();
    let mut best: Option<(usize, usize)> = None;

    for (i, c) in text.char_indices() {
        match c {
            '{' => open.push(i),
            '}' => {
                if let Some(start) = open.pop() {
                    if best.map_or(true, |(s, _)| start < s) {
                        best = Some((start, i));
                    }
                }
            }
            _ => {}
        }
    }

    best.map(|(start, end)| &text[start..=end])
}

/// Ask `model` to repair `raw_output` and parse the reply.
pub async fn repair_json(
    llm: &dyn ChatModel,
    model: &str,
    raw_output: &str,
) -> Result<Map<String, Value>, RepairFailure> {
    let reply = match llm.chat(model, &repair_prompt(raw_output)).await {
        Ok(reply) => reply,
        Err(e) => {
            return Err(RepairFailure {
                error: format!("Failed to parse/fix JSON: {}", e),
                raw_output: raw_output.to_string(),
            })
        }
    };

    let cleaned = strip_code_fences(&reply);
    let Some(span) = find_json_object(&cleaned) else {
        return Err(RepairFailure {
            error: "LLM did not return valid JSON.".to_string(),
            raw_output: cleaned,
        });
    };

    match serde_json::from_str::<Map<String, Value>>(span) {
        Ok(object) => Ok(object),
        Err(e) => Err(RepairFailure {
            error: format!("Failed to parse/fix JSON: {}", e),
            raw_output: cleaned,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::invoice::testing::ScriptedChat;
    use serde_json::json;

    #[test]
    fn test_strip_code_fences() {
        assert_eq!(strip_code_fences("```json\n{\"a\": 1}\n```"), "{\"a\": 1}");
        assert_eq!(strip_code_fences("```\n{\"a\": 1}\n```\n"), "{\"a\": 1}");
        assert_eq!(strip_code_fences("  {\"a\": 1}  "), "{\"a\": 1}");
        assert_eq!(
            strip_code_fences("Here you go:\n```json\n{}\n```"),
            "Here you go:\n\n{}"
        );
    }

    #[test]
    fn test_find_json_object_nested() {
        let text = r#"Sure! {"a": {"b": {"c": 1}}, "d": [ {"e": 2} ]} trailing"#;
        assert_eq!(
            find_json_object(text),
            Some(r#"{"a": {"b": {"c": 1}}, "d": [ {"e": 2} ]}"#)
        );
    }

    #[test]
    fn test_find_json_object_first_of_several() {
        assert_eq!(find_json_object("{\"a\":1} {\"b\":2}"), Some("{\"a\":1}"));
    }

    #[test]
    fn test_find_json_object_skips_unclosed_prefix() {
        assert_eq!(find_json_object("{ oops {\"x\": 1}"), Some("{\"x\": 1}"));
    }

    #[test]
    fn test_find_json_object_ignores_stray_close() {
        assert_eq!(find_json_object("} {\"x\": 1}"), Some("{\"x\": 1}"));
    }

    #[test]
    fn test_find_json_object_none() {
        assert_eq!(find_json_object("no braces here"), None);
        assert_eq!(find_json_object("{ never closed"), None);
    }

    #[test]
    fn test_find_json_object_deep_nesting() {
        let depth = 10_000;
        let text = format!("{}{}", "{".repeat(depth), "}".repeat(depth));
        assert_eq!(find_json_object(&text).map(str::len), Some(depth * 2));
    }

    #[tokio::test]
    async fn test_repair_fenced_reply() {
        let llm = ScriptedChat::new(vec![Ok("```json\n{\"Total Amount\": 12.5}\n```")]);
        let repaired = repair_json(&llm, "phi3", "{Total Amount: 12.5,}")
            .await
            .unwrap();

        assert_eq!(Value::Object(repaired), json!({"Total Amount": 12.5}));
        let calls = llm.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].0, "phi3");
        assert!(calls[0].1.contains("{Total Amount: 12.5,}"));
    }

    #[tokio::test]
    async fn test_repair_reply_without_object() {
        let llm = ScriptedChat::new(vec![Ok("```\nI cannot help with that\n```")]);
        let failure = repair_json(&llm, "phi3", "garbage").await.unwrap_err();

        assert_eq!(failure.error, "LLM did not return valid JSON.");
        assert_eq!(failure.raw_output, "I cannot help with that");
    }

    #[tokio::test]
    async fn test_repair_reply_still_malformed() {
        let llm = ScriptedChat::new(vec![Ok("{\"a\": 1,}")]);
        let failure = repair_json(&llm, "phi3", "{a: 1,}").await.unwrap_err();

        assert!(failure.error.starts_with("Failed to parse/fix JSON: "));
        assert_eq!(failure.raw_output, "{\"a\": 1,}");
    }

    #[tokio::test]
    async fn test_repair_call_fails() {
        let llm = ScriptedChat::new(vec![]);
        let failure = repair_json(&llm, "phi3", "{a: 1,}").await.unwrap_err();

        assert!(failure.error.starts_with("Failed to parse/fix JSON: "));
        assert_eq!(failure.raw_output, "{a: 1,}");
    }
}
