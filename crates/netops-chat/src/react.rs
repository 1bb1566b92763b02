//! Thought / Action / Action Input / Final Answer text protocol
//!
//! Models that do not emit native tool calls answer in this format:
//!
//! ```text
//! Thought: Do I need to use a tool? Yes
//! Action: check_supported_url_tool
//! Action Input: "Leaf Nodes"
//! ```
//!
//! or
//!
//! ```text
//! Thought: Do I need to use a tool? No
//! Final Answer: There are 2 leaf nodes.
//! ```

use lazy_static::lazy_static;
use regex::Regex;
use serde_json::Value;

use crate::agent::Decision;

lazy_static! {
    static ref ACTION: Regex = Regex::new(r"(?m)^\s*Action\s*:\s*(.+?)\s*$").unwrap();
    static ref ACTION_INPUT: Regex =
        Regex::new(r"(?ms)^\s*Action\s+Input\s*:\s*(.*?)\s*(?:^\s*Observation\s*:|\z)").unwrap();
    static ref FINAL_ANSWER: Regex = Regex::new(r"(?ms)^\s*Final\s+Answer\s*:\s*(.*)\z").unwrap();
}

/// Parse a text-protocol reply. `None` when the text follows neither form.
pub fn parse(text: &str) -> Option<Decision> {
    let action = ACTION.captures(text);
    let answer = FINAL_ANSWER.captures(text);

    let action_pos = action.as_ref().and_then(|c| c.get(0)).map(|m| m.start());
    let answer_pos = answer.as_ref().and_then(|c| c.get(0)).map(|m| m.start());

    // whichever comes first wins; models sometimes hallucinate the rest
    let use_action = match (action_pos, answer_pos) {
        (Some(a), Some(f)) => a < f,
        (Some(_), None) => true,
        _ => false,
    };

    if use_action {
        let tool = clean_tool_name(action?.get(1)?.as_str());
        if tool.is_empty() {
            return None;
        }
        let input = ACTION_INPUT
            .captures(text)
            .and_then(|c| c.get(1))
            .map(|m| parse_input(m.as_str()))
            .unwrap_or(Value::Null);
        return Some(Decision::Call {
            id: None,
            tool,
            input,
        });
    }

    let answer = answer?.get(1)?.as_str().trim().to_string();
    Some(Decision::Answer(answer))
}

fn clean_tool_name(raw: &str) -> String {
    raw.trim()
        .trim_matches(|c: char| c == '`' || c == '"' || c == '\'' || c == '*')
        .trim()
        .to_string()
}

/// Turn the raw `Action Input` text into a tool input value.
///
/// JSON is used as-is; quoted text is unquoted; "(no input ...)" becomes null.
fn parse_input(raw: &str) -> Value {
    let raw = raw.trim();
    if raw.is_empty() || raw.to_lowercase().starts_with("(no input") {
        return Value::Null;
    }

    for quote in ["\"\"\"", "'''", "\"", "'", "`"] {
        if raw.len() >= 2 * quote.len() && raw.starts_with(quote) && raw.ends_with(quote) {
            let inner = &raw[quote.len()..raw.len() - quote.len()];
            return Value::String(inner.trim().to_string());
        }
    }

    match serde_json::from_str::<Value>(raw) {
        Ok(value @ (Value::Object(_) | Value::Array(_))) => value,
        _ => Value::String(raw.to_string()),
    }
}
