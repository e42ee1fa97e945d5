//! Fallback tool-call extraction
//!
//! Some models ignore native function calling and write pseudo-markup into a
//! side channel instead:
//!
//! ```text
//! <tool_call>readFile
//! <arg_key>relativeFilePath</arg_key><arg_value>README.md</arg_value>
//! </tool_call>
//! ```
//!
//! [`parse_tool_calls`] turns that text into canonical [`ToolCall`]s. It is
//! purely textual: every argument value is a string.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::{Map, Value};

use crate::tool::ToolCall;

static TOOL_CALL_SPAN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<tool_call>(.*?)</tool_call>").expect("valid regex"));

static TOOL_NAME: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^([^\n<]+)").expect("valid regex"));

static ARG_PAIR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)<arg_key>(.*?)</arg_key><arg_value>(.*?)</arg_value>").expect("valid regex")
});

/// Recover tool calls from `<tool_call>` markup
///
/// Spans without a name on their first line are skipped; a repeated
/// argument key keeps its last value. Never fails.
pub fn parse_tool_calls(text: Option<&str>) -> Vec<ToolCall> {
    let Some(text) = text.filter(|t| !t.is_empty()) else {
        return Vec::new();
    };

    TOOL_CALL_SPAN
        .captures_iter(text)
        .filter_map(|span| {
            let block = span.get(1).map_or("", |m| m.as_str());
            let name = TOOL_NAME
                .captures(block)
                .and_then(|c| c.get(1))
                .map(|m| m.as_str().trim())
                .filter(|name| !name.is_empty())?;

            let mut args = Map::new();
            for pair in ARG_PAIR.captures_iter(block) {
                let key = pair.get(1).map_or("", |m| m.as_str()).trim();
                let value = pair.get(2).map_or("", |m| m.as_str()).trim();
                args.insert(key.to_string(), Value::String(value.to_string()));
            }

            Some(ToolCall::named(name, args))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_input() {
        assert!(parse_tool_calls(None).is_empty());
        assert!(parse_tool_calls(Some("")).is_empty());
        assert!(parse_tool_calls(Some("no markup here")).is_empty());
    }

    #[test]
    fn test_two_spans() {
        let text = "thinking...\n<tool_call>listDirectory\n\
            <arg_key> relativeOriginalPath </arg_key><arg_value> src </arg_value>\n</tool_call>\n\
            more thoughts\n<tool_call> readFile <arg_key>relativeFilePath</arg_key><arg_value>README.md</arg_value></tool_call>";

        let calls = parse_tool_calls(Some(text));
        assert_eq!(calls.len(), 2);

        assert_eq!(calls[0].tool_name(), Some("listDirectory"));
        assert_eq!(calls[0].resolve_args()["relativeOriginalPath"], "src");
        assert!(calls[0].id.is_none());

        assert_eq!(calls[1].tool_name(), Some("readFile"));
        assert_eq!(calls[1].resolve_args()["relativeFilePath"], "README.md");
    }

    #[test]
    fn test_single_pair() {
        let calls = parse_tool_calls(Some(
            "<tool_call>listDirectory<arg_key>path</arg_key><arg_value>src</arg_value></tool_call>",
        ));
        assert_eq!(calls.len(), 1);
        let args = calls[0].resolve_args();
        assert_eq!(args.len(), 1);
        assert_eq!(args["path"], "src");
    }

    #[test]
    fn test_duplicate_key_last_wins() {
        let calls = parse_tool_calls(Some(
            "<tool_call>readFile\n<arg_key>p</arg_key><arg_value>a</arg_value>\n\
             <arg_key>p</arg_key><arg_value>b</arg_value></tool_call>",
        ));
        assert_eq!(calls[0].resolve_args()["p"], "b");
    }

    #[test]
    fn test_nameless_span_discarded() {
        let text = "<tool_call><arg_key>p</arg_key><arg_value>a</arg_value></tool_call>\
                    <tool_call>\nreadFile</tool_call>\
                    <tool_call>   </tool_call>";
        assert!(parse_tool_calls(Some(text)).is_empty());
    }

    #[test]
    fn test_values_stay_strings() {
        let calls = parse_tool_calls(Some(
            "<tool_call>render<arg_key>count</arg_key><arg_value>3</arg_value></tool_call>",
        ));
        assert_eq!(calls[0].resolve_args()["count"], Value::String("3".into()));
    }
}
