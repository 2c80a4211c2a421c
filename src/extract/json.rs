//! Recovering a JSON object from free-form model output.
//!
//! Models often wrap JSON in prose or code fences and sometimes emit Python
//! literals. The first balanced `{...}` block is cut out (braces inside
//! string literals are ignored), bare `True`/`False`/`None` outside strings
//! are rewritten, and the result is parsed.

use serde_json::Value;

use crate::core::errors::OutlineError;

const SNIPPET_RADIUS: usize = 40;

pub fn extract_json_object(text: &str) -> Result<Value, OutlineError> {
    let block = first_object_block(text)?;
    let normalized = normalize_python_literals(block);

    serde_json::from_str(&normalized).map_err(|e| {
        OutlineError::JsonExtraction(format!(
            "{} near: {}",
            e,
            snippet_at(&normalized, e.line(), e.column())
        ))
    })
}

fn first_object_block(text: &str) -> Result<&str, OutlineError> {
    let start = text
        .find('{')
        .ok_or_else(|| OutlineError::JsonExtraction("no opening '{' found".to_string()))?;

    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, ch) in text[start..].char_indices() {
        if in_string {
            match ch {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }

        match ch {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Ok(&text[start..start + offset + 1]);
                }
            }
            _ => {}
        }
    }

    Err(OutlineError::JsonExtraction(
        "no matching closing '}' found".to_string(),
    ))
}

/// Rewrite `True`, `False` and `None` tokens that appear outside strings.
fn normalize_python_literals(block: &str) -> String {
    let mut out = String::with_capacity(block.len());
    let mut word = String::new();
    let mut in_string = false;
    let mut escaped = false;

    let flush = |word: &mut String, out: &mut String| {
        let replaced = match word.as_str() {
            "True" => "true",
            "False" => "false",
            "None" => "null",
            other => other,
        };
        out.push_str(replaced);
        word.clear();
    };

    for ch in block.chars() {
        if in_string {
            out.push(ch);
            match ch {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }

        if ch.is_ascii_alphanumeric() || ch == '_' {
            word.push(ch);
            continue;
        }

        flush(&mut word, &mut out);
        if ch == '"' {
            in_string = true;
        }
        out.push(ch);
    }
    flush(&mut word, &mut out);

    out
}

fn snippet_at(text: &str, line: usize, column: usize) -> String {
    let line_text = text.lines().nth(line.saturating_sub(1)).unwrap_or("");
    let mut byte_col = column.min(line_text.len());
    while !line_text.is_char_boundary(byte_col) {
        byte_col -= 1;
    }

    let chars: Vec<char> = line_text.chars().collect();
    let at = line_text[..byte_col].chars().count();
    let from = at.saturating_sub(SNIPPET_RADIUS);
    let to = (at + SNIPPET_RADIUS).min(chars.len());
    chars[from..to].iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn plain_object_parses() {
        assert_eq!(
            extract_json_object(r#"{"a": 1}"#).unwrap(),
            json!({ "a": 1 })
        );
    }

    #[test]
    fn prose_and_code_fences_are_skipped() {
        let reply = "Here is the structure:\n```json\n{\"new_structure\": {\"1. 概述\": {\"children\": {}}}}\n```\nDone.";
        let value = extract_json_object(reply).unwrap();
        assert_eq!(value["new_structure"]["1. 概述"]["children"], json!({}));
    }

    #[test]
    fn only_the_first_object_is_taken() {
        let value = extract_json_object(r#"{"a": {"b": 2}} trailing {"c": 3}"#).unwrap();
        assert_eq!(value, json!({ "a": { "b": 2 } }));
    }

    #[test]
    fn braces_inside_strings_do_not_close_the_block() {
        let value =
            extract_json_object(r#"{"raw_text": "see {section} \"}\" here", "n": 1}"#).unwrap();
        assert_eq!(value["raw_text"], "see {section} \"}\" here");
        assert_eq!(value["n"], 1);
    }

    #[test]
    fn python_literals_are_normalized_outside_strings() {
        let value =
            extract_json_object(r#"{"toc": None, "ok": True, "bad": False, "text": "None True"}"#)
                .unwrap();
        assert_eq!(
            value,
            json!({ "toc": null, "ok": true, "bad": false, "text": "None True" })
        );
    }

    #[test]
    fn key_order_is_preserved() {
        let value = extract_json_object(r#"{"z": 1, "a": 2, "m": 3}"#).unwrap();
        let keys: Vec<&String> = value.as_object().unwrap().keys().collect();
        assert_eq!(keys, vec!["z", "a", "m"]);
    }

    #[test]
    fn missing_or_unbalanced_braces_are_errors() {
        assert!(matches!(
            extract_json_object("no json here"),
            Err(OutlineError::JsonExtraction(_))
        ));
        assert!(matches!(
            extract_json_object(r#"{"a": {"b": 1}"#),
            Err(OutlineError::JsonExtraction(_))
        ));
    }

    #[test]
    fn parse_errors_carry_a_snippet() {
        let err = extract_json_object(r#"{"a": 1, "b": oops}"#).unwrap_err();
        let message = err.to_string();
        assert!(message.contains("near:"), "{message}");
        assert!(message.contains("oops"), "{message}");
    }
}
