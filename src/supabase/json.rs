//! JSON decoding for REST responses with readable failure messages.

use anyhow::Result;

/// Deserialize `body`, and on failure report the serde path, the type
/// mismatch, and a snippet of the offending line with a caret under the
/// failing column.
pub fn parse_json_with_context<T: serde::de::DeserializeOwned>(body: &str) -> Result<T> {
    let de = &mut serde_json::Deserializer::from_str(body);
    serde_path_to_error::deserialize(de).map_err(|err| {
        let inner = err.inner();
        let (line, column) = (inner.line(), inner.column());
        let path = err.path().to_string();

        let msg = inner.to_string();
        let loc = format!(" at line {line} column {column}");
        let summary = describe_mismatch(msg.strip_suffix(&loc).unwrap_or(&msg));

        let mut out = String::new();
        if !path.is_empty() && path != "." {
            out.push_str(&format!("at path '{path}': "));
        }
        out.push_str(&format!("{summary} (line {line} col {column})\n"));
        out.push_str(&snippet(body, line, column, 20));
        anyhow::anyhow!(out)
    })
}

/// Rewrite `invalid type: X, expected Y` as `expected Y, got X`.
fn describe_mismatch(msg: &str) -> String {
    if let Some(rest) = msg.strip_prefix("invalid type: ")
        && let Some((actual, expected)) = rest.split_once(", expected ")
    {
        return format!("expected {expected}, got {actual}");
    }
    msg.to_string()
}

/// Show up to `width` characters around a 1-based `column` of `line`.
///
/// Works on characters rather than bytes so multi-byte text in the body
/// never splits a code point.
fn snippet(body: &str, line: usize, column: usize, width: usize) -> String {
    let target: Vec<char> = body
        .lines()
        .nth(line.saturating_sub(1))
        .unwrap_or("")
        .chars()
        .collect();
    if target.is_empty() {
        return "(empty line)".to_string();
    }

    // serde_json reports byte columns; clamp into the char range.
    let idx = column.saturating_sub(1).min(target.len() - 1);
    let half = width / 2;
    let start = idx.saturating_sub(half);
    let end = (idx + half).min(target.len());

    let slice: String = target[start..end.max(start)].iter().collect();
    let caret = " ".repeat(idx - start) + "^";
    format!("...{slice}...\n   {caret}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::supabase::Row;

    #[test]
    fn test_describe_mismatch() {
        assert_eq!(
            describe_mismatch("invalid type: map, expected a sequence"),
            "expected a sequence, got map"
        );
        assert_eq!(describe_mismatch("EOF while parsing"), "EOF while parsing");
    }

    #[test]
    fn test_rows_parse() {
        let rows: Vec<Row> =
            parse_json_with_context(r#"[{"id": 1, "name": "Livros"}, {"id": 2}]"#).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].name(), Some("Livros".to_string()));
        assert_eq!(rows[1].name(), None);
    }

    #[test]
    fn test_object_instead_of_array() {
        let err = parse_json_with_context::<Vec<Row>>(r#"{"message": "oops"}"#).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("expected a sequence"), "{msg}");
        assert!(msg.contains('^'), "{msg}");
    }

    #[test]
    fn test_non_object_row_reports_path() {
        let err = parse_json_with_context::<Vec<Row>>(r#"[{"name": "ok"}, 7]"#).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("at path '[1]'"), "{msg}");
        assert!(msg.contains("got integer"), "{msg}");
    }

    #[test]
    fn test_snippet_with_multibyte_text() {
        let body = r#"[{"name": "Eletrônicos", "descrição": ção}]"#;
        let err = parse_json_with_context::<Vec<Row>>(body).unwrap_err();
        assert!(err.to_string().contains('^'));
    }
}
