use std::path::Path;

use serde_json::Value as JSValue;

/// A table of strings as read from a file, before any validation.
#[derive(Eq, PartialEq, Debug, Clone, Default)]
pub struct RawTable {
    pub header: Vec<String>,
    pub records: Vec<Vec<String>>,
}

pub fn simplify_file_name(path: &str) -> String {
    Path::new(path)
        .file_name()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| path.to_string())
}

/// The text of a JSON cell. Numbers keep their JSON spelling and null is empty.
pub fn json_cell(v: &JSValue) -> Option<String> {
    match v {
        JSValue::String(s) => Some(s.clone()),
        JSValue::Number(n) => Some(n.to_string()),
        JSValue::Bool(b) => Some(b.to_string()),
        JSValue::Null => Some(String::new()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn file_names() {
        assert_eq!(simplify_file_name("/a/b/20220202.xlsx"), "20220202.xlsx");
        assert_eq!(simplify_file_name("votes.csv"), "votes.csv");
    }

    #[test]
    fn cells() {
        assert_eq!(json_cell(&json!("ja")), Some("ja".to_string()));
        assert_eq!(json_cell(&json!(3)), Some("3".to_string()));
        assert_eq!(json_cell(&json!(null)), Some("".to_string()));
        assert_eq!(json_cell(&json!([1])), None);
    }
}
