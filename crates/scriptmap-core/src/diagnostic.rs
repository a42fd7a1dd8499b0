/*
 * diagnostic.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Analyzer diagnostics.

use serde::{Deserialize, Serialize};

/// How serious a diagnostic is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Warning,
    Error,
}

/// A text replacement suggested by the analyzer.
///
/// `range` holds byte offsets into the text the diagnostic was computed on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fix {
    pub range: [usize; 2],
    pub text: String,
}

/// A message reported against a position in a text.
///
/// Lines and columns are 1-based. Fields this crate does not know about are
/// kept in `extra` and survive remapping untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Diagnostic {
    pub message: String,
    pub line: usize,
    pub column: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_line: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_column: Option<usize>,
    pub severity: Severity,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub fatal: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rule_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fix: Option<Fix>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl Diagnostic {
    pub fn new(message: impl Into<String>, line: usize, column: usize, severity: Severity) -> Self {
        Diagnostic {
            message: message.into(),
            line,
            column,
            end_line: None,
            end_column: None,
            severity,
            fatal: false,
            rule_id: None,
            fix: None,
            extra: serde_json::Map::new(),
        }
    }

    pub fn with_rule(mut self, rule_id: impl Into<String>) -> Self {
        self.rule_id = Some(rule_id.into());
        self
    }

    pub fn with_end(mut self, line: usize, column: usize) -> Self {
        self.end_line = Some(line);
        self.end_column = Some(column);
        self
    }

    pub fn fatal(mut self) -> Self {
        self.fatal = true;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_serialize_minimal() {
        let diag = Diagnostic::new("Unexpected console statement.", 3, 9, Severity::Warning)
            .with_rule("no-console");
        let json = serde_json::to_string(&diag).unwrap();
        insta::assert_snapshot!(
            json,
            @r#"{"message":"Unexpected console statement.","line":3,"column":9,"severity":"warning","ruleId":"no-console"}"#
        );
    }

    #[test]
    fn test_unknown_fields_preserved() {
        let json = r#"{
            "message": "Parsing error: Unexpected token",
            "line": 2,
            "column": 5,
            "severity": "error",
            "fatal": true,
            "nodeType": null,
            "suggestions": [{"desc": "remove"}]
        }"#;
        let diag: Diagnostic = serde_json::from_str(json).unwrap();

        assert!(diag.fatal);
        assert_eq!(diag.rule_id, None);
        assert_eq!(diag.extra.len(), 2);
        assert_eq!(diag.extra["suggestions"][0]["desc"], "remove");

        let back = serde_json::to_value(&diag).unwrap();
        assert_eq!(back["nodeType"], serde_json::Value::Null);
        assert_eq!(back["fatal"], true);
    }

    #[test]
    fn test_fix_round_trips_through_json() {
        let json = r#"{"message":"m","line":1,"column":1,"severity":"error","fix":{"range":[4,9],"text":""}}"#;
        let diag: Diagnostic = serde_json::from_str(json).unwrap();
        assert_eq!(
            diag.fix,
            Some(Fix {
                range: [4, 9],
                text: String::new(),
            })
        );
    }
}
