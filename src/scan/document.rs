//! Scan document model
//!
//! The document only ever contains paths relative to the scanned unit. The
//! scanning host's filesystem layout must not leak into it, so every tool
//! result passes through [`RootPrefix`] before it is attached.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::Path;
use uuid::Uuid;

/// Content type tag of a tool payload
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ContentType {
    #[serde(rename = "text/plain")]
    TextPlain,
    #[serde(rename = "application/json")]
    Json,
}

/// Content-type tagged tool output
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Payload<T> {
    pub content_type: ContentType,
    pub content: T,
}

/// Result of the whole-tree tool
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TreeToolResult {
    pub version: String,
    pub parameters: String,
    pub output: Payload<String>,
}

/// Parsed output for one file
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PerFileResult {
    pub path: String,
    pub output: Value,
}

/// A file whose tool run could not be used
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FileFailure {
    pub path: String,
    pub reason: String,
}

/// Per-outcome counts for a batch
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct BatchSummary {
    pub succeeded: usize,
    pub skipped: usize,
    pub failed: usize,
}

/// Result of a per-file tool across the file list
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BatchResult {
    pub version: String,
    pub output: Payload<Vec<PerFileResult>>,
    pub summary: BatchSummary,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub failures: Vec<FileFailure>,
}

impl BatchResult {
    /// Successful per-file entries
    pub fn entries(&self) -> &[PerFileResult] {
        &self.output.content
    }

    /// Rewrite every path in the batch relative to `root`
    pub fn strip_root(&mut self, root: &RootPrefix) {
        for entry in &mut self.output.content {
            entry.path = root.relative(&entry.path);
            root.strip_value(&mut entry.output);
        }
        for failure in &mut self.failures {
            failure.path = root.relative(&failure.path);
            failure.reason = root.strip_text(&failure.reason);
        }
    }
}

/// Provenance of the document
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DocumentMetadata {
    #[serde(rename = "type")]
    pub kind: String,
    pub request_id: Uuid,
    pub tool: String,
    pub tool_version: String,
    pub processed_at: DateTime<Utc>,
}

/// The assembled scan output
///
/// `nomos` is always present: a document only exists when the whole-tree
/// tool succeeded. Per-file tool keys are absent when the tool was skipped.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScanDocument {
    #[serde(rename = "_metadata")]
    pub metadata: DocumentMetadata,
    #[serde(rename = "sizeKB")]
    pub size_kb: u64,
    #[serde(rename = "fileCount")]
    pub file_count: usize,
    pub nomos: TreeToolResult,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub copyright: Option<BatchResult>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub monk: Option<BatchResult>,
}

impl ScanDocument {
    /// Names of the tool results present, in suite order
    pub fn tool_keys(&self) -> Vec<&'static str> {
        let mut keys = vec!["nomos"];
        if self.copyright.is_some() {
            keys.push("copyright");
        }
        if self.monk.is_some() {
            keys.push("monk");
        }
        keys
    }
}

/// Absolute root location of a scan unit, as it may appear in tool output
#[derive(Debug, Clone)]
pub struct RootPrefix {
    prefixes: Vec<String>,
}

impl RootPrefix {
    /// Build from the unit location; the canonical form is stripped too when it differs
    pub fn new(root: &Path) -> Self {
        let mut prefixes = Vec::new();
        let mut push = |path: &Path| {
            let text = path.to_string_lossy();
            let text = text.trim_end_matches('/');
            if !text.is_empty() && !prefixes.iter().any(|p| p == text) {
                prefixes.push(text.to_string());
            }
        };
        push(root);
        if let Ok(canonical) = root.canonicalize() {
            push(&canonical);
        }
        // Longest first so a prefix never leaves part of a longer one behind
        prefixes.sort_by(|a, b| b.len().cmp(&a.len()));
        Self { prefixes }
    }

    /// Remove the root prefix from free text
    ///
    /// Only whole path occurrences are touched: `<root>/x` becomes `x` and a
    /// bare `<root>` becomes `.`. Sibling paths such as `<root>-old/x` and words
    /// that merely start with a relative root are left alone.
    pub fn strip_text(&self, text: &str) -> String {
        let mut stripped = text.to_string();
        for prefix in &self.prefixes {
            stripped = strip_occurrences(&stripped, prefix);
        }
        stripped
    }

    /// Path relative to the root with `/` separators
    pub fn relative(&self, path: &str) -> String {
        for prefix in &self.prefixes {
            if let Some(rest) = path.strip_prefix(prefix.as_str()) {
                if rest.is_empty() {
                    return ".".to_string();
                }
                if let Some(rest) = rest.strip_prefix('/') {
                    return rest.replace('\\', "/");
                }
            }
        }
        self.strip_text(path)
    }

    /// Remove the root prefix from every string and key of a JSON value
    pub fn strip_value(&self, value: &mut Value) {
        match value {
            Value::String(text) => *text = self.strip_text(text),
            Value::Array(items) => items.iter_mut().for_each(|item| self.strip_value(item)),
            Value::Object(map) => {
                let entries = std::mem::take(map);
                let mut stripped = Map::with_capacity(entries.len());
                for (key, mut item) in entries {
                    self.strip_value(&mut item);
                    stripped.insert(self.strip_text(&key), item);
                }
                *map = stripped;
            }
            Value::Null | Value::Bool(_) | Value::Number(_) => {}
        }
    }
}

/// Characters that extend a path component
fn continues_path(c: char) -> bool {
    c.is_alphanumeric() || matches!(c, '-' | '_' | '.' | '~' | '+' | '@')
}

fn strip_occurrences(text: &str, prefix: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut copied = 0;
    for (start, _) in text.match_indices(prefix) {
        if start < copied {
            continue;
        }
        let before = text[..start].chars().next_back();
        if matches!(before, Some(c) if c == '/' || continues_path(c)) {
            continue;
        }
        let end = start + prefix.len();
        match text[end..].chars().next() {
            Some('/') => {
                out.push_str(&text[copied..start]);
                copied = end + 1;
            }
            Some(c) if continues_path(c) => continue,
            _ => {
                out.push_str(&text[copied..start]);
                out.push('.');
                copied = end;
            }
        }
    }
    out.push_str(&text[copied..]);
    out
}
