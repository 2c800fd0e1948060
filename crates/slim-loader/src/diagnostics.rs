//! Diagnostic extraction from Rolldown errors.
//!
//! Rolldown's error batches are only reliably reachable through their debug
//! representation, so this module classifies that text into a small stable
//! shape that callers can display and match on.

use serde::{Deserialize, Serialize};
use std::fmt;

/// One classified build failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildDiagnostic {
    pub kind: DiagnosticKind,
    pub message: String,
    pub file: Option<String>,
}

/// Diagnostic kind (mirrors the Rolldown event kinds we care about).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticKind {
    UnresolvedEntry,
    UnresolvedImport,
    MissingExport,
    ParseError,
    Plugin,
    Other,
}

impl BuildDiagnostic {
    pub fn new(kind: DiagnosticKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            file: None,
        }
    }
}

impl fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DiagnosticKind::UnresolvedEntry => "UnresolvedEntry",
            DiagnosticKind::UnresolvedImport => "UnresolvedImport",
            DiagnosticKind::MissingExport => "MissingExport",
            DiagnosticKind::ParseError => "ParseError",
            DiagnosticKind::Plugin => "Plugin",
            DiagnosticKind::Other => "Error",
        };
        f.write_str(name)
    }
}

impl fmt::Display for BuildDiagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.file {
            Some(file) => write!(f, "{}: {} ({})", self.kind, self.message, file),
            None => write!(f, "{}: {}", self.kind, self.message),
        }
    }
}

/// Extract diagnostics from a Rolldown error batch.
pub fn extract_from_rolldown_error(error: &dyn fmt::Debug) -> Vec<BuildDiagnostic> {
    let text = format!("{error:?}");

    // Batched errors render one diagnostic per `BuildDiagnostic {` block.
    let blocks: Vec<&str> = text
        .split("BuildDiagnostic")
        .map(str::trim)
        .filter(|block| !block.is_empty() && *block != "[" && *block != "]")
        .collect();

    if blocks.len() > 1 {
        return blocks.into_iter().map(classify).collect();
    }

    vec![classify(&text)]
}

fn classify(text: &str) -> BuildDiagnostic {
    let kind = if text.contains("UnresolvedEntry") {
        DiagnosticKind::UnresolvedEntry
    } else if text.contains("UnresolvedImport") || text.contains("Could not resolve") {
        DiagnosticKind::UnresolvedImport
    } else if text.contains("MissingExport") {
        DiagnosticKind::MissingExport
    } else if text.contains("ParseError") || text.contains("Unexpected token") {
        DiagnosticKind::ParseError
    } else if text.contains("Plugin") {
        DiagnosticKind::Plugin
    } else {
        DiagnosticKind::Other
    };

    BuildDiagnostic {
        kind,
        message: extract_message(text).unwrap_or_else(|| text.trim().to_string()),
        file: extract_file(text),
    }
}

/// Pull the quoted `message: "..."` field out of a debug rendering.
fn extract_message(text: &str) -> Option<String> {
    let start = text.find("message: \"")? + "message: \"".len();
    let rest = &text[start..];
    let end = rest.find('"')?;
    Some(rest[..end].to_string())
}

fn extract_file(text: &str) -> Option<String> {
    for marker in ["importer: \"", "path: \"", "id: \""] {
        if let Some(start) = text.find(marker) {
            let rest = &text[start + marker.len()..];
            if let Some(end) = rest.find('"') {
                return Some(rest[..end].to_string());
            }
        }
    }
    None
}
