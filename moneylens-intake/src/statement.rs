//! Statement intake: accept a `.csv` selection, read it as text, count rows.
//!
//! There is deliberately no CSV parsing here. The manager agent receives the
//! raw text verbatim and owns every financial interpretation; the only local
//! derivation is a row count for display.

use anyhow::{Context, Result};
use std::path::Path;

/// One accepted statement. Replaced wholesale on the next accepted
/// selection; never written to disk.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedStatement {
    /// Display name (the file name, or the full path when nameless).
    pub name: String,
    /// Raw CSV text, sent to the agent untouched.
    pub text: String,
    /// Newline-delimited line count minus one header line. Empty text
    /// yields -1 and a lone header yields 0; neither is corrected.
    pub row_count: i64,
}

/// Derived transaction-row count: line count minus the header line.
pub fn transaction_rows(text: &str) -> i64 {
    if text.is_empty() {
        return -1;
    }
    text.split('\n').count() as i64 - 1
}

/// Whether a path looks like a CSV selection. Extension check only; the
/// content is never validated.
pub fn is_csv_path(path: &Path) -> bool {
    path.extension()
        .map(|ext| ext.eq_ignore_ascii_case("csv"))
        .unwrap_or(false)
}

/// The single accept path behind every intake source (path prompt, dropped
/// path, `--csv` flag). Non-CSV selections return `Ok(None)` with no
/// user-facing error, leaving whatever was loaded before untouched; an
/// unreadable CSV is a real error.
pub async fn accept(path: &Path) -> Result<Option<LoadedStatement>> {
    if !is_csv_path(path) {
        log::debug!("ignoring non-csv selection: {}", path.display());
        return Ok(None);
    }

    let text = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("reading {}", path.display()))?;

    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());

    let row_count = transaction_rows(&text);
    log::debug!("accepted {name}: {row_count} transaction rows");

    Ok(Some(LoadedStatement {
        name,
        text,
        row_count,
    }))
}
