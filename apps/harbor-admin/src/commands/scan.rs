//! `scan-refs`: find source lines that still mention a symbol.
//!
//! Used while retiring item variations to spot leftover references.
//! Unreadable entries (permissions, binary files) are skipped silently.

use serde::Serialize;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::error::AdminResult;

/// Directories that never hold source worth scanning.
const SKIPPED_DIRS: &[&str] = &[".git", "target", "node_modules"];

/// One matching line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Reference {
    pub path: PathBuf,
    /// 1-based
    pub line_number: usize,
    pub line: String,
}

/// Walks `root` and returns every line containing `symbol`, ordered by
/// path then line.
pub fn scan_references(root: &Path, symbol: &str) -> Vec<Reference> {
    let mut found = Vec::new();
    walk(root, symbol, &mut found);
    found
}

fn walk(dir: &Path, symbol: &str, found: &mut Vec<Reference>) {
    let Ok(entries) = fs::read_dir(dir) else {
        return;
    };
    let mut entries: Vec<_> = entries.filter_map(Result::ok).collect();
    entries.sort_by_key(|e| e.path());

    for entry in entries {
        let Ok(file_type) = entry.file_type() else {
            continue;
        };
        let path = entry.path();

        if file_type.is_dir() {
            let skipped = entry
                .file_name()
                .to_str()
                .is_some_and(|name| SKIPPED_DIRS.contains(&name));
            if !skipped {
                walk(&path, symbol, found);
            }
        } else if file_type.is_file() {
            scan_file(&path, symbol, found);
        }
    }
}

fn scan_file(path: &Path, symbol: &str, found: &mut Vec<Reference>) {
    let Ok(contents) = fs::read_to_string(path) else {
        return;
    };

    found.extend(
        contents
            .lines()
            .enumerate()
            .filter(|(_, line)| line.contains(symbol))
            .map(|(i, line)| Reference {
                path: path.to_path_buf(),
                line_number: i + 1,
                line: line.trim().to_string(),
            }),
    );
}

pub fn run(root: &Path, symbol: &str, json: bool, out: &mut dyn Write) -> AdminResult<()> {
    let references = scan_references(root, symbol);

    if json {
        serde_json::to_writer_pretty(&mut *out, &references)?;
        writeln!(out)?;
        return Ok(());
    }

    for r in &references {
        writeln!(out, "{}:{}: {}", r.path.display(), r.line_number, r.line)?;
    }

    let mut files: Vec<&Path> = references.iter().map(|r| r.path.as_path()).collect();
    files.dedup();
    writeln!(
        out,
        "{} reference(s) to {} in {} file(s)",
        references.len(),
        symbol,
        files.len()
    )?;
    Ok(())
}
