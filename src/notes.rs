// Study notes on disk: Markdown files found recursively under a folder.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

/// Notes shorter than this (in characters) are skipped without calling any
/// model: there is not enough material for five questions.
pub const MIN_NOTE_CHARS: usize = 200;

/// Every `.md` file under `dir`, recursively, sorted by path.
pub fn scan_folder(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    collect_markdown(dir, &mut files)?;
    files.sort();
    Ok(files)
}

fn collect_markdown(dir: &Path, files: &mut Vec<PathBuf>) -> Result<()> {
    let entries =
        std::fs::read_dir(dir).with_context(|| format!("Failed to read folder {}", dir.display()))?;

    for entry in entries {
        let path = entry?.path();
        if path.is_dir() {
            collect_markdown(&path, files)?;
        } else if path.extension().is_some_and(|ext| ext == "md") {
            files.push(path);
        }
    }
    Ok(())
}

/// Read a note as UTF-8.
pub fn read_note(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("Failed to read note {}", path.display()))
}

/// Whether a note has enough text to be worth generating questions from.
pub fn is_long_enough(content: &str) -> bool {
    content.chars().count() >= MIN_NOTE_CHARS
}
