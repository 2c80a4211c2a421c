//! Reading markdown sources as non-empty line sequences.

use std::fs;
use std::path::{Path, PathBuf};

use crate::core::errors::OutlineError;

/// Drop blank lines and right-trim the rest. Leading indentation is kept.
pub fn non_empty_lines(text: &str) -> Vec<String> {
    text.lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| line.trim_end().to_string())
        .collect()
}

pub fn read_non_empty_lines(path: impl AsRef<Path>) -> Result<Vec<String>, OutlineError> {
    let path = path.as_ref();
    let text = fs::read_to_string(path).map_err(|e| OutlineError::io(path, e))?;
    Ok(non_empty_lines(&text))
}

/// Write the cleaned document next to the source (`<stem>_cleaned.<ext>`)
/// unless an explicit output path is given. Returns the written path.
pub fn save_cleaned(
    path: impl AsRef<Path>,
    output: Option<&Path>,
) -> Result<PathBuf, OutlineError> {
    let path = path.as_ref();
    let lines = read_non_empty_lines(path)?;
    let mut cleaned = lines.join("\n");
    cleaned.push('\n');

    let output_path = match output {
        Some(p) => p.to_path_buf(),
        None => cleaned_path_for(path),
    };

    fs::write(&output_path, cleaned).map_err(|e| OutlineError::io(&output_path, e))?;
    tracing::info!(
        "Saved cleaned markdown to {} ({} lines)",
        output_path.display(),
        lines.len()
    );
    Ok(output_path)
}

fn cleaned_path_for(path: &Path) -> PathBuf {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default();
    let file_name = match path.extension() {
        Some(ext) => format!("{}_cleaned.{}", stem, ext.to_string_lossy()),
        None => format!("{}_cleaned", stem),
    };
    path.with_file_name(file_name)
}
