// src/guard/path.rs
// =============================================================================
// Output path safety.
//
// The crawler writes files named by the operator, so the path has to stay
// inside the directory the tool was started from:
// - relative only, no leading '/' or drive letter
// - no '..' and no '~'
// - resolves under the current working directory
// - ends in .md or .txt (.llm.txt is a .txt)
// =============================================================================

use crate::error::PathError;
use std::path::{Path, PathBuf};

const ALLOWED_EXTENSIONS: &[&str] = &["md", "txt"];

// Checks an output path against the current working directory
pub fn validate_output_path(path: &str) -> Result<PathBuf, PathError> {
    let cwd = std::env::current_dir().map_err(|e| PathError::CurrentDir(e.to_string()))?;
    validate_output_path_in(path, &cwd)
}

// Same check against an explicit base directory
pub fn validate_output_path_in(path: &str, cwd: &Path) -> Result<PathBuf, PathError> {
    if path.starts_with('/') || path.starts_with('\\') || Path::new(path).is_absolute() {
        return Err(PathError::Absolute);
    }
    if path.contains("..") {
        return Err(PathError::Traversal);
    }
    if path.contains('~') {
        return Err(PathError::HomeExpansion);
    }

    // With '..' ruled out a plain join cannot climb out, but a Windows
    // prefix like "C:docs.md" would still replace the base
    let resolved = cwd.join(path);
    if !resolved.starts_with(cwd) {
        return Err(PathError::OutsideWorkingDir);
    }

    let allowed = Path::new(path)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ALLOWED_EXTENSIONS.contains(&ext))
        .unwrap_or(false);
    if !allowed {
        return Err(PathError::Extension);
    }

    Ok(resolved)
}

// Where the LLM index goes for a given output path
//
// docs.md   -> docs.llm.txt
// notes.txt -> notes.txt.llm.txt
pub fn index_path_for(output: &str) -> String {
    match output.strip_suffix(".md") {
        Some(stem) => format!("{}.llm.txt", stem),
        None => format!("{}.llm.txt", output),
    }
}
