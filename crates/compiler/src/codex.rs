//! Language codex pretty-printer
//!
//! `--codex` renders the language overview document with ANSI colors:
//! magenta bold for `#` headers, cyan for `##` subheaders, yellow for list
//! items and `::` notation lines, plain text otherwise.

use crate::error::CompileError;
use std::fs;
use std::path::{Path, PathBuf};

/// Locations tried, in order, relative to the working directory.
const CODEX_PATHS: &[&str] = &[
    "docs/rexion_language_overview.md",
    "rexion_language_overview.md",
];

const MAGENTA_BOLD: &str = "\x1b[1;35m";
const CYAN_BOLD: &str = "\x1b[1;36m";
const YELLOW: &str = "\x1b[0;33m";
const RESET: &str = "\x1b[0m";

/// Find the codex document.
pub fn find_codex() -> Option<PathBuf> {
    CODEX_PATHS
        .iter()
        .map(PathBuf::from)
        .find(|p| p.is_file())
}

/// Colorize the codex text for terminal display.
pub fn colorize(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for line in text.lines() {
        if line.starts_with("# ") {
            out.push_str(&format!("{}{}{}\n", MAGENTA_BOLD, line, RESET));
        } else if line.starts_with("## ") {
            out.push_str(&format!("{}{}{}\n", CYAN_BOLD, line, RESET));
        } else if line.starts_with("- ") || line.contains("::") || line.contains('*') {
            out.push_str(&format!("{}{}{}\n", YELLOW, line, RESET));
        } else {
            out.push_str(line);
            out.push('\n');
        }
    }
    out
}

/// Read and colorize the codex at `path`.
pub fn render(path: &Path) -> Result<String, CompileError> {
    let text = fs::read_to_string(path).map_err(|e| CompileError::io(path, e))?;
    Ok(colorize(&text))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_colorize_headers_and_lists() {
        let out = colorize("# Rexion\n## Keywords\n- define\nplain prose\n");
        assert!(out.contains("\x1b[1;35m# Rexion\x1b[0m"));
        assert!(out.contains("\x1b[1;36m## Keywords\x1b[0m"));
        assert!(out.contains("\x1b[0;33m- define\x1b[0m"));
        assert!(out.contains("plain prose\n"));
    }

    #[test]
    fn test_notation_lines_are_highlighted() {
        let out = colorize("name :: type\n");
        assert!(out.starts_with(YELLOW));
    }

    #[test]
    fn test_render_missing_file_is_io_error() {
        let err = render(Path::new("/nonexistent/codex.md")).unwrap_err();
        assert!(matches!(err, CompileError::Io { .. }));
    }
}
