//! Macro trace banners
//!
//! Small ANSI-colored banners shown around macro hot-reload activity so a
//! live session can see when the table changes under it.

use std::path::Path;

const CYAN_BOLD: &str = "\x1b[1;36m";
const YELLOW_BOLD: &str = "\x1b[1;33m";
const BLUE_BOLD: &str = "\x1b[1;34m";
const RESET: &str = "\x1b[0m";

/// Banner shown when macro tracing starts on a metadata file.
pub fn watch_banner(meta_path: &Path) -> String {
    format!(
        "{}============================\n\
         MACRO TRACE ACTIVE\n\
         Loaded: {}\n\
         ============================{}\n",
        CYAN_BOLD,
        meta_path.display(),
        RESET
    )
}

/// One-liner shown on every live reload.
pub fn reload_banner(meta_path: &Path) -> String {
    format!(
        "{}[MacroTrace]{} {}live macro reload from {}{}\n",
        BLUE_BOLD,
        RESET,
        YELLOW_BOLD,
        meta_path.display(),
        RESET
    )
}
