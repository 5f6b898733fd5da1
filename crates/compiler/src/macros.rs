//! Macro table, `.r4meta` loading, and `.r4` -> `.rexasm` rewriting
//!
//! The metadata file is a JSON document shaped
//! `{ "macros": [ { "name": str, "expansion": str }, ... ] }`. Expansions
//! are stored verbatim and never rewritten by the expander.
//!
//! A macro invocation is a source line whose only content is `|NAME|`
//! (matched with `^\|([A-Za-z0-9_]+)\|\s*$`). The rewriter replaces such a
//! line with a comment identifying the macro followed by the expansion;
//! every other line passes through byte-for-byte, trailing newline
//! included. An invocation of an unknown macro becomes a single
//! commented-out marker and rewriting continues.

use crate::error::CompileError;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, LazyLock, RwLock};
use tracing::{info, warn};

/// Macro invocation line pattern.
static INVOCATION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\|([A-Za-z0-9_]+)\|\s*$").expect("invocation pattern is valid")
});

/// If `line` is a macro invocation, the macro name.
pub fn invocation_name(line: &str) -> Option<&str> {
    INVOCATION
        .captures(line)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

/// One `name -> expansion` entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MacroDef {
    pub name: String,
    pub expansion: String,
}

#[derive(Debug, Deserialize)]
struct MetaFile {
    macros: Vec<MacroDef>,
}

/// The macro table, insertion-ordered.
#[derive(Debug, Clone, Default)]
pub struct MacroTable {
    macros: Vec<MacroDef>,
    /// The metadata file the table was loaded from, kept for `reload` and
    /// bundle export.
    meta_path: Option<PathBuf>,
}

impl MacroTable {
    pub fn new() -> Self {
        MacroTable::default()
    }

    /// Load the table from a `.r4meta` file.
    ///
    /// A missing or malformed file logs a warning and yields an *empty*
    /// table (with the path remembered, so a later `reload` can pick up a
    /// fixed file). This is deliberately non-fatal: compilation without
    /// macros is still useful.
    pub fn load(meta_path: impl Into<PathBuf>) -> Self {
        let meta_path = meta_path.into();
        let macros = match Self::read_meta(&meta_path) {
            Ok(macros) => {
                info!("loaded {} macros from {}", macros.len(), meta_path.display());
                macros
            }
            Err(message) => {
                warn!("{}: {} (macro table left empty)", meta_path.display(), message);
                Vec::new()
            }
        };
        MacroTable {
            macros,
            meta_path: Some(meta_path),
        }
    }

    fn read_meta(path: &Path) -> Result<Vec<MacroDef>, String> {
        let text = fs::read_to_string(path).map_err(|e| e.to_string())?;
        let parsed: MetaFile = serde_json::from_str(&text).map_err(|e| e.to_string())?;
        Ok(parsed.macros)
    }

    /// Re-read the backing metadata file. On any failure the existing
    /// entries are kept and a warning is logged, so readers never observe
    /// a half-loaded table.
    pub fn reload(&mut self) {
        let Some(path) = self.meta_path.clone() else {
            warn!("reload requested but no metadata file is associated");
            return;
        };
        match Self::read_meta(&path) {
            Ok(macros) => {
                info!("reloaded {} macros from {}", macros.len(), path.display());
                self.macros = macros;
            }
            Err(message) => {
                warn!(
                    "{}: {} (keeping previous {} macros)",
                    path.display(),
                    message,
                    self.macros.len()
                );
            }
        }
    }

    /// The stored expansion for `name`, verbatim.
    pub fn expand(&self, name: &str) -> Option<&str> {
        self.macros
            .iter()
            .find(|m| m.name == name)
            .map(|m| m.expansion.as_str())
    }

    pub fn meta_path(&self) -> Option<&Path> {
        self.meta_path.as_deref()
    }

    pub fn iter(&self) -> impl Iterator<Item = &MacroDef> {
        self.macros.iter()
    }

    pub fn len(&self) -> usize {
        self.macros.len()
    }

    pub fn is_empty(&self) -> bool {
        self.macros.is_empty()
    }
}

/// Shared handle for the hot-reload discipline: many concurrent `expand`
/// readers, at most one reload writer (see [`crate::watch`]).
pub type SharedMacroTable = Arc<RwLock<MacroTable>>;

pub fn shared(table: MacroTable) -> SharedMacroTable {
    Arc::new(RwLock::new(table))
}

/// Reload a shared table. The replacement entries are parsed *before* the
/// write lock is taken, so readers see either the old table or the new one,
/// never a partial state.
pub fn reload_shared(table: &SharedMacroTable) {
    let meta_path = match table.read() {
        Ok(guard) => guard.meta_path().map(Path::to_path_buf),
        Err(_) => None,
    };
    let Some(path) = meta_path else {
        warn!("reload requested but no metadata file is associated");
        return;
    };
    match MacroTable::read_meta(&path) {
        Ok(macros) => {
            if let Ok(mut guard) = table.write() {
                let count = macros.len();
                *guard = MacroTable {
                    macros,
                    meta_path: Some(path.clone()),
                };
                info!("reloaded {} macros from {}", count, path.display());
            }
        }
        Err(message) => {
            warn!("{}: {} (keeping previous table)", path.display(), message);
        }
    }
}

/// The `--complete-macros` trace view: every macro name with its expansion.
pub fn listing(table: &MacroTable) -> String {
    if table.is_empty() {
        return String::from("(no macros loaded)\n");
    }
    let mut out = String::new();
    for def in table.iter() {
        out.push_str(&format!("|{}|\n{}\n\n", def.name, def.expansion));
    }
    out
}

/// Rewrite one `.r4` file into `.rexasm` form, expanding invocation lines.
pub fn rewrite(table: &MacroTable, input: &Path, output: &Path) -> Result<(), CompileError> {
    let source = fs::read_to_string(input).map_err(|e| CompileError::io(input, e))?;
    let rewritten = rewrite_text(table, &source);
    fs::write(output, rewritten).map_err(|e| CompileError::io(output, e))?;
    info!("rewrote {} -> {}", input.display(), output.display());
    Ok(())
}

/// The rewrite itself, on in-memory text. Non-invocation lines are copied
/// byte-for-byte, trailing newline included.
pub fn rewrite_text(table: &MacroTable, source: &str) -> String {
    let mut out = String::with_capacity(source.len());
    for line in source.split_inclusive('\n') {
        match invocation_name(line) {
            Some(name) => match table.expand(name) {
                Some(expansion) => {
                    out.push_str(&format!(";; [Macro: {}]\n{}\n", name, expansion));
                }
                None => {
                    warn!("unknown macro |{}|", name);
                    out.push_str(&format!(";; [Unknown macro: {}]\n", name));
                }
            },
            None => out.push_str(line),
        }
    }
    out
}

/// Rewrite every `*.r4` file directly inside `src_dir` into a `.rexasm`
/// file of the same stem in `out_dir` (created if absent). Files are
/// processed sequentially; returns how many were rewritten.
pub fn batch_rewrite(
    table: &MacroTable,
    src_dir: &Path,
    out_dir: &Path,
) -> Result<usize, CompileError> {
    fs::create_dir_all(out_dir).map_err(|e| CompileError::io(out_dir, e))?;
    let entries = fs::read_dir(src_dir).map_err(|e| CompileError::io(src_dir, e))?;
    let mut count = 0;
    for entry in entries {
        let entry = entry.map_err(|e| CompileError::io(src_dir, e))?;
        let path = entry.path();
        if path.extension().is_some_and(|ext| ext == "r4") && path.is_file() {
            let renamed = path.with_extension("rexasm");
            let Some(file_name) = renamed.file_name() else {
                continue;
            };
            let output = out_dir.join(file_name);
            info!("batch: {} -> {}", path.display(), output.display());
            rewrite(table, &path, &output)?;
            count += 1;
        }
    }
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    const META: &str = r#"{
        "macros": [
            { "name": "ADDXY",
              "expansion": "LOAD R1, x\nLOAD R2, y\nADD R3, R1\nADD R3, R2\nSTORE result, R3" },
            { "name": "HELLOPRINT",
              "expansion": "LOAD R1, 'Hello, Rexion!'\nPRINT R1" }
        ]
    }"#;

    fn table_from(meta: &str) -> MacroTable {
        let dir = tempdir().unwrap();
        let path = dir.path().join("macros.r4meta");
        fs::write(&path, meta).unwrap();
        MacroTable::load(&path)
    }

    #[test]
    fn test_invocation_pattern() {
        assert_eq!(invocation_name("|ADDXY|"), Some("ADDXY"));
        assert_eq!(invocation_name("|ADDXY|\n"), Some("ADDXY"));
        assert_eq!(invocation_name("|ADDXY|   \n"), Some("ADDXY"));
        assert_eq!(invocation_name("|ADD XY|"), None);
        assert_eq!(invocation_name("  |ADDXY|"), None);
        assert_eq!(invocation_name("|ADDXY| trailing"), None);
        assert_eq!(invocation_name("plain line"), None);
    }

    #[test]
    fn test_load_and_expand() {
        let table = table_from(META);
        assert_eq!(table.len(), 2);
        assert!(table.expand("ADDXY").unwrap().starts_with("LOAD R1, x"));
        assert_eq!(table.expand("NOT_DEFINED"), None);
    }

    #[test]
    fn test_missing_file_yields_empty_table() {
        let table = MacroTable::load("/nonexistent/macros.r4meta");
        assert!(table.is_empty());
        assert!(table.meta_path().is_some());
    }

    #[test]
    fn test_malformed_json_yields_empty_table() {
        let table = table_from("{ not json");
        assert!(table.is_empty());
    }

    #[test]
    fn test_expansions_are_stored_verbatim() {
        let table = table_from(r#"{"macros":[{"name":"M","expansion":"  keep   spacing\n\n"}]}"#);
        assert_eq!(table.expand("M"), Some("  keep   spacing\n\n"));
    }

    #[test]
    fn test_rewrite_expands_known_macro() {
        let table = table_from(META);
        let out = rewrite_text(&table, "|ADDXY|\n");
        assert_eq!(
            out,
            ";; [Macro: ADDXY]\nLOAD R1, x\nLOAD R2, y\nADD R3, R1\nADD R3, R2\nSTORE result, R3\n"
        );
    }

    #[test]
    fn test_rewrite_marks_unknown_macro() {
        let table = table_from(META);
        let out = rewrite_text(&table, "before\n|NOT_DEFINED|\nafter\n");
        assert_eq!(out, "before\n;; [Unknown macro: NOT_DEFINED]\nafter\n");
    }

    #[test]
    fn test_non_invocation_lines_pass_through_byte_for_byte() {
        let table = table_from(META);
        let source = "define x : int;\n  |not quite\nlast line without newline";
        assert_eq!(rewrite_text(&table, source), source);
    }

    #[test]
    fn test_reload_picks_up_changes() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("macros.r4meta");
        fs::write(&path, r#"{"macros":[{"name":"A","expansion":"one"}]}"#).unwrap();
        let mut table = MacroTable::load(&path);
        assert_eq!(table.expand("A"), Some("one"));

        fs::write(&path, r#"{"macros":[{"name":"A","expansion":"two"}]}"#).unwrap();
        table.reload();
        assert_eq!(table.expand("A"), Some("two"));
    }

    #[test]
    fn test_reload_keeps_table_on_broken_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("macros.r4meta");
        fs::write(&path, r#"{"macros":[{"name":"A","expansion":"one"}]}"#).unwrap();
        let shared_table = shared(MacroTable::load(&path));

        fs::write(&path, "{ broken").unwrap();
        reload_shared(&shared_table);
        let guard = shared_table.read().unwrap();
        assert_eq!(guard.expand("A"), Some("one"));
    }

    #[test]
    fn test_reload_shared_swaps_whole_table() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("macros.r4meta");
        fs::write(&path, r#"{"macros":[{"name":"A","expansion":"one"}]}"#).unwrap();
        let shared_table = shared(MacroTable::load(&path));

        fs::write(
            &path,
            r#"{"macros":[{"name":"B","expansion":"two"},{"name":"C","expansion":"three"}]}"#,
        )
        .unwrap();
        reload_shared(&shared_table);
        let guard = shared_table.read().unwrap();
        assert_eq!(guard.expand("A"), None);
        assert_eq!(guard.expand("B"), Some("two"));
        assert_eq!(guard.len(), 2);
    }

    #[test]
    fn test_batch_rewrite_maps_extensions() {
        let table = table_from(META);
        let dir = tempdir().unwrap();
        let src = dir.path().join("src");
        let out = dir.path().join("build");
        fs::create_dir(&src).unwrap();
        fs::write(src.join("hello.r4"), "|HELLOPRINT|\n").unwrap();
        fs::write(src.join("plain.r4"), "define x : int;\n").unwrap();
        fs::write(src.join("ignored.txt"), "not a source file\n").unwrap();

        let count = batch_rewrite(&table, &src, &out).unwrap();
        assert_eq!(count, 2);
        assert!(out.join("hello.rexasm").exists());
        assert!(out.join("plain.rexasm").exists());
        assert!(!out.join("ignored.rexasm").exists());
        let hello = fs::read_to_string(out.join("hello.rexasm")).unwrap();
        assert!(hello.starts_with(";; [Macro: HELLOPRINT]\n"));
    }
}
