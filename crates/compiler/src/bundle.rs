//! Macro bundle export
//!
//! `--export-macros <dir>` packages the current metadata file plus a fixed
//! set of documentation and icon resources into `<dir>/macro_bundle.zip`.
//! The metadata file is required; `README.md` and `icon.png` are optional
//! and skipped with a warning when absent. A `macro_bundle.json` manifest
//! (macro names and expansion line counts) is generated into the archive.

use crate::error::CompileError;
use crate::macros::MacroTable;
use serde::Serialize;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use zip::CompressionMethod;
use zip::write::FileOptions;

/// Archive file name inside the destination directory.
pub const BUNDLE_NAME: &str = "macro_bundle.zip";

/// Optional resources picked up from the working directory.
const OPTIONAL_RESOURCES: &[&str] = &["README.md", "icon.png"];

#[derive(Serialize)]
struct ManifestEntry {
    name: String,
    expansion_lines: usize,
}

#[derive(Serialize)]
struct Manifest {
    generator: String,
    macros: Vec<ManifestEntry>,
}

/// Export the bundle. Returns the path of the written archive.
pub fn export(table: &MacroTable, destination: &Path) -> Result<PathBuf, CompileError> {
    let meta_path = table.meta_path().ok_or_else(|| CompileError::Metadata {
        path: PathBuf::new(),
        message: "cannot export a bundle with no metadata file loaded".to_string(),
    })?;
    let meta_bytes = fs::read(meta_path).map_err(|e| CompileError::io(meta_path, e))?;

    fs::create_dir_all(destination).map_err(|e| CompileError::io(destination, e))?;
    let zip_path = destination.join(BUNDLE_NAME);
    let file = File::create(&zip_path).map_err(|e| CompileError::io(&zip_path, e))?;

    let mut archive = zip::ZipWriter::new(file);
    let options = FileOptions::default().compression_method(CompressionMethod::Deflated);
    let zip_err = |e: zip::result::ZipError| CompileError::Metadata {
        path: zip_path.clone(),
        message: format!("archive error: {}", e),
    };

    archive.start_file("macros.r4meta", options).map_err(zip_err)?;
    archive
        .write_all(&meta_bytes)
        .map_err(|e| CompileError::io(&zip_path, e))?;

    for resource in OPTIONAL_RESOURCES {
        match fs::read(resource) {
            Ok(bytes) => {
                archive.start_file(*resource, options).map_err(zip_err)?;
                archive
                    .write_all(&bytes)
                    .map_err(|e| CompileError::io(&zip_path, e))?;
            }
            Err(_) => warn!("bundle resource {} not found, skipping", resource),
        }
    }

    let manifest = Manifest {
        generator: format!("rexc {}", env!("CARGO_PKG_VERSION")),
        macros: table
            .iter()
            .map(|m| ManifestEntry {
                name: m.name.clone(),
                expansion_lines: m.expansion.lines().count(),
            })
            .collect(),
    };
    let manifest_json =
        serde_json::to_string_pretty(&manifest).map_err(|e| CompileError::Metadata {
            path: zip_path.clone(),
            message: format!("manifest serialization failed: {}", e),
        })?;
    archive
        .start_file("macro_bundle.json", options)
        .map_err(zip_err)?;
    archive
        .write_all(manifest_json.as_bytes())
        .map_err(|e| CompileError::io(&zip_path, e))?;

    archive.finish().map_err(zip_err)?;
    info!("macro bundle exported to {}", zip_path.display());
    Ok(zip_path)
}
