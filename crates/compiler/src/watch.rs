//! Macro hot-reload watcher
//!
//! An optional background notifier that re-reads the `.r4meta` file when it
//! changes on disk. The reload goes through [`crate::macros::reload_shared`],
//! which parses the replacement table before taking the write lock, so
//! concurrent `expand` readers observe either the old table or the new one
//! and never a partial state.
//!
//! The notification source is abstract at the seam: anything that can call
//! `reload_shared` works. This implementation uses the `notify` crate's
//! recommended platform watcher. Dropping the [`MacroWatcher`] handle stops
//! the watcher; the table is left in its last consistent state.

use crate::error::CompileError;
use crate::macros::{SharedMacroTable, reload_shared};
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Handle owning the background watcher. Keep it alive for as long as
/// reloads should happen.
#[derive(Debug)]
pub struct MacroWatcher {
    // Held for its Drop: dropping the watcher deregisters the watch and
    // stops event delivery.
    _watcher: RecommendedWatcher,
    path: PathBuf,
}

impl MacroWatcher {
    /// Watch the table's backing metadata file for modifications.
    ///
    /// Fails if the table has no backing file or the path cannot be
    /// registered with the platform notifier.
    pub fn spawn(table: SharedMacroTable) -> Result<MacroWatcher, CompileError> {
        let path = {
            let guard = table.read().map_err(|_| CompileError::Metadata {
                path: PathBuf::new(),
                message: "macro table lock poisoned".to_string(),
            })?;
            guard.meta_path().map(Path::to_path_buf)
        };
        let Some(path) = path else {
            return Err(CompileError::Metadata {
                path: PathBuf::new(),
                message: "cannot watch a macro table with no metadata file".to_string(),
            });
        };

        let shared_table = table.clone();
        let banner_path = path.clone();
        let mut watcher = notify::recommended_watcher(move |res: notify::Result<Event>| {
            match res {
                Ok(event) => {
                    if matches!(
                        event.kind,
                        EventKind::Modify(_) | EventKind::Create(_) | EventKind::Any
                    ) {
                        info!("macro metadata changed, reloading");
                        reload_shared(&shared_table);
                        eprint!("{}", crate::trace::reload_banner(&banner_path));
                    }
                }
                Err(e) => warn!("macro watcher error: {}", e),
            }
        })
        .map_err(|e| CompileError::Metadata {
            path: path.clone(),
            message: format!("failed to create watcher: {}", e),
        })?;

        watcher
            .watch(&path, RecursiveMode::NonRecursive)
            .map_err(|e| CompileError::Metadata {
                path: path.clone(),
                message: format!("failed to watch metadata file: {}", e),
            })?;

        info!("watching {} for macro changes", path.display());
        Ok(MacroWatcher {
            _watcher: watcher,
            path,
        })
    }

    /// The watched metadata path.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::macros::{MacroTable, shared};

    #[test]
    fn test_spawn_requires_backing_file() {
        let table = shared(MacroTable::new());
        let err = MacroWatcher::spawn(table).unwrap_err();
        assert!(err.to_string().contains("no metadata file"));
    }

    #[test]
    fn test_spawn_on_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("macros.r4meta");
        std::fs::write(&path, r#"{"macros":[]}"#).unwrap();
        let table = shared(MacroTable::load(&path));
        let watcher = MacroWatcher::spawn(table).unwrap();
        assert_eq!(watcher.path(), path.as_path());
        // Dropping the handle stops the watcher without poisoning the table.
        drop(watcher);
    }

    #[test]
    #[serial_test::serial]
    fn test_modification_triggers_live_reload() {
        use std::time::{Duration, Instant};

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("macros.r4meta");
        std::fs::write(&path, r#"{"macros":[{"name":"A","expansion":"one"}]}"#).unwrap();
        let table = shared(MacroTable::load(&path));
        let _watcher = MacroWatcher::spawn(table.clone()).unwrap();

        std::fs::write(&path, r#"{"macros":[{"name":"A","expansion":"two"}]}"#).unwrap();

        // Platform notifiers deliver asynchronously; poll with a generous
        // deadline.
        let deadline = Instant::now() + Duration::from_secs(10);
        loop {
            {
                let guard = table.read().unwrap();
                if guard.expand("A") == Some("two") {
                    return;
                }
            }
            assert!(
                Instant::now() < deadline,
                "watcher did not reload the table in time"
            );
            std::thread::sleep(Duration::from_millis(50));
        }
    }
}
