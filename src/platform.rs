//! Where the journal lives on disk.
//!
//! The state directory is picked from a fallback chain so the journal still
//! works when the home directory is read-only (sandboxes, CI, containers).

use crate::config::APP_DIR;
use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// First writable directory out of:
/// 1. `override_dir` (config `state.state_dir_override`, used by tests)
/// 2. `~/.symptomly`
/// 3. the platform data directory (`~/.local/share/symptomly` on Linux,
///    `Application Support` on macOS, `AppData\Local` on Windows)
/// 4. `./.symptomly`
pub fn get_state_dir(override_dir: Option<&PathBuf>) -> Result<PathBuf> {
    if let Some(dir) = override_dir {
        ensure_writable(dir)?;
        return Ok(dir.clone());
    }

    let candidates = home::home_dir()
        .map(|home| home.join(APP_DIR))
        .into_iter()
        .chain(dirs::data_local_dir().map(|data| data.join("symptomly")));
    for dir in candidates {
        match ensure_writable(&dir) {
            Ok(()) => return Ok(dir),
            Err(err) => {
                tracing::warn!(dir = %dir.display(), error = %err, "state directory not usable")
            }
        }
    }

    let dir = PathBuf::from(APP_DIR);
    ensure_writable(&dir).context(
        "Cannot create state directory in any location. \
         Check file permissions or set state.state_dir_override in config.",
    )?;
    Ok(dir)
}

/// Create `dir` if needed and prove it accepts writes.
pub fn ensure_writable(dir: &Path) -> Result<()> {
    fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create directory: {}", dir.display()))?;

    let marker = dir.join(".write_test");
    fs::write(&marker, b"ok")
        .with_context(|| format!("Directory {} is not writable", dir.display()))?;
    // Removal can fail on Windows while a scanner holds the file
    let _ = fs::remove_file(&marker);

    Ok(())
}

/// Lock file and journal file inside the state directory.
pub fn journal_paths(state_dir_override: Option<&PathBuf>) -> Result<(PathBuf, PathBuf)> {
    let state_dir = get_state_dir(state_dir_override)?;
    Ok((state_dir.join("journal.lock"), state_dir.join("journal.json")))
}
