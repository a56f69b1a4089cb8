// Runtime settings read from the environment, the same way the rest of the
// tool avoids command-line flags. Only the push step needs them.

use anyhow::{bail, Result};
use std::env;
use std::path::PathBuf;

pub const MANAGER_SCRIPT: &str = "docassemble_playground_manager.py";
const SCRIPTS_DIR: &str = "python-scripts";
const APP_DIR: &str = "dll-push";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// Interpreter used for the version check and the manager script.
    pub python: String,
    pub manager_script: PathBuf,
}

impl Settings {
    /// Build settings from `DLL_PYTHON` and `DLL_PLAYGROUND_MANAGER`,
    /// falling back to the platform interpreter name and the bundled
    /// script locations.
    pub fn from_env() -> Result<Self> {
        let python = env::var("DLL_PYTHON").unwrap_or_else(|_| default_python().to_string());
        let manager_script = match env::var_os("DLL_PLAYGROUND_MANAGER") {
            Some(path) => PathBuf::from(path),
            None => locate_manager(&script_candidates())?,
        };
        Ok(Settings {
            python,
            manager_script,
        })
    }
}

pub fn default_python() -> &'static str {
    if cfg!(windows) {
        "python"
    } else {
        "python3"
    }
}

/// Next to the executable first, then the per-user data directory.
fn script_candidates() -> Vec<PathBuf> {
    let mut candidates = Vec::new();
    if let Some(dir) = env::current_exe().ok().and_then(|exe| exe.parent().map(PathBuf::from)) {
        candidates.push(dir.join(SCRIPTS_DIR).join(MANAGER_SCRIPT));
    }
    if let Some(data) = dirs::data_dir() {
        candidates.push(data.join(APP_DIR).join(SCRIPTS_DIR).join(MANAGER_SCRIPT));
    }
    candidates
}

fn locate_manager(candidates: &[PathBuf]) -> Result<PathBuf> {
    if let Some(found) = candidates.iter().find(|path| path.is_file()) {
        return Ok(found.clone());
    }
    let searched: Vec<String> = candidates.iter().map(|p| p.display().to_string()).collect();
    bail!(
        "Could not find {} (looked in: {}). Set DLL_PLAYGROUND_MANAGER to its path.",
        MANAGER_SCRIPT,
        searched.join(", ")
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn first_existing_candidate_wins() {
        let dir = tempdir().unwrap();
        let missing = dir.path().join("missing.py");
        let present = dir.path().join(MANAGER_SCRIPT);
        std::fs::write(&present, "print('hi')").unwrap();

        let found = locate_manager(&[missing, present.clone()]).unwrap();
        assert_eq!(found, present);
    }

    #[test]
    fn no_candidate_names_the_override() {
        let dir = tempdir().unwrap();
        let err = locate_manager(&[dir.path().join("nope.py")]).unwrap_err();
        assert!(err.to_string().contains("DLL_PLAYGROUND_MANAGER"));
    }
}
