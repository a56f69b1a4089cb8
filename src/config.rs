// Project configuration stored next to the package being pushed:
// `<cwd>/dll_config/dll.config.json`. Holds named API keys and the
// playground projects used before. Key order is preserved so "the first
// key" means the first one written.

use anyhow::{Context, Result};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

pub const CONFIG_DIR: &str = "dll_config";
pub const CONFIG_FILE: &str = "dll.config.json";

const GITIGNORE_HEADER: &str = "# Digital Law Lab Config";
const GITIGNORE_RULE: &str = "dll_config/**";

/// Credentials for one Docassemble server.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ApiKey {
    pub api_key: String,
    pub api_root: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct DllConfig {
    #[serde(rename = "API_keys", default)]
    pub api_keys: IndexMap<String, ApiKey>,
    #[serde(rename = "DA_playground_projects", default)]
    pub projects: Vec<String>,
}

impl DllConfig {
    pub fn add_api_key(&mut self, name: &str, key: ApiKey) {
        self.api_keys.insert(name.to_string(), key);
    }

    /// Adds a project name unless it is already listed.
    pub fn add_project(&mut self, name: &str) {
        if !self.projects.iter().any(|p| p == name) {
            self.projects.push(name.to_string());
        }
    }

    pub fn key_names(&self) -> Vec<&str> {
        self.api_keys.keys().map(String::as_str).collect()
    }

    pub fn first_key_name(&self) -> Option<&str> {
        self.api_keys.keys().next().map(String::as_str)
    }

    pub fn key(&self, name: &str) -> Option<&ApiKey> {
        self.api_keys.get(name)
    }
}

/// Location of the config file for one working directory.
#[derive(Debug, Clone)]
pub struct ConfigStore {
    dir: PathBuf,
}

impl ConfigStore {
    pub fn new(cwd: &Path) -> Self {
        Self {
            dir: cwd.join(CONFIG_DIR),
        }
    }

    /// Directory holding the config and the temporary secrets file.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path(&self) -> PathBuf {
        self.dir.join(CONFIG_FILE)
    }

    /// Returns `None` when no config file exists yet.
    pub fn load(&self) -> Result<Option<DllConfig>> {
        let path = self.path();
        if !path.is_file() {
            return Ok(None);
        }
        let data = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let config = serde_json::from_str(&data)
            .with_context(|| format!("Failed to parse {}", path.display()))?;
        Ok(Some(config))
    }

    pub fn save(&self, config: &DllConfig) -> Result<()> {
        fs::create_dir_all(&self.dir)
            .with_context(|| format!("Failed to create {}", self.dir.display()))?;
        let json = serde_json::to_string_pretty(config).context("Serializing config")?;
        let path = self.path();
        fs::write(&path, json).with_context(|| format!("Failed to write {}", path.display()))?;
        Ok(())
    }
}

/// Makes sure `.gitignore` in `cwd` keeps the config (and the API keys in
/// it) out of version control. Returns whether the file was changed.
pub fn ensure_gitignore(cwd: &Path) -> Result<bool> {
    let path = cwd.join(".gitignore");
    let existing = match fs::read_to_string(&path) {
        Ok(text) => text,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => String::new(),
        Err(e) => {
            return Err(e).with_context(|| format!("Failed to read {}", path.display()));
        }
    };
    if existing.lines().any(|line| line.trim() == GITIGNORE_RULE) {
        return Ok(false);
    }

    let mut file = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .with_context(|| format!("Failed to open {}", path.display()))?;
    write!(file, "\n{}\n{}\n", GITIGNORE_HEADER, GITIGNORE_RULE)
        .with_context(|| format!("Failed to append to {}", path.display()))?;
    Ok(true)
}
