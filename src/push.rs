// Push runner: hands the chosen folder to the Docassemble playground
// manager script. The script expects a secrets file rather than a bare key,
// so one is written next to the config for the duration of the run.

use anyhow::{anyhow, bail, Context, Result};
use crossterm::style::Stylize;
use indicatif::{ProgressBar, ProgressStyle};
use std::collections::BTreeMap;
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::Duration;
use tempfile::TempPath;

use crate::config::ApiKey;
use crate::settings::Settings;

pub const SECRETS_FILE: &str = "secrets.json";

/// Everything the wizard collected for one push.
#[derive(Debug, Clone)]
pub struct PushRequest {
    pub key_name: String,
    pub key: ApiKey,
    pub project: String,
    pub package: PathBuf,
}

/// What the manager script reported besides success.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ScriptReport {
    pub output: String,
    pub warning: Option<String>,
    pub debug: Option<String>,
}

/// Sort the script's output. The script logs through stderr, so an
/// `ERROR` there is a failed push even when the exit status is zero.
pub fn classify_output(stdout: &str, stderr: &str) -> Result<ScriptReport> {
    if stderr.trim().is_empty() {
        return Ok(ScriptReport {
            output: stdout.trim_end().to_string(),
            ..Default::default()
        });
    }
    if stderr.contains("ERROR") {
        bail!("{}", stderr.trim_end());
    }

    let mut report = ScriptReport::default();
    if stderr.contains("DEBUG") {
        report.debug = Some(stderr.trim_end().to_string());
    }
    if stderr.contains("WARNING") {
        report.warning = Some(stderr.trim_end().to_string());
    } else {
        report.output = stderr.trim_end().to_string();
    }
    Ok(report)
}

pub fn manager_args(script: &Path, secrets: &Path, request: &PushRequest) -> Vec<OsString> {
    vec![
        script.into(),
        "--secrets_file".into(),
        secrets.into(),
        "--secret".into(),
        request.key_name.clone().into(),
        "--push".into(),
        "--project".into(),
        request.project.clone().into(),
        "--package".into(),
        request.package.clone().into(),
    ]
}

/// Writes the secrets file the manager script reads. The returned
/// `TempPath` deletes it when dropped, whether or not the push went through.
pub fn write_secrets(dir: &Path, key_name: &str, key: &ApiKey) -> Result<TempPath> {
    fs::create_dir_all(dir).with_context(|| format!("Failed to create {}", dir.display()))?;
    let path = dir.join(SECRETS_FILE);
    let mut secrets = BTreeMap::new();
    secrets.insert(key_name, key);
    let body = serde_json::to_string_pretty(&secrets).context("Serializing secrets")?;
    fs::write(&path, body).with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(TempPath::from_path(path))
}

/// Runs the push as a fixed sequence of tasks, one spinner each.
pub struct Pusher {
    settings: Settings,
    secrets_dir: PathBuf,
}

impl Pusher {
    pub fn new(settings: Settings, secrets_dir: &Path) -> Self {
        Pusher {
            settings,
            secrets_dir: secrets_dir.to_path_buf(),
        }
    }

    pub fn push(&self, request: &PushRequest) -> Result<ScriptReport> {
        run_task("Checking python installation", || {
            let version = self.python_version().map_err(|e| {
                anyhow!("Couldn't run python, make sure it is installed and accessible! ({})", e)
            })?;
            Ok(((), format!("{} was found", version)))
        })?;

        let secrets = run_task("Creating a temporary `secrets.json`", || {
            let secrets = write_secrets(&self.secrets_dir, &request.key_name, &request.key)?;
            Ok((secrets, "File created successfully".to_string()))
        })?;

        let report = run_task("Running `docassemble_playground_manager.py`", || {
            let report = self.run_manager(&secrets, request)?;
            let detail = report.output.clone();
            Ok((report, detail))
        })?;

        run_task("Cleaning up temporary residues", || {
            secrets.close().context("Failed to remove secrets.json")?;
            Ok(((), String::new()))
        })?;

        Ok(report)
    }

    fn python_version(&self) -> Result<String> {
        log::debug!("running {} --version", self.settings.python);
        let out = Command::new(&self.settings.python)
            .arg("--version")
            .output()
            .with_context(|| format!("Failed to start {}", self.settings.python))?;
        if !out.status.success() {
            bail!("{} --version exited with {}", self.settings.python, out.status);
        }
        // Python 2 prints its version to stderr
        let stdout = String::from_utf8_lossy(&out.stdout);
        let text = if stdout.trim().is_empty() {
            String::from_utf8_lossy(&out.stderr).trim().to_string()
        } else {
            stdout.trim().to_string()
        };
        Ok(text)
    }

    fn run_manager(&self, secrets: &Path, request: &PushRequest) -> Result<ScriptReport> {
        let args = manager_args(&self.settings.manager_script, secrets, request);
        log::debug!("running {} {:?}", self.settings.python, args);
        let out = Command::new(&self.settings.python)
            .args(&args)
            .output()
            .context("Failed to run the script")?;
        let stdout = String::from_utf8_lossy(&out.stdout);
        let stderr = String::from_utf8_lossy(&out.stderr);
        if !out.status.success() {
            bail!(
                "Failed to run the script ({}): {}",
                out.status,
                stderr.trim_end()
            );
        }
        classify_output(&stdout, &stderr)
    }
}

/// Shows `title` with a spinner while `f` runs, then marks it green or red.
/// `f` returns its value plus a detail line printed under the title.
fn run_task<T>(title: &str, f: impl FnOnce() -> Result<(T, String)>) -> Result<T> {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(ProgressStyle::with_template("{spinner} {msg}")?);
    spinner.set_message(title.to_string());
    spinner.enable_steady_tick(Duration::from_millis(100));

    match f() {
        Ok((value, detail)) => {
            spinner.finish_with_message(finished_message(title, &detail));
            Ok(value)
        }
        Err(e) => {
            spinner.abandon_with_message(title.red().to_string());
            Err(e)
        }
    }
}

fn finished_message(title: &str, detail: &str) -> String {
    let mut msg = title.green().to_string();
    if !detail.is_empty() {
        msg.push_str(&format!("\n    {}", detail));
    }
    msg
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn request() -> PushRequest {
        PushRequest {
            key_name: "dev_api_key".into(),
            key: ApiKey {
                api_key: "abc123".into(),
                api_root: "https://dev.dll.org.au/da/api".into(),
            },
            project: "Intake".into(),
            package: PathBuf::from("/work/docassemble-intake"),
        }
    }

    #[test]
    fn clean_run_reports_stdout() {
        let report = classify_output("pushed 3 files\n", "").unwrap();
        assert_eq!(report.output, "pushed 3 files");
        assert!(report.warning.is_none() && report.debug.is_none());
    }

    #[test]
    fn error_on_stderr_fails_the_push() {
        let err = classify_output("", "ERROR: bad key").unwrap_err();
        assert!(err.to_string().contains("bad key"));
    }

    #[test]
    fn warnings_and_debug_are_kept_apart_from_output() {
        let report = classify_output("", "WARNING: no static folder").unwrap();
        assert_eq!(report.warning.as_deref(), Some("WARNING: no static folder"));
        assert!(report.output.is_empty());

        let report = classify_output("", "DEBUG: sending x").unwrap();
        assert_eq!(report.debug.as_deref(), Some("DEBUG: sending x"));
        assert_eq!(report.output, "DEBUG: sending x");
    }

    #[test]
    fn other_stderr_becomes_output() {
        let report = classify_output("ignored", "Uploading questions\n").unwrap();
        assert_eq!(report.output, "Uploading questions");
    }

    #[test]
    fn finished_task_is_the_coloured_title_and_detail() {
        let msg = finished_message("Pushing", "Uploaded 3 files");
        assert_eq!(msg, format!("{}\n    Uploaded 3 files", "Pushing".green()));
        assert_eq!(finished_message("Pushing", ""), "Pushing".green().to_string());
    }

    #[test]
    fn manager_arguments_in_order() {
        let args = manager_args(Path::new("m.py"), Path::new("s.json"), &request());
        let args: Vec<String> = args
            .iter()
            .map(|a| a.to_string_lossy().into_owned())
            .collect();
        assert_eq!(
            args,
            vec![
                "m.py",
                "--secrets_file",
                "s.json",
                "--secret",
                "dev_api_key",
                "--push",
                "--project",
                "Intake",
                "--package",
                "/work/docassemble-intake",
            ]
        );
    }

    #[test]
    fn secrets_file_holds_the_named_key_and_is_removed_on_drop() {
        let dir = tempdir().unwrap();
        let req = request();
        let path = {
            let secrets = write_secrets(dir.path(), &req.key_name, &req.key).unwrap();
            assert_eq!(secrets.to_path_buf(), dir.path().join(SECRETS_FILE));
            let written: serde_json::Value =
                serde_json::from_str(&fs::read_to_string(&secrets).unwrap()).unwrap();
            assert_eq!(written["dev_api_key"]["api_key"], "abc123");
            assert_eq!(written["dev_api_key"]["api_root"], "https://dev.dll.org.au/da/api");
            secrets.to_path_buf()
        };
        assert!(!path.exists());
    }

    #[test]
    fn closing_the_secrets_file_deletes_it() {
        let dir = tempdir().unwrap();
        let req = request();
        let secrets = write_secrets(dir.path(), &req.key_name, &req.key).unwrap();
        let path = secrets.to_path_buf();
        secrets.close().unwrap();
        assert!(!path.exists());
    }
}
