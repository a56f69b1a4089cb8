// UI layer: the interactive wizard built on `dialoguer`.
// It creates the config file when there is none, asks which project, key
// and folder to push, and then hands the answers to the push runner.

use anyhow::{Context, Result};
use crossterm::style::Stylize;
use dialoguer::{Confirm, FuzzySelect, Input, Password, Select};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;

use crate::cache::ResultCache;
use crate::config::{ensure_gitignore, ApiKey, ConfigStore, DllConfig, CONFIG_DIR, CONFIG_FILE};
use crate::push::{PushRequest, Pusher, ScriptReport};
use crate::settings::Settings;
use crate::validate;
use crate::walk::{walk, TraversalOptions};

pub const API_ROOTS: [&str; 2] = ["https://dev.dll.org.au/da/api", "https://app.dll.org.au/da/api"];

const SOMETHING_ELSE: &str = "Something else..";
const NEW_PROJECT: &str = "A new one..";
const NEW_KEY: &str = "A new key..";
/// Name used for a key that was typed in but not saved to the config.
const UNSAVED_KEY_NAME: &str = "dll_api_key";

/// Interactive session for one working directory. Owns the walk cache so
/// repeated project-name prompts reuse the first walk.
pub struct Wizard {
    cwd: PathBuf,
    store: ConfigStore,
    suggestions: ResultCache,
}

impl Wizard {
    pub fn new(cwd: &Path) -> Self {
        Wizard {
            cwd: cwd.to_path_buf(),
            store: ConfigStore::new(cwd),
            suggestions: ResultCache::new(),
        }
    }

    /// Runs the whole flow: config creation if needed, push questions, push.
    pub fn run(&mut self, settings: Settings) -> Result<()> {
        let mut config = self.store.load()?;
        if config.is_none() {
            config = self.create_config()?;
        }

        let request = self.collect_push(config.as_mut())?;
        let pusher = Pusher::new(settings, self.store.dir());
        let report = pusher.push(&request)?;
        print_report(&report);
        Ok(())
    }

    /// Asks whether to create a config file and, if so, fills and saves it.
    fn create_config(&mut self) -> Result<Option<DllConfig>> {
        let create = Confirm::new()
            .with_prompt(format!(
                "We couldn't locate a {} file for this project, would you like to create one?",
                CONFIG_FILE.yellow().bold()
            ))
            .interact()?;
        if !create {
            return Ok(None);
        }

        let mut config = DllConfig::default();
        let (name, key) = ask_named_key("dev_api_key")?;
        config.add_api_key(&name, key);
        while Confirm::new()
            .with_prompt("Add another key?")
            .default(false)
            .interact()?
        {
            let (name, key) = ask_named_key("production_api_key")?;
            config.add_api_key(&name, key);
        }

        let project = self.ask_project_name()?;
        config.add_project(&project);
        while Confirm::new()
            .with_prompt("Add another playground project name?")
            .default(false)
            .interact()?
        {
            let project = self.ask_project_name()?;
            config.add_project(&project);
        }

        println!(
            "Your configuration file will be saved at `{}`",
            Path::new(".").join(CONFIG_DIR).join(CONFIG_FILE).display()
        );
        thread::sleep(Duration::from_millis(400));

        let spinner = ProgressBar::new_spinner();
        spinner.set_style(ProgressStyle::with_template("{spinner} {msg}")?);
        spinner.set_message(format!("{} {}", "CREATING".blue(), CONFIG_FILE));
        spinner.enable_steady_tick(Duration::from_millis(100));

        let saved = self
            .store
            .save(&config)
            .and_then(|()| ensure_gitignore(&self.cwd).map(|_| ()));
        match saved {
            Ok(()) => spinner.finish_with_message(format!(
                "{} {} successfully",
                "CREATED".blue(),
                CONFIG_FILE
            )),
            Err(e) => {
                spinner.abandon_with_message(format!(
                    "{} to create config file",
                    "FAILED".red()
                ));
                return Err(e);
            }
        }
        Ok(Some(config))
    }

    fn collect_push(&mut self, mut config: Option<&mut DllConfig>) -> Result<PushRequest> {
        let project = match config.as_deref() {
            Some(cfg) if !cfg.projects.is_empty() => {
                let mut items = cfg.projects.clone();
                items.push(NEW_PROJECT.to_string());
                let choice = FuzzySelect::new()
                    .with_prompt("Which playground project do you want to push to?")
                    .items(&items)
                    .default(0)
                    .interact()?;
                if items[choice] == NEW_PROJECT {
                    self.ask_project_name()?
                } else {
                    items[choice].clone()
                }
            }
            _ => self.ask_project_name()?,
        };

        let (key_name, key) = match config.as_deref_mut() {
            Some(cfg) => self.choose_key(cfg)?,
            None => (UNSAVED_KEY_NAME.to_string(), ask_key()?),
        };

        let package = self.ask_folder()?;
        Ok(PushRequest {
            key_name,
            key,
            project,
            package,
        })
    }

    /// Picks a key from the config, or takes a new one and optionally saves it.
    fn choose_key(&self, config: &mut DllConfig) -> Result<(String, ApiKey)> {
        let names: Vec<String> = config.key_names().into_iter().map(String::from).collect();
        let existing = if names.len() > 1 {
            let mut items = names;
            items.push(NEW_KEY.to_string());
            let choice = Select::new()
                .with_prompt("You have more than one API key in your config file, which one would you like to use?")
                .items(&items)
                .default(0)
                .interact()?;
            (items[choice] != NEW_KEY).then(|| items[choice].clone())
        } else if let Some(first) = config.first_key_name() {
            let use_it = Confirm::new()
                .with_prompt(format!("Do you want to use {} as your API key", first.yellow()))
                .default(true)
                .interact()?;
            use_it.then(|| first.to_string())
        } else {
            None
        };

        if let Some(name) = existing {
            let key = config
                .key(&name)
                .cloned()
                .with_context(|| format!("API key {} is missing from the config", name))?;
            return Ok((name, key));
        }

        let key = ask_key()?;
        let save = Confirm::new()
            .with_prompt(format!("Save this key to {}?", CONFIG_FILE))
            .default(false)
            .interact()?;
        if !save {
            return Ok((UNSAVED_KEY_NAME.to_string(), key));
        }
        let name = ask_key_name(UNSAVED_KEY_NAME)?;
        config.add_api_key(&name, key.clone());
        self.store.save(config)?;
        println!("Saved {} to {}", name.as_str().yellow(), CONFIG_FILE);
        Ok((name, key))
    }

    /// Fuzzy search over the folder names under the working directory,
    /// with a free-text fallback.
    fn ask_project_name(&mut self) -> Result<String> {
        let options = TraversalOptions {
            base_name_only: true,
            ..Default::default()
        };
        let mut items = self.suggestions.get_or_compute(&self.cwd, &options).to_vec();
        items.push(SOMETHING_ELSE.to_string());

        let choice = FuzzySelect::new()
            .with_prompt("What is the name of your DA playground project?")
            .items(&items)
            .default(0)
            .interact()?;
        let picked = &items[choice];
        if picked != SOMETHING_ELSE {
            match validate::project_name(picked) {
                Ok(()) => return Ok(picked.clone()),
                Err(msg) => println!("{}", msg),
            }
        }

        let typed: String = Input::new()
            .with_prompt("Please type the name of your DA playground project")
            .validate_with(|input: &String| validate::project_name(input))
            .interact_text()?;
        Ok(typed)
    }

    fn ask_folder(&self) -> Result<PathBuf> {
        let options = folder_options(&self.cwd);
        let items = walk(&self.cwd, &options);
        let choice = FuzzySelect::new()
            .with_prompt("Which folder do you want to push to the playground?")
            .items(&items)
            .default(0)
            .interact()?;
        Ok(folder_for(&self.cwd, &items, choice))
    }
}

/// Walk options for the folder prompt: every folder a few levels down,
/// with the working directory itself offered first.
pub fn folder_options(cwd: &Path) -> TraversalOptions {
    TraversalOptions {
        include_root_sentinel: true,
        root_sentinel_label: format!("Current folder [{}]", cwd.display()),
        ..Default::default()
    }
}

/// Maps the selected folder prompt entry back to a path. Entry 0 is the
/// working directory itself.
pub fn folder_for(cwd: &Path, items: &[String], choice: usize) -> PathBuf {
    match items.get(choice) {
        Some(relative) if choice > 0 => cwd.join(relative),
        _ => cwd.to_path_buf(),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum KeyQuestion {
    Key,
    Name,
    Root,
}

/// Asked when a key goes into a new config file: the key, what to call
/// it, then its server.
const NAMED_KEY_QUESTIONS: [KeyQuestion; 3] =
    [KeyQuestion::Key, KeyQuestion::Name, KeyQuestion::Root];
/// Asked for a key used for this push only.
const KEY_QUESTIONS: [KeyQuestion; 2] = [KeyQuestion::Key, KeyQuestion::Root];

fn ask_key_questions(questions: &[KeyQuestion], default_name: &str) -> Result<(String, ApiKey)> {
    let mut name = default_name.to_string();
    let mut api_key = String::new();
    let mut api_root = API_ROOTS[0].to_string();
    for question in questions {
        match question {
            KeyQuestion::Key => api_key = ask_api_key()?,
            KeyQuestion::Name => name = ask_key_name(default_name)?,
            KeyQuestion::Root => api_root = ask_api_root()?,
        }
    }
    Ok((name, ApiKey { api_key, api_root }))
}

fn ask_named_key(default_name: &str) -> Result<(String, ApiKey)> {
    ask_key_questions(&NAMED_KEY_QUESTIONS, default_name)
}

fn ask_key() -> Result<ApiKey> {
    let (_, key) = ask_key_questions(&KEY_QUESTIONS, UNSAVED_KEY_NAME)?;
    Ok(key)
}

fn ask_api_key() -> Result<String> {
    loop {
        let value = Password::new()
            .with_prompt("What is the API key? (not the name)")
            .interact()?;
        match validate::api_key(&value) {
            Ok(()) => return Ok(value),
            Err(msg) => println!("{}", msg),
        }
    }
}

fn ask_api_root() -> Result<String> {
    let root = Select::new()
        .with_prompt("What is the API root url?")
        .items(&API_ROOTS)
        .default(0)
        .interact()?;
    Ok(API_ROOTS[root].to_string())
}

fn ask_key_name(default: &str) -> Result<String> {
    let name: String = Input::new()
        .with_prompt("What would you like to call this API key?")
        .default(default.to_string())
        .validate_with(|input: &String| validate::key_name(input))
        .interact_text()?;
    Ok(name)
}

/// Debug output wins over warnings, matching what the script considers
/// more detailed.
fn print_report(report: &ScriptReport) {
    let extra = report.debug.as_ref().or(report.warning.as_ref());
    if let Some(text) = extra {
        for line in text.lines() {
            println!("    {}", line);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn folder_prompt_offers_current_folder_first() {
        let dir = tempdir().unwrap();
        fs::create_dir_all(dir.path().join("docassemble-intake/docassemble")).unwrap();
        fs::create_dir_all(dir.path().join("node_modules/pkg")).unwrap();

        let items = walk(dir.path(), &folder_options(dir.path()));
        assert_eq!(
            items,
            vec![
                format!("Current folder [{}]", dir.path().display()),
                "docassemble-intake".to_string(),
                "docassemble-intake/docassemble".to_string(),
            ]
        );
    }

    #[test]
    fn new_config_asks_key_then_name_then_root() {
        assert_eq!(
            NAMED_KEY_QUESTIONS,
            [KeyQuestion::Key, KeyQuestion::Name, KeyQuestion::Root]
        );
        assert_eq!(KEY_QUESTIONS, [KeyQuestion::Key, KeyQuestion::Root]);
    }

    #[test]
    fn folder_choice_resolves_against_cwd() {
        let cwd = Path::new("/work");
        let items = vec!["Current folder [/work]".to_string(), "pkg/sub".to_string()];

        assert_eq!(folder_for(cwd, &items, 0), PathBuf::from("/work"));
        assert_eq!(folder_for(cwd, &items, 1), PathBuf::from("/work/pkg/sub"));
    }
}
