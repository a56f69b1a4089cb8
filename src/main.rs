// Entrypoint for the CLI application.
// - Keeps `main` small: set up logging, read settings, hand over to the wizard.
// - Log verbosity follows `RUST_LOG` and defaults to warnings only.

use dll_push::{settings::Settings, ui::Wizard};

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    // The manager script is located before any question is asked so a
    // broken install fails fast.
    let settings = Settings::from_env()?;
    let cwd = std::env::current_dir()?;

    Wizard::new(&cwd).run(settings)?;
    Ok(())
}
