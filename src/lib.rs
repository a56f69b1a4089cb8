// Library root
// -----------
// This crate exposes the pieces of the `dll-push` wizard. The binary
// (`main.rs`) only wires them together.
//
// Module responsibilities:
// - `entries`: lists the children of one directory, best effort.
// - `walk`: depth-bounded, pruning walk that flattens a folder tree into
//   the path suggestions shown by the prompts.
// - `cache`: single-slot memo of the last walk, owned by the wizard.
// - `config`: the `dll_config/dll.config.json` file with API keys and
//   playground project names.
// - `settings`: environment-driven runtime settings.
// - `push`: runs the playground manager script that does the upload.
// - `validate`: answer checks used by the prompts.
// - `ui`: the interactive wizard.
pub mod cache;
pub mod config;
pub mod entries;
pub mod push;
pub mod settings;
pub mod ui;
pub mod validate;
pub mod walk;
