// Answer checks shared by the prompts. Each returns the message shown
// under the prompt when the answer is rejected.

use crossterm::style::Stylize;

pub fn is_blank(value: &str) -> bool {
    value.trim().is_empty()
}

fn warning(text: &str) -> String {
    text.yellow().to_string()
}

/// Playground project names: letters, digits and hyphens only.
pub fn project_name(value: &str) -> Result<(), String> {
    if is_blank(value) {
        return Err(warning("Project name cannot be empty"));
    }
    if !value.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
        return Err(warning(
            "Project name must only contain letters, numbers, or hyphens, without any space",
        ));
    }
    Ok(())
}

pub fn api_key(value: &str) -> Result<(), String> {
    if is_blank(value) {
        return Err(warning("API key cannot be empty"));
    }
    if value.chars().any(char::is_whitespace) {
        return Err(warning("API key must not contain any whitespace character"));
    }
    Ok(())
}

pub fn key_name(value: &str) -> Result<(), String> {
    if is_blank(value) {
        return Err(warning("Key name cannot be empty"));
    }
    Ok(())
}
