// Prompts sent to the chat model.
//
// The built-in French prompts are compiled into the binary. A prompt
// directory (QCM_PROMPT_DIR) can replace either of them with a plain-text
// file named `system_prompt` or `user_prompt`.

use std::path::Path;

use anyhow::{Context, Result};
use tracing::debug;

const BUILTIN_SYSTEM_PROMPT: &str = include_str!("../../prompts/system_prompt.txt");
const BUILTIN_USER_PROMPT: &str = include_str!("../../prompts/user_prompt.txt");

/// Placeholder for the note text in the user prompt.
pub const CONTENT_PLACEHOLDER: &str = "{content}";
/// Placeholder for the comma-separated keyword list in the user prompt.
pub const KEYWORDS_PLACEHOLDER: &str = "{suggested_keywords}";

#[derive(Debug, Clone)]
pub struct Prompts {
    pub system: String,
    user_template: String,
}

impl Default for Prompts {
    fn default() -> Self {
        Self {
            system: BUILTIN_SYSTEM_PROMPT.to_string(),
            user_template: BUILTIN_USER_PROMPT.to_string(),
        }
    }
}

impl Prompts {
    pub fn new(system: impl Into<String>, user_template: impl Into<String>) -> Self {
        Self {
            system: system.into(),
            user_template: user_template.into(),
        }
    }

    /// Built-in prompts, with any file present in `dir` taking precedence.
    pub fn load(dir: Option<&Path>) -> Result<Self> {
        let mut prompts = Self::default();
        let Some(dir) = dir else {
            return Ok(prompts);
        };

        if let Some(system) = read_override(dir, "system_prompt")? {
            prompts.system = system;
        }
        if let Some(user) = read_override(dir, "user_prompt")? {
            prompts.user_template = user;
        }
        Ok(prompts)
    }

    /// Fill the user prompt for one note.
    ///
    /// Keywords are substituted before the note so a note that happens to
    /// contain a placeholder is left as written.
    pub fn user_prompt(&self, content: &str, keywords: &[String]) -> String {
        self.user_template
            .replace(KEYWORDS_PLACEHOLDER, &keywords.join(", "))
            .replace(CONTENT_PLACEHOLDER, content)
    }
}

fn read_override(dir: &Path, name: &str) -> Result<Option<String>> {
    let path = dir.join(name);
    if !path.is_file() {
        return Ok(None);
    }
    let text = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read prompt {}", path.display()))?;
    debug!(path = %path.display(), "Using prompt override");
    Ok(Some(text))
}
