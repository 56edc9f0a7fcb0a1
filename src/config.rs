use std::env;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::keywords::alignment::DEFAULT_ALIGN_THRESHOLD;
use crate::keywords::embeddings::{DEFAULT_EMBEDDING_MODEL, DEFAULT_OLLAMA_URL};
use crate::qcm::llm::DEFAULT_CHAT_MODEL;

/// Keywords extracted from each note before prompting the model.
pub const DEFAULT_KEYWORDS_PER_NOTE: usize = 5;

/// Central configuration loaded from environment variables.
///
/// The .env file is loaded automatically at startup via dotenvy.
pub struct Config {
    /// Base URL of the Ollama server used for both chat and embeddings
    pub ollama_url: String,
    pub chat_model: String,
    pub embedding_model: String,
    pub db_path: String,
    /// Folder of Markdown notes to generate from (can also be given on the CLI)
    pub notes_dir: Option<PathBuf>,
    /// Directory holding `system_prompt` and `user_prompt` overrides
    pub prompt_dir: Option<PathBuf>,
    pub keywords_per_note: usize,
    pub align_threshold: f64,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Everything has a default except the notes folder, which `generate`
    /// accepts as an argument instead.
    pub fn load() -> Result<Self> {
        let keywords_per_note = match env::var("QCM_KEYWORDS_PER_NOTE") {
            Ok(raw) => raw
                .trim()
                .parse::<usize>()
                .with_context(|| format!("QCM_KEYWORDS_PER_NOTE must be a whole number, got {raw:?}"))?,
            Err(_) => DEFAULT_KEYWORDS_PER_NOTE,
        };

        let align_threshold = match env::var("QCM_ALIGN_THRESHOLD") {
            Ok(raw) => {
                let value = raw
                    .trim()
                    .parse::<f64>()
                    .with_context(|| format!("QCM_ALIGN_THRESHOLD must be a number, got {raw:?}"))?;
                if value.is_nan() {
                    anyhow::bail!("QCM_ALIGN_THRESHOLD must be a number, got {raw:?}");
                }
                value
            }
            Err(_) => DEFAULT_ALIGN_THRESHOLD,
        };

        Ok(Self {
            ollama_url: env::var("OLLAMA_URL").unwrap_or_else(|_| DEFAULT_OLLAMA_URL.to_string()),
            chat_model: env::var("QCM_CHAT_MODEL")
                .unwrap_or_else(|_| DEFAULT_CHAT_MODEL.to_string()),
            embedding_model: env::var("QCM_EMBEDDING_MODEL")
                .unwrap_or_else(|_| DEFAULT_EMBEDDING_MODEL.to_string()),
            db_path: env::var("QCM_DB_PATH")
                .unwrap_or_else(|_| "./data/qcm_database.db".to_string()),
            notes_dir: env::var("QCM_NOTES_DIR").ok().map(PathBuf::from),
            prompt_dir: env::var("QCM_PROMPT_DIR").ok().map(PathBuf::from),
            keywords_per_note,
            align_threshold,
        })
    }

    /// Resolve the notes folder: the CLI argument wins over QCM_NOTES_DIR.
    /// Fails if neither is set or the folder does not exist.
    pub fn require_notes_dir(&self, cli_dir: Option<&Path>) -> Result<PathBuf> {
        let dir = match cli_dir {
            Some(dir) => dir.to_path_buf(),
            None => self.notes_dir.clone().ok_or_else(|| {
                anyhow::anyhow!(
                    "No notes folder given. Pass one to `qcm-forge generate <DIR>`\n\
                     or set QCM_NOTES_DIR in your .env file."
                )
            })?,
        };

        if !dir.is_dir() {
            anyhow::bail!("Notes folder not found: {}", dir.display());
        }
        Ok(dir)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_with_notes(notes_dir: Option<PathBuf>) -> Config {
        Config {
            ollama_url: DEFAULT_OLLAMA_URL.to_string(),
            chat_model: DEFAULT_CHAT_MODEL.to_string(),
            embedding_model: DEFAULT_EMBEDDING_MODEL.to_string(),
            db_path: ":memory:".to_string(),
            notes_dir,
            prompt_dir: None,
            keywords_per_note: DEFAULT_KEYWORDS_PER_NOTE,
            align_threshold: DEFAULT_ALIGN_THRESHOLD,
        }
    }

    #[test]
    fn test_require_notes_dir_missing() {
        let config = config_with_notes(None);
        let err = config.require_notes_dir(None).unwrap_err();
        assert!(err.to_string().contains("QCM_NOTES_DIR"));
    }

    #[test]
    fn test_require_notes_dir_cli_wins() {
        let env_dir = tempfile::tempdir().unwrap();
        let cli_dir = tempfile::tempdir().unwrap();
        let config = config_with_notes(Some(env_dir.path().to_path_buf()));
        let resolved = config.require_notes_dir(Some(cli_dir.path())).unwrap();
        assert_eq!(resolved, cli_dir.path());
    }

    #[test]
    fn test_require_notes_dir_nonexistent() {
        let config = config_with_notes(Some(PathBuf::from("/definitely/not/here")));
        assert!(config.require_notes_dir(None).is_err());
    }
}
