use dotenv::dotenv;
use rustyline::EditMode;
use std::env;
use std::path::PathBuf;

const DEFAULT_HISTORY: &str = "~/.config/minish/.minish_history";

#[derive(Debug, Clone)]
pub struct Config {
    /// Program name, used as the diagnostic prefix and as the log target.
    pub name: String,
    pub logger_level: String,
    pub logger_dir: Option<PathBuf>,
    pub history_file: PathBuf,
    pub editor_mode: String,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            name: String::from("minish"),
            logger_level: String::from("warn"),
            logger_dir: None,
            history_file: expand_path(DEFAULT_HISTORY),
            editor_mode: String::from("emacs"),
        }
    }
}

fn expand_path(path: &str) -> PathBuf {
    PathBuf::from(shellexpand::tilde(path).as_ref())
}

impl Config {
    /// Defaults overridden by `MINISH_*` variables; a `.env` file
    /// (`.env.development` in debug builds) is loaded first.
    pub fn new() -> Self {
        if cfg!(debug_assertions) {
            dotenv::from_filename(".env.development").ok();
        } else {
            dotenv().ok();
        }

        Self::from_vars(|key| env::var(key).ok())
    }

    fn from_vars<F>(var: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Config::default();

        if let Some(level) = var("MINISH_LOG") {
            config.logger_level = level;
        }

        if let Some(dir) = var("MINISH_LOG_DIR").filter(|dir| !dir.is_empty()) {
            config.logger_dir = Some(expand_path(&dir));
        }

        if let Some(history) = var("MINISH_HISTORY").filter(|h| !h.is_empty()) {
            config.history_file = expand_path(&history);
        }

        if let Some(editor) = var("MINISH_EDITOR") {
            config.editor_mode = editor;
        }

        config
    }

    pub fn get_edit_mode(&self) -> EditMode {
        match self.editor_mode.to_lowercase().as_str() {
            "vi" => EditMode::Vi,
            _ => EditMode::Emacs,
        }
    }
}
