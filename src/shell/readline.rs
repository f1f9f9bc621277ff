use crate::utils::config::Config;
use log::{debug, warn};
pub use rustyline::error::ReadlineError;
use rustyline::history::FileHistory;
use rustyline::Editor;
use rustyline::{CompletionType, Config as RLConfig};
use std::fs;

pub struct ReadlineManager<'a> {
    config: &'a Config,
    editor: Editor<(), FileHistory>,
}

impl<'a> ReadlineManager<'a> {
    pub fn new(config: &'a Config) -> Result<Self, ReadlineError> {
        let rl_config = RLConfig::builder()
            .history_ignore_space(true)
            .auto_add_history(false)
            .completion_type(CompletionType::List)
            .edit_mode(config.get_edit_mode())
            .build();

        let editor = Editor::with_config(rl_config)?;
        Ok(Self { config, editor })
    }

    pub fn load_history(&mut self) {
        match self.editor.load_history(&self.config.history_file) {
            Ok(()) => debug!("history loaded from {}", self.config.history_file.display()),
            Err(err) => warn!(
                "cannot load history {}: {}",
                self.config.history_file.display(),
                err
            ),
        }
    }

    pub fn readline(&mut self, prompt: &str) -> Result<String, ReadlineError> {
        self.editor.readline(prompt)
    }

    pub fn add_history(&mut self, line: &str) {
        if let Err(err) = self.editor.add_history_entry(line) {
            warn!("cannot record history entry: {}", err);
        }
    }

    pub fn save_history(&mut self) {
        if let Some(parent) = self.config.history_file.parent() {
            if let Err(err) = fs::create_dir_all(parent) {
                warn!("cannot create history directory {}: {}", parent.display(), err);
                return;
            }
        }
        match self.editor.save_history(&self.config.history_file) {
            Ok(()) => debug!("history saved"),
            Err(err) => warn!("cannot save history: {}", err),
        }
    }
}
