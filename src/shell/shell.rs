use log::{debug, error, warn};

use crate::shell::error::ShellError;
use crate::shell::executor::Executor;
use crate::shell::parser::{parse, parse_incremental, ParseStep, SyntaxError};
use crate::shell::readline::{ReadlineError, ReadlineManager};
use crate::shell::status;
use crate::utils::config::Config;
use crate::utils::theme::Theme;

/// Parses a whole input unit and then executes it.
///
/// Nothing runs when the input has a syntax error anywhere.
pub fn run_source(source: &str) -> Result<i32, SyntaxError> {
    let Some(tree) = parse(source)? else {
        debug!("empty input");
        return Ok(status::SUCCESS);
    };
    debug!("parsed: {}", tree);
    Ok(Executor::new().execute(&tree))
}

pub struct Shell<'a> {
    config: &'a Config,
    theme: Theme,
    executor: Executor,
    last_status: i32,
    /// Lines of an unfinished command (open quote or `if`) read so far.
    pending: String,
}

impl<'a> Shell<'a> {
    pub fn new(config: &'a Config) -> Self {
        Self {
            config,
            theme: Theme::default(),
            executor: Executor::new(),
            last_status: status::SUCCESS,
            pending: String::new(),
        }
    }

    /// Runs a complete script; a syntax error aborts before anything runs.
    pub fn run_script(&mut self, source: &str) -> Result<i32, SyntaxError> {
        self.last_status = run_source(source)?;
        Ok(self.last_status)
    }

    /// Reads, parses and executes one command at a time until EOF or `exit`.
    /// A command left open at the end of a line continues on the next one.
    pub fn run_interactive(&mut self) -> Result<i32, ShellError> {
        debug!("starting interactive session");
        let mut readline = ReadlineManager::new(self.config)?;
        readline.load_history();

        let result = self.run_loop(&mut readline);
        readline.save_history();

        debug!("leaving interactive session");
        result
    }

    fn run_loop(&mut self, readline: &mut ReadlineManager<'_>) -> Result<i32, ShellError> {
        loop {
            let prompt = if self.pending.is_empty() {
                self.theme.prompt(self.last_status)
            } else {
                self.theme.continuation_prompt()
            };
            match readline.readline(&prompt) {
                Ok(line) => {
                    let trimmed = line.trim();
                    if self.pending.is_empty() {
                        if trimmed == "exit" {
                            break;
                        }
                        if trimmed.is_empty() {
                            continue;
                        }
                    }
                    readline.add_history(&line);
                    self.handle_line(&line);
                }
                Err(ReadlineError::Interrupted) => {
                    debug!("line discarded on interrupt");
                    self.pending.clear();
                }
                Err(ReadlineError::Eof) => {
                    debug!("end of input");
                    self.finish_pending();
                    break;
                }
                Err(err) => {
                    error!("readline failed: {}", err);
                    return Err(err.into());
                }
            }
        }
        Ok(self.last_status)
    }

    fn handle_line(&mut self, line: &str) {
        self.pending.push_str(line);
        self.pending.push('\n');

        match parse_incremental(&self.pending) {
            Ok(ParseStep::Complete(Some(tree))) => {
                debug!("parsed: {}", tree);
                self.last_status = self.executor.execute(&tree);
            }
            Ok(ParseStep::Complete(None)) => {}
            Ok(ParseStep::NeedMoreInput) => {
                debug!("command continues on the next line");
                return;
            }
            Err(err) => self.report(&err),
        }
        self.pending.clear();
    }

    /// Input ended while a command was still open: that is a syntax error.
    fn finish_pending(&mut self) {
        if self.pending.is_empty() {
            return;
        }
        if let Err(err) = parse(&self.pending) {
            self.report(&err);
        }
        self.pending.clear();
    }

    fn report(&mut self, err: &SyntaxError) {
        warn!("syntax error in interactive input: {}", err);
        eprintln!("{}", self.theme.error(format!("{}: {}", self.config.name, err)));
        self.last_status = status::SYNTAX_ERROR;
    }
}
