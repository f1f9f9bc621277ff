use colored::Colorize;

/// Styling for the interactive prompt and its diagnostics.
pub struct Theme {
    pub prompt: String,
    /// Shown while a command continues over several lines.
    pub continuation: String,
    pub success_style: Box<dyn Fn(String) -> String>,
    pub error_style: Box<dyn Fn(String) -> String>,
}

impl Default for Theme {
    fn default() -> Self {
        Theme {
            prompt: String::from("minish$ "),
            continuation: String::from("> "),
            success_style: Box::new(|s| s.bright_green().to_string()),
            error_style: Box::new(|s| s.bright_red().to_string()),
        }
    }
}

impl Theme {
    /// The prompt, coloured by the status of the previous command.
    pub fn prompt(&self, last_status: i32) -> String {
        if last_status == 0 {
            (self.success_style)(self.prompt.clone())
        } else {
            let prompt = format!("[{}] {}", last_status, self.prompt);
            (self.error_style)(prompt)
        }
    }

    pub fn continuation_prompt(&self) -> String {
        (self.success_style)(self.continuation.clone())
    }

    pub fn error(&self, message: String) -> String {
        (self.error_style)(message)
    }
}
