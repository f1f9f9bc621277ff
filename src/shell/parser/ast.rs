use std::fmt;

use super::lexer::RedirectOp;

/// A parsed input unit. Built once by the parser and only read afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Simple(SimpleCommand),
    /// Never empty.
    List(Vec<Node>),
    If(IfClause),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimpleCommand {
    /// Never empty; `argv[0]` names the program or built-in.
    pub argv: Vec<String>,
    /// Applied in order, later entries win on the same descriptor.
    pub redirections: Vec<Redirection>,
}

impl SimpleCommand {
    pub fn program(&self) -> &str {
        self.argv.first().map(String::as_str).unwrap_or_default()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Redirection {
    pub operator: RedirectOp,
    /// File name, `-` (close) or a descriptor number for the `&` forms.
    pub target: String,
    pub fd: i32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElifBranch {
    pub condition: Node,
    pub body: Node,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IfClause {
    pub condition: Box<Node>,
    pub then_branch: Box<Node>,
    pub elif_branches: Vec<ElifBranch>,
    pub else_branch: Option<Box<Node>>,
}

fn needs_quoting(word: &str) -> bool {
    word.is_empty()
        || word.starts_with('#')
        || word.starts_with(|c: char| c.is_ascii_digit())
        || matches!(word, "if" | "then" | "elif" | "else" | "fi")
        || word
            .chars()
            .any(|c| matches!(c, ' ' | '\t' | '\n' | ';' | '<' | '>' | '\''))
}

fn write_word(f: &mut fmt::Formatter<'_>, word: &str) -> fmt::Result {
    if needs_quoting(word) {
        write!(f, "'{}'", word)
    } else {
        f.write_str(word)
    }
}

impl fmt::Display for Redirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.fd != self.operator.default_fd() {
            write!(f, "{}", self.fd)?;
        }
        write!(f, "{} ", self.operator)?;
        write_word(f, &self.target)
    }
}

impl fmt::Display for SimpleCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, arg) in self.argv.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write_word(f, arg)?;
        }
        for redirection in &self.redirections {
            write!(f, " {}", redirection)?;
        }
        Ok(())
    }
}

impl fmt::Display for Node {
    /// Renders the tree back as shell source that parses to the same tree.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Node::Simple(command) => write!(f, "{}", command),
            Node::List(items) => {
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str("; ")?;
                    }
                    write!(f, "{}", item)?;
                }
                Ok(())
            }
            Node::If(clause) => {
                write!(f, "if {}; then {};", clause.condition, clause.then_branch)?;
                for elif in &clause.elif_branches {
                    write!(f, " elif {}; then {};", elif.condition, elif.body)?;
                }
                if let Some(else_branch) = &clause.else_branch {
                    write!(f, " else {};", else_branch)?;
                }
                f.write_str(" fi")
            }
        }
    }
}
