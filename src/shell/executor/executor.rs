use std::io;

use log::debug;

use crate::shell::parser::ast::{IfClause, Node, SimpleCommand};
use crate::shell::status;

use super::builtins::Builtin;
use super::process;
use super::redirect::apply_redirections;

/// Walks a command tree and returns its exit status.
///
/// The tree is only read. Every fork is waited for before the next node runs.
#[derive(Debug, Default)]
pub struct Executor;

impl Executor {
    pub fn new() -> Self {
        Self
    }

    pub fn execute(&mut self, node: &Node) -> i32 {
        match node {
            Node::Simple(command) => self.execute_simple(command),
            Node::List(items) => self.execute_list(items),
            Node::If(clause) => self.execute_if(clause),
        }
    }

    fn execute_list(&mut self, items: &[Node]) -> i32 {
        let mut status = status::SUCCESS;
        for item in items {
            status = self.execute(item);
        }
        status
    }

    fn execute_if(&mut self, clause: &IfClause) -> i32 {
        if self.execute(&clause.condition) == status::SUCCESS {
            return self.execute(&clause.then_branch);
        }

        for elif in &clause.elif_branches {
            if self.execute(&elif.condition) == status::SUCCESS {
                return self.execute(&elif.body);
            }
        }

        match &clause.else_branch {
            Some(else_branch) => self.execute(else_branch),
            None => status::SUCCESS,
        }
    }

    fn execute_simple(&mut self, command: &SimpleCommand) -> i32 {
        let args = command.argv.get(1..).unwrap_or_default();

        let status = match Builtin::lookup(command.program()) {
            Some(builtin) if command.redirections.is_empty() => {
                debug!("running builtin: {}", command);
                builtin.run(args, &mut io::stdout().lock())
            }
            Some(builtin) => {
                debug!("running builtin in child: {}", command);
                process::run_isolated(|| {
                    if let Err(e) = apply_redirections(&command.redirections) {
                        eprintln!("minish: {}", e);
                        return status::FAILURE;
                    }
                    builtin.run(args, &mut process::FdWriter(libc::STDOUT_FILENO))
                })
            }
            None => {
                debug!("running external command: {}", command);
                process::run_isolated(|| {
                    if let Err(e) = apply_redirections(&command.redirections) {
                        eprintln!("minish: {}", e);
                        return status::FAILURE;
                    }
                    process::exec_program(&command.argv)
                })
            }
        };

        debug!("{} exited with {}", command.program(), status);
        status
    }
}
