use std::io::{self, Write};

use log::warn;

use crate::shell::status;

/// Commands implemented inside the shell process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Builtin {
    True,
    False,
    Echo,
}

impl Builtin {
    pub fn lookup(name: &str) -> Option<Builtin> {
        match name {
            "true" => Some(Builtin::True),
            "false" => Some(Builtin::False),
            "echo" => Some(Builtin::Echo),
            _ => None,
        }
    }

    /// Runs the built-in with `args` (argv without the command name),
    /// writing any output to `out`. `echo` reports a failed write but still
    /// succeeds.
    pub fn run<W: Write>(self, args: &[String], out: &mut W) -> i32 {
        match self {
            Builtin::True => status::SUCCESS,
            Builtin::False => status::FAILURE,
            Builtin::Echo => {
                if let Err(e) = echo(args, out) {
                    warn!("echo failed: {}", e);
                    eprintln!("minish: echo: write error: {}", e);
                }
                status::SUCCESS
            }
        }
    }
}

fn echo<W: Write>(args: &[String], out: &mut W) -> io::Result<()> {
    let mut newline = true;
    let mut interpret = false;

    let mut rest = args;
    while let Some((flag, tail)) = rest.split_first() {
        match flag.as_str() {
            "-n" => newline = false,
            "-e" => interpret = true,
            "-E" => interpret = false,
            _ => break,
        }
        rest = tail;
    }

    let mut text = String::new();
    for (i, arg) in rest.iter().enumerate() {
        if i > 0 {
            text.push(' ');
        }
        if interpret {
            push_escaped(&mut text, arg);
        } else {
            text.push_str(arg);
        }
    }
    if newline {
        text.push('\n');
    }

    out.write_all(text.as_bytes())?;
    out.flush()
}

/// Expands `\n`, `\t` and `\\`; any other backslash pair is kept as is.
fn push_escaped(text: &mut String, arg: &str) {
    let mut chars = arg.chars().peekable();
    while let Some(c) = chars.next() {
        if c != '\\' {
            text.push(c);
            continue;
        }
        match chars.peek() {
            Some('n') => text.push('\n'),
            Some('t') => text.push('\t'),
            Some('\\') => text.push('\\'),
            _ => {
                text.push('\\');
                continue;
            }
        }
        chars.next();
    }
}
