use std::os::unix::io::RawFd;

use log::debug;
use nix::errno::Errno;
use nix::fcntl::{open, OFlag};
use nix::sys::stat::Mode;
use nix::unistd::{close, dup2};
use thiserror::Error;

use crate::shell::parser::ast::Redirection;
use crate::shell::parser::lexer::RedirectOp;

/// A redirection that could not be applied; the command must not run.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("{subject}: {}", .errno.desc())]
pub struct RedirectError {
    pub subject: String,
    pub errno: Errno,
}

impl RedirectError {
    fn new(subject: &str, errno: Errno) -> Self {
        Self {
            subject: subject.to_string(),
            errno,
        }
    }
}

/// Where the redirected descriptor gets its new meaning from.
#[derive(Debug, PartialEq, Eq)]
enum Source {
    File(OFlag),
    Descriptor(RawFd),
    Close,
}

fn output_flags() -> OFlag {
    OFlag::O_WRONLY | OFlag::O_CREAT | OFlag::O_TRUNC
}

fn resolve(redirection: &Redirection) -> Result<Source, RedirectError> {
    let source = match redirection.operator {
        RedirectOp::Input => Source::File(OFlag::O_RDONLY),
        RedirectOp::Output | RedirectOp::Clobber => Source::File(output_flags()),
        RedirectOp::Append => Source::File(OFlag::O_WRONLY | OFlag::O_CREAT | OFlag::O_APPEND),
        RedirectOp::ReadWrite => Source::File(OFlag::O_RDWR | OFlag::O_CREAT),
        RedirectOp::DupOutput | RedirectOp::DupInput => {
            let target = redirection.target.as_str();
            if target == "-" {
                Source::Close
            } else if target.starts_with(|c: char| c.is_ascii_digit()) {
                // a leading digit always means a descriptor, even for `2file`
                let digits: String = target.chars().take_while(char::is_ascii_digit).collect();
                let fd = digits
                    .parse::<RawFd>()
                    .map_err(|_| RedirectError::new(target, Errno::EBADF))?;
                Source::Descriptor(fd)
            } else if redirection.operator == RedirectOp::DupOutput {
                Source::File(output_flags())
            } else {
                Source::File(OFlag::O_RDONLY)
            }
        }
    };
    Ok(source)
}

fn apply_one(redirection: &Redirection) -> Result<(), RedirectError> {
    let fd = redirection.fd;
    let target = redirection.target.as_str();

    match resolve(redirection)? {
        Source::Close => {
            // closing a descriptor that is not open is not an error
            let _ = close(fd);
        }
        Source::Descriptor(source) => {
            dup2(source, fd).map_err(|errno| RedirectError::new(target, errno))?;
        }
        Source::File(flags) => {
            let opened = open(target, flags, Mode::from_bits_truncate(0o644))
                .map_err(|errno| RedirectError::new(target, errno))?;
            if opened != fd {
                let duplicated = dup2(opened, fd);
                let _ = close(opened);
                duplicated.map_err(|errno| RedirectError::new(target, errno))?;
            }
        }
    }
    Ok(())
}

/// Applies redirections in order to the calling process's descriptor table.
///
/// Meant to run inside a child execution context. Stops at the first failure.
pub fn apply_redirections(redirections: &[Redirection]) -> Result<(), RedirectError> {
    for redirection in redirections {
        debug!(
            "redirect fd {} {} {}",
            redirection.fd, redirection.operator, redirection.target
        );
        apply_one(redirection)?;
    }
    Ok(())
}
