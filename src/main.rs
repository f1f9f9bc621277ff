use std::fs;
use std::io::{self, IsTerminal, Read, Write};
use std::process;

use argh::FromArgs;
use log::debug;

use minish::shell::parser::tokenize;
use minish::shell::{status, Shell, ShellError};
use minish::utils::config::Config;
use minish::utils::log::init_logger;

#[derive(FromArgs, Debug)]
/// A minimal POSIX-style shell.
struct Args {
    /// run the given script text instead of a file
    #[argh(option, short = 'c')]
    command: Option<String>,

    /// print the token stream and exit without executing
    #[argh(switch)]
    dump_tokens: bool,

    /// script file, followed by arguments that are accepted and ignored
    #[argh(positional, greedy)]
    script: Vec<String>,
}

enum Input {
    Text(String),
    File(String),
    Stdin,
}

impl Args {
    fn input(&self) -> Input {
        match (&self.command, self.script.first()) {
            (Some(text), _) => Input::Text(text.clone()),
            (None, Some(path)) => Input::File(path.clone()),
            (None, None) => Input::Stdin,
        }
    }
}

fn parse_args() -> Args {
    let strings: Vec<String> = std::env::args().collect();
    let strs: Vec<&str> = strings.iter().map(String::as_str).collect();
    let command = strs.first().copied().unwrap_or("minish");
    let rest = strs.get(1..).unwrap_or_default();

    match Args::from_args(&[command], rest) {
        Ok(args) => args,
        Err(early_exit) => match early_exit.status {
            Ok(()) => {
                println!("{}", early_exit.output);
                process::exit(status::SUCCESS);
            }
            Err(()) => {
                eprintln!("{}", early_exit.output);
                process::exit(status::SYNTAX_ERROR);
            }
        },
    }
}

fn read_script(input: &Input) -> Result<String, ShellError> {
    match input {
        Input::Text(text) => Ok(text.clone()),
        Input::File(path) => {
            let bytes = fs::read(path).map_err(|e| {
                io::Error::new(e.kind(), format!("cannot open file: {}: {}", path, e))
            })?;
            Ok(String::from_utf8_lossy(&bytes).into_owned())
        }
        Input::Stdin => {
            let mut bytes = Vec::new();
            io::stdin().read_to_end(&mut bytes)?;
            Ok(String::from_utf8_lossy(&bytes).into_owned())
        }
    }
}

fn dump_tokens(source: &str) -> Result<i32, ShellError> {
    let tokens = tokenize(source)?;
    let mut out = io::stdout().lock();
    for token in tokens {
        match token.kind.value() {
            Some(value) => writeln!(out, "{} {} {:?}", token.position, token.kind.name(), value)?,
            None => writeln!(out, "{} {}", token.position, token.kind.name())?,
        }
    }
    Ok(status::SUCCESS)
}

fn run(args: &Args, config: &Config) -> Result<i32, ShellError> {
    let input = args.input();
    let mut shell = Shell::new(config);

    if matches!(input, Input::Stdin) && !args.dump_tokens && io::stdin().is_terminal() {
        return shell.run_interactive();
    }

    let source = read_script(&input)?;
    if args.dump_tokens {
        return dump_tokens(&source);
    }
    Ok(shell.run_script(&source)?)
}

fn main() {
    let args = parse_args();
    let config = Config::new();
    init_logger(&config);
    debug!("arguments: {:?}", args);

    let code = match run(&args, &config) {
        Ok(code) => code,
        Err(ShellError::Syntax(err)) => {
            eprintln!("{}: {}", config.name, err);
            status::SYNTAX_ERROR
        }
        Err(ShellError::Io(err)) => {
            eprintln!("{}: {}", config.name, err);
            status::SYNTAX_ERROR
        }
        Err(err) => {
            eprintln!("{}: {}", config.name, err);
            status::FAILURE
        }
    };

    let _ = io::stdout().flush();
    process::exit(code & 0xff);
}
