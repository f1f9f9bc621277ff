use crate::utils::config::Config;
use chrono::Local;
use env_logger::{Builder, Target};
use log::LevelFilter;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::process;

fn level_from(name: &str) -> LevelFilter {
    match name {
        level if level.eq_ignore_ascii_case("off") => LevelFilter::Off,
        level if level.eq_ignore_ascii_case("error") => LevelFilter::Error,
        level if level.eq_ignore_ascii_case("warn") => LevelFilter::Warn,
        level if level.eq_ignore_ascii_case("info") => LevelFilter::Info,
        level if level.eq_ignore_ascii_case("debug") => LevelFilter::Debug,
        level if level.eq_ignore_ascii_case("trace") => LevelFilter::Trace,
        _ => LevelFilter::Warn,
    }
}

fn open_log_file(config: &Config) -> Option<File> {
    let dir = config.logger_dir.as_ref()?;
    let date = Local::now().format("%Y-%m-%d");
    let path = dir.join(format!("{}_{}.log", config.name, date));

    let opened = fs::create_dir_all(dir).and_then(|_| {
        OpenOptions::new().create(true).append(true).open(&path)
    });
    match opened {
        Ok(file) => Some(file),
        Err(e) => {
            eprintln!("{}: cannot open log file {}: {}", config.name, path.display(), e);
            None
        }
    }
}

/// Installs the global logger. Stdout belongs to the script, so records go to
/// stderr and, when configured, to a dated file.
pub fn init_logger(config: &Config) {
    let level = level_from(&config.logger_level);

    let mut writers: Vec<Box<dyn Write + Send + Sync>> = vec![Box::new(io::stderr())];
    if let Some(file) = open_log_file(config) {
        writers.push(Box::new(file));
    }

    let initialized = Builder::new()
        .format(|buf, record| {
            writeln!(
                buf,
                "[PID:{}][{}] {} - {}",
                process::id(),
                record.level(),
                Local::now().format("%Y-%m-%d %H:%M:%S"),
                record.args()
            )
        })
        .target(Target::Pipe(Box::new(MultiWriter { writers })))
        .filter(Some(&config.name), level)
        .filter(None, LevelFilter::Warn)
        .try_init();

    if initialized.is_ok() {
        log::debug!("log level set to {}", level);
    }
}

struct MultiWriter {
    writers: Vec<Box<dyn Write + Send + Sync>>,
}

impl Write for MultiWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        for writer in &mut self.writers {
            writer.write_all(buf)?;
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        for writer in &mut self.writers {
            writer.flush()?;
        }
        Ok(())
    }
}
