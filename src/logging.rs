//! Logger setup for the binaries
//!
//! Log lines go to stderr and, when it can be opened, to the configured log
//! file. The level comes from `RUST_LOG` and defaults to `info`.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::Path;

/// Writes every line to stderr and a log file
struct Tee {
    file: File,
}

impl Write for Tee {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        io::stderr().write_all(buf)?;
        self.file.write_all(buf)?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        io::stderr().flush()?;
        self.file.flush()
    }
}

fn open_log_file(path: &Path) -> io::Result<File> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        fs::create_dir_all(dir)?;
    }
    OpenOptions::new().create(true).append(true).open(path)
}

fn builder() -> env_logger::Builder {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
}

/// Initialize logging to stderr only
pub fn init() {
    let _ = builder().target(env_logger::Target::Stderr).try_init();
}

/// Initialize logging to stderr plus `log_file`.
///
/// Falls back to stderr alone when the file cannot be opened. Calling this
/// after a logger is already installed has no effect.
pub fn init_with_file(log_file: &Path) {
    match open_log_file(log_file) {
        Ok(file) => {
            let _ = builder()
                .target(env_logger::Target::Pipe(Box::new(Tee { file })))
                .try_init();
            log::info!("Logging to stderr and {}", log_file.display());
        }
        Err(e) => {
            init();
            log::warn!("Cannot open log file {}: {}; logging to stderr only", log_file.display(), e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_log_file_creates_dirs() {
        let dir = std::env::temp_dir()
            .join(format!("mortgage_cashflow_log_{}", std::process::id()))
            .join("nested");
        let path = dir.join("app.log");

        let mut file = open_log_file(&path).unwrap();
        writeln!(file, "hello").unwrap();
        assert!(fs::read_to_string(&path).unwrap().contains("hello"));

        let _ = fs::remove_dir_all(dir.parent().unwrap());
    }

    #[test]
    fn test_init_is_repeatable() {
        // Later calls are no-ops
        init();
        init();
        let path = std::env::temp_dir().join(format!("mortgage_cashflow_init_{}.log", std::process::id()));
        init_with_file(&path);
        log::info!("logger still usable");
        let _ = fs::remove_file(&path);
    }

    #[test]
    fn test_tee_writes_file() {
        let path = std::env::temp_dir().join(format!("mortgage_cashflow_tee_{}.log", std::process::id()));
        let file = open_log_file(&path).unwrap();
        let mut tee = Tee { file };
        tee.write_all(b"line\n").unwrap();
        tee.flush().unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "line\n");
        let _ = fs::remove_file(&path);
    }
}
