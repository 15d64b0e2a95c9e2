use crate::{
    config::Config,
    log::{log_level::LogLevel, log_msg::LogMsg, logger_handle::LoggerHandle},
};

use std::{
    fs::{self, OpenOptions},
    io::{BufWriter, Write},
    path::{Path, PathBuf},
    sync::mpsc,
    thread,
};

/// Flush to disk every 100 lines if debugging/tracing.
#[cfg(feature = "log-debug")]
const FLUSH_BATCH_SIZE: u32 = 100;

/// Flush to disk every 1000 lines otherwise.
#[cfg(not(feature = "log-debug"))]
const FLUSH_BATCH_SIZE: u32 = 1_000;

const DEFAULT_QUEUE_CAP: usize = 4_096;

/// Bounded, non-blocking logger that writes to a per-process log file.
///
/// Producers (sessions) hold a cloned [`LoggerHandle`] and enqueue lines without
/// blocking; a dedicated worker thread drains the queue and appends to the file.
/// Dropping every handle (including the one owned here) ends the worker.
pub struct Logger {
    handle: LoggerHandle,
    thread: Option<thread::JoinHandle<()>>,
    file_path: PathBuf,
}

impl Logger {
    /// Starts a logger from the `[logging]` section of `config`.
    ///
    /// Keys: `path` (directory, defaults to `./logs`), `file_name` (file prefix,
    /// defaults to `srtp`), `level` (minimum level, defaults to `info`).
    pub fn from_config(config: &Config) -> Result<Self, String> {
        let dir = expand_path(config.get_non_empty_or_default("logging", "path", "logs"));
        let name = config.get_non_empty_or_default("logging", "file_name", "srtp");
        let level_name = config.get_non_empty_or_default("logging", "level", "info");
        let level = LogLevel::from_name(level_name)
            .ok_or_else(|| format!("unknown log level: {level_name}"))?;
        Self::start_in_dir(dir, name, DEFAULT_QUEUE_CAP, level)
    }

    /// Starts the logger in `dir`, creating it if missing.
    ///
    /// The file is named `<app_name>-<unix_secs>-pid<pid>.log`.
    pub fn start_in_dir<D: AsRef<Path>>(
        dir: D,
        app_name: &str,
        cap: usize,
        min_level: LogLevel,
    ) -> Result<Self, String> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)
            .map_err(|e| format!("cannot create log dir {}: {e}", dir.display()))?;

        let secs = LogMsg::now(LogLevel::Info, "", module_path!()).ts_ms / 1_000;
        let file_path = dir.join(format!("{app_name}-{secs}-pid{}.log", std::process::id()));

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&file_path)
            .map_err(|e| format!("cannot open log file {}: {e}", file_path.display()))?;

        let (tx, rx) = mpsc::sync_channel::<LogMsg>(cap.max(1));
        let handle = LoggerHandle { tx, min_level };

        let thread = thread::Builder::new()
            .name("srtp-logger".into())
            .spawn(move || write_loop(rx, BufWriter::new(file)))
            .map_err(|e| format!("cannot spawn logger thread: {e}"))?;

        Ok(Self {
            handle,
            thread: Some(thread),
            file_path,
        })
    }

    /// Returns a cloneable handle to pass into sessions.
    #[must_use]
    pub fn handle(&self) -> LoggerHandle {
        self.handle.clone()
    }

    /// Path of the active log file.
    #[must_use]
    pub fn file_path(&self) -> &Path {
        &self.file_path
    }

    /// Drops the owned handle and waits for the worker to flush.
    ///
    /// Lines from handles still alive elsewhere keep the worker running, so callers
    /// should drop sessions first.
    pub fn shutdown(self) {
        let Self { handle, thread, .. } = self;
        drop(handle);
        if let Some(t) = thread {
            let _ = t.join();
        }
    }
}

fn write_loop<W: Write>(rx: mpsc::Receiver<LogMsg>, mut out: W) {
    let mut lines_written: u32 = 0;
    while let Ok(m) = rx.recv() {
        let _ = writeln!(
            &mut out,
            "[{:?}] {} {} | {}",
            m.level, m.ts_ms, m.target, m.text
        );
        lines_written = lines_written.wrapping_add(1);
        if lines_written.is_multiple_of(FLUSH_BATCH_SIZE) {
            let _ = out.flush();
        }
    }
    let _ = out.flush();
}

/// Expands a leading `~` to the user's home directory.
fn expand_path(path_str: &str) -> PathBuf {
    if let Some(rest) = path_str.strip_prefix('~') {
        let home = std::env::var("HOME")
            .or_else(|_| std::env::var("USERPROFILE"))
            .ok()
            .map(PathBuf::from);
        if let Some(mut home_path) = home {
            if rest.is_empty() {
                return home_path;
            }
            if let Some(tail) = rest.strip_prefix('/').or_else(|| rest.strip_prefix('\\')) {
                home_path.push(tail);
                return home_path;
            }
        }
    }
    PathBuf::from(path_str)
}
