//! Configuration loading and parsing.
//!
//! Parses `oxed.toml` (or an override path provided by the binary). Every
//! section and key is optional; unknown fields are ignored so older binaries
//! tolerate newer files. A file that fails to parse falls back to defaults
//! with a warning rather than refusing to start.
//!
//! Raw values are kept as parsed. `Config::limits` clamps them into the
//! ranges the engine accepts and logs each clamp under the `config` target.

use anyhow::Result;
use serde::Deserialize;
use std::{fs, path::PathBuf};
use tracing::{info, warn};

/// Hard ceiling on session slots regardless of configuration.
pub const SESSIONS_CEILING: usize = 1000;
/// Smallest substitution scratch size accepted.
pub const MIN_LINE_LENGTH: usize = 256;

#[derive(Debug, Deserialize, Clone)]
pub struct SessionsConfig {
    #[serde(default = "SessionsConfig::default_max")]
    pub max: usize,
}

impl Default for SessionsConfig {
    fn default() -> Self {
        Self {
            max: Self::default_max(),
        }
    }
}

impl SessionsConfig {
    const fn default_max() -> usize {
        100
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct LimitsConfig {
    #[serde(default = "LimitsConfig::default_max_lines")]
    pub max_lines: usize,
    #[serde(default = "LimitsConfig::default_max_line_length")]
    pub max_line_length: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_lines: Self::default_max_lines(),
            max_line_length: Self::default_max_line_length(),
        }
    }
}

impl LimitsConfig {
    const fn default_max_lines() -> usize {
        1_000_000
    }
    const fn default_max_line_length() -> usize {
        50_000
    }
}

#[derive(Debug, Deserialize, Default, Clone)]
pub struct DisplayConfig {
    #[serde(default)]
    pub prompt: String,
}

#[derive(Debug, Deserialize, Default, Clone)]
pub struct ConfigFile {
    #[serde(default)]
    pub sessions: SessionsConfig,
    #[serde(default)]
    pub limits: LimitsConfig,
    #[serde(default)]
    pub display: DisplayConfig,
}

#[derive(Debug, Clone, Default)]
pub struct Config {
    pub raw: Option<String>, // original file string (optional)
    pub file: ConfigFile,    // parsed (or default) data
}

/// Engine limits after clamping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EffectiveLimits {
    pub max_sessions: usize,
    pub max_lines: usize,
    pub max_line_length: usize,
}

/// Best-effort config path following platform conventions (XDG / AppData Roaming).
pub fn discover() -> PathBuf {
    let local = PathBuf::from("oxed.toml");
    if local.exists() {
        return local;
    }
    if let Some(dir) = dirs::config_dir() {
        return dir.join("oxed").join("oxed.toml");
    }
    PathBuf::from("oxed.toml")
}

pub fn load_from(path: Option<PathBuf>) -> Result<Config> {
    let path = path.unwrap_or_else(discover);
    if let Ok(content) = fs::read_to_string(&path) {
        match toml::from_str::<ConfigFile>(&content) {
            Ok(file) => Ok(Config {
                raw: Some(content),
                file,
            }),
            Err(e) => {
                warn!(target: "config", path = %path.display(), error = %e, "config_parse_failed");
                Ok(Config::default())
            }
        }
    } else {
        Ok(Config::default())
    }
}

impl Config {
    /// Clamp raw values into the ranges the engine accepts.
    pub fn limits(&self) -> EffectiveLimits {
        let raw_sessions = self.file.sessions.max;
        let max_sessions = raw_sessions.clamp(1, SESSIONS_CEILING);
        if max_sessions != raw_sessions {
            info!(target: "config", raw = raw_sessions, clamped = max_sessions, "sessions_max_clamped");
        }
        let raw_lines = self.file.limits.max_lines;
        let max_lines = raw_lines.max(1);
        if max_lines != raw_lines {
            info!(target: "config", raw = raw_lines, clamped = max_lines, "max_lines_clamped");
        }
        let raw_len = self.file.limits.max_line_length;
        let max_line_length = raw_len.max(MIN_LINE_LENGTH);
        if max_line_length != raw_len {
            info!(target: "config", raw = raw_len, clamped = max_line_length, "max_line_length_clamped");
        }
        EffectiveLimits {
            max_sessions,
            max_lines,
            max_line_length,
        }
    }

    pub fn prompt(&self) -> &str {
        &self.file.display.prompt
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::sync::{Arc, Mutex, MutexGuard};
    use tracing::Level;
    use tracing::subscriber::with_default;
    use tracing_subscriber::fmt::MakeWriter;

    #[derive(Clone)]
    struct BufferWriter {
        inner: Arc<Mutex<Vec<u8>>>,
    }

    impl BufferWriter {
        fn new() -> (Self, Arc<Mutex<Vec<u8>>>) {
            let buf = Arc::new(Mutex::new(Vec::new()));
            (Self { inner: buf.clone() }, buf)
        }
    }

    struct LockedWriter<'a> {
        guard: MutexGuard<'a, Vec<u8>>,
    }

    impl<'a> Write for LockedWriter<'a> {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.guard.extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    impl<'a> MakeWriter<'a> for BufferWriter {
        type Writer = LockedWriter<'a>;

        fn make_writer(&'a self) -> Self::Writer {
            LockedWriter {
                guard: self.inner.lock().expect("log buffer poisoned"),
            }
        }
    }

    fn write_config(body: &str) -> tempfile::NamedTempFile {
        let tmp = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(tmp.path(), body).unwrap();
        tmp
    }

    #[test]
    fn default_config_when_missing_file() {
        let cfg = load_from(Some(PathBuf::from("__nonexistent_hopefully__.toml"))).unwrap();
        assert!(cfg.raw.is_none());
        assert_eq!(cfg.file.sessions.max, 100);
        assert_eq!(cfg.file.limits.max_lines, 1_000_000);
        assert_eq!(cfg.file.limits.max_line_length, 50_000);
        assert_eq!(cfg.prompt(), "");
    }

    #[test]
    fn parses_all_sections() {
        let tmp = write_config(
            "[sessions]\nmax = 12\n[limits]\nmax_lines = 500\nmax_line_length = 4096\n[display]\nprompt = \"* \"\n",
        );
        let cfg = load_from(Some(tmp.path().to_path_buf())).unwrap();
        let limits = cfg.limits();
        assert_eq!(limits.max_sessions, 12);
        assert_eq!(limits.max_lines, 500);
        assert_eq!(limits.max_line_length, 4096);
        assert_eq!(cfg.prompt(), "* ");
    }

    #[test]
    fn partial_sections_keep_defaults() {
        let tmp = write_config("[limits]\nmax_lines = 9\n");
        let cfg = load_from(Some(tmp.path().to_path_buf())).unwrap();
        assert_eq!(cfg.file.limits.max_lines, 9);
        assert_eq!(cfg.file.limits.max_line_length, 50_000);
        assert_eq!(cfg.file.sessions.max, 100);
    }

    #[test]
    fn parse_error_falls_back_to_defaults() {
        let tmp = write_config("[sessions\nmax = ");
        let cfg = load_from(Some(tmp.path().to_path_buf())).unwrap();
        assert!(cfg.raw.is_none());
        assert_eq!(cfg.file.sessions.max, 100);
    }

    #[test]
    fn clamps_out_of_range_values() {
        let tmp = write_config("[sessions]\nmax = 0\n[limits]\nmax_lines = 0\nmax_line_length = 3\n");
        let cfg = load_from(Some(tmp.path().to_path_buf())).unwrap();
        let limits = cfg.limits();
        assert_eq!(limits.max_sessions, 1);
        assert_eq!(limits.max_lines, 1);
        assert_eq!(limits.max_line_length, MIN_LINE_LENGTH);
    }

    #[test]
    fn clamp_logging_uses_config_target() {
        let tmp = write_config("[sessions]\nmax = 5000\n");
        let cfg = load_from(Some(tmp.path().to_path_buf())).unwrap();
        let (writer, buffer) = BufferWriter::new();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(Level::INFO)
            .with_target(true)
            .with_ansi(false)
            .without_time()
            .with_writer(writer)
            .finish();

        let limits = with_default(subscriber, || cfg.limits());

        let log_output = String::from_utf8(buffer.lock().unwrap().clone()).unwrap();
        assert!(log_output.contains("INFO config:"));
        assert!(log_output.contains("sessions_max_clamped"));
        assert_eq!(limits.max_sessions, SESSIONS_CEILING);
    }
}
