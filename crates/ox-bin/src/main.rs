//! oxed entrypoint: a line-oriented command loop over stdin.
use anyhow::Result;
use clap::Parser;
use core_actions::dispatch;
use core_config::load_from;
use core_model::EditorEngine;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::sync::Once;
use tracing::{debug, info, warn};
use tracing_appender::non_blocking::WorkerGuard;

/// CLI arguments.
#[derive(Parser, Debug)]
#[command(name = "oxed", version, about = "Line editor with sessions and a browse stack")]
struct Args {
    /// File or directory to load into session 1.
    pub path: Option<PathBuf>,
    /// Configuration file path (overrides discovery of `oxed.toml`).
    #[arg(long = "config")]
    pub config: Option<PathBuf>,
}

struct AppStartup {
    log_guard: Option<WorkerGuard>,
}

impl AppStartup {
    fn new() -> Self {
        Self { log_guard: None }
    }

    fn configure_logging(&mut self) -> Result<()> {
        let log_dir = Path::new(".");
        let log_path = log_dir.join("oxed.log");
        if log_path.exists() {
            let _ = std::fs::remove_file(&log_path);
        }

        let file_appender = tracing_appender::rolling::never(log_dir, "oxed.log");
        let (nb_writer, guard) = tracing_appender::non_blocking(file_appender);
        match tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_writer(nb_writer)
            .with_ansi(false)
            .try_init()
        {
            Ok(_) => {
                self.log_guard = Some(guard);
            }
            Err(_err) => {
                // Global tracing subscriber already installed; drop guard so writer shuts down.
            }
        }
        Ok(())
    }

    fn install_panic_hook() {
        static HOOK: Once = Once::new();
        HOOK.call_once(|| {
            let default_panic = std::panic::take_hook();
            std::panic::set_hook(Box::new(move |info| {
                tracing::error!(target: "runtime.panic", ?info, "panic");
                default_panic(info);
            }));
        });
    }
}

/// Print a command's output, or `?` and the reason it failed.
fn report(out: &mut impl Write, result: core_state::EditResult<core_actions::DispatchResult>) -> io::Result<bool> {
    match result {
        Ok(res) => {
            for line in &res.output {
                writeln!(out, "{line}")?;
            }
            Ok(res.quit)
        }
        Err(e) => {
            writeln!(out, "? {e}")?;
            Ok(false)
        }
    }
}

fn main() -> Result<()> {
    let mut startup = AppStartup::new();
    startup.configure_logging()?;
    AppStartup::install_panic_hook();

    let args = Args::parse();
    let config = load_from(args.config.clone())?;
    let mut engine = EditorEngine::from_config(&config);
    info!(
        target: "runtime",
        path = ?args.path,
        config_override = args.config.is_some(),
        limits = ?engine.limits(),
        "startup"
    );

    let stdout = io::stdout();
    let mut out = stdout.lock();
    if let Some(path) = &args.path {
        let cmd = format!("e {}", path.display());
        if report(&mut out, dispatch(&mut engine, &cmd))? {
            return Ok(());
        }
    }

    let prompt = config.prompt().to_string();
    let stdin = io::stdin();
    let mut input = stdin.lock();
    let mut line = String::new();
    loop {
        if !prompt.is_empty() && engine.text_entry().is_none() {
            write!(out, "{prompt}")?;
        }
        out.flush()?;
        line.clear();
        if input.read_line(&mut line)? == 0 {
            debug!(target: "runtime", "eof");
            break;
        }
        if report(&mut out, dispatch(&mut engine, &line))? {
            break;
        }
    }
    if engine.window().is_changed() {
        warn!(target: "runtime", session = engine.current_session(), "exit_with_unsaved_changes");
    }
    info!(target: "runtime", "shutdown");
    Ok(())
}
