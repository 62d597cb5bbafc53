//! keyscope - interactive demo of nested, focus-aware key scopes

mod demo;

use anyhow::Context;
use keyscope::config::load_key_maps;
use std::env;
use std::path::{Path, PathBuf};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

const DEFAULT_LOG_FILTER: &str = "keyscope=info,keyscope_core=debug,keyscope_term=debug";

fn print_usage() {
    eprintln!("Usage: keyscope [OPTIONS]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --keymap-file <path>      Load key maps from TOML file");
    eprintln!("  --log-file <path>         Write logs to file (filter with RUST_LOG)");
    eprintln!("  -h, --help                Print help");
}

fn init_logging(path: &Path) -> anyhow::Result<WorkerGuard> {
    let directory = path
        .parent()
        .filter(|dir| !dir.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let file_name = path
        .file_name()
        .with_context(|| format!("--log-file needs a file name: {}", path.display()))?;
    let file_appender = tracing_appender::rolling::never(directory, file_name);
    let (writer, guard) = tracing_appender::non_blocking(file_appender);

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(writer).with_ansi(false))
        .init();
    Ok(guard)
}

fn main() -> anyhow::Result<()> {
    let args: Vec<String> = env::args().collect();

    let mut keymap_file: Option<PathBuf> = None;
    let mut log_file: Option<PathBuf> = None;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "-h" | "--help" => {
                print_usage();
                return Ok(());
            }
            "--keymap-file" => {
                i += 1;
                if i >= args.len() {
                    eprintln!("Error: --keymap-file requires a file path");
                    std::process::exit(1);
                }
                keymap_file = Some(PathBuf::from(&args[i]));
            }
            "--log-file" => {
                i += 1;
                if i >= args.len() {
                    eprintln!("Error: --log-file requires a file path");
                    std::process::exit(1);
                }
                log_file = Some(PathBuf::from(&args[i]));
            }
            arg => {
                eprintln!("Error: Unknown option: {}", arg);
                print_usage();
                std::process::exit(1);
            }
        }
        i += 1;
    }

    // Must outlive the app so buffered log lines are flushed.
    let _log_guard = log_file.as_deref().map(init_logging).transpose()?;

    let (key_maps, warnings) = load_key_maps(keymap_file.as_ref());
    for warning in warnings {
        tracing::warn!("{}", warning);
        eprintln!("Warning: {}", warning);
    }
    let configured: Vec<&str> = key_maps.configured().collect();
    tracing::info!(
        description = key_maps.description().unwrap_or_default(),
        ?configured,
        "key maps loaded"
    );

    let mut app = demo::App::new(key_maps).context("failed to mount key scopes")?;
    tracing::info!("demo started");
    demo::run(&mut app)
}
