mod backup;
mod config;
mod dataset;
mod error;
mod fields;
mod ipc;
mod listfmt;
mod pdf;
mod render;
mod session;

use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use serde_json::json;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Settings;
use crate::session::Session;

/// Lesson plan editor sidecar: JSON requests on stdin, one JSON reply per line on stdout.
#[derive(Parser, Debug)]
#[command(name = "lessond", version)]
struct Cli {
    /// Spreadsheet (.xlsx or .csv) to open at startup
    #[arg(long)]
    data: Option<PathBuf>,

    /// Directory receiving generated lesson plans
    #[arg(long)]
    export_dir: Option<PathBuf>,

    /// JSON settings file
    #[arg(long)]
    settings: Option<PathBuf>,

    /// Log at info level (LESSOND_LOG overrides)
    #[arg(short, long)]
    verbose: bool,
}

fn init_tracing(verbose: bool) {
    let filter = EnvFilter::try_from_env("LESSOND_LOG")
        .unwrap_or_else(|_| EnvFilter::new(if verbose { "info" } else { "warn" }));

    // stdout carries replies; logs must stay on stderr.
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let mut settings = match &cli.settings {
        Some(path) => Settings::from_file(path)?,
        None => Settings::default(),
    };
    if let Some(data) = cli.data {
        settings.data_path = Some(data);
    }
    if let Some(dir) = cli.export_dir {
        settings.export_dir = dir;
    }

    let mut state = ipc::AppState {
        settings,
        session: None,
    };

    if let Some(path) = state.settings.data_path.clone() {
        match Session::open(&path, state.settings.clone()) {
            Ok(session) => state.session = Some(session),
            Err(e) => {
                error!(path = %path.display(), error = %e, "cannot start without dataset");
                return Err(e).with_context(|| format!("failed to open {}", path.display()));
            }
        }
    }
    info!("lessond v{} ready", env!("CARGO_PKG_VERSION"));

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    for line in stdin.lock().lines() {
        let line = match line {
            Ok(v) => v,
            Err(_) => break,
        };
        if line.trim().is_empty() {
            continue;
        }

        let req: ipc::Request = match serde_json::from_str(&line) {
            Ok(v) => v,
            Err(e) => {
                // Can't reply without id.
                let _ = writeln!(
                    stdout,
                    "{}",
                    json!({ "ok": false, "error": { "code": "bad_json", "message": e.to_string() } })
                );
                let _ = stdout.flush();
                continue;
            }
        };

        let resp = ipc::handle_request(&mut state, req);
        let _ = writeln!(
            stdout,
            "{}",
            serde_json::to_string(&resp).unwrap_or_else(|_| "{\"ok\":false}".to_string())
        );
        let _ = stdout.flush();
    }
    Ok(())
}
