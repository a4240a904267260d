mod backup;
mod calc;
mod color;
mod config;
mod controller;
mod db;
mod error;
mod ipc;
mod model;
mod schedule;

use clap::Parser;
use std::io::{self, BufRead, Write};

fn main() {
    let cfg = config::Config::parse();
    config::init_tracing(&cfg.log_filter);
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "becadosd starting");

    let mut state = ipc::AppState::new();
    if let Some(path) = cfg.workspace.as_ref() {
        match db::open_db(path) {
            Ok(conn) => {
                tracing::info!(workspace = %path.to_string_lossy(), "workspace opened");
                state.workspace = Some(path.clone());
                state.db = Some(conn);
            }
            Err(e) => tracing::warn!(error = %e, "could not open startup workspace"),
        }
    }

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
                let body = serde_json::json!({
                    "ok": false,
                    "error": { "code": "bad_json", "message": e.to_string() }
                });
                let _ = writeln!(stdout, "{}", body);
                let _ = stdout.flush();
                continue;
            }
        };

        tracing::debug!(id = %req.id, method = %req.method, "request");
        let resp = ipc::handle_request(&mut state, req);
        let _ = writeln!(
            stdout,
            "{}",
            serde_json::to_string(&resp).unwrap_or_else(|_| "{\"ok\":false}".to_string())
        );
        let _ = stdout.flush();
    }
    tracing::info!("stdin closed, shutting down");
}
