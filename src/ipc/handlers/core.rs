use crate::ipc::error::{err, lesson_err, ok};
use crate::ipc::helpers::{optional_str, required_str, session_mut, session_ref};
use crate::ipc::types::{AppState, Request};
use crate::listfmt::{format_list, ListMode};
use crate::session::Session;
use serde_json::json;
use std::path::PathBuf;
use tracing::warn;

pub fn session_summary(session: &Session) -> serde_json::Value {
    json!({
        "path": session.path().to_string_lossy(),
        "weekField": session.week_field(),
        "titleField": session.title_field(),
        "columns": session.dataset().columns(),
        "recordCount": session.dataset().len(),
        "exportDir": session.export_root().to_string_lossy(),
    })
}

fn handle_health(state: &mut AppState, req: &Request) -> serde_json::Value {
    ok(
        &req.id,
        json!({
            "version": env!("CARGO_PKG_VERSION"),
            "datasetPath": state.session.as_ref().map(|s| s.path().to_string_lossy().to_string())
        }),
    )
}

fn handle_session_open(state: &mut AppState, req: &Request) -> serde_json::Value {
    let path = match required_str(req, "path") {
        Ok(v) => PathBuf::from(v),
        Err(e) => return e,
    };

    let mut settings = state.settings.clone();
    if let Some(dir) = optional_str(req, "exportDir") {
        settings.export_dir = PathBuf::from(dir);
    }
    if let Some(sheet) = optional_str(req, "sheet") {
        settings.sheet = Some(sheet);
    }

    state.session = None;
    match Session::open(&path, settings) {
        Ok(session) => {
            let summary = session_summary(&session);
            state.session = Some(session);
            ok(&req.id, summary)
        }
        Err(e) => {
            warn!(path = %path.display(), error = %e, "failed to open dataset");
            lesson_err(&req.id, &e)
        }
    }
}

fn handle_session_reload(state: &mut AppState, req: &Request) -> serde_json::Value {
    let session = match session_mut(state, req) {
        Ok(s) => s,
        Err(e) => return e,
    };
    match session.reload() {
        Ok(()) => ok(&req.id, session_summary(session)),
        Err(e) => lesson_err(&req.id, &e),
    }
}

fn handle_session_close(state: &mut AppState, req: &Request) -> serde_json::Value {
    if let Err(e) = session_ref(state, req) {
        return e;
    }
    state.session = None;
    ok(&req.id, json!({ "closed": true }))
}

fn handle_format_list(req: &Request) -> serde_json::Value {
    let Some(text) = req.params.get("text").and_then(|v| v.as_str()) else {
        return err(&req.id, "bad_params", "missing text", None);
    };
    let mode = match req.params.get("numbered") {
        None => ListMode::Bulleted,
        Some(v) => match v.as_bool() {
            Some(true) => ListMode::Numbered,
            Some(false) => ListMode::Bulleted,
            None => {
                return err(
                    &req.id,
                    "bad_params",
                    "numbered must be boolean",
                    Some(json!({ "numbered": v })),
                )
            }
        },
    };
    ok(&req.id, json!({ "text": format_list(text, mode) }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "health" => Some(handle_health(state, req)),
        "session.open" => Some(handle_session_open(state, req)),
        "session.reload" => Some(handle_session_reload(state, req)),
        "session.close" => Some(handle_session_close(state, req)),
        "text.formatList" => Some(handle_format_list(req)),
        _ => None,
    }
}
