use crate::backup;
use crate::error::LessonError;
use crate::ipc::error::{lesson_err, ok};
use crate::ipc::handlers::core::session_summary;
use crate::ipc::helpers::{required_index, required_str, session_mut, session_ref};
use crate::ipc::types::{AppState, Request};
use chrono::Local;
use serde_json::json;
use std::path::PathBuf;
use tracing::info;

fn handle_render(state: &mut AppState, req: &Request) -> serde_json::Value {
    let session = match session_ref(state, req) {
        Ok(s) => s,
        Err(e) => return e,
    };
    let index = match required_index(req) {
        Ok(v) => v,
        Err(e) => return e,
    };

    match session.render(index, Local::now().naive_local()) {
        Ok(path) => ok(
            &req.id,
            json!({
                "path": path.to_string_lossy(),
                "fileName": path.file_name().map(|s| s.to_string_lossy().to_string()),
            }),
        ),
        Err(e) => lesson_err(&req.id, &e),
    }
}

fn handle_save(state: &mut AppState, req: &Request) -> serde_json::Value {
    let session = match session_ref(state, req) {
        Ok(s) => s,
        Err(e) => return e,
    };
    match session.save() {
        Ok(()) => ok(
            &req.id,
            json!({ "recordCount": session.dataset().len() }),
        ),
        Err(e) => lesson_err(&req.id, &e),
    }
}

fn handle_backup(state: &mut AppState, req: &Request) -> serde_json::Value {
    let session = match session_ref(state, req) {
        Ok(s) => s,
        Err(e) => return e,
    };
    let out_path = match required_str(req, "outPath") {
        Ok(v) => PathBuf::from(v),
        Err(e) => return e,
    };

    match backup::export_dataset_bundle(session.path(), &out_path) {
        Ok(summary) => {
            info!(path = %out_path.display(), sha256 = %summary.sha256, "exported dataset bundle");
            ok(
                &req.id,
                json!({
                    "path": out_path.to_string_lossy(),
                    "bundleFormat": summary.bundle_format,
                    "entryCount": summary.entry_count,
                    "sha256": summary.sha256,
                }),
            )
        }
        Err(e) => lesson_err(&req.id, &LessonError::from(e)),
    }
}

fn handle_restore(state: &mut AppState, req: &Request) -> serde_json::Value {
    let in_path = match required_str(req, "inPath") {
        Ok(v) => PathBuf::from(v),
        Err(e) => return e,
    };
    let session = match session_mut(state, req) {
        Ok(s) => s,
        Err(e) => return e,
    };

    let summary = match backup::import_dataset_bundle(&in_path, session.path()) {
        Ok(s) => s,
        Err(e) => return lesson_err(&req.id, &LessonError::from(e)),
    };
    info!(
        path = %in_path.display(),
        dataset_file = %summary.dataset_file,
        "restored dataset bundle"
    );
    if let Err(e) = session.reload() {
        return lesson_err(&req.id, &e);
    }

    let mut result = session_summary(session);
    result["bundleFormatDetected"] = json!(summary.bundle_format_detected);
    ok(&req.id, result)
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "lessons.render" => Some(handle_render(state, req)),
        "dataset.save" => Some(handle_save(state, req)),
        "dataset.backup" => Some(handle_backup(state, req)),
        "dataset.restore" => Some(handle_restore(state, req)),
        _ => None,
    }
}
