use serde_json::json;

use crate::dataset::number_text;
use crate::ipc::error::err;
use crate::ipc::types::{AppState, Request};
use crate::session::Session;

pub fn session_ref<'a>(state: &'a AppState, req: &Request) -> Result<&'a Session, serde_json::Value> {
    state
        .session
        .as_ref()
        .ok_or_else(|| err(&req.id, "no_session", "open a dataset first", None))
}

pub fn session_mut<'a>(
    state: &'a mut AppState,
    req: &Request,
) -> Result<&'a mut Session, serde_json::Value> {
    state
        .session
        .as_mut()
        .ok_or_else(|| err(&req.id, "no_session", "open a dataset first", None))
}

pub fn required_str(req: &Request, key: &str) -> Result<String, serde_json::Value> {
    req.params
        .get(key)
        .and_then(|v| v.as_str())
        .map(|v| v.trim().to_string())
        .filter(|s| !s.is_empty())
        .ok_or_else(|| err(&req.id, "bad_params", format!("missing {}", key), None))
}

/// String parameter that may legitimately be empty.
pub fn required_text(req: &Request, key: &str) -> Result<String, serde_json::Value> {
    req.params
        .get(key)
        .and_then(|v| v.as_str())
        .map(|v| v.to_string())
        .ok_or_else(|| err(&req.id, "bad_params", format!("missing {}", key), None))
}

pub fn optional_str(req: &Request, key: &str) -> Option<String> {
    req.params
        .get(key)
        .and_then(|v| v.as_str())
        .map(|v| v.trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Record position from `params.index`.
pub fn required_index(req: &Request) -> Result<usize, serde_json::Value> {
    match req.params.get("index") {
        None => Err(err(&req.id, "bad_params", "missing index", None)),
        Some(v) => v.as_u64().map(|i| i as usize).ok_or_else(|| {
            err(
                &req.id,
                "bad_params",
                "index must be a non-negative integer",
                Some(json!({ "index": v })),
            )
        }),
    }
}

/// Week selector value. Accepts strings and numbers, since spreadsheets
/// often hold week numbers; numbers print the way loaded cells do.
pub fn week_param(req: &Request) -> Option<String> {
    match req.params.get("week") {
        Some(serde_json::Value::String(s)) => Some(s.trim().to_string()),
        Some(serde_json::Value::Number(n)) => n.as_f64().map(number_text),
        _ => None,
    }
}
