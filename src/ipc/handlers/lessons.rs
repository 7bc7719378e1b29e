use crate::ipc::error::{err, lesson_err, ok};
use crate::ipc::helpers::{
    required_index, required_str, required_text, session_mut, session_ref, week_param,
};
use crate::ipc::types::{AppState, Request};
use crate::session::EditOutcome;
use chrono::Local;
use serde_json::{json, Map, Value as JsonValue};

fn handle_weeks_list(state: &mut AppState, req: &Request) -> serde_json::Value {
    let session = match session_ref(state, req) {
        Ok(s) => s,
        Err(e) => return e,
    };
    ok(&req.id, json!({ "weeks": session.weeks() }))
}

fn require_week(req: &Request) -> Result<String, serde_json::Value> {
    week_param(req).ok_or_else(|| err(&req.id, "bad_params", "missing week", None))
}

fn handle_titles(state: &mut AppState, req: &Request) -> serde_json::Value {
    let session = match session_ref(state, req) {
        Ok(s) => s,
        Err(e) => return e,
    };
    let week = match require_week(req) {
        Ok(v) => v,
        Err(e) => return e,
    };
    ok(
        &req.id,
        json!({ "week": week, "titles": session.titles(&week) }),
    )
}

fn handle_select(state: &mut AppState, req: &Request) -> serde_json::Value {
    let session = match session_ref(state, req) {
        Ok(s) => s,
        Err(e) => return e,
    };
    let week = match require_week(req) {
        Ok(v) => v,
        Err(e) => return e,
    };
    let title = match required_text(req, "title") {
        Ok(v) => v,
        Err(e) => return e,
    };
    ok(
        &req.id,
        json!({ "index": session.find(&week, &title) }),
    )
}

fn handle_get(state: &mut AppState, req: &Request) -> serde_json::Value {
    let session = match session_ref(state, req) {
        Ok(s) => s,
        Err(e) => return e,
    };
    let index = match required_index(req) {
        Ok(v) => v,
        Err(e) => return e,
    };
    let record = match session.record(index) {
        Ok(r) => r,
        Err(e) => return lesson_err(&req.id, &e),
    };

    let mut values = Map::new();
    for (field, value) in record.iter() {
        values.insert(field.to_string(), JsonValue::String(value.to_string()));
    }
    let (left, right) = session.form_fields();
    let form_column = |fields: &[String]| -> Vec<JsonValue> {
        fields
            .iter()
            .map(|f| json!({ "field": f, "value": record.text(f) }))
            .collect()
    };

    ok(
        &req.id,
        json!({
            "index": index,
            "week": record.text(session.week_field()),
            "title": record.text(session.title_field()),
            "columns": session.dataset().columns(),
            "record": values,
            "form": {
                "left": form_column(&left),
                "right": form_column(&right),
            }
        }),
    )
}

fn handle_update(state: &mut AppState, req: &Request) -> serde_json::Value {
    let index = match required_index(req) {
        Ok(v) => v,
        Err(e) => return e,
    };
    let field = match required_str(req, "field") {
        Ok(v) => v,
        Err(e) => return e,
    };
    let value = match required_text(req, "value") {
        Ok(v) => v,
        Err(e) => return e,
    };
    let session = match session_mut(state, req) {
        Ok(s) => s,
        Err(e) => return e,
    };

    match session.edit_field(index, &field, &value) {
        Ok(outcome) => ok(
            &req.id,
            json!({
                "saved": outcome == EditOutcome::Saved,
                "skipped": outcome == EditOutcome::Skipped,
            }),
        ),
        Err(e) => lesson_err(&req.id, &e),
    }
}

fn handle_create(state: &mut AppState, req: &Request) -> serde_json::Value {
    let session = match session_mut(state, req) {
        Ok(s) => s,
        Err(e) => return e,
    };
    let week = match week_param(req) {
        Some(w) => w,
        None => session
            .weeks()
            .into_iter()
            .next()
            .unwrap_or_else(|| crate::fields::DEFAULT_WEEK_VALUE.to_string()),
    };

    let index = match session.add_record(&week, Local::now().naive_local()) {
        Ok(i) => i,
        Err(e) => return lesson_err(&req.id, &e),
    };
    let title = session
        .record(index)
        .map(|r| r.text(session.title_field()).to_string())
        .unwrap_or_default();
    ok(
        &req.id,
        json!({
            "index": index,
            "week": week,
            "title": title,
            "recordCount": session.dataset().len(),
        }),
    )
}

fn handle_preview(state: &mut AppState, req: &Request) -> serde_json::Value {
    let session = match session_ref(state, req) {
        Ok(s) => s,
        Err(e) => return e,
    };
    let week = match require_week(req) {
        Ok(v) => v,
        Err(e) => return e,
    };

    let columns = session.preview_columns();
    let rows: Vec<JsonValue> = session
        .week_records(&week)
        .map(|r| {
            json!({
                "index": r.index,
                "cells": columns.iter().map(|c| r.text(c)).collect::<Vec<_>>(),
            })
        })
        .collect();
    ok(
        &req.id,
        json!({ "week": week, "columns": columns, "rows": rows }),
    )
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "weeks.list" => Some(handle_weeks_list(state, req)),
        "lessons.titles" => Some(handle_titles(state, req)),
        "lessons.select" => Some(handle_select(state, req)),
        "lessons.get" => Some(handle_get(state, req)),
        "lessons.update" => Some(handle_update(state, req)),
        "lessons.create" => Some(handle_create(state, req)),
        "lessons.preview" => Some(handle_preview(state, req)),
        _ => None,
    }
}
