use serde::Deserialize;

use crate::config::Settings;
use crate::session::Session;

#[derive(Debug, Deserialize, Clone)]
pub struct Request {
    pub id: String,
    pub method: String,
    #[serde(default)]
    pub params: serde_json::Value,
}

pub struct AppState {
    pub settings: Settings,
    pub session: Option<Session>,
}
