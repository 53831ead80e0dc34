pub mod auth;
pub mod branches;
pub mod chats;
pub mod errors;
pub mod extract;
pub mod messages;
pub mod middleware;
pub mod state;

use axum::{extract::State, Json};
use serde_json::{json, Value};

pub use state::AppState;

pub async fn root(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "message": format!("Welcome to the {}", state.settings.app_name),
        "api_prefix": state.settings.api_prefix,
    }))
}

pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}
