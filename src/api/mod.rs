use crate::state::AppState;
use axum::Router;
use axum::routing::{get, post};
use std::sync::{Arc, RwLock};
use tokio::sync::mpsc;

pub mod handlers;
pub mod responses;

/// Shared handles for the HTTP handlers.
#[derive(Clone)]
pub struct ApiState {
    pub state: Arc<RwLock<AppState>>,
    pub inbound: mpsc::Sender<String>,
}

pub fn router(state: Arc<RwLock<AppState>>, inbound: mpsc::Sender<String>) -> Router {
    Router::new()
        .route("/api/status", get(handlers::get_status))
        .route("/api/response", post(handlers::post_response))
        .with_state(ApiState { state, inbound })
}
