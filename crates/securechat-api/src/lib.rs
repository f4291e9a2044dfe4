pub mod auth;
pub mod contacts;
pub mod error;
pub mod expiry;
pub mod messages;
pub mod middleware;
pub mod reveal;

use axum::{
    Json, Router, middleware as axum_middleware,
    routing::{get, post},
};
use serde_json::{Value, json};

use crate::auth::AppState;
use crate::middleware::require_auth;

/// All API routes. Transport layers (CORS, tracing, static files) are added
/// by the server binary.
pub fn router(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/auth/otp", post(auth::send_otp))
        .route("/auth/verify", post(auth::verify_otp))
        .route("/health", get(health))
        .with_state(state.clone());

    let protected_routes = Router::new()
        .route("/contacts", get(contacts::get_contacts).post(contacts::add_contact))
        .route("/messages", get(messages::get_messages).post(messages::send_message))
        .route("/messages/{message_id}/image", get(messages::get_image))
        .route("/messages/{message_id}/reveal", post(messages::reveal_message))
        .route("/messages/{message_id}/auto-delete", post(messages::set_auto_delete))
        .layer(axum_middleware::from_fn_with_state(state.clone(), require_auth))
        .with_state(state);

    Router::new().merge(public_routes).merge(protected_routes)
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}
