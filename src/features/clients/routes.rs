use std::sync::Arc;

use axum::{
    routing::{patch, post},
    Router,
};

use crate::features::clients::handlers;
use crate::features::clients::services::ClientService;

/// Create public routes for the clients feature
pub fn routes(client_service: Arc<ClientService>) -> Router {
    Router::new()
        .route("/api/auth", post(handlers::authenticate_client))
        .with_state(client_service)
}

/// Create operator routes (caller applies basic-auth protection)
pub fn admin_routes(client_service: Arc<ClientService>) -> Router {
    Router::new()
        .route(
            "/api/clients/{client_id}/active",
            patch(handlers::set_client_active),
        )
        .route(
            "/api/clients/{client_id}/policy",
            patch(handlers::update_client_policy),
        )
        .with_state(client_service)
}
