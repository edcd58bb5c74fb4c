use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};

use crate::features::clients::services::ClientService;
use crate::features::uploads::handlers::{self, UploadState};
use crate::features::uploads::services::{FileRecordService, IntakeService};

/// Create routes for the uploads feature.
///
/// Authentication is in-band (form fields on the upload, credential
/// headers on the queries), so no middleware layer is applied here.
pub fn routes(
    intake: Arc<IntakeService>,
    records: Arc<FileRecordService>,
    clients: Arc<ClientService>,
    max_body_size: usize,
) -> Router {
    let state = UploadState {
        intake,
        records,
        clients,
    };

    Router::new()
        .route(
            "/api/uploads",
            // Body limit sits above the per-client cap; multipart overhead included
            post(handlers::upload_file).layer(DefaultBodyLimit::max(max_body_size)),
        )
        .route("/api/uploads", get(handlers::list_files))
        .route("/api/uploads/{id}", get(handlers::get_file))
        .route("/api/uploads/{id}/rows", get(handlers::get_rows))
        .route("/api/uploads/{id}/report", get(handlers::get_report))
        .with_state(state)
}
