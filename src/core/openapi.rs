use utoipa::openapi::security::{ApiKey, ApiKeyValue, HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::features::clients::{dtos as clients_dtos, handlers as clients_handlers};
use crate::features::dashboard::{dtos as dashboard_dtos, handlers as dashboard_handlers};
use crate::features::pipeline::report::ValidationReport;
use crate::features::uploads::models::FileStatus;
use crate::features::uploads::{dtos as uploads_dtos, handlers as uploads_handlers};
use crate::shared::constants::{ACCESS_TOKEN_HEADER, CLIENT_ID_HEADER};
use crate::shared::types::Meta;

#[derive(OpenApi)]
#[openapi(
    paths(
        // Auth
        clients_handlers::authenticate_client,
        // Clients (operator)
        clients_handlers::set_client_active,
        clients_handlers::update_client_policy,
        // Uploads
        uploads_handlers::upload_file,
        uploads_handlers::list_files,
        uploads_handlers::get_file,
        uploads_handlers::get_rows,
        uploads_handlers::get_report,
        // Dashboard (public)
        dashboard_handlers::get_summary,
        dashboard_handlers::list_uploads,
        dashboard_handlers::get_client_counts,
    ),
    components(
        schemas(
            // Shared
            Meta,
            FileStatus,
            // Auth
            clients_dtos::AuthRequestDto,
            clients_dtos::ClientProfileDto,
            // Clients (operator)
            clients_dtos::UpdateClientActiveDto,
            clients_dtos::UpdateClientPolicyDto,
            // Uploads
            uploads_dtos::UploadFileDto,
            uploads_dtos::FileRecordDto,
            uploads_dtos::StagedRowDto,
            ValidationReport,
            // Dashboard
            dashboard_dtos::DashboardSummaryDto,
            dashboard_dtos::DashboardUploadDto,
            dashboard_dtos::StatusCountDto,
        )
    ),
    tags(
        (name = "Auth", description = "Client credential handshake"),
        (name = "Clients", description = "Operator management of clients and policies"),
        (name = "Uploads", description = "Authenticated file upload and status queries"),
        (name = "Dashboard", description = "Public operational dashboard"),
    ),
    modifiers(&SecurityAddon),
    info(
        title = "Dataport API",
        version = "0.1.0",
        description = "Authenticated file intake, validation and staging pipeline",
    )
)]
pub struct ApiDoc;

/// Adds the client credential header pair and the operator basic-auth scheme
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "client_headers",
                SecurityScheme::ApiKey(ApiKey::Header(ApiKeyValue::with_description(
                    CLIENT_ID_HEADER,
                    format!(
                        "Client identifier header; pair with the {} header",
                        ACCESS_TOKEN_HEADER
                    )
                    .as_str(),
                ))),
            );
            components.add_security_scheme(
                "operator_basic",
                SecurityScheme::Http(
                    HttpBuilder::new().scheme(HttpAuthScheme::Basic).build(),
                ),
            );
        }
    }
}

/// Modifier to override OpenAPI info from config
pub struct SwaggerInfoModifier {
    pub title: String,
    pub version: String,
    pub description: String,
}

impl Modify for SwaggerInfoModifier {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        openapi.info.title = self.title.clone();
        openapi.info.version = self.version.clone();
        openapi.info.description = Some(self.description.clone());
    }
}
