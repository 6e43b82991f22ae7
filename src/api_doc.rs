// OpenAPI document and Swagger UI

use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::contract::{HealthResponse, API_TITLE, API_VERSION, DOCS_PATH, OPENAPI_PATH};

/// OpenAPI description generated from the `#[utoipa::path]` annotations on the handlers.
/// `info` is filled from the shared contract in [`openapi`].
#[derive(OpenApi)]
#[openapi(
    paths(crate::handlers::health::health_check),
    components(schemas(HealthResponse)),
    tags((name = "system", description = "Service health"))
)]
pub struct ApiDoc;

/// Builds the published document.
pub fn openapi() -> utoipa::openapi::OpenApi {
    let mut doc = ApiDoc::openapi();
    doc.info.title = API_TITLE.to_string();
    doc.info.version = API_VERSION.to_string();
    doc
}

/// Serves `/openapi.json` and the browsable UI at `/docs`.
pub fn swagger_ui() -> SwaggerUi {
    SwaggerUi::new(DOCS_PATH).url(OPENAPI_PATH, openapi())
}
