use axum::{Json, Router, routing::get};
use utoipa::OpenApi;

use crate::presentation::http::{Endpoint, HttpModule};

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::presentation::http::health::liveness,
        crate::presentation::http::health::readiness,
        crate::presentation::http::books::list_books,
        crate::presentation::http::books::create_book,
        crate::presentation::http::books::get_book,
        crate::presentation::http::books::update_book,
        crate::presentation::http::books::delete_book,
    ),
    components(schemas(
        crate::presentation::http::books::Book,
        crate::presentation::http::books::BookListResponse,
        crate::presentation::http::books::CreateBookRequest,
        crate::presentation::http::books::UpdateBookRequest,
        crate::presentation::http::books::ErrorBody,
    )),
    tags(
        (name = "Health", description = "Liveness and readiness probes"),
        (name = "Books", description = "Book catalogue")
    )
)]
pub struct ApiDoc;

pub const ENDPOINTS: &[Endpoint] = &[Endpoint {
    method: "GET",
    path: "/openapi.json",
}];

async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

pub struct OpenApiModule;

impl HttpModule for OpenApiModule {
    fn name(&self) -> &'static str {
        "openapi"
    }

    fn endpoints(&self) -> &'static [Endpoint] {
        ENDPOINTS
    }

    fn register(&self, router: Router) -> Router {
        router.route("/openapi.json", get(openapi_json))
    }
}
