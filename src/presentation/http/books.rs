use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::application::dto::books::{BookChangesDto, NewBookDto};
use crate::application::use_cases::books::{BookError, BookUseCase};
use crate::domain::books::book as domain;
use crate::presentation::http::{Endpoint, HttpModule};

pub const ENDPOINTS: &[Endpoint] = &[
    Endpoint {
        method: "GET",
        path: "/book",
    },
    Endpoint {
        method: "POST",
        path: "/book",
    },
    Endpoint {
        method: "GET",
        path: "/book/:id",
    },
    Endpoint {
        method: "PATCH",
        path: "/book/:id",
    },
    Endpoint {
        method: "DELETE",
        path: "/book/:id",
    },
];

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct Book {
    pub id: Uuid,
    pub title: String,
    pub published_date: NaiveDate,
    pub image_url: Option<String>,
    pub description: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

impl From<domain::Book> for Book {
    fn from(b: domain::Book) -> Self {
        Book {
            id: b.id,
            title: b.title,
            published_date: b.published_date,
            image_url: b.image_url,
            description: b.description,
            created_at: b.created_at,
            updated_at: b.updated_at,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct BookListResponse {
    pub items: Vec<Book>,
    pub limit: i64,
    pub offset: i64,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateBookRequest {
    pub title: String,
    pub published_date: NaiveDate,
    pub image_url: Option<String>,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct UpdateBookRequest {
    pub title: Option<String>,
    pub published_date: Option<NaiveDate>,
    #[serde(default, deserialize_with = "deserialize_double_option")]
    #[schema(value_type = Option<String>)]
    pub image_url: DoubleOption<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub enum DoubleOption<T> {
    #[default]
    NotProvided,
    Null,
    Some(T),
}

impl<T> DoubleOption<T> {
    // None => not provided; Some(None) => explicit null; Some(Some(v)) => value
    fn into_nested(self) -> Option<Option<T>> {
        match self {
            DoubleOption::NotProvided => None,
            DoubleOption::Null => Some(None),
            DoubleOption::Some(v) => Some(Some(v)),
        }
    }
}

fn deserialize_double_option<'de, D, T>(deserializer: D) -> Result<DoubleOption<T>, D::Error>
where
    D: serde::Deserializer<'de>,
    T: serde::Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(|opt| match opt {
        None => DoubleOption::Null,
        Some(value) => DoubleOption::Some(value),
    })
}

#[derive(Debug, Deserialize)]
pub struct ListBooksQuery {
    pub title: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorBody {
    pub error: String,
}

fn error_response(err: BookError) -> Response {
    match err {
        BookError::Invalid(msg) => {
            (StatusCode::BAD_REQUEST, Json(ErrorBody { error: msg })).into_response()
        }
        BookError::Storage(e) => {
            tracing::error!(error = ?e, "book_storage_failed");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

#[utoipa::path(get, path = "/book", tag = "Books",
    params(
        ("title" = Option<String>, Query, description = "Case-insensitive title filter"),
        ("limit" = Option<i64>, Query, description = "Page size, 1..=100"),
        ("offset" = Option<i64>, Query, description = "Rows to skip")
    ),
    responses((status = 200, body = BookListResponse), (status = 400, body = ErrorBody)))]
pub async fn list_books(
    State(uc): State<Arc<BookUseCase>>,
    Query(q): Query<ListBooksQuery>,
) -> Result<Json<BookListResponse>, Response> {
    let page = uc
        .list(q.title, q.limit, q.offset)
        .await
        .map_err(error_response)?;
    Ok(Json(BookListResponse {
        items: page.items.into_iter().map(Into::into).collect(),
        limit: page.limit,
        offset: page.offset,
    }))
}

#[utoipa::path(post, path = "/book", tag = "Books", request_body = CreateBookRequest,
    responses((status = 201, body = Book), (status = 400, body = ErrorBody)))]
pub async fn create_book(
    State(uc): State<Arc<BookUseCase>>,
    Json(req): Json<CreateBookRequest>,
) -> Result<(StatusCode, Json<Book>), Response> {
    let book = uc
        .create(NewBookDto {
            title: req.title,
            published_date: req.published_date,
            image_url: req.image_url,
            description: req.description,
        })
        .await
        .map_err(error_response)?;
    Ok((StatusCode::CREATED, Json(book.into())))
}

#[utoipa::path(get, path = "/book/{id}", tag = "Books",
    params(("id" = Uuid, Path, description = "Book ID")),
    responses((status = 200, body = Book), (status = 404)))]
pub async fn get_book(
    State(uc): State<Arc<BookUseCase>>,
    Path(id): Path<Uuid>,
) -> Result<Json<Book>, Response> {
    let book = uc
        .get(id)
        .await
        .map_err(error_response)?
        .ok_or_else(|| StatusCode::NOT_FOUND.into_response())?;
    Ok(Json(book.into()))
}

#[utoipa::path(patch, path = "/book/{id}", tag = "Books", request_body = UpdateBookRequest,
    params(("id" = Uuid, Path, description = "Book ID")),
    responses((status = 200, body = Book), (status = 400, body = ErrorBody), (status = 404)))]
pub async fn update_book(
    State(uc): State<Arc<BookUseCase>>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateBookRequest>,
) -> Result<Json<Book>, Response> {
    let changes = BookChangesDto {
        title: req.title,
        published_date: req.published_date,
        image_url: req.image_url.into_nested(),
        description: req.description,
    };
    let book = uc
        .update(id, changes)
        .await
        .map_err(error_response)?
        .ok_or_else(|| StatusCode::NOT_FOUND.into_response())?;
    Ok(Json(book.into()))
}

#[utoipa::path(delete, path = "/book/{id}", tag = "Books",
    params(("id" = Uuid, Path, description = "Book ID")),
    responses((status = 204), (status = 404)))]
pub async fn delete_book(
    State(uc): State<Arc<BookUseCase>>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, Response> {
    let deleted = uc.delete(id).await.map_err(error_response)?;
    if deleted {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(StatusCode::NOT_FOUND.into_response())
    }
}

pub fn routes(uc: Arc<BookUseCase>) -> Router {
    Router::new()
        .route("/book", get(list_books).post(create_book))
        .route(
            "/book/:id",
            get(get_book).patch(update_book).delete(delete_book),
        )
        .with_state(uc)
}

pub fn register(router: Router, uc: Arc<BookUseCase>) -> Router {
    router.merge(routes(uc))
}

pub struct BookModule {
    uc: Arc<BookUseCase>,
}

impl BookModule {
    pub fn new(uc: Arc<BookUseCase>) -> Self {
        Self { uc }
    }
}

impl HttpModule for BookModule {
    fn name(&self) -> &'static str {
        "book"
    }

    fn endpoints(&self) -> &'static [Endpoint] {
        ENDPOINTS
    }

    fn register(&self, router: Router) -> Router {
        register(router, self.uc.clone())
    }
}
