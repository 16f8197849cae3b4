use axum::Router;

pub mod books;
pub mod health;
pub mod middleware;
pub mod openapi;

/// A method and path bound on the router, kept for startup logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Endpoint {
    pub method: &'static str,
    pub path: &'static str,
}

/// One domain's HTTP surface: its use case bound to a set of routes.
///
/// `register` is not idempotent. Registering the same module twice makes
/// axum panic on the overlapping routes while the router is being built.
pub trait HttpModule: Send + Sync {
    fn name(&self) -> &'static str;

    fn endpoints(&self) -> &'static [Endpoint];

    fn register(&self, router: Router) -> Router;
}
