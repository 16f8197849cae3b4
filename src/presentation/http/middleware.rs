use std::time::Duration;

use axum::Router;
use axum::extract::{DefaultBodyLimit, MatchedPath};
use http::HeaderValue;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::bootstrap::config::Config;

const ALLOWED_METHODS: [http::Method; 6] = [
    http::Method::GET,
    http::Method::POST,
    http::Method::PUT,
    http::Method::DELETE,
    http::Method::PATCH,
    http::Method::OPTIONS,
];

pub fn cors_layer(cfg: &Config) -> CorsLayer {
    let base = CorsLayer::new()
        .allow_methods(ALLOWED_METHODS)
        .allow_headers([http::header::CONTENT_TYPE, http::header::AUTHORIZATION]);
    // Config rejects both cases; a hand-built Config still gets deny-all
    let deny_all = AllowOrigin::exact(HeaderValue::from_static("http://invalid"));
    match cfg.cors_allowed_origin.as_deref() {
        Some(origin) => match HeaderValue::from_str(origin) {
            Ok(v) => base.allow_origin(v).allow_credentials(true),
            Err(_) => {
                tracing::warn!(%origin, "invalid_cors_origin_denying_all");
                base.allow_origin(deny_all)
            }
        },
        None if cfg.is_production => base.allow_origin(deny_all),
        None => base
            .allow_origin(AllowOrigin::mirror_request())
            .allow_credentials(true),
    }
}

/// Wraps the assembled routes with the shared middleware stack.
///
/// Outermost first: request tracing, panic recovery (500), CORS, write
/// timeout (408), body size limit.
#[allow(deprecated)]
pub fn apply(router: Router, cfg: &Config) -> Router {
    router
        .layer(DefaultBodyLimit::max(cfg.max_body_bytes))
        .layer(TimeoutLayer::new(cfg.write_timeout()))
        .layer(cors_layer(cfg))
        .layer(CatchPanicLayer::new())
        .layer(
            TraceLayer::new_for_http().make_span_with(|req: &http::Request<_>| {
                let method = req.method().clone();
                let uri = req.uri().clone();
                let matched = req
                    .extensions()
                    .get::<MatchedPath>()
                    .map(|p| p.as_str().to_string())
                    .unwrap_or_default();
                tracing::info_span!("http", %method, %uri, matched_path = %matched)
            }),
        )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bootstrap::config::Config;
    use axum::body::Body;
    use axum::http::{Request, StatusCode, header};
    use axum::routing::get;
    use tower::ServiceExt;

    fn test_config() -> Config {
        Config {
            write_timeout_secs: 1,
            cors_allowed_origin: Some("https://books.example.com".into()),
            ..Config::default()
        }
    }

    #[tokio::test]
    async fn panics_become_500() {
        async fn boom() -> &'static str {
            panic!("handler exploded")
        }
        let app = apply(Router::new().route("/boom", get(boom)), &test_config());
        let response = app
            .oneshot(Request::builder().uri("/boom").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn slow_handlers_hit_the_write_timeout() {
        async fn slow() -> &'static str {
            tokio::time::sleep(Duration::from_secs(5)).await;
            "late"
        }
        let app = apply(Router::new().route("/slow", get(slow)), &test_config());
        let response = app
            .oneshot(Request::builder().uri("/slow").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::REQUEST_TIMEOUT);
    }

    #[tokio::test]
    async fn cors_allows_configured_origin() {
        let app = apply(Router::new().route("/", get(|| async { "" })), &test_config());
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/")
                    .header(header::ORIGIN, "https://books.example.com")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(
            response.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(),
            "https://books.example.com"
        );
    }

    #[tokio::test]
    async fn unparsable_origin_allows_nobody() {
        let cfg = Config {
            cors_allowed_origin: Some("https://books\nexample.com".into()),
            ..test_config()
        };
        let app = apply(Router::new().route("/", get(|| async { "" })), &cfg);
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/")
                    .header(header::ORIGIN, "https://evil.example.com")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        let allowed = response.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN);
        assert_ne!(allowed.map(|v| v.as_bytes()), Some(&b"https://evil.example.com"[..]));
        assert!(response.headers().get(header::ACCESS_CONTROL_ALLOW_CREDENTIALS).is_none());
    }
}
