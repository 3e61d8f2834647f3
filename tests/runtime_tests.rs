//! Runtime HTTP surface tests: admin routes, resource merging, provider
//! decoration, and identity enforcement at the handler boundary.

use std::collections::HashMap;
use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use http_body_util::BodyExt;
use tower::ServiceExt;

use hearth::identity::{Auth, IdentityResolver, MemoryIdentityStore, Principal, CLIENT_CERT_DN_HEADER};
use hearth::runtime::{AppState, HealthCheck, HealthStatus, Provider, Resource, Runtime, Task};

struct OkCheck;

impl HealthCheck for OkCheck {
    fn check(&self) -> HealthStatus { HealthStatus::Healthy }
}

struct BrokenCheck;

impl HealthCheck for BrokenCheck {
    fn check(&self) -> HealthStatus { HealthStatus::unhealthy("disk full") }
}

struct PingTask;

impl Task for PingTask {
    fn execute(&self, params: &HashMap<String, String>) -> anyhow::Result<String> {
        match params.get("fail") {
            Some(_) => Err(anyhow::anyhow!("requested failure")),
            None => Ok("pong".to_string()),
        }
    }
}

struct SecureResource;

impl Resource for SecureResource {
    fn router(&self) -> axum::Router<AppState> {
        axum::Router::new().route("/secure", axum::routing::get(secure))
    }
}

async fn secure(Auth(principal): Auth) -> String {
    principal.name
}

struct BannerProvider;

impl Provider for BannerProvider {
    fn install(&self, router: axum::Router<AppState>) -> axum::Router<AppState> {
        router.route("/banner", axum::routing::get(|| async { "hello" }))
    }
}

fn certificate_resolver() -> Arc<IdentityResolver> {
    let store = MemoryIdentityStore::new().with("CN=svc-a", Principal::named("svc-a").with_authority("svc"));
    Arc::new(IdentityResolver::certificate(Arc::new(store)))
}

async fn body_string(resp: axum::response::Response) -> String {
    let bytes = resp.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}

#[tokio::test]
async fn healthcheck_reports_every_check_and_degrades_status() {
    let mut rt = Runtime::new();
    rt.register_health_check("server", Arc::new(OkCheck)).unwrap();
    rt.register_health_check("disk", Arc::new(BrokenCheck)).unwrap();
    let app = rt.router(certificate_resolver());

    let resp = app
        .oneshot(Request::builder().uri("/healthcheck").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: serde_json::Value = serde_json::from_str(&body_string(resp).await).unwrap();
    assert_eq!(body["server"]["status"], "healthy");
    assert_eq!(body["disk"]["status"], "unhealthy");
    assert_eq!(body["disk"]["message"], "disk full");
}

#[tokio::test]
async fn healthcheck_is_ok_when_all_checks_pass() {
    let mut rt = Runtime::new();
    rt.register_health_check("server", Arc::new(OkCheck)).unwrap();
    let app = rt.router(certificate_resolver());

    let resp = app
        .oneshot(Request::builder().uri("/healthcheck").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
async fn tasks_execute_over_http() {
    let mut rt = Runtime::new();
    rt.register_task("ping", Arc::new(PingTask)).unwrap();
    let app = rt.router(certificate_resolver());

    let resp = app
        .clone()
        .oneshot(Request::builder().method("POST").uri("/tasks/ping").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_string(resp).await, "pong");

    let resp = app
        .clone()
        .oneshot(Request::builder().method("POST").uri("/tasks/missing").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let resp = app
        .oneshot(Request::builder().method("POST").uri("/tasks/ping?fail=1").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn required_auth_rejects_credential_less_requests_with_challenge() {
    let mut rt = Runtime::new();
    rt.register_resource("secure", Arc::new(SecureResource)).unwrap();
    let app = rt.router(certificate_resolver());

    let resp = app
        .oneshot(Request::builder().uri("/secure").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    assert!(resp.headers().contains_key(header::WWW_AUTHENTICATE));
    assert_eq!(body_string(resp).await, "Credentials are required to access this resource.");
}

#[tokio::test]
async fn required_auth_admits_known_certificate() {
    let mut rt = Runtime::new();
    rt.register_resource("secure", Arc::new(SecureResource)).unwrap();
    let app = rt.router(certificate_resolver());

    let resp = app
        .oneshot(
            Request::builder()
                .uri("/secure")
                .header(CLIENT_CERT_DN_HEADER, "CN=svc-a")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_string(resp).await, "svc-a");
}

#[tokio::test]
async fn providers_decorate_the_assembled_router() {
    let mut rt = Runtime::new();
    rt.register_provider("banner", Arc::new(BannerProvider)).unwrap();
    let app = rt.router(certificate_resolver());

    let resp = app
        .oneshot(Request::builder().uri("/banner").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_string(resp).await, "hello");
}
