use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

use hearth::bridge::bridge;
use hearth::identity::{IdentityResolver, MemoryIdentityStore, OptionalAuth, Principal};
use hearth::registry::Registry;
use hearth::runtime::{AppState, HealthCheck, HealthStatus, Resource, Runtime, Task};

/// Built-in liveness probe; real deployments register their own checks.
struct ServerHealthCheck;

impl HealthCheck for ServerHealthCheck {
    fn check(&self) -> HealthStatus { HealthStatus::Healthy }
}

struct PingTask;

impl Task for PingTask {
    fn execute(&self, _params: &HashMap<String, String>) -> anyhow::Result<String> {
        Ok("pong\n".to_string())
    }
}

struct InfoResource;

impl Resource for InfoResource {
    fn router(&self) -> axum::Router<AppState> {
        axum::Router::new()
            .route("/", axum::routing::get(|| async { "hearth ok" }))
            .route("/whoami", axum::routing::get(whoami))
    }
}

async fn whoami(OptionalAuth(principal): OptionalAuth) -> axum::Json<Principal> {
    axum::Json(principal)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Init logging
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info"))
        .unwrap();
    fmt().with_env_filter(filter).init();

    // Startup banner at info level so something always prints at default verbosity
    let rust_log = std::env::var("RUST_LOG").unwrap_or_else(|_| "<unset>".to_string());
    let http_port: u16 = std::env::var("HEARTH_HTTP_PORT")
        .unwrap_or_else(|_| "8080".to_string())
        .parse()?;
    let auth_mode = std::env::var("HEARTH_AUTH_MODE").unwrap_or_else(|_| "certificate".to_string());
    info!(
        target: "hearth",
        "hearth starting: RUST_LOG='{}', http_port={}, auth_mode='{}'",
        rust_log, http_port, auth_mode
    );

    // The credential strategy is a deployment decision, not request-time
    // feature detection.
    let resolver = match auth_mode.as_str() {
        "context" => IdentityResolver::security_context(),
        _ => {
            let mut store = MemoryIdentityStore::new();
            if let Ok(dn) = std::env::var("HEARTH_TRUSTED_DN") {
                store = store.with(dn.clone(), Principal::named(dn).with_authority("service"));
            }
            if store.is_empty() {
                tracing::warn!(target: "hearth", "certificate auth enabled with an empty identity store; set HEARTH_TRUSTED_DN");
            }
            IdentityResolver::certificate(Arc::new(store))
        }
    };

    let mut registry = Registry::new();
    registry.register_health_check("server", Arc::new(ServerHealthCheck))?;
    registry.register_task("ping", Arc::new(PingTask))?;
    registry.register_resource("info", Arc::new(InfoResource))?;
    registry.refresh();
    let registry = Arc::new(RwLock::new(registry));

    let mut runtime = Runtime::new();
    bridge(&registry, &mut runtime)?;
    runtime.serve(http_port, Arc::new(resolver)).await
}
