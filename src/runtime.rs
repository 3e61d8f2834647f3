//!
//! hearth runtime host
//! -------------------
//! The service host the bridge registers components into. It owns one
//! registry per extension-point role and exposes the Axum-based HTTP surface:
//!
//! - Resource routers merged into the main application router.
//! - Providers applied as cross-cutting router decoration.
//! - `GET /healthcheck` running every registered health check.
//! - `POST /tasks/{name}` executing registered administrative tasks.
//! - Managed components and lifecycle hooks started before serving and
//!   stopped, in reverse order, after the listener drains.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use axum::extract::{Path, Query, Request, State};
use axum::http::StatusCode;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use crate::error::{AppError, BridgeError};
use crate::identity::IdentityResolver;
use crate::registry::Role;

/// A component with start/stop lifecycle tied to the runtime's own.
pub trait Managed: Send + Sync {
    fn start(&self) -> anyhow::Result<()>;
    fn stop(&self) -> anyhow::Result<()>;
}

/// An administrative task, invocable over HTTP as `POST /tasks/{name}`.
pub trait Task: Send + Sync {
    fn execute(&self, params: &HashMap<String, String>) -> anyhow::Result<String>;
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum HealthStatus {
    Healthy,
    Unhealthy { message: String },
}

impl HealthStatus {
    pub fn unhealthy<S: Into<String>>(message: S) -> Self {
        HealthStatus::Unhealthy { message: message.into() }
    }

    pub fn is_healthy(&self) -> bool { matches!(self, HealthStatus::Healthy) }
}

pub trait HealthCheck: Send + Sync {
    fn check(&self) -> HealthStatus;
}

/// A request-handling resource contributing routes to the application router.
pub trait Resource: Send + Sync {
    fn router(&self) -> Router<AppState>;
}

/// A cross-cutting provider wrapping the assembled router, e.g. with extra
/// middleware or filters. Applied after all resources are merged.
pub trait Provider: Send + Sync {
    fn install(&self, router: Router<AppState>) -> Router<AppState>;
}

/// Raw lifecycle hook, outside the managed start/stop pairing. `on_stop` runs
/// after the listener has drained.
pub trait LifecycleHook: Send + Sync {
    fn on_start(&self) -> anyhow::Result<()>;
    fn on_stop(&self) -> anyhow::Result<()>;
}

/// Shared server state injected into all handlers.
#[derive(Clone)]
pub struct AppState {
    pub resolver: Arc<IdentityResolver>,
    pub tasks: Arc<HashMap<String, Arc<dyn Task>>>,
    pub health_checks: Arc<HashMap<String, Arc<dyn HealthCheck>>>,
}

#[derive(Default)]
pub struct Runtime {
    managed: Vec<(String, Arc<dyn Managed>)>,
    tasks: Vec<(String, Arc<dyn Task>)>,
    health_checks: Vec<(String, Arc<dyn HealthCheck>)>,
    resources: Vec<(String, Arc<dyn Resource>)>,
    providers: Vec<(String, Arc<dyn Provider>)>,
    lifecycle_hooks: Vec<(String, Arc<dyn LifecycleHook>)>,
}

fn insert_unique<T: ?Sized>(
    entries: &mut Vec<(String, Arc<T>)>,
    role: Role,
    name: &str,
    component: Arc<T>,
) -> Result<(), BridgeError> {
    if entries.iter().any(|(n, _)| n == name) {
        return Err(BridgeError::Duplicate { role, name: name.to_string() });
    }
    entries.push((name.to_string(), component));
    Ok(())
}

impl Runtime {
    pub fn new() -> Self { Self::default() }

    pub fn register_managed(&mut self, name: &str, c: Arc<dyn Managed>) -> Result<(), BridgeError> {
        insert_unique(&mut self.managed, Role::Managed, name, c)
    }

    pub fn register_task(&mut self, name: &str, c: Arc<dyn Task>) -> Result<(), BridgeError> {
        insert_unique(&mut self.tasks, Role::Task, name, c)
    }

    pub fn register_health_check(&mut self, name: &str, c: Arc<dyn HealthCheck>) -> Result<(), BridgeError> {
        insert_unique(&mut self.health_checks, Role::HealthCheck, name, c)
    }

    pub fn register_resource(&mut self, name: &str, c: Arc<dyn Resource>) -> Result<(), BridgeError> {
        insert_unique(&mut self.resources, Role::Resource, name, c)
    }

    pub fn register_provider(&mut self, name: &str, c: Arc<dyn Provider>) -> Result<(), BridgeError> {
        insert_unique(&mut self.providers, Role::Provider, name, c)
    }

    pub fn register_lifecycle_hook(&mut self, name: &str, c: Arc<dyn LifecycleHook>) -> Result<(), BridgeError> {
        insert_unique(&mut self.lifecycle_hooks, Role::LifecycleHook, name, c)
    }

    pub fn managed_names(&self) -> Vec<&str> { self.managed.iter().map(|(n, _)| n.as_str()).collect() }
    pub fn task_names(&self) -> Vec<&str> { self.tasks.iter().map(|(n, _)| n.as_str()).collect() }
    pub fn health_check_names(&self) -> Vec<&str> { self.health_checks.iter().map(|(n, _)| n.as_str()).collect() }
    pub fn resource_names(&self) -> Vec<&str> { self.resources.iter().map(|(n, _)| n.as_str()).collect() }
    pub fn provider_names(&self) -> Vec<&str> { self.providers.iter().map(|(n, _)| n.as_str()).collect() }
    pub fn lifecycle_hook_names(&self) -> Vec<&str> { self.lifecycle_hooks.iter().map(|(n, _)| n.as_str()).collect() }

    pub fn has_health_check(&self, name: &str) -> bool {
        self.health_checks.iter().any(|(n, _)| n == name)
    }

    pub fn lifecycle_hooks(&self) -> &[(String, Arc<dyn LifecycleHook>)] { &self.lifecycle_hooks }

    /// Assemble the application router: built-in admin routes, resource
    /// routers, then provider decoration, then the access log.
    pub fn router(&self, resolver: Arc<IdentityResolver>) -> Router {
        let state = AppState {
            resolver,
            tasks: Arc::new(self.tasks.iter().cloned().collect()),
            health_checks: Arc::new(self.health_checks.iter().cloned().collect()),
        };
        let mut app: Router<AppState> = Router::new()
            .route("/healthcheck", get(healthcheck))
            .route("/tasks/{name}", post(run_task));
        for (_, resource) in &self.resources {
            app = app.merge(resource.router());
        }
        for (_, provider) in &self.providers {
            app = provider.install(app);
        }
        app.with_state(state).layer(axum::middleware::from_fn(access_log))
    }

    /// Start managed components and lifecycle hooks, in registration order.
    pub fn start(&self) -> anyhow::Result<()> {
        for (name, managed) in &self.managed {
            managed.start().with_context(|| format!("While starting managed component: {}", name))?;
            info!(target: "startup", "Started managed: {}", name);
        }
        for (name, hook) in &self.lifecycle_hooks {
            hook.on_start().with_context(|| format!("While starting lifecycle hook: {}", name))?;
        }
        Ok(())
    }

    /// Stop everything in reverse registration order. Stop failures are
    /// logged, not propagated, so every component gets its shutdown call.
    pub fn stop(&self) {
        for (name, managed) in self.managed.iter().rev() {
            if let Err(e) = managed.stop() {
                error!(target: "startup", "Error stopping managed {}: {}", name, e);
            }
        }
        for (name, hook) in self.lifecycle_hooks.iter().rev() {
            if let Err(e) = hook.on_stop() {
                error!(target: "startup", "Error in lifecycle hook {} on stop: {}", name, e);
            }
        }
    }

    /// Run the HTTP server until ctrl-c, with the full start/serve/drain/stop
    /// sequence.
    pub async fn serve(&self, http_port: u16, resolver: Arc<IdentityResolver>) -> anyhow::Result<()> {
        self.start()?;
        let app = self.router(resolver);
        let addr: SocketAddr = format!("0.0.0.0:{}", http_port).parse()?;
        info!(target: "startup", "Starting server on {}", addr);
        let listener = tokio::net::TcpListener::bind(addr).await?;
        let served = axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await;
        // Shutdown hooks only run once the listener has drained.
        self.stop();
        served?;
        Ok(())
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
    }
}

async fn healthcheck(State(state): State<AppState>) -> impl IntoResponse {
    let mut results = serde_json::Map::new();
    let mut all_healthy = true;
    for (name, check) in state.health_checks.iter() {
        let status = check.check();
        if !status.is_healthy() {
            all_healthy = false;
        }
        let value = serde_json::to_value(&status)
            .unwrap_or_else(|_| serde_json::json!({"status":"unhealthy","message":"unserializable status"}));
        results.insert(name.clone(), value);
    }
    let code = if all_healthy { StatusCode::OK } else { StatusCode::INTERNAL_SERVER_ERROR };
    (code, Json(serde_json::Value::Object(results)))
}

async fn run_task(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<String, AppError> {
    let Some(task) = state.tasks.get(&name) else {
        return Err(AppError::not_found("task_not_found".to_string(), format!("no such task: {}", name)));
    };
    match task.execute(&params) {
        Ok(output) => Ok(output),
        Err(e) => {
            error!("Task {} failed: {}", name, e);
            Err(AppError::internal("task_failed".to_string(), e.to_string()))
        }
    }
}

/// Access log with a per-request id; unauthorized outcomes show up here
/// rather than in the application error log.
async fn access_log(req: Request, next: Next) -> Response {
    let id = uuid::Uuid::new_v4();
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let start = std::time::Instant::now();
    let resp = next.run(req).await;
    info!(
        target: "access",
        "req={} {} {} status={} elapsed_ms={}",
        id, method, path, resp.status().as_u16(), start.elapsed().as_millis()
    );
    resp
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Noop;
    impl Task for Noop {
        fn execute(&self, _params: &HashMap<String, String>) -> anyhow::Result<String> { Ok("ok".into()) }
    }

    #[test]
    fn duplicate_task_registration_fails() {
        let mut rt = Runtime::new();
        rt.register_task("gc", Arc::new(Noop)).unwrap();
        let err = rt.register_task("gc", Arc::new(Noop)).unwrap_err();
        assert!(matches!(err, BridgeError::Duplicate { role: Role::Task, .. }));
    }

    #[test]
    fn health_status_serializes_with_tag() {
        let v = serde_json::to_value(HealthStatus::Healthy).unwrap();
        assert_eq!(v, serde_json::json!({"status":"healthy"}));
        let v = serde_json::to_value(HealthStatus::unhealthy("disk full")).unwrap();
        assert_eq!(v, serde_json::json!({"status":"unhealthy","message":"disk full"}));
    }
}
