//! Explicit component registry (the "container" side of the bridge).
//!
//! Components are registered against a closed set of extension-point roles at
//! construction time; there is no structural introspection. The registry is
//! mutable until `refresh()` seals it, read-only afterwards, and released by
//! `close()` during runtime shutdown.

use std::fmt::{Display, Formatter};
use std::sync::Arc;

use crate::error::BridgeError;
use crate::runtime::{HealthCheck, LifecycleHook, Managed, Provider, Resource, Task};

/// The closed set of extension-point roles a component can be wired into.
/// A component may hold several roles; each role is registered independently.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Managed,
    Task,
    HealthCheck,
    Resource,
    Provider,
    LifecycleHook,
}

impl Display for Role {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Role::Managed => "managed",
            Role::Task => "task",
            Role::HealthCheck => "healthcheck",
            Role::Resource => "resource",
            Role::Provider => "provider",
            Role::LifecycleHook => "lifecycle",
        };
        write!(f, "{}", s)
    }
}

#[derive(Default)]
pub struct Registry {
    refreshed: bool,
    closed: bool,
    managed: Vec<(String, Arc<dyn Managed>)>,
    tasks: Vec<(String, Arc<dyn Task>)>,
    health_checks: Vec<(String, Arc<dyn HealthCheck>)>,
    resources: Vec<(String, Arc<dyn Resource>)>,
    providers: Vec<(String, Arc<dyn Provider>)>,
    lifecycle_hooks: Vec<(String, Arc<dyn LifecycleHook>)>,
}

fn push_unique<T: ?Sized>(
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

impl Registry {
    pub fn new() -> Self { Self::default() }

    fn check_open(&self) -> Result<(), BridgeError> {
        if self.closed { return Err(BridgeError::Closed); }
        if self.refreshed {
            // Sealed registries reject late registration; the component set
            // must be complete before refresh.
            return Err(BridgeError::AlreadyRefreshed);
        }
        Ok(())
    }

    pub fn register_managed(&mut self, name: &str, c: Arc<dyn Managed>) -> Result<(), BridgeError> {
        self.check_open()?;
        push_unique(&mut self.managed, Role::Managed, name, c)
    }

    pub fn register_task(&mut self, name: &str, c: Arc<dyn Task>) -> Result<(), BridgeError> {
        self.check_open()?;
        push_unique(&mut self.tasks, Role::Task, name, c)
    }

    pub fn register_health_check(&mut self, name: &str, c: Arc<dyn HealthCheck>) -> Result<(), BridgeError> {
        self.check_open()?;
        push_unique(&mut self.health_checks, Role::HealthCheck, name, c)
    }

    pub fn register_resource(&mut self, name: &str, c: Arc<dyn Resource>) -> Result<(), BridgeError> {
        self.check_open()?;
        push_unique(&mut self.resources, Role::Resource, name, c)
    }

    pub fn register_provider(&mut self, name: &str, c: Arc<dyn Provider>) -> Result<(), BridgeError> {
        self.check_open()?;
        push_unique(&mut self.providers, Role::Provider, name, c)
    }

    pub fn register_lifecycle_hook(&mut self, name: &str, c: Arc<dyn LifecycleHook>) -> Result<(), BridgeError> {
        self.check_open()?;
        push_unique(&mut self.lifecycle_hooks, Role::LifecycleHook, name, c)
    }

    /// Seal the registry. Queries are only valid after this point.
    pub fn refresh(&mut self) { self.refreshed = true; }

    pub fn is_refreshed(&self) -> bool { self.refreshed }

    pub fn is_closed(&self) -> bool { self.closed }

    /// Release all held components. Invoked by the lifecycle hook the bridge
    /// installs, after the runtime has stopped accepting requests.
    pub fn close(&mut self) {
        self.managed.clear();
        self.tasks.clear();
        self.health_checks.clear();
        self.resources.clear();
        self.providers.clear();
        self.lifecycle_hooks.clear();
        self.closed = true;
        tracing::info!(target: "startup", "component registry closed");
    }

    pub fn managed(&self) -> &[(String, Arc<dyn Managed>)] { &self.managed }
    pub fn tasks(&self) -> &[(String, Arc<dyn Task>)] { &self.tasks }
    pub fn health_checks(&self) -> &[(String, Arc<dyn HealthCheck>)] { &self.health_checks }
    pub fn resources(&self) -> &[(String, Arc<dyn Resource>)] { &self.resources }
    pub fn providers(&self) -> &[(String, Arc<dyn Provider>)] { &self.providers }
    pub fn lifecycle_hooks(&self) -> &[(String, Arc<dyn LifecycleHook>)] { &self.lifecycle_hooks }
}
