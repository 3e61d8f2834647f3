//! Startup wiring: walks the component registry role by role and registers
//! every match into the runtime, then installs the hook that closes the
//! registry when the runtime shuts down.

use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{error, info};

use crate::error::BridgeError;
use crate::registry::{Registry, Role};
use crate::runtime::{LifecycleHook, Runtime};

/// Closes the component registry once the runtime has drained. Start is a
/// no-op; the registry was built long before the runtime came up.
struct RegistryCloseHook {
    registry: Arc<RwLock<Registry>>,
}

impl LifecycleHook for RegistryCloseHook {
    fn on_start(&self) -> anyhow::Result<()> { Ok(()) }

    fn on_stop(&self) -> anyhow::Result<()> {
        self.registry.write().close();
        Ok(())
    }
}

/// Register every component in `registry` into the matching runtime
/// extension point, exactly once per matching role.
///
/// Invoked exactly once during startup, after the registry has refreshed.
/// A failed registration does not stop the walk: every remaining component
/// and role is still attempted so the log shows the full picture, but any
/// failure makes the whole call fail. Calling this twice registers
/// everything twice; that is a caller error and not defended against.
pub fn bridge(registry: &Arc<RwLock<Registry>>, runtime: &mut Runtime) -> Result<(), BridgeError> {
    let mut failures: Vec<String> = Vec::new();
    {
        let reg = registry.read();
        if reg.is_closed() {
            return Err(BridgeError::Closed);
        }
        if !reg.is_refreshed() {
            return Err(BridgeError::NotRefreshed);
        }

        let mut record = |role: Role, name: &str, result: Result<(), BridgeError>| match result {
            Ok(()) => info!(target: "startup", "Registering {}: {}", role, name),
            Err(e) => {
                error!(target: "startup", "Failed registering {} {}: {}", role, name, e);
                failures.push(format!("{}/{}: {}", role, name, e));
            }
        };

        for (name, c) in reg.managed() {
            record(Role::Managed, name, runtime.register_managed(name, c.clone()));
        }
        for (name, c) in reg.lifecycle_hooks() {
            record(Role::LifecycleHook, name, runtime.register_lifecycle_hook(name, c.clone()));
        }
        for (name, c) in reg.tasks() {
            record(Role::Task, name, runtime.register_task(name, c.clone()));
        }
        for (name, c) in reg.health_checks() {
            record(Role::HealthCheck, name, runtime.register_health_check(name, c.clone()));
        }
        for (name, c) in reg.providers() {
            record(Role::Provider, name, runtime.register_provider(name, c.clone()));
        }
        for (name, c) in reg.resources() {
            record(Role::Resource, name, runtime.register_resource(name, c.clone()));
        }
    }

    // The runtime shuts the registry down without knowing what it is.
    let close_hook = Arc::new(RegistryCloseHook { registry: registry.clone() });
    if let Err(e) = runtime.register_lifecycle_hook("registry-close", close_hook) {
        error!(target: "startup", "Failed registering registry-close hook: {}", e);
        failures.push(format!("lifecycle/registry-close: {}", e));
    }

    if !failures.is_empty() {
        return Err(BridgeError::Registration { failures });
    }
    Ok(())
}
