use std::path::PathBuf;

use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::info;

use crate::context::Context;
use crate::error::FrameworkError;
use crate::handler::ResourceHandler;
use crate::manager::TypedResourceManager;
use crate::registry::ResourceRegistry;

/// Type-erased wrapper around one `TypedResourceManager`, so the
/// orchestrator can hold a heterogeneous list of resource kinds without
/// every kind sharing a `Config`/`State` pair.
#[async_trait]
pub trait ResourceOperation: Send + Sync {
    fn name(&self) -> &'static str;
    async fn start(&self, ctx: &Context) -> Result<(), FrameworkError>;
    async fn stop(&self, ctx: &Context) -> Result<(), FrameworkError>;
}

struct ReconcileOperation<H: ResourceHandler> {
    manager: TypedResourceManager<H>,
    desired: Vec<H::Config>,
}

#[async_trait]
impl<H: ResourceHandler> ResourceOperation for ReconcileOperation<H> {
    fn name(&self) -> &'static str {
        self.manager.name()
    }

    async fn start(&self, ctx: &Context) -> Result<(), FrameworkError> {
        self.manager.reconcile(ctx, &self.desired).await
    }

    async fn stop(&self, ctx: &Context) -> Result<(), FrameworkError> {
        self.manager.stop(ctx, &self.desired).await
    }
}

/// Runs an ordered list of resource kinds forward on start and in reverse
/// on stop. The declared order is the caller's responsibility: moley-
/// service adds TunnelCreate, TunnelConfig, TunnelRun, then DNSRecord, so
/// DNS comes up last and goes down first.
pub struct ResourceOrchestrator {
    registry_path: PathBuf,
    registry: Arc<Mutex<ResourceRegistry>>,
    operations: Vec<Box<dyn ResourceOperation>>,
}

impl ResourceOrchestrator {
    pub fn new(registry_path: PathBuf) -> Result<Self, FrameworkError> {
        let registry = ResourceRegistry::load(&registry_path)?;
        Ok(Self { registry_path, registry: Arc::new(Mutex::new(registry)), operations: Vec::new() })
    }

    pub fn add_manager<H: ResourceHandler + 'static>(&mut self, handler: Arc<H>, desired: Vec<H::Config>) {
        let manager = TypedResourceManager::new(handler, self.registry.clone(), self.registry_path.clone());
        self.operations.push(Box::new(ReconcileOperation { manager, desired }));
    }

    pub async fn start(&self, ctx: &Context) -> Result<(), FrameworkError> {
        for operation in &self.operations {
            info!(operation = operation.name(), "starting");
            operation
                .start(ctx)
                .await
                .map_err(|e| FrameworkError::Operation { name: operation.name().to_string(), source: Box::new(e) })?;
        }
        Ok(())
    }

    /// Stops every operation in reverse declared order. Unlike `start`,
    /// a failure in one operation does not skip the rest — every operation
    /// gets a chance to tear down its resources, and the first error is
    /// returned once all of them have run.
    pub async fn stop(&self, ctx: &Context) -> Result<(), FrameworkError> {
        let mut first_error = None;
        for operation in self.operations.iter().rev() {
            info!(operation = operation.name(), "stopping");
            if let Err(err) = operation.stop(ctx).await {
                tracing::warn!(operation = operation.name(), error = %err, "stop failed, continuing");
                if first_error.is_none() {
                    first_error = Some(FrameworkError::Operation {
                        name: operation.name().to_string(),
                        source: Box::new(err),
                    });
                }
            }
        }
        match first_error {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}
