mod context;
mod error;
mod handler;
mod hash;
mod manager;
mod orchestrator;
mod registry;
mod runner;

pub use context::{run_guarded, Context};
pub use error::FrameworkError;
pub use handler::{ResourceData, ResourceHandler};
pub use hash::canonical_key;
pub use manager::TypedResourceManager;
pub use orchestrator::{ResourceOperation, ResourceOrchestrator};
pub use registry::{PersistentResourceEntry, ResourceRecordData, ResourceRegistry};
pub use runner::{run_managed, Runnable};
