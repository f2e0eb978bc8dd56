use async_trait::async_trait;
use moley_domain::ResourceState;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::context::Context;
use crate::error::FrameworkError;

/// Everything a resource kind's `Config` and `State` types need to flow
/// through the registry and the diff engine.
pub trait ResourceData: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {}
impl<T: Serialize + DeserializeOwned + Clone + Send + Sync + 'static> ResourceData for T {}

/// One resource kind's lifecycle: create it, destroy it, and tell the
/// difference between "matches the current desired config" and "is it
/// actually up". A handler owns no state of its own; everything it needs
/// to act is passed in per call.
#[async_trait]
pub trait ResourceHandler: Send + Sync {
    type Config: ResourceData;
    type State: ResourceData;

    fn name(&self) -> &'static str;

    /// Whether two desired configs describe the same resource instance,
    /// used to tell "unchanged" apart from "needs update" during diffing.
    fn equals(&self, a: &Self::Config, b: &Self::Config) -> bool;

    async fn create(&self, ctx: &Context, config: &Self::Config) -> Result<Self::State, FrameworkError>;

    async fn destroy(&self, ctx: &Context, state: &Self::State) -> Result<(), FrameworkError>;

    /// Drift check against a state the registry already tracks.
    async fn check_from_state(&self, ctx: &Context, state: &Self::State) -> Result<ResourceState, FrameworkError>;

    /// Adoption check: does a live resource already exist for this desired
    /// config even though the registry has no entry for it? Returns the
    /// state that would be recorded if so, alongside its liveness tag.
    async fn check_from_config(
        &self,
        ctx: &Context,
        config: &Self::Config,
    ) -> Result<(Self::State, ResourceState), FrameworkError>;
}
