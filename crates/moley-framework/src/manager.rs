use std::path::PathBuf;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, info, warn};

use crate::context::Context;
use crate::error::FrameworkError;
use crate::handler::ResourceHandler;
use crate::hash::canonical_key;
use crate::registry::{PersistentResourceEntry, ResourceRecordData, ResourceRegistry};

/// Drives one `ResourceHandler` to convergence against a shared registry.
/// Generic over exactly one `(Config, State)` pair; the orchestrator holds
/// one of these per resource kind behind a type-erased `ResourceOperation`.
pub struct TypedResourceManager<H: ResourceHandler> {
    handler: Arc<H>,
    registry: Arc<Mutex<ResourceRegistry>>,
    registry_path: PathBuf,
}

impl<H: ResourceHandler> TypedResourceManager<H> {
    pub fn new(handler: Arc<H>, registry: Arc<Mutex<ResourceRegistry>>, registry_path: PathBuf) -> Self {
        Self { handler, registry, registry_path }
    }

    pub fn name(&self) -> &'static str {
        self.handler.name()
    }

    fn load_current(&self) -> Result<Vec<(H::Config, H::State)>, FrameworkError> {
        let entries = {
            let registry = self.registry.lock();
            registry.entries_for(self.handler.name()).into_iter().cloned().collect::<Vec<_>>()
        };
        let mut current = Vec::with_capacity(entries.len());
        for entry in entries {
            let config: H::Config = serde_json::from_value(entry.data.config)?;
            let state: H::State = serde_json::from_value(entry.data.state)?;
            current.push((config, state));
        }
        Ok(current)
    }

    fn persist(&self, ctx: &Context, entries: Vec<PersistentResourceEntry>) -> Result<(), FrameworkError> {
        if ctx.dry_run {
            debug!(handler = self.handler.name(), "dry run: registry left untouched");
            return Ok(());
        }
        let mut registry = self.registry.lock();
        registry.replace_entries_for(self.handler.name(), entries);
        registry.save(&self.registry_path)
    }

    fn entry_for(&self, config: &H::Config, state: &H::State) -> Result<PersistentResourceEntry, FrameworkError> {
        Ok(PersistentResourceEntry {
            handler_name: self.handler.name().to_string(),
            data: ResourceRecordData {
                config: serde_json::to_value(config)?,
                state: serde_json::to_value(state)?,
            },
        })
    }

    /// Adds one desired resource: adopts it via `check_from_config` if a
    /// live resource already matches (e.g. a crash between a prior
    /// `create` and the registry save that would have recorded it),
    /// otherwise creates it and confirms the result is actually up before
    /// it's trusted.
    async fn create_or_adopt(&self, ctx: &Context, config: &H::Config) -> Result<H::State, FrameworkError> {
        let (existing_state, status) = self.handler.check_from_config(ctx, config).await?;
        if status == moley_domain::ResourceState::Up {
            info!(handler = self.handler.name(), "adopting existing resource instead of creating");
            return Ok(existing_state);
        }

        let state = self.handler.create(ctx, config).await?;
        let confirmed = self.handler.check_from_state(ctx, &state).await?;
        if confirmed != moley_domain::ResourceState::Up {
            return Err(FrameworkError::handler(
                self.handler.name(),
                format!("resource reported {confirmed:?} immediately after create"),
            ));
        }
        Ok(state)
    }

    /// Converges the handler's resources with `desired`: anything tracked
    /// but no longer desired is destroyed first, anything desired but
    /// untracked is created next, and anything tracked whose config
    /// changed is destroyed and recreated last.
    pub async fn reconcile(&self, ctx: &Context, desired: &[H::Config]) -> Result<(), FrameworkError> {
        let current = self.load_current()?;
        let mut matched_desired = vec![false; desired.len()];

        let mut to_remove: Vec<H::State> = Vec::new();
        let mut to_update: Vec<(H::State, usize)> = Vec::new();
        let mut unchanged: Vec<(H::Config, H::State)> = Vec::new();

        for (cconfig, cstate) in &current {
            let matched = desired
                .iter()
                .enumerate()
                .find(|(di, dconfig)| !matched_desired[*di] && self.handler.equals(cconfig, dconfig));

            match matched {
                Some((di, dconfig)) => {
                    matched_desired[di] = true;
                    if canonical_key(cconfig) == canonical_key(dconfig) {
                        unchanged.push((cconfig.clone(), cstate.clone()));
                    } else {
                        to_update.push((cstate.clone(), di));
                    }
                }
                None => to_remove.push(cstate.clone()),
            }
        }

        let to_add: Vec<usize> = (0..desired.len()).filter(|di| !matched_desired[*di]).collect();

        info!(
            handler = self.handler.name(),
            remove = to_remove.len(),
            add = to_add.len(),
            update = to_update.len(),
            "reconciling"
        );

        for state in &to_remove {
            self.handler.destroy(ctx, state).await?;
        }

        let mut next_entries: Vec<PersistentResourceEntry> =
            unchanged.iter().map(|(c, s)| self.entry_for(c, s)).collect::<Result<_, _>>()?;

        for di in &to_add {
            let config = &desired[*di];
            let state = self.create_or_adopt(ctx, config).await?;
            next_entries.push(self.entry_for(config, &state)?);
        }

        for (old_state, di) in &to_update {
            let new_config = &desired[*di];
            self.handler.destroy(ctx, old_state).await?;
            let new_state = self.handler.create(ctx, new_config).await?;
            next_entries.push(self.entry_for(new_config, &new_state)?);
        }

        self.persist(ctx, next_entries)
    }

    /// Destroys every resource this handler tracks, plus any live resource
    /// matching a `desired` config that the registry lost track of (e.g.
    /// after a crash between create and save). A destroy failure is logged
    /// and never blocks the remaining destroys; whatever couldn't be torn
    /// down stays in the registry so the next stop retries it, and the
    /// first error encountered is what's returned.
    pub async fn stop(&self, ctx: &Context, desired: &[H::Config]) -> Result<(), FrameworkError> {
        let current = self.load_current()?;
        let tracked_configs: Vec<&H::Config> = current.iter().map(|(c, _)| c).collect();

        let mut adopted: Vec<(H::Config, H::State)> = Vec::new();
        for config in desired {
            let already_tracked = tracked_configs.iter().any(|c| self.handler.equals(c, config));
            if already_tracked {
                continue;
            }
            let (state, status) = self.handler.check_from_config(ctx, config).await?;
            match status {
                moley_domain::ResourceState::Up => {
                    warn!(handler = self.handler.name(), "adopting untracked resource before stop");
                    adopted.push((config.clone(), state));
                }
                moley_domain::ResourceState::Unknown => {
                    // Can't positively confirm liveness, so can't safely act on it either
                    // (e.g. a reused pid). Left for out-of-band cleanup.
                    warn!(handler = self.handler.name(), "untracked resource has unknown status, not adopting");
                }
                moley_domain::ResourceState::Down => {}
            }
        }

        let mut first_error: Option<FrameworkError> = None;
        let mut surviving_entries: Vec<PersistentResourceEntry> = Vec::new();

        for (config, state) in current.iter().chain(adopted.iter()) {
            if let Err(err) = self.handler.destroy(ctx, state).await {
                warn!(handler = self.handler.name(), error = %err, "destroy failed during stop, continuing");
                surviving_entries.push(self.entry_for(config, state)?);
                if first_error.is_none() {
                    first_error = Some(err);
                }
            }
        }

        self.persist(ctx, surviving_entries)?;

        match first_error {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use moley_domain::ResourceState;
    use serde::{Deserialize, Serialize};
    use std::collections::HashSet;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct FakeConfig {
        id: String,
        value: u32,
    }

    #[derive(Debug, Clone, Serialize, Deserialize)]
    struct FakeState {
        id: String,
        value: u32,
    }

    struct FakeHandler {
        creates: AtomicUsize,
        destroys: AtomicUsize,
        /// What `check_from_config` reports for any config it's asked about.
        config_check_status: ResourceState,
        /// What `check_from_state` reports right after a `create`.
        state_check_status: ResourceState,
        /// Ids whose `destroy` always fails, to exercise partial-destroy paths.
        destroy_fails_for: HashSet<String>,
    }

    impl FakeHandler {
        fn new() -> Self {
            Self {
                creates: AtomicUsize::new(0),
                destroys: AtomicUsize::new(0),
                config_check_status: ResourceState::Down,
                state_check_status: ResourceState::Up,
                destroy_fails_for: HashSet::new(),
            }
        }

        fn new_with_config_check_status(status: ResourceState) -> Self {
            Self { config_check_status: status, ..Self::new() }
        }

        fn new_with_state_check_status(status: ResourceState) -> Self {
            Self { state_check_status: status, ..Self::new() }
        }

        fn new_failing_destroy_for(id: &str) -> Self {
            Self { destroy_fails_for: HashSet::from([id.to_string()]), ..Self::new() }
        }
    }

    #[async_trait]
    impl ResourceHandler for FakeHandler {
        type Config = FakeConfig;
        type State = FakeState;

        fn name(&self) -> &'static str {
            "fake"
        }

        fn equals(&self, a: &FakeConfig, b: &FakeConfig) -> bool {
            a.id == b.id
        }

        async fn create(&self, _ctx: &Context, config: &FakeConfig) -> Result<FakeState, FrameworkError> {
            self.creates.fetch_add(1, Ordering::SeqCst);
            Ok(FakeState { id: config.id.clone(), value: config.value })
        }

        async fn destroy(&self, _ctx: &Context, state: &FakeState) -> Result<(), FrameworkError> {
            self.destroys.fetch_add(1, Ordering::SeqCst);
            if self.destroy_fails_for.contains(&state.id) {
                return Err(FrameworkError::handler(self.name(), format!("destroy of {} failed", state.id)));
            }
            Ok(())
        }

        async fn check_from_state(&self, _ctx: &Context, _state: &FakeState) -> Result<ResourceState, FrameworkError> {
            Ok(self.state_check_status.clone())
        }

        async fn check_from_config(
            &self,
            _ctx: &Context,
            config: &FakeConfig,
        ) -> Result<(FakeState, ResourceState), FrameworkError> {
            Ok((FakeState { id: config.id.clone(), value: config.value }, self.config_check_status.clone()))
        }
    }

    fn manager(handler: Arc<FakeHandler>, dir: &tempfile::TempDir) -> TypedResourceManager<FakeHandler> {
        let path = dir.path().join("moley.lock");
        let registry = ResourceRegistry::load(&path).unwrap();
        TypedResourceManager::new(handler, Arc::new(Mutex::new(registry)), path)
    }

    #[tokio::test]
    async fn reconcile_creates_everything_on_first_run() {
        let dir = tempfile::tempdir().unwrap();
        let handler = Arc::new(FakeHandler::new());
        let mgr = manager(handler.clone(), &dir);
        let ctx = Context::new(false);

        let desired = vec![FakeConfig { id: "a".into(), value: 1 }, FakeConfig { id: "b".into(), value: 2 }];
        mgr.reconcile(&ctx, &desired).await.unwrap();

        assert_eq!(handler.creates.load(Ordering::SeqCst), 2);
        assert_eq!(handler.destroys.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn reconcile_twice_with_same_desired_state_is_a_no_op() {
        let dir = tempfile::tempdir().unwrap();
        let handler = Arc::new(FakeHandler::new());
        let mgr = manager(handler.clone(), &dir);
        let ctx = Context::new(false);

        let desired = vec![FakeConfig { id: "a".into(), value: 1 }];
        mgr.reconcile(&ctx, &desired).await.unwrap();
        mgr.reconcile(&ctx, &desired).await.unwrap();

        assert_eq!(handler.creates.load(Ordering::SeqCst), 1);
        assert_eq!(handler.destroys.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn reconcile_removes_entries_no_longer_desired() {
        let dir = tempfile::tempdir().unwrap();
        let handler = Arc::new(FakeHandler::new());
        let mgr = manager(handler.clone(), &dir);
        let ctx = Context::new(false);

        mgr.reconcile(&ctx, &[FakeConfig { id: "a".into(), value: 1 }]).await.unwrap();
        mgr.reconcile(&ctx, &[]).await.unwrap();

        assert_eq!(handler.creates.load(Ordering::SeqCst), 1);
        assert_eq!(handler.destroys.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn reconcile_destroys_and_recreates_when_config_changes_for_the_same_identity() {
        let dir = tempfile::tempdir().unwrap();
        let handler = Arc::new(FakeHandler::new());
        let mgr = manager(handler.clone(), &dir);
        let ctx = Context::new(false);

        mgr.reconcile(&ctx, &[FakeConfig { id: "a".into(), value: 1 }]).await.unwrap();
        mgr.reconcile(&ctx, &[FakeConfig { id: "a".into(), value: 99 }]).await.unwrap();

        assert_eq!(handler.creates.load(Ordering::SeqCst), 2);
        assert_eq!(handler.destroys.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn dry_run_reconcile_does_not_touch_the_registry() {
        let dir = tempfile::tempdir().unwrap();
        let handler = Arc::new(FakeHandler::new());
        let mgr = manager(handler.clone(), &dir);
        let ctx = Context::new(true);

        mgr.reconcile(&ctx, &[FakeConfig { id: "a".into(), value: 1 }]).await.unwrap();
        assert!(!dir.path().join("moley.lock").exists());
    }

    #[tokio::test]
    async fn stop_destroys_tracked_resources_and_adopts_untracked_ones() {
        let dir = tempfile::tempdir().unwrap();
        let handler = Arc::new(FakeHandler::new_with_config_check_status(ResourceState::Up));
        let mgr = manager(handler.clone(), &dir);
        let ctx = Context::new(false);

        mgr.reconcile(&ctx, &[FakeConfig { id: "a".into(), value: 1 }]).await.unwrap();
        // "b" was never reconciled (e.g. process crashed before the save),
        // but check_from_config reports it as live, so stop must adopt it.
        mgr.stop(&ctx, &[FakeConfig { id: "a".into(), value: 1 }, FakeConfig { id: "b".into(), value: 2 }])
            .await
            .unwrap();

        assert_eq!(handler.destroys.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn stop_never_destroys_an_untracked_resource_with_unknown_status() {
        let dir = tempfile::tempdir().unwrap();
        let handler = Arc::new(FakeHandler::new_with_config_check_status(ResourceState::Unknown));
        let mgr = manager(handler.clone(), &dir);
        let ctx = Context::new(false);

        mgr.reconcile(&ctx, &[FakeConfig { id: "a".into(), value: 1 }]).await.unwrap();
        // "b" is untracked and its liveness can't be confirmed (e.g. a pid that
        // can't be safely reacquired), so stop must leave it alone rather than
        // destroying whatever it happens to resolve to.
        mgr.stop(&ctx, &[FakeConfig { id: "a".into(), value: 1 }, FakeConfig { id: "b".into(), value: 2 }])
            .await
            .unwrap();

        assert_eq!(handler.destroys.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn reconcile_adopts_an_existing_resource_instead_of_recreating_it() {
        let dir = tempfile::tempdir().unwrap();
        // Simulates a restart after a crash that created the resource out of
        // band but died before the registry recorded it.
        let handler = Arc::new(FakeHandler::new_with_config_check_status(ResourceState::Up));
        let mgr = manager(handler.clone(), &dir);
        let ctx = Context::new(false);

        mgr.reconcile(&ctx, &[FakeConfig { id: "a".into(), value: 1 }]).await.unwrap();
        assert_eq!(handler.creates.load(Ordering::SeqCst), 0);

        // The adopted entry must have actually been persisted: a second
        // reconcile against the same desired state destroys nothing and
        // creates nothing, as if it had always been tracked.
        mgr.reconcile(&ctx, &[FakeConfig { id: "a".into(), value: 1 }]).await.unwrap();
        assert_eq!(handler.creates.load(Ordering::SeqCst), 0);
        assert_eq!(handler.destroys.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn reconcile_fails_the_add_when_the_created_resource_is_not_confirmed_up() {
        let dir = tempfile::tempdir().unwrap();
        let handler = Arc::new(FakeHandler::new_with_state_check_status(ResourceState::Down));
        let mgr = manager(handler.clone(), &dir);
        let ctx = Context::new(false);

        let result = mgr.reconcile(&ctx, &[FakeConfig { id: "a".into(), value: 1 }]).await;

        assert!(result.is_err());
        assert_eq!(handler.creates.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn stop_continues_past_a_destroy_failure_and_keeps_the_survivor_tracked() {
        let dir = tempfile::tempdir().unwrap();
        let handler = Arc::new(FakeHandler::new_failing_destroy_for("a"));
        let mgr = manager(handler.clone(), &dir);
        let ctx = Context::new(false);

        mgr.reconcile(
            &ctx,
            &[FakeConfig { id: "a".into(), value: 1 }, FakeConfig { id: "b".into(), value: 2 }],
        )
        .await
        .unwrap();

        let result = mgr.stop(&ctx, &[]).await;
        assert!(result.is_err());
        // Both destroys were attempted even though "a" failed.
        assert_eq!(handler.destroys.load(Ordering::SeqCst), 2);

        // "a" must still be tracked since it was never actually torn down;
        // a second stop attempt retries it rather than losing track of it.
        let mgr2 = manager(handler.clone(), &dir);
        let result = mgr2.stop(&ctx, &[]).await;
        assert!(result.is_err());
        assert_eq!(handler.destroys.load(Ordering::SeqCst), 3);
    }
}
