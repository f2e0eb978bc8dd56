use std::future::Future;

/// Carries the flags every handler call needs but no handler owns.
#[derive(Debug, Clone, Copy, Default)]
pub struct Context {
    pub dry_run: bool,
}

impl Context {
    pub fn new(dry_run: bool) -> Self {
        Self { dry_run }
    }

    /// Detach from whatever deadline or cancellation the caller's context
    /// carried. Used when entering the bounded shutdown window: a signal
    /// that already fired must not also cancel the cleanup it triggers.
    pub fn detached(&self) -> Self {
        Self { dry_run: self.dry_run }
    }
}

/// Runs `f` unless `ctx.dry_run` is set, in which case `default` is
/// returned without calling `f` at all. Every mutating handler call goes
/// through this; reads never do.
pub async fn run_guarded<T, F, Fut>(ctx: &Context, default: T, f: F) -> T
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = T>,
{
    if ctx.dry_run {
        return default;
    }
    f().await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn dry_run_skips_the_closure_entirely() {
        let ctx = Context::new(true);
        let mut called = false;
        let result = run_guarded(&ctx, 0, || async {
            called = true;
            1
        })
        .await;
        assert_eq!(result, 0);
        assert!(!called);
    }

    #[tokio::test]
    async fn live_run_calls_the_closure() {
        let ctx = Context::new(false);
        let result = run_guarded(&ctx, 0, || async { 1 }).await;
        assert_eq!(result, 1);
    }
}
