//! Scheduler for native hosts running on a tokio `LocalSet`.

use crate::platform::Scheduler;
use futures::future::LocalBoxFuture;
use futures::FutureExt;
use std::time::Duration;

/// Spawns onto the current `LocalSet` and sleeps with tokio timers.
///
/// Must be used from within `LocalSet::run_until` (or a task spawned on one).
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioScheduler;

impl Scheduler for TokioScheduler {
    fn spawn(&self, task: LocalBoxFuture<'static, ()>) {
        tokio::task::spawn_local(task);
    }

    fn sleep(&self, duration: Duration) -> LocalBoxFuture<'static, ()> {
        tokio::time::sleep(duration).boxed_local()
    }
}
