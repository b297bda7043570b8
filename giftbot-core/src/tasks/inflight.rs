// File: giftbot-core/src/tasks/inflight.rs
//
// Tracks command handlers spawned off the gateway loop so shutdown can wait
// for them. A gift cut off between withdraw and deliver/restore would lose
// its codes.

use std::future::Future;

use tokio::task::JoinSet;
use tracing::{error, info};

#[derive(Default)]
pub struct InFlight {
    tasks: JoinSet<()>,
}

impl InFlight {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn spawn<F>(&mut self, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.tasks.spawn(task);
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Waits for the next handler to finish. Pending forever when nothing
    /// is in flight, so it can sit in a `select!` arm.
    pub async fn reap(&mut self) {
        match self.tasks.join_next().await {
            Some(Err(e)) => error!("Command task failed: {e}"),
            Some(Ok(())) => {}
            None => std::future::pending::<()>().await,
        }
    }

    /// Waits for every handler still running. Returns how many there were.
    pub async fn drain(&mut self) -> usize {
        let pending = self.tasks.len();
        if pending > 0 {
            info!("Waiting for {pending} command(s) in flight...");
        }
        while let Some(res) = self.tasks.join_next().await {
            if let Err(e) = res {
                error!("Command task failed: {e}");
            }
        }
        pending
    }
}
