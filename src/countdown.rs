//! Once-per-second countdown that lapses the undo slot it was armed for.

use crate::desk::Desk;
use std::{sync::Arc, time::Duration};
use tokio::{sync::Mutex, task::AbortHandle, time::interval};
use tracing::debug;

/// Handle to a scheduled countdown.
#[derive(Debug)]
pub struct TimerHandle {
    handle: AbortHandle,
}

impl TimerHandle {
    pub fn cancel(self) {
        self.handle.abort();
    }
}

/// Ticks `seconds` times, then expires undo generation `generation`.
pub fn schedule(desk: Arc<Mutex<Desk>>, generation: u64, seconds: u64) -> TimerHandle {
    let task = tokio::spawn(async move {
        let mut ticker = interval(Duration::from_secs(1));
        // The first tick completes immediately.
        ticker.tick().await;
        for remaining in (0..seconds).rev() {
            ticker.tick().await;
            debug!(generation, remaining, "undo countdown");
        }
        desk.lock().await.undo.expire(generation);
    });

    TimerHandle {
        handle: task.abort_handle(),
    }
}
