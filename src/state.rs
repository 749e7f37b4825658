use crate::countdown::{self, TimerHandle};
use crate::desk::Desk;
use std::sync::Arc;
use tokio::sync::Mutex;

#[derive(Clone)]
pub struct AppState {
    pub desk: Arc<Mutex<Desk>>,
    countdown: Arc<Mutex<Option<TimerHandle>>>,
}

impl AppState {
    pub fn new(desk: Desk) -> Self {
        Self {
            desk: Arc::new(Mutex::new(desk)),
            countdown: Arc::new(Mutex::new(None)),
        }
    }

    /// Starts the countdown for a freshly armed undo slot, cancelling the
    /// previous one. Call while holding the desk lock.
    pub async fn restart_countdown(&self, generation: u64, seconds: u64) {
        let handle = countdown::schedule(Arc::clone(&self.desk), generation, seconds);
        if let Some(previous) = self.countdown.lock().await.replace(handle) {
            previous.cancel();
        }
    }

    /// Call while holding the desk lock.
    pub async fn cancel_countdown(&self) {
        if let Some(handle) = self.countdown.lock().await.take() {
            handle.cancel();
        }
    }
}
