//! Debounced queue for file-selection events.
use std::time::Duration;

use tokio::time::{Instant, sleep_until};

use crate::domain::SelectedFile;

/// Accumulates selection batches and releases them once input has been
/// quiet for the debounce window.
#[derive(Debug)]
pub struct SelectionQueue {
    window: Duration,
    pending: Vec<SelectedFile>,
    deadline: Option<Instant>,
}

impl SelectionQueue {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            pending: Vec::new(),
            deadline: None,
        }
    }

    /// Queue a batch; every push restarts the quiet window.
    pub fn push(&mut self, files: Vec<SelectedFile>, now: Instant) {
        if files.is_empty() {
            return;
        }
        self.pending.extend(files);
        self.deadline = Some(now + self.window);
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Take the merged batch if the window has elapsed at `now`.
    pub fn take_ready(&mut self, now: Instant) -> Option<Vec<SelectedFile>> {
        match self.deadline {
            Some(deadline) if deadline <= now => {
                self.deadline = None;
                Some(std::mem::take(&mut self.pending))
            }
            _ => None,
        }
    }

    /// Wait for the window to elapse, then take the merged batch.
    pub async fn flush(&mut self) -> Option<Vec<SelectedFile>> {
        let deadline = self.deadline?;
        sleep_until(deadline).await;
        self.take_ready(Instant::now())
    }
}
