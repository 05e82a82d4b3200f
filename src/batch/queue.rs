use std::sync::Mutex;

use super::{SubRequest, MAX_BATCH_SIZE};

/// FIFO queue of pending sub-requests, grouped into fixed-size batches.
///
/// `append` merges whatever is still queued with the new items and
/// re-partitions the whole set, so every batch holds exactly
/// [`MAX_BATCH_SIZE`] items except possibly the last, regardless of prior
/// fragmentation. `drain_all` atomically takes every queued batch; items
/// appended while a drained round is being processed join the live queue and
/// surface in the next drain, never in the stale snapshot.
pub struct BatchQueue {
    batches: Mutex<Vec<Vec<SubRequest>>>,
}

impl BatchQueue {
    pub fn new() -> Self {
        Self {
            batches: Mutex::new(Vec::new()),
        }
    }

    /// Merge `items` with everything not yet drained and re-chunk.
    pub fn append(&self, items: Vec<SubRequest>) {
        let mut batches = self.batches.lock().unwrap();
        let mut pending: Vec<SubRequest> = batches.drain(..).flatten().collect();
        pending.extend(items);
        *batches = chunk(pending);
    }

    /// Take every batch currently queued, leaving the queue empty.
    pub fn drain_all(&self) -> Vec<Vec<SubRequest>> {
        std::mem::take(&mut *self.batches.lock().unwrap())
    }

    pub fn is_empty(&self) -> bool {
        self.batches.lock().unwrap().is_empty()
    }

    /// Number of batches currently queued.
    pub fn len(&self) -> usize {
        self.batches.lock().unwrap().len()
    }
}

impl Default for BatchQueue {
    fn default() -> Self {
        Self::new()
    }
}

fn chunk(items: Vec<SubRequest>) -> Vec<Vec<SubRequest>> {
    let mut batches = Vec::with_capacity(items.len().div_ceil(MAX_BATCH_SIZE));
    let mut items = items.into_iter();
    loop {
        let batch: Vec<SubRequest> = items.by_ref().take(MAX_BATCH_SIZE).collect();
        if batch.is_empty() {
            break;
        }
        batches.push(batch);
    }
    batches
}
