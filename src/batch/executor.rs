use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use futures::future::join_all;
use serde_json::{Map, Value};
use tracing::debug;
use uuid::Uuid;

use super::accumulate::{accumulate, Aggregate};
use super::classify::{classify, ItemOutcome};
use super::pagination::collect_continuations;
use super::queue::BatchQueue;
use super::{Method, SubRequest};
use crate::error::UnsolvableItem;
use crate::transport::BatchTransport;
use crate::{Error, Result};

/// How a run's extracted values are aggregated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AggregateShape {
    /// Ordered list of every extracted value.
    List,
    /// Mapping from resource id to extracted value.
    Keyed,
}

/// Drives a whole batch run: seeds a per-run queue, drains it round by
/// round, fans every drained batch out concurrently, and merges results
/// until no pagination or retry work remains.
pub struct BatchExecutor {
    transport: Arc<dyn BatchTransport>,
}

impl BatchExecutor {
    pub fn new(transport: Arc<dyn BatchTransport>) -> Self {
        Self { transport }
    }

    /// Run and collect every extracted value into an ordered list.
    pub async fn fetch_list(
        &self,
        method: Method,
        relative_urls: Vec<String>,
        data_path: &[&str],
        label: Option<&str>,
    ) -> Result<Vec<Value>> {
        Ok(self
            .run(method, relative_urls, data_path, AggregateShape::List, label)
            .await?
            .into_list())
    }

    /// Run and key each non-empty extracted value by its resource id.
    pub async fn fetch_keyed(
        &self,
        method: Method,
        relative_urls: Vec<String>,
        data_path: &[&str],
        label: Option<&str>,
    ) -> Result<Map<String, Value>> {
        Ok(self
            .run(method, relative_urls, data_path, AggregateShape::Keyed, label)
            .await?
            .into_keyed())
    }

    /// Drain rounds until the queue stays empty, then return the aggregate.
    ///
    /// The queue and the aggregate are created here and owned by this
    /// invocation; concurrent runs never share state. All batches drained in
    /// one round are dispatched at once and all of them finish before the
    /// next round starts, so continuations and retries discovered during a
    /// round are visible to the following drain. There is no overall
    /// deadline: the per-call retry budget inside the transport is the only
    /// timeout, so a persistently paginating endpoint keeps the run alive.
    pub async fn run(
        &self,
        method: Method,
        relative_urls: Vec<String>,
        data_path: &[&str],
        shape: AggregateShape,
        label: Option<&str>,
    ) -> Result<Aggregate> {
        let run_id = Uuid::new_v4();
        let data_path: Vec<String> = data_path.iter().map(|s| s.to_string()).collect();

        let queue = BatchQueue::new();
        queue.append(
            relative_urls
                .into_iter()
                .map(|url| SubRequest::new(method, url))
                .collect(),
        );

        let aggregate = Mutex::new(match shape {
            AggregateShape::List => Aggregate::list(),
            AggregateShape::Keyed => Aggregate::keyed(),
        });

        while !queue.is_empty() {
            let batches = queue.drain_all();
            debug!(run_id = %run_id, batches = batches.len(), "dispatching batch round");

            // Every batch of the round runs to completion before the first
            // error surfaces, so sibling successes stay merged even when the
            // run ultimately fails.
            let round = join_all(batches.into_iter().map(|batch| {
                self.process_batch(batch, &queue, &aggregate, &data_path, label, run_id)
            }))
            .await;
            for outcome in round {
                outcome?;
            }
        }

        Ok(aggregate.into_inner().unwrap())
    }

    /// Process one batch and everything it spawns: classify each positional
    /// item, merge successes, resubmit rate-limited items as two split
    /// sub-batches, and append pagination continuations to the shared queue.
    ///
    /// Rate-limited splits go through an explicit worklist instead of
    /// recursion, so many throttled items cannot grow the stack. Unsolvable
    /// items abort this batch's chain once its worklist is drained; retries
    /// complete and continuations are appended first.
    async fn process_batch(
        &self,
        batch: Vec<SubRequest>,
        queue: &BatchQueue,
        aggregate: &Mutex<Aggregate>,
        data_path: &[String],
        label: Option<&str>,
        run_id: Uuid,
    ) -> Result<()> {
        // The cursor for a record list lives one structural level above the
        // records, so pagination scans with the path minus its last segment.
        let page_path = &data_path[..data_path.len().saturating_sub(1)];

        let mut pending: VecDeque<Vec<SubRequest>> = VecDeque::from([batch]);
        let mut unsolvable: Vec<UnsolvableItem> = Vec::new();

        while let Some(chunk) = pending.pop_front() {
            let results = self.transport.execute_batch(&chunk).await?;
            if results.len() != chunk.len() {
                return Err(Error::runtime(format!(
                    "batch endpoint returned {} results for {} sub-requests",
                    results.len(),
                    chunk.len()
                )));
            }

            let mut continuations: Vec<SubRequest> = Vec::new();
            let mut retryable: Vec<SubRequest> = Vec::new();

            for (original, item) in chunk.iter().zip(results.iter()) {
                match classify(item, original)? {
                    ItemOutcome::Success(body) => {
                        collect_continuations(&body, page_path, &mut continuations);
                        let mut aggregate = aggregate.lock().unwrap();
                        accumulate(&mut aggregate, original, &body, data_path);
                    }
                    ItemOutcome::Retryable(request) => retryable.push(request),
                    ItemOutcome::Unsolvable(item) => unsolvable.push(item),
                }
            }

            {
                let aggregate = aggregate.lock().unwrap();
                debug!(
                    run_id = %run_id,
                    records = aggregate.len(),
                    "{}",
                    label.unwrap_or("Total records fetched")
                );
            }

            if !retryable.is_empty() {
                debug!(
                    run_id = %run_id,
                    count = retryable.len(),
                    "splitting rate-limited requests into 2 batches"
                );
                let (first, second) = split_batch(retryable);
                if !first.is_empty() {
                    pending.push_back(first);
                }
                if !second.is_empty() {
                    pending.push_back(second);
                }
            }

            if !continuations.is_empty() {
                debug!(
                    run_id = %run_id,
                    count = continuations.len(),
                    "adding continuation requests to queue"
                );
                queue.append(continuations);
            }
        }

        if !unsolvable.is_empty() {
            return Err(Error::UnsolvableItems { items: unsolvable });
        }
        Ok(())
    }
}

/// Split a retry list into `ceil(n/2)` and `floor(n/2)` halves.
fn split_batch(mut items: Vec<SubRequest>) -> (Vec<SubRequest>, Vec<SubRequest>) {
    let mid = items.len().div_ceil(2);
    let rest = items.split_off(mid);
    (items, rest)
}
