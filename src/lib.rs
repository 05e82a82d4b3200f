//! # graph-batch-rs
//!
//! Batch request orchestration client for graph-style APIs that expose a
//! single batch endpoint accepting many logical sub-requests per physical
//! call.
//!
//! ## Overview
//!
//! The core packs arbitrary numbers of sub-requests into fixed-size batches,
//! classifies per-item results into success / rate-limited / unsolvable,
//! discovers and enqueues continuation requests when a result page is
//! paginated, and extracts nested payload data along a caller-specified path
//! into a shared aggregate - all with composable task concurrency and
//! without losing partially-successful data on failure.
//!
//! ## Core Philosophy
//!
//! - **Schema-free traversal**: response bodies are JSON trees walked with
//!   explicit accessors; no per-endpoint types
//! - **Backpressure by signal**: the platform's item-level rate-limit code
//!   drives retry splitting; the transport retry loop never backs off
//!   adaptively
//! - **Per-invocation state**: queue and aggregate live and die with one
//!   `run`; concurrent invocations never interfere
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use graph_batch_rs::{AnalyticsService, GraphContext};
//!
//! #[tokio::main]
//! async fn main() -> graph_batch_rs::Result<()> {
//!     let context = GraphContext::builder()
//!         .access_token("token")
//!         .account_id("act_123")
//!         .date_start("2026-01-01")
//!         .date_end("2026-01-31")
//!         .breakdowns(vec!["image_asset".to_string()])
//!         .build()?;
//!
//!     let service = AnalyticsService::new(context)?;
//!     let result = service.creative_analytics().await?;
//!     println!("{}", serde_json::to_string_pretty(&result)?);
//!     Ok(())
//! }
//! ```
//!
//! ## Module Organization
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`batch`] | Queueing, classification, pagination discovery, aggregation, orchestration |
//! | [`transport`] | Batch endpoint HTTP call and its bounded-time retry loop |
//! | [`context`] | Immutable per-invocation request constants |
//! | [`analytics`] | Creative-analytics service built on the batch core |

pub mod analytics;
pub mod batch;
pub mod context;
pub mod error;
pub mod transport;

// Re-export main types for convenience
pub use analytics::{AnalyticsResult, AnalyticsService};
pub use batch::{Aggregate, AggregateShape, BatchExecutor, Method, SubRequest};
pub use context::{GraphContext, GraphContextBuilder};
pub use error::{Error, UnsolvableItem};
pub use transport::{BatchTransport, HttpTransport, RetryPolicy};

/// Result type alias for the library
pub type Result<T> = std::result::Result<T, Error>;
