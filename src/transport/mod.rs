//! Outbound transport: the physical batch call and its retry primitive.

mod http;
mod retry;

pub use http::{BatchTransport, HttpTransport};
pub use retry::{persistent_request, RetryPolicy};
