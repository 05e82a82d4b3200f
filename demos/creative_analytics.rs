//! Fetch creative analytics for one account and print the aggregate.
//!
//! ```bash
//! GRAPH_ACCESS_TOKEN=... GRAPH_ACCOUNT_ID=act_123 \
//! GRAPH_DATE_START=2026-01-01 GRAPH_DATE_END=2026-01-31 \
//! cargo run --example creative_analytics
//! ```

use anyhow::Context as _;
use graph_batch_rs::{AnalyticsService, GraphContext};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let context = GraphContext::builder()
        .access_token(env("GRAPH_ACCESS_TOKEN")?)
        .account_id(env("GRAPH_ACCOUNT_ID")?)
        .date_start(env("GRAPH_DATE_START")?)
        .date_end(env("GRAPH_DATE_END")?)
        .breakdowns(
            std::env::var("GRAPH_BREAKDOWNS")
                .unwrap_or_else(|_| "image_asset,video_asset,body_asset".to_string())
                .split(',')
                .map(str::to_string)
                .collect(),
        )
        .build()?;

    let service = AnalyticsService::new(context)?;
    let result = service.creative_analytics().await?;
    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}

fn env(name: &str) -> anyhow::Result<String> {
    std::env::var(name).with_context(|| format!("{name} is required"))
}
