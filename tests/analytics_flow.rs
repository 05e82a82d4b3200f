//! Creative-analytics service end-to-end over a canned account hierarchy.

use std::sync::Arc;

use async_trait::async_trait;
use graph_batch_rs::batch::BatchItemResult;
use graph_batch_rs::{AnalyticsService, BatchTransport, GraphContext, Result, SubRequest};
use serde_json::{json, Value};

/// Answers each sub-request from the shape of its relative URL, mimicking
/// one account with one campaign, adset, ad and creative.
struct HierarchyTransport;

#[async_trait]
impl BatchTransport for HierarchyTransport {
    async fn execute_batch(&self, batch: &[SubRequest]) -> Result<Vec<BatchItemResult>> {
        Ok(batch.iter().map(|request| respond(&request.relative_url)).collect())
    }
}

fn respond(relative_url: &str) -> BatchItemResult {
    let body: Value = if relative_url.contains("fields=campaigns.") {
        json!({"campaigns": {"data": [{"account_id": "act_1", "id": "c1", "name": "Campaign"}]}})
    } else if relative_url.contains("fields=adsets.") {
        json!({"adsets": {"data": [{"campaign_id": "c1", "id": "s1", "name": "Adset"}]}})
    } else if relative_url.contains("fields=ads.") {
        json!({"ads": {"data": [{"adset_id": "s1", "id": "ad1", "name": "Ad", "creative": {"id": "cr1"}}]}})
    } else if relative_url.contains("fields=creative.") {
        json!({
            "creative": {
                "id": "cr1",
                "name": "Creative",
                "asset_feed_spec": {"bodies": [{"text": "hello"}]}
            }
        })
    } else if relative_url.contains("breakdowns=body_asset") {
        json!({"data": [{"spend": "2.0", "impressions": "10"}]})
    } else {
        json!({})
    };
    BatchItemResult {
        code: 200,
        body: body.to_string(),
    }
}

fn context() -> GraphContext {
    GraphContext::builder()
        .access_token("test-token")
        .account_id("act_1")
        .date_start("2026-01-01")
        .date_end("2026-01-31")
        .breakdowns(vec!["body_asset".to_string(), "image_asset".to_string()])
        .build()
        .unwrap()
}

#[tokio::test]
async fn creative_analytics_walks_the_hierarchy_and_reports_counts() {
    let service = AnalyticsService::with_transport(context(), Arc::new(HierarchyTransport));
    let result = service.creative_analytics().await.unwrap();

    assert_eq!(result.status, "success");
    assert_eq!(result.data.metadata.campaigns, 1);
    assert_eq!(result.data.metadata.adsets, 1);
    assert_eq!(result.data.metadata.ads, 1);
    assert_eq!(result.data.metadata.creatives, 1);
    assert_eq!(result.data.metadata.assets, 1);

    // The creative only carries a body, so only the body_asset breakdown ran.
    assert_eq!(
        result.data.insights.get("body_asset"),
        Some(&json!({"ad1": [{"spend": "2.0", "impressions": "10"}]}))
    );
    assert!(!result.data.insights.contains_key("image_asset"));
}

#[tokio::test]
async fn hierarchy_fetchers_deduplicate_identical_records() {
    let service = AnalyticsService::with_transport(context(), Arc::new(HierarchyTransport));

    let campaigns = service.campaigns().await.unwrap();
    assert_eq!(campaigns.len(), 1);
    assert_eq!(campaigns[0].get("id"), Some(&json!("c1")));

    // Two adsets queries against the same campaign produce one distinct adset.
    let adsets = service
        .adsets_from_campaigns(&[campaigns[0].clone(), campaigns[0].clone()])
        .await
        .unwrap();
    assert_eq!(adsets.len(), 1);
}

#[tokio::test]
async fn insights_are_keyed_by_ad_id() {
    let service = AnalyticsService::with_transport(context(), Arc::new(InsightsTransport));
    let ads = vec![json!({"id": "ad1"}), json!({"id": "ad2"})];
    let insights = service.ads_insights(&ads).await.unwrap();

    assert_eq!(insights.len(), 1);
    assert_eq!(insights.get("ad1"), Some(&json!([{"spend": "3.5"}])));
    // ad2 reported no rows and is absent from the keyed aggregate.
    assert!(!insights.contains_key("ad2"));
}

#[tokio::test]
async fn media_lookups_rekey_results_per_creative() {
    let service = AnalyticsService::with_transport(context(), Arc::new(MediaTransport));
    let creatives = vec![
        json!({
            "id": "cr1",
            "asset_feed_spec": {
                "images": [{"hash": "h1"}],
                "videos": [{"video_id": "v1"}]
            }
        }),
        json!({"id": "cr2"}),
    ];

    let images = service.images_from_creatives(&creatives).await.unwrap();
    assert_eq!(images.len(), 1);
    assert_eq!(
        images.get("cr1"),
        Some(&json!([{"hash": "h1", "url": "https://img.example/h1", "name": "img"}]))
    );

    let videos = service.videos_from_creatives(&creatives).await.unwrap();
    assert_eq!(
        videos.get("cr1"),
        Some(&json!([{"id": "v1", "title": "Video", "permalink_url": "https://vid.example/v1"}]))
    );
    // Creatives without videos keep an explicit empty entry.
    assert_eq!(videos.get("cr2"), Some(&json!([])));
}

/// Serves the ad-image index and individual video lookups.
struct MediaTransport;

#[async_trait]
impl BatchTransport for MediaTransport {
    async fn execute_batch(&self, batch: &[SubRequest]) -> Result<Vec<BatchItemResult>> {
        Ok(batch
            .iter()
            .map(|request| {
                let body = if request.relative_url.contains("/adimages?") {
                    json!({"data": [{"hash": "h1", "name": "img", "permalink_url": "https://img.example/h1"}]})
                } else {
                    json!({"id": "v1", "title": "Video", "permalink_url": "https://vid.example/v1"})
                };
                BatchItemResult {
                    code: 200,
                    body: body.to_string(),
                }
            })
            .collect())
    }
}

/// One ad with daily rows, one without.
struct InsightsTransport;

#[async_trait]
impl BatchTransport for InsightsTransport {
    async fn execute_batch(&self, batch: &[SubRequest]) -> Result<Vec<BatchItemResult>> {
        Ok(batch
            .iter()
            .map(|request| {
                let body = if request.relative_url.starts_with("ad1/insights") {
                    json!({"data": [{"spend": "3.5"}]})
                } else {
                    json!({"data": []})
                };
                BatchItemResult {
                    code: 200,
                    body: body.to_string(),
                }
            })
            .collect())
    }
}
