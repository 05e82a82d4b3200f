use std::collections::HashSet;
use std::sync::Arc;

use futures::future::join_all;
use serde::Serialize;
use serde_json::{json, Map, Value};
use tracing::{error, info};

use super::creative::{
    create_ads_insights_queues, extract_assets, id_string, image_hashes_by_creative,
    video_ids_by_creative, CreativeAsset,
};
use super::params::{build_relative_url, common_params};
use crate::batch::{BatchExecutor, Method};
use crate::context::GraphContext;
use crate::transport::{BatchTransport, HttpTransport};
use crate::{Error, Result};

const INSIGHT_FIELDS: &str = "spend,impressions,clicks,conversions,conversion_values,actions,video_thruplay_watched_actions,estimated_ad_recallers";

/// Creative-analytics facade: walks the account hierarchy through the batch
/// executor and assembles the final aggregate.
pub struct AnalyticsService {
    context: Arc<GraphContext>,
    executor: BatchExecutor,
}

/// Result of the top-level analytics operation.
#[derive(Debug, Serialize)]
pub struct AnalyticsResult {
    pub status: String,
    pub data: AnalyticsData,
}

#[derive(Debug, Serialize)]
pub struct AnalyticsData {
    pub insights: Map<String, Value>,
    pub metadata: AnalyticsMetadata,
}

/// Entity counts observed while assembling the result.
#[derive(Debug, Serialize)]
pub struct AnalyticsMetadata {
    pub campaigns: usize,
    pub adsets: usize,
    pub ads: usize,
    pub creatives: usize,
    pub assets: usize,
}

impl AnalyticsService {
    pub fn new(context: GraphContext) -> Result<Self> {
        let transport = Arc::new(HttpTransport::new(&context)?);
        Ok(Self::with_transport(context, transport))
    }

    /// Build the service on a caller-supplied transport (used by tests to
    /// substitute the network).
    pub fn with_transport(context: GraphContext, transport: Arc<dyn BatchTransport>) -> Self {
        Self {
            context: Arc::new(context),
            executor: BatchExecutor::new(transport),
        }
    }

    /// Campaigns of the context's account with any impressions in the window.
    pub async fn campaigns(&self) -> Result<Vec<Value>> {
        let account_id = self.context.account_id();
        info!(account_id, "getting campaigns");

        let mut params = common_params(&self.context);
        params.push((
            "fields".to_string(),
            "campaigns.limit(200){account_id,id,name}".to_string(),
        ));
        params.push((
            "filtering".to_string(),
            json!([{"field": "impressions", "operator": "GREATER_THAN", "value": 0}]).to_string(),
        ));

        let queue = vec![build_relative_url(account_id, &params)];
        let campaigns = self
            .executor
            .fetch_list(Method::Get, queue, &["campaigns", "data"], None)
            .await?;
        let distinct = distinct(campaigns);
        info!(count = distinct.len(), "distinct campaigns fetched");
        Ok(distinct)
    }

    pub async fn adsets_from_campaigns(&self, campaigns: &[Value]) -> Result<Vec<Value>> {
        info!(campaigns = campaigns.len(), "getting adsets");

        let mut params = common_params(&self.context);
        params.push((
            "fields".to_string(),
            "adsets.limit(200){campaign_id,id,name,promoted_object}".to_string(),
        ));

        let queue = campaigns
            .iter()
            .map(|campaign| build_relative_url(&id_string(campaign.get("id")), &params))
            .collect();
        let adsets = self
            .executor
            .fetch_list(Method::Get, queue, &["adsets", "data"], None)
            .await?;
        let distinct = distinct(adsets);
        info!(count = distinct.len(), "distinct adsets fetched");
        Ok(distinct)
    }

    pub async fn ads_from_adsets(&self, adsets: &[Value]) -> Result<Vec<Value>> {
        info!(adsets = adsets.len(), "getting ads");

        let mut params = common_params(&self.context);
        params.push((
            "fields".to_string(),
            "ads.limit(200){adset_id,id,name,creative}".to_string(),
        ));

        let queue = adsets
            .iter()
            .map(|adset| build_relative_url(&id_string(adset.get("id")), &params))
            .collect();
        let ads = self
            .executor
            .fetch_list(Method::Get, queue, &["ads", "data"], None)
            .await?;
        let distinct = distinct(ads);
        info!(count = distinct.len(), "distinct ads fetched");
        Ok(distinct)
    }

    /// Daily insights per ad, keyed by ad id. Ads without performance data
    /// in the window are absent from the result.
    pub async fn ads_insights(&self, ads: &[Value]) -> Result<Map<String, Value>> {
        info!(ads = ads.len(), "getting insights");

        let mut params = common_params(&self.context);
        params.push(("fields".to_string(), INSIGHT_FIELDS.to_string()));
        params.push(("time_increment".to_string(), "1".to_string()));

        let queue = ads
            .iter()
            .map(|ad| {
                build_relative_url(&format!("{}/insights", id_string(ad.get("id"))), &params)
            })
            .collect();
        let insights = self
            .executor
            .fetch_keyed(Method::Get, queue, &["data"], None)
            .await?;

        info!(
            with_data = insights.len(),
            percent = percentage(insights.len(), ads.len()),
            "ads with performance data"
        );
        Ok(insights)
    }

    pub async fn creatives_from_ads(&self, ads: &[Value]) -> Result<Vec<Value>> {
        info!(ads = ads.len(), "getting creatives");
        let ads_with_creatives: Vec<&Value> = ads
            .iter()
            .filter(|ad| ad.get("creative").map(|c| !c.is_null()).unwrap_or(false))
            .collect();
        info!(
            with_creatives = ads_with_creatives.len(),
            percent = percentage(ads_with_creatives.len(), ads.len()),
            "ads with creatives"
        );

        let mut params = common_params(&self.context);
        params.push((
            "fields".to_string(),
            "creative.limit(200){id,name,asset_feed_spec,object_story_spec,effective_instagram_media_id,effective_instagram_story_id}"
                .to_string(),
        ));

        let queue = ads_with_creatives
            .iter()
            .map(|ad| build_relative_url(&id_string(ad.get("id")), &params))
            .collect();
        let creatives = self
            .executor
            .fetch_list(Method::Get, queue, &["creative"], None)
            .await?;
        let distinct = distinct(creatives);
        info!(count = distinct.len(), "distinct creatives fetched");
        Ok(distinct)
    }

    /// Summarize each creative's asset surface.
    pub fn extract_assets(&self, creatives: &[Value]) -> Vec<CreativeAsset> {
        extract_assets(creatives)
    }

    /// Per-breakdown insights for every ad whose creative carries the
    /// matching asset kind. Each breakdown queue is drained as its own
    /// keyed batch run; all queues run concurrently.
    pub async fn ads_insights_breakdown(
        &self,
        ads: &[Value],
        assets: &[CreativeAsset],
    ) -> Result<Map<String, Value>> {
        let mut params = common_params(&self.context);
        params.push(("fields".to_string(), INSIGHT_FIELDS.to_string()));

        let queues =
            create_ads_insights_queues(ads, assets, self.context.breakdowns(), &params);

        info!(ads = ads.len(), assets = assets.len(), "getting breakdown insights");

        let runs = join_all(queues.into_iter().map(|(kind, urls)| {
            let executor = &self.executor;
            async move {
                let label = format!("Total {} records fetched", kind);
                let data = executor
                    .fetch_keyed(Method::Get, urls, &["insights", "data"], Some(&label))
                    .await?;
                Ok::<(String, Map<String, Value>), Error>((kind, data))
            }
        }))
        .await;

        let mut insights = Map::new();
        for run in runs {
            let (kind, data) = run?;
            insights.insert(kind, Value::Object(data));
        }
        Ok(insights)
    }

    /// Ad images referenced by each creative, fetched by hash in chunks and
    /// re-keyed per creative. Creatives with no resolvable image are absent.
    pub async fn images_from_creatives(&self, creatives: &[Value]) -> Result<Map<String, Value>> {
        let hashes_by_creative = image_hashes_by_creative(creatives);
        let unique_hashes = distinct(hashes_by_creative.values().flatten().cloned().collect());
        info!(hashes = unique_hashes.len(), "fetching images");

        let batch_size = 200;
        let mut queue = Vec::new();
        for chunk in unique_hashes.chunks(batch_size) {
            let params = vec![
                ("fields".to_string(), "hash,name,permalink_url".to_string()),
                ("limit".to_string(), batch_size.to_string()),
                ("hashes".to_string(), serde_json::to_string(chunk)?),
            ];
            queue.push(build_relative_url(
                &format!("{}/adimages", self.context.account_id()),
                &params,
            ));
        }

        let images = self
            .executor
            .fetch_list(Method::Get, queue, &["data"], None)
            .await?;

        let mut images_by_hash: Map<String, Value> = Map::new();
        for image in images {
            let hash = id_string(image.get("hash"));
            images_by_hash.insert(
                hash.clone(),
                json!({
                    "hash": hash,
                    "url": image.get("permalink_url").cloned().unwrap_or(Value::Null),
                    "name": image.get("name").cloned().unwrap_or(Value::Null),
                }),
            );
        }

        let mut by_creative = Map::new();
        for (creative_id, hashes) in hashes_by_creative {
            let data: Vec<Value> = hashes
                .iter()
                .filter_map(|hash| images_by_hash.get(&id_string(Some(hash))))
                .cloned()
                .collect();
            if !data.is_empty() {
                by_creative.insert(creative_id, Value::Array(data));
            }
        }
        Ok(by_creative)
    }

    /// Videos referenced by each creative, fetched by id and re-keyed per
    /// creative. Unresolvable ids are kept as null entries.
    pub async fn videos_from_creatives(&self, creatives: &[Value]) -> Result<Map<String, Value>> {
        let ids_by_creative = video_ids_by_creative(creatives);
        let unique_ids = distinct(ids_by_creative.values().flatten().cloned().collect());
        info!(ids = unique_ids.len(), "fetching videos");

        let params = vec![(
            "fields".to_string(),
            "id,title,description,permalink_url,source".to_string(),
        )];
        let queue = unique_ids
            .iter()
            .map(|id| build_relative_url(&id_string(Some(id)), &params))
            .collect();
        let videos = self
            .executor
            .fetch_list(Method::Get, queue, &["video"], None)
            .await?;

        let mut videos_by_id: Map<String, Value> = Map::new();
        for video in videos {
            videos_by_id.insert(id_string(video.get("id")), video);
        }

        let mut by_creative = Map::new();
        for (creative_id, ids) in ids_by_creative {
            let data: Vec<Value> = ids
                .iter()
                .map(|id| {
                    videos_by_id
                        .get(&id_string(Some(id)))
                        .cloned()
                        .unwrap_or(Value::Null)
                })
                .collect();
            by_creative.insert(creative_id, Value::Array(data));
        }
        Ok(by_creative)
    }

    /// The top-level operation: walk campaigns → adsets → ads → creatives,
    /// extract assets, fetch per-breakdown insights, and return the
    /// aggregate with entity counts.
    pub async fn creative_analytics(&self) -> Result<AnalyticsResult> {
        match self.creative_analytics_inner().await {
            Ok(result) => Ok(result),
            Err(err) => {
                error!(error = %err, "error fetching creative analytics");
                Err(err)
            }
        }
    }

    async fn creative_analytics_inner(&self) -> Result<AnalyticsResult> {
        let campaigns = self.campaigns().await?;
        let adsets = self.adsets_from_campaigns(&campaigns).await?;
        let ads = self.ads_from_adsets(&adsets).await?;
        let creatives = self.creatives_from_ads(&ads).await?;
        let assets = self.extract_assets(&creatives);
        let insights = self.ads_insights_breakdown(&ads, &assets).await?;

        Ok(AnalyticsResult {
            status: "success".to_string(),
            data: AnalyticsData {
                insights,
                metadata: AnalyticsMetadata {
                    campaigns: campaigns.len(),
                    adsets: adsets.len(),
                    ads: ads.len(),
                    creatives: creatives.len(),
                    assets: assets.len(),
                },
            },
        })
    }
}

/// Keep the first occurrence of each value, comparing serialized identity.
fn distinct(values: Vec<Value>) -> Vec<Value> {
    let mut seen = HashSet::new();
    values
        .into_iter()
        .filter(|value| seen.insert(value.to_string()))
        .collect()
}

fn percentage(part: usize, whole: usize) -> u32 {
    if whole == 0 {
        return 0;
    }
    ((part as f64 / whole as f64) * 100.0).round() as u32
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn distinct_keeps_first_occurrence_order() {
        let values = vec![json!({"id": "1"}), json!({"id": "2"}), json!({"id": "1"})];
        let out = distinct(values);
        assert_eq!(out, vec![json!({"id": "1"}), json!({"id": "2"})]);
    }

    #[test]
    fn percentage_rounds_and_guards_zero() {
        assert_eq!(percentage(1, 3), 33);
        assert_eq!(percentage(2, 3), 67);
        assert_eq!(percentage(0, 0), 0);
    }
}
