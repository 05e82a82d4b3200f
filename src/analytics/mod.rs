//! Creative-analytics service built on the batch orchestration core:
//! hierarchy fetchers (campaigns, adsets, ads, creatives), asset extraction,
//! per-breakdown insights, and the top-level aggregate operation.

mod creative;
mod params;
mod service;

pub use creative::{
    create_ads_insights_queues, extract_assets, image_hashes_by_creative, video_ids_by_creative,
    ChildAttachment, CreativeAsset,
};
pub use params::{build_relative_url, common_params};
pub use service::{AnalyticsData, AnalyticsMetadata, AnalyticsResult, AnalyticsService};
