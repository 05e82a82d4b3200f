use std::collections::{BTreeMap, HashMap, HashSet};

use serde::Serialize;
use serde_json::Value;

use super::params::build_relative_url;

/// Flattened view of one creative: which asset kinds it carries and the
/// media identifiers needed for breakdown insights and media lookups.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreativeAsset {
    pub creative_id: Option<String>,
    pub is_carousel: bool,
    pub has_body: bool,
    pub has_call_to_action: bool,
    pub has_description: bool,
    pub has_link_url: bool,
    pub has_title: bool,
    pub has_multiple_placements: bool,
    pub asset_feed_image_hashes: Option<Vec<Value>>,
    pub asset_feed_video_ids: Option<Vec<Value>>,
    pub object_story_image_hash: Option<Value>,
    pub object_story_video_id: Option<Value>,
    pub object_story_child_attachments: Option<Vec<ChildAttachment>>,
    pub effective_instagram_media_id: Option<Value>,
    pub effective_instagram_story_id: Option<Value>,
}

/// One carousel card reference: a video id or an image hash.
#[derive(Debug, Clone, Serialize)]
pub struct ChildAttachment {
    pub id: Value,
    #[serde(rename = "type")]
    pub kind: String,
}

/// Summarize each creative's asset surface.
pub fn extract_assets(creatives: &[Value]) -> Vec<CreativeAsset> {
    creatives
        .iter()
        .map(|creative| {
            let asset_feed = creative.get("asset_feed_spec");
            let object_story = creative.get("object_story_spec");

            CreativeAsset {
                creative_id: creative
                    .get("id")
                    .and_then(Value::as_str)
                    .map(str::to_string),
                is_carousel: is_carousel(creative),
                has_body: truthy(creative.pointer("/asset_feed_spec/bodies"))
                    || truthy(creative.pointer("/object_story_spec/image_data/message"))
                    || truthy(creative.pointer("/object_story_spec/video_data/message")),
                has_call_to_action: truthy(creative.pointer("/asset_feed_spec/call_to_action_types"))
                    || truthy(creative.pointer("/object_story_spec/image_data/call_to_action"))
                    || truthy(creative.pointer("/object_story_spec/video_data/call_to_action")),
                has_description: truthy(creative.pointer("/asset_feed_spec/descriptions"))
                    || truthy(creative.pointer("/object_story_spec/image_data/link_description"))
                    || truthy(creative.pointer("/object_story_spec/video_data/link_description")),
                has_link_url: truthy(creative.pointer("/asset_feed_spec/link_urls"))
                    || truthy(
                        creative.pointer("/object_story_spec/image_data/call_to_action/value/link"),
                    )
                    || truthy(
                        creative.pointer("/object_story_spec/video_data/call_to_action/value/link"),
                    ),
                has_title: truthy(creative.pointer("/asset_feed_spec/titles"))
                    || truthy(creative.pointer("/object_story_spec/image_data/title"))
                    || truthy(creative.pointer("/object_story_spec/video_data/title")),
                has_multiple_placements: has_multiple_placements(
                    creative.pointer("/asset_feed_spec/asset_customization_rules"),
                ),
                asset_feed_image_hashes: extract_ids(
                    asset_feed.and_then(|spec| spec.get("images")),
                    "hash",
                ),
                asset_feed_video_ids: extract_ids(
                    asset_feed.and_then(|spec| spec.get("videos")),
                    "video_id",
                ),
                object_story_image_hash: object_story
                    .and_then(|spec| spec.pointer("/photo_data/image_hash"))
                    .cloned(),
                object_story_video_id: object_story
                    .and_then(|spec| spec.pointer("/video_data/video_id"))
                    .cloned(),
                object_story_child_attachments: child_attachments(object_story),
                effective_instagram_media_id: creative.get("effective_instagram_media_id").cloned(),
                effective_instagram_story_id: creative.get("effective_instagram_story_id").cloned(),
            }
        })
        .collect()
}

/// Build the per-breakdown insights queues for every ad whose creative
/// carries the matching asset kind. Image and video breakdowns are only
/// queued for creatives with multiple placements; the remaining kinds hinge
/// on the creative's asset flags.
pub fn create_ads_insights_queues(
    ads: &[Value],
    assets: &[CreativeAsset],
    breakdowns: &[String],
    params: &[(String, String)],
) -> BTreeMap<String, Vec<String>> {
    let assets_by_creative: HashMap<&str, &CreativeAsset> = assets
        .iter()
        .filter_map(|asset| asset.creative_id.as_deref().map(|id| (id, asset)))
        .collect();

    let wants = |kind: &str| breakdowns.iter().any(|b| b == kind);
    let mut queues: BTreeMap<String, Vec<String>> = BTreeMap::new();
    let enqueue = |queues: &mut BTreeMap<String, Vec<String>>, kind: &str, path: &str| {
        let mut params = params.to_vec();
        params.push(("breakdowns".to_string(), kind.to_string()));
        params.push(("time_increment".to_string(), "1".to_string()));
        queues
            .entry(kind.to_string())
            .or_default()
            .push(build_relative_url(path, &params));
    };

    for ad in ads {
        let insight_path = format!("{}/insights", id_string(ad.get("id")));
        let creative = ad
            .pointer("/creative/id")
            .and_then(Value::as_str)
            .and_then(|id| assets_by_creative.get(id).copied());

        if creative.map(|c| c.has_multiple_placements).unwrap_or(false) {
            if wants("image_asset")
                && creative.map(|c| c.asset_feed_image_hashes.is_some()).unwrap_or(false)
            {
                enqueue(&mut queues, "image_asset", &insight_path);
            }
            if wants("video_asset")
                && creative.map(|c| c.asset_feed_video_ids.is_some()).unwrap_or(false)
            {
                enqueue(&mut queues, "video_asset", &insight_path);
            }
        }

        if wants("body_asset") && creative.map(|c| c.has_body).unwrap_or(false) {
            enqueue(&mut queues, "body_asset", &insight_path);
        }
        if wants("call_to_action_asset") && creative.map(|c| c.has_call_to_action).unwrap_or(false)
        {
            enqueue(&mut queues, "call_to_action_asset", &insight_path);
        }
        if wants("description_asset") && creative.map(|c| c.has_description).unwrap_or(false) {
            enqueue(&mut queues, "description_asset", &insight_path);
        }
        if wants("link_url_asset") && creative.map(|c| c.has_link_url).unwrap_or(false) {
            enqueue(&mut queues, "link_url_asset", &insight_path);
        }
        if wants("title_asset") && creative.map(|c| c.has_title).unwrap_or(false) {
            enqueue(&mut queues, "title_asset", &insight_path);
        }
    }

    queues
}

/// Every image hash referenced by each creative: asset feed images, the
/// object story photo, and carousel card images. Creatives without any hash
/// are omitted.
pub fn image_hashes_by_creative(creatives: &[Value]) -> BTreeMap<String, Vec<Value>> {
    let mut by_creative = BTreeMap::new();
    for creative in creatives {
        let mut hashes: Vec<Value> = Vec::new();
        if let Some(ids) = extract_ids(creative.pointer("/asset_feed_spec/images"), "hash") {
            hashes.extend(ids);
        }
        if let Some(hash) = creative.pointer("/object_story_spec/photo_data/image_hash") {
            if truthy(Some(hash)) {
                hashes.push(hash.clone());
            }
        }
        if let Some(attachments) = creative
            .pointer("/object_story_spec/link_data/child_attachments")
            .and_then(Value::as_array)
        {
            hashes.extend(
                attachments
                    .iter()
                    .filter_map(|attachment| attachment.get("image_hash"))
                    .filter(|hash| truthy(Some(hash)))
                    .cloned(),
            );
        }
        if !hashes.is_empty() {
            by_creative.insert(id_string(creative.get("id")), hashes);
        }
    }
    by_creative
}

/// Every video id referenced by each creative: asset feed videos, the object
/// story video, and carousel card videos.
pub fn video_ids_by_creative(creatives: &[Value]) -> BTreeMap<String, Vec<Value>> {
    let mut by_creative = BTreeMap::new();
    for creative in creatives {
        let mut ids: Vec<Value> = Vec::new();
        if let Some(feed_ids) = extract_ids(creative.pointer("/asset_feed_spec/videos"), "video_id")
        {
            ids.extend(feed_ids);
        }
        if let Some(id) = creative.pointer("/object_story_spec/video_data/video_id") {
            if truthy(Some(id)) {
                ids.push(id.clone());
            }
        }
        if let Some(attachments) = creative
            .pointer("/object_story_spec/link_data/child_attachments")
            .and_then(Value::as_array)
        {
            ids.extend(
                attachments
                    .iter()
                    .filter_map(|attachment| attachment.get("video_id"))
                    .filter(|id| truthy(Some(id)))
                    .cloned(),
            );
        }
        by_creative.insert(id_string(creative.get("id")), ids);
    }
    by_creative
}

fn is_carousel(creative: &Value) -> bool {
    let carousel_format = creative
        .pointer("/asset_feed_spec/ad_formats")
        .and_then(Value::as_array)
        .map(|formats| formats.iter().any(|f| f.as_str() == Some("CAROUSEL")))
        .unwrap_or(false);
    let has_child_attachments = creative
        .pointer("/object_story_spec/link_data/child_attachments")
        .and_then(Value::as_array)
        .map(|attachments| !attachments.is_empty())
        .unwrap_or(false);
    carousel_format || has_child_attachments
}

/// A creative targets multiple placements when any customization label kind
/// resolves to more than one distinct id across its rules. A rule without
/// the label counts as its own distinct entry.
fn has_multiple_placements(rules: Option<&Value>) -> bool {
    let Some(rules) = rules.and_then(Value::as_array) else {
        return false;
    };
    ["carousel_label", "image_label", "video_label"]
        .iter()
        .any(|label| {
            let distinct: HashSet<Option<String>> = rules
                .iter()
                .map(|rule| {
                    rule.pointer(&format!("/{}/id", label))
                        .map(Value::to_string)
                })
                .collect();
            distinct.len() > 1
        })
}

fn extract_ids(items: Option<&Value>, key: &str) -> Option<Vec<Value>> {
    items.and_then(Value::as_array).map(|items| {
        items
            .iter()
            .map(|item| item.get(key).cloned().unwrap_or(Value::Null))
            .collect()
    })
}

fn child_attachments(object_story: Option<&Value>) -> Option<Vec<ChildAttachment>> {
    let attachments = object_story?
        .pointer("/link_data/child_attachments")?
        .as_array()?;
    Some(
        attachments
            .iter()
            .map(|attachment| {
                let video_id = attachment.get("video_id");
                if truthy(video_id) {
                    ChildAttachment {
                        id: video_id.cloned().unwrap_or(Value::Null),
                        kind: "video_id".to_string(),
                    }
                } else {
                    ChildAttachment {
                        id: attachment.get("image_hash").cloned().unwrap_or(Value::Null),
                        kind: "image_hash".to_string(),
                    }
                }
            })
            .collect(),
    )
}

/// JS-style truthiness over JSON values: absent, null, false, 0 and the
/// empty string are falsy; arrays and objects are always truthy.
fn truthy(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_f64().map(|f| f != 0.0).unwrap_or(true),
        Some(Value::String(s)) => !s.is_empty(),
        Some(_) => true,
    }
}

/// Stringify a JSON id the way templates do: strings verbatim, other values
/// via their JSON rendering, absent values as the empty string.
pub(crate) fn id_string(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
        None => String::new(),
    }
}
