#![forbid(unsafe_code)]

//! Blocking client for the YouTube Data API v3.
//!
//! The provider is reached through the [`VideoApi`] trait so the pipeline can
//! run against an in-memory fake in tests. The real client issues one HTTP
//! request per call and never retries; resilience policy lives with the
//! callers.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value;
use ureq::Agent;

use crate::error::FetchError;
use crate::model::{ChannelSummary, VideoRecord};

pub const API_BASE_URL: &str = "https://www.googleapis.com/youtube/v3";

/// The provider's practical ceiling for ids in one list request.
pub const MAX_BATCH_IDS: usize = 50;

/// Page size used when walking a playlist.
pub const PAGE_SIZE: u32 = 50;

/// Top-level comments sampled per video, first page only.
pub const COMMENT_SAMPLE_SIZE: u32 = 10;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// One page of a playlist enumeration: up to [`PAGE_SIZE`] video ids plus the
/// continuation token, if the provider produced one.
#[derive(Debug, Clone)]
pub struct PlaylistPage {
    pub video_ids: Vec<String>,
    pub next_page_token: Option<String>,
}

/// Query surface of the metadata provider.
///
/// Callers are responsible for chunking id lists to [`MAX_BATCH_IDS`]; each
/// method maps to exactly one request.
pub trait VideoApi {
    /// One summary per recognized channel id, unrecognized ids silently
    /// absent. A summary is either fully present or absent.
    fn channel_summaries(&self, channel_ids: &[String]) -> Result<Vec<ChannelSummary>, FetchError>;

    /// One page of a channel's uploads playlist in provider order.
    fn playlist_page(
        &self,
        playlist_id: &str,
        page_token: Option<&str>,
    ) -> Result<PlaylistPage, FetchError>;

    /// One record per resolvable video id, in request order. Deleted or
    /// private ids are simply missing from the output.
    fn video_details(&self, video_ids: &[String]) -> Result<Vec<VideoRecord>, FetchError>;

    /// First page of top-level comment texts for a single video, at most
    /// [`COMMENT_SAMPLE_SIZE`] entries.
    fn top_level_comments(&self, video_id: &str) -> Result<Vec<String>, FetchError>;
}

/// Real Data API client backed by a blocking `ureq` agent with an explicit
/// request timeout.
pub struct YouTubeClient {
    agent: Agent,
    api_key: String,
    base_url: String,
}

impl YouTubeClient {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self::with_base_url(api_key, API_BASE_URL)
    }

    /// Points the client at an alternative base URL, e.g. a local stub.
    pub fn with_base_url(api_key: impl Into<String>, base_url: impl Into<String>) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout(REQUEST_TIMEOUT)
            .build();
        Self {
            agent,
            api_key: api_key.into(),
            base_url: base_url.into(),
        }
    }

    /// Issues one GET against `endpoint` and deserializes the JSON body. The
    /// API key is appended here so it never appears in error messages.
    fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        endpoint: &str,
        query: &[(&str, &str)],
    ) -> Result<T, FetchError> {
        let url = format!("{}/{}", self.base_url, endpoint);
        let mut request = self.agent.get(&url).query("key", &self.api_key);
        for (name, value) in query {
            request = request.query(name, value);
        }

        match request.call() {
            Ok(response) => response.into_json::<T>().map_err(|err| FetchError::Malformed {
                endpoint: endpoint.to_owned(),
                message: err.to_string(),
            }),
            Err(ureq::Error::Status(status, response)) => {
                let body = response.into_json::<Value>().unwrap_or(Value::Null);
                Err(classify_api_error(endpoint, status, &body))
            }
            Err(ureq::Error::Transport(transport)) => Err(FetchError::Transport {
                endpoint: endpoint.to_owned(),
                message: transport.to_string(),
            }),
        }
    }
}

impl VideoApi for YouTubeClient {
    fn channel_summaries(&self, channel_ids: &[String]) -> Result<Vec<ChannelSummary>, FetchError> {
        if channel_ids.is_empty() {
            return Ok(Vec::new());
        }
        let ids = channel_ids.join(",");
        let response: ListResponse<ChannelItem> = self.get_json(
            "channels",
            &[
                ("part", "snippet,statistics,contentDetails"),
                ("id", &ids),
                ("maxResults", "50"),
            ],
        )?;

        let mut summaries = Vec::new();
        for item in response.items {
            if let Some(summary) = channel_from_item(item)? {
                summaries.push(summary);
            }
        }
        Ok(summaries)
    }

    fn playlist_page(
        &self,
        playlist_id: &str,
        page_token: Option<&str>,
    ) -> Result<PlaylistPage, FetchError> {
        let page_size = PAGE_SIZE.to_string();
        let mut query = vec![
            ("part", "contentDetails"),
            ("playlistId", playlist_id),
            ("maxResults", page_size.as_str()),
        ];
        if let Some(token) = page_token {
            query.push(("pageToken", token));
        }
        let response: ListResponse<PlaylistItem> = self.get_json("playlistItems", &query)?;

        let video_ids = response
            .items
            .into_iter()
            .filter_map(|item| item.content_details.map(|details| details.video_id))
            .collect();
        Ok(PlaylistPage {
            video_ids,
            next_page_token: response.next_page_token,
        })
    }

    fn video_details(&self, video_ids: &[String]) -> Result<Vec<VideoRecord>, FetchError> {
        if video_ids.is_empty() {
            return Ok(Vec::new());
        }
        let ids = video_ids.join(",");
        let response: ListResponse<VideoItem> = self.get_json(
            "videos",
            &[
                ("part", "snippet,contentDetails,statistics"),
                ("id", &ids),
                ("maxResults", "50"),
            ],
        )?;

        let mut records = Vec::new();
        for item in response.items {
            if let Some(record) = video_from_item(item)? {
                records.push(record);
            }
        }
        Ok(records)
    }

    fn top_level_comments(&self, video_id: &str) -> Result<Vec<String>, FetchError> {
        let sample_size = COMMENT_SAMPLE_SIZE.to_string();
        let response: ListResponse<CommentThreadItem> = self.get_json(
            "commentThreads",
            &[
                ("part", "snippet"),
                ("videoId", video_id),
                ("maxResults", sample_size.as_str()),
                ("textFormat", "plainText"),
            ],
        )?;

        Ok(response
            .items
            .into_iter()
            .filter_map(comment_text_from_item)
            .collect())
    }
}

/// Turns a non-success status plus the provider's error body into the right
/// `FetchError` variant. Quota exhaustion gets its own variant because it is
/// the one failure an operator can act on.
fn classify_api_error(endpoint: &str, status: u16, body: &Value) -> FetchError {
    let reason = body["error"]["errors"][0]["reason"]
        .as_str()
        .or_else(|| body["error"]["status"].as_str())
        .unwrap_or("unknown")
        .to_owned();

    match reason.as_str() {
        "quotaExceeded" | "dailyLimitExceeded" | "rateLimitExceeded" => FetchError::QuotaExceeded,
        _ => FetchError::Api {
            status,
            endpoint: endpoint.to_owned(),
            reason,
        },
    }
}

#[derive(Debug, Deserialize)]
struct ListResponse<T> {
    #[serde(default = "Vec::new")]
    items: Vec<T>,
    #[serde(rename = "nextPageToken")]
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChannelItem {
    id: String,
    snippet: Option<ChannelSnippet>,
    statistics: Option<ChannelStatistics>,
    content_details: Option<ChannelContentDetails>,
}

#[derive(Debug, Deserialize)]
struct ChannelSnippet {
    title: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChannelStatistics {
    subscriber_count: Option<String>,
    #[serde(default)]
    hidden_subscriber_count: bool,
    view_count: Option<String>,
    video_count: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChannelContentDetails {
    related_playlists: Option<RelatedPlaylists>,
}

#[derive(Debug, Deserialize)]
struct RelatedPlaylists {
    uploads: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PlaylistItem {
    content_details: Option<PlaylistItemContentDetails>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PlaylistItemContentDetails {
    video_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VideoItem {
    id: String,
    snippet: Option<VideoSnippet>,
    content_details: Option<VideoContentDetails>,
    statistics: Option<VideoStatistics>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VideoSnippet {
    channel_title: String,
    title: String,
    #[serde(default)]
    description: String,
    tags: Option<Vec<String>>,
    published_at: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VideoContentDetails {
    duration: String,
    #[serde(default)]
    definition: String,
    caption: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VideoStatistics {
    view_count: Option<String>,
    like_count: Option<String>,
    comment_count: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CommentThreadItem {
    snippet: Option<CommentThreadSnippet>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CommentThreadSnippet {
    top_level_comment: Option<TopLevelComment>,
}

#[derive(Debug, Deserialize)]
struct TopLevelComment {
    snippet: Option<CommentSnippet>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CommentSnippet {
    text_display: Option<String>,
}

/// Maps a raw channel item to a summary. Items missing any required field
/// group are dropped rather than half-populated.
fn channel_from_item(item: ChannelItem) -> Result<Option<ChannelSummary>, FetchError> {
    let Some(snippet) = item.snippet else {
        return Ok(None);
    };
    let Some(statistics) = item.statistics else {
        return Ok(None);
    };
    let Some(uploads) = item
        .content_details
        .and_then(|details| details.related_playlists)
        .and_then(|playlists| playlists.uploads)
    else {
        return Ok(None);
    };

    let (Some(view_count), Some(video_count)) = (
        parse_count(statistics.view_count.as_deref(), "channels", "viewCount")?,
        parse_count(statistics.video_count.as_deref(), "channels", "videoCount")?,
    ) else {
        return Ok(None);
    };

    let subscriber_count = if statistics.hidden_subscriber_count {
        None
    } else {
        parse_count(
            statistics.subscriber_count.as_deref(),
            "channels",
            "subscriberCount",
        )?
    };

    Ok(Some(ChannelSummary {
        channel_id: item.id,
        title: snippet.title,
        subscriber_count,
        view_count,
        video_count,
        uploads_playlist: uploads,
    }))
}

/// Maps a raw video item to a record. The snippet and content-details groups
/// are mandatory (without them the video is unusable and is dropped, the same
/// as a deleted id); each statistics field stays independently optional.
fn video_from_item(item: VideoItem) -> Result<Option<VideoRecord>, FetchError> {
    let Some(snippet) = item.snippet else {
        return Ok(None);
    };
    let Some(content_details) = item.content_details else {
        return Ok(None);
    };

    let published_at: DateTime<Utc> = DateTime::parse_from_rfc3339(&snippet.published_at)
        .map_err(|err| FetchError::Malformed {
            endpoint: "videos".to_owned(),
            message: format!("publishedAt for {}: {err}", item.id),
        })?
        .with_timezone(&Utc);

    let statistics = item.statistics.unwrap_or(VideoStatistics {
        view_count: None,
        like_count: None,
        comment_count: None,
    });

    Ok(Some(VideoRecord {
        video_id: item.id,
        channel_title: snippet.channel_title,
        title: snippet.title,
        description: snippet.description,
        tags: snippet.tags.unwrap_or_default(),
        published_at,
        duration: content_details.duration,
        view_count: parse_count(statistics.view_count.as_deref(), "videos", "viewCount")?,
        like_count: parse_count(statistics.like_count.as_deref(), "videos", "likeCount")?,
        comment_count: parse_count(
            statistics.comment_count.as_deref(),
            "videos",
            "commentCount",
        )?,
        definition: content_details.definition,
        caption: content_details.caption.as_deref() == Some("true"),
    }))
}

fn comment_text_from_item(item: CommentThreadItem) -> Option<String> {
    item.snippet?.top_level_comment?.snippet?.text_display
}

/// The API encodes counts as decimal strings. Absence stays `None`; a present
/// but non-numeric value is a malformed response, never a silent zero.
fn parse_count(
    value: Option<&str>,
    endpoint: &str,
    field: &str,
) -> Result<Option<u64>, FetchError> {
    match value {
        None => Ok(None),
        Some(raw) => raw.parse::<u64>().map(Some).map_err(|_| FetchError::Malformed {
            endpoint: endpoint.to_owned(),
            message: format!("{field} is not a non-negative integer: {raw:?}"),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn channel_item(value: Value) -> ChannelItem {
        serde_json::from_value(value).unwrap()
    }

    fn video_item(value: Value) -> VideoItem {
        serde_json::from_value(value).unwrap()
    }

    fn full_channel_json() -> Value {
        json!({
            "id": "UC123",
            "snippet": { "title": "Example Channel" },
            "statistics": {
                "subscriberCount": "120000",
                "hiddenSubscriberCount": false,
                "viewCount": "4500000",
                "videoCount": "210"
            },
            "contentDetails": {
                "relatedPlaylists": { "uploads": "UU123" }
            }
        })
    }

    #[test]
    fn channel_mapping_populates_every_field() {
        let summary = channel_from_item(channel_item(full_channel_json()))
            .unwrap()
            .expect("summary present");
        assert_eq!(summary.channel_id, "UC123");
        assert_eq!(summary.title, "Example Channel");
        assert_eq!(summary.subscriber_count, Some(120_000));
        assert_eq!(summary.view_count, 4_500_000);
        assert_eq!(summary.video_count, 210);
        assert_eq!(summary.uploads_playlist, "UU123");
    }

    #[test]
    fn channel_mapping_hides_subscriber_count_when_flagged() {
        let mut value = full_channel_json();
        value["statistics"]["hiddenSubscriberCount"] = json!(true);
        let summary = channel_from_item(channel_item(value)).unwrap().unwrap();
        assert_eq!(summary.subscriber_count, None);
    }

    #[test]
    fn channel_mapping_drops_items_missing_required_groups() {
        for field in ["snippet", "statistics", "contentDetails"] {
            let mut value = full_channel_json();
            value.as_object_mut().unwrap().remove(field);
            assert!(
                channel_from_item(channel_item(value)).unwrap().is_none(),
                "channel without {field} should be absent, not partial"
            );
        }
    }

    #[test]
    fn channel_mapping_rejects_non_numeric_counts() {
        let mut value = full_channel_json();
        value["statistics"]["viewCount"] = json!("lots");
        let err = channel_from_item(channel_item(value)).unwrap_err();
        assert!(matches!(err, FetchError::Malformed { .. }));
    }

    fn full_video_json() -> Value {
        json!({
            "id": "vid1",
            "snippet": {
                "channelTitle": "Example Channel",
                "title": "A video",
                "description": "About things",
                "tags": ["a", "b"],
                "publishedAt": "2024-03-05T17:00:00Z"
            },
            "contentDetails": {
                "duration": "PT5M0S",
                "definition": "hd",
                "caption": "true"
            },
            "statistics": {
                "viewCount": "100",
                "likeCount": "10",
                "commentCount": "3"
            }
        })
    }

    #[test]
    fn video_mapping_populates_every_field() {
        let record = video_from_item(video_item(full_video_json()))
            .unwrap()
            .expect("record present");
        assert_eq!(record.video_id, "vid1");
        assert_eq!(record.channel_title, "Example Channel");
        assert_eq!(record.tags, vec!["a", "b"]);
        assert_eq!(record.published_at.to_rfc3339(), "2024-03-05T17:00:00+00:00");
        assert_eq!(record.duration, "PT5M0S");
        assert_eq!(record.view_count, Some(100));
        assert_eq!(record.like_count, Some(10));
        assert_eq!(record.comment_count, Some(3));
        assert_eq!(record.definition, "hd");
        assert!(record.caption);
    }

    #[test]
    fn video_mapping_keeps_absent_counts_absent() {
        let mut value = full_video_json();
        value["statistics"] = json!({ "viewCount": "0" });
        let record = video_from_item(video_item(value)).unwrap().unwrap();
        assert_eq!(record.view_count, Some(0));
        assert_eq!(record.like_count, None);
        assert_eq!(record.comment_count, None);
    }

    #[test]
    fn video_mapping_tolerates_missing_statistics_and_tags() {
        let mut value = full_video_json();
        value.as_object_mut().unwrap().remove("statistics");
        value["snippet"].as_object_mut().unwrap().remove("tags");
        let record = video_from_item(video_item(value)).unwrap().unwrap();
        assert!(record.tags.is_empty());
        assert_eq!(record.view_count, None);
    }

    #[test]
    fn video_mapping_drops_items_missing_snippet_or_content_details() {
        for field in ["snippet", "contentDetails"] {
            let mut value = full_video_json();
            value.as_object_mut().unwrap().remove(field);
            assert!(video_from_item(video_item(value)).unwrap().is_none());
        }
    }

    #[test]
    fn video_mapping_rejects_unparseable_publish_timestamp() {
        let mut value = full_video_json();
        value["snippet"]["publishedAt"] = json!("yesterday");
        let err = video_from_item(video_item(value)).unwrap_err();
        assert!(matches!(err, FetchError::Malformed { .. }));
    }

    #[test]
    fn quota_reasons_map_to_quota_exceeded() {
        for reason in ["quotaExceeded", "dailyLimitExceeded", "rateLimitExceeded"] {
            let body = json!({ "error": { "errors": [{ "reason": reason }] } });
            assert!(matches!(
                classify_api_error("videos", 403, &body),
                FetchError::QuotaExceeded
            ));
        }
    }

    #[test]
    fn other_api_errors_keep_status_and_reason() {
        let body = json!({ "error": { "errors": [{ "reason": "commentsDisabled" }] } });
        match classify_api_error("commentThreads", 403, &body) {
            FetchError::Api {
                status,
                endpoint,
                reason,
            } => {
                assert_eq!(status, 403);
                assert_eq!(endpoint, "commentThreads");
                assert_eq!(reason, "commentsDisabled");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn error_bodies_without_a_reason_fall_back_to_unknown() {
        match classify_api_error("channels", 500, &Value::Null) {
            FetchError::Api { reason, .. } => assert_eq!(reason, "unknown"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn list_response_defaults_missing_items() {
        let response: ListResponse<PlaylistItem> =
            serde_json::from_value(json!({ "nextPageToken": "tok" })).unwrap();
        assert!(response.items.is_empty());
        assert_eq!(response.next_page_token.as_deref(), Some("tok"));
    }

    #[test]
    fn comment_items_without_text_are_skipped() {
        let with_text: CommentThreadItem = serde_json::from_value(json!({
            "snippet": { "topLevelComment": { "snippet": { "textDisplay": "nice" } } }
        }))
        .unwrap();
        let without_text: CommentThreadItem = serde_json::from_value(json!({
            "snippet": { "topLevelComment": { "snippet": {} } }
        }))
        .unwrap();
        assert_eq!(comment_text_from_item(with_text).as_deref(), Some("nice"));
        assert_eq!(comment_text_from_item(without_text), None);
    }
}
