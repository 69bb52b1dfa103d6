#![forbid(unsafe_code)]

//! Record shapes produced by one extraction run.
//!
//! The provider's loosely-typed responses are pinned down to fixed structs
//! with explicit optionality per field, so "absent" and "zero" can never be
//! confused downstream. All three entity types are created fresh each run and
//! only ever appended to; there are no update semantics.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One summary per recognized channel id. Discarded after its uploads
/// playlist has been enumerated, except for the end-of-run report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChannelSummary {
    pub channel_id: String,
    pub title: String,
    /// Absent when the channel hides its subscriber count.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subscriber_count: Option<u64>,
    pub view_count: u64,
    pub video_count: u64,
    /// Opaque handle for the channel's chronological uploads playlist.
    pub uploads_playlist: String,
}

/// Raw per-video row as fetched, before feature derivation.
///
/// The three count fields are independently optional: likes or comments may
/// be disabled per video, and the fetch layer never coerces an absent count
/// to zero.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VideoRecord {
    pub video_id: String,
    pub channel_title: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    pub published_at: DateTime<Utc>,
    /// Raw ISO-8601 duration text as emitted by the provider, e.g. `PT4M30S`.
    pub duration: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub view_count: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub like_count: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment_count: Option<u64>,
    /// Provider quality flag, `hd` or `sd`.
    pub definition: String,
    /// Whether the video carries closed captions.
    pub caption: bool,
}

/// A `VideoRecord` plus the derived feature columns.
#[derive(Debug, Clone, Serialize)]
pub struct EnrichedVideo {
    pub video: VideoRecord,
    /// English weekday name of the publish date in UTC, e.g. `Tuesday`.
    pub publish_weekday: String,
    pub duration_secs: u64,
    pub tag_count: usize,
    /// Likes per 1000 views; absent when views are absent or zero, or likes
    /// are disabled. Never manufactured as zero or infinity.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub likes_per_1k_views: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comments_per_1k_views: Option<f64>,
    pub title_length: usize,
}

/// Up to ten top-level comment texts for one video, in provider order.
///
/// A video with zero comments gets a present sample with an empty list. A
/// video whose comment fetch failed (comments disabled, quota, not found)
/// gets no sample at all; absence is the only marker, never a sentinel.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommentSample {
    pub video_id: String,
    #[serde(default)]
    pub comments: Vec<String>,
}
