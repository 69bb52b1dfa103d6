#![forbid(unsafe_code)]

//! Pure feature derivation over an already-fetched video table. No network
//! access happens here.

use anyhow::{Context, Result};

use crate::duration::parse_duration_seconds;
use crate::model::{EnrichedVideo, VideoRecord};

/// Derives the feature columns for every record.
///
/// A duration that fails to decode is fatal to the whole pass: a malformed
/// duration means the provider broke its contract, and silently skipping the
/// row would make the output table lie about the channel.
pub fn enrich_videos(videos: Vec<VideoRecord>) -> Result<Vec<EnrichedVideo>> {
    videos.into_iter().map(enrich_video).collect()
}

fn enrich_video(video: VideoRecord) -> Result<EnrichedVideo> {
    let duration_secs = parse_duration_seconds(&video.duration)
        .with_context(|| format!("decoding duration of video {}", video.video_id))?;

    Ok(EnrichedVideo {
        publish_weekday: video.published_at.format("%A").to_string(),
        duration_secs,
        tag_count: video.tags.len(),
        likes_per_1k_views: per_thousand_views(video.like_count, video.view_count),
        comments_per_1k_views: per_thousand_views(video.comment_count, video.view_count),
        title_length: video.title.chars().count(),
        video,
    })
}

/// Engagement ratio, left absent when the view count is absent or zero so a
/// dead or unreadable counter never manufactures a signal.
fn per_thousand_views(count: Option<u64>, views: Option<u64>) -> Option<f64> {
    let count = count?;
    let views = views?;
    if views == 0 {
        return None;
    }
    Some(count as f64 * 1000.0 / views as f64)
}
