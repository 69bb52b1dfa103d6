#![forbid(unsafe_code)]

//! CSV materialization of the two output tables.
//!
//! Rows are sorted by video id before writing so identical input always
//! produces byte-identical files, and each file is replaced atomically via a
//! temp file + rename.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};

use crate::model::{CommentSample, EnrichedVideo};

pub const VIDEO_TABLE_HEADER: [&str; 18] = [
    "video_id",
    "channel_title",
    "title",
    "description",
    "tags",
    "published_at",
    "duration",
    "view_count",
    "like_count",
    "comment_count",
    "definition",
    "caption",
    "publish_weekday",
    "duration_secs",
    "tag_count",
    "likes_per_1k_views",
    "comments_per_1k_views",
    "title_length",
];

pub const COMMENT_TABLE_HEADER: [&str; 2] = ["video_id", "comments"];

/// Writes the enriched video table, one row per video, sorted by video id.
/// Absent optional values become empty cells, never zeros.
pub fn write_video_table(path: &Path, rows: &[EnrichedVideo]) -> Result<()> {
    let mut sorted: Vec<&EnrichedVideo> = rows.iter().collect();
    sorted.sort_by(|a, b| a.video.video_id.cmp(&b.video.video_id));

    let mut writer = csv::Writer::from_writer(Vec::new());
    writer
        .write_record(VIDEO_TABLE_HEADER)
        .context("writing video table header")?;
    for row in sorted {
        let video = &row.video;
        writer
            .write_record([
                video.video_id.as_str(),
                video.channel_title.as_str(),
                video.title.as_str(),
                video.description.as_str(),
                &encode_sublist(&video.tags),
                &video.published_at.to_rfc3339(),
                video.duration.as_str(),
                &optional_cell(video.view_count),
                &optional_cell(video.like_count),
                &optional_cell(video.comment_count),
                video.definition.as_str(),
                if video.caption { "true" } else { "false" },
                row.publish_weekday.as_str(),
                &row.duration_secs.to_string(),
                &row.tag_count.to_string(),
                &optional_cell(row.likes_per_1k_views),
                &optional_cell(row.comments_per_1k_views),
                &row.title_length.to_string(),
            ])
            .with_context(|| format!("writing row for video {}", video.video_id))?;
    }

    let contents = writer
        .into_inner()
        .map_err(|err| err.into_error())
        .context("flushing video table")?;
    replace_file(path, contents)
}

/// Writes the comment-sample table, one row per sampled video, sorted by
/// video id. Videos without a sample simply have no row.
pub fn write_comment_table(path: &Path, samples: &[CommentSample]) -> Result<()> {
    let mut sorted: Vec<&CommentSample> = samples.iter().collect();
    sorted.sort_by(|a, b| a.video_id.cmp(&b.video_id));

    let mut writer = csv::Writer::from_writer(Vec::new());
    writer
        .write_record(COMMENT_TABLE_HEADER)
        .context("writing comment table header")?;
    for sample in sorted {
        writer
            .write_record([sample.video_id.as_str(), &encode_sublist(&sample.comments)])
            .with_context(|| format!("writing comments for video {}", sample.video_id))?;
    }

    let contents = writer
        .into_inner()
        .map_err(|err| err.into_error())
        .context("flushing comment table")?;
    replace_file(path, contents)
}

/// Serializes a sequence into a single cell: items joined with `|`, with
/// literal backslashes and pipes escaped as `\\` and `\|`. [`decode_sublist`]
/// reverses the encoding. The empty cell decodes to the empty sequence, so a
/// sequence whose only element is the empty string is not representable; the
/// provider never emits empty tags or comment texts.
pub fn encode_sublist(items: &[String]) -> String {
    items
        .iter()
        .map(|item| item.replace('\\', "\\\\").replace('|', "\\|"))
        .collect::<Vec<_>>()
        .join("|")
}

/// Inverse of [`encode_sublist`].
pub fn decode_sublist(cell: &str) -> Vec<String> {
    if cell.is_empty() {
        return Vec::new();
    }

    let mut items = Vec::new();
    let mut current = String::new();
    let mut chars = cell.chars();
    while let Some(ch) = chars.next() {
        match ch {
            '\\' => {
                if let Some(escaped) = chars.next() {
                    current.push(escaped);
                }
            }
            '|' => items.push(std::mem::take(&mut current)),
            _ => current.push(ch),
        }
    }
    items.push(current);
    items
}

fn optional_cell<T: ToString>(value: Option<T>) -> String {
    value.map(|inner| inner.to_string()).unwrap_or_default()
}

/// Atomically replaces `path` with `contents` so a crash mid-write never
/// leaves a truncated table behind.
fn replace_file(path: &Path, contents: Vec<u8>) -> Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent).with_context(|| format!("creating {}", parent.display()))?;
    }

    let tmp_path = path.with_extension("tmp");
    fs::write(&tmp_path, contents).with_context(|| format!("writing {}", tmp_path.display()))?;
    fs::rename(&tmp_path, path).with_context(|| format!("finalizing {}", path.display()))?;
    Ok(())
}
