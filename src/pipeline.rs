#![forbid(unsafe_code)]

//! Orchestration of one extraction run.
//!
//! Channels are processed strictly in the order given. For each channel the
//! uploads playlist is enumerated page by page, details are fetched in
//! batches of at most [`MAX_BATCH_IDS`], and comments are sampled one video
//! at a time. A fetch failure inside a channel drops that channel's entire
//! contribution (no partial channel), while a comment failure only costs the
//! one video its sample.

use std::collections::{HashSet, VecDeque};

use anyhow::Result;

use crate::api::{COMMENT_SAMPLE_SIZE, MAX_BATCH_IDS, PlaylistPage, VideoApi};
use crate::error::FetchError;
use crate::model::{ChannelSummary, CommentSample, VideoRecord};

/// Everything one run accumulates before enrichment and materialization.
#[derive(Debug, Default)]
pub struct Harvest {
    pub channels: Vec<ChannelSummary>,
    pub videos: Vec<VideoRecord>,
    pub comments: Vec<CommentSample>,
}

/// Lazy enumeration of a channel's uploads playlist.
///
/// Pages are requested on demand, threading the continuation token forward
/// until the provider omits it; no bound on the page count is assumed. A
/// transport error mid-walk is yielded once and ends the iteration. Building
/// a fresh `Uploads` restarts from the first page.
pub struct Uploads<'a, A: VideoApi + ?Sized> {
    api: &'a A,
    playlist_id: &'a str,
    buffered: VecDeque<String>,
    next_token: Option<String>,
    exhausted: bool,
}

impl<'a, A: VideoApi + ?Sized> Uploads<'a, A> {
    pub fn new(api: &'a A, playlist_id: &'a str) -> Self {
        Self {
            api,
            playlist_id,
            buffered: VecDeque::new(),
            next_token: None,
            exhausted: false,
        }
    }
}

impl<'a, A: VideoApi + ?Sized> Iterator for Uploads<'a, A> {
    type Item = Result<String, FetchError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(id) = self.buffered.pop_front() {
                return Some(Ok(id));
            }
            if self.exhausted {
                return None;
            }

            let PlaylistPage {
                video_ids,
                next_page_token,
            } = match self.api.playlist_page(self.playlist_id, self.next_token.as_deref()) {
                Ok(page) => page,
                Err(err) => {
                    self.exhausted = true;
                    return Some(Err(err));
                }
            };

            self.buffered.extend(video_ids);
            self.next_token = next_page_token;
            if self.next_token.is_none() {
                self.exhausted = true;
            }
        }
    }
}

/// Fetches details for `video_ids` in consecutive chunks of at most
/// [`MAX_BATCH_IDS`], concatenated in request order. Ids the provider cannot
/// resolve are simply missing from the output; a chunk-level failure aborts
/// the whole call.
pub fn fetch_video_details<A: VideoApi + ?Sized>(
    api: &A,
    video_ids: &[String],
) -> Result<Vec<VideoRecord>, FetchError> {
    let mut records = Vec::with_capacity(video_ids.len());
    for chunk in video_ids.chunks(MAX_BATCH_IDS) {
        records.extend(api.video_details(chunk)?);
    }
    Ok(records)
}

/// Samples comments for each video id, isolating failures per video: a video
/// whose fetch fails gets no sample and a `Warning:` diagnostic, and the pass
/// always continues with the remaining ids. Zero comments still produce a
/// present, empty sample.
pub fn sample_comments<'a, A, I>(api: &A, video_ids: I) -> Vec<CommentSample>
where
    A: VideoApi + ?Sized,
    I: IntoIterator<Item = &'a str>,
{
    let mut samples = Vec::new();
    for video_id in video_ids {
        match api.top_level_comments(video_id) {
            Ok(mut comments) => {
                comments.truncate(COMMENT_SAMPLE_SIZE as usize);
                samples.push(CommentSample {
                    video_id: video_id.to_owned(),
                    comments,
                });
            }
            Err(err) => {
                eprintln!("  Warning: could not fetch comments for {video_id}: {err}");
            }
        }
    }
    samples
}

/// Runs the whole acquisition pass for `channel_ids`.
///
/// Channel summaries are requested in chunks of [`MAX_BATCH_IDS`];
/// unrecognized ids are silently absent. Each recognized channel is then
/// expanded into video rows and comment samples. A `FetchError` during a
/// channel's enumeration or detail fetch skips that channel with a warning
/// instead of aborting the run; a failure fetching the summaries themselves
/// does abort, since nothing useful can happen without them.
///
/// Duplicate video ids across channels keep the first-seen row only, and
/// `limit_per_channel` (when set) caps how many uploads of each channel are
/// considered.
pub fn harvest_channels<A: VideoApi + ?Sized>(
    api: &A,
    channel_ids: &[String],
    limit_per_channel: Option<usize>,
) -> Result<Harvest> {
    let mut channels = Vec::new();
    for chunk in channel_ids.chunks(MAX_BATCH_IDS) {
        channels.extend(api.channel_summaries(chunk)?);
    }

    let mut harvest = Harvest {
        channels,
        ..Harvest::default()
    };
    let mut seen = HashSet::new();

    for channel in harvest.channels.clone() {
        println!("Collecting uploads for {} ...", channel.title);
        match channel_rows(api, &channel, &seen, limit_per_channel) {
            Ok((videos, comments)) => {
                println!("  {} videos, {} comment samples", videos.len(), comments.len());
                seen.extend(videos.iter().map(|video| video.video_id.clone()));
                harvest.videos.extend(videos);
                harvest.comments.extend(comments);
            }
            Err(err) => {
                eprintln!("  Warning: skipping channel {}: {err}", channel.title);
            }
        }
    }

    Ok(harvest)
}

/// Collects one channel's video rows and comment samples. Ids already seen in
/// a previous channel (or repeated inside this playlist) are skipped before
/// any detail request is issued, so the first-seen row wins.
fn channel_rows<A: VideoApi + ?Sized>(
    api: &A,
    channel: &ChannelSummary,
    seen: &HashSet<String>,
    limit: Option<usize>,
) -> Result<(Vec<VideoRecord>, Vec<CommentSample>), FetchError> {
    let mut ids = Vec::new();
    let mut local = HashSet::new();
    for id in Uploads::new(api, &channel.uploads_playlist) {
        let id = id?;
        if !seen.contains(&id) && local.insert(id.clone()) {
            ids.push(id);
        }
        if limit.is_some_and(|cap| ids.len() >= cap) {
            break;
        }
    }

    let videos = fetch_video_details(api, &ids)?;
    let comments = sample_comments(api, videos.iter().map(|video| video.video_id.as_str()));
    Ok((videos, comments))
}
