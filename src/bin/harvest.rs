#![forbid(unsafe_code)]

//! Command-line entry point: fetches metadata for every configured channel
//! and materializes the enriched video table plus the comment-sample table.

use anyhow::{Result, bail};
use std::env;
use std::path::PathBuf;

use tubetally::api::{VideoApi, YouTubeClient};
use tubetally::config::{HarvestConfig, HarvestOverrides, resolve_config};
use tubetally::enrich::enrich_videos;
use tubetally::model::ChannelSummary;
use tubetally::pipeline::harvest_channels;
use tubetally::table::{write_comment_table, write_video_table};

const VIDEO_TABLE_FILE: &str = "videos.csv";
const COMMENT_TABLE_FILE: &str = "comments.csv";

#[derive(Debug, Clone)]
struct HarvestArgs {
    overrides: HarvestOverrides,
    limit: Option<usize>,
}

impl HarvestArgs {
    fn parse() -> Result<Self> {
        Self::from_iter(env::args().skip(1))
    }

    #[cfg(test)]
    fn from_slice(values: &[&str]) -> Result<Self> {
        Self::from_iter(values.iter().map(|value| value.to_string()))
    }

    fn from_iter<I>(iter: I) -> Result<Self>
    where
        I: IntoIterator<Item = String>,
    {
        let mut overrides = HarvestOverrides::default();
        let mut limit: Option<usize> = None;
        let mut args = iter.into_iter();

        while let Some(arg) = args.next() {
            if let Some(value) = arg.strip_prefix("--api-key=") {
                overrides.api_key = Some(value.to_string());
                continue;
            }
            if let Some(value) = arg.strip_prefix("--channels-file=") {
                overrides.channels_file = Some(PathBuf::from(value));
                continue;
            }
            if let Some(value) = arg.strip_prefix("--output-dir=") {
                overrides.output_dir = Some(PathBuf::from(value));
                continue;
            }
            if let Some(value) = arg.strip_prefix("--env=") {
                overrides.env_path = Some(PathBuf::from(value));
                continue;
            }
            if let Some(value) = arg.strip_prefix("--limit=") {
                limit = Some(Self::parse_limit(value)?);
                continue;
            }

            match arg.as_str() {
                "--api-key" => {
                    overrides.api_key = Some(Self::expect_value(&mut args, "--api-key")?);
                }
                "--channels-file" => {
                    overrides.channels_file =
                        Some(PathBuf::from(Self::expect_value(&mut args, "--channels-file")?));
                }
                "--output-dir" => {
                    overrides.output_dir =
                        Some(PathBuf::from(Self::expect_value(&mut args, "--output-dir")?));
                }
                "--env" => {
                    overrides.env_path =
                        Some(PathBuf::from(Self::expect_value(&mut args, "--env")?));
                }
                "--limit" => {
                    limit = Some(Self::parse_limit(&Self::expect_value(&mut args, "--limit")?)?);
                }
                _ if arg.starts_with('-') => {
                    bail!("unknown argument: {arg}");
                }
                _ => {
                    overrides.channel_ids.push(arg);
                }
            }
        }

        Ok(Self { overrides, limit })
    }

    fn expect_value<I>(args: &mut I, flag: &str) -> Result<String>
    where
        I: Iterator<Item = String>,
    {
        args.next()
            .ok_or_else(|| anyhow::anyhow!("{flag} requires a value"))
    }

    fn parse_limit(value: &str) -> Result<usize> {
        let parsed: usize = value
            .parse()
            .map_err(|_| anyhow::anyhow!("--limit must be a positive integer"))?;
        if parsed == 0 {
            bail!("--limit must be a positive integer");
        }
        Ok(parsed)
    }
}

fn main() -> Result<()> {
    let HarvestArgs { overrides, limit } = HarvestArgs::parse()?;
    let config = resolve_config(overrides)?;
    let client = YouTubeClient::new(config.api_key.clone());
    run(&client, &config, limit)
}

/// Full pipeline for one run: acquire, enrich, materialize, report.
fn run<A: VideoApi + ?Sized>(api: &A, config: &HarvestConfig, limit: Option<usize>) -> Result<()> {
    println!("===================================");
    println!("tubetally channel harvest");
    println!("===================================");
    println!("Channels requested: {}", config.channel_ids.len());
    println!("Output directory: {}", config.output_dir.display());
    println!();

    let harvest = harvest_channels(api, &config.channel_ids, limit)?;
    if harvest.channels.is_empty() {
        bail!("none of the configured channel ids were recognized by the provider");
    }

    let enriched = enrich_videos(harvest.videos)?;
    let video_path = config.output_dir.join(VIDEO_TABLE_FILE);
    let comment_path = config.output_dir.join(COMMENT_TABLE_FILE);
    write_video_table(&video_path, &enriched)?;
    write_comment_table(&comment_path, &harvest.comments)?;

    println!();
    println!("===================================");
    println!("Harvest complete");
    println!("===================================");
    for channel in &harvest.channels {
        print_channel_line(channel);
    }
    println!();
    println!("{} video rows -> {}", enriched.len(), video_path.display());
    println!(
        "{} comment samples -> {}",
        harvest.comments.len(),
        comment_path.display()
    );

    Ok(())
}

fn print_channel_line(channel: &ChannelSummary) {
    let subscribers = channel
        .subscriber_count
        .map(|count| count.to_string())
        .unwrap_or_else(|| "hidden".to_string());
    println!(
        "{}: {} subscribers, {} total views, {} videos",
        channel.title, subscribers, channel.view_count, channel.video_count
    );
}
