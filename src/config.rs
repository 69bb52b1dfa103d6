#![forbid(unsafe_code)]

//! Configuration resolution for the harvest binary.
//!
//! Values come, in order of precedence, from CLI overrides, process
//! environment variables, and a `.env` file. The API key and at least one
//! channel id are required; everything else has a default.

use anyhow::{Context, Result, anyhow, bail};
use std::{
    collections::HashMap,
    env, fs,
    path::{Path, PathBuf},
};

pub const DEFAULT_ENV_PATH: &str = ".env";
pub const DEFAULT_OUTPUT_DIR: &str = "tables";

/// Fully resolved configuration for one run.
#[derive(Debug, Clone)]
pub struct HarvestConfig {
    pub api_key: String,
    pub channel_ids: Vec<String>,
    pub output_dir: PathBuf,
}

/// Values the CLI may pin before resolution falls back to the environment.
#[derive(Debug, Clone, Default)]
pub struct HarvestOverrides {
    pub api_key: Option<String>,
    pub channel_ids: Vec<String>,
    pub channels_file: Option<PathBuf>,
    pub output_dir: Option<PathBuf>,
    pub env_path: Option<PathBuf>,
}

pub fn resolve_config(overrides: HarvestOverrides) -> Result<HarvestConfig> {
    let env_path = overrides
        .env_path
        .as_deref()
        .unwrap_or_else(|| Path::new(DEFAULT_ENV_PATH));
    let file_vars = read_env_file(env_path)?;
    build_config(&file_vars, env_var_string, overrides)
}

fn build_config(
    file_vars: &HashMap<String, String>,
    env_lookup: impl Fn(&str) -> Option<String>,
    overrides: HarvestOverrides,
) -> Result<HarvestConfig> {
    let api_key = overrides
        .api_key
        .filter(|value| !value.trim().is_empty())
        .or_else(|| lookup_value("YOUTUBE_API_KEY", file_vars, &env_lookup))
        .ok_or_else(|| anyhow!("YOUTUBE_API_KEY not set"))?;

    let channel_ids = if !overrides.channel_ids.is_empty() {
        overrides.channel_ids
    } else if let Some(path) = &overrides.channels_file {
        read_channels_file(path)?
    } else if let Some(list) = lookup_value("CHANNEL_IDS", file_vars, &env_lookup) {
        split_channel_list(&list)
    } else if let Some(path) = lookup_value("CHANNELS_FILE", file_vars, &env_lookup) {
        read_channels_file(Path::new(&path))?
    } else {
        Vec::new()
    };
    if channel_ids.is_empty() {
        bail!("no channel ids configured; pass them as arguments or set CHANNEL_IDS");
    }

    let output_dir = overrides
        .output_dir
        .map(|path| path.to_string_lossy().into_owned())
        .or_else(|| lookup_value("OUTPUT_DIR", file_vars, &env_lookup))
        .unwrap_or_else(|| DEFAULT_OUTPUT_DIR.to_string());

    Ok(HarvestConfig {
        api_key,
        channel_ids,
        output_dir: PathBuf::from(output_dir),
    })
}

fn split_channel_list(list: &str) -> Vec<String> {
    list.split(',')
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(str::to_owned)
        .collect()
}

/// Reads one channel id per line; blank lines and `#` comments are ignored.
pub fn read_channels_file(path: &Path) -> Result<Vec<String>> {
    let content =
        fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    Ok(content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_owned)
        .collect())
}

fn env_var_string(key: &str) -> Option<String> {
    env::var(key).ok().and_then(|value| {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    })
}

fn lookup_value(
    key: &str,
    file_vars: &HashMap<String, String>,
    env_lookup: &impl Fn(&str) -> Option<String>,
) -> Option<String> {
    env_lookup(key).or_else(|| file_vars.get(key).cloned())
}

pub fn read_env_file(path: &Path) -> Result<HashMap<String, String>> {
    let mut vars = HashMap::new();
    if !path.exists() {
        return Ok(vars);
    }
    let content =
        fs::read_to_string(path).with_context(|| format!("Reading {}", path.display()))?;
    for line in content.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let line = trimmed.strip_prefix("export ").unwrap_or(trimmed);
        let Some((key, value_raw)) = line.split_once('=') else {
            continue;
        };
        let key = key.trim();
        if key.is_empty() {
            continue;
        }
        let value = value_raw.trim();
        let value = value
            .strip_prefix('"')
            .and_then(|value| value.strip_suffix('"'))
            .or_else(|| {
                value
                    .strip_prefix('\'')
                    .and_then(|value| value.strip_suffix('\''))
            })
            .unwrap_or(value);
        vars.insert(key.to_string(), value.to_string());
    }
    Ok(vars)
}
