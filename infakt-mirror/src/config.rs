use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use infakt_core::{DEFAULT_BASE_URL, DEFAULT_MAX_ATTEMPTS, DEFAULT_PAGE_SIZE, RetryPolicy};

const DEFAULT_DATA_DIR: &str = "data";
const DEFAULT_LOG_DIR: &str = "logs";
const DEFAULT_TRANSIENT_DELAY_MS: u64 = 1_000;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MirrorConfig {
    pub api_key: String,
    pub api_domain: String,
    pub data_dir: PathBuf,
    pub log_dir: PathBuf,
    pub page_size: u32,
    pub retry: RetryPolicy,
    pub commit: bool,
}

impl MirrorConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_key = lookup("INFAKT_API_KEY")
            .filter(|value| !value.trim().is_empty())
            .context("INFAKT_API_KEY is not set")?;
        let api_domain = lookup("INFAKT_API_DOMAIN")
            .filter(|value| !value.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        let data_dir = lookup("INFAKT_DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR));
        let log_dir = lookup("INFAKT_LOG_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_LOG_DIR));
        let page_size = read_u64(&lookup, "INFAKT_PAGE_SIZE", u64::from(DEFAULT_PAGE_SIZE))
            .min(u64::from(u32::MAX)) as u32;
        let attempts = read_u64(&lookup, "INFAKT_RETRY_ATTEMPTS", u64::from(DEFAULT_MAX_ATTEMPTS))
            .min(u64::from(u32::MAX)) as u32;
        let transient_delay = Duration::from_millis(read_u64(
            &lookup,
            "INFAKT_RETRY_DELAY_MS",
            DEFAULT_TRANSIENT_DELAY_MS,
        ));
        let commit = read_bool(&lookup, "INFAKT_COMMIT", true);

        Ok(Self {
            api_key,
            api_domain,
            data_dir,
            log_dir,
            page_size,
            retry: RetryPolicy::new(attempts, transient_delay),
            commit,
        })
    }
}

fn read_u64<F>(lookup: &F, name: &str, default: u64) -> u64
where
    F: Fn(&str) -> Option<String>,
{
    lookup(name)
        .and_then(|value| value.trim().parse::<u64>().ok())
        .filter(|value| *value > 0)
        .unwrap_or(default)
}

fn read_bool<F>(lookup: &F, name: &str, default: bool) -> bool
where
    F: Fn(&str) -> Option<String>,
{
    lookup(name)
        .map(|value| {
            matches!(
                value.trim().to_ascii_lowercase().as_str(),
                "1" | "true" | "yes" | "on"
            )
        })
        .unwrap_or(default)
}
