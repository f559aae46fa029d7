use std::{
    env, fs,
    path::{Path, PathBuf},
    time::Duration,
};

use crate::{
    editor::HISTORY_PAGE_SIZE, errors::Error, messaging::throttled::ThrottleConfig, Result,
};

/// Typed configuration, read from the environment (with `.env` support).
#[derive(Clone, Debug)]
pub struct Config {
    // Telegram API credentials
    pub api_id: i32,
    pub api_hash: String,
    pub session_file: PathBuf,

    // Filtering
    pub ignore_list: Vec<String>,

    // Pagination / provider limits
    pub history_page_size: usize,
    pub message_limit: usize,

    // Operator prompt defaults
    pub default_edit_limit: u32,
    pub default_edit_delay: Duration,

    // Call pacing
    pub throttle: ThrottleConfig,
}

impl Config {
    pub fn load() -> Result<Self> {
        load_dotenv_if_present(Path::new(".env"));

        let api_id = env_str("TG_API_ID")
            .and_then(|s| s.trim().parse::<i32>().ok())
            .ok_or_else(|| {
                Error::Config("TG_API_ID environment variable is required".to_string())
            })?;
        let api_hash = env_str("TG_API_HASH").and_then(non_empty).ok_or_else(|| {
            Error::Config("TG_API_HASH environment variable is required".to_string())
        })?;

        let session_file = PathBuf::from(
            env_str("TG_SESSION_FILE").unwrap_or("appendix.session".to_string()),
        );

        // Any message containing one of these fragments is left unchanged.
        let mut ignore_list = parse_csv(env_str("IGNORE_LIST"));
        if ignore_list.is_empty() {
            ignore_list = vec!["00:00".to_string()];
        }

        // The provider caps a single history request, so larger values are
        // clamped down.
        let history_page_size = env_usize("HISTORY_PAGE_SIZE")
            .unwrap_or(HISTORY_PAGE_SIZE)
            .clamp(1, HISTORY_PAGE_SIZE);
        let message_limit = env_usize("TELEGRAM_MESSAGE_LIMIT").unwrap_or(4096);

        let default_edit_limit = env_u32("EDIT_LIMIT").unwrap_or(20);
        let default_edit_delay = Duration::from_millis(env_u64("EDIT_DELAY_MS").unwrap_or(1000));

        let default_throttle = ThrottleConfig::default();
        let throttle = ThrottleConfig {
            global_min_interval: env_u64("THROTTLE_GLOBAL_MS")
                .map(Duration::from_millis)
                .unwrap_or(default_throttle.global_min_interval),
            per_channel_min_interval: env_u64("THROTTLE_CHANNEL_MS")
                .map(Duration::from_millis)
                .unwrap_or(default_throttle.per_channel_min_interval),
        };

        Ok(Self {
            api_id,
            api_hash,
            session_file,
            ignore_list,
            history_page_size,
            message_limit,
            default_edit_limit,
            default_edit_delay,
            throttle,
        })
    }
}

fn env_str(key: &str) -> Option<String> {
    env::var(key).ok()
}

fn load_dotenv_if_present(path: &Path) {
    let Ok(contents) = fs::read_to_string(path) else {
        return;
    };

    for raw in contents.lines() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let Some((k, v)) = line.split_once('=') else {
            continue;
        };

        let key = k.trim();
        if key.is_empty() {
            continue;
        }
        if env::var_os(key).is_some() {
            continue; // do not override existing env
        }

        let mut val = v.trim().to_string();
        // Strip optional surrounding quotes.
        if val.len() >= 2
            && ((val.starts_with('"') && val.ends_with('"'))
                || (val.starts_with('\'') && val.ends_with('\'')))
        {
            val = val[1..val.len() - 1].to_string();
        }

        env::set_var(key, val);
    }
}

fn env_u64(key: &str) -> Option<u64> {
    env_str(key).and_then(|s| s.trim().parse::<u64>().ok())
}

fn env_u32(key: &str) -> Option<u32> {
    env_str(key).and_then(|s| s.trim().parse::<u32>().ok())
}

fn env_usize(key: &str) -> Option<usize> {
    env_str(key).and_then(|s| s.trim().parse::<usize>().ok())
}

fn parse_csv(v: Option<String>) -> Vec<String> {
    v.unwrap_or_default()
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

fn non_empty(s: String) -> Option<String> {
    if s.trim().is_empty() {
        None
    } else {
        Some(s)
    }
}
