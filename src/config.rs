//! Process configuration read from environment variables.
//!
//! | Variable | Default |
//! |---|---|
//! | `PORT` | `3000` |
//! | `JOB_RELAY_TTL_MS` | `4000` |
//! | `JOB_RELAY_DUPLICATE_WINDOW_MS` | `300000` |
//! | `JOB_RELAY_SWEEP_INTERVAL_MS` | `1000` |
//! | `JOB_RELAY_CATEGORY_PRIORITY` | `premium,essential,highlight,basic,free` |
//! | `JOB_RELAY_ANONYMOUS_DEDUPE` | `admit` |
//! | `JOB_RELAY_CHANNELS` | `normal:free,special:basic,highlight:highlight,premium:premium,mid-highlight:essential` |
//! | `JOB_RELAY_FORWARD_<CATEGORY>` | unset |
//! | `JOB_RELAY_FORWARD_TIMEOUT_MS` | `10000` |
//!
//! Unset variables take their defaults. Set but unparsable variables are
//! errors: a typo in a TTL should stop the process, not silently fall back.

use std::collections::{BTreeMap, HashMap};
use std::time::Duration;

use thiserror::Error;

use crate::forward::DEFAULT_FORWARD_TIMEOUT_SECS;
use crate::queue::{
    AnonymousDedupe, CategoryRanking, DEFAULT_DUPLICATE_WINDOW_SECS, DEFAULT_TTL_MS, DedupePolicy,
};
use crate::relay::QueueSettings;
use crate::sweeper::DEFAULT_SWEEP_INTERVAL_MS;
use crate::types::Category;

const DEFAULT_PORT: u16 = 3000;

/// Default channel path segment → category table.
pub const DEFAULT_CHANNELS: &[(&str, &str)] = &[
    ("normal", "free"),
    ("special", "basic"),
    ("highlight", "highlight"),
    ("premium", "premium"),
    ("mid-highlight", "essential"),
];

const ENV_PORT: &str = "PORT";
const ENV_TTL: &str = "JOB_RELAY_TTL_MS";
const ENV_DUPLICATE_WINDOW: &str = "JOB_RELAY_DUPLICATE_WINDOW_MS";
const ENV_SWEEP_INTERVAL: &str = "JOB_RELAY_SWEEP_INTERVAL_MS";
const ENV_PRIORITY: &str = "JOB_RELAY_CATEGORY_PRIORITY";
const ENV_ANONYMOUS_DEDUPE: &str = "JOB_RELAY_ANONYMOUS_DEDUPE";
const ENV_CHANNELS: &str = "JOB_RELAY_CHANNELS";
const ENV_FORWARD_PREFIX: &str = "JOB_RELAY_FORWARD_";
const ENV_FORWARD_TIMEOUT: &str = "JOB_RELAY_FORWARD_TIMEOUT_MS";

/// Errors in the process configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A variable was set to something that does not parse.
    #[error("invalid value for {name}: {value:?} ({reason})")]
    InvalidValue {
        name: &'static str,
        value: String,
        reason: String,
    },

    /// A duration that must be positive was zero.
    #[error("{0} must be greater than zero")]
    ZeroDuration(&'static str),

    /// The sweep would not run at least once per TTL.
    #[error("sweep interval ({sweep_ms}ms) must be shorter than the TTL ({ttl_ms}ms)")]
    SweepNotShorterThanTtl { sweep_ms: u128, ttl_ms: u128 },
}

/// Full process configuration.
#[derive(Debug, Clone)]
pub struct RelayConfig {
    pub port: u16,
    pub ttl: Duration,
    pub duplicate_window: Duration,
    pub sweep_interval: Duration,
    pub ranking: CategoryRanking,
    pub anonymous_dedupe: AnonymousDedupe,
    /// Channel path segment → category.
    pub channels: BTreeMap<String, Category>,
    /// Category → outbound webhook URL.
    pub forward_targets: HashMap<Category, String>,
    pub forward_timeout: Duration,
}

impl Default for RelayConfig {
    fn default() -> Self {
        RelayConfig {
            port: DEFAULT_PORT,
            ttl: Duration::from_millis(DEFAULT_TTL_MS),
            duplicate_window: Duration::from_secs(DEFAULT_DUPLICATE_WINDOW_SECS),
            sweep_interval: Duration::from_millis(DEFAULT_SWEEP_INTERVAL_MS),
            ranking: CategoryRanking::default(),
            anonymous_dedupe: AnonymousDedupe::default(),
            channels: default_channels(),
            forward_targets: HashMap::new(),
            forward_timeout: Duration::from_secs(DEFAULT_FORWARD_TIMEOUT_SECS),
        }
    }
}

impl RelayConfig {
    /// Reads the configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Reads the configuration through an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = RelayConfig::default();

        let port = parse_var(&lookup, ENV_PORT)?.unwrap_or(defaults.port);
        let ttl = millis_var(&lookup, ENV_TTL)?.unwrap_or(defaults.ttl);
        let duplicate_window =
            millis_var(&lookup, ENV_DUPLICATE_WINDOW)?.unwrap_or(defaults.duplicate_window);
        let sweep_interval =
            millis_var(&lookup, ENV_SWEEP_INTERVAL)?.unwrap_or(defaults.sweep_interval);
        let forward_timeout =
            millis_var(&lookup, ENV_FORWARD_TIMEOUT)?.unwrap_or(defaults.forward_timeout);

        let ranking = parse_var(&lookup, ENV_PRIORITY)?.unwrap_or(defaults.ranking);
        let anonymous_dedupe =
            parse_var(&lookup, ENV_ANONYMOUS_DEDUPE)?.unwrap_or(defaults.anonymous_dedupe);

        let channels = match lookup(ENV_CHANNELS) {
            Some(raw) => parse_channels(&raw)?,
            None => defaults.channels,
        };

        let config = RelayConfig {
            port,
            ttl,
            duplicate_window,
            sweep_interval,
            forward_targets: forward_targets(&lookup, &ranking, &channels),
            ranking,
            anonymous_dedupe,
            channels,
            forward_timeout,
        };
        config.validate()?;
        Ok(config)
    }

    /// Checks cross-field constraints.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.ttl.is_zero() {
            return Err(ConfigError::ZeroDuration(ENV_TTL));
        }
        if self.sweep_interval.is_zero() {
            return Err(ConfigError::ZeroDuration(ENV_SWEEP_INTERVAL));
        }
        if self.sweep_interval >= self.ttl {
            return Err(ConfigError::SweepNotShorterThanTtl {
                sweep_ms: self.sweep_interval.as_millis(),
                ttl_ms: self.ttl.as_millis(),
            });
        }
        Ok(())
    }

    /// The settings the job store and deduplicator need.
    pub fn queue_settings(&self) -> QueueSettings {
        QueueSettings {
            ttl: self.ttl,
            dedupe: DedupePolicy {
                window: self.duplicate_window,
                anonymous: self.anonymous_dedupe,
            },
            ranking: self.ranking.clone(),
        }
    }
}

fn default_channels() -> BTreeMap<String, Category> {
    DEFAULT_CHANNELS
        .iter()
        .map(|(channel, category)| (channel.to_string(), Category::new(category)))
        .collect()
}

fn parse_var<T>(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &'static str,
) -> Result<Option<T>, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    let Some(raw) = lookup(name) else {
        return Ok(None);
    };
    raw.trim()
        .parse()
        .map(Some)
        .map_err(|err: T::Err| ConfigError::InvalidValue {
            name,
            value: raw.clone(),
            reason: err.to_string(),
        })
}

fn millis_var(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &'static str,
) -> Result<Option<Duration>, ConfigError> {
    Ok(parse_var::<u64>(lookup, name)?.map(Duration::from_millis))
}

/// Parses `channel:category` pairs separated by commas.
fn parse_channels(raw: &str) -> Result<BTreeMap<String, Category>, ConfigError> {
    let invalid = |reason: &str| ConfigError::InvalidValue {
        name: ENV_CHANNELS,
        value: raw.to_string(),
        reason: reason.to_string(),
    };

    let mut channels = BTreeMap::new();
    for pair in raw.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        let (channel, category) = pair
            .split_once(':')
            .ok_or_else(|| invalid("expected channel:category"))?;
        let (channel, category) = (channel.trim(), category.trim());
        if channel.is_empty() || category.is_empty() {
            return Err(invalid("empty channel or category"));
        }
        channels.insert(channel.to_string(), Category::new(category));
    }
    if channels.is_empty() {
        return Err(invalid("no channels listed"));
    }
    Ok(channels)
}

/// Looks up `JOB_RELAY_FORWARD_<CATEGORY>` for every known category.
fn forward_targets(
    lookup: &impl Fn(&str) -> Option<String>,
    ranking: &CategoryRanking,
    channels: &BTreeMap<String, Category>,
) -> HashMap<Category, String> {
    let universal = Category::universal();
    ranking
        .categories()
        .iter()
        .chain(channels.values())
        .chain(std::iter::once(&universal))
        .filter_map(|category| {
            let name = format!(
                "{ENV_FORWARD_PREFIX}{}",
                category.as_str().to_ascii_uppercase().replace('-', "_")
            );
            let url = lookup(&name)?.trim().to_string();
            (!url.is_empty()).then(|| (category.clone(), url))
        })
        .collect()
}
