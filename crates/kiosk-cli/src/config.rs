//! Kiosk configuration.
//!
//! Settings come from three layers, highest priority first: command line
//! (with `KIOSK_*` environment fallbacks), an optional TOML file, built-in
//! defaults.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use serde::Deserialize;
use url::Url;

use kiosk_core::Error;
use kiosk_core::constants::{
    DEFAULT_HUB_URL, DEFAULT_SOUND_FILE, INACTIVITY_CHECK_INTERVAL_MS, INACTIVITY_TIMEOUT_MS,
    NOTIFICATION_VOLUME,
};
use kiosk_display::{DEFAULT_WIDTH, MIN_WIDTH};
use kiosk_network::HubClientConfig;

const DEFAULT_KEEP_ALIVE_MS: u64 = 15_000;
const DEFAULT_SERVER_TIMEOUT_MS: u64 = 30_000;
const DEFAULT_CONNECT_TIMEOUT_MS: u64 = 10_000;

/// Command line of the `rfid-kiosk` binary.
#[derive(Parser, Debug, Default)]
#[command(name = "rfid-kiosk", version, about = "RFID product kiosk for the terminal")]
pub struct Cli {
    /// TOML file with kiosk settings.
    #[arg(long, env = "KIOSK_CONFIG")]
    pub config: Option<PathBuf>,

    /// Hub endpoint of the reader service.
    #[arg(long, env = "KIOSK_HUB_URL")]
    pub hub_url: Option<String>,

    /// Connect the WebSocket directly without the negotiate request.
    #[arg(long, env = "KIOSK_SKIP_NEGOTIATION", num_args = 0..=1, default_missing_value = "true")]
    pub skip_negotiation: Option<bool>,

    /// Idle time before the waiting screen returns.
    #[arg(long, env = "KIOSK_INACTIVITY_TIMEOUT_MS")]
    pub inactivity_timeout_ms: Option<u64>,

    #[arg(long, env = "KIOSK_CHECK_INTERVAL_MS")]
    pub check_interval_ms: Option<u64>,

    /// Play a sound when a new product is shown.
    #[arg(long, env = "KIOSK_SOUND_ENABLED", num_args = 0..=1, default_missing_value = "true")]
    pub sound_enabled: Option<bool>,

    /// WAV file played with the `audio` feature.
    #[arg(long, env = "KIOSK_SOUND_FILE")]
    pub sound_file: Option<PathBuf>,

    #[arg(long, env = "KIOSK_VOLUME")]
    pub volume: Option<f32>,

    /// Screen width in columns.
    #[arg(long, env = "KIOSK_SCREEN_WIDTH")]
    pub screen_width: Option<usize>,

    #[arg(long, env = "KIOSK_KEEP_ALIVE_INTERVAL_MS")]
    pub keep_alive_interval_ms: Option<u64>,

    #[arg(long, env = "KIOSK_SERVER_TIMEOUT_MS")]
    pub server_timeout_ms: Option<u64>,

    #[arg(long, env = "KIOSK_CONNECT_TIMEOUT_MS")]
    pub connect_timeout_ms: Option<u64>,

    /// Log filter, e.g. `info` or `kiosk_network=debug`. Overrides `RUST_LOG`.
    #[arg(long, env = "KIOSK_LOG_LEVEL")]
    pub log_level: Option<String>,

    /// Append logs to this file instead of stderr.
    #[arg(long, env = "KIOSK_LOG_FILE")]
    pub log_file: Option<PathBuf>,
}

/// Settings as read from the TOML file. Every key is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub hub_url: Option<String>,
    pub skip_negotiation: Option<bool>,
    pub inactivity_timeout_ms: Option<u64>,
    pub check_interval_ms: Option<u64>,
    pub sound_enabled: Option<bool>,
    pub sound_file: Option<PathBuf>,
    pub volume: Option<f32>,
    pub screen_width: Option<usize>,
    pub keep_alive_interval_ms: Option<u64>,
    pub server_timeout_ms: Option<u64>,
    pub connect_timeout_ms: Option<u64>,
    pub log_level: Option<String>,
    pub log_file: Option<PathBuf>,
}

impl FileConfig {
    pub fn read(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        toml::from_str(&raw).with_context(|| format!("invalid config file {}", path.display()))
    }
}

/// Validated kiosk settings.
#[derive(Debug, Clone, PartialEq)]
pub struct KioskConfig {
    pub hub_url: Url,
    pub skip_negotiation: bool,
    pub inactivity_timeout: Duration,
    pub check_interval: Duration,
    pub sound_enabled: bool,
    pub sound_file: PathBuf,
    pub volume: f32,
    pub screen_width: usize,
    pub keep_alive_interval: Duration,
    pub server_timeout: Duration,
    pub connect_timeout: Duration,
    pub log_level: Option<String>,
    pub log_file: Option<PathBuf>,
}

impl KioskConfig {
    /// Resolve the configuration for `cli`, reading its config file if any.
    pub fn load(cli: &Cli) -> anyhow::Result<Self> {
        let file = match &cli.config {
            Some(path) => FileConfig::read(path)?,
            None => FileConfig::default(),
        };
        Ok(Self::resolve(cli, file)?)
    }

    /// Merge the layers and validate the result.
    pub fn resolve(cli: &Cli, file: FileConfig) -> kiosk_core::Result<Self> {
        let hub_url = cli
            .hub_url
            .clone()
            .or(file.hub_url)
            .unwrap_or_else(|| DEFAULT_HUB_URL.to_string());
        let hub_url = Url::parse(&hub_url)
            .map_err(|e| Error::config(format!("invalid hub_url '{hub_url}': {e}")))?;
        if !matches!(hub_url.scheme(), "http" | "https" | "ws" | "wss") {
            return Err(Error::config(format!(
                "hub_url must use http, https, ws or wss, got '{}'",
                hub_url.scheme()
            )));
        }

        let volume = cli.volume.or(file.volume).unwrap_or(NOTIFICATION_VOLUME);
        if !(0.0..=1.0).contains(&volume) {
            return Err(Error::config(format!(
                "volume must be between 0.0 and 1.0, got {volume}"
            )));
        }

        let screen_width = cli
            .screen_width
            .or(file.screen_width)
            .unwrap_or(DEFAULT_WIDTH);
        if screen_width < MIN_WIDTH {
            return Err(Error::config(format!(
                "screen_width must be at least {MIN_WIDTH}, got {screen_width}"
            )));
        }

        Ok(Self {
            hub_url,
            skip_negotiation: cli
                .skip_negotiation
                .or(file.skip_negotiation)
                .unwrap_or(false),
            inactivity_timeout: millis(
                "inactivity_timeout_ms",
                cli.inactivity_timeout_ms.or(file.inactivity_timeout_ms),
                INACTIVITY_TIMEOUT_MS,
            )?,
            check_interval: millis(
                "check_interval_ms",
                cli.check_interval_ms.or(file.check_interval_ms),
                INACTIVITY_CHECK_INTERVAL_MS,
            )?,
            sound_enabled: cli.sound_enabled.or(file.sound_enabled).unwrap_or(true),
            sound_file: cli
                .sound_file
                .clone()
                .or(file.sound_file)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_SOUND_FILE)),
            volume,
            screen_width,
            keep_alive_interval: millis(
                "keep_alive_interval_ms",
                cli.keep_alive_interval_ms.or(file.keep_alive_interval_ms),
                DEFAULT_KEEP_ALIVE_MS,
            )?,
            server_timeout: millis(
                "server_timeout_ms",
                cli.server_timeout_ms.or(file.server_timeout_ms),
                DEFAULT_SERVER_TIMEOUT_MS,
            )?,
            connect_timeout: millis(
                "connect_timeout_ms",
                cli.connect_timeout_ms.or(file.connect_timeout_ms),
                DEFAULT_CONNECT_TIMEOUT_MS,
            )?,
            log_level: cli.log_level.clone().or(file.log_level),
            log_file: cli.log_file.clone().or(file.log_file),
        })
    }

    /// Settings for the hub client.
    pub fn hub_client_config(&self) -> HubClientConfig {
        let mut config = HubClientConfig::new(self.hub_url.clone());
        config.skip_negotiation = self.skip_negotiation;
        config.connect_timeout = self.connect_timeout;
        config.keep_alive_interval = self.keep_alive_interval;
        config.server_timeout = self.server_timeout;
        config
    }
}

fn millis(key: &str, value: Option<u64>, default: u64) -> kiosk_core::Result<Duration> {
    match value.unwrap_or(default) {
        0 => Err(Error::config(format!("{key} must be greater than zero"))),
        ms => Ok(Duration::from_millis(ms)),
    }
}
