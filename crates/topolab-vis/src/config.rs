//! Server configuration.

use std::net::SocketAddr;
use std::time::Duration;

use crate::error::{Error, Result};
use crate::playback::PlaybackConfig;

/// Settings of the control surface.
#[derive(Debug, Clone)]
pub struct VisConfig {
    /// Address the HTTP server listens on
    pub addr: SocketAddr,
    /// Base URL of the emulation backend
    pub backend_url: String,
    /// Delay between polls of a running emulation
    pub poll_interval: Duration,
    /// Playback tick period
    pub frame_interval: Duration,
    pub playback: PlaybackConfig,
}

impl Default for VisConfig {
    fn default() -> Self {
        Self {
            addr: SocketAddr::from(([0, 0, 0, 0], 3000)),
            backend_url: "http://127.0.0.1:8000".to_string(),
            poll_interval: Duration::from_millis(1000),
            frame_interval: Duration::from_millis(33),
            playback: PlaybackConfig::default(),
        }
    }
}

fn millis(name: &str, value: &str) -> Result<Duration> {
    match value.trim().parse::<u64>() {
        Ok(ms) if ms > 0 => Ok(Duration::from_millis(ms)),
        _ => Err(Error::Config(format!(
            "{name} must be a positive number of milliseconds, got '{value}'"
        ))),
    }
}

impl VisConfig {
    /// Read `TOPOLAB_*` environment variables over the defaults.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Same as [`from_env`](Self::from_env) with a custom variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::default();

        if let Some(addr) = lookup("TOPOLAB_ADDR") {
            config.addr = addr
                .parse()
                .map_err(|_| Error::Config(format!("invalid TOPOLAB_ADDR '{addr}'")))?;
        }
        if let Some(url) = lookup("TOPOLAB_BACKEND_URL") {
            config.backend_url = url;
        }
        if let Some(ms) = lookup("TOPOLAB_POLL_MS") {
            config.poll_interval = millis("TOPOLAB_POLL_MS", &ms)?;
        }
        if let Some(ms) = lookup("TOPOLAB_FRAME_MS") {
            config.frame_interval = millis("TOPOLAB_FRAME_MS", &ms)?;
        }

        Ok(config)
    }
}
