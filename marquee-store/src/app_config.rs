use serde::Deserialize;
use std::env;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub seating: SeatingConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub port: u16,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SeatingConfig {
    /// How long a seat hold lives before the sweep may expire it.
    #[serde(default = "default_hold_minutes")]
    pub hold_minutes: i64,
    /// Period of the hold sweeper.
    #[serde(default = "default_sweep_interval_ms")]
    pub sweep_interval_ms: u64,
    /// Buffered seat-map snapshots per broadcast channel.
    #[serde(default = "default_stream_capacity")]
    pub stream_capacity: usize,
}

fn default_hold_minutes() -> i64 {
    10
}

fn default_sweep_interval_ms() -> u64 {
    60_000
}

fn default_stream_capacity() -> usize {
    100
}

impl Default for SeatingConfig {
    fn default() -> Self {
        Self {
            hold_minutes: default_hold_minutes(),
            sweep_interval_ms: default_sweep_interval_ms(),
            stream_capacity: default_stream_capacity(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let s = config::Config::builder()
            // Start off by merging in the "default" configuration file
            .add_source(config::File::with_name("config/default"))
            // Add in the current environment file
            // Default to 'development' env
            // Note that this file is _optional_
            .add_source(config::File::with_name(&format!("config/{}", run_mode)).required(false))
            // Add in a local configuration file
            // This file shouldn't be checked in to git
            .add_source(config::File::with_name("config/local").required(false))
            // Add in settings from the environment (with a prefix of MARQUEE)
            // Eg.. `MARQUEE__SERVER__PORT=8081` would set the port
            .add_source(config::Environment::with_prefix("MARQUEE").separator("__"))
            .build()?;

        s.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seating_defaults_match_the_documented_values() {
        let seating = SeatingConfig::default();
        assert_eq!(seating.hold_minutes, 10);
        assert_eq!(seating.sweep_interval_ms, 60_000);
    }
}
