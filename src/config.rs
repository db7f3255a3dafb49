use std::{fs, path::Path, time::Duration};

use anyhow::{Context, Result};
use log::warn;
use serde::{Deserialize, Serialize};

use crate::{resolver::HIT_PADDING, scoring};

const FREE_GAMES_ENV: &str = "CAT_HIDEOUTS_FREE_GAMES";

/// Tunable game policy. Difficulty parameters are fixed and live in
/// [`crate::models::Difficulty::config`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GameConfig {
    /// Sessions a device may start before the upsell takes over.
    pub free_games: u32,

    /// Scene units added around every detected box when resolving a click.
    pub hit_padding: f64,
    pub miss_penalty: u32,
    pub time_bonus_per_second: u32,

    /// How long a hint marker stays on screen.
    pub hint_duration_ms: u64,
    /// Delay between the final hit and the Won transition, so the last
    /// found animation can start first.
    pub win_delay_ms: u64,
    /// Delay before the result overlay appears over a finished board.
    pub result_delay_ms: u64,
    pub feedback_duration_ms: u64,
    pub tick_interval_ms: u64,

    /// Remaining seconds below which the clock is flagged as running low.
    pub low_time_threshold_secs: u32,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            free_games: 3,
            hit_padding: HIT_PADDING,
            miss_penalty: scoring::MISS_PENALTY,
            time_bonus_per_second: scoring::TIME_BONUS_PER_SECOND,
            hint_duration_ms: 2_000,
            win_delay_ms: 500,
            result_delay_ms: 2_500,
            feedback_duration_ms: 600,
            tick_interval_ms: 1_000,
            low_time_threshold_secs: 15,
        }
    }
}

impl GameConfig {
    /// Reads a JSON config file. A missing file yields defaults; so does a file
    /// that fails to parse, with a warning.
    pub fn load(path: &Path) -> Result<Self> {
        let mut config = if path.exists() {
            let contents = fs::read_to_string(path)
                .with_context(|| format!("Failed to read game config from {}", path.display()))?;
            serde_json::from_str(&contents).unwrap_or_else(|err| {
                warn!("Ignoring malformed game config {}: {err}", path.display());
                GameConfig::default()
            })
        } else {
            GameConfig::default()
        };

        config.apply_env_overrides();
        config.sanitize();
        Ok(config)
    }

    /// Resets values that would break the rules back to their defaults.
    /// Padding may only widen a hit region, and the countdown must advance.
    pub fn sanitize(&mut self) {
        let defaults = GameConfig::default();
        if !(self.hit_padding.is_finite() && self.hit_padding >= 0.0) {
            warn!(
                "hitPadding {} is not a non-negative number, using {}",
                self.hit_padding, defaults.hit_padding
            );
            self.hit_padding = defaults.hit_padding;
        }
        if self.tick_interval_ms == 0 {
            warn!(
                "tickIntervalMs must be positive, using {}",
                defaults.tick_interval_ms
            );
            self.tick_interval_ms = defaults.tick_interval_ms;
        }
    }

    pub fn apply_env_overrides(&mut self) {
        if let Ok(raw) = std::env::var(FREE_GAMES_ENV) {
            match raw.trim().parse::<u32>() {
                Ok(value) => self.free_games = value,
                Err(err) => warn!("{FREE_GAMES_ENV}={raw:?} is not a number: {err}"),
            }
        }
    }

    pub fn hint_duration(&self) -> Duration {
        Duration::from_millis(self.hint_duration_ms)
    }

    pub fn win_delay(&self) -> Duration {
        Duration::from_millis(self.win_delay_ms)
    }

    pub fn result_delay(&self) -> Duration {
        Duration::from_millis(self.result_delay_ms)
    }

    pub fn feedback_duration(&self) -> Duration {
        Duration::from_millis(self.feedback_duration_ms)
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }
}
