//! Configuration for the fog eraser.
//!
//! Every struct uses `#[serde(default)]`, so a config file only needs the
//! fields it wants to change. `Config::validate` pulls out-of-range values
//! back to something usable instead of failing.

use std::path::Path;
use std::time::Duration;

use log::warn;
use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::history::DEFAULT_HISTORY_CAPACITY;

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct Config {
    pub brush: BrushConfig,
    pub display: DisplayConfig,
    pub fog: FogConfig,
    pub history: HistoryConfig,
    pub gestures: GestureConfig,
    pub timing: TimingConfig,
}

/// Brush radius is in mask (display) pixels.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct BrushConfig {
    pub radius: f64,
    pub min_radius: f64,
    pub max_radius: f64,
    /// Amount `grow`/`shrink` change the radius by.
    pub step: f64,
}

impl Default for BrushConfig {
    fn default() -> Self {
        Self { radius: 50.0, min_radius: 5.0, max_radius: 150.0, step: 5.0 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DisplayConfig {
    /// Fraction of the container height given to the video, in (0, 1].
    pub scale_factor: f64,
    pub device_pixel_ratio: f64,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self { scale_factor: 0.8, device_pixel_ratio: 1.0 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct FogConfig {
    /// Start fully fogged (true) or fully revealed (false).
    pub start_fogged: bool,
    /// 0x00RRGGBB
    pub fog_color: u32,
    /// Drawn while the video has no frame yet.
    pub placeholder_color: u32,
}

impl Default for FogConfig {
    fn default() -> Self {
        Self { start_fogged: true, fog_color: 0x0000_0000, placeholder_color: 0x0000_00FF }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct HistoryConfig {
    pub capacity: usize,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self { capacity: DEFAULT_HISTORY_CAPACITY }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct GestureConfig {
    /// Two-finger taps released within this window open the menu.
    pub menu_window_ms: u64,
}

impl Default for GestureConfig {
    fn default() -> Self {
        Self { menu_window_ms: 500 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TimingConfig {
    /// Delay before retrying geometry after an invalid container.
    pub geometry_retry_ms: u64,
    pub target_fps: u32,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self { geometry_retry_ms: 200, target_fps: 60 }
    }
}

impl GestureConfig {
    pub fn menu_window(&self) -> Duration {
        Duration::from_millis(self.menu_window_ms)
    }
}

impl TimingConfig {
    pub fn geometry_retry(&self) -> Duration {
        Duration::from_millis(self.geometry_retry_ms)
    }
}

impl Config {
    /// Read a JSON config file. Missing fields keep their defaults.
    pub fn load(path: &Path) -> Result<Self, Error> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("{}: {e}", path.display())))?;
        let config: Config = serde_json::from_str(&text)
            .map_err(|e| Error::Config(format!("{}: {e}", path.display())))?;
        Ok(config.validate())
    }

    /// Clamp nonsensical values, logging each adjustment.
    pub fn validate(mut self) -> Self {
        let defaults = Config::default();

        let b = &mut self.brush;
        if !(b.min_radius.is_finite() && b.min_radius > 0.0) {
            warn!("brush.min_radius {} invalid, using {}", b.min_radius, defaults.brush.min_radius);
            b.min_radius = defaults.brush.min_radius;
        }
        if !(b.max_radius.is_finite() && b.max_radius >= b.min_radius) {
            let fallback = b.min_radius.max(defaults.brush.max_radius);
            warn!("brush.max_radius {} invalid, using {fallback}", b.max_radius);
            b.max_radius = fallback;
        }
        if !b.radius.is_finite() || b.radius < b.min_radius || b.radius > b.max_radius {
            let r = if b.radius.is_finite() { b.radius } else { defaults.brush.radius };
            let clamped = r.clamp(b.min_radius, b.max_radius);
            warn!("brush.radius {} out of range, using {clamped}", b.radius);
            b.radius = clamped;
        }
        if !(b.step.is_finite() && b.step > 0.0) {
            warn!("brush.step {} invalid, using {}", b.step, defaults.brush.step);
            b.step = defaults.brush.step;
        }

        let d = &mut self.display;
        if !(d.scale_factor.is_finite() && d.scale_factor > 0.0 && d.scale_factor <= 1.0) {
            warn!(
                "display.scale_factor {} outside (0, 1], using {}",
                d.scale_factor, defaults.display.scale_factor
            );
            d.scale_factor = defaults.display.scale_factor;
        }
        if !(d.device_pixel_ratio.is_finite() && d.device_pixel_ratio >= 1.0) {
            warn!("display.device_pixel_ratio {} below 1, using 1", d.device_pixel_ratio);
            d.device_pixel_ratio = 1.0;
        }

        if self.history.capacity == 0 {
            warn!("history.capacity 0, using 1");
            self.history.capacity = 1;
        }
        if self.timing.target_fps == 0 {
            warn!("timing.target_fps 0, using {}", defaults.timing.target_fps);
            self.timing.target_fps = defaults.timing.target_fps;
        }
        self.fog.fog_color &= 0x00FF_FFFF;
        self.fog.placeholder_color &= 0x00FF_FFFF;
        self
    }
}
