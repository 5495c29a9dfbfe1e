use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::viz::VisualizerKind;

/// Player-wide tuning, loadable from JSON. Every field has a sensible
/// default so a partial config file only overrides what it names.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerConfig {
    pub visualizer: VisualizerKind,
    pub analyzer: AnalyzerConfig,
    pub bars: BarsConfig,
    pub waveform: WaveformConfig,
    pub fire: FireConfig,
    pub fractal: FractalConfig,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            visualizer: VisualizerKind::Spectrum,
            analyzer: AnalyzerConfig::default(),
            bars: BarsConfig::default(),
            waveform: WaveformConfig::default(),
            fire: FireConfig::default(),
            fractal: FractalConfig::default(),
        }
    }
}

impl PlayerConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = std::fs::File::open(&path)
            .with_context(|| format!("Cannot open config {:?}", path.as_ref()))?;
        let config = serde_json::from_reader(std::io::BufReader::new(file))
            .with_context(|| format!("Cannot parse config {:?}", path.as_ref()))?;
        Ok(config)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyzerConfig {
    /// Power of two in 32..=32768; yields fft_size / 2 frequency bins.
    pub fft_size: usize,
    /// The analyzer's own magnitude smoothing, 0..=1.
    pub smoothing: f32,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            fft_size: 2048,
            smoothing: 0.85,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BarsConfig {
    pub spacing: u32,
    pub min_height: u32,
    /// Logarithmic frequency-to-bar mapping; false falls back to linear.
    pub log_mapping: bool,
    pub min_frequency: f32,
    pub max_frequency: f32,
    pub smoothing: f32,
    pub peak_hold_ticks: u32,
    pub peak_decay: f32,
    pub peak_jitter: f32,
    pub scheme: ColorSchemeName,
}

impl Default for BarsConfig {
    fn default() -> Self {
        Self {
            spacing: 2,
            min_height: 2,
            log_mapping: true,
            min_frequency: 20.0,
            max_frequency: 20000.0,
            smoothing: 0.3,
            peak_hold_ticks: 45,
            peak_decay: 0.95,
            peak_jitter: 0.5,
            scheme: ColorSchemeName::Classic,
        }
    }
}

/// Gradient presets for the spectrum bars.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorSchemeName {
    Classic,
    Fire,
    Matrix,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WaveformConfig {
    pub animation_speed: f32,
    pub line_width: u32,
    pub base_amplitude: f32,
}

impl Default for WaveformConfig {
    fn default() -> Self {
        Self {
            animation_speed: 0.05,
            line_width: 3,
            base_amplitude: 30.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FireConfig {
    /// The automaton grid runs at surface resolution divided by this.
    pub downscale: u32,
}

impl Default for FireConfig {
    fn default() -> Self {
        Self { downscale: 2 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FractalConfig {
    pub zoom_speed: f32,
    pub zoom_ceiling: f32,
    pub max_iterations: u32,
}

impl Default for FractalConfig {
    fn default() -> Self {
        Self {
            zoom_speed: 0.02,
            zoom_ceiling: 1000.0,
            max_iterations: 100,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config: PlayerConfig =
            serde_json::from_str(r#"{"visualizer": "fire", "fractal": {"max_iterations": 50}}"#)
                .unwrap();
        assert_eq!(config.visualizer, VisualizerKind::Fire);
        assert_eq!(config.fractal.max_iterations, 50);
        // Untouched sections keep their defaults.
        assert_eq!(config.analyzer.fft_size, 2048);
        assert_eq!(config.bars.peak_hold_ticks, 45);
    }
}
