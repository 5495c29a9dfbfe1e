use crate::audio::FrequencyFrame;
use crate::config::{BarsConfig, ColorSchemeName};

use super::state::{BarStates, PeakParams};
use super::surface::PixelSurface;
use super::{RenderAlgorithm, VisualizerKind};

const PEAK_CAP_HEIGHT: u32 = 2;
const SCANLINE_ALPHA: f32 = 0.02;

/// Four-stop vertical gradient used to tint the bars bottom-to-top.
#[derive(Debug, Clone)]
pub struct ColorScheme {
    stops: [(f32, [u8; 3]); 4],
}

impl ColorScheme {
    pub fn classic() -> Self {
        Self {
            stops: [
                (0.0, [0x1e, 0x45, 0xcb]),
                (0.5, [0x4a, 0x9e, 0xff]),
                (0.8, [0xc4, 0xe0, 0xff]),
                (1.0, [0xff, 0xff, 0xff]),
            ],
        }
    }

    pub fn fire() -> Self {
        Self {
            stops: [
                (0.0, [0xff, 0x30, 0x00]),
                (0.5, [0xff, 0x80, 0x00]),
                (0.8, [0xff, 0xff, 0x00]),
                (1.0, [0xff, 0xff, 0xff]),
            ],
        }
    }

    pub fn matrix() -> Self {
        Self {
            stops: [
                (0.0, [0x00, 0x33, 0x00]),
                (0.5, [0x00, 0x88, 0x00]),
                (0.8, [0x00, 0xff, 0x00]),
                (1.0, [0xff, 0xff, 0xff]),
            ],
        }
    }

    pub fn named(name: ColorSchemeName) -> Self {
        match name {
            ColorSchemeName::Classic => Self::classic(),
            ColorSchemeName::Fire => Self::fire(),
            ColorSchemeName::Matrix => Self::matrix(),
        }
    }

    /// Precompute one color per row, index 0 = surface bottom.
    fn ramp(&self, height: u32) -> Vec<[u8; 3]> {
        let h = height.max(1);
        (0..h)
            .map(|row| {
                let t = if h == 1 {
                    0.0
                } else {
                    row as f32 / (h - 1) as f32
                };
                self.sample(t)
            })
            .collect()
    }

    fn sample(&self, t: f32) -> [u8; 3] {
        let t = t.clamp(0.0, 1.0);
        for pair in self.stops.windows(2) {
            let (t0, c0) = pair[0];
            let (t1, c1) = pair[1];
            if t <= t1 {
                let f = if t1 > t0 { (t - t0) / (t1 - t0) } else { 0.0 };
                return [
                    (c0[0] as f32 + (c1[0] as f32 - c0[0] as f32) * f) as u8,
                    (c0[1] as f32 + (c1[1] as f32 - c0[1] as f32) * f) as u8,
                    (c0[2] as f32 + (c1[2] as f32 - c0[2] as f32) * f) as u8,
                ];
            }
        }
        self.stops[3].1
    }
}

/// Classic bar-spectrum rendering: K bars mapped onto the analyzer's bins,
/// smoothed and capped by `BarStates`, tinted by a vertical gradient, with
/// a scanline overlay on top.
pub struct SpectrumBars {
    config: BarsConfig,
    width: u32,
    height: u32,
    bar_width: u32,
    bars: BarStates,
    gradient: Vec<[u8; 3]>,
    scheme: ColorScheme,
}

impl SpectrumBars {
    pub fn new(config: &BarsConfig, width: u32, height: u32) -> Self {
        let params = PeakParams {
            smoothing: config.smoothing.clamp(f32::EPSILON, 1.0),
            hold_ticks: config.peak_hold_ticks,
            decay: config.peak_decay,
            jitter: config.peak_jitter,
        };
        let scheme = ColorScheme::named(config.scheme);
        let mut this = Self {
            config: config.clone(),
            width: 0,
            height: 0,
            bar_width: 0,
            bars: BarStates::new(0, params),
            gradient: Vec::new(),
            scheme,
        };
        this.resize(width, height);
        this
    }

    pub fn bar_count(&self) -> usize {
        self.bars.len()
    }

    pub fn bar_states(&self) -> &BarStates {
        &self.bars
    }

    /// Map bar index `i` of `bar_count` onto a frequency bin. Logarithmic
    /// mode distributes bars over 20 Hz - 20 kHz perceptually; linear mode
    /// slices the bin range evenly.
    fn bar_to_bin(&self, i: usize, bar_count: usize, bin_count: usize) -> usize {
        if bar_count == 0 || bin_count == 0 {
            return 0;
        }
        let bin = if self.config.log_mapping {
            let span = (self.config.max_frequency / self.config.min_frequency).ln();
            let freq = self.config.min_frequency * (span * i as f32 / bar_count as f32).exp();
            (freq / self.config.max_frequency * bin_count as f32) as usize
        } else {
            i * bin_count / bar_count
        };
        bin.min(bin_count - 1)
    }
}

impl RenderAlgorithm for SpectrumBars {
    fn kind(&self) -> VisualizerKind {
        VisualizerKind::Spectrum
    }

    fn render(&mut self, frame: &FrequencyFrame, volume: f32, surface: &mut PixelSurface) {
        // Slight fade instead of a clear leaves motion trails.
        surface.blend_fill([0, 0, 0], 0.1);

        let height = self.height;
        let scale = height as f32 / 255.0;
        let total_width = self.bar_width + self.config.spacing;
        let bar_count = self.bars.len();
        let start_x = (self.width as i32 - (bar_count as u32 * total_width) as i32) / 2;

        for i in 0..bar_count {
            let bin = self.bar_to_bin(i, bar_count, frame.sample_count());
            // Volume scales the raw magnitude before smoothing.
            let raw = frame.freq_domain.get(bin).copied().unwrap_or(0) as f32 * scale * volume;
            let value = self.bars.tick(i, raw);

            let x = start_x + (i as u32 * total_width) as i32;
            let bar_height = value.max(self.config.min_height as f32).min(height as f32) as u32;

            for row in 0..bar_height {
                let y = height as i32 - 1 - row as i32;
                let color = self.gradient[row as usize];
                surface.fill_rect(x, y, self.bar_width, 1, color);
            }

            let peak = self.bars.peak(i).min(height as f32);
            let peak_y = height as i32 - peak as i32 - PEAK_CAP_HEIGHT as i32;
            surface.fill_rect(x, peak_y, self.bar_width, PEAK_CAP_HEIGHT, [255, 255, 255]);
        }

        for y in (0..height).step_by(4) {
            surface.blend_rect(0, y as i32, self.width, 1, [255, 255, 255], SCANLINE_ALPHA);
        }
    }

    fn resize(&mut self, width: u32, height: u32) {
        self.width = width;
        self.height = height;
        self.bar_width = (width / 120).max(4);
        let bar_count = (width / (self.bar_width + self.config.spacing)) as usize;
        self.bars.reset(bar_count);
        self.gradient = self.scheme.ramp(height);
    }
}
