use crate::audio::FrequencyFrame;
use crate::config::WaveformConfig;

use super::surface::PixelSurface;
use super::{RenderAlgorithm, VisualizerKind};

/// Zero reference of the 8-bit centered time-domain buffer.
const MIDLINE: f32 = 128.0;

const WAVE_COLOR: [u8; 3] = [0x4a, 0x9e, 0xff];
const BACKGROUND: [u8; 3] = [0x1a, 0x1a, 0x1a];

/// Phase-animated sum of two sine components whose amplitude follows the
/// signal's deviation from the midline. The phase accumulator advances
/// every tick, so the wave keeps drifting even over silence.
pub struct Waveform {
    config: WaveformConfig,
    width: u32,
    height: u32,
    phase: f32,
}

impl Waveform {
    pub fn new(config: &WaveformConfig, width: u32, height: u32) -> Self {
        Self {
            config: config.clone(),
            width,
            height,
            phase: 0.0,
        }
    }

    pub fn phase(&self) -> f32 {
        self.phase
    }

    /// Mean absolute deviation from the midline, the amplitude modifier.
    /// An all-zero (signal-absent) frame counts as zero deviation, not as
    /// a full-scale DC offset.
    fn deviation(frame: &FrequencyFrame) -> f32 {
        if frame.time_domain.is_empty() || frame.is_silent() {
            return 0.0;
        }
        let sum: f32 = frame
            .time_domain
            .iter()
            .map(|&s| (s as f32 - MIDLINE).abs())
            .sum();
        sum / frame.time_domain.len() as f32
    }
}

impl RenderAlgorithm for Waveform {
    fn kind(&self) -> VisualizerKind {
        VisualizerKind::Waveform
    }

    fn render(&mut self, frame: &FrequencyFrame, volume: f32, surface: &mut PixelSurface) {
        // Semi-transparent clear keeps a motion trail behind the wave.
        surface.blend_fill(BACKGROUND, 0.6);

        let deviation = Self::deviation(frame);
        let amplitude =
            (self.config.base_amplitude + deviation * 0.5) * (volume + 0.3).min(1.0);
        let center = self.height as f32 / 2.0;
        let line = self.config.line_width.max(1);

        let mut prev_y: Option<i32> = None;
        for x in 0..self.width {
            let t = x as f32 / self.width as f32;
            let y = center
                + amplitude * (t * std::f32::consts::PI * 2.0 + self.phase).sin()
                + amplitude * 0.5 * (t * std::f32::consts::PI * 4.0 + self.phase * 1.5).sin();
            let y = y as i32;

            // Join consecutive samples vertically so steep sections stay
            // connected.
            let (top, bottom) = match prev_y {
                Some(p) => (p.min(y), p.max(y)),
                None => (y, y),
            };
            surface.fill_rect(
                x as i32,
                top - line as i32 / 2,
                1,
                (bottom - top) as u32 + line,
                WAVE_COLOR,
            );
            prev_y = Some(y);
        }

        self.phase += self.config.animation_speed;
    }

    fn resize(&mut self, width: u32, height: u32) {
        self.width = width;
        self.height = height;
        self.phase = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::WaveformConfig;

    #[test]
    fn test_phase_advances_on_silence() {
        let config = WaveformConfig::default();
        let mut wave = Waveform::new(&config, 64, 32);
        let mut surface = PixelSurface::new(64, 32);
        let frame = FrequencyFrame::zeroed(512);

        wave.render(&frame, 0.0, &mut surface);
        let p1 = wave.phase();
        wave.render(&frame, 0.0, &mut surface);
        assert!(wave.phase() > p1);
    }

    #[test]
    fn test_silent_frame_stays_near_center() {
        let config = WaveformConfig::default();
        let height = 100u32;
        let mut wave = Waveform::new(&config, 200, height);
        let mut surface = PixelSurface::new(200, height);
        wave.render(&FrequencyFrame::zeroed(512), 0.0, &mut surface);

        // Amplitude degrades to base * 0.3; nothing should be painted far
        // from the midline.
        let limit = (config.base_amplitude * 0.3 * 1.5) as u32 + config.line_width + 2;
        for y in 0..height {
            for x in 0..200u32 {
                if surface.pixel(x, y) == WAVE_COLOR {
                    let dist = (y as i32 - height as i32 / 2).unsigned_abs();
                    assert!(dist <= limit, "wave pixel at ({}, {}) too far out", x, y);
                }
            }
        }
    }

    #[test]
    fn test_deviation_tracks_signal_energy() {
        let mut loud = FrequencyFrame::zeroed(512);
        for (i, s) in loud.time_domain.iter_mut().enumerate() {
            *s = if i % 2 == 0 { 255 } else { 0 };
        }
        loud.freq_domain.fill(200);
        let mut quiet = FrequencyFrame::zeroed(512);
        quiet.time_domain.fill(128);
        quiet.freq_domain.fill(1);

        assert!(Waveform::deviation(&loud) > 100.0);
        assert!(Waveform::deviation(&quiet) < 1.0);
        assert_eq!(Waveform::deviation(&FrequencyFrame::zeroed(512)), 0.0);
    }
}
