use anyhow::Result;
use rustfft::{num_complex::Complex, FftPlanner};

use super::{AudioSource, FrequencyFrame};

/// Quantization range for the byte-magnitude output, in decibels.
const MIN_DECIBELS: f32 = -100.0;
const MAX_DECIBELS: f32 = -30.0;

/// Taps the audio source's mono analysis buffer and produces one
/// `FrequencyFrame` per poll: an 8-bit time-domain snapshot plus 8-bit
/// frequency magnitudes quantized over a -100..-30 dB window.
///
/// The analyzer applies its own exponential smoothing across polls
/// (`smoothing` in 0..=1, higher = smoother); rendering-side smoothing is
/// layered on top by `BarStates` and is a separate concern.
///
/// Polling is non-destructive and repeatable: if the transport has not
/// advanced, the same window is analyzed again. If there is no decodable
/// signal under the playhead the frame degrades to all zeros, never an
/// error.
pub struct SpectrumAnalyzer {
    fft_size: usize,
    smoothing: f32,
    fft: std::sync::Arc<dyn rustfft::Fft<f32>>,
    window: Vec<f32>,
    scratch: Vec<Complex<f32>>,
    smoothed: Vec<f32>,
    frame: FrequencyFrame,
}

impl SpectrumAnalyzer {
    /// `fft_size` must be a power of two in 32..=32768; `smoothing` is
    /// clamped into 0..=1.
    pub fn new(fft_size: usize, smoothing: f32) -> Result<Self> {
        if !fft_size.is_power_of_two() || !(32..=32768).contains(&fft_size) {
            anyhow::bail!(
                "FFT size must be a power of two in 32..=32768, got {}",
                fft_size
            );
        }

        let mut planner = FftPlanner::new();
        let fft = planner.plan_fft_forward(fft_size);

        Ok(Self {
            fft_size,
            smoothing: smoothing.clamp(0.0, 1.0),
            fft,
            window: Self::hann_window(fft_size),
            scratch: vec![Complex::new(0.0, 0.0); fft_size],
            smoothed: vec![0.0; fft_size / 2],
            frame: FrequencyFrame::zeroed(fft_size),
        })
    }

    pub fn fft_size(&self) -> usize {
        self.fft_size
    }

    pub fn bin_count(&self) -> usize {
        self.fft_size / 2
    }

    fn hann_window(size: usize) -> Vec<f32> {
        (0..size)
            .map(|i| {
                let phase = 2.0 * std::f32::consts::PI * i as f32 / (size - 1) as f32;
                0.5 * (1.0 - phase.cos())
            })
            .collect()
    }

    /// Analyze the `fft_size` samples trailing the playhead. Call at most
    /// once per animation tick; the returned frame borrows the analyzer's
    /// reusable buffers.
    pub fn poll(&mut self, audio: &AudioSource) -> &FrequencyFrame {
        let samples = audio.samples();
        let cursor = (audio.current_time() as f64 * audio.sample_rate() as f64) as usize;

        let end = cursor.min(samples.len());
        let start = end.saturating_sub(self.fft_size);
        let slice = &samples[start..end];

        if slice.is_empty() {
            self.frame.time_domain.fill(0);
            self.frame.freq_domain.fill(0);
            return &self.frame;
        }

        for i in 0..self.fft_size {
            let s = slice.get(i).copied().unwrap_or(0.0);
            self.frame.time_domain[i] = (s * 128.0 + 128.0).clamp(0.0, 255.0) as u8;
            self.scratch[i] = Complex::new(s * self.window[i], 0.0);
        }

        self.fft.process(&mut self.scratch);

        let norm = 2.0 / self.fft_size as f32;
        for (i, c) in self.scratch[..self.fft_size / 2].iter().enumerate() {
            let magnitude = c.norm() * norm;
            self.smoothed[i] =
                self.smoothing * self.smoothed[i] + (1.0 - self.smoothing) * magnitude;
            self.frame.freq_domain[i] = Self::to_byte(self.smoothed[i]);
        }

        &self.frame
    }

    /// Map a linear magnitude into the 0-255 byte range over the
    /// MIN_DECIBELS..MAX_DECIBELS window.
    fn to_byte(magnitude: f32) -> u8 {
        if magnitude <= 0.0 {
            return 0;
        }
        let db = 20.0 * magnitude.log10();
        let scaled = (db - MIN_DECIBELS) / (MAX_DECIBELS - MIN_DECIBELS) * 255.0;
        scaled.clamp(0.0, 255.0) as u8
    }
}
