pub mod fire;
pub mod fractal;
pub mod spectrum;
pub mod state;
pub mod surface;
pub mod waveform;

pub use fire::FireAutomaton;
pub use fractal::FractalZoom;
pub use spectrum::SpectrumBars;
pub use state::{BarStates, PeakParams};
pub use surface::PixelSurface;
pub use waveform::Waveform;

use anyhow::Result;
use log::info;
use serde::{Deserialize, Serialize};

use crate::audio::{AudioSource, FrequencyFrame, SpectrumAnalyzer};
use crate::config::PlayerConfig;

/// The four interchangeable visualization strategies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum VisualizerKind {
    Spectrum,
    Waveform,
    Fire,
    Fractal,
}

impl VisualizerKind {
    pub const ALL: [Self; 4] = [Self::Spectrum, Self::Waveform, Self::Fire, Self::Fractal];

    pub fn label(self) -> &'static str {
        match self {
            Self::Spectrum => "Spectrum Bars",
            Self::Waveform => "Waveform",
            Self::Fire => "Fire",
            Self::Fractal => "Fractal Zoom",
        }
    }
}

/// Common per-tick contract for all render algorithms.
///
/// `render` is called once per animation tick with that tick's analyzer
/// frame and the current audio volume. Implementations pre-allocate their
/// buffers and must tolerate all-zero frames (no decodable signal) by
/// painting a flat/idle visual.
pub trait RenderAlgorithm {
    fn kind(&self) -> VisualizerKind;

    fn render(&mut self, frame: &FrequencyFrame, volume: f32, surface: &mut PixelSurface);

    /// The surface changed dimensions: recompute every derived value and
    /// drop all private state before the next tick.
    fn resize(&mut self, width: u32, height: u32);
}

/// One visualization pipeline: analyzer, raster surface and the active
/// render algorithm. Owned by the component shell via the visualizer
/// plugin; `tick` is the only per-frame entry point.
pub struct Visualizer {
    analyzer: SpectrumAnalyzer,
    surface: PixelSurface,
    renderer: Box<dyn RenderAlgorithm>,
}

impl Visualizer {
    pub fn new(config: &PlayerConfig, width: u32, height: u32) -> Result<Self> {
        let analyzer = SpectrumAnalyzer::new(config.analyzer.fft_size, config.analyzer.smoothing)?;
        Ok(Self {
            analyzer,
            surface: PixelSurface::new(width, height),
            renderer: build_renderer(config.visualizer, config, width, height),
        })
    }

    pub fn kind(&self) -> VisualizerKind {
        self.renderer.kind()
    }

    pub fn surface(&self) -> &PixelSurface {
        &self.surface
    }

    /// Replace the active algorithm with a freshly constructed one. The
    /// outgoing algorithm's state is dropped wholesale; the incoming one
    /// starts from zero before its first tick.
    pub fn switch(&mut self, kind: VisualizerKind, config: &PlayerConfig) {
        if kind == self.renderer.kind() {
            return;
        }
        info!("Switching visualizer to {}", kind.label());
        self.renderer = build_renderer(kind, config, self.surface.width(), self.surface.height());
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        if width == self.surface.width() && height == self.surface.height() {
            return;
        }
        self.surface.resize(width, height);
        self.renderer.resize(width, height);
    }

    /// One animation tick: poll the analyzer once and hand the frame to
    /// exactly one render pass.
    pub fn tick(&mut self, audio: &AudioSource) {
        let volume = audio.volume();
        let frame = self.analyzer.poll(audio);
        self.renderer.render(frame, volume, &mut self.surface);
    }
}

fn build_renderer(
    kind: VisualizerKind,
    config: &PlayerConfig,
    width: u32,
    height: u32,
) -> Box<dyn RenderAlgorithm> {
    match kind {
        VisualizerKind::Spectrum => Box::new(SpectrumBars::new(&config.bars, width, height)),
        VisualizerKind::Waveform => Box::new(Waveform::new(&config.waveform, width, height)),
        VisualizerKind::Fire => Box::new(FireAutomaton::new(&config.fire, width, height)),
        VisualizerKind::Fractal => Box::new(FractalZoom::new(&config.fractal, width, height)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PlayerConfig;

    #[test]
    fn test_switch_resets_algorithm_state() {
        let config = PlayerConfig::default();
        let mut viz = Visualizer::new(&config, 320, 120).unwrap();
        assert_eq!(viz.kind(), VisualizerKind::Spectrum);

        viz.switch(VisualizerKind::Fire, &config);
        assert_eq!(viz.kind(), VisualizerKind::Fire);

        // Switching to the already-active kind keeps the instance.
        viz.switch(VisualizerKind::Fire, &config);
        assert_eq!(viz.kind(), VisualizerKind::Fire);
    }

    #[test]
    fn test_tick_with_detached_audio_stays_idle() {
        let config = PlayerConfig::default();
        let mut viz = Visualizer::new(&config, 64, 32).unwrap();
        let audio = AudioSource::detached();

        // No signal: the tick must paint a flat visual, not error.
        viz.tick(&audio);
        assert_eq!(viz.surface().width(), 64);
    }
}
