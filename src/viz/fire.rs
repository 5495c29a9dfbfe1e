use crate::audio::FrequencyFrame;
use crate::config::FireConfig;

use super::surface::PixelSurface;
use super::{RenderAlgorithm, VisualizerKind};

/// Number of palette entries; cell intensities live in 0..PALETTE_SIZE.
const PALETTE_SIZE: usize = 128;

/// Stochastic fire automaton on a reduced-resolution grid.
///
/// Every tick the bottom row is re-seeded from the average frequency
/// magnitude scaled by volume, every other cell propagates upward with a
/// random horizontal drift of -1/0/+1 and a random intensity decay of
/// 0-2, and the grid is palette-mapped and nearest-neighbor upscaled onto
/// the surface. The drift uses unseeded randomness, so exact pixel output
/// is not reproducible run to run.
pub struct FireAutomaton {
    downscale: u32,
    grid_width: usize,
    grid_height: usize,
    cells: Vec<u8>,
    next: Vec<u8>,
    rgba: Vec<u8>,
    palette: [[u8; 4]; PALETTE_SIZE],
    rng: fastrand::Rng,
}

impl FireAutomaton {
    pub fn new(config: &FireConfig, width: u32, height: u32) -> Self {
        let mut this = Self {
            downscale: config.downscale.max(1),
            grid_width: 0,
            grid_height: 0,
            cells: Vec::new(),
            next: Vec::new(),
            rgba: Vec::new(),
            palette: Self::build_palette(),
            rng: fastrand::Rng::new(),
        };
        this.resize(width, height);
        this
    }

    #[cfg(test)]
    fn with_seed(config: &FireConfig, width: u32, height: u32, seed: u64) -> Self {
        let mut this = Self::new(config, width, height);
        this.rng = fastrand::Rng::with_seed(seed);
        this
    }

    pub fn grid_size(&self) -> (usize, usize) {
        (self.grid_width, self.grid_height)
    }

    pub fn cells(&self) -> &[u8] {
        &self.cells
    }

    /// Black -> red -> yellow -> white ramp over 128 entries.
    fn build_palette() -> [[u8; 4]; PALETTE_SIZE] {
        let mut palette = [[0u8, 0, 0, 255]; PALETTE_SIZE];
        for i in 0u16..32 {
            palette[i as usize] = [(i << 1) as u8, 0, 0, 255];
            palette[i as usize + 32] = [(64 + (i << 1)) as u8, (i << 3) as u8, 0, 255];
            palette[i as usize + 64] = [
                (128 + (i << 1)) as u8,
                (128 + (i << 1)) as u8,
                (i << 3) as u8,
                255,
            ];
            palette[i as usize + 96] = [255, 255, 255u8.saturating_sub((i << 3) as u8), 255];
        }
        palette
    }

    /// Seed the bottom row from the tick's audio intensity in 0..=1.
    fn inject(&mut self, intensity: f32) {
        let value = (intensity * (PALETTE_SIZE - 1) as f32)
            .clamp(0.0, (PALETTE_SIZE - 1) as f32) as u8;
        let bottom = (self.grid_height - 1) * self.grid_width;
        self.cells[bottom..bottom + self.grid_width].fill(value);
    }

    fn spread(&mut self) {
        self.next.copy_from_slice(&self.cells);

        for y in 1..self.grid_height {
            for x in 0..self.grid_width {
                let src = self.cells[y * self.grid_width + x];
                let decay = self.rng.u8(0..3);
                let drift = self.rng.i32(-1..=1);

                let nx = (x as i32 + drift).clamp(0, self.grid_width as i32 - 1) as usize;
                let ny = y.saturating_sub(decay as usize);
                self.next[ny * self.grid_width + nx] = src.saturating_sub(decay);
            }
        }

        std::mem::swap(&mut self.cells, &mut self.next);
    }

    fn blit(&mut self, surface: &mut PixelSurface) {
        for (cell, px) in self.cells.iter().zip(self.rgba.chunks_exact_mut(4)) {
            let color = self.palette[(*cell as usize).min(PALETTE_SIZE - 1)];
            px.copy_from_slice(&color);
        }
        surface.blit_scaled(&self.rgba, self.grid_width as u32, self.grid_height as u32);
    }
}

impl RenderAlgorithm for FireAutomaton {
    fn kind(&self) -> VisualizerKind {
        VisualizerKind::Fire
    }

    fn render(&mut self, frame: &FrequencyFrame, volume: f32, surface: &mut PixelSurface) {
        let intensity = if frame.sample_count() == 0 {
            0.0
        } else {
            let sum: u32 = frame.freq_domain.iter().map(|&v| v as u32).sum();
            (sum as f32 / frame.sample_count() as f32 / 255.0) * volume
        };

        self.inject(intensity);
        self.spread();
        self.blit(surface);
    }

    fn resize(&mut self, width: u32, height: u32) {
        self.grid_width = (width / self.downscale).max(1) as usize;
        self.grid_height = (height / self.downscale).max(1) as usize;
        let len = self.grid_width * self.grid_height;
        self.cells.clear();
        self.cells.resize(len, 0);
        self.next.clear();
        self.next.resize(len, 0);
        self.rgba.clear();
        self.rgba.resize(len * 4, 0);
    }
}
