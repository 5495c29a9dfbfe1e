use glam::{Mat2, Vec2};
use rayon::prelude::*;

use crate::audio::FrequencyFrame;
use crate::config::FractalConfig;

use super::surface::PixelSurface;
use super::{RenderAlgorithm, VisualizerKind};

/// Escape radius squared for the iteration z <- z^2 + c.
const ESCAPE_RADIUS_SQ: f32 = 4.0;

/// The audio-driven view into the complex plane. Mutated once per tick
/// before the pixel pass; the pixel workers only ever read a copy.
#[derive(Debug, Clone, Copy)]
pub struct FractalViewport {
    pub zoom: f32,
    pub center_re: f32,
    pub center_im: f32,
    pub rotation: f32,
    pub hue_offset: f32,
    pub max_iterations: u32,
}

impl FractalViewport {
    fn new(max_iterations: u32) -> Self {
        Self {
            zoom: 1.0,
            center_re: 0.0,
            center_im: 0.0,
            rotation: 0.0,
            hue_offset: 0.0,
            max_iterations,
        }
    }

    /// Advance the viewport by one tick of audio intensity. Bass drives
    /// zoom and rotation, treble cycles the hue. When the zoom passes the
    /// ceiling it snaps back to 1.0, closing the "infinite zoom" loop.
    fn advance(&mut self, bass: f32, treble: f32, zoom_speed: f32, ceiling: f32) {
        self.zoom *= 1.0 + zoom_speed * (1.0 + 0.5 * bass);
        self.hue_offset = (self.hue_offset + 5.0 * treble) % 360.0;
        self.rotation += 0.02 * bass;
        if self.zoom > ceiling {
            self.zoom = 1.0;
        }
    }
}

/// Audio-reactive Mandelbrot zoom. The pixel pass is the heaviest path in
/// the crate (O(width * height * max_iterations) per tick), so rows are
/// farmed out to rayon; every pixel is independent.
pub struct FractalZoom {
    config: FractalConfig,
    width: u32,
    height: u32,
    viewport: FractalViewport,
}

impl FractalZoom {
    pub fn new(config: &FractalConfig, width: u32, height: u32) -> Self {
        Self {
            config: config.clone(),
            width,
            height,
            viewport: FractalViewport::new(config.max_iterations),
        }
    }

    pub fn viewport(&self) -> &FractalViewport {
        &self.viewport
    }

    /// Average the low half of the bins into a bass intensity and the high
    /// half into a treble intensity, both in 0..=1.
    fn split_intensities(frame: &FrequencyFrame) -> (f32, f32) {
        let bins = frame.freq_domain.len();
        if bins < 2 {
            return (0.0, 0.0);
        }
        let mid = bins / 2;
        let low: u32 = frame.freq_domain[..mid].iter().map(|&v| v as u32).sum();
        let high: u32 = frame.freq_domain[mid..].iter().map(|&v| v as u32).sum();
        (
            low as f32 / (mid as f32 * 255.0),
            high as f32 / ((bins - mid) as f32 * 255.0),
        )
    }

    fn escape_time(re: f32, im: f32, max_iterations: u32) -> u32 {
        let mut zr = 0.0f32;
        let mut zi = 0.0f32;
        let mut iteration = 0;
        while iteration < max_iterations && zr * zr + zi * zi < ESCAPE_RADIUS_SQ {
            let next_zr = zr * zr - zi * zi + re;
            zi = 2.0 * zr * zi + im;
            zr = next_zr;
            iteration += 1;
        }
        iteration
    }

    fn color(iteration: u32, viewport: &FractalViewport) -> [u8; 3] {
        if iteration >= viewport.max_iterations {
            return [0, 0, 0];
        }
        let hue = (iteration as f32 / viewport.max_iterations as f32 * 360.0
            + viewport.hue_offset)
            % 360.0;
        hsv_to_rgb(hue, 1.0, 1.0)
    }
}

impl RenderAlgorithm for FractalZoom {
    fn kind(&self) -> VisualizerKind {
        VisualizerKind::Fractal
    }

    fn render(&mut self, frame: &FrequencyFrame, _volume: f32, surface: &mut PixelSurface) {
        let (bass, treble) = Self::split_intensities(frame);
        self.viewport.advance(
            bass,
            treble,
            self.config.zoom_speed,
            self.config.zoom_ceiling,
        );

        // Copy for the workers; the live viewport is not touched again
        // until the next tick.
        let viewport = self.viewport;
        let width = self.width as usize;
        let height = self.height as f32;
        let aspect = self.width as f32 / height;
        let half = Vec2::new(self.width as f32 / 2.0, height / 2.0);
        let rotate = Mat2::from_angle(viewport.rotation);

        surface
            .data_mut()
            .par_chunks_mut(width * 4)
            .enumerate()
            .for_each(|(y, row)| {
                for (x, px) in row.chunks_exact_mut(4).enumerate() {
                    let p = Vec2::new(x as f32, y as f32) - half;
                    let r = rotate * p;
                    let re = r.x * aspect / (width as f32 * viewport.zoom) + viewport.center_re;
                    let im = r.y / (height * viewport.zoom) + viewport.center_im;

                    let iteration = Self::escape_time(re, im, viewport.max_iterations);
                    let rgb = Self::color(iteration, &viewport);
                    px[0] = rgb[0];
                    px[1] = rgb[1];
                    px[2] = rgb[2];
                    px[3] = 255;
                }
            });
    }

    fn resize(&mut self, width: u32, height: u32) {
        self.width = width;
        self.height = height;
        self.viewport = FractalViewport::new(self.config.max_iterations);
    }
}

fn hsv_to_rgb(hue: f32, saturation: f32, value: f32) -> [u8; 3] {
    let h = (hue.rem_euclid(360.0)) / 60.0;
    let c = value * saturation;
    let x = c * (1.0 - ((h % 2.0) - 1.0).abs());
    let m = value - c;

    let (r, g, b) = match h as u32 {
        0 => (c, x, 0.0),
        1 => (x, c, 0.0),
        2 => (0.0, c, x),
        3 => (0.0, x, c),
        4 => (x, 0.0, c),
        _ => (c, 0.0, x),
    };

    [
        ((r + m) * 255.0).round() as u8,
        ((g + m) * 255.0).round() as u8,
        ((b + m) * 255.0).round() as u8,
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FractalConfig;

    fn bass_heavy_frame() -> FrequencyFrame {
        let mut frame = FrequencyFrame::zeroed(512);
        frame.freq_domain.fill(255);
        frame
    }

    #[test]
    fn test_zoom_cycles_through_ceiling() {
        let config = FractalConfig {
            zoom_ceiling: 50.0,
            ..FractalConfig::default()
        };
        let mut fractal = FractalZoom::new(&config, 16, 8);
        let mut surface = PixelSurface::new(16, 8);

        let mut reset_seen = false;
        let mut prev = fractal.viewport().zoom;
        for _ in 0..300 {
            fractal.render(&bass_heavy_frame(), 1.0, &mut surface);
            let zoom = fractal.viewport().zoom;
            // Never left above the ceiling after a tick.
            assert!(zoom <= config.zoom_ceiling);
            if zoom < prev {
                // The only way down is the ceiling reset.
                assert_eq!(zoom, 1.0);
                reset_seen = true;
            }
            prev = zoom;
        }
        assert!(reset_seen, "zoom never cycled through the ceiling");
    }

    #[test]
    fn test_escape_time_bounds() {
        // The origin never escapes; a far point escapes immediately.
        assert_eq!(FractalZoom::escape_time(0.0, 0.0, 100), 100);
        assert!(FractalZoom::escape_time(2.0, 2.0, 100) <= 2);
    }

    #[test]
    fn test_split_intensities() {
        let mut frame = FrequencyFrame::zeroed(512);
        frame.freq_domain[..128].fill(255);
        let (bass, treble) = FractalZoom::split_intensities(&frame);
        assert!((bass - 1.0).abs() < 1e-6);
        assert_eq!(treble, 0.0);
    }

    #[test]
    fn test_silent_frame_still_zooms() {
        let mut fractal = FractalZoom::new(&FractalConfig::default(), 8, 8);
        let mut surface = PixelSurface::new(8, 8);
        let before = fractal.viewport().zoom;
        fractal.render(&FrequencyFrame::zeroed(512), 0.0, &mut surface);
        assert!(fractal.viewport().zoom > before);
    }

    #[test]
    fn test_hsv_primaries() {
        assert_eq!(hsv_to_rgb(0.0, 1.0, 1.0), [255, 0, 0]);
        assert_eq!(hsv_to_rgb(120.0, 1.0, 1.0), [0, 255, 0]);
        assert_eq!(hsv_to_rgb(240.0, 1.0, 1.0), [0, 0, 255]);
        assert_eq!(hsv_to_rgb(360.0, 1.0, 1.0), [255, 0, 0]);
    }
}
