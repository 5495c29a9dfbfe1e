/// Tuning for the per-bar smooth-then-peak pipeline.
#[derive(Debug, Clone, Copy)]
pub struct PeakParams {
    /// Exponential smoothing factor in (0, 1]; 1.0 disables smoothing.
    pub smoothing: f32,
    /// Ticks a fresh peak is held before decay starts.
    pub hold_ticks: u32,
    /// Geometric decay applied to the peak once the hold expires, in (0, 1).
    pub decay: f32,
    /// Amplitude of the random wobble added to a decaying peak; 0 disables.
    pub jitter: f32,
}

impl Default for PeakParams {
    fn default() -> Self {
        Self {
            smoothing: 0.3,
            hold_ticks: 45,
            decay: 0.95,
            jitter: 0.5,
        }
    }
}

/// Per-bar decaying peak tracker and exponential value smoother.
///
/// Pure numeric state: raw magnitudes go in once per tick, a stable bar
/// value and a slowly falling peak cap come out. The two stages together
/// keep jittery raw magnitudes from flickering the rendered bars, and the
/// hold keeps the cap pinned briefly after each rise.
pub struct BarStates {
    current: Vec<f32>,
    peak: Vec<f32>,
    hold: Vec<u32>,
    params: PeakParams,
    rng: fastrand::Rng,
}

impl BarStates {
    pub fn new(len: usize, params: PeakParams) -> Self {
        Self {
            current: vec![0.0; len],
            peak: vec![0.0; len],
            hold: vec![0; len],
            params,
            rng: fastrand::Rng::new(),
        }
    }

    /// Throw away all state and adopt a new bar count. Called whenever the
    /// surface resizes; nothing carries across.
    pub fn reset(&mut self, len: usize) {
        self.current.clear();
        self.current.resize(len, 0.0);
        self.peak.clear();
        self.peak.resize(len, 0.0);
        self.hold.clear();
        self.hold.resize(len, 0);
    }

    pub fn len(&self) -> usize {
        self.current.len()
    }

    pub fn is_empty(&self) -> bool {
        self.current.is_empty()
    }

    /// Advance bar `i` by one tick with raw value `raw`; returns the
    /// smoothed value to render.
    pub fn tick(&mut self, i: usize, raw: f32) -> f32 {
        let smoothed = self.current[i] + (raw - self.current[i]) * self.params.smoothing;
        self.current[i] = smoothed;

        if smoothed > self.peak[i] {
            self.peak[i] = smoothed;
            self.hold[i] = self.params.hold_ticks;
        } else if self.hold[i] > 0 {
            self.hold[i] -= 1;
        } else {
            self.peak[i] *= self.params.decay;
            if self.params.jitter > 0.0 {
                self.peak[i] += (self.rng.f32() - 0.5) * self.params.jitter;
            }
            // Jitter must never push a peak below zero.
            self.peak[i] = self.peak[i].max(0.0);
        }

        smoothed
    }

    pub fn value(&self, i: usize) -> f32 {
        self.current[i]
    }

    pub fn peak(&self, i: usize) -> f32 {
        self.peak[i]
    }

    pub fn hold(&self, i: usize) -> u32 {
        self.hold[i]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn no_jitter(smoothing: f32, hold_ticks: u32, decay: f32) -> PeakParams {
        PeakParams {
            smoothing,
            hold_ticks,
            decay,
            jitter: 0.0,
        }
    }

    #[test]
    fn test_peak_converges_and_hold_counts_down() {
        let hold = 30;
        let mut bars = BarStates::new(1, no_jitter(1.0, hold, 0.9));

        // First tick raises the peak and arms the hold.
        bars.tick(0, 200.0);
        assert_eq!(bars.peak(0), 200.0);
        assert_eq!(bars.hold(0), hold);

        // Constant input: no further increase, hold counts down one per
        // tick and reaches zero exactly `hold` ticks after the last rise.
        for expected in (0..hold).rev() {
            bars.tick(0, 200.0);
            assert_eq!(bars.hold(0), expected);
            assert_eq!(bars.peak(0), 200.0);
        }

        // Next tick starts geometric decay.
        bars.tick(0, 200.0);
        assert!((bars.peak(0) - 180.0).abs() < 1e-3);
    }

    #[test]
    fn test_smoothing_converges_to_input() {
        let mut bars = BarStates::new(1, no_jitter(0.3, 45, 0.95));
        let mut v = 0.0;
        for _ in 0..60 {
            v = bars.tick(0, 255.0);
        }
        assert!((v - 255.0).abs() < 0.01);
    }

    #[test]
    fn test_jitter_never_goes_negative() {
        let mut bars = BarStates::new(1, no_jitter(1.0, 0, 0.5));
        bars.params.jitter = 10.0;
        bars.tick(0, 0.01);
        for _ in 0..500 {
            bars.tick(0, 0.0);
            assert!(bars.peak(0) >= 0.0);
        }
    }

    #[test]
    fn test_reset_discards_state() {
        let mut bars = BarStates::new(4, PeakParams::default());
        for i in 0..4 {
            bars.tick(i, 100.0);
        }
        bars.reset(7);
        assert_eq!(bars.len(), 7);
        for i in 0..7 {
            assert_eq!(bars.value(i), 0.0);
            assert_eq!(bars.peak(i), 0.0);
            assert_eq!(bars.hold(i), 0);
        }
    }
}
