use anyhow::Result;
use crossbeam_channel::{Receiver, Sender};
use log::{info, warn};
use rodio::{Decoder, OutputStream, OutputStreamHandle, Sink, Source};
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use super::{clamp_volume, PlaybackEvent};

/// Minimum spacing between TimeUpdate events, in seconds.
const TIMEUPDATE_INTERVAL: f32 = 0.25;

/// Wall-clock transport position, advanced only while playing.
///
/// rodio does not report the sink position, so the adapter keeps its own
/// clock: `base` seconds accumulated up to the last transport change, plus
/// elapsed wall time scaled by the playback rate while running.
struct TransportClock {
    base: f32,
    started: Option<Instant>,
    rate: f32,
}

impl TransportClock {
    fn new() -> Self {
        Self {
            base: 0.0,
            started: None,
            rate: 1.0,
        }
    }

    fn position(&self) -> f32 {
        match self.started {
            Some(at) => self.base + at.elapsed().as_secs_f32() * self.rate,
            None => self.base,
        }
    }

    fn run(&mut self) {
        if self.started.is_none() {
            self.started = Some(Instant::now());
        }
    }

    fn halt(&mut self) {
        self.base = self.position();
        self.started = None;
    }

    fn set(&mut self, seconds: f32) {
        self.base = seconds.max(0.0);
        if self.started.is_some() {
            self.started = Some(Instant::now());
        }
    }

    fn set_rate(&mut self, rate: f32) {
        // Rebase so the position stays continuous across a rate change.
        self.base = self.position();
        if self.started.is_some() {
            self.started = Some(Instant::now());
        }
        self.rate = rate;
    }
}

/// Owns the playable stream and exposes the transport surface the component
/// shell and plugins talk to: play/pause/stop/seek, volume, current time,
/// duration, plus lifecycle events drained once per tick.
///
/// The audio file is decoded twice: once into a mono f32 buffer that the
/// frequency analyzer taps non-destructively, once into the rodio sink for
/// actual output. When no output device is available the source runs in
/// detached mode - every transport operation still updates state and emits
/// events, nothing errors.
pub struct AudioSource {
    output: Option<(OutputStream, OutputStreamHandle)>,
    sink: Option<Sink>,
    path: Option<PathBuf>,
    samples: Arc<Vec<f32>>,
    sample_rate: u32,
    duration: Option<f32>,
    volume: f32,
    muted: bool,
    playback_rate: f32,
    paused: bool,
    clock: TransportClock,
    last_timeupdate: f32,
    events_tx: Sender<PlaybackEvent>,
    events_rx: Receiver<PlaybackEvent>,
}

impl AudioSource {
    pub fn new() -> Result<Self> {
        let (stream, handle) = OutputStream::try_default()?;
        let mut source = Self::detached();
        source.output = Some((stream, handle));
        Ok(source)
    }

    /// Construct without an output device. Used directly by tests and as the
    /// degraded mode when `new()` cannot reach an audio backend.
    pub fn detached() -> Self {
        let (events_tx, events_rx) = crossbeam_channel::unbounded();
        Self {
            output: None,
            sink: None,
            path: None,
            samples: Arc::new(Vec::new()),
            sample_rate: 44100,
            duration: None,
            volume: 1.0,
            muted: false,
            playback_rate: 1.0,
            paused: true,
            clock: TransportClock::new(),
            last_timeupdate: 0.0,
            events_tx,
            events_rx,
        }
    }

    pub fn load_file<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        let file = BufReader::new(File::open(&path)?);
        let source = Decoder::new(file)?;

        self.sample_rate = source.sample_rate();
        let channels = source.channels();
        let reported = source.total_duration().map(|d| d.as_secs_f32());

        // Mono mixdown for the analyzer's non-destructive tap.
        let samples: Vec<i16> = source.convert_samples().collect();
        let mono: Vec<f32> = samples
            .chunks_exact(channels as usize)
            .map(|chunk| {
                let sum: f32 = chunk.iter().map(|&s| s as f32 / 32768.0).sum();
                sum / channels as f32
            })
            .collect();

        self.duration = reported.or_else(|| {
            if mono.is_empty() {
                None
            } else {
                Some(mono.len() as f32 / self.sample_rate as f32)
            }
        });
        self.samples = Arc::new(mono);
        self.path = Some(path.as_ref().to_path_buf());
        self.clock = TransportClock::new();
        self.clock.set_rate(self.playback_rate);
        self.paused = true;
        self.last_timeupdate = 0.0;

        // Second decode feeds the sink; the first was consumed above.
        if let Some((_, handle)) = &self.output {
            let file = BufReader::new(File::open(&path)?);
            let source = Decoder::new(file)?;
            let sink = Sink::try_new(handle)?;
            sink.append(source);
            sink.pause();
            sink.set_volume(self.effective_volume());
            sink.set_speed(self.playback_rate);
            self.sink = Some(sink);
        }

        info!(
            "Loaded {:?} ({} Hz, {} samples, duration {:?})",
            path.as_ref(),
            self.sample_rate,
            self.samples.len(),
            self.duration
        );
        Ok(())
    }

    /// Feed pre-decoded mono PCM instead of a file. Hosts that already hold
    /// raw samples (and the test suite) use this in detached mode.
    pub fn load_pcm(&mut self, samples: Vec<f32>, sample_rate: u32) {
        self.sample_rate = sample_rate.max(1);
        self.duration = if samples.is_empty() {
            None
        } else {
            Some(samples.len() as f32 / self.sample_rate as f32)
        };
        self.samples = Arc::new(samples);
        self.path = None;
        self.clock = TransportClock::new();
        self.clock.set_rate(self.playback_rate);
        self.paused = true;
        self.last_timeupdate = 0.0;
    }

    pub fn play(&mut self) {
        if !self.paused {
            return;
        }
        if let Some(sink) = &self.sink {
            if sink.empty() {
                // Natural end drained the queue; re-append for replay.
                if let Err(e) = self.reload_sink() {
                    warn!("Replay reload failed: {}", e);
                }
            }
        }
        if let Some(sink) = &self.sink {
            sink.play();
        }
        self.paused = false;
        self.clock.run();
        self.emit(PlaybackEvent::Play);
    }

    pub fn pause(&mut self) {
        if self.paused {
            return;
        }
        if let Some(sink) = &self.sink {
            sink.pause();
        }
        self.paused = true;
        self.clock.halt();
        self.emit(PlaybackEvent::Pause);
    }

    /// Pause and rewind to the start.
    pub fn stop(&mut self) {
        self.pause();
        self.seek(0.0);
    }

    pub fn seek(&mut self, seconds: f32) {
        let target = match self.duration {
            Some(d) => seconds.clamp(0.0, d),
            None => seconds.max(0.0),
        };
        if let Some(sink) = &self.sink {
            if let Err(e) = sink.try_seek(std::time::Duration::from_secs_f32(target)) {
                warn!("Seek to {:.2}s failed: {}", target, e);
            }
        }
        self.clock.set(target);
        self.last_timeupdate = target;
        self.emit(PlaybackEvent::TimeUpdate(target));
    }

    pub fn volume(&self) -> f32 {
        self.volume
    }

    pub fn set_volume(&mut self, volume: f32) {
        self.volume = clamp_volume(volume);
        if let Some(sink) = &self.sink {
            sink.set_volume(self.effective_volume());
        }
        self.emit(PlaybackEvent::VolumeChange(self.volume));
    }

    pub fn muted(&self) -> bool {
        self.muted
    }

    pub fn set_muted(&mut self, muted: bool) {
        self.muted = muted;
        if let Some(sink) = &self.sink {
            sink.set_volume(self.effective_volume());
        }
        self.emit(PlaybackEvent::VolumeChange(self.volume));
    }

    pub fn playback_rate(&self) -> f32 {
        self.playback_rate
    }

    pub fn set_playback_rate(&mut self, rate: f32) {
        if rate <= 0.0 {
            warn!("Ignoring non-positive playback rate {}", rate);
            return;
        }
        self.playback_rate = rate;
        self.clock.set_rate(rate);
        if let Some(sink) = &self.sink {
            sink.set_speed(rate);
        }
    }

    pub fn paused(&self) -> bool {
        self.paused
    }

    pub fn current_time(&self) -> f32 {
        let pos = self.clock.position();
        match self.duration {
            Some(d) => pos.min(d),
            None => pos,
        }
    }

    /// None means the duration is unknown (nothing loaded); progress
    /// calculations must not divide by it.
    pub fn duration(&self) -> Option<f32> {
        self.duration
    }

    /// The mono analysis buffer the frequency analyzer taps. The signal
    /// keeps flowing to the output unmodified.
    pub fn samples(&self) -> &Arc<Vec<f32>> {
        &self.samples
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Per-tick bookkeeping: end-of-stream detection and throttled
    /// TimeUpdate emission. Called once per tick by the component shell.
    pub fn update(&mut self) {
        if self.paused {
            return;
        }

        let pos = self.current_time();
        if pos - self.last_timeupdate >= TIMEUPDATE_INTERVAL {
            self.last_timeupdate = pos;
            self.emit(PlaybackEvent::TimeUpdate(pos));
        }

        let ended = match (&self.sink, self.duration) {
            (Some(sink), _) => sink.empty(),
            (None, Some(d)) => pos >= d,
            (None, None) => false,
        };
        if ended {
            self.paused = true;
            self.clock.halt();
            self.clock.set(0.0);
            self.last_timeupdate = 0.0;
            self.emit(PlaybackEvent::Ended);
        }
    }

    /// Drain every event emitted since the previous tick, in order.
    pub fn drain_events(&mut self) -> Vec<PlaybackEvent> {
        self.events_rx.try_iter().collect()
    }

    fn effective_volume(&self) -> f32 {
        if self.muted {
            0.0
        } else {
            self.volume
        }
    }

    fn reload_sink(&mut self) -> Result<()> {
        let path = self
            .path
            .clone()
            .ok_or_else(|| anyhow::anyhow!("No source file to replay"))?;
        let handle = match &self.output {
            Some((_, handle)) => handle,
            None => return Ok(()),
        };
        let file = BufReader::new(File::open(&path)?);
        let source = Decoder::new(file)?;
        let sink = Sink::try_new(handle)?;
        sink.append(source);
        sink.set_volume(self.effective_volume());
        sink.set_speed(self.playback_rate);
        self.sink = Some(sink);
        self.clock.set(0.0);
        Ok(())
    }

    fn emit(&self, event: PlaybackEvent) {
        let _ = self.events_tx.send(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_volume_stays_clamped() {
        let mut audio = AudioSource::detached();
        audio.set_volume(1.8);
        assert_eq!(audio.volume(), 1.0);
        audio.set_volume(-0.2);
        assert_eq!(audio.volume(), 0.0);
        audio.set_volume(0.65);
        assert!((audio.volume() - 0.65).abs() < f32::EPSILON);
    }

    #[test]
    fn test_detached_transport_events() {
        let mut audio = AudioSource::detached();
        audio.load_pcm(vec![0.0; 44100], 44100);
        audio.play();
        audio.pause();
        audio.set_volume(0.5);

        let events = audio.drain_events();
        assert_eq!(
            events,
            vec![
                PlaybackEvent::Play,
                PlaybackEvent::Pause,
                PlaybackEvent::VolumeChange(0.5),
            ]
        );
        // Drained; a second call sees nothing new.
        assert!(audio.drain_events().is_empty());
    }

    #[test]
    fn test_seek_clamps_to_duration() {
        let mut audio = AudioSource::detached();
        audio.load_pcm(vec![0.0; 88200], 44100);
        assert_eq!(audio.duration(), Some(2.0));

        audio.seek(10.0);
        assert_eq!(audio.current_time(), 2.0);
        audio.seek(-5.0);
        assert_eq!(audio.current_time(), 0.0);
    }

    #[test]
    fn test_stop_rewinds() {
        let mut audio = AudioSource::detached();
        audio.load_pcm(vec![0.0; 44100], 44100);
        audio.seek(0.5);
        audio.play();
        audio.stop();
        assert!(audio.paused());
        assert_eq!(audio.current_time(), 0.0);
    }

    #[test]
    fn test_duration_unknown_without_media() {
        let audio = AudioSource::detached();
        assert_eq!(audio.duration(), None);
        assert_eq!(audio.current_time(), 0.0);
    }

    #[test]
    fn test_playback_rate_guard() {
        let mut audio = AudioSource::detached();
        audio.set_playback_rate(0.0);
        assert_eq!(audio.playback_rate(), 1.0);
        audio.set_playback_rate(1.5);
        assert_eq!(audio.playback_rate(), 1.5);
    }
}
