use log::info;

use crate::audio::AudioSource;
use crate::config::PlayerConfig;
use crate::plugins::{MarkupScope, Plugin, PluginRegistry};
use crate::viz::{PixelSurface, Visualizer, VisualizerKind};

/// Default raster surface size before the host reports real dimensions.
const DEFAULT_SURFACE: (u32, u32) = (800, 200);

/// The shared state every plugin mutates: the audio handle, the isolated
/// markup/style scope, the visualization rig (once the visualizer plugin
/// installed it) and the player config. Threaded explicitly through every
/// plugin call - there is no ambient/global state.
pub struct PlayerContext {
    pub audio: AudioSource,
    pub markup: MarkupScope,
    pub visualizer: Option<Visualizer>,
    pub config: PlayerConfig,
    pub surface_size: (u32, u32),
}

impl PlayerContext {
    pub fn new(audio: AudioSource, config: PlayerConfig) -> Self {
        Self {
            audio,
            markup: MarkupScope::new(),
            visualizer: None,
            config,
            surface_size: DEFAULT_SURFACE,
        }
    }

    /// Context over a device-less audio source; the degraded construction
    /// path and the one the test suite uses.
    pub fn detached() -> Self {
        Self::new(AudioSource::detached(), PlayerConfig::default())
    }
}

/// The component shell: owns the context and the plugin registry, and runs
/// the per-frame tick the host's frame clock drives. Interactions arrive
/// through explicit setter methods; there is no observer machinery.
pub struct VisualPlayer {
    ctx: PlayerContext,
    registry: PluginRegistry,
}

impl VisualPlayer {
    pub fn new(audio: AudioSource, config: PlayerConfig) -> Self {
        Self {
            ctx: PlayerContext::new(audio, config),
            registry: PluginRegistry::new(),
        }
    }

    /// Compose plugins into the component. May be called repeatedly; the
    /// registry downgrades repeated ids to idempotent re-runs.
    pub fn register(&mut self, plugins: Vec<Box<dyn Plugin>>) {
        self.registry.register(&mut self.ctx, plugins);
    }

    /// One animation tick: pump the audio lifecycle, dispatch the drained
    /// events to every plugin in mount order, then let the active render
    /// algorithm paint exactly one frame.
    pub fn tick(&mut self) {
        self.ctx.audio.update();
        for event in self.ctx.audio.drain_events() {
            self.registry.dispatch(&mut self.ctx, &event);
        }
        if let Some(viz) = &mut self.ctx.visualizer {
            viz.tick(&self.ctx.audio);
        }
    }

    pub fn toggle_play(&mut self) {
        if self.ctx.audio.paused() {
            self.ctx.audio.play();
        } else {
            self.ctx.audio.pause();
        }
    }

    pub fn stop(&mut self) {
        self.ctx.audio.stop();
    }

    pub fn set_volume(&mut self, volume: f32) {
        self.ctx.audio.set_volume(volume);
    }

    /// Keyboard-style volume stepping; the setter clamps.
    pub fn step_volume(&mut self, delta: f32) {
        let volume = self.ctx.audio.volume() + delta;
        self.ctx.audio.set_volume(volume);
    }

    pub fn toggle_mute(&mut self) {
        let muted = self.ctx.audio.muted();
        self.ctx.audio.set_muted(!muted);
    }

    /// Seek to a fraction of the known duration; ignored while the
    /// duration is unknown.
    pub fn seek_fraction(&mut self, fraction: f32) {
        if let Some(duration) = self.ctx.audio.duration() {
            self.ctx.audio.seek(fraction.clamp(0.0, 1.0) * duration);
        }
    }

    /// Swap the active render algorithm. The rig fully resets the incoming
    /// algorithm's state before its first tick.
    pub fn switch_visualizer(&mut self, kind: VisualizerKind) {
        self.ctx.config.visualizer = kind;
        if let Some(viz) = &mut self.ctx.visualizer {
            viz.switch(kind, &self.ctx.config);
        }
        self.ctx
            .markup
            .update_node("visualizer-canvas", |node| {
                node.state = Some(kind.label().to_string())
            });
    }

    /// The host surface changed size: all per-algorithm derived state is
    /// recomputed before the next tick.
    pub fn resize_surface(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        self.ctx.surface_size = (width, height);
        if let Some(viz) = &mut self.ctx.visualizer {
            viz.resize(width, height);
        }
        info!("Surface resized to {}x{}", width, height);
    }

    pub fn surface(&self) -> Option<&PixelSurface> {
        self.ctx.visualizer.as_ref().map(|v| v.surface())
    }

    pub fn ctx(&self) -> &PlayerContext {
        &self.ctx
    }

    pub fn ctx_mut(&mut self) -> &mut PlayerContext {
        &mut self.ctx
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plugins::{PlayButton, ProgressBar, VisualizerPanel, VolumeSlider};

    fn full_player() -> VisualPlayer {
        let mut player = VisualPlayer::new(AudioSource::detached(), PlayerConfig::default());
        player.register(vec![
            Box::new(PlayButton::new()),
            Box::new(VolumeSlider::default()),
            Box::new(ProgressBar::new()),
            Box::new(VisualizerPanel::new()),
        ]);
        player
    }

    #[test]
    fn test_double_registration_is_idempotent() {
        let mut player = full_player();
        player.register(vec![
            Box::new(PlayButton::new()),
            Box::new(VolumeSlider::default()),
            Box::new(ProgressBar::new()),
            Box::new(VisualizerPanel::new()),
        ]);

        let markup = &player.ctx().markup;
        for id in [
            "play-button",
            "volume-slider",
            "volume-label",
            "progress-bar",
            "time-display",
            "visualizer-canvas",
        ] {
            assert_eq!(markup.count(id), 1, "duplicate markup for {}", id);
        }
    }

    #[test]
    fn test_transport_events_reach_plugins_on_tick() {
        let mut player = full_player();
        player.ctx_mut().audio.load_pcm(vec![0.0; 44100], 44100);

        player.toggle_play();
        player.tick();
        assert_eq!(
            player.ctx().markup.node("play-button").unwrap().state.as_deref(),
            Some("playing")
        );

        player.toggle_play();
        player.tick();
        assert_eq!(
            player.ctx().markup.node("play-button").unwrap().state.as_deref(),
            Some("paused")
        );
    }

    #[test]
    fn test_volume_step_is_clamped_and_reflected() {
        let mut player = full_player();
        player.set_volume(0.95);
        player.step_volume(0.1);
        player.tick();

        assert_eq!(player.ctx().audio.volume(), 1.0);
        assert_eq!(
            player.ctx().markup.node("volume-label").unwrap().text.as_deref(),
            Some("100%")
        );
    }

    #[test]
    fn test_switch_visualizer_updates_rig_and_markup() {
        let mut player = full_player();
        player.switch_visualizer(VisualizerKind::Fractal);

        assert_eq!(
            player.ctx().visualizer.as_ref().unwrap().kind(),
            VisualizerKind::Fractal
        );
        assert_eq!(
            player
                .ctx()
                .markup
                .node("visualizer-canvas")
                .unwrap()
                .state
                .as_deref(),
            Some("Fractal Zoom")
        );
    }

    #[test]
    fn test_resize_propagates_to_surface() {
        let mut player = full_player();
        player.resize_surface(640, 360);
        assert_eq!(player.surface().unwrap().width(), 640);
        assert_eq!(player.surface().unwrap().height(), 360);

        // Degenerate sizes are ignored rather than allocating a 0x0 target.
        player.resize_surface(0, 100);
        assert_eq!(player.surface().unwrap().width(), 640);
    }

    #[test]
    fn test_seek_fraction_needs_known_duration() {
        let mut player = full_player();
        player.seek_fraction(0.5);
        assert_eq!(player.ctx().audio.current_time(), 0.0);

        player.ctx_mut().audio.load_pcm(vec![0.0; 88200], 44100);
        player.seek_fraction(0.5);
        assert_eq!(player.ctx().audio.current_time(), 1.0);
    }

    #[test]
    fn test_tick_renders_with_active_rig() {
        let mut player = full_player();
        player.resize_surface(320, 120);
        player.ctx_mut().audio.load_pcm(vec![0.1; 44100], 44100);
        player.tick();
        assert_eq!(player.surface().unwrap().width(), 320);
    }
}
