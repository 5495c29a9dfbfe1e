pub mod markup;
pub mod play;
pub mod progress;
pub mod visualizer;
pub mod volume;

pub use markup::{ControlKind, MarkupFragment, MarkupScope, MountOptions};
pub use play::PlayButton;
pub use progress::ProgressBar;
pub use visualizer::VisualizerPanel;
pub use volume::{VolumeOptions, VolumeSlider};

use anyhow::Result;
use log::{debug, error};

use crate::audio::PlaybackEvent;
use crate::player::PlayerContext;

/// A self-contained feature module composed into the component.
///
/// `run` is invoked synchronously by the registry: with `first_run = true`
/// the first time its id is seen for a shell instance, `false` on every
/// later registration. Re-runs must be idempotent - markup and styles are
/// updated in place via the `MarkupScope` replace semantics, never
/// duplicated.
pub trait Plugin {
    fn id(&self) -> &'static str;

    fn run(&mut self, ctx: &mut PlayerContext, first_run: bool) -> Result<()>;

    /// Lifecycle events drained from the audio source, dispatched once per
    /// tick in mount order.
    fn on_event(&mut self, _ctx: &mut PlayerContext, _event: &PlaybackEvent) {}
}

struct PluginEntry {
    id: String,
    plugin: Box<dyn Plugin>,
    has_run: bool,
}

/// Tracks which plugin ids have already run for this shell instance and
/// keeps the live instances for event dispatch.
#[derive(Default)]
pub struct PluginRegistry {
    entries: Vec<PluginEntry>,
}

impl PluginRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run a batch of plugins in order, synchronously. A failing plugin is
    /// reported with its id and does not stop its siblings.
    pub fn register(&mut self, ctx: &mut PlayerContext, plugins: Vec<Box<dyn Plugin>>) {
        for mut plugin in plugins {
            let id = plugin.id().to_string();
            let first_run = !self.entries.iter().any(|e| e.id == id);
            debug!(
                "Running plugin '{}' ({})",
                id,
                if first_run { "first run" } else { "re-run" }
            );

            if let Err(e) = plugin.run(ctx, first_run) {
                error!("Plugin '{}' failed: {:#}", id, e);
            }

            match self.entries.iter_mut().find(|e| e.id == id) {
                Some(entry) => entry.plugin = plugin,
                None => self.entries.push(PluginEntry {
                    id,
                    plugin,
                    has_run: true,
                }),
            }
        }
    }

    pub fn dispatch(&mut self, ctx: &mut PlayerContext, event: &PlaybackEvent) {
        for entry in &mut self.entries {
            entry.plugin.on_event(ctx, event);
        }
    }

    pub fn has_run(&self, id: &str) -> bool {
        self.entries.iter().any(|e| e.id == id && e.has_run)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
