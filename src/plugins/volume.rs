use anyhow::Result;

use crate::audio::PlaybackEvent;
use crate::player::PlayerContext;

use super::{ControlKind, MarkupFragment, MountOptions, Plugin};

const STYLES: &str = "\
.volume-slider { width: 100px; height: 6px; border-radius: 3px; }\n\
.volume-fill { height: 100%; border-radius: 3px; }\n\
.volume-handle { width: 14px; height: 14px; border-radius: 50%; }\n\
.volume-label { font-size: 12px; min-width: 36px; text-align: right; }";

#[derive(Debug, Clone)]
pub struct VolumeOptions {
    pub initial_volume: f32,
    /// Show the percent readout next to the slider.
    pub volume_label: bool,
    pub selector: String,
}

impl Default for VolumeOptions {
    fn default() -> Self {
        Self {
            initial_volume: 1.0,
            volume_label: true,
            selector: ".container .controls".to_string(),
        }
    }
}

/// Volume control. Mounts the slider (and optional percent label), applies
/// the configured initial volume, and keeps both in sync with
/// `volumechange` events from any writer - slider drags, keyboard steps,
/// host calls.
pub struct VolumeSlider {
    options: VolumeOptions,
}

impl VolumeSlider {
    pub fn new(options: VolumeOptions) -> Self {
        Self { options }
    }

    fn percent_text(volume: f32) -> String {
        format!("{}%", (volume * 100.0).round() as u32)
    }

    fn sync(ctx: &mut PlayerContext, volume: f32) {
        ctx.markup
            .update_node("volume-slider", |node| node.value = volume);
        ctx.markup.update_node("volume-label", |node| {
            node.text = Some(Self::percent_text(volume))
        });
    }
}

impl Default for VolumeSlider {
    fn default() -> Self {
        Self::new(VolumeOptions::default())
    }
}

impl Plugin for VolumeSlider {
    fn id(&self) -> &'static str {
        "volume"
    }

    fn run(&mut self, ctx: &mut PlayerContext, first_run: bool) -> Result<()> {
        if first_run {
            ctx.markup.add_styles(self.id(), STYLES);
        }

        ctx.audio.set_volume(self.options.initial_volume);
        let volume = ctx.audio.volume();

        let mut slider = MarkupFragment::new("volume-slider", "volume-slider", ControlKind::VolumeSlider);
        slider.value = volume;
        ctx.markup
            .add_markup(slider, MountOptions::at(&self.options.selector));

        if self.options.volume_label {
            let mut label = MarkupFragment::new("volume-label", "volume-label", ControlKind::VolumeLabel);
            label.text = Some(Self::percent_text(volume));
            ctx.markup
                .add_markup(label, MountOptions::at(&self.options.selector));
        } else {
            // A re-run that disabled the label must also unmount it.
            ctx.markup.remove_markup("volume-label");
        }
        Ok(())
    }

    fn on_event(&mut self, ctx: &mut PlayerContext, event: &PlaybackEvent) {
        if let PlaybackEvent::VolumeChange(volume) = event {
            Self::sync(ctx, *volume);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plugins::PluginRegistry;

    #[test]
    fn test_initial_volume_is_clamped_and_shown() {
        let mut ctx = PlayerContext::detached();
        let mut registry = PluginRegistry::new();
        registry.register(
            &mut ctx,
            vec![Box::new(VolumeSlider::new(VolumeOptions {
                initial_volume: 2.5,
                ..VolumeOptions::default()
            }))],
        );

        assert_eq!(ctx.audio.volume(), 1.0);
        assert_eq!(ctx.markup.node("volume-slider").unwrap().value, 1.0);
        assert_eq!(
            ctx.markup.node("volume-label").unwrap().text.as_deref(),
            Some("100%")
        );
    }

    #[test]
    fn test_volume_events_update_markup() {
        let mut ctx = PlayerContext::detached();
        let mut registry = PluginRegistry::new();
        registry.register(&mut ctx, vec![Box::new(VolumeSlider::default())]);

        registry.dispatch(&mut ctx, &PlaybackEvent::VolumeChange(0.42));
        assert_eq!(ctx.markup.node("volume-slider").unwrap().value, 0.42);
        assert_eq!(
            ctx.markup.node("volume-label").unwrap().text.as_deref(),
            Some("42%")
        );
    }

    #[test]
    fn test_rerun_without_label_unmounts_it() {
        let mut ctx = PlayerContext::detached();
        let mut registry = PluginRegistry::new();
        registry.register(&mut ctx, vec![Box::new(VolumeSlider::default())]);
        assert_eq!(ctx.markup.count("volume-label"), 1);

        registry.register(
            &mut ctx,
            vec![Box::new(VolumeSlider::new(VolumeOptions {
                volume_label: false,
                ..VolumeOptions::default()
            }))],
        );
        assert_eq!(ctx.markup.count("volume-label"), 0);
        assert_eq!(ctx.markup.count("volume-slider"), 1);
    }
}
