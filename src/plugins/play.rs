use anyhow::Result;

use crate::audio::PlaybackEvent;
use crate::player::PlayerContext;

use super::{ControlKind, MarkupFragment, MountOptions, Plugin};

const STYLES: &str = "\
.play-button { width: 40px; height: 40px; border-radius: 50%; border: none; }\n\
.play-button svg { width: 24px; height: 24px; fill: currentColor; }";

const CONTROLS_SELECTOR: &str = ".container .controls";

/// Transport toggle. Mounts the play/pause button and keeps its icon state
/// in sync with the audio lifecycle.
#[derive(Default)]
pub struct PlayButton;

impl PlayButton {
    pub fn new() -> Self {
        Self
    }

    fn set_state(ctx: &mut PlayerContext, state: &str) {
        ctx.markup
            .update_node("play-button", |node| node.state = Some(state.to_string()));
    }
}

impl Plugin for PlayButton {
    fn id(&self) -> &'static str {
        "play"
    }

    fn run(&mut self, ctx: &mut PlayerContext, first_run: bool) -> Result<()> {
        if first_run {
            ctx.markup.add_styles(self.id(), STYLES);
        }

        let mut fragment = MarkupFragment::new("play-button", "play-button", ControlKind::PlayButton);
        fragment.state = Some(if ctx.audio.paused() { "paused" } else { "playing" }.to_string());
        ctx.markup
            .add_markup(fragment, MountOptions::at(CONTROLS_SELECTOR));
        Ok(())
    }

    fn on_event(&mut self, ctx: &mut PlayerContext, event: &PlaybackEvent) {
        match event {
            PlaybackEvent::Play => Self::set_state(ctx, "playing"),
            PlaybackEvent::Pause | PlaybackEvent::Ended => Self::set_state(ctx, "paused"),
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plugins::PluginRegistry;

    #[test]
    fn test_button_tracks_lifecycle() {
        let mut ctx = PlayerContext::detached();
        let mut registry = PluginRegistry::new();
        registry.register(&mut ctx, vec![Box::new(PlayButton::new())]);

        assert_eq!(
            ctx.markup.node("play-button").unwrap().state.as_deref(),
            Some("paused")
        );

        registry.dispatch(&mut ctx, &PlaybackEvent::Play);
        assert_eq!(
            ctx.markup.node("play-button").unwrap().state.as_deref(),
            Some("playing")
        );

        registry.dispatch(&mut ctx, &PlaybackEvent::Ended);
        assert_eq!(
            ctx.markup.node("play-button").unwrap().state.as_deref(),
            Some("paused")
        );
    }
}
