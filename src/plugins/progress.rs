use anyhow::Result;

use crate::audio::{format_time, PlaybackEvent};
use crate::player::PlayerContext;

use super::{ControlKind, MarkupFragment, MountOptions, Plugin};

const STYLES: &str = "\
.progress-container { width: 100%; height: 6px; cursor: pointer; }\n\
.progress-bar { height: 100%; width: 0%; }\n\
.time-display { font-size: 12px; font-variant-numeric: tabular-nums; }";

const CONTAINER_SELECTOR: &str = ".container";

/// Progress fraction in 0..=100. A duration that is unknown, zero or
/// non-finite yields 0 - never NaN, never a division blow-up.
pub(crate) fn progress_percent(current: f32, duration: Option<f32>) -> f32 {
    match duration {
        Some(d) if d > 0.0 && d.is_finite() => (current / d * 100.0).clamp(0.0, 100.0),
        _ => 0.0,
    }
}

/// Seek bar plus elapsed/total time readout, driven by `timeupdate`.
#[derive(Default)]
pub struct ProgressBar;

impl ProgressBar {
    pub fn new() -> Self {
        Self
    }

    fn time_text(ctx: &PlayerContext, current: f32) -> String {
        let total = ctx
            .audio
            .duration()
            .map(format_time)
            .unwrap_or_else(|| "0:00".to_string());
        format!("{} / {}", format_time(current), total)
    }

    fn sync(ctx: &mut PlayerContext, current: f32) {
        let percent = progress_percent(current, ctx.audio.duration());
        let text = Self::time_text(ctx, current);
        ctx.markup
            .update_node("progress-bar", |node| node.value = percent);
        ctx.markup
            .update_node("time-display", |node| node.text = Some(text));
    }
}

impl Plugin for ProgressBar {
    fn id(&self) -> &'static str {
        "progress-bar"
    }

    fn run(&mut self, ctx: &mut PlayerContext, first_run: bool) -> Result<()> {
        if first_run {
            ctx.markup.add_styles(self.id(), STYLES);
        }

        let mut bar = MarkupFragment::new("progress-bar", "progress-bar", ControlKind::ProgressBar);
        bar.value = progress_percent(ctx.audio.current_time(), ctx.audio.duration());
        ctx.markup
            .add_markup(bar, MountOptions::at(CONTAINER_SELECTOR));

        let mut time = MarkupFragment::new("time-display", "time-display", ControlKind::TimeDisplay);
        time.text = Some(Self::time_text(ctx, ctx.audio.current_time()));
        ctx.markup
            .add_markup(time, MountOptions::at(CONTAINER_SELECTOR));
        Ok(())
    }

    fn on_event(&mut self, ctx: &mut PlayerContext, event: &PlaybackEvent) {
        match event {
            PlaybackEvent::TimeUpdate(t) => Self::sync(ctx, *t),
            PlaybackEvent::Ended => Self::sync(ctx, 0.0),
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plugins::PluginRegistry;

    #[test]
    fn test_percent_guards_unknown_duration() {
        assert_eq!(progress_percent(10.0, None), 0.0);
        assert_eq!(progress_percent(10.0, Some(0.0)), 0.0);
        assert_eq!(progress_percent(10.0, Some(f32::NAN)), 0.0);
        assert_eq!(progress_percent(30.0, Some(120.0)), 25.0);
        assert_eq!(progress_percent(500.0, Some(120.0)), 100.0);
    }

    #[test]
    fn test_timeupdate_drives_bar_and_display() {
        let mut ctx = PlayerContext::detached();
        ctx.audio.load_pcm(vec![0.0; 44100 * 120], 44100);
        let mut registry = PluginRegistry::new();
        registry.register(&mut ctx, vec![Box::new(ProgressBar::new())]);

        registry.dispatch(&mut ctx, &PlaybackEvent::TimeUpdate(30.0));
        assert_eq!(ctx.markup.node("progress-bar").unwrap().value, 25.0);
        assert_eq!(
            ctx.markup.node("time-display").unwrap().text.as_deref(),
            Some("0:30 / 2:00")
        );

        registry.dispatch(&mut ctx, &PlaybackEvent::Ended);
        assert_eq!(ctx.markup.node("progress-bar").unwrap().value, 0.0);
    }

    #[test]
    fn test_unknown_duration_renders_zero() {
        let mut ctx = PlayerContext::detached();
        let mut registry = PluginRegistry::new();
        registry.register(&mut ctx, vec![Box::new(ProgressBar::new())]);

        registry.dispatch(&mut ctx, &PlaybackEvent::TimeUpdate(10.0));
        assert_eq!(ctx.markup.node("progress-bar").unwrap().value, 0.0);
        assert_eq!(
            ctx.markup.node("time-display").unwrap().text.as_deref(),
            Some("0:10 / 0:00")
        );
    }
}
