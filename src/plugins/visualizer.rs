use anyhow::Result;

use crate::player::PlayerContext;
use crate::viz::Visualizer;

use super::{ControlKind, MarkupFragment, MountOptions, Plugin};

const STYLES: &str = "\
.visualizer { width: 100%; height: 200px; }\n\
.visualizer canvas { width: 100%; height: 100%; }";

/// Mounts the raster canvas and installs the visualization rig (analyzer +
/// surface + active render algorithm) into the shared context. A re-run
/// rebuilds the rig from the current config, which doubles as a full state
/// reset.
#[derive(Default)]
pub struct VisualizerPanel;

impl VisualizerPanel {
    pub fn new() -> Self {
        Self
    }
}

impl Plugin for VisualizerPanel {
    fn id(&self) -> &'static str {
        "visualizer"
    }

    fn run(&mut self, ctx: &mut PlayerContext, first_run: bool) -> Result<()> {
        if first_run {
            ctx.markup.add_styles(self.id(), STYLES);
        }

        let mut canvas = MarkupFragment::new("visualizer-canvas", "visualizer", ControlKind::Canvas);
        canvas.state = Some(ctx.config.visualizer.label().to_string());
        ctx.markup.add_markup(canvas, MountOptions::default());

        let (width, height) = ctx.surface_size;
        ctx.visualizer = Some(Visualizer::new(&ctx.config, width, height)?);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plugins::PluginRegistry;
    use crate::viz::VisualizerKind;

    #[test]
    fn test_panel_installs_rig_and_canvas() {
        let mut ctx = PlayerContext::detached();
        let mut registry = PluginRegistry::new();
        registry.register(&mut ctx, vec![Box::new(VisualizerPanel::new())]);

        assert!(ctx.visualizer.is_some());
        assert_eq!(ctx.markup.count("visualizer-canvas"), 1);
        assert_eq!(
            ctx.visualizer.as_ref().unwrap().kind(),
            VisualizerKind::Spectrum
        );
    }

    #[test]
    fn test_bad_analyzer_config_is_contained() {
        let mut ctx = PlayerContext::detached();
        ctx.config.analyzer.fft_size = 1000;
        let mut registry = PluginRegistry::new();

        // The failure is logged by the registry; the shell stays alive and
        // the rig is simply absent.
        registry.register(&mut ctx, vec![Box::new(VisualizerPanel::new())]);
        assert!(ctx.visualizer.is_none());
    }
}
