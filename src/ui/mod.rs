use anyhow::Result;
use egui_wgpu::Renderer;
use egui_winit::State;
use wgpu::{CommandEncoder, Device, Queue, TextureView};
use winit::{event::WindowEvent, window::Window};

use crate::graphics::GraphicsEngine;
use crate::player::PlayerContext;
use crate::plugins::ControlKind;
use crate::viz::VisualizerKind;

/// Interactions collected from the overlay, applied to the player by the
/// host loop after the frame is presented.
#[derive(Debug, Clone, PartialEq)]
pub enum UiAction {
    TogglePlay,
    SetVolume(f32),
    SeekFraction(f32),
    SwitchVisualizer(VisualizerKind),
}

/// egui overlay that draws whatever controls the plugins mounted into the
/// markup scope, in mount order. A control whose markup is absent is not
/// drawn at all - composition happens in the plugin layer, not here.
pub struct UserInterface {
    context: egui::Context,
    state: State,
    renderer: Renderer,
    show_controls: bool,
}

impl UserInterface {
    pub fn new(window: &Window, graphics_engine: &GraphicsEngine) -> Self {
        let context = egui::Context::default();

        let egui_state = State::new(
            context.clone(),
            egui::ViewportId::ROOT,
            &window,
            None,
            None,
        );

        let renderer = Renderer::new(
            &graphics_engine.device,
            graphics_engine.config.format,
            None,
            1,
        );

        Self {
            context,
            state: egui_state,
            renderer,
            show_controls: true,
        }
    }

    pub fn handle_event(&mut self, event: &WindowEvent, window: &Window) {
        let _ = self.state.on_window_event(window, event);
    }

    pub fn render(
        &mut self,
        encoder: &mut CommandEncoder,
        target: &TextureView,
        device: &Device,
        queue: &Queue,
        window: &Window,
        player: &PlayerContext,
    ) -> Result<Vec<UiAction>> {
        let raw_input = self.state.take_egui_input(window);

        let mut actions = Vec::new();
        let show_controls = &mut self.show_controls;

        let full_output = self.context.run(raw_input, |ctx| {
            Self::ui_content(ctx, player, show_controls, &mut actions);
        });

        self.state
            .handle_platform_output(window, full_output.platform_output);

        let tris = self
            .context
            .tessellate(full_output.shapes, full_output.pixels_per_point);

        for (id, image_delta) in &full_output.textures_delta.set {
            self.renderer.update_texture(device, queue, *id, image_delta);
        }

        let size = window.inner_size();
        let screen_descriptor = egui_wgpu::ScreenDescriptor {
            size_in_pixels: [size.width, size.height],
            pixels_per_point: full_output.pixels_per_point,
        };

        self.renderer
            .update_buffers(device, queue, encoder, &tris, &screen_descriptor);

        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("egui render pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: target,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Load,
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                occlusion_query_set: None,
                timestamp_writes: None,
            });

            self.renderer.render(&mut render_pass, &tris, &screen_descriptor);
        }

        for id in &full_output.textures_delta.free {
            self.renderer.free_texture(id);
        }

        Ok(actions)
    }

    fn ui_content(
        ctx: &egui::Context,
        player: &PlayerContext,
        show_controls: &mut bool,
        actions: &mut Vec<UiAction>,
    ) {
        if ctx.input(|i| i.key_pressed(egui::Key::F1)) {
            *show_controls = !*show_controls;
        }
        if !*show_controls {
            return;
        }

        egui::Window::new("Player")
            .default_pos([10.0, 10.0])
            .default_size([320.0, 180.0])
            .show(ctx, |ui| {
                for node in player.markup.nodes() {
                    match node.kind {
                        ControlKind::PlayButton => {
                            let playing = node.state.as_deref() == Some("playing");
                            let label = if playing { "Pause" } else { "Play" };
                            if ui.button(label).clicked() {
                                actions.push(UiAction::TogglePlay);
                            }
                        }
                        ControlKind::VolumeSlider => {
                            let mut volume = player.audio.volume();
                            ui.horizontal(|ui| {
                                ui.label("Volume:");
                                if ui
                                    .add(egui::Slider::new(&mut volume, 0.0..=1.0).show_value(false))
                                    .changed()
                                {
                                    actions.push(UiAction::SetVolume(volume));
                                }
                            });
                        }
                        ControlKind::VolumeLabel => {
                            if let Some(text) = &node.text {
                                ui.label(text);
                            }
                        }
                        ControlKind::ProgressBar => {
                            let mut fraction = node.value / 100.0;
                            if ui
                                .add(egui::Slider::new(&mut fraction, 0.0..=1.0).show_value(false))
                                .changed()
                            {
                                actions.push(UiAction::SeekFraction(fraction));
                            }
                        }
                        ControlKind::TimeDisplay => {
                            if let Some(text) = &node.text {
                                ui.label(text);
                            }
                        }
                        ControlKind::Canvas => {
                            ui.separator();
                            ui.label("Visualizer:");
                            let mut kind = player.config.visualizer;
                            for candidate in VisualizerKind::ALL {
                                ui.radio_value(&mut kind, candidate, candidate.label());
                            }
                            if kind != player.config.visualizer {
                                actions.push(UiAction::SwitchVisualizer(kind));
                            }
                        }
                    }
                }

                ui.separator();
                ui.label("Space: play/pause, arrows: volume, 1-4: visualizer");
            });
    }
}
