use anyhow::Result;
use clap::Parser;
use log::{error, info, warn};
use std::path::PathBuf;
use std::sync::Arc;
use winit::{
    event::{ElementState, Event, WindowEvent},
    event_loop::EventLoop,
    keyboard::{KeyCode, PhysicalKey},
    window::WindowBuilder,
};

use visual_player::audio::AudioSource;
use visual_player::config::PlayerConfig;
use visual_player::graphics::GraphicsEngine;
use visual_player::player::VisualPlayer;
use visual_player::plugins::{
    PlayButton, ProgressBar, VisualizerPanel, VolumeOptions, VolumeSlider,
};
use visual_player::ui::{UiAction, UserInterface};
use visual_player::viz::{PixelSurface, VisualizerKind};

#[derive(Parser)]
#[command(name = "visual-player", about = "Audio player with audio-reactive visualizations")]
struct Args {
    /// Audio file to play
    file: PathBuf,

    /// Visualizer to start with (overrides the config file)
    #[arg(long, value_enum)]
    visualizer: Option<VisualizerKind>,

    /// JSON config file with player tuning
    #[arg(long)]
    config: Option<PathBuf>,

    /// Initial volume in 0.0..=1.0
    #[arg(long)]
    volume: Option<f32>,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => PlayerConfig::load(path)?,
        None => PlayerConfig::default(),
    };
    if let Some(kind) = args.visualizer {
        config.visualizer = kind;
    }

    info!("Starting Visual Player");

    let event_loop = EventLoop::new()?;
    let window = Arc::new(
        WindowBuilder::new()
            .with_title("Visual Player")
            .with_inner_size(winit::dpi::LogicalSize::new(1200, 800))
            .build(&event_loop)?,
    );

    let mut graphics_engine = pollster::block_on(GraphicsEngine::new(&window))?;
    let mut ui = UserInterface::new(&window, &graphics_engine);

    let audio = match AudioSource::new() {
        Ok(audio) => audio,
        Err(e) => {
            warn!("No audio output device ({}), running detached", e);
            AudioSource::detached()
        }
    };

    let mut player = VisualPlayer::new(audio, config);
    player.register(vec![
        Box::new(PlayButton::new()),
        Box::new(VolumeSlider::new(VolumeOptions {
            initial_volume: args.volume.unwrap_or(1.0),
            ..VolumeOptions::default()
        })),
        Box::new(ProgressBar::new()),
        Box::new(VisualizerPanel::new()),
    ]);
    player.ctx_mut().audio.load_file(&args.file)?;

    let size = window.inner_size();
    player.resize_surface(size.width, size.height);
    player.toggle_play();

    info!("Player initialized");

    // Shown when the visualizer plugin could not install a rig.
    let blank = PixelSurface::new(1, 1);

    let window_clone = Arc::clone(&window);
    event_loop.run(move |event, elwt| {
        match event {
            Event::WindowEvent { event, .. } => match event {
                WindowEvent::CloseRequested => {
                    info!("Close requested");
                    elwt.exit();
                }
                WindowEvent::KeyboardInput { event: ref key, .. } => {
                    if key.state == ElementState::Pressed && !key.repeat {
                        match key.physical_key {
                            PhysicalKey::Code(KeyCode::Escape) => elwt.exit(),
                            PhysicalKey::Code(KeyCode::Space) => player.toggle_play(),
                            PhysicalKey::Code(KeyCode::ArrowUp) => player.step_volume(0.1),
                            PhysicalKey::Code(KeyCode::ArrowDown) => player.step_volume(-0.1),
                            PhysicalKey::Code(KeyCode::KeyM) => player.toggle_mute(),
                            PhysicalKey::Code(KeyCode::KeyS) => player.stop(),
                            PhysicalKey::Code(KeyCode::Digit1) => {
                                player.switch_visualizer(VisualizerKind::Spectrum)
                            }
                            PhysicalKey::Code(KeyCode::Digit2) => {
                                player.switch_visualizer(VisualizerKind::Waveform)
                            }
                            PhysicalKey::Code(KeyCode::Digit3) => {
                                player.switch_visualizer(VisualizerKind::Fire)
                            }
                            PhysicalKey::Code(KeyCode::Digit4) => {
                                player.switch_visualizer(VisualizerKind::Fractal)
                            }
                            _ => {}
                        }
                    }
                }
                WindowEvent::Resized(physical_size) => {
                    graphics_engine.resize(physical_size);
                    player.resize_surface(physical_size.width, physical_size.height);
                }
                WindowEvent::RedrawRequested => {
                    player.tick();
                    let result = {
                        let surface = player.surface().unwrap_or(&blank);
                        graphics_engine.render(surface, &mut ui, &window_clone, player.ctx())
                    };
                    match result {
                        Ok(actions) => {
                            for action in actions {
                                apply_action(&mut player, action);
                            }
                        }
                        Err(e) => error!("Render error: {}", e),
                    }
                }
                _ => {
                    ui.handle_event(&event, &window_clone);
                }
            },
            Event::AboutToWait => {
                window_clone.request_redraw();
            }
            _ => {}
        }
    })?;

    Ok(())
}

fn apply_action(player: &mut VisualPlayer, action: UiAction) {
    match action {
        UiAction::TogglePlay => player.toggle_play(),
        UiAction::SetVolume(volume) => player.set_volume(volume),
        UiAction::SeekFraction(fraction) => player.seek_fraction(fraction),
        UiAction::SwitchVisualizer(kind) => player.switch_visualizer(kind),
    }
}
