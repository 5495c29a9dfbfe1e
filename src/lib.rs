//! Embeddable audio player with plugin-composed controls and
//! audio-reactive visualizations.
//!
//! The component shell ([`player::VisualPlayer`]) owns the audio source and
//! the shared state plugins mutate; optional controls (play button, volume
//! slider, progress bar, visualizer) are composed in through the plugin
//! registry. The visualizer renders spectrum bars, a waveform, a fire
//! automaton or a fractal zoom onto a CPU raster surface once per host
//! frame tick.

pub mod audio;
pub mod config;
pub mod graphics;
pub mod player;
pub mod plugins;
pub mod ui;
pub mod viz;

pub use audio::AudioSource;
pub use config::PlayerConfig;
pub use player::{PlayerContext, VisualPlayer};
pub use plugins::Plugin;
pub use viz::VisualizerKind;
