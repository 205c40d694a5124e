//! Rain Overlay - falling rain over the desktop
//!
//! Core modules:
//! - `sim`: Particle pools, spawn policy, physics and collision response
//! - `obstacles`: Dock/window rectangles and the throttled obstacle cache
//! - `settings`: Live-tunable settings, presets and the shared settings store
//! - `driver`: Per-refresh frame driver (obstacles → physics → buffers → draw)
//! - `renderer`: Instance buffer builder and the WebGPU instanced renderer
//! - `audio`: Settings-driven audio cues for a host synthesizer

pub mod audio;
pub mod config;
pub mod driver;
pub mod error;
pub mod obstacles;
pub mod renderer;
pub mod settings;
pub mod sim;

pub use config::OverlayConfig;
pub use driver::{DrawableSize, FrameDriver, FrameReport};
pub use error::{ConfigError, ObstacleError, RenderError, SettingsError};
pub use obstacles::{ObstacleProvider, Rect};
pub use settings::{Preset, Settings, SettingsStore, SoundProfile};

/// Overlay configuration constants
pub mod consts {
    /// Raindrop population at intensity 1.0 on a reference-width display
    pub const BASE_DROP_COUNT: usize = 400;
    /// Highest intensity multiplier the settings accept
    pub const MAX_INTENSITY: f32 = 3.0;
    /// Lowest intensity multiplier the settings accept
    pub const MIN_INTENSITY: f32 = 0.1;
    /// Raindrop pool capacity (never grows)
    pub const MAX_RAINDROPS: usize = (BASE_DROP_COUNT as f32 * MAX_INTENSITY) as usize;
    /// Splash pool capacity (never grows)
    pub const MAX_SPLASHES: usize = 1024;
    /// Display width at which the base population applies in full
    pub const REFERENCE_WIDTH: f32 = 1440.0;

    /// Largest timestep fed to the physics engine
    pub const MAX_DT: f32 = 1.0 / 30.0;
    /// Minimum interval between obstacle queries (seconds)
    pub const OBSTACLE_REFRESH_SECS: f64 = 0.1;

    /// Wind velocity per unit of direction setting (units/s)
    pub const WIND_PER_DIRECTION: f32 = 20.0;
    /// Direction setting bounds
    pub const MAX_DIRECTION: f32 = 15.0;
}
