//! Error types
//!
//! Failures in the overlay are narrow: every per-frame path degrades
//! (no obstacles, skipped draw, dropped splash) instead of aborting.

use thiserror::Error;

/// Errors from the settings store.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SettingsError {
    /// No preset with this name exists.
    #[error("unknown preset: {0}")]
    UnknownPreset(String),
}

/// Errors loading or saving the overlay configuration file.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Reading or writing the file failed.
    #[error("config i/o failed: {0}")]
    Io(#[from] std::io::Error),

    /// The file did not contain valid configuration JSON.
    #[error("invalid config json: {0}")]
    Json(#[from] serde_json::Error),

    /// A preset named in the config does not exist.
    #[error(transparent)]
    Settings(#[from] SettingsError),
}

/// Errors from an obstacle provider query.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ObstacleError {
    /// The enumeration service could not be reached.
    #[error("obstacle service unavailable: {0}")]
    Unavailable(String),

    /// The service answered but the query failed.
    #[error("obstacle query failed: {0}")]
    QueryFailed(String),
}

/// Errors from the renderer.
#[derive(Error, Debug)]
pub enum RenderError {
    /// No presentable target this frame; the draw is skipped.
    #[error("render target unavailable")]
    SurfaceUnavailable,

    /// The surface reported an error acquiring a frame.
    #[error("surface error: {0}")]
    Surface(#[from] wgpu::SurfaceError),

    /// No GPU device could be created.
    #[error("device request failed: {0}")]
    Device(#[from] wgpu::RequestDeviceError),

    /// The surface exposes no usable texture format.
    #[error("surface has no supported formats")]
    NoSurfaceFormat,
}

impl RenderError {
    /// Whether the error only costs this frame's draw.
    pub fn is_transient(&self) -> bool {
        match self {
            RenderError::SurfaceUnavailable => true,
            RenderError::Surface(err) => !matches!(err, wgpu::SurfaceError::OutOfMemory),
            RenderError::Device(_) | RenderError::NoSurfaceFormat => false,
        }
    }
}
