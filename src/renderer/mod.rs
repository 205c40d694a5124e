//! Instanced rendering
//!
//! The builder turns pool state into tightly packed instance arrays; a
//! [`DrawSink`] consumes them. `RainRenderer` is the WebGPU sink.

pub mod instance;
pub mod pipeline;

pub use instance::{Globals, InstanceBuffers, InstanceFrame, RaindropInstance, SplashInstance};
pub use pipeline::RainRenderer;

use crate::error::RenderError;

/// Destination for a built frame
///
/// Returning [`RenderError::SurfaceUnavailable`] (or any transient error)
/// skips this frame's draw; the simulation has already advanced.
pub trait DrawSink {
    fn draw(&mut self, frame: &InstanceFrame<'_>) -> Result<(), RenderError>;
}

/// Sink that discards frames, for headless runs
#[derive(Debug, Default)]
pub struct HeadlessSink {
    pub frames: u64,
    pub last_raindrops: usize,
    pub last_splashes: usize,
}

impl DrawSink for HeadlessSink {
    fn draw(&mut self, frame: &InstanceFrame<'_>) -> Result<(), RenderError> {
        self.frames += 1;
        self.last_raindrops = frame.raindrops.len();
        self.last_splashes = frame.splashes.len();
        Ok(())
    }
}
