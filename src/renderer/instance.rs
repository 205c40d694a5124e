//! GPU instance records and the per-frame buffer builder

use bytemuck::{Pod, Zeroable};

use crate::sim::ParticlePool;

/// One raindrop streak
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct RaindropInstance {
    /// Top-left, logical points
    pub position: [f32; 2],
    /// (width, length)
    pub size: [f32; 2],
    pub opacity: f32,
}

impl RaindropInstance {
    const ATTRIBUTES: [wgpu::VertexAttribute; 3] =
        wgpu::vertex_attr_array![1 => Float32x2, 2 => Float32x2, 3 => Float32];

    pub fn desc() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<RaindropInstance>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Instance,
            attributes: &Self::ATTRIBUTES,
        }
    }
}

/// One splash disc
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct SplashInstance {
    /// Center, logical points
    pub position: [f32; 2],
    pub radius: f32,
    pub opacity: f32,
}

impl SplashInstance {
    const ATTRIBUTES: [wgpu::VertexAttribute; 3] =
        wgpu::vertex_attr_array![1 => Float32x2, 2 => Float32, 3 => Float32];

    pub fn desc() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<SplashInstance>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Instance,
            attributes: &Self::ATTRIBUTES,
        }
    }
}

/// Shared uniform (must match shader)
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct Globals {
    pub screen_size: [f32; 2],
    pub _pad: [f32; 2],
}

/// What the renderer draws for one frame
#[derive(Debug, Clone, Copy)]
pub struct InstanceFrame<'a> {
    pub raindrops: &'a [RaindropInstance],
    pub splashes: &'a [SplashInstance],
    pub screen_size: [f32; 2],
}

impl InstanceFrame<'_> {
    pub fn globals(&self) -> Globals {
        Globals {
            screen_size: self.screen_size,
            _pad: [0.0; 2],
        }
    }
}

/// Pre-sized instance arrays, rewritten in place every frame
pub struct InstanceBuffers {
    raindrops: Box<[RaindropInstance]>,
    splashes: Box<[SplashInstance]>,
    raindrop_count: usize,
    splash_count: usize,
    screen_size: [f32; 2],
}

impl InstanceBuffers {
    pub fn new(raindrop_capacity: usize, splash_capacity: usize) -> Self {
        Self {
            raindrops: vec![RaindropInstance::default(); raindrop_capacity].into_boxed_slice(),
            splashes: vec![SplashInstance::default(); splash_capacity].into_boxed_slice(),
            raindrop_count: 0,
            splash_count: 0,
            screen_size: [0.0; 2],
        }
    }

    /// Sized to hold every particle the pool can hold
    pub fn for_pool(pool: &ParticlePool) -> Self {
        Self::new(pool.raindrop_capacity(), pool.splash_capacity())
    }

    pub fn raindrop_capacity(&self) -> usize {
        self.raindrops.len()
    }

    pub fn splash_capacity(&self) -> usize {
        self.splashes.len()
    }

    /// Compact the active particles into the arrays
    ///
    /// At most `drop_limit` raindrops and `splash_limit` splashes are kept,
    /// further capped by capacity; the rest are silently skipped this frame.
    pub fn build(
        &mut self,
        pool: &ParticlePool,
        drop_limit: usize,
        splash_limit: usize,
        screen_size: [f32; 2],
    ) -> InstanceFrame<'_> {
        let drop_limit = drop_limit.min(self.raindrops.len());
        let mut count = 0;
        for drop in pool.active_raindrops().take(drop_limit) {
            self.raindrops[count] = RaindropInstance {
                position: drop.pos.to_array(),
                size: [drop.width, drop.length],
                opacity: drop.opacity.clamp(0.0, 1.0),
            };
            count += 1;
        }
        self.raindrop_count = count;

        let splash_limit = splash_limit.min(self.splashes.len());
        let mut count = 0;
        for splash in pool.active_splashes().take(splash_limit) {
            self.splashes[count] = SplashInstance {
                position: splash.pos.to_array(),
                radius: splash.radius,
                opacity: splash.opacity.clamp(0.0, 1.0),
            };
            count += 1;
        }
        self.splash_count = count;
        self.screen_size = screen_size;

        self.frame()
    }

    /// The most recently built frame
    pub fn frame(&self) -> InstanceFrame<'_> {
        InstanceFrame {
            raindrops: &self.raindrops[..self.raindrop_count],
            splashes: &self.splashes[..self.splash_count],
            screen_size: self.screen_size,
        }
    }
}
