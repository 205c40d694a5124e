//! Frame driver
//!
//! Called once per display refresh. Each call runs one tick:
//! obstacles (throttled) → physics → instance buffers → draw.

use std::sync::Arc;

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use crate::consts::{MAX_DT, MAX_RAINDROPS, MAX_SPLASHES};
use crate::obstacles::{ObstacleCache, ObstacleProvider};
use crate::renderer::{DrawSink, InstanceBuffers};
use crate::settings::SettingsStore;
use crate::sim::{self, ParticlePool, PhysicsParams, SpawnPolicy, World};

/// Drawable area in logical points, plus the backing scale factor
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DrawableSize {
    pub width: f32,
    pub height: f32,
    pub scale_factor: f32,
}

impl DrawableSize {
    pub fn new(width: f32, height: f32, scale_factor: f32) -> Self {
        Self {
            width,
            height,
            scale_factor,
        }
    }

    /// Logical size at scale 1
    pub fn logical(width: f32, height: f32) -> Self {
        Self::new(width, height, 1.0)
    }

    pub fn is_empty(&self) -> bool {
        !(self.width > 0.0 && self.height > 0.0)
    }

    /// Backing size in physical pixels
    pub fn pixel_size(&self) -> (u32, u32) {
        let scale = if self.scale_factor > 0.0 {
            self.scale_factor
        } else {
            1.0
        };
        (
            (self.width.max(0.0) * scale).round() as u32,
            (self.height.max(0.0) * scale).round() as u32,
        )
    }
}

/// What happened during one tick
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FrameReport {
    /// Timestep actually integrated
    pub dt: f32,
    pub window_impacts: u32,
    pub dock_impacts: u32,
    pub splashes_spawned: u32,
    /// Splashes that found no free slot
    pub splashes_dropped: u32,
    pub respawned: u32,
    pub raindrop_instances: usize,
    pub splash_instances: usize,
    pub thunder: bool,
    /// Whether the sink accepted the frame
    pub drawn: bool,
}

impl FrameReport {
    pub fn impacts(&self) -> u32 {
        self.window_impacts + self.dock_impacts
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    /// No frame seen yet; the pool is not allocated
    Uninitialized,
    Running,
}

pub struct FrameDriver<P: ObstacleProvider> {
    settings: Arc<SettingsStore>,
    params: PhysicsParams,
    provider: P,
    obstacles: ObstacleCache,
    pool: Option<ParticlePool>,
    buffers: InstanceBuffers,
    rng: Pcg32,
    last_time: Option<f64>,
    size: Option<DrawableSize>,
    phase: Phase,
}

impl<P: ObstacleProvider> FrameDriver<P> {
    pub fn new(settings: Arc<SettingsStore>, params: PhysicsParams, provider: P) -> Self {
        Self::with_seed(settings, params, provider, rand::random())
    }

    /// Deterministic driver
    pub fn with_seed(
        settings: Arc<SettingsStore>,
        params: PhysicsParams,
        provider: P,
        seed: u64,
    ) -> Self {
        Self {
            settings,
            params: params.sanitized(),
            provider,
            obstacles: ObstacleCache::new(),
            pool: None,
            buffers: InstanceBuffers::new(MAX_RAINDROPS, MAX_SPLASHES),
            rng: Pcg32::seed_from_u64(seed),
            last_time: None,
            size: None,
            phase: Phase::Uninitialized,
        }
    }

    pub fn pool(&self) -> Option<&ParticlePool> {
        self.pool.as_ref()
    }

    pub fn obstacles(&self) -> &ObstacleCache {
        &self.obstacles
    }

    pub fn provider_mut(&mut self) -> &mut P {
        &mut self.provider
    }

    pub fn size(&self) -> Option<DrawableSize> {
        self.size
    }

    /// Run one tick at time `now` (seconds, monotonic)
    pub fn frame(&mut self, now: f64, size: DrawableSize, sink: &mut dyn DrawSink) -> FrameReport {
        let dt = match self.last_time {
            Some(last) => ((now - last) as f32).clamp(0.0, MAX_DT),
            None => 0.0,
        };
        self.last_time = Some(now);

        let mut report = FrameReport {
            dt,
            ..FrameReport::default()
        };
        if size.is_empty() {
            return report;
        }

        let settings = self.settings.snapshot();
        // A scale change alone also counts: the backing surface changes size
        let resized = self.size.is_some_and(|s| s != size);
        if self.phase == Phase::Uninitialized || resized {
            log::debug!("Drawable size {}x{} @{}x", size.width, size.height, size.scale_factor);
            self.obstacles.invalidate();
        }
        self.size = Some(size);

        self.obstacles.refresh(&self.provider, now, size.height);

        let target = settings.target_drop_count(size.width);
        let pool = match self.phase {
            Phase::Uninitialized => {
                let mut pool = ParticlePool::new(MAX_RAINDROPS, MAX_SPLASHES);
                pool.set_target_drops(target);
                let policy = SpawnPolicy::new(settings, size.width, size.height);
                for index in 0..pool.target_drops() {
                    if let Some(drop) = pool.raindrop_mut(index) {
                        policy.scatter(drop, &mut self.rng);
                    }
                }
                log::info!("Rain started with {} drops", pool.target_drops());
                self.phase = Phase::Running;
                self.pool.insert(pool)
            }
            Phase::Running => match self.pool.as_mut() {
                Some(pool) => pool,
                None => return report,
            },
        };
        pool.set_target_drops(target);

        let world = World {
            width: size.width,
            height: size.height,
            windows: self.obstacles.windows(),
            dock: self.obstacles.dock(),
        };
        let step = sim::step(pool, &world, &settings, &self.params, dt, &mut self.rng);
        report.window_impacts = step.window_impacts;
        report.dock_impacts = step.dock_impacts;
        report.splashes_spawned = step.splashes_spawned;
        report.splashes_dropped = step.splashes_dropped;
        report.respawned = step.respawned;

        let thunder_chance = (settings.thunder_probability * dt).clamp(0.0, 1.0);
        report.thunder = thunder_chance > 0.0 && self.rng.random_bool(thunder_chance as f64);

        let drop_limit = pool.target_drops();
        let splash_limit = pool.splash_capacity();
        let frame = self
            .buffers
            .build(pool, drop_limit, splash_limit, [size.width, size.height]);
        report.raindrop_instances = frame.raindrops.len();
        report.splash_instances = frame.splashes.len();

        match sink.draw(&frame) {
            Ok(()) => report.drawn = true,
            Err(err) if err.is_transient() => log::debug!("Frame skipped: {err}"),
            Err(err) => log::error!("Draw failed: {err}"),
        }

        report
    }
}
