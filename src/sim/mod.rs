//! Rain simulation module
//!
//! Particle storage, spawn policy and physics. This module has no rendering
//! or platform dependencies and runs headless:
//! - Fixed-capacity pools, addressed by slot index
//! - Variable timestep, clamped by the frame driver
//! - RNG passed in by the caller

pub mod collision;
pub mod particle;
pub mod physics;
pub mod pool;
pub mod spawn;

pub use collision::{Impact, ImpactOutcome, ObstacleKind, apply_impact, find_collision};
pub use particle::{Raindrop, SPLASH_PEAK_OPACITY, SplashParticle, SplashSeed};
pub use physics::{PhysicsParams, StepReport, World, integrate, step, step_splashes};
pub use pool::ParticlePool;
pub use spawn::{SPAWN_MARGIN_X, SpawnPolicy};
