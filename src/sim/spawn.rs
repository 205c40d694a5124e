//! Raindrop spawn and respawn policy
//!
//! Evaluated against the current settings snapshot on every respawn, so a
//! preset switch mid-storm changes new drops without restarting.

use glam::Vec2;
use rand::Rng;

use super::particle::Raindrop;
use crate::settings::Settings;

/// Horizontal margin beyond the screen edges where drops may appear
pub const SPAWN_MARGIN_X: f32 = 100.0;

/// Random horizontal spread around the wind velocity
const VX_JITTER: f32 = 20.0;
const VY_MIN: f32 = 800.0;
const VY_MAX: f32 = 1200.0;
const WIDTH_MIN: f32 = 1.5;
const WIDTH_MAX: f32 = 3.0;
const LENGTH_MIN: f32 = 15.0;
const LENGTH_MAX: f32 = 40.0;
const OPACITY_MIN: f32 = 0.4;
const OPACITY_MAX: f32 = 0.8;

#[derive(Debug, Clone, Copy)]
pub struct SpawnPolicy {
    pub settings: Settings,
    pub screen_width: f32,
    pub screen_height: f32,
}

impl SpawnPolicy {
    pub fn new(settings: Settings, screen_width: f32, screen_height: f32) -> Self {
        Self {
            settings,
            screen_width,
            screen_height,
        }
    }

    /// Fresh drop state; position is left for the caller to place
    pub fn initial_state(&self, rng: &mut impl Rng) -> Raindrop {
        let s = &self.settings;
        let vx = s.wind_velocity() + rng.random_range(-VX_JITTER..=VX_JITTER);
        let vy = rng.random_range(VY_MIN..=VY_MAX) * s.drop_speed_multiplier;
        Raindrop {
            pos: Vec2::ZERO,
            vel: Vec2::new(vx, vy),
            width: rng.random_range(WIDTH_MIN..=WIDTH_MAX) * s.drop_size_multiplier,
            length: rng.random_range(LENGTH_MIN..=LENGTH_MAX) * s.drop_size_multiplier,
            opacity: rng.random_range(OPACITY_MIN..=OPACITY_MAX),
            is_active: true,
            bounce_count: 0,
        }
    }

    /// Reinitialize a drop just above the visible top
    pub fn respawn(&self, drop: &mut Raindrop, rng: &mut impl Rng) {
        *drop = self.initial_state(rng);
        drop.pos.x = self.random_x(rng);
        drop.pos.y = -drop.length;
    }

    /// Reinitialize a drop anywhere from just above the top to the bottom,
    /// used when the pool is first filled
    pub fn scatter(&self, drop: &mut Raindrop, rng: &mut impl Rng) {
        *drop = self.initial_state(rng);
        drop.pos.x = self.random_x(rng);
        let bottom = self.screen_height.max(0.0);
        drop.pos.y = rng.random_range(-drop.length..=bottom);
    }

    fn random_x(&self, rng: &mut impl Rng) -> f32 {
        rng.random_range(-SPAWN_MARGIN_X..=self.screen_width.max(0.0) + SPAWN_MARGIN_X)
    }
}
