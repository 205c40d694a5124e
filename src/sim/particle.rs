//! Particle records
//!
//! Both types are plain fixed-size values stored in the pool's boxed slices
//! and reinitialized in place.

use glam::Vec2;

/// Splash opacity at full remaining lifetime
pub const SPLASH_PEAK_OPACITY: f32 = 0.8;

/// A falling rain streak
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Raindrop {
    /// Top-left of the streak, y down
    pub pos: Vec2,
    /// Units per second
    pub vel: Vec2,
    pub width: f32,
    pub length: f32,
    pub opacity: f32,
    pub is_active: bool,
    pub bounce_count: u32,
}

impl Default for Raindrop {
    fn default() -> Self {
        Self {
            pos: Vec2::ZERO,
            vel: Vec2::ZERO,
            width: 0.0,
            length: 0.0,
            opacity: 0.0,
            is_active: false,
            bounce_count: 0,
        }
    }
}

impl Raindrop {
    /// Leading (bottom) edge
    #[inline]
    pub fn bottom(&self) -> f32 {
        self.pos.y + self.length
    }

    pub fn deactivate(&mut self) {
        self.is_active = false;
    }
}

/// Initial state for a new splash
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SplashSeed {
    pub pos: Vec2,
    pub vel: Vec2,
    pub radius: f32,
    /// Seconds
    pub lifetime: f32,
}

/// A short-lived droplet thrown up by an impact
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SplashParticle {
    pub pos: Vec2,
    pub vel: Vec2,
    pub radius: f32,
    pub opacity: f32,
    /// Seconds remaining
    pub lifetime: f32,
    pub max_lifetime: f32,
    pub is_active: bool,
}

impl Default for SplashParticle {
    fn default() -> Self {
        Self {
            pos: Vec2::ZERO,
            vel: Vec2::ZERO,
            radius: 0.0,
            opacity: 0.0,
            lifetime: 0.0,
            max_lifetime: 0.0,
            is_active: false,
        }
    }
}

impl SplashParticle {
    /// Reinitialize this slot from a seed
    pub fn reset(&mut self, seed: &SplashSeed) {
        let lifetime = seed.lifetime.max(f32::EPSILON);
        *self = Self {
            pos: seed.pos,
            vel: seed.vel,
            radius: seed.radius,
            opacity: SPLASH_PEAK_OPACITY,
            lifetime,
            max_lifetime: lifetime,
            is_active: true,
        };
    }

    /// Opacity fades linearly with remaining lifetime
    #[inline]
    pub fn faded_opacity(&self) -> f32 {
        if self.max_lifetime <= 0.0 {
            return 0.0;
        }
        SPLASH_PEAK_OPACITY * (self.lifetime / self.max_lifetime).clamp(0.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_splash_reset_starts_at_peak() {
        let mut splash = SplashParticle::default();
        splash.reset(&SplashSeed {
            pos: Vec2::new(5.0, 6.0),
            vel: Vec2::new(0.0, -80.0),
            radius: 1.5,
            lifetime: 0.4,
        });
        assert!(splash.is_active);
        assert_eq!(splash.opacity, SPLASH_PEAK_OPACITY);
        assert_eq!(splash.max_lifetime, 0.4);

        splash.lifetime = 0.1;
        assert!((splash.faded_opacity() - 0.2).abs() < 1e-6);
    }

    #[test]
    fn test_raindrop_bottom() {
        let drop = Raindrop {
            pos: Vec2::new(0.0, 100.0),
            length: 25.0,
            ..Default::default()
        };
        assert_eq!(drop.bottom(), 125.0);
    }
}
