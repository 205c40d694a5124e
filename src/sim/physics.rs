//! Per-tick physics update
//!
//! Advances every active raindrop and splash by one variable timestep.
//! A drop deactivated on one tick is respawned above the screen on the
//! next; until then it stays where it ended and is not drawn.

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::collision::{ObstacleKind, apply_impact, find_collision};
use super::particle::{Raindrop, SplashSeed};
use super::pool::ParticlePool;
use super::spawn::SpawnPolicy;
use crate::obstacles::Rect;
use crate::settings::Settings;

/// Tunable physics constants
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsParams {
    /// Downward acceleration (units/s²)
    pub gravity: f32,
    /// Ceiling on downward velocity (units/s)
    pub terminal_velocity: f32,
    /// How far past an obstacle top a drop may start and still land
    pub collision_tolerance: f32,
    /// Restitution at bounce intensity 1.0
    pub base_restitution: f32,
    /// Horizontal velocity retained on impact
    pub friction: f32,
    /// Fraction of the wind added to a drop after impact
    pub wind_drift: f32,
    /// Random horizontal kick on impact (±units/s)
    pub impact_jitter: f32,
    /// Rebounds slower than this end the drop
    pub min_bounce_velocity: f32,
    /// Impacts before a drop is spent
    pub max_bounces: u32,
    /// Splashes per impact before the obstacle factor
    pub splash_min: u32,
    pub splash_max: u32,
    pub window_splash_factor: f32,
    pub dock_splash_factor: f32,
    /// Splash ejection speed range (units/s)
    pub splash_speed_min: f32,
    pub splash_speed_max: f32,
    /// Splash lifetime range (seconds)
    pub splash_lifetime_min: f32,
    pub splash_lifetime_max: f32,
    /// Margin beyond the screen edges before a drop is culled
    pub cull_margin: f32,
}

impl Default for PhysicsParams {
    fn default() -> Self {
        Self {
            gravity: 980.0,
            terminal_velocity: 1500.0,
            collision_tolerance: 10.0,
            base_restitution: 0.3,
            friction: 0.7,
            wind_drift: 0.1,
            impact_jitter: 10.0,
            min_bounce_velocity: 50.0,
            max_bounces: 1,
            splash_min: 2,
            splash_max: 4,
            window_splash_factor: 1.0,
            dock_splash_factor: 1.25,
            splash_speed_min: 60.0,
            splash_speed_max: 180.0,
            splash_lifetime_min: 0.25,
            splash_lifetime_max: 0.6,
            cull_margin: 50.0,
        }
    }
}

impl PhysicsParams {
    /// Force every value into a range the step can sample from
    ///
    /// Min/max pairs are put in order, distances and speeds are floored at
    /// zero and a drop always gets at least one bounce. NaN falls back to
    /// the default.
    pub fn sanitized(self) -> Self {
        let d = Self::default();
        let (splash_min, splash_max) = ordered(self.splash_min, self.splash_max);
        let (splash_speed_min, splash_speed_max) = ordered(
            non_negative(self.splash_speed_min, d.splash_speed_min),
            non_negative(self.splash_speed_max, d.splash_speed_max),
        );
        let (splash_lifetime_min, splash_lifetime_max) = ordered(
            non_negative(self.splash_lifetime_min, d.splash_lifetime_min),
            non_negative(self.splash_lifetime_max, d.splash_lifetime_max),
        );
        Self {
            gravity: non_negative(self.gravity, d.gravity),
            terminal_velocity: non_negative(self.terminal_velocity, d.terminal_velocity),
            collision_tolerance: non_negative(self.collision_tolerance, d.collision_tolerance),
            base_restitution: non_negative(self.base_restitution, d.base_restitution),
            friction: non_negative(self.friction, d.friction),
            wind_drift: if self.wind_drift.is_nan() { d.wind_drift } else { self.wind_drift },
            impact_jitter: non_negative(self.impact_jitter, d.impact_jitter),
            min_bounce_velocity: non_negative(self.min_bounce_velocity, d.min_bounce_velocity),
            max_bounces: self.max_bounces.max(1),
            splash_min,
            splash_max,
            window_splash_factor: non_negative(self.window_splash_factor, d.window_splash_factor),
            dock_splash_factor: non_negative(self.dock_splash_factor, d.dock_splash_factor),
            splash_speed_min,
            splash_speed_max,
            splash_lifetime_min,
            splash_lifetime_max,
            cull_margin: non_negative(self.cull_margin, d.cull_margin),
        }
    }
}

fn non_negative(value: f32, fallback: f32) -> f32 {
    if value.is_finite() { value.max(0.0) } else { fallback }
}

fn ordered<T: PartialOrd>(a: T, b: T) -> (T, T) {
    if a <= b { (a, b) } else { (b, a) }
}

/// Visible area and obstacles for one step
#[derive(Debug, Clone, Copy)]
pub struct World<'a> {
    pub width: f32,
    pub height: f32,
    pub windows: &'a [Rect],
    pub dock: Option<&'a Rect>,
}

/// Counters from one physics step
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StepReport {
    pub window_impacts: u32,
    pub dock_impacts: u32,
    pub splashes_spawned: u32,
    /// Splashes lost because the pool was full
    pub splashes_dropped: u32,
    pub respawned: u32,
    pub culled: u32,
}

impl StepReport {
    pub fn impacts(&self) -> u32 {
        self.window_impacts + self.dock_impacts
    }
}

/// Advance the pool by `dt` seconds
pub fn step(
    pool: &mut ParticlePool,
    world: &World<'_>,
    settings: &Settings,
    params: &PhysicsParams,
    dt: f32,
    rng: &mut impl Rng,
) -> StepReport {
    let mut report = StepReport::default();
    let policy = SpawnPolicy::new(*settings, world.width, world.height);
    let wind = settings.wind_velocity();

    let target = pool.target_drops();

    for index in 0..pool.raindrop_capacity() {
        let drop = &mut pool.raindrops[index];

        if !drop.is_active {
            // The respawn takes this drop's tick
            if index < target {
                policy.respawn(drop, rng);
                report.respawned += 1;
            }
            continue;
        }

        let prev_bottom = drop.bottom();
        integrate(drop, params, dt);

        if is_off_screen(drop, world, params.cull_margin) {
            drop.deactivate();
            report.culled += 1;
            continue;
        }

        let Some(impact) =
            find_collision(drop, prev_bottom, world.windows, world.dock, params.collision_tolerance)
        else {
            continue;
        };

        match impact.kind {
            ObstacleKind::Window(_) => report.window_impacts += 1,
            ObstacleKind::Dock => report.dock_impacts += 1,
        }

        let outcome = apply_impact(drop, &impact, params, settings.bounce_intensity, wind, rng);
        let size = settings.drop_size_multiplier;
        for _ in 0..outcome.splash_count {
            let seed = splash_seed(impact.point, size, params, rng);
            if pool.try_spawn_splash(seed) {
                report.splashes_spawned += 1;
            } else {
                report.splashes_dropped += 1;
            }
        }
    }

    step_splashes(pool, world.height, params, dt);
    report
}

/// Gravity, terminal velocity, then position
#[inline]
pub fn integrate(drop: &mut Raindrop, params: &PhysicsParams, dt: f32) {
    drop.vel.y = (drop.vel.y + params.gravity * dt).min(params.terminal_velocity);
    drop.pos += drop.vel * dt;
}

/// Below the bottom margin or outside either side margin, whatever the velocity
pub fn is_off_screen(drop: &Raindrop, world: &World<'_>, margin: f32) -> bool {
    let x = drop.pos.x;
    drop.pos.y > world.height + margin || x < -margin || x > world.width + margin
}

/// Radially ejected, always upward
fn splash_seed(point: Vec2, size: f32, params: &PhysicsParams, rng: &mut impl Rng) -> SplashSeed {
    use std::f32::consts::PI;
    // Angle from straight left (PI) to straight right (2 PI); y is down
    let angle = rng.random_range(PI * 1.1..=PI * 1.9);
    let speed = rng.random_range(params.splash_speed_min..=params.splash_speed_max);
    SplashSeed {
        pos: point,
        vel: Vec2::new(angle.cos(), angle.sin()) * speed,
        radius: rng.random_range(0.8f32..=1.8) * size,
        lifetime: rng.random_range(params.splash_lifetime_min..=params.splash_lifetime_max),
    }
}

/// Half gravity, lifetime countdown, fade
pub fn step_splashes(pool: &mut ParticlePool, screen_height: f32, params: &PhysicsParams, dt: f32) {
    for index in 0..pool.splash_capacity() {
        let splash = &mut pool.splashes[index];
        if !splash.is_active {
            continue;
        }
        splash.vel.y += params.gravity * 0.5 * dt;
        splash.pos += splash.vel * dt;
        splash.lifetime -= dt;
        splash.opacity = splash.faded_opacity();

        // Released once the whole disc is above or below the screen
        let r = splash.radius.max(0.0);
        if splash.lifetime <= 0.0 || splash.pos.y - r > screen_height || splash.pos.y + r < 0.0 {
            pool.release_splash(index);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    const DT: f32 = 1.0 / 60.0;

    fn open_world() -> World<'static> {
        World {
            width: 800.0,
            height: 600.0,
            windows: &[],
            dock: None,
        }
    }

    fn filled_pool(count: usize, settings: &Settings, rng: &mut Pcg32) -> ParticlePool {
        let mut pool = ParticlePool::new(count, 64);
        let policy = SpawnPolicy::new(*settings, 800.0, 600.0);
        for drop in pool.raindrops.iter_mut() {
            policy.scatter(drop, rng);
        }
        pool
    }

    #[test]
    fn test_free_fall_end_to_end() {
        let mut rng = Pcg32::seed_from_u64(42);
        let settings = Settings::default();
        let params = PhysicsParams::default();
        let mut pool = filled_pool(10, &settings, &mut rng);
        let world = open_world();

        let mut total_impacts = 0;
        for _ in 0..120 {
            let before: Vec<Raindrop> = pool.raindrops().to_vec();
            let report = step(&mut pool, &world, &settings, &params, DT, &mut rng);
            total_impacts += report.impacts();

            for (old, new) in before.iter().zip(pool.raindrops()) {
                if old.is_active {
                    // Pure free fall: still falling, or culled in place
                    assert!(new.pos.y > old.pos.y);
                } else {
                    // Respawned above the top this tick
                    assert!(new.pos.y < old.pos.y);
                    assert!(new.pos.y <= 0.0);
                }
            }
            for drop in pool.active_raindrops() {
                assert!(drop.pos.y <= 650.0);
            }
        }
        assert_eq!(total_impacts, 0);
        assert_eq!(pool.active_splash_count(), 0);
    }

    #[test]
    fn test_culled_below_screen_regardless_of_velocity() {
        let mut rng = Pcg32::seed_from_u64(1);
        let settings = Settings::default();
        let params = PhysicsParams::default();
        let mut pool = ParticlePool::new(1, 4);
        pool.raindrops[0] = Raindrop {
            pos: Vec2::new(400.0, 651.0),
            vel: Vec2::new(0.0, -2000.0),
            width: 2.0,
            length: 20.0,
            opacity: 0.5,
            is_active: true,
            bounce_count: 0,
        };
        // Zero dt: the drop does not move, only the checks run
        let report = step(&mut pool, &open_world(), &settings, &params, 0.0, &mut rng);
        assert_eq!(report.culled, 1);
        assert!(!pool.raindrops()[0].is_active);
    }

    #[test]
    fn test_side_cull_ignores_heading() {
        let world = open_world();
        let mut drop = Raindrop {
            pos: Vec2::new(-90.0, 100.0),
            vel: Vec2::new(5.0, 900.0),
            is_active: true,
            ..Default::default()
        };
        // Blowing inward still past the left margin
        assert!(is_off_screen(&drop, &world, 50.0));
        drop.pos.x = -40.0;
        assert!(!is_off_screen(&drop, &world, 50.0));
        drop.pos.x = 851.0;
        drop.vel.x = -100.0;
        assert!(is_off_screen(&drop, &world, 50.0));
        drop.pos.x = 850.0;
        assert!(!is_off_screen(&drop, &world, 50.0));
    }

    #[test]
    fn test_window_precedence_in_step() {
        let mut rng = Pcg32::seed_from_u64(3);
        let settings = Settings::default();
        let params = PhysicsParams::default();
        let window = [Rect::new(100.0, 500.0, 300.0, 100.0)];
        let dock = Rect::new(0.0, 500.0, 800.0, 100.0);
        let world = World {
            width: 800.0,
            height: 600.0,
            windows: &window,
            dock: Some(&dock),
        };
        let mut pool = ParticlePool::new(1, 16);
        pool.raindrops[0] = Raindrop {
            pos: Vec2::new(200.0, 480.0),
            vel: Vec2::new(0.0, 1000.0),
            width: 2.0,
            length: 20.0,
            opacity: 0.5,
            is_active: true,
            bounce_count: 0,
        };
        let report = step(&mut pool, &world, &settings, &params, 0.0, &mut rng);
        assert_eq!(report.window_impacts, 1);
        assert_eq!(report.dock_impacts, 0);
        assert!(report.splashes_spawned >= 2);
        assert_eq!(pool.active_splash_count() as u32, report.splashes_spawned);
    }

    #[test]
    fn test_zen_garden_impact_has_no_rebound() {
        let mut rng = Pcg32::seed_from_u64(4);
        let store = crate::settings::SettingsStore::new(Settings::default());
        store.apply_preset("zen-garden").unwrap();
        let settings = store.snapshot();
        let params = PhysicsParams::default();
        let dock = Rect::new(0.0, 500.0, 800.0, 100.0);
        let world = World {
            width: 800.0,
            height: 600.0,
            windows: &[],
            dock: Some(&dock),
        };
        let mut pool = ParticlePool::new(1, 16);
        pool.set_target_drops(0);
        pool.raindrops[0] = Raindrop {
            pos: Vec2::new(200.0, 480.0),
            vel: Vec2::new(0.0, 1000.0),
            width: 2.0,
            length: 20.0,
            opacity: 0.5,
            is_active: true,
            bounce_count: 0,
        };
        let report = step(&mut pool, &world, &settings, &params, 0.0, &mut rng);
        assert_eq!(report.dock_impacts, 1);
        assert_eq!(pool.raindrops()[0].vel.y, 0.0);
    }

    #[test]
    fn test_bounce_decay_is_monotonic() {
        let mut rng = Pcg32::seed_from_u64(5);
        let settings = Settings {
            bounce_intensity: 2.0,
            ..Default::default()
        };
        let params = PhysicsParams {
            max_bounces: 4,
            min_bounce_velocity: 0.0,
            gravity: 0.0,
            ..Default::default()
        };
        let floor = Rect::new(0.0, 500.0, 800.0, 100.0);
        let world = World {
            width: 800.0,
            height: 600.0,
            windows: &[],
            dock: Some(&floor),
        };
        let mut pool = ParticlePool::new(1, 256);
        pool.set_target_drops(0);
        pool.raindrops[0] = Raindrop {
            pos: Vec2::new(400.0, 480.0),
            vel: Vec2::new(0.0, 1000.0),
            width: 2.0,
            length: 20.0,
            opacity: 0.8,
            is_active: true,
            bounce_count: 0,
        };

        for bounce in 1..=params.max_bounces {
            let before = pool.raindrops()[0];
            step(&mut pool, &world, &settings, &params, 0.0, &mut rng);
            let after = pool.raindrops()[0];
            assert_eq!(after.bounce_count, bounce);
            assert!(after.opacity < before.opacity);
            assert!(after.length < before.length);
            // Send it back down onto the floor for the next impact
            pool.raindrops[0].vel.y = after.vel.y.abs();
        }
        assert!(!pool.raindrops()[0].is_active);
    }

    #[test]
    fn test_splashes_fade_and_expire() {
        let mut pool = ParticlePool::new(1, 4);
        pool.try_spawn_splash(SplashSeed {
            pos: Vec2::new(100.0, 300.0),
            vel: Vec2::new(0.0, -50.0),
            radius: 1.0,
            lifetime: 0.5,
        });
        let params = PhysicsParams::default();

        let mut last_opacity = f32::MAX;
        let mut ticks = 0;
        while pool.active_splash_count() > 0 {
            step_splashes(&mut pool, 600.0, &params, DT);
            if let Some(splash) = pool.active_splashes().next() {
                assert!(splash.opacity < last_opacity);
                assert!((splash.opacity - 0.8 * splash.lifetime / splash.max_lifetime).abs() < 1e-5);
                last_opacity = splash.opacity;
            }
            ticks += 1;
            assert!(ticks <= 31);
        }
    }

    #[test]
    fn test_splash_leaving_screen_expires() {
        let mut pool = ParticlePool::new(1, 1);
        pool.try_spawn_splash(SplashSeed {
            pos: Vec2::new(100.0, 599.0),
            vel: Vec2::new(0.0, 300.0),
            radius: 1.0,
            lifetime: 5.0,
        });
        step_splashes(&mut pool, 600.0, &PhysicsParams::default(), DT);
        assert_eq!(pool.active_splash_count(), 0);
    }

    #[test]
    fn test_splash_at_top_edge_survives() {
        let mut pool = ParticlePool::new(1, 2);
        for (x, y) in [(100.0, 0.0), (200.0, -3.0)] {
            pool.try_spawn_splash(SplashSeed {
                pos: Vec2::new(x, y),
                vel: Vec2::new(0.0, -30.0),
                radius: 1.5,
                lifetime: 0.5,
            });
        }
        step_splashes(&mut pool, 600.0, &PhysicsParams::default(), DT);

        // Centre above y=0 but the disc still overlaps the screen
        let kept: Vec<_> = pool.active_splashes().collect();
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].pos.x, 100.0);
        assert!(kept[0].pos.y < 0.0);
    }

    #[test]
    fn test_sanitized_params_fix_inverted_ranges() {
        let params = PhysicsParams {
            impact_jitter: -1.0,
            splash_min: 5,
            splash_max: 1,
            splash_speed_min: 200.0,
            splash_speed_max: 50.0,
            splash_lifetime_min: 0.9,
            splash_lifetime_max: f32::NAN,
            collision_tolerance: -3.0,
            cull_margin: -10.0,
            max_bounces: 0,
            ..PhysicsParams::default()
        }
        .sanitized();

        assert_eq!(params.impact_jitter, 0.0);
        assert_eq!((params.splash_min, params.splash_max), (1, 5));
        assert_eq!((params.splash_speed_min, params.splash_speed_max), (50.0, 200.0));
        assert_eq!((params.splash_lifetime_min, params.splash_lifetime_max), (0.6, 0.9));
        assert_eq!(params.collision_tolerance, 0.0);
        assert_eq!(params.cull_margin, 0.0);
        assert_eq!(params.max_bounces, 1);
        assert_eq!(PhysicsParams::default().sanitized(), PhysicsParams::default());
    }

    #[test]
    fn test_lowered_target_drains_population() {
        let mut rng = Pcg32::seed_from_u64(6);
        let settings = Settings::default();
        let params = PhysicsParams::default();
        let mut pool = filled_pool(20, &settings, &mut rng);
        pool.set_target_drops(5);
        for _ in 0..240 {
            step(&mut pool, &open_world(), &settings, &params, DT, &mut rng);
        }
        assert!(pool.active_raindrop_count() <= 5);
        assert!(pool.raindrops()[5..].iter().all(|d| !d.is_active));
    }

    proptest! {
        #[test]
        fn prop_terminal_velocity_never_exceeded(
            start_vy in -2000.0f32..3000.0,
            dts in proptest::collection::vec(0.0f32..0.5, 1..50),
        ) {
            let params = PhysicsParams::default();
            let mut drop = Raindrop {
                vel: Vec2::new(0.0, start_vy),
                is_active: true,
                ..Default::default()
            };
            for dt in dts {
                integrate(&mut drop, &params, dt);
                prop_assert!(drop.vel.y <= params.terminal_velocity);
            }
        }
    }
}
