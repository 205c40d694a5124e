//! Raindrop vs. obstacle collision detection and response
//!
//! Drops only land on the top edge of a rectangle. Windows are tested
//! before the dock and the first hit wins, so a drop over overlapping
//! window and dock rectangles registers once.

use glam::Vec2;
use rand::Rng;

use super::particle::Raindrop;
use super::physics::PhysicsParams;
use crate::obstacles::Rect;

/// Which class of obstacle was hit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObstacleKind {
    /// Window at this index in the window list
    Window(usize),
    Dock,
}

/// A detected landing
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Impact {
    pub kind: ObstacleKind,
    /// y of the surface that was hit
    pub surface_y: f32,
    /// Point where the streak touched down
    pub point: Vec2,
}

/// Whether a drop lands on `rect` this step
///
/// `prev_bottom` is the leading edge before integration. The edge must
/// reach the top while having started no deeper than the tolerance band,
/// which also catches fast drops that cross the band in one step.
#[inline]
pub fn lands_on(drop: &Raindrop, prev_bottom: f32, rect: &Rect, tolerance: f32) -> bool {
    let top = rect.top();
    let bottom = drop.bottom();
    rect.spans_x(drop.pos.x) && bottom >= top && prev_bottom <= top + tolerance
}

/// Find the obstacle a drop lands on, windows first
pub fn find_collision(
    drop: &Raindrop,
    prev_bottom: f32,
    windows: &[Rect],
    dock: Option<&Rect>,
    tolerance: f32,
) -> Option<Impact> {
    let hit = |kind: ObstacleKind, rect: &Rect| Impact {
        kind,
        surface_y: rect.top(),
        point: Vec2::new(drop.pos.x, rect.top()),
    };

    if let Some((index, rect)) = windows
        .iter()
        .enumerate()
        .find(|(_, rect)| lands_on(drop, prev_bottom, rect, tolerance))
    {
        return Some(hit(ObstacleKind::Window(index), rect));
    }

    dock.filter(|rect| lands_on(drop, prev_bottom, rect, tolerance))
        .map(|rect| hit(ObstacleKind::Dock, rect))
}

/// What happened to a drop after an impact
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImpactOutcome {
    /// The drop is spent and will be respawned
    pub deactivated: bool,
    /// Splashes to emit at the impact point
    pub splash_count: u32,
}

/// Resolve a landing: flatten the streak, rebound, and decide its fate
pub fn apply_impact(
    drop: &mut Raindrop,
    impact: &Impact,
    params: &PhysicsParams,
    bounce_intensity: f32,
    wind: f32,
    rng: &mut impl Rng,
) -> ImpactOutcome {
    drop.bounce_count = drop.bounce_count.saturating_add(1);

    let restitution = params.base_restitution * bounce_intensity.max(0.0);
    drop.vel.y = -drop.vel.y * restitution;
    drop.vel.x = drop.vel.x * params.friction
        + wind * params.wind_drift
        + rng.random_range(-params.impact_jitter..=params.impact_jitter);

    // Flatten: fainter and shorter, a little wider
    drop.opacity *= 0.5;
    drop.length *= 0.4;
    drop.width *= 1.2;

    // Rest exactly on the surface
    drop.pos.y = impact.surface_y - drop.length;

    let deactivated =
        drop.vel.y.abs() < params.min_bounce_velocity || drop.bounce_count >= params.max_bounces;
    if deactivated {
        drop.deactivate();
    }

    let factor = match impact.kind {
        ObstacleKind::Window(_) => params.window_splash_factor,
        ObstacleKind::Dock => params.dock_splash_factor,
    };
    let base = rng.random_range(params.splash_min..=params.splash_max) as f32;
    let splash_count = (base * factor).round() as u32;

    ImpactOutcome {
        deactivated,
        splash_count,
    }
}
