//! Obstacle geometry
//!
//! Raindrops land on the dock and on visible windows. Discovering those
//! rectangles is platform work done by an [`ObstacleProvider`]; the
//! [`ObstacleCache`] throttles queries and keeps the last answer.

use serde::{Deserialize, Serialize};

use crate::consts::OBSTACLE_REFRESH_SECS;
use crate::error::ObstacleError;

/// Axis-aligned rectangle, top-left origin, y down
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub min_x: f32,
    pub min_y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub const EMPTY: Rect = Rect {
        min_x: 0.0,
        min_y: 0.0,
        width: 0.0,
        height: 0.0,
    };

    pub const fn new(min_x: f32, min_y: f32, width: f32, height: f32) -> Self {
        Self {
            min_x,
            min_y,
            width,
            height,
        }
    }

    /// Top edge (the surface drops land on)
    #[inline]
    pub fn top(&self) -> f32 {
        self.min_y
    }

    #[inline]
    pub fn max_x(&self) -> f32 {
        self.min_x + self.width
    }

    pub fn is_empty(&self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }

    /// Whether `x` lies within the horizontal extent
    #[inline]
    pub fn spans_x(&self, x: f32) -> bool {
        x >= self.min_x && x <= self.max_x()
    }
}

/// External window-enumeration service
///
/// Both queries use the particle coordinate space. `screen_height` lets
/// providers that work in bottom-left coordinates flip their results.
pub trait ObstacleProvider {
    /// Dock/taskbar rectangle, `Rect::EMPTY` when hidden
    fn dock_rect(&self, screen_height: f32) -> Result<Rect, ObstacleError>;

    /// Visible application windows, frontmost first
    fn window_rects(&self, screen_height: f32) -> Result<Vec<Rect>, ObstacleError>;
}

/// Fixed obstacle layout
#[derive(Debug, Clone, Default)]
pub struct StaticObstacles {
    pub dock: Rect,
    pub windows: Vec<Rect>,
}

impl StaticObstacles {
    pub fn new(dock: Rect, windows: Vec<Rect>) -> Self {
        Self { dock, windows }
    }

    pub fn none() -> Self {
        Self::default()
    }
}

impl ObstacleProvider for StaticObstacles {
    fn dock_rect(&self, _screen_height: f32) -> Result<Rect, ObstacleError> {
        Ok(self.dock)
    }

    fn window_rects(&self, _screen_height: f32) -> Result<Vec<Rect>, ObstacleError> {
        Ok(self.windows.clone())
    }
}

/// Last known obstacles, refreshed on a slower cadence than the frame rate
#[derive(Debug, Clone, Default)]
pub struct ObstacleCache {
    dock: Option<Rect>,
    windows: Vec<Rect>,
    last_refresh: Option<f64>,
    failures: u32,
}

impl ObstacleCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Dock rectangle, `None` when hidden or unknown
    pub fn dock(&self) -> Option<&Rect> {
        self.dock.as_ref()
    }

    pub fn windows(&self) -> &[Rect] {
        &self.windows
    }

    /// Consecutive failed refreshes
    pub fn failures(&self) -> u32 {
        self.failures
    }

    /// Whether a refresh is due at `now` (seconds)
    pub fn is_stale(&self, now: f64) -> bool {
        match self.last_refresh {
            Some(last) => now - last >= OBSTACLE_REFRESH_SECS || now < last,
            None => true,
        }
    }

    /// Force the next `refresh` to query
    pub fn invalidate(&mut self) {
        self.last_refresh = None;
    }

    /// Query the provider if stale. Returns whether a query was made.
    ///
    /// A failed query clears the obstacles until the next refresh.
    pub fn refresh(
        &mut self,
        provider: &dyn ObstacleProvider,
        now: f64,
        screen_height: f32,
    ) -> bool {
        if !self.is_stale(now) {
            return false;
        }
        self.last_refresh = Some(now);

        let result = provider
            .dock_rect(screen_height)
            .and_then(|dock| Ok((dock, provider.window_rects(screen_height)?)));

        match result {
            Ok((dock, windows)) => {
                self.dock = (!dock.is_empty()).then_some(dock);
                self.windows.clear();
                self.windows
                    .extend(windows.into_iter().filter(|w| !w.is_empty()));
                self.failures = 0;
            }
            Err(err) => {
                if self.failures == 0 {
                    log::warn!("Obstacle query failed, rain falls freely: {err}");
                } else {
                    log::debug!("Obstacle query still failing ({}): {err}", self.failures);
                }
                self.failures = self.failures.saturating_add(1);
                self.dock = None;
                self.windows.clear();
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    struct FlakyProvider {
        fail: Cell<bool>,
        queries: Cell<u32>,
    }

    impl ObstacleProvider for FlakyProvider {
        fn dock_rect(&self, screen_height: f32) -> Result<Rect, ObstacleError> {
            self.queries.set(self.queries.get() + 1);
            if self.fail.get() {
                return Err(ObstacleError::Unavailable("offline".into()));
            }
            Ok(Rect::new(0.0, screen_height - 60.0, 800.0, 60.0))
        }

        fn window_rects(&self, _screen_height: f32) -> Result<Vec<Rect>, ObstacleError> {
            Ok(vec![Rect::new(100.0, 200.0, 300.0, 200.0), Rect::EMPTY])
        }
    }

    #[test]
    fn test_rect_extent() {
        let r = Rect::new(10.0, 20.0, 30.0, 40.0);
        assert_eq!(r.top(), 20.0);
        assert!(r.spans_x(10.0));
        assert!(r.spans_x(40.0));
        assert!(!r.spans_x(40.5));
        assert!(Rect::EMPTY.is_empty());
    }

    #[test]
    fn test_refresh_is_throttled() {
        let provider = FlakyProvider {
            fail: Cell::new(false),
            queries: Cell::new(0),
        };
        let mut cache = ObstacleCache::new();
        assert!(cache.refresh(&provider, 0.0, 600.0));
        assert!(!cache.refresh(&provider, 0.05, 600.0));
        assert!(cache.refresh(&provider, 0.11, 600.0));
        assert_eq!(provider.queries.get(), 2);

        cache.invalidate();
        assert!(cache.refresh(&provider, 0.12, 600.0));
    }

    #[test]
    fn test_refresh_drops_empty_windows() {
        let provider = FlakyProvider {
            fail: Cell::new(false),
            queries: Cell::new(0),
        };
        let mut cache = ObstacleCache::new();
        cache.refresh(&provider, 0.0, 600.0);
        assert_eq!(cache.windows().len(), 1);
        assert_eq!(cache.dock().map(|d| d.top()), Some(540.0));
    }

    #[test]
    fn test_failed_query_means_no_obstacles() {
        let provider = FlakyProvider {
            fail: Cell::new(false),
            queries: Cell::new(0),
        };
        let mut cache = ObstacleCache::new();
        cache.refresh(&provider, 0.0, 600.0);
        assert!(cache.dock().is_some());

        provider.fail.set(true);
        cache.refresh(&provider, 1.0, 600.0);
        assert!(cache.dock().is_none());
        assert!(cache.windows().is_empty());
        assert_eq!(cache.failures(), 1);

        provider.fail.set(false);
        cache.refresh(&provider, 2.0, 600.0);
        assert!(cache.dock().is_some());
        assert_eq!(cache.failures(), 0);
    }
}
