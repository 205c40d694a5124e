//! Fixed-capacity particle storage
//!
//! Raindrops and splashes live in boxed slices sized once at construction.
//! Callers address particles by slot index; nothing is pushed or removed
//! after initialization.

use super::particle::{Raindrop, SplashParticle, SplashSeed};

pub struct ParticlePool {
    pub(crate) raindrops: Box<[Raindrop]>,
    pub(crate) splashes: Box<[SplashParticle]>,
    /// Inactive splash slots, popped on spawn. Capacity equals the pool size.
    free_splashes: Vec<usize>,
    /// Raindrop slots below this index are kept populated
    target_drops: usize,
}

impl ParticlePool {
    /// Allocate both pools. All raindrops start inactive.
    pub fn new(raindrop_capacity: usize, splash_capacity: usize) -> Self {
        Self {
            raindrops: vec![Raindrop::default(); raindrop_capacity].into_boxed_slice(),
            splashes: vec![SplashParticle::default(); splash_capacity].into_boxed_slice(),
            // Reverse so slot 0 is handed out first
            free_splashes: (0..splash_capacity).rev().collect(),
            target_drops: raindrop_capacity,
        }
    }

    #[inline]
    pub fn raindrop_capacity(&self) -> usize {
        self.raindrops.len()
    }

    #[inline]
    pub fn splash_capacity(&self) -> usize {
        self.splashes.len()
    }

    pub fn target_drops(&self) -> usize {
        self.target_drops
    }

    /// Set the populated raindrop range, clamped to capacity
    pub fn set_target_drops(&mut self, target: usize) {
        self.target_drops = target.min(self.raindrop_capacity());
    }

    pub fn raindrop(&self, index: usize) -> Option<&Raindrop> {
        self.raindrops.get(index)
    }

    pub fn raindrop_mut(&mut self, index: usize) -> Option<&mut Raindrop> {
        self.raindrops.get_mut(index)
    }

    pub fn raindrops(&self) -> &[Raindrop] {
        &self.raindrops
    }

    pub fn splashes(&self) -> &[SplashParticle] {
        &self.splashes
    }

    /// Active raindrops, in slot order
    pub fn active_raindrops(&self) -> impl Iterator<Item = &Raindrop> + '_ {
        self.raindrops.iter().filter(|d| d.is_active)
    }

    /// Active splashes, in slot order
    pub fn active_splashes(&self) -> impl Iterator<Item = &SplashParticle> + '_ {
        self.splashes.iter().filter(|s| s.is_active)
    }

    pub fn active_raindrop_count(&self) -> usize {
        self.active_raindrops().count()
    }

    pub fn active_splash_count(&self) -> usize {
        self.splash_capacity() - self.free_splashes.len()
    }

    /// Start a splash in a free slot. Returns false when every slot is busy.
    pub fn try_spawn_splash(&mut self, seed: SplashSeed) -> bool {
        let Some(index) = self.free_splashes.pop() else {
            return false;
        };
        debug_assert!(!self.splashes[index].is_active);
        self.splashes[index].reset(&seed);
        true
    }

    /// Return a splash slot to the free list
    pub(crate) fn release_splash(&mut self, index: usize) {
        let splash = &mut self.splashes[index];
        if splash.is_active {
            splash.is_active = false;
            // Never exceeds capacity: each slot is pushed once per activation
            self.free_splashes.push(index);
        }
    }

    /// Deactivate every particle, keeping storage
    pub fn clear(&mut self) {
        for drop in self.raindrops.iter_mut() {
            drop.deactivate();
        }
        for splash in self.splashes.iter_mut() {
            splash.is_active = false;
        }
        self.free_splashes.clear();
        self.free_splashes.extend((0..self.splashes.len()).rev());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec2;
    use proptest::prelude::*;

    fn seed() -> SplashSeed {
        SplashSeed {
            pos: Vec2::new(10.0, 10.0),
            vel: Vec2::new(0.0, -50.0),
            radius: 1.0,
            lifetime: 0.5,
        }
    }

    #[test]
    fn test_new_pool_is_inactive() {
        let pool = ParticlePool::new(16, 8);
        assert_eq!(pool.raindrop_capacity(), 16);
        assert_eq!(pool.splash_capacity(), 8);
        assert_eq!(pool.active_raindrops().count(), 0);
        assert_eq!(pool.active_splash_count(), 0);
    }

    #[test]
    fn test_spawn_beyond_capacity_is_noop() {
        let mut pool = ParticlePool::new(1, 3);
        assert!(pool.try_spawn_splash(seed()));
        assert!(pool.try_spawn_splash(seed()));
        assert!(pool.try_spawn_splash(seed()));
        assert!(!pool.try_spawn_splash(seed()));
        assert_eq!(pool.active_splash_count(), 3);
    }

    #[test]
    fn test_released_slot_is_reused() {
        let mut pool = ParticlePool::new(1, 2);
        pool.try_spawn_splash(seed());
        pool.try_spawn_splash(seed());
        pool.release_splash(0);
        // Double release must not duplicate the free slot
        pool.release_splash(0);
        assert!(pool.try_spawn_splash(seed()));
        assert!(!pool.try_spawn_splash(seed()));
        assert!(pool.splashes()[0].is_active);
    }

    #[test]
    fn test_target_clamped_to_capacity() {
        let mut pool = ParticlePool::new(10, 1);
        pool.set_target_drops(50);
        assert_eq!(pool.target_drops(), 10);
        pool.set_target_drops(4);
        assert_eq!(pool.target_drops(), 4);
    }

    #[test]
    fn test_clear_frees_everything() {
        let mut pool = ParticlePool::new(2, 2);
        pool.raindrops[0].is_active = true;
        pool.try_spawn_splash(seed());
        pool.clear();
        assert_eq!(pool.active_raindrop_count(), 0);
        assert_eq!(pool.active_splash_count(), 0);
        assert!(pool.try_spawn_splash(seed()));
        assert!(pool.try_spawn_splash(seed()));
    }

    proptest! {
        #[test]
        fn prop_active_splashes_never_exceed_capacity(
            capacity in 1usize..32,
            ops in proptest::collection::vec((any::<bool>(), 0usize..32), 0..200),
        ) {
            let mut pool = ParticlePool::new(1, capacity);
            for (spawn, index) in ops {
                if spawn {
                    pool.try_spawn_splash(seed());
                } else {
                    pool.release_splash(index % capacity);
                }
                prop_assert!(pool.active_splashes().count() <= capacity);
                prop_assert_eq!(pool.active_splashes().count(), pool.active_splash_count());
            }
        }
    }
}
