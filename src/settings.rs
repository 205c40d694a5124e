//! Rain settings and presets
//!
//! Settings are mutated from the menu thread and read once per frame by the
//! simulation, so they live behind a single lock in [`SettingsStore`].

use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::error::SettingsError;

/// Sound character handed to the audio collaborator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum SoundProfile {
    Gentle,
    #[default]
    Drizzle,
    Downpour,
    Storm,
    Zen,
}

impl SoundProfile {
    pub fn as_str(&self) -> &'static str {
        match self {
            SoundProfile::Gentle => "gentle",
            SoundProfile::Drizzle => "drizzle",
            SoundProfile::Downpour => "downpour",
            SoundProfile::Storm => "storm",
            SoundProfile::Zen => "zen",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "gentle" => Some(SoundProfile::Gentle),
            "drizzle" => Some(SoundProfile::Drizzle),
            "downpour" => Some(SoundProfile::Downpour),
            "storm" => Some(SoundProfile::Storm),
            "zen" => Some(SoundProfile::Zen),
            _ => None,
        }
    }
}

/// Named settings bundles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Preset {
    GentleMist,
    SpringDrizzle,
    TropicalDownpour,
    WindyStorm,
    ZenGarden,
}

impl Preset {
    pub const ALL: [Preset; 5] = [
        Preset::GentleMist,
        Preset::SpringDrizzle,
        Preset::TropicalDownpour,
        Preset::WindyStorm,
        Preset::ZenGarden,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Preset::GentleMist => "gentle-mist",
            Preset::SpringDrizzle => "spring-drizzle",
            Preset::TropicalDownpour => "tropical-downpour",
            Preset::WindyStorm => "windy-storm",
            Preset::ZenGarden => "zen-garden",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().replace('_', "-").as_str() {
            "gentle-mist" => Some(Preset::GentleMist),
            "spring-drizzle" => Some(Preset::SpringDrizzle),
            "tropical-downpour" => Some(Preset::TropicalDownpour),
            "windy-storm" => Some(Preset::WindyStorm),
            "zen-garden" => Some(Preset::ZenGarden),
            _ => None,
        }
    }

    /// The settings this preset applies. Sound enablement is left untouched.
    fn apply_to(&self, s: &mut Settings) {
        // (intensity, direction, bounce, size, speed, thunder, profile)
        let (intensity, direction, bounce, size, speed, thunder, profile) = match self {
            Preset::GentleMist => (0.4, 0.0, 0.3, 0.7, 0.7, 0.0, SoundProfile::Gentle),
            Preset::SpringDrizzle => (0.8, 3.0, 0.6, 0.9, 0.9, 0.005, SoundProfile::Drizzle),
            Preset::TropicalDownpour => (2.5, -2.0, 1.0, 1.3, 1.3, 0.02, SoundProfile::Downpour),
            Preset::WindyStorm => (2.0, 12.0, 0.8, 1.1, 1.2, 0.05, SoundProfile::Storm),
            Preset::ZenGarden => (0.6, 0.0, 0.0, 1.0, 0.8, 0.0, SoundProfile::Zen),
        };
        s.intensity = intensity;
        s.direction = direction;
        s.bounce_intensity = bounce;
        s.drop_size_multiplier = size;
        s.drop_speed_multiplier = speed;
        s.thunder_probability = thunder;
        s.sound_profile = profile;
    }
}

/// Rain settings snapshot
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Population multiplier (MIN_INTENSITY..=MAX_INTENSITY)
    pub intensity: f32,
    /// Wind direction proxy (-15..=15, negative blows left)
    pub direction: f32,
    /// Restitution scale (0 = no rebound)
    pub bounce_intensity: f32,
    pub drop_size_multiplier: f32,
    pub drop_speed_multiplier: f32,
    /// Thunder chance per second (0.0 - 1.0)
    pub thunder_probability: f32,

    // === Audio ===
    pub sound_enabled: bool,
    pub sound_profile: SoundProfile,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            intensity: 1.0,
            direction: 0.0,
            bounce_intensity: 0.5,
            drop_size_multiplier: 1.0,
            drop_speed_multiplier: 1.0,
            thunder_probability: 0.0,
            sound_enabled: true,
            sound_profile: SoundProfile::Drizzle,
        }
    }
}

impl Settings {
    /// Create settings from a preset (applies preset values over defaults)
    pub fn from_preset(preset: Preset) -> Self {
        let mut settings = Self::default();
        settings.apply_preset(preset);
        settings
    }

    pub fn apply_preset(&mut self, preset: Preset) {
        preset.apply_to(self);
    }

    /// Horizontal wind velocity (units/s) for the current direction
    pub fn wind_velocity(&self) -> f32 {
        self.direction.clamp(-MAX_DIRECTION, MAX_DIRECTION) * WIND_PER_DIRECTION
    }

    /// Raindrop population for a display of the given logical width
    pub fn target_drop_count(&self, screen_width: f32) -> usize {
        let width_factor = (screen_width / REFERENCE_WIDTH).clamp(0.25, 1.0);
        let count = (BASE_DROP_COUNT as f32 * self.intensity * width_factor).round();
        (count.max(0.0) as usize).min(MAX_RAINDROPS)
    }

    /// Clamp every field into its accepted range
    pub fn sanitized(mut self) -> Self {
        self.intensity = clamp_or(self.intensity, MIN_INTENSITY, MAX_INTENSITY, 1.0);
        self.direction = clamp_or(self.direction, -MAX_DIRECTION, MAX_DIRECTION, 0.0);
        self.bounce_intensity = clamp_or(self.bounce_intensity, 0.0, 2.0, 0.5);
        self.drop_size_multiplier = clamp_or(self.drop_size_multiplier, 0.25, 3.0, 1.0);
        self.drop_speed_multiplier = clamp_or(self.drop_speed_multiplier, 0.25, 3.0, 1.0);
        self.thunder_probability = clamp_or(self.thunder_probability, 0.0, 1.0, 0.0);
        self
    }
}

/// NaN falls back to the default
fn clamp_or(value: f32, min: f32, max: f32, fallback: f32) -> f32 {
    if value.is_nan() {
        fallback
    } else {
        value.clamp(min, max)
    }
}

/// Notified synchronously after every settings write
pub trait SettingsListener: Send + Sync {
    fn settings_changed(&self, settings: &Settings);
}

/// Shared, thread-safe settings
///
/// Writers hold the lock only long enough to update the struct and copy a
/// snapshot; listeners run after the lock is released.
#[derive(Default)]
pub struct SettingsStore {
    settings: Mutex<Settings>,
    listeners: Mutex<Vec<Arc<dyn SettingsListener>>>,
}

impl SettingsStore {
    pub fn new(settings: Settings) -> Self {
        Self {
            settings: Mutex::new(settings.sanitized()),
            listeners: Mutex::new(Vec::new()),
        }
    }

    pub fn shared(settings: Settings) -> Arc<Self> {
        Arc::new(Self::new(settings))
    }

    /// Register a listener. It is immediately told the current settings.
    pub fn subscribe(&self, listener: Arc<dyn SettingsListener>) {
        let snapshot = self.snapshot();
        listener.settings_changed(&snapshot);
        self.listeners.lock().push(listener);
    }

    /// Consistent copy of every field
    pub fn snapshot(&self) -> Settings {
        *self.settings.lock()
    }

    pub fn intensity(&self) -> f32 {
        self.settings.lock().intensity
    }

    pub fn direction(&self) -> f32 {
        self.settings.lock().direction
    }

    pub fn bounce_intensity(&self) -> f32 {
        self.settings.lock().bounce_intensity
    }

    pub fn drop_size_multiplier(&self) -> f32 {
        self.settings.lock().drop_size_multiplier
    }

    pub fn drop_speed_multiplier(&self) -> f32 {
        self.settings.lock().drop_speed_multiplier
    }

    pub fn thunder_probability(&self) -> f32 {
        self.settings.lock().thunder_probability
    }

    pub fn sound_enabled(&self) -> bool {
        self.settings.lock().sound_enabled
    }

    pub fn sound_profile(&self) -> SoundProfile {
        self.settings.lock().sound_profile
    }

    pub fn set_intensity(&self, value: f32) {
        self.update(|s| s.intensity = value);
    }

    pub fn set_direction(&self, value: f32) {
        self.update(|s| s.direction = value);
    }

    pub fn set_bounce_intensity(&self, value: f32) {
        self.update(|s| s.bounce_intensity = value);
    }

    pub fn set_drop_size_multiplier(&self, value: f32) {
        self.update(|s| s.drop_size_multiplier = value);
    }

    pub fn set_drop_speed_multiplier(&self, value: f32) {
        self.update(|s| s.drop_speed_multiplier = value);
    }

    pub fn set_thunder_probability(&self, value: f32) {
        self.update(|s| s.thunder_probability = value);
    }

    pub fn set_sound_enabled(&self, value: bool) {
        self.update(|s| s.sound_enabled = value);
    }

    pub fn set_sound_profile(&self, value: SoundProfile) {
        self.update(|s| s.sound_profile = value);
    }

    /// Replace every field at once
    pub fn replace(&self, settings: Settings) {
        self.update(|s| *s = settings);
    }

    /// Apply a preset by name
    pub fn apply_preset(&self, name: &str) -> Result<Preset, SettingsError> {
        let preset =
            Preset::from_str(name).ok_or_else(|| SettingsError::UnknownPreset(name.to_string()))?;
        self.apply(preset);
        Ok(preset)
    }

    /// Apply a preset, all fields under one lock
    pub fn apply(&self, preset: Preset) {
        log::info!("Applying preset {}", preset.as_str());
        self.update(|s| s.apply_preset(preset));
    }

    fn update(&self, f: impl FnOnce(&mut Settings)) {
        let snapshot = {
            let mut settings = self.settings.lock();
            f(&mut settings);
            *settings = settings.sanitized();
            *settings
        };
        // Clone the list so a listener may subscribe others without deadlocking
        let listeners = self.listeners.lock().clone();
        for listener in &listeners {
            listener.settings_changed(&snapshot);
        }
    }
}
