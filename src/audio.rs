//! Audio cues
//!
//! The overlay does not synthesize sound itself. `AudioController` follows
//! the settings store and turns frame reports into cues for whatever host
//! plays the rain bed and thunder.

use parking_lot::Mutex;

use crate::consts::MAX_INTENSITY;
use crate::driver::FrameReport;
use crate::settings::{Settings, SettingsListener, SoundProfile};

/// Smallest rain-bed gain change worth re-sending
const GAIN_EPSILON: f32 = 0.01;

/// Sound the host should play
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AudioCue {
    /// Set the looping rain bed to this gain (0 silences it)
    RainBed { gain: f32 },
    /// One thunder clap, 0.0 - 1.0
    Thunder { strength: f32 },
}

impl SoundProfile {
    /// Rain bed loudness at full intensity
    fn bed_gain(&self) -> f32 {
        match self {
            SoundProfile::Gentle => 0.5,
            SoundProfile::Drizzle => 0.7,
            SoundProfile::Downpour => 1.0,
            SoundProfile::Storm => 0.9,
            SoundProfile::Zen => 0.4,
        }
    }

    fn thunder_strength(&self) -> f32 {
        match self {
            SoundProfile::Gentle => 0.4,
            SoundProfile::Drizzle => 0.6,
            SoundProfile::Downpour => 0.8,
            SoundProfile::Storm => 1.0,
            SoundProfile::Zen => 0.3,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Mix {
    enabled: bool,
    profile: SoundProfile,
    bed_gain: f32,
    /// Gain last sent to the host, `None` before the first cue
    sent_gain: Option<f32>,
}

/// Settings-driven audio state
pub struct AudioController {
    mix: Mutex<Mix>,
    master_volume: f32,
}

impl Default for AudioController {
    fn default() -> Self {
        Self::new(0.8)
    }
}

impl AudioController {
    pub fn new(master_volume: f32) -> Self {
        Self {
            mix: Mutex::new(Mix {
                enabled: false,
                profile: SoundProfile::default(),
                bed_gain: 0.0,
                sent_gain: None,
            }),
            master_volume: master_volume.clamp(0.0, 1.0),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.mix.lock().enabled
    }

    pub fn profile(&self) -> SoundProfile {
        self.mix.lock().profile
    }

    /// Current target rain-bed gain, 0 when muted
    pub fn bed_gain(&self) -> f32 {
        let mix = self.mix.lock();
        if mix.enabled { mix.bed_gain } else { 0.0 }
    }

    /// Cues for one frame
    ///
    /// The rain bed is only re-sent when its gain moved; thunder is passed
    /// through while sound is enabled.
    pub fn on_frame(&self, report: &FrameReport) -> Vec<AudioCue> {
        let mut mix = self.mix.lock();
        let mut cues = Vec::new();

        let gain = if mix.enabled { mix.bed_gain } else { 0.0 };
        let changed = mix
            .sent_gain
            .is_none_or(|sent| (sent - gain).abs() >= GAIN_EPSILON);
        if changed {
            mix.sent_gain = Some(gain);
            cues.push(AudioCue::RainBed { gain });
        }

        if report.thunder && mix.enabled {
            cues.push(AudioCue::Thunder {
                strength: mix.profile.thunder_strength() * self.master_volume,
            });
        }

        cues
    }
}

impl SettingsListener for AudioController {
    fn settings_changed(&self, settings: &Settings) {
        let mut mix = self.mix.lock();
        let level = (settings.intensity / MAX_INTENSITY).clamp(0.0, 1.0).sqrt();
        mix.enabled = settings.sound_enabled;
        mix.profile = settings.sound_profile;
        mix.bed_gain = level * settings.sound_profile.bed_gain() * self.master_volume;
        log::debug!(
            "Audio mix: enabled={} profile={} gain={:.2}",
            mix.enabled,
            mix.profile.as_str(),
            mix.bed_gain
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::{Preset, SettingsStore};
    use std::sync::Arc;

    fn thunder() -> FrameReport {
        FrameReport {
            thunder: true,
            ..FrameReport::default()
        }
    }

    #[test]
    fn test_subscribe_picks_up_settings() {
        let store = SettingsStore::shared(Settings::default());
        let audio = Arc::new(AudioController::new(1.0));
        store.subscribe(audio.clone());

        assert!(audio.is_enabled());
        assert_eq!(audio.profile(), SoundProfile::Drizzle);
        assert!(audio.bed_gain() > 0.0);
    }

    #[test]
    fn test_bed_only_resent_on_change() {
        let store = SettingsStore::shared(Settings::default());
        let audio = Arc::new(AudioController::new(1.0));
        store.subscribe(audio.clone());

        let first = audio.on_frame(&FrameReport::default());
        assert!(matches!(first.as_slice(), [AudioCue::RainBed { .. }]));
        assert!(audio.on_frame(&FrameReport::default()).is_empty());

        store.set_intensity(3.0);
        let cues = audio.on_frame(&FrameReport::default());
        let [AudioCue::RainBed { gain }] = cues.as_slice() else {
            panic!("expected a rain bed cue, got {cues:?}");
        };
        assert!((*gain - 0.7).abs() < 1e-5);
    }

    #[test]
    fn test_mute_silences_everything() {
        let store = SettingsStore::shared(Settings::default());
        let audio = Arc::new(AudioController::new(1.0));
        store.subscribe(audio.clone());
        audio.on_frame(&FrameReport::default());

        store.set_sound_enabled(false);
        assert_eq!(audio.on_frame(&thunder()), vec![AudioCue::RainBed { gain: 0.0 }]);
        assert!(audio.on_frame(&thunder()).is_empty());
    }

    #[test]
    fn test_thunder_follows_profile() {
        let store = SettingsStore::shared(Settings::default());
        let audio = Arc::new(AudioController::new(0.5));
        store.subscribe(audio.clone());
        store.apply(Preset::WindyStorm);

        let cues = audio.on_frame(&thunder());
        assert!(cues.contains(&AudioCue::Thunder { strength: 0.5 }));
    }
}
