//! Rain Overlay entry point
//!
//! Runs the frame driver headless against a fixed desktop layout and logs
//! what the rain is doing. Usage: `rain-overlay [preset] [config.json]`

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use rain_overlay::audio::{AudioController, AudioCue};
use rain_overlay::obstacles::StaticObstacles;
use rain_overlay::renderer::HeadlessSink;
use rain_overlay::{DrawableSize, FrameDriver, FrameReport, OverlayConfig, Rect, SettingsStore};

const SCREEN_WIDTH: f32 = 1440.0;
const SCREEN_HEIGHT: f32 = 900.0;
const DOCK_HEIGHT: f32 = 70.0;
const REFRESH_HZ: f64 = 60.0;
const RUN_SECONDS: u32 = 10;

fn main() -> ExitCode {
    env_logger::init();
    log::info!("Rain Overlay (headless) starting...");

    let mut preset = None;
    let mut config_path = None;
    for arg in std::env::args().skip(1) {
        if arg.ends_with(".json") {
            config_path = Some(PathBuf::from(arg));
        } else {
            preset = Some(arg);
        }
    }

    let config = match config_path {
        Some(path) => match OverlayConfig::load(&path) {
            Ok(config) => config,
            Err(err) => {
                log::error!("Failed to load {}: {err}", path.display());
                return ExitCode::FAILURE;
            }
        },
        None => OverlayConfig::default(),
    };

    let settings = match config.effective_settings() {
        Ok(settings) => settings,
        Err(err) => {
            log::error!("{err}");
            return ExitCode::FAILURE;
        }
    };

    let store = SettingsStore::shared(settings);
    let audio = Arc::new(AudioController::default());
    store.subscribe(audio.clone());

    if let Some(name) = preset {
        if let Err(err) = store.apply_preset(&name) {
            log::error!("{err}");
            return ExitCode::FAILURE;
        }
    }

    let dock_width = SCREEN_WIDTH * 0.6;
    let obstacles = StaticObstacles::new(
        Rect::new(
            (SCREEN_WIDTH - dock_width) / 2.0,
            SCREEN_HEIGHT - DOCK_HEIGHT,
            dock_width,
            DOCK_HEIGHT,
        ),
        vec![Rect::new(260.0, 180.0, 720.0, 480.0)],
    );

    let mut driver = FrameDriver::new(store, config.physics, obstacles);
    let mut sink = HeadlessSink::default();
    let size = DrawableSize::new(SCREEN_WIDTH, SCREEN_HEIGHT, 2.0);

    let frames_per_second = REFRESH_HZ as u32;
    for second in 0..RUN_SECONDS {
        let mut totals = FrameReport::default();
        let mut thunder = 0;

        for i in 0..frames_per_second {
            let now = (second * frames_per_second + i) as f64 / REFRESH_HZ;
            let report = driver.frame(now, size, &mut sink);
            totals.window_impacts += report.window_impacts;
            totals.dock_impacts += report.dock_impacts;
            totals.splashes_spawned += report.splashes_spawned;
            totals.splashes_dropped += report.splashes_dropped;
            totals.respawned += report.respawned;
            totals.raindrop_instances = report.raindrop_instances;
            totals.splash_instances = report.splash_instances;

            for cue in audio.on_frame(&report) {
                match cue {
                    AudioCue::RainBed { gain } => log::info!("Audio: rain bed gain {gain:.2}"),
                    AudioCue::Thunder { strength } => {
                        thunder += 1;
                        log::info!("Audio: thunder {strength:.2}");
                    }
                }
            }
        }

        log::info!(
            "t={:>2}s drops={} splashes={} impacts={} (window {}, dock {}) spawned={} dropped={} respawned={} thunder={}",
            second + 1,
            totals.raindrop_instances,
            totals.splash_instances,
            totals.impacts(),
            totals.window_impacts,
            totals.dock_impacts,
            totals.splashes_spawned,
            totals.splashes_dropped,
            totals.respawned,
            thunder
        );
    }

    log::info!("Done: {} frames drawn", sink.frames);
    ExitCode::SUCCESS
}
