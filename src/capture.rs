//! Headless rendering: step the simulation at a fixed rate and write the last frame as PNG.

use crate::camera3d::Camera3D;
use crate::cli::CaptureRequest;
use crate::config::AppConfig;
use crate::cycle::TimeOfDay;
use crate::events::SkyEvent;
use crate::outline::{OutlinePicker, OutlineStyle};
use crate::renderer::software::{SoftwareFrame, SoftwareInputs};
use crate::renderer::{FrameDrawList, SceneLighting};
use crate::scene::RoomScene;
use crate::simulation::SimulationContext;
use anyhow::{Context, Result};
use std::fs;
use std::path::PathBuf;

pub const CAPTURE_STEP_SECONDS: f32 = 1.0 / 60.0;

#[derive(Debug, Clone, PartialEq)]
pub struct CaptureSummary {
    pub output: Option<PathBuf>,
    pub frames: u32,
    pub size: (u32, u32),
    pub progress: f32,
    pub time_of_day: TimeOfDay,
    pub lightning_flashes: usize,
}

/// Simulates `frames` fixed steps (at least one) and rasterizes the final state.
pub fn capture_frame(config: &AppConfig, frames: u32) -> (SoftwareFrame, CaptureSummary) {
    let (width, height) = (config.window.width.max(1), config.window.height.max(1));
    let scene = RoomScene::load_or_demo(config.scene.path.as_deref(), &config.scene.tag_rules());
    let camera = Camera3D::from_config(&config.camera);
    let mut sim = SimulationContext::new(config, config.weather.canvas_size(width, height));

    let frames = frames.max(1);
    let mut lightning_flashes = 0;
    let mut snapshot = sim.tick(CAPTURE_STEP_SECONDS);
    lightning_flashes += sim.pump_audio(CAPTURE_STEP_SECONDS).iter().filter(|e| is_lightning(e)).count();
    for _ in 1..frames {
        snapshot = sim.tick(CAPTURE_STEP_SECONDS);
        lightning_flashes += sim.pump_audio(CAPTURE_STEP_SECONDS).iter().filter(|e| is_lightning(e)).count();
    }

    let picker = OutlinePicker::new(OutlineStyle::from_config(&config.outline));
    let draws = FrameDrawList::collect(&scene, &picker);
    let mut frame = SoftwareFrame::new(width, height);
    frame.render(&SoftwareInputs {
        draws: &draws,
        view: camera.view_matrix(),
        proj: camera.projection_matrix(width as f32 / height as f32),
        sky: sim.canvas(),
        clear_color: config.scene.background,
        lighting: SceneLighting::default(),
        outline: picker.style(),
    });
    let summary = CaptureSummary {
        output: None,
        frames,
        size: (width, height),
        progress: snapshot.progress,
        time_of_day: snapshot.time_of_day,
        lightning_flashes,
    };
    sim.shutdown();
    (frame, summary)
}

pub fn run_capture(config: &AppConfig, request: &CaptureRequest) -> Result<CaptureSummary> {
    let (frame, mut summary) = capture_frame(config, request.frames);
    if let Some(parent) = request.output.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create capture directory {}", parent.display()))?;
    }
    frame
        .to_image()
        .save(&request.output)
        .with_context(|| format!("Failed to write capture {}", request.output.display()))?;
    log::info!(
        "[capture] wrote {} ({}x{}, {} frame(s), {} at {:.2})",
        request.output.display(),
        summary.size.0,
        summary.size.1,
        summary.frames,
        summary.time_of_day,
        summary.progress
    );
    summary.output = Some(request.output.clone());
    Ok(summary)
}

fn is_lightning(event: &SkyEvent) -> bool {
    matches!(event, SkyEvent::Lightning(_))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::weather::WeatherMode;

    fn small_config() -> AppConfig {
        let mut config = AppConfig::default();
        config.window.width = 96;
        config.window.height = 64;
        config.weather.seed = Some(11);
        config.audio.enabled = false;
        config
    }

    #[test]
    fn capture_writes_png_with_requested_size() {
        let dir = tempfile::tempdir().expect("temp dir");
        let request = CaptureRequest { output: dir.path().join("shots").join("room.png"), frames: 3 };
        let summary = run_capture(&small_config(), &request).expect("capture");
        assert_eq!(summary.frames, 3);
        let image = image::open(&request.output).expect("read png").to_rgba8();
        assert_eq!(image.dimensions(), (96, 64));
    }

    #[test]
    fn paused_capture_keeps_start_progress() {
        let mut config = small_config();
        config.cycle.paused = true;
        config.cycle.start_progress = 0.5;
        config.weather.mode = WeatherMode::Snow;
        let (_, summary) = capture_frame(&config, 10);
        assert_eq!(summary.progress, 0.5);
        assert_eq!(summary.time_of_day, TimeOfDay::Night);
    }
}
