use crate::particles::{DEFAULT_RAIN_DROPS, DEFAULT_SNOW_FLAKES};
use crate::scene::TagRules;
use crate::weather::WeatherMode;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::Path;

pub const DEFAULT_CONFIG_PATH: &str = "config/app.json";

pub const DEFAULT_OUTLINE_ALLOW_LIST: [&str; 34] = [
    "Wall_Lamp",
    "TubeLight",
    "Desk",
    "Shelf_1",
    "Shelf_2",
    "Shelf_3",
    "Screen",
    "Speaker_1",
    "Speaker_2",
    "Drawer_1",
    "Drawer_2",
    "Drawer_3",
    "Drawer_4",
    "Blender",
    "HTML",
    "Unity",
    "C++",
    "JS",
    "ThreeJs",
    "MongoDB",
    "React",
    "Python",
    "Laptop",
    "Resume",
    "Phone",
    "Projects",
    "Trophy",
    "Ac_base",
    "Coffee",
    "Bottle",
    "Telescope",
    "Cat",
    "Krishna_Statue",
    "Mini_Board",
];

#[derive(Debug, Clone, Deserialize)]
pub struct WindowConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
    pub vsync: bool,
    pub fullscreen: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CycleConfig {
    #[serde(default = "CycleConfig::default_duration")]
    pub duration_seconds: f32,
    #[serde(default)]
    pub start_progress: f32,
    #[serde(default)]
    pub paused: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WeatherConfig {
    #[serde(default)]
    pub mode: WeatherMode,
    #[serde(default = "WeatherConfig::default_rain_drops")]
    pub rain_drops: usize,
    #[serde(default = "WeatherConfig::default_snow_flakes")]
    pub snow_flakes: usize,
    #[serde(default)]
    pub seed: Option<u64>,
    #[serde(default = "WeatherConfig::default_canvas_scale")]
    pub canvas_scale: f32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CameraConfig {
    #[serde(default = "CameraConfig::default_position")]
    pub position: [f32; 3],
    #[serde(default = "CameraConfig::default_target")]
    pub target: [f32; 3],
    #[serde(default = "CameraConfig::default_fov")]
    pub fov_degrees: f32,
    #[serde(default = "CameraConfig::default_near")]
    pub near: f32,
    #[serde(default = "CameraConfig::default_far")]
    pub far: f32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SceneConfig {
    #[serde(default)]
    pub path: Option<String>,
    #[serde(default = "SceneConfig::default_window_panes")]
    pub window_panes: Vec<String>,
    #[serde(default = "SceneConfig::default_allow_list")]
    pub outline_allow_list: Vec<String>,
    #[serde(default = "SceneConfig::default_background")]
    pub background: [f32; 3],
}

#[derive(Debug, Clone, Deserialize)]
pub struct OutlineConfig {
    #[serde(default = "OutlineConfig::default_thickness")]
    pub thickness: f32,
    #[serde(default = "OutlineConfig::default_color")]
    pub color: [f32; 3],
}

#[derive(Debug, Clone, Deserialize)]
pub struct AudioConfig {
    #[serde(default = "AudioConfig::default_enabled")]
    pub enabled: bool,
    #[serde(default = "AudioConfig::default_trigger_capacity")]
    pub trigger_capacity: usize,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub window: WindowConfig,
    #[serde(default)]
    pub cycle: CycleConfig,
    #[serde(default)]
    pub weather: WeatherConfig,
    #[serde(default)]
    pub camera: CameraConfig,
    #[serde(default)]
    pub scene: SceneConfig,
    #[serde(default)]
    pub outline: OutlineConfig,
    #[serde(default)]
    pub audio: AudioConfig,
}

#[derive(Debug, Clone, Default)]
pub struct AppConfigOverrides {
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub vsync: Option<bool>,
    pub weather: Option<WeatherMode>,
    pub cycle_seconds: Option<f32>,
    pub progress: Option<f32>,
    pub paused: Option<bool>,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self { title: "Skyroom".to_string(), width: 1280, height: 720, vsync: true, fullscreen: false }
    }
}

impl CycleConfig {
    const fn default_duration() -> f32 {
        60.0
    }
}

impl Default for CycleConfig {
    fn default() -> Self {
        Self { duration_seconds: Self::default_duration(), start_progress: 0.0, paused: false }
    }
}

impl WeatherConfig {
    const fn default_rain_drops() -> usize {
        DEFAULT_RAIN_DROPS
    }

    const fn default_snow_flakes() -> usize {
        DEFAULT_SNOW_FLAKES
    }

    const fn default_canvas_scale() -> f32 {
        1.0
    }

    /// Sky canvas size for a viewport, never smaller than one pixel.
    pub fn canvas_size(&self, width: u32, height: u32) -> (u32, u32) {
        let scale = if self.canvas_scale.is_finite() { self.canvas_scale.clamp(0.05, 1.0) } else { 1.0 };
        let w = ((width as f32) * scale).round().max(1.0) as u32;
        let h = ((height as f32) * scale).round().max(1.0) as u32;
        (w, h)
    }
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            mode: WeatherMode::default(),
            rain_drops: Self::default_rain_drops(),
            snow_flakes: Self::default_snow_flakes(),
            seed: None,
            canvas_scale: Self::default_canvas_scale(),
        }
    }
}

impl CameraConfig {
    const fn default_position() -> [f32; 3] {
        [0.0, 1.45, 2.4]
    }

    const fn default_target() -> [f32; 3] {
        [0.0, 1.2, -1.6]
    }

    const fn default_fov() -> f32 {
        60.0
    }

    const fn default_near() -> f32 {
        0.05
    }

    const fn default_far() -> f32 {
        50.0
    }
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            position: Self::default_position(),
            target: Self::default_target(),
            fov_degrees: Self::default_fov(),
            near: Self::default_near(),
            far: Self::default_far(),
        }
    }
}

impl SceneConfig {
    fn default_window_panes() -> Vec<String> {
        vec!["Win_1".to_string(), "Win_2".to_string()]
    }

    fn default_allow_list() -> Vec<String> {
        DEFAULT_OUTLINE_ALLOW_LIST.iter().map(|s| s.to_string()).collect()
    }

    const fn default_background() -> [f32; 3] {
        [0.0, 0.0, 0.0]
    }

    pub fn tag_rules(&self) -> TagRules {
        TagRules { window_panes: self.window_panes.clone(), outline_allow_list: self.outline_allow_list.clone() }
    }
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            path: None,
            window_panes: Self::default_window_panes(),
            outline_allow_list: Self::default_allow_list(),
            background: Self::default_background(),
        }
    }
}

impl OutlineConfig {
    const fn default_thickness() -> f32 {
        0.008
    }

    const fn default_color() -> [f32; 3] {
        [1.0, 1.0, 1.0]
    }
}

impl Default for OutlineConfig {
    fn default() -> Self {
        Self { thickness: Self::default_thickness(), color: Self::default_color() }
    }
}

impl AudioConfig {
    const fn default_enabled() -> bool {
        true
    }

    const fn default_trigger_capacity() -> usize {
        32
    }
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self { enabled: Self::default_enabled(), trigger_capacity: Self::default_trigger_capacity() }
    }
}

impl AppConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes =
            fs::read(path).with_context(|| format!("Failed to read config file {}", path.display()))?;
        let cfg = serde_json::from_slice(&bytes)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;
        Ok(cfg)
    }

    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        match Self::load(path) {
            Ok(cfg) => cfg,
            Err(err) => {
                log::warn!("[config] {err:#}. Falling back to defaults.");
                Self::default()
            }
        }
    }

    pub fn apply_overrides(&mut self, overrides: &AppConfigOverrides) {
        if let Some(width) = overrides.width {
            self.window.width = width;
        }
        if let Some(height) = overrides.height {
            self.window.height = height;
        }
        if let Some(vsync) = overrides.vsync {
            self.window.vsync = vsync;
        }
        if let Some(mode) = overrides.weather {
            self.weather.mode = mode;
        }
        if let Some(seconds) = overrides.cycle_seconds {
            self.cycle.duration_seconds = seconds;
        }
        if let Some(progress) = overrides.progress {
            self.cycle.start_progress = progress;
        }
        if let Some(paused) = overrides.paused {
            self.cycle.paused = paused;
        }
    }
}

impl AppConfigOverrides {
    pub fn is_empty(&self) -> bool {
        self.applied_fields().is_empty()
    }

    pub fn applied_fields(&self) -> Vec<&'static str> {
        let mut fields = Vec::new();
        if self.width.is_some() {
            fields.push("width");
        }
        if self.height.is_some() {
            fields.push("height");
        }
        if self.vsync.is_some() {
            fields.push("vsync");
        }
        if self.weather.is_some() {
            fields.push("weather");
        }
        if self.cycle_seconds.is_some() {
            fields.push("cycle_seconds");
        }
        if self.progress.is_some() {
            fields.push("progress");
        }
        if self.paused.is_some() {
            fields.push("paused");
        }
        fields
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn empty_object_uses_defaults() {
        let cfg: AppConfig = serde_json::from_str("{}").expect("parse");
        assert_eq!(cfg.cycle.duration_seconds, 60.0);
        assert_eq!(cfg.weather.rain_drops, 220);
        assert_eq!(cfg.weather.snow_flakes, 180);
        assert_eq!(cfg.scene.window_panes, vec!["Win_1", "Win_2"]);
        assert_eq!(cfg.outline.thickness, 0.008);
        assert_eq!(cfg.weather.mode, WeatherMode::Normal);
    }

    #[test]
    fn loads_partial_file_from_disk() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        write!(file, r#"{{"weather": {{"mode": "snow", "seed": 42}}, "cycle": {{"duration_seconds": 12}}}}"#)
            .expect("write config");
        let cfg = AppConfig::load(file.path()).expect("load config");
        assert_eq!(cfg.weather.mode, WeatherMode::Snow);
        assert_eq!(cfg.weather.seed, Some(42));
        assert_eq!(cfg.cycle.duration_seconds, 12.0);
        assert_eq!(cfg.window.width, 1280);
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().expect("temp dir");
        let cfg = AppConfig::load_or_default(dir.path().join("absent.json"));
        assert_eq!(cfg.window.title, "Skyroom");
    }

    #[test]
    fn overrides_replace_only_supplied_fields() {
        let mut cfg = AppConfig::default();
        let overrides =
            AppConfigOverrides { weather: Some(WeatherMode::Rainy), paused: Some(true), ..Default::default() };
        cfg.apply_overrides(&overrides);
        assert_eq!(cfg.weather.mode, WeatherMode::Rainy);
        assert!(cfg.cycle.paused);
        assert_eq!(cfg.window.height, 720);
        assert_eq!(overrides.applied_fields(), vec!["weather", "paused"]);
    }

    #[test]
    fn canvas_scale_is_bounded() {
        let weather = WeatherConfig { canvas_scale: 4.0, ..WeatherConfig::default() };
        assert_eq!(weather.canvas_size(800, 600), (800, 600));
        let weather = WeatherConfig { canvas_scale: 0.5, ..WeatherConfig::default() };
        assert_eq!(weather.canvas_size(801, 1), (401, 1));
    }

    #[test]
    fn sky_canvas_matches_viewport_by_default() {
        assert_eq!(WeatherConfig::default().canvas_size(1280, 720), (1280, 720));
        let cfg: AppConfig = serde_json::from_str(r#"{"weather": {"mode": "snow"}}"#).expect("parse");
        assert_eq!(cfg.weather.canvas_size(640, 480), (640, 480));
    }
}
