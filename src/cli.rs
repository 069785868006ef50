use crate::config::AppConfigOverrides;
use crate::weather::WeatherMode;
use anyhow::{anyhow, bail, Context, Result};
use std::env;
use std::path::PathBuf;

pub const DEFAULT_CAPTURE_FRAMES: u32 = 120;

#[derive(Debug, Clone, PartialEq, Default)]
pub struct CliOverrides {
    width: Option<u32>,
    height: Option<u32>,
    vsync: Option<bool>,
    weather: Option<WeatherMode>,
    cycle_seconds: Option<f32>,
    progress: Option<f32>,
    paused: Option<bool>,
    capture: Option<PathBuf>,
    frames: Option<u32>,
}

/// Headless render request: simulate `frames` ticks, then write the final frame as PNG.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureRequest {
    pub output: PathBuf,
    pub frames: u32,
}

impl CliOverrides {
    pub fn parse_from_env() -> Result<Self> {
        Self::parse(env::args())
    }

    pub fn parse<I, S>(args: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut overrides = CliOverrides::default();
        let mut iter = args.into_iter();
        let _ = iter.next(); // program name
        while let Some(raw_flag) = iter.next() {
            let flag = raw_flag.as_ref();
            let Some(key) = flag.strip_prefix("--") else {
                bail!("Unexpected argument '{flag}'. Flags take the form --name value.");
            };
            let value =
                iter.next().ok_or_else(|| anyhow!("Expected a value after '{flag}'"))?.as_ref().to_string();
            match key {
                "width" => {
                    overrides.width =
                        Some(value.parse::<u32>().with_context(|| format!("Invalid width '{value}'"))?);
                }
                "height" => {
                    overrides.height =
                        Some(value.parse::<u32>().with_context(|| format!("Invalid height '{value}'"))?);
                }
                "vsync" => overrides.vsync = Some(parse_bool_flag("vsync", &value)?),
                "weather" => {
                    if let Err(err) = value.parse::<WeatherMode>() {
                        log::warn!("[cli] {err}; using normal weather");
                    }
                    overrides.weather = Some(WeatherMode::from_name_lossy(&value));
                }
                "cycle-seconds" => {
                    let seconds = value
                        .parse::<f32>()
                        .with_context(|| format!("Invalid cycle length '{value}'"))?;
                    if !(seconds.is_finite() && seconds > 0.0) {
                        bail!("Cycle length must be a positive number of seconds, got '{value}'");
                    }
                    overrides.cycle_seconds = Some(seconds);
                }
                "progress" => {
                    overrides.progress =
                        Some(value.parse::<f32>().with_context(|| format!("Invalid progress '{value}'"))?);
                }
                "paused" => overrides.paused = Some(parse_bool_flag("paused", &value)?),
                "capture" => overrides.capture = Some(PathBuf::from(value)),
                "frames" => {
                    overrides.frames =
                        Some(value.parse::<u32>().with_context(|| format!("Invalid frame count '{value}'"))?);
                }
                _ => bail!(
                    "Unknown flag '{flag}'. Supported flags: --width, --height, --vsync, --weather, \
                     --cycle-seconds, --progress, --paused, --capture, --frames."
                ),
            }
        }
        Ok(overrides)
    }

    pub fn capture_request(&self) -> Option<CaptureRequest> {
        self.capture.as_ref().map(|output| CaptureRequest {
            output: output.clone(),
            frames: self.frames.unwrap_or(DEFAULT_CAPTURE_FRAMES),
        })
    }

    pub fn into_config_overrides(self) -> AppConfigOverrides {
        AppConfigOverrides {
            width: self.width,
            height: self.height,
            vsync: self.vsync,
            weather: self.weather,
            cycle_seconds: self.cycle_seconds,
            progress: self.progress,
            paused: self.paused,
        }
    }

    #[cfg(test)]
    pub fn as_tuple(&self) -> (Option<u32>, Option<u32>, Option<bool>) {
        (self.width, self.height, self.vsync)
    }
}

fn parse_bool_flag(flag: &str, value: &str) -> Result<bool> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "on" | "yes" => Ok(true),
        "0" | "false" | "off" | "no" => Ok(false),
        other => bail!("Invalid {flag} value '{other}'. Use on/off or true/false."),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_window_flags() {
        let args = ["skyroom", "--width", "1600", "--height", "900", "--vsync", "off"];
        let overrides = CliOverrides::parse(args).expect("parse overrides");
        assert_eq!(overrides.as_tuple(), (Some(1600), Some(900), Some(false)));
    }

    #[test]
    fn parses_simulation_flags() {
        let args = ["skyroom", "--weather", "Rainy", "--cycle-seconds", "30", "--progress", "0.4", "--paused", "yes"];
        let overrides = CliOverrides::parse(args).expect("parse overrides").into_config_overrides();
        assert_eq!(overrides.weather, Some(WeatherMode::Rainy));
        assert_eq!(overrides.cycle_seconds, Some(30.0));
        assert_eq!(overrides.progress, Some(0.4));
        assert_eq!(overrides.paused, Some(true));
    }

    #[test]
    fn capture_defaults_frame_count() {
        let overrides = CliOverrides::parse(["skyroom", "--capture", "out.png"]).expect("parse");
        let request = overrides.capture_request().expect("capture requested");
        assert_eq!(request.output, PathBuf::from("out.png"));
        assert_eq!(request.frames, DEFAULT_CAPTURE_FRAMES);
        assert!(CliOverrides::default().capture_request().is_none());
    }

    #[test]
    fn latest_flag_wins() {
        let args = ["skyroom", "--width", "800", "--width", "1920", "--vsync", "on", "--vsync", "off"];
        let overrides = CliOverrides::parse(args).expect("parse overrides");
        assert_eq!(overrides.as_tuple(), (Some(1920), None, Some(false)));
    }

    #[test]
    fn missing_value_errors() {
        let err = CliOverrides::parse(["skyroom", "--width"]).unwrap_err();
        assert!(err.to_string().contains("Expected a value"), "error should mention missing value");
    }

    #[test]
    fn rejects_unknown_flags_and_bad_cycle_length() {
        let err = CliOverrides::parse(["skyroom", "--foo", "bar"]).unwrap_err();
        assert!(err.to_string().contains("Unknown flag"), "unknown flags should error");
        assert!(CliOverrides::parse(["skyroom", "--cycle-seconds", "0"]).is_err());
    }

    #[test]
    fn unknown_weather_falls_back_to_normal() {
        let overrides = CliOverrides::parse(["skyroom", "--weather", "hail"]).expect("parse overrides");
        assert_eq!(overrides.into_config_overrides().weather, Some(WeatherMode::Normal));
        let overrides = CliOverrides::parse(["skyroom", "--weather", "snow", "--weather", "fog"]).expect("parse");
        assert_eq!(overrides.into_config_overrides().weather, Some(WeatherMode::Normal));
    }
}
