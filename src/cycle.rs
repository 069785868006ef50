use crate::weather::WeatherMode;
use glam::Vec3;
use std::fmt;

/// Sky gradient endpoint pair.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SkyColors {
    pub top: Vec3,
    pub bottom: Vec3,
}

impl SkyColors {
    pub const fn from_rgb8(top: [u8; 3], bottom: [u8; 3]) -> Self {
        Self { top: rgb8(top), bottom: rgb8(bottom) }
    }

    pub fn lerp(self, other: SkyColors, t: f32) -> SkyColors {
        SkyColors { top: self.top.lerp(other.top, t), bottom: self.bottom.lerp(other.bottom, t) }
    }
}

const fn rgb8(c: [u8; 3]) -> Vec3 {
    Vec3::new(c[0] as f32 / 255.0, c[1] as f32 / 255.0, c[2] as f32 / 255.0)
}

/// The four named looks each weather mode provides.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PresetSet {
    pub day: SkyColors,
    pub dusk: SkyColors,
    pub night: SkyColors,
    pub dawn: SkyColors,
}

impl PresetSet {
    pub fn get(&self, preset: Preset) -> SkyColors {
        match preset {
            Preset::Day => self.day,
            Preset::Dusk => self.dusk,
            Preset::Night => self.night,
            Preset::Dawn => self.dawn,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Preset {
    Day,
    Dusk,
    Night,
    Dawn,
}

pub const NORMAL_PRESETS: PresetSet = PresetSet {
    day: SkyColors::from_rgb8([0x1a, 0x6a, 0xa8], [0xdd, 0xee, 0xff]),
    dusk: SkyColors::from_rgb8([0xc0, 0x39, 0x2b], [0xf3, 0x9c, 0x12]),
    night: SkyColors::from_rgb8([0x02, 0x08, 0x18], [0x0a, 0x1a, 0x3a]),
    dawn: SkyColors::from_rgb8([0xff, 0x9d, 0x9d], [0xff, 0xd5, 0x9b]),
};

/// Shared by rainy and cloudy skies.
pub const OVERCAST_PRESETS: PresetSet = PresetSet {
    day: SkyColors::from_rgb8([0x2c, 0x2c, 0x3a], [0x4a, 0x4a, 0x5a]),
    dusk: SkyColors::from_rgb8([0x1a, 0x1a, 0x2a], [0x3a, 0x2a, 0x2a]),
    night: SkyColors::from_rgb8([0x08, 0x08, 0x10], [0x10, 0x10, 0x18]),
    dawn: SkyColors::from_rgb8([0x2a, 0x20, 0x30], [0x3a, 0x30, 0x28]),
};

pub const SNOW_PRESETS: PresetSet = PresetSet {
    day: SkyColors::from_rgb8([0x8a, 0xaa, 0xbb], [0xd8, 0xea, 0xf0]),
    dusk: SkyColors::from_rgb8([0x6a, 0x7a, 0x88], [0xaa, 0xbb, 0xcc]),
    night: SkyColors::from_rgb8([0x0a, 0x0e, 0x18], [0x1a, 0x20, 0x30]),
    dawn: SkyColors::from_rgb8([0xaa, 0xbb, 0xcc], [0xdd, 0xee, 0xff]),
};

pub fn presets_for(mode: WeatherMode) -> &'static PresetSet {
    match mode {
        WeatherMode::Normal => &NORMAL_PRESETS,
        WeatherMode::Rainy | WeatherMode::Cloudy => &OVERCAST_PRESETS,
        WeatherMode::Snow => &SNOW_PRESETS,
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Keyframe {
    pub stop: f32,
    pub preset: Preset,
}

/// Color keyframes, identical for every weather mode. Day is held from 0.00 to 0.15.
pub const KEYFRAMES: [Keyframe; 7] = [
    Keyframe { stop: 0.00, preset: Preset::Day },
    Keyframe { stop: 0.15, preset: Preset::Day },
    Keyframe { stop: 0.25, preset: Preset::Dusk },
    Keyframe { stop: 0.35, preset: Preset::Night },
    Keyframe { stop: 0.60, preset: Preset::Night },
    Keyframe { stop: 0.80, preset: Preset::Dawn },
    Keyframe { stop: 0.90, preset: Preset::Day },
];

/// Folds any real number into [0, 1). Non-finite input maps to 0.
pub fn wrap_progress(progress: f32) -> f32 {
    if !progress.is_finite() {
        return 0.0;
    }
    let wrapped = progress.rem_euclid(1.0);
    if wrapped >= 1.0 {
        0.0
    } else {
        wrapped
    }
}

/// Locates the keyframe segment holding `progress` and the blend factor inside it.
pub fn locate_segment(progress: f32) -> (Keyframe, Keyframe, f32) {
    let p = wrap_progress(progress);
    for pair in KEYFRAMES.windows(2) {
        let (start, end) = (pair[0], pair[1]);
        if p >= start.stop && p <= end.stop {
            let len = end.stop - start.stop;
            let t = if len > 0.0 { (p - start.stop) / len } else { 0.0 };
            return (start, end, t.clamp(0.0, 1.0));
        }
    }
    let last = KEYFRAMES[KEYFRAMES.len() - 1];
    let first = KEYFRAMES[0];
    let len = 1.0 - last.stop + first.stop;
    let t = if len > 0.0 { (p - last.stop) / len } else { 0.0 };
    (last, first, t.clamp(0.0, 1.0))
}

/// Sky gradient colors for a point in the cycle.
pub fn interpolate(progress: f32, mode: WeatherMode) -> SkyColors {
    let presets = presets_for(mode);
    let (start, end, t) = locate_segment(progress);
    presets.get(start.preset).lerp(presets.get(end.preset), t)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeOfDay {
    Day,
    Dusk,
    Night,
    Dawn,
}

impl TimeOfDay {
    pub fn label(self) -> &'static str {
        match self {
            TimeOfDay::Day => "Day",
            TimeOfDay::Dusk => "Dusk",
            TimeOfDay::Night => "Night",
            TimeOfDay::Dawn => "Dawn",
        }
    }
}

impl fmt::Display for TimeOfDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Upper bounds of the label bands. Kept separate from [`KEYFRAMES`]: the label switches to
/// Dusk at 0.15 while the colors only start leaving day there, and Dawn covers 0.60..0.80.
pub const LABEL_BANDS: [(f32, TimeOfDay); 4] = [
    (0.15, TimeOfDay::Day),
    (0.25, TimeOfDay::Dusk),
    (0.60, TimeOfDay::Night),
    (0.80, TimeOfDay::Dawn),
];

pub fn time_label(progress: f32) -> TimeOfDay {
    let p = wrap_progress(progress);
    LABEL_BANDS.iter().find(|(upper, _)| p < *upper).map(|(_, label)| *label).unwrap_or(TimeOfDay::Day)
}

/// Normalized day-cycle clock. Progress lives in [0, 1) and wraps to 0.
#[derive(Debug, Clone)]
pub struct DayCycle {
    progress: f32,
    duration_seconds: f32,
    paused: bool,
}

impl DayCycle {
    pub const MIN_DURATION_SECONDS: f32 = 5.0;
    pub const MAX_DURATION_SECONDS: f32 = 300.0;

    pub fn new(duration_seconds: f32) -> Self {
        Self { progress: 0.0, duration_seconds, paused: false }
    }

    pub fn progress(&self) -> f32 {
        self.progress
    }

    pub fn duration_seconds(&self) -> f32 {
        self.duration_seconds
    }

    pub fn paused(&self) -> bool {
        self.paused
    }

    pub fn set_paused(&mut self, paused: bool) {
        self.paused = paused;
    }

    pub fn toggle_paused(&mut self) -> bool {
        self.paused = !self.paused;
        self.paused
    }

    /// Picked up on the next tick. Callers bound the value; the clock stores it as given.
    pub fn set_cycle_duration(&mut self, seconds: f32) {
        self.duration_seconds = seconds;
    }

    /// Direct progress assignment. Values are clamped to [0, 1); 1.0 and above land on 0.
    pub fn scrub(&mut self, value: f32) {
        self.progress = if value.is_nan() {
            0.0
        } else {
            let clamped = value.clamp(0.0, 1.0);
            if clamped >= 1.0 {
                0.0
            } else {
                clamped
            }
        };
    }

    pub fn tick(&mut self, delta_seconds: f32) {
        if self.paused || self.duration_seconds <= 0.0 || !delta_seconds.is_finite() {
            return;
        }
        self.progress += delta_seconds / self.duration_seconds;
        if self.progress >= 1.0 {
            self.progress = 0.0;
        }
    }
}

impl Default for DayCycle {
    fn default() -> Self {
        Self::new(60.0)
    }
}
