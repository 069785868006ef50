use crate::canvas::{GradientStop, Rgba, SkyCanvas};
use crate::cycle::SkyColors;
use crate::events::{LightningFlash, StrikeDistance};
use crate::particles::{FrameContext, RainPool, SnowPool};
use crate::weather::WeatherMode;
use glam::Vec2;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::f32::consts::PI;

/// Storm cloud blob: center in normalized canvas coordinates, radius as a fraction of canvas width.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CloudBlob {
    pub x: f32,
    pub y: f32,
    pub radius: f32,
}

pub const CLOUD_BLOBS: [CloudBlob; 6] = [
    CloudBlob { x: 0.12, y: 0.12, radius: 0.14 },
    CloudBlob { x: 0.39, y: 0.08, radius: 0.18 },
    CloudBlob { x: 0.70, y: 0.11, radius: 0.15 },
    CloudBlob { x: 0.92, y: 0.16, radius: 0.12 },
    CloudBlob { x: 0.25, y: 0.20, radius: 0.13 },
    CloudBlob { x: 0.59, y: 0.18, radius: 0.16 },
];

#[derive(Debug, Clone, Copy)]
struct CloudStyle {
    radius_scale: f32,
    inner: Rgba,
    outer: Rgba,
}

const STORM_CLOUDS: CloudStyle = CloudStyle {
    radius_scale: 1.0,
    inner: Rgba::rgb8a(30, 30, 40, 0.85),
    outer: Rgba::rgb8a(20, 20, 28, 0.0),
};

const SNOW_CLOUDS: CloudStyle = CloudStyle {
    radius_scale: 1.1,
    inner: Rgba::rgb8a(200, 210, 220, 0.55),
    outer: Rgba::rgb8a(180, 195, 210, 0.0),
};

/// Periodic flash timing: the flash occupies the last `window` seconds of every `period`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FlashSchedule {
    pub period: f32,
    pub window: f32,
    pub peak_alpha: f32,
    pub tint: [u8; 3],
}

pub const RAINY_FLASH: FlashSchedule =
    FlashSchedule { period: 8.0, window: 0.3, peak_alpha: 0.25, tint: [220, 230, 255] };
pub const CLOUDY_FLASH: FlashSchedule =
    FlashSchedule { period: 20.0, window: 0.4, peak_alpha: 0.12, tint: [210, 220, 255] };

impl FlashSchedule {
    /// Overlay alpha at `elapsed` seconds, `None` outside the flash window.
    pub fn alpha_at(&self, elapsed: f32) -> Option<f32> {
        let phase = elapsed.rem_euclid(self.period);
        let start = self.period - self.window;
        if phase > start {
            Some(((phase - start) / self.window * PI).sin() * self.peak_alpha)
        } else {
            None
        }
    }
}

/// Rising-edge detector for one flashing mode.
#[derive(Debug, Clone, Copy, Default)]
pub struct FlashTracker {
    was_flashing: bool,
}

impl FlashTracker {
    /// Returns true exactly once per transition from not-flashing to flashing.
    pub fn observe(&mut self, flashing: bool) -> bool {
        let rising = flashing && !self.was_flashing;
        self.was_flashing = flashing;
        rising
    }
}

/// Odds that a rainy-mode strike is heard close by.
pub const NEAR_STRIKE_PROBABILITY: f64 = 0.6;

/// Paints the weather sky into a [`SkyCanvas`] once per frame and reports lightning rising edges.
pub struct SkyCompositor {
    rain: RainPool,
    snow: SnowPool,
    rainy_flash: FlashTracker,
    cloudy_flash: FlashTracker,
    rng: StdRng,
}

impl SkyCompositor {
    pub fn new(rain_drops: usize, snow_flakes: usize, seed: Option<u64>) -> Self {
        let mut rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let rain = RainPool::new(rain_drops, &mut rng);
        let snow = SnowPool::new(snow_flakes, &mut rng);
        Self { rain, snow, rainy_flash: FlashTracker::default(), cloudy_flash: FlashTracker::default(), rng }
    }

    /// Redraws the full canvas. Particle pools only advance in the mode that draws them.
    pub fn render(
        &mut self,
        canvas: &mut SkyCanvas,
        colors: SkyColors,
        mode: WeatherMode,
        elapsed_seconds: f32,
    ) -> Option<LightningFlash> {
        canvas.fill_vertical_gradient(colors.top, colors.bottom);
        let mut flash = None;

        if mode.has_storm_clouds() {
            draw_clouds(canvas, &STORM_CLOUDS);
            if mode == WeatherMode::Rainy {
                self.rain.advance(&FrameContext::new(canvas.height() as f32), &mut self.rng);
                self.draw_rain(canvas);
            }
        }

        if mode == WeatherMode::Rainy {
            let alpha = RAINY_FLASH.alpha_at(elapsed_seconds);
            if self.rainy_flash.observe(alpha.is_some()) {
                let distance = if self.rng.gen_bool(NEAR_STRIKE_PROBABILITY) {
                    StrikeDistance::Near
                } else {
                    StrikeDistance::Distant
                };
                flash = Some(LightningFlash { distance, at_seconds: elapsed_seconds });
            }
            if let Some(alpha) = alpha {
                apply_flash(canvas, &RAINY_FLASH, alpha);
            }
        }

        if mode == WeatherMode::Cloudy {
            let alpha = CLOUDY_FLASH.alpha_at(elapsed_seconds);
            if self.cloudy_flash.observe(alpha.is_some()) {
                flash = Some(LightningFlash { distance: StrikeDistance::Distant, at_seconds: elapsed_seconds });
            }
            if let Some(alpha) = alpha {
                apply_flash(canvas, &CLOUDY_FLASH, alpha);
            }
        }

        if mode == WeatherMode::Snow {
            draw_clouds(canvas, &SNOW_CLOUDS);
            self.snow.advance(&FrameContext::new(canvas.height() as f32), &mut self.rng);
            self.draw_snow(canvas);
        }

        if let Some(flash) = flash {
            log::debug!("[sky] lightning {} at {:.2}s", flash.distance.label(), flash.at_seconds);
        }
        flash
    }

    fn draw_rain(&self, canvas: &mut SkyCanvas) {
        let (w, h) = (canvas.width() as f32, canvas.height() as f32);
        for drop in self.rain.iter() {
            let from = Vec2::new(drop.x * w, drop.y * h);
            let to = from + Vec2::new(2.0, drop.length);
            let stops = [
                GradientStop::new(0.0, Rgba::rgb8a(174, 214, 241, 0.0)),
                GradientStop::new(0.3, Rgba::rgb8a(200, 230, 255, drop.opacity)),
                GradientStop::new(1.0, Rgba::rgb8a(174, 214, 241, 0.0)),
            ];
            canvas.stroke_gradient_line(from, to, drop.width, &stops);
        }
    }

    fn draw_snow(&self, canvas: &mut SkyCanvas) {
        let (w, h) = (canvas.width() as f32, canvas.height() as f32);
        for flake in self.snow.iter() {
            let center = Vec2::new(flake.x * w, flake.y * h);
            let stops = [
                GradientStop::new(0.0, Rgba::rgb8a(255, 255, 255, flake.opacity)),
                GradientStop::new(0.5, Rgba::rgb8a(220, 235, 245, flake.opacity * 0.6)),
                GradientStop::new(1.0, Rgba::rgb8a(200, 220, 240, 0.0)),
            ];
            canvas.fill_radial_gradient(center, 0.0, flake.radius * 2.0, &stops);
        }
    }
}

fn draw_clouds(canvas: &mut SkyCanvas, style: &CloudStyle) {
    let (w, h) = (canvas.width() as f32, canvas.height() as f32);
    let stops = [GradientStop::new(0.0, style.inner), GradientStop::new(1.0, style.outer)];
    for blob in CLOUD_BLOBS.iter() {
        let radius = blob.radius * w * style.radius_scale;
        canvas.fill_radial_gradient(Vec2::new(blob.x * w, blob.y * h), radius * 0.1, radius, &stops);
    }
}

fn apply_flash(canvas: &mut SkyCanvas, schedule: &FlashSchedule, alpha: f32) {
    let [r, g, b] = schedule.tint;
    canvas.fill_overlay(Rgba::rgb8a(r, g, b, alpha));
}
