use glam::Vec3;
use skyroom::canvas::SkyCanvas;
use skyroom::cycle::{interpolate, SkyColors};
use skyroom::events::StrikeDistance;
use skyroom::sky::{SkyCompositor, CLOUDY_FLASH, RAINY_FLASH};
use skyroom::weather::WeatherMode;

fn run(mode: WeatherMode, seconds: u32, seed: u64) -> Vec<(f32, StrikeDistance)> {
    let mut compositor = SkyCompositor::new(12, 12, Some(seed));
    let mut canvas = SkyCanvas::new(24, 16);
    let colors = interpolate(0.5, mode);
    let mut flashes = Vec::new();
    for frame in 0..(seconds * 60) {
        let elapsed = frame as f32 / 60.0;
        if let Some(flash) = compositor.render(&mut canvas, colors, mode, elapsed) {
            flashes.push((flash.at_seconds, flash.distance));
        }
    }
    flashes
}

#[test]
fn rainy_sky_flashes_once_per_period() {
    let flashes = run(WeatherMode::Rainy, 24, 17);
    assert_eq!(flashes.len(), 3);
    for (at, _) in &flashes {
        let phase = at.rem_euclid(RAINY_FLASH.period);
        assert!(phase > RAINY_FLASH.period - RAINY_FLASH.window, "flash outside window at {at}");
    }
}

#[test]
fn cloudy_sky_flashes_are_distant() {
    let flashes = run(WeatherMode::Cloudy, 60, 4);
    assert_eq!(flashes.len(), 3);
    assert!(flashes.iter().all(|(_, d)| *d == StrikeDistance::Distant));
    for (at, _) in &flashes {
        assert!(at.rem_euclid(CLOUDY_FLASH.period) > CLOUDY_FLASH.period - CLOUDY_FLASH.window);
    }
}

#[test]
fn clear_and_snowy_skies_never_flash() {
    assert!(run(WeatherMode::Normal, 30, 1).is_empty());
    assert!(run(WeatherMode::Snow, 30, 1).is_empty());
}

#[test]
fn flash_brightens_the_canvas() {
    let mut compositor = SkyCompositor::new(0, 0, Some(2));
    let mut canvas = SkyCanvas::new(8, 8);
    let colors = interpolate(0.5, WeatherMode::Rainy);
    compositor.render(&mut canvas, colors, WeatherMode::Rainy, 7.0);
    let before = canvas.pixel(0, 7).expect("in bounds");
    let flash = compositor.render(&mut canvas, colors, WeatherMode::Rainy, 7.85);
    let during = canvas.pixel(0, 7).expect("in bounds");
    assert!(flash.is_some());
    let sum = |px: [u8; 4]| u32::from(px[0]) + u32::from(px[1]) + u32::from(px[2]);
    assert!(sum(during) > sum(before));
}

#[test]
fn normal_sky_is_a_plain_gradient() {
    let mut compositor = SkyCompositor::new(8, 8, Some(5));
    let mut canvas = SkyCanvas::new(4, 64);
    let colors = SkyColors { top: Vec3::new(1.0, 0.0, 0.0), bottom: Vec3::new(0.0, 0.0, 1.0) };
    compositor.render(&mut canvas, colors, WeatherMode::Normal, 3.0);
    let top = canvas.pixel(2, 0).expect("top");
    let bottom = canvas.pixel(2, 63).expect("bottom");
    assert!(top[0] > 250 && top[2] < 5);
    assert!(bottom[2] > 250 && bottom[0] < 5);
    assert_eq!(canvas.pixel(0, 30), canvas.pixel(3, 30));
}
