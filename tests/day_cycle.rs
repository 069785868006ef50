use glam::Vec3;
use skyroom::cycle::{
    interpolate, locate_segment, presets_for, time_label, DayCycle, Preset, SkyColors, TimeOfDay,
    NORMAL_PRESETS, OVERCAST_PRESETS, SNOW_PRESETS,
};
use skyroom::weather::WeatherMode;

fn close(a: Vec3, b: Vec3) -> bool {
    (a - b).abs().max_element() < 1e-5
}

fn colors_close(a: SkyColors, b: SkyColors) -> bool {
    close(a.top, b.top) && close(a.bottom, b.bottom)
}

#[test]
fn cycle_starts_and_ends_on_day() {
    assert!(colors_close(interpolate(0.0, WeatherMode::Normal), NORMAL_PRESETS.day));
    assert!(colors_close(interpolate(0.10, WeatherMode::Normal), NORMAL_PRESETS.day));
    assert!(colors_close(interpolate(0.95, WeatherMode::Normal), NORMAL_PRESETS.day));
    assert!(colors_close(interpolate(0.999, WeatherMode::Normal), NORMAL_PRESETS.day));
}

#[test]
fn stops_land_exactly_on_presets() {
    assert!(colors_close(interpolate(0.25, WeatherMode::Normal), NORMAL_PRESETS.dusk));
    assert!(colors_close(interpolate(0.45, WeatherMode::Normal), NORMAL_PRESETS.night));
    assert!(colors_close(interpolate(0.80, WeatherMode::Snow), SNOW_PRESETS.dawn));
}

#[test]
fn segments_blend_linearly() {
    let halfway = NORMAL_PRESETS.day.lerp(NORMAL_PRESETS.dusk, 0.5);
    assert!(colors_close(interpolate(0.20, WeatherMode::Normal), halfway));

    let (start, end, t) = locate_segment(0.70);
    assert_eq!((start.preset, end.preset), (Preset::Night, Preset::Dawn));
    assert!((t - 0.5).abs() < 1e-4);
}

#[test]
fn rainy_and_cloudy_share_overcast_presets() {
    for p in [0.0, 0.2, 0.3, 0.5, 0.7, 0.85] {
        let rainy = interpolate(p, WeatherMode::Rainy);
        assert!(colors_close(rainy, interpolate(p, WeatherMode::Cloudy)));
    }
    assert!(colors_close(interpolate(0.5, WeatherMode::Rainy), OVERCAST_PRESETS.night));
}

#[test]
fn out_of_range_progress_wraps() {
    assert!(colors_close(interpolate(1.30, WeatherMode::Normal), interpolate(0.30, WeatherMode::Normal)));
    assert!(colors_close(interpolate(-0.25, WeatherMode::Normal), interpolate(0.75, WeatherMode::Normal)));
    assert!(colors_close(interpolate(f32::NAN, WeatherMode::Normal), NORMAL_PRESETS.day));
}

#[test]
fn labels_follow_bands() {
    assert_eq!(time_label(0.0), TimeOfDay::Day);
    assert_eq!(time_label(0.149), TimeOfDay::Day);
    assert_eq!(time_label(0.15), TimeOfDay::Dusk);
    assert_eq!(time_label(0.30), TimeOfDay::Night);
    assert_eq!(time_label(0.65), TimeOfDay::Dawn);
    assert_eq!(time_label(0.85), TimeOfDay::Day);
    assert_eq!(TimeOfDay::Dusk.to_string(), "Dusk");
}

#[test]
fn clock_advances_and_wraps_to_zero() {
    let mut cycle = DayCycle::new(10.0);
    cycle.tick(2.5);
    assert!((cycle.progress() - 0.25).abs() < 1e-6);
    cycle.tick(2.5);
    assert!((cycle.progress() - 0.5).abs() < 1e-6);
    cycle.tick(5.0);
    assert_eq!(cycle.progress(), 0.0);
}

#[test]
fn paused_clock_holds_progress() {
    let mut cycle = DayCycle::new(10.0);
    cycle.scrub(0.4);
    assert!(cycle.toggle_paused());
    for _ in 0..100 {
        cycle.tick(0.1);
    }
    assert_eq!(cycle.progress(), 0.4);
    assert!(!cycle.toggle_paused());
    cycle.tick(1.0);
    assert!((cycle.progress() - 0.5).abs() < 1e-6);
}

#[test]
fn duration_change_applies_on_next_tick() {
    let mut cycle = DayCycle::new(60.0);
    cycle.tick(6.0);
    assert!((cycle.progress() - 0.1).abs() < 1e-6);
    cycle.set_cycle_duration(10.0);
    cycle.tick(1.0);
    assert!((cycle.progress() - 0.2).abs() < 1e-6);
}

#[test]
fn scrub_clamps_into_unit_range() {
    let mut cycle = DayCycle::default();
    cycle.scrub(0.75);
    assert_eq!(cycle.progress(), 0.75);
    cycle.scrub(-3.0);
    assert_eq!(cycle.progress(), 0.0);
    cycle.scrub(1.0);
    assert_eq!(cycle.progress(), 0.0);
    cycle.scrub(f32::NAN);
    assert_eq!(cycle.progress(), 0.0);
}

#[test]
fn blended_colors_stay_between_segment_endpoints() {
    const SAMPLES: u32 = 20_000;
    for mode in WeatherMode::ALL {
        let presets = presets_for(mode);
        for i in 0..SAMPLES {
            let p = i as f32 / SAMPLES as f32;
            let (start, end, _) = locate_segment(p);
            let (a, b) = (presets.get(start.preset), presets.get(end.preset));
            let c = interpolate(p, mode);
            for (value, lo, hi) in [
                (c.top, a.top.min(b.top), a.top.max(b.top)),
                (c.bottom, a.bottom.min(b.bottom), a.bottom.max(b.bottom)),
            ] {
                let inside = value.cmpge(lo - Vec3::splat(1e-5)).all() && value.cmple(hi + Vec3::splat(1e-5)).all();
                assert!(inside, "{mode} at {p}: {value} outside [{lo}, {hi}]");
            }
        }
    }
}

#[test]
fn sixty_second_cycle_returns_after_120_half_second_ticks() {
    let mut cycle = DayCycle::new(60.0);
    for _ in 0..120 {
        cycle.tick(0.5);
    }
    // rounding can leave progress just below 1.0, so distance is measured around the cycle
    let p = cycle.progress();
    assert!((0.0..1.0).contains(&p));
    assert!(p.min(1.0 - p) < 1e-4, "progress {p} should be back at the start");
}
