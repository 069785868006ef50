use crate::audio::AmbientAudio;
use crate::canvas::SkyCanvas;
use crate::config::AppConfig;
use crate::cycle::{interpolate, time_label, DayCycle, SkyColors, TimeOfDay};
use crate::events::{EventBus, LightningFlash, SkyEvent};
use crate::sky::SkyCompositor;
use crate::weather::WeatherMode;

/// What one tick produced. Every reader in a frame works from the same snapshot.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameSnapshot {
    pub progress: f32,
    pub time_of_day: TimeOfDay,
    pub colors: SkyColors,
    pub flash: Option<LightningFlash>,
    pub elapsed_seconds: f32,
}

/// Owns the day cycle, the sky canvas and its compositor, the event bus and the audio consumer.
/// Created once per session and torn down with [`SimulationContext::shutdown`].
pub struct SimulationContext {
    cycle: DayCycle,
    mode: WeatherMode,
    compositor: SkyCompositor,
    canvas: SkyCanvas,
    events: EventBus,
    audio: AmbientAudio,
    elapsed_seconds: f32,
    last_label: Option<TimeOfDay>,
    flashes: u64,
}

impl SimulationContext {
    pub fn new(config: &AppConfig, canvas_size: (u32, u32)) -> Self {
        let mut cycle = DayCycle::new(config.cycle.duration_seconds);
        cycle.scrub(config.cycle.start_progress);
        cycle.set_paused(config.cycle.paused);
        let weather = &config.weather;
        let compositor = SkyCompositor::new(weather.rain_drops, weather.snow_flakes, weather.seed);
        let mut audio = AmbientAudio::new(config.audio.trigger_capacity, weather.seed);
        audio.set_enabled(config.audio.enabled);
        log::info!(
            "[cycle] weather={} duration={:.0}s start={:.2}{}",
            weather.mode,
            cycle.duration_seconds(),
            cycle.progress(),
            if cycle.paused() { " (paused)" } else { "" }
        );
        Self {
            cycle,
            mode: weather.mode,
            compositor,
            canvas: SkyCanvas::new(canvas_size.0, canvas_size.1),
            events: EventBus::default(),
            audio,
            elapsed_seconds: 0.0,
            last_label: None,
            flashes: 0,
        }
    }

    pub fn cycle_mut(&mut self) -> &mut DayCycle {
        &mut self.cycle
    }

    pub fn canvas(&self) -> &SkyCanvas {
        &self.canvas
    }

    pub fn audio(&self) -> &AmbientAudio {
        &self.audio
    }

    pub fn events_mut(&mut self) -> &mut EventBus {
        &mut self.events
    }

    pub fn elapsed_seconds(&self) -> f32 {
        self.elapsed_seconds
    }

    pub fn resize_canvas(&mut self, width: u32, height: u32) -> bool {
        self.canvas.resize(width, height)
    }

    /// Advances the clock, then interpolates and paints from one progress snapshot.
    /// Weather animation time keeps running while the cycle is paused.
    pub fn tick(&mut self, delta_seconds: f32) -> FrameSnapshot {
        let delta = if delta_seconds.is_finite() { delta_seconds.max(0.0) } else { 0.0 };
        self.cycle.tick(delta);
        self.elapsed_seconds += delta;

        let progress = self.cycle.progress();
        let colors = interpolate(progress, self.mode);
        let flash = self.compositor.render(&mut self.canvas, colors, self.mode, self.elapsed_seconds);
        if let Some(flash) = flash {
            self.flashes += 1;
            self.events.push(SkyEvent::Lightning(flash));
        }

        let time_of_day = time_label(progress);
        if self.last_label != Some(time_of_day) {
            log::info!("[cycle] {time_of_day} ({progress:.2})");
            self.events.push(SkyEvent::TimeOfDayChanged { label: time_of_day.label(), progress });
            self.last_label = Some(time_of_day);
        }

        FrameSnapshot { progress, time_of_day, colors, flash, elapsed_seconds: self.elapsed_seconds }
    }

    /// Delivers this frame's events to the audio consumer and hands them back to the caller.
    pub fn pump_audio(&mut self, delta_seconds: f32) -> Vec<SkyEvent> {
        let events = self.events.drain();
        self.audio.update(delta_seconds, self.cycle.progress(), self.mode, &events);
        events
    }

    pub fn shutdown(mut self) {
        self.events.drain();
        self.audio.set_enabled(false);
        log::info!("[cycle] shutdown after {:.1}s, {} lightning flash(es)", self.elapsed_seconds, self.flashes);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::CueKind;
    use crate::events::StrikeDistance;

    fn rainy_config() -> AppConfig {
        let mut config = AppConfig::default();
        config.weather.mode = WeatherMode::Rainy;
        config.weather.seed = Some(5);
        config.weather.rain_drops = 16;
        config
    }

    #[test]
    fn paused_cycle_still_animates_weather() {
        let mut config = rainy_config();
        config.cycle.paused = true;
        config.cycle.start_progress = 0.4;
        let mut sim = SimulationContext::new(&config, (32, 32));
        let mut flashes = 0;
        for _ in 0..(9 * 60) {
            let snapshot = sim.tick(1.0 / 60.0);
            assert_eq!(snapshot.progress, 0.4);
            flashes += usize::from(snapshot.flash.is_some());
        }
        assert_eq!(flashes, 1);
        assert!(sim.elapsed_seconds() > 8.9);
    }

    #[test]
    fn flash_reaches_audio_on_pump() {
        let mut sim = SimulationContext::new(&rainy_config(), (16, 16));
        let mut delivered = Vec::new();
        for _ in 0..(8 * 60) {
            sim.tick(1.0 / 60.0);
            delivered.extend(sim.pump_audio(1.0 / 60.0));
        }
        let strikes: Vec<_> = delivered
            .iter()
            .filter_map(|e| match e {
                SkyEvent::Lightning(flash) => Some(flash.distance),
                _ => None,
            })
            .collect();
        assert_eq!(strikes.len(), 1);
        assert!(matches!(strikes[0], StrikeDistance::Near | StrikeDistance::Distant));
        let thunder = sim
            .audio()
            .recent_triggers()
            .filter(|cue| matches!(cue.kind, CueKind::ThunderNear | CueKind::ThunderDistant))
            .count();
        assert_eq!(sim.audio().pending_cues() + thunder, 1);
    }
}
