use crate::events::{SkyEvent, StrikeDistance};
use crate::weather::WeatherMode;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::VecDeque;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CueKind {
    ThunderNear,
    ThunderDistant,
    Rooster,
    Birds,
    Owl,
    Wolf,
}

impl CueKind {
    pub fn label(self) -> &'static str {
        match self {
            CueKind::ThunderNear => "thunder:near",
            CueKind::ThunderDistant => "thunder:distant",
            CueKind::Rooster => "rooster",
            CueKind::Birds => "birds",
            CueKind::Owl => "owl",
            CueKind::Wolf => "wolf",
        }
    }

    /// Minimum seconds between two plays of the same cue.
    fn anti_spam_seconds(self) -> f32 {
        match self {
            CueKind::ThunderNear | CueKind::ThunderDistant => 4.0,
            CueKind::Rooster | CueKind::Wolf => 60.0,
            CueKind::Birds => 3.0,
            CueKind::Owl => 30.0,
        }
    }
}

/// Randomly retried call: every try inside its progress window plays with `odds`.
#[derive(Debug, Clone, Copy)]
struct AmbientCall {
    kind: CueKind,
    window: fn(f32) -> bool,
    odds: f64,
    /// Base and random extra seconds before the first try.
    first_try: (f32, f32),
    /// Base and random extra seconds between tries.
    retry: (f32, f32),
}

const AMBIENT_CALLS: [AmbientCall; 3] = [
    AmbientCall {
        kind: CueKind::Birds,
        window: is_birdsong_hour,
        odds: 0.55,
        first_try: (3.0, 0.0),
        retry: (2.0, 6.0),
    },
    AmbientCall {
        kind: CueKind::Owl,
        window: is_night,
        odds: 0.6,
        first_try: (30.0, 30.0),
        retry: (30.0, 40.0),
    },
    AmbientCall {
        kind: CueKind::Wolf,
        window: is_deep_night,
        odds: 0.4,
        first_try: (60.0, 60.0),
        retry: (60.0, 60.0),
    },
];

fn is_birdsong_hour(progress: f32) -> bool {
    !(0.25..0.85).contains(&progress)
}

fn is_night(progress: f32) -> bool {
    (0.35..0.80).contains(&progress)
}

fn is_deep_night(progress: f32) -> bool {
    (0.45..0.70).contains(&progress)
}

fn jitter<R: Rng + ?Sized>(rng: &mut R, (base, extra): (f32, f32)) -> f32 {
    base + rng.gen::<f32>() * extra
}

/// One-shot sound handed to the playback backend.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AudioCue {
    pub kind: CueKind,
    pub volume: f32,
    pub rate: f32,
    pub at_seconds: f32,
}

/// Looping ambience volumes, each eased toward a weather/time target.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct AmbientMix {
    pub crickets: f32,
    pub rain: f32,
    pub wind: f32,
}

const DAWN_CROSSING: f32 = 0.80;

#[derive(Debug, Clone, Copy)]
struct PendingCue {
    kind: CueKind,
    due_seconds: f32,
}

/// Consumer of the sky simulation: turns progress, weather and lightning events into ambience
/// levels and delayed one-shot cues. Playback itself belongs to an external backend.
pub struct AmbientAudio {
    enabled: bool,
    capacity: usize,
    triggers: VecDeque<AudioCue>,
    pending: Vec<PendingCue>,
    last_played: Vec<(CueKind, f32)>,
    mix: AmbientMix,
    clock_seconds: f32,
    last_progress: Option<f32>,
    /// Clock time of the next try for each entry of `AMBIENT_CALLS`.
    next_calls: [f32; 3],
    rng: StdRng,
}

impl AmbientAudio {
    pub fn new(capacity: usize, seed: Option<u64>) -> Self {
        let mut rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed ^ 0xa0d1_0000),
            None => StdRng::from_entropy(),
        };
        let next_calls = AMBIENT_CALLS.map(|call| jitter(&mut rng, call.first_try));
        Self {
            enabled: true,
            capacity: capacity.max(1),
            triggers: VecDeque::new(),
            pending: Vec::new(),
            last_played: Vec::new(),
            mix: AmbientMix::default(),
            clock_seconds: 0.0,
            last_progress: None,
            next_calls,
            rng,
        }
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
        if !enabled {
            self.pending.clear();
        }
    }

    pub fn mix(&self) -> AmbientMix {
        self.mix
    }

    pub fn pending_cues(&self) -> usize {
        self.pending.len()
    }

    pub fn recent_triggers(&self) -> impl ExactSizeIterator<Item = &AudioCue> {
        self.triggers.iter()
    }

    pub fn update(&mut self, dt_seconds: f32, progress: f32, mode: WeatherMode, events: &[SkyEvent]) {
        self.clock_seconds += dt_seconds.max(0.0);
        if !self.enabled {
            self.last_progress = Some(progress);
            return;
        }
        for event in events {
            self.handle_event(event);
        }
        self.ease_beds(progress, mode);
        if let Some(previous) = self.last_progress {
            if previous < DAWN_CROSSING && progress >= DAWN_CROSSING {
                self.schedule(CueKind::Rooster, 0.0);
            }
        }
        self.last_progress = Some(progress);
        self.try_ambient_calls(progress);
        self.flush_due();
    }

    pub fn handle_event(&mut self, event: &SkyEvent) {
        if !self.enabled {
            return;
        }
        if let SkyEvent::Lightning(flash) = event {
            // roughly 3 s per km
            let (kind, delay) = match flash.distance {
                StrikeDistance::Near => (CueKind::ThunderNear, self.rng.gen_range(0.8..1.4)),
                StrikeDistance::Distant => (CueKind::ThunderDistant, self.rng.gen_range(1.8..3.2)),
            };
            self.schedule(kind, delay);
        }
    }

    fn try_ambient_calls(&mut self, progress: f32) {
        for (call, next) in AMBIENT_CALLS.iter().zip(self.next_calls.iter_mut()) {
            if self.clock_seconds < *next {
                continue;
            }
            *next = self.clock_seconds + jitter(&mut self.rng, call.retry);
            if (call.window)(progress) && self.rng.gen_bool(call.odds) {
                self.pending.push(PendingCue { kind: call.kind, due_seconds: self.clock_seconds });
            }
        }
    }

    fn schedule(&mut self, kind: CueKind, delay_seconds: f32) {
        self.pending.push(PendingCue { kind, due_seconds: self.clock_seconds + delay_seconds });
    }

    fn ease_beds(&mut self, progress: f32, mode: WeatherMode) {
        let cricket_target = if is_night(progress) { 0.55 } else { 0.0 };
        let cricket_rate = if cricket_target > self.mix.crickets { 0.02 } else { 0.08 };
        self.mix.crickets += (cricket_target - self.mix.crickets) * cricket_rate;
        if self.mix.crickets < 0.01 {
            self.mix.crickets = 0.0;
        }

        let rain_target = if mode == WeatherMode::Rainy { 0.7 } else { 0.0 };
        self.mix.rain += (rain_target - self.mix.rain) * 0.015;

        let wind_target = match mode {
            WeatherMode::Cloudy | WeatherMode::Snow => 0.45,
            WeatherMode::Rainy => 0.55,
            WeatherMode::Normal => 0.0,
        };
        self.mix.wind += (wind_target - self.mix.wind) * 0.012;
    }

    fn flush_due(&mut self) {
        let now = self.clock_seconds;
        let mut remaining = Vec::with_capacity(self.pending.len());
        for cue in std::mem::take(&mut self.pending) {
            if cue.due_seconds <= now {
                self.play(cue.kind);
            } else {
                remaining.push(cue);
            }
        }
        self.pending = remaining;
    }

    fn play(&mut self, kind: CueKind) {
        let now = self.clock_seconds;
        if let Some((_, last)) = self.last_played.iter_mut().find(|(k, _)| *k == kind) {
            if now - *last < kind.anti_spam_seconds() {
                return;
            }
            *last = now;
        } else {
            self.last_played.push((kind, now));
        }
        let (volume, rate) = match kind {
            CueKind::ThunderNear => (self.rng.gen_range(0.45..0.8), self.rng.gen_range(0.9..1.1)),
            CueKind::ThunderDistant => (self.rng.gen_range(0.2..0.4), self.rng.gen_range(0.85..1.05)),
            CueKind::Rooster => (self.rng.gen_range(0.15..0.3), 1.0),
            CueKind::Birds => (self.rng.gen_range(0.15..0.4), self.rng.gen_range(1.0..1.4)),
            CueKind::Owl => (self.rng.gen_range(0.2..0.4), self.rng.gen_range(1.0..1.25)),
            CueKind::Wolf => (self.rng.gen_range(0.12..0.27), self.rng.gen_range(1.0..1.15)),
        };
        log::debug!("[audio] {} vol={volume:.2} rate={rate:.2}", kind.label());
        self.push_trigger(AudioCue { kind, volume, rate, at_seconds: now });
    }

    fn push_trigger(&mut self, cue: AudioCue) {
        if self.triggers.len() == self.capacity {
            self.triggers.pop_front();
        }
        self.triggers.push_back(cue);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crickets_fade_in_at_night_and_mute_by_day() {
        let mut audio = AmbientAudio::new(8, Some(1));
        for _ in 0..400 {
            audio.update(1.0 / 60.0, 0.5, WeatherMode::Normal, &[]);
        }
        assert!((audio.mix().crickets - 0.55).abs() < 0.01);
        for _ in 0..200 {
            audio.update(1.0 / 60.0, 0.1, WeatherMode::Normal, &[]);
        }
        assert_eq!(audio.mix().crickets, 0.0);
    }

    #[test]
    fn ring_buffer_keeps_latest_cues() {
        let mut audio = AmbientAudio::new(2, Some(2));
        for kind in [CueKind::ThunderNear, CueKind::ThunderDistant, CueKind::Rooster] {
            audio.play(kind);
        }
        let kinds: Vec<_> = audio.recent_triggers().map(|c| c.kind).collect();
        assert_eq!(kinds, vec![CueKind::ThunderDistant, CueKind::Rooster]);
    }

    #[test]
    fn rooster_crows_when_night_ends() {
        let mut audio = AmbientAudio::new(4, Some(3));
        audio.update(0.1, 0.79, WeatherMode::Normal, &[]);
        audio.update(0.1, 0.81, WeatherMode::Normal, &[]);
        assert_eq!(audio.recent_triggers().next().map(|c| c.kind), Some(CueKind::Rooster));
    }
}
