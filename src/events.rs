use bevy_ecs::prelude::{Entity, Resource};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StrikeDistance {
    Near,
    Distant,
}

impl StrikeDistance {
    pub fn label(self) -> &'static str {
        match self {
            StrikeDistance::Near => "near",
            StrikeDistance::Distant => "distant",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LightningFlash {
    pub distance: StrikeDistance,
    /// Simulation time of the rising edge, in seconds.
    pub at_seconds: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SkyEvent {
    Lightning(LightningFlash),
    HoverChanged { group: Option<Entity>, name: Option<String> },
    TimeOfDayChanged { label: &'static str, progress: f32 },
}

impl fmt::Display for SkyEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkyEvent::Lightning(flash) => {
                write!(f, "Lightning distance={} t={:.2}", flash.distance.label(), flash.at_seconds)
            }
            SkyEvent::HoverChanged { group: Some(entity), name } => {
                write!(f, "HoverChanged group={} name={}", entity.index(), name.as_deref().unwrap_or("?"))
            }
            SkyEvent::HoverChanged { group: None, .. } => write!(f, "HoverChanged group=none"),
            SkyEvent::TimeOfDayChanged { label, progress } => {
                write!(f, "TimeOfDayChanged label={label} progress={progress:.3}")
            }
        }
    }
}

/// Frame-scoped event queue. Producers push during the tick, consumers drain afterwards.
#[derive(Debug, Default, Resource)]
pub struct EventBus {
    events: Vec<SkyEvent>,
}

impl EventBus {
    pub fn push(&mut self, event: SkyEvent) {
        self.events.push(event);
    }

    pub fn drain(&mut self) -> Vec<SkyEvent> {
        self.events.drain(..).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }
}
