use glam::Vec2;
use serde::Deserialize;
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use winit::event::{ElementState, WindowEvent};
use winit::keyboard::{Key, NamedKey};

pub const DEFAULT_BINDINGS_PATH: &str = "config/input.json";

/// One-shot command produced by a key press.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Command {
    TogglePause,
    /// Change the cycle duration by this many seconds.
    AdjustDuration(f32),
    /// Jump the clock to this progress.
    Scrub(f32),
    Quit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum InputAction {
    TogglePause,
    ShorterCycle,
    LongerCycle,
    Scrub(u8),
    Quit,
}

impl InputAction {
    fn from_str(value: &str) -> Option<Self> {
        match value {
            "toggle_pause" => Some(Self::TogglePause),
            "shorter_cycle" => Some(Self::ShorterCycle),
            "longer_cycle" => Some(Self::LongerCycle),
            "quit" => Some(Self::Quit),
            other => {
                let digit = other.strip_prefix("scrub_")?.parse::<u8>().ok()?;
                (digit <= 9).then_some(Self::Scrub(digit))
            }
        }
    }

    fn command(self) -> Command {
        match self {
            Self::TogglePause => Command::TogglePause,
            Self::ShorterCycle => Command::AdjustDuration(-DURATION_STEP_SECONDS),
            Self::LongerCycle => Command::AdjustDuration(DURATION_STEP_SECONDS),
            Self::Scrub(digit) => Command::Scrub(f32::from(digit) / 10.0),
            Self::Quit => Command::Quit,
        }
    }
}

pub const DURATION_STEP_SECONDS: f32 = 5.0;

/// Keyboard commands and pointer position for the room window.
pub struct Input {
    bindings: InputBindings,
    commands: Vec<Command>,
    pointer: Option<Vec2>,
    pointer_moved: bool,
}

impl Input {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(path: impl AsRef<Path>) -> Self {
        Self::with_bindings(InputBindings::load_or_default(path))
    }

    fn with_bindings(bindings: InputBindings) -> Self {
        Self { bindings, commands: Vec::new(), pointer: None, pointer_moved: false }
    }

    pub fn handle_window_event(&mut self, event: &WindowEvent) {
        match event {
            WindowEvent::CursorMoved { position, .. } => {
                self.set_pointer(Some(Vec2::new(position.x as f32, position.y as f32)));
            }
            WindowEvent::CursorLeft { .. } => self.set_pointer(None),
            WindowEvent::KeyboardInput { event, .. } => {
                if event.state == ElementState::Pressed && !event.repeat {
                    self.press(&event.logical_key);
                }
            }
            _ => {}
        }
    }

    pub fn press(&mut self, key: &Key) {
        let Some(binding) = InputKeyBinding::from_event_key(key) else {
            return;
        };
        let commands: Vec<_> = self.bindings.actions_for_key(&binding).map(InputAction::command).collect();
        self.commands.extend(commands);
    }

    fn set_pointer(&mut self, pointer: Option<Vec2>) {
        self.pointer = pointer;
        self.pointer_moved = true;
    }

    /// Last known pointer position in physical pixels; `None` once the pointer leaves the window.
    pub fn pointer(&self) -> Option<Vec2> {
        self.pointer
    }

    /// True once after the pointer moved or left; hover only needs re-picking then.
    pub fn take_pointer_moved(&mut self) -> bool {
        std::mem::take(&mut self.pointer_moved)
    }

    pub fn drain_commands(&mut self) -> Vec<Command> {
        std::mem::take(&mut self.commands)
    }
}

impl Default for Input {
    fn default() -> Self {
        Self::with_bindings(InputBindings::default())
    }
}

#[derive(Debug, Clone)]
struct InputBindings {
    key_to_actions: HashMap<InputKeyBinding, Vec<InputAction>>,
}

impl InputBindings {
    fn load_or_default(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        let contents = match fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(err) => {
                log::debug!("[input] {} not read ({err}); using default bindings", path.display());
                return Self::default();
            }
        };
        match serde_json::from_str::<InputConfigFile>(&contents) {
            Ok(config) => Self::with_overrides(config.into_overrides(&path.display().to_string())),
            Err(err) => {
                log::warn!("[input] Failed to parse {}: {err}. Falling back to default bindings.", path.display());
                Self::default()
            }
        }
    }

    fn with_overrides(overrides: HashMap<InputAction, Vec<InputKeyBinding>>) -> Self {
        let mut action_map = Self::default_action_map();
        for (action, keys) in overrides {
            if !keys.is_empty() {
                action_map.insert(action, keys);
            }
        }
        Self::from_action_map(action_map)
    }

    fn default_action_map() -> HashMap<InputAction, Vec<InputKeyBinding>> {
        let mut map = HashMap::new();
        map.insert(InputAction::TogglePause, vec![InputKeyBinding::Named(NamedKeyCode::Space)]);
        map.insert(InputAction::ShorterCycle, vec![InputKeyBinding::character("[")]);
        map.insert(InputAction::LongerCycle, vec![InputKeyBinding::character("]")]);
        map.insert(InputAction::Quit, vec![InputKeyBinding::Named(NamedKeyCode::Escape)]);
        for digit in 0..=9u8 {
            map.insert(InputAction::Scrub(digit), vec![InputKeyBinding::character(&digit.to_string())]);
        }
        map
    }

    fn from_action_map(action_map: HashMap<InputAction, Vec<InputKeyBinding>>) -> Self {
        let mut key_to_actions: HashMap<InputKeyBinding, Vec<InputAction>> = HashMap::new();
        for (action, keys) in action_map {
            for key in keys {
                key_to_actions.entry(key).or_default().push(action);
            }
        }
        Self { key_to_actions }
    }

    fn actions_for_key(&self, key: &InputKeyBinding) -> impl Iterator<Item = InputAction> + '_ {
        self.key_to_actions.get(key).into_iter().flatten().copied()
    }
}

impl Default for InputBindings {
    fn default() -> Self {
        Self::from_action_map(Self::default_action_map())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum InputKeyBinding {
    Character(String),
    Named(NamedKeyCode),
}

impl InputKeyBinding {
    fn character(ch: &str) -> Self {
        Self::Character(ch.to_lowercase())
    }

    fn from_event_key(key: &Key) -> Option<Self> {
        match key {
            Key::Character(ch) if !ch.is_empty() => Some(Self::character(ch)),
            Key::Named(named) => NamedKeyCode::from_named_key(named).map(Self::Named),
            _ => None,
        }
    }

    fn from_config_value(raw: &str) -> Option<Self> {
        let normalized = raw.trim().to_lowercase();
        if let Some(named) = NamedKeyCode::from_str(&normalized) {
            return Some(Self::Named(named));
        }
        (normalized.chars().count() == 1).then_some(Self::Character(normalized))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum NamedKeyCode {
    Space,
    Escape,
}

impl NamedKeyCode {
    fn from_named_key(key: &NamedKey) -> Option<Self> {
        match key {
            NamedKey::Space => Some(Self::Space),
            NamedKey::Escape => Some(Self::Escape),
            _ => None,
        }
    }

    fn from_str(value: &str) -> Option<Self> {
        match value {
            "space" => Some(Self::Space),
            "esc" | "escape" => Some(Self::Escape),
            _ => None,
        }
    }
}

#[derive(Debug, Deserialize)]
struct InputConfigFile {
    #[serde(default)]
    bindings: HashMap<String, Vec<String>>,
}

impl InputConfigFile {
    fn into_overrides(self, origin: &str) -> HashMap<InputAction, Vec<InputKeyBinding>> {
        let mut overrides = HashMap::new();
        for (action_name, keys) in self.bindings {
            let Some(action) = InputAction::from_str(&action_name.trim().to_lowercase()) else {
                log::warn!("[input] {origin}: unknown action '{action_name}', ignoring.");
                continue;
            };
            let mut parsed = Vec::new();
            for key in keys {
                match InputKeyBinding::from_config_value(&key) {
                    Some(binding) => parsed.push(binding),
                    None => log::warn!("[input] {origin}: unknown key '{key}' for action '{action_name}', ignoring."),
                }
            }
            if parsed.is_empty() {
                log::warn!("[input] {origin}: action '{action_name}' has no valid keys, keeping defaults.");
                continue;
            }
            overrides.insert(action, parsed);
        }
        overrides
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn default_bindings_cover_shell_keys() {
        let mut input = Input::new();
        input.press(&Key::Named(NamedKey::Space));
        input.press(&Key::Character("]".into()));
        input.press(&Key::Character("[".into()));
        input.press(&Key::Character("7".into()));
        input.press(&Key::Named(NamedKey::Escape));
        input.press(&Key::Character("x".into()));
        assert_eq!(
            input.drain_commands(),
            vec![
                Command::TogglePause,
                Command::AdjustDuration(5.0),
                Command::AdjustDuration(-5.0),
                Command::Scrub(0.7),
                Command::Quit,
            ]
        );
        assert!(input.drain_commands().is_empty());
    }

    #[test]
    fn config_file_overrides_single_action() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        write!(file, r#"{{"bindings": {{"toggle_pause": ["p"], "warp": ["w"], "quit": ["??"]}}}}"#)
            .expect("write bindings");
        let mut input = Input::from_config(file.path());
        input.press(&Key::Named(NamedKey::Space));
        assert!(input.drain_commands().is_empty());
        input.press(&Key::Character("P".into()));
        input.press(&Key::Named(NamedKey::Escape));
        assert_eq!(input.drain_commands(), vec![Command::TogglePause, Command::Quit]);
    }

    #[test]
    fn pointer_tracks_moves_and_leave() {
        let mut input = Input::new();
        input.set_pointer(Some(Vec2::new(3.0, 4.0)));
        assert!(input.take_pointer_moved());
        assert!(!input.take_pointer_moved());
        assert_eq!(input.pointer(), Some(Vec2::new(3.0, 4.0)));
        input.set_pointer(None);
        assert!(input.take_pointer_moved());
        assert_eq!(input.pointer(), None);
    }
}
