use serde::Deserialize;
use std::fmt;
use std::str::FromStr;

/// Session-wide weather selection. Picked once at startup and never changed while running.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize)]
#[serde(from = "String")]
pub enum WeatherMode {
    #[default]
    Normal,
    Rainy,
    Cloudy,
    Snow,
}

impl WeatherMode {
    pub const ALL: [WeatherMode; 4] =
        [WeatherMode::Normal, WeatherMode::Rainy, WeatherMode::Cloudy, WeatherMode::Snow];

    pub fn label(self) -> &'static str {
        match self {
            WeatherMode::Normal => "normal",
            WeatherMode::Rainy => "rainy",
            WeatherMode::Cloudy => "cloudy",
            WeatherMode::Snow => "snow",
        }
    }

    /// Unknown names fall back to [`WeatherMode::Normal`].
    pub fn from_name_lossy(name: &str) -> Self {
        name.parse().unwrap_or_default()
    }

    pub fn has_storm_clouds(self) -> bool {
        matches!(self, WeatherMode::Rainy | WeatherMode::Cloudy)
    }
}

impl FromStr for WeatherMode {
    type Err = UnknownWeather;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "normal" | "clear" => Ok(WeatherMode::Normal),
            "rainy" | "rain" => Ok(WeatherMode::Rainy),
            "cloudy" => Ok(WeatherMode::Cloudy),
            "snow" | "snowy" => Ok(WeatherMode::Snow),
            _ => Err(UnknownWeather(s.to_string())),
        }
    }
}

impl From<String> for WeatherMode {
    fn from(value: String) -> Self {
        match value.parse() {
            Ok(mode) => mode,
            Err(err) => {
                log::warn!("[config] {err}; using normal weather");
                WeatherMode::Normal
            }
        }
    }
}

impl fmt::Display for WeatherMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownWeather(pub String);

impl fmt::Display for UnknownWeather {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown weather mode '{}'", self.0)
    }
}

impl std::error::Error for UnknownWeather {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_known_modes_case_insensitively() {
        assert_eq!("Rainy".parse::<WeatherMode>().unwrap(), WeatherMode::Rainy);
        assert_eq!(" SNOW ".parse::<WeatherMode>().unwrap(), WeatherMode::Snow);
        assert_eq!("cloudy".parse::<WeatherMode>().unwrap(), WeatherMode::Cloudy);
    }

    #[test]
    fn unknown_mode_falls_back_to_normal() {
        assert!("hail".parse::<WeatherMode>().is_err());
        assert_eq!(WeatherMode::from_name_lossy("hail"), WeatherMode::Normal);
        let parsed: WeatherMode = serde_json::from_str("\"fog\"").expect("deserialize");
        assert_eq!(parsed, WeatherMode::Normal);
    }
}
