use serde::{Deserialize, Serialize};

use crate::ElementType;

/// Field-wide weather. At most one is active at a time.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WeatherKind {
    Sunny,
    Rain,
    Sandstorm,
    Hail,
    /// Extreme sun: Water-type moves evaporate.
    HarshSun,
    /// Extreme rain: Fire-type moves fizzle out.
    HeavyRain,
}

impl WeatherKind {
    /// Whether the weather hurts exposed combatants at the end of each turn.
    pub fn is_damaging(self) -> bool {
        matches!(self, WeatherKind::Sandstorm | WeatherKind::Hail)
    }

    pub fn is_type_immune(self, element: ElementType) -> bool {
        match self {
            WeatherKind::Sandstorm => matches!(element, ElementType::Rock | ElementType::Ground),
            WeatherKind::Hail => element == ElementType::Ice,
            _ => false,
        }
    }

    /// Moves of this element fail outright under the weather.
    pub fn cancels(self, element: ElementType) -> bool {
        match self {
            WeatherKind::HarshSun => element == ElementType::Water,
            WeatherKind::HeavyRain => element == ElementType::Fire,
            _ => false,
        }
    }

    /// Damage multiplier for moves of the given element.
    pub fn damage_multiplier(self, element: ElementType) -> f64 {
        match (self, element) {
            (WeatherKind::Sunny | WeatherKind::HarshSun, ElementType::Fire) => 1.5,
            (WeatherKind::Sunny | WeatherKind::HarshSun, ElementType::Water) => 0.5,
            (WeatherKind::Rain | WeatherKind::HeavyRain, ElementType::Water) => 1.5,
            (WeatherKind::Rain | WeatherKind::HeavyRain, ElementType::Fire) => 0.5,
            _ => 1.0,
        }
    }

    pub fn start_text(self) -> &'static str {
        match self {
            WeatherKind::Sunny => "The sunlight got bright!",
            WeatherKind::Rain => "A downpour started!",
            WeatherKind::Sandstorm => "A sandstorm brewed!",
            WeatherKind::Hail => "It started to hail!",
            WeatherKind::HarshSun => "The sunlight got extremely harsh!",
            WeatherKind::HeavyRain => "A heavy downpour started!",
        }
    }

    /// Shown once per turn while the weather lasts.
    pub fn lapse_text(self) -> &'static str {
        match self {
            WeatherKind::Sunny => "The sunlight is strong.",
            WeatherKind::Rain => "Rain continues to fall.",
            WeatherKind::Sandstorm => "The sandstorm rages.",
            WeatherKind::Hail => "Hail continues to fall.",
            WeatherKind::HarshSun => "The sunlight is extremely harsh.",
            WeatherKind::HeavyRain => "The rain is extremely heavy.",
        }
    }

    pub fn end_text(self) -> &'static str {
        match self {
            WeatherKind::Sunny => "The sunlight faded.",
            WeatherKind::Rain => "The rain stopped.",
            WeatherKind::Sandstorm => "The sandstorm subsided.",
            WeatherKind::Hail => "The hail stopped.",
            WeatherKind::HarshSun => "The harsh sunlight faded!",
            WeatherKind::HeavyRain => "The heavy rain has lifted!",
        }
    }

    /// Message suffix for a combatant hurt by the weather.
    pub fn damage_text(self) -> Option<&'static str> {
        match self {
            WeatherKind::Sandstorm => Some("is buffeted by the sandstorm!"),
            WeatherKind::Hail => Some("is pelted by the hail!"),
            _ => None,
        }
    }

    pub fn cancel_text(self) -> Option<&'static str> {
        match self {
            WeatherKind::HarshSun => Some("The Water-type attack evaporated in the harsh sunlight!"),
            WeatherKind::HeavyRain => Some("The Fire-type attack fizzled out in the heavy rain!"),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(WeatherKind::Sandstorm, ElementType::Rock, true)]
    #[case(WeatherKind::Sandstorm, ElementType::Ice, false)]
    #[case(WeatherKind::Hail, ElementType::Ice, true)]
    #[case(WeatherKind::Rain, ElementType::Water, false)]
    fn weather_damage_immunity_by_type(
        #[case] weather: WeatherKind,
        #[case] element: ElementType,
        #[case] immune: bool,
    ) {
        assert_eq!(weather.is_type_immune(element), immune);
    }

    #[test]
    fn extreme_weather_cancels_the_opposing_element() {
        assert!(WeatherKind::HarshSun.cancels(ElementType::Water));
        assert!(!WeatherKind::Sunny.cancels(ElementType::Water));
        assert!(WeatherKind::HeavyRain.cancels(ElementType::Fire));
        assert_eq!(WeatherKind::Rain.damage_multiplier(ElementType::Fire), 0.5);
    }
}
