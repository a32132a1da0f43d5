/// Comfort band for a Celsius reading, used by the chat weather panel.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum TemperatureBand {
    VeryHot,
    Hot,
    Warm,
    Comfortable,
    Cool,
    Cold,
    VeryCold,
    Freezing,
}

impl TemperatureBand {
    pub fn for_celsius(temp: f64) -> Self {
        if temp >= 35.0 {
            TemperatureBand::VeryHot
        } else if temp >= 30.0 {
            TemperatureBand::Hot
        } else if temp >= 25.0 {
            TemperatureBand::Warm
        } else if temp >= 20.0 {
            TemperatureBand::Comfortable
        } else if temp >= 15.0 {
            TemperatureBand::Cool
        } else if temp >= 10.0 {
            TemperatureBand::Cold
        } else if temp >= 0.0 {
            TemperatureBand::VeryCold
        } else {
            TemperatureBand::Freezing
        }
    }

    /// Parses a leading number out of text such as `"31°C"`.
    pub fn for_text(temp: &str) -> Option<Self> {
        parse_degrees(temp).map(Self::for_celsius)
    }

    pub fn level(self) -> &'static str {
        match self {
            TemperatureBand::VeryHot => "Very Hot",
            TemperatureBand::Hot => "Hot",
            TemperatureBand::Warm => "Warm",
            TemperatureBand::Comfortable => "Comfortable",
            TemperatureBand::Cool => "Cool",
            TemperatureBand::Cold => "Cold",
            TemperatureBand::VeryCold => "Very Cold",
            TemperatureBand::Freezing => "Freezing",
        }
    }

    pub fn background_class(self) -> &'static str {
        match self {
            TemperatureBand::VeryHot => "bg-red-600",
            TemperatureBand::Hot => "bg-orange-500",
            TemperatureBand::Warm => "bg-yellow-400",
            TemperatureBand::Comfortable => "bg-green-500",
            TemperatureBand::Cool => "bg-blue-400",
            TemperatureBand::Cold => "bg-blue-600",
            TemperatureBand::VeryCold => "bg-indigo-700",
            TemperatureBand::Freezing => "bg-purple-900",
        }
    }

    pub fn text_class(self) -> &'static str {
        match self {
            TemperatureBand::Warm => "text-gray-800",
            _ => "text-white",
        }
    }

    pub fn icon(self) -> &'static str {
        match self {
            TemperatureBand::VeryHot => "🔥",
            TemperatureBand::Hot => "☀️",
            TemperatureBand::Warm => "🌤️",
            TemperatureBand::Comfortable => "✨",
            TemperatureBand::Cool => "🌬️",
            TemperatureBand::Cold => "🧥",
            TemperatureBand::VeryCold => "❄️",
            TemperatureBand::Freezing => "🥶",
        }
    }

    pub fn message(self) -> &'static str {
        match self {
            TemperatureBand::VeryHot => {
                "Extreme heat! Stay hydrated and avoid prolonged sun exposure."
            }
            TemperatureBand::Hot => "Hot weather. Stay cool and drink plenty of water.",
            TemperatureBand::Warm => "Pleasant warm weather.",
            TemperatureBand::Comfortable => "Comfortable temperature.",
            TemperatureBand::Cool => "Cool weather. Consider a light jacket.",
            TemperatureBand::Cold => "Cold weather. Wear warm clothing.",
            TemperatureBand::VeryCold => "Very cold! Bundle up and stay warm.",
            TemperatureBand::Freezing => {
                "Freezing temperatures! Dress warmly and limit outdoor exposure."
            }
        }
    }

    pub fn is_extreme(self) -> bool {
        !matches!(
            self,
            TemperatureBand::Warm | TemperatureBand::Comfortable | TemperatureBand::Cool
        )
    }
}

/// Leading number of a reading such as `"31°C"`.
pub fn parse_degrees(text: &str) -> Option<f64> {
    let t = text.trim_start();
    let end = t
        .char_indices()
        .find(|&(i, c)| !(c.is_ascii_digit() || c == '.' || (i == 0 && (c == '-' || c == '+'))))
        .map_or(t.len(), |(i, _)| i);
    t[..end].parse().ok()
}

/// Tailwind text colour for a temperature readout.
pub fn temperature_color(temp: f64) -> &'static str {
    if temp >= 35.0 {
        "text-red-600"
    } else if temp >= 30.0 {
        "text-orange-600"
    } else if temp >= 25.0 {
        "text-yellow-600"
    } else if temp >= 20.0 {
        "text-green-600"
    } else if temp >= 15.0 {
        "text-blue-600"
    } else if temp >= 10.0 {
        "text-indigo-600"
    } else {
        "text-purple-600"
    }
}
