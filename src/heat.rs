//! Forecast-based heat de-rating

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

use crate::models::WeatherForecast;

/// Humidity only counts above this gate temperature (°C)
const HUMIDITY_GATE_TEMP: Decimal = dec!(20);
/// ...and above this relative humidity (%)
const HUMIDITY_GATE_PERCENT: Decimal = dec!(40);
const HUMIDITY_COEFFICIENT: Decimal = dec!(0.05);

/// Factors at or below this make hard sessions inadvisable
pub const HARD_SESSION_FACTOR_LIMIT: Decimal = dec!(0.60);

/// Heat index bands, coolest first
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HeatBand {
    Cool,     // < 18
    Mild,     // 18-22
    Warm,     // 22-25
    Hot,      // 25-28
    VeryHot,  // 28-32
    Heatwave, // 32-35
    Extreme,  // >= 35
}

impl HeatBand {
    pub fn from_heat_index(heat_index: Decimal) -> Self {
        if heat_index < dec!(18) {
            HeatBand::Cool
        } else if heat_index < dec!(22) {
            HeatBand::Mild
        } else if heat_index < dec!(25) {
            HeatBand::Warm
        } else if heat_index < dec!(28) {
            HeatBand::Hot
        } else if heat_index < dec!(32) {
            HeatBand::VeryHot
        } else if heat_index < dec!(35) {
            HeatBand::Heatwave
        } else {
            HeatBand::Extreme
        }
    }

    pub fn factor(&self) -> Decimal {
        match self {
            HeatBand::Cool | HeatBand::Mild => dec!(1.0),
            HeatBand::Warm => dec!(0.95),
            HeatBand::Hot => dec!(0.88),
            HeatBand::VeryHot => dec!(0.75),
            HeatBand::Heatwave => dec!(0.60),
            HeatBand::Extreme => dec!(0.0),
        }
    }

    pub fn advice(&self) -> &'static str {
        match self {
            HeatBand::Cool | HeatBand::Mild => "Optimal conditions",
            HeatBand::Warm => "Slight reduction recommended",
            HeatBand::Hot => "Reduce intensity",
            HeatBand::VeryHot => "Reduce load significantly, hydrate well",
            HeatBand::Heatwave => "Easy session only, hard efforts inadvisable",
            HeatBand::Extreme => "Rest recommended: heat stroke danger",
        }
    }
}

impl fmt::Display for HeatBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.advice())
    }
}

/// Heat stress assessment for the planned session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeatAssessment {
    pub heat_index: Decimal,
    pub band: HeatBand,

    /// Load multiplier; 0.0 means the session must be skipped
    pub factor: Decimal,

    pub advice: String,
}

impl HeatAssessment {
    pub fn skip_session(&self) -> bool {
        self.factor.is_zero()
    }

    /// Hard efforts should be replaced by easy running
    pub fn hard_inadvisable(&self) -> bool {
        self.factor <= HARD_SESSION_FACTOR_LIMIT
    }
}

pub struct HeatAdjuster;

impl HeatAdjuster {
    /// Heat index in °C
    ///
    /// Humidity is added only when the apparent temperature (feels-like, or the
    /// air temperature when absent) reaches 20 °C and humidity exceeds 40 %.
    pub fn heat_index(forecast: &WeatherForecast) -> Decimal {
        let gate = forecast.feels_like.unwrap_or(forecast.temperature);
        if gate >= HUMIDITY_GATE_TEMP && forecast.humidity > HUMIDITY_GATE_PERCENT {
            forecast.temperature
                + HUMIDITY_COEFFICIENT * (forecast.humidity - HUMIDITY_GATE_PERCENT)
        } else {
            forecast.temperature
        }
    }

    pub fn assess(forecast: &WeatherForecast) -> HeatAssessment {
        let heat_index = Self::heat_index(forecast);
        let band = HeatBand::from_heat_index(heat_index);

        debug!(
            "Heat index {} °C ({}% humidity) → factor {}",
            heat_index.round_dp(1),
            forecast.humidity,
            band.factor()
        );

        HeatAssessment {
            heat_index,
            band,
            factor: band.factor(),
            advice: band.advice().to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn forecast(temperature: Decimal, feels_like: Option<Decimal>, humidity: Decimal) -> WeatherForecast {
        WeatherForecast {
            temperature,
            feels_like,
            humidity,
            description: None,
        }
    }

    #[test]
    fn test_humidity_ignored_when_cool_or_dry() {
        assert_eq!(HeatAdjuster::heat_index(&forecast(dec!(15), None, dec!(90))), dec!(15));
        assert_eq!(HeatAdjuster::heat_index(&forecast(dec!(26), None, dec!(40))), dec!(26));
    }

    #[test]
    fn test_humidity_raises_heat_index() {
        // 24 + 0.05 × (80 - 40) = 26
        let assessment = HeatAdjuster::assess(&forecast(dec!(24), None, dec!(80)));
        assert_eq!(assessment.heat_index, dec!(26));
        assert_eq!(assessment.band, HeatBand::Hot);
        assert_eq!(assessment.factor, dec!(0.88));
        assert!(!assessment.skip_session());
    }

    #[test]
    fn test_feels_like_drives_the_gate() {
        // Air at 19 °C stays below the gate, but it feels like 21 °C
        let with_feels_like = forecast(dec!(19), Some(dec!(21)), dec!(60));
        assert_eq!(HeatAdjuster::heat_index(&with_feels_like), dec!(20));

        let without = forecast(dec!(19), None, dec!(60));
        assert_eq!(HeatAdjuster::heat_index(&without), dec!(19));
    }

    #[test]
    fn test_band_factors() {
        let cases = [
            (dec!(17.9), dec!(1.0)),
            (dec!(21.9), dec!(1.0)),
            (dec!(22), dec!(0.95)),
            (dec!(27.9), dec!(0.88)),
            (dec!(31.9), dec!(0.75)),
            (dec!(34.9), dec!(0.60)),
            (dec!(35), dec!(0.0)),
        ];
        for (index, factor) in cases {
            assert_eq!(HeatBand::from_heat_index(index).factor(), factor, "heat index {}", index);
        }
    }

    #[test]
    fn test_extreme_heat_skips_session() {
        // 33 + 0.05 × (70 - 40) = 34.5 → heatwave; 34 + 2 = 36 → extreme
        let heatwave = HeatAdjuster::assess(&forecast(dec!(33), None, dec!(70)));
        assert_eq!(heatwave.band, HeatBand::Heatwave);
        assert!(heatwave.hard_inadvisable());
        assert!(!heatwave.skip_session());

        let extreme = HeatAdjuster::assess(&forecast(dec!(34), None, dec!(80)));
        assert_eq!(extreme.heat_index, dec!(36));
        assert!(extreme.skip_session());
        assert_eq!(extreme.advice, "Rest recommended: heat stroke danger");
    }
}
