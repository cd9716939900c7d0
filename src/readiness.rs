//! Daily readiness scoring
//!
//! Combines five independent recovery signals into one bounded multiplier that
//! scales the next session's load.
//!
//! # Components
//!
//! - **TSB**: current form (CTL - ATL)
//! - **Resting HR**: today's reading against a 14-reading median baseline
//! - **Sleep**: mean sleep over the last three days
//! - **Ramp rate**: weekly CTL progression reported by the platform
//! - **ACWR**: acute:chronic workload ratio (ATL / CTL)
//!
//! HRV is reported alongside as an informational component and never changes
//! the score.
//!
//! # Missing Data
//!
//! A component without enough data is marked unavailable and contributes a
//! neutral modifier of 1.0. Missing data is never an error, so a series with no
//! optional fields at all scores exactly 1.0 (provided TSB and ACWR are neutral).

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use tracing::{debug, info};

use crate::models::WellnessSample;
use crate::pmc::acwr;

/// Lowest possible readiness score
pub const MIN_READINESS: Decimal = dec!(0.5);

/// Highest possible readiness score
pub const MAX_READINESS: Decimal = dec!(1.1);

/// Resting-HR readings used for the baseline
const RESTING_HR_WINDOW: usize = 14;

/// Readings required before a baseline is trusted
const RESTING_HR_MIN_READINGS: usize = 3;

/// Days averaged for the sleep component
const SLEEP_WINDOW: usize = 3;

const NEUTRAL: Decimal = Decimal::ONE;

/// Scored components in recommendation order
const COMPONENT_ORDER: [&str; 5] = ["tsb", "resting_hr", "sleep", "ramp_rate", "acwr"];

/// Readiness status derived from the clamped score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReadinessStatus {
    /// Score ≥ 1.0
    Ready,
    /// Score ≥ 0.85
    Moderate,
    /// Score ≥ 0.70
    Caution,
    RestAdvised,
}

impl ReadinessStatus {
    pub fn from_score(score: Decimal) -> Self {
        if score >= dec!(1.0) {
            ReadinessStatus::Ready
        } else if score >= dec!(0.85) {
            ReadinessStatus::Moderate
        } else if score >= dec!(0.70) {
            ReadinessStatus::Caution
        } else {
            ReadinessStatus::RestAdvised
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ReadinessStatus::Ready => "ready",
            ReadinessStatus::Moderate => "moderate",
            ReadinessStatus::Caution => "caution",
            ReadinessStatus::RestAdvised => "rest advised",
        }
    }
}

impl fmt::Display for ReadinessStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Outcome of one readiness component
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentResult {
    /// Measured value (TSB, bpm, hours, ramp, ratio)
    pub value: Option<Decimal>,

    /// Multiplier applied to the score
    pub modifier: Decimal,

    /// Human-readable explanation
    pub note: String,

    /// False when the component lacked data and fell back to neutral
    pub available: bool,

    /// Resting-HR median baseline
    #[serde(skip_serializing_if = "Option::is_none")]
    pub baseline: Option<Decimal>,

    /// Resting-HR elevation above baseline
    #[serde(skip_serializing_if = "Option::is_none")]
    pub elevation: Option<Decimal>,

    /// Last night's sleep in hours
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_night: Option<Decimal>,

    /// Readings backing the value (baseline or sleep average)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub samples: Option<usize>,
}

impl ComponentResult {
    fn measured(value: Decimal, modifier: Decimal, note: impl Into<String>) -> Self {
        ComponentResult {
            value: Some(value),
            modifier,
            note: note.into(),
            available: true,
            baseline: None,
            elevation: None,
            last_night: None,
            samples: None,
        }
    }

    fn unavailable(note: impl Into<String>) -> Self {
        ComponentResult {
            value: None,
            modifier: NEUTRAL,
            note: note.into(),
            available: false,
            baseline: None,
            elevation: None,
            last_night: None,
            samples: None,
        }
    }

    pub fn is_neutral(&self) -> bool {
        self.modifier == NEUTRAL
    }
}

/// Composite readiness for the most recent day of a wellness series
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReadinessResult {
    /// Clamped product of all modifiers, in [0.5, 1.1]
    pub score: Decimal,

    pub status: ReadinessStatus,

    /// Component name → outcome
    pub components: BTreeMap<String, ComponentResult>,

    /// Notes of every component that moved the score, plus advisories
    pub recommendations: Vec<String>,
}

impl ReadinessResult {
    pub fn component(&self, name: &str) -> Option<&ComponentResult> {
        self.components.get(name)
    }
}

/// Readiness scoring over a wellness series
pub struct ReadinessScorer;

impl ReadinessScorer {
    /// Score the last sample of `history` (ordered oldest to newest)
    ///
    /// An empty series yields a neutral 1.0 with every component unavailable.
    pub fn score(history: &[WellnessSample]) -> ReadinessResult {
        let mut components = BTreeMap::new();
        let mut recommendations = Vec::new();

        let tsb = match history.last() {
            Some(today) => {
                let (component, advisory) = Self::tsb_component(today.tsb());
                if let Some(advisory) = advisory {
                    recommendations.push(advisory);
                }
                component
            }
            None => ComponentResult::unavailable("No wellness data"),
        };
        components.insert("tsb".to_string(), tsb);
        components.insert("resting_hr".to_string(), Self::resting_hr_component(history));
        components.insert("sleep".to_string(), Self::sleep_component(history));
        components.insert("ramp_rate".to_string(), Self::ramp_rate_component(history.last()));
        components.insert("acwr".to_string(), Self::acwr_component(history.last()));

        let raw: Decimal = components.values().map(|c| c.modifier).product();
        let score = raw.clamp(MIN_READINESS, MAX_READINESS);

        // Informational only; inserted after the product so it can never contribute
        components.insert("hrv".to_string(), Self::hrv_component(history.last()));

        for name in COMPONENT_ORDER {
            if let Some(component) = components.get(name).filter(|c| !c.is_neutral()) {
                debug!("Readiness component {} modifier {}", name, component.modifier);
                recommendations.push(component.note.clone());
            }
        }
        if recommendations.is_empty() {
            recommendations.push("All indicators normal - train as planned".to_string());
        }

        let status = ReadinessStatus::from_score(score);
        info!("Readiness score {} ({})", score, status);

        ReadinessResult {
            score,
            status,
            components,
            recommendations,
        }
    }

    /// TSB modifier plus the optional "well rested" advisory
    fn tsb_component(tsb: Decimal) -> (ComponentResult, Option<String>) {
        let rounded = tsb.round_dp(1);
        if tsb < dec!(-25) {
            let note = format!("Very high fatigue (TSB {}) - prioritize recovery", rounded);
            (ComponentResult::measured(tsb, dec!(0.5), note), None)
        } else if tsb < dec!(-15) {
            let note = format!("High fatigue (TSB {}) - reduce intensity", rounded);
            (ComponentResult::measured(tsb, dec!(0.75), note), None)
        } else if tsb < dec!(-5) {
            let note = format!("Moderate fatigue (TSB {}) - keep it controlled", rounded);
            (ComponentResult::measured(tsb, dec!(0.9), note), None)
        } else if tsb < dec!(10) {
            let note = format!("Balanced form (TSB {})", rounded);
            (ComponentResult::measured(tsb, NEUTRAL, note), None)
        } else {
            let note = format!("Well rested (TSB {}) - good day for quality work", rounded);
            (ComponentResult::measured(tsb, NEUTRAL, note.clone()), Some(note))
        }
    }

    /// Today's resting HR against the median of the last 14 readings
    fn resting_hr_component(history: &[WellnessSample]) -> ComponentResult {
        let Some(today) = history.last().and_then(|s| s.resting_hr) else {
            debug!("No resting HR reading for today");
            return ComponentResult::unavailable("No resting HR reading today");
        };

        let readings: Vec<Decimal> = history
            .iter()
            .filter_map(|s| s.resting_hr)
            .map(Decimal::from)
            .collect();
        let recent = &readings[readings.len().saturating_sub(RESTING_HR_WINDOW)..];

        if recent.len() < RESTING_HR_MIN_READINGS {
            let mut component = ComponentResult::unavailable(format!(
                "Insufficient data for resting HR baseline ({} of {} readings)",
                recent.len(),
                RESTING_HR_MIN_READINGS
            ));
            component.value = Some(Decimal::from(today));
            component.samples = Some(recent.len());
            return component;
        }

        let baseline = median(recent);
        let elevation = Decimal::from(today) - baseline;

        let (modifier, note) = if elevation >= dec!(7) {
            (
                dec!(0.7),
                format!(
                    "Resting HR elevated by {} bpm - possible illness or deep fatigue",
                    elevation.round_dp(1)
                ),
            )
        } else if elevation >= dec!(5) {
            (
                dec!(0.85),
                format!("Resting HR elevated by {} bpm - monitor recovery", elevation.round_dp(1)),
            )
        } else {
            (NEUTRAL, format!("Resting HR normal ({} bpm)", today))
        };

        let mut component = ComponentResult::measured(Decimal::from(today), modifier, note);
        component.baseline = Some(baseline);
        component.elevation = Some(elevation);
        component.samples = Some(recent.len());
        component
    }

    /// Mean of available sleep readings across the last three samples
    fn sleep_component(history: &[WellnessSample]) -> ComponentResult {
        let window = &history[history.len().saturating_sub(SLEEP_WINDOW)..];
        let readings: Vec<Decimal> = window.iter().filter_map(|s| s.sleep_hours).collect();

        if readings.is_empty() {
            debug!("No sleep data in the last {} days", SLEEP_WINDOW);
            return ComponentResult::unavailable("No sleep data available");
        }

        let avg = readings.iter().sum::<Decimal>() / Decimal::from(readings.len());
        let display = avg.round_dp(1);

        let (modifier, note) = if avg < dec!(6.0) {
            (dec!(0.75), format!("Sleep deficit ({}h average) - reduce load", display))
        } else if avg < dec!(7.0) {
            (dec!(0.90), format!("Short sleep ({}h average)", display))
        } else if avg >= dec!(8.5) {
            (dec!(1.05), format!("Excellent sleep ({}h average)", display))
        } else {
            (NEUTRAL, format!("Adequate sleep ({}h average)", display))
        };

        let mut component = ComponentResult::measured(avg, modifier, note);
        component.last_night = history.last().and_then(|s| s.sleep_hours);
        component.samples = Some(readings.len());
        component
    }

    fn ramp_rate_component(today: Option<&WellnessSample>) -> ComponentResult {
        let Some(ramp) = today.and_then(|s| s.ramp_rate) else {
            return ComponentResult::unavailable("No ramp rate reported");
        };

        if ramp > dec!(2.0) {
            ComponentResult::measured(
                ramp,
                dec!(0.85),
                format!("Fitness ramping fast ({} CTL/week) - injury risk", ramp.round_dp(1)),
            )
        } else if ramp < Decimal::ZERO {
            ComponentResult::measured(
                ramp,
                NEUTRAL,
                format!("Fitness declining ({} CTL/week)", ramp.round_dp(1)),
            )
        } else {
            ComponentResult::measured(
                ramp,
                NEUTRAL,
                format!("Ramp rate sustainable ({} CTL/week)", ramp.round_dp(1)),
            )
        }
    }

    fn acwr_component(today: Option<&WellnessSample>) -> ComponentResult {
        let Some(today) = today else {
            return ComponentResult::unavailable("No load data");
        };

        let ratio = acwr(today.ctl, today.atl);
        let display = ratio.round_dp(2);
        if ratio > dec!(1.5) {
            ComponentResult::measured(
                ratio,
                dec!(0.8),
                format!("ACWR {} - acute load spike, high injury risk", display),
            )
        } else if ratio > dec!(1.3) {
            ComponentResult::measured(
                ratio,
                dec!(0.9),
                format!("ACWR {} - acute load above chronic, caution", display),
            )
        } else {
            ComponentResult::measured(ratio, NEUTRAL, format!("ACWR {} - load balanced", display))
        }
    }

    fn hrv_component(today: Option<&WellnessSample>) -> ComponentResult {
        match today.and_then(|s| s.hrv) {
            Some(hrv) => ComponentResult::measured(hrv, NEUTRAL, format!("HRV {}", hrv.round_dp(1))),
            None => ComponentResult::unavailable("No HRV reading"),
        }
    }
}

/// Median of a non-empty slice
fn median(values: &[Decimal]) -> Decimal {
    let mut sorted = values.to_vec();
    sorted.sort();
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / dec!(2)
    } else {
        sorted[mid]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Days, NaiveDate};

    fn day(n: u64) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 1)
            .unwrap()
            .checked_add_days(Days::new(n))
            .unwrap()
    }

    /// Series of `len` days with constant load figures
    fn series(len: u64, ctl: Decimal, atl: Decimal) -> Vec<WellnessSample> {
        (0..len).map(|n| WellnessSample::new(day(n), ctl, atl)).collect()
    }

    #[test]
    fn test_readiness_scenario_moderate() {
        // TSB -7, ACWR 1.1 → only the TSB modifier moves
        let mut history = series(14, dec!(70), dec!(77));
        for sample in history.iter_mut() {
            sample.resting_hr = Some(50);
            sample.sleep_hours = Some(dec!(7.2));
        }
        let today = history.last_mut().unwrap();
        today.resting_hr = Some(53);
        today.ramp_rate = Some(dec!(1.0));

        let result = ReadinessScorer::score(&history);

        assert_eq!(result.components["tsb"].modifier, dec!(0.9));
        assert_eq!(result.components["resting_hr"].elevation, Some(dec!(3)));
        assert_eq!(result.components["resting_hr"].modifier, dec!(1.0));
        assert_eq!(result.components["sleep"].value, Some(dec!(7.2)));
        assert_eq!(result.components["sleep"].modifier, dec!(1.0));
        assert_eq!(result.components["ramp_rate"].modifier, dec!(1.0));
        assert_eq!(result.components["acwr"].value, Some(dec!(1.1)));
        assert_eq!(result.score, dec!(0.9));
        assert_eq!(result.status, ReadinessStatus::Moderate);
        assert_eq!(result.status.label(), "moderate");
        assert_eq!(result.recommendations.len(), 1);
    }

    #[test]
    fn test_all_optional_fields_missing_is_neutral() {
        let history = series(5, dec!(50), dec!(50));
        let result = ReadinessScorer::score(&history);

        assert_eq!(result.score, dec!(1.0));
        assert_eq!(result.status, ReadinessStatus::Ready);
        assert!(!result.components["resting_hr"].available);
        assert!(!result.components["sleep"].available);
        assert!(!result.components["ramp_rate"].available);
        assert!(!result.components["hrv"].available);
        assert_eq!(
            result.recommendations,
            vec!["All indicators normal - train as planned".to_string()]
        );
    }

    #[test]
    fn test_empty_series_is_neutral() {
        let result = ReadinessScorer::score(&[]);
        assert_eq!(result.score, dec!(1.0));
        assert!(!result.components["tsb"].available);
    }

    #[test]
    fn test_resting_hr_requires_three_readings() {
        let mut history = series(5, dec!(50), dec!(50));
        history[3].resting_hr = Some(48);
        history[4].resting_hr = Some(60);

        let result = ReadinessScorer::score(&history);
        let rhr = &result.components["resting_hr"];

        assert!(!rhr.available);
        assert_eq!(rhr.modifier, dec!(1.0));
        assert_eq!(rhr.samples, Some(2));
        assert!(rhr.note.starts_with("Insufficient data"));
    }

    #[test]
    fn test_resting_hr_elevation_bands() {
        let mut history = series(10, dec!(50), dec!(50));
        for sample in history.iter_mut() {
            sample.resting_hr = Some(48);
        }

        // Median of nine 48s and today's 55 is 48
        history.last_mut().unwrap().resting_hr = Some(55);
        let result = ReadinessScorer::score(&history);
        assert_eq!(result.components["resting_hr"].baseline, Some(dec!(48)));
        assert_eq!(result.components["resting_hr"].modifier, dec!(0.7));
        assert_eq!(result.score, dec!(0.7));
        assert_eq!(result.status, ReadinessStatus::Caution);

        history.last_mut().unwrap().resting_hr = Some(53);
        let result = ReadinessScorer::score(&history);
        assert_eq!(result.components["resting_hr"].modifier, dec!(0.85));
    }

    #[test]
    fn test_resting_hr_baseline_uses_last_fourteen() {
        let mut history = series(20, dec!(50), dec!(50));
        for (i, sample) in history.iter_mut().enumerate() {
            // six old readings at 70 fall outside the window
            sample.resting_hr = Some(if i < 6 { 70 } else { 50 });
        }

        let result = ReadinessScorer::score(&history);
        let rhr = &result.components["resting_hr"];
        assert_eq!(rhr.samples, Some(14));
        assert_eq!(rhr.baseline, Some(dec!(50)));
    }

    #[test]
    fn test_sleep_bands_and_window() {
        let mut history = series(4, dec!(50), dec!(50));
        // outside the 3-day window
        history[0].sleep_hours = Some(dec!(3));
        history[2].sleep_hours = Some(dec!(5.5));
        history[3] = history[3].clone().with_sleep_seconds(6 * 3600);

        let result = ReadinessScorer::score(&history);
        let sleep = &result.components["sleep"];
        assert_eq!(sleep.value, Some(dec!(5.75)));
        assert_eq!(sleep.modifier, dec!(0.75));
        assert_eq!(sleep.samples, Some(2));
        assert_eq!(sleep.last_night, Some(dec!(6)));

        for sample in history.iter_mut() {
            sample.sleep_hours = Some(dec!(9));
        }
        let result = ReadinessScorer::score(&history);
        assert_eq!(result.components["sleep"].modifier, dec!(1.05));
        assert_eq!(result.score, dec!(1.05));
    }

    #[test]
    fn test_ramp_rate() {
        let mut history = series(3, dec!(50), dec!(50));
        history[2].ramp_rate = Some(dec!(2.5));
        let result = ReadinessScorer::score(&history);
        assert_eq!(result.components["ramp_rate"].modifier, dec!(0.85));

        history[2].ramp_rate = Some(dec!(-1.5));
        let result = ReadinessScorer::score(&history);
        let ramp = &result.components["ramp_rate"];
        assert_eq!(ramp.modifier, dec!(1.0));
        assert!(ramp.note.contains("declining"));
        assert_eq!(result.recommendations.len(), 1);
    }

    #[test]
    fn test_acwr_bands() {
        let history = series(1, dec!(40), dec!(64));
        let result = ReadinessScorer::score(&history);
        // ACWR 1.6, TSB -24
        assert_eq!(result.components["acwr"].modifier, dec!(0.8));
        assert_eq!(result.components["tsb"].modifier, dec!(0.75));
        assert_eq!(result.score, dec!(0.6));

        let history = series(1, dec!(0), dec!(10));
        let result = ReadinessScorer::score(&history);
        assert_eq!(result.components["acwr"].value, Some(dec!(1.0)));
    }

    #[test]
    fn test_recommendations_follow_component_order() {
        let mut history = series(3, dec!(40), dec!(64));
        for sample in history.iter_mut() {
            sample.sleep_hours = Some(dec!(5));
        }
        history[2].ramp_rate = Some(dec!(3));

        let result = ReadinessScorer::score(&history);
        assert_eq!(result.recommendations.len(), 4);
        assert!(result.recommendations[0].starts_with("High fatigue"));
        assert!(result.recommendations[1].starts_with("Sleep deficit"));
        assert!(result.recommendations[2].starts_with("Fitness ramping fast"));
        assert!(result.recommendations[3].starts_with("ACWR 1.6 "));
    }

    #[test]
    fn test_well_rested_advisory() {
        let history = series(1, dec!(60), dec!(45));
        let result = ReadinessScorer::score(&history);

        assert_eq!(result.score, dec!(1.0));
        assert_eq!(result.recommendations.len(), 1);
        assert!(result.recommendations[0].starts_with("Well rested"));
    }

    #[test]
    fn test_score_is_clamped_low() {
        let mut history = series(5, dec!(40), dec!(80));
        for sample in history.iter_mut() {
            sample.resting_hr = Some(45);
            sample.sleep_hours = Some(dec!(4));
            sample.ramp_rate = Some(dec!(4));
        }
        history.last_mut().unwrap().resting_hr = Some(60);

        let result = ReadinessScorer::score(&history);
        assert_eq!(result.score, MIN_READINESS);
        assert_eq!(result.status, ReadinessStatus::RestAdvised);
    }

    #[test]
    fn test_hrv_is_informational() {
        let mut history = series(2, dec!(50), dec!(50));
        history[1].hrv = Some(dec!(62.5));

        let result = ReadinessScorer::score(&history);
        assert_eq!(result.components["hrv"].value, Some(dec!(62.5)));
        assert_eq!(result.components["hrv"].modifier, dec!(1.0));
        assert_eq!(result.score, dec!(1.0));
    }

    #[test]
    fn test_status_thresholds() {
        assert_eq!(ReadinessStatus::from_score(dec!(1.0)), ReadinessStatus::Ready);
        assert_eq!(ReadinessStatus::from_score(dec!(0.85)), ReadinessStatus::Moderate);
        assert_eq!(ReadinessStatus::from_score(dec!(0.70)), ReadinessStatus::Caution);
        assert_eq!(ReadinessStatus::from_score(dec!(0.69)), ReadinessStatus::RestAdvised);
    }

    mod property_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn test_score_always_bounded(
                ctl in 0u32..150,
                atl in 0u32..200,
                rhr_base in 35u16..70,
                rhr_today in 35u16..90,
                sleep_tenths in proptest::option::of(0u32..120),
                ramp_tenths in proptest::option::of(-50i64..80),
            ) {
                let mut history = series(10, Decimal::from(ctl), Decimal::from(atl));
                for sample in history.iter_mut() {
                    sample.resting_hr = Some(rhr_base);
                    sample.sleep_hours = sleep_tenths.map(|s| Decimal::new(s as i64, 1));
                }
                let today = history.last_mut().unwrap();
                today.resting_hr = Some(rhr_today);
                today.ramp_rate = ramp_tenths.map(|r| Decimal::new(r, 1));

                let result = ReadinessScorer::score(&history);
                prop_assert!(result.score >= MIN_READINESS);
                prop_assert!(result.score <= MAX_READINESS);
                prop_assert!(!result.recommendations.is_empty());
                prop_assert_eq!(result.status, ReadinessStatus::from_score(result.score));
            }
        }
    }
}
