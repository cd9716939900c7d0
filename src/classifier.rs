//! Hard/easy labelling of completed runs
//!
//! Checks run in a fixed order and the first match wins: name keywords,
//! platform intensity, sustained high heart rate, then pacing variability.

use crate::models::ActivityRecord;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

/// Name fragments that mark a structured hard session (matched on the lowercased name)
pub const HARD_KEYWORDS: [&str; 10] = [
    "interval",
    "fractionn",
    "tempo",
    "threshold",
    "seuil",
    "speed",
    "vma",
    "vo2",
    "fartlek",
    "hard",
];

const INTENSITY_PERCENT_THRESHOLD: Decimal = dec!(85);
const HR_FRACTION_THRESHOLD: Decimal = dec!(0.88);
const SUSTAINED_MINUTES: Decimal = dec!(20);
const VARIABILITY_THRESHOLD: Decimal = dec!(1.08);

/// Why an activity was labelled hard
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HardReason {
    Keyword(String),
    Intensity,
    SustainedHeartRate,
    Variability,
}

/// Classification outcome for one activity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Intensity {
    Easy,
    Hard(HardReason),
}

impl Intensity {
    pub fn is_hard(&self) -> bool {
        matches!(self, Intensity::Hard(_))
    }
}

pub struct ActivityClassifier;

impl ActivityClassifier {
    /// Classify one run against the athlete's max heart rate
    pub fn classify(activity: &ActivityRecord, max_hr: u16) -> Intensity {
        let name = activity.name.to_lowercase();
        if let Some(keyword) = HARD_KEYWORDS.iter().find(|kw| name.contains(*kw)) {
            return Intensity::Hard(HardReason::Keyword((*keyword).to_string()));
        }

        if activity
            .intensity_percent
            .is_some_and(|i| i > INTENSITY_PERCENT_THRESHOLD)
        {
            return Intensity::Hard(HardReason::Intensity);
        }

        if let Some(avg_hr) = activity.avg_heart_rate.filter(|hr| *hr > 0) {
            if max_hr > 0 {
                let fraction = Decimal::from(avg_hr) / Decimal::from(max_hr);
                if fraction > HR_FRACTION_THRESHOLD && activity.moving_minutes() > SUSTAINED_MINUTES {
                    return Intensity::Hard(HardReason::SustainedHeartRate);
                }
            }
        }

        if activity
            .variability_index
            .is_some_and(|vi| vi > VARIABILITY_THRESHOLD)
        {
            return Intensity::Hard(HardReason::Variability);
        }

        Intensity::Easy
    }

    pub fn is_hard(activity: &ActivityRecord, max_hr: u16) -> bool {
        Self::classify(activity, max_hr).is_hard()
    }
}
