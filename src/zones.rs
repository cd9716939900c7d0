use crate::models::{ActivityRecord, AthleteProfile};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

/// Max HR assumed when neither the profile nor the history provides one
pub const DEFAULT_MAX_HR: u16 = 190;

/// LTHR estimate as a fraction of max HR when no threshold is configured
const LTHR_FROM_MAX_HR: Decimal = dec!(0.87);

/// One heart-rate zone with inclusive bpm bounds
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeartRateZone {
    pub zone: u8,
    pub name: String,
    pub min_bpm: u16,
    pub max_bpm: u16,
}

/// Five-zone heart-rate model anchored on LTHR
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeartRateZones {
    pub lthr: u16,
    pub max_hr: u16,
    pub zones: Vec<HeartRateZone>,
}

impl HeartRateZones {
    /// Zone number (1-5) a heart rate falls into
    pub fn zone_for(&self, hr: u16) -> u8 {
        self.zones
            .iter()
            .skip(1)
            .take_while(|z| hr >= z.min_bpm)
            .last()
            .map(|z| z.zone)
            .unwrap_or(1)
    }
}

/// Zone calculation utilities
pub struct ZoneCalculator;

impl ZoneCalculator {
    /// Effective max HR: run settings, then profile, then highest observed, then 190
    pub fn effective_max_hr(profile: &AthleteProfile, activities: &[ActivityRecord]) -> u16 {
        if let Some(hr) = profile.run_settings.as_ref().and_then(|s| s.max_hr) {
            return hr;
        }
        if let Some(hr) = profile.max_hr {
            return hr;
        }

        activities
            .iter()
            .filter(|a| a.is_run())
            .filter_map(|a| a.max_heart_rate)
            .max()
            .filter(|hr| *hr > 0)
            .unwrap_or(DEFAULT_MAX_HR)
    }

    /// Effective LTHR: run settings, then profile, then 87% of max HR
    pub fn effective_lthr(profile: &AthleteProfile, max_hr: u16) -> u16 {
        profile
            .run_settings
            .as_ref()
            .and_then(|s| s.lthr)
            .or(profile.lthr)
            .unwrap_or_else(|| Self::percentage(max_hr, LTHR_FROM_MAX_HR))
    }

    /// Calculate heart rate zones based on LTHR (Friel)
    ///
    /// - Z1: < 81% LTHR (Recovery)
    /// - Z2: 81-90% LTHR (Endurance)
    /// - Z3: 90-96% LTHR (Tempo)
    /// - Z4: 96-102% LTHR (Threshold)
    /// - Z5: 102% LTHR to max HR (VO2max)
    pub fn heart_rate_zones(lthr: u16, max_hr: u16) -> HeartRateZones {
        let z1 = Self::percentage(lthr, dec!(0.81));
        let z2 = Self::percentage(lthr, dec!(0.90));
        let z3 = Self::percentage(lthr, dec!(0.96));
        let z4 = Self::percentage(lthr, dec!(1.02));

        let zone = |zone: u8, name: &str, min_bpm: u16, max_bpm: u16| HeartRateZone {
            zone,
            name: name.to_string(),
            min_bpm,
            max_bpm,
        };

        HeartRateZones {
            lthr,
            max_hr,
            zones: vec![
                zone(1, "Recovery", 0, z1),
                zone(2, "Endurance", z1, z2),
                zone(3, "Tempo", z2, z3),
                zone(4, "Threshold", z3, z4),
                zone(5, "VO2max", z4, max_hr.max(z4)),
            ],
        }
    }

    /// Zones for an athlete, resolving thresholds from profile and history
    pub fn zones_for_athlete(
        profile: &AthleteProfile,
        activities: &[ActivityRecord],
    ) -> HeartRateZones {
        let max_hr = Self::effective_max_hr(profile, activities);
        let lthr = Self::effective_lthr(profile, max_hr);
        Self::heart_rate_zones(lthr, max_hr)
    }

    fn percentage(value: u16, percentage: Decimal) -> u16 {
        (Decimal::from(value) * percentage)
            .floor()
            .to_u16()
            .unwrap_or(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{RunSettings, Sport};
    use chrono::NaiveDate;

    fn activity_with_max_hr(max_hr: u16, sport: Sport) -> ActivityRecord {
        ActivityRecord {
            date: NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
            sport,
            name: "Run".to_string(),
            elapsed_seconds: 3000,
            moving_seconds: 3000,
            distance_meters: dec!(8000),
            avg_heart_rate: Some(140),
            max_heart_rate: Some(max_hr),
            load: Some(dec!(50)),
            intensity_percent: None,
            variability_index: None,
        }
    }

    #[test]
    fn test_lthr_zones() {
        let zones = ZoneCalculator::heart_rate_zones(170, 190);

        assert_eq!(zones.zones.len(), 5);
        assert_eq!(zones.zones[0].max_bpm, 137); // 170 * 0.81 = 137.7
        assert_eq!(zones.zones[1].max_bpm, 153); // 170 * 0.90
        assert_eq!(zones.zones[2].max_bpm, 163); // 170 * 0.96 = 163.2
        assert_eq!(zones.zones[3].max_bpm, 173); // 170 * 1.02 = 173.4
        assert_eq!(zones.zones[4].min_bpm, 173);
        assert_eq!(zones.zones[4].max_bpm, 190);
    }

    #[test]
    fn test_zone_lookup() {
        let zones = ZoneCalculator::heart_rate_zones(170, 190);

        assert_eq!(zones.zone_for(120), 1);
        assert_eq!(zones.zone_for(140), 2);
        assert_eq!(zones.zone_for(160), 3);
        assert_eq!(zones.zone_for(170), 4);
        assert_eq!(zones.zone_for(185), 5);
    }

    #[test]
    fn test_run_settings_take_precedence() {
        let profile = AthleteProfile {
            max_hr: Some(195),
            lthr: Some(172),
            run_settings: Some(RunSettings {
                lthr: Some(168),
                max_hr: Some(188),
            }),
        };

        assert_eq!(ZoneCalculator::effective_max_hr(&profile, &[]), 188);
        assert_eq!(ZoneCalculator::effective_lthr(&profile, 188), 168);
    }

    #[test]
    fn test_max_hr_falls_back_to_history_then_default() {
        let profile = AthleteProfile::default();
        let activities = vec![
            activity_with_max_hr(181, Sport::Running),
            activity_with_max_hr(186, Sport::Running),
            activity_with_max_hr(199, Sport::Cycling),
        ];

        assert_eq!(ZoneCalculator::effective_max_hr(&profile, &activities), 186);
        assert_eq!(ZoneCalculator::effective_max_hr(&profile, &[]), DEFAULT_MAX_HR);
    }

    #[test]
    fn test_lthr_estimated_from_max_hr() {
        let profile = AthleteProfile::default();
        // 190 * 0.87 = 165.3
        assert_eq!(ZoneCalculator::effective_lthr(&profile, 190), 165);

        let zones = ZoneCalculator::zones_for_athlete(&profile, &[]);
        assert_eq!(zones.lthr, 165);
        assert_eq!(zones.max_hr, 190);
    }
}
