//! Turns a workout type and target load into a concrete next-day session
//!
//! Duration comes from inverting the load formula
//! `load = hours × IF² × 100`, distance from the athlete's easy pace adjusted
//! per workout type. The session text is the configured template with its
//! placeholders filled in, followed by a rationale block.

use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;
use tracing::{debug, warn};

use crate::config::CoachConfig;
use crate::models::{DecisionTrail, WorkoutPlan, WorkoutType};
use crate::zones::HeartRateZones;

/// Sessions never go below this many minutes
pub const MIN_DURATION_MINUTES: u32 = 20;

/// Warm-up plus cool-down allowance excluded from the main set
const WARMUP_COOLDOWN_MINUTES: u32 = 20;

/// Main set never goes below this many minutes
const MIN_MAIN_MINUTES: u32 = 10;

/// Upper bound on session length for each workout type
pub fn max_duration_minutes(workout_type: WorkoutType) -> u32 {
    match workout_type {
        WorkoutType::Rest => 0,
        WorkoutType::Recovery => 40,
        WorkoutType::Easy => 75,
        WorkoutType::LongRun => 120,
        WorkoutType::Vo2maxIntervals | WorkoutType::ThresholdIntervals => 60,
    }
}

/// Pace multiplier relative to easy pace (>1 is slower)
pub fn pace_adjustment(workout_type: WorkoutType) -> Decimal {
    match workout_type {
        WorkoutType::Recovery => dec!(1.15),
        WorkoutType::Easy | WorkoutType::Rest => dec!(1.0),
        WorkoutType::LongRun => dec!(1.05),
        WorkoutType::Vo2maxIntervals => dec!(0.92),
        WorkoutType::ThresholdIntervals => dec!(0.95),
    }
}

/// Repetition layout of an interval main set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntervalStructure {
    pub reps: u32,
    pub work_minutes: u32,
    pub rest_minutes: u32,
}

/// Everything needed to render one plan
#[derive(Debug, Clone)]
pub struct PlanRequest<'a> {
    /// Day the session is for
    pub date: NaiveDate,
    pub workout_type: WorkoutType,
    pub target_load: u32,

    /// Average easy pace in min/km
    pub easy_pace: Decimal,

    pub ctl: Decimal,
    pub atl: Decimal,
    pub zones: Option<&'a HeartRateZones>,
    pub trail: DecisionTrail,
}

/// Builds `WorkoutPlan`s from the engine configuration
pub struct WorkoutPlanBuilder<'a> {
    config: &'a CoachConfig,
}

impl<'a> WorkoutPlanBuilder<'a> {
    pub fn new(config: &'a CoachConfig) -> Self {
        WorkoutPlanBuilder { config }
    }

    /// Session length for a target load, bounded to [20, per-type ceiling]
    pub fn duration_minutes(&self, workout_type: WorkoutType, target_load: u32) -> u32 {
        let ceiling = max_duration_minutes(workout_type);
        let factor = self.config.intensity_factors.for_type(workout_type);

        let minutes = (dec!(60) * Decimal::from(target_load))
            .checked_div(factor * factor * dec!(100))
            .map(|m| m.round())
            .and_then(|m| m.to_u32());

        let minutes = match minutes {
            Some(m) => m,
            None => {
                warn!(
                    "Unusable intensity factor {} for {}, using the {} min ceiling",
                    factor, workout_type, ceiling
                );
                ceiling
            }
        };

        minutes.max(MIN_DURATION_MINUTES).min(ceiling)
    }

    /// Estimated distance in km, rounded to 0.1
    pub fn estimate_distance(
        &self,
        duration_minutes: u32,
        workout_type: WorkoutType,
        easy_pace: Decimal,
    ) -> Decimal {
        let pace = easy_pace * pace_adjustment(workout_type);
        Decimal::from(duration_minutes)
            .checked_div(pace)
            .unwrap_or(Decimal::ZERO)
            .round_dp(1)
    }

    /// Duration left once warm-up and cool-down are removed
    pub fn main_duration(duration_minutes: u32) -> u32 {
        duration_minutes
            .saturating_sub(WARMUP_COOLDOWN_MINUTES)
            .max(MIN_MAIN_MINUTES)
    }

    /// Rep layout for interval types, `None` for steady runs
    pub fn interval_structure(
        workout_type: WorkoutType,
        main_minutes: u32,
    ) -> Option<IntervalStructure> {
        match workout_type {
            WorkoutType::Vo2maxIntervals => Some(IntervalStructure {
                reps: (main_minutes / 3).clamp(4, 12),
                work_minutes: 1,
                rest_minutes: 1,
            }),
            WorkoutType::ThresholdIntervals => Some(IntervalStructure {
                reps: (main_minutes / 6).clamp(3, 6),
                work_minutes: 4,
                rest_minutes: 2,
            }),
            _ => None,
        }
    }

    /// "45m" under an hour, otherwise "1h05" or "1h"
    pub fn format_duration(minutes: u32) -> String {
        if minutes < 60 {
            return format!("{}m", minutes);
        }
        let (hours, mins) = (minutes / 60, minutes % 60);
        if mins > 0 {
            format!("{}h{:02}", hours, mins)
        } else {
            format!("{}h", hours)
        }
    }

    /// Template structure with every placeholder substituted
    pub fn fill_template(&self, workout_type: WorkoutType, duration_minutes: u32) -> String {
        let template = self.config.templates.for_type(workout_type);
        let main = Self::main_duration(duration_minutes);

        // Main-set minutes, not the whole session, pick the "m" or "h" form
        let mut structure = template
            .structure
            .replace("{{ DURATION }}", &Self::format_duration(main));

        if let Some(intervals) = Self::interval_structure(workout_type, main) {
            structure = structure
                .replace("{{ REPS }}", &intervals.reps.to_string())
                .replace("{{ WORK }}", &format!("{}m", intervals.work_minutes))
                .replace("{{ REST }}", &format!("{}m", intervals.rest_minutes));
        }

        structure
    }

    fn rationale(&self, request: &PlanRequest<'_>, duration: u32, distance: Decimal) -> String {
        let mut text = String::from("\n\n---\nDecisions:\n");
        for line in request.trail.lines() {
            let _ = writeln!(text, "• {}", line);
        }

        let _ = write!(
            text,
            "\nCurrent state:\n• CTL (fitness): {:.1}\n• ATL (fatigue): {:.1}\n• TSB (form): {:.1}\n",
            request.ctl,
            request.atl,
            request.ctl - request.atl
        );
        let _ = write!(
            text,
            "\nTargets:\n• Target load: {}\n• Duration: {} min\n• Estimated distance: {} km\n",
            request.target_load, duration, distance
        );

        if let Some(zones) = request.zones.filter(|_| self.config.plan.include_hr_zones) {
            text.push_str("\nHR zones:\n");
            for zone in &zones.zones {
                let _ = writeln!(
                    text,
                    "  Z{} {}: {}-{} bpm",
                    zone.zone, zone.name, zone.min_bpm, zone.max_bpm
                );
            }
        }
        text.push_str("---");
        text
    }

    /// Full plan for the request; a rest type yields a rest plan
    pub fn build(&self, request: PlanRequest<'_>) -> WorkoutPlan {
        if request.workout_type == WorkoutType::Rest {
            return WorkoutPlan::rest(request.date, request.trail);
        }

        let duration = self.duration_minutes(request.workout_type, request.target_load);
        let distance = self.estimate_distance(duration, request.workout_type, request.easy_pace);
        let template = self.config.templates.for_type(request.workout_type);

        let title = format!("{} TSS - {}", request.target_load, template.name);
        let mut description = self.fill_template(request.workout_type, duration);
        description.push_str(&self.rationale(&request, duration, distance));

        debug!("Built plan '{}': {} min, {} km", title, duration, distance);

        WorkoutPlan {
            date: request.date,
            category: request.workout_type.category(),
            workout_type: request.workout_type,
            target_load: request.target_load,
            duration_minutes: duration,
            distance_km: distance,
            title,
            description,
            trail: request.trail,
        }
    }
}

/// Calendar event payload handed to the publishing collaborator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlannedEvent {
    pub category: String,
    #[serde(rename = "type")]
    pub event_type: String,
    pub name: String,
    pub start_date_local: NaiveDateTime,
    pub description: String,
    pub load: u32,
}

impl PlannedEvent {
    /// Event for a plan starting at `start_hour` local time; rest plans publish nothing
    pub fn from_plan(plan: &WorkoutPlan, start_hour: u32) -> Option<Self> {
        if plan.is_rest() {
            return None;
        }
        Some(PlannedEvent {
            category: "WORKOUT".to_string(),
            event_type: "Run".to_string(),
            name: plan.title.clone(),
            start_date_local: plan.date.and_hms_opt(start_hour, 0, 0)?,
            description: plan.description.clone(),
            load: plan.target_load,
        })
    }
}

/// Event already on the athlete's calendar
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExistingEvent {
    pub date: NaiveDate,
    pub category: String,
    #[serde(rename = "type", default)]
    pub event_type: String,
    #[serde(default)]
    pub name: Option<String>,
}

/// True when a run workout is already planned on `date`
pub fn already_planned(existing: &[ExistingEvent], date: NaiveDate) -> bool {
    existing.iter().any(|event| {
        event.date == date && event.category == "WORKOUT" && event.event_type.contains("Run")
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::zones::ZoneCalculator;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 7, 1).unwrap()
    }

    fn request<'a>(workout_type: WorkoutType, target_load: u32) -> PlanRequest<'a> {
        let mut trail = DecisionTrail::new();
        trail.push("run_rest", "TSB > 5: fresh enough to run");
        PlanRequest {
            date: date(),
            workout_type,
            target_load,
            easy_pace: dec!(6.2),
            ctl: dec!(50),
            atl: dec!(44),
            zones: None,
            trail,
        }
    }

    #[test]
    fn test_easy_duration_and_distance() {
        let config = CoachConfig::default();
        let builder = WorkoutPlanBuilder::new(&config);

        // round(60 × 45 / (0.72² × 100)) = round(52.08)
        let duration = builder.duration_minutes(WorkoutType::Easy, 45);
        assert_eq!(duration, 52);

        // 52 / 6.2 = 8.39
        let distance = builder.estimate_distance(duration, WorkoutType::Easy, dec!(6.2));
        assert_eq!(distance, dec!(8.4));
    }

    #[test]
    fn test_duration_bounds() {
        let config = CoachConfig::default();
        let builder = WorkoutPlanBuilder::new(&config);

        assert_eq!(builder.duration_minutes(WorkoutType::Recovery, 10), 20);
        assert_eq!(builder.duration_minutes(WorkoutType::Recovery, 60), 40);
        assert_eq!(builder.duration_minutes(WorkoutType::Easy, 120), 75);
        assert_eq!(builder.duration_minutes(WorkoutType::LongRun, 200), 120);
        assert_eq!(builder.duration_minutes(WorkoutType::ThresholdIntervals, 120), 60);
    }

    #[test]
    fn test_zero_intensity_factor_uses_ceiling() {
        let mut config = CoachConfig::default();
        config.intensity_factors.easy = Decimal::ZERO;
        let builder = WorkoutPlanBuilder::new(&config);

        assert_eq!(builder.duration_minutes(WorkoutType::Easy, 45), 75);
    }

    #[test]
    fn test_pace_adjusted_distance() {
        let config = CoachConfig::default();
        let builder = WorkoutPlanBuilder::new(&config);

        // 98 / (6.0 × 1.05) = 15.56
        assert_eq!(
            builder.estimate_distance(98, WorkoutType::LongRun, dec!(6.0)),
            dec!(15.6)
        );
        // 46 / (6.0 × 1.15) = 6.67
        assert_eq!(
            builder.estimate_distance(46, WorkoutType::Recovery, dec!(6.0)),
            dec!(6.7)
        );
    }

    #[test]
    fn test_interval_structures() {
        assert_eq!(WorkoutPlanBuilder::main_duration(25), 10);
        assert_eq!(WorkoutPlanBuilder::main_duration(46), 26);

        let vo2 = WorkoutPlanBuilder::interval_structure(WorkoutType::Vo2maxIntervals, 17).unwrap();
        assert_eq!(vo2.reps, 5);
        assert_eq!((vo2.work_minutes, vo2.rest_minutes), (1, 1));

        let vo2_max = WorkoutPlanBuilder::interval_structure(WorkoutType::Vo2maxIntervals, 40).unwrap();
        assert_eq!(vo2_max.reps, 12);

        let threshold =
            WorkoutPlanBuilder::interval_structure(WorkoutType::ThresholdIntervals, 10).unwrap();
        assert_eq!(threshold.reps, 3);
        assert_eq!((threshold.work_minutes, threshold.rest_minutes), (4, 2));

        assert!(WorkoutPlanBuilder::interval_structure(WorkoutType::Easy, 40).is_none());
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(WorkoutPlanBuilder::format_duration(32), "32m");
        assert_eq!(WorkoutPlanBuilder::format_duration(78), "1h18");
        assert_eq!(WorkoutPlanBuilder::format_duration(65), "1h05");
        assert_eq!(WorkoutPlanBuilder::format_duration(60), "1h");
    }

    #[test]
    fn test_fill_templates() {
        let config = CoachConfig::default();
        let builder = WorkoutPlanBuilder::new(&config);

        let easy = builder.fill_template(WorkoutType::Easy, 52);
        assert!(easy.contains("- 32m Zone 2"));
        assert!(!easy.contains("{{"));

        let threshold = builder.fill_template(WorkoutType::ThresholdIntervals, 46);
        assert!(threshold.contains("4x(4m Zone 4, 2m Zone 1)"));
        assert!(!threshold.contains("{{"));

        let long = builder.fill_template(WorkoutType::LongRun, 98);
        assert!(long.contains("- 1h18 Zone 2"));

        // 75 min session, 55 min main set
        let full_easy = builder.fill_template(WorkoutType::Easy, 75);
        assert!(full_easy.contains("- 55m Zone 2"));
    }

    #[test]
    fn test_build_plan() {
        let config = CoachConfig::default();
        let builder = WorkoutPlanBuilder::new(&config);
        let zones = ZoneCalculator::heart_rate_zones(165, 190);

        let mut req = request(WorkoutType::Easy, 45);
        req.zones = Some(&zones);
        let plan = builder.build(req);

        assert_eq!(plan.title, "45 TSS - Easy Endurance");
        assert_eq!(plan.duration_minutes, 52);
        assert_eq!(plan.distance_km, dec!(8.4));
        assert_eq!(plan.category, crate::models::PlanCategory::Easy);
        assert!(plan.description.contains("• [run_rest] TSB > 5: fresh enough to run"));
        assert!(plan.description.contains("TSB (form): 6.0"));
        assert!(plan.description.contains("Estimated distance: 8.4 km"));
        assert!(plan.description.contains("Z1 Recovery: 0-133 bpm"));
    }

    #[test]
    fn test_zones_omitted_when_disabled() {
        let mut config = CoachConfig::default();
        config.plan.include_hr_zones = false;
        let builder = WorkoutPlanBuilder::new(&config);
        let zones = ZoneCalculator::heart_rate_zones(165, 190);

        let mut req = request(WorkoutType::Recovery, 30);
        req.zones = Some(&zones);
        let plan = builder.build(req);
        assert!(!plan.description.contains("HR zones"));
    }

    #[test]
    fn test_rest_request_builds_rest_plan() {
        let config = CoachConfig::default();
        let plan = WorkoutPlanBuilder::new(&config).build(request(WorkoutType::Rest, 0));

        assert!(plan.is_rest());
        assert_eq!(plan.target_load, 0);
        assert_eq!(plan.duration_minutes, 0);
        assert_eq!(plan.trail.len(), 1);
    }

    #[test]
    fn test_planned_event_payload() {
        let config = CoachConfig::default();
        let plan = WorkoutPlanBuilder::new(&config).build(request(WorkoutType::Easy, 45));

        let event = PlannedEvent::from_plan(&plan, 7).unwrap();
        assert_eq!(event.category, "WORKOUT");
        assert_eq!(event.event_type, "Run");
        assert_eq!(event.load, 45);

        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "Run");
        assert_eq!(json["start_date_local"], "2024-07-01T07:00:00");

        let rest = WorkoutPlan::rest(date(), DecisionTrail::new());
        assert!(PlannedEvent::from_plan(&rest, 7).is_none());
    }

    #[test]
    fn test_already_planned() {
        let events = vec![
            ExistingEvent {
                date: date(),
                category: "NOTE".to_string(),
                event_type: String::new(),
                name: Some("Physio".to_string()),
            },
            ExistingEvent {
                date: date().succ_opt().unwrap(),
                category: "WORKOUT".to_string(),
                event_type: "Run".to_string(),
                name: None,
            },
        ];

        assert!(!already_planned(&events, date()));
        assert!(already_planned(&events, date().succ_opt().unwrap()));
    }
}
