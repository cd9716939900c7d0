use chrono::NaiveDate;
use rust_decimal_macros::dec;
use std::io::Write;
use stridewise::{
    CoachConfig, CoachError, DecisionEngine, DecisionRequest, RunVerdict, WellnessSample,
    WorkoutType,
};
use tempfile::NamedTempFile;

/// Configuration files flowing through to engine decisions

#[cfg(test)]
mod config_integration_tests {
    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 9, 15).unwrap()
    }

    /// Fresh athlete (TSB +10) with no run history
    fn fresh_request() -> DecisionRequest {
        DecisionRequest {
            today: today(),
            profile: Default::default(),
            wellness: vec![WellnessSample::new(today(), dec!(50), dec!(40))],
            activities: vec![],
            forecast: None,
        }
    }

    fn write_config(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{}", content).unwrap();
        file
    }

    #[test]
    fn test_default_engine_caps_at_atl_plus_25() {
        let decision = DecisionEngine::default().decide(&fresh_request()).unwrap();

        assert_eq!(decision.verdict, RunVerdict::Run);
        assert_eq!(decision.plan.target_load, 65);
    }

    #[test]
    fn test_safety_floor_override_changes_the_cap() {
        let file = write_config("[load_model]\nsafety_floor = -15\n");
        let config = CoachConfig::from_overrides_file(file.path()).unwrap();
        let decision = DecisionEngine::new(config).decide(&fresh_request()).unwrap();

        // cap = 40 + 15
        assert_eq!(decision.load.as_ref().unwrap().cap, dec!(55));
        assert_eq!(decision.plan.target_load, 55);
        assert_eq!(decision.plan.workout_type, WorkoutType::ThresholdIntervals);
    }

    #[test]
    fn test_template_and_plan_overrides_reach_the_plan() {
        let file = write_config(
            r#"
[templates.threshold_intervals]
name = "Seuil"
structure = "- 15m Z2\n- {{ REPS }}x{{ WORK }}/{{ REST }}\n- 10m Z1"

[plan]
include_hr_zones = false
"#,
        );
        let config = CoachConfig::from_overrides_file(file.path()).unwrap();
        let decision = DecisionEngine::new(config).decide(&fresh_request()).unwrap();

        assert_eq!(decision.plan.title, "65 TSS - Seuil");
        assert!(decision.plan.description.starts_with("- 15m Z2\n- "));
        assert!(decision.plan.description.contains("x4m/2m"));
        assert!(!decision.plan.description.contains("HR zones"));
    }

    #[test]
    fn test_misspelled_key_fails_loudly() {
        let file = write_config("[load_model]\nsafety_flor = -15\n");
        let err = CoachConfig::from_overrides_file(file.path()).unwrap_err();

        assert!(matches!(err, CoachError::ConfigParse(_)));
        assert!(err.to_string().contains("safety_flor"));
    }

    #[test]
    fn test_invalid_values_are_rejected_after_merge() {
        let file = write_config("[polarization]\neasy_target_percent = 70\n");
        let err = CoachConfig::from_overrides_file(file.path()).unwrap_err();

        assert!(matches!(err, CoachError::Configuration(_)));
    }

    #[test]
    fn test_shown_config_round_trips_as_overrides() {
        let shown = toml::to_string_pretty(&CoachConfig::default()).unwrap();
        let file = write_config(&shown);

        let reloaded = CoachConfig::from_overrides_file(file.path()).unwrap();
        assert_eq!(reloaded, CoachConfig::default());
    }
}
