//! Engine configuration
//!
//! `CoachConfig::default()` carries every built-in constant. Callers tweak it
//! through a `ConfigOverrides` value (usually parsed from TOML) that is applied
//! field by field; unknown keys are rejected at parse time.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{CoachError, Result};
use crate::models::WorkoutType;

/// Complete engine configuration
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CoachConfig {
    /// Polarized distribution targets
    pub polarization: PolarizationConfig,

    /// Load model constants (CTL/ATL time constants, target TSB, safety floor)
    pub load_model: LoadModelConfig,

    /// Intensity factor per workout type
    pub intensity_factors: IntensityFactors,

    /// Text templates per workout type
    pub templates: WorkoutTemplates,

    /// Plan rendering settings
    pub plan: PlanSettings,
}

/// Polarized 80/20 targets
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolarizationConfig {
    pub easy_target_percent: u8,
    pub hard_target_percent: u8,

    /// Minimum days between hard sessions
    pub min_days_between_hard: u32,

    /// Days covered by the easy/hard distribution
    pub analysis_window_days: u32,
}

impl Default for PolarizationConfig {
    fn default() -> Self {
        PolarizationConfig {
            easy_target_percent: 80,
            hard_target_percent: 20,
            min_days_between_hard: 2,
            analysis_window_days: 21,
        }
    }
}

/// Fitness/fatigue model constants
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoadModelConfig {
    /// CTL time constant in days
    pub ctl_days: u16,

    /// ATL time constant in days
    pub atl_days: u16,

    /// TSB the next session should produce
    pub target_tsb: Decimal,

    /// Lowest TSB a single session may push toward; the load cap is ATL - floor
    pub safety_floor: Decimal,

    /// TSB below which only recovery sessions are prescribed
    pub recovery_threshold: Decimal,

    /// Minimum prescribed load
    pub min_load: Decimal,

    /// Load used when the time constants make the model degenerate
    pub fallback_load: Decimal,
}

impl Default for LoadModelConfig {
    fn default() -> Self {
        LoadModelConfig {
            ctl_days: 42,
            atl_days: 7,
            target_tsb: dec!(-15),
            safety_floor: dec!(-25),
            recovery_threshold: dec!(-25),
            min_load: dec!(20),
            fallback_load: dec!(50),
        }
    }
}

/// Intensity factor (IF) assumed for each workout type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntensityFactors {
    pub recovery: Decimal,
    pub easy: Decimal,
    pub long_run: Decimal,
    pub vo2max_intervals: Decimal,
    pub threshold_intervals: Decimal,
}

impl Default for IntensityFactors {
    fn default() -> Self {
        IntensityFactors {
            recovery: dec!(0.65),
            easy: dec!(0.72),
            long_run: dec!(0.70),
            vo2max_intervals: dec!(0.85),
            threshold_intervals: dec!(0.88),
        }
    }
}

impl IntensityFactors {
    pub fn for_type(&self, workout_type: WorkoutType) -> Decimal {
        match workout_type {
            WorkoutType::Recovery => self.recovery,
            WorkoutType::Easy | WorkoutType::Rest => self.easy,
            WorkoutType::LongRun => self.long_run,
            WorkoutType::Vo2maxIntervals => self.vo2max_intervals,
            WorkoutType::ThresholdIntervals => self.threshold_intervals,
        }
    }

    fn all(&self) -> [(&'static str, Decimal); 5] {
        [
            ("recovery", self.recovery),
            ("easy", self.easy),
            ("long_run", self.long_run),
            ("vo2max_intervals", self.vo2max_intervals),
            ("threshold_intervals", self.threshold_intervals),
        ]
    }
}

/// Display name and structure text for one workout type
///
/// Structure placeholders: `{{ DURATION }}`, `{{ REPS }}`, `{{ WORK }}`, `{{ REST }}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkoutTemplate {
    pub name: String,
    pub structure: String,
}

impl WorkoutTemplate {
    fn new(name: &str, structure: &str) -> Self {
        WorkoutTemplate {
            name: name.to_string(),
            structure: structure.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkoutTemplates {
    pub recovery: WorkoutTemplate,
    pub easy: WorkoutTemplate,
    pub long_run: WorkoutTemplate,
    pub vo2max_intervals: WorkoutTemplate,
    pub threshold_intervals: WorkoutTemplate,
}

impl Default for WorkoutTemplates {
    fn default() -> Self {
        WorkoutTemplates {
            recovery: WorkoutTemplate::new(
                "Recovery",
                "- {{ DURATION }} Zone 1-2\n\nVery easy running, relaxed breathing.\nGoal: active recovery.",
            ),
            easy: WorkoutTemplate::new(
                "Easy Endurance",
                "- 5m Zone 1\n- {{ DURATION }} Zone 2\n- 5m Zone 1\n\nConversational pace.\nYou should be able to hold a conversation.",
            ),
            long_run: WorkoutTemplate::new(
                "Long Run",
                "- 10m Zone 1\n- {{ DURATION }} Zone 2\n- 10m Zone 1\n\nLong aerobic run.\nHydrate regularly.",
            ),
            vo2max_intervals: WorkoutTemplate::new(
                "VO2max Intervals",
                "- 15m Zone 2\n- {{ REPS }}x({{ WORK }} Zone 5, {{ REST }} Zone 1)\n- 10m Zone 1\n\nHigh-intensity intervals.\nFull recovery between repetitions.",
            ),
            threshold_intervals: WorkoutTemplate::new(
                "Threshold Intervals",
                "- 15m Zone 2\n- {{ REPS }}x({{ WORK }} Zone 4, {{ REST }} Zone 1)\n- 10m Zone 1\n\nIntervals at lactate threshold.\nKeep an even pace.",
            ),
        }
    }
}

impl WorkoutTemplates {
    /// Template for a workout type; rest days borrow the easy template
    pub fn for_type(&self, workout_type: WorkoutType) -> &WorkoutTemplate {
        match workout_type {
            WorkoutType::Recovery => &self.recovery,
            WorkoutType::Easy | WorkoutType::Rest => &self.easy,
            WorkoutType::LongRun => &self.long_run,
            WorkoutType::Vo2maxIntervals => &self.vo2max_intervals,
            WorkoutType::ThresholdIntervals => &self.threshold_intervals,
        }
    }
}

/// Plan rendering and publishing settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanSettings {
    /// Local hour the planned session starts
    pub session_start_hour: u32,

    /// Append the heart-rate zone table to plan descriptions
    pub include_hr_zones: bool,
}

impl Default for PlanSettings {
    fn default() -> Self {
        PlanSettings {
            session_start_hour: 7,
            include_hr_zones: true,
        }
    }
}

/// Partial configuration; every present field replaces its default
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigOverrides {
    pub polarization: Option<PolarizationOverrides>,
    pub load_model: Option<LoadModelOverrides>,
    pub intensity_factors: Option<IntensityFactorOverrides>,
    pub templates: Option<TemplateOverrides>,
    pub plan: Option<PlanOverrides>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PolarizationOverrides {
    pub easy_target_percent: Option<u8>,
    pub hard_target_percent: Option<u8>,
    pub min_days_between_hard: Option<u32>,
    pub analysis_window_days: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoadModelOverrides {
    pub ctl_days: Option<u16>,
    pub atl_days: Option<u16>,
    pub target_tsb: Option<Decimal>,
    pub safety_floor: Option<Decimal>,
    pub recovery_threshold: Option<Decimal>,
    pub min_load: Option<Decimal>,
    pub fallback_load: Option<Decimal>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct IntensityFactorOverrides {
    pub recovery: Option<Decimal>,
    pub easy: Option<Decimal>,
    pub long_run: Option<Decimal>,
    pub vo2max_intervals: Option<Decimal>,
    pub threshold_intervals: Option<Decimal>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TemplateOverrides {
    pub recovery: Option<WorkoutTemplate>,
    pub easy: Option<WorkoutTemplate>,
    pub long_run: Option<WorkoutTemplate>,
    pub vo2max_intervals: Option<WorkoutTemplate>,
    pub threshold_intervals: Option<WorkoutTemplate>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PlanOverrides {
    pub session_start_hour: Option<u32>,
    pub include_hr_zones: Option<bool>,
}

fn merge<T>(target: &mut T, value: Option<T>) {
    if let Some(v) = value {
        *target = v;
    }
}

impl ConfigOverrides {
    /// Parse overrides from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Apply every present field on top of `base`
    pub fn apply(self, mut base: CoachConfig) -> CoachConfig {
        if let Some(p) = self.polarization {
            let target = &mut base.polarization;
            merge(&mut target.easy_target_percent, p.easy_target_percent);
            merge(&mut target.hard_target_percent, p.hard_target_percent);
            merge(&mut target.min_days_between_hard, p.min_days_between_hard);
            merge(&mut target.analysis_window_days, p.analysis_window_days);
        }

        if let Some(l) = self.load_model {
            let target = &mut base.load_model;
            merge(&mut target.ctl_days, l.ctl_days);
            merge(&mut target.atl_days, l.atl_days);
            merge(&mut target.target_tsb, l.target_tsb);
            merge(&mut target.safety_floor, l.safety_floor);
            merge(&mut target.recovery_threshold, l.recovery_threshold);
            merge(&mut target.min_load, l.min_load);
            merge(&mut target.fallback_load, l.fallback_load);
        }

        if let Some(i) = self.intensity_factors {
            let target = &mut base.intensity_factors;
            merge(&mut target.recovery, i.recovery);
            merge(&mut target.easy, i.easy);
            merge(&mut target.long_run, i.long_run);
            merge(&mut target.vo2max_intervals, i.vo2max_intervals);
            merge(&mut target.threshold_intervals, i.threshold_intervals);
        }

        if let Some(t) = self.templates {
            let target = &mut base.templates;
            merge(&mut target.recovery, t.recovery);
            merge(&mut target.easy, t.easy);
            merge(&mut target.long_run, t.long_run);
            merge(&mut target.vo2max_intervals, t.vo2max_intervals);
            merge(&mut target.threshold_intervals, t.threshold_intervals);
        }

        if let Some(p) = self.plan {
            merge(&mut base.plan.session_start_hour, p.session_start_hour);
            merge(&mut base.plan.include_hr_zones, p.include_hr_zones);
        }

        base
    }
}

impl CoachConfig {
    /// Defaults with `overrides` applied, then validated
    pub fn with_overrides(overrides: ConfigOverrides) -> Result<Self> {
        let config = overrides.apply(CoachConfig::default());
        config.validate()?;
        Ok(config)
    }

    /// Load an overrides file (TOML) and layer it over the defaults
    pub fn from_overrides_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path)?;
        let overrides = ConfigOverrides::from_toml_str(&content)?;
        tracing::debug!(path = %path.as_ref().display(), "Loaded configuration overrides");
        Self::with_overrides(overrides)
    }

    /// Get default configuration file path
    pub fn default_config_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".stridewise")
            .join("config.toml")
    }

    /// Load the default overrides file, falling back to built-in defaults when absent
    pub fn load_or_default() -> Result<Self> {
        let path = Self::default_config_path();
        if path.exists() {
            Self::from_overrides_file(&path)
        } else {
            tracing::info!(path = %path.display(), "Config file not found, using defaults");
            Ok(Self::default())
        }
    }

    /// Check that every value is inside its usable range
    pub fn validate(&self) -> Result<()> {
        let p = &self.polarization;
        if u16::from(p.easy_target_percent) + u16::from(p.hard_target_percent) != 100 {
            return Err(CoachError::Configuration(format!(
                "easy_target_percent + hard_target_percent must equal 100, got {} + {}",
                p.easy_target_percent, p.hard_target_percent
            )));
        }
        if p.analysis_window_days == 0 {
            return Err(CoachError::Configuration(
                "analysis_window_days must be at least 1".to_string(),
            ));
        }

        let l = &self.load_model;
        if l.ctl_days == 0 || l.atl_days == 0 {
            return Err(CoachError::Configuration(format!(
                "time constants must be positive, got ctl_days={} atl_days={}",
                l.ctl_days, l.atl_days
            )));
        }
        if l.min_load < Decimal::ZERO {
            return Err(CoachError::Configuration(format!(
                "min_load must not be negative, got {}",
                l.min_load
            )));
        }

        for (name, value) in self.intensity_factors.all() {
            if value <= Decimal::ZERO || value > dec!(1.5) {
                return Err(CoachError::Configuration(format!(
                    "intensity factor {} must be in (0, 1.5], got {}",
                    name, value
                )));
            }
        }

        if self.plan.session_start_hour > 23 {
            return Err(CoachError::Configuration(format!(
                "session_start_hour must be 0-23, got {}",
                self.plan.session_start_hour
            )));
        }

        Ok(())
    }
}
