use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Sport types reported by the training platform
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Sport {
    #[default]
    Running,
    Cycling,
    Swimming,
    Other,
}

/// One completed activity as delivered by the training platform
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityRecord {
    /// Local start date of the activity
    pub date: NaiveDate,

    /// Sport type; only runs feed the decision core
    #[serde(default)]
    pub sport: Sport,

    /// Free-text name given by the athlete or device
    #[serde(default)]
    pub name: String,

    /// Elapsed time in seconds (including pauses)
    #[serde(default)]
    pub elapsed_seconds: u32,

    /// Moving time in seconds
    #[serde(default)]
    pub moving_seconds: u32,

    /// Distance in meters
    #[serde(default)]
    pub distance_meters: Decimal,

    /// Average heart rate in bpm
    pub avg_heart_rate: Option<u16>,

    /// Maximum heart rate in bpm
    pub max_heart_rate: Option<u16>,

    /// Platform-computed load score (TSS-like)
    pub load: Option<Decimal>,

    /// Intensity as a percentage of threshold (platform IF × 100)
    pub intensity_percent: Option<Decimal>,

    /// Variability index (NP / average power or pace equivalent)
    pub variability_index: Option<Decimal>,
}

impl ActivityRecord {
    pub fn is_run(&self) -> bool {
        self.sport == Sport::Running
    }

    pub fn moving_minutes(&self) -> Decimal {
        Decimal::from(self.moving_seconds) / dec!(60)
    }

    pub fn distance_km(&self) -> Decimal {
        self.distance_meters / dec!(1000)
    }
}

/// One day of wellness data, most recent last in any series
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WellnessSample {
    pub date: NaiveDate,

    /// Chronic Training Load (fitness)
    pub ctl: Decimal,

    /// Acute Training Load (fatigue)
    pub atl: Decimal,

    /// Resting heart rate in bpm
    pub resting_hr: Option<u16>,

    /// Heart rate variability (platform units, informational only)
    pub hrv: Option<Decimal>,

    /// Sleep duration in hours
    pub sleep_hours: Option<Decimal>,

    /// Weekly CTL progression reported by the platform
    pub ramp_rate: Option<Decimal>,
}

impl WellnessSample {
    /// Sample with only the load figures present
    pub fn new(date: NaiveDate, ctl: Decimal, atl: Decimal) -> Self {
        WellnessSample {
            date,
            ctl,
            atl,
            resting_hr: None,
            hrv: None,
            sleep_hours: None,
            ramp_rate: None,
        }
    }

    /// Set sleep from the platform's tracked sleep seconds
    pub fn with_sleep_seconds(mut self, seconds: u32) -> Self {
        self.sleep_hours = Some(Decimal::from(seconds) / dec!(3600));
        self
    }

    /// Training Stress Balance (CTL - ATL)
    pub fn tsb(&self) -> Decimal {
        self.ctl - self.atl
    }
}

/// Per-sport threshold settings from the platform, preferred over the global profile
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunSettings {
    pub lthr: Option<u16>,
    pub max_hr: Option<u16>,
}

/// Athlete thresholds used as zone-math sources
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AthleteProfile {
    /// Maximum heart rate
    pub max_hr: Option<u16>,

    /// Lactate Threshold Heart Rate
    pub lthr: Option<u16>,

    /// Running-specific settings
    #[serde(default)]
    pub run_settings: Option<RunSettings>,
}

/// Forecast sample nearest to the planned session time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherForecast {
    /// Air temperature in °C
    pub temperature: Decimal,

    /// Apparent temperature in °C
    pub feels_like: Option<Decimal>,

    /// Relative humidity in percent
    pub humidity: Decimal,

    pub description: Option<String>,
}

/// Coarse session category carried by a plan
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlanCategory {
    Rest,
    Easy,
    Hard,
}

impl fmt::Display for PlanCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlanCategory::Rest => write!(f, "rest"),
            PlanCategory::Easy => write!(f, "easy"),
            PlanCategory::Hard => write!(f, "hard"),
        }
    }
}

/// Specific workout type prescribed for the next day
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkoutType {
    Rest,
    Recovery,
    Easy,
    LongRun,
    /// Short intervals (1 min on / 1 min off)
    Vo2maxIntervals,
    /// Long intervals (4 min on / 2 min off)
    ThresholdIntervals,
}

impl WorkoutType {
    pub fn category(&self) -> PlanCategory {
        match self {
            WorkoutType::Rest => PlanCategory::Rest,
            WorkoutType::Recovery | WorkoutType::Easy | WorkoutType::LongRun => PlanCategory::Easy,
            WorkoutType::Vo2maxIntervals | WorkoutType::ThresholdIntervals => PlanCategory::Hard,
        }
    }

    pub fn is_interval(&self) -> bool {
        matches!(
            self,
            WorkoutType::Vo2maxIntervals | WorkoutType::ThresholdIntervals
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            WorkoutType::Rest => "rest",
            WorkoutType::Recovery => "recovery",
            WorkoutType::Easy => "easy",
            WorkoutType::LongRun => "long_run",
            WorkoutType::Vo2maxIntervals => "vo2max_intervals",
            WorkoutType::ThresholdIntervals => "threshold_intervals",
        }
    }
}

impl fmt::Display for WorkoutType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One step of the decision trail
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraceEntry {
    /// Pipeline stage that produced the entry (readiness, run_rest, heat, load, category, ...)
    pub stage: String,
    pub message: String,
}

impl fmt::Display for TraceEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.stage, self.message)
    }
}

/// Ordered record of every evaluation that led to a decision
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecisionTrail {
    pub entries: Vec<TraceEntry>,
}

impl DecisionTrail {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, stage: &str, message: impl Into<String>) {
        self.entries.push(TraceEntry {
            stage: stage.to_string(),
            message: message.into(),
        });
    }

    pub fn extend_from(&mut self, stage: &str, messages: &[String]) {
        for message in messages {
            self.push(stage, message.clone());
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries rendered as "[stage] message" lines
    pub fn lines(&self) -> Vec<String> {
        self.entries.iter().map(|e| e.to_string()).collect()
    }

    pub fn stage(&self, stage: &str) -> impl Iterator<Item = &TraceEntry> {
        let stage = stage.to_string();
        self.entries.iter().filter(move |e| e.stage == stage)
    }
}

/// Concrete session prescribed for the target date
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkoutPlan {
    /// Day the session is planned for
    pub date: NaiveDate,

    pub category: PlanCategory,

    pub workout_type: WorkoutType,

    /// Target load score (0 for rest days)
    pub target_load: u32,

    pub duration_minutes: u32,

    pub distance_km: Decimal,

    /// Short display name, e.g. "45 TSS - Easy Endurance"
    pub title: String,

    /// Filled session structure followed by the rationale block
    pub description: String,

    pub trail: DecisionTrail,
}

impl WorkoutPlan {
    /// Plan for a day without a session
    pub fn rest(date: NaiveDate, trail: DecisionTrail) -> Self {
        WorkoutPlan {
            date,
            category: PlanCategory::Rest,
            workout_type: WorkoutType::Rest,
            target_load: 0,
            duration_minutes: 0,
            distance_km: Decimal::ZERO,
            title: "Rest day".to_string(),
            description: String::new(),
            trail,
        }
    }

    pub fn is_rest(&self) -> bool {
        self.category == PlanCategory::Rest
    }
}
