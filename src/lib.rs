// Library interface for the stridewise decision engine
// The binary and integration tests both go through these re-exports

pub mod classifier;
pub mod config;
pub mod decision;
pub mod distribution;
pub mod error;
pub mod heat;
pub mod logging;
pub mod models;
pub mod pmc;
pub mod readiness;
pub mod training_plan;
pub mod zones;

// Re-export commonly used types for convenience
pub use models::*;
pub use classifier::{ActivityClassifier, HardReason, Intensity};
pub use config::{CoachConfig, ConfigOverrides};
pub use decision::{Decision, DecisionEngine, DecisionRequest, RunVerdict, SessionCategory};
pub use distribution::{DistributionAnalyzer, TrainingDistribution, WeeklyStats};
pub use error::{CoachError, Result};
pub use heat::{HeatAdjuster, HeatAssessment};
pub use logging::{LogConfig, LogFormat, LogLevel};
pub use pmc::{acwr, BindingBound, LoadTarget, TrainingLoadSolver};
pub use readiness::{ReadinessResult, ReadinessScorer, ReadinessStatus};
pub use training_plan::{already_planned, ExistingEvent, PlannedEvent, WorkoutPlanBuilder};
pub use zones::{HeartRateZones, ZoneCalculator};
