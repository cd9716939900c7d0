//! Next-day training decision
//!
//! Two first-match-wins cascades drive the decision: run or rest, then which
//! session category. Both are plain ordered rule tables so each rule can be
//! tested on its own and the order is visible in one place.
//!
//! `DecisionEngine::decide` wires every component together:
//!
//! 1. readiness from the wellness series
//! 2. run/rest cascade
//! 3. heat assessment (a zero factor forces rest)
//! 4. load solving, scaled by readiness and heat
//! 5. category cascade, with hard sessions downgraded in heavy heat
//! 6. workout type and plan

use chrono::{Days, NaiveDate};
use rayon::prelude::*;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, info, warn};

use crate::config::CoachConfig;
use crate::distribution::{days_between, DistributionAnalyzer, TrainingDistribution};
use crate::error::{CoachError, Result};
use crate::heat::{HeatAdjuster, HeatAssessment};
use crate::models::{
    ActivityRecord, AthleteProfile, DecisionTrail, WeatherForecast, WellnessSample, WorkoutPlan,
    WorkoutType,
};
use crate::pmc::{acwr, LoadTarget, TrainingLoadSolver};
use crate::readiness::{ReadinessResult, ReadinessScorer};
use crate::training_plan::{PlanRequest, WorkoutPlanBuilder};
use crate::zones::ZoneCalculator;

/// Days reported when there is no matching activity in the history
pub const NO_HISTORY_DAYS: i64 = 999;

/// Weekly distance above which the default category rule adds a volume note
const HIGH_WEEKLY_DISTANCE_KM: Decimal = dec!(25);

/// Tomorrow: train or not
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunVerdict {
    Run,
    Rest,
}

impl fmt::Display for RunVerdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunVerdict::Run => write!(f, "run"),
            RunVerdict::Rest => write!(f, "rest"),
        }
    }
}

/// Session category chosen for a run day
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionCategory {
    Recovery,
    Easy,
    Hard,
}

impl fmt::Display for SessionCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionCategory::Recovery => write!(f, "recovery"),
            SessionCategory::Easy => write!(f, "easy"),
            SessionCategory::Hard => write!(f, "hard"),
        }
    }
}

/// One named rule of a cascade
pub struct Rule<I, O> {
    pub name: &'static str,
    pub applies: fn(&I) -> bool,
    pub outcome: O,
    pub describe: fn(&I) -> String,
}

/// Signals the run/rest cascade looks at
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunRestInputs {
    pub tsb: Decimal,
    pub acwr: Decimal,
    pub readiness: Decimal,
    pub days_since_run: i64,
    pub days_since_hard: i64,
}

/// Signals the category cascade looks at
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryInputs {
    pub tsb: Decimal,
    pub hard_percent: Decimal,
    pub days_since_hard: i64,
    pub recovery_threshold: Decimal,
    pub min_days_between_hard: i64,

    /// Run distance of the trailing week, informational only
    pub week_distance_km: Decimal,
}

/// Run/rest rules in priority order
pub static RUN_REST_RULES: [Rule<RunRestInputs, RunVerdict>; 10] = [
    Rule {
        name: "low_readiness",
        applies: |i| i.readiness < dec!(0.6),
        outcome: RunVerdict::Rest,
        describe: |i| format!("Readiness {:.2} < 0.6: recovery needed", i.readiness),
    },
    Rule {
        name: "overtraining",
        applies: |i| i.tsb < dec!(-25),
        outcome: RunVerdict::Rest,
        describe: |i| format!("TSB {:.1} < -25: overtraining risk", i.tsb),
    },
    Rule {
        name: "injury_risk",
        applies: |i| i.acwr > dec!(1.5),
        outcome: RunVerdict::Rest,
        describe: |i| format!("ACWR {:.2} > 1.5: injury risk", i.acwr),
    },
    Rule {
        name: "cautious_combination",
        applies: |i| i.readiness < dec!(0.75) && i.tsb < dec!(-10),
        outcome: RunVerdict::Rest,
        describe: |i| {
            format!(
                "Readiness {:.2} < 0.75 with TSB {:.1} < -10: back off",
                i.readiness, i.tsb
            )
        },
    },
    Rule {
        name: "avoid_detraining",
        applies: |i| i.tsb > dec!(15) && i.days_since_run >= 3,
        outcome: RunVerdict::Run,
        describe: |i| {
            format!(
                "TSB {:.1} > 15 after {} days without running: avoid detraining",
                i.tsb, i.days_since_run
            )
        },
    },
    Rule {
        name: "fresh",
        applies: |i| i.tsb > dec!(5),
        outcome: RunVerdict::Run,
        describe: |i| format!("TSB {:.1} > 5: fresh enough to run", i.tsb),
    },
    Rule {
        name: "recovered",
        applies: |i| i.tsb > dec!(-15) && i.days_since_run >= 2 && i.readiness >= dec!(0.75),
        outcome: RunVerdict::Run,
        describe: |i| {
            format!(
                "TSB {:.1} > -15, {} days since last run, readiness {:.2}: recovered",
                i.tsb, i.days_since_run, i.readiness
            )
        },
    },
    Rule {
        name: "maintain_fitness",
        applies: |i| i.days_since_run >= 4,
        outcome: RunVerdict::Run,
        describe: |i| format!("{} days without running: maintain fitness", i.days_since_run),
    },
    Rule {
        name: "still_fatigued",
        applies: |i| i.tsb < Decimal::ZERO && i.days_since_run < 2,
        outcome: RunVerdict::Rest,
        describe: |i| {
            format!(
                "TSB {:.1} < 0 and ran {} day(s) ago: still fatigued",
                i.tsb, i.days_since_run
            )
        },
    },
    Rule {
        name: "default_rest",
        applies: |_| true,
        outcome: RunVerdict::Rest,
        describe: |_| "No rule favors running: rest by default".to_string(),
    },
];

/// Session category rules in priority order
pub static CATEGORY_RULES: [Rule<CategoryInputs, SessionCategory>; 6] = [
    Rule {
        name: "deep_fatigue",
        applies: |i| i.tsb < i.recovery_threshold,
        outcome: SessionCategory::Recovery,
        describe: |i| {
            format!(
                "TSB {:.1} below recovery threshold {}: recovery session",
                i.tsb, i.recovery_threshold
            )
        },
    },
    Rule {
        name: "hard_spacing",
        applies: |i| i.days_since_hard < i.min_days_between_hard,
        outcome: SessionCategory::Easy,
        describe: |i| {
            format!(
                "Last hard session {} day(s) ago (minimum {}): easy",
                i.days_since_hard, i.min_days_between_hard
            )
        },
    },
    Rule {
        name: "too_much_intensity",
        applies: |i| i.hard_percent > dec!(25),
        outcome: SessionCategory::Easy,
        describe: |i| format!("Hard share {:.1}% > 25%: rebalance with easy running", i.hard_percent),
    },
    Rule {
        name: "intensity_due",
        applies: |i| i.hard_percent < dec!(15) && i.days_since_hard >= 4,
        outcome: SessionCategory::Hard,
        describe: |i| {
            format!(
                "Hard share {:.1}% < 15% and {} days since hard: quality session due",
                i.hard_percent, i.days_since_hard
            )
        },
    },
    Rule {
        name: "fresh_for_quality",
        applies: |i| i.tsb > dec!(5) && i.days_since_hard >= 3 && i.hard_percent < dec!(22),
        outcome: SessionCategory::Hard,
        describe: |i| {
            format!(
                "TSB {:.1} > 5, {} days since hard, hard share {:.1}% < 22%: quality session",
                i.tsb, i.days_since_hard, i.hard_percent
            )
        },
    },
    Rule {
        name: "default_easy",
        applies: |_| true,
        outcome: SessionCategory::Easy,
        describe: |i| {
            if i.week_distance_km > HIGH_WEEKLY_DISTANCE_KM {
                format!(
                    "Default easy session (already {} km this week)",
                    i.week_distance_km
                )
            } else {
                "Default easy session".to_string()
            }
        },
    },
];

/// First matching rule's outcome, traced under `stage`
fn evaluate<I, O: Copy + fmt::Display>(
    rules: &[Rule<I, O>],
    inputs: &I,
    fallback: O,
    stage: &str,
    trail: &mut DecisionTrail,
) -> O {
    match rules.iter().enumerate().find(|(_, rule)| (rule.applies)(inputs)) {
        Some((index, rule)) => {
            debug!("{} rule {} ({}) → {}", stage, index + 1, rule.name, rule.outcome);
            trail.push(
                stage,
                format!("Rule {} ({}): {} → {}", index + 1, rule.name, (rule.describe)(inputs), rule.outcome),
            );
            rule.outcome
        }
        None => {
            trail.push(stage, format!("No rule matched → {}", fallback));
            fallback
        }
    }
}

/// Everything the engine needs to decide one day
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionRequest {
    /// Reference date; the plan targets the day after
    pub today: NaiveDate,

    #[serde(default)]
    pub profile: AthleteProfile,

    /// Wellness series, most recent last
    pub wellness: Vec<WellnessSample>,

    #[serde(default)]
    pub activities: Vec<ActivityRecord>,

    #[serde(default)]
    pub forecast: Option<WeatherForecast>,
}

impl DecisionRequest {
    /// Wellness samples dated on or before the reference date
    pub fn wellness_until_today(&self) -> &[WellnessSample] {
        let end = self
            .wellness
            .iter()
            .rposition(|s| s.date <= self.today)
            .map_or(0, |i| i + 1);
        &self.wellness[..end]
    }

    /// The sample for the reference date itself, if the series has one
    pub fn current_wellness(&self) -> Option<&WellnessSample> {
        self.wellness_until_today()
            .last()
            .filter(|s| s.date == self.today)
    }
}

/// Engine output for one day
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Decision {
    /// Day the plan is for (reference date + 1)
    pub date: NaiveDate,
    pub verdict: RunVerdict,
    pub category: Option<SessionCategory>,
    pub plan: WorkoutPlan,
    pub readiness: ReadinessResult,
    pub inputs: RunRestInputs,
    pub load: Option<LoadTarget>,
    pub heat: Option<HeatAssessment>,
    pub distribution: TrainingDistribution,
    pub trail: DecisionTrail,
}

impl Decision {
    pub fn is_rest(&self) -> bool {
        self.verdict == RunVerdict::Rest
    }
}

/// Stateless decision engine over an explicit configuration
pub struct DecisionEngine {
    config: CoachConfig,
    solver: TrainingLoadSolver,
}

impl DecisionEngine {
    pub fn new(config: CoachConfig) -> Self {
        let solver = TrainingLoadSolver::new(config.load_model.clone());
        DecisionEngine { config, solver }
    }

    pub fn config(&self) -> &CoachConfig {
        &self.config
    }

    /// Run/rest cascade
    pub fn evaluate_run_rest(&self, inputs: &RunRestInputs, trail: &mut DecisionTrail) -> RunVerdict {
        evaluate(&RUN_REST_RULES, inputs, RunVerdict::Rest, "run_rest", trail)
    }

    /// Session category cascade
    pub fn select_category(
        &self,
        inputs: &CategoryInputs,
        trail: &mut DecisionTrail,
    ) -> SessionCategory {
        evaluate(&CATEGORY_RULES, inputs, SessionCategory::Easy, "category", trail)
    }

    /// Concrete workout type for a category and final load
    pub fn select_type(category: SessionCategory, target_load: u32) -> WorkoutType {
        match category {
            SessionCategory::Recovery => WorkoutType::Recovery,
            SessionCategory::Easy if target_load > 60 => WorkoutType::LongRun,
            SessionCategory::Easy => WorkoutType::Easy,
            SessionCategory::Hard if target_load > 50 => WorkoutType::ThresholdIntervals,
            SessionCategory::Hard => WorkoutType::Vo2maxIntervals,
        }
    }

    /// Decide tomorrow's session
    pub fn decide(&self, request: &DecisionRequest) -> Result<Decision> {
        let today = request.today;
        let history = request.wellness_until_today();
        let current = request
            .current_wellness()
            .ok_or(CoachError::MissingWellness { today })?;
        let target_date = today
            .checked_add_days(Days::new(1))
            .ok_or_else(|| CoachError::Validation(format!("no day follows {}", today)))?;

        let mut trail = DecisionTrail::new();

        let max_hr = ZoneCalculator::effective_max_hr(&request.profile, &request.activities);
        let zones = ZoneCalculator::zones_for_athlete(&request.profile, &request.activities);
        let analyzer = DistributionAnalyzer::new(&request.activities, max_hr);
        let polarization = &self.config.polarization;
        let distribution = analyzer
            .distribution(today, polarization.analysis_window_days)
            .with_targets(polarization.easy_target_percent, polarization.hard_target_percent);

        let readiness = ReadinessScorer::score(history);
        trail.push(
            "readiness",
            format!("Score {:.2} ({})", readiness.score, readiness.status),
        );
        trail.extend_from("readiness", &readiness.recommendations);

        let inputs = RunRestInputs {
            tsb: current.tsb(),
            acwr: acwr(current.ctl, current.atl),
            readiness: readiness.score,
            days_since_run: days_between(analyzer.last_run_date(today), today)
                .unwrap_or(NO_HISTORY_DAYS),
            days_since_hard: days_between(analyzer.last_hard_date(today), today)
                .unwrap_or(NO_HISTORY_DAYS),
        };
        let mut verdict = self.evaluate_run_rest(&inputs, &mut trail);

        let heat = request.forecast.as_ref().map(HeatAdjuster::assess);
        if let Some(assessment) = &heat {
            trail.push(
                "heat",
                format!(
                    "Heat index {:.1} °C, factor {}: {}",
                    assessment.heat_index, assessment.factor, assessment.advice
                ),
            );
            if assessment.skip_session() && verdict == RunVerdict::Run {
                warn!("Heat index {} forces a rest day", assessment.heat_index);
                trail.push("heat", "Extreme heat overrides the run verdict → rest");
                verdict = RunVerdict::Rest;
            }
        }

        if verdict == RunVerdict::Rest {
            info!("Decision for {}: rest", target_date);
            return Ok(Decision {
                date: target_date,
                verdict,
                category: None,
                plan: WorkoutPlan::rest(target_date, trail.clone()),
                readiness,
                inputs,
                load: None,
                heat,
                distribution,
                trail,
            });
        }

        let base = self.solver.solve(current.ctl, current.atl);
        let load = self.solver.scale(
            base,
            readiness.score,
            heat.as_ref().map(|h| h.factor),
        );
        trail.push(
            "load",
            format!(
                "Theoretical {:.1}, cap {:.1} ({}), after readiness/heat {:.1} → {} TSS",
                load.theoretical,
                load.cap,
                load.binding,
                load.final_load,
                load.rounded()
            ),
        );

        let week_distance_km = analyzer
            .weekly_stats(today, 1)
            .first()
            .map(|w| w.distance_km)
            .unwrap_or(Decimal::ZERO);
        let category_inputs = CategoryInputs {
            tsb: inputs.tsb,
            hard_percent: distribution.hard_percent,
            days_since_hard: inputs.days_since_hard,
            recovery_threshold: self.config.load_model.recovery_threshold,
            min_days_between_hard: i64::from(polarization.min_days_between_hard),
            week_distance_km,
        };
        trail.push(
            "category",
            format!(
                "Last {} days: {} run(s), {:.1}% easy / {:.1}% hard (target {}/{}), {} days since hard, TSB {:.1}",
                distribution.window_days,
                distribution.total_runs,
                distribution.easy_percent,
                distribution.hard_percent,
                distribution.target_easy,
                distribution.target_hard,
                category_inputs.days_since_hard,
                category_inputs.tsb
            ),
        );
        let mut category = self.select_category(&category_inputs, &mut trail);

        if category == SessionCategory::Hard && heat.as_ref().is_some_and(|h| h.hard_inadvisable()) {
            trail.push("heat", "Heat makes hard efforts inadvisable: hard → easy");
            category = SessionCategory::Easy;
        }

        let workout_type = Self::select_type(category, load.rounded());
        trail.push(
            "workout",
            format!("{} session at {} TSS → {}", category, load.rounded(), workout_type),
        );

        let plan = WorkoutPlanBuilder::new(&self.config).build(PlanRequest {
            date: target_date,
            workout_type,
            target_load: load.rounded(),
            easy_pace: analyzer.average_easy_pace(),
            ctl: current.ctl,
            atl: current.atl,
            zones: Some(&zones),
            trail: trail.clone(),
        });

        info!("Decision for {}: {}", target_date, plan.title);

        Ok(Decision {
            date: target_date,
            verdict,
            category: Some(category),
            plan,
            readiness,
            inputs,
            load: Some(load),
            heat,
            distribution,
            trail,
        })
    }

    /// Decide many independent requests in parallel, preserving input order
    pub fn decide_batch(&self, requests: &[DecisionRequest]) -> Vec<Result<Decision>> {
        requests.par_iter().map(|request| self.decide(request)).collect()
    }
}

impl Default for DecisionEngine {
    fn default() -> Self {
        Self::new(CoachConfig::default())
    }
}
