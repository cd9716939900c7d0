//! Performance Management Chart helpers and next-session load solving
//!
//! The fitness/fatigue model is the standard one-day exponential update:
//!
//! ```text
//! CTL' = CTL + (L - CTL) / c
//! ATL' = ATL + (L - ATL) / a
//! TSB' = CTL' - ATL'
//! ```
//!
//! `TrainingLoadSolver` inverts it to find the load `L` that lands tomorrow's
//! TSB on a target, then bounds it with a safety cap and a minimum load.

use chrono::NaiveDate;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, warn};

use crate::config::LoadModelConfig;
use crate::models::WellnessSample;

/// Acute:chronic workload ratio, 1.0 when there is no chronic load
pub fn acwr(ctl: Decimal, atl: Decimal) -> Decimal {
    if ctl.is_zero() {
        Decimal::ONE
    } else {
        atl / ctl
    }
}

/// Training Stress Balance interpretation ranges
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TsbInterpretation {
    VeryRested,      // above +10
    Optimal,         // -5 to +10
    ModerateFatigue, // -15 to -5
    HeavyFatigue,    // -15 and below
}

impl TsbInterpretation {
    /// Get TSB interpretation from numeric value
    pub fn from_tsb(tsb: Decimal) -> Self {
        if tsb > dec!(10) {
            TsbInterpretation::VeryRested
        } else if tsb > dec!(-5) {
            TsbInterpretation::Optimal
        } else if tsb > dec!(-15) {
            TsbInterpretation::ModerateFatigue
        } else {
            TsbInterpretation::HeavyFatigue
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            TsbInterpretation::VeryRested => "Very rested",
            TsbInterpretation::Optimal => "Optimal form",
            TsbInterpretation::ModerateFatigue => "Moderate fatigue",
            TsbInterpretation::HeavyFatigue => "Heavy fatigue",
        }
    }

    pub fn recommendation(&self) -> &'static str {
        match self {
            TsbInterpretation::VeryRested => "Fresh enough for a quality session or a race",
            TsbInterpretation::Optimal => "Continue normal training progression",
            TsbInterpretation::ModerateFatigue => "Productive fatigue, keep most sessions easy",
            TsbInterpretation::HeavyFatigue => "Prioritize recovery before adding load",
        }
    }
}

/// ACWR interpretation ranges
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AcwrInterpretation {
    UnderTraining, // below 0.8
    Optimal,       // 0.8 to 1.3
    Caution,       // 1.3 to 1.5
    Danger,        // above 1.5
}

impl AcwrInterpretation {
    pub fn from_acwr(ratio: Decimal) -> Self {
        if ratio < dec!(0.8) {
            AcwrInterpretation::UnderTraining
        } else if ratio <= dec!(1.3) {
            AcwrInterpretation::Optimal
        } else if ratio <= dec!(1.5) {
            AcwrInterpretation::Caution
        } else {
            AcwrInterpretation::Danger
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            AcwrInterpretation::UnderTraining => "Under-training",
            AcwrInterpretation::Optimal => "Optimal load",
            AcwrInterpretation::Caution => "Caution",
            AcwrInterpretation::Danger => "Injury risk",
        }
    }
}

/// ACWR for one day of a wellness series
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AcwrPoint {
    pub date: NaiveDate,
    pub ctl: Decimal,
    pub atl: Decimal,
    pub acwr: Decimal,
    pub interpretation: AcwrInterpretation,
}

/// Per-day ACWR over a wellness series, in input order
pub fn acwr_series(history: &[WellnessSample]) -> Vec<AcwrPoint> {
    history
        .iter()
        .map(|sample| {
            let ratio = acwr(sample.ctl, sample.atl);
            AcwrPoint {
                date: sample.date,
                ctl: sample.ctl,
                atl: sample.atl,
                acwr: ratio,
                interpretation: AcwrInterpretation::from_acwr(ratio),
            }
        })
        .collect()
}

/// Which bound determined the pre-scaling load
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BindingBound {
    /// The balance equation produced the load
    BalanceDriven,
    /// The ATL-based safety cap limited the load
    SafetyCap,
}

impl fmt::Display for BindingBound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BindingBound::BalanceDriven => write!(f, "balance-driven"),
            BindingBound::SafetyCap => write!(f, "safety-cap"),
        }
    }
}

/// Solved session load with every intermediate value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoadTarget {
    /// Load that lands exactly on the target TSB
    pub theoretical: Decimal,

    /// ATL - safety floor
    pub cap: Decimal,

    /// min(theoretical, cap), at least the minimum load
    pub base_load: Decimal,

    pub binding: BindingBound,

    /// Readiness multiplier applied, if scaled
    pub readiness_factor: Option<Decimal>,

    /// Heat multiplier applied, if a forecast was used
    pub heat_factor: Option<Decimal>,

    /// Load after scaling and re-clamping
    pub final_load: Decimal,
}

impl LoadTarget {
    /// Final load rounded to a whole load score, saturating at `u32::MAX`
    pub fn rounded(&self) -> u32 {
        self.final_load
            .max(Decimal::ZERO)
            .round()
            .to_u32()
            .unwrap_or(u32::MAX)
    }
}

/// Inverts the CTL/ATL update for a target TSB
#[derive(Debug, Clone)]
pub struct TrainingLoadSolver {
    config: LoadModelConfig,
}

impl TrainingLoadSolver {
    pub fn new(config: LoadModelConfig) -> Self {
        TrainingLoadSolver { config }
    }

    pub fn config(&self) -> &LoadModelConfig {
        &self.config
    }

    /// Load that moves tomorrow's TSB to the configured target
    ///
    /// Falls back to the configured default load when the time constants make
    /// the system degenerate (equal or zero constants).
    pub fn theoretical_load(&self, ctl: Decimal, atl: Decimal) -> Decimal {
        let (c, a) = (self.config.ctl_days, self.config.atl_days);
        if c == 0 || a == 0 || c == a {
            warn!(
                "Degenerate load model (ctl_days={}, atl_days={}), using fallback load {}",
                c, a, self.config.fallback_load
            );
            return self.config.fallback_load;
        }

        let c = Decimal::from(c);
        let a = Decimal::from(a);

        let numerator =
            self.config.target_tsb - ctl * (c - Decimal::ONE) / c + atl * (a - Decimal::ONE) / a;
        let denominator = Decimal::ONE / c - Decimal::ONE / a;

        numerator / denominator
    }

    /// Pre-scaling load: theoretical load bounded by the safety cap and minimum load
    pub fn solve(&self, ctl: Decimal, atl: Decimal) -> LoadTarget {
        let theoretical = self.theoretical_load(ctl, atl);
        let cap = atl - self.config.safety_floor;

        let binding = if theoretical <= cap {
            BindingBound::BalanceDriven
        } else {
            BindingBound::SafetyCap
        };
        let base_load = theoretical.min(cap).max(self.config.min_load);

        debug!(
            "Load solve: theoretical {}, cap {}, base {} ({})",
            theoretical.round_dp(1),
            cap.round_dp(1),
            base_load.round_dp(1),
            binding
        );

        LoadTarget {
            theoretical,
            cap,
            base_load,
            binding,
            readiness_factor: None,
            heat_factor: None,
            final_load: base_load,
        }
    }

    /// Apply readiness and optional heat multipliers, re-clamping to the minimum load
    pub fn scale(&self, target: LoadTarget, readiness: Decimal, heat: Option<Decimal>) -> LoadTarget {
        let mut load = target.base_load * readiness;
        if let Some(factor) = heat {
            load *= factor;
        }
        let final_load = load.max(self.config.min_load);

        debug!(
            "Load scaled by readiness {} and heat {:?}: {}",
            readiness,
            heat,
            final_load.round_dp(1)
        );

        LoadTarget {
            readiness_factor: Some(readiness),
            heat_factor: heat,
            final_load,
            ..target
        }
    }

    /// CTL and ATL after one day with `load`
    pub fn project(&self, ctl: Decimal, atl: Decimal, load: Decimal) -> (Decimal, Decimal) {
        let c = Decimal::from(self.config.ctl_days.max(1));
        let a = Decimal::from(self.config.atl_days.max(1));
        (ctl + (load - ctl) / c, atl + (load - atl) / a)
    }
}

impl Default for TrainingLoadSolver {
    fn default() -> Self {
        Self::new(LoadModelConfig::default())
    }
}
