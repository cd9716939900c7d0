//! Rolling easy/hard distribution and weekly volume summaries
//!
//! Only runs are analyzed. Every window is anchored on an explicit reference
//! date so results never depend on the wall clock.

use chrono::{Days, NaiveDate};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::classifier::ActivityClassifier;
use crate::models::ActivityRecord;

/// Easy pace assumed when no qualifying easy run exists (min/km)
pub const DEFAULT_EASY_PACE: Decimal = dec!(6.0);

/// Plausible easy-pace band in min/km; outside it a pace is treated as a recording error
const MIN_PLAUSIBLE_PACE: Decimal = dec!(4.0);
const MAX_PLAUSIBLE_PACE: Decimal = dec!(9.0);

/// Runs below this fraction of max HR count as easy for pace estimation
const EASY_HR_FRACTION: Decimal = dec!(0.80);

/// Default polarized targets reported alongside a distribution
const DEFAULT_TARGET_EASY: u8 = 80;
const DEFAULT_TARGET_HARD: u8 = 20;

/// Easy/hard split over a trailing window
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingDistribution {
    pub window_days: u32,
    pub total_runs: u32,
    pub easy_count: u32,
    pub hard_count: u32,
    pub easy_percent: Decimal,
    pub hard_percent: Decimal,

    /// Configured easy share, for reporting only
    pub target_easy: u8,
    pub target_hard: u8,
}

impl TrainingDistribution {
    /// Split for the given counts, reported against the default 80/20 targets
    pub fn from_counts(window_days: u32, easy_count: u32, hard_count: u32) -> Self {
        let total_runs = easy_count + hard_count;
        let hard_percent = if total_runs > 0 {
            Decimal::from(hard_count) * dec!(100) / Decimal::from(total_runs)
        } else {
            Decimal::ZERO
        };

        TrainingDistribution {
            window_days,
            total_runs,
            easy_count,
            hard_count,
            easy_percent: dec!(100) - hard_percent,
            hard_percent,
            target_easy: DEFAULT_TARGET_EASY,
            target_hard: DEFAULT_TARGET_HARD,
        }
    }

    pub fn with_targets(self, target_easy: u8, target_hard: u8) -> Self {
        TrainingDistribution {
            target_easy,
            target_hard,
            ..self
        }
    }
}

/// Volume summary for one trailing week
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeeklyStats {
    /// 0 = current week
    pub week: u32,
    pub runs: u32,
    pub distance_km: Decimal,
    pub duration_minutes: Decimal,
    pub load: Decimal,
}

/// Aggregates an athlete's run history
pub struct DistributionAnalyzer<'a> {
    runs: Vec<&'a ActivityRecord>,
    max_hr: u16,
}

impl<'a> DistributionAnalyzer<'a> {
    /// Analyzer over the runs in `activities`; other sports are ignored
    pub fn new(activities: &'a [ActivityRecord], max_hr: u16) -> Self {
        DistributionAnalyzer {
            runs: activities.iter().filter(|a| a.is_run()).collect(),
            max_hr,
        }
    }

    pub fn run_count(&self) -> usize {
        self.runs.len()
    }

    pub fn max_hr(&self) -> u16 {
        self.max_hr
    }

    /// Easy/hard split of runs dated in `[today - window_days, today]`
    pub fn distribution(&self, today: NaiveDate, window_days: u32) -> TrainingDistribution {
        let cutoff = today
            .checked_sub_days(Days::new(u64::from(window_days)))
            .unwrap_or(NaiveDate::MIN);

        let (hard, easy): (Vec<&&ActivityRecord>, Vec<&&ActivityRecord>) = self
            .runs
            .iter()
            .filter(|a| a.date >= cutoff && a.date <= today)
            .partition(|a| ActivityClassifier::is_hard(a, self.max_hr));

        TrainingDistribution::from_counts(window_days, easy.len() as u32, hard.len() as u32)
    }

    /// Totals for `weeks` trailing 7-day windows, week 0 ending on `today`
    pub fn weekly_stats(&self, today: NaiveDate, weeks: u32) -> Vec<WeeklyStats> {
        (0..weeks)
            .map(|week| {
                let end = today
                    .checked_sub_days(Days::new(u64::from(week) * 7))
                    .unwrap_or(NaiveDate::MIN);
                let start = end.checked_sub_days(Days::new(7)).unwrap_or(NaiveDate::MIN);

                let in_week: Vec<&&ActivityRecord> = self
                    .runs
                    .iter()
                    .filter(|a| a.date >= start && a.date <= end)
                    .collect();

                WeeklyStats {
                    week,
                    runs: in_week.len() as u32,
                    distance_km: in_week
                        .iter()
                        .map(|a| a.distance_km())
                        .sum::<Decimal>()
                        .round_dp(1),
                    duration_minutes: in_week
                        .iter()
                        .map(|a| a.moving_minutes())
                        .sum::<Decimal>()
                        .round(),
                    load: in_week
                        .iter()
                        .filter_map(|a| a.load)
                        .sum::<Decimal>()
                        .round(),
                }
            })
            .collect()
    }

    /// Mean pace (min/km) of easy runs, or 6.0 when none qualify
    pub fn average_easy_pace(&self) -> Decimal {
        let easy_ceiling = Decimal::from(self.max_hr) * EASY_HR_FRACTION;

        let paces: Vec<Decimal> = self
            .runs
            .iter()
            .filter(|a| {
                a.avg_heart_rate
                    .is_some_and(|hr| hr > 0 && Decimal::from(hr) < easy_ceiling)
            })
            .filter(|a| a.moving_seconds > 0 && a.distance_meters > Decimal::ZERO)
            .map(|a| a.moving_minutes() / a.distance_km())
            .filter(|pace| *pace >= MIN_PLAUSIBLE_PACE && *pace <= MAX_PLAUSIBLE_PACE)
            .collect();

        if paces.is_empty() {
            return DEFAULT_EASY_PACE;
        }
        paces.iter().sum::<Decimal>() / Decimal::from(paces.len())
    }

    /// Latest run on or before `today`
    pub fn last_run_date(&self, today: NaiveDate) -> Option<NaiveDate> {
        self.runs
            .iter()
            .map(|a| a.date)
            .filter(|date| *date <= today)
            .max()
    }

    /// Latest hard run on or before `today`
    pub fn last_hard_date(&self, today: NaiveDate) -> Option<NaiveDate> {
        self.runs
            .iter()
            .filter(|a| a.date <= today)
            .filter(|a| ActivityClassifier::is_hard(a, self.max_hr))
            .map(|a| a.date)
            .max()
    }
}

/// Whole days from `since` to `today`, `None` when there is no such date
pub fn days_between(since: Option<NaiveDate>, today: NaiveDate) -> Option<i64> {
    since.map(|d| (today - d).num_days())
}
