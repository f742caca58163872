//! Health score - weighted 0-100 summary derived from the most recent entries
//!
//! Each category yields a 0-10 sub-score from its latest entry (0 when there is none).
//! The overall score is the rounded weighted sum.

use serde::Serialize;
use std::fmt;

use crate::entry::{FitnessLog, Intensity, MoodLabel, MoodLog, NutritionLog, SleepLog, WeightUnit};
use crate::store::EntryStore;

const SLEEP_WEIGHT: f64 = 25.0;
const NUTRITION_WEIGHT: f64 = 25.0;
const ACTIVITY_WEIGHT: f64 = 20.0;
const MOOD_WEIGHT: f64 = 15.0;
const GOAL_WEIGHT: f64 = 15.0;

/// Score difference below which the trend is stable
const TREND_THRESHOLD: i32 = 2;

const KG_PER_LB: f64 = 0.453_592_37;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct HealthScore {
    pub sleep: f64,
    pub nutrition: f64,
    pub activity: f64,
    pub mood: f64,
    pub goal_progress: f64,
    pub overall: u8,
}

impl HealthScore {
    #[hotpath::measure]
    pub fn compute(store: &EntryStore, target_weight_kg: f64) -> Self {
        let sleep = store.sleeps().first().map_or(0.0, |e| sleep_score(e));
        let nutrition = store.meals().first().map_or(0.0, |e| nutrition_score(e));
        let activity = store.workouts().first().map_or(0.0, |e| activity_score(e));
        let mood = store.moods().first().map_or(0.0, |e| mood_score(e));

        let weights: Vec<f64> = store
            .weights()
            .iter()
            .map(|e| match e.unit {
                WeightUnit::Kg => e.weight,
                WeightUnit::Lbs => e.weight * KG_PER_LB,
            })
            .collect();
        let goal_progress = goal_progress(&weights, target_weight_kg);

        let total = sleep * SLEEP_WEIGHT / 10.0
            + nutrition * NUTRITION_WEIGHT / 10.0
            + activity * ACTIVITY_WEIGHT / 10.0
            + mood * MOOD_WEIGHT / 10.0
            + goal_progress * GOAL_WEIGHT / 10.0;

        let overall = total.round().clamp(0.0, 100.0) as u8;
        tracing::debug!(sleep, nutrition, activity, mood, goal_progress, overall, "health score");

        Self {
            sleep,
            nutrition,
            activity,
            mood,
            goal_progress,
            overall,
        }
    }

    pub fn grade(&self) -> Grade {
        grade(self.overall)
    }
}

/// Duration band (7-9h ideal) averaged with the reported quality
pub fn sleep_score(log: &SleepLog) -> f64 {
    let duration = if (7.0..=9.0).contains(&log.duration) {
        10.0
    } else if (6.0..=10.0).contains(&log.duration) {
        7.0
    } else {
        4.0
    };
    (duration + log.quality as f64) / 2.0
}

/// Macro balance relative to calories
pub fn nutrition_score(log: &NutritionLog) -> f64 {
    let t = &log.totals;
    if t.calories <= 0.0 {
        return 0.0;
    }
    let protein = (t.protein / t.calories * 400.0).min(10.0);
    let carbs = (t.carbs / t.calories * 400.0).min(10.0);
    let fat = (t.fat / t.calories * 225.0).min(10.0);
    (protein + carbs + fat) / 3.0
}

/// An hour counts as 10, scaled by intensity
pub fn activity_score(log: &FitnessLog) -> f64 {
    let duration = (log.duration as f64 / 60.0 * 10.0).min(10.0);
    let multiplier = match log.intensity {
        Intensity::High => 1.2,
        Intensity::Medium => 1.0,
        Intensity::Low => 0.8,
    };
    (duration * multiplier).min(10.0)
}

pub fn mood_score(log: &MoodLog) -> f64 {
    let mood = match log.mood {
        MoodLabel::Excellent => 10.0,
        MoodLabel::Good => 8.0,
        MoodLabel::Neutral => 6.0,
        MoodLabel::Bad => 4.0,
        MoodLabel::Terrible => 2.0,
    };
    let stress = 11.0 - log.stress as f64;
    (mood + log.energy as f64 + stress) / 3.0
}

/// Progress from the oldest toward the target, given weights most recent first
pub fn goal_progress(weights: &[f64], target: f64) -> f64 {
    let (Some(latest), Some(initial)) = (weights.first(), weights.last()) else {
        return 0.0;
    };
    let total = (target - initial).abs();
    let remaining = (target - latest).abs();

    if total == 0.0 {
        return if remaining == 0.0 { 10.0 } else { 0.0 };
    }
    ((total - remaining) / total * 10.0).clamp(0.0, 10.0)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Up,
    Down,
    Stable,
}

impl fmt::Display for Trend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Trend::Up => write!(f, "up"),
            Trend::Down => write!(f, "down"),
            Trend::Stable => write!(f, "stable"),
        }
    }
}

pub fn trend(current: u8, previous: u8) -> Trend {
    let diff = current as i32 - previous as i32;
    if diff.abs() < TREND_THRESHOLD {
        Trend::Stable
    } else if diff > 0 {
        Trend::Up
    } else {
        Trend::Down
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Grade {
    Good,
    Fair,
    Poor,
}

impl fmt::Display for Grade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Grade::Good => write!(f, "good"),
            Grade::Fair => write!(f, "fair"),
            Grade::Poor => write!(f, "poor"),
        }
    }
}

pub fn grade(score: u8) -> Grade {
    match score {
        80.. => Grade::Good,
        60..=79 => Grade::Fair,
        _ => Grade::Poor,
    }
}
