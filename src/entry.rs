//! Health entry records
//!
//! Each category has a log type (the fields a user fills in) and is stored as
//! `Entry<Log>` once the store has assigned it an id.

use chrono::{NaiveDate, NaiveTime, Timelike};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Deref;
use std::str::FromStr;

pub type EntryId = String;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Weight,
    Fitness,
    Nutrition,
    Sleep,
    Mood,
}

impl Category {
    pub const ALL: [Category; 5] = [
        Category::Weight,
        Category::Fitness,
        Category::Nutrition,
        Category::Sleep,
        Category::Mood,
    ];

    /// Id prefix for entries in this category
    pub fn prefix(&self) -> &'static str {
        match self {
            Category::Weight => "w",
            Category::Fitness => "f",
            Category::Nutrition => "n",
            Category::Sleep => "s",
            Category::Mood => "m",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Category::Weight => write!(f, "weight"),
            Category::Fitness => write!(f, "fitness"),
            Category::Nutrition => write!(f, "nutrition"),
            Category::Sleep => write!(f, "sleep"),
            Category::Mood => write!(f, "mood"),
        }
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "weight" | "w" => Ok(Category::Weight),
            "fitness" | "workout" | "exercise" | "f" => Ok(Category::Fitness),
            "nutrition" | "meal" | "food" | "n" => Ok(Category::Nutrition),
            "sleep" | "s" => Ok(Category::Sleep),
            "mood" | "m" => Ok(Category::Mood),
            other => Err(format!("unknown category '{}'", other)),
        }
    }
}

// ============================================================================
// Enumerated fields
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WeightUnit {
    #[default]
    Kg,
    Lbs,
}

impl WeightUnit {
    /// Parse a spoken or typed unit; "pounds" and "lb" mean lbs
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "kg" | "kgs" | "kilograms" | "kilos" => Some(WeightUnit::Kg),
            "lbs" | "lb" | "pounds" | "pound" => Some(WeightUnit::Lbs),
            _ => None,
        }
    }
}

impl fmt::Display for WeightUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WeightUnit::Kg => write!(f, "kg"),
            WeightUnit::Lbs => write!(f, "lbs"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Intensity {
    Low,
    #[default]
    Medium,
    High,
}

impl fmt::Display for Intensity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Intensity::Low => write!(f, "low"),
            Intensity::Medium => write!(f, "medium"),
            Intensity::High => write!(f, "high"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MealType {
    Breakfast,
    Lunch,
    Dinner,
    Snack,
}

impl MealType {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "breakfast" => Some(MealType::Breakfast),
            "lunch" => Some(MealType::Lunch),
            "dinner" => Some(MealType::Dinner),
            "snack" => Some(MealType::Snack),
            _ => None,
        }
    }
}

impl fmt::Display for MealType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MealType::Breakfast => write!(f, "breakfast"),
            MealType::Lunch => write!(f, "lunch"),
            MealType::Dinner => write!(f, "dinner"),
            MealType::Snack => write!(f, "snack"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MoodLabel {
    Excellent,
    Good,
    Neutral,
    Bad,
    Terrible,
}

impl fmt::Display for MoodLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MoodLabel::Excellent => write!(f, "excellent"),
            MoodLabel::Good => write!(f, "good"),
            MoodLabel::Neutral => write!(f, "neutral"),
            MoodLabel::Bad => write!(f, "bad"),
            MoodLabel::Terrible => write!(f, "terrible"),
        }
    }
}

// ============================================================================
// Logs (entry contents without an id)
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightLog {
    pub date: NaiveDate,
    pub weight: f64,
    pub unit: WeightUnit,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body_fat: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FitnessLog {
    pub date: NaiveDate,
    pub activity: String,
    /// Minutes
    pub duration: u32,
    pub calories_burned: u32,
    pub intensity: Intensity,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FoodItem {
    pub name: String,
    pub serving_size: String,
    pub calories: f64,
    pub protein: f64,
    pub carbs: f64,
    pub fat: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct MacroTotals {
    pub calories: f64,
    pub protein: f64,
    pub carbs: f64,
    pub fat: f64,
}

impl MacroTotals {
    pub fn sum(items: &[FoodItem]) -> Self {
        items.iter().fold(Self::default(), |acc, item| Self {
            calories: acc.calories + item.calories,
            protein: acc.protein + item.protein,
            carbs: acc.carbs + item.carbs,
            fat: acc.fat + item.fat,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NutritionLog {
    pub date: NaiveDate,
    pub meal_type: MealType,
    pub food_items: Vec<FoodItem>,
    pub totals: MacroTotals,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl NutritionLog {
    /// Build a meal log whose totals are aggregated from its items
    pub fn from_items(date: NaiveDate, meal_type: MealType, food_items: Vec<FoodItem>) -> Self {
        let totals = MacroTotals::sum(&food_items);
        Self {
            date,
            meal_type,
            food_items,
            totals,
            notes: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SleepLog {
    pub date: NaiveDate,
    /// Hours
    pub duration: f64,
    /// 1-10
    pub quality: u8,
    pub bed_time: NaiveTime,
    pub wake_time: NaiveTime,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MoodLog {
    pub date: NaiveDate,
    pub mood: MoodLabel,
    /// 1-10
    pub energy: u8,
    /// 1-10
    pub stress: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// Parse a "HH:MM" clock time
pub fn parse_clock(s: &str) -> Option<NaiveTime> {
    NaiveTime::parse_from_str(s.trim(), "%H:%M").ok()
}

/// Hours slept between bed and wake time, wrapping past midnight, one decimal
pub fn sleep_hours(bed: NaiveTime, wake: NaiveTime) -> f64 {
    let mut hours = wake.hour() as f64 - bed.hour() as f64;
    if hours < 0.0 {
        hours += 24.0;
    }
    hours += (wake.minute() as f64 - bed.minute() as f64) / 60.0;
    (hours * 10.0).round() / 10.0
}

// ============================================================================
// Stored entries
// ============================================================================

/// A log with the id the store gave it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entry<T> {
    pub id: EntryId,
    #[serde(flatten)]
    pub log: T,
}

impl<T> Deref for Entry<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.log
    }
}

/// Entry contents awaiting an id, tagged by category
#[derive(Debug, Clone, PartialEq)]
pub enum EntryDraft {
    Weight(WeightLog),
    Fitness(FitnessLog),
    Nutrition(NutritionLog),
    Sleep(SleepLog),
    Mood(MoodLog),
}

impl EntryDraft {
    pub fn category(&self) -> Category {
        match self {
            EntryDraft::Weight(_) => Category::Weight,
            EntryDraft::Fitness(_) => Category::Fitness,
            EntryDraft::Nutrition(_) => Category::Nutrition,
            EntryDraft::Sleep(_) => Category::Sleep,
            EntryDraft::Mood(_) => Category::Mood,
        }
    }

    pub fn date(&self) -> NaiveDate {
        match self {
            EntryDraft::Weight(l) => l.date,
            EntryDraft::Fitness(l) => l.date,
            EntryDraft::Nutrition(l) => l.date,
            EntryDraft::Sleep(l) => l.date,
            EntryDraft::Mood(l) => l.date,
        }
    }
}

/// Borrowed view of an entry from any category
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(untagged)]
pub enum EntryRef<'a> {
    Weight(&'a Entry<WeightLog>),
    Fitness(&'a Entry<FitnessLog>),
    Nutrition(&'a Entry<NutritionLog>),
    Sleep(&'a Entry<SleepLog>),
    Mood(&'a Entry<MoodLog>),
}

impl EntryRef<'_> {
    pub fn id(&self) -> &str {
        match self {
            EntryRef::Weight(e) => &e.id,
            EntryRef::Fitness(e) => &e.id,
            EntryRef::Nutrition(e) => &e.id,
            EntryRef::Sleep(e) => &e.id,
            EntryRef::Mood(e) => &e.id,
        }
    }

    pub fn date(&self) -> NaiveDate {
        match self {
            EntryRef::Weight(e) => e.date,
            EntryRef::Fitness(e) => e.date,
            EntryRef::Nutrition(e) => e.date,
            EntryRef::Sleep(e) => e.date,
            EntryRef::Mood(e) => e.date,
        }
    }

    pub fn category(&self) -> Category {
        match self {
            EntryRef::Weight(_) => Category::Weight,
            EntryRef::Fitness(_) => Category::Fitness,
            EntryRef::Nutrition(_) => Category::Nutrition,
            EntryRef::Sleep(_) => Category::Sleep,
            EntryRef::Mood(_) => Category::Mood,
        }
    }

    /// One-line human summary
    pub fn summary(&self) -> String {
        match self {
            EntryRef::Weight(e) => format!("{} {}", e.weight, e.unit),
            EntryRef::Fitness(e) => format!(
                "{} {} min, {} kcal ({})",
                e.activity, e.duration, e.calories_burned, e.intensity
            ),
            EntryRef::Nutrition(e) => {
                let foods: Vec<&str> = e.food_items.iter().map(|f| f.name.as_str()).collect();
                format!("{}: {} ({:.0} kcal)", e.meal_type, foods.join(", "), e.totals.calories)
            }
            EntryRef::Sleep(e) => format!(
                "{}h quality {}/10 ({}-{})",
                e.duration,
                e.quality,
                e.bed_time.format("%H:%M"),
                e.wake_time.format("%H:%M")
            ),
            EntryRef::Mood(e) => format!("{} energy {}/10 stress {}/10", e.mood, e.energy, e.stress),
        }
    }
}
