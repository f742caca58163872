//! Demo data loaded by `EntryStore::seeded()` and the insights view

use chrono::NaiveDate;

use crate::entry::{
    Category, EntryDraft, FitnessLog, FoodItem, Intensity, MealType, MoodLabel, MoodLog,
    NutritionLog, SleepLog, WeightLog, WeightUnit, parse_clock,
};
use crate::insight::{Insight, Priority};

/// Date every seed record is stamped with
pub fn seed_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 6, 1).unwrap_or_default()
}

fn meal(name: &str, meal_type: MealType, calories: f64, protein: f64, carbs: f64, fat: f64) -> EntryDraft {
    let item = FoodItem {
        name: name.to_string(),
        serving_size: "1 serving".to_string(),
        calories,
        protein,
        carbs,
        fat,
    };
    EntryDraft::Nutrition(NutritionLog::from_items(seed_date(), meal_type, vec![item]))
}

fn sleep(duration: f64, quality: u8, bed: &str, wake: &str) -> EntryDraft {
    EntryDraft::Sleep(SleepLog {
        date: seed_date(),
        duration,
        quality,
        bed_time: parse_clock(bed).unwrap_or_default(),
        wake_time: parse_clock(wake).unwrap_or_default(),
        notes: None,
    })
}

/// Seed entries, most recent first within each category
pub fn entries() -> Vec<EntryDraft> {
    let date = seed_date();
    vec![
        EntryDraft::Weight(WeightLog {
            date,
            weight: 70.5,
            unit: WeightUnit::Kg,
            body_fat: Some(20.0),
            notes: Some("Manual".into()),
        }),
        EntryDraft::Weight(WeightLog {
            date,
            weight: 70.3,
            unit: WeightUnit::Kg,
            body_fat: None,
            notes: Some("Fitbit".into()),
        }),
        EntryDraft::Fitness(FitnessLog {
            date,
            activity: "Running".into(),
            duration: 30,
            calories_burned: 300,
            intensity: Intensity::High,
            notes: Some("cardio, outdoor".into()),
        }),
        EntryDraft::Fitness(FitnessLog {
            date,
            activity: "Cycling".into(),
            duration: 45,
            calories_burned: 400,
            intensity: Intensity::Medium,
            notes: Some("cardio".into()),
        }),
        meal("Oatmeal", MealType::Breakfast, 400.0, 20.0, 45.0, 15.0),
        meal("Chicken salad", MealType::Lunch, 600.0, 30.0, 65.0, 20.0),
        sleep(7.5, 8, "23:00", "06:30"),
        sleep(8.0, 9, "22:30", "06:30"),
        EntryDraft::Mood(MoodLog {
            date,
            mood: MoodLabel::Good,
            energy: 8,
            stress: 3,
            notes: None,
        }),
        EntryDraft::Mood(MoodLog {
            date,
            mood: MoodLabel::Neutral,
            energy: 6,
            stress: 2,
            notes: None,
        }),
    ]
}

pub fn insights() -> Vec<Insight> {
    let date = seed_date();
    vec![
        Insight {
            id: "1".into(),
            title: "Improved Sleep Quality".into(),
            description: "Your sleep quality improved by 15%".into(),
            category: Category::Sleep,
            priority: Priority::Medium,
            date,
        },
        Insight {
            id: "2".into(),
            title: "Exercise Goal Achieved".into(),
            description: "You met your weekly exercise goal".into(),
            category: Category::Fitness,
            priority: Priority::Low,
            date,
        },
        Insight {
            id: "3".into(),
            title: "Low Vitamin D Risk".into(),
            description: "Your data suggests a potential Vitamin D deficiency".into(),
            category: Category::Nutrition,
            priority: Priority::High,
            date,
        },
    ]
}
