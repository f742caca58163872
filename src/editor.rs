//! Log editor surface - receives `openLogModal` requests and turns them into entries
//!
//! The editor holds at most one pending prefill; a newer request replaces an older one.
//! Nothing reaches the store until the user confirms.

use chrono::NaiveDate;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::bus::{BusEvent, DispatchBus, EventName, LogModalRequest, Subscription};
use crate::entry::{
    EntryDraft, EntryId, FitnessLog, FoodItem, Intensity, MealType, NutritionLog, SleepLog,
    WeightLog, WeightUnit, parse_clock, sleep_hours,
};
use crate::error::PrefillError;
use crate::intent::LogSurface;
use crate::store::EntryStore;

pub const VOICE_NOTE: &str = "Added via voice command";
/// kcal per minute of exercise
const CALORIES_PER_MINUTE: u32 = 8;
const DEFAULT_SLEEP_QUALITY: u8 = 5;
const DEFAULT_BED_TIME: &str = "22:00";
const DEFAULT_WAKE_TIME: &str = "06:00";
const DEFAULT_ACTIVITY: &str = "exercise";

type Pending = Arc<Mutex<Option<LogModalRequest>>>;

pub struct LogEditor {
    pending: Pending,
    _subscription: Subscription,
}

impl LogEditor {
    /// Subscribe to log requests on `bus`; dropping the editor unsubscribes
    pub fn attach(bus: &DispatchBus) -> Self {
        let pending: Pending = Arc::default();
        let slot = Arc::clone(&pending);
        let subscription = bus.subscribe(EventName::OpenLogModal, move |event| {
            if let BusEvent::OpenLogModal(request) = event {
                tracing::debug!(surface = %request.surface, "editor opened");
                *lock(&slot) = Some(request.clone());
            }
        });
        Self {
            pending,
            _subscription: subscription,
        }
    }

    pub fn pending(&self) -> Option<LogModalRequest> {
        lock(&self.pending).clone()
    }

    pub fn is_open(&self) -> bool {
        lock(&self.pending).is_some()
    }

    /// Draft the pending prefill would produce, without saving it
    pub fn preview(&self, today: NaiveDate) -> Result<EntryDraft, PrefillError> {
        let pending = lock(&self.pending);
        let request = pending.as_ref().ok_or(PrefillError::NothingPending)?;
        draft_from_prefill(request, today)
    }

    /// Save the pending prefill as a new entry dated `today`
    ///
    /// On error the prefill stays pending so it can be cancelled.
    pub fn confirm(&self, store: &mut EntryStore, today: NaiveDate) -> Result<EntryId, PrefillError> {
        let mut pending = lock(&self.pending);
        let request = pending.as_ref().ok_or(PrefillError::NothingPending)?;
        let draft = draft_from_prefill(request, today)?;
        *pending = None;
        Ok(store.add(draft))
    }

    /// Discard the pending prefill; returns whether there was one
    pub fn cancel(&self) -> bool {
        lock(&self.pending).take().is_some()
    }
}

fn lock(pending: &Mutex<Option<LogModalRequest>>) -> MutexGuard<'_, Option<LogModalRequest>> {
    pending.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Fill in everything a voice command leaves out
pub fn draft_from_prefill(request: &LogModalRequest, today: NaiveDate) -> Result<EntryDraft, PrefillError> {
    let data = &request.data;
    let num = |key: &'static str| data.get(key).and_then(|v| v.as_f64());
    let text = |key: &'static str| data.get(key).and_then(|v| v.as_str());
    let note = Some(VOICE_NOTE.to_string());

    let draft = match request.surface {
        LogSurface::Weight => {
            let weight = num("weight").ok_or(PrefillError::MissingField("weight"))?;
            let unit = match text("unit") {
                None => WeightUnit::Kg,
                Some(u) => WeightUnit::parse(u).ok_or_else(|| PrefillError::InvalidValue {
                    field: "unit",
                    value: u.to_string(),
                })?,
            };
            EntryDraft::Weight(WeightLog {
                date: today,
                weight,
                unit,
                body_fat: None,
                notes: note,
            })
        }
        LogSurface::Workout => {
            let minutes = num("duration").ok_or(PrefillError::MissingField("duration"))?;
            let duration = whole_minutes(minutes)?;
            EntryDraft::Fitness(FitnessLog {
                date: today,
                activity: text("activity").unwrap_or(DEFAULT_ACTIVITY).to_string(),
                duration,
                calories_burned: duration.saturating_mul(CALORIES_PER_MINUTE),
                intensity: Intensity::Medium,
                notes: note,
            })
        }
        LogSurface::Meal => {
            let food = text("food")
                .filter(|f| !f.trim().is_empty())
                .ok_or(PrefillError::MissingField("food"))?;
            let meal = text("mealType").ok_or(PrefillError::MissingField("mealType"))?;
            let meal_type = MealType::parse(meal).ok_or_else(|| PrefillError::InvalidValue {
                field: "mealType",
                value: meal.to_string(),
            })?;
            let item = FoodItem {
                name: food.trim().to_string(),
                serving_size: "1 serving".to_string(),
                calories: 0.0,
                protein: 0.0,
                carbs: 0.0,
                fat: 0.0,
            };
            let mut log = NutritionLog::from_items(today, meal_type, vec![item]);
            log.notes = note;
            EntryDraft::Nutrition(log)
        }
        LogSurface::Sleep => {
            let bed_time = clock_field(text("bedTime"), "bedTime", DEFAULT_BED_TIME)?;
            let wake_time = clock_field(text("wakeTime"), "wakeTime", DEFAULT_WAKE_TIME)?;
            // a spoken bed or wake time is enough to work out the duration
            let duration = match num("duration") {
                Some(hours) => hours,
                None if data.contains_key("bedTime") || data.contains_key("wakeTime") => {
                    sleep_hours(bed_time, wake_time)
                }
                None => return Err(PrefillError::MissingField("duration")),
            };
            let quality = num("quality")
                .map(|q| q.round().clamp(1.0, 10.0) as u8)
                .unwrap_or(DEFAULT_SLEEP_QUALITY);
            EntryDraft::Sleep(SleepLog {
                date: today,
                duration,
                quality,
                bed_time,
                wake_time,
                notes: note,
            })
        }
    };
    Ok(draft)
}

fn whole_minutes(minutes: f64) -> Result<u32, PrefillError> {
    if minutes.is_finite() && (0.0..=u32::MAX as f64).contains(&minutes) {
        Ok(minutes.round() as u32)
    } else {
        Err(PrefillError::InvalidValue {
            field: "duration",
            value: minutes.to_string(),
        })
    }
}

fn clock_field(
    value: Option<&str>,
    field: &'static str,
    default: &'static str,
) -> Result<chrono::NaiveTime, PrefillError> {
    let s = value.unwrap_or(default);
    parse_clock(s).ok_or_else(|| PrefillError::InvalidValue {
        field,
        value: s.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entry::Category;
    use crate::intent::Params;
    use serde_json::json;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 2).unwrap()
    }

    fn request(surface: LogSurface, data: serde_json::Value) -> LogModalRequest {
        let data: Params = serde_json::from_value(data).unwrap();
        LogModalRequest { surface, data }
    }

    #[test]
    fn test_workout_defaults() {
        let draft = draft_from_prefill(
            &request(LogSurface::Workout, json!({"activity": "ran", "duration": 30, "unit": "minutes"})),
            today(),
        )
        .unwrap();
        let EntryDraft::Fitness(log) = draft else {
            panic!("expected fitness draft");
        };
        assert_eq!(log.calories_burned, 240);
        assert_eq!(log.intensity, Intensity::Medium);
        assert_eq!(log.notes.as_deref(), Some(VOICE_NOTE));
        assert_eq!(log.date, today());
    }

    #[test]
    fn test_meal_single_item() {
        let draft = draft_from_prefill(
            &request(LogSurface::Meal, json!({"food": "a banana", "mealType": "breakfast"})),
            today(),
        )
        .unwrap();
        let EntryDraft::Nutrition(log) = draft else {
            panic!("expected nutrition draft");
        };
        assert_eq!(log.meal_type, MealType::Breakfast);
        assert_eq!(log.food_items.len(), 1);
        assert_eq!(log.food_items[0].name, "a banana");
        assert_eq!(log.food_items[0].serving_size, "1 serving");
        assert_eq!(log.totals.calories, 0.0);
    }

    #[test]
    fn test_sleep_defaults() {
        let draft = draft_from_prefill(&request(LogSurface::Sleep, json!({"duration": 8})), today()).unwrap();
        let EntryDraft::Sleep(log) = draft else {
            panic!("expected sleep draft");
        };
        assert_eq!(log.quality, 5);
        assert_eq!(log.bed_time, parse_clock("22:00").unwrap());
        assert_eq!(log.wake_time, parse_clock("06:00").unwrap());

        let draft =
            draft_from_prefill(&request(LogSurface::Sleep, json!({"duration": 7.5, "quality": 7})), today()).unwrap();
        assert!(matches!(draft, EntryDraft::Sleep(SleepLog { quality: 7, .. })));
    }

    #[test]
    fn test_sleep_times_fill_duration() {
        let draft = draft_from_prefill(
            &request(LogSurface::Sleep, json!({"bedTime": "23:30", "wakeTime": "07:15"})),
            today(),
        )
        .unwrap();
        let EntryDraft::Sleep(log) = draft else {
            panic!("expected sleep draft");
        };
        assert_eq!(log.duration, 7.8);
        assert_eq!(log.bed_time, parse_clock("23:30").unwrap());

        // only a wake time: bed time defaults to 22:00
        let draft = draft_from_prefill(&request(LogSurface::Sleep, json!({"wakeTime": "05:00"})), today()).unwrap();
        assert!(matches!(draft, EntryDraft::Sleep(SleepLog { duration: 7.0, .. })));

        // an explicit duration wins over the window
        let draft = draft_from_prefill(
            &request(LogSurface::Sleep, json!({"duration": 6, "bedTime": "23:00", "wakeTime": "07:00"})),
            today(),
        )
        .unwrap();
        assert!(matches!(draft, EntryDraft::Sleep(SleepLog { duration: 6.0, .. })));

        let err = draft_from_prefill(&request(LogSurface::Sleep, json!({"bedTime": "late"})), today());
        assert!(matches!(err, Err(PrefillError::InvalidValue { field: "bedTime", .. })));
        let err = draft_from_prefill(&request(LogSurface::Sleep, json!({"quality": 6})), today());
        assert!(matches!(err, Err(PrefillError::MissingField("duration"))));
    }

    #[test]
    fn test_weight_units() {
        let draft =
            draft_from_prefill(&request(LogSurface::Weight, json!({"weight": 160, "unit": "pounds"})), today()).unwrap();
        assert!(matches!(draft, EntryDraft::Weight(WeightLog { unit: WeightUnit::Lbs, .. })));

        let err = draft_from_prefill(&request(LogSurface::Weight, json!({"weight": 70, "unit": "stone"})), today())
            .unwrap_err();
        assert!(matches!(err, PrefillError::InvalidValue { field: "unit", .. }));

        let err = draft_from_prefill(&request(LogSurface::Weight, json!({})), today()).unwrap_err();
        assert_eq!(err, PrefillError::MissingField("weight"));
    }

    #[test]
    fn test_confirm_adds_and_clears() {
        let bus = DispatchBus::new();
        let editor = LogEditor::attach(&bus);
        let mut store = EntryStore::new();

        assert_eq!(editor.confirm(&mut store, today()), Err(PrefillError::NothingPending));

        bus.publish(BusEvent::OpenLogModal(request(
            LogSurface::Weight,
            json!({"weight": 72.5, "unit": "kg"}),
        )));
        assert!(editor.is_open());

        let id = editor.confirm(&mut store, today()).unwrap();
        assert!(id.starts_with('w'));
        assert!(!editor.is_open());
        assert_eq!(store.len(Category::Weight), 1);
        assert_eq!(store.weights()[0].weight, 72.5);
    }

    #[test]
    fn test_invalid_prefill_stays_pending() {
        let bus = DispatchBus::new();
        let editor = LogEditor::attach(&bus);
        let mut store = EntryStore::new();

        bus.publish(BusEvent::OpenLogModal(request(LogSurface::Meal, json!({"food": "soup"}))));
        assert_eq!(
            editor.confirm(&mut store, today()),
            Err(PrefillError::MissingField("mealType"))
        );
        assert!(editor.is_open());
        assert!(editor.cancel());
        assert!(!editor.cancel());
        assert!(store.is_empty());
    }

    #[test]
    fn test_newer_request_replaces_pending() {
        let bus = DispatchBus::new();
        let editor = LogEditor::attach(&bus);
        bus.publish(BusEvent::OpenLogModal(request(LogSurface::Sleep, json!({"duration": 6}))));
        bus.publish(BusEvent::OpenLogModal(request(LogSurface::Weight, json!({"weight": 70}))));
        assert_eq!(editor.pending().map(|r| r.surface), Some(LogSurface::Weight));
    }

    #[test]
    fn test_drop_unsubscribes() {
        let bus = DispatchBus::new();
        let editor = LogEditor::attach(&bus);
        assert_eq!(bus.subscriber_count(EventName::OpenLogModal), 1);
        drop(editor);
        assert_eq!(bus.subscriber_count(EventName::OpenLogModal), 0);
    }
}
