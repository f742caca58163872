//! Entry store - the in-memory, per-category collections of logged entries
//!
//! Collections are ordered most-recent-first: `add` prepends. Ids are
//! `{prefix}{epoch millis}` and strictly increase within a store, so two adds in the
//! same millisecond still get distinct ids. There is no update in place; `edit`
//! deletes and re-adds, which gives the edited entry a new id.

use chrono::{Days, Months, NaiveDate, Utc};

use crate::entry::{
    Category, Entry, EntryDraft, EntryId, EntryRef, FitnessLog, MoodLog, NutritionLog, SleepLog,
    WeightLog,
};
use crate::seed;

/// Window used by tracker views
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeRange {
    Week,
    Month,
    ThreeMonths,
    SixMonths,
    Year,
    All,
}

impl TimeRange {
    /// First day included in the range, or None for everything
    pub fn start(&self, today: NaiveDate) -> Option<NaiveDate> {
        match self {
            TimeRange::Week => today.checked_sub_days(Days::new(7)),
            TimeRange::Month => today.checked_sub_months(Months::new(1)),
            TimeRange::ThreeMonths => today.checked_sub_months(Months::new(3)),
            TimeRange::SixMonths => today.checked_sub_months(Months::new(6)),
            TimeRange::Year => today.checked_sub_months(Months::new(12)),
            TimeRange::All => None,
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "1w" | "week" => Some(TimeRange::Week),
            "1m" | "month" => Some(TimeRange::Month),
            "3m" => Some(TimeRange::ThreeMonths),
            "6m" => Some(TimeRange::SixMonths),
            "1y" | "year" => Some(TimeRange::Year),
            "all" => Some(TimeRange::All),
            _ => None,
        }
    }
}

#[derive(Debug, Default)]
pub struct EntryStore {
    weights: Vec<Entry<WeightLog>>,
    workouts: Vec<Entry<FitnessLog>>,
    meals: Vec<Entry<NutritionLog>>,
    sleeps: Vec<Entry<SleepLog>>,
    moods: Vec<Entry<MoodLog>>,
    last_stamp: i64,
}

impl EntryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-loaded with the demo entries, in seed order
    pub fn seeded() -> Self {
        let mut store = Self::new();
        // Prepending reverses, so add oldest first
        for draft in seed::entries().into_iter().rev() {
            store.add(draft);
        }
        store
    }

    /// Add a new entry at the front of its category, returns the id it was given
    pub fn add(&mut self, draft: EntryDraft) -> EntryId {
        let category = draft.category();
        let id = self.next_id(category);

        match draft {
            EntryDraft::Weight(log) => self.weights.insert(0, Entry { id: id.clone(), log }),
            EntryDraft::Fitness(log) => self.workouts.insert(0, Entry { id: id.clone(), log }),
            EntryDraft::Nutrition(log) => self.meals.insert(0, Entry { id: id.clone(), log }),
            EntryDraft::Sleep(log) => self.sleeps.insert(0, Entry { id: id.clone(), log }),
            EntryDraft::Mood(log) => self.moods.insert(0, Entry { id: id.clone(), log }),
        }

        tracing::info!(%category, %id, "entry added");
        id
    }

    /// Remove the entry with `id` if present; returns whether anything was removed
    pub fn delete(&mut self, category: Category, id: &str) -> bool {
        let removed = match category {
            Category::Weight => remove_by_id(&mut self.weights, id),
            Category::Fitness => remove_by_id(&mut self.workouts, id),
            Category::Nutrition => remove_by_id(&mut self.meals, id),
            Category::Sleep => remove_by_id(&mut self.sleeps, id),
            Category::Mood => remove_by_id(&mut self.moods, id),
        };

        if removed {
            tracing::info!(%category, id, "entry deleted");
        } else {
            tracing::debug!(%category, id, "delete of missing entry ignored");
        }
        removed
    }

    /// Replace an entry by deleting it and adding `draft` as a new entry.
    ///
    /// The replacement gets a fresh id and moves to the front. Returns None, and
    /// changes nothing, if `id` is not in the draft's category.
    pub fn edit(&mut self, id: &str, draft: EntryDraft) -> Option<EntryId> {
        let category = draft.category();
        if !self.delete(category, id) {
            return None;
        }
        let new_id = self.add(draft);
        tracing::debug!(%category, old = id, new = %new_id, "entry edited");
        Some(new_id)
    }

    pub fn weights(&self) -> &[Entry<WeightLog>] {
        &self.weights
    }

    pub fn workouts(&self) -> &[Entry<FitnessLog>] {
        &self.workouts
    }

    pub fn meals(&self) -> &[Entry<NutritionLog>] {
        &self.meals
    }

    pub fn sleeps(&self) -> &[Entry<SleepLog>] {
        &self.sleeps
    }

    pub fn moods(&self) -> &[Entry<MoodLog>] {
        &self.moods
    }

    /// Entries of one category, most recent first
    pub fn entries(&self, category: Category) -> Vec<EntryRef<'_>> {
        match category {
            Category::Weight => self.weights.iter().map(EntryRef::Weight).collect(),
            Category::Fitness => self.workouts.iter().map(EntryRef::Fitness).collect(),
            Category::Nutrition => self.meals.iter().map(EntryRef::Nutrition).collect(),
            Category::Sleep => self.sleeps.iter().map(EntryRef::Sleep).collect(),
            Category::Mood => self.moods.iter().map(EntryRef::Mood).collect(),
        }
    }

    /// Entries of one category dated inside `range`, counted back from `today`
    pub fn within(&self, category: Category, range: TimeRange, today: NaiveDate) -> Vec<EntryRef<'_>> {
        let start = range.start(today);
        self.entries(category)
            .into_iter()
            .filter(|e| start.is_none_or(|s| e.date() >= s))
            .collect()
    }

    pub fn get(&self, category: Category, id: &str) -> Option<EntryRef<'_>> {
        self.entries(category).into_iter().find(|e| e.id() == id)
    }

    pub fn latest(&self, category: Category) -> Option<EntryRef<'_>> {
        self.entries(category).into_iter().next()
    }

    pub fn len(&self, category: Category) -> usize {
        match category {
            Category::Weight => self.weights.len(),
            Category::Fitness => self.workouts.len(),
            Category::Nutrition => self.meals.len(),
            Category::Sleep => self.sleeps.len(),
            Category::Mood => self.moods.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        Category::ALL.iter().all(|c| self.len(*c) == 0)
    }

    fn next_id(&mut self, category: Category) -> EntryId {
        let now = Utc::now().timestamp_millis();
        let stamp = now.max(self.last_stamp + 1);
        self.last_stamp = stamp;
        format!("{}{}", category.prefix(), stamp)
    }
}

fn remove_by_id<T>(entries: &mut Vec<Entry<T>>, id: &str) -> bool {
    match entries.iter().position(|e| e.id == id) {
        Some(index) => {
            entries.remove(index);
            true
        }
        None => false,
    }
}
