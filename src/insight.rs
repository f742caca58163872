//! Read-only health insights

use chrono::NaiveDate;
use serde::Serialize;
use std::fmt;

use crate::entry::Category;
use crate::seed;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    Medium,
    High,
}

impl Priority {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "low" => Some(Priority::Low),
            "medium" => Some(Priority::Medium),
            "high" => Some(Priority::High),
            _ => None,
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Priority::Low => write!(f, "low"),
            Priority::Medium => write!(f, "medium"),
            Priority::High => write!(f, "high"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Insight {
    pub id: String,
    pub title: String,
    pub description: String,
    #[serde(rename = "type")]
    pub category: Category,
    pub priority: Priority,
    pub date: NaiveDate,
}

/// Fixed set of insights with simple filtering
#[derive(Debug, Clone)]
pub struct InsightFeed {
    insights: Vec<Insight>,
}

impl Default for InsightFeed {
    fn default() -> Self {
        Self::new(seed::insights())
    }
}

impl InsightFeed {
    pub fn new(insights: Vec<Insight>) -> Self {
        Self { insights }
    }

    pub fn all(&self) -> &[Insight] {
        &self.insights
    }

    /// Insights matching `category` (any if None) with at least `min_priority`
    pub fn filter(&self, category: Option<Category>, min_priority: Priority) -> Vec<&Insight> {
        self.insights
            .iter()
            .filter(|i| category.is_none_or(|c| i.category == c))
            .filter(|i| i.priority >= min_priority)
            .collect()
    }
}
