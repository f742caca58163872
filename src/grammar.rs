//! Command grammar - maps a free-form utterance to a typed intent
//!
//! Rules are evaluated in order and the first match wins:
//! 1. Weight    - "log my weight as 72.5 kg"
//! 2. Exercise  - "i ran for 30 minutes"
//! 3. Nutrition - "i ate a banana for breakfast"
//! 4. Sleep     - "i slept for 7.5 hours with good quality"
//! 5. Sleep     - "i slept from 11 pm to 6:30 am" (duration from the window)
//! 6. Mood      - "i am feeling relaxed"
//! 7. Query     - anything mentioning show/display/view
//!
//! A rule whose numeric capture cannot be parsed counts as a non-match and the
//! next rule is tried.

use chrono::NaiveTime;
use regex::{Captures, Regex};
use serde_json::{Value, json};

use crate::entry::sleep_hours;
use crate::intent::{Intent, IntentKind, Params};

const VERB: &str = r"(?:log |record |track )?";

pub type Extractor = fn(&str, &Captures<'_>) -> Option<Params>;

/// A single pattern plus the function that pulls parameters out of a match
pub struct Rule {
    name: &'static str,
    kind: IntentKind,
    pattern: Regex,
    extract: Extractor,
}

impl Rule {
    /// Panics if `pattern` is not a valid regex; rules are built from literals
    pub fn new(name: &'static str, kind: IntentKind, pattern: &str, extract: Extractor) -> Self {
        Self {
            name,
            kind,
            pattern: Regex::new(pattern).expect("grammar pattern must compile"),
            extract,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn kind(&self) -> IntentKind {
        self.kind
    }

    /// Try this rule alone against an already-normalized utterance
    pub fn apply(&self, text: &str) -> Option<Intent> {
        let caps = self.pattern.captures(text)?;
        let data = (self.extract)(text, &caps)?;
        Some(Intent::new(self.kind, data))
    }
}

/// Ordered rule set
pub struct Grammar {
    rules: Vec<Rule>,
}

impl Default for Grammar {
    fn default() -> Self {
        Self::standard()
    }
}

impl Grammar {
    /// The built-in health logging grammar
    pub fn standard() -> Self {
        let rules = vec![
            Rule::new(
                "weight",
                IntentKind::Weight,
                &format!(r"{VERB}(?:my )?weight (?:is |as |of )?(\d+(?:\.\d+)?)\s*(kg|pounds|lbs)?"),
                extract_weight,
            ),
            Rule::new(
                "exercise",
                IntentKind::Exercise,
                &format!(
                    r"{VERB}(?:i )?(ran|walked|cycled|exercised|worked out) for (\d+) ?(minutes?|hours?)"
                ),
                extract_exercise,
            ),
            Rule::new(
                "nutrition",
                IntentKind::Nutrition,
                &format!(r"{VERB}(?:i )?(?:had|ate|consumed) (.+?) for (breakfast|lunch|dinner|snack)"),
                extract_nutrition,
            ),
            Rule::new(
                "sleep",
                IntentKind::Sleep,
                &format!(r"{VERB}(?:i )?slept (?:for )?(\d+(?:\.\d+)?)\s*hours?(?: with (.+) quality)?"),
                extract_sleep,
            ),
            Rule::new(
                "sleep_window",
                IntentKind::Sleep,
                &format!(
                    r"{VERB}(?:i )?slept from (\d{{1,2}})(?::(\d{{2}}))?(?: ?(am|pm))? (?:to|until|till) (\d{{1,2}})(?::(\d{{2}}))?(?: ?(am|pm))?(?: with (.+) quality)?"
                ),
                extract_sleep_window,
            ),
            Rule::new(
                "mood",
                IntentKind::Mood,
                &format!(
                    r"{VERB}(?:i )?(?:am |feel |feeling )(happy|sad|tired|energetic|stressed|relaxed|anxious|calm)"
                ),
                extract_mood,
            ),
            Rule::new("query", IntentKind::Query, r"show|display|view", extract_query),
        ];
        Self { rules }
    }

    /// Build a grammar from an explicit rule list, evaluated in the given order
    pub fn with_rules(rules: Vec<Rule>) -> Self {
        Self { rules }
    }

    pub fn rule_names(&self) -> Vec<&'static str> {
        self.rules.iter().map(Rule::name).collect()
    }

    /// First matching rule's intent, or None when nothing matches
    #[hotpath::measure]
    pub fn evaluate(&self, utterance: &str) -> Option<Intent> {
        let text = normalize(utterance);
        if text.is_empty() {
            return None;
        }

        for rule in &self.rules {
            if let Some(intent) = rule.apply(&text) {
                tracing::debug!(rule = rule.name, "grammar match");
                return Some(intent);
            }
        }
        None
    }

    /// Like `evaluate`, but a miss becomes an `Unrecognized` intent
    pub fn interpret(&self, utterance: &str) -> Intent {
        self.evaluate(utterance).unwrap_or_else(Intent::unrecognized)
    }
}

/// Lower-case and trim an utterance before matching
pub fn normalize(text: &str) -> String {
    text.trim().to_lowercase()
}

/// Map a spoken sleep quality descriptor onto the 1-10 scale
pub fn quality_score(descriptor: &str) -> u8 {
    match descriptor.trim() {
        "excellent" => 10,
        "very good" => 8,
        "good" => 7,
        "okay" => 5,
        "poor" => 3,
        "bad" => 2,
        "terrible" => 1,
        _ => 5,
    }
}

fn finite(value: f64) -> Option<Value> {
    value.is_finite().then(|| json!(value))
}

fn extract_weight(_text: &str, caps: &Captures<'_>) -> Option<Params> {
    let weight: f64 = caps[1].parse().ok()?;
    let unit = caps.get(2).map(|m| m.as_str()).unwrap_or("kg");

    let mut data = Params::new();
    data.insert("weight".into(), finite(weight)?);
    data.insert("unit".into(), json!(unit));
    Some(data)
}

fn extract_exercise(_text: &str, caps: &Captures<'_>) -> Option<Params> {
    let amount: u64 = caps[2].parse().ok()?;
    let minutes = if caps[3].starts_with("hour") {
        amount.checked_mul(60)?
    } else {
        amount
    };

    let mut data = Params::new();
    data.insert("activity".into(), json!(&caps[1]));
    data.insert("duration".into(), json!(minutes));
    data.insert("unit".into(), json!("minutes"));
    Some(data)
}

fn extract_nutrition(_text: &str, caps: &Captures<'_>) -> Option<Params> {
    let mut data = Params::new();
    data.insert("food".into(), json!(caps[1].trim()));
    data.insert("mealType".into(), json!(&caps[2]));
    Some(data)
}

fn extract_sleep(_text: &str, caps: &Captures<'_>) -> Option<Params> {
    let hours: f64 = caps[1].parse().ok()?;

    let mut data = Params::new();
    data.insert("duration".into(), finite(hours)?);
    if let Some(descriptor) = caps.get(2) {
        data.insert("quality".into(), json!(quality_score(descriptor.as_str())));
    }
    Some(data)
}

fn extract_sleep_window(_text: &str, caps: &Captures<'_>) -> Option<Params> {
    let bed = clock_time(caps.get(1)?.as_str(), caps.get(2), caps.get(3))?;
    let wake = clock_time(caps.get(4)?.as_str(), caps.get(5), caps.get(6))?;

    let mut data = Params::new();
    data.insert("duration".into(), finite(sleep_hours(bed, wake))?);
    data.insert("bedTime".into(), json!(bed.format("%H:%M").to_string()));
    data.insert("wakeTime".into(), json!(wake.format("%H:%M").to_string()));
    if let Some(descriptor) = caps.get(7) {
        data.insert("quality".into(), json!(quality_score(descriptor.as_str())));
    }
    Some(data)
}

/// "11" + "pm" -> 23:00; without am/pm the hour is read on a 24 hour clock
fn clock_time(
    hour: &str,
    minute: Option<regex::Match<'_>>,
    meridiem: Option<regex::Match<'_>>,
) -> Option<NaiveTime> {
    let mut hour: u32 = hour.parse().ok()?;
    let minute: u32 = match minute {
        Some(m) => m.as_str().parse().ok()?,
        None => 0,
    };
    match meridiem.map(|m| m.as_str()) {
        Some(_) if hour == 0 || hour > 12 => return None,
        Some("am") if hour == 12 => hour = 0,
        Some("pm") if hour < 12 => hour += 12,
        _ => {}
    }
    NaiveTime::from_hms_opt(hour, minute, 0)
}

fn extract_mood(_text: &str, caps: &Captures<'_>) -> Option<Params> {
    let mut data = Params::new();
    data.insert("mood".into(), json!(&caps[1]));
    data.insert("timestamp".into(), json!(chrono::Utc::now().to_rfc3339()));
    Some(data)
}

fn extract_query(text: &str, _caps: &Captures<'_>) -> Option<Params> {
    let target = ["insights", "progress", "settings"]
        .into_iter()
        .find(|t| text.contains(t))
        .unwrap_or("unknown");

    let mut data = Params::new();
    data.insert("target".into(), json!(target));
    Some(data)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grammar() -> Grammar {
        Grammar::standard()
    }

    #[test]
    fn test_weight_commands() {
        let g = grammar();

        let intent = g.evaluate("log weight 72.5 kg").unwrap();
        assert_eq!(intent.kind, IntentKind::Weight);
        assert_eq!(intent.get_f64("weight"), Some(72.5));
        assert_eq!(intent.get_str("unit"), Some("kg"));

        let intent = g.evaluate("weight is 80").unwrap();
        assert_eq!(intent.get_f64("weight"), Some(80.0));
        assert_eq!(intent.get_str("unit"), Some("kg"));

        let intent = g.evaluate("Record my weight as 160 lbs").unwrap();
        assert_eq!(intent.get_f64("weight"), Some(160.0));
        assert_eq!(intent.get_str("unit"), Some("lbs"));

        let intent = g.evaluate("track weight of 150 pounds").unwrap();
        assert_eq!(intent.get_str("unit"), Some("pounds"));
    }

    #[test]
    fn test_exercise_hours_become_minutes() {
        let g = grammar();

        let intent = g.evaluate("worked out for 1 hour").unwrap();
        assert_eq!(intent.kind, IntentKind::Exercise);
        assert_eq!(intent.get_f64("duration"), Some(60.0));
        assert_eq!(intent.get_str("unit"), Some("minutes"));
        assert_eq!(intent.get_str("activity"), Some("worked out"));

        let intent = g.evaluate("i cycled for 2 hours").unwrap();
        assert_eq!(intent.get_f64("duration"), Some(120.0));

        let intent = g.evaluate("I ran for 30 minutes").unwrap();
        assert_eq!(intent.get_f64("duration"), Some(30.0));
        assert_eq!(intent.get_str("activity"), Some("ran"));
    }

    #[test]
    fn test_nutrition_command() {
        let intent = grammar().evaluate("I ate a banana for breakfast").unwrap();
        assert_eq!(intent.kind, IntentKind::Nutrition);
        assert_eq!(intent.get_str("food"), Some("a banana"));
        assert_eq!(intent.get_str("mealType"), Some("breakfast"));
    }

    #[test]
    fn test_nutrition_food_is_non_greedy() {
        let intent = grammar()
            .evaluate("i had rice for lunch for dinner")
            .unwrap();
        assert_eq!(intent.get_str("food"), Some("rice"));
        assert_eq!(intent.get_str("mealType"), Some("lunch"));
    }

    #[test]
    fn test_sleep_quality() {
        let g = grammar();

        let intent = g.evaluate("I slept for 7.5 hours with good quality").unwrap();
        assert_eq!(intent.kind, IntentKind::Sleep);
        assert_eq!(intent.get_f64("duration"), Some(7.5));
        assert_eq!(intent.get_f64("quality"), Some(7.0));

        let intent = g.evaluate("I slept for 8 hours").unwrap();
        assert_eq!(intent.get_f64("duration"), Some(8.0));
        assert!(intent.data.get("quality").is_none());

        let intent = g.evaluate("slept 6 hours with very good quality").unwrap();
        assert_eq!(intent.get_f64("quality"), Some(8.0));
    }

    #[test]
    fn test_sleep_window() {
        let g = grammar();

        let intent = g.evaluate("I slept from 11 pm to 6:30 am").unwrap();
        assert_eq!(intent.kind, IntentKind::Sleep);
        assert_eq!(intent.get_f64("duration"), Some(7.5));
        assert_eq!(intent.get_str("bedTime"), Some("23:00"));
        assert_eq!(intent.get_str("wakeTime"), Some("06:30"));
        assert!(intent.data.get("quality").is_none());

        let intent = g.evaluate("slept from 22:45 until 7 with poor quality").unwrap();
        assert_eq!(intent.get_f64("duration"), Some(8.3));
        assert_eq!(intent.get_f64("quality"), Some(3.0));

        let intent = g.evaluate("i slept from 12 am to 8 am").unwrap();
        assert_eq!(intent.get_str("bedTime"), Some("00:00"));
        assert_eq!(intent.get_f64("duration"), Some(8.0));

        assert!(g.evaluate("i slept from 13 pm to 6 am").is_none());
        assert!(g.evaluate("i slept from 25 to 6").is_none());
    }

    #[test]
    fn test_unknown_quality_descriptor_is_middling() {
        assert_eq!(quality_score("fantastic"), 5);
        assert_eq!(quality_score("terrible"), 1);
        assert_eq!(quality_score("excellent"), 10);
    }

    #[test]
    fn test_mood_commands() {
        let g = grammar();

        let intent = g.evaluate("i am feeling relaxed").unwrap();
        assert_eq!(intent.kind, IntentKind::Mood);
        assert_eq!(intent.get_str("mood"), Some("relaxed"));
        assert!(intent.get_str("timestamp").is_some());

        let intent = g.evaluate("I feel tired").unwrap();
        assert_eq!(intent.get_str("mood"), Some("tired"));

        assert!(g.evaluate("i am hungry").is_none());
    }

    #[test]
    fn test_query_targets() {
        let g = grammar();

        let intent = g.evaluate("display my progress").unwrap();
        assert_eq!(intent.kind, IntentKind::Query);
        assert_eq!(intent.get_str("target"), Some("progress"));

        let intent = g.evaluate("view the insights").unwrap();
        assert_eq!(intent.get_str("target"), Some("insights"));

        let intent = g.evaluate("show me something").unwrap();
        assert_eq!(intent.get_str("target"), Some("unknown"));
    }

    #[test]
    fn test_unrecognized() {
        let g = grammar();
        assert!(g.evaluate("turn on the lights").is_none());
        assert!(g.evaluate("").is_none());
        assert!(g.evaluate("   ").is_none());
        assert_eq!(g.interpret("turn on the lights").kind, IntentKind::Unrecognized);
    }

    #[test]
    fn test_priority_order() {
        // Matches both weight and query; weight is earlier
        let intent = grammar().evaluate("show weight 70").unwrap();
        assert_eq!(intent.kind, IntentKind::Weight);
    }

    #[test]
    fn test_numeric_overflow_falls_through() {
        // Duration overflows u64, so the exercise rule yields nothing and the
        // query rule still gets a chance
        let intent = grammar()
            .evaluate("i ran for 99999999999999999999999 minutes, show progress")
            .unwrap();
        assert_eq!(intent.kind, IntentKind::Query);

        assert!(grammar().evaluate("i ran for 99999999999999999999999 minutes").is_none());
    }

    #[test]
    fn test_rule_order_is_inspectable() {
        assert_eq!(
            grammar().rule_names(),
            vec!["weight", "exercise", "nutrition", "sleep", "sleep_window", "mood", "query"]
        );
    }

    #[test]
    fn test_custom_rule_list() {
        let g = Grammar::with_rules(vec![Rule::new(
            "query",
            IntentKind::Query,
            r"show",
            extract_query,
        )]);
        assert!(g.evaluate("log weight 70").is_none());
        assert_eq!(g.evaluate("show settings").unwrap().get_str("target"), Some("settings"));
    }
}
