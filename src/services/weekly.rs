//! Week-level adherence signals fed into the scoring prompt.

use chrono::{Duration, NaiveDate};
use serde::Serialize;

use crate::models::exercise::Exercise;
use crate::models::journal::{DailyCheckIn, DayTotals, FeelingToday, Journal};
use crate::models::meal::Meal;
use crate::models::patient::Patient;

pub const WEEK_DAYS: i64 = 7;

/// Minimum share of consumed calories that must come from protein.
const PROTEIN_CALORIE_SHARE: f64 = 0.15;
const KCAL_PER_GRAM_PROTEIN: i32 = 4;

const ALCOHOL: &[&str] = &[
    "cerveja", "cervejas", "vinho", "vinhos", "caipirinha", "cachaça", "vodka", "whisky", "gin",
    "chopp", "drink", "drinks", "beer", "beers", "wine", "cocktail",
];
const RED_MEAT: &[&str] = &[
    "carne vermelha", "bife", "picanha", "alcatra", "costela", "maminha", "cupim", "hambúrguer",
    "hamburguer", "steak", "beef", "burger", "red meat", "ribs",
];
const CANDY: &[&str] = &[
    "doce", "doces", "chocolate", "brigadeiro", "bolo", "sorvete", "pudim", "bala", "balas",
    "candy", "cake", "ice cream", "cookie", "cookies", "dessert",
];
const SODA: &[&str] = &[
    "refrigerante", "refri", "coca", "guaraná", "guarana", "soda", "coke", "pepsi",
];
const PROCESSED: &[&str] = &[
    "salsicha", "presunto", "mortadela", "salame", "nuggets", "nugget", "salgadinho", "miojo",
    "bacon", "congelado", "congelada", "sausage", "ham", "chips", "instant noodles", "fast food",
    "frozen",
];

/// One day of the trailing window, with its journal (if any) and the
/// confirmed entries recorded on it.
#[derive(Debug, Clone)]
pub struct DayRecord {
    pub date: NaiveDate,
    pub journal: Option<Journal>,
    pub meals: Vec<Meal>,
    pub exercises: Vec<Exercise>,
}

impl DayRecord {
    fn has_entries(&self) -> bool {
        !self.meals.is_empty() || !self.exercises.is_empty()
    }

    fn meals_mention(&self, keywords: &[&str]) -> bool {
        self.meals.iter().any(|m| mentions_any(&m.description, keywords))
    }

    fn meets_protein_target(&self) -> bool {
        let calories: i32 = self.meals.iter().filter_map(|m| m.calories).sum();
        let proteins: i32 = self.meals.iter().filter_map(|m| m.proteins).sum();
        calories > 0 && f64::from(proteins * KCAL_PER_GRAM_PROTEIN) >= f64::from(calories) * PROTEIN_CALORIE_SHARE
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct WeeklyContext {
    pub days: u32,
    pub days_with_entries: u32,
    pub days_with_alcohol: u32,
    pub days_with_red_meat: u32,
    pub days_with_candy: u32,
    pub days_with_soda: u32,
    pub days_with_processed: u32,
    pub days_meeting_protein: u32,
    pub days_with_exercise: u32,
    pub days_meeting_steps: u32,
    pub days_score_low: u32,
    pub days_quality_sleep: u32,
    pub days_adequate_hydration: u32,
    pub days_feeling_bad: u32,
}

impl WeeklyContext {
    /// First day of the trailing window ending on `date`.
    pub fn window_start(date: NaiveDate) -> NaiveDate {
        date - Duration::days(WEEK_DAYS - 1)
    }

    pub fn from_days(days: &[DayRecord], steps_goal: Option<i32>) -> Self {
        let count = |predicate: &dyn Fn(&DayRecord) -> bool| -> u32 {
            days.iter().filter(|d| predicate(*d)).count() as u32
        };
        let journal_flag = |predicate: &dyn Fn(&Journal) -> bool| -> u32 {
            days.iter()
                .filter_map(|d| d.journal.as_ref())
                .filter(|j| predicate(*j))
                .count() as u32
        };

        Self {
            days: WEEK_DAYS as u32,
            days_with_entries: count(&|d| d.has_entries()),
            days_with_alcohol: count(&|d| d.meals_mention(ALCOHOL)),
            days_with_red_meat: count(&|d| d.meals_mention(RED_MEAT)),
            days_with_candy: count(&|d| d.meals_mention(CANDY)),
            days_with_soda: count(&|d| d.meals_mention(SODA)),
            days_with_processed: count(&|d| d.meals_mention(PROCESSED)),
            days_meeting_protein: count(&|d| d.meets_protein_target()),
            days_with_exercise: count(&|d| !d.exercises.is_empty()),
            days_meeting_steps: journal_flag(&|j| match (j.steps_count, steps_goal) {
                (Some(steps), Some(goal)) => steps >= goal,
                _ => false,
            }),
            days_score_low: journal_flag(&|j| j.score.is_some_and(|s| s <= 3)),
            days_quality_sleep: journal_flag(&|j| j.sleep_quality.is_some_and(|q| q.is_adequate())),
            days_adequate_hydration: journal_flag(&|j| {
                j.hydration_quality.is_some_and(|q| q.is_adequate())
            }),
            days_feeling_bad: journal_flag(&|j| j.feeling_today == Some(FeelingToday::Bad)),
        }
    }
}

/// Keyword match on whole words, case-insensitive. Multi-word keywords
/// match as a phrase.
fn mentions_any(text: &str, keywords: &[&str]) -> bool {
    let words: Vec<String> = text
        .to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(str::to_string)
        .collect();
    let haystack = format!(" {} ", words.join(" "));

    keywords
        .iter()
        .any(|keyword| haystack.contains(&format!(" {} ", keyword)))
}

/// Everything the scoring prompt needs about the day being closed.
#[derive(Debug, Clone)]
pub struct ScoringContext {
    pub date: NaiveDate,
    pub patient: Patient,
    pub totals: DayTotals,
    pub check_in: DailyCheckIn,
    /// Confirmed meals, oldest first.
    pub meals: Vec<Meal>,
    /// Confirmed exercises, oldest first.
    pub exercises: Vec<Exercise>,
    pub week: WeeklyContext,
}
