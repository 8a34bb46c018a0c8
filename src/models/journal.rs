use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

use crate::models::exercise::Exercise;
use crate::models::meal::Meal;

/// Days after the journal date during which a closed journal can still be re-closed.
pub const EDITABLE_WINDOW_DAYS: i64 = 2;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, Validate)]
pub struct Journal {
    pub id: Uuid,
    pub patient_id: Uuid,
    pub date: NaiveDate,
    pub closed_at: Option<DateTime<Utc>>,
    #[validate(range(min = 0, max = 49999, message = "must be between 0 and 49999"))]
    pub calories_consumed: Option<i32>,
    #[validate(range(min = 0, max = 49999, message = "must be between 0 and 49999"))]
    pub calories_burned: Option<i32>,
    #[validate(range(min = 1, max = 5, message = "must be between 1 and 5"))]
    pub score: Option<i32>,
    pub feedback_positive: Option<String>,
    pub feedback_improvement: Option<String>,
    pub feeling_today: Option<FeelingToday>,
    pub sleep_quality: Option<Quality>,
    pub hydration_quality: Option<Quality>,
    #[validate(range(min = 0, max = 99999, message = "must be between 0 and 99999"))]
    pub steps_count: Option<i32>,
    pub daily_note: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq)]
#[repr(i32)]
#[serde(rename_all = "lowercase")]
pub enum FeelingToday {
    Bad = 1,
    Ok = 2,
    Good = 3,
}

/// Shared scale for sleep and hydration.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq)]
#[repr(i32)]
#[serde(rename_all = "lowercase")]
pub enum Quality {
    Poor = 1,
    Good = 2,
    Excellent = 3,
}

impl FeelingToday {
    pub fn as_str(self) -> &'static str {
        match self {
            FeelingToday::Bad => "bad",
            FeelingToday::Ok => "ok",
            FeelingToday::Good => "good",
        }
    }
}

impl Quality {
    pub fn as_str(self) -> &'static str {
        match self {
            Quality::Poor => "poor",
            Quality::Good => "good",
            Quality::Excellent => "excellent",
        }
    }

    pub fn is_adequate(self) -> bool {
        !matches!(self, Quality::Poor)
    }
}

/// What the patient reports about the day when closing it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DailyCheckIn {
    pub feeling_today: Option<FeelingToday>,
    pub sleep_quality: Option<Quality>,
    pub hydration_quality: Option<Quality>,
    pub steps_count: Option<i32>,
    pub daily_note: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DayTotals {
    pub calories_consumed: i32,
    pub calories_burned: i32,
    pub exercise_calories: i32,
}

impl DayTotals {
    /// Only confirmed entries count. Without a known BMR nothing is
    /// considered burned.
    pub fn from_entries(meals: &[Meal], exercises: &[Exercise], bmr: Option<i32>) -> Self {
        let calories_consumed = meals
            .iter()
            .filter(|m| !m.status.is_pending())
            .filter_map(|m| m.calories)
            .sum();
        let exercise_calories: i32 = exercises
            .iter()
            .filter(|e| !e.status.is_pending())
            .filter_map(|e| e.calories)
            .sum();
        let calories_burned = bmr.map(|b| b + exercise_calories).unwrap_or(0);

        Self {
            calories_consumed,
            calories_burned,
            exercise_calories,
        }
    }

    pub fn balance(&self) -> i32 {
        self.calories_consumed - self.calories_burned
    }
}

impl Journal {
    pub fn new(patient_id: Uuid, date: NaiveDate) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            patient_id,
            date,
            closed_at: None,
            calories_consumed: None,
            calories_burned: None,
            score: None,
            feedback_positive: None,
            feedback_improvement: None,
            feeling_today: None,
            sleep_quality: None,
            hydration_quality: None,
            steps_count: None,
            daily_note: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_closed(&self) -> bool {
        self.closed_at.is_some()
    }

    pub fn is_open(&self) -> bool {
        self.closed_at.is_none()
    }

    /// A closed journal stays editable until `date + 2 days`.
    pub fn is_editable(&self, today: NaiveDate) -> bool {
        self.is_closed() && today <= self.date + Duration::days(EDITABLE_WINDOW_DAYS)
    }

    /// Open journals and closed journals still inside the editable window
    /// accept changes.
    pub fn accepts_changes(&self, today: NaiveDate) -> bool {
        self.is_open() || self.is_editable(today)
    }

    pub fn apply_close(&mut self, totals: &DayTotals, check_in: &DailyCheckIn, now: DateTime<Utc>) {
        self.calories_consumed = Some(totals.calories_consumed);
        self.calories_burned = Some(totals.calories_burned);
        self.feeling_today = check_in.feeling_today;
        self.sleep_quality = check_in.sleep_quality;
        self.hydration_quality = check_in.hydration_quality;
        self.steps_count = check_in.steps_count;
        self.daily_note = check_in
            .daily_note
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(String::from);
        if self.closed_at.is_none() {
            self.closed_at = Some(now);
        }
        self.updated_at = now;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::entry_status::EntryStatus;
    use crate::models::meal::MealType;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_editable_window() {
        let mut journal = Journal::new(Uuid::new_v4(), date(2026, 2, 5));
        assert!(!journal.is_editable(date(2026, 2, 5)));
        assert!(journal.accepts_changes(date(2026, 3, 1)));

        journal.closed_at = Some(Utc::now());
        assert!(journal.is_editable(date(2026, 2, 7)));
        assert!(!journal.is_editable(date(2026, 2, 8)));
        assert!(!journal.accepts_changes(date(2026, 2, 8)));
    }

    #[test]
    fn test_totals_only_count_confirmed_entries() {
        let journal_id = Uuid::new_v4();
        let mut oats = Meal::new(journal_id, MealType::Breakfast, "Oats");
        oats.calories = Some(350);
        oats.status = EntryStatus::Confirmed;
        let mut cookies = Meal::new(journal_id, MealType::Snack, "Cookies");
        cookies.calories = Some(200);
        cookies.status = EntryStatus::PendingPatient;

        let mut bike = Exercise::new(journal_id, "Bike ride");
        bike.calories = Some(300);
        bike.status = EntryStatus::Confirmed;

        let totals = DayTotals::from_entries(&[oats, cookies], &[bike], Some(1800));
        assert_eq!(totals.calories_consumed, 350);
        assert_eq!(totals.calories_burned, 2100);
        assert_eq!(totals.exercise_calories, 300);
        assert_eq!(totals.balance(), -1750);
    }

    #[test]
    fn test_totals_without_bmr_burn_nothing() {
        let totals = DayTotals::from_entries(&[], &[], None);
        assert_eq!(totals.calories_burned, 0);
    }

    #[test]
    fn test_apply_close_keeps_first_closed_at() {
        let mut journal = Journal::new(Uuid::new_v4(), date(2026, 2, 5));
        let first = Utc::now();
        let totals = DayTotals {
            calories_consumed: 1,
            calories_burned: 2,
            exercise_calories: 0,
        };
        journal.apply_close(&totals, &DailyCheckIn::default(), first);
        journal.apply_close(&totals, &DailyCheckIn::default(), first + Duration::hours(3));

        assert_eq!(journal.closed_at, Some(first));
    }
}
