use async_trait::async_trait;
use chrono::NaiveDate;
use uuid::Uuid;

use crate::error::AppResult;
use crate::models::exercise::Exercise;
use crate::models::journal::{DailyCheckIn, DayTotals, Journal};
use crate::models::meal::Meal;
use crate::models::patient::Patient;

/// A journal as written by [`JournalStore::close_journal`], with the
/// confirmed entries its totals were computed from.
#[derive(Debug, Clone)]
pub struct ClosedDay {
    pub journal: Journal,
    pub meals: Vec<Meal>,
    pub exercises: Vec<Exercise>,
    pub totals: DayTotals,
}

/// Persistence for patients, journals and their entries.
///
/// Entry lists come back oldest first.
#[async_trait]
pub trait JournalStore: Send + Sync {
    async fn ping(&self) -> AppResult<()>;

    async fn find_patient_by_user(&self, user_id: Uuid) -> AppResult<Option<Patient>>;

    async fn find_journal(&self, patient_id: Uuid, date: NaiveDate) -> AppResult<Option<Journal>>;
    async fn find_or_create_journal(&self, patient_id: Uuid, date: NaiveDate) -> AppResult<Journal>;
    async fn find_journal_by_id(&self, id: Uuid) -> AppResult<Option<Journal>>;
    /// Journals dated within `from..=to`.
    async fn journals_between(
        &self,
        patient_id: Uuid,
        from: NaiveDate,
        to: NaiveDate,
    ) -> AppResult<Vec<Journal>>;

    /// In one transaction: deletes the journal's pending entries, totals the
    /// confirmed ones that remain and writes totals, check-in fields and
    /// `closed_at`. Fails with a validation error if the totals are out of
    /// range, leaving everything untouched.
    async fn close_journal(
        &self,
        journal_id: Uuid,
        check_in: &DailyCheckIn,
        bmr: Option<i32>,
    ) -> AppResult<ClosedDay>;
    async fn save_journal_score(&self, journal: &Journal) -> AppResult<Journal>;

    async fn list_meals(&self, journal_id: Uuid) -> AppResult<Vec<Meal>>;
    async fn find_meal(&self, id: Uuid) -> AppResult<Option<Meal>>;
    async fn insert_meal(&self, meal: &Meal) -> AppResult<Meal>;
    async fn update_meal(&self, meal: &Meal) -> AppResult<Meal>;
    async fn delete_meal(&self, id: Uuid) -> AppResult<()>;

    async fn list_exercises(&self, journal_id: Uuid) -> AppResult<Vec<Exercise>>;
    async fn find_exercise(&self, id: Uuid) -> AppResult<Option<Exercise>>;
    async fn insert_exercise(&self, exercise: &Exercise) -> AppResult<Exercise>;
    async fn update_exercise(&self, exercise: &Exercise) -> AppResult<Exercise>;
    async fn delete_exercise(&self, id: Uuid) -> AppResult<()>;
}
