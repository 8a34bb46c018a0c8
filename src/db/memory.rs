use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use std::collections::HashMap;
use std::sync::Mutex;
use uuid::Uuid;
use validator::Validate;

use crate::db::store::{ClosedDay, JournalStore};
use crate::error::{AppError, AppResult};
use crate::models::exercise::Exercise;
use crate::models::journal::{DailyCheckIn, DayTotals, Journal};
use crate::models::meal::Meal;
use crate::models::patient::Patient;

/// HashMap-backed store for tests.
#[derive(Default)]
pub struct MemoryJournalStore {
    patients: Mutex<HashMap<Uuid, Patient>>,
    journals: Mutex<HashMap<Uuid, Journal>>,
    meals: Mutex<HashMap<Uuid, Meal>>,
    exercises: Mutex<HashMap<Uuid, Exercise>>,
    /// Meal writes that land while the next close is in flight.
    writes_during_close: Mutex<Vec<Meal>>,
    /// Entry updates left before one fails.
    updates_before_failure: Mutex<Option<usize>>,
}

impl MemoryJournalStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_patient(&self, patient: Patient) {
        self.patients.lock().unwrap().insert(patient.id, patient);
    }

    pub fn add_journal(&self, journal: Journal) {
        self.journals.lock().unwrap().insert(journal.id, journal);
    }

    pub fn add_meal(&self, meal: Meal) {
        self.meals.lock().unwrap().insert(meal.id, meal);
    }

    pub fn add_exercise(&self, exercise: Exercise) {
        self.exercises.lock().unwrap().insert(exercise.id, exercise);
    }

    /// Stores `meal` after the next `close_journal` has been called but
    /// before it touches any entry, like a write committed by another request.
    pub fn write_meal_during_close(&self, meal: Meal) {
        self.writes_during_close.lock().unwrap().push(meal);
    }

    /// Makes the `n`th entry update from now (1-based) fail.
    pub fn fail_nth_update(&self, n: usize) {
        *self.updates_before_failure.lock().unwrap() = n.checked_sub(1);
    }

    fn next_update(&self) -> AppResult<()> {
        let mut remaining = self.updates_before_failure.lock().unwrap();
        match *remaining {
            Some(0) => {
                *remaining = None;
                Err(AppError::Internal(anyhow::anyhow!("update failed")))
            }
            Some(n) => {
                *remaining = Some(n - 1);
                Ok(())
            }
            None => Ok(()),
        }
    }
}

fn missing(what: &str) -> AppError {
    AppError::NotFound(format!("{} not found", what))
}

#[async_trait]
impl JournalStore for MemoryJournalStore {
    async fn ping(&self) -> AppResult<()> {
        Ok(())
    }

    async fn find_patient_by_user(&self, user_id: Uuid) -> AppResult<Option<Patient>> {
        Ok(self
            .patients
            .lock()
            .unwrap()
            .values()
            .find(|p| p.user_id == user_id)
            .cloned())
    }

    async fn find_journal(&self, patient_id: Uuid, date: NaiveDate) -> AppResult<Option<Journal>> {
        Ok(self
            .journals
            .lock()
            .unwrap()
            .values()
            .find(|j| j.patient_id == patient_id && j.date == date)
            .cloned())
    }

    async fn find_or_create_journal(&self, patient_id: Uuid, date: NaiveDate) -> AppResult<Journal> {
        let mut journals = self.journals.lock().unwrap();
        if let Some(existing) = journals
            .values()
            .find(|j| j.patient_id == patient_id && j.date == date)
        {
            return Ok(existing.clone());
        }

        let journal = Journal::new(patient_id, date);
        journals.insert(journal.id, journal.clone());
        Ok(journal)
    }

    async fn find_journal_by_id(&self, id: Uuid) -> AppResult<Option<Journal>> {
        Ok(self.journals.lock().unwrap().get(&id).cloned())
    }

    async fn journals_between(
        &self,
        patient_id: Uuid,
        from: NaiveDate,
        to: NaiveDate,
    ) -> AppResult<Vec<Journal>> {
        let mut found: Vec<Journal> = self
            .journals
            .lock()
            .unwrap()
            .values()
            .filter(|j| j.patient_id == patient_id && j.date >= from && j.date <= to)
            .cloned()
            .collect();
        found.sort_by_key(|j| j.date);
        Ok(found)
    }

    async fn close_journal(
        &self,
        journal_id: Uuid,
        check_in: &DailyCheckIn,
        bmr: Option<i32>,
    ) -> AppResult<ClosedDay> {
        let mut journals = self.journals.lock().unwrap();
        let mut meals = self.meals.lock().unwrap();
        let mut exercises = self.exercises.lock().unwrap();

        for meal in self.writes_during_close.lock().unwrap().drain(..) {
            meals.insert(meal.id, meal);
        }

        let stored = journals.get_mut(&journal_id).ok_or_else(|| missing("Journal"))?;

        let mut kept_meals: Vec<Meal> = meals
            .values()
            .filter(|m| m.journal_id == journal_id && !m.status.is_pending())
            .cloned()
            .collect();
        kept_meals.sort_by_key(|m| m.created_at);
        let mut kept_exercises: Vec<Exercise> = exercises
            .values()
            .filter(|e| e.journal_id == journal_id && !e.status.is_pending())
            .cloned()
            .collect();
        kept_exercises.sort_by_key(|e| e.created_at);

        let totals = DayTotals::from_entries(&kept_meals, &kept_exercises, bmr);
        let mut closed = stored.clone();
        closed.apply_close(&totals, check_in, Utc::now());
        closed.validate()?;

        meals.retain(|_, m| m.journal_id != journal_id || !m.status.is_pending());
        exercises.retain(|_, e| e.journal_id != journal_id || !e.status.is_pending());
        *stored = closed.clone();

        Ok(ClosedDay {
            journal: closed,
            meals: kept_meals,
            exercises: kept_exercises,
            totals,
        })
    }

    async fn save_journal_score(&self, journal: &Journal) -> AppResult<Journal> {
        let mut journals = self.journals.lock().unwrap();
        let stored = journals.get_mut(&journal.id).ok_or_else(|| missing("Journal"))?;

        stored.score = journal.score;
        stored.feedback_positive = journal.feedback_positive.clone();
        stored.feedback_improvement = journal.feedback_improvement.clone();
        stored.updated_at = Utc::now();

        Ok(stored.clone())
    }

    async fn list_meals(&self, journal_id: Uuid) -> AppResult<Vec<Meal>> {
        let mut meals: Vec<Meal> = self
            .meals
            .lock()
            .unwrap()
            .values()
            .filter(|m| m.journal_id == journal_id)
            .cloned()
            .collect();
        meals.sort_by_key(|m| m.created_at);
        Ok(meals)
    }

    async fn find_meal(&self, id: Uuid) -> AppResult<Option<Meal>> {
        Ok(self.meals.lock().unwrap().get(&id).cloned())
    }

    async fn insert_meal(&self, meal: &Meal) -> AppResult<Meal> {
        self.meals.lock().unwrap().insert(meal.id, meal.clone());
        Ok(meal.clone())
    }

    async fn update_meal(&self, meal: &Meal) -> AppResult<Meal> {
        self.next_update()?;
        let mut meals = self.meals.lock().unwrap();
        let stored = meals.get_mut(&meal.id).ok_or_else(|| missing("Meal"))?;
        *stored = meal.clone();
        stored.updated_at = Utc::now();
        Ok(stored.clone())
    }

    async fn delete_meal(&self, id: Uuid) -> AppResult<()> {
        self.meals.lock().unwrap().remove(&id);
        Ok(())
    }

    async fn list_exercises(&self, journal_id: Uuid) -> AppResult<Vec<Exercise>> {
        let mut exercises: Vec<Exercise> = self
            .exercises
            .lock()
            .unwrap()
            .values()
            .filter(|e| e.journal_id == journal_id)
            .cloned()
            .collect();
        exercises.sort_by_key(|e| e.created_at);
        Ok(exercises)
    }

    async fn find_exercise(&self, id: Uuid) -> AppResult<Option<Exercise>> {
        Ok(self.exercises.lock().unwrap().get(&id).cloned())
    }

    async fn insert_exercise(&self, exercise: &Exercise) -> AppResult<Exercise> {
        self.exercises
            .lock()
            .unwrap()
            .insert(exercise.id, exercise.clone());
        Ok(exercise.clone())
    }

    async fn update_exercise(&self, exercise: &Exercise) -> AppResult<Exercise> {
        self.next_update()?;
        let mut exercises = self.exercises.lock().unwrap();
        let stored = exercises
            .get_mut(&exercise.id)
            .ok_or_else(|| missing("Exercise"))?;
        *stored = exercise.clone();
        stored.updated_at = Utc::now();
        Ok(stored.clone())
    }

    async fn delete_exercise(&self, id: Uuid) -> AppResult<()> {
        self.exercises.lock().unwrap().remove(&id);
        Ok(())
    }
}
