//! Meal and exercise entries: create, analyze, edit, confirm, reprocess, delete.

use chrono::NaiveDate;
use uuid::Uuid;
use validator::Validate;

use crate::auth::middleware::AuthUser;
use crate::error::{field_messages, AppError, AppResult};
use crate::i18n::{t, Message};
use crate::models::entry_status::ReprocessTicket;
use crate::models::exercise::{Exercise, ExerciseEdits};
use crate::models::journal::Journal;
use crate::models::meal::{Meal, MealEdits, MealType};
use crate::services::analyzer::AnalysisContext;
use crate::services::journals::JournalService;
use crate::services::normalize::AnalysisResult;
use crate::services::prompt::AnalysisInput;

/// An entry plus the localized reason its analysis did not go through, if any.
#[derive(Debug)]
pub struct EntryOutcome<T> {
    pub entry: T,
    pub analysis_error: Option<String>,
}

impl<T> EntryOutcome<T> {
    fn analyzed(entry: T) -> Self {
        Self {
            entry,
            analysis_error: None,
        }
    }

    fn failed(entry: T, reason: String) -> Self {
        Self {
            entry,
            analysis_error: Some(reason),
        }
    }
}

impl JournalService {
    async fn analyze(
        &self,
        user: &AuthUser,
        record_id: Uuid,
        input: AnalysisInput,
    ) -> Result<AnalysisResult, String> {
        let ctx = AnalysisContext {
            user_id: user.id,
            record_id,
            language: user.language,
        };

        self.analyzer
            .run(&input, &ctx)
            .await
            .map_err(|err| err.message().to_string())
    }

    async fn writable_journal_for_date(&self, user: &AuthUser, date: NaiveDate) -> AppResult<Journal> {
        let patient = self.patient_for(user).await?;
        let journal = self.store.find_or_create_journal(patient.id, date).await?;
        Self::ensure_writable(&journal, user)?;
        Ok(journal)
    }

    // ========================================================================
    // Meals
    // ========================================================================

    pub async fn create_meal(
        &self,
        user: &AuthUser,
        date: NaiveDate,
        meal_type: MealType,
        description: &str,
    ) -> AppResult<EntryOutcome<Meal>> {
        let journal = self.writable_journal_for_date(user, date).await?;

        let meal = Meal::new(journal.id, meal_type, description.trim());
        meal.validate()?;
        let meal = self.store.insert_meal(&meal).await?;

        self.analyze_meal(user, meal).await
    }

    /// Runs the analysis on a `pending_llm` meal and stores the result. On
    /// failure the meal is returned untouched with the reason.
    async fn analyze_meal(&self, user: &AuthUser, meal: Meal) -> AppResult<EntryOutcome<Meal>> {
        let input = AnalysisInput::Meal {
            description: meal.description.clone(),
            meal_type: meal.meal_type,
        };

        let analysis = match self.analyze(user, meal.id, input).await {
            Ok(AnalysisResult::Meal(analysis)) => analysis,
            Ok(_) => {
                let reason = t(Message::MealAnalysisUnavailable, user.language);
                return Ok(EntryOutcome::failed(meal, reason.to_string()));
            }
            Err(reason) => return Ok(EntryOutcome::failed(meal, reason)),
        };

        let mut analyzed = meal.clone();
        analyzed.apply_analysis(&analysis)?;
        if let Err(errors) = analyzed.validate() {
            return Ok(EntryOutcome::failed(meal, field_messages(&errors)));
        }

        let saved = self.store.update_meal(&analyzed).await?;
        Ok(EntryOutcome::analyzed(saved))
    }

    /// Meal plus its journal, scoped to the requesting patient.
    async fn owned_meal(&self, user: &AuthUser, id: Uuid) -> AppResult<(Meal, Journal)> {
        let patient = self.patient_for(user).await?;
        let meal = self
            .store
            .find_meal(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Meal not found".into()))?;
        let journal = self
            .owned_journal(&patient, meal.journal_id)
            .await
            .map_err(|_| AppError::NotFound("Meal not found".into()))?;
        Ok((meal, journal))
    }

    pub async fn get_meal(&self, user: &AuthUser, id: Uuid) -> AppResult<Meal> {
        Ok(self.owned_meal(user, id).await?.0)
    }

    pub async fn update_meal(
        &self,
        user: &AuthUser,
        id: Uuid,
        edits: MealEdits,
        confirm: bool,
    ) -> AppResult<Meal> {
        let (mut meal, journal) = self.owned_meal(user, id).await?;
        Self::ensure_writable(&journal, user)?;

        meal.apply_edits(edits);
        if confirm {
            meal.status = meal.status.confirm()?;
        }
        meal.validate()?;

        self.store.update_meal(&meal).await
    }

    pub async fn confirm_meal(&self, user: &AuthUser, id: Uuid) -> AppResult<Meal> {
        self.update_meal(user, id, MealEdits::default(), true).await
    }

    /// Re-run analysis, optionally with a new description or meal type. A
    /// failed run restores the previous status and analysis fields but keeps
    /// the edited text.
    pub async fn reprocess_meal(
        &self,
        user: &AuthUser,
        id: Uuid,
        meal_type: Option<MealType>,
        description: Option<String>,
    ) -> AppResult<EntryOutcome<Meal>> {
        let (mut meal, journal) = self.owned_meal(user, id).await?;
        Self::ensure_writable(&journal, user)?;

        let before = meal.clone();
        meal.apply_edits(MealEdits {
            meal_type,
            description,
            ..Default::default()
        });
        meal.validate()?;

        let ticket = meal.status.begin_reprocess();
        meal.status = ticket.status();
        let pending = self.store.update_meal(&meal).await?;

        match self.analyze_meal(user, pending.clone()).await {
            Ok(outcome) if outcome.analysis_error.is_none() => Ok(outcome),
            Ok(outcome) => {
                let restored = self.rollback_meal(outcome.entry, &before, ticket).await?;
                Ok(EntryOutcome {
                    entry: restored,
                    analysis_error: outcome.analysis_error,
                })
            }
            Err(e) => {
                if let Err(rollback_err) = self.rollback_meal(pending, &before, ticket).await {
                    tracing::error!(meal_id = %id, error = %rollback_err, "Meal reprocess rollback failed");
                }
                Err(e)
            }
        }
    }

    async fn rollback_meal(&self, mut meal: Meal, before: &Meal, ticket: ReprocessTicket) -> AppResult<Meal> {
        meal.restore_analysis_from(before);
        meal.status = ticket.rollback();
        self.store.update_meal(&meal).await
    }

    pub async fn delete_meal(&self, user: &AuthUser, id: Uuid) -> AppResult<()> {
        let (meal, journal) = self.owned_meal(user, id).await?;
        Self::ensure_writable(&journal, user)?;
        self.store.delete_meal(meal.id).await
    }

    // ========================================================================
    // Exercises
    // ========================================================================

    pub async fn create_exercise(
        &self,
        user: &AuthUser,
        date: NaiveDate,
        description: &str,
    ) -> AppResult<EntryOutcome<Exercise>> {
        let journal = self.writable_journal_for_date(user, date).await?;

        let exercise = Exercise::new(journal.id, description.trim());
        exercise.validate()?;
        let exercise = self.store.insert_exercise(&exercise).await?;

        self.analyze_exercise(user, exercise).await
    }

    async fn analyze_exercise(
        &self,
        user: &AuthUser,
        exercise: Exercise,
    ) -> AppResult<EntryOutcome<Exercise>> {
        let input = AnalysisInput::Exercise {
            description: exercise.description.clone(),
        };

        let analysis = match self.analyze(user, exercise.id, input).await {
            Ok(AnalysisResult::Exercise(analysis)) => analysis,
            Ok(_) => {
                let reason = t(Message::ExerciseAnalysisUnavailable, user.language);
                return Ok(EntryOutcome::failed(exercise, reason.to_string()));
            }
            Err(reason) => return Ok(EntryOutcome::failed(exercise, reason)),
        };

        let mut analyzed = exercise.clone();
        analyzed.apply_analysis(&analysis)?;
        if let Err(errors) = analyzed.validate() {
            return Ok(EntryOutcome::failed(exercise, field_messages(&errors)));
        }

        let saved = self.store.update_exercise(&analyzed).await?;
        Ok(EntryOutcome::analyzed(saved))
    }

    async fn owned_exercise(&self, user: &AuthUser, id: Uuid) -> AppResult<(Exercise, Journal)> {
        let patient = self.patient_for(user).await?;
        let exercise = self
            .store
            .find_exercise(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Exercise not found".into()))?;
        let journal = self
            .owned_journal(&patient, exercise.journal_id)
            .await
            .map_err(|_| AppError::NotFound("Exercise not found".into()))?;
        Ok((exercise, journal))
    }

    pub async fn get_exercise(&self, user: &AuthUser, id: Uuid) -> AppResult<Exercise> {
        Ok(self.owned_exercise(user, id).await?.0)
    }

    pub async fn update_exercise(
        &self,
        user: &AuthUser,
        id: Uuid,
        edits: ExerciseEdits,
        confirm: bool,
    ) -> AppResult<Exercise> {
        let (mut exercise, journal) = self.owned_exercise(user, id).await?;
        Self::ensure_writable(&journal, user)?;

        exercise.apply_edits(edits);
        if confirm {
            exercise.status = exercise.status.confirm()?;
        }
        exercise.validate()?;

        self.store.update_exercise(&exercise).await
    }

    pub async fn confirm_exercise(&self, user: &AuthUser, id: Uuid) -> AppResult<Exercise> {
        self.update_exercise(user, id, ExerciseEdits::default(), true)
            .await
    }

    pub async fn reprocess_exercise(
        &self,
        user: &AuthUser,
        id: Uuid,
        description: Option<String>,
    ) -> AppResult<EntryOutcome<Exercise>> {
        let (mut exercise, journal) = self.owned_exercise(user, id).await?;
        Self::ensure_writable(&journal, user)?;

        let before = exercise.clone();
        exercise.apply_edits(ExerciseEdits {
            description,
            ..Default::default()
        });
        exercise.validate()?;

        let ticket = exercise.status.begin_reprocess();
        exercise.status = ticket.status();
        let pending = self.store.update_exercise(&exercise).await?;

        match self.analyze_exercise(user, pending.clone()).await {
            Ok(outcome) if outcome.analysis_error.is_none() => Ok(outcome),
            Ok(outcome) => {
                let restored = self.rollback_exercise(outcome.entry, &before, ticket).await?;
                Ok(EntryOutcome {
                    entry: restored,
                    analysis_error: outcome.analysis_error,
                })
            }
            Err(e) => {
                if let Err(rollback_err) = self.rollback_exercise(pending, &before, ticket).await {
                    tracing::error!(exercise_id = %id, error = %rollback_err, "Exercise reprocess rollback failed");
                }
                Err(e)
            }
        }
    }

    async fn rollback_exercise(
        &self,
        mut exercise: Exercise,
        before: &Exercise,
        ticket: ReprocessTicket,
    ) -> AppResult<Exercise> {
        exercise.restore_analysis_from(before);
        exercise.status = ticket.rollback();
        self.store.update_exercise(&exercise).await
    }

    pub async fn delete_exercise(&self, user: &AuthUser, id: Uuid) -> AppResult<()> {
        let (exercise, journal) = self.owned_exercise(user, id).await?;
        Self::ensure_writable(&journal, user)?;
        self.store.delete_exercise(exercise.id).await
    }
}
