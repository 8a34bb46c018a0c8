use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use sqlx::PgPool;
use uuid::Uuid;
use validator::Validate;

use crate::db::store::{ClosedDay, JournalStore};
use crate::error::{AppError, AppResult};
use crate::models::exercise::Exercise;
use crate::models::journal::{DailyCheckIn, DayTotals, Journal};
use crate::models::meal::Meal;
use crate::models::patient::Patient;

#[derive(Clone)]
pub struct PgJournalStore {
    pool: PgPool,
}

impl PgJournalStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl JournalStore for PgJournalStore {
    async fn ping(&self) -> AppResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    async fn find_patient_by_user(&self, user_id: Uuid) -> AppResult<Option<Patient>> {
        let patient = sqlx::query_as::<_, Patient>("SELECT * FROM patients WHERE user_id = $1")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(patient)
    }

    async fn find_journal(&self, patient_id: Uuid, date: NaiveDate) -> AppResult<Option<Journal>> {
        let journal = sqlx::query_as::<_, Journal>(
            "SELECT * FROM journals WHERE patient_id = $1 AND date = $2",
        )
        .bind(patient_id)
        .bind(date)
        .fetch_optional(&self.pool)
        .await?;
        Ok(journal)
    }

    async fn find_or_create_journal(&self, patient_id: Uuid, date: NaiveDate) -> AppResult<Journal> {
        // The no-op update makes RETURNING yield the existing row on conflict.
        let journal = sqlx::query_as::<_, Journal>(
            r#"
            INSERT INTO journals (id, patient_id, date)
            VALUES ($1, $2, $3)
            ON CONFLICT (patient_id, date) DO UPDATE SET date = EXCLUDED.date
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(patient_id)
        .bind(date)
        .fetch_one(&self.pool)
        .await?;
        Ok(journal)
    }

    async fn find_journal_by_id(&self, id: Uuid) -> AppResult<Option<Journal>> {
        let journal = sqlx::query_as::<_, Journal>("SELECT * FROM journals WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(journal)
    }

    async fn journals_between(
        &self,
        patient_id: Uuid,
        from: NaiveDate,
        to: NaiveDate,
    ) -> AppResult<Vec<Journal>> {
        let journals = sqlx::query_as::<_, Journal>(
            r#"
            SELECT * FROM journals
            WHERE patient_id = $1 AND date BETWEEN $2 AND $3
            ORDER BY date
            "#,
        )
        .bind(patient_id)
        .bind(from)
        .bind(to)
        .fetch_all(&self.pool)
        .await?;
        Ok(journals)
    }

    async fn close_journal(
        &self,
        journal_id: Uuid,
        check_in: &DailyCheckIn,
        bmr: Option<i32>,
    ) -> AppResult<ClosedDay> {
        let mut tx = self.pool.begin().await?;

        let mut journal =
            sqlx::query_as::<_, Journal>("SELECT * FROM journals WHERE id = $1 FOR UPDATE")
                .bind(journal_id)
                .fetch_optional(&mut *tx)
                .await?
                .ok_or_else(|| AppError::NotFound("Journal not found".into()))?;

        sqlx::query("DELETE FROM meals WHERE journal_id = $1 AND status <> 'confirmed'")
            .bind(journal_id)
            .execute(&mut *tx)
            .await?;

        sqlx::query("DELETE FROM exercises WHERE journal_id = $1 AND status <> 'confirmed'")
            .bind(journal_id)
            .execute(&mut *tx)
            .await?;

        // Locked until commit, so what gets summed is what stays.
        let meals = sqlx::query_as::<_, Meal>(
            "SELECT * FROM meals WHERE journal_id = $1 ORDER BY created_at FOR UPDATE",
        )
        .bind(journal_id)
        .fetch_all(&mut *tx)
        .await?;

        let exercises = sqlx::query_as::<_, Exercise>(
            "SELECT * FROM exercises WHERE journal_id = $1 ORDER BY created_at FOR UPDATE",
        )
        .bind(journal_id)
        .fetch_all(&mut *tx)
        .await?;

        let totals = DayTotals::from_entries(&meals, &exercises, bmr);
        journal.apply_close(&totals, check_in, Utc::now());
        journal.validate()?;

        let journal = sqlx::query_as::<_, Journal>(
            r#"
            UPDATE journals SET
                calories_consumed = $2,
                calories_burned = $3,
                feeling_today = $4,
                sleep_quality = $5,
                hydration_quality = $6,
                steps_count = $7,
                daily_note = $8,
                closed_at = $9,
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(journal.id)
        .bind(journal.calories_consumed)
        .bind(journal.calories_burned)
        .bind(journal.feeling_today)
        .bind(journal.sleep_quality)
        .bind(journal.hydration_quality)
        .bind(journal.steps_count)
        .bind(&journal.daily_note)
        .bind(journal.closed_at)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(ClosedDay {
            journal,
            meals,
            exercises,
            totals,
        })
    }

    async fn save_journal_score(&self, journal: &Journal) -> AppResult<Journal> {
        let saved = sqlx::query_as::<_, Journal>(
            r#"
            UPDATE journals SET
                score = $2,
                feedback_positive = $3,
                feedback_improvement = $4,
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(journal.id)
        .bind(journal.score)
        .bind(&journal.feedback_positive)
        .bind(&journal.feedback_improvement)
        .fetch_one(&self.pool)
        .await?;
        Ok(saved)
    }

    async fn list_meals(&self, journal_id: Uuid) -> AppResult<Vec<Meal>> {
        let meals = sqlx::query_as::<_, Meal>(
            "SELECT * FROM meals WHERE journal_id = $1 ORDER BY created_at",
        )
        .bind(journal_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(meals)
    }

    async fn find_meal(&self, id: Uuid) -> AppResult<Option<Meal>> {
        let meal = sqlx::query_as::<_, Meal>("SELECT * FROM meals WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(meal)
    }

    async fn insert_meal(&self, meal: &Meal) -> AppResult<Meal> {
        let saved = sqlx::query_as::<_, Meal>(
            r#"
            INSERT INTO meals (id, journal_id, meal_type, description, status)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(meal.id)
        .bind(meal.journal_id)
        .bind(meal.meal_type)
        .bind(&meal.description)
        .bind(meal.status)
        .fetch_one(&self.pool)
        .await?;
        Ok(saved)
    }

    async fn update_meal(&self, meal: &Meal) -> AppResult<Meal> {
        let saved = sqlx::query_as::<_, Meal>(
            r#"
            UPDATE meals SET
                meal_type = $2,
                description = $3,
                proteins = $4,
                carbs = $5,
                fats = $6,
                calories = $7,
                gram_weight = $8,
                ai_comment = $9,
                feeling = $10,
                status = $11,
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(meal.id)
        .bind(meal.meal_type)
        .bind(&meal.description)
        .bind(meal.proteins)
        .bind(meal.carbs)
        .bind(meal.fats)
        .bind(meal.calories)
        .bind(meal.gram_weight)
        .bind(&meal.ai_comment)
        .bind(meal.feeling)
        .bind(meal.status)
        .fetch_one(&self.pool)
        .await?;
        Ok(saved)
    }

    async fn delete_meal(&self, id: Uuid) -> AppResult<()> {
        sqlx::query("DELETE FROM meals WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn list_exercises(&self, journal_id: Uuid) -> AppResult<Vec<Exercise>> {
        let exercises = sqlx::query_as::<_, Exercise>(
            "SELECT * FROM exercises WHERE journal_id = $1 ORDER BY created_at",
        )
        .bind(journal_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(exercises)
    }

    async fn find_exercise(&self, id: Uuid) -> AppResult<Option<Exercise>> {
        let exercise = sqlx::query_as::<_, Exercise>("SELECT * FROM exercises WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(exercise)
    }

    async fn insert_exercise(&self, exercise: &Exercise) -> AppResult<Exercise> {
        let saved = sqlx::query_as::<_, Exercise>(
            r#"
            INSERT INTO exercises (id, journal_id, description, status)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(exercise.id)
        .bind(exercise.journal_id)
        .bind(&exercise.description)
        .bind(exercise.status)
        .fetch_one(&self.pool)
        .await?;
        Ok(saved)
    }

    async fn update_exercise(&self, exercise: &Exercise) -> AppResult<Exercise> {
        let saved = sqlx::query_as::<_, Exercise>(
            r#"
            UPDATE exercises SET
                description = $2,
                duration = $3,
                calories = $4,
                neat = $5,
                structured_description = $6,
                status = $7,
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(exercise.id)
        .bind(&exercise.description)
        .bind(exercise.duration)
        .bind(exercise.calories)
        .bind(exercise.neat)
        .bind(&exercise.structured_description)
        .bind(exercise.status)
        .fetch_one(&self.pool)
        .await?;
        Ok(saved)
    }

    async fn delete_exercise(&self, id: Uuid) -> AppResult<()> {
        sqlx::query("DELETE FROM exercises WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
