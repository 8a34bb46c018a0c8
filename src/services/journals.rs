//! Journal lookup and the day-close sequence.

use chrono::{Duration, NaiveDate, Utc};
use serde::Serialize;
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

use crate::auth::middleware::AuthUser;
use crate::db::JournalStore;
use crate::error::{AppError, AppResult};
use crate::i18n::{t, Message};
use crate::models::exercise::Exercise;
use crate::models::journal::{DailyCheckIn, Journal};
use crate::models::meal::Meal;
use crate::models::patient::Patient;
use crate::services::analyzer::{AnalysisContext, Analyzer};
use crate::services::normalize::AnalysisResult;
use crate::services::prompt::AnalysisInput;
use crate::services::weekly::{DayRecord, ScoringContext, WeeklyContext};

#[derive(Clone)]
pub struct JournalService {
    pub(crate) store: Arc<dyn JournalStore>,
    pub(crate) analyzer: Arc<Analyzer>,
}

#[derive(Debug, Serialize)]
pub struct JournalView {
    pub journal: Journal,
    pub meals: Vec<Meal>,
    pub exercises: Vec<Exercise>,
}

#[derive(Debug)]
pub struct CloseOutcome {
    pub journal: Journal,
    /// Localized reason the day could not be scored; the close itself went through.
    pub scoring_error: Option<String>,
}

pub(crate) fn today() -> NaiveDate {
    Utc::now().date_naive()
}

impl JournalService {
    pub fn new(store: Arc<dyn JournalStore>, analyzer: Arc<Analyzer>) -> Self {
        Self { store, analyzer }
    }

    pub(crate) async fn patient_for(&self, user: &AuthUser) -> AppResult<Patient> {
        self.store
            .find_patient_by_user(user.id)
            .await?
            .ok_or(AppError::Forbidden)
    }

    /// Journal that owns an entry, provided it belongs to `patient`.
    pub(crate) async fn owned_journal(&self, patient: &Patient, journal_id: Uuid) -> AppResult<Journal> {
        self.store
            .find_journal_by_id(journal_id)
            .await?
            .filter(|j| j.patient_id == patient.id)
            .ok_or_else(|| AppError::NotFound("Journal not found".into()))
    }

    pub(crate) fn ensure_writable(journal: &Journal, user: &AuthUser) -> AppResult<()> {
        if journal.accepts_changes(today()) {
            Ok(())
        } else {
            Err(AppError::ReadOnly(
                t(Message::JournalReadOnly, user.language).to_string(),
            ))
        }
    }

    pub async fn view(&self, user: &AuthUser, date: NaiveDate) -> AppResult<JournalView> {
        let patient = self.patient_for(user).await?;
        let journal = self.store.find_or_create_journal(patient.id, date).await?;
        let meals = self.store.list_meals(journal.id).await?;
        let exercises = self.store.list_exercises(journal.id).await?;

        Ok(JournalView {
            journal,
            meals,
            exercises,
        })
    }

    /// Close (or re-close) the day: drop pending entries, persist totals and
    /// check-in, then try to score. A scoring failure never undoes the close.
    pub async fn close(
        &self,
        user: &AuthUser,
        date: NaiveDate,
        check_in: DailyCheckIn,
    ) -> AppResult<CloseOutcome> {
        let patient = self.patient_for(user).await?;
        let journal = self.store.find_or_create_journal(patient.id, date).await?;
        Self::ensure_writable(&journal, user)?;

        let closed = self
            .store
            .close_journal(journal.id, &check_in, patient.bmr)
            .await?;

        tracing::info!(
            journal_id = %closed.journal.id,
            user_id = %user.id,
            calories_consumed = closed.totals.calories_consumed,
            calories_burned = closed.totals.calories_burned,
            "Journal closed"
        );

        let week = self
            .weekly_context(&patient, &closed.journal, &closed.meals, &closed.exercises)
            .await?;
        let journal = closed.journal;
        let ctx = ScoringContext {
            date: journal.date,
            patient,
            totals: closed.totals,
            check_in,
            meals: closed.meals,
            exercises: closed.exercises,
            week,
        };

        self.score(user, journal, ctx).await
    }

    async fn score(&self, user: &AuthUser, mut journal: Journal, ctx: ScoringContext) -> AppResult<CloseOutcome> {
        let analysis_ctx = AnalysisContext {
            user_id: user.id,
            record_id: journal.id,
            language: user.language,
        };

        let scored = match self
            .analyzer
            .run(&AnalysisInput::DailyScore(Box::new(ctx)), &analysis_ctx)
            .await
        {
            Ok(AnalysisResult::DailyScore(score)) => score,
            Ok(_) => {
                return Ok(CloseOutcome {
                    journal,
                    scoring_error: Some(t(Message::ScoringUnavailable, user.language).to_string()),
                })
            }
            Err(err) => {
                return Ok(CloseOutcome {
                    journal,
                    scoring_error: Some(err.message().to_string()),
                })
            }
        };

        journal.score = Some(scored.score);
        journal.feedback_positive = Some(scored.feedback_positive);
        journal.feedback_improvement = Some(scored.feedback_improvement);

        if let Err(errors) = journal.validate() {
            return Ok(CloseOutcome {
                journal,
                scoring_error: Some(crate::error::field_messages(&errors)),
            });
        }

        let journal = self.store.save_journal_score(&journal).await?;
        Ok(CloseOutcome {
            journal,
            scoring_error: None,
        })
    }

    /// Trailing week ending on the journal date. The day being closed uses
    /// the entries already loaded; earlier days are read from the store.
    async fn weekly_context(
        &self,
        patient: &Patient,
        current: &Journal,
        meals: &[Meal],
        exercises: &[Exercise],
    ) -> AppResult<WeeklyContext> {
        let from = WeeklyContext::window_start(current.date);
        let journals = self
            .store
            .journals_between(patient.id, from, current.date)
            .await?;

        let mut days = Vec::new();
        let mut date = from;
        while date <= current.date {
            let record = if date == current.date {
                DayRecord {
                    date,
                    journal: Some(current.clone()),
                    meals: meals.to_vec(),
                    exercises: exercises.to_vec(),
                }
            } else {
                match journals.iter().find(|j| j.date == date) {
                    Some(journal) => DayRecord {
                        date,
                        journal: Some(journal.clone()),
                        meals: self.confirmed_meals(journal.id).await?,
                        exercises: self.confirmed_exercises(journal.id).await?,
                    },
                    None => DayRecord {
                        date,
                        journal: None,
                        meals: vec![],
                        exercises: vec![],
                    },
                }
            };
            days.push(record);
            date += Duration::days(1);
        }

        Ok(WeeklyContext::from_days(&days, patient.steps_goal))
    }

    async fn confirmed_meals(&self, journal_id: Uuid) -> AppResult<Vec<Meal>> {
        Ok(self
            .store
            .list_meals(journal_id)
            .await?
            .into_iter()
            .filter(|m| !m.status.is_pending())
            .collect())
    }

    async fn confirmed_exercises(&self, journal_id: Uuid) -> AppResult<Vec<Exercise>> {
        Ok(self
            .store
            .list_exercises(journal_id)
            .await?
            .into_iter()
            .filter(|e| !e.status.is_pending())
            .collect())
    }
}
