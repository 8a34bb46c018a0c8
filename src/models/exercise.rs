use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

use crate::models::entry_status::{EntryStatus, TransitionError};
use crate::services::normalize::ExerciseAnalysis;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, Validate)]
pub struct Exercise {
    pub id: Uuid,
    pub journal_id: Uuid,
    #[validate(length(min = 1, max = 140, message = "must be 1-140 characters"))]
    pub description: String,
    #[validate(range(min = 1, max = 1439, message = "must be between 1 and 1439"))]
    pub duration: Option<i32>,
    #[validate(range(min = 0, max = 9999, message = "must be between 0 and 9999"))]
    pub calories: Option<i32>,
    #[validate(range(min = 0, max = 4999, message = "must be between 0 and 4999"))]
    pub neat: Option<i32>,
    #[validate(length(max = 255, message = "must be at most 255 characters"))]
    pub structured_description: Option<String>,
    pub status: EntryStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExerciseEdits {
    pub description: Option<String>,
    pub duration: Option<i32>,
    pub calories: Option<i32>,
    pub neat: Option<i32>,
    pub structured_description: Option<String>,
}

impl Exercise {
    pub fn new(journal_id: Uuid, description: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            journal_id,
            description: description.into(),
            duration: None,
            calories: None,
            neat: None,
            structured_description: None,
            status: EntryStatus::PendingLlm,
            created_at: now,
            updated_at: now,
        }
    }

    /// What the scoring prompt shows for this exercise.
    pub fn display_description(&self) -> &str {
        self.structured_description
            .as_deref()
            .filter(|s| !s.is_empty())
            .unwrap_or(&self.description)
    }

    pub fn apply_analysis(&mut self, analysis: &ExerciseAnalysis) -> Result<(), TransitionError> {
        self.status = self.status.analyzed()?;
        self.duration = Some(analysis.duration);
        self.calories = Some(analysis.calories);
        self.neat = Some(analysis.neat);
        self.structured_description = Some(analysis.structured_description.clone());
        Ok(())
    }

    pub fn apply_edits(&mut self, edits: ExerciseEdits) {
        if let Some(description) = edits.description {
            self.description = description.trim().to_string();
        }
        self.duration = edits.duration.or(self.duration);
        self.calories = edits.calories.or(self.calories);
        self.neat = edits.neat.or(self.neat);
        if let Some(sd) = edits.structured_description {
            self.structured_description = Some(sd.trim().to_string());
        }
    }

    pub fn restore_analysis_from(&mut self, earlier: &Exercise) {
        self.duration = earlier.duration;
        self.calories = earlier.calories;
        self.neat = earlier.neat;
        self.structured_description = earlier.structured_description.clone();
        self.status = earlier.status;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_description_prefers_structured() {
        let mut exercise = Exercise::new(Uuid::new_v4(), "ran a bit");
        assert_eq!(exercise.display_description(), "ran a bit");

        exercise
            .apply_analysis(&ExerciseAnalysis {
                duration: 30,
                calories: 300,
                neat: 0,
                structured_description: "Running, 30 min".into(),
            })
            .unwrap();
        assert_eq!(exercise.display_description(), "Running, 30 min");
        assert_eq!(exercise.status, EntryStatus::PendingPatient);
    }

    #[test]
    fn test_description_limit() {
        let exercise = Exercise::new(Uuid::new_v4(), "x".repeat(141));
        assert!(exercise.validate().is_err());
    }
}
