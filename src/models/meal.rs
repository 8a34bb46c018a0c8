use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

use crate::models::entry_status::{EntryStatus, TransitionError};
use crate::services::normalize::MealAnalysis;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, Validate)]
pub struct Meal {
    pub id: Uuid,
    pub journal_id: Uuid,
    pub meal_type: MealType,
    #[validate(length(min = 1, max = 500, message = "must be 1-500 characters"))]
    pub description: String,
    #[validate(range(min = 0, max = 9999, message = "must be between 0 and 9999"))]
    pub proteins: Option<i32>,
    #[validate(range(min = 0, max = 9999, message = "must be between 0 and 9999"))]
    pub carbs: Option<i32>,
    #[validate(range(min = 0, max = 9999, message = "must be between 0 and 9999"))]
    pub fats: Option<i32>,
    #[validate(range(min = 1, max = 49999, message = "must be between 1 and 49999"))]
    pub calories: Option<i32>,
    #[validate(range(min = 1, max = 99999, message = "must be between 1 and 99999"))]
    pub gram_weight: Option<i32>,
    pub ai_comment: Option<String>,
    /// 1 when the analysis judged the meal balanced, 0 otherwise.
    #[validate(range(min = 0, max = 1, message = "must be 0 or 1"))]
    pub feeling: Option<i32>,
    pub status: EntryStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq)]
#[sqlx(type_name = "meal_type", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum MealType {
    Breakfast,
    Lunch,
    Snack,
    Dinner,
}

impl MealType {
    pub fn as_str(self) -> &'static str {
        match self {
            MealType::Breakfast => "breakfast",
            MealType::Lunch => "lunch",
            MealType::Snack => "snack",
            MealType::Dinner => "dinner",
        }
    }
}

impl Default for MealType {
    fn default() -> Self {
        Self::Breakfast
    }
}

/// Fields the patient may correct by hand after analysis.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MealEdits {
    pub meal_type: Option<MealType>,
    pub description: Option<String>,
    pub calories: Option<i32>,
    pub proteins: Option<i32>,
    pub carbs: Option<i32>,
    pub fats: Option<i32>,
    pub gram_weight: Option<i32>,
}

impl Meal {
    pub fn new(journal_id: Uuid, meal_type: MealType, description: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            journal_id,
            meal_type,
            description: description.into(),
            proteins: None,
            carbs: None,
            fats: None,
            calories: None,
            gram_weight: None,
            ai_comment: None,
            feeling: None,
            status: EntryStatus::PendingLlm,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn apply_analysis(&mut self, analysis: &MealAnalysis) -> Result<(), TransitionError> {
        self.status = self.status.analyzed()?;
        self.proteins = Some(analysis.proteins);
        self.carbs = Some(analysis.carbs);
        self.fats = Some(analysis.fats);
        self.calories = Some(analysis.calories);
        self.gram_weight = Some(analysis.gram_weight);
        self.ai_comment = Some(analysis.comment.clone());
        self.feeling = Some(analysis.feeling);
        Ok(())
    }

    pub fn apply_edits(&mut self, edits: MealEdits) {
        if let Some(meal_type) = edits.meal_type {
            self.meal_type = meal_type;
        }
        if let Some(description) = edits.description {
            self.description = description.trim().to_string();
        }
        self.calories = edits.calories.or(self.calories);
        self.proteins = edits.proteins.or(self.proteins);
        self.carbs = edits.carbs.or(self.carbs);
        self.fats = edits.fats.or(self.fats);
        self.gram_weight = edits.gram_weight.or(self.gram_weight);
    }

    /// Copies the analysis-derived fields back from an earlier copy of this entry.
    pub fn restore_analysis_from(&mut self, earlier: &Meal) {
        self.proteins = earlier.proteins;
        self.carbs = earlier.carbs;
        self.fats = earlier.fats;
        self.calories = earlier.calories;
        self.gram_weight = earlier.gram_weight;
        self.ai_comment = earlier.ai_comment.clone();
        self.feeling = earlier.feeling;
        self.status = earlier.status;
    }
}
