//! Request/response bodies for the HTTP API.
//!
//! Conventions:
//! - `*Request`  → deserialized from the client JSON body
//! - `*Response` → serialized to the client
//! - Request validation is expressed with `validator` derive macros

use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::models::exercise::{Exercise, ExerciseEdits};
use crate::models::journal::{DailyCheckIn, FeelingToday, Journal, Quality};
use crate::models::meal::{Meal, MealEdits, MealType};

// ============================================================================
// Common
// ============================================================================

#[derive(Debug, Serialize)]
pub struct DeleteResponse {
    pub deleted: bool,
    pub id: Uuid,
}

// ============================================================================
// Journals
// ============================================================================

/// POST /api/journals/:date/close
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(default)]
pub struct CloseJournalRequest {
    pub feeling_today: Option<FeelingToday>,
    pub sleep_quality: Option<Quality>,
    pub hydration_quality: Option<Quality>,
    #[validate(range(min = 0, max = 99999, message = "must be between 0 and 99999"))]
    pub steps_count: Option<i32>,
    #[validate(length(max = 1000, message = "must be at most 1000 characters"))]
    pub daily_note: Option<String>,
}

impl From<CloseJournalRequest> for DailyCheckIn {
    fn from(body: CloseJournalRequest) -> Self {
        DailyCheckIn {
            feeling_today: body.feeling_today,
            sleep_quality: body.sleep_quality,
            hydration_quality: body.hydration_quality,
            steps_count: body.steps_count,
            daily_note: body.daily_note,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CloseJournalResponse {
    pub journal: Journal,
    pub scoring_available: bool,
    pub scoring_error: Option<String>,
}

// ============================================================================
// Meals
// ============================================================================

/// POST /api/journals/:date/meals
#[derive(Debug, Deserialize, Validate)]
pub struct CreateMealRequest {
    pub meal_type: MealType,
    #[validate(length(min = 1, max = 500, message = "must be 1-500 characters"))]
    pub description: String,
}

/// PUT /api/meals/:id
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(default)]
pub struct UpdateMealRequest {
    pub meal_type: Option<MealType>,
    #[validate(length(min = 1, max = 500, message = "must be 1-500 characters"))]
    pub description: Option<String>,
    pub calories: Option<i32>,
    pub proteins: Option<i32>,
    pub carbs: Option<i32>,
    pub fats: Option<i32>,
    pub gram_weight: Option<i32>,
    /// Confirm the entry in the same request.
    pub confirm: bool,
}

impl UpdateMealRequest {
    pub fn into_edits(self) -> (MealEdits, bool) {
        (
            MealEdits {
                meal_type: self.meal_type,
                description: self.description,
                calories: self.calories,
                proteins: self.proteins,
                carbs: self.carbs,
                fats: self.fats,
                gram_weight: self.gram_weight,
            },
            self.confirm,
        )
    }
}

/// POST /api/meals/:id/reprocess
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(default)]
pub struct ReprocessMealRequest {
    pub meal_type: Option<MealType>,
    #[validate(length(min = 1, max = 500, message = "must be 1-500 characters"))]
    pub description: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct MealResponse {
    pub meal: Meal,
    pub analysis_error: Option<String>,
}

// ============================================================================
// Exercises
// ============================================================================

/// POST /api/journals/:date/exercises
#[derive(Debug, Deserialize, Validate)]
pub struct CreateExerciseRequest {
    #[validate(length(min = 1, max = 140, message = "must be 1-140 characters"))]
    pub description: String,
}

/// PUT /api/exercises/:id
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(default)]
pub struct UpdateExerciseRequest {
    #[validate(length(min = 1, max = 140, message = "must be 1-140 characters"))]
    pub description: Option<String>,
    pub duration: Option<i32>,
    pub calories: Option<i32>,
    pub neat: Option<i32>,
    pub structured_description: Option<String>,
    pub confirm: bool,
}

impl UpdateExerciseRequest {
    pub fn into_edits(self) -> (ExerciseEdits, bool) {
        (
            ExerciseEdits {
                description: self.description,
                duration: self.duration,
                calories: self.calories,
                neat: self.neat,
                structured_description: self.structured_description,
            },
            self.confirm,
        )
    }
}

/// POST /api/exercises/:id/reprocess
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(default)]
pub struct ReprocessExerciseRequest {
    #[validate(length(min = 1, max = 140, message = "must be 1-140 characters"))]
    pub description: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ExerciseResponse {
    pub exercise: Exercise,
    pub analysis_error: Option<String>,
}
