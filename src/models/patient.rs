use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Goals and metabolic data the nutritionist keeps for a patient.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Patient {
    pub id: Uuid,
    pub user_id: Uuid,
    pub bmr: Option<i32>,
    pub daily_calorie_goal: Option<i32>,
    pub steps_goal: Option<i32>,
    pub hydration_goal: Option<i32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Patient {
    pub fn new(user_id: Uuid) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            user_id,
            bmr: None,
            daily_calorie_goal: None,
            steps_goal: None,
            hydration_goal: None,
            created_at: now,
            updated_at: now,
        }
    }
}
