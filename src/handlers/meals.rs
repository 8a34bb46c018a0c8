use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::NaiveDate;
use uuid::Uuid;
use validator::Validate;

use crate::auth::middleware::AuthUser;
use crate::dto::{
    CreateMealRequest, DeleteResponse, MealResponse, ReprocessMealRequest, UpdateMealRequest,
};
use crate::error::AppResult;
use crate::models::meal::Meal;
use crate::AppState;

/// Stores the meal and analyzes it in the same request. An analysis failure
/// still returns 201 with the entry left in `pending_llm`.
pub async fn create_meal(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path(date): Path<NaiveDate>,
    Json(body): Json<CreateMealRequest>,
) -> AppResult<(StatusCode, Json<MealResponse>)> {
    body.validate()?;

    let outcome = state
        .journals
        .create_meal(&auth_user, date, body.meal_type, &body.description)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(MealResponse {
            meal: outcome.entry,
            analysis_error: outcome.analysis_error,
        }),
    ))
}

pub async fn get_meal(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Meal>> {
    let meal = state.journals.get_meal(&auth_user, id).await?;
    Ok(Json(meal))
}

pub async fn update_meal(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
    Json(body): Json<UpdateMealRequest>,
) -> AppResult<Json<Meal>> {
    body.validate()?;

    let (edits, confirm) = body.into_edits();
    let meal = state
        .journals
        .update_meal(&auth_user, id, edits, confirm)
        .await?;
    Ok(Json(meal))
}

pub async fn confirm_meal(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Meal>> {
    let meal = state.journals.confirm_meal(&auth_user, id).await?;
    Ok(Json(meal))
}

pub async fn reprocess_meal(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
    body: Option<Json<ReprocessMealRequest>>,
) -> AppResult<Json<MealResponse>> {
    let body = body.map(|Json(b)| b).unwrap_or_default();
    body.validate()?;

    let outcome = state
        .journals
        .reprocess_meal(&auth_user, id, body.meal_type, body.description)
        .await?;

    Ok(Json(MealResponse {
        meal: outcome.entry,
        analysis_error: outcome.analysis_error,
    }))
}

pub async fn delete_meal(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<DeleteResponse>> {
    state.journals.delete_meal(&auth_user, id).await?;
    Ok(Json(DeleteResponse { deleted: true, id }))
}
