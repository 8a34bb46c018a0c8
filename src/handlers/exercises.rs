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
    CreateExerciseRequest, DeleteResponse, ExerciseResponse, ReprocessExerciseRequest,
    UpdateExerciseRequest,
};
use crate::error::AppResult;
use crate::models::exercise::Exercise;
use crate::AppState;

pub async fn create_exercise(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path(date): Path<NaiveDate>,
    Json(body): Json<CreateExerciseRequest>,
) -> AppResult<(StatusCode, Json<ExerciseResponse>)> {
    body.validate()?;

    let outcome = state
        .journals
        .create_exercise(&auth_user, date, &body.description)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(ExerciseResponse {
            exercise: outcome.entry,
            analysis_error: outcome.analysis_error,
        }),
    ))
}

pub async fn get_exercise(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Exercise>> {
    let exercise = state.journals.get_exercise(&auth_user, id).await?;
    Ok(Json(exercise))
}

pub async fn update_exercise(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
    Json(body): Json<UpdateExerciseRequest>,
) -> AppResult<Json<Exercise>> {
    body.validate()?;

    let (edits, confirm) = body.into_edits();
    let exercise = state
        .journals
        .update_exercise(&auth_user, id, edits, confirm)
        .await?;
    Ok(Json(exercise))
}

pub async fn confirm_exercise(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Exercise>> {
    let exercise = state.journals.confirm_exercise(&auth_user, id).await?;
    Ok(Json(exercise))
}

pub async fn reprocess_exercise(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
    body: Option<Json<ReprocessExerciseRequest>>,
) -> AppResult<Json<ExerciseResponse>> {
    let body = body.map(|Json(b)| b).unwrap_or_default();
    body.validate()?;

    let outcome = state
        .journals
        .reprocess_exercise(&auth_user, id, body.description)
        .await?;

    Ok(Json(ExerciseResponse {
        exercise: outcome.entry,
        analysis_error: outcome.analysis_error,
    }))
}

pub async fn delete_exercise(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<DeleteResponse>> {
    state.journals.delete_exercise(&auth_user, id).await?;
    Ok(Json(DeleteResponse { deleted: true, id }))
}
