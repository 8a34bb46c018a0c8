use axum::{
    extract::{Path, State},
    Extension, Json,
};
use chrono::NaiveDate;
use validator::Validate;

use crate::auth::middleware::AuthUser;
use crate::dto::{CloseJournalRequest, CloseJournalResponse};
use crate::error::AppResult;
use crate::services::journals::JournalView;
use crate::AppState;

pub async fn get_journal(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path(date): Path<NaiveDate>,
) -> AppResult<Json<JournalView>> {
    let view = state.journals.view(&auth_user, date).await?;
    Ok(Json(view))
}

pub async fn close_journal(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path(date): Path<NaiveDate>,
    Json(body): Json<CloseJournalRequest>,
) -> AppResult<Json<CloseJournalResponse>> {
    body.validate()?;

    let outcome = state
        .journals
        .close(&auth_user, date, body.into())
        .await?;

    Ok(Json(CloseJournalResponse {
        journal: outcome.journal,
        scoring_available: outcome.scoring_error.is_none(),
        scoring_error: outcome.scoring_error,
    }))
}
