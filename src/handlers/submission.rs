// src/handlers/submission.rs

use std::sync::Arc;

use axum::{
    Extension, Json,
    extract::{Path, State},
    response::IntoResponse,
};
use validator::Validate;

use crate::{
    error::AppError,
    handlers::exam::resolve_viewer,
    models::exam_result::SubmitExamRequest,
    repositories::ExamStore,
    services::access,
    state::AppState,
    utils::jwt::Claims,
};

/// Submits the learner's answers for grading.
///
/// * Requires access to the exam's course.
/// * One graded attempt per learner and exam; a repeat yields 409.
pub async fn submit_exam(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(exam_id): Path<i64>,
    Json(req): Json<SubmitExamRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = req.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let store = state.store.as_ref();
    let learner = resolve_viewer(store, &claims).await?;
    let exam = store
        .find_exam(exam_id)
        .await?
        .ok_or(AppError::NotFound("Exam not found".to_string()))?;

    if !access::may_access(store, &exam, &learner).await? {
        return Err(AppError::Forbidden(
            "You do not have access to this exam".to_string(),
        ));
    }

    let receipt = state
        .coordinator()
        .submit(exam.id, learner.id, req.answers, req.time_taken)
        .await?;

    Ok(Json(receipt))
}

/// Looks up a stored result. Visible to its owner and to instructors.
pub async fn get_result(
    State(store): State<Arc<dyn ExamStore>>,
    Extension(claims): Extension<Claims>,
    Path(result_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let viewer = resolve_viewer(store.as_ref(), &claims).await?;
    let result = store
        .find_result(result_id)
        .await?
        .ok_or(AppError::NotFound("Result not found".to_string()))?;

    if result.user_id != viewer.id && !viewer.is_instructor() {
        return Err(AppError::NotFound("Result not found".to_string()));
    }

    Ok(Json(result))
}
