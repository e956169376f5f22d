// src/handlers/exam.rs

use std::sync::Arc;

use axum::{
    Extension, Json,
    extract::{Path, State},
    response::IntoResponse,
};
use chrono::NaiveDateTime;

use crate::{
    error::AppError,
    models::{
        exam::{Exam, ExamDetail, ExamSummary, PublicQuestion},
        exam_result::AccessResponse,
        learner::Learner,
    },
    repositories::ExamStore,
    services::{access, status},
    utils::{jwt::Claims, time::wall_clock_now},
};

/// Resolves the authenticated principal to its learner record.
pub(crate) async fn resolve_viewer(
    store: &dyn ExamStore,
    claims: &Claims,
) -> Result<Learner, AppError> {
    store
        .find_learner(claims.user_id()?)
        .await?
        .ok_or(AppError::NotFound("User not found".to_string()))
}

async fn load_exam(store: &dyn ExamStore, exam_id: i64) -> Result<Exam, AppError> {
    store
        .find_exam(exam_id)
        .await?
        .ok_or(AppError::NotFound("Exam not found".to_string()))
}

/// Builds the enriched view of `exam` for `viewer`.
async fn summarize(
    store: &dyn ExamStore,
    exam: &Exam,
    viewer: &Learner,
    now: NaiveDateTime,
) -> Result<ExamSummary, AppError> {
    let is_instructor = viewer.is_instructor();
    let has_submitted = store.find_result_for(viewer.id, exam.id).await?.is_some();
    let exam_status = status::classify(exam, now, has_submitted, is_instructor);
    let countdown = status::countdown(exam, now);

    Ok(ExamSummary {
        id: exam.id,
        title: exam.title.clone(),
        course_id: exam.course_id,
        start_date: exam.start_date.clone(),
        start_time: exam.start_time.clone(),
        end_date: exam.end_date.clone(),
        end_time: exam.end_time.clone(),
        duration_minutes: exam.duration_minutes,
        question_count: exam.questions.len(),
        total_marks: exam.effective_total_marks(),
        student_count: store.count_results(exam.id).await?,
        status: exam_status,
        countdown_display: countdown.display,
        is_urgent: countdown.is_urgent,
        is_expired: countdown.is_expired,
        actions: status::actions_for(exam_status, exam.is_active, is_instructor),
    })
}

/// Lists the exams the viewer can see, each labelled with its status.
///
/// Only exams the access gate lets through. Instructors pass it for any exam with a course.
pub async fn list_exams(
    State(store): State<Arc<dyn ExamStore>>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let viewer = resolve_viewer(store.as_ref(), &claims).await?;
    let now = wall_clock_now();

    let mut summaries = Vec::new();
    for exam in store.list_exams().await? {
        if !access::may_access(store.as_ref(), &exam, &viewer).await? {
            continue;
        }
        summaries.push(summarize(store.as_ref(), &exam, &viewer, now).await?);
    }

    Ok(Json(summaries))
}

/// Exam detail with questions (answer keys stripped).
pub async fn get_exam(
    State(store): State<Arc<dyn ExamStore>>,
    Extension(claims): Extension<Claims>,
    Path(exam_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let viewer = resolve_viewer(store.as_ref(), &claims).await?;
    let exam = load_exam(store.as_ref(), exam_id).await?;

    if !access::may_access(store.as_ref(), &exam, &viewer).await? {
        return Err(AppError::Forbidden(
            "You do not have access to this exam".to_string(),
        ));
    }

    let summary = summarize(store.as_ref(), &exam, &viewer, wall_clock_now()).await?;
    Ok(Json(ExamDetail {
        summary,
        questions: exam.questions.iter().map(PublicQuestion::from).collect(),
    }))
}

/// Reports whether the viewer may attempt the exam and whether they already did.
pub async fn check_access(
    State(store): State<Arc<dyn ExamStore>>,
    Extension(claims): Extension<Claims>,
    Path(exam_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let viewer = resolve_viewer(store.as_ref(), &claims).await?;
    let exam = load_exam(store.as_ref(), exam_id).await?;

    let decision = access::check_access(store.as_ref(), &exam, &viewer).await?;
    let has_submitted = store.find_result_for(viewer.id, exam.id).await?.is_some();

    Ok(Json(AccessResponse {
        has_access: decision.has_access,
        reason: decision.reason,
        has_submitted,
    }))
}
