// src/services/access.rs

use serde::Serialize;

use crate::{
    models::{
        course::{Course, Visibility},
        exam::Exam,
        learner::Learner,
    },
    repositories::{ExamStore, StoreError},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessReason {
    /// The exam has no owning course (or it no longer exists).
    NoCourse,
    Instructor,
    AllowListed,
    NotOnAllowList,
    Enrolled,
    NotEnrolled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccessDecision {
    pub has_access: bool,
    pub reason: AccessReason,
}

impl AccessDecision {
    fn granted(reason: AccessReason) -> Self {
        Self {
            has_access: true,
            reason,
        }
    }

    fn denied(reason: AccessReason) -> Self {
        Self {
            has_access: false,
            reason,
        }
    }
}

/// Course-level rule for a learner: private courses check the allow-list,
/// public courses need an active enrollment.
pub fn evaluate(course: &Course, learner: &Learner, enrolled: bool) -> AccessDecision {
    match course.visibility {
        Visibility::Private if course.allows(&learner.email) => {
            AccessDecision::granted(AccessReason::AllowListed)
        }
        Visibility::Private => AccessDecision::denied(AccessReason::NotOnAllowList),
        Visibility::Public if enrolled => AccessDecision::granted(AccessReason::Enrolled),
        Visibility::Public => AccessDecision::denied(AccessReason::NotEnrolled),
    }
}

/// Decides whether `learner` may see and attempt `exam`.
///
/// An exam without a course is never accessible, not even to instructors.
pub async fn check_access(
    store: &dyn ExamStore,
    exam: &Exam,
    learner: &Learner,
) -> Result<AccessDecision, StoreError> {
    let Some(course_id) = exam.course_id else {
        return Ok(AccessDecision::denied(AccessReason::NoCourse));
    };
    let Some(course) = store.find_course(course_id).await? else {
        return Ok(AccessDecision::denied(AccessReason::NoCourse));
    };

    if learner.is_instructor() {
        return Ok(AccessDecision::granted(AccessReason::Instructor));
    }

    let enrolled = match course.visibility {
        Visibility::Public => store.is_enrolled(learner.id, course.id).await?,
        Visibility::Private => false,
    };
    Ok(evaluate(&course, learner, enrolled))
}

pub async fn may_access(
    store: &dyn ExamStore,
    exam: &Exam,
    learner: &Learner,
) -> Result<bool, StoreError> {
    Ok(check_access(store, exam, learner).await?.has_access)
}
