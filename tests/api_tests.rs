// tests/api_tests.rs

use std::sync::Arc;

use exam_engine::{
    config::Config,
    models::{
        course::{Course, Visibility},
        exam::{Exam, Question, QuestionOption, QuestionType},
        learner::Learner,
    },
    repositories::{ExamStore, MemoryExamStore},
    routes,
    services::notifier::LogNotifier,
    state::AppState,
    utils::jwt::sign_jwt,
};
use serde_json::{Value, json};

const JWT_SECRET: &str = "test_secret_for_integration_tests";

const ADA: i64 = 1; // student, enrolled in the public course
const BOB: i64 = 2; // student, not enrolled anywhere
const INES: i64 = 3; // instructor
const PAT: i64 = 4; // student on the private course allow-list

struct TestApp {
    address: String,
    store: MemoryExamStore,
    client: reqwest::Client,
}

impl TestApp {
    fn token(&self, user_id: i64) -> String {
        let role = if user_id == INES { "instructor" } else { "student" };
        sign_jwt(user_id, role, JWT_SECRET, 600).expect("Failed to sign token")
    }

    async fn get(&self, user_id: i64, path: &str) -> reqwest::Response {
        self.client
            .get(format!("{}{}", self.address, path))
            .bearer_auth(self.token(user_id))
            .send()
            .await
            .expect("Failed to execute request")
    }

    async fn submit(&self, user_id: i64, exam_id: i64, body: Value) -> reqwest::Response {
        self.client
            .post(format!("{}/api/exams/{}/submit", self.address, exam_id))
            .bearer_auth(self.token(user_id))
            .json(&body)
            .send()
            .await
            .expect("Failed to execute request")
    }
}

fn learner(id: i64, username: &str, role: &str) -> Learner {
    Learner {
        id,
        username: username.to_string(),
        email: format!("{username}@example.org"),
        role: role.to_string(),
    }
}

fn option(id: i64, content: &str, position: i32) -> QuestionOption {
    QuestionOption {
        id,
        content: content.to_string(),
        position,
    }
}

fn exam(id: i64, course_id: Option<i64>, start: &str, end: &str) -> Exam {
    Exam {
        id,
        course_id,
        title: format!("Exam {id}"),
        start_date: Some(start.to_string()),
        start_time: Some("00:00".to_string()),
        end_date: Some(end.to_string()),
        end_time: Some("23:59".to_string()),
        duration_minutes: 45,
        total_marks: None,
        is_active: true,
        questions: vec![
            Question {
                id: 1,
                content: "2 + 2 = ?".to_string(),
                question_type: QuestionType::SingleChoice,
                options: vec![option(11, "4", 0), option(12, "5", 1)],
                correct_options: vec![0],
                marks: None,
            },
            Question {
                id: 2,
                content: "Pick the primes".to_string(),
                question_type: QuestionType::MultiChoice,
                options: vec![
                    option(21, "2", 0),
                    option(22, "3", 1),
                    option(23, "4", 2),
                    option(24, "9", 3),
                ],
                correct_options: vec![0, 1],
                marks: Some(2.0),
            },
            Question {
                id: 3,
                content: "Why?".to_string(),
                question_type: QuestionType::FreeText,
                options: vec![],
                correct_options: vec![],
                marks: None,
            },
        ],
    }
}

/// Spawns the app on a random port, backed by a seeded in-memory store.
async fn spawn_app() -> TestApp {
    let store = MemoryExamStore::new();

    store.add_learner(learner(ADA, "ada", "student")).await;
    store.add_learner(learner(BOB, "bob", "student")).await;
    store.add_learner(learner(INES, "ines", "instructor")).await;
    store.add_learner(learner(PAT, "pat", "student")).await;

    store
        .add_course(Course {
            id: 1,
            title: "Arithmetic".to_string(),
            visibility: Visibility::Public,
            allowed_emails: vec![],
        })
        .await;
    store
        .add_course(Course {
            id: 2,
            title: "Seminar".to_string(),
            visibility: Visibility::Private,
            allowed_emails: vec!["PAT@example.org".to_string()],
        })
        .await;
    store.enroll(ADA, 1).await;

    store.add_exam(exam(10, Some(1), "2000-01-01", "2999-12-31")).await;
    store.add_exam(exam(11, Some(1), "2999-01-01", "2999-12-31")).await;
    store.add_exam(exam(12, Some(2), "2000-01-01", "2999-12-31")).await;
    store.add_exam(exam(13, None, "2000-01-01", "2999-12-31")).await;

    let config = Config {
        database_url: "postgres://unused".to_string(),
        jwt_secret: JWT_SECRET.to_string(),
        rust_log: "error".to_string(),
        server_port: 0,
        db_max_connections: 1,
        log_dir: "logs".to_string(),
    };

    let state = AppState {
        store: Arc::new(store.clone()),
        notifier: Arc::new(LogNotifier),
        config,
    };
    let app = routes::create_router(state);

    // Bind to port 0 to get a random available port
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind random port");
    let port = listener.local_addr().unwrap().port();

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    TestApp {
        address: format!("http://127.0.0.1:{}", port),
        store,
        client: reqwest::Client::new(),
    }
}

fn full_marks() -> Value {
    json!({
        "answers": { "1": "4", "2": "2, 3", "3": "Because it adds up" },
        "timeTaken": 300
    })
}

fn find_exam(list: &[Value], id: i64) -> Option<&Value> {
    list.iter().find(|e| e["id"].as_i64() == Some(id))
}

#[tokio::test]
async fn unknown_path_404() {
    let app = spawn_app().await;

    let response = app.get(ADA, "/random_path_that_does_not_exist").await;

    assert_eq!(response.status().as_u16(), 404);
}

#[tokio::test]
async fn missing_or_bad_token_is_401() {
    let app = spawn_app().await;

    let response = app
        .client
        .get(format!("{}/api/exams", app.address))
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status().as_u16(), 401);

    let response = app
        .client
        .get(format!("{}/api/exams", app.address))
        .bearer_auth("not-a-jwt")
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status().as_u16(), 401);
}

#[tokio::test]
async fn learner_listing_is_filtered_and_labelled() {
    let app = spawn_app().await;

    let response = app.get(ADA, "/api/exams").await;
    assert_eq!(response.status().as_u16(), 200);
    let list: Vec<Value> = response.json().await.unwrap();

    let ids: Vec<i64> = list.iter().filter_map(|e| e["id"].as_i64()).collect();
    assert_eq!(ids, vec![10, 11]);

    let open = find_exam(&list, 10).unwrap();
    assert_eq!(open["status"], "active");
    assert_eq!(open["questionCount"], 3);
    assert_eq!(open["totalMarks"], 4.0);
    assert_eq!(open["studentCount"], 0);
    assert_eq!(open["isExpired"], false);
    assert_eq!(open["actions"]["start"]["enabled"], true);
    assert_eq!(open["actions"]["publish"]["enabled"], false);

    let later = find_exam(&list, 11).unwrap();
    assert_eq!(later["status"], "upcoming");
    assert_eq!(later["actions"]["start"]["enabled"], false);
}

#[tokio::test]
async fn instructor_listing_shows_every_course_exam() {
    let app = spawn_app().await;

    let list: Vec<Value> = app.get(INES, "/api/exams").await.json().await.unwrap();

    assert_eq!(list.len(), 3);
    let private = find_exam(&list, 12).unwrap();
    assert_eq!(private["status"], "active");
    assert_eq!(private["actions"]["start"]["enabled"], false);
    assert_eq!(private["actions"]["results"]["enabled"], true);

    // An exam without a course is closed to instructors too.
    assert!(find_exam(&list, 13).is_none());
    let response = app.get(INES, "/api/exams/13").await;
    assert_eq!(response.status().as_u16(), 403);
}

#[tokio::test]
async fn access_check_reports_reason() {
    let app = spawn_app().await;

    let body: Value = app.get(BOB, "/api/exams/10/access").await.json().await.unwrap();
    assert_eq!(body["hasAccess"], false);
    assert_eq!(body["reason"], "not_enrolled");
    assert_eq!(body["hasSubmitted"], false);

    let body: Value = app.get(PAT, "/api/exams/12/access").await.json().await.unwrap();
    assert_eq!(body["hasAccess"], true);
    assert_eq!(body["reason"], "allow_listed");

    let body: Value = app.get(INES, "/api/exams/13/access").await.json().await.unwrap();
    assert_eq!(body["hasAccess"], false);
    assert_eq!(body["reason"], "no_course");
}

#[tokio::test]
async fn exam_detail_hides_answer_key() {
    let app = spawn_app().await;

    let response = app.get(ADA, "/api/exams/10").await;
    assert_eq!(response.status().as_u16(), 200);
    let detail: Value = response.json().await.unwrap();

    assert_eq!(detail["status"], "active");
    let questions = detail["questions"].as_array().unwrap();
    assert_eq!(questions.len(), 3);
    assert_eq!(questions[1]["type"], "multi_choice");
    assert_eq!(questions[1]["options"].as_array().unwrap().len(), 4);
    for question in questions {
        assert!(question.get("correctOptions").is_none());
        assert!(question.get("correct_options").is_none());
    }

    let response = app.get(BOB, "/api/exams/10").await;
    assert_eq!(response.status().as_u16(), 403);
}

#[tokio::test]
async fn submission_flow_allows_exactly_one_attempt() {
    let app = spawn_app().await;

    // 1. First attempt is graded
    let response = app.submit(ADA, 10, full_marks()).await;
    assert_eq!(response.status().as_u16(), 200);
    let receipt: Value = response.json().await.unwrap();
    assert_eq!(receipt["score"], 4.0);
    assert_eq!(receipt["totalMarks"], 4.0);
    assert_eq!(receipt["percentage"], 100.0);
    assert_eq!(receipt["passed"], true);
    assert_eq!(receipt["totalQuestions"], 3);
    assert_eq!(receipt["answeredQuestions"], 3);
    assert_eq!(receipt["completionPercentage"], 100.0);
    assert!(receipt["feedback"].as_str().unwrap().contains("(100%)"));
    assert!(receipt["submittedAt"].is_string());
    let result_id = receipt["resultId"].as_i64().expect("resultId missing");

    // 2. Second attempt is rejected
    let response = app.submit(ADA, 10, full_marks()).await;
    assert_eq!(response.status().as_u16(), 409);
    assert_eq!(app.store.count_results(10).await.unwrap(), 1);

    // 3. The result round-trips by id for its owner only
    let response = app.get(ADA, &format!("/api/results/{}", result_id)).await;
    assert_eq!(response.status().as_u16(), 200);
    let stored: Value = response.json().await.unwrap();
    assert_eq!(stored["examId"], 10);
    assert_eq!(stored["passed"], true);
    assert_eq!(stored["timeTaken"], 300);

    let response = app.get(BOB, &format!("/api/results/{}", result_id)).await;
    assert_eq!(response.status().as_u16(), 404);
    let response = app.get(INES, &format!("/api/results/{}", result_id)).await;
    assert_eq!(response.status().as_u16(), 200);

    // 4. Listing now reflects the attempt
    let list: Vec<Value> = app.get(ADA, "/api/exams").await.json().await.unwrap();
    let done = find_exam(&list, 10).unwrap();
    assert_eq!(done["status"], "completed");
    assert_eq!(done["studentCount"], 1);
    assert_eq!(done["actions"]["results"]["enabled"], true);

    let access: Value = app.get(ADA, "/api/exams/10/access").await.json().await.unwrap();
    assert_eq!(access["hasSubmitted"], true);
}

#[tokio::test]
async fn failing_submission_gets_failure_feedback() {
    let app = spawn_app().await;

    let response = app
        .submit(
            ADA,
            10,
            json!({ "answers": { "1": "5", "2": "2,4" }, "timeTaken": 30 }),
        )
        .await;
    assert_eq!(response.status().as_u16(), 200);
    let receipt: Value = response.json().await.unwrap();

    assert_eq!(receipt["score"], 0.0);
    assert_eq!(receipt["passed"], false);
    assert_eq!(receipt["answeredQuestions"], 2);
    assert_eq!(receipt["completionPercentage"], 66.67);
    assert!(receipt["feedback"].as_str().unwrap().contains("(0%)"));
}

#[tokio::test]
async fn submission_is_rejected_without_access_or_exam() {
    let app = spawn_app().await;

    let response = app.submit(BOB, 10, full_marks()).await;
    assert_eq!(response.status().as_u16(), 403);

    let response = app.submit(ADA, 999, full_marks()).await;
    assert_eq!(response.status().as_u16(), 404);

    let response = app
        .submit(ADA, 10, json!({ "answers": {}, "timeTaken": -5 }))
        .await;
    assert_eq!(response.status().as_u16(), 400);

    assert_eq!(app.store.count_results(10).await.unwrap(), 0);
}
