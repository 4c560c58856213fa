use axum::http::StatusCode;
use axum_test::TestServer;
use learning_portal::{api::*, Database, LearningService};
use serde_json::{json, Value};

async fn create_test_server() -> TestServer {
    let db = Database::new("sqlite::memory:").await.unwrap();
    let learning_service = LearningService::new(db);
    let app_state = AppState { learning_service };

    let app = create_router(app_state);
    TestServer::new(app).unwrap()
}

async fn create_subject(server: &TestServer, name: &str) -> i64 {
    let response = server
        .post("/api/subjects")
        .json(&json!({ "name": name, "description": null }))
        .await;
    response.assert_status_ok();
    let body: Value = response.json();
    body["data"]["id"].as_i64().unwrap()
}

async fn create_lesson(server: &TestServer, subject_id: i64, title: &str, order_index: i64) -> i64 {
    let response = server
        .post("/api/lessons")
        .json(&json!({
            "title": title,
            "description": null,
            "subjectId": subject_id,
            "gradeId": 1,
            "difficulty": "basic",
            "orderIndex": order_index
        }))
        .await;
    response.assert_status_ok();
    let body: Value = response.json();
    body["data"]["id"].as_i64().unwrap()
}

async fn create_simple_quiz(server: &TestServer, subject_id: i64, title: &str) -> (i64, i64, i64) {
    let response = server
        .post("/api/quizzes")
        .json(&json!({
            "title": title,
            "description": null,
            "subjectId": subject_id,
            "gradeId": 1,
            "lessonId": null,
            "quizType": "practice",
            "difficulty": "basic",
            "timeLimitMinutes": null,
            "passingScore": 70,
            "questions": [
                {
                    "text": "Only question",
                    "questionType": "single",
                    "points": 10,
                    "explanation": null,
                    "orderIndex": 0,
                    "options": [
                        { "text": "right", "isCorrect": true, "orderIndex": 0 },
                        { "text": "wrong", "isCorrect": false, "orderIndex": 1 }
                    ]
                }
            ]
        }))
        .await;
    response.assert_status_ok();
    let body: Value = response.json();
    let quiz_id = body["data"]["quiz"]["id"].as_i64().unwrap();
    let question_id = body["data"]["questions"][0]["question"]["id"].as_i64().unwrap();
    let correct_option_id = body["data"]["questions"][0]["options"][0]["id"].as_i64().unwrap();
    (quiz_id, question_id, correct_option_id)
}

async fn submit_answer(
    server: &TestServer,
    user_id: i64,
    quiz_id: i64,
    question_id: i64,
    option_id: i64,
) {
    let response = server
        .post("/api/quizzes/submit")
        .json(&json!({
            "userId": user_id,
            "quizId": quiz_id,
            "answers": [
                { "questionId": question_id, "selectedOptionIds": [option_id] }
            ],
            "timeSpentSeconds": 60
        }))
        .await;
    response.assert_status_ok();
}

async fn update_progress(
    server: &TestServer,
    user_id: i64,
    lesson_id: i64,
    status: &str,
    percentage: i64,
) -> Value {
    let response = server
        .post("/api/progress/update")
        .json(&json!({
            "userId": user_id,
            "lessonId": lesson_id,
            "status": status,
            "completionPercentage": percentage
        }))
        .await;
    response.assert_status_ok();
    response.json()
}

#[tokio::test]
async fn test_progress_update_creates_then_overwrites_record() {
    let server = create_test_server().await;
    let subject_id = create_subject(&server, "Math").await;
    let lesson_id = create_lesson(&server, subject_id, "Fractions", 0).await;

    let body = update_progress(&server, 1, lesson_id, "in_progress", 40).await;
    assert_eq!(body["data"]["status"], "in_progress");
    assert_eq!(body["data"]["completionPercentage"], 40);
    assert!(body["data"]["lastAccessedAt"].is_string());

    // Last write wins on the same (learner, lesson) pair.
    let body = update_progress(&server, 1, lesson_id, "in_progress", 75).await;
    assert_eq!(body["data"]["completionPercentage"], 75);
}

#[tokio::test]
async fn test_progress_completed_status_forces_full_percentage() {
    let server = create_test_server().await;
    let subject_id = create_subject(&server, "Math").await;
    let lesson_id = create_lesson(&server, subject_id, "Decimals", 0).await;

    let body = update_progress(&server, 1, lesson_id, "completed", 10).await;
    assert_eq!(body["data"]["status"], "completed");
    assert_eq!(body["data"]["completionPercentage"], 100);
}

#[tokio::test]
async fn test_progress_update_unknown_lesson_is_404() {
    let server = create_test_server().await;

    let response = server
        .post("/api/progress/update")
        .json(&json!({
            "userId": 1,
            "lessonId": 9999,
            "status": "in_progress",
            "completionPercentage": 50
        }))
        .await;
    response.assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_subject_progress_defaults_and_counts() {
    let server = create_test_server().await;
    let subject_id = create_subject(&server, "Math").await;
    let first = create_lesson(&server, subject_id, "Fractions", 0).await;
    create_lesson(&server, subject_id, "Decimals", 1).await;

    update_progress(&server, 1, first, "completed", 100).await;

    let response = server
        .get(&format!(
            "/api/progress/subject?user_id=1&subject_id={}&grade_id=1",
            subject_id
        ))
        .await;
    response.assert_status_ok();
    let body: Value = response.json();

    assert_eq!(body["data"]["completedLessons"], 1);
    assert_eq!(body["data"]["totalLessons"], 2);

    let lessons = body["data"]["lessonProgress"].as_array().unwrap();
    assert_eq!(lessons.len(), 2);
    // The untouched lesson reports the not-started default.
    assert_eq!(lessons[1]["status"], "not_started");
    assert_eq!(lessons[1]["completionPercentage"], 0);
    assert!(lessons[1]["lastAccessedAt"].is_null());
}

#[tokio::test]
async fn test_overall_progress_rolls_up_subject_activity() {
    let server = create_test_server().await;
    let subject_id = create_subject(&server, "Math").await;
    let first = create_lesson(&server, subject_id, "Fractions", 0).await;
    create_lesson(&server, subject_id, "Decimals", 1).await;
    let (quiz_id, question_id, correct_id) = create_simple_quiz(&server, subject_id, "Check").await;

    update_progress(&server, 1, first, "completed", 100).await;
    submit_answer(&server, 1, quiz_id, question_id, correct_id).await;

    let response = server.get("/api/progress/user?user_id=1").await;
    response.assert_status_ok();
    let body: Value = response.json();

    assert_eq!(body["data"]["completedLessons"], 1);
    assert_eq!(body["data"]["totalLessons"], 2);
    assert_eq!(body["data"]["completedQuizzes"], 1);
    assert_eq!(body["data"]["averageScore"], 100);
    assert_eq!(body["data"]["subjects"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_lesson_recommendations_prioritize_untouched_subject() {
    let server = create_test_server().await;
    let algebra = create_subject(&server, "Algebra").await;
    let biology = create_subject(&server, "Biology").await;

    let algebra_lesson = create_lesson(&server, algebra, "Equations", 0).await;
    create_lesson(&server, algebra, "Inequalities", 1).await;
    create_lesson(&server, biology, "Cells", 0).await;
    create_lesson(&server, biology, "Genetics", 1).await;

    // Half of Algebra done, Biology untouched.
    update_progress(&server, 1, algebra_lesson, "completed", 100).await;

    let response = server
        .get("/api/recommendations/lessons?user_id=1&grade_id=1&limit=4")
        .await;
    response.assert_status_ok();
    let body: Value = response.json();

    let recs = body["data"].as_array().unwrap();
    assert!(!recs.is_empty());
    // Biology has priority 100 and comes first.
    assert_eq!(recs[0]["subjectId"], biology);
    assert_eq!(recs[0]["relevanceScore"], 100.0);
}

#[tokio::test]
async fn test_quiz_recommendations_exclude_unstudied_subjects() {
    let server = create_test_server().await;
    let algebra = create_subject(&server, "Algebra").await;
    let biology = create_subject(&server, "Biology").await;

    let algebra_lesson = create_lesson(&server, algebra, "Equations", 0).await;
    create_lesson(&server, algebra, "Inequalities", 1).await;
    create_lesson(&server, biology, "Cells", 0).await;

    create_simple_quiz(&server, algebra, "Algebra quiz").await;
    create_simple_quiz(&server, biology, "Biology quiz").await;

    // 50% of Algebra studied; Biology untouched (0% < 10% threshold).
    update_progress(&server, 1, algebra_lesson, "completed", 100).await;

    let response = server
        .get("/api/recommendations/quizzes?user_id=1&grade_id=1")
        .await;
    response.assert_status_ok();
    let body: Value = response.json();

    let recs = body["data"].as_array().unwrap();
    assert!(!recs.is_empty());
    for rec in recs {
        assert_eq!(rec["subjectId"], algebra);
    }
}

#[tokio::test]
async fn test_learning_path_bundles_subjects_with_sequences() {
    let server = create_test_server().await;
    let subject_id = create_subject(&server, "Math").await;
    for i in 0..7 {
        create_lesson(&server, subject_id, &format!("Lesson {}", i), i).await;
    }
    create_simple_quiz(&server, subject_id, "Quiz").await;

    let response = server
        .get("/api/recommendations/learning-path?user_id=1&grade_id=1")
        .await;
    response.assert_status_ok();
    let body: Value = response.json();

    assert!(body["data"]["pathId"].is_string());
    let generated = body["data"]["generatedAt"].as_str().unwrap();
    let expires = body["data"]["expiresAt"].as_str().unwrap();
    assert!(expires > generated);

    let subjects = body["data"]["subjects"].as_array().unwrap();
    assert_eq!(subjects.len(), 1);

    // Capped at five lessons, with 1-based sequence numbers.
    let lessons = subjects[0]["recommendedLessons"].as_array().unwrap();
    assert_eq!(lessons.len(), 5);
    assert_eq!(lessons[0]["order"], 1);
    assert_eq!(lessons[4]["order"], 5);

    let quizzes = subjects[0]["recommendedQuizzes"].as_array().unwrap();
    assert_eq!(quizzes.len(), 1);
    assert_eq!(quizzes[0]["order"], 1);
}
