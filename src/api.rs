use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};

use crate::{
    errors::{classify_database_error, ApiError, ErrorContext},
    learning_service::LearningService,
    models::*,
};

// Import logging macros
use crate::{log_api_error, log_api_start, log_api_success, log_api_warn};

const DEFAULT_RECOMMENDATION_LIMIT: usize = 5;

#[derive(Clone)]
pub struct AppState {
    pub learning_service: LearningService,
}

#[derive(Deserialize)]
pub struct SubjectsParams {
    pub grade_id: Option<i64>,
}

#[derive(Deserialize)]
pub struct CatalogParams {
    pub subject_id: i64,
    pub grade_id: i64,
}

#[derive(Deserialize)]
pub struct LearnerParams {
    pub user_id: i64,
}

#[derive(Deserialize)]
pub struct SubjectProgressParams {
    pub user_id: i64,
    pub subject_id: i64,
    pub grade_id: i64,
}

#[derive(Deserialize)]
pub struct RecommendationParams {
    pub user_id: i64,
    pub grade_id: i64,
    pub limit: Option<usize>,
}

#[derive(Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn error(message: String) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message),
        }
    }
}

// Learner endpoints
pub async fn create_user(
    State(state): State<AppState>,
    Json(request): Json<CreateLearnerRequest>,
) -> Result<Json<ApiResponse<Learner>>, (StatusCode, Json<ApiResponse<()>>)> {
    info!(username = %request.username, "Creating new learner");

    match state.learning_service.create_learner(request.clone()).await {
        Ok(learner) => {
            info!(learner_id = %learner.id, "Learner created successfully");
            Ok(Json(ApiResponse::success(learner)))
        }
        Err(e) => {
            let classified_error = classify_database_error(&e);
            let context = ErrorContext::new("create_user", "learner").with_id(&request.username);
            Err(classified_error.to_response_with_context(context))
        }
    }
}

pub async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<Learner>>, (StatusCode, Json<ApiResponse<()>>)> {
    log_api_start!("get_user", learner_id = id);

    match state.learning_service.get_learner(id).await {
        Ok(Some(learner)) => {
            log_api_success!("get_user", learner_id = id, "learner retrieved successfully");
            Ok(Json(ApiResponse::success(learner)))
        }
        Ok(None) => {
            log_api_warn!("get_user", "learner not found");
            let error = ApiError::NotFound(format!("Learner with ID '{}' not found", id));
            let context = ErrorContext::new("get_user", "learner").with_id(&id.to_string());
            Err(error.to_response_with_context(context))
        }
        Err(e) => {
            log_api_error!("get_user", learner_id = id, error = e, "database error retrieving learner");
            let error = ApiError::DatabaseError(e);
            let context = ErrorContext::new("get_user", "learner").with_id(&id.to_string());
            Err(error.to_response_with_context(context))
        }
    }
}

// Grade endpoints
pub async fn get_grades(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<Grade>>>, StatusCode> {
    match state.learning_service.get_grades().await {
        Ok(grades) => Ok(Json(ApiResponse::success(grades))),
        Err(e) => {
            error!(error = %e, "Error getting grades");
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

pub async fn create_grade(
    State(state): State<AppState>,
    Json(request): Json<CreateGradeRequest>,
) -> Result<Json<ApiResponse<Grade>>, (StatusCode, Json<ApiResponse<()>>)> {
    match state.learning_service.create_grade(request.name).await {
        Ok(grade) => Ok(Json(ApiResponse::success(grade))),
        Err(e) => {
            let classified_error = classify_database_error(&e);
            let context = ErrorContext::new("create_grade", "grade");
            Err(classified_error.to_response_with_context(context))
        }
    }
}

// Subject endpoints
pub async fn get_subjects(
    State(state): State<AppState>,
    Query(params): Query<SubjectsParams>,
) -> Result<Json<ApiResponse<Vec<Subject>>>, StatusCode> {
    debug!(grade_id = ?params.grade_id, "Getting subjects");

    match state.learning_service.get_subjects(params.grade_id).await {
        Ok(subjects) => {
            debug!(subject_count = subjects.len(), "Subjects retrieved successfully");
            Ok(Json(ApiResponse::success(subjects)))
        }
        Err(e) => {
            error!(error = %e, "Error getting subjects");
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

pub async fn create_subject(
    State(state): State<AppState>,
    Json(request): Json<CreateSubjectRequest>,
) -> Result<Json<ApiResponse<Subject>>, (StatusCode, Json<ApiResponse<()>>)> {
    info!(name = %request.name, "Creating subject");

    match state.learning_service.create_subject(request.clone()).await {
        Ok(subject) => Ok(Json(ApiResponse::success(subject))),
        Err(e) => {
            let classified_error = classify_database_error(&e);
            let context = ErrorContext::new("create_subject", "subject").with_id(&request.name);
            Err(classified_error.to_response_with_context(context))
        }
    }
}

// Lesson endpoints
pub async fn get_lessons(
    State(state): State<AppState>,
    Query(params): Query<CatalogParams>,
) -> Result<Json<ApiResponse<Vec<Lesson>>>, StatusCode> {
    match state
        .learning_service
        .get_lessons(params.subject_id, params.grade_id)
        .await
    {
        Ok(lessons) => Ok(Json(ApiResponse::success(lessons))),
        Err(e) => {
            error!(subject_id = params.subject_id, error = %e, "Error getting lessons");
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

pub async fn get_lesson(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<Lesson>>, (StatusCode, Json<ApiResponse<()>>)> {
    log_api_start!("get_lesson", lesson_id = id);

    match state.learning_service.get_lesson(id).await {
        Ok(Some(lesson)) => Ok(Json(ApiResponse::success(lesson))),
        Ok(None) => {
            let error = ApiError::NotFound(format!("Lesson with ID '{}' not found", id));
            let context = ErrorContext::new("get_lesson", "lesson").with_id(&id.to_string());
            Err(error.to_response_with_context(context))
        }
        Err(e) => {
            let error = ApiError::DatabaseError(e);
            let context = ErrorContext::new("get_lesson", "lesson").with_id(&id.to_string());
            Err(error.to_response_with_context(context))
        }
    }
}

pub async fn create_lesson(
    State(state): State<AppState>,
    Json(request): Json<CreateLessonRequest>,
) -> Result<Json<ApiResponse<Lesson>>, (StatusCode, Json<ApiResponse<()>>)> {
    info!(title = %request.title, subject_id = request.subject_id, "Creating lesson");

    match state.learning_service.create_lesson(request).await {
        Ok(lesson) => {
            info!(lesson_id = %lesson.id, "Lesson created successfully");
            Ok(Json(ApiResponse::success(lesson)))
        }
        Err(e) => {
            let classified_error = classify_database_error(&e);
            let context = ErrorContext::new("create_lesson", "lesson");
            Err(classified_error.to_response_with_context(context))
        }
    }
}

// Quiz endpoints
pub async fn get_quizzes(
    State(state): State<AppState>,
    Query(params): Query<CatalogParams>,
) -> Result<Json<ApiResponse<Vec<Quiz>>>, StatusCode> {
    match state
        .learning_service
        .get_quizzes(params.subject_id, params.grade_id)
        .await
    {
        Ok(quizzes) => Ok(Json(ApiResponse::success(quizzes))),
        Err(e) => {
            error!(subject_id = params.subject_id, error = %e, "Error getting quizzes");
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

/// Quiz payload for taking: answer keys are stripped before serialization.
pub async fn get_quiz(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<QuizForTaking>>, (StatusCode, Json<ApiResponse<()>>)> {
    log_api_start!("get_quiz", quiz_id = id);

    match state.learning_service.get_full_quiz(id).await {
        Ok(Some(quiz)) => {
            log_api_success!("get_quiz", quiz_id = id, "quiz retrieved successfully");
            Ok(Json(ApiResponse::success(QuizForTaking::from(&quiz))))
        }
        Ok(None) => {
            log_api_warn!("get_quiz", quiz_id = id, "quiz not found");
            let error = ApiError::NotFound(format!("Quiz with ID '{}' not found", id));
            let context = ErrorContext::new("get_quiz", "quiz").with_id(&id.to_string());
            Err(error.to_response_with_context(context))
        }
        Err(e) => {
            log_api_error!("get_quiz", quiz_id = id, error = e, "database error retrieving quiz");
            let error = ApiError::DatabaseError(e);
            let context = ErrorContext::new("get_quiz", "quiz").with_id(&id.to_string());
            Err(error.to_response_with_context(context))
        }
    }
}

pub async fn create_quiz(
    State(state): State<AppState>,
    Json(request): Json<CreateQuizRequest>,
) -> Result<Json<ApiResponse<FullQuiz>>, (StatusCode, Json<ApiResponse<()>>)> {
    info!(
        title = %request.title,
        subject_id = request.subject_id,
        question_count = request.questions.len(),
        "Creating quiz"
    );

    match state.learning_service.create_quiz(request).await {
        Ok(quiz) => {
            info!(quiz_id = %quiz.quiz.id, "Quiz created successfully");
            Ok(Json(ApiResponse::success(quiz)))
        }
        Err(e) => {
            let classified_error = classify_database_error(&e);
            let context = ErrorContext::new("create_quiz", "quiz");
            Err(classified_error.to_response_with_context(context))
        }
    }
}

pub async fn submit_quiz(
    State(state): State<AppState>,
    Json(request): Json<SubmitQuizRequest>,
) -> Result<Json<ApiResponse<GradedQuiz>>, (StatusCode, Json<ApiResponse<()>>)> {
    info!(
        learner_id = request.user_id,
        quiz_id = request.quiz_id,
        answer_count = request.answers.len(),
        "Submitting quiz"
    );

    if request.time_spent_seconds < 0 {
        let error = ApiError::ValidationError("timeSpentSeconds must not be negative".to_string());
        let context = ErrorContext::new("submit_quiz", "quiz");
        return Err(error.to_response_with_context(context));
    }

    match state
        .learning_service
        .submit_quiz(
            request.user_id,
            request.quiz_id,
            &request.answers,
            request.time_spent_seconds,
        )
        .await
    {
        Ok(Some(graded)) => {
            info!(
                learner_id = request.user_id,
                quiz_id = request.quiz_id,
                score = graded.score,
                percentage = graded.percentage,
                passed = graded.passed,
                "Quiz graded and result stored"
            );
            Ok(Json(ApiResponse::success(graded)))
        }
        Ok(None) => {
            let error = ApiError::NotFound(format!("Quiz with ID '{}' not found", request.quiz_id));
            let context =
                ErrorContext::new("submit_quiz", "quiz").with_id(&request.quiz_id.to_string());
            Err(error.to_response_with_context(context))
        }
        Err(e) => {
            log_api_error!("submit_quiz", quiz_id = request.quiz_id, error = e, "grading or persistence failed");
            let error = ApiError::DatabaseError(e);
            let context =
                ErrorContext::new("submit_quiz", "quiz").with_id(&request.quiz_id.to_string());
            Err(error.to_response_with_context(context))
        }
    }
}

pub async fn get_quiz_history(
    State(state): State<AppState>,
    Query(params): Query<LearnerParams>,
) -> Result<Json<ApiResponse<Vec<QuizResult>>>, StatusCode> {
    match state.learning_service.quiz_history(params.user_id).await {
        Ok(results) => Ok(Json(ApiResponse::success(results))),
        Err(e) => {
            error!(learner_id = params.user_id, error = %e, "Error getting quiz history");
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

// Progress endpoints
pub async fn get_user_progress(
    State(state): State<AppState>,
    Query(params): Query<LearnerParams>,
) -> Result<Json<ApiResponse<OverallProgress>>, StatusCode> {
    debug!(learner_id = params.user_id, "Getting overall progress");

    match state.learning_service.overall_progress(params.user_id).await {
        Ok(progress) => Ok(Json(ApiResponse::success(progress))),
        Err(e) => {
            error!(learner_id = params.user_id, error = %e, "Error computing overall progress");
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

pub async fn get_subject_progress(
    State(state): State<AppState>,
    Query(params): Query<SubjectProgressParams>,
) -> Result<Json<ApiResponse<SubjectProgress>>, (StatusCode, Json<ApiResponse<()>>)> {
    log_api_start!("get_subject_progress", subject_id = params.subject_id);

    match state
        .learning_service
        .subject_progress(params.user_id, params.subject_id, params.grade_id)
        .await
    {
        Ok(Some(progress)) => Ok(Json(ApiResponse::success(progress))),
        Ok(None) => {
            let error =
                ApiError::NotFound(format!("Subject with ID '{}' not found", params.subject_id));
            let context = ErrorContext::new("get_subject_progress", "subject")
                .with_id(&params.subject_id.to_string());
            Err(error.to_response_with_context(context))
        }
        Err(e) => {
            let error = ApiError::DatabaseError(e);
            let context = ErrorContext::new("get_subject_progress", "subject")
                .with_id(&params.subject_id.to_string());
            Err(error.to_response_with_context(context))
        }
    }
}

pub async fn update_progress(
    State(state): State<AppState>,
    Json(request): Json<UpdateProgressRequest>,
) -> Result<Json<ApiResponse<ProgressRecord>>, (StatusCode, Json<ApiResponse<()>>)> {
    info!(
        learner_id = request.user_id,
        lesson_id = request.lesson_id,
        status = ?request.status,
        "Updating lesson progress"
    );

    match state
        .learning_service
        .update_lesson_progress(
            request.user_id,
            request.lesson_id,
            request.status,
            request.completion_percentage,
        )
        .await
    {
        Ok(Some(record)) => Ok(Json(ApiResponse::success(record))),
        Ok(None) => {
            let error =
                ApiError::NotFound(format!("Lesson with ID '{}' not found", request.lesson_id));
            let context = ErrorContext::new("update_progress", "lesson")
                .with_id(&request.lesson_id.to_string());
            Err(error.to_response_with_context(context))
        }
        Err(e) => {
            let error = ApiError::DatabaseError(e);
            let context = ErrorContext::new("update_progress", "lesson")
                .with_id(&request.lesson_id.to_string());
            Err(error.to_response_with_context(context))
        }
    }
}

// Recommendation endpoints
pub async fn recommend_lessons(
    State(state): State<AppState>,
    Query(params): Query<RecommendationParams>,
) -> Result<Json<ApiResponse<Vec<LessonRecommendation>>>, StatusCode> {
    let limit = params.limit.unwrap_or(DEFAULT_RECOMMENDATION_LIMIT);
    debug!(learner_id = params.user_id, grade_id = params.grade_id, limit, "Recommending lessons");

    match state
        .learning_service
        .lesson_recommendations(params.user_id, params.grade_id, limit)
        .await
    {
        Ok(recommendations) => Ok(Json(ApiResponse::success(recommendations))),
        Err(e) => {
            error!(learner_id = params.user_id, error = %e, "Error generating lesson recommendations");
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

pub async fn recommend_quizzes(
    State(state): State<AppState>,
    Query(params): Query<RecommendationParams>,
) -> Result<Json<ApiResponse<Vec<QuizRecommendation>>>, StatusCode> {
    let limit = params.limit.unwrap_or(DEFAULT_RECOMMENDATION_LIMIT);
    debug!(learner_id = params.user_id, grade_id = params.grade_id, limit, "Recommending quizzes");

    match state
        .learning_service
        .quiz_recommendations(params.user_id, params.grade_id, limit)
        .await
    {
        Ok(recommendations) => Ok(Json(ApiResponse::success(recommendations))),
        Err(e) => {
            error!(learner_id = params.user_id, error = %e, "Error generating quiz recommendations");
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

pub async fn get_learning_path(
    State(state): State<AppState>,
    Query(params): Query<RecommendationParams>,
) -> Result<Json<ApiResponse<LearningPath>>, StatusCode> {
    debug!(learner_id = params.user_id, grade_id = params.grade_id, "Generating learning path");

    match state
        .learning_service
        .learning_path(params.user_id, params.grade_id)
        .await
    {
        Ok(path) => {
            info!(
                learner_id = params.user_id,
                subject_count = path.subjects.len(),
                "Learning path generated"
            );
            Ok(Json(ApiResponse::success(path)))
        }
        Err(e) => {
            error!(learner_id = params.user_id, error = %e, "Error generating learning path");
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Learner routes
        .route("/api/users", post(create_user))
        .route("/api/users/:id", get(get_user))

        // Catalog routes
        .route("/api/grades", get(get_grades))
        .route("/api/grades", post(create_grade))
        .route("/api/subjects", get(get_subjects))
        .route("/api/subjects", post(create_subject))
        .route("/api/lessons", get(get_lessons))
        .route("/api/lessons", post(create_lesson))
        .route("/api/lessons/:id", get(get_lesson))

        // Quiz routes
        .route("/api/quizzes", get(get_quizzes))
        .route("/api/quizzes", post(create_quiz))
        .route("/api/quizzes/submit", post(submit_quiz))
        .route("/api/quizzes/history", get(get_quiz_history))
        .route("/api/quizzes/:id", get(get_quiz))

        // Progress routes
        .route("/api/progress/user", get(get_user_progress))
        .route("/api/progress/subject", get(get_subject_progress))
        .route("/api/progress/update", post(update_progress))

        // Recommendation routes
        .route("/api/recommendations/lessons", get(recommend_lessons))
        .route("/api/recommendations/quizzes", get(recommend_quizzes))
        .route("/api/recommendations/learning-path", get(get_learning_path))

        .with_state(state)
}
