use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Lesson and quiz difficulty tiers, ordered from easiest to hardest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Difficulty {
    Basic,
    Intermediate,
    Advanced,
}

impl Difficulty {
    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Basic => "basic",
            Difficulty::Intermediate => "intermediate",
            Difficulty::Advanced => "advanced",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "basic" => Some(Difficulty::Basic),
            "intermediate" => Some(Difficulty::Intermediate),
            "advanced" => Some(Difficulty::Advanced),
            _ => None,
        }
    }

    /// Sort key: basic < intermediate < advanced.
    pub fn rank(&self) -> u8 {
        match self {
            Difficulty::Basic => 0,
            Difficulty::Intermediate => 1,
            Difficulty::Advanced => 2,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuizType {
    Practice,
    Midterm,
    Final,
}

impl QuizType {
    pub fn as_str(&self) -> &'static str {
        match self {
            QuizType::Practice => "practice",
            QuizType::Midterm => "midterm",
            QuizType::Final => "final",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "practice" => Some(QuizType::Practice),
            "midterm" => Some(QuizType::Midterm),
            "final" => Some(QuizType::Final),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionType {
    Single,
    Multiple,
}

impl QuestionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            QuestionType::Single => "single",
            QuestionType::Multiple => "multiple",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "single" => Some(QuestionType::Single),
            "multiple" => Some(QuestionType::Multiple),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LessonStatus {
    NotStarted,
    InProgress,
    Completed,
}

impl LessonStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            LessonStatus::NotStarted => "not_started",
            LessonStatus::InProgress => "in_progress",
            LessonStatus::Completed => "completed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "not_started" => Some(LessonStatus::NotStarted),
            "in_progress" => Some(LessonStatus::InProgress),
            "completed" => Some(LessonStatus::Completed),
            _ => None,
        }
    }
}

// ============================================================================
// Catalog entities
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Learner {
    pub id: i64,
    pub username: String,
    pub full_name: String,
    pub grade_id: Option<i64>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Grade {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subject {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Lesson {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub subject_id: i64,
    pub grade_id: i64,
    pub difficulty: Difficulty,
    pub order_index: i64, // total order within a subject+grade
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Quiz {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub subject_id: i64,
    pub grade_id: i64,
    pub lesson_id: Option<i64>,
    pub quiz_type: QuizType,
    pub difficulty: Difficulty,
    pub time_limit_minutes: Option<i64>,
    pub passing_score: i64, // percentage threshold
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    pub id: i64,
    pub quiz_id: i64,
    pub text: String,
    pub question_type: QuestionType,
    pub points: i64,
    pub explanation: Option<String>,
    pub order_index: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerOption {
    pub id: i64,
    pub question_id: i64,
    pub text: String,
    pub is_correct: bool,
    pub order_index: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionWithOptions {
    pub question: Question,
    pub options: Vec<AnswerOption>,
}

/// A quiz with its questions and options, both sorted by order index.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FullQuiz {
    pub quiz: Quiz,
    pub questions: Vec<QuestionWithOptions>,
}

// ============================================================================
// Learner records
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressRecord {
    pub id: i64,
    pub learner_id: i64,
    pub lesson_id: i64,
    pub status: LessonStatus,
    pub completion_percentage: i64, // 0-100
    pub last_accessed_at: Option<DateTime<Utc>>,
}

/// Immutable attempt record. Retakes insert new rows, never update.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizResult {
    pub id: i64,
    pub learner_id: i64,
    pub quiz_id: i64,
    pub score: i64,
    pub max_score: i64,
    pub percentage: i64,
    pub passed: bool,
    pub time_spent_seconds: i64,
    pub submitted_at: DateTime<Utc>,
}

// ============================================================================
// Quiz taking and grading
// ============================================================================

/// One answered question: the set of option ids the learner selected.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionAnswer {
    pub question_id: i64,
    pub selected_option_ids: Vec<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectedOption {
    pub option_id: i64,
    pub option_text: String,
    pub is_correct: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CorrectOption {
    pub option_id: i64,
    pub option_text: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionResult {
    pub question_id: i64,
    pub question_text: String,
    pub points: i64,
    pub earned_points: i64,
    pub is_correct: bool,
    pub selected_options: Vec<SelectedOption>,
    /// Always populated so the client can render an answer review.
    pub correct_options: Vec<CorrectOption>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GradedQuiz {
    pub quiz_id: i64,
    pub learner_id: i64,
    pub score: i64,
    pub max_score: i64,
    pub percentage: i64,
    pub passed: bool,
    pub time_spent_seconds: i64,
    pub submitted_at: DateTime<Utc>,
    pub question_results: Vec<QuestionResult>,
}

/// Quiz payload handed to a learner about to take it: correctness flags and
/// explanations stripped.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizForTaking {
    pub quiz: Quiz,
    pub questions: Vec<QuestionForTaking>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionForTaking {
    pub id: i64,
    pub text: String,
    pub question_type: QuestionType,
    pub points: i64,
    pub order_index: i64,
    pub options: Vec<OptionForTaking>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OptionForTaking {
    pub id: i64,
    pub text: String,
    pub order_index: i64,
}

impl From<&FullQuiz> for QuizForTaking {
    fn from(full: &FullQuiz) -> Self {
        QuizForTaking {
            quiz: full.quiz.clone(),
            questions: full
                .questions
                .iter()
                .map(|q| QuestionForTaking {
                    id: q.question.id,
                    text: q.question.text.clone(),
                    question_type: q.question.question_type,
                    points: q.question.points,
                    order_index: q.question.order_index,
                    options: q
                        .options
                        .iter()
                        .map(|o| OptionForTaking {
                            id: o.id,
                            text: o.text.clone(),
                            order_index: o.order_index,
                        })
                        .collect(),
                })
                .collect(),
        }
    }
}

// ============================================================================
// Progress aggregation
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LessonProgressEntry {
    pub lesson_id: i64,
    pub lesson_title: String,
    pub status: LessonStatus,
    pub completion_percentage: i64,
    pub last_accessed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizResultEntry {
    pub quiz_id: i64,
    pub quiz_title: String,
    pub score: i64,
    pub max_score: i64,
    pub percentage: i64,
    pub passed: bool,
    pub submitted_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubjectProgress {
    pub subject_id: i64,
    pub subject_name: String,
    pub grade_id: i64,
    pub completed_lessons: i64,
    pub total_lessons: i64,
    pub completed_quizzes: i64,
    pub total_quizzes: i64,
    pub average_score: i64,
    pub lesson_progress: Vec<LessonProgressEntry>,
    pub quiz_results: Vec<QuizResultEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubjectSummary {
    pub subject_id: i64,
    pub subject_name: String,
    pub completed_lessons: i64,
    pub total_lessons: i64,
    pub completed_quizzes: i64,
    pub total_quizzes: i64,
    pub average_score: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OverallProgress {
    pub learner_id: i64,
    pub completed_lessons: i64,
    pub total_lessons: i64,
    pub completed_quizzes: i64,
    pub total_quizzes: i64,
    /// Weighted by each subject's completed-quiz count, not a plain mean.
    pub average_score: i64,
    pub subjects: Vec<SubjectSummary>,
}

// ============================================================================
// Recommendations
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubjectPriority {
    pub subject_id: i64,
    pub subject_name: String,
    pub priority: f64, // 0-100, higher = recommend sooner
    pub completion_percentage: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LessonRecommendation {
    pub lesson_id: i64,
    pub lesson_title: String,
    pub subject_id: i64,
    pub subject_name: String,
    pub grade_id: i64,
    pub difficulty: Difficulty,
    pub relevance_score: f64,
    pub reason: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizRecommendation {
    pub quiz_id: i64,
    pub quiz_title: String,
    pub subject_id: i64,
    pub subject_name: String,
    pub grade_id: i64,
    pub difficulty: Difficulty,
    pub quiz_type: QuizType,
    pub relevance_score: f64,
    pub reason: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PathLesson {
    pub lesson_id: i64,
    pub lesson_title: String,
    pub order: i64, // 1-based sequence within the subject
    pub estimated_time_minutes: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PathQuiz {
    pub quiz_id: i64,
    pub quiz_title: String,
    pub order: i64,
    pub difficulty: Difficulty,
    pub quiz_type: QuizType,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LearningPathSubject {
    pub subject_id: i64,
    pub subject_name: String,
    pub priority: f64,
    pub completion_percentage: f64,
    pub recommended_lessons: Vec<PathLesson>,
    pub recommended_quizzes: Vec<PathQuiz>,
}

/// Ephemeral study plan. The expiry is advisory metadata for the client;
/// nothing here enforces it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LearningPath {
    pub path_id: Uuid,
    pub learner_id: i64,
    pub grade_id: i64,
    pub generated_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub subjects: Vec<LearningPathSubject>,
}

// ============================================================================
// API request types
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateLearnerRequest {
    pub username: String,
    pub full_name: String,
    pub grade_id: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateGradeRequest {
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSubjectRequest {
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateLessonRequest {
    pub title: String,
    pub description: Option<String>,
    pub subject_id: i64,
    pub grade_id: i64,
    pub difficulty: Difficulty,
    pub order_index: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateQuizRequest {
    pub title: String,
    pub description: Option<String>,
    pub subject_id: i64,
    pub grade_id: i64,
    pub lesson_id: Option<i64>,
    pub quiz_type: QuizType,
    pub difficulty: Difficulty,
    pub time_limit_minutes: Option<i64>,
    pub passing_score: i64,
    pub questions: Vec<CreateQuestionRequest>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateQuestionRequest {
    pub text: String,
    pub question_type: QuestionType,
    pub points: i64,
    pub explanation: Option<String>,
    pub order_index: i64,
    pub options: Vec<CreateOptionRequest>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOptionRequest {
    pub text: String,
    pub is_correct: bool,
    pub order_index: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitQuizRequest {
    pub user_id: i64,
    pub quiz_id: i64,
    pub answers: Vec<QuestionAnswer>,
    pub time_spent_seconds: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProgressRequest {
    pub user_id: i64,
    pub lesson_id: i64,
    pub status: LessonStatus,
    pub completion_percentage: i64,
}
