use anyhow::{anyhow, Result};
use chrono::Utc;
use std::collections::BTreeSet;

use crate::database::Database;
use crate::models::*;
use crate::recommendation::{self, SubjectSnapshot};
use crate::{grading, progress};

/// Service layer tying the data-access boundary to the pure grading,
/// aggregation and ranking modules. Handlers talk to this, never to the
/// database directly.
#[derive(Clone)]
pub struct LearningService {
    db: Database,
}

impl LearningService {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    // Learner operations
    pub async fn create_learner(&self, request: CreateLearnerRequest) -> Result<Learner> {
        if request.username.trim().is_empty() {
            return Err(anyhow!("username must not be empty"));
        }
        self.db.create_learner(request).await
    }

    pub async fn get_learner(&self, id: i64) -> Result<Option<Learner>> {
        self.db.get_learner(id).await
    }

    // Catalog operations
    pub async fn create_grade(&self, name: String) -> Result<Grade> {
        if name.trim().is_empty() {
            return Err(anyhow!("grade name must not be empty"));
        }
        self.db.create_grade(name).await
    }

    pub async fn get_grades(&self) -> Result<Vec<Grade>> {
        self.db.get_all_grades().await
    }

    pub async fn create_subject(&self, request: CreateSubjectRequest) -> Result<Subject> {
        if request.name.trim().is_empty() {
            return Err(anyhow!("subject name must not be empty"));
        }
        self.db.create_subject(request).await
    }

    pub async fn get_subjects(&self, grade_id: Option<i64>) -> Result<Vec<Subject>> {
        match grade_id {
            Some(grade_id) => self.db.get_subjects_by_grade(grade_id).await,
            None => self.db.get_all_subjects().await,
        }
    }

    pub async fn create_lesson(&self, request: CreateLessonRequest) -> Result<Lesson> {
        if self.db.get_subject(request.subject_id).await?.is_none() {
            return Err(anyhow!("subject {} not found", request.subject_id));
        }
        self.db.create_lesson(request).await
    }

    pub async fn get_lesson(&self, id: i64) -> Result<Option<Lesson>> {
        self.db.get_lesson(id).await
    }

    pub async fn get_lessons(&self, subject_id: i64, grade_id: i64) -> Result<Vec<Lesson>> {
        self.db
            .get_lessons_for_subject_and_grade(subject_id, grade_id)
            .await
    }

    pub async fn create_quiz(&self, request: CreateQuizRequest) -> Result<FullQuiz> {
        validate_quiz_request(&request)?;
        if self.db.get_subject(request.subject_id).await?.is_none() {
            return Err(anyhow!("subject {} not found", request.subject_id));
        }
        self.db.create_quiz(request).await
    }

    pub async fn get_full_quiz(&self, id: i64) -> Result<Option<FullQuiz>> {
        self.db.get_full_quiz(id).await
    }

    pub async fn get_quizzes(&self, subject_id: i64, grade_id: i64) -> Result<Vec<Quiz>> {
        self.db
            .get_quizzes_for_subject_and_grade(subject_id, grade_id)
            .await
    }

    // Quiz taking
    /// Grade a submission and persist the attempt. Returns `None` when the
    /// quiz does not exist. The stored result is append-only; the graded
    /// review payload is returned to the caller as-is.
    pub async fn submit_quiz(
        &self,
        learner_id: i64,
        quiz_id: i64,
        answers: &[QuestionAnswer],
        time_spent_seconds: i64,
    ) -> Result<Option<GradedQuiz>> {
        let Some(quiz) = self.db.get_full_quiz(quiz_id).await? else {
            return Ok(None);
        };

        let graded = grading::grade_submission(&quiz, learner_id, answers, time_spent_seconds);
        self.db.insert_quiz_result(&graded).await?;

        Ok(Some(graded))
    }

    pub async fn quiz_history(&self, learner_id: i64) -> Result<Vec<QuizResult>> {
        self.db.get_quiz_results_for_learner(learner_id).await
    }

    // Progress tracking
    /// Upsert the learner's record for a lesson. The stored row is
    /// normalized: percentage clamped to [0,100] and forced to 100 when the
    /// status is completed. Returns `None` when the lesson does not exist.
    pub async fn update_lesson_progress(
        &self,
        learner_id: i64,
        lesson_id: i64,
        status: LessonStatus,
        completion_percentage: i64,
    ) -> Result<Option<ProgressRecord>> {
        if self.db.get_lesson(lesson_id).await?.is_none() {
            return Ok(None);
        }

        let percentage = match status {
            LessonStatus::Completed => 100,
            _ => completion_percentage.clamp(0, 100),
        };

        let record = self
            .db
            .upsert_progress(learner_id, lesson_id, status, percentage, Utc::now())
            .await?;

        Ok(Some(record))
    }

    pub async fn overall_progress(&self, learner_id: i64) -> Result<OverallProgress> {
        let progress_rows = self.db.get_progress_for_learner(learner_id).await?;
        let result_rows = self.db.get_quiz_results_for_learner(learner_id).await?;

        // Every subject+grade the learner has touched, in a stable order.
        let mut pairs: BTreeSet<(i64, i64)> = BTreeSet::new();
        for record in &progress_rows {
            if let Some(lesson) = self.db.get_lesson(record.lesson_id).await? {
                pairs.insert((lesson.subject_id, lesson.grade_id));
            }
        }
        for result in &result_rows {
            if let Some(quiz) = self.db.get_quiz(result.quiz_id).await? {
                pairs.insert((quiz.subject_id, quiz.grade_id));
            }
        }

        let mut details = Vec::with_capacity(pairs.len());
        for (subject_id, grade_id) in pairs {
            if let Some(detail) = self
                .subject_progress(learner_id, subject_id, grade_id)
                .await?
            {
                details.push(detail);
            }
        }

        Ok(progress::overall_progress(learner_id, &details))
    }

    pub async fn subject_progress(
        &self,
        learner_id: i64,
        subject_id: i64,
        grade_id: i64,
    ) -> Result<Option<SubjectProgress>> {
        let Some(subject) = self.db.get_subject(subject_id).await? else {
            return Ok(None);
        };

        let lessons = self
            .db
            .get_lessons_for_subject_and_grade(subject_id, grade_id)
            .await?;
        let quizzes = self
            .db
            .get_quizzes_for_subject_and_grade(subject_id, grade_id)
            .await?;
        let progress_rows = self.db.get_progress_for_learner(learner_id).await?;
        let result_rows = self
            .db
            .get_quiz_results_for_subject(learner_id, subject_id, grade_id)
            .await?;

        Ok(Some(progress::subject_progress_detail(
            &subject,
            grade_id,
            &lessons,
            &quizzes,
            &progress_rows,
            &result_rows,
        )))
    }

    // Recommendations
    pub async fn lesson_recommendations(
        &self,
        learner_id: i64,
        grade_id: i64,
        limit: usize,
    ) -> Result<Vec<LessonRecommendation>> {
        let snapshots = self.subject_snapshots(learner_id, grade_id).await?;
        Ok(recommendation::recommend_lessons(&snapshots, grade_id, limit))
    }

    pub async fn quiz_recommendations(
        &self,
        learner_id: i64,
        grade_id: i64,
        limit: usize,
    ) -> Result<Vec<QuizRecommendation>> {
        let snapshots = self.subject_snapshots(learner_id, grade_id).await?;
        Ok(recommendation::recommend_quizzes(&snapshots, grade_id, limit))
    }

    pub async fn learning_path(&self, learner_id: i64, grade_id: i64) -> Result<LearningPath> {
        let snapshots = self.subject_snapshots(learner_id, grade_id).await?;
        Ok(recommendation::build_learning_path(
            learner_id, grade_id, &snapshots,
        ))
    }

    /// One snapshot per subject in the grade: the learner's aggregated
    /// progress plus the lesson/quiz catalogs the ranking functions need.
    async fn subject_snapshots(
        &self,
        learner_id: i64,
        grade_id: i64,
    ) -> Result<Vec<SubjectSnapshot>> {
        let subjects = self.db.get_subjects_by_grade(grade_id).await?;
        let progress_rows = self.db.get_progress_for_learner(learner_id).await?;

        let mut snapshots = Vec::with_capacity(subjects.len());
        for subject in &subjects {
            let lessons = self
                .db
                .get_lessons_for_subject_and_grade(subject.id, grade_id)
                .await?;
            let quizzes = self
                .db
                .get_quizzes_for_subject_and_grade(subject.id, grade_id)
                .await?;
            let result_rows = self
                .db
                .get_quiz_results_for_subject(learner_id, subject.id, grade_id)
                .await?;

            let detail = progress::subject_progress_detail(
                subject,
                grade_id,
                &lessons,
                &quizzes,
                &progress_rows,
                &result_rows,
            );

            snapshots.push(SubjectSnapshot {
                detail,
                lessons,
                quizzes,
            });
        }

        Ok(snapshots)
    }
}

fn validate_quiz_request(request: &CreateQuizRequest) -> Result<()> {
    if !(0..=100).contains(&request.passing_score) {
        return Err(anyhow!("passing score must be between 0 and 100"));
    }
    if request.questions.is_empty() {
        return Err(anyhow!("a quiz must have at least one question"));
    }

    for question in &request.questions {
        if question.points <= 0 {
            return Err(anyhow!("question points must be positive"));
        }
        if question.options.is_empty() {
            return Err(anyhow!("a question must have at least one option"));
        }

        let correct_count = question.options.iter().filter(|o| o.is_correct).count();
        match question.question_type {
            QuestionType::Single if correct_count != 1 => {
                return Err(anyhow!(
                    "a single-choice question must have exactly one correct option"
                ));
            }
            QuestionType::Multiple if correct_count == 0 => {
                return Err(anyhow!(
                    "a multi-choice question must have at least one correct option"
                ));
            }
            _ => {}
        }
    }

    Ok(())
}
