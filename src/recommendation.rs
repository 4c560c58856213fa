use chrono::{Duration, Utc};
use uuid::Uuid;

use crate::models::*;

/// How long a generated learning path stays fresh. Advisory only.
pub const LEARNING_PATH_VALID_DAYS: i64 = 7;

/// Per-subject caps when bundling a learning path.
pub const PATH_LESSONS_PER_SUBJECT: usize = 5;
pub const PATH_QUIZZES_PER_SUBJECT: usize = 3;

/// Flat per-lesson duration estimate surfaced in learning paths.
pub const ESTIMATED_LESSON_MINUTES: i64 = 30;

/// Subjects with less lesson completion than this are not offered quizzes.
const QUIZ_RECOMMENDATION_MIN_LESSON_PCT: f64 = 10.0;

/// Everything the ranking functions need to know about one subject: the
/// learner's aggregated progress plus the subject's lesson/quiz catalog.
#[derive(Debug, Clone)]
pub struct SubjectSnapshot {
    pub detail: SubjectProgress,
    pub lessons: Vec<Lesson>,
    pub quizzes: Vec<Quiz>,
}

fn completion_pct(completed: i64, total: i64) -> f64 {
    if total == 0 {
        0.0
    } else {
        completed as f64 / total as f64 * 100.0
    }
}

/// Priority for lesson recommendations: the less of a subject the learner
/// has finished, the sooner it is recommended. A subject that was never
/// touched lands at the maximum of 100.
pub fn lesson_priority(completed_lessons: i64, total_lessons: i64) -> f64 {
    100.0 - completion_pct(completed_lessons, total_lessons)
}

/// Priority for quiz recommendations: high lesson completion with few quiz
/// attempts ranks first, clamped to [0, 100].
pub fn quiz_priority(lesson_pct: f64, quiz_pct: f64) -> f64 {
    (lesson_pct - 0.5 * quiz_pct).clamp(0.0, 100.0)
}

/// Rank subjects for lesson recommendations, highest priority first.
/// The sort is stable, so equal priorities keep catalog order.
pub fn rank_subjects_for_lessons<'a>(
    subjects: impl IntoIterator<Item = &'a SubjectProgress>,
) -> Vec<SubjectPriority> {
    let mut ranked: Vec<SubjectPriority> = subjects
        .into_iter()
        .map(|s| {
            let pct = completion_pct(s.completed_lessons, s.total_lessons);
            SubjectPriority {
                subject_id: s.subject_id,
                subject_name: s.subject_name.clone(),
                priority: 100.0 - pct,
                completion_percentage: pct,
            }
        })
        .collect();
    ranked.sort_by(|a, b| b.priority.total_cmp(&a.priority));
    ranked
}

/// Rank subjects for quiz recommendations. Subjects below the minimum
/// lesson completion are dropped outright, not merely deprioritized.
pub fn rank_subjects_for_quizzes<'a>(
    subjects: impl IntoIterator<Item = &'a SubjectProgress>,
) -> Vec<SubjectPriority> {
    let mut ranked: Vec<SubjectPriority> = subjects
        .into_iter()
        .filter_map(|s| {
            let lesson_pct = completion_pct(s.completed_lessons, s.total_lessons);
            if lesson_pct < QUIZ_RECOMMENDATION_MIN_LESSON_PCT {
                return None;
            }
            let quiz_pct = completion_pct(s.completed_quizzes, s.total_quizzes);
            Some(SubjectPriority {
                subject_id: s.subject_id,
                subject_name: s.subject_name.clone(),
                priority: quiz_priority(lesson_pct, quiz_pct),
                completion_percentage: lesson_pct,
            })
        })
        .collect();
    ranked.sort_by(|a, b| b.priority.total_cmp(&a.priority));
    ranked
}

/// Incomplete lessons in study order: anything in progress first, then the
/// subject's stored lesson sequence.
pub fn order_lessons_for_study<'a>(
    lessons: &'a [Lesson],
    progress: &[LessonProgressEntry],
) -> Vec<&'a Lesson> {
    let status_of = |lesson_id: i64| {
        progress
            .iter()
            .find(|p| p.lesson_id == lesson_id)
            .map(|p| p.status)
            .unwrap_or(LessonStatus::NotStarted)
    };

    let mut incomplete: Vec<&Lesson> = lessons
        .iter()
        .filter(|l| status_of(l.id) != LessonStatus::Completed)
        .collect();
    incomplete.sort_by_key(|l| (status_of(l.id) != LessonStatus::InProgress, l.order_index));
    incomplete
}

/// Never-attempted quizzes in study order: practice quizzes before exams,
/// then by ascending difficulty.
pub fn order_quizzes_for_study<'a>(
    quizzes: &'a [Quiz],
    results: &[QuizResultEntry],
) -> Vec<&'a Quiz> {
    let mut pending: Vec<&Quiz> = quizzes
        .iter()
        .filter(|q| !results.iter().any(|r| r.quiz_id == q.id))
        .collect();
    pending.sort_by_key(|q| (q.quiz_type != QuizType::Practice, q.difficulty.rank()));
    pending
}

/// Build up to `limit` lesson recommendations across the given subjects.
pub fn recommend_lessons(
    snapshots: &[SubjectSnapshot],
    grade_id: i64,
    limit: usize,
) -> Vec<LessonRecommendation> {
    let ranked = rank_subjects_for_lessons(snapshots.iter().map(|s| &s.detail));
    let mut recommendations = Vec::new();

    for priority in &ranked {
        if recommendations.len() >= limit {
            break;
        }
        let Some(snapshot) = snapshots.iter().find(|s| s.detail.subject_id == priority.subject_id)
        else {
            continue;
        };

        for lesson in order_lessons_for_study(&snapshot.lessons, &snapshot.detail.lesson_progress) {
            if recommendations.len() >= limit {
                break;
            }
            let status = snapshot
                .detail
                .lesson_progress
                .iter()
                .find(|p| p.lesson_id == lesson.id)
                .map(|p| p.status)
                .unwrap_or(LessonStatus::NotStarted);

            let reason = if status == LessonStatus::InProgress {
                "Pick up the lesson you left unfinished"
            } else if priority.completion_percentage < 30.0 {
                "This subject needs the most attention"
            } else {
                "Next lesson in the subject sequence"
            };

            recommendations.push(LessonRecommendation {
                lesson_id: lesson.id,
                lesson_title: lesson.title.clone(),
                subject_id: priority.subject_id,
                subject_name: priority.subject_name.clone(),
                grade_id,
                difficulty: lesson.difficulty,
                relevance_score: priority.priority,
                reason: reason.to_string(),
            });
        }
    }

    recommendations
}

/// Build up to `limit` quiz recommendations across the given subjects.
pub fn recommend_quizzes(
    snapshots: &[SubjectSnapshot],
    grade_id: i64,
    limit: usize,
) -> Vec<QuizRecommendation> {
    let ranked = rank_subjects_for_quizzes(snapshots.iter().map(|s| &s.detail));
    let mut recommendations = Vec::new();

    for priority in &ranked {
        if recommendations.len() >= limit {
            break;
        }
        let Some(snapshot) = snapshots.iter().find(|s| s.detail.subject_id == priority.subject_id)
        else {
            continue;
        };

        for quiz in order_quizzes_for_study(&snapshot.quizzes, &snapshot.detail.quiz_results) {
            if recommendations.len() >= limit {
                break;
            }

            let reason = match quiz.quiz_type {
                QuizType::Practice => "Practice quiz matching what you have studied",
                QuizType::Midterm => "Midterm to check your understanding so far",
                QuizType::Final => "Final exam to consolidate the subject",
            };

            recommendations.push(QuizRecommendation {
                quiz_id: quiz.id,
                quiz_title: quiz.title.clone(),
                subject_id: priority.subject_id,
                subject_name: priority.subject_name.clone(),
                grade_id,
                difficulty: quiz.difficulty,
                quiz_type: quiz.quiz_type,
                relevance_score: priority.priority,
                reason: reason.to_string(),
            });
        }
    }

    recommendations
}

/// Bundle a personalized learning path: every subject ordered by lesson
/// priority, each carrying its next lessons and quizzes with 1-based
/// sequence numbers.
pub fn build_learning_path(
    learner_id: i64,
    grade_id: i64,
    snapshots: &[SubjectSnapshot],
) -> LearningPath {
    let ranked = rank_subjects_for_lessons(snapshots.iter().map(|s| &s.detail));
    let generated_at = Utc::now();

    let mut subjects = Vec::with_capacity(ranked.len());
    for priority in &ranked {
        let Some(snapshot) = snapshots.iter().find(|s| s.detail.subject_id == priority.subject_id)
        else {
            continue;
        };

        let recommended_lessons =
            order_lessons_for_study(&snapshot.lessons, &snapshot.detail.lesson_progress)
                .into_iter()
                .take(PATH_LESSONS_PER_SUBJECT)
                .enumerate()
                .map(|(i, lesson)| PathLesson {
                    lesson_id: lesson.id,
                    lesson_title: lesson.title.clone(),
                    order: i as i64 + 1,
                    estimated_time_minutes: ESTIMATED_LESSON_MINUTES,
                })
                .collect();

        let recommended_quizzes =
            order_quizzes_for_study(&snapshot.quizzes, &snapshot.detail.quiz_results)
                .into_iter()
                .take(PATH_QUIZZES_PER_SUBJECT)
                .enumerate()
                .map(|(i, quiz)| PathQuiz {
                    quiz_id: quiz.id,
                    quiz_title: quiz.title.clone(),
                    order: i as i64 + 1,
                    difficulty: quiz.difficulty,
                    quiz_type: quiz.quiz_type,
                })
                .collect();

        subjects.push(LearningPathSubject {
            subject_id: priority.subject_id,
            subject_name: priority.subject_name.clone(),
            priority: priority.priority,
            completion_percentage: priority.completion_percentage,
            recommended_lessons,
            recommended_quizzes,
        });
    }

    LearningPath {
        path_id: Uuid::new_v4(),
        learner_id,
        grade_id,
        generated_at,
        expires_at: generated_at + Duration::days(LEARNING_PATH_VALID_DAYS),
        subjects,
    }
}
