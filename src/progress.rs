use crate::models::*;

/// Build the per-subject progress detail from the subject's catalog and the
/// learner's records.
///
/// `progress_rows` may span other subjects; only rows matching this
/// subject's lessons are used. `result_rows` are filtered to quizzes that
/// belong to this subject+grade.
pub fn subject_progress_detail(
    subject: &Subject,
    grade_id: i64,
    lessons: &[Lesson],
    quizzes: &[Quiz],
    progress_rows: &[ProgressRecord],
    result_rows: &[QuizResult],
) -> SubjectProgress {
    let lesson_progress: Vec<LessonProgressEntry> = lessons
        .iter()
        .map(|lesson| {
            let record = progress_rows.iter().find(|p| p.lesson_id == lesson.id);
            LessonProgressEntry {
                lesson_id: lesson.id,
                lesson_title: lesson.title.clone(),
                status: record.map(|r| r.status).unwrap_or(LessonStatus::NotStarted),
                completion_percentage: record.map(|r| r.completion_percentage).unwrap_or(0),
                last_accessed_at: record.and_then(|r| r.last_accessed_at),
            }
        })
        .collect();

    let quiz_results: Vec<QuizResultEntry> = result_rows
        .iter()
        .filter_map(|result| {
            quizzes
                .iter()
                .find(|q| q.id == result.quiz_id)
                .map(|quiz| QuizResultEntry {
                    quiz_id: result.quiz_id,
                    quiz_title: quiz.title.clone(),
                    score: result.score,
                    max_score: result.max_score,
                    percentage: result.percentage,
                    passed: result.passed,
                    submitted_at: result.submitted_at,
                })
        })
        .collect();

    let completed_lessons = lesson_progress
        .iter()
        .filter(|p| p.status == LessonStatus::Completed)
        .count() as i64;
    let completed_quizzes = quiz_results.len() as i64;
    let average_score = mean_rounded(quiz_results.iter().map(|r| r.percentage));

    SubjectProgress {
        subject_id: subject.id,
        subject_name: subject.name.clone(),
        grade_id,
        completed_lessons,
        total_lessons: lessons.len() as i64,
        completed_quizzes,
        total_quizzes: quizzes.len() as i64,
        average_score,
        lesson_progress,
        quiz_results,
    }
}

/// Roll subject-level details up into the learner's overall numbers.
///
/// The overall average is weighted by each subject's completed-quiz count:
/// a subject with nine results moves the average nine times as much as a
/// subject with one.
pub fn overall_progress(learner_id: i64, subjects: &[SubjectProgress]) -> OverallProgress {
    let mut overall = OverallProgress {
        learner_id,
        completed_lessons: 0,
        total_lessons: 0,
        completed_quizzes: 0,
        total_quizzes: 0,
        average_score: 0,
        subjects: Vec::with_capacity(subjects.len()),
    };

    let mut weighted_score_sum = 0i64;

    for subject in subjects {
        overall.completed_lessons += subject.completed_lessons;
        overall.total_lessons += subject.total_lessons;
        overall.completed_quizzes += subject.completed_quizzes;
        overall.total_quizzes += subject.total_quizzes;

        weighted_score_sum += subject.average_score * subject.completed_quizzes;

        overall.subjects.push(SubjectSummary {
            subject_id: subject.subject_id,
            subject_name: subject.subject_name.clone(),
            completed_lessons: subject.completed_lessons,
            total_lessons: subject.total_lessons,
            completed_quizzes: subject.completed_quizzes,
            total_quizzes: subject.total_quizzes,
            average_score: subject.average_score,
        });
    }

    if overall.completed_quizzes > 0 {
        overall.average_score =
            (weighted_score_sum as f64 / overall.completed_quizzes as f64).round() as i64;
    }

    overall
}

fn mean_rounded(values: impl Iterator<Item = i64>) -> i64 {
    let mut sum = 0i64;
    let mut count = 0i64;
    for value in values {
        sum += value;
        count += 1;
    }
    if count == 0 {
        0
    } else {
        (sum as f64 / count as f64).round() as i64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn subject(id: i64, name: &str) -> Subject {
        Subject {
            id,
            name: name.to_string(),
            description: None,
        }
    }

    fn lesson(id: i64, subject_id: i64, order_index: i64) -> Lesson {
        Lesson {
            id,
            title: format!("Lesson {}", id),
            description: None,
            subject_id,
            grade_id: 1,
            difficulty: Difficulty::Basic,
            order_index,
        }
    }

    fn quiz(id: i64, subject_id: i64) -> Quiz {
        Quiz {
            id,
            title: format!("Quiz {}", id),
            description: None,
            subject_id,
            grade_id: 1,
            lesson_id: None,
            quiz_type: QuizType::Practice,
            difficulty: Difficulty::Basic,
            time_limit_minutes: None,
            passing_score: 70,
        }
    }

    fn progress(lesson_id: i64, status: LessonStatus, pct: i64) -> ProgressRecord {
        ProgressRecord {
            id: lesson_id,
            learner_id: 1,
            lesson_id,
            status,
            completion_percentage: pct,
            last_accessed_at: Some(Utc::now()),
        }
    }

    fn result(quiz_id: i64, percentage: i64) -> QuizResult {
        QuizResult {
            id: quiz_id,
            learner_id: 1,
            quiz_id,
            score: percentage,
            max_score: 100,
            percentage,
            passed: percentage >= 70,
            time_spent_seconds: 60,
            submitted_at: Utc::now(),
        }
    }

    fn detail(id: i64, completed_quizzes: i64, average_score: i64) -> SubjectProgress {
        SubjectProgress {
            subject_id: id,
            subject_name: format!("Subject {}", id),
            grade_id: 1,
            completed_lessons: 0,
            total_lessons: 0,
            completed_quizzes,
            total_quizzes: completed_quizzes,
            average_score,
            lesson_progress: vec![],
            quiz_results: vec![],
        }
    }

    #[test]
    fn detail_defaults_unrecorded_lessons_to_not_started() {
        let lessons = vec![lesson(1, 1, 0), lesson(2, 1, 1)];
        let detail = subject_progress_detail(
            &subject(1, "Math"),
            1,
            &lessons,
            &[],
            &[progress(1, LessonStatus::Completed, 100)],
            &[],
        );

        assert_eq!(detail.completed_lessons, 1);
        assert_eq!(detail.total_lessons, 2);
        assert_eq!(detail.lesson_progress[1].status, LessonStatus::NotStarted);
        assert_eq!(detail.lesson_progress[1].completion_percentage, 0);
        assert!(detail.lesson_progress[1].last_accessed_at.is_none());
    }

    #[test]
    fn detail_filters_results_to_this_subjects_quizzes() {
        let quizzes = vec![quiz(10, 1)];
        let detail = subject_progress_detail(
            &subject(1, "Math"),
            1,
            &[],
            &quizzes,
            &[],
            // Quiz 99 belongs to some other subject.
            &[result(10, 80), result(99, 20)],
        );

        assert_eq!(detail.completed_quizzes, 1);
        assert_eq!(detail.average_score, 80);
        assert_eq!(detail.quiz_results.len(), 1);
        assert_eq!(detail.quiz_results[0].quiz_title, "Quiz 10");
    }

    #[test]
    fn detail_average_is_mean_of_result_percentages() {
        let quizzes = vec![quiz(10, 1), quiz(11, 1)];
        let detail = subject_progress_detail(
            &subject(1, "Math"),
            1,
            &[],
            &quizzes,
            &[],
            &[result(10, 80), result(11, 61)],
        );

        assert_eq!(detail.average_score, 71); // round(141/2)
    }

    #[test]
    fn detail_with_no_results_has_zero_average() {
        let detail = subject_progress_detail(&subject(1, "Math"), 1, &[], &[], &[], &[]);
        assert_eq!(detail.average_score, 0);
        assert_eq!(detail.total_lessons, 0);
        assert_eq!(detail.total_quizzes, 0);
    }

    #[test]
    fn overall_average_is_weighted_by_completed_quiz_count() {
        // One subject with a single perfect score, one with nine mediocre
        // results: the overall must land at 55, not the unweighted 75.
        let subjects = vec![detail(1, 1, 100), detail(2, 9, 50)];
        let overall = overall_progress(1, &subjects);

        assert_eq!(overall.completed_quizzes, 10);
        assert_eq!(overall.average_score, 55);
    }

    #[test]
    fn overall_sums_counts_across_subjects() {
        let mut a = detail(1, 2, 90);
        a.completed_lessons = 3;
        a.total_lessons = 5;
        let mut b = detail(2, 0, 0);
        b.completed_lessons = 1;
        b.total_lessons = 4;

        let overall = overall_progress(1, &[a, b]);
        assert_eq!(overall.completed_lessons, 4);
        assert_eq!(overall.total_lessons, 9);
        assert_eq!(overall.subjects.len(), 2);
    }

    #[test]
    fn overall_with_no_quiz_results_has_zero_average() {
        let overall = overall_progress(1, &[detail(1, 0, 0)]);
        assert_eq!(overall.average_score, 0);
    }

    #[test]
    fn zero_weight_subjects_do_not_skew_the_average() {
        // A subject with no completed quizzes contributes nothing.
        let subjects = vec![detail(1, 0, 0), detail(2, 4, 80)];
        let overall = overall_progress(1, &subjects);
        assert_eq!(overall.average_score, 80);
    }
}
