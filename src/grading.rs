use chrono::Utc;

use crate::models::*;

/// Grade a quiz submission against the full quiz definition.
///
/// Pure with respect to its inputs: persisting the resulting attempt record
/// is the caller's job, which keeps the scoring rules deterministic and
/// testable without a database.
///
/// Answers referencing question ids that are not part of the quiz are
/// ignored; the loop walks the quiz's questions, never the submission.
pub fn grade_submission(
    quiz: &FullQuiz,
    learner_id: i64,
    answers: &[QuestionAnswer],
    time_spent_seconds: i64,
) -> GradedQuiz {
    let mut score = 0;
    let mut max_score = 0;
    let mut question_results = Vec::with_capacity(quiz.questions.len());

    for entry in &quiz.questions {
        let question = &entry.question;
        max_score += question.points;

        let selected: &[i64] = answers
            .iter()
            .find(|a| a.question_id == question.id)
            .map(|a| a.selected_option_ids.as_slice())
            .unwrap_or(&[]);

        let (earned_points, is_correct) = grade_question(question, &entry.options, selected);
        score += earned_points;

        question_results.push(QuestionResult {
            question_id: question.id,
            question_text: question.text.clone(),
            points: question.points,
            earned_points,
            is_correct,
            selected_options: selected
                .iter()
                .map(|&id| annotate_selection(&entry.options, id))
                .collect(),
            correct_options: entry
                .options
                .iter()
                .filter(|o| o.is_correct)
                .map(|o| CorrectOption {
                    option_id: o.id,
                    option_text: o.text.clone(),
                })
                .collect(),
        });
    }

    let percentage = percentage_of(score, max_score);

    GradedQuiz {
        quiz_id: quiz.quiz.id,
        learner_id,
        score,
        max_score,
        percentage,
        passed: percentage >= quiz.quiz.passing_score,
        time_spent_seconds,
        submitted_at: Utc::now(),
        question_results,
    }
}

/// Score a single question. Returns (earned points, counted-as-correct).
///
/// A question only counts as correct at full points; partial credit on a
/// multi-choice question is still marked incorrect for history purposes.
fn grade_question(
    question: &Question,
    options: &[AnswerOption],
    selected: &[i64],
) -> (i64, bool) {
    // Unanswered (or answered with an empty set) always scores zero.
    if selected.is_empty() {
        return (0, false);
    }

    let correct: Vec<i64> = options.iter().filter(|o| o.is_correct).map(|o| o.id).collect();

    match question.question_type {
        QuestionType::Single => {
            if selected.len() == 1 && correct.contains(&selected[0]) {
                (question.points, true)
            } else {
                (0, false)
            }
        }
        QuestionType::Multiple => {
            let all_correct_selected = correct.iter().all(|id| selected.contains(id));
            let no_incorrect_selected = selected.iter().all(|id| correct.contains(id));

            if all_correct_selected && no_incorrect_selected {
                (question.points, true)
            } else if all_correct_selected || no_incorrect_selected {
                // Half credit: either a clean subset of the correct set, or
                // the whole correct set plus extras.
                (question.points / 2, false)
            } else {
                (0, false)
            }
        }
    }
}

fn annotate_selection(options: &[AnswerOption], option_id: i64) -> SelectedOption {
    match options.iter().find(|o| o.id == option_id) {
        Some(option) => SelectedOption {
            option_id,
            option_text: option.text.clone(),
            is_correct: option.is_correct,
        },
        // Unknown option id: keep it visible in the review, marked wrong.
        None => SelectedOption {
            option_id,
            option_text: String::new(),
            is_correct: false,
        },
    }
}

/// Integer percentage with standard rounding; 0 when the denominator is 0.
pub fn percentage_of(score: i64, max_score: i64) -> i64 {
    if max_score == 0 {
        return 0;
    }
    ((score as f64 / max_score as f64) * 100.0).round() as i64
}

#[cfg(test)]
mod tests {
    use super::*;

    fn option(id: i64, question_id: i64, is_correct: bool) -> AnswerOption {
        AnswerOption {
            id,
            question_id,
            text: format!("Option {}", id),
            is_correct,
            order_index: id,
        }
    }

    fn question(
        id: i64,
        question_type: QuestionType,
        points: i64,
        options: Vec<AnswerOption>,
    ) -> QuestionWithOptions {
        QuestionWithOptions {
            question: Question {
                id,
                quiz_id: 1,
                text: format!("Question {}", id),
                question_type,
                points,
                explanation: None,
                order_index: id,
            },
            options,
        }
    }

    fn quiz(passing_score: i64, questions: Vec<QuestionWithOptions>) -> FullQuiz {
        FullQuiz {
            quiz: Quiz {
                id: 1,
                title: "Fractions".to_string(),
                description: None,
                subject_id: 1,
                grade_id: 1,
                lesson_id: None,
                quiz_type: QuizType::Practice,
                difficulty: Difficulty::Basic,
                time_limit_minutes: None,
                passing_score,
            },
            questions,
        }
    }

    fn answer(question_id: i64, selected: &[i64]) -> QuestionAnswer {
        QuestionAnswer {
            question_id,
            selected_option_ids: selected.to_vec(),
        }
    }

    #[test]
    fn single_choice_full_points_on_exact_match() {
        let q = quiz(
            70,
            vec![question(
                1,
                QuestionType::Single,
                5,
                vec![option(10, 1, true), option(11, 1, false)],
            )],
        );

        let graded = grade_submission(&q, 1, &[answer(1, &[10])], 30);
        assert_eq!(graded.score, 5);
        assert!(graded.question_results[0].is_correct);
        assert_eq!(graded.question_results[0].earned_points, 5);
    }

    #[test]
    fn single_choice_wrong_option_scores_zero() {
        let q = quiz(
            70,
            vec![question(
                1,
                QuestionType::Single,
                5,
                vec![option(10, 1, true), option(11, 1, false)],
            )],
        );

        let graded = grade_submission(&q, 1, &[answer(1, &[11])], 30);
        assert_eq!(graded.score, 0);
        assert!(!graded.question_results[0].is_correct);
    }

    #[test]
    fn single_choice_multiple_selections_score_zero() {
        // Even when the correct option is among them.
        let q = quiz(
            70,
            vec![question(
                1,
                QuestionType::Single,
                5,
                vec![option(10, 1, true), option(11, 1, false)],
            )],
        );

        let graded = grade_submission(&q, 1, &[answer(1, &[10, 11])], 30);
        assert_eq!(graded.score, 0);
    }

    #[test]
    fn multi_choice_partial_credit_table() {
        // Correct set {A=10, B=11}, distractor C=12, worth 4 points.
        let make = || {
            quiz(
                70,
                vec![question(
                    1,
                    QuestionType::Multiple,
                    4,
                    vec![option(10, 1, true), option(11, 1, true), option(12, 1, false)],
                )],
            )
        };

        // {A,B} -> full 4 points, correct.
        let graded = grade_submission(&make(), 1, &[answer(1, &[10, 11])], 0);
        assert_eq!(graded.question_results[0].earned_points, 4);
        assert!(graded.question_results[0].is_correct);

        // {A} -> strict subset, floor(4/2) = 2, not correct.
        let graded = grade_submission(&make(), 1, &[answer(1, &[10])], 0);
        assert_eq!(graded.question_results[0].earned_points, 2);
        assert!(!graded.question_results[0].is_correct);

        // {A,B,C} -> all correct plus an extra, 2 points.
        let graded = grade_submission(&make(), 1, &[answer(1, &[10, 11, 12])], 0);
        assert_eq!(graded.question_results[0].earned_points, 2);
        assert!(!graded.question_results[0].is_correct);

        // {C} -> disjoint from the correct set, 0 points.
        let graded = grade_submission(&make(), 1, &[answer(1, &[12])], 0);
        assert_eq!(graded.question_results[0].earned_points, 0);
    }

    #[test]
    fn multi_choice_partial_credit_floors_odd_points() {
        let q = quiz(
            70,
            vec![question(
                1,
                QuestionType::Multiple,
                5,
                vec![option(10, 1, true), option(11, 1, true)],
            )],
        );

        let graded = grade_submission(&q, 1, &[answer(1, &[10])], 0);
        assert_eq!(graded.question_results[0].earned_points, 2); // floor(5/2)
    }

    #[test]
    fn empty_selection_scores_zero_for_both_types() {
        let q = quiz(
            70,
            vec![
                question(1, QuestionType::Single, 5, vec![option(10, 1, true)]),
                question(
                    2,
                    QuestionType::Multiple,
                    4,
                    vec![option(20, 2, true), option(21, 2, false)],
                ),
            ],
        );

        let graded = grade_submission(&q, 1, &[answer(1, &[]), answer(2, &[])], 0);
        assert_eq!(graded.score, 0);
        assert!(graded.question_results.iter().all(|r| !r.is_correct));
        assert!(graded.question_results.iter().all(|r| r.earned_points == 0));
    }

    #[test]
    fn unanswered_question_reports_correct_options_for_review() {
        let q = quiz(
            70,
            vec![question(
                1,
                QuestionType::Single,
                5,
                vec![option(10, 1, true), option(11, 1, false)],
            )],
        );

        let graded = grade_submission(&q, 1, &[], 0);
        let result = &graded.question_results[0];
        assert!(result.selected_options.is_empty());
        assert_eq!(result.correct_options.len(), 1);
        assert_eq!(result.correct_options[0].option_id, 10);
    }

    #[test]
    fn unknown_question_ids_in_submission_are_ignored() {
        let q = quiz(
            70,
            vec![question(1, QuestionType::Single, 5, vec![option(10, 1, true)])],
        );

        let graded = grade_submission(&q, 1, &[answer(999, &[10]), answer(1, &[10])], 0);
        assert_eq!(graded.question_results.len(), 1);
        assert_eq!(graded.score, 5);
    }

    #[test]
    fn unknown_option_id_annotated_as_incorrect() {
        let q = quiz(
            70,
            vec![question(1, QuestionType::Single, 5, vec![option(10, 1, true)])],
        );

        let graded = grade_submission(&q, 1, &[answer(1, &[999])], 0);
        let sel = &graded.question_results[0].selected_options[0];
        assert_eq!(sel.option_id, 999);
        assert_eq!(sel.option_text, "");
        assert!(!sel.is_correct);
    }

    #[test]
    fn percentage_rounds_and_guards_zero_max() {
        assert_eq!(percentage_of(5, 10), 50);
        assert_eq!(percentage_of(1, 3), 33);
        assert_eq!(percentage_of(2, 3), 67);
        assert_eq!(percentage_of(0, 0), 0);
        assert_eq!(percentage_of(10, 10), 100);
    }

    #[test]
    fn quiz_with_no_questions_grades_to_zero_percent() {
        let q = quiz(70, vec![]);
        let graded = grade_submission(&q, 1, &[], 0);
        assert_eq!(graded.max_score, 0);
        assert_eq!(graded.percentage, 0);
        assert!(!graded.passed);
    }

    #[test]
    fn passing_follows_threshold() {
        let make = |passing| {
            quiz(
                passing,
                vec![
                    question(1, QuestionType::Single, 5, vec![option(10, 1, true)]),
                    question(2, QuestionType::Single, 5, vec![option(20, 2, true)]),
                ],
            )
        };

        // Exactly at the threshold passes.
        let graded = grade_submission(&make(50), 1, &[answer(1, &[10])], 0);
        assert_eq!(graded.percentage, 50);
        assert!(graded.passed);

        let graded = grade_submission(&make(51), 1, &[answer(1, &[10])], 0);
        assert!(!graded.passed);
    }

    #[test]
    fn half_answered_quiz_end_to_end() {
        // Two single-choice questions worth 5 each; Q1 right, Q2 unanswered.
        let q = quiz(
            70,
            vec![
                question(1, QuestionType::Single, 5, vec![option(10, 1, true), option(11, 1, false)]),
                question(2, QuestionType::Single, 5, vec![option(20, 2, true), option(21, 2, false)]),
            ],
        );

        let graded = grade_submission(&q, 7, &[answer(1, &[10])], 120);
        assert_eq!(graded.score, 5);
        assert_eq!(graded.max_score, 10);
        assert_eq!(graded.percentage, 50);
        assert!(!graded.passed);
        assert_eq!(graded.time_spent_seconds, 120);
        assert_eq!(graded.learner_id, 7);
    }
}
