use anyhow::Result;
use std::env;

use learning_portal::{
    CreateLearnerRequest, CreateLessonRequest, CreateOptionRequest, CreateQuestionRequest,
    CreateQuizRequest, CreateSubjectRequest, Database, Difficulty, LearningService, QuestionType,
    QuizType,
};

/// Seed a database with a small demo catalog so the API is usable right
/// away: one grade, two subjects with lessons, and a practice quiz per
/// subject. Idempotent only in the sense that re-running against a fresh
/// database is safe; the unique subject names will reject a second run.
#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt::init();

    let database_url =
        env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite:learning_portal.db".to_string());

    println!("Seeding demo content into {}", database_url);

    let db = Database::new(&database_url).await?;
    let service = LearningService::new(db);

    let grade = service.create_grade("Grade 6".to_string()).await?;
    println!("Created grade: {} (id {})", grade.name, grade.id);

    let learner = service
        .create_learner(CreateLearnerRequest {
            username: "demo".to_string(),
            full_name: "Demo Learner".to_string(),
            grade_id: Some(grade.id),
        })
        .await?;
    println!("Created learner: {} (id {})", learner.username, learner.id);

    for (subject_name, lesson_titles) in [
        (
            "Mathematics",
            vec!["Whole numbers", "Fractions", "Decimals", "Ratios"],
        ),
        (
            "Science",
            vec!["The scientific method", "States of matter", "Ecosystems"],
        ),
    ] {
        let subject = service
            .create_subject(CreateSubjectRequest {
                name: subject_name.to_string(),
                description: Some(format!("{} for grade 6", subject_name)),
            })
            .await?;
        println!("Created subject: {} (id {})", subject.name, subject.id);

        for (index, title) in lesson_titles.iter().enumerate() {
            service
                .create_lesson(CreateLessonRequest {
                    title: title.to_string(),
                    description: None,
                    subject_id: subject.id,
                    grade_id: grade.id,
                    difficulty: if index == 0 {
                        Difficulty::Basic
                    } else {
                        Difficulty::Intermediate
                    },
                    order_index: index as i64,
                })
                .await?;
        }
        println!("  {} lessons", lesson_titles.len());

        let quiz = service
            .create_quiz(CreateQuizRequest {
                title: format!("{} warm-up quiz", subject_name),
                description: None,
                subject_id: subject.id,
                grade_id: grade.id,
                lesson_id: None,
                quiz_type: QuizType::Practice,
                difficulty: Difficulty::Basic,
                time_limit_minutes: Some(10),
                passing_score: 70,
                questions: vec![
                    CreateQuestionRequest {
                        text: format!("Which of these belongs to {}?", subject_name),
                        question_type: QuestionType::Single,
                        points: 5,
                        explanation: None,
                        order_index: 0,
                        options: vec![
                            CreateOptionRequest {
                                text: "The right answer".to_string(),
                                is_correct: true,
                                order_index: 0,
                            },
                            CreateOptionRequest {
                                text: "A wrong answer".to_string(),
                                is_correct: false,
                                order_index: 1,
                            },
                            CreateOptionRequest {
                                text: "Another wrong answer".to_string(),
                                is_correct: false,
                                order_index: 2,
                            },
                        ],
                    },
                    CreateQuestionRequest {
                        text: "Select all statements that are true.".to_string(),
                        question_type: QuestionType::Multiple,
                        points: 4,
                        explanation: None,
                        order_index: 1,
                        options: vec![
                            CreateOptionRequest {
                                text: "True statement one".to_string(),
                                is_correct: true,
                                order_index: 0,
                            },
                            CreateOptionRequest {
                                text: "True statement two".to_string(),
                                is_correct: true,
                                order_index: 1,
                            },
                            CreateOptionRequest {
                                text: "A false statement".to_string(),
                                is_correct: false,
                                order_index: 2,
                            },
                        ],
                    },
                ],
            })
            .await?;
        println!("  quiz: {} (id {})", quiz.quiz.title, quiz.quiz.id);
    }

    println!("Seeding complete.");
    Ok(())
}
