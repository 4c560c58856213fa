use anyhow::{anyhow, Result};
use chrono::{DateTime, Utc};
use sqlx::{
    sqlite::{SqlitePoolOptions, SqliteRow},
    Row, SqlitePool,
};

use crate::models::*;

/// Data-access boundary. All snake_case column naming and enum encodings
/// live here; the rest of the crate only sees the canonical structs from
/// `models`.
#[derive(Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    pub async fn new(database_url: &str) -> Result<Self> {
        // An in-memory database exists per connection, so the pool must
        // stay at one connection for every handle to see the migrated
        // schema.
        let max_connections = if database_url.contains(":memory:") { 1 } else { 5 };
        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;
        let db = Database { pool };
        db.migrate().await?;
        Ok(db)
    }

    async fn migrate(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS learners (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                username TEXT NOT NULL UNIQUE,
                full_name TEXT NOT NULL,
                grade_id INTEGER,
                created_at TEXT NOT NULL
            );
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS grades (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL UNIQUE
            );
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS subjects (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL UNIQUE,
                description TEXT
            );
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS lessons (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                title TEXT NOT NULL,
                description TEXT,
                subject_id INTEGER NOT NULL,
                grade_id INTEGER NOT NULL,
                difficulty_level TEXT NOT NULL,
                order_index INTEGER NOT NULL,
                FOREIGN KEY (subject_id) REFERENCES subjects(id) ON DELETE CASCADE
            );
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS quizzes (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                title TEXT NOT NULL,
                description TEXT,
                subject_id INTEGER NOT NULL,
                grade_id INTEGER NOT NULL,
                lesson_id INTEGER,
                quiz_type TEXT NOT NULL,
                difficulty_level TEXT NOT NULL,
                time_limit INTEGER,
                passing_score INTEGER NOT NULL,
                FOREIGN KEY (subject_id) REFERENCES subjects(id) ON DELETE CASCADE,
                FOREIGN KEY (lesson_id) REFERENCES lessons(id) ON DELETE SET NULL
            );
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS quiz_questions (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                quiz_id INTEGER NOT NULL,
                question_text TEXT NOT NULL,
                question_type TEXT NOT NULL,
                points INTEGER NOT NULL,
                explanation TEXT,
                order_index INTEGER NOT NULL,
                FOREIGN KEY (quiz_id) REFERENCES quizzes(id) ON DELETE CASCADE
            );
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS quiz_options (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                question_id INTEGER NOT NULL,
                option_text TEXT NOT NULL,
                is_correct INTEGER NOT NULL DEFAULT 0,
                order_index INTEGER NOT NULL,
                FOREIGN KEY (question_id) REFERENCES quiz_questions(id) ON DELETE CASCADE
            );
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS user_progress (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id INTEGER NOT NULL,
                lesson_id INTEGER NOT NULL,
                status TEXT NOT NULL DEFAULT 'not_started',
                progress_percentage INTEGER NOT NULL DEFAULT 0,
                last_accessed_at TEXT,
                UNIQUE (user_id, lesson_id),
                FOREIGN KEY (user_id) REFERENCES learners(id) ON DELETE CASCADE,
                FOREIGN KEY (lesson_id) REFERENCES lessons(id) ON DELETE CASCADE
            );
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS user_quiz_results (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id INTEGER NOT NULL,
                quiz_id INTEGER NOT NULL,
                score INTEGER NOT NULL,
                max_score INTEGER NOT NULL,
                percentage INTEGER NOT NULL,
                passed INTEGER NOT NULL,
                time_spent INTEGER NOT NULL DEFAULT 0,
                submitted_at TEXT NOT NULL,
                FOREIGN KEY (user_id) REFERENCES learners(id) ON DELETE CASCADE,
                FOREIGN KEY (quiz_id) REFERENCES quizzes(id) ON DELETE CASCADE
            );
            "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    // Learner operations
    pub async fn create_learner(&self, request: CreateLearnerRequest) -> Result<Learner> {
        let created_at = Utc::now();
        let result = sqlx::query(
            "INSERT INTO learners (username, full_name, grade_id, created_at) VALUES (?1, ?2, ?3, ?4)",
        )
        .bind(&request.username)
        .bind(&request.full_name)
        .bind(request.grade_id)
        .bind(created_at.to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(Learner {
            id: result.last_insert_rowid(),
            username: request.username,
            full_name: request.full_name,
            grade_id: request.grade_id,
            created_at,
        })
    }

    pub async fn get_learner(&self, id: i64) -> Result<Option<Learner>> {
        let row = sqlx::query("SELECT * FROM learners WHERE id = ?1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(|r| row_to_learner(&r)).transpose()
    }

    // Grade operations
    pub async fn create_grade(&self, name: String) -> Result<Grade> {
        let result = sqlx::query("INSERT INTO grades (name) VALUES (?1)")
            .bind(&name)
            .execute(&self.pool)
            .await?;

        Ok(Grade {
            id: result.last_insert_rowid(),
            name,
        })
    }

    pub async fn get_all_grades(&self) -> Result<Vec<Grade>> {
        let rows = sqlx::query("SELECT * FROM grades ORDER BY name")
            .fetch_all(&self.pool)
            .await?;

        rows.iter()
            .map(|r| {
                Ok(Grade {
                    id: r.get("id"),
                    name: r.get("name"),
                })
            })
            .collect()
    }

    // Subject operations
    pub async fn create_subject(&self, request: CreateSubjectRequest) -> Result<Subject> {
        let result = sqlx::query("INSERT INTO subjects (name, description) VALUES (?1, ?2)")
            .bind(&request.name)
            .bind(&request.description)
            .execute(&self.pool)
            .await?;

        Ok(Subject {
            id: result.last_insert_rowid(),
            name: request.name,
            description: request.description,
        })
    }

    pub async fn get_subject(&self, id: i64) -> Result<Option<Subject>> {
        let row = sqlx::query("SELECT * FROM subjects WHERE id = ?1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(|r| row_to_subject(&r)))
    }

    pub async fn get_all_subjects(&self) -> Result<Vec<Subject>> {
        let rows = sqlx::query("SELECT * FROM subjects ORDER BY name")
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.iter().map(row_to_subject).collect())
    }

    /// Subjects that have at least one lesson in the given grade.
    pub async fn get_subjects_by_grade(&self, grade_id: i64) -> Result<Vec<Subject>> {
        let rows = sqlx::query(
            r#"
            SELECT DISTINCT s.*
            FROM subjects s
            JOIN lessons l ON s.id = l.subject_id
            WHERE l.grade_id = ?1
            ORDER BY s.name
            "#,
        )
        .bind(grade_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(row_to_subject).collect())
    }

    // Lesson operations
    pub async fn create_lesson(&self, request: CreateLessonRequest) -> Result<Lesson> {
        let result = sqlx::query(
            r#"
            INSERT INTO lessons (title, description, subject_id, grade_id, difficulty_level, order_index)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
        )
        .bind(&request.title)
        .bind(&request.description)
        .bind(request.subject_id)
        .bind(request.grade_id)
        .bind(request.difficulty.as_str())
        .bind(request.order_index)
        .execute(&self.pool)
        .await?;

        Ok(Lesson {
            id: result.last_insert_rowid(),
            title: request.title,
            description: request.description,
            subject_id: request.subject_id,
            grade_id: request.grade_id,
            difficulty: request.difficulty,
            order_index: request.order_index,
        })
    }

    pub async fn get_lesson(&self, id: i64) -> Result<Option<Lesson>> {
        let row = sqlx::query("SELECT * FROM lessons WHERE id = ?1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(|r| row_to_lesson(&r)).transpose()
    }

    pub async fn get_lessons_for_subject_and_grade(
        &self,
        subject_id: i64,
        grade_id: i64,
    ) -> Result<Vec<Lesson>> {
        let rows = sqlx::query(
            "SELECT * FROM lessons WHERE subject_id = ?1 AND grade_id = ?2 ORDER BY order_index",
        )
        .bind(subject_id)
        .bind(grade_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_lesson).collect()
    }

    // Quiz operations
    pub async fn create_quiz(&self, request: CreateQuizRequest) -> Result<FullQuiz> {
        let result = sqlx::query(
            r#"
            INSERT INTO quizzes (title, description, subject_id, grade_id, lesson_id,
                                 quiz_type, difficulty_level, time_limit, passing_score)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
        )
        .bind(&request.title)
        .bind(&request.description)
        .bind(request.subject_id)
        .bind(request.grade_id)
        .bind(request.lesson_id)
        .bind(request.quiz_type.as_str())
        .bind(request.difficulty.as_str())
        .bind(request.time_limit_minutes)
        .bind(request.passing_score)
        .execute(&self.pool)
        .await?;

        let quiz_id = result.last_insert_rowid();

        for question in &request.questions {
            let question_result = sqlx::query(
                r#"
                INSERT INTO quiz_questions (quiz_id, question_text, question_type, points, explanation, order_index)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                "#,
            )
            .bind(quiz_id)
            .bind(&question.text)
            .bind(question.question_type.as_str())
            .bind(question.points)
            .bind(&question.explanation)
            .bind(question.order_index)
            .execute(&self.pool)
            .await?;

            let question_id = question_result.last_insert_rowid();

            for option in &question.options {
                sqlx::query(
                    r#"
                    INSERT INTO quiz_options (question_id, option_text, is_correct, order_index)
                    VALUES (?1, ?2, ?3, ?4)
                    "#,
                )
                .bind(question_id)
                .bind(&option.text)
                .bind(option.is_correct)
                .bind(option.order_index)
                .execute(&self.pool)
                .await?;
            }
        }

        self.get_full_quiz(quiz_id)
            .await?
            .ok_or_else(|| anyhow!("quiz {} missing immediately after insert", quiz_id))
    }

    pub async fn get_quiz(&self, id: i64) -> Result<Option<Quiz>> {
        let row = sqlx::query("SELECT * FROM quizzes WHERE id = ?1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(|r| row_to_quiz(&r)).transpose()
    }

    /// Assemble a quiz with its questions and options, both in order-index
    /// order.
    pub async fn get_full_quiz(&self, id: i64) -> Result<Option<FullQuiz>> {
        let Some(quiz) = self.get_quiz(id).await? else {
            return Ok(None);
        };

        let question_rows = sqlx::query(
            "SELECT * FROM quiz_questions WHERE quiz_id = ?1 ORDER BY order_index",
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await?;

        let mut questions = Vec::with_capacity(question_rows.len());
        for question_row in &question_rows {
            let question = row_to_question(question_row)?;
            let option_rows = sqlx::query(
                "SELECT * FROM quiz_options WHERE question_id = ?1 ORDER BY order_index",
            )
            .bind(question.id)
            .fetch_all(&self.pool)
            .await?;

            let options = option_rows
                .iter()
                .map(row_to_option)
                .collect::<Result<Vec<_>>>()?;

            questions.push(QuestionWithOptions { question, options });
        }

        Ok(Some(FullQuiz { quiz, questions }))
    }

    pub async fn get_quizzes_for_subject_and_grade(
        &self,
        subject_id: i64,
        grade_id: i64,
    ) -> Result<Vec<Quiz>> {
        let rows = sqlx::query(
            r#"
            SELECT * FROM quizzes
            WHERE subject_id = ?1 AND grade_id = ?2
            ORDER BY quiz_type, difficulty_level, title
            "#,
        )
        .bind(subject_id)
        .bind(grade_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_quiz).collect()
    }

    // Progress operations
    /// Create-or-update the learner's record for a lesson. Last write wins;
    /// there is deliberately no version check here.
    pub async fn upsert_progress(
        &self,
        learner_id: i64,
        lesson_id: i64,
        status: LessonStatus,
        completion_percentage: i64,
        last_accessed_at: DateTime<Utc>,
    ) -> Result<ProgressRecord> {
        sqlx::query(
            r#"
            INSERT INTO user_progress (user_id, lesson_id, status, progress_percentage, last_accessed_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            ON CONFLICT (user_id, lesson_id) DO UPDATE SET
                status = excluded.status,
                progress_percentage = excluded.progress_percentage,
                last_accessed_at = excluded.last_accessed_at
            "#,
        )
        .bind(learner_id)
        .bind(lesson_id)
        .bind(status.as_str())
        .bind(completion_percentage)
        .bind(last_accessed_at.to_rfc3339())
        .execute(&self.pool)
        .await?;

        self.get_progress_for_lesson(learner_id, lesson_id)
            .await?
            .ok_or_else(|| {
                anyhow!(
                    "progress record for learner {} lesson {} missing after upsert",
                    learner_id,
                    lesson_id
                )
            })
    }

    pub async fn get_progress_for_lesson(
        &self,
        learner_id: i64,
        lesson_id: i64,
    ) -> Result<Option<ProgressRecord>> {
        let row = sqlx::query("SELECT * FROM user_progress WHERE user_id = ?1 AND lesson_id = ?2")
            .bind(learner_id)
            .bind(lesson_id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(|r| row_to_progress(&r)).transpose()
    }

    pub async fn get_progress_for_learner(&self, learner_id: i64) -> Result<Vec<ProgressRecord>> {
        let rows = sqlx::query(
            "SELECT * FROM user_progress WHERE user_id = ?1 ORDER BY last_accessed_at DESC",
        )
        .bind(learner_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_progress).collect()
    }

    // Quiz result operations
    /// Append-only: every submission inserts a fresh row, retakes included.
    pub async fn insert_quiz_result(&self, graded: &GradedQuiz) -> Result<QuizResult> {
        let result = sqlx::query(
            r#"
            INSERT INTO user_quiz_results (user_id, quiz_id, score, max_score, percentage,
                                           passed, time_spent, submitted_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
        )
        .bind(graded.learner_id)
        .bind(graded.quiz_id)
        .bind(graded.score)
        .bind(graded.max_score)
        .bind(graded.percentage)
        .bind(graded.passed)
        .bind(graded.time_spent_seconds)
        .bind(graded.submitted_at.to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(QuizResult {
            id: result.last_insert_rowid(),
            learner_id: graded.learner_id,
            quiz_id: graded.quiz_id,
            score: graded.score,
            max_score: graded.max_score,
            percentage: graded.percentage,
            passed: graded.passed,
            time_spent_seconds: graded.time_spent_seconds,
            submitted_at: graded.submitted_at,
        })
    }

    pub async fn get_quiz_results_for_learner(&self, learner_id: i64) -> Result<Vec<QuizResult>> {
        let rows = sqlx::query(
            "SELECT * FROM user_quiz_results WHERE user_id = ?1 ORDER BY submitted_at DESC",
        )
        .bind(learner_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_result).collect()
    }

    pub async fn get_quiz_results_for_subject(
        &self,
        learner_id: i64,
        subject_id: i64,
        grade_id: i64,
    ) -> Result<Vec<QuizResult>> {
        let rows = sqlx::query(
            r#"
            SELECT r.* FROM user_quiz_results r
            JOIN quizzes q ON q.id = r.quiz_id
            WHERE r.user_id = ?1 AND q.subject_id = ?2 AND q.grade_id = ?3
            ORDER BY r.submitted_at DESC
            "#,
        )
        .bind(learner_id)
        .bind(subject_id)
        .bind(grade_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_result).collect()
    }
}

// Row mapping helpers. Enum and timestamp encodings are confined to this
// file.

fn parse_datetime(value: &str) -> Result<DateTime<Utc>> {
    Ok(DateTime::parse_from_rfc3339(value)?.with_timezone(&Utc))
}

fn parse_optional_datetime(value: Option<String>) -> Option<DateTime<Utc>> {
    value.and_then(|s| DateTime::parse_from_rfc3339(&s).ok().map(|dt| dt.with_timezone(&Utc)))
}

fn parse_difficulty(value: &str) -> Result<Difficulty> {
    Difficulty::parse(value).ok_or_else(|| anyhow!("unknown difficulty level '{}'", value))
}

fn parse_quiz_type(value: &str) -> Result<QuizType> {
    QuizType::parse(value).ok_or_else(|| anyhow!("unknown quiz type '{}'", value))
}

fn parse_question_type(value: &str) -> Result<QuestionType> {
    QuestionType::parse(value).ok_or_else(|| anyhow!("unknown question type '{}'", value))
}

fn parse_status(value: &str) -> Result<LessonStatus> {
    LessonStatus::parse(value).ok_or_else(|| anyhow!("unknown progress status '{}'", value))
}

fn row_to_learner(row: &SqliteRow) -> Result<Learner> {
    Ok(Learner {
        id: row.get("id"),
        username: row.get("username"),
        full_name: row.get("full_name"),
        grade_id: row.get("grade_id"),
        created_at: parse_datetime(&row.get::<String, _>("created_at"))?,
    })
}

fn row_to_subject(row: &SqliteRow) -> Subject {
    Subject {
        id: row.get("id"),
        name: row.get("name"),
        description: row.get("description"),
    }
}

fn row_to_lesson(row: &SqliteRow) -> Result<Lesson> {
    Ok(Lesson {
        id: row.get("id"),
        title: row.get("title"),
        description: row.get("description"),
        subject_id: row.get("subject_id"),
        grade_id: row.get("grade_id"),
        difficulty: parse_difficulty(&row.get::<String, _>("difficulty_level"))?,
        order_index: row.get("order_index"),
    })
}

fn row_to_quiz(row: &SqliteRow) -> Result<Quiz> {
    Ok(Quiz {
        id: row.get("id"),
        title: row.get("title"),
        description: row.get("description"),
        subject_id: row.get("subject_id"),
        grade_id: row.get("grade_id"),
        lesson_id: row.get("lesson_id"),
        quiz_type: parse_quiz_type(&row.get::<String, _>("quiz_type"))?,
        difficulty: parse_difficulty(&row.get::<String, _>("difficulty_level"))?,
        time_limit_minutes: row.get("time_limit"),
        passing_score: row.get("passing_score"),
    })
}

fn row_to_question(row: &SqliteRow) -> Result<Question> {
    Ok(Question {
        id: row.get("id"),
        quiz_id: row.get("quiz_id"),
        text: row.get("question_text"),
        question_type: parse_question_type(&row.get::<String, _>("question_type"))?,
        points: row.get("points"),
        explanation: row.get("explanation"),
        order_index: row.get("order_index"),
    })
}

fn row_to_option(row: &SqliteRow) -> Result<AnswerOption> {
    Ok(AnswerOption {
        id: row.get("id"),
        question_id: row.get("question_id"),
        text: row.get("option_text"),
        is_correct: row.get("is_correct"),
        order_index: row.get("order_index"),
    })
}

fn row_to_progress(row: &SqliteRow) -> Result<ProgressRecord> {
    Ok(ProgressRecord {
        id: row.get("id"),
        learner_id: row.get("user_id"),
        lesson_id: row.get("lesson_id"),
        status: parse_status(&row.get::<String, _>("status"))?,
        completion_percentage: row.get("progress_percentage"),
        last_accessed_at: parse_optional_datetime(row.get::<Option<String>, _>("last_accessed_at")),
    })
}

fn row_to_result(row: &SqliteRow) -> Result<QuizResult> {
    Ok(QuizResult {
        id: row.get("id"),
        learner_id: row.get("user_id"),
        quiz_id: row.get("quiz_id"),
        score: row.get("score"),
        max_score: row.get("max_score"),
        percentage: row.get("percentage"),
        passed: row.get("passed"),
        time_spent_seconds: row.get("time_spent"),
        submitted_at: parse_datetime(&row.get::<String, _>("submitted_at"))?,
    })
}
