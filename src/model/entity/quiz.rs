use crate::model::access::{HasOwner, course_owner};
use crate::model::repo::ResourceTyped;
use crate::model::{ModelManager, error::DatabaseResult, repo::CrudRepository};
use crate::web::AuthenticatedUser;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use sqlx::PgConnection;
use sqlx::prelude::FromRow;
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize, FromRow, utoipa::ToSchema)]
pub struct Quiz {
    id: Uuid,
    course_id: Uuid,
    lesson_id: Option<Uuid>,
    title: String,
    pass_percentage: i32,
    created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, utoipa::ToSchema)]
pub struct QuizQuestion {
    id: Uuid,
    quiz_id: Uuid,
    question_text: String,
    order_index: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, utoipa::ToSchema)]
pub struct QuizOption {
    id: Uuid,
    question_id: Uuid,
    option_text: String,
    is_correct: bool,
    order_index: i32,
}

#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
pub struct QuizCreate {
    pub course_id: Uuid,
    pub lesson_id: Option<Uuid>,
    pub title: String,
    pub pass_percentage: Option<i32>,
    pub questions: Vec<QuizQuestionCreate>,
}

#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
pub struct QuizQuestionCreate {
    pub question_text: String,
    pub options: Vec<QuizOptionCreate>,
}

#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
pub struct QuizOptionCreate {
    pub option_text: String,
    #[serde(default)]
    pub is_correct: bool,
}

pub const DEFAULT_PASS_PERCENTAGE: i32 = 60;

impl QuizCreate {
    /// Returns a client-facing reason when the quiz is malformed.
    pub fn validate(&self) -> Result<(), String> {
        if self.title.trim().is_empty() {
            return Err("quiz title must not be empty".to_string());
        }
        if let Some(p) = self.pass_percentage {
            if !(0..=100).contains(&p) {
                return Err("pass_percentage must be between 0 and 100".to_string());
            }
        }
        if self.questions.is_empty() {
            return Err("quiz needs at least one question".to_string());
        }
        for (i, q) in self.questions.iter().enumerate() {
            if q.question_text.trim().is_empty() {
                return Err(format!("question {} has no text", i + 1));
            }
            if q.options.len() < 2 {
                return Err(format!("question {} needs at least two options", i + 1));
            }
            if !q.options.iter().any(|o| o.is_correct) {
                return Err(format!("question {} has no correct option", i + 1));
            }
        }
        Ok(())
    }
}

impl ResourceTyped for Quiz {
    fn get_resource_type() -> crate::model::ResourceType {
        crate::model::ResourceType::Quiz
    }
}

impl Quiz {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn course_id(&self) -> Uuid {
        self.course_id
    }

    pub fn lesson_id(&self) -> Option<Uuid> {
        self.lesson_id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn pass_percentage(&self) -> i32 {
        self.pass_percentage
    }
}

impl QuizQuestion {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn question_text(&self) -> &str {
        &self.question_text
    }

    pub fn order_index(&self) -> i32 {
        self.order_index
    }
}

impl QuizOption {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn question_id(&self) -> Uuid {
        self.question_id
    }

    pub fn option_text(&self) -> &str {
        &self.option_text
    }

    pub fn is_correct(&self) -> bool {
        self.is_correct
    }

    pub fn order_index(&self) -> i32 {
        self.order_index
    }
}

async fn insert_questions(
    conn: &mut PgConnection,
    quiz_id: Uuid,
    questions: &[QuizQuestionCreate],
) -> DatabaseResult<()> {
    for (index, question) in questions.iter().enumerate() {
        let question_id = Uuid::new_v4();
        sqlx::query(
            "INSERT INTO quiz_questions (id, quiz_id, question_text, order_index) VALUES ($1,$2,$3,$4)",
        )
        .bind(question_id)
        .bind(quiz_id)
        .bind(&question.question_text)
        .bind(index as i32)
        .execute(&mut *conn)
        .await?;

        for (option_index, option) in question.options.iter().enumerate() {
            sqlx::query(
                "INSERT INTO quiz_options (id, question_id, option_text, is_correct, order_index) VALUES ($1,$2,$3,$4,$5)",
            )
            .bind(Uuid::new_v4())
            .bind(question_id)
            .bind(&option.option_text)
            .bind(option.is_correct)
            .bind(option_index as i32)
            .execute(&mut *conn)
            .await?;
        }
    }
    Ok(())
}

#[async_trait]
impl CrudRepository<Quiz, QuizCreate, uuid::Uuid> for Quiz {
    async fn create(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        data: QuizCreate,
    ) -> DatabaseResult<Self> {
        let mut tx = mm.begin().await?;

        let quiz: Quiz = sqlx::query_as(
            r#"
            INSERT INTO quizzes (id, course_id, lesson_id, title, pass_percentage)
            VALUES ($1,$2,$3,$4,$5)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(data.course_id)
        .bind(data.lesson_id)
        .bind(&data.title)
        .bind(data.pass_percentage.unwrap_or(DEFAULT_PASS_PERCENTAGE))
        .fetch_one(&mut *tx)
        .await?;

        insert_questions(&mut tx, quiz.id, &data.questions).await?;
        tx.commit().await?;

        Ok(quiz)
    }

    /// Replaces the question set as a whole.
    async fn update(
        mut self,
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        data: QuizCreate,
    ) -> DatabaseResult<Self> {
        let pass_percentage = data.pass_percentage.unwrap_or(self.pass_percentage);
        let mut tx = mm.begin().await?;

        sqlx::query("UPDATE quizzes SET lesson_id = $1, title = $2, pass_percentage = $3 WHERE id = $4")
            .bind(data.lesson_id)
            .bind(&data.title)
            .bind(pass_percentage)
            .bind(self.id)
            .execute(&mut *tx)
            .await?;

        sqlx::query("DELETE FROM quiz_questions WHERE quiz_id = $1")
            .bind(self.id)
            .execute(&mut *tx)
            .await?;
        insert_questions(&mut tx, self.id, &data.questions).await?;
        tx.commit().await?;

        self.lesson_id = data.lesson_id;
        self.title = data.title;
        self.pass_percentage = pass_percentage;
        Ok(self)
    }

    async fn delete(self, mm: &ModelManager, _actor: &AuthenticatedUser) -> DatabaseResult<()> {
        sqlx::query("DELETE FROM quizzes WHERE id = $1")
            .bind(self.id)
            .execute(mm.executor())
            .await?;
        Ok(())
    }

    async fn find_by_id(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        id: uuid::Uuid,
    ) -> DatabaseResult<Option<Self>> {
        let result = sqlx::query_as("SELECT * FROM quizzes WHERE id = $1")
            .bind(id)
            .fetch_optional(mm.executor())
            .await?;
        Ok(result)
    }

    async fn list(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        limit: i64,
        offset: i64,
    ) -> DatabaseResult<Vec<Self>> {
        let result = sqlx::query_as("SELECT * FROM quizzes ORDER BY created_at LIMIT $1 OFFSET $2")
            .bind(limit)
            .bind(offset)
            .fetch_all(mm.executor())
            .await?;
        Ok(result)
    }

    async fn count(mm: &ModelManager, _actor: &AuthenticatedUser) -> DatabaseResult<i64> {
        let result: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM quizzes")
            .fetch_one(mm.executor())
            .await?;

        Ok(result)
    }
}

#[async_trait]
impl HasOwner for Quiz {
    type OwnerId = uuid::Uuid;

    async fn get_owner_id(
        &self,
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
    ) -> DatabaseResult<Self::OwnerId> {
        course_owner(mm, self.course_id).await
    }
}

impl Quiz {
    pub async fn all_by_course(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        course_id: Uuid,
    ) -> DatabaseResult<Vec<Self>> {
        let result = sqlx::query_as("SELECT * FROM quizzes WHERE course_id = $1 ORDER BY created_at")
            .bind(course_id)
            .fetch_all(mm.executor())
            .await?;
        Ok(result)
    }

    /// Questions in order, each paired with its options.
    pub async fn questions(
        &self,
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
    ) -> DatabaseResult<Vec<(QuizQuestion, Vec<QuizOption>)>> {
        let questions: Vec<QuizQuestion> = sqlx::query_as(
            "SELECT * FROM quiz_questions WHERE quiz_id = $1 ORDER BY order_index",
        )
        .bind(self.id)
        .fetch_all(mm.executor())
        .await?;

        let options: Vec<QuizOption> = sqlx::query_as(
            r#"
            SELECT o.*
            FROM quiz_options o
            JOIN quiz_questions q ON q.id = o.question_id
            WHERE q.quiz_id = $1
            ORDER BY o.order_index
            "#,
        )
        .bind(self.id)
        .fetch_all(mm.executor())
        .await?;

        Ok(group_options(questions, options))
    }
}

/// Number of questions whose selected option is a correct one. `selected` maps a question
/// id to the chosen option id; unanswered questions score nothing.
pub fn score_answers(
    questions: &[(QuizQuestion, Vec<QuizOption>)],
    selected: &HashMap<Uuid, Uuid>,
) -> i32 {
    questions
        .iter()
        .filter(|(question, options)| {
            selected.get(&question.id).is_some_and(|chosen| {
                options
                    .iter()
                    .any(|option| option.id == *chosen && option.is_correct)
            })
        })
        .count() as i32
}

fn group_options(
    questions: Vec<QuizQuestion>,
    options: Vec<QuizOption>,
) -> Vec<(QuizQuestion, Vec<QuizOption>)> {
    let mut grouped: Vec<(QuizQuestion, Vec<QuizOption>)> =
        questions.into_iter().map(|q| (q, Vec::new())).collect();
    for option in options {
        if let Some((_, opts)) = grouped.iter_mut().find(|(q, _)| q.id == option.question_id) {
            opts.push(option);
        }
    }
    grouped
}

#[cfg(test)]
mod test {
    use super::*;

    fn option(text: &str, is_correct: bool) -> QuizOptionCreate {
        QuizOptionCreate {
            option_text: text.to_string(),
            is_correct,
        }
    }

    fn quiz(questions: Vec<QuizQuestionCreate>) -> QuizCreate {
        QuizCreate {
            course_id: Uuid::new_v4(),
            lesson_id: None,
            title: "Ownership".to_string(),
            pass_percentage: Some(50),
            questions,
        }
    }

    #[test]
    fn valid_quiz_passes() {
        let q = quiz(vec![QuizQuestionCreate {
            question_text: "Who frees a Box?".to_string(),
            options: vec![option("The owner", true), option("The GC", false)],
        }]);
        assert!(q.validate().is_ok());
    }

    #[test]
    fn question_needs_correct_option() {
        let q = quiz(vec![QuizQuestionCreate {
            question_text: "?".to_string(),
            options: vec![option("a", false), option("b", false)],
        }]);
        assert!(q.validate().unwrap_err().contains("no correct option"));
    }

    #[test]
    fn question_needs_two_options() {
        let q = quiz(vec![QuizQuestionCreate {
            question_text: "?".to_string(),
            options: vec![option("a", true)],
        }]);
        assert!(q.validate().unwrap_err().contains("two options"));
    }

    #[test]
    fn empty_quiz_is_rejected() {
        assert!(quiz(vec![]).validate().is_err());
    }

    #[test]
    fn pass_percentage_is_bounded() {
        let mut q = quiz(vec![QuizQuestionCreate {
            question_text: "?".to_string(),
            options: vec![option("a", true), option("b", false)],
        }]);
        q.pass_percentage = Some(101);
        assert!(q.validate().is_err());
    }

    #[test]
    fn options_are_grouped_under_their_question() {
        let quiz_id = Uuid::new_v4();
        let q1 = QuizQuestion {
            id: Uuid::new_v4(),
            quiz_id,
            question_text: "one".to_string(),
            order_index: 0,
        };
        let q2 = QuizQuestion {
            id: Uuid::new_v4(),
            quiz_id,
            question_text: "two".to_string(),
            order_index: 1,
        };
        let opt = |question_id, text: &str| QuizOption {
            id: Uuid::new_v4(),
            question_id,
            option_text: text.to_string(),
            is_correct: false,
            order_index: 0,
        };
        let options = vec![opt(q2.id, "b"), opt(q1.id, "a"), opt(q2.id, "c")];

        let grouped = group_options(vec![q1.clone(), q2.clone()], options);
        assert_eq!(grouped[0].0.id(), q1.id());
        assert_eq!(grouped[0].1.len(), 1);
        assert_eq!(grouped[1].1.len(), 2);
    }

    #[test]
    fn score_counts_correct_selections_only() {
        let quiz_id = Uuid::new_v4();
        let question = |text: &str, index| QuizQuestion {
            id: Uuid::new_v4(),
            quiz_id,
            question_text: text.to_string(),
            order_index: index,
        };
        let opt = |question_id, is_correct| QuizOption {
            id: Uuid::new_v4(),
            question_id,
            option_text: String::new(),
            is_correct,
            order_index: 0,
        };

        let q1 = question("one", 0);
        let q2 = question("two", 1);
        let q3 = question("three", 2);
        let (q1_right, q1_wrong) = (opt(q1.id, true), opt(q1.id, false));
        let (q2_right, q2_wrong) = (opt(q2.id, true), opt(q2.id, false));
        let q3_right = opt(q3.id, true);
        let stray = opt(q3.id, true);

        let grouped = vec![
            (q1.clone(), vec![q1_right.clone(), q1_wrong.clone()]),
            (q2.clone(), vec![q2_right.clone(), q2_wrong.clone()]),
            (q3.clone(), vec![q3_right.clone()]),
        ];

        let mut selected = HashMap::new();
        selected.insert(q1.id, q1_right.id);
        selected.insert(q2.id, q2_wrong.id);
        // an option of another question never counts
        selected.insert(q3.id, stray.id);

        assert_eq!(score_answers(&grouped, &selected), 1);
        assert_eq!(score_answers(&grouped, &HashMap::new()), 0);
    }
}
